use std::fmt;

use super::error::InterpreterError;
use crate::ast::Statement;
use crate::bigint::BigInt;

/// A runtime value: exactly one of the six shapes the language knows.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    None,
    Bool(bool),
    Int(BigInt),
    Float(f64),
    Str(String),
    Tuple(Vec<Value>),
}

/// A user-defined function. Defaults are evaluated at definition time and
/// align with the trailing parameters.
#[derive(Debug, Clone)]
pub struct Function {
    pub name: String,
    pub params: Vec<String>,
    pub defaults: Vec<Value>,
    pub body: Vec<Statement>,
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => write!(f, "None"),
            Value::Bool(b) => write!(f, "{}", if *b { "True" } else { "False" }),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{:.6}", x),
            Value::Str(s) => write!(f, "{}", s),
            Value::Tuple(items) => {
                write!(f, "(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    match item {
                        Value::Str(s) => write!(f, "'{}'", s)?,
                        other => write!(f, "{}", other)?,
                    }
                }
                if items.len() == 1 {
                    write!(f, ",")?;
                }
                write!(f, ")")
            }
        }
    }
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::None => "NoneType",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::Tuple(_) => "tuple",
        }
    }

    pub fn truthy(&self) -> bool {
        match self {
            Value::None => false,
            Value::Bool(b) => *b,
            Value::Int(i) => !i.is_zero(),
            Value::Float(x) => *x != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::Tuple(items) => !items.is_empty(),
        }
    }

    /// Integer conversion. Floats truncate toward zero through an i64, so
    /// magnitudes at or beyond 2^63 saturate to the i64 range.
    pub fn to_int(&self) -> Result<BigInt, InterpreterError> {
        match self {
            Value::Bool(b) => Ok(BigInt::from(if *b { 1 } else { 0 })),
            Value::Int(i) => Ok(i.clone()),
            Value::Float(x) => Ok(BigInt::from(x.trunc() as i64)),
            Value::Str(s) => {
                s.trim()
                    .parse()
                    .map_err(|_| InterpreterError::BadNumericLiteral {
                        literal: s.clone(),
                    })
            }
            _ => Ok(BigInt::zero()),
        }
    }

    pub fn to_float(&self) -> Result<f64, InterpreterError> {
        match self {
            Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
            Value::Int(i) => Ok(i.to_f64()),
            Value::Float(x) => Ok(*x),
            Value::Str(s) => {
                s.trim()
                    .parse()
                    .map_err(|_| InterpreterError::BadNumericLiteral {
                        literal: s.clone(),
                    })
            }
            _ => Ok(0.0),
        }
    }

    pub fn add(&self, other: &Value) -> Result<Value, InterpreterError> {
        if matches!(self, Value::Str(_)) || matches!(other, Value::Str(_)) {
            return Ok(Value::Str(format!("{}{}", self, other)));
        }
        if matches!(self, Value::Float(_)) || matches!(other, Value::Float(_)) {
            return Ok(Value::Float(self.to_float()? + other.to_float()?));
        }
        if let (Value::Int(a), Value::Int(b)) = (self, other) {
            return Ok(Value::Int(a + b));
        }
        Ok(Value::None)
    }

    pub fn sub(&self, other: &Value) -> Result<Value, InterpreterError> {
        if matches!(self, Value::Float(_)) || matches!(other, Value::Float(_)) {
            return Ok(Value::Float(self.to_float()? - other.to_float()?));
        }
        if let (Value::Int(a), Value::Int(b)) = (self, other) {
            return Ok(Value::Int(a - b));
        }
        Ok(Value::None)
    }

    pub fn mul(&self, other: &Value) -> Result<Value, InterpreterError> {
        if let (Value::Str(s), Value::Int(n)) = (self, other) {
            return Ok(Value::Str(repeat_str(s, n)));
        }
        if let (Value::Int(n), Value::Str(s)) = (self, other) {
            return Ok(Value::Str(repeat_str(s, n)));
        }
        if matches!(self, Value::Float(_)) || matches!(other, Value::Float(_)) {
            return Ok(Value::Float(self.to_float()? * other.to_float()?));
        }
        if let (Value::Int(a), Value::Int(b)) = (self, other) {
            return Ok(Value::Int(a * b));
        }
        Ok(Value::None)
    }

    /// True division always produces a float. A zero integer divisor is an
    /// error; float division by zero follows IEEE-754.
    pub fn div(&self, other: &Value) -> Result<Value, InterpreterError> {
        if let (Value::Int(_), Value::Int(b)) = (self, other) {
            if b.is_zero() {
                return Err(InterpreterError::DivisionByZero);
            }
        }
        Ok(Value::Float(self.to_float()? / other.to_float()?))
    }

    /// Floor division: integer when both operands are integers, otherwise
    /// the floor of the float quotient converted back to an integer.
    pub fn floordiv(&self, other: &Value) -> Result<Value, InterpreterError> {
        if let (Value::Int(a), Value::Int(b)) = (self, other) {
            let quotient = a.floor_div(b).ok_or(InterpreterError::DivisionByZero)?;
            return Ok(Value::Int(quotient));
        }
        let divisor = other.to_float()?;
        if divisor == 0.0 {
            return Err(InterpreterError::DivisionByZero);
        }
        let quotient = (self.to_float()? / divisor).floor();
        Ok(Value::Int(BigInt::from(quotient as i64)))
    }

    /// Modulus whose result takes the sign of the divisor.
    pub fn modulo(&self, other: &Value) -> Result<Value, InterpreterError> {
        if let (Value::Int(a), Value::Int(b)) = (self, other) {
            let remainder = a.floor_mod(b).ok_or(InterpreterError::DivisionByZero)?;
            return Ok(Value::Int(remainder));
        }
        let a = self.to_float()?;
        let b = other.to_float()?;
        let mut result = a % b;
        if (result < 0.0 && b > 0.0) || (result > 0.0 && b < 0.0) {
            result += b;
        }
        Ok(Value::Float(result))
    }

    pub fn neg(&self) -> Value {
        match self {
            Value::Int(i) => Value::Int(-i),
            Value::Float(x) => Value::Float(-x),
            _ => Value::None,
        }
    }

    pub fn lt(&self, other: &Value) -> Result<bool, InterpreterError> {
        if let (Value::Str(a), Value::Str(b)) = (self, other) {
            return Ok(a < b);
        }
        if matches!(self, Value::Float(_)) || matches!(other, Value::Float(_)) {
            return Ok(self.to_float()? < other.to_float()?);
        }
        if let (Value::Int(a), Value::Int(b)) = (self, other) {
            return Ok(a < b);
        }
        Ok(false)
    }

    pub fn gt(&self, other: &Value) -> Result<bool, InterpreterError> {
        other.lt(self)
    }

    pub fn le(&self, other: &Value) -> Result<bool, InterpreterError> {
        Ok(!self.gt(other)?)
    }

    pub fn ge(&self, other: &Value) -> Result<bool, InterpreterError> {
        Ok(!self.lt(other)?)
    }

    /// Equality: structural within a tag, widening across the numeric tags
    /// (bool, int, float). Strings compare equal only to strings; all other
    /// mixed-tag pairs are unequal.
    pub fn py_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::None, Value::None) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Tuple(a), Value::Tuple(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.py_eq(y))
            }
            _ => {
                let (Some(a), Some(b)) = (self.numeric_widen(), other.numeric_widen()) else {
                    return false;
                };
                if matches!(self, Value::Float(_)) || matches!(other, Value::Float(_)) {
                    return a == b;
                }
                // Bool/Int pairs compare exactly.
                match (self.numeric_as_int(), other.numeric_as_int()) {
                    (Some(x), Some(y)) => x == y,
                    _ => false,
                }
            }
        }
    }

    fn numeric_widen(&self) -> Option<f64> {
        match self {
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Value::Int(i) => Some(i.to_f64()),
            Value::Float(x) => Some(*x),
            _ => None,
        }
    }

    fn numeric_as_int(&self) -> Option<BigInt> {
        match self {
            Value::Bool(b) => Some(BigInt::from(if *b { 1 } else { 0 })),
            Value::Int(i) => Some(i.clone()),
            _ => None,
        }
    }
}

// Repetition counts are taken through a 64-bit integer; a non-positive
// count yields the empty string.
fn repeat_str(s: &str, count: &BigInt) -> String {
    if count.is_negative() || count.is_zero() {
        return String::new();
    }
    let n = count.to_f64() as i64;
    s.repeat(n as usize)
}
