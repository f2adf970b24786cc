use std::io::Write;

use crate::ast::{
    Argument, BinaryOperator, BoolOperator, CompareOperator, Expr, Literal, Program, Statement,
    UnaryOperator,
};
use crate::parser;

pub use self::environment::Environment;
pub use self::error::InterpreterError;
pub use self::value::{Function, Value};

pub mod environment;
pub mod error;
pub mod value;

#[cfg(test)]
mod tests;

pub struct Interpreter {
    env: Environment,
    output: Box<dyn Write>,
}

impl Interpreter {
    pub fn new() -> Self {
        Interpreter {
            env: Environment::new(),
            output: Box::new(std::io::stdout()),
        }
    }

    /// Builds an interpreter writing program output to the given sink
    /// instead of standard output.
    pub fn with_output(output: Box<dyn Write>) -> Self {
        Interpreter {
            env: Environment::new(),
            output,
        }
    }

    pub fn execute_program(&mut self, program: &Program) -> Result<(), InterpreterError> {
        for statement in &program.statements {
            match self.execute_statement(statement) {
                Ok(()) => {}
                Err(InterpreterError::Break) => {
                    return Err(InterpreterError::InvalidOperation {
                        message: "'break' outside loop".to_string(),
                    });
                }
                Err(InterpreterError::Continue) => {
                    return Err(InterpreterError::InvalidOperation {
                        message: "'continue' not properly in loop".to_string(),
                    });
                }
                Err(InterpreterError::ReturnValue(_)) => {
                    return Err(InterpreterError::InvalidOperation {
                        message: "'return' outside function".to_string(),
                    });
                }
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    fn execute_suite(&mut self, statements: &[Statement]) -> Result<(), InterpreterError> {
        for statement in statements {
            self.execute_statement(statement)?;
        }
        Ok(())
    }

    fn execute_statement(&mut self, stmt: &Statement) -> Result<(), InterpreterError> {
        match stmt {
            Statement::Expression(expr) => {
                self.evaluate_expression(expr)?;
                Ok(())
            }
            Statement::Assign { targets, value } => {
                let value = self.evaluate_expression(value)?;
                for target in targets {
                    self.assign_target(target, &value)?;
                }
                Ok(())
            }
            Statement::AugAssign { name, op, value } => {
                let rhs = self.evaluate_expression(value)?;
                let current = self.env.read(name);
                let updated = self.apply_binary(*op, &current, &rhs)?;
                self.env.write(name, updated);
                Ok(())
            }
            Statement::FunctionDef {
                name,
                parameters,
                body,
            } => {
                // Defaults are evaluated once, here, in the defining
                // environment.
                let mut params = Vec::with_capacity(parameters.len());
                let mut defaults = Vec::new();
                for parameter in parameters {
                    params.push(parameter.name.clone());
                    if let Some(default) = &parameter.default {
                        defaults.push(self.evaluate_expression(default)?);
                    }
                }
                self.env.define_function(Function {
                    name: name.clone(),
                    params,
                    defaults,
                    body: body.clone(),
                });
                Ok(())
            }
            Statement::If {
                branches,
                else_body,
            } => {
                for branch in branches {
                    if self.evaluate_expression(&branch.condition)?.truthy() {
                        return self.execute_suite(&branch.body);
                    }
                }
                if let Some(body) = else_body {
                    return self.execute_suite(body);
                }
                Ok(())
            }
            Statement::While { condition, body } => {
                loop {
                    if !self.evaluate_expression(condition)?.truthy() {
                        break;
                    }
                    match self.execute_suite(body) {
                        Ok(()) => {}
                        Err(InterpreterError::Break) => break,
                        Err(InterpreterError::Continue) => continue,
                        Err(other) => return Err(other),
                    }
                }
                Ok(())
            }
            Statement::Return { value } => {
                let result = match value {
                    Some(expr) => self.evaluate_expression(expr)?,
                    None => Value::None,
                };
                Err(InterpreterError::ReturnValue(result))
            }
            Statement::Break => Err(InterpreterError::Break),
            Statement::Continue => Err(InterpreterError::Continue),
        }
    }

    fn assign_target(&mut self, target: &Expr, value: &Value) -> Result<(), InterpreterError> {
        match target {
            Expr::Name(name) => {
                self.env.write(name, value.clone());
                Ok(())
            }
            Expr::Tuple(names) => {
                let Value::Tuple(items) = value else {
                    return Err(InterpreterError::InvalidOperation {
                        message: format!(
                            "Cannot unpack {} into {} targets",
                            value.type_name(),
                            names.len()
                        ),
                    });
                };
                // Positional pairing stops at the shorter side.
                for (name, item) in names.iter().zip(items) {
                    self.assign_target(name, item)?;
                }
                Ok(())
            }
            _ => Err(InterpreterError::InvalidOperation {
                message: "Invalid assignment target".to_string(),
            }),
        }
    }

    fn evaluate_expression(&mut self, expr: &Expr) -> Result<Value, InterpreterError> {
        match expr {
            Expr::Literal(literal) => Ok(match literal {
                Literal::Int(i) => Value::Int(i.clone()),
                Literal::Float(x) => Value::Float(*x),
                Literal::Boolean(b) => Value::Bool(*b),
                Literal::None => Value::None,
            }),
            Expr::Name(name) => Ok(self.env.read(name)),
            Expr::Tuple(elements) => {
                let mut items = Vec::with_capacity(elements.len());
                for element in elements {
                    items.push(self.evaluate_expression(element)?);
                }
                Ok(Value::Tuple(items))
            }
            Expr::Str { parts } => {
                let mut result = String::new();
                for part in parts {
                    if part.interpolated {
                        result.push_str(&self.evaluate_interpolated(&part.text)?);
                    } else {
                        result.push_str(&part.text);
                    }
                }
                Ok(Value::Str(result))
            }
            Expr::Unary { op, operand } => {
                let value = self.evaluate_expression(operand)?;
                Ok(match op {
                    UnaryOperator::Negate => value.neg(),
                    UnaryOperator::Not => Value::Bool(!value.truthy()),
                })
            }
            Expr::Binary { left, op, right } => {
                let left = self.evaluate_expression(left)?;
                let right = self.evaluate_expression(right)?;
                self.apply_binary(*op, &left, &right)
            }
            Expr::BoolChain { op, operands } => self.evaluate_bool_chain(*op, operands),
            Expr::Compare { left, comparisons } => {
                // All operands evaluate before any pair is judged.
                let mut values = vec![self.evaluate_expression(left)?];
                for (_, operand) in comparisons {
                    values.push(self.evaluate_expression(operand)?);
                }
                for (i, (op, _)) in comparisons.iter().enumerate() {
                    let holds = self.compare_pair(*op, &values[i], &values[i + 1])?;
                    if !holds {
                        return Ok(Value::Bool(false));
                    }
                }
                Ok(Value::Bool(true))
            }
            Expr::Call { function, args } => self.evaluate_call(function, args),
        }
    }

    /// Short-circuit evaluation yielding the deciding operand itself, not
    /// a boolean.
    fn evaluate_bool_chain(
        &mut self,
        op: BoolOperator,
        operands: &[Expr],
    ) -> Result<Value, InterpreterError> {
        let (first, rest) = match operands.split_first() {
            Some(parts) => parts,
            None => return Ok(Value::None),
        };
        let mut result = self.evaluate_expression(first)?;
        for operand in rest {
            let decided = match op {
                BoolOperator::Or => result.truthy(),
                BoolOperator::And => !result.truthy(),
            };
            if decided {
                return Ok(result);
            }
            result = self.evaluate_expression(operand)?;
        }
        Ok(result)
    }

    fn apply_binary(
        &self,
        op: BinaryOperator,
        left: &Value,
        right: &Value,
    ) -> Result<Value, InterpreterError> {
        match op {
            BinaryOperator::Plus => left.add(right),
            BinaryOperator::Minus => left.sub(right),
            BinaryOperator::Star => left.mul(right),
            BinaryOperator::Slash => left.div(right),
            BinaryOperator::DoubleSlash => left.floordiv(right),
            BinaryOperator::Percent => left.modulo(right),
        }
    }

    fn compare_pair(
        &self,
        op: CompareOperator,
        left: &Value,
        right: &Value,
    ) -> Result<bool, InterpreterError> {
        match op {
            CompareOperator::Less => left.lt(right),
            CompareOperator::LessEqual => left.le(right),
            CompareOperator::Greater => left.gt(right),
            CompareOperator::GreaterEqual => left.ge(right),
            CompareOperator::Equal => Ok(left.py_eq(right)),
            CompareOperator::NotEqual => Ok(!left.py_eq(right)),
        }
    }

    fn evaluate_call(
        &mut self,
        function: &str,
        args: &[Argument],
    ) -> Result<Value, InterpreterError> {
        match function {
            "print" => self.builtin_print(args),
            "int" => {
                let value = self.single_argument("int", args)?;
                Ok(Value::Int(value.to_int()?))
            }
            "float" => {
                let value = self.single_argument("float", args)?;
                Ok(Value::Float(value.to_float()?))
            }
            "str" => {
                let value = self.single_argument("str", args)?;
                Ok(Value::Str(value.to_string()))
            }
            "bool" => {
                let value = self.single_argument("bool", args)?;
                Ok(Value::Bool(value.truthy()))
            }
            _ => self.call_user_function(function, args),
        }
    }

    fn builtin_print(&mut self, args: &[Argument]) -> Result<Value, InterpreterError> {
        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            if arg.name.is_some() {
                return Err(InterpreterError::ArgumentMismatch {
                    message: "print() takes no keyword arguments".to_string(),
                });
            }
            values.push(self.evaluate_expression(&arg.value)?);
        }

        for (i, value) in values.iter().enumerate() {
            if i > 0 {
                write!(self.output, " ")?;
            }
            write!(self.output, "{}", value)?;
        }
        writeln!(self.output)?;
        self.output.flush()?;
        Ok(Value::None)
    }

    fn single_argument(
        &mut self,
        function: &str,
        args: &[Argument],
    ) -> Result<Value, InterpreterError> {
        match args {
            [arg] if arg.name.is_none() => self.evaluate_expression(&arg.value),
            _ => Err(InterpreterError::ArgumentMismatch {
                message: format!("{}() expects exactly one positional argument", function),
            }),
        }
    }

    fn call_user_function(
        &mut self,
        function: &str,
        args: &[Argument],
    ) -> Result<Value, InterpreterError> {
        let func = self
            .env
            .get_function(function)
            .cloned()
            .ok_or_else(|| InterpreterError::FunctionNotFound {
                name: function.to_string(),
            })?;

        // Argument expressions evaluate in the caller's environment.
        let mut evaluated = Vec::with_capacity(args.len());
        for arg in args {
            evaluated.push((arg.name.clone(), self.evaluate_expression(&arg.value)?));
        }
        let bindings = bind_arguments(&func, evaluated)?;

        // The callee's scope is popped on every exit path, including
        // control-signal propagation.
        self.env.push_scope();
        for (name, value) in bindings {
            self.env.bind_local(&name, value);
        }
        let outcome = self.execute_suite(&func.body);
        self.env.pop_scope();

        match outcome {
            Ok(()) => Ok(Value::None),
            Err(InterpreterError::ReturnValue(value)) => Ok(value),
            Err(e) => Err(e),
        }
    }

    /// Expands an interpolated string: `{{`/`}}` escape to literal braces,
    /// and each unescaped `{…}` is parsed as an expression fragment and
    /// evaluated in the current environment.
    fn evaluate_interpolated(&mut self, text: &str) -> Result<String, InterpreterError> {
        let chars: Vec<char> = text.chars().collect();
        let mut result = String::new();
        let mut i = 0;

        while i < chars.len() {
            match chars[i] {
                '{' if chars.get(i + 1) == Some(&'{') => {
                    result.push('{');
                    i += 2;
                }
                '{' => {
                    let mut depth = 1;
                    let mut j = i + 1;
                    while j < chars.len() && depth > 0 {
                        match chars[j] {
                            '{' => depth += 1,
                            '}' => depth -= 1,
                            _ => {}
                        }
                        if depth > 0 {
                            j += 1;
                        }
                    }

                    let fragment: String = chars[i + 1..j].iter().collect();
                    let expr = parser::parse_expression(&fragment).map_err(|e| {
                        InterpreterError::InvalidOperation {
                            message: format!("Invalid expression in interpolated string: {}", e),
                        }
                    })?;
                    let value = self.evaluate_expression(&expr)?;
                    result.push_str(&value.to_string());
                    i = j + 1;
                }
                '}' if chars.get(i + 1) == Some(&'}') => {
                    result.push('}');
                    i += 2;
                }
                '}' => {
                    i += 1;
                }
                c => {
                    result.push(c);
                    i += 1;
                }
            }
        }

        Ok(result)
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

fn bind_arguments(
    func: &Function,
    args: Vec<(Option<String>, Value)>,
) -> Result<Vec<(String, Value)>, InterpreterError> {
    let mut slots: Vec<Option<Value>> = vec![None; func.params.len()];
    let mut next_positional = 0;

    for (name, value) in args {
        match name {
            None => {
                if next_positional >= func.params.len() {
                    return Err(InterpreterError::ArgumentMismatch {
                        message: format!(
                            "{}() takes {} positional arguments but more were given",
                            func.name,
                            func.params.len()
                        ),
                    });
                }
                if slots[next_positional].is_some() {
                    return Err(InterpreterError::ArgumentMismatch {
                        message: format!(
                            "{}() got multiple values for argument '{}'",
                            func.name, func.params[next_positional]
                        ),
                    });
                }
                slots[next_positional] = Some(value);
                next_positional += 1;
            }
            Some(keyword) => {
                let index = func
                    .params
                    .iter()
                    .position(|p| *p == keyword)
                    .ok_or_else(|| InterpreterError::ArgumentMismatch {
                        message: format!(
                            "{}() got an unexpected keyword argument '{}'",
                            func.name, keyword
                        ),
                    })?;
                if slots[index].is_some() {
                    return Err(InterpreterError::ArgumentMismatch {
                        message: format!(
                            "{}() got multiple values for argument '{}'",
                            func.name, keyword
                        ),
                    });
                }
                slots[index] = Some(value);
            }
        }
    }

    let default_start = func.params.len() - func.defaults.len();
    let mut bound = Vec::with_capacity(func.params.len());
    for (i, slot) in slots.into_iter().enumerate() {
        let value = match slot {
            Some(value) => value,
            None if i >= default_start => func.defaults[i - default_start].clone(),
            None => {
                return Err(InterpreterError::ArgumentMismatch {
                    message: format!(
                        "{}() missing required argument '{}'",
                        func.name, func.params[i]
                    ),
                });
            }
        };
        bound.push((func.params[i].clone(), value));
    }
    Ok(bound)
}
