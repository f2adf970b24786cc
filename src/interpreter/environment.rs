use std::collections::HashMap;

use super::value::{Function, Value};

/// The evaluator's view of all visible scopes: a stack of function-local
/// scopes over one persistent global scope, plus the function registry.
/// Functions live in their own namespace, so a variable may shadow a
/// function name without touching the registry.
#[derive(Default)]
pub struct Environment {
    globals: HashMap<String, Value>,
    scopes: Vec<HashMap<String, Value>>,
    functions: HashMap<String, Function>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads a name: innermost local scope first, then the global scope.
    /// An unbound name reads as `None`.
    pub fn read(&self, name: &str) -> Value {
        for scope in self.scopes.iter().rev() {
            if let Some(value) = scope.get(name) {
                return value.clone();
            }
        }
        self.globals.get(name).cloned().unwrap_or(Value::None)
    }

    /// Writes a name under the rebind-before-create policy: an existing
    /// local binding (innermost first) is rebound, then an existing global,
    /// and only then is a fresh binding created in the current scope.
    pub fn write(&mut self, name: &str, value: Value) {
        for scope in self.scopes.iter_mut().rev() {
            if let Some(slot) = scope.get_mut(name) {
                *slot = value;
                return;
            }
        }
        if let Some(slot) = self.globals.get_mut(name) {
            *slot = value;
            return;
        }
        match self.scopes.last_mut() {
            Some(scope) => scope.insert(name.to_string(), value),
            None => self.globals.insert(name.to_string(), value),
        };
    }

    /// Binds a name directly in the current scope, bypassing the rebind
    /// policy. Used for call parameters.
    pub fn bind_local(&mut self, name: &str, value: Value) {
        match self.scopes.last_mut() {
            Some(scope) => scope.insert(name.to_string(), value),
            None => self.globals.insert(name.to_string(), value),
        };
    }

    pub fn push_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    pub fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    pub fn scope_depth(&self) -> usize {
        self.scopes.len()
    }

    pub fn define_function(&mut self, func: Function) {
        self.functions.insert(func.name.clone(), func);
    }

    pub fn get_function(&self, name: &str) -> Option<&Function> {
        self.functions.get(name)
    }
}
