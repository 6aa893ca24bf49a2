// gobol-core - Symbol environment for semantic analysis
// Copyright (c) 2026 The Gobol Project. MIT licensed.

//! Scoped symbol table used by the semantic analyser.
//!
//! The environment is an ordered stack of scopes. Scope 0 is the global
//! scope and is never popped; module and function declarations always
//! live there under the composite key `module.name`. Name resolution
//! searches from the innermost scope outwards, so shadowing across
//! scopes is permitted while redeclaration inside one scope is not.

use std::collections::HashMap;
use std::fmt;

/// The analyser's view of a type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    Int,
    Float,
    Str,
    Bool,
    None,
    Unknown,
}

impl DataType {
    /// Map a surface type name to a data type. Unknown names map to
    /// [`DataType::Unknown`]; the analyser reports them.
    pub fn from_name(name: &str) -> Option<DataType> {
        match name {
            "int" => Some(DataType::Int),
            "float" => Some(DataType::Float),
            "str" => Some(DataType::Str),
            "bool" => Some(DataType::Bool),
            _ => None,
        }
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, DataType::Int | DataType::Float)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DataType::Int => "int",
            DataType::Float => "float",
            DataType::Str => "str",
            DataType::Bool => "bool",
            DataType::None => "none",
            DataType::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// What a symbol names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Variable,
    Function,
    Module,
}

/// One entry in a scope.
#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    /// For variables the variable type, for functions the return type.
    /// Array variables carry their element type here.
    pub data_type: DataType,
    pub scope_level: usize,
    /// The owning module, for functions.
    pub module_name: Option<String>,
    pub is_array: bool,
    pub is_mutable: bool,
}

/// The scope stack.
#[derive(Debug)]
pub struct Environment {
    scopes: Vec<HashMap<String, Symbol>>,
}

impl Environment {
    /// Create an environment holding only the global scope.
    pub fn new() -> Self {
        Environment {
            scopes: vec![HashMap::new()],
        }
    }

    /// Push a fresh scope.
    pub fn enter_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    /// Pop the innermost scope. The global scope is never popped.
    pub fn exit_scope(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    /// Number of live scopes. 1 means only the global scope remains.
    pub fn scope_depth(&self) -> usize {
        self.scopes.len()
    }

    /// Declare a variable in the innermost scope. Fails when the name is
    /// already present in that scope.
    pub fn declare_variable(&mut self, name: &str, data_type: DataType, is_mutable: bool) -> bool {
        self.declare_in_current(name, data_type, is_mutable, false)
    }

    /// Declare an array variable in the innermost scope. `data_type` is
    /// the element type.
    pub fn declare_array(&mut self, name: &str, data_type: DataType, is_mutable: bool) -> bool {
        self.declare_in_current(name, data_type, is_mutable, true)
    }

    fn declare_in_current(
        &mut self,
        name: &str,
        data_type: DataType,
        is_mutable: bool,
        is_array: bool,
    ) -> bool {
        let level = self.scopes.len() - 1;
        let scope = self.scopes.last_mut().expect("global scope always present");
        if scope.contains_key(name) {
            return false;
        }
        scope.insert(
            name.to_string(),
            Symbol {
                name: name.to_string(),
                kind: SymbolKind::Variable,
                data_type,
                scope_level: level,
                module_name: None,
                is_array,
                is_mutable,
            },
        );
        true
    }

    /// Declare a function in the global scope under `module.name`.
    /// `data_type` is the return type.
    pub fn declare_function(&mut self, name: &str, data_type: DataType, module: &str) -> bool {
        let key = format!("{}.{}", module, name);
        let global = &mut self.scopes[0];
        if global.contains_key(&key) {
            return false;
        }
        global.insert(
            key,
            Symbol {
                name: name.to_string(),
                kind: SymbolKind::Function,
                data_type,
                scope_level: 0,
                module_name: Some(module.to_string()),
                is_array: false,
                is_mutable: false,
            },
        );
        true
    }

    /// Declare a module in the global scope. Redeclaring an existing
    /// module is not an error; reusing its name for anything else is.
    pub fn declare_module(&mut self, name: &str) -> bool {
        let global = &mut self.scopes[0];
        if let Some(existing) = global.get(name) {
            return existing.kind == SymbolKind::Module;
        }
        global.insert(
            name.to_string(),
            Symbol {
                name: name.to_string(),
                kind: SymbolKind::Module,
                data_type: DataType::None,
                scope_level: 0,
                module_name: None,
                is_array: false,
                is_mutable: false,
            },
        );
        true
    }

    /// Resolve a name, searching from the innermost scope outwards.
    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        for scope in self.scopes.iter().rev() {
            if let Some(symbol) = scope.get(name) {
                return Some(symbol);
            }
        }
        None
    }

    /// True when the name is bound in the innermost scope.
    pub fn is_declared_in_current_scope(&self, name: &str) -> bool {
        self.scopes
            .last()
            .map(|scope| scope.contains_key(name))
            .unwrap_or(false)
    }

    /// Identical types are compatible, and `int` widens implicitly to
    /// `float`. Nothing else converts.
    pub fn is_type_compatible(target: DataType, source: DataType) -> bool {
        if target == source {
            return true;
        }
        target == DataType::Float && source == DataType::Int
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redeclaration_in_same_scope_fails() {
        let mut env = Environment::new();
        assert!(env.declare_variable("x", DataType::Int, true));
        assert!(!env.declare_variable("x", DataType::Str, true));
    }

    #[test]
    fn test_shadowing_across_scopes() {
        let mut env = Environment::new();
        assert!(env.declare_variable("x", DataType::Int, true));
        env.enter_scope();
        assert!(env.declare_variable("x", DataType::Str, true));
        assert_eq!(env.lookup("x").unwrap().data_type, DataType::Str);
        env.exit_scope();
        assert_eq!(env.lookup("x").unwrap().data_type, DataType::Int);
    }

    #[test]
    fn test_global_scope_never_popped() {
        let mut env = Environment::new();
        env.exit_scope();
        env.exit_scope();
        assert_eq!(env.scope_depth(), 1);
    }

    #[test]
    fn test_functions_use_composite_keys() {
        let mut env = Environment::new();
        assert!(env.declare_function("print", DataType::None, "io"));
        assert!(env.lookup("io.print").is_some());
        assert!(env.lookup("print").is_none());
        assert!(!env.declare_function("print", DataType::None, "io"));
    }

    #[test]
    fn test_widening_compatibility() {
        assert!(Environment::is_type_compatible(DataType::Float, DataType::Int));
        assert!(!Environment::is_type_compatible(DataType::Int, DataType::Float));
        assert!(!Environment::is_type_compatible(DataType::Str, DataType::Int));
    }
}
