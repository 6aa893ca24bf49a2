// gobol-vm - Bytecode compiler and virtual machine for the Gobol programming language
// Copyright (c) 2026 The Gobol Project. MIT licensed.

//! Call frames for the VM.

use std::collections::HashMap;

use gobol_core::Value;

/// One function invocation: its name (for diagnostics), where to resume
/// in the caller, and the named local bindings.
#[derive(Debug, Clone)]
pub struct CallFrame {
    pub function_name: String,
    pub return_address: usize,
    pub locals: HashMap<String, Value>,
}

impl CallFrame {
    /// Create a frame with no locals.
    pub fn new(function_name: impl Into<String>, return_address: usize) -> Self {
        CallFrame {
            function_name: function_name.into(),
            return_address,
            locals: HashMap::new(),
        }
    }
}
