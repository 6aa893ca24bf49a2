// gobol-core - Runtime, semantic analysis, and interpreter for the Gobol programming language
// Copyright (c) 2026 The Gobol Project. MIT licensed.

//! # gobol-core
//!
//! Runtime values, the scoped symbol environment, the semantic analyser,
//! and the reference tree-walking interpreter for Gobol.
//!
//! The semantic analyser validates a parsed [`gobol_parser::Program`]
//! against the scope and type rules; the interpreter executes it
//! directly. The bytecode path in `gobol-vm` shares the [`Value`] type,
//! the [`RuntimeError`] taxonomy, and the builtin functions defined here.

pub mod analyser;
pub mod builtins;
pub mod env;
pub mod error;
pub mod interpreter;
pub mod value;

pub use analyser::Analyser;
pub use env::{DataType, Environment, Symbol, SymbolKind};
pub use error::{Result, RuntimeError};
pub use interpreter::Interpreter;
pub use value::{Range, Value, values_equal};
