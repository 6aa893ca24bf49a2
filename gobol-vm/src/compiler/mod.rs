// gobol-vm - Bytecode compiler and virtual machine for the Gobol programming language
// Copyright (c) 2026 The Gobol Project. MIT licensed.

//! Bytecode compilation: transforms the analysed AST to a
//! [`crate::BytecodeModule`].

pub mod codegen;

pub use codegen::Compiler;
