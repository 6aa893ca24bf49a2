// gobol-vm - Bytecode compiler and virtual machine for the Gobol programming language
// Copyright (c) 2026 The Gobol Project. MIT licensed.

//! # gobol-vm
//!
//! Bytecode compiler and stack-based virtual machine for the Gobol
//! programming language. The compiler lowers the analysed AST to a
//! linear instruction stream with a deduplicated constant pool and a
//! function table; the VM executes that stream with an eval stack and
//! named-local call frames.

pub mod compiler;
pub mod module;
pub mod opcode;
pub mod vm;

pub use compiler::Compiler;
pub use module::{BytecodeModule, FunctionInfo};
pub use opcode::{Instruction, OpCode};
pub use vm::VM;
