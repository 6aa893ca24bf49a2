// gobol-vm - Bytecode compiler and virtual machine for the Gobol programming language
// Copyright (c) 2026 The Gobol Project. MIT licensed.

//! The compiled bytecode module: instruction stream, constant pool, and
//! function table.
//!
//! The constant pool is append-only during compilation and read-only
//! during execution; the compiler keeps per-type caches so equal
//! literals share one slot. The function table maps each compiled
//! function name to its entry address and parameter names.

use std::collections::HashMap;
use std::fmt;

use gobol_core::Value;

use crate::opcode::{Instruction, OpCode};

/// Entry-point record for one compiled function.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionInfo {
    /// Absolute address of the function's first instruction.
    pub entry_point: usize,
    /// Declared parameter names, in order.
    pub params: Vec<String>,
}

/// A compiled program.
#[derive(Debug, Clone, Default)]
pub struct BytecodeModule {
    pub code: Vec<Instruction>,
    pub constants: Vec<Value>,
    pub functions: HashMap<String, FunctionInfo>,
}

impl BytecodeModule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an instruction.
    pub fn push(&mut self, instruction: Instruction) {
        self.code.push(instruction);
    }

    /// Append a constant and return its index. Deduplication is the
    /// compiler's responsibility.
    pub fn add_constant(&mut self, value: Value) -> usize {
        self.constants.push(value);
        self.constants.len() - 1
    }

    /// The address the next emitted instruction will get.
    pub fn current_position(&self) -> usize {
        self.code.len()
    }

    /// Read a constant.
    pub fn constant(&self, idx: usize) -> Option<&Value> {
        self.constants.get(idx)
    }

    /// Rewrite the target operand of a previously emitted jump.
    pub fn patch_jump(&mut self, instruction_index: usize, target: usize) {
        let instruction = &mut self.code[instruction_index];
        debug_assert!(
            instruction.op.is_jump(),
            "patch_jump on non-jump: {}",
            instruction
        );
        instruction.int_op1 = Some(target);
    }

    /// Record a function's entry point and parameters.
    pub fn define_function(&mut self, name: impl Into<String>, info: FunctionInfo) {
        self.functions.insert(name.into(), info);
    }

    /// Look up a function by name.
    pub fn function(&self, name: &str) -> Option<&FunctionInfo> {
        self.functions.get(name)
    }

    /// Every jump target lies inside the code sequence.
    pub fn jumps_are_closed(&self) -> bool {
        self.code.iter().all(|instruction| {
            !instruction.op.is_jump()
                || instruction
                    .int_op1
                    .is_some_and(|target| target < self.code.len())
        })
    }
}

impl fmt::Display for BytecodeModule {
    /// A human-readable disassembly listing.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (addr, instruction) in self.code.iter().enumerate() {
            write!(f, "{:4}  {}", addr, instruction)?;
            if instruction.op == OpCode::LoadConst {
                if let Some(value) = instruction.int_op1.and_then(|idx| self.constant(idx)) {
                    write!(f, "    ; {}", value)?;
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patch_jump_rewrites_target() {
        let mut module = BytecodeModule::new();
        module.push(Instruction::with_int(OpCode::Jmp, 0));
        module.push(Instruction::op(OpCode::Halt));
        module.patch_jump(0, 1);
        assert_eq!(module.code[0].int_op1, Some(1));
        assert!(module.jumps_are_closed());
    }

    #[test]
    fn test_jumps_are_closed_detects_out_of_range() {
        let mut module = BytecodeModule::new();
        module.push(Instruction::with_int(OpCode::Jmp, 7));
        module.push(Instruction::op(OpCode::Halt));
        assert!(!module.jumps_are_closed());
    }
}
