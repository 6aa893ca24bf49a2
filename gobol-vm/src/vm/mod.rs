// gobol-vm - Bytecode compiler and virtual machine for the Gobol programming language
// Copyright (c) 2026 The Gobol Project. MIT licensed.

//! Stack-based virtual machine for executing Gobol bytecode.
//!
//! Single-threaded fetch/execute loop over a linear instruction stream.
//! A global frame is pre-pushed so top-level stores have somewhere to
//! land; `HALT` clears the running flag and a return from the outermost
//! frame parks the program counter at -1. Runtime errors are reported
//! and recovered from by pushing `none` (comparisons push `false`);
//! eval-stack underflow is the single fatal condition and aborts the
//! run with a state dump.

pub mod frame;
pub mod stack;

use std::collections::HashMap;
use std::io::Write;

use gobol_core::builtins::{self, BuiltinFn};
use gobol_core::error::report;
use gobol_core::{RuntimeError, Value};

use crate::module::BytecodeModule;
use crate::opcode::{Instruction, OpCode};

pub use frame::CallFrame;
pub use stack::EvalStack;

type Result<T> = std::result::Result<T, RuntimeError>;

/// The Gobol virtual machine.
pub struct VM<'out> {
    stack: EvalStack,
    frames: Vec<CallFrame>,
    globals: HashMap<String, Value>,
    builtins: HashMap<&'static str, BuiltinFn>,
    pc: i64,
    running: bool,
    out: Box<dyn Write + 'out>,
}

impl VM<'static> {
    /// Create a VM writing program output to stdout.
    pub fn new() -> Self {
        Self::with_output(Box::new(std::io::stdout()))
    }
}

impl Default for VM<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'out> VM<'out> {
    /// Create a VM writing program output to the given sink.
    pub fn with_output(out: Box<dyn Write + 'out>) -> Self {
        let mut natives: HashMap<&'static str, BuiltinFn> = HashMap::new();
        natives.insert("print", builtins::builtin_print);
        natives.insert("len", builtins::builtin_len);
        natives.insert("int", builtins::builtin_int);
        natives.insert("float", builtins::builtin_float);
        natives.insert("str", builtins::builtin_str);

        VM {
            stack: EvalStack::new(),
            frames: Vec::new(),
            globals: HashMap::new(),
            builtins: natives,
            pc: 0,
            running: false,
            out,
        }
    }

    /// Execute a module. Returns the value left on top of the eval
    /// stack (or `none`), or the fatal error that aborted the run.
    ///
    /// All frames are popped before returning; the global frame's
    /// bindings are preserved in the VM's global map for inspection.
    pub fn run(&mut self, module: BytecodeModule) -> Result<Value> {
        self.pc = 0;
        self.running = true;
        self.frames.push(CallFrame::new("global", 0));

        while self.running && self.pc >= 0 && (self.pc as usize) < module.code.len() {
            let instruction = &module.code[self.pc as usize];
            self.pc += 1;
            if let Err(err) = self.execute(instruction, &module) {
                report(&err);
                self.dump_state();
                self.unwind();
                return Err(err);
            }
        }

        self.unwind();
        Ok(self.stack.top().cloned().unwrap_or(Value::None))
    }

    /// Number of values left on the eval stack.
    pub fn stack_len(&self) -> usize {
        self.stack.len()
    }

    /// Look up a global binding after a run.
    pub fn global(&self, name: &str) -> Option<&Value> {
        self.globals.get(name)
    }

    // ========================================================================
    // Frames and variables
    // ========================================================================

    fn unwind(&mut self) {
        while let Some(frame) = self.frames.pop() {
            if self.frames.is_empty() {
                self.globals.extend(frame.locals);
            }
        }
    }

    fn get_variable(&self, name: &str) -> Option<Value> {
        for frame in self.frames.iter().rev() {
            if let Some(value) = frame.locals.get(name) {
                return Some(value.clone());
            }
        }
        None
    }

    /// Overwrite an existing binding, searching frames top-down.
    fn set_variable(&mut self, name: &str, value: Value) -> bool {
        for frame in self.frames.iter_mut().rev() {
            if let Some(slot) = frame.locals.get_mut(name) {
                *slot = value;
                return true;
            }
        }
        false
    }

    fn declare_variable(&mut self, name: &str, value: Value) {
        if let Some(frame) = self.frames.last_mut() {
            frame.locals.insert(name.to_string(), value);
        }
    }

    /// Report a recoverable error and push `none`.
    fn recover(&mut self, err: RuntimeError) {
        report(&err);
        self.stack.push(Value::None);
    }

    fn dump_state(&self) {
        eprintln!("=== VM State ===");
        eprintln!("pc: {}", self.pc);
        eprint!("eval stack [{}]:", self.stack.len());
        for value in self.stack.iter() {
            eprint!(" {}", value);
        }
        eprintln!();
        eprintln!("call stack [{}]:", self.frames.len());
        for (i, frame) in self.frames.iter().enumerate() {
            eprintln!(
                "  [{}] {} (return address {})",
                i, frame.function_name, frame.return_address
            );
        }
    }

    // ========================================================================
    // Operand access
    // ========================================================================

    fn int1(instruction: &Instruction) -> Result<usize> {
        instruction
            .int_op1
            .ok_or_else(|| RuntimeError::Internal(format!("missing int operand: {}", instruction)))
    }

    fn int2(instruction: &Instruction) -> Result<usize> {
        instruction
            .int_op2
            .ok_or_else(|| RuntimeError::Internal(format!("missing int operand: {}", instruction)))
    }

    fn str1(instruction: &Instruction) -> Result<&str> {
        instruction
            .str_op
            .as_deref()
            .ok_or_else(|| RuntimeError::Internal(format!("missing str operand: {}", instruction)))
    }

    // ========================================================================
    // Execution
    // ========================================================================

    fn execute(&mut self, instruction: &Instruction, module: &BytecodeModule) -> Result<()> {
        match instruction.op {
            OpCode::LoadConst => {
                let idx = Self::int1(instruction)?;
                match module.constant(idx) {
                    Some(value) => self.stack.push(value.clone()),
                    None => self.recover(RuntimeError::Internal(format!(
                        "constant index {} out of bounds",
                        idx
                    ))),
                }
            }

            OpCode::LoadVal | OpCode::LoadVar => {
                let name = Self::str1(instruction)?;
                match self.get_variable(name) {
                    Some(value) => self.stack.push(value),
                    None => self.recover(RuntimeError::UndefinedVariable(name.to_string())),
                }
            }

            OpCode::StoreVal | OpCode::StoreVar => {
                let name = Self::str1(instruction)?;
                let value = self.stack.pop()?;
                // An existing binding anywhere on the call stack is
                // overwritten; otherwise this is an implicit
                // declaration in the current frame.
                if !self.set_variable(name, value.clone()) {
                    self.declare_variable(name, value);
                }
            }

            OpCode::LoadGlobalVal | OpCode::LoadGlobalVar => {
                let name = Self::str1(instruction)?;
                match self.globals.get(name) {
                    Some(value) => self.stack.push(value.clone()),
                    None => self.recover(RuntimeError::UndefinedVariable(name.to_string())),
                }
            }

            OpCode::StoreGlobalVal | OpCode::StoreGlobalVar => {
                let name = Self::str1(instruction)?;
                let value = self.stack.pop()?;
                self.globals.insert(name.to_string(), value);
            }

            OpCode::AllocArray => {
                // Stack: [size, typeCode] with the type code on top.
                let type_code = self.stack.pop()?;
                let size = self.stack.pop()?;

                let Value::Int(size) = size else {
                    self.recover(RuntimeError::SizeNotInteger);
                    return Ok(());
                };
                if size < 0 {
                    self.recover(RuntimeError::NegativeArraySize);
                    return Ok(());
                }

                let element = match type_code {
                    Value::Int(1) => "float",
                    Value::Int(2) => "bool",
                    Value::Int(3) => "str",
                    _ => "int",
                };
                let default = Value::array_default(element);
                let items: im::Vector<Value> =
                    std::iter::repeat(default).take(size as usize).collect();
                self.stack.push(Value::Array(items));
            }

            OpCode::ArrayGet => {
                let index = self.stack.pop()?;
                let array = self.stack.pop()?;

                let Value::Array(items) = array else {
                    self.recover(RuntimeError::NotAnArray);
                    return Ok(());
                };
                let Value::Int(index) = index else {
                    self.recover(RuntimeError::IndexNotInteger);
                    return Ok(());
                };
                if index < 0 || index as usize >= items.len() {
                    self.recover(RuntimeError::IndexOutOfBounds {
                        index,
                        size: items.len(),
                    });
                    return Ok(());
                }
                self.stack.push(items[index as usize].clone());
            }

            OpCode::ArraySet => {
                // Stack: [array, index, value] with the value on top.
                // The popped copy is mutated and pushed back; a
                // following STORE_VAR rebinds the source variable.
                let value = self.stack.pop()?;
                let index = self.stack.pop()?;
                let array = self.stack.pop()?;

                let Value::Array(mut items) = array else {
                    self.recover(RuntimeError::NotAnArray);
                    return Ok(());
                };
                let Value::Int(index) = index else {
                    self.recover(RuntimeError::IndexNotInteger);
                    return Ok(());
                };
                if index < 0 || index as usize >= items.len() {
                    self.recover(RuntimeError::IndexOutOfBounds {
                        index,
                        size: items.len(),
                    });
                    return Ok(());
                }
                items.set(index as usize, value);
                self.stack.push(Value::Array(items));
            }

            OpCode::ArrayLen => {
                let array = self.stack.pop()?;
                let Value::Array(items) = array else {
                    self.recover(RuntimeError::NotAnArray);
                    return Ok(());
                };
                self.stack.push(Value::Int(items.len() as i64));
            }

            OpCode::Add => {
                let right = self.stack.pop()?;
                let left = self.stack.pop()?;

                if left.is_none() || right.is_none() {
                    self.recover(RuntimeError::NoneOperand { op: "+" });
                    return Ok(());
                }
                // String concatenation.
                if matches!(left, Value::Str(_)) || matches!(right, Value::Str(_)) {
                    self.stack.push(Value::Str(format!("{}{}", left, right)));
                    return Ok(());
                }
                match (&left, &right) {
                    (Value::Int(a), Value::Int(b)) => {
                        self.stack.push(Value::Int(a.wrapping_add(*b)));
                    }
                    _ => match (left.as_f64(), right.as_f64()) {
                        (Some(a), Some(b)) => self.stack.push(Value::Float(a + b)),
                        _ => self.recover(RuntimeError::TypeError {
                            expected: "number",
                            got: format!("{} + {}", left.type_name(), right.type_name()),
                        }),
                    },
                }
            }

            OpCode::Sub => self.binary_num_op("-", |a, b| a.wrapping_sub(b), |a, b| a - b)?,
            OpCode::Mul => self.binary_num_op("*", |a, b| a.wrapping_mul(b), |a, b| a * b)?,

            OpCode::Div => self.division_op(OpCode::Div)?,
            OpCode::Mod => self.division_op(OpCode::Mod)?,

            OpCode::Lt => self.comparison_op("<", |a, b| a < b, |a, b| a < b)?,
            OpCode::Le => self.comparison_op("<=", |a, b| a <= b, |a, b| a <= b)?,
            OpCode::Gt => self.comparison_op(">", |a, b| a > b, |a, b| a > b)?,
            OpCode::Ge => self.comparison_op(">=", |a, b| a >= b, |a, b| a >= b)?,

            OpCode::Eq => {
                let right = self.stack.pop()?;
                let left = self.stack.pop()?;
                self.stack
                    .push(Value::Bool(gobol_core::value::values_equal(&left, &right)));
            }
            OpCode::Ne => {
                let right = self.stack.pop()?;
                let left = self.stack.pop()?;
                self.stack
                    .push(Value::Bool(!gobol_core::value::values_equal(&left, &right)));
            }

            OpCode::Not => {
                if self.stack.is_empty() {
                    self.recover(RuntimeError::Internal("NOT requires an operand".into()));
                    return Ok(());
                }
                let value = self.stack.pop()?;
                self.stack.push(Value::Bool(!value.is_truthy()));
            }

            OpCode::Swap => {
                if self.stack.len() < 2 {
                    self.recover(RuntimeError::Internal("SWAP requires 2 operands".into()));
                    return Ok(());
                }
                let a = self.stack.pop()?;
                let b = self.stack.pop()?;
                self.stack.push(a);
                self.stack.push(b);
            }

            OpCode::Pop => {
                self.stack.pop()?;
            }

            OpCode::Jmp => {
                self.pc = Self::int1(instruction)? as i64;
            }

            OpCode::JmpTrue => {
                let target = Self::int1(instruction)?;
                let value = self.stack.pop()?;
                if value.is_truthy() {
                    self.pc = target as i64;
                }
            }

            OpCode::JmpFalse => {
                let target = Self::int1(instruction)?;
                let value = self.stack.pop()?;
                if !value.is_truthy() {
                    self.pc = target as i64;
                }
            }

            OpCode::Format => {
                let str_idx = Self::int1(instruction)?;
                let argc = Self::int2(instruction)?;

                let format = match module.constant(str_idx) {
                    Some(Value::Str(s)) => s.clone(),
                    Some(other) => {
                        // Arguments are consumed either way so the
                        // stack stays balanced.
                        self.stack.pop_n(argc)?;
                        self.recover(RuntimeError::TypeError {
                            expected: "str",
                            got: other.type_name().to_string(),
                        });
                        return Ok(());
                    }
                    None => {
                        self.stack.pop_n(argc)?;
                        self.recover(RuntimeError::Internal(format!(
                            "format string index {} out of bounds",
                            str_idx
                        )));
                        return Ok(());
                    }
                };

                let args = self.stack.pop_n(argc)?;
                self.stack
                    .push(Value::Str(builtins::format_string(&format, &args)));
            }

            OpCode::Call => {
                let name = Self::str1(instruction)?;
                let argc = Self::int1(instruction)?;
                let args = self.stack.pop_n(argc)?;

                let Some(info) = module.function(name) else {
                    self.recover(RuntimeError::UndefinedFunction(name.to_string()));
                    return Ok(());
                };

                // Arguments bind positionally as p0..pN, and also under
                // their declared names from the function table so the
                // body resolves its parameters frame-locally.
                let mut frame = CallFrame::new(name, self.pc as usize);
                for (i, arg) in args.into_iter().enumerate() {
                    frame.locals.insert(format!("p{}", i), arg.clone());
                    if let Some(param) = info.params.get(i) {
                        frame.locals.insert(param.clone(), arg);
                    }
                }
                self.frames.push(frame);
                self.pc = info.entry_point as i64;
            }

            OpCode::Ret => {
                let value = self.stack.pop()?;
                let Some(frame) = self.frames.pop() else {
                    self.recover(RuntimeError::Internal(
                        "return with no active frame".into(),
                    ));
                    return Ok(());
                };

                if self.frames.is_empty() {
                    // Returning from the outermost frame ends the run;
                    // its bindings become the surviving globals.
                    self.globals.extend(frame.locals);
                    self.pc = -1;
                } else {
                    self.pc = frame.return_address as i64;
                }
                self.stack.push(value);
            }

            OpCode::Builtin => {
                let name = Self::str1(instruction)?;
                let argc = Self::int1(instruction)?;
                let args = self.stack.pop_n(argc)?;

                match self.builtins.get(name).copied() {
                    Some(native) => {
                        let result = native(self.out.as_mut(), &args);
                        self.stack.push(result);
                    }
                    None => self.recover(RuntimeError::UnknownBuiltin(name.to_string())),
                }
            }

            OpCode::Halt => {
                self.running = false;
            }
        }

        Ok(())
    }

    fn binary_num_op(
        &mut self,
        name: &'static str,
        int_op: fn(i64, i64) -> i64,
        float_op: fn(f64, f64) -> f64,
    ) -> Result<()> {
        let right = self.stack.pop()?;
        let left = self.stack.pop()?;

        if left.is_none() || right.is_none() {
            self.recover(RuntimeError::NoneOperand { op: name });
            return Ok(());
        }

        match (&left, &right) {
            (Value::Int(a), Value::Int(b)) => self.stack.push(Value::Int(int_op(*a, *b))),
            _ => match (left.as_f64(), right.as_f64()) {
                (Some(a), Some(b)) => self.stack.push(Value::Float(float_op(a, b))),
                _ => self.recover(RuntimeError::TypeError {
                    expected: "number",
                    got: format!("{} {} {}", left.type_name(), name, right.type_name()),
                }),
            },
        }
        Ok(())
    }

    fn division_op(&mut self, op: OpCode) -> Result<()> {
        let right = self.stack.pop()?;
        let left = self.stack.pop()?;

        if left.is_none() || right.is_none() {
            self.recover(RuntimeError::NoneOperand {
                op: if op == OpCode::Div { "/" } else { "%" },
            });
            return Ok(());
        }

        let zero_divisor = matches!(right, Value::Int(0)) || matches!(right, Value::Float(f) if f == 0.0);
        if zero_divisor {
            self.recover(if op == OpCode::Div {
                RuntimeError::DivisionByZero
            } else {
                RuntimeError::ModuloByZero
            });
            return Ok(());
        }

        match (&left, &right) {
            (Value::Int(a), Value::Int(b)) => {
                let result = if op == OpCode::Div {
                    a.wrapping_div(*b)
                } else {
                    a.wrapping_rem(*b)
                };
                self.stack.push(Value::Int(result));
            }
            _ => match (left.as_f64(), right.as_f64()) {
                (Some(a), Some(b)) => {
                    let result = if op == OpCode::Div { a / b } else { a % b };
                    self.stack.push(Value::Float(result));
                }
                _ => self.recover(RuntimeError::TypeError {
                    expected: "number",
                    got: format!(
                        "{} {} {}",
                        left.type_name(),
                        if op == OpCode::Div { "/" } else { "%" },
                        right.type_name()
                    ),
                }),
            },
        }
        Ok(())
    }

    /// Comparisons report errors but push `false` so downstream jumps
    /// still see a boolean.
    fn comparison_op(
        &mut self,
        name: &'static str,
        num_op: fn(f64, f64) -> bool,
        str_op: fn(&str, &str) -> bool,
    ) -> Result<()> {
        let right = self.stack.pop()?;
        let left = self.stack.pop()?;

        if left.is_none() || right.is_none() {
            report(&RuntimeError::NoneOperand { op: name });
            self.stack.push(Value::Bool(false));
            return Ok(());
        }

        // Strings compare by bytes.
        if let (Value::Str(a), Value::Str(b)) = (&left, &right) {
            self.stack.push(Value::Bool(str_op(a, b)));
            return Ok(());
        }

        match (left.as_f64(), right.as_f64()) {
            (Some(a), Some(b)) => self.stack.push(Value::Bool(num_op(a, b))),
            _ => {
                report(&RuntimeError::TypeError {
                    expected: "number",
                    got: format!("{} {} {}", left.type_name(), name, right.type_name()),
                });
                self.stack.push(Value::Bool(false));
            }
        }
        Ok(())
    }
}
