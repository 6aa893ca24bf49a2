// gobol-vm - Bytecode compiler and virtual machine for the Gobol programming language
// Copyright (c) 2026 The Gobol Project. MIT licensed.

//! Code generation: visits the AST and emits the instruction stream.
//!
//! Jumps are emitted with a zero placeholder and rewritten in place once
//! their target address is known; every placeholder is tracked and must
//! be resolved before compilation finishes. Constants are deduplicated
//! through per-type caches so identical literals share one pool slot.

use std::collections::{HashMap, HashSet};

use gobol_core::Value;
use gobol_parser::ast::{
    BinOp, BinaryExpr, Block, CallExpr, Declaration, Expr, ForStmt, FormatString, FunctionDecl,
    IfStmt, ImportStmt, IndexExpr, MemberExpr, ModuleStmt, Program, RangeExpr, ReturnStmt, TypeRef,
    UnOp, UnaryExpr, WhileStmt, decode_escapes,
};
use gobol_parser::visit::AstVisitor;

use crate::module::{BytecodeModule, FunctionInfo};
use crate::opcode::{Instruction, OpCode};

/// Bookkeeping for one enclosing loop. `break` and `continue` emit
/// placeholder jumps that are patched when the loop's exit and continue
/// addresses are known.
struct LoopContext {
    break_jumps: Vec<usize>,
    continue_jumps: Vec<usize>,
    /// Known up front for `while` (the condition address); patched
    /// forward for `for` (the increment address).
    continue_target: Option<usize>,
}

/// The bytecode compiler.
pub struct Compiler {
    module: BytecodeModule,
    loops: Vec<LoopContext>,
    int_constants: HashMap<i64, usize>,
    float_constants: HashMap<u64, usize>,
    bool_constants: HashMap<bool, usize>,
    str_constants: HashMap<String, usize>,
    none_constant: Option<usize>,
    pending_patches: HashSet<usize>,
    loop_temp_counter: usize,
    diagnostics: Vec<String>,
}

impl Compiler {
    pub fn new() -> Self {
        Compiler {
            module: BytecodeModule::new(),
            loops: Vec::new(),
            int_constants: HashMap::new(),
            float_constants: HashMap::new(),
            bool_constants: HashMap::new(),
            str_constants: HashMap::new(),
            none_constant: None,
            pending_patches: HashSet::new(),
            loop_temp_counter: 0,
            diagnostics: Vec::new(),
        }
    }

    /// Compile a program. The module is produced even when diagnostics
    /// were recorded; the driver decides what to do with them.
    pub fn compile(mut self, program: &Program) -> (BytecodeModule, Vec<String>) {
        self.visit_program(program);
        self.emit(OpCode::Halt);

        debug_assert!(
            self.pending_patches.is_empty(),
            "unresolved jump patches: {:?}",
            self.pending_patches
        );
        debug_assert!(self.module.jumps_are_closed());

        (self.module, self.diagnostics)
    }

    // ========================================================================
    // Emission helpers
    // ========================================================================

    fn emit(&mut self, op: OpCode) {
        self.module.push(Instruction::op(op));
    }

    fn emit_int(&mut self, op: OpCode, operand: usize) {
        self.module.push(Instruction::with_int(op, operand));
    }

    fn emit_str(&mut self, op: OpCode, operand: impl Into<String>) {
        self.module.push(Instruction::with_str(op, operand));
    }

    /// Emit a jump with a placeholder target, returning its address for
    /// later patching.
    fn emit_jump(&mut self, op: OpCode) -> usize {
        let at = self.module.current_position();
        self.emit_int(op, 0);
        self.pending_patches.insert(at);
        at
    }

    /// Patch a jump to the current position.
    fn patch_jump(&mut self, instruction_index: usize) {
        let target = self.module.current_position();
        self.patch_jump_to(instruction_index, target);
    }

    fn patch_jump_to(&mut self, instruction_index: usize, target: usize) {
        self.module.patch_jump(instruction_index, target);
        self.pending_patches.remove(&instruction_index);
    }

    /// Intern a constant, deduplicating per type.
    fn add_constant(&mut self, value: Value) -> usize {
        match &value {
            Value::Int(n) => {
                if let Some(&idx) = self.int_constants.get(n) {
                    return idx;
                }
                let n = *n;
                let idx = self.module.add_constant(value);
                self.int_constants.insert(n, idx);
                idx
            }
            Value::Float(f) => {
                let bits = f.to_bits();
                if let Some(&idx) = self.float_constants.get(&bits) {
                    return idx;
                }
                let idx = self.module.add_constant(value);
                self.float_constants.insert(bits, idx);
                idx
            }
            Value::Bool(b) => {
                if let Some(&idx) = self.bool_constants.get(b) {
                    return idx;
                }
                let b = *b;
                let idx = self.module.add_constant(value);
                self.bool_constants.insert(b, idx);
                idx
            }
            Value::Str(s) => {
                if let Some(&idx) = self.str_constants.get(s) {
                    return idx;
                }
                let s = s.clone();
                let idx = self.module.add_constant(value);
                self.str_constants.insert(s, idx);
                idx
            }
            Value::None => {
                if let Some(idx) = self.none_constant {
                    return idx;
                }
                let idx = self.module.add_constant(value);
                self.none_constant = Some(idx);
                idx
            }
            _ => self.module.add_constant(value),
        }
    }

    fn load_constant(&mut self, value: Value) {
        let idx = self.add_constant(value);
        self.emit_int(OpCode::LoadConst, idx);
    }

    fn diagnostic(&mut self, message: impl Into<String>) {
        self.diagnostics.push(message.into());
    }

    // ========================================================================
    // Loop bookkeeping
    // ========================================================================

    fn enter_loop(&mut self, continue_target: Option<usize>) {
        self.loops.push(LoopContext {
            break_jumps: Vec::new(),
            continue_jumps: Vec::new(),
            continue_target,
        });
    }

    fn exit_loop(&mut self, break_target: usize, continue_target: usize) {
        let context = self.loops.pop().expect("exit_loop without enter_loop");
        for jump in context.break_jumps {
            self.patch_jump_to(jump, break_target);
        }
        for jump in context.continue_jumps {
            self.patch_jump_to(jump, continue_target);
        }
    }

    // ========================================================================
    // Assignment
    // ========================================================================

    fn compile_assignment(&mut self, target: &Expr, rhs: &Expr) {
        match target {
            // Indexed assignment: mutate the popped copy, then rebind
            // the source variable so the write is observable.
            Expr::Index(ix) => {
                let array_name = match ix.array.as_ref() {
                    Expr::Identifier(name) => Some(name.clone()),
                    _ => None,
                };

                self.visit_expr(&ix.array);
                self.visit_expr(&ix.index);
                self.visit_expr(rhs);
                self.emit(OpCode::ArraySet);

                match array_name {
                    Some(name) => self.emit_str(OpCode::StoreVar, name),
                    None => self.emit(OpCode::Pop),
                }
            }
            Expr::Identifier(name) => {
                let name = name.clone();
                self.visit_expr(rhs);
                self.emit_str(OpCode::StoreVar, name);
            }
            _ => {
                self.diagnostic("Left side of assignment must be a variable or array element");
            }
        }
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}

impl AstVisitor for Compiler {
    // ========================================================================
    // Statements
    // ========================================================================

    fn visit_import(&mut self, _stmt: &ImportStmt) {
        // Resolved during semantic analysis; nothing to emit.
    }

    fn visit_module(&mut self, _stmt: &ModuleStmt) {
        // Resolved during semantic analysis; nothing to emit.
    }

    fn visit_function(&mut self, decl: &FunctionDecl) {
        // Guard so top-level control flow never falls into the body.
        let skip = self.emit_jump(OpCode::Jmp);

        let entry_point = self.module.current_position();
        let params: Vec<String> = decl.params.iter().map(|p| p.name.clone()).collect();
        self.module
            .define_function(decl.name.as_str(), FunctionInfo { entry_point, params });
        self.visit_block(&decl.body);

        // A body that does not end in RET returns 0.
        let ends_in_ret = self
            .module
            .code
            .last()
            .is_some_and(|instruction| instruction.op == OpCode::Ret);
        if !ends_in_ret {
            self.load_constant(Value::Int(0));
            self.emit(OpCode::Ret);
        }

        self.patch_jump(skip);
    }

    fn visit_block(&mut self, block: &Block) {
        for stmt in &block.statements {
            self.visit_stmt(stmt);
        }
    }

    fn visit_declaration(&mut self, decl: &Declaration) {
        let store = if decl.keyword.is_mutable() {
            OpCode::StoreVar
        } else {
            OpCode::StoreVal
        };

        if let Some(TypeRef::Array { element, size }) = &decl.ty {
            let type_code = match element.as_str() {
                "float" => 1,
                "bool" => 2,
                "str" => 3,
                _ => 0,
            };
            self.visit_expr(size);
            self.load_constant(Value::Int(type_code));
            self.emit(OpCode::AllocArray);
            self.emit_str(store, decl.name.clone());
            return;
        }

        match &decl.init {
            Some(init) => self.visit_expr(init),
            None => self.load_constant(Value::None),
        }
        self.emit_str(store, decl.name.clone());
    }

    fn visit_if(&mut self, stmt: &IfStmt) {
        self.visit_expr(&stmt.cond);

        let else_jump = self.emit_jump(OpCode::JmpFalse);
        self.visit_stmt(&stmt.then_branch);

        match &stmt.else_branch {
            Some(else_branch) => {
                let end_jump = self.emit_jump(OpCode::Jmp);
                self.patch_jump(else_jump);
                self.visit_stmt(else_branch);
                self.patch_jump(end_jump);
            }
            None => self.patch_jump(else_jump),
        }
    }

    fn visit_while(&mut self, stmt: &WhileStmt) {
        let loop_start = self.module.current_position();

        self.visit_expr(&stmt.cond);
        let exit_jump = self.emit_jump(OpCode::JmpFalse);

        self.enter_loop(Some(loop_start));
        self.visit_block(&stmt.body);
        self.emit_int(OpCode::Jmp, loop_start);

        let exit_target = self.module.current_position();
        self.exit_loop(exit_target, loop_start);
        self.patch_jump_to(exit_jump, exit_target);
    }

    fn visit_for(&mut self, stmt: &ForStmt) {
        // The iterable leaves start, end, step on the stack, step on
        // top. Unique temporaries keep nested loops independent.
        let temp_id = self.loop_temp_counter;
        self.loop_temp_counter += 1;
        let end_name = format!("_end{}", temp_id);
        let step_name = format!("_step{}", temp_id);

        self.visit_expr(&stmt.iterable);
        self.emit_str(OpCode::StoreVar, step_name.clone());
        self.emit_str(OpCode::StoreVar, end_name.clone());
        self.emit_str(OpCode::StoreVar, stmt.var.clone());

        let loop_start = self.module.current_position();

        // Strict `<` test: only ascending ranges iterate.
        self.emit_str(OpCode::LoadVar, stmt.var.clone());
        self.emit_str(OpCode::LoadVar, end_name);
        self.emit(OpCode::Lt);
        let exit_jump = self.emit_jump(OpCode::JmpFalse);

        self.enter_loop(None);
        self.visit_block(&stmt.body);

        // `continue` lands here, on the increment.
        let increment_target = self.module.current_position();
        self.emit_str(OpCode::LoadVar, stmt.var.clone());
        self.emit_str(OpCode::LoadVar, step_name);
        self.emit(OpCode::Add);
        self.emit_str(OpCode::StoreVar, stmt.var.clone());
        self.emit_int(OpCode::Jmp, loop_start);

        let exit_target = self.module.current_position();
        self.exit_loop(exit_target, increment_target);
        self.patch_jump_to(exit_jump, exit_target);
    }

    fn visit_return(&mut self, stmt: &ReturnStmt) {
        match &stmt.value {
            Some(value) => self.visit_expr(value),
            None => self.load_constant(Value::None),
        }
        self.emit(OpCode::Ret);
    }

    fn visit_break(&mut self) {
        if self.loops.is_empty() {
            self.diagnostic("break outside loop");
            return;
        }
        let jump = self.emit_jump(OpCode::Jmp);
        self.loops
            .last_mut()
            .expect("loop context present")
            .break_jumps
            .push(jump);
    }

    fn visit_continue(&mut self) {
        let Some(context) = self.loops.last() else {
            self.diagnostic("continue outside loop");
            return;
        };
        match context.continue_target {
            Some(target) => self.emit_int(OpCode::Jmp, target),
            None => {
                let jump = self.emit_jump(OpCode::Jmp);
                self.loops
                    .last_mut()
                    .expect("loop context present")
                    .continue_jumps
                    .push(jump);
            }
        }
    }

    fn visit_expr_stmt(&mut self, expr: &Expr) {
        self.visit_expr(expr);
        // Assignments store their value and leave the stack untouched;
        // every other expression leaves one value to discard.
        let is_assignment = matches!(expr, Expr::Binary(b) if b.op == BinOp::Assign);
        if !is_assignment {
            self.emit(OpCode::Pop);
        }
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    fn visit_binary(&mut self, expr: &BinaryExpr) {
        match expr.op {
            BinOp::Assign => {
                self.compile_assignment(&expr.left, &expr.right);
            }
            BinOp::And => {
                // Short-circuit: a && b => if a is falsy the result is
                // false without evaluating b.
                self.visit_expr(&expr.left);
                let short = self.emit_jump(OpCode::JmpFalse);
                self.visit_expr(&expr.right);
                let end = self.emit_jump(OpCode::Jmp);
                self.patch_jump(short);
                self.load_constant(Value::Bool(false));
                self.patch_jump(end);
            }
            BinOp::Or => {
                self.visit_expr(&expr.left);
                let short = self.emit_jump(OpCode::JmpTrue);
                self.visit_expr(&expr.right);
                let end = self.emit_jump(OpCode::Jmp);
                self.patch_jump(short);
                self.load_constant(Value::Bool(true));
                self.patch_jump(end);
            }
            op => {
                self.visit_expr(&expr.left);
                self.visit_expr(&expr.right);
                let opcode = match op {
                    BinOp::Add => OpCode::Add,
                    BinOp::Sub => OpCode::Sub,
                    BinOp::Mul => OpCode::Mul,
                    BinOp::Div => OpCode::Div,
                    BinOp::Mod => OpCode::Mod,
                    BinOp::Lt => OpCode::Lt,
                    BinOp::Le => OpCode::Le,
                    BinOp::Gt => OpCode::Gt,
                    BinOp::Ge => OpCode::Ge,
                    BinOp::Eq => OpCode::Eq,
                    BinOp::Ne => OpCode::Ne,
                    BinOp::Assign | BinOp::And | BinOp::Or => unreachable!("handled above"),
                };
                self.emit(opcode);
            }
        }
    }

    fn visit_unary(&mut self, expr: &UnaryExpr) {
        self.visit_expr(&expr.operand);
        match expr.op {
            UnOp::Neg => {
                // Compute 0 - x.
                self.load_constant(Value::Int(0));
                self.emit(OpCode::Swap);
                self.emit(OpCode::Sub);
            }
            UnOp::Pos => {}
            UnOp::Not => self.emit(OpCode::Not),
        }
    }

    fn visit_call(&mut self, expr: &CallExpr) {
        let name = match expr.flat_name() {
            Some(name) => name,
            None => {
                self.diagnostic("Function call target must be a named function");
                String::new()
            }
        };

        let argc = expr.args.len();
        for arg in &expr.args {
            self.visit_expr(arg);
        }

        // Builtins dispatch natively; everything else resolves against
        // the function table at runtime. `scan` and `read` have no
        // native implementation, so routing them here makes the VM
        // report an unknown builtin instead of an unresolved call.
        let native = match name.as_str() {
            "print" | "io.print" => Some("print"),
            "len" => Some("len"),
            "int" => Some("int"),
            "float" => Some("float"),
            "str" => Some("str"),
            "io.scan" => Some("scan"),
            "io.read" => Some("read"),
            _ => None,
        };
        match native {
            Some(native) => {
                self.module
                    .push(Instruction::with_int_str(OpCode::Builtin, argc, native));
            }
            None => {
                self.module
                    .push(Instruction::with_int_str(OpCode::Call, argc, name));
            }
        }
    }

    fn visit_member(&mut self, _expr: &MemberExpr) {
        // Member access only names callables; as a value it is none.
        self.diagnostic("Module members can only be called");
        self.load_constant(Value::None);
    }

    fn visit_index(&mut self, expr: &IndexExpr) {
        self.visit_expr(&expr.array);
        self.visit_expr(&expr.index);
        self.emit(OpCode::ArrayGet);
    }

    fn visit_grouped(&mut self, inner: &Expr) {
        self.visit_expr(inner);
    }

    fn visit_identifier(&mut self, name: &str) {
        self.emit_str(OpCode::LoadVar, name);
    }

    fn visit_number(&mut self, value: f64) {
        if value == value.trunc() {
            self.load_constant(Value::Int(value as i64));
        } else {
            self.load_constant(Value::Float(value));
        }
    }

    fn visit_string(&mut self, value: &str) {
        self.load_constant(Value::Str(value.to_string()));
    }

    fn visit_bool(&mut self, value: bool) {
        self.load_constant(Value::Bool(value));
    }

    fn visit_format_string(&mut self, fs: &FormatString) {
        let decoded = decode_escapes(&fs.raw);
        let str_idx = self.add_constant(Value::Str(decoded));
        self.emit_int(OpCode::LoadConst, str_idx);

        for placeholder in &fs.placeholders {
            self.visit_expr(&placeholder.expr);
        }

        self.module.push(Instruction::with_ints(
            OpCode::Format,
            str_idx,
            fs.placeholders.len(),
        ));
    }

    fn visit_range(&mut self, expr: &RangeExpr) {
        for arg in &expr.args {
            self.visit_expr(arg);
        }
        // A two-argument range defaults the step to 1.
        if expr.args.len() == 2 {
            self.load_constant(Value::Int(1));
        }
    }
}
