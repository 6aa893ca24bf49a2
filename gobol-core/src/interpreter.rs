// gobol-core - Tree-walking interpreter for the Gobol programming language
// Copyright (c) 2026 The Gobol Project. MIT licensed.

//! AST-walking interpreter.
//!
//! The reference execution path: values live in a vector-of-maps scope
//! chain, `return`/`break`/`continue` unwind through explicit flags, and
//! `range(...)` is a first-class value iterated by the `for` visitor.
//! The bytecode VM is the normative path; this interpreter serves as the
//! semantic oracle for the features both paths implement.

use std::collections::HashMap;
use std::io::Write;
use std::rc::Rc;

use gobol_parser::ast::{
    BinOp, BinaryExpr, Block, CallExpr, Declaration, Expr, ForStmt, FormatString, FunctionDecl,
    IfStmt, ImportStmt, IndexExpr, MemberExpr, ModuleStmt, Program, RangeExpr, ReturnStmt, TypeRef,
    UnOp, UnaryExpr, WhileStmt, decode_escapes,
};
use gobol_parser::visit::AstVisitor;

use crate::builtins;
use crate::error::{RuntimeError, report};
use crate::value::{Range, Value, values_equal};

/// The tree-walking interpreter.
pub struct Interpreter<'out> {
    scopes: Vec<HashMap<String, Value>>,
    functions: HashMap<String, Rc<FunctionDecl>>,
    value_stack: Vec<Value>,
    return_value: Value,
    return_flag: bool,
    break_flag: bool,
    continue_flag: bool,
    loop_depth: usize,
    out: Box<dyn Write + 'out>,
}

impl Interpreter<'static> {
    /// Create an interpreter writing program output to stdout.
    pub fn new() -> Self {
        Self::with_output(Box::new(std::io::stdout()))
    }
}

impl Default for Interpreter<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'out> Interpreter<'out> {
    /// Create an interpreter writing program output to the given sink.
    pub fn with_output(out: Box<dyn Write + 'out>) -> Self {
        Interpreter {
            scopes: vec![HashMap::new()],
            functions: HashMap::new(),
            value_stack: Vec::new(),
            return_value: Value::None,
            return_flag: false,
            break_flag: false,
            continue_flag: false,
            loop_depth: 0,
            out,
        }
    }

    /// Execute a program. Runtime errors are reported and recovered
    /// from, so execution always runs to completion.
    pub fn execute(&mut self, program: &Program) {
        self.visit_program(program);
    }

    /// Look up a binding in the global scope, for inspection after a
    /// run.
    pub fn global(&self, name: &str) -> Option<&Value> {
        self.scopes.first().and_then(|scope| scope.get(name))
    }

    // ========================================================================
    // Scope helpers
    // ========================================================================

    fn enter_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    fn exit_scope(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    fn declare_variable(&mut self, name: &str, value: Value) {
        self.scopes
            .last_mut()
            .expect("global scope always present")
            .insert(name.to_string(), value);
    }

    fn set_variable(&mut self, name: &str, value: Value) -> bool {
        for scope in self.scopes.iter_mut().rev() {
            if let Some(slot) = scope.get_mut(name) {
                *slot = value;
                return true;
            }
        }
        false
    }

    fn get_variable(&self, name: &str) -> Option<Value> {
        for scope in self.scopes.iter().rev() {
            if let Some(value) = scope.get(name) {
                return Some(value.clone());
            }
        }
        None
    }

    /// Evaluate an expression and take its value off the stack.
    fn eval_expr(&mut self, expr: &Expr) -> Value {
        self.visit_expr(expr);
        self.value_stack.pop().unwrap_or(Value::None)
    }

    fn push(&mut self, value: Value) {
        self.value_stack.push(value);
    }

    /// Report a recoverable error and produce `none`.
    fn recover(&mut self, err: RuntimeError) -> Value {
        report(&err);
        Value::None
    }

    fn any_flag(&self) -> bool {
        self.return_flag || self.break_flag || self.continue_flag
    }

    /// Control conditions accept booleans and numbers; anything else is
    /// false.
    fn condition_holds(value: &Value) -> bool {
        match value {
            Value::Bool(b) => *b,
            Value::Int(n) => *n != 0,
            Value::Float(f) => *f != 0.0,
            _ => false,
        }
    }

    // ========================================================================
    // Function calls
    // ========================================================================

    fn call_user_function(&mut self, name: &str, args: Vec<Value>) -> Value {
        // Qualified calls reach functions registered under their bare
        // name.
        let bare = name.rsplit('.').next().unwrap_or(name);
        let Some(decl) = self
            .functions
            .get(name)
            .or_else(|| self.functions.get(bare))
            .cloned()
        else {
            return self.recover(RuntimeError::UndefinedFunction(name.to_string()));
        };

        if args.len() != decl.params.len() {
            report(&RuntimeError::Internal(format!(
                "function '{}' expects {} arguments, got {}",
                decl.name,
                decl.params.len(),
                args.len()
            )));
        }

        self.enter_scope();
        for (i, param) in decl.params.iter().enumerate() {
            let value = args.get(i).cloned().unwrap_or(Value::None);
            self.declare_variable(&param.name, value);
        }

        // The body must not observe the caller's loop or return state.
        let saved_loop_depth = std::mem::replace(&mut self.loop_depth, 0);
        let saved_break = std::mem::replace(&mut self.break_flag, false);
        let saved_continue = std::mem::replace(&mut self.continue_flag, false);

        for stmt in &decl.body.statements {
            self.visit_stmt(stmt);
            if self.return_flag {
                break;
            }
        }

        let result = if self.return_flag {
            std::mem::replace(&mut self.return_value, Value::None)
        } else {
            Value::None
        };
        self.return_flag = false;

        self.loop_depth = saved_loop_depth;
        self.break_flag = saved_break;
        self.continue_flag = saved_continue;

        self.exit_scope();
        result
    }

    fn dispatch_call(&mut self, name: &str, args: Vec<Value>) -> Value {
        match name {
            "print" | "io.print" => builtins::builtin_println(self.out.as_mut(), &args),
            "len" => builtins::builtin_len(self.out.as_mut(), &args),
            "int" => builtins::builtin_int(self.out.as_mut(), &args),
            "float" => builtins::builtin_float(self.out.as_mut(), &args),
            "str" => builtins::builtin_str(self.out.as_mut(), &args),
            "io.scan" | "io.read" => {
                self.recover(RuntimeError::UnknownBuiltin(name.to_string()))
            }
            _ => self.call_user_function(name, args),
        }
    }

    // ========================================================================
    // Operators
    // ========================================================================

    fn eval_arithmetic(&mut self, op: BinOp, left: Value, right: Value) -> Value {
        if left.is_none() || right.is_none() {
            return self.recover(RuntimeError::NoneOperand { op: op.as_str() });
        }

        // String concatenation.
        if op == BinOp::Add && (matches!(left, Value::Str(_)) || matches!(right, Value::Str(_))) {
            return Value::Str(format!("{}{}", left, right));
        }

        let (Some(_), Some(_)) = (left.as_f64(), right.as_f64()) else {
            return self.recover(RuntimeError::TypeError {
                expected: "number",
                got: format!("{} {} {}", left.type_name(), op, right.type_name()),
            });
        };

        if let (Value::Int(a), Value::Int(b)) = (&left, &right) {
            let (a, b) = (*a, *b);
            return match op {
                BinOp::Add => Value::Int(a.wrapping_add(b)),
                BinOp::Sub => Value::Int(a.wrapping_sub(b)),
                BinOp::Mul => Value::Int(a.wrapping_mul(b)),
                BinOp::Div => {
                    if b == 0 {
                        self.recover(RuntimeError::DivisionByZero)
                    } else {
                        Value::Int(a.wrapping_div(b))
                    }
                }
                BinOp::Mod => {
                    if b == 0 {
                        self.recover(RuntimeError::ModuloByZero)
                    } else {
                        Value::Int(a.wrapping_rem(b))
                    }
                }
                _ => unreachable!("arithmetic op"),
            };
        }

        let a = left.as_f64().unwrap();
        let b = right.as_f64().unwrap();
        match op {
            BinOp::Add => Value::Float(a + b),
            BinOp::Sub => Value::Float(a - b),
            BinOp::Mul => Value::Float(a * b),
            BinOp::Div => {
                if b == 0.0 {
                    self.recover(RuntimeError::DivisionByZero)
                } else {
                    Value::Float(a / b)
                }
            }
            BinOp::Mod => {
                if b == 0.0 {
                    self.recover(RuntimeError::ModuloByZero)
                } else {
                    Value::Float(a % b)
                }
            }
            _ => unreachable!("arithmetic op"),
        }
    }

    fn eval_comparison(&mut self, op: BinOp, left: Value, right: Value) -> Value {
        match op {
            BinOp::Eq => return Value::Bool(values_equal(&left, &right)),
            BinOp::Ne => return Value::Bool(!values_equal(&left, &right)),
            _ => {}
        }

        if left.is_none() || right.is_none() {
            report(&RuntimeError::NoneOperand { op: op.as_str() });
            return Value::Bool(false);
        }

        // Strings compare by bytes.
        if let (Value::Str(a), Value::Str(b)) = (&left, &right) {
            return Value::Bool(match op {
                BinOp::Lt => a < b,
                BinOp::Le => a <= b,
                BinOp::Gt => a > b,
                BinOp::Ge => a >= b,
                _ => unreachable!("comparison op"),
            });
        }

        let (Some(a), Some(b)) = (left.as_f64(), right.as_f64()) else {
            report(&RuntimeError::TypeError {
                expected: "number",
                got: format!("{} {} {}", left.type_name(), op, right.type_name()),
            });
            return Value::Bool(false);
        };

        Value::Bool(match op {
            BinOp::Lt => a < b,
            BinOp::Le => a <= b,
            BinOp::Gt => a > b,
            BinOp::Ge => a >= b,
            _ => unreachable!("comparison op"),
        })
    }

    fn eval_assignment(&mut self, target: &Expr, rhs: &Expr) -> Value {
        match target {
            Expr::Identifier(name) => {
                let value = self.eval_expr(rhs);
                if !self.set_variable(name, value.clone()) {
                    self.declare_variable(name, value.clone());
                }
                value
            }
            Expr::Index(ix) => {
                let index = self.eval_expr(&ix.index);
                let value = self.eval_expr(rhs);

                let Value::Int(index) = index else {
                    return self.recover(RuntimeError::IndexNotInteger);
                };

                let Expr::Identifier(name) = ix.array.as_ref() else {
                    // Mutating a temporary array has no observable
                    // effect; value semantics make it a no-op.
                    return value;
                };

                let Some(current) = self.get_variable(name) else {
                    return self.recover(RuntimeError::UndefinedVariable(name.clone()));
                };
                let Value::Array(mut items) = current else {
                    return self.recover(RuntimeError::NotAnArray);
                };
                if index < 0 || index as usize >= items.len() {
                    return self.recover(RuntimeError::IndexOutOfBounds {
                        index,
                        size: items.len(),
                    });
                }
                items.set(index as usize, value.clone());
                self.set_variable(name, Value::Array(items));
                value
            }
            _ => {
                eprintln!("Runtime Error: Left side of assignment must be a variable or array element");
                Value::None
            }
        }
    }
}

impl<'out> AstVisitor for Interpreter<'out> {
    fn visit_program(&mut self, program: &Program) {
        for stmt in &program.statements {
            self.visit_stmt(stmt);
            if self.return_flag {
                break;
            }
        }
    }

    // ========================================================================
    // Statements
    // ========================================================================

    fn visit_import(&mut self, _stmt: &ImportStmt) {
        // Handled during semantic analysis.
    }

    fn visit_module(&mut self, _stmt: &ModuleStmt) {
        // Handled during semantic analysis.
    }

    fn visit_function(&mut self, decl: &FunctionDecl) {
        self.functions
            .insert(decl.name.clone(), Rc::new(decl.clone()));
    }

    fn visit_block(&mut self, block: &Block) {
        self.enter_scope();
        for stmt in &block.statements {
            self.visit_stmt(stmt);
            if self.any_flag() {
                break;
            }
        }
        self.exit_scope();
    }

    fn visit_declaration(&mut self, decl: &Declaration) {
        if let Some(TypeRef::Array { element, size }) = &decl.ty {
            let size_value = self.eval_expr(size);
            let Value::Int(size) = size_value else {
                let value = self.recover(RuntimeError::SizeNotInteger);
                self.declare_variable(&decl.name, value);
                return;
            };
            if size < 0 {
                let value = self.recover(RuntimeError::NegativeArraySize);
                self.declare_variable(&decl.name, value);
                return;
            }
            let default = Value::array_default(element);
            let items: im::Vector<Value> =
                std::iter::repeat(default).take(size as usize).collect();
            self.declare_variable(&decl.name, Value::Array(items));
            return;
        }

        let value = match &decl.init {
            Some(init) => self.eval_expr(init),
            None => Value::None,
        };
        self.declare_variable(&decl.name, value);
    }

    fn visit_if(&mut self, stmt: &IfStmt) {
        let cond = self.eval_expr(&stmt.cond);
        if Self::condition_holds(&cond) {
            self.visit_stmt(&stmt.then_branch);
        } else if let Some(else_branch) = &stmt.else_branch {
            self.visit_stmt(else_branch);
        }
    }

    fn visit_while(&mut self, stmt: &WhileStmt) {
        self.loop_depth += 1;

        loop {
            let cond = self.eval_expr(&stmt.cond);
            if !Self::condition_holds(&cond) {
                break;
            }

            self.visit_block(&stmt.body);

            if self.break_flag {
                self.break_flag = false;
                break;
            }
            if self.return_flag {
                break;
            }
            if self.continue_flag {
                self.continue_flag = false;
            }
        }

        self.loop_depth -= 1;
    }

    fn visit_for(&mut self, stmt: &ForStmt) {
        let iterable = self.eval_expr(&stmt.iterable);
        let Value::Range(range) = iterable else {
            report(&RuntimeError::TypeError {
                expected: "range",
                got: iterable.type_name().to_string(),
            });
            return;
        };

        self.enter_scope();
        self.declare_variable(&stmt.var, Value::Int(range.start));
        self.loop_depth += 1;

        let ascending = range.step > 0;
        loop {
            let Some(Value::Int(current)) = self.get_variable(&stmt.var) else {
                break;
            };

            if ascending {
                if current >= range.end {
                    break;
                }
            } else if current <= range.end {
                break;
            }

            self.visit_block(&stmt.body);

            if self.break_flag {
                self.break_flag = false;
                break;
            }
            if self.return_flag {
                break;
            }

            // `continue` still advances the loop variable.
            self.set_variable(&stmt.var, Value::Int(current + range.step));
            if self.continue_flag {
                self.continue_flag = false;
            }
        }

        self.loop_depth -= 1;
        self.exit_scope();
    }

    fn visit_return(&mut self, stmt: &ReturnStmt) {
        self.return_value = match &stmt.value {
            Some(value) => self.eval_expr(value),
            None => Value::None,
        };
        self.return_flag = true;
    }

    fn visit_break(&mut self) {
        if self.loop_depth > 0 {
            self.break_flag = true;
        } else {
            eprintln!("Runtime Error: break outside loop");
        }
    }

    fn visit_continue(&mut self) {
        if self.loop_depth > 0 {
            self.continue_flag = true;
        } else {
            eprintln!("Runtime Error: continue outside loop");
        }
    }

    fn visit_expr_stmt(&mut self, expr: &Expr) {
        self.eval_expr(expr);
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    fn visit_binary(&mut self, expr: &BinaryExpr) {
        match expr.op {
            BinOp::Assign => {
                let value = self.eval_assignment(&expr.left, &expr.right);
                self.push(value);
            }
            BinOp::And => {
                let left = self.eval_expr(&expr.left);
                if !left.is_truthy() {
                    self.push(Value::Bool(false));
                } else {
                    let right = self.eval_expr(&expr.right);
                    self.push(Value::Bool(right.is_truthy()));
                }
            }
            BinOp::Or => {
                let left = self.eval_expr(&expr.left);
                if left.is_truthy() {
                    self.push(Value::Bool(true));
                } else {
                    let right = self.eval_expr(&expr.right);
                    self.push(Value::Bool(right.is_truthy()));
                }
            }
            op if op.is_arithmetic() => {
                let left = self.eval_expr(&expr.left);
                let right = self.eval_expr(&expr.right);
                let value = self.eval_arithmetic(op, left, right);
                self.push(value);
            }
            op => {
                let left = self.eval_expr(&expr.left);
                let right = self.eval_expr(&expr.right);
                let value = self.eval_comparison(op, left, right);
                self.push(value);
            }
        }
    }

    fn visit_unary(&mut self, expr: &UnaryExpr) {
        let operand = self.eval_expr(&expr.operand);
        let value = match expr.op {
            UnOp::Neg => match operand {
                Value::Int(n) => Value::Int(-n),
                Value::Float(f) => Value::Float(-f),
                other => self.recover(RuntimeError::TypeError {
                    expected: "number",
                    got: other.type_name().to_string(),
                }),
            },
            UnOp::Pos => match operand {
                Value::Int(_) | Value::Float(_) => operand,
                other => self.recover(RuntimeError::TypeError {
                    expected: "number",
                    got: other.type_name().to_string(),
                }),
            },
            UnOp::Not => Value::Bool(!operand.is_truthy()),
        };
        self.push(value);
    }

    fn visit_call(&mut self, expr: &CallExpr) {
        let Some(name) = expr.flat_name() else {
            let value = self.recover(RuntimeError::UndefinedFunction(String::new()));
            self.push(value);
            return;
        };

        let args: Vec<Value> = expr.args.iter().map(|arg| self.eval_expr(arg)).collect();
        let value = self.dispatch_call(&name, args);
        self.push(value);
    }

    fn visit_member(&mut self, _expr: &MemberExpr) {
        // Module members are only callable; as values they are `none`.
        self.push(Value::None);
    }

    fn visit_index(&mut self, expr: &IndexExpr) {
        let array = self.eval_expr(&expr.array);
        let index = self.eval_expr(&expr.index);

        let Value::Array(items) = array else {
            let value = self.recover(RuntimeError::NotAnArray);
            self.push(value);
            return;
        };
        let Value::Int(index) = index else {
            let value = self.recover(RuntimeError::IndexNotInteger);
            self.push(value);
            return;
        };
        if index < 0 || index as usize >= items.len() {
            let value = self.recover(RuntimeError::IndexOutOfBounds {
                index,
                size: items.len(),
            });
            self.push(value);
            return;
        }

        self.push(items[index as usize].clone());
    }

    fn visit_grouped(&mut self, inner: &Expr) {
        self.visit_expr(inner);
    }

    fn visit_identifier(&mut self, name: &str) {
        match self.get_variable(name) {
            Some(value) => self.push(value),
            None => {
                let value = self.recover(RuntimeError::UndefinedVariable(name.to_string()));
                self.push(value);
            }
        }
    }

    fn visit_number(&mut self, value: f64) {
        if value == value.trunc() {
            self.push(Value::Int(value as i64));
        } else {
            self.push(Value::Float(value));
        }
    }

    fn visit_string(&mut self, value: &str) {
        self.push(Value::Str(value.to_string()));
    }

    fn visit_bool(&mut self, value: bool) {
        self.push(Value::Bool(value));
    }

    fn visit_format_string(&mut self, fs: &FormatString) {
        let decoded = decode_escapes(&fs.raw);
        let args: Vec<Value> = fs
            .placeholders
            .iter()
            .map(|p| self.eval_expr(&p.expr))
            .collect();
        self.push(Value::Str(builtins::format_string(&decoded, &args)));
    }

    fn visit_range(&mut self, expr: &RangeExpr) {
        let mut args = Vec::new();
        for arg in &expr.args {
            match self.eval_expr(arg) {
                Value::Int(n) => args.push(n),
                other => {
                    let value = self.recover(RuntimeError::TypeError {
                        expected: "int",
                        got: other.type_name().to_string(),
                    });
                    self.push(value);
                    return;
                }
            }
        }

        if args.len() < 2 || args.len() > 3 {
            let value = self.recover(RuntimeError::Internal(format!(
                "range() expects 2 or 3 arguments, got {}",
                args.len()
            )));
            self.push(value);
            return;
        }

        let step = if args.len() == 3 { args[2] } else { 1 };
        if step == 0 {
            let value = self.recover(RuntimeError::Internal(
                "range() step cannot be zero".to_string(),
            ));
            self.push(value);
            return;
        }

        self.push(Value::Range(Range {
            start: args[0],
            end: args[1],
            step,
        }));
    }
}
