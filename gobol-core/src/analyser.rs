// gobol-core - Semantic analyser for the Gobol programming language
// Copyright (c) 2026 The Gobol Project. MIT licensed.

//! Semantic analysis: name resolution through lexical scopes and type
//! checking, without mutating the AST.
//!
//! Errors are accumulated rather than aborting the walk, so one run
//! surfaces every diagnostic. Expression visits communicate their
//! inferred type through an internal type stack: every expression entry
//! pushes exactly one type, and enclosing entries pop what they consume.

use gobol_parser::ast::{
    BinOp, BinaryExpr, Block, CallExpr, Declaration, Expr, ForStmt, FormatString, FunctionDecl,
    IfStmt, ImportStmt, IndexExpr, MemberExpr, ModuleStmt, Program, RangeExpr, ReturnStmt, TypeRef,
    UnOp, UnaryExpr, WhileStmt,
};
use gobol_parser::visit::AstVisitor;

use crate::env::{DataType, Environment, SymbolKind};

/// The semantic analyser.
pub struct Analyser {
    env: Environment,
    errors: Vec<String>,
    type_stack: Vec<DataType>,
    current_function: Option<String>,
    current_return_type: DataType,
    has_return: bool,
    loop_depth: usize,
    current_module: String,
}

impl Analyser {
    pub fn new() -> Self {
        Analyser {
            env: Environment::new(),
            errors: Vec::new(),
            type_stack: Vec::new(),
            current_function: None,
            current_return_type: DataType::None,
            has_return: false,
            loop_depth: 0,
            current_module: String::new(),
        }
    }

    /// Analyse a program. Returns `true` iff no errors were recorded.
    pub fn analyse(&mut self, program: &Program) -> bool {
        self.declare_initial_environment();
        self.visit_program(program);
        self.errors.is_empty()
    }

    /// The accumulated error messages, in source order.
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// Current scope-stack depth; 1 after a balanced analysis.
    pub fn scope_depth(&self) -> usize {
        self.env.scope_depth()
    }

    /// The two implicit modules available to every program.
    fn declare_initial_environment(&mut self) {
        self.env.declare_module("__builtins__");
        self.env.declare_module("io");

        self.env.declare_function("range", DataType::Int, "__builtins__");
        self.env.declare_function("print", DataType::None, "__builtins__");
        self.env.declare_function("len", DataType::Int, "__builtins__");
        self.env.declare_function("int", DataType::Int, "__builtins__");
        self.env.declare_function("float", DataType::Float, "__builtins__");
        self.env.declare_function("str", DataType::Str, "__builtins__");

        self.env.declare_function("print", DataType::None, "io");
        self.env.declare_function("scan", DataType::Str, "io");
        self.env.declare_function("read", DataType::Str, "io");
    }

    fn error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    fn push(&mut self, data_type: DataType) {
        self.type_stack.push(data_type);
    }

    /// Visit an expression and take its inferred type off the stack.
    fn check_expr(&mut self, expr: &Expr) -> DataType {
        self.visit_expr(expr);
        self.type_stack.pop().unwrap_or(DataType::Unknown)
    }

    fn resolve_type_name(&mut self, name: &str) -> DataType {
        match DataType::from_name(name) {
            Some(data_type) => data_type,
            None => {
                self.error(format!("Unknown type: {}", name));
                DataType::Unknown
            }
        }
    }

    fn check_compatibility(&mut self, target: DataType, source: DataType, context: &str) {
        if !Environment::is_type_compatible(target, source) {
            self.error(format!(
                "Type mismatch in {}: expected {}, got {}",
                context, target, source
            ));
        }
    }

    /// Resolve a function-call name: first `{currentModule}.{name}`,
    /// then `__builtins__.{name}`, then a bare variable lookup.
    fn resolve_call_name(&self, name: &str) -> Option<DataType> {
        let qualified = format!("{}.{}", self.current_module, name);
        if let Some(symbol) = self.env.lookup(&qualified) {
            return Some(symbol.data_type);
        }
        let builtin = format!("__builtins__.{}", name);
        if let Some(symbol) = self.env.lookup(&builtin) {
            return Some(symbol.data_type);
        }
        self.env.lookup(name).map(|symbol| symbol.data_type)
    }

    fn check_assignment_target(&mut self, target: &Expr) {
        match target {
            Expr::Identifier(name) => {
                if let Some(symbol) = self.env.lookup(name) {
                    if symbol.kind == SymbolKind::Variable && !symbol.is_mutable {
                        self.error(format!("Cannot assign to immutable '{}'", name));
                    }
                }
            }
            Expr::Index(index) => {
                if let Expr::Identifier(name) = index.array.as_ref() {
                    if let Some(symbol) = self.env.lookup(name) {
                        if symbol.kind == SymbolKind::Variable && !symbol.is_mutable {
                            self.error(format!("Cannot assign to immutable '{}'", name));
                        }
                    }
                }
            }
            _ => {
                self.error("Left side of assignment must be a variable or array element");
            }
        }
    }
}

impl Default for Analyser {
    fn default() -> Self {
        Self::new()
    }
}

impl AstVisitor for Analyser {
    // ========================================================================
    // Statements
    // ========================================================================

    fn visit_import(&mut self, stmt: &ImportStmt) {
        if stmt.module != "io" && stmt.module != "__builtins__" {
            self.error(format!("Unknown module: '{}'", stmt.module));
        }
    }

    fn visit_module(&mut self, stmt: &ModuleStmt) {
        if !self.env.declare_module(&stmt.name) {
            self.error(format!("Name '{}' is already used", stmt.name));
            return;
        }
        self.current_module = stmt.name.clone();
    }

    fn visit_function(&mut self, decl: &FunctionDecl) {
        let return_type = match &decl.return_type {
            Some(ty) => self.resolve_type_name(ty.name()),
            None => DataType::None,
        };

        let module = self.current_module.clone();
        if !self.env.declare_function(&decl.name, return_type, &module) {
            self.error(format!(
                "Function '{}.{}' is already declared",
                self.current_module, decl.name
            ));
            return;
        }

        let saved_function = self.current_function.take();
        let saved_return_type = self.current_return_type;
        let saved_has_return = self.has_return;

        self.current_function = Some(decl.name.clone());
        self.current_return_type = return_type;
        self.has_return = false;

        self.env.enter_scope();

        for param in &decl.params {
            let param_type = match &param.ty {
                Some(ty) => self.resolve_type_name(ty.name()),
                None => DataType::None,
            };
            if !self.env.declare_variable(&param.name, param_type, true) {
                self.error(format!(
                    "Parameter '{}' is already declared in current scope",
                    param.name
                ));
            }
        }

        self.visit_block(&decl.body);

        if return_type != DataType::None && !self.has_return {
            self.error(format!(
                "Function '{}' must return a value of type {}",
                decl.name, return_type
            ));
        }

        self.env.exit_scope();

        self.current_function = saved_function;
        self.current_return_type = saved_return_type;
        self.has_return = saved_has_return;
    }

    fn visit_block(&mut self, block: &Block) {
        self.env.enter_scope();
        for stmt in &block.statements {
            self.visit_stmt(stmt);
        }
        self.env.exit_scope();
    }

    fn visit_declaration(&mut self, decl: &Declaration) {
        // Array declarations carry their element type; the size must be
        // an integer expression.
        if let Some(TypeRef::Array { element, size }) = &decl.ty {
            let element_type = self.resolve_type_name(element);
            let size_type = self.check_expr(size);
            if size_type != DataType::Int {
                self.error("Array size must be integer");
            }
            if let Some(init) = &decl.init {
                let init_type = self.check_expr(init);
                self.check_compatibility(
                    element_type,
                    init_type,
                    &format!("variable '{}' initialization", decl.name),
                );
            }
            if !self
                .env
                .declare_array(&decl.name, element_type, decl.keyword.is_mutable())
            {
                self.error(format!(
                    "Variable '{}' is already declared in current scope",
                    decl.name
                ));
            }
            return;
        }

        let declared = decl
            .ty
            .as_ref()
            .map(|ty| self.resolve_type_name(ty.name()));

        let init_type = decl.init.as_ref().map(|init| self.check_expr(init));

        // Without an annotation the declared type is inferred from the
        // initializer.
        let var_type = match (declared, init_type) {
            (Some(declared), Some(init_type)) => {
                self.check_compatibility(
                    declared,
                    init_type,
                    &format!("variable '{}' initialization", decl.name),
                );
                declared
            }
            (Some(declared), None) => declared,
            (None, Some(init_type)) => init_type,
            (None, None) => DataType::Unknown,
        };

        if !self
            .env
            .declare_variable(&decl.name, var_type, decl.keyword.is_mutable())
        {
            self.error(format!(
                "Variable '{}' is already declared in current scope",
                decl.name
            ));
        }
    }

    fn visit_if(&mut self, stmt: &IfStmt) {
        let cond_type = self.check_expr(&stmt.cond);
        if cond_type != DataType::Bool && !cond_type.is_numeric() {
            self.error("If condition must be boolean or numeric type");
        }
        self.visit_stmt(&stmt.then_branch);
        if let Some(else_branch) = &stmt.else_branch {
            self.visit_stmt(else_branch);
        }
    }

    fn visit_while(&mut self, stmt: &WhileStmt) {
        let cond_type = self.check_expr(&stmt.cond);
        if cond_type != DataType::Bool && !cond_type.is_numeric() {
            self.error("While condition must be boolean or numeric type");
        }
        self.loop_depth += 1;
        self.visit_block(&stmt.body);
        self.loop_depth -= 1;
    }

    fn visit_for(&mut self, stmt: &ForStmt) {
        self.env.enter_scope();
        self.env.declare_variable(&stmt.var, DataType::Int, true);

        let iterable_type = self.check_expr(&stmt.iterable);
        if iterable_type != DataType::Int {
            self.error("For loop iterable must be range expression");
        }

        self.loop_depth += 1;
        self.visit_block(&stmt.body);
        self.loop_depth -= 1;

        self.env.exit_scope();
    }

    fn visit_return(&mut self, stmt: &ReturnStmt) {
        self.has_return = true;

        let Some(function) = self.current_function.clone() else {
            self.error("Return statement outside function");
            return;
        };

        let Some(value) = &stmt.value else {
            if self.current_return_type != DataType::None {
                self.error(format!(
                    "Function '{}' expects return type {}, but got none",
                    function, self.current_return_type
                ));
            }
            return;
        };

        let value_type = self.check_expr(value);
        self.check_compatibility(
            self.current_return_type,
            value_type,
            &format!("function '{}' return", function),
        );
    }

    fn visit_break(&mut self) {
        if self.loop_depth == 0 {
            self.error("Break statement outside loop");
        }
    }

    fn visit_continue(&mut self) {
        if self.loop_depth == 0 {
            self.error("Continue statement outside loop");
        }
    }

    fn visit_expr_stmt(&mut self, expr: &Expr) {
        self.check_expr(expr);
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    fn visit_binary(&mut self, expr: &BinaryExpr) {
        if expr.op == BinOp::Assign {
            let target_type = self.check_expr(&expr.left);
            let value_type = self.check_expr(&expr.right);
            self.check_assignment_target(&expr.left);
            if !Environment::is_type_compatible(target_type, value_type) {
                self.error(format!("Cannot assign {} to {}", value_type, target_type));
            }
            self.push(target_type);
            return;
        }

        let left = self.check_expr(&expr.left);
        let right = self.check_expr(&expr.right);

        if expr.op.is_arithmetic() {
            // `+` over a string operand is concatenation.
            if expr.op == BinOp::Add && (left == DataType::Str || right == DataType::Str) {
                self.push(DataType::Str);
                return;
            }
            if !left.is_numeric() || !right.is_numeric() {
                self.error(format!("Operator '{}' requires numeric operands", expr.op));
                self.push(DataType::Unknown);
                return;
            }
            if left == DataType::Float || right == DataType::Float {
                self.push(DataType::Float);
            } else {
                self.push(DataType::Int);
            }
            return;
        }

        if expr.op.is_comparison() {
            if !Environment::is_type_compatible(left, right)
                && !Environment::is_type_compatible(right, left)
            {
                self.error(format!("Cannot compare {} and {}", left, right));
            }
            self.push(DataType::Bool);
            return;
        }

        // `&&` and `||`.
        if left != DataType::Bool || right != DataType::Bool {
            self.error("Logical operators require boolean operands");
        }
        self.push(DataType::Bool);
    }

    fn visit_unary(&mut self, expr: &UnaryExpr) {
        let operand = self.check_expr(&expr.operand);
        match expr.op {
            UnOp::Neg | UnOp::Pos => {
                if !operand.is_numeric() {
                    self.error(format!(
                        "Unary operator '{}' requires numeric operand",
                        expr.op.as_str()
                    ));
                }
                self.push(operand);
            }
            UnOp::Not => {
                if operand != DataType::Bool {
                    self.error("Logical not '!' requires boolean operand");
                }
                self.push(DataType::Bool);
            }
        }
    }

    fn visit_call(&mut self, expr: &CallExpr) {
        let return_type = match expr.callee.as_ref() {
            Expr::Identifier(name) => {
                let resolved = self.resolve_call_name(name);
                if resolved.is_none() {
                    self.error(format!("Undeclared function: '{}'", name));
                }
                resolved
            }
            Expr::Member(member) => match member.object.as_ref() {
                Expr::Identifier(module) => {
                    let qualified = format!("{}.{}", module, member.member);
                    let resolved = self.env.lookup(&qualified).map(|s| s.data_type);
                    if resolved.is_none() {
                        self.error(format!("Undeclared function: '{}'", qualified));
                    }
                    resolved
                }
                _ => {
                    self.error("Function call target must be a named function");
                    None
                }
            },
            _ => {
                self.error("Function call target must be a named function");
                None
            }
        };

        for arg in &expr.args {
            self.check_expr(arg);
        }

        self.push(return_type.unwrap_or(DataType::Unknown));
    }

    fn visit_member(&mut self, expr: &MemberExpr) {
        if let Expr::Identifier(module) = expr.object.as_ref() {
            let qualified = format!("{}.{}", module, expr.member);
            match self.env.lookup(&qualified) {
                Some(symbol) => {
                    let data_type = symbol.data_type;
                    self.push(data_type);
                }
                None => {
                    self.error(format!(
                        "Module '{}' has no member '{}'",
                        module, expr.member
                    ));
                    self.push(DataType::Unknown);
                }
            }
            return;
        }

        self.check_expr(&expr.object);
        self.error("Member access left side must be an identifier");
        self.push(DataType::Unknown);
    }

    fn visit_index(&mut self, expr: &IndexExpr) {
        let array_type = self.check_expr(&expr.array);
        let index_type = self.check_expr(&expr.index);
        if index_type != DataType::Int {
            self.error("Array index must be integer");
        }
        // The symbol of an array variable carries its element type.
        self.push(array_type);
    }

    fn visit_grouped(&mut self, inner: &Expr) {
        self.visit_expr(inner);
    }

    fn visit_identifier(&mut self, name: &str) {
        // Function names shadow through the module chain; plain
        // variables resolve last.
        let qualified = format!("{}.{}", self.current_module, name);
        let symbol = self
            .env
            .lookup(&qualified)
            .or_else(|| self.env.lookup(&format!("__builtins__.{}", name)))
            .or_else(|| self.env.lookup(name));

        match symbol {
            Some(symbol) => {
                let data_type = symbol.data_type;
                self.push(data_type);
            }
            None => {
                self.error(format!("Undeclared identifier: '{}'", name));
                self.push(DataType::Unknown);
            }
        }
    }

    fn visit_number(&mut self, value: f64) {
        if value == value.trunc() {
            self.push(DataType::Int);
        } else {
            self.push(DataType::Float);
        }
    }

    fn visit_string(&mut self, _value: &str) {
        self.push(DataType::Str);
    }

    fn visit_bool(&mut self, _value: bool) {
        self.push(DataType::Bool);
    }

    fn visit_format_string(&mut self, fs: &FormatString) {
        for placeholder in &fs.placeholders {
            self.check_expr(&placeholder.expr);
        }
        self.push(DataType::Str);
    }

    fn visit_range(&mut self, expr: &RangeExpr) {
        for arg in &expr.args {
            let arg_type = self.check_expr(arg);
            if !arg_type.is_numeric() {
                self.error("Range arguments must be numeric");
            }
        }
        // Ranges are encoded as `int` for the `for` iterable check.
        self.push(DataType::Int);
    }
}
