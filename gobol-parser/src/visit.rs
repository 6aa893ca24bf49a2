// gobol-parser - AST visitor contract
// Copyright (c) 2026 The Gobol Project. MIT licensed.

//! AST visitor trait.
//!
//! Every concrete node variant has its own visit entry so consumers can
//! react variant by variant. Traversal is visitor-driven: the provided
//! `visit_stmt`/`visit_expr` dispatchers pick the entry, and each
//! implementation decides whether and in what order to recurse into
//! children (the analyser skips subtrees, the compiler reorders
//! emissions).

use crate::ast::{
    BinaryExpr, Block, CallExpr, Declaration, Expr, ForStmt, FormatString, FunctionDecl, IfStmt,
    ImportStmt, IndexExpr, MemberExpr, ModuleStmt, Program, RangeExpr, ReturnStmt, Stmt, UnaryExpr,
    WhileStmt,
};

/// Trait for walking the Gobol AST.
pub trait AstVisitor {
    /// Visit the program root. The default visits each statement in order.
    fn visit_program(&mut self, program: &Program) {
        for stmt in &program.statements {
            self.visit_stmt(stmt);
        }
    }

    /// Dispatch a statement to its variant entry.
    fn visit_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Import(s) => self.visit_import(s),
            Stmt::Module(s) => self.visit_module(s),
            Stmt::Function(s) => self.visit_function(s),
            Stmt::Block(s) => self.visit_block(s),
            Stmt::Declaration(s) => self.visit_declaration(s),
            Stmt::If(s) => self.visit_if(s),
            Stmt::While(s) => self.visit_while(s),
            Stmt::For(s) => self.visit_for(s),
            Stmt::Return(s) => self.visit_return(s),
            Stmt::Break => self.visit_break(),
            Stmt::Continue => self.visit_continue(),
            Stmt::Expression(e) => self.visit_expr_stmt(e),
        }
    }

    /// Dispatch an expression to its variant entry.
    fn visit_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Binary(e) => self.visit_binary(e),
            Expr::Unary(e) => self.visit_unary(e),
            Expr::Call(e) => self.visit_call(e),
            Expr::Member(e) => self.visit_member(e),
            Expr::Index(e) => self.visit_index(e),
            Expr::Grouped(inner) => self.visit_grouped(inner),
            Expr::Identifier(name) => self.visit_identifier(name),
            Expr::Number(value) => self.visit_number(*value),
            Expr::Str(value) => self.visit_string(value),
            Expr::Bool(value) => self.visit_bool(*value),
            Expr::Format(fs) => self.visit_format_string(fs),
            Expr::Range(e) => self.visit_range(e),
        }
    }

    // Statements

    fn visit_import(&mut self, stmt: &ImportStmt);
    fn visit_module(&mut self, stmt: &ModuleStmt);
    fn visit_function(&mut self, decl: &FunctionDecl);
    fn visit_block(&mut self, block: &Block);
    fn visit_declaration(&mut self, decl: &Declaration);
    fn visit_if(&mut self, stmt: &IfStmt);
    fn visit_while(&mut self, stmt: &WhileStmt);
    fn visit_for(&mut self, stmt: &ForStmt);
    fn visit_return(&mut self, stmt: &ReturnStmt);
    fn visit_break(&mut self);
    fn visit_continue(&mut self);
    fn visit_expr_stmt(&mut self, expr: &Expr);

    // Expressions

    fn visit_binary(&mut self, expr: &BinaryExpr);
    fn visit_unary(&mut self, expr: &UnaryExpr);
    fn visit_call(&mut self, expr: &CallExpr);
    fn visit_member(&mut self, expr: &MemberExpr);
    fn visit_index(&mut self, expr: &IndexExpr);
    fn visit_grouped(&mut self, inner: &Expr);
    fn visit_identifier(&mut self, name: &str);
    fn visit_number(&mut self, value: f64);
    fn visit_string(&mut self, value: &str);
    fn visit_bool(&mut self, value: bool);
    fn visit_format_string(&mut self, fs: &FormatString);
    fn visit_range(&mut self, expr: &RangeExpr);
}
