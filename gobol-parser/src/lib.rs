// gobol-parser - Lexer and parser for the Gobol programming language
// Copyright (c) 2026 The Gobol Project. MIT licensed.

//! # gobol-parser
//!
//! Lexer and parser for the Gobol programming language.
//! Produces a [`Program`] AST from source text.

pub mod ast;
pub mod lexer;
pub mod parser;
pub mod token;
pub mod visit;

pub use ast::{
    BinOp, BinaryExpr, Block, CallExpr, DeclKeyword, Declaration, Expr, ForStmt, FormatString,
    FunctionDecl, IfStmt, ImportStmt, IndexExpr, MemberExpr, ModuleStmt, Param, Placeholder,
    Program, RangeExpr, ReturnStmt, Stmt, TypeRef, UnOp, UnaryExpr, WhileStmt, decode_escapes,
};
pub use lexer::Lexer;
pub use parser::Parser;
pub use token::{Token, TokenKind};
pub use visit::AstVisitor;
