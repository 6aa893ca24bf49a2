// gobol-parser - Parser for Gobol
// Copyright (c) 2026 The Gobol Project. MIT licensed.

//! Recursive descent parser for Gobol source code.
//!
//! The parser is best-effort: a syntax error records a diagnostic and
//! sets the error flag, but parsing continues via panic-mode recovery
//! (advance one token) so downstream layers see as much structure as
//! possible. The final [`Program`] is always returned.

use crate::ast::{
    BinOp, BinaryExpr, Block, CallExpr, DeclKeyword, Declaration, Expr, ForStmt, FormatString,
    FunctionDecl, IfStmt, ImportStmt, IndexExpr, MemberExpr, ModuleStmt, Param, Program, RangeExpr,
    ReturnStmt, Stmt, TypeRef, UnOp, UnaryExpr, WhileStmt, decode_escapes,
};
use crate::lexer::Lexer;
use crate::token::{Token, TokenKind};

/// The parser converts a token buffer into a [`Program`].
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    errors: Vec<String>,
}

impl Parser {
    /// Create a parser for the given source text. The whole token stream
    /// is materialised up front so the parser has cheap lookahead.
    pub fn new(source: &str) -> Self {
        let tokens = Lexer::new(source).tokenize();
        Parser {
            tokens,
            pos: 0,
            errors: Vec::new(),
        }
    }

    /// Parse the whole token stream into a program.
    pub fn parse_program(&mut self) -> Program {
        let mut program = Program::default();

        while !self.at_eof() {
            self.skip_eol();
            if self.at_eof() {
                break;
            }
            match self.parse_statement() {
                Some(stmt) => program.statements.push(stmt),
                // Skip the offending token so parsing makes progress.
                None => self.advance(),
            }
        }

        program
    }

    /// Diagnostics collected so far, in source order.
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// True if any diagnostic has been recorded.
    pub fn has_error(&self) -> bool {
        !self.errors.is_empty()
    }

    // ========================================================================
    // Token cursor
    // ========================================================================

    fn current(&self) -> &Token {
        self.peek_at(0)
    }

    fn peek_at(&self, n: usize) -> &Token {
        let idx = self.pos + n;
        if idx < self.tokens.len() {
            &self.tokens[idx]
        } else {
            self.tokens.last().expect("token buffer ends with Eof")
        }
    }

    fn at_eof(&self) -> bool {
        self.current().is_eof()
    }

    fn advance(&mut self) {
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.current().kind == kind
    }

    fn check_lexeme(&self, lexeme: &str) -> bool {
        self.current().lexeme == lexeme
    }

    fn check_keyword(&self, word: &str) -> bool {
        self.check(TokenKind::Keyword) && self.check_lexeme(word)
    }

    fn match_lexeme(&mut self, lexeme: &str) -> bool {
        if self.check_lexeme(lexeme) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect_lexeme(&mut self, lexeme: &str, message: &str) {
        if !self.match_lexeme(lexeme) {
            self.error(message);
        }
    }

    /// Expect an identifier and return its name.
    fn expect_identifier(&mut self, message: &str) -> Option<String> {
        if self.check(TokenKind::Identifier) {
            let name = self.current().lexeme.clone();
            self.advance();
            Some(name)
        } else {
            self.error(message);
            None
        }
    }

    fn at_eol(&self) -> bool {
        self.current().is_eol()
    }

    fn skip_eol(&mut self) {
        while self.at_eol() {
            self.advance();
        }
    }

    fn error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    // ========================================================================
    // Statements
    // ========================================================================

    fn parse_statement(&mut self) -> Option<Stmt> {
        if self.check(TokenKind::Keyword) {
            match self.current().lexeme.as_str() {
                "import" => return self.parse_import(),
                "module" => return self.parse_module_stmt(),
                "func" => return self.parse_function(),
                "var" => return self.parse_declaration(DeclKeyword::Var),
                "val" => return self.parse_declaration(DeclKeyword::Val),
                "for" => return self.parse_for(),
                "return" => return self.parse_return(),
                "if" => return self.parse_if().map(Stmt::If),
                // `true`/`false` and the type names can open an expression
                // (`str(...)` and friends); fall through.
                _ => {}
            }
        }

        if self.check(TokenKind::Identifier) {
            // `while`, `break`, `continue`, `let`, and `const` are not in
            // the keyword set; recognise them in statement position.
            match self.current().lexeme.as_str() {
                "while" => return self.parse_while(),
                "break" => {
                    self.advance();
                    self.skip_eol();
                    return Some(Stmt::Break);
                }
                "continue" => {
                    self.advance();
                    self.skip_eol();
                    return Some(Stmt::Continue);
                }
                "let" if self.peek_at(1).kind == TokenKind::Identifier => {
                    return self.parse_declaration(DeclKeyword::Let);
                }
                "const" if self.peek_at(1).kind == TokenKind::Identifier => {
                    return self.parse_declaration(DeclKeyword::Const);
                }
                _ => {}
            }
        }

        match self.current().kind {
            TokenKind::Identifier
            | TokenKind::Number
            | TokenKind::String
            | TokenKind::FormatString
            | TokenKind::Keyword => return self.parse_expression_statement(),
            _ => {}
        }

        // Block close: not a statement, handled by the caller.
        if self.check_lexeme("}") || self.check_lexeme(")") {
            return None;
        }

        self.error(format!("Unexpected token: '{}'", self.current()));
        None
    }

    fn parse_import(&mut self) -> Option<Stmt> {
        self.advance(); // `import`
        let module = self.expect_identifier("Expected identifier after 'import'")?;
        self.skip_eol();
        Some(Stmt::Import(ImportStmt { module }))
    }

    fn parse_module_stmt(&mut self) -> Option<Stmt> {
        self.advance(); // `module`
        let name = self.expect_identifier("Expected identifier after 'module'")?;
        self.skip_eol();
        Some(Stmt::Module(ModuleStmt { name }))
    }

    fn parse_function(&mut self) -> Option<Stmt> {
        self.advance(); // `func`

        let name = self.expect_identifier("Expected function name")?;

        self.expect_lexeme("(", "Expected '(' after function name");
        let params = self.parse_parameter_list();
        self.expect_lexeme(")", "Expected ')' after parameters");

        let return_type = if self.match_lexeme(":") {
            self.parse_type()
        } else {
            None
        };

        self.expect_lexeme("{", "Expected '{' at start of function body");
        self.skip_eol();
        let body = self.parse_block();
        self.expect_lexeme("}", "Expected '}' at end of function body");
        self.skip_eol();

        Some(Stmt::Function(FunctionDecl {
            name,
            params,
            return_type,
            body,
        }))
    }

    fn parse_parameter_list(&mut self) -> Vec<Param> {
        let mut params = Vec::new();
        if self.check_lexeme(")") {
            return params;
        }
        loop {
            if let Some(param) = self.parse_parameter() {
                params.push(param);
            }
            if !self.match_lexeme(",") {
                break;
            }
            if self.check_lexeme(")") || self.at_eof() {
                break;
            }
        }
        params
    }

    fn parse_parameter(&mut self) -> Option<Param> {
        let name = self.expect_identifier("Expected parameter name")?;
        let ty = if self.match_lexeme(":") {
            self.parse_type()
        } else {
            None
        };
        Some(Param { name, ty })
    }

    /// Parse a type annotation: a name, optionally followed by `[size]`
    /// for a fixed-size array.
    fn parse_type(&mut self) -> Option<TypeRef> {
        if !self.check(TokenKind::Keyword) && !self.check(TokenKind::Identifier) {
            self.error("Expected type name");
            return None;
        }
        let name = self.current().lexeme.clone();
        self.advance();

        if self.match_lexeme("[") {
            let size = self.parse_expression()?;
            self.expect_lexeme("]", "Expected ']' after array size");
            return Some(TypeRef::Array {
                element: name,
                size: Box::new(size),
            });
        }

        Some(TypeRef::Named(name))
    }

    fn parse_block(&mut self) -> Block {
        let mut block = Block::default();
        while !self.check_lexeme("}") && !self.at_eof() {
            self.skip_eol();
            if self.check_lexeme("}") || self.at_eof() {
                break;
            }
            match self.parse_statement() {
                Some(stmt) => block.statements.push(stmt),
                None => {
                    if self.check_lexeme("}") || self.at_eof() {
                        break;
                    }
                    self.advance();
                }
            }
            self.skip_eol();
        }
        block
    }

    fn parse_declaration(&mut self, keyword: DeclKeyword) -> Option<Stmt> {
        self.advance(); // the declaration word

        let name = self.expect_identifier("Expected identifier in declaration")?;

        let ty = if self.match_lexeme(":") {
            self.parse_type()
        } else {
            None
        };

        let init = if self.match_lexeme("=") {
            self.parse_expression()
        } else {
            None
        };

        self.skip_eol();
        Some(Stmt::Declaration(Declaration {
            keyword,
            name,
            ty,
            init,
        }))
    }

    fn parse_for(&mut self) -> Option<Stmt> {
        // Distinguish `for i in ...` from the C-style form, which is
        // recognised but not supported.
        let is_for_in =
            self.peek_at(1).kind == TokenKind::Identifier && self.peek_at(2).lexeme == "in";
        if !is_for_in {
            self.error("C-style for loop is not supported");
            self.advance(); // `for`
            return None;
        }

        self.advance(); // `for`
        let var = self.expect_identifier("Expected identifier in for loop")?;

        if !(self.check(TokenKind::Identifier) && self.check_lexeme("in")) {
            self.error("Expected 'in' in for loop");
            return None;
        }
        self.advance(); // `in`

        let iterable = self.parse_expression()?;

        self.expect_lexeme("{", "Expected '{' at start of loop body");
        self.skip_eol();
        let body = self.parse_block();
        self.expect_lexeme("}", "Expected '}' at end of loop body");
        self.skip_eol();

        Some(Stmt::For(ForStmt {
            var,
            iterable,
            body,
        }))
    }

    fn parse_return(&mut self) -> Option<Stmt> {
        self.advance(); // `return`
        let value = if !self.at_eol() && !self.check_lexeme("}") && !self.at_eof() {
            self.parse_expression()
        } else {
            None
        };
        self.skip_eol();
        Some(Stmt::Return(ReturnStmt { value }))
    }

    fn parse_if(&mut self) -> Option<IfStmt> {
        self.advance(); // `if`
        let cond = self.parse_expression()?;

        self.expect_lexeme("{", "Expected '{' after if condition");
        self.skip_eol();
        let then_block = self.parse_block();
        self.expect_lexeme("}", "Expected '}' after if body");
        self.skip_eol();

        let else_branch = if self.check_keyword("else") {
            self.advance();
            if self.check_keyword("if") {
                self.parse_if().map(|s| Box::new(Stmt::If(s)))
            } else {
                self.expect_lexeme("{", "Expected '{' after 'else'");
                self.skip_eol();
                let else_block = self.parse_block();
                self.expect_lexeme("}", "Expected '}' after else body");
                self.skip_eol();
                Some(Box::new(Stmt::Block(else_block)))
            }
        } else {
            None
        };

        Some(IfStmt {
            cond,
            then_branch: Box::new(Stmt::Block(then_block)),
            else_branch,
        })
    }

    fn parse_while(&mut self) -> Option<Stmt> {
        self.advance(); // `while`
        let cond = self.parse_expression()?;

        self.expect_lexeme("{", "Expected '{' after while condition");
        self.skip_eol();
        let body = self.parse_block();
        self.expect_lexeme("}", "Expected '}' after while body");
        self.skip_eol();

        Some(Stmt::While(WhileStmt { cond, body }))
    }

    fn parse_expression_statement(&mut self) -> Option<Stmt> {
        let expr = self.parse_expression()?;
        self.skip_eol();
        Some(Stmt::Expression(expr))
    }

    // ========================================================================
    // Expressions, lowest to highest precedence
    // ========================================================================

    fn parse_expression(&mut self) -> Option<Expr> {
        self.parse_assignment()
    }

    fn parse_assignment(&mut self) -> Option<Expr> {
        let expr = self.parse_logical_or()?;

        if self.match_lexeme("=") {
            // Right-associative.
            let value = self.parse_assignment()?;
            return Some(binary(expr, BinOp::Assign, value));
        }

        // Compound assignment desugars to `lhs = lhs <op> rhs`.
        for (lexeme, op) in [
            ("+=", BinOp::Add),
            ("-=", BinOp::Sub),
            ("*=", BinOp::Mul),
            ("/=", BinOp::Div),
        ] {
            if self.check_lexeme(lexeme) {
                self.advance();
                let rhs = self.parse_assignment()?;
                let combined = binary(expr.clone(), op, rhs);
                return Some(binary(expr, BinOp::Assign, combined));
            }
        }

        Some(expr)
    }

    fn parse_logical_or(&mut self) -> Option<Expr> {
        let mut expr = self.parse_logical_and()?;
        while self.match_lexeme("||") {
            let right = self.parse_logical_and()?;
            expr = binary(expr, BinOp::Or, right);
        }
        Some(expr)
    }

    fn parse_logical_and(&mut self) -> Option<Expr> {
        let mut expr = self.parse_equality()?;
        while self.match_lexeme("&&") {
            let right = self.parse_equality()?;
            expr = binary(expr, BinOp::And, right);
        }
        Some(expr)
    }

    fn parse_equality(&mut self) -> Option<Expr> {
        let mut expr = self.parse_comparison()?;
        loop {
            let op = if self.check_lexeme("==") {
                BinOp::Eq
            } else if self.check_lexeme("!=") {
                BinOp::Ne
            } else {
                break;
            };
            self.advance();
            let right = self.parse_comparison()?;
            expr = binary(expr, op, right);
        }
        Some(expr)
    }

    fn parse_comparison(&mut self) -> Option<Expr> {
        let mut expr = self.parse_additive()?;
        loop {
            let op = if self.check_lexeme("<=") {
                BinOp::Le
            } else if self.check_lexeme(">=") {
                BinOp::Ge
            } else if self.check_lexeme("<") {
                BinOp::Lt
            } else if self.check_lexeme(">") {
                BinOp::Gt
            } else {
                break;
            };
            self.advance();
            let right = self.parse_additive()?;
            expr = binary(expr, op, right);
        }
        Some(expr)
    }

    fn parse_additive(&mut self) -> Option<Expr> {
        let mut expr = self.parse_multiplicative()?;
        loop {
            let op = if self.check_lexeme("+") {
                BinOp::Add
            } else if self.check_lexeme("-") {
                BinOp::Sub
            } else {
                break;
            };
            self.advance();
            let right = self.parse_multiplicative()?;
            expr = binary(expr, op, right);
        }
        Some(expr)
    }

    fn parse_multiplicative(&mut self) -> Option<Expr> {
        let mut expr = self.parse_unary()?;
        loop {
            let op = if self.check_lexeme("*") {
                BinOp::Mul
            } else if self.check_lexeme("/") {
                BinOp::Div
            } else if self.check_lexeme("%") {
                BinOp::Mod
            } else {
                break;
            };
            self.advance();
            let right = self.parse_unary()?;
            expr = binary(expr, op, right);
        }
        Some(expr)
    }

    fn parse_unary(&mut self) -> Option<Expr> {
        let op = if self.check_lexeme("!") {
            Some(UnOp::Not)
        } else if self.check_lexeme("-") {
            Some(UnOp::Neg)
        } else if self.check_lexeme("+") {
            Some(UnOp::Pos)
        } else {
            None
        };
        if let Some(op) = op {
            self.advance();
            let operand = self.parse_unary()?;
            return Some(Expr::Unary(UnaryExpr {
                op,
                operand: Box::new(operand),
            }));
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> Option<Expr> {
        let mut expr = self.parse_primary()?;

        loop {
            if self.match_lexeme(".") {
                let Some(member) = self.expect_identifier("Expected identifier after '.'") else {
                    return Some(expr);
                };
                expr = Expr::Member(MemberExpr {
                    object: Box::new(expr),
                    member,
                });
            } else if self.check_lexeme("(") {
                let args = self.parse_call_arguments();
                expr = Expr::Call(CallExpr {
                    callee: Box::new(expr),
                    args,
                });
            } else if self.match_lexeme("[") {
                let index = self.parse_expression()?;
                self.expect_lexeme("]", "Expected ']' after index expression");
                expr = Expr::Index(IndexExpr {
                    array: Box::new(expr),
                    index: Box::new(index),
                });
            } else {
                break;
            }
        }

        Some(expr)
    }

    fn parse_primary(&mut self) -> Option<Expr> {
        match self.current().kind {
            TokenKind::Identifier => {
                let name = self.current().lexeme.clone();
                // `range(...)` is a dedicated expression form.
                if name == "range" && self.peek_at(1).lexeme == "(" {
                    return self.parse_range();
                }
                self.advance();
                Some(Expr::Identifier(name))
            }
            TokenKind::Number => {
                let lexeme = self.current().lexeme.clone();
                self.advance();
                match lexeme.parse::<f64>() {
                    Ok(value) => Some(Expr::Number(value)),
                    Err(_) => {
                        self.error(format!("Invalid number literal: '{}'", lexeme));
                        None
                    }
                }
            }
            TokenKind::String => {
                let raw = self.current().lexeme.clone();
                self.advance();
                Some(Expr::Str(decode_escapes(&raw)))
            }
            TokenKind::FormatString => {
                let raw = self.current().lexeme.clone();
                self.advance();
                match FormatString::parse(&raw) {
                    Ok(fs) => Some(Expr::Format(fs)),
                    Err(message) => {
                        self.error(message);
                        Some(Expr::Str(decode_escapes(&raw)))
                    }
                }
            }
            TokenKind::Keyword => {
                let lexeme = self.current().lexeme.clone();
                match lexeme.as_str() {
                    "true" => {
                        self.advance();
                        Some(Expr::Bool(true))
                    }
                    "false" => {
                        self.advance();
                        Some(Expr::Bool(false))
                    }
                    // The conversion builtins share their names with the
                    // type keywords; admit them as callees.
                    name @ ("int" | "float" | "str") if self.peek_at(1).lexeme == "(" => {
                        let name = name.to_string();
                        self.advance();
                        Some(Expr::Identifier(name))
                    }
                    other => {
                        self.error(format!("Unexpected token in expression: '{}'", other));
                        None
                    }
                }
            }
            TokenKind::Operator if self.check_lexeme("(") => {
                self.advance();
                let expr = self.parse_expression()?;
                self.expect_lexeme(")", "Expected ')' after expression");
                Some(Expr::Grouped(Box::new(expr)))
            }
            _ => {
                self.error(format!(
                    "Unexpected token in expression: '{}'",
                    self.current()
                ));
                None
            }
        }
    }

    fn parse_call_arguments(&mut self) -> Vec<Expr> {
        self.expect_lexeme("(", "Expected '(' in function call");
        let mut args = Vec::new();
        if !self.check_lexeme(")") {
            loop {
                if let Some(arg) = self.parse_expression() {
                    args.push(arg);
                }
                if !self.match_lexeme(",") {
                    break;
                }
                if self.check_lexeme(")") || self.at_eof() {
                    break;
                }
            }
        }
        self.expect_lexeme(")", "Expected ')' after arguments");
        args
    }

    fn parse_range(&mut self) -> Option<Expr> {
        self.advance(); // `range`
        let args = self.parse_call_arguments();
        Some(Expr::Range(RangeExpr { args }))
    }
}

fn binary(left: Expr, op: BinOp, right: Expr) -> Expr {
    Expr::Binary(BinaryExpr {
        left: Box::new(left),
        op,
        right: Box::new(right),
    })
}
