// gobol-parser - Abstract syntax tree for Gobol
// Copyright (c) 2026 The Gobol Project. MIT licensed.

//! Abstract syntax tree node definitions.
//!
//! The tree is a pair of tagged sums, [`Stmt`] and [`Expr`], rooted at a
//! [`Program`]. Children are owned uniquely through boxes, so dropping the
//! root frees the whole tree and no parent back-pointers exist.

use std::fmt;

/// The root of a parsed source file.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    pub statements: Vec<Stmt>,
}

/// A statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Import(ImportStmt),
    Module(ModuleStmt),
    Function(FunctionDecl),
    Block(Block),
    Declaration(Declaration),
    If(IfStmt),
    While(WhileStmt),
    For(ForStmt),
    Return(ReturnStmt),
    Break,
    Continue,
    Expression(Expr),
}

/// `import <module>`
#[derive(Debug, Clone, PartialEq)]
pub struct ImportStmt {
    pub module: String,
}

/// `module <name>`
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleStmt {
    pub name: String,
}

/// `func name(params): type { body }`
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDecl {
    pub name: String,
    pub params: Vec<Param>,
    pub return_type: Option<TypeRef>,
    pub body: Block,
}

/// A `{ ... }` statement sequence.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Block {
    pub statements: Vec<Stmt>,
}

/// Which word introduced a declaration.
///
/// `var` and `let` declare mutable bindings, `val` and `const` immutable
/// ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclKeyword {
    Var,
    Val,
    Let,
    Const,
}

impl DeclKeyword {
    pub fn is_mutable(self) -> bool {
        matches!(self, DeclKeyword::Var | DeclKeyword::Let)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DeclKeyword::Var => "var",
            DeclKeyword::Val => "val",
            DeclKeyword::Let => "let",
            DeclKeyword::Const => "const",
        }
    }
}

/// `var name: type = init`
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    pub keyword: DeclKeyword,
    pub name: String,
    pub ty: Option<TypeRef>,
    pub init: Option<Expr>,
}

/// `if cond { ... } else ...`
#[derive(Debug, Clone, PartialEq)]
pub struct IfStmt {
    pub cond: Expr,
    pub then_branch: Box<Stmt>,
    pub else_branch: Option<Box<Stmt>>,
}

/// `while cond { ... }`
#[derive(Debug, Clone, PartialEq)]
pub struct WhileStmt {
    pub cond: Expr,
    pub body: Block,
}

/// `for var in iterable { ... }`
#[derive(Debug, Clone, PartialEq)]
pub struct ForStmt {
    pub var: String,
    pub iterable: Expr,
    pub body: Block,
}

/// `return expr?`
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnStmt {
    pub value: Option<Expr>,
}

/// A type annotation.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeRef {
    /// `int`, `float`, `str`, `bool`, or a user name.
    Named(String),
    /// `element[size]`, a fixed-size array whose size is an expression
    /// evaluated at semantic time to an `int`.
    Array { element: String, size: Box<Expr> },
}

impl TypeRef {
    /// The type name, which for arrays is the element type name.
    pub fn name(&self) -> &str {
        match self {
            TypeRef::Named(name) => name,
            TypeRef::Array { element, .. } => element,
        }
    }
}

/// A function parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub ty: Option<TypeRef>,
}

/// An expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Binary(BinaryExpr),
    Unary(UnaryExpr),
    Call(CallExpr),
    Member(MemberExpr),
    Index(IndexExpr),
    Grouped(Box<Expr>),
    Identifier(String),
    Number(f64),
    /// String literal, already escape-decoded.
    Str(String),
    Bool(bool),
    Format(FormatString),
    Range(RangeExpr),
}

/// A binary operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Assign,
    Or,
    And,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

impl BinOp {
    pub fn as_str(self) -> &'static str {
        match self {
            BinOp::Assign => "=",
            BinOp::Or => "||",
            BinOp::And => "&&",
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
            BinOp::Lt => "<",
            BinOp::Le => "<=",
            BinOp::Gt => ">",
            BinOp::Ge => ">=",
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "%",
        }
    }

    pub fn is_arithmetic(self) -> bool {
        matches!(
            self,
            BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div | BinOp::Mod
        )
    }

    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinOp::Eq | BinOp::Ne | BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge
        )
    }
}

impl fmt::Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A unary prefix operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    Neg,
    Pos,
    Not,
}

impl UnOp {
    pub fn as_str(self) -> &'static str {
        match self {
            UnOp::Neg => "-",
            UnOp::Pos => "+",
            UnOp::Not => "!",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BinaryExpr {
    pub left: Box<Expr>,
    pub op: BinOp,
    pub right: Box<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnaryExpr {
    pub op: UnOp,
    pub operand: Box<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CallExpr {
    pub callee: Box<Expr>,
    pub args: Vec<Expr>,
}

impl CallExpr {
    /// Flatten the callee into a dotted name: a bare identifier gives
    /// `name`, a member access on an identifier gives `object.member`.
    /// Anything else is not callable in Gobol.
    pub fn flat_name(&self) -> Option<String> {
        match self.callee.as_ref() {
            Expr::Identifier(name) => Some(name.clone()),
            Expr::Member(member) => match member.object.as_ref() {
                Expr::Identifier(object) => Some(format!("{}.{}", object, member.member)),
                _ => None,
            },
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MemberExpr {
    pub object: Box<Expr>,
    pub member: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndexExpr {
    pub array: Box<Expr>,
    pub index: Box<Expr>,
}

/// `range(start, end)` or `range(start, end, step)`.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeExpr {
    pub args: Vec<Expr>,
}

/// A `@"..."` literal with its embedded placeholder expressions.
#[derive(Debug, Clone, PartialEq)]
pub struct FormatString {
    /// Raw content between the quotes, escapes untouched.
    pub raw: String,
    /// Placeholders in order of appearance.
    pub placeholders: Vec<Placeholder>,
}

/// One `{...}` segment of a format string.
#[derive(Debug, Clone, PartialEq)]
pub struct Placeholder {
    /// Byte offset of the opening brace in [`FormatString::raw`].
    pub offset: usize,
    /// The reparsed placeholder expression.
    pub expr: Expr,
}

impl FormatString {
    /// Extract placeholders from the raw content of a format-string token.
    ///
    /// Each `{...}` segment is reparsed from its textual form with a
    /// right-to-left rule: a trailing `[...]` forms an index, otherwise
    /// the rightmost `.` forms a member access, otherwise the content is
    /// a plain identifier or literal. Nesting is not supported and
    /// whitespace is significant. Empty `{}` segments are skipped.
    pub fn parse(raw: &str) -> Result<FormatString, String> {
        let mut placeholders = Vec::new();
        let mut in_brace = false;
        let mut start = 0;
        let mut content = String::new();

        for (offset, c) in raw.char_indices() {
            if c == '{' && !in_brace {
                in_brace = true;
                content.clear();
                start = offset;
            } else if c == '}' && in_brace {
                in_brace = false;
                if !content.is_empty() {
                    match parse_placeholder(&content) {
                        Some(expr) => placeholders.push(Placeholder {
                            offset: start,
                            expr,
                        }),
                        None => {
                            return Err(format!(
                                "Malformed format string placeholder: '{{{}}}'",
                                content
                            ));
                        }
                    }
                }
            } else if in_brace {
                content.push(c);
            }
        }

        Ok(FormatString {
            raw: raw.to_string(),
            placeholders,
        })
    }
}

/// Decode the escape sequences of a string or format-string literal.
///
/// Recognises `\n`, `\t`, `\\`, and `\"`; any other backslash sequence
/// falls through with the backslash kept verbatim.
pub fn decode_escapes(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.peek() {
                Some('n') => {
                    out.push('\n');
                    chars.next();
                }
                Some('t') => {
                    out.push('\t');
                    chars.next();
                }
                Some('\\') => {
                    out.push('\\');
                    chars.next();
                }
                Some('"') => {
                    out.push('"');
                    chars.next();
                }
                _ => out.push(c),
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Parse the textual content of a placeholder: first as a literal, then
/// as an identifier, member access, or index chain.
fn parse_placeholder(text: &str) -> Option<Expr> {
    if text.is_empty() {
        return None;
    }
    if let Some(literal) = try_parse_literal(text) {
        return Some(literal);
    }
    parse_placeholder_expr(text)
}

fn try_parse_literal(text: &str) -> Option<Expr> {
    // Number literal: digits with at most one decimal point.
    let mut has_dot = false;
    let mut is_number = !text.is_empty();
    for c in text.chars() {
        if c == '.' {
            if has_dot {
                is_number = false;
                break;
            }
            has_dot = true;
        } else if !c.is_ascii_digit() {
            is_number = false;
            break;
        }
    }
    if is_number {
        if let Ok(value) = text.parse::<f64>() {
            return Some(Expr::Number(value));
        }
    }

    // String literal.
    if text.len() >= 2 && text.starts_with('"') && text.ends_with('"') {
        let content = &text[1..text.len() - 1];
        return Some(Expr::Str(decode_escapes(content)));
    }

    // Boolean literal.
    match text {
        "true" => Some(Expr::Bool(true)),
        "false" => Some(Expr::Bool(false)),
        _ => None,
    }
}

fn parse_placeholder_expr(text: &str) -> Option<Expr> {
    // Rightmost `[` whose matching `]` closes the whole expression.
    if let Some(open) = text.rfind('[') {
        if let Some(close) = text[open..].find(']') {
            if open + close == text.len() - 1 {
                let array = parse_placeholder_expr(&text[..open])?;
                let index = parse_placeholder(&text[open + 1..text.len() - 1])?;
                return Some(Expr::Index(IndexExpr {
                    array: Box::new(array),
                    index: Box::new(index),
                }));
            }
        }
    }

    // Rightmost `.` forms a member access when the member part is a word.
    if let Some(dot) = text.rfind('.') {
        let member = &text[dot + 1..];
        let valid = !member.is_empty() && member.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
        if valid {
            let object = parse_placeholder_expr(&text[..dot])?;
            return Some(Expr::Member(MemberExpr {
                object: Box::new(object),
                member: member.to_string(),
            }));
        }
    }

    // A plain identifier.
    let mut chars = text.chars();
    let leading_ok = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_');
    if leading_ok && chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Some(Expr::Identifier(text.to_string()));
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_escapes() {
        assert_eq!(decode_escapes(r"a\nb\tc"), "a\nb\tc");
        assert_eq!(decode_escapes(r#"\"x\\"#), "\"x\\");
        // unknown escapes keep the backslash
        assert_eq!(decode_escapes(r"\q"), r"\q");
    }

    #[test]
    fn test_format_string_simple_identifier() {
        let fs = FormatString::parse("Hello {name}!").unwrap();
        assert_eq!(fs.placeholders.len(), 1);
        assert_eq!(fs.placeholders[0].offset, 6);
        assert_eq!(fs.placeholders[0].expr, Expr::Identifier("name".into()));
    }

    #[test]
    fn test_format_string_member_and_index() {
        let fs = FormatString::parse("{a.b} {xs[2]}").unwrap();
        assert!(matches!(fs.placeholders[0].expr, Expr::Member(_)));
        match &fs.placeholders[1].expr {
            Expr::Index(ix) => {
                assert_eq!(*ix.array, Expr::Identifier("xs".into()));
                assert_eq!(*ix.index, Expr::Number(2.0));
            }
            other => panic!("expected index, got {:?}", other),
        }
    }

    #[test]
    fn test_format_string_offsets_point_at_braces() {
        let fs = FormatString::parse("ab{x}cd{y}").unwrap();
        for p in &fs.placeholders {
            assert_eq!(fs.raw.as_bytes()[p.offset], b'{');
        }
    }

    #[test]
    fn test_format_string_empty_braces_skipped() {
        let fs = FormatString::parse("a{}b").unwrap();
        assert!(fs.placeholders.is_empty());
    }

    #[test]
    fn test_format_string_bad_placeholder() {
        assert!(FormatString::parse("{1+2}").is_err());
    }

    #[test]
    fn test_call_flat_name() {
        let call = CallExpr {
            callee: Box::new(Expr::Member(MemberExpr {
                object: Box::new(Expr::Identifier("io".into())),
                member: "print".into(),
            })),
            args: vec![],
        };
        assert_eq!(call.flat_name().as_deref(), Some("io.print"));
    }
}
