// gobol-parser - Lexer for Gobol
// Copyright (c) 2026 The Gobol Project. MIT licensed.

//! Lexer (tokeniser) for Gobol source code.
//!
//! Converts a source string into a stream of tokens. Newlines are
//! preserved as `Eol` tokens; all other whitespace and both `//` and
//! `/* */` comments are elided.

use crate::token::{Token, TokenKind, is_keyword};

/// The lexer converts source code into tokens.
pub struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    column: usize,
}

impl Lexer {
    /// Create a new lexer for the given source code.
    pub fn new(source: &str) -> Self {
        Lexer {
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
            column: 0,
        }
    }

    /// Get the current line number (1-indexed).
    pub fn line(&self) -> usize {
        self.line
    }

    /// Get the current column number.
    pub fn column(&self) -> usize {
        self.column
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn peek(&self) -> char {
        self.chars.get(self.pos).copied().unwrap_or('\0')
    }

    fn peek_next(&self) -> char {
        self.chars.get(self.pos + 1).copied().unwrap_or('\0')
    }

    fn advance(&mut self) -> char {
        if self.is_at_end() {
            return '\0';
        }
        let c = self.chars[self.pos];
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 0;
        } else {
            self.column += 1;
        }
        c
    }

    fn skip_line_comment(&mut self) {
        while !self.is_at_end() && self.peek() != '\n' {
            self.advance();
        }
    }

    fn skip_block_comment(&mut self) {
        // Opening "/*" already consumed except the '*'.
        self.advance();
        while !self.is_at_end() {
            if self.peek() == '*' && self.peek_next() == '/' {
                self.advance();
                self.advance();
                return;
            }
            self.advance();
        }
    }

    /// Get the next token from the source.
    pub fn next_token(&mut self) -> Token {
        // Skip non-lexical content: whitespace (except newlines) and comments.
        while !self.is_at_end() {
            let c = self.peek();
            if c.is_whitespace() && c != '\n' {
                self.advance();
                continue;
            }
            if c == '/' && self.peek_next() == '/' {
                self.skip_line_comment();
                continue;
            }
            if c == '/' && self.peek_next() == '*' {
                self.advance();
                self.skip_block_comment();
                continue;
            }
            break;
        }

        if self.is_at_end() {
            return Token::eof();
        }

        let c = self.peek();

        if c == '\n' {
            self.advance();
            return Token::new(TokenKind::Eol, "\n");
        }

        if c.is_ascii_alphabetic() || c == '_' {
            return self.read_identifier();
        }
        if c.is_ascii_digit() {
            return self.read_number();
        }
        if c == '"' {
            return self.read_string();
        }

        self.read_operator()
    }

    /// Collect all tokens into a buffer, ending with an `Eof` token.
    pub fn tokenize(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            let done = token.is_eof();
            tokens.push(token);
            if done {
                break;
            }
        }
        tokens
    }

    fn read_identifier(&mut self) -> Token {
        let start = self.pos;
        while !self.is_at_end() && (self.peek().is_ascii_alphanumeric() || self.peek() == '_') {
            self.advance();
        }
        let word: String = self.chars[start..self.pos].iter().collect();
        if is_keyword(&word) {
            Token::new(TokenKind::Keyword, word)
        } else {
            Token::new(TokenKind::Identifier, word)
        }
    }

    fn read_number(&mut self) -> Token {
        let start = self.pos;
        let mut has_decimal = false;
        while !self.is_at_end() {
            let c = self.peek();
            if c.is_ascii_digit() {
                self.advance();
            } else if c == '.' && !has_decimal && self.peek_next().is_ascii_digit() {
                has_decimal = true;
                self.advance();
            } else {
                break;
            }
        }
        let number: String = self.chars[start..self.pos].iter().collect();
        Token::new(TokenKind::Number, number)
    }

    /// Read a string literal. The lexeme is the raw content between the
    /// quotes with escape sequences untouched; decoding happens when the
    /// AST node is built. An unterminated string becomes `Unknown`.
    fn read_string(&mut self) -> Token {
        self.advance(); // opening quote
        let start = self.pos;
        let mut closed = false;
        while !self.is_at_end() {
            let c = self.peek();
            if c == '"' {
                closed = true;
                break;
            }
            if c == '\\' && self.peek_next() != '\0' {
                self.advance();
            }
            self.advance();
        }
        let content: String = self.chars[start..self.pos].iter().collect();
        if closed {
            self.advance(); // closing quote
            Token::new(TokenKind::String, content)
        } else {
            Token::new(TokenKind::Unknown, content)
        }
    }

    fn read_operator(&mut self) -> Token {
        let c = self.advance();
        let op = |lexeme: &str| Token::new(TokenKind::Operator, lexeme);

        match c {
            '+' | '-' | '*' | '/' => {
                if self.peek() == '=' {
                    self.advance();
                    op(&format!("{}=", c))
                } else {
                    op(&c.to_string())
                }
            }
            '%' => op("%"),
            '=' => {
                if self.peek() == '=' {
                    self.advance();
                    op("==")
                } else {
                    op("=")
                }
            }
            '!' => {
                if self.peek() == '=' {
                    self.advance();
                    op("!=")
                } else {
                    op("!")
                }
            }
            '<' => {
                if self.peek() == '=' {
                    self.advance();
                    op("<=")
                } else {
                    op("<")
                }
            }
            '>' => {
                if self.peek() == '=' {
                    self.advance();
                    op(">=")
                } else {
                    op(">")
                }
            }
            '&' => {
                if self.peek() == '&' {
                    self.advance();
                    op("&&")
                } else {
                    Token::new(TokenKind::Unknown, "&")
                }
            }
            '|' => {
                if self.peek() == '|' {
                    self.advance();
                    op("||")
                } else {
                    Token::new(TokenKind::Unknown, "|")
                }
            }
            '(' | ')' | '{' | '}' | '[' | ']' | ':' | '.' | ',' => op(&c.to_string()),
            '@' => {
                // `@` immediately before a string literal introduces a
                // format string; anywhere else it is invalid.
                if self.peek() == '"' {
                    let inner = self.read_string();
                    match inner.kind {
                        TokenKind::String => Token::new(TokenKind::FormatString, inner.lexeme),
                        _ => Token::new(TokenKind::Unknown, inner.lexeme),
                    }
                } else {
                    Token::new(TokenKind::Unknown, "@")
                }
            }
            other => Token::new(TokenKind::Unknown, other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Lexer::new(source).tokenize().iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_keywords_and_identifiers() {
        let tokens = Lexer::new("var x import io while").tokenize();
        assert_eq!(tokens[0].kind, TokenKind::Keyword);
        assert_eq!(tokens[1].kind, TokenKind::Identifier);
        assert_eq!(tokens[2].kind, TokenKind::Keyword);
        assert_eq!(tokens[3].kind, TokenKind::Identifier);
        // `while` is not in the keyword set
        assert_eq!(tokens[4].kind, TokenKind::Identifier);
    }

    #[test]
    fn test_booleans_are_keyword_tokens() {
        let tokens = Lexer::new("true false").tokenize();
        assert_eq!(tokens[0].kind, TokenKind::Keyword);
        assert_eq!(tokens[1].kind, TokenKind::Keyword);
    }

    #[test]
    fn test_multi_char_operators() {
        let tokens = Lexer::new("== != <= >= && || += -= *= /=").tokenize();
        let lexemes: Vec<&str> = tokens
            .iter()
            .filter(|t| t.kind == TokenKind::Operator)
            .map(|t| t.lexeme.as_str())
            .collect();
        assert_eq!(
            lexemes,
            vec!["==", "!=", "<=", ">=", "&&", "||", "+=", "-=", "*=", "/="]
        );
    }

    #[test]
    fn test_newlines_preserved_comments_elided() {
        assert_eq!(
            kinds("1 // comment\n2 /* block\ncomment */ 3"),
            vec![
                TokenKind::Number,
                TokenKind::Eol,
                TokenKind::Number,
                TokenKind::Number,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_format_string_token() {
        let tokens = Lexer::new("@\"Hello {name}\"").tokenize();
        assert_eq!(tokens[0].kind, TokenKind::FormatString);
        assert_eq!(tokens[0].lexeme, "Hello {name}");
    }

    #[test]
    fn test_bare_at_is_unknown() {
        let tokens = Lexer::new("@x").tokenize();
        assert_eq!(tokens[0].kind, TokenKind::Unknown);
        assert_eq!(tokens[0].lexeme, "@");
    }

    #[test]
    fn test_string_keeps_raw_escapes() {
        let tokens = Lexer::new(r#""a\n\"b""#).tokenize();
        assert_eq!(tokens[0].kind, TokenKind::String);
        assert_eq!(tokens[0].lexeme, r#"a\n\"b"#);
    }

    #[test]
    fn test_unterminated_string_is_unknown() {
        let tokens = Lexer::new("\"oops").tokenize();
        assert_eq!(tokens[0].kind, TokenKind::Unknown);
    }

    #[test]
    fn test_number_decimal_needs_digit() {
        let tokens = Lexer::new("1.5 2.").tokenize();
        assert_eq!(tokens[0].lexeme, "1.5");
        assert_eq!(tokens[1].lexeme, "2");
        assert_eq!(tokens[2].lexeme, ".");
    }
}
