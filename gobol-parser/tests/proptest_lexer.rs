// gobol-parser - Property-based lexer tests
// Copyright (c) 2026 The Gobol Project. MIT licensed.

//! Lexeme-preservation round trip: every token produced from a source
//! re-lexes from its own lexeme to an identical token. `Eol`, `Eof`,
//! and the quoted literal kinds (whose lexemes drop their delimiters)
//! are exempt by definition.

use gobol_parser::{Lexer, TokenKind};
use proptest::prelude::*;

/// A lexeme that stands alone: identifiers, keywords, numbers, and
/// operators.
fn arb_lexeme() -> impl Strategy<Value = String> {
    prop_oneof![
        // identifiers
        "[a-z_][a-z0-9_]{0,8}".prop_map(|s| s),
        // keywords
        prop_oneof![
            Just("if".to_string()),
            Just("else".to_string()),
            Just("for".to_string()),
            Just("return".to_string()),
            Just("func".to_string()),
            Just("var".to_string()),
            Just("val".to_string()),
            Just("module".to_string()),
            Just("import".to_string()),
            Just("true".to_string()),
            Just("false".to_string()),
        ],
        // numbers
        (0u32..100_000).prop_map(|n| n.to_string()),
        (0u32..1000, 1u32..1000).prop_map(|(a, b)| format!("{}.{}", a, b)),
        // operators
        prop_oneof![
            Just("+".to_string()),
            Just("-".to_string()),
            Just("*".to_string()),
            Just("/".to_string()),
            Just("%".to_string()),
            Just("=".to_string()),
            Just("==".to_string()),
            Just("!=".to_string()),
            Just("<".to_string()),
            Just("<=".to_string()),
            Just(">".to_string()),
            Just(">=".to_string()),
            Just("&&".to_string()),
            Just("||".to_string()),
            Just("!".to_string()),
            Just("(".to_string()),
            Just(")".to_string()),
            Just("{".to_string()),
            Just("}".to_string()),
            Just("[".to_string()),
            Just("]".to_string()),
            Just(":".to_string()),
            Just(".".to_string()),
            Just(",".to_string()),
            Just("+=".to_string()),
            Just("-=".to_string()),
            Just("*=".to_string()),
            Just("/=".to_string()),
        ],
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Lexing space-joined lexemes and re-lexing each produced lexeme
    /// yields the same token again.
    #[test]
    fn lexeme_round_trip(lexemes in prop::collection::vec(arb_lexeme(), 1..20)) {
        let source = lexemes.join(" ");
        let tokens = Lexer::new(&source).tokenize();

        for token in &tokens {
            if matches!(token.kind, TokenKind::Eol | TokenKind::Eof) {
                continue;
            }
            let relexed = Lexer::new(&token.lexeme).tokenize();
            prop_assert_eq!(relexed.len(), 2, "lexeme {:?} split on re-lex", token.lexeme);
            prop_assert_eq!(&relexed[0], token);
            prop_assert_eq!(relexed[1].kind, TokenKind::Eof);
        }
    }

    /// The token count matches the input lexeme count (plus Eof):
    /// space separation never merges or splits tokens.
    #[test]
    fn space_separated_lexemes_stay_separate(lexemes in prop::collection::vec(arb_lexeme(), 1..20)) {
        let source = lexemes.join(" ");
        let tokens = Lexer::new(&source).tokenize();
        prop_assert_eq!(tokens.len(), lexemes.len() + 1);
        for (token, lexeme) in tokens.iter().zip(&lexemes) {
            prop_assert_eq!(&token.lexeme, lexeme);
        }
    }
}
