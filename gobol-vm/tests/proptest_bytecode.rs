// gobol-vm - Property-based bytecode tests
// Copyright (c) 2026 The Gobol Project. MIT licensed.

//! Properties over generated programs:
//! - every jump target in the final bytecode lies inside the code
//!   sequence;
//! - integer and string literals are deduplicated in the constant pool;
//! - execution leaves the eval stack balanced.

use gobol_core::Value;
use gobol_parser::Parser;
use gobol_vm::{BytecodeModule, Compiler, VM};
use proptest::prelude::*;

fn compile(source: &str) -> BytecodeModule {
    let mut parser = Parser::new(source);
    let program = parser.parse_program();
    assert!(
        !parser.has_error(),
        "unexpected parse errors in {:?}: {:?}",
        source,
        parser.errors()
    );
    let (module, diagnostics) = Compiler::new().compile(&program);
    assert!(diagnostics.is_empty(), "diagnostics: {:?}", diagnostics);
    module
}

/// Arithmetic expression sources over small integer literals. Division
/// and modulo are excluded so execution cannot hit zero divisors.
fn arb_expr() -> impl Strategy<Value = String> {
    let leaf = (0i64..50).prop_map(|n| n.to_string());
    leaf.prop_recursive(3, 24, 2, |inner| {
        (inner.clone(), prop_oneof!["\\+", "-", "\\*"], inner)
            .prop_map(|(a, op, b)| format!("({} {} {})", a, op, b))
    })
}

/// Whole programs: a few declarations, optionally wrapped in control
/// flow.
fn arb_program() -> impl Strategy<Value = String> {
    (
        arb_expr(),
        arb_expr(),
        arb_expr(),
        0usize..3,
    )
        .prop_map(|(a, b, c, shape)| match shape {
            0 => format!("var x = {}\nvar y = {}\nvar z = {}\n", a, b, c),
            1 => format!(
                "var x = {}\nif x >= 0 {{\n  x = {}\n}} else {{\n  x = {}\n}}\n",
                a, b, c
            ),
            _ => format!(
                "var x = {}\nvar n: int = 0\nwhile n < 3 {{\n  n = n + 1\n  x = x + {}\n}}\nvar z = {}\n",
                a, b, c
            ),
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Jump targets are closed over the final code sequence.
    #[test]
    fn jump_targets_are_closed(source in arb_program()) {
        let module = compile(&source);
        prop_assert!(module.jumps_are_closed(), "open jump in:\n{}\n{}", source, module);
    }

    /// Integer literals are interned once each.
    #[test]
    fn int_constants_deduplicated(source in arb_program()) {
        let module = compile(&source);
        let mut seen = std::collections::HashSet::new();
        for constant in &module.constants {
            if let Value::Int(n) = constant {
                prop_assert!(seen.insert(*n), "duplicate int constant {} in:\n{}", n, source);
            }
        }
    }

    /// Running any generated program leaves the eval stack empty.
    #[test]
    fn execution_balances_the_stack(source in arb_program()) {
        let module = compile(&source);
        let mut sink = Vec::new();
        let mut vm = VM::with_output(Box::new(&mut sink));
        prop_assert!(vm.run(module).is_ok());
        prop_assert_eq!(vm.stack_len(), 0, "unbalanced stack for:\n{}", source);
    }

    /// String literals are interned once each.
    #[test]
    fn str_constants_deduplicated(word in "[a-z]{1,6}") {
        let source = format!(
            "var a = \"{w}\"\nvar b = \"{w}\"\nvar c = \"{w}\" + \"{w}\"\n",
            w = word
        );
        let module = compile(&source);
        let count = module
            .constants
            .iter()
            .filter(|v| **v == Value::Str(word.clone()))
            .count();
        prop_assert_eq!(count, 1);
    }
}
