// gobol-parser - Parser tests
// Copyright (c) 2026 The Gobol Project. MIT licensed.

use gobol_parser::ast::{
    BinOp, DeclKeyword, Expr, Stmt, TypeRef, UnOp,
};
use gobol_parser::Parser;

fn parse_ok(source: &str) -> gobol_parser::Program {
    let mut parser = Parser::new(source);
    let program = parser.parse_program();
    assert!(
        !parser.has_error(),
        "unexpected parse errors: {:?}",
        parser.errors()
    );
    program
}

fn parse_single_expr(source: &str) -> Expr {
    let program = parse_ok(source);
    match program.statements.into_iter().next() {
        Some(Stmt::Expression(expr)) => expr,
        other => panic!("expected expression statement, got {:?}", other),
    }
}

#[test]
fn test_import_and_module() {
    let program = parse_ok("import io\nmodule main\n");
    assert_eq!(program.statements.len(), 2);
    assert!(matches!(&program.statements[0], Stmt::Import(i) if i.module == "io"));
    assert!(matches!(&program.statements[1], Stmt::Module(m) if m.name == "main"));
}

#[test]
fn test_declaration_forms() {
    let program = parse_ok("var a: int = 1\nval b = 2\nlet c: float\nconst d = 4\n");
    let keywords: Vec<DeclKeyword> = program
        .statements
        .iter()
        .map(|s| match s {
            Stmt::Declaration(d) => d.keyword,
            other => panic!("expected declaration, got {:?}", other),
        })
        .collect();
    assert_eq!(
        keywords,
        vec![
            DeclKeyword::Var,
            DeclKeyword::Val,
            DeclKeyword::Let,
            DeclKeyword::Const
        ]
    );
}

#[test]
fn test_array_type_declaration() {
    let program = parse_ok("var a: int[3] = 0\n");
    let Stmt::Declaration(decl) = &program.statements[0] else {
        panic!("expected declaration");
    };
    match &decl.ty {
        Some(TypeRef::Array { element, size }) => {
            assert_eq!(element, "int");
            assert_eq!(**size, Expr::Number(3.0));
        }
        other => panic!("expected array type, got {:?}", other),
    }
    assert_eq!(decl.init, Some(Expr::Number(0.0)));
}

#[test]
fn test_function_with_params_and_return_type() {
    let program = parse_ok("func add(a: int, b: int): int {\n  return a + b\n}\n");
    let Stmt::Function(func) = &program.statements[0] else {
        panic!("expected function");
    };
    assert_eq!(func.name, "add");
    assert_eq!(func.params.len(), 2);
    assert_eq!(func.params[0].name, "a");
    assert_eq!(func.return_type, Some(TypeRef::Named("int".into())));
    assert_eq!(func.body.statements.len(), 1);
    assert!(matches!(&func.body.statements[0], Stmt::Return(r) if r.value.is_some()));
}

#[test]
fn test_for_in_loop() {
    let program = parse_ok("for i in range(0, 5, 1) {\n  x = x + i\n}\n");
    let Stmt::For(stmt) = &program.statements[0] else {
        panic!("expected for loop");
    };
    assert_eq!(stmt.var, "i");
    match &stmt.iterable {
        Expr::Range(range) => assert_eq!(range.args.len(), 3),
        other => panic!("expected range, got {:?}", other),
    }
    assert_eq!(stmt.body.statements.len(), 1);
}

#[test]
fn test_c_style_for_is_a_diagnostic() {
    let mut parser = Parser::new("for (i = 0; i < 3; i = i + 1) { }\n");
    parser.parse_program();
    assert!(parser.has_error());
    assert!(
        parser
            .errors()
            .iter()
            .any(|e| e.contains("C-style for loop"))
    );
}

#[test]
fn test_if_else_chain() {
    let program = parse_ok("if x < 1 {\n  y = 1\n} else if x < 2 {\n  y = 2\n} else {\n  y = 3\n}\n");
    let Stmt::If(stmt) = &program.statements[0] else {
        panic!("expected if");
    };
    let Some(else_branch) = &stmt.else_branch else {
        panic!("expected else branch");
    };
    let Stmt::If(nested) = else_branch.as_ref() else {
        panic!("expected else-if, got {:?}", else_branch);
    };
    assert!(nested.else_branch.is_some());
}

#[test]
fn test_while_break_continue() {
    let program = parse_ok("while x < 10 {\n  if x == 5 {\n    break\n  }\n  continue\n}\n");
    let Stmt::While(stmt) = &program.statements[0] else {
        panic!("expected while");
    };
    let Stmt::If(inner) = &stmt.body.statements[0] else {
        panic!("expected if in body");
    };
    let Stmt::Block(then_block) = inner.then_branch.as_ref() else {
        panic!("expected block");
    };
    assert_eq!(then_block.statements[0], Stmt::Break);
    assert_eq!(stmt.body.statements[1], Stmt::Continue);
}

#[test]
fn test_precedence_multiplicative_binds_tighter() {
    let expr = parse_single_expr("1 + 2 * 3\n");
    let Expr::Binary(add) = expr else {
        panic!("expected binary");
    };
    assert_eq!(add.op, BinOp::Add);
    assert_eq!(*add.left, Expr::Number(1.0));
    let Expr::Binary(mul) = *add.right else {
        panic!("expected nested multiplication");
    };
    assert_eq!(mul.op, BinOp::Mul);
}

#[test]
fn test_assignment_is_right_associative() {
    let expr = parse_single_expr("a = b = 1\n");
    let Expr::Binary(outer) = expr else {
        panic!("expected binary");
    };
    assert_eq!(outer.op, BinOp::Assign);
    assert_eq!(*outer.left, Expr::Identifier("a".into()));
    let Expr::Binary(inner) = *outer.right else {
        panic!("expected nested assignment");
    };
    assert_eq!(inner.op, BinOp::Assign);
}

#[test]
fn test_compound_assignment_desugars() {
    let expr = parse_single_expr("x += 2\n");
    let Expr::Binary(assign) = expr else {
        panic!("expected binary");
    };
    assert_eq!(assign.op, BinOp::Assign);
    let Expr::Binary(add) = *assign.right else {
        panic!("expected desugared addition");
    };
    assert_eq!(add.op, BinOp::Add);
    assert_eq!(*add.left, Expr::Identifier("x".into()));
    assert_eq!(*add.right, Expr::Number(2.0));
}

#[test]
fn test_postfix_chain_member_call_index() {
    let expr = parse_single_expr("io.print(xs[0])\n");
    let Expr::Call(call) = expr else {
        panic!("expected call");
    };
    assert_eq!(call.flat_name().as_deref(), Some("io.print"));
    assert_eq!(call.args.len(), 1);
    assert!(matches!(&call.args[0], Expr::Index(_)));
}

#[test]
fn test_unary_operators_nest() {
    let expr = parse_single_expr("!-x\n");
    let Expr::Unary(not) = expr else {
        panic!("expected unary");
    };
    assert_eq!(not.op, UnOp::Not);
    let Expr::Unary(neg) = *not.operand else {
        panic!("expected nested unary");
    };
    assert_eq!(neg.op, UnOp::Neg);
}

#[test]
fn test_logical_precedence() {
    // a || b && c parses as a || (b && c)
    let expr = parse_single_expr("a || b && c\n");
    let Expr::Binary(or) = expr else {
        panic!("expected binary");
    };
    assert_eq!(or.op, BinOp::Or);
    let Expr::Binary(and) = *or.right else {
        panic!("expected nested &&");
    };
    assert_eq!(and.op, BinOp::And);
}

#[test]
fn test_two_arg_range() {
    let expr = parse_single_expr("range(0, 10)\n");
    let Expr::Range(range) = expr else {
        panic!("expected range");
    };
    assert_eq!(range.args.len(), 2);
}

#[test]
fn test_string_escapes_decoded_at_parse_time() {
    let expr = parse_single_expr("\"a\\nb\"\n");
    assert_eq!(expr, Expr::Str("a\nb".into()));
}

#[test]
fn test_format_string_expression() {
    let expr = parse_single_expr("@\"Hello from {name}\"\n");
    let Expr::Format(fs) = expr else {
        panic!("expected format string");
    };
    assert_eq!(fs.raw, "Hello from {name}");
    assert_eq!(fs.placeholders.len(), 1);
}

#[test]
fn test_conversion_builtins_are_callable() {
    let expr = parse_single_expr("str(42)\n");
    let Expr::Call(call) = expr else {
        panic!("expected call");
    };
    assert_eq!(call.flat_name().as_deref(), Some("str"));
}

#[test]
fn test_return_without_value() {
    let program = parse_ok("func f() {\n  return\n}\n");
    let Stmt::Function(func) = &program.statements[0] else {
        panic!("expected function");
    };
    assert!(matches!(&func.body.statements[0], Stmt::Return(r) if r.value.is_none()));
}

#[test]
fn test_panic_mode_recovery_keeps_parsing() {
    let mut parser = Parser::new("?\nvar x: int = 1\n");
    let program = parser.parse_program();
    assert!(parser.has_error());
    // The declaration after the bad token still parses.
    assert!(
        program
            .statements
            .iter()
            .any(|s| matches!(s, Stmt::Declaration(d) if d.name == "x"))
    );
}

#[test]
fn test_grouping() {
    let expr = parse_single_expr("(1 + 2) * 3\n");
    let Expr::Binary(mul) = expr else {
        panic!("expected binary");
    };
    assert_eq!(mul.op, BinOp::Mul);
    assert!(matches!(*mul.left, Expr::Grouped(_)));
}

#[test]
fn test_hello_world_program_shape() {
    let source = "import io\nfunc main(): int {\n  var name: str = \"Gobol\"\n  io.print(@\"Hello from {name}\")\n  return 0\n}\n";
    let program = parse_ok(source);
    assert_eq!(program.statements.len(), 2);
    let Stmt::Function(main) = &program.statements[1] else {
        panic!("expected function");
    };
    assert_eq!(main.body.statements.len(), 3);
}
