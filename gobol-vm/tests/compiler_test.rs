// gobol-vm - Compiler output shape tests
// Copyright (c) 2026 The Gobol Project. MIT licensed.

use gobol_core::Value;
use gobol_parser::Parser;
use gobol_vm::{BytecodeModule, Compiler, OpCode};

fn compile(source: &str) -> BytecodeModule {
    let mut parser = Parser::new(source);
    let program = parser.parse_program();
    assert!(
        !parser.has_error(),
        "unexpected parse errors: {:?}",
        parser.errors()
    );
    let (module, diagnostics) = Compiler::new().compile(&program);
    assert!(
        diagnostics.is_empty(),
        "unexpected compile diagnostics: {:?}",
        diagnostics
    );
    module
}

fn opcodes(module: &BytecodeModule) -> Vec<OpCode> {
    module.code.iter().map(|i| i.op).collect()
}

#[test]
fn test_program_ends_in_halt() {
    let module = compile("var x: int = 1\n");
    assert_eq!(module.code.last().map(|i| i.op), Some(OpCode::Halt));
}

#[test]
fn test_hello_world_bytecode_shape() {
    // One FORMAT with argc=1 and an entry for `main` in the function
    // table; top-level code jumps over the body.
    let source = "import io\nfunc main(): int {\n  var name: str = \"Gobol\"\n  io.print(@\"Hello from {name}\")\n  return 0\n}\n";
    let module = compile(source);

    let formats: Vec<_> = module
        .code
        .iter()
        .filter(|i| i.op == OpCode::Format)
        .collect();
    assert_eq!(formats.len(), 1);
    assert_eq!(formats[0].int_op2, Some(1));

    let main = module.function("main").expect("main in function table");
    assert!(main.params.is_empty());

    // The guard jump lands beyond the function body.
    assert_eq!(module.code[0].op, OpCode::Jmp);
    assert!(module.code[0].int_op1.unwrap() > main.entry_point);
}

#[test]
fn test_function_table_records_params() {
    let module = compile("func add(a: int, b: int): int {\n  return a + b\n}\n");
    let info = module.function("add").expect("add in function table");
    assert_eq!(info.params, vec!["a".to_string(), "b".to_string()]);
}

#[test]
fn test_function_body_without_ret_gets_one() {
    let module = compile("func f() {\n  var x: int = 1\n}\n");
    let info = module.function("f").unwrap();
    // Between entry and the guard target there must be a RET.
    let guard_target = module.code[0].int_op1.unwrap();
    let body = &module.code[info.entry_point..guard_target];
    assert_eq!(body.last().map(|i| i.op), Some(OpCode::Ret));
}

#[test]
fn test_constant_pool_dedup_per_type() {
    // The literal 7 appears three times but interns once; 0 and "0"
    // stay distinct because dedup is per type.
    let module = compile("var a: int = 7\nvar b: int = 7\nvar c: int = 7 + 0\nvar d: str = \"0\"\n");
    let sevens = module
        .constants
        .iter()
        .filter(|v| **v == Value::Int(7))
        .count();
    assert_eq!(sevens, 1);
    assert!(module.constants.contains(&Value::Int(0)));
    assert!(module.constants.contains(&Value::Str("0".into())));
}

#[test]
fn test_number_literal_classification() {
    let module = compile("var a = 3\nvar b = 3.5\n");
    assert!(module.constants.contains(&Value::Int(3)));
    assert!(module.constants.contains(&Value::Float(3.5)));
}

#[test]
fn test_declaration_without_initializer_loads_none() {
    let module = compile("var x: int\n");
    assert!(module.constants.contains(&Value::None));
    assert_eq!(
        opcodes(&module),
        vec![OpCode::LoadConst, OpCode::StoreVar, OpCode::Halt]
    );
}

#[test]
fn test_val_uses_store_val() {
    let module = compile("val x: int = 1\n");
    assert_eq!(
        opcodes(&module),
        vec![OpCode::LoadConst, OpCode::StoreVal, OpCode::Halt]
    );
}

#[test]
fn test_array_declaration_emits_alloc() {
    let module = compile("var a: float[4] = 0\n");
    assert_eq!(
        opcodes(&module),
        vec![
            OpCode::LoadConst, // size
            OpCode::LoadConst, // type code
            OpCode::AllocArray,
            OpCode::StoreVar,
            OpCode::Halt
        ]
    );
    // float element type code is 1
    let type_code_idx = module.code[1].int_op1.unwrap();
    assert_eq!(module.constant(type_code_idx), Some(&Value::Int(1)));
}

#[test]
fn test_indexed_assignment_rebinds_variable() {
    let module = compile("var a: int[3] = 0\na[1] = 42\n");
    let ops = opcodes(&module);
    let set_at = ops
        .iter()
        .position(|op| *op == OpCode::ArraySet)
        .expect("ARRAY_SET emitted");
    assert_eq!(ops[set_at + 1], OpCode::StoreVar);
}

#[test]
fn test_unary_minus_uses_swap_sub() {
    let module = compile("var x = -5\n");
    assert_eq!(
        opcodes(&module),
        vec![
            OpCode::LoadConst, // 5
            OpCode::LoadConst, // 0
            OpCode::Swap,
            OpCode::Sub,
            OpCode::StoreVar,
            OpCode::Halt
        ]
    );
}

#[test]
fn test_expression_statement_pops_result() {
    let module = compile("print(1)\n");
    assert_eq!(
        opcodes(&module),
        vec![OpCode::LoadConst, OpCode::Builtin, OpCode::Pop, OpCode::Halt]
    );
}

#[test]
fn test_assignment_statement_does_not_pop() {
    let module = compile("var x: int = 0\nx = 1\n");
    assert!(!opcodes(&module).contains(&OpCode::Pop));
}

#[test]
fn test_builtin_routing() {
    let module = compile("io.print(1)\nvar n: int = len(\"ab\")\nvar s = io.scan()\n");
    let builtins: Vec<&str> = module
        .code
        .iter()
        .filter(|i| i.op == OpCode::Builtin)
        .map(|i| i.str_op.as_deref().unwrap())
        .collect();
    // `scan` has no native implementation; routing it as a builtin
    // makes the VM report an unknown builtin rather than an
    // unresolved call.
    assert_eq!(builtins, vec!["print", "len", "scan"]);
}

#[test]
fn test_user_call_emits_call_with_argc() {
    let module = compile("func f(a: int) {\n}\nf(7)\n");
    let call = module
        .code
        .iter()
        .find(|i| i.op == OpCode::Call)
        .expect("CALL emitted");
    assert_eq!(call.int_op1, Some(1));
    assert_eq!(call.str_op.as_deref(), Some("f"));
}

#[test]
fn test_if_else_jump_shape() {
    let module = compile("if true {\n  print(1)\n} else {\n  print(2)\n}\n");
    let ops = opcodes(&module);
    assert!(ops.contains(&OpCode::JmpFalse));
    assert!(ops.contains(&OpCode::Jmp));
    assert!(module.jumps_are_closed());
}

#[test]
fn test_while_loops_back() {
    let module = compile("var x: int = 0\nwhile x < 3 {\n  x = x + 1\n}\n");
    // The backward jump targets the condition start.
    let back_jump = module
        .code
        .iter()
        .filter(|i| i.op == OpCode::Jmp)
        .next_back()
        .expect("loop-back jump");
    let target = back_jump.int_op1.unwrap();
    assert!(target < module.code.len());
    assert_eq!(module.code[target].op, OpCode::LoadVar);
}

#[test]
fn test_for_loop_uses_unique_temporaries() {
    let module = compile(
        "var x: int = 0\nfor i in range(0, 2) {\n  for j in range(0, 2) {\n    x = x + 1\n  }\n}\n",
    );
    let temp_names: std::collections::HashSet<&str> = module
        .code
        .iter()
        .filter(|i| i.op == OpCode::StoreVar)
        .filter_map(|i| i.str_op.as_deref())
        .filter(|name| name.starts_with("_end") || name.starts_with("_step"))
        .collect();
    // Two loops, two temporaries each.
    assert_eq!(temp_names.len(), 4);
}

#[test]
fn test_two_arg_range_defaults_step() {
    let module = compile("for i in range(0, 5) {\n  print(i)\n}\n");
    // start, end, then the implicit step constant 1.
    assert_eq!(opcodes(&module)[..3], [
        OpCode::LoadConst,
        OpCode::LoadConst,
        OpCode::LoadConst
    ]);
    assert!(module.constants.contains(&Value::Int(1)));
}

#[test]
fn test_break_patch_lands_after_loop() {
    let module = compile("var x: int = 0\nwhile true {\n  break\n}\nx = 1\n");
    assert!(module.jumps_are_closed());
    // Every jump target must not point into the middle of nowhere; the
    // break jump lands on the first instruction after the loop-back
    // jump.
    let back_jump_at = module
        .code
        .iter()
        .enumerate()
        .filter(|(_, i)| i.op == OpCode::Jmp)
        .map(|(at, _)| at)
        .next_back()
        .unwrap();
    let break_jump = module
        .code
        .iter()
        .enumerate()
        .filter(|(_, i)| i.op == OpCode::Jmp)
        .find(|(at, _)| *at < back_jump_at)
        .map(|(_, i)| i)
        .expect("break jump");
    assert_eq!(break_jump.int_op1, Some(back_jump_at + 1));
}

#[test]
fn test_logical_and_short_circuits_with_jumps() {
    let module = compile("var x: bool = true && false\n");
    let ops = opcodes(&module);
    assert!(ops.contains(&OpCode::JmpFalse));
    assert!(module.jumps_are_closed());
}

#[test]
fn test_jumps_closed_across_features() {
    let source = "func f(n: int): int {\n  var acc: int = 0\n  for i in range(0, n) {\n    if i % 2 == 0 {\n      continue\n    }\n    acc = acc + i\n  }\n  return acc\n}\nvar x: int = f(10)\nwhile x > 0 {\n  x = x - 1\n}\n";
    let module = compile(source);
    assert!(module.jumps_are_closed());
}

#[test]
fn test_break_outside_loop_is_a_diagnostic() {
    let mut parser = Parser::new("break\n");
    let program = parser.parse_program();
    let (_, diagnostics) = Compiler::new().compile(&program);
    assert!(diagnostics.iter().any(|d| d.contains("break outside loop")));
}
