// gobol - The Gobol programming language toolchain
// Copyright (c) 2026 The Gobol Project. MIT licensed.

//! CLI driver: source file -> tokens -> AST -> semantic analysis ->
//! bytecode -> VM. `--interpret` swaps the back end for the
//! tree-walking interpreter.

use std::env;
use std::fs;
use std::process;

use gobol_core::{Analyser, Interpreter};
use gobol_parser::Parser;
use gobol_vm::{Compiler, VM};

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() == 1 {
        println!("Usage:");
        println!("  {} [--interpret] <source-file>", args[0]);
        return;
    }

    if args.len() == 2 && (args[1] == "--version" || args[1] == "-v") {
        println!("Gobol v0.1.0");
        return;
    }

    let mut interpret = false;
    let mut file = None;
    for arg in &args[1..] {
        match arg.as_str() {
            "--interpret" | "-i" => interpret = true,
            other => file = Some(other.to_string()),
        }
    }

    let Some(file) = file else {
        eprintln!("Error: no source file given");
        process::exit(1);
    };

    // Read as bytes; the language is byte-oriented and tolerates
    // non-UTF-8 content in comments.
    let source = match fs::read(&file) {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(err) => {
            eprintln!("Error: cannot open file '{}': {}", file, err);
            process::exit(1);
        }
    };

    let mut parser = Parser::new(&source);
    let program = parser.parse_program();
    if parser.has_error() {
        for message in parser.errors() {
            eprintln!("Parse Error: {}", message);
        }
        process::exit(1);
    }

    let mut analyser = Analyser::new();
    if !analyser.analyse(&program) {
        for message in analyser.errors() {
            eprintln!("Semantic Error: {}", message);
        }
        process::exit(1);
    }

    if interpret {
        let mut interpreter = Interpreter::new();
        interpreter.execute(&program);
        return;
    }

    let (module, diagnostics) = Compiler::new().compile(&program);
    for message in &diagnostics {
        eprintln!("Compile Error: {}", message);
    }

    let mut vm = VM::new();
    // Runtime errors are recoverable and already reported; only an
    // eval-stack underflow aborts the run.
    if vm.run(module).is_err() {
        process::exit(1);
    }
}
