// gobol-core - Builtin functions for the Gobol programming language
// Copyright (c) 2026 The Gobol Project. MIT licensed.

//! Native builtin functions shared by the interpreter and the VM.
//!
//! All builtins take the program-output sink and the already-popped
//! argument list, and return the value to hand back to the caller.
//! They report their own argument errors and return `none` rather than
//! aborting execution.

use std::io::Write;

use crate::error::{RuntimeError, report};
use crate::value::Value;

/// Signature of a native builtin.
pub type BuiltinFn = fn(&mut dyn Write, &[Value]) -> Value;

/// Write the arguments separated by single spaces. Shared by both print
/// flavours.
pub fn write_joined(out: &mut dyn Write, args: &[Value]) {
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            let _ = write!(out, " ");
        }
        let _ = write!(out, "{}", arg);
    }
}

/// `print(...)` as the VM dispatches it: no trailing newline.
pub fn builtin_print(out: &mut dyn Write, args: &[Value]) -> Value {
    write_joined(out, args);
    let _ = out.flush();
    Value::None
}

/// `print(...)` as the interpreter dispatches it: with a trailing
/// newline. The divergence is deliberate and documented.
pub fn builtin_println(out: &mut dyn Write, args: &[Value]) -> Value {
    write_joined(out, args);
    let _ = writeln!(out);
    let _ = out.flush();
    Value::None
}

/// `len(s)`: string length in bytes.
pub fn builtin_len(_out: &mut dyn Write, args: &[Value]) -> Value {
    match args {
        [Value::Str(s)] => Value::Int(s.len() as i64),
        [other] => {
            report(&RuntimeError::TypeError {
                expected: "str",
                got: other.type_name().to_string(),
            });
            Value::None
        }
        _ => {
            report(&RuntimeError::Internal(format!(
                "len() expects 1 argument, got {}",
                args.len()
            )));
            Value::None
        }
    }
}

/// `int(x)`: conversion to integer. Floats truncate, booleans map to
/// 0/1, strings parse or yield `none`.
pub fn builtin_int(_out: &mut dyn Write, args: &[Value]) -> Value {
    match args.first() {
        Some(Value::Int(n)) => Value::Int(*n),
        Some(Value::Float(f)) => Value::Int(*f as i64),
        Some(Value::Bool(b)) => Value::Int(if *b { 1 } else { 0 }),
        Some(Value::Str(s)) => match s.trim().parse::<i64>() {
            Ok(n) => Value::Int(n),
            Err(_) => Value::None,
        },
        _ => Value::None,
    }
}

/// `float(x)`: conversion to float.
pub fn builtin_float(_out: &mut dyn Write, args: &[Value]) -> Value {
    match args.first() {
        Some(Value::Int(n)) => Value::Float(*n as f64),
        Some(Value::Float(f)) => Value::Float(*f),
        Some(Value::Bool(b)) => Value::Float(if *b { 1.0 } else { 0.0 }),
        Some(Value::Str(s)) => match s.trim().parse::<f64>() {
            Ok(f) => Value::Float(f),
            Err(_) => Value::None,
        },
        _ => Value::None,
    }
}

/// `str(x)`: conversion to the display string.
pub fn builtin_str(_out: &mut dyn Write, args: &[Value]) -> Value {
    match args.first() {
        Some(value) => Value::Str(value.to_string()),
        None => Value::Str(String::new()),
    }
}

/// Substitute format-string placeholders.
///
/// Scans the (already escape-decoded) format string; every `{...}`
/// segment is replaced by the next argument's string conversion, text
/// outside braces is copied verbatim. A missing argument triggers a
/// warning and leaves the segment empty; an unclosed `{` copies the
/// remainder verbatim.
pub fn format_string(format: &str, args: &[Value]) -> String {
    let bytes = format.as_bytes();
    let mut result = String::with_capacity(format.len());
    let mut pos = 0;
    let mut next_arg = 0;

    while pos < bytes.len() {
        if bytes[pos] == b'{' {
            let close = format[pos..].find('}');
            let Some(close) = close else {
                result.push_str(&format[pos..]);
                break;
            };
            let name = &format[pos + 1..pos + close];
            if next_arg < args.len() {
                result.push_str(&args[next_arg].to_string());
            } else {
                eprintln!("Runtime Warning: format missing value for {{{}}}", name);
            }
            next_arg += 1;
            pos += close + 1;
        } else {
            let start = pos;
            while pos < bytes.len() && bytes[pos] != b'{' {
                pos += 1;
            }
            result.push_str(&format[start..pos]);
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(f: BuiltinFn, args: &[Value]) -> (Value, String) {
        let mut out = Vec::new();
        let value = f(&mut out, args);
        (value, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_print_joins_with_spaces_no_newline() {
        let (value, out) = run(builtin_print, &[Value::Int(1), Value::Str("a".into())]);
        assert_eq!(value, Value::None);
        assert_eq!(out, "1 a");
    }

    #[test]
    fn test_println_appends_newline() {
        let (_, out) = run(builtin_println, &[Value::Int(7)]);
        assert_eq!(out, "7\n");
    }

    #[test]
    fn test_len_is_byte_length() {
        let (value, _) = run(builtin_len, &[Value::Str("abcd".into())]);
        assert_eq!(value, Value::Int(4));
        let (value, _) = run(builtin_len, &[Value::Int(3)]);
        assert_eq!(value, Value::None);
    }

    #[test]
    fn test_conversions() {
        let (value, _) = run(builtin_int, &[Value::Float(3.9)]);
        assert_eq!(value, Value::Int(3));
        let (value, _) = run(builtin_int, &[Value::Str("42".into())]);
        assert_eq!(value, Value::Int(42));
        let (value, _) = run(builtin_int, &[Value::Str("nope".into())]);
        assert_eq!(value, Value::None);
        let (value, _) = run(builtin_float, &[Value::Int(2)]);
        assert_eq!(value, Value::Float(2.0));
        let (value, _) = run(builtin_str, &[Value::Bool(true)]);
        assert_eq!(value, Value::Str("true".into()));
    }

    #[test]
    fn test_format_substitutes_in_order() {
        let s = format_string("a={x} b={y}!", &[Value::Int(1), Value::Int(2)]);
        assert_eq!(s, "a=1 b=2!");
    }

    #[test]
    fn test_format_missing_arg_leaves_segment_empty() {
        let s = format_string("{a}{b}", &[Value::Int(1)]);
        assert_eq!(s, "1");
    }

    #[test]
    fn test_format_unclosed_brace_copied_verbatim() {
        let s = format_string("x{oops", &[Value::Int(1)]);
        assert_eq!(s, "x{oops");
    }
}
