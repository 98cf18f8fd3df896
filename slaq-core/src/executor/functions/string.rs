//! String manipulation functions.

use super::{expect_args, string_arg};
use crate::error::{SlaqError, SlaqResult};
use crate::value::Value;

pub fn evaluate(name: &str, args: &[Value]) -> SlaqResult<Option<Value>> {
    match name {
        "UPPER" => {
            expect_args(name, args, 1)?;
            let s = string_arg(name, args, 0)?;
            Ok(Some(Value::String(s.to_uppercase())))
        }
        "LOWER" => {
            expect_args(name, args, 1)?;
            let s = string_arg(name, args, 0)?;
            Ok(Some(Value::String(s.to_lowercase())))
        }
        "LENGTH" => {
            expect_args(name, args, 1)?;
            let s = string_arg(name, args, 0)?;
            Ok(Some(Value::Integer(s.chars().count() as i64)))
        }
        "SUBSTR" => substr(args).map(Some),
        _ => Ok(None),
    }
}

/// SUBSTR(string, start [, length]) with a zero-based start. An out-of-range
/// start yields an empty string and a length past the end clamps.
fn substr(args: &[Value]) -> SlaqResult<Value> {
    if args.len() != 2 && args.len() != 3 {
        return Err(SlaqError::EvaluationError(format!(
            "SUBSTR() expects 2 or 3 arguments, got {}",
            args.len()
        )));
    }
    let s = string_arg("SUBSTR", args, 0)?;
    let start = integer_arg("SUBSTR", &args[1])?;
    let chars: Vec<char> = s.chars().collect();

    if start < 0 || start as usize >= chars.len() {
        return Ok(Value::String(String::new()));
    }
    let start = start as usize;

    let end = match args.get(2) {
        Some(len_value) => {
            let len = integer_arg("SUBSTR", len_value)?;
            if len <= 0 {
                return Ok(Value::String(String::new()));
            }
            (start + len as usize).min(chars.len())
        }
        None => chars.len(),
    };

    Ok(Value::String(chars[start..end].iter().collect()))
}

fn integer_arg(name: &str, value: &Value) -> SlaqResult<i64> {
    match value {
        Value::Integer(n) => Ok(*n),
        other => Err(SlaqError::EvaluationError(format!(
            "{}() expects an integer argument, got {}",
            name,
            other.type_name()
        ))),
    }
}
