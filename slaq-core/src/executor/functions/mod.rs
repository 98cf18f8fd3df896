//! Scalar function registry.
//!
//! Each submodule owns one family of functions and returns `Ok(None)` for
//! names it does not recognize, so dispatch is a simple chain.

mod datetime;
mod network;
mod string;

use crate::error::{SlaqError, SlaqResult};
use crate::value::Value;

pub fn evaluate(name: &str, args: &[Value]) -> SlaqResult<Value> {
    if let Some(value) = datetime::evaluate(name, args)? {
        return Ok(value);
    }
    if let Some(value) = string::evaluate(name, args)? {
        return Ok(value);
    }
    if let Some(value) = network::evaluate(name, args)? {
        return Ok(value);
    }
    Err(SlaqError::EvaluationError(format!(
        "unknown function: {}",
        name
    )))
}

pub(crate) fn expect_args(name: &str, args: &[Value], count: usize) -> SlaqResult<()> {
    if args.len() != count {
        return Err(SlaqError::EvaluationError(format!(
            "{}() expects {} argument{}, got {}",
            name,
            count,
            if count == 1 { "" } else { "s" },
            args.len()
        )));
    }
    Ok(())
}

pub(crate) fn string_arg<'a>(name: &str, args: &'a [Value], index: usize) -> SlaqResult<&'a str> {
    match &args[index] {
        Value::String(s) => Ok(s),
        other => Err(SlaqError::EvaluationError(format!(
            "{}() expects a string argument, got {}",
            name,
            other.type_name()
        ))),
    }
}

pub(crate) fn timestamp_arg(
    name: &str,
    args: &[Value],
) -> SlaqResult<chrono::NaiveDateTime> {
    match &args[0] {
        Value::Timestamp(ts) => Ok(*ts),
        other => Err(SlaqError::EvaluationError(format!(
            "{}() expects a timestamp argument, got {}",
            name,
            other.type_name()
        ))),
    }
}
