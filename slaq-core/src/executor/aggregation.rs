//! Aggregate computation over the member records of one group.

use std::cmp::Ordering;

use super::eval::evaluate;
use crate::ast::{AggregateFunc, Expression};
use crate::error::{SlaqError, SlaqResult};
use crate::value::{LogRecord, Value};

/// COUNT counts members. SUM and AVG accumulate numeric values and skip
/// anything non-numeric. MIN and MAX fold with value comparison, skipping
/// values incomparable with the running best. Members whose argument fails to
/// evaluate are skipped as well.
pub fn compute_aggregate(
    func: AggregateFunc,
    argument: Option<&Expression>,
    members: &[&LogRecord],
) -> SlaqResult<Value> {
    match func {
        AggregateFunc::Count => Ok(Value::Integer(members.len() as i64)),
        AggregateFunc::Sum => {
            let (sum, saw_float, _) = numeric_fold(func, argument, members)?;
            if saw_float {
                Ok(Value::Float(sum))
            } else {
                Ok(Value::Integer(sum as i64))
            }
        }
        AggregateFunc::Avg => {
            let (sum, _, count) = numeric_fold(func, argument, members)?;
            if count == 0 {
                Ok(Value::Integer(0))
            } else {
                Ok(Value::Float(sum / count as f64))
            }
        }
        AggregateFunc::Min => extremum(func, argument, members, Ordering::Less),
        AggregateFunc::Max => extremum(func, argument, members, Ordering::Greater),
    }
}

fn argument_of<'e>(
    func: AggregateFunc,
    argument: Option<&'e Expression>,
) -> SlaqResult<&'e Expression> {
    argument.ok_or_else(|| {
        SlaqError::ExecutionError(format!("{}() requires an argument", func.name()))
    })
}

fn numeric_fold(
    func: AggregateFunc,
    argument: Option<&Expression>,
    members: &[&LogRecord],
) -> SlaqResult<(f64, bool, usize)> {
    let expr = argument_of(func, argument)?;
    let mut sum = 0.0;
    let mut saw_float = false;
    let mut count = 0;
    for record in members {
        let value = match evaluate(expr, record) {
            Ok(v) => v,
            Err(_) => continue,
        };
        match value {
            Value::Integer(n) => {
                sum += n as f64;
                count += 1;
            }
            Value::Float(f) => {
                sum += f;
                saw_float = true;
                count += 1;
            }
            _ => {}
        }
    }
    Ok((sum, saw_float, count))
}

fn extremum(
    func: AggregateFunc,
    argument: Option<&Expression>,
    members: &[&LogRecord],
    keep: Ordering,
) -> SlaqResult<Value> {
    let expr = argument_of(func, argument)?;
    let mut best: Option<Value> = None;
    for record in members {
        let value = match evaluate(expr, record) {
            Ok(v) => v,
            Err(_) => continue,
        };
        best = match best {
            None => Some(value),
            Some(current) => match value.compare(&current) {
                Ok(ordering) if ordering == keep => Some(value),
                Ok(_) => Some(current),
                Err(_) => Some(current),
            },
        };
    }
    best.ok_or_else(|| {
        SlaqError::ExecutionError("aggregate over an empty group".to_string())
    })
}
