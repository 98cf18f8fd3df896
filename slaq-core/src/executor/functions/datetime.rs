//! Date and time extraction functions.

use chrono::{Datelike, Timelike};

use super::{expect_args, timestamp_arg};
use crate::error::SlaqResult;
use crate::value::Value;

pub fn evaluate(name: &str, args: &[Value]) -> SlaqResult<Option<Value>> {
    match name {
        "HOUR" => {
            expect_args(name, args, 1)?;
            let ts = timestamp_arg(name, args)?;
            Ok(Some(Value::Integer(ts.hour() as i64)))
        }
        "DAY" => {
            expect_args(name, args, 1)?;
            let ts = timestamp_arg(name, args)?;
            Ok(Some(Value::Integer(ts.day() as i64)))
        }
        "WEEKDAY" => {
            expect_args(name, args, 1)?;
            let ts = timestamp_arg(name, args)?;
            Ok(Some(Value::String(ts.format("%A").to_string())))
        }
        "DATE" => {
            expect_args(name, args, 1)?;
            let ts = timestamp_arg(name, args)?;
            Ok(Some(Value::String(ts.format("%Y-%m-%d").to_string())))
        }
        _ => Ok(None),
    }
}
