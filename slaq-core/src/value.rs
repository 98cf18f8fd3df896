//! Dynamic values and the log record model.
//!
//! `Value` is the closed tagged union flowing through the evaluator and the
//! executor; operator implementations pattern-match it exhaustively so a new
//! variant is a compile error until handled everywhere. `LogRecord` is the
//! read-only input record the engine evaluates expressions against.

use std::cmp::Ordering;
use std::fmt;

use chrono::NaiveDateTime;
use serde::ser::{SerializeSeq, Serializer};

use crate::error::{SlaqError, SlaqResult};

/// A SLAQ runtime value.
///
/// Lists are only produced for `IN (...)` literal lists and never nest.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Timestamp(NaiveDateTime),
    List(Vec<Value>),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::String(_) => "string",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::Boolean(_) => "boolean",
            Value::Timestamp(_) => "timestamp",
            Value::List(_) => "list",
        }
    }

    /// Boolean coercion used by AND/OR/NOT: non-empty string, non-zero
    /// number, or the boolean itself.
    pub fn truthy(&self) -> SlaqResult<bool> {
        match self {
            Value::Boolean(b) => Ok(*b),
            Value::String(s) => Ok(!s.is_empty()),
            Value::Integer(n) => Ok(*n != 0),
            Value::Float(f) => Ok(*f != 0.0),
            other => Err(SlaqError::EvaluationError(format!(
                "cannot use {} as a boolean",
                other.type_name()
            ))),
        }
    }

    /// Numeric view for SUM/AVG accumulation. Returns None for
    /// non-numeric values so aggregation can skip them.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(n) => Some(*n as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Typed ordering with coercion. Mismatched operand types are coerced
    /// string -> integer, then string -> float, then integer -> float before
    /// comparing; anything else is a type error.
    pub fn compare(&self, other: &Value) -> SlaqResult<Ordering> {
        match (self, other) {
            (Value::String(a), Value::String(b)) => Ok(a.cmp(b)),
            (Value::Integer(a), Value::Integer(b)) => Ok(a.cmp(b)),
            (Value::Float(a), Value::Float(b)) => Ok(a.total_cmp(b)),
            (Value::Boolean(a), Value::Boolean(b)) => Ok(a.cmp(b)),
            (Value::Timestamp(a), Value::Timestamp(b)) => Ok(a.cmp(b)),

            (Value::Integer(a), Value::Float(b)) => Ok((*a as f64).total_cmp(b)),
            (Value::Float(a), Value::Integer(b)) => Ok(a.total_cmp(&(*b as f64))),

            (Value::String(s), Value::Integer(_)) | (Value::String(s), Value::Float(_)) => {
                coerce_numeric(s)?.compare(other)
            }
            (Value::Integer(_), Value::String(s)) | (Value::Float(_), Value::String(s)) => {
                self.compare(&coerce_numeric(s)?)
            }

            _ => Err(SlaqError::EvaluationError(format!(
                "cannot compare {} with {}",
                self.type_name(),
                other.type_name()
            ))),
        }
    }

    /// Equality under the same coercion rules as `compare`.
    pub fn equals(&self, other: &Value) -> SlaqResult<bool> {
        Ok(self.compare(other)? == Ordering::Equal)
    }
}

fn coerce_numeric(s: &str) -> SlaqResult<Value> {
    if let Ok(n) = s.parse::<i64>() {
        return Ok(Value::Integer(n));
    }
    if let Ok(f) = s.parse::<f64>() {
        return Ok(Value::Float(f));
    }
    Err(SlaqError::EvaluationError(format!(
        "cannot compare string '{}' with a number",
        s
    )))
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "{}", s),
            Value::Integer(n) => write!(f, "{}", n),
            Value::Float(x) => write!(f, "{}", x),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Timestamp(ts) => write!(f, "{}", ts.format("%Y-%m-%d %H:%M:%S")),
            Value::List(items) => {
                let rendered: Vec<String> = items.iter().map(|v| v.to_string()).collect();
                write!(f, "({})", rendered.join(", "))
            }
        }
    }
}

impl serde::Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Value::String(s) => serializer.serialize_str(s),
            Value::Integer(n) => serializer.serialize_i64(*n),
            Value::Float(x) => serializer.serialize_f64(*x),
            Value::Boolean(b) => serializer.serialize_bool(*b),
            Value::Timestamp(_) => serializer.serialize_str(&self.to_string()),
            Value::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
        }
    }
}

/// One parsed access-log entry. The engine only ever reads these.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    pub ip: String,
    pub timestamp: NaiveDateTime,
    pub method: String,
    pub url: String,
    pub protocol: String,
    pub status: i64,
    pub size: i64,
    pub referer: String,
    pub user_agent: String,
}

/// Record field names, in wildcard projection order.
pub const RECORD_FIELDS: [&str; 9] = [
    "ip",
    "timestamp",
    "method",
    "url",
    "protocol",
    "status",
    "size",
    "referer",
    "user_agent",
];

impl LogRecord {
    pub fn is_field(name: &str) -> bool {
        RECORD_FIELDS.contains(&name)
    }

    /// Typed attribute access by field name.
    pub fn field(&self, name: &str) -> SlaqResult<Value> {
        match name {
            "ip" => Ok(Value::String(self.ip.clone())),
            "timestamp" => Ok(Value::Timestamp(self.timestamp)),
            "method" => Ok(Value::String(self.method.clone())),
            "url" => Ok(Value::String(self.url.clone())),
            "protocol" => Ok(Value::String(self.protocol.clone())),
            "status" => Ok(Value::Integer(self.status)),
            "size" => Ok(Value::Integer(self.size)),
            "referer" => Ok(Value::String(self.referer.clone())),
            "user_agent" => Ok(Value::String(self.user_agent.clone())),
            other => Err(SlaqError::EvaluationError(format!(
                "unknown field: {}",
                other
            ))),
        }
    }
}
