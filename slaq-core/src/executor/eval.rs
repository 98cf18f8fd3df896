//! Expression evaluation.
//!
//! Two regimes share one operator table. Row evaluation resolves field
//! references against a single log record and refuses aggregate calls
//! outright. Grouped evaluation resolves field references against the
//! projected result row (so HAVING and ORDER BY see aliases like `attempts`)
//! and computes aggregate calls over the group's member records.

use std::net::IpAddr;

use ipnet::IpNet;
use regex::Regex;

use super::aggregation::compute_aggregate;
use super::functions;
use crate::ast::{BinaryOperator, Expression, UnaryOperator};
use crate::error::{SlaqError, SlaqResult};
use crate::value::{LogRecord, Value};

/// Keywords marking a user agent as an automated client.
const BOT_KEYWORDS: [&str; 10] = [
    "bot",
    "crawler",
    "spider",
    "scraper",
    "curl",
    "wget",
    "python-requests",
    "googlebot",
    "bingbot",
    "headless",
];

/// Evaluate an expression against one record.
pub fn evaluate(expr: &Expression, record: &LogRecord) -> SlaqResult<Value> {
    match expr {
        Expression::Field(name) => record.field(name),
        Expression::Literal(value) => Ok(value.clone()),
        Expression::Binary { left, op, right } => {
            let left = evaluate(left, record)?;
            let right = evaluate(right, record)?;
            apply_binary(*op, &left, &right)
        }
        Expression::Unary { op, operand } => {
            let operand = evaluate(operand, record)?;
            apply_unary(*op, &operand)
        }
        Expression::FunctionCall { name, args } => {
            let args: Vec<Value> = args
                .iter()
                .map(|arg| evaluate(arg, record))
                .collect::<SlaqResult<_>>()?;
            functions::evaluate(name, &args)
        }
        Expression::Aggregate { func, .. } => Err(SlaqError::EvaluationError(format!(
            "{}() cannot be evaluated outside a grouped query",
            func.name()
        ))),
    }
}

/// Evaluation scope for HAVING and grouped ORDER BY: the projected row of one
/// group plus its member records.
pub struct GroupContext<'a> {
    pub columns: &'a [String],
    pub row: &'a [Value],
    pub members: &'a [&'a LogRecord],
}

impl<'a> GroupContext<'a> {
    fn column(&self, name: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|c| c == name)
            .map(|i| &self.row[i])
    }
}

/// Evaluate an expression in group scope.
pub fn evaluate_grouped(expr: &Expression, ctx: &GroupContext<'_>) -> SlaqResult<Value> {
    match expr {
        Expression::Field(name) => {
            if let Some(value) = ctx.column(name) {
                return Ok(value.clone());
            }
            // Not a projected column; a record field read from the group
            // representative still works for group-key fields.
            if LogRecord::is_field(name) {
                if let Some(first) = ctx.members.first() {
                    return first.field(name);
                }
            }
            Err(SlaqError::EvaluationError(format!(
                "unknown column: {}",
                name
            )))
        }
        Expression::Literal(value) => Ok(value.clone()),
        Expression::Binary { left, op, right } => {
            let left = evaluate_grouped(left, ctx)?;
            let right = evaluate_grouped(right, ctx)?;
            apply_binary(*op, &left, &right)
        }
        Expression::Unary { op, operand } => {
            let operand = evaluate_grouped(operand, ctx)?;
            apply_unary(*op, &operand)
        }
        Expression::FunctionCall { name, args } => {
            let args: Vec<Value> = args
                .iter()
                .map(|arg| evaluate_grouped(arg, ctx))
                .collect::<SlaqResult<_>>()?;
            functions::evaluate(name, &args)
        }
        Expression::Aggregate { func, argument } => {
            compute_aggregate(*func, argument.as_deref(), ctx.members)
        }
    }
}

pub(super) fn apply_binary(op: BinaryOperator, left: &Value, right: &Value) -> SlaqResult<Value> {
    use std::cmp::Ordering;

    match op {
        BinaryOperator::Equal => Ok(Value::Boolean(left.equals(right)?)),
        BinaryOperator::NotEqual => Ok(Value::Boolean(!left.equals(right)?)),
        BinaryOperator::LessThan => Ok(Value::Boolean(left.compare(right)? == Ordering::Less)),
        BinaryOperator::LessThanOrEqual => {
            Ok(Value::Boolean(left.compare(right)? != Ordering::Greater))
        }
        BinaryOperator::GreaterThan => {
            Ok(Value::Boolean(left.compare(right)? == Ordering::Greater))
        }
        BinaryOperator::GreaterThanOrEqual => {
            Ok(Value::Boolean(left.compare(right)? != Ordering::Less))
        }

        BinaryOperator::Like => {
            let (s, pattern) = string_operands(left, right, "LIKE")?;
            let regex = Regex::new(&like_to_regex(pattern))
                .map_err(|e| SlaqError::EvaluationError(format!("invalid LIKE pattern: {}", e)))?;
            Ok(Value::Boolean(regex.is_match(s)))
        }
        BinaryOperator::Matches => {
            let (s, pattern) = string_operands(left, right, "MATCHES")?;
            let regex = Regex::new(pattern).map_err(|e| {
                SlaqError::EvaluationError(format!("invalid regular expression: {}", e))
            })?;
            Ok(Value::Boolean(regex.is_match(s)))
        }
        BinaryOperator::Contains => {
            let (s, needle) = string_operands(left, right, "CONTAINS")?;
            Ok(Value::Boolean(s.contains(needle)))
        }
        BinaryOperator::StartsWith => {
            let (s, prefix) = string_operands(left, right, "STARTS_WITH")?;
            Ok(Value::Boolean(s.starts_with(prefix)))
        }
        BinaryOperator::EndsWith => {
            let (s, suffix) = string_operands(left, right, "ENDS_WITH")?;
            Ok(Value::Boolean(s.ends_with(suffix)))
        }

        BinaryOperator::In => match right {
            Value::List(items) => {
                // Type-incompatible elements are skipped, not errors.
                let found = items
                    .iter()
                    .any(|item| left.equals(item).unwrap_or(false));
                Ok(Value::Boolean(found))
            }
            other => Err(SlaqError::EvaluationError(format!(
                "IN requires a literal list, got {}",
                other.type_name()
            ))),
        },
        BinaryOperator::InRange => {
            let (ip, cidr) = string_operands(left, right, "IN_RANGE")?;
            let addr: IpAddr = ip.parse().map_err(|_| {
                SlaqError::EvaluationError(format!("IN_RANGE: invalid IP address '{}'", ip))
            })?;
            let net: IpNet = cidr.parse().map_err(|_| {
                SlaqError::EvaluationError(format!("IN_RANGE: invalid CIDR block '{}'", cidr))
            })?;
            Ok(Value::Boolean(net.contains(&addr)))
        }

        // Both operands are already evaluated; combine their truthiness.
        BinaryOperator::And => Ok(Value::Boolean(left.truthy()? && right.truthy()?)),
        BinaryOperator::Or => Ok(Value::Boolean(left.truthy()? || right.truthy()?)),
    }
}

pub(super) fn apply_unary(op: UnaryOperator, operand: &Value) -> SlaqResult<Value> {
    match op {
        UnaryOperator::Not => Ok(Value::Boolean(!operand.truthy()?)),
        UnaryOperator::IsBot => match operand {
            Value::String(agent) => {
                let lowered = agent.to_lowercase();
                Ok(Value::Boolean(
                    BOT_KEYWORDS.iter().any(|kw| lowered.contains(kw)),
                ))
            }
            other => Err(SlaqError::EvaluationError(format!(
                "IS_BOT requires a string operand, got {}",
                other.type_name()
            ))),
        },
        UnaryOperator::IsError => status_in_range(operand, 400, 599),
        UnaryOperator::IsSuccess => status_in_range(operand, 200, 299),
    }
}

fn status_in_range(operand: &Value, low: i64, high: i64) -> SlaqResult<Value> {
    match operand {
        Value::Integer(status) => Ok(Value::Boolean(*status >= low && *status <= high)),
        other => Err(SlaqError::EvaluationError(format!(
            "status predicate requires an integer operand, got {}",
            other.type_name()
        ))),
    }
}

fn string_operands<'v>(
    left: &'v Value,
    right: &'v Value,
    op: &str,
) -> SlaqResult<(&'v str, &'v str)> {
    match (left, right) {
        (Value::String(l), Value::String(r)) => Ok((l, r)),
        _ => Err(SlaqError::EvaluationError(format!(
            "{} requires string operands, got {} and {}",
            op,
            left.type_name(),
            right.type_name()
        ))),
    }
}

/// Translate a LIKE pattern (`*` any run, `?` any char) into an anchored
/// regex, escaping everything else.
fn like_to_regex(pattern: &str) -> String {
    let mut regex = String::with_capacity(pattern.len() + 2);
    regex.push('^');
    for c in pattern.chars() {
        match c {
            '*' => regex.push_str(".*"),
            '?' => regex.push('.'),
            '^' | '$' | '.' | '+' | '(' | ')' | '[' | ']' | '{' | '}' | '|' | '\\' => {
                regex.push('\\');
                regex.push(c);
            }
            _ => regex.push(c),
        }
    }
    regex.push('$');
    regex
}
