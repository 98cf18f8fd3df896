//! AST for SLAQ SELECT statements.
//!
//! Closed enums throughout: evaluation and rendering are total functions over
//! a known variant set. Aggregate calls are their own expression kind rather
//! than generic function calls, so row evaluation can refuse them and
//! validation can reject them outside grouped queries.
//!
//! Every node renders back to query text via `Display`; the rendered text
//! reparses to a structurally equal tree.

use std::fmt;

use crate::value::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// Record field reference (e.g. `status`)
    Field(String),

    /// Literal value
    Literal(Value),

    /// Binary operation
    Binary {
        left: Box<Expression>,
        op: BinaryOperator,
        right: Box<Expression>,
    },

    /// Unary operation (NOT, record predicates)
    Unary {
        op: UnaryOperator,
        operand: Box<Expression>,
    },

    /// Scalar function call (e.g. `HOUR(timestamp)`)
    FunctionCall { name: String, args: Vec<Expression> },

    /// Aggregate call; only legal in SELECT/ORDER/HAVING of a grouped query
    Aggregate {
        func: AggregateFunc,
        argument: Option<Box<Expression>>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BinaryOperator {
    // Comparison
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,

    // String matching
    Like,
    Matches,
    Contains,
    StartsWith,
    EndsWith,

    // Set / range
    In,
    InRange,

    // Logical
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UnaryOperator {
    Not,
    IsBot,
    IsError,
    IsSuccess,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AggregateFunc {
    Count,
    Sum,
    Avg,
    Min,
    Max,
}

impl AggregateFunc {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "COUNT" => Some(AggregateFunc::Count),
            "SUM" => Some(AggregateFunc::Sum),
            "AVG" => Some(AggregateFunc::Avg),
            "MIN" => Some(AggregateFunc::Min),
            "MAX" => Some(AggregateFunc::Max),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            AggregateFunc::Count => "COUNT",
            AggregateFunc::Sum => "SUM",
            AggregateFunc::Avg => "AVG",
            AggregateFunc::Min => "MIN",
            AggregateFunc::Max => "MAX",
        }
    }
}

impl Expression {
    /// True if an aggregate call appears anywhere in this tree.
    pub fn contains_aggregate(&self) -> bool {
        match self {
            Expression::Aggregate { .. } => true,
            Expression::Field(_) | Expression::Literal(_) => false,
            Expression::Binary { left, right, .. } => {
                left.contains_aggregate() || right.contains_aggregate()
            }
            Expression::Unary { operand, .. } => operand.contains_aggregate(),
            Expression::FunctionCall { args, .. } => args.iter().any(|a| a.contains_aggregate()),
        }
    }
}

/// SELECT field list: `*` or explicit expressions with optional aliases.
#[derive(Debug, Clone, PartialEq)]
pub enum Projection {
    Wildcard,
    Fields(Vec<SelectField>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectField {
    pub expression: Expression,
    pub alias: Option<String>,
}

impl SelectField {
    /// The result column name: alias if given, otherwise the rendered expression.
    pub fn column_name(&self) -> String {
        match &self.alias {
            Some(alias) => alias.clone(),
            None => self.expression.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderKey {
    pub expression: Expression,
    pub descending: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectStatement {
    pub projection: Projection,
    pub source: String,
    pub where_clause: Option<Expression>,
    pub group_by: Vec<Expression>,
    pub having: Option<Expression>,
    pub order_by: Vec<OrderKey>,
    pub limit: Option<usize>,
}

fn render_literal(value: &Value, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match value {
        Value::String(s) => write!(f, "'{}'", s),
        Value::Integer(n) => write!(f, "{}", n),
        Value::Float(x) => write!(f, "{}", x),
        Value::Boolean(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
        Value::Timestamp(ts) => write!(f, "'{}'", ts.format("%Y-%m-%d %H:%M:%S")),
        Value::List(items) => {
            write!(f, "(")?;
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                render_literal(item, f)?;
            }
            write!(f, ")")
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Field(name) => write!(f, "{}", name),
            Expression::Literal(value) => render_literal(value, f),
            Expression::Binary { left, op, right } => {
                // IN lists render as bare parenthesized lists, not nested parens
                if *op == BinaryOperator::In {
                    write!(f, "({} IN {})", left, right)
                } else {
                    write!(f, "({} {} {})", left, op, right)
                }
            }
            Expression::Unary { op, operand } => match op {
                UnaryOperator::Not => write!(f, "NOT {}", operand),
                predicate => write!(f, "{} {}", operand, predicate),
            },
            Expression::FunctionCall { name, args } => {
                write!(f, "{}(", name)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
            Expression::Aggregate { func, argument } => match argument {
                Some(arg) => write!(f, "{}({})", func.name(), arg),
                None => write!(f, "{}()", func.name()),
            },
        }
    }
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BinaryOperator::Equal => "=",
            BinaryOperator::NotEqual => "!=",
            BinaryOperator::LessThan => "<",
            BinaryOperator::LessThanOrEqual => "<=",
            BinaryOperator::GreaterThan => ">",
            BinaryOperator::GreaterThanOrEqual => ">=",
            BinaryOperator::Like => "LIKE",
            BinaryOperator::Matches => "MATCHES",
            BinaryOperator::Contains => "CONTAINS",
            BinaryOperator::StartsWith => "STARTS_WITH",
            BinaryOperator::EndsWith => "ENDS_WITH",
            BinaryOperator::In => "IN",
            BinaryOperator::InRange => "IN_RANGE",
            BinaryOperator::And => "AND",
            BinaryOperator::Or => "OR",
        };
        write!(f, "{}", s)
    }
}

impl fmt::Display for UnaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UnaryOperator::Not => "NOT",
            UnaryOperator::IsBot => "IS_BOT",
            UnaryOperator::IsError => "IS_ERROR",
            UnaryOperator::IsSuccess => "IS_SUCCESS",
        };
        write!(f, "{}", s)
    }
}

impl fmt::Display for SelectStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SELECT ")?;
        match &self.projection {
            Projection::Wildcard => write!(f, "*")?,
            Projection::Fields(fields) => {
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", field.expression)?;
                    if let Some(alias) = &field.alias {
                        write!(f, " AS {}", alias)?;
                    }
                }
            }
        }
        write!(f, " FROM {}", self.source)?;

        if let Some(filter) = &self.where_clause {
            write!(f, " WHERE {}", filter)?;
        }
        if !self.group_by.is_empty() {
            write!(f, " GROUP BY ")?;
            for (i, expr) in self.group_by.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", expr)?;
            }
        }
        if let Some(having) = &self.having {
            write!(f, " HAVING {}", having)?;
        }
        if !self.order_by.is_empty() {
            write!(f, " ORDER BY ")?;
            for (i, key) in self.order_by.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", key.expression)?;
                if key.descending {
                    write!(f, " DESC")?;
                }
            }
        }
        if let Some(limit) = self.limit {
            write!(f, " LIMIT {}", limit)?;
        }
        Ok(())
    }
}
