//! SLAQ Core - Storage-independent SLAQ query language parser and executor.
//!
//! This crate provides the core components for parsing and executing SLAQ
//! queries over in-memory access log records, without any log ingestion or
//! server dependencies.
//!
//! # Main Components
//!
//! - **Lexer / Parser**: Turn a SLAQ query string into a `SelectStatement`
//! - **AST**: Abstract syntax tree representation of queries
//! - **Executor**: Runs a statement against a slice of `LogRecord`s
//!
//! # Example
//!
//! ```rust
//! use slaq_core::{parse, LogRecord, QueryExecutor};
//! use chrono::NaiveDate;
//!
//! let records = vec![LogRecord {
//!     ip: "203.0.113.7".to_string(),
//!     timestamp: NaiveDate::from_ymd_opt(2024, 5, 1)
//!         .unwrap()
//!         .and_hms_opt(12, 0, 0)
//!         .unwrap(),
//!     method: "GET".to_string(),
//!     url: "/api/users".to_string(),
//!     protocol: "HTTP/1.1".to_string(),
//!     status: 404,
//!     size: 512,
//!     referer: "-".to_string(),
//!     user_agent: "curl/8.0".to_string(),
//! }];
//!
//! let stmt = parse("SELECT ip, url FROM logs WHERE status >= 400").unwrap();
//! let result = QueryExecutor::new(&records).execute(&stmt).unwrap();
//! assert_eq!(result.count, 1);
//! ```

pub mod ast;
pub mod error;
pub mod executor;
pub mod lexer;
pub mod parser;
pub mod value;

// Re-export main types for convenience
pub use ast::{
    AggregateFunc, BinaryOperator, Expression, OrderKey, Projection, SelectField,
    SelectStatement, UnaryOperator,
};
pub use error::{SlaqError, SlaqResult};
pub use executor::{OutputFormat, QueryExecutor, QueryResult};
pub use lexer::{Lexer, Token, TokenKind};
pub use parser::parse;
pub use value::{LogRecord, Value};
