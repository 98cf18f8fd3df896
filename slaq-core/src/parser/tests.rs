//! Tests for the SLAQ parser.

use super::*;
use crate::ast::*;
use crate::value::Value;

#[test]
fn test_simple_query() {
    let stmt = parse("SELECT * FROM logs").unwrap();
    assert_eq!(stmt.projection, Projection::Wildcard);
    assert_eq!(stmt.source, "logs");
    assert!(stmt.where_clause.is_none());
    assert!(stmt.limit.is_none());
}

#[test]
fn test_field_list_with_aliases() {
    let stmt = parse("SELECT ip, url AS path FROM logs").unwrap();
    let fields = match &stmt.projection {
        Projection::Fields(fields) => fields,
        other => panic!("expected field list, got {:?}", other),
    };
    assert_eq!(fields.len(), 2);
    assert_eq!(fields[0].expression, Expression::Field("ip".to_string()));
    assert_eq!(fields[0].alias, None);
    assert_eq!(fields[1].alias, Some("path".to_string()));
}

#[test]
fn test_where_comparison() {
    let stmt = parse("SELECT * FROM logs WHERE status = 404").unwrap();
    match stmt.where_clause.unwrap() {
        Expression::Binary { op, left, right } => {
            assert_eq!(op, BinaryOperator::Equal);
            assert_eq!(*left, Expression::Field("status".to_string()));
            assert_eq!(*right, Expression::Literal(Value::Integer(404)));
        }
        other => panic!("expected Binary, got {:?}", other),
    }
}

#[test]
fn test_precedence_or_over_and() {
    // a OR b AND c parses as a OR (b AND c)
    let stmt = parse("SELECT * FROM logs WHERE status = 1 OR status = 2 AND status = 3").unwrap();
    match stmt.where_clause.unwrap() {
        Expression::Binary { op, right, .. } => {
            assert_eq!(op, BinaryOperator::Or);
            match *right {
                Expression::Binary { op, .. } => assert_eq!(op, BinaryOperator::And),
                other => panic!("expected AND on the right, got {:?}", other),
            }
        }
        other => panic!("expected OR at the top, got {:?}", other),
    }
}

#[test]
fn test_parenthesized_expression() {
    let stmt = parse("SELECT * FROM logs WHERE (status = 1 OR status = 2) AND size > 0").unwrap();
    match stmt.where_clause.unwrap() {
        Expression::Binary { op, left, .. } => {
            assert_eq!(op, BinaryOperator::And);
            match *left {
                Expression::Binary { op, .. } => assert_eq!(op, BinaryOperator::Or),
                other => panic!("expected OR on the left, got {:?}", other),
            }
        }
        other => panic!("expected AND at the top, got {:?}", other),
    }
}

#[test]
fn test_not_wraps_comparison() {
    let stmt = parse("SELECT * FROM logs WHERE NOT status = 200 AND size > 0").unwrap();
    match stmt.where_clause.unwrap() {
        Expression::Binary { op, left, .. } => {
            assert_eq!(op, BinaryOperator::And);
            match *left {
                Expression::Unary { op, .. } => assert_eq!(op, UnaryOperator::Not),
                other => panic!("expected NOT on the left, got {:?}", other),
            }
        }
        other => panic!("expected AND at the top, got {:?}", other),
    }
}

#[test]
fn test_between_rewrite() {
    let stmt = parse("SELECT * FROM logs WHERE status BETWEEN 400 AND 499").unwrap();
    let expected = parse("SELECT * FROM logs WHERE (status >= 400) AND (status <= 499)").unwrap();
    assert_eq!(stmt.where_clause, expected.where_clause);
}

#[test]
fn test_in_list() {
    let stmt = parse("SELECT * FROM logs WHERE status IN (404, 500, '503')").unwrap();
    match stmt.where_clause.unwrap() {
        Expression::Binary { op, right, .. } => {
            assert_eq!(op, BinaryOperator::In);
            assert_eq!(
                *right,
                Expression::Literal(Value::List(vec![
                    Value::Integer(404),
                    Value::Integer(500),
                    Value::Integer(503),
                ]))
            );
        }
        other => panic!("expected IN, got {:?}", other),
    }
}

#[test]
fn test_in_list_rejects_non_literal() {
    assert!(parse("SELECT * FROM logs WHERE status IN (size)").is_err());
}

#[test]
fn test_record_predicates() {
    let stmt = parse("SELECT * FROM logs WHERE user_agent IS_BOT").unwrap();
    match stmt.where_clause.unwrap() {
        Expression::Unary { op, operand } => {
            assert_eq!(op, UnaryOperator::IsBot);
            assert_eq!(*operand, Expression::Field("user_agent".to_string()));
        }
        other => panic!("expected IS_BOT predicate, got {:?}", other),
    }

    assert!(parse("SELECT * FROM logs WHERE status IS_ERROR").is_ok());
    assert!(parse("SELECT * FROM logs WHERE status IS_SUCCESS").is_ok());
}

#[test]
fn test_function_call() {
    let stmt = parse("SELECT HOUR(timestamp) FROM logs").unwrap();
    let fields = match &stmt.projection {
        Projection::Fields(fields) => fields,
        other => panic!("expected fields, got {:?}", other),
    };
    assert_eq!(
        fields[0].expression,
        Expression::FunctionCall {
            name: "HOUR".to_string(),
            args: vec![Expression::Field("timestamp".to_string())],
        }
    );
}

#[test]
fn test_aggregate_becomes_distinct_variant() {
    let stmt = parse("SELECT ip, COUNT() AS n FROM logs GROUP BY ip").unwrap();
    let fields = match &stmt.projection {
        Projection::Fields(fields) => fields,
        other => panic!("expected fields, got {:?}", other),
    };
    assert_eq!(
        fields[1].expression,
        Expression::Aggregate {
            func: AggregateFunc::Count,
            argument: None,
        }
    );
}

#[test]
fn test_aggregate_argument_counts() {
    assert!(parse("SELECT ip, COUNT(status) AS n FROM logs GROUP BY ip").is_err());
    assert!(parse("SELECT ip, SUM() AS s FROM logs GROUP BY ip").is_err());
    assert!(parse("SELECT ip, SUM(size) AS s FROM logs GROUP BY ip").is_ok());
}

#[test]
fn test_nested_aggregate_rejected() {
    assert!(parse("SELECT ip, SUM(MAX(size)) AS s FROM logs GROUP BY ip").is_err());
}

#[test]
fn test_aggregate_without_group_by_rejected() {
    assert!(parse("SELECT COUNT() FROM logs").is_err());
    assert!(parse("SELECT ip FROM logs ORDER BY COUNT()").is_err());
}

#[test]
fn test_aggregate_in_where_rejected() {
    assert!(parse("SELECT ip FROM logs WHERE COUNT() > 1 GROUP BY ip").is_err());
}

#[test]
fn test_having_requires_group_by() {
    assert!(parse("SELECT ip FROM logs HAVING ip = 'a'").is_err());
    assert!(
        parse("SELECT ip, COUNT() AS n FROM logs GROUP BY ip HAVING n > 1").is_ok()
    );
}

#[test]
fn test_grouped_projection_must_be_key_or_aggregate() {
    assert!(parse("SELECT ip, url FROM logs GROUP BY ip").is_err());
    assert!(parse("SELECT * FROM logs GROUP BY ip").is_err());
}

#[test]
fn test_order_by_directions() {
    let stmt = parse("SELECT * FROM logs ORDER BY status DESC, size ASC, ip").unwrap();
    assert_eq!(stmt.order_by.len(), 3);
    assert!(stmt.order_by[0].descending);
    assert!(!stmt.order_by[1].descending);
    assert!(!stmt.order_by[2].descending);
}

#[test]
fn test_clauses_in_any_order() {
    let stmt =
        parse("SELECT ip, COUNT() AS n FROM logs GROUP BY ip WHERE status = 401 LIMIT 5").unwrap();
    assert!(stmt.where_clause.is_some());
    assert_eq!(stmt.group_by.len(), 1);
    assert_eq!(stmt.limit, Some(5));
}

#[test]
fn test_duplicate_clause_rejected() {
    assert!(parse("SELECT * FROM logs WHERE status = 1 WHERE status = 2").is_err());
    assert!(parse("SELECT * FROM logs LIMIT 1 LIMIT 2").is_err());
}

#[test]
fn test_limit_requires_integer() {
    assert!(parse("SELECT * FROM logs LIMIT ten").is_err());
    assert!(parse("SELECT * FROM logs LIMIT").is_err());
}

#[test]
fn test_trailing_semicolon() {
    assert!(parse("SELECT * FROM logs;").is_ok());
    assert!(parse("SELECT * FROM logs; SELECT").is_err());
}

#[test]
fn test_missing_from() {
    let err = parse("SELECT *").unwrap_err();
    assert!(err.to_string().contains("FROM"));
}

#[test]
fn test_unmatched_paren_reports_position() {
    let err = parse("SELECT * FROM logs WHERE (status = 1").unwrap_err();
    match err {
        crate::error::SlaqError::ParseError { position, .. } => assert_eq!(position, 25),
        other => panic!("expected parse error, got {:?}", other),
    }
}

#[test]
fn test_unmatched_close_paren_reports_position() {
    let err = parse("SELECT * FROM logs WHERE status = 1)").unwrap_err();
    match err {
        crate::error::SlaqError::ParseError { position, .. } => assert_eq!(position, 35),
        other => panic!("expected parse error, got {:?}", other),
    }
}

#[test]
fn test_trailing_tokens_rejected() {
    assert!(parse("SELECT * FROM logs extra").is_err());
}

#[test]
fn test_render_round_trip() {
    let queries = [
        "SELECT * FROM logs",
        "SELECT ip, url AS path FROM logs WHERE status = 404",
        "SELECT ip, COUNT() AS n FROM logs WHERE status = 401 GROUP BY ip \
         HAVING n > 1 ORDER BY n DESC LIMIT 10",
        "SELECT * FROM logs WHERE url LIKE '/api/*' AND NOT user_agent IS_BOT",
        "SELECT HOUR(timestamp) AS h, COUNT() AS n FROM logs GROUP BY HOUR(timestamp)",
        "SELECT * FROM logs WHERE status BETWEEN 400 AND 499 OR ip IN_RANGE '10.0.0.0/8'",
        "SELECT * FROM logs WHERE status IN (404, 500)",
    ];

    for query in queries {
        let first = parse(query).unwrap();
        let rendered = first.to_string();
        let second = parse(&rendered)
            .unwrap_or_else(|e| panic!("rendering of '{}' failed to reparse: {}", query, e));
        assert_eq!(first, second, "round-trip mismatch for '{}'", query);
    }
}
