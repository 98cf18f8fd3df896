//! Query execution.
//!
//! A parsed statement runs through a fixed pipeline over an in-memory record
//! slice: filter, group, aggregate, having, order, limit. Grouping preserves
//! first-seen key order; ordering is a stable multi-key sort with a final
//! ascending tie-break on the group key so equal rows always come out in the
//! same order.

mod aggregation;
pub mod eval;
mod format;
mod functions;

use std::collections::HashMap;

use serde::Serialize;

pub use format::OutputFormat;

use crate::ast::{Expression, OrderKey, Projection, SelectStatement};
use crate::error::{SlaqError, SlaqResult};
use crate::value::{LogRecord, Value, RECORD_FIELDS};
use eval::{evaluate, evaluate_grouped, GroupContext};

/// Joins the rendered parts of a compound group key. Unlikely to appear in
/// log data, so compound keys cannot collide with each other.
const GROUP_KEY_SEPARATOR: char = '\u{1F}';

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
    pub count: usize,
}

pub struct QueryExecutor<'a> {
    records: &'a [LogRecord],
    strict: bool,
}

impl<'a> QueryExecutor<'a> {
    pub fn new(records: &'a [LogRecord]) -> Self {
        Self {
            records,
            strict: false,
        }
    }

    /// In strict mode any evaluation error aborts the query. The default is
    /// lenient: records that fail a filter or group key are dropped, cells
    /// that fail projection render empty, and groups that fail HAVING are
    /// dropped.
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn execute(&self, stmt: &SelectStatement) -> SlaqResult<QueryResult> {
        let filtered = self.filter(stmt)?;
        let mut result = if stmt.group_by.is_empty() {
            self.execute_flat(stmt, &filtered)?
        } else {
            self.execute_grouped(stmt, &filtered)?
        };
        if let Some(limit) = stmt.limit {
            result.rows.truncate(limit);
        }
        result.count = result.rows.len();
        Ok(result)
    }

    fn filter(&self, stmt: &SelectStatement) -> SlaqResult<Vec<&'a LogRecord>> {
        let Some(predicate) = &stmt.where_clause else {
            return Ok(self.records.iter().collect());
        };
        let mut kept = Vec::new();
        for record in self.records {
            match evaluate(predicate, record).and_then(|v| v.truthy()) {
                Ok(true) => kept.push(record),
                Ok(false) => {}
                Err(e) if self.strict => {
                    return Err(SlaqError::ExecutionError(format!(
                        "WHERE evaluation failed: {}",
                        e
                    )));
                }
                Err(_) => {}
            }
        }
        Ok(kept)
    }

    fn execute_flat(
        &self,
        stmt: &SelectStatement,
        records: &[&'a LogRecord],
    ) -> SlaqResult<QueryResult> {
        let (columns, expressions): (Vec<String>, Vec<Expression>) = match &stmt.projection {
            Projection::Wildcard => (
                RECORD_FIELDS.iter().map(|f| f.to_string()).collect(),
                RECORD_FIELDS
                    .iter()
                    .map(|f| Expression::Field(f.to_string()))
                    .collect(),
            ),
            Projection::Fields(fields) => (
                fields.iter().map(|f| f.column_name()).collect(),
                fields.iter().map(|f| f.expression.clone()).collect(),
            ),
        };

        let aliases = alias_map(stmt);
        let mut rows: Vec<(Vec<Value>, Vec<Option<Value>>)> = Vec::with_capacity(records.len());
        for record in records {
            let mut row = Vec::with_capacity(expressions.len());
            for expr in &expressions {
                match evaluate(expr, record) {
                    Ok(value) => row.push(value),
                    Err(e) if self.strict => {
                        return Err(SlaqError::ExecutionError(format!(
                            "projection failed: {}",
                            e
                        )));
                    }
                    Err(_) => row.push(Value::String(String::new())),
                }
            }
            let sort_keys = stmt
                .order_by
                .iter()
                .map(|key| {
                    let expr = aliases.get(key.expression.to_string().as_str());
                    let expr = expr.copied().unwrap_or(&key.expression);
                    evaluate(expr, record).ok()
                })
                .collect();
            rows.push((row, sort_keys));
        }

        if !stmt.order_by.is_empty() {
            rows.sort_by(|(_, a), (_, b)| compare_keys(a, b, &stmt.order_by));
        }
        Ok(QueryResult {
            columns,
            rows: rows.into_iter().map(|(row, _)| row).collect(),
            count: 0,
        })
    }

    fn execute_grouped(
        &self,
        stmt: &SelectStatement,
        records: &[&'a LogRecord],
    ) -> SlaqResult<QueryResult> {
        struct Group<'r> {
            key: String,
            key_values: Vec<Value>,
            members: Vec<&'r LogRecord>,
        }

        let mut index: HashMap<String, usize> = HashMap::new();
        let mut groups: Vec<Group<'a>> = Vec::new();
        'records: for record in records {
            let mut key_values = Vec::with_capacity(stmt.group_by.len());
            for expr in &stmt.group_by {
                match evaluate(expr, record) {
                    Ok(value) => key_values.push(value),
                    Err(e) if self.strict => {
                        return Err(SlaqError::ExecutionError(format!(
                            "GROUP BY evaluation failed: {}",
                            e
                        )));
                    }
                    Err(_) => continue 'records,
                }
            }
            let key: String = key_values
                .iter()
                .map(|v| v.to_string())
                .collect::<Vec<_>>()
                .join(&GROUP_KEY_SEPARATOR.to_string());
            match index.get(&key) {
                Some(&i) => groups[i].members.push(record),
                None => {
                    index.insert(key.clone(), groups.len());
                    groups.push(Group {
                        key,
                        key_values,
                        members: vec![record],
                    });
                }
            }
        }

        let Projection::Fields(fields) = &stmt.projection else {
            return Err(SlaqError::ExecutionError(
                "grouped queries cannot project *".to_string(),
            ));
        };
        let columns: Vec<String> = fields.iter().map(|f| f.column_name()).collect();
        let group_renders: Vec<String> =
            stmt.group_by.iter().map(|e| e.to_string()).collect();

        let mut rows: Vec<(Vec<Value>, Vec<Option<Value>>, String)> = Vec::new();
        for group in &groups {
            let mut row = Vec::with_capacity(fields.len());
            for field in fields {
                let render = field.expression.to_string();
                let value = match group_renders.iter().position(|r| *r == render) {
                    Some(i) => group.key_values[i].clone(),
                    None => {
                        // Validation guarantees everything else is an aggregate.
                        let ctx = GroupContext {
                            columns: &[],
                            row: &[],
                            members: &group.members,
                        };
                        match evaluate_grouped(&field.expression, &ctx) {
                            Ok(value) => value,
                            Err(e) if self.strict => {
                                return Err(SlaqError::ExecutionError(format!(
                                    "aggregation failed: {}",
                                    e
                                )));
                            }
                            Err(_) => Value::String(String::new()),
                        }
                    }
                };
                row.push(value);
            }

            let ctx = GroupContext {
                columns: &columns,
                row: &row,
                members: &group.members,
            };
            if let Some(having) = &stmt.having {
                match evaluate_grouped(having, &ctx).and_then(|v| v.truthy()) {
                    Ok(true) => {}
                    Ok(false) => continue,
                    Err(e) if self.strict => {
                        return Err(SlaqError::ExecutionError(format!(
                            "HAVING evaluation failed: {}",
                            e
                        )));
                    }
                    Err(_) => continue,
                }
            }

            let sort_keys = stmt
                .order_by
                .iter()
                .map(|key| evaluate_grouped(&key.expression, &ctx).ok())
                .collect();
            rows.push((row, sort_keys, group.key.clone()));
        }

        if !stmt.order_by.is_empty() {
            rows.sort_by(|(_, a_keys, a_group), (_, b_keys, b_group)| {
                compare_keys(a_keys, b_keys, &stmt.order_by).then_with(|| a_group.cmp(b_group))
            });
        }

        Ok(QueryResult {
            columns,
            rows: rows.into_iter().map(|(row, _, _)| row).collect(),
            count: 0,
        })
    }
}

fn alias_map(stmt: &SelectStatement) -> HashMap<&str, &Expression> {
    let mut map = HashMap::new();
    if let Projection::Fields(fields) = &stmt.projection {
        for field in fields {
            if let Some(alias) = &field.alias {
                map.insert(alias.as_str(), &field.expression);
            }
        }
    }
    map
}

/// Missing keys sort after present ones regardless of direction.
fn compare_keys(
    a: &[Option<Value>],
    b: &[Option<Value>],
    order_by: &[OrderKey],
) -> std::cmp::Ordering {
    use std::cmp::Ordering;

    for (i, key) in order_by.iter().enumerate() {
        let ordering = match (&a[i], &b[i]) {
            (Some(av), Some(bv)) => av.compare(bv).unwrap_or(Ordering::Equal),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        let ordering = if key.descending && matches!((&a[i], &b[i]), (Some(_), Some(_))) {
            ordering.reverse()
        } else {
            ordering
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use crate::value::tests::record;

    fn fixture() -> Vec<LogRecord> {
        vec![
            record("192.168.1.1", 200),
            record("10.0.0.5", 404),
            record("192.168.1.1", 401),
            record("10.0.0.5", 404),
            record("172.16.0.9", 200),
        ]
    }

    fn run(records: &[LogRecord], query: &str) -> QueryResult {
        let stmt = parse(query).unwrap();
        QueryExecutor::new(records).execute(&stmt).unwrap()
    }

    #[test]
    fn test_wildcard_projection() {
        let records = fixture();
        let result = run(&records, "SELECT * FROM logs");
        assert_eq!(result.columns, RECORD_FIELDS.to_vec());
        assert_eq!(result.count, 5);
        assert_eq!(result.rows[0][0], Value::String("192.168.1.1".into()));
        assert_eq!(result.rows[0][5], Value::Integer(200));
    }

    #[test]
    fn test_filter_counts() {
        let records = fixture();
        let result = run(&records, "SELECT ip FROM logs WHERE status = 404");
        assert_eq!(result.count, 2);
        for row in &result.rows {
            assert_eq!(row[0], Value::String("10.0.0.5".into()));
        }
    }

    #[test]
    fn test_filter_with_string_coercion() {
        let records = fixture();
        let result = run(&records, "SELECT ip FROM logs WHERE status = '404'");
        assert_eq!(result.count, 2);
    }

    #[test]
    fn test_projection_preserves_order() {
        let records = fixture();
        let result = run(&records, "SELECT status, ip FROM logs LIMIT 1");
        assert_eq!(result.columns, vec!["status", "ip"]);
        assert_eq!(result.rows[0][0], Value::Integer(200));
    }

    #[test]
    fn test_grouping_preserves_first_seen_order() {
        let records = fixture();
        let result = run(&records, "SELECT ip, COUNT() AS n FROM logs GROUP BY ip");
        assert_eq!(result.count, 3);
        assert_eq!(result.rows[0][0], Value::String("192.168.1.1".into()));
        assert_eq!(result.rows[0][1], Value::Integer(2));
        assert_eq!(result.rows[1][0], Value::String("10.0.0.5".into()));
        assert_eq!(result.rows[2][0], Value::String("172.16.0.9".into()));
    }

    #[test]
    fn test_group_counts_conserve_records() {
        let records = fixture();
        let result = run(&records, "SELECT ip, COUNT() AS n FROM logs GROUP BY ip");
        let total: i64 = result
            .rows
            .iter()
            .map(|row| match row[1] {
                Value::Integer(n) => n,
                _ => 0,
            })
            .sum();
        assert_eq!(total, records.len() as i64);
    }

    #[test]
    fn test_having_filters_groups_by_alias() {
        let records = fixture();
        let result = run(
            &records,
            "SELECT ip, COUNT() AS attempts FROM logs GROUP BY ip HAVING attempts > 1",
        );
        assert_eq!(result.count, 2);
        for row in &result.rows {
            assert!(matches!(row[1], Value::Integer(n) if n > 1));
        }
    }

    #[test]
    fn test_having_with_aggregate_expression() {
        let records = fixture();
        let result = run(
            &records,
            "SELECT ip FROM logs GROUP BY ip HAVING COUNT() = 1",
        );
        assert_eq!(result.count, 1);
        assert_eq!(result.rows[0][0], Value::String("172.16.0.9".into()));
    }

    #[test]
    fn test_order_by_descending_with_limit() {
        let records = fixture();
        let result = run(
            &records,
            "SELECT ip, COUNT() AS n FROM logs GROUP BY ip ORDER BY n DESC LIMIT 2",
        );
        assert_eq!(result.count, 2);
        assert_eq!(result.rows[0][1], Value::Integer(2));
        assert_eq!(result.rows[1][1], Value::Integer(2));
        // Equal counts break ties on the group key, ascending
        assert_eq!(result.rows[0][0], Value::String("10.0.0.5".into()));
        assert_eq!(result.rows[1][0], Value::String("192.168.1.1".into()));
    }

    #[test]
    fn test_order_ties_are_deterministic() {
        let records = fixture();
        let first = run(
            &records,
            "SELECT ip, COUNT() AS n FROM logs GROUP BY ip ORDER BY n DESC",
        );
        for _ in 0..5 {
            let again = run(
                &records,
                "SELECT ip, COUNT() AS n FROM logs GROUP BY ip ORDER BY n DESC",
            );
            assert_eq!(again.rows, first.rows);
        }
    }

    #[test]
    fn test_flat_order_by_alias() {
        let records = fixture();
        let result = run(
            &records,
            "SELECT status AS code FROM logs ORDER BY code ASC",
        );
        let codes: Vec<&Value> = result.rows.iter().map(|r| &r[0]).collect();
        assert_eq!(
            codes,
            vec![
                &Value::Integer(200),
                &Value::Integer(200),
                &Value::Integer(401),
                &Value::Integer(404),
                &Value::Integer(404),
            ]
        );
    }

    #[test]
    fn test_limit_zero() {
        let records = fixture();
        let result = run(&records, "SELECT ip FROM logs LIMIT 0");
        assert_eq!(result.count, 0);
        assert!(result.rows.is_empty());
    }

    #[test]
    fn test_limit_beyond_result() {
        let records = fixture();
        let result = run(&records, "SELECT ip FROM logs WHERE status = 404 LIMIT 100");
        assert_eq!(result.count, 2);
    }

    #[test]
    fn test_group_by_function() {
        let records = fixture();
        let result = run(
            &records,
            "SELECT HOUR(timestamp) AS h, COUNT() AS n FROM logs GROUP BY HOUR(timestamp)",
        );
        assert_eq!(result.count, 1);
        assert_eq!(result.rows[0][0], Value::Integer(12));
        assert_eq!(result.rows[0][1], Value::Integer(5));
    }

    #[test]
    fn test_compound_group_key() {
        let records = fixture();
        let result = run(
            &records,
            "SELECT ip, status, COUNT() AS n FROM logs GROUP BY ip, status",
        );
        assert_eq!(result.count, 4);
    }

    #[test]
    fn test_aggregates_over_groups() {
        let records = fixture();
        let result = run(
            &records,
            "SELECT ip, SUM(size) AS bytes, AVG(status) AS avg_status, \
             MIN(status) AS lo, MAX(status) AS hi FROM logs GROUP BY ip",
        );
        let first = &result.rows[0];
        assert_eq!(first[1], Value::Integer(1024));
        assert_eq!(first[2], Value::Float(300.5));
        assert_eq!(first[3], Value::Integer(200));
        assert_eq!(first[4], Value::Integer(401));
    }

    #[test]
    fn test_empty_input() {
        let result = run(&[], "SELECT ip, COUNT() AS n FROM logs GROUP BY ip");
        assert_eq!(result.count, 0);
        assert!(result.rows.is_empty());
    }

    #[test]
    fn test_lenient_mode_drops_failing_records() {
        let records = fixture();
        // CONTAINS on an integer field fails per record; lenient drops them all
        let result = run(&records, "SELECT ip FROM logs WHERE status CONTAINS '4'");
        assert_eq!(result.count, 0);
    }

    #[test]
    fn test_strict_mode_aborts_on_evaluation_error() {
        let records = fixture();
        let stmt = parse("SELECT ip FROM logs WHERE status CONTAINS '4'").unwrap();
        let err = QueryExecutor::new(&records)
            .with_strict(true)
            .execute(&stmt)
            .unwrap_err();
        assert!(err.to_string().contains("WHERE"));
    }

    #[test]
    fn test_in_range_filter() {
        let records = fixture();
        let result = run(
            &records,
            "SELECT ip FROM logs WHERE ip IN_RANGE '192.168.1.0/24'",
        );
        assert_eq!(result.count, 2);
    }
}
