//! Recursive-descent parser for SLAQ SELECT statements.
//!
//! Parenthesis balance is validated over the whole token stream before any
//! structural parsing so an unmatched paren is reported at its own position
//! rather than as a confusing downstream error. Clauses after FROM may appear
//! in any order; each at most once.

mod expressions;
#[cfg(test)]
mod tests;

use crate::ast::*;
use crate::error::{SlaqError, SlaqResult};
use crate::lexer::{Lexer, Token, TokenKind};

pub struct Parser {
    tokens: Vec<Token>,
    position: usize,
}

/// Parse a query string into a validated statement.
pub fn parse(input: &str) -> SlaqResult<SelectStatement> {
    Parser::new(input)?.parse()
}

impl Parser {
    pub fn new(input: &str) -> SlaqResult<Self> {
        let tokens = Lexer::new(input).tokenize()?;

        Ok(Self {
            tokens,
            position: 0,
        })
    }

    fn current(&self) -> &Token {
        // tokenize() always ends the stream with Eof
        &self.tokens[self.position.min(self.tokens.len() - 1)]
    }

    fn current_kind(&self) -> &TokenKind {
        &self.current().kind
    }

    fn peek_kind(&self) -> &TokenKind {
        match self.tokens.get(self.position + 1) {
            Some(token) => &token.kind,
            None => &TokenKind::Eof,
        }
    }

    fn advance(&mut self) {
        if self.position < self.tokens.len() {
            self.position += 1;
        }
    }

    fn error_here(&self, message: impl Into<String>) -> SlaqError {
        SlaqError::parse(message, self.current().position)
    }

    fn expect(&mut self, expected: TokenKind, what: &str) -> SlaqResult<()> {
        if self.current_kind() == &expected {
            self.advance();
            Ok(())
        } else {
            Err(self.error_here(format!("expected {}, got '{}'", what, self.current().text)))
        }
    }

    pub fn parse(&mut self) -> SlaqResult<SelectStatement> {
        self.check_paren_balance()?;

        self.expect(TokenKind::Select, "SELECT")?;
        let projection = self.parse_projection()?;
        self.expect(TokenKind::From, "FROM")?;

        let source = match self.current_kind() {
            TokenKind::Field(name) => {
                let name = name.clone();
                self.advance();
                name
            }
            _ => return Err(self.error_here("expected source name after FROM")),
        };

        let mut where_clause = None;
        let mut group_by = Vec::new();
        let mut having = None;
        let mut order_by = Vec::new();
        let mut limit = None;

        // Clause keyword positions, for validation diagnostics after the
        // whole statement is known.
        let mut where_pos = 0;
        let mut having_pos = 0;

        loop {
            match self.current_kind() {
                TokenKind::Where => {
                    if where_clause.is_some() {
                        return Err(self.error_here("duplicate WHERE clause"));
                    }
                    where_pos = self.current().position;
                    self.advance();
                    where_clause = Some(self.parse_expression()?);
                }
                TokenKind::Group => {
                    if !group_by.is_empty() {
                        return Err(self.error_here("duplicate GROUP BY clause"));
                    }
                    self.advance();
                    self.expect(TokenKind::By, "BY after GROUP")?;
                    group_by = self.parse_expression_list()?;
                }
                TokenKind::Order => {
                    if !order_by.is_empty() {
                        return Err(self.error_here("duplicate ORDER BY clause"));
                    }
                    self.advance();
                    self.expect(TokenKind::By, "BY after ORDER")?;
                    order_by = self.parse_order_keys()?;
                }
                TokenKind::Having => {
                    if having.is_some() {
                        return Err(self.error_here("duplicate HAVING clause"));
                    }
                    having_pos = self.current().position;
                    self.advance();
                    having = Some(self.parse_expression()?);
                }
                TokenKind::Limit => {
                    if limit.is_some() {
                        return Err(self.error_here("duplicate LIMIT clause"));
                    }
                    self.advance();
                    match self.current_kind() {
                        TokenKind::Integer(n) if *n >= 0 => {
                            limit = Some(*n as usize);
                            self.advance();
                        }
                        _ => {
                            return Err(
                                self.error_here("expected a non-negative integer after LIMIT")
                            )
                        }
                    }
                }
                TokenKind::Semicolon => {
                    self.advance();
                    if self.current_kind() != &TokenKind::Eof {
                        return Err(self.error_here("unexpected token after ';'"));
                    }
                }
                TokenKind::Eof => break,
                _ => {
                    return Err(self.error_here(format!(
                        "unexpected token '{}'",
                        self.current().text
                    )))
                }
            }
        }

        let statement = SelectStatement {
            projection,
            source,
            where_clause,
            group_by,
            having,
            order_by,
            limit,
        };
        self.validate(&statement, where_pos, having_pos)?;
        Ok(statement)
    }

    /// Fail fast on unbalanced parentheses, pointing at the offending token.
    fn check_paren_balance(&self) -> SlaqResult<()> {
        let mut open_positions = Vec::new();

        for token in &self.tokens {
            match token.kind {
                TokenKind::LeftParen => open_positions.push(token.position),
                TokenKind::RightParen => {
                    if open_positions.pop().is_none() {
                        return Err(SlaqError::parse("unmatched ')'", token.position));
                    }
                }
                _ => {}
            }
        }

        match open_positions.pop() {
            Some(position) => Err(SlaqError::parse("unmatched '('", position)),
            None => Ok(()),
        }
    }

    fn parse_projection(&mut self) -> SlaqResult<Projection> {
        if self.current_kind() == &TokenKind::Star {
            self.advance();
            return Ok(Projection::Wildcard);
        }

        let mut fields = Vec::new();
        loop {
            let expression = self.parse_expression()?;
            let alias = if self.current_kind() == &TokenKind::As {
                self.advance();
                match self.current_kind() {
                    TokenKind::Field(name) => {
                        let name = name.clone();
                        self.advance();
                        Some(name)
                    }
                    _ => return Err(self.error_here("expected alias name after AS")),
                }
            } else {
                None
            };
            fields.push(SelectField { expression, alias });

            if self.current_kind() == &TokenKind::Comma {
                self.advance();
            } else {
                break;
            }
        }

        Ok(Projection::Fields(fields))
    }

    fn parse_expression_list(&mut self) -> SlaqResult<Vec<Expression>> {
        let mut list = vec![self.parse_expression()?];
        while self.current_kind() == &TokenKind::Comma {
            self.advance();
            list.push(self.parse_expression()?);
        }
        Ok(list)
    }

    fn parse_order_keys(&mut self) -> SlaqResult<Vec<OrderKey>> {
        let mut keys = Vec::new();
        loop {
            let expression = self.parse_expression()?;
            let descending = match self.current_kind() {
                TokenKind::Asc => {
                    self.advance();
                    false
                }
                TokenKind::Desc => {
                    self.advance();
                    true
                }
                _ => false,
            };
            keys.push(OrderKey {
                expression,
                descending,
            });

            if self.current_kind() == &TokenKind::Comma {
                self.advance();
            } else {
                break;
            }
        }
        Ok(keys)
    }

    /// Statement-level semantic checks: aggregates only in grouped
    /// SELECT/ORDER/HAVING, HAVING only with GROUP BY, grouped projections
    /// limited to group keys and aggregates.
    fn validate(
        &self,
        stmt: &SelectStatement,
        where_pos: usize,
        having_pos: usize,
    ) -> SlaqResult<()> {
        if let Some(filter) = &stmt.where_clause {
            if filter.contains_aggregate() {
                return Err(SlaqError::parse(
                    "aggregate functions are not allowed in WHERE",
                    where_pos,
                ));
            }
        }

        let grouped = !stmt.group_by.is_empty();

        if stmt.having.is_some() && !grouped {
            return Err(SlaqError::parse(
                "HAVING requires a GROUP BY clause",
                having_pos,
            ));
        }

        if grouped {
            let group_renders: Vec<String> =
                stmt.group_by.iter().map(|e| e.to_string()).collect();
            match &stmt.projection {
                Projection::Wildcard => {
                    return Err(SlaqError::parse(
                        "SELECT * cannot be combined with GROUP BY",
                        0,
                    ));
                }
                Projection::Fields(fields) => {
                    for field in fields {
                        let is_group_key = group_renders.contains(&field.expression.to_string());
                        let is_aggregate =
                            matches!(field.expression, Expression::Aggregate { .. });
                        if !is_group_key && !is_aggregate {
                            return Err(SlaqError::parse(
                                format!(
                                    "field '{}' must be a GROUP BY expression or an aggregate",
                                    field.expression
                                ),
                                0,
                            ));
                        }
                    }
                }
            }
        } else {
            let mut offenders = Vec::new();
            if let Projection::Fields(fields) = &stmt.projection {
                offenders.extend(
                    fields
                        .iter()
                        .filter(|f| f.expression.contains_aggregate())
                        .map(|f| f.expression.to_string()),
                );
            }
            offenders.extend(
                stmt.order_by
                    .iter()
                    .filter(|k| k.expression.contains_aggregate())
                    .map(|k| k.expression.to_string()),
            );
            if let Some(expr) = offenders.first() {
                return Err(SlaqError::parse(
                    format!("aggregate '{}' requires a GROUP BY clause", expr),
                    0,
                ));
            }
        }

        Ok(())
    }
}
