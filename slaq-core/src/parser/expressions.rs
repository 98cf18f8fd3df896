//! Operator precedence chain for SLAQ expression parsing.
//!
//! Precedence (lowest to highest):
//! 1. Logical OR
//! 2. Logical AND
//! 3. Comparison / membership (flat, non-chaining)
//! 4. Unary NOT (wraps the following comparison)
//! 5. Primary: fields, literals, function calls, parenthesized expressions
//!
//! `BETWEEN low AND high` is rewritten here to
//! `(left >= low) AND (left <= high)`; the record predicates
//! (IS_BOT / IS_ERROR / IS_SUCCESS) attach as unary operators to the
//! already-parsed left operand.

use crate::ast::{AggregateFunc, BinaryOperator, Expression, UnaryOperator};
use crate::error::SlaqResult;
use crate::lexer::TokenKind;
use crate::parser::Parser;
use crate::value::Value;

impl Parser {
    pub(super) fn parse_expression(&mut self) -> SlaqResult<Expression> {
        self.parse_or_expression()
    }

    fn parse_or_expression(&mut self) -> SlaqResult<Expression> {
        let mut left = self.parse_and_expression()?;

        while self.current_kind() == &TokenKind::Or {
            self.advance();
            let right = self.parse_and_expression()?;
            left = Expression::Binary {
                left: Box::new(left),
                op: BinaryOperator::Or,
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    fn parse_and_expression(&mut self) -> SlaqResult<Expression> {
        let mut left = self.parse_comparison_expression()?;

        while self.current_kind() == &TokenKind::And {
            self.advance();
            let right = self.parse_comparison_expression()?;
            left = Expression::Binary {
                left: Box::new(left),
                op: BinaryOperator::And,
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    /// One comparison at most; SLAQ comparisons do not chain.
    fn parse_comparison_expression(&mut self) -> SlaqResult<Expression> {
        if self.current_kind() == &TokenKind::Not {
            self.advance();
            let operand = self.parse_comparison_expression()?;
            return Ok(Expression::Unary {
                op: UnaryOperator::Not,
                operand: Box::new(operand),
            });
        }

        let left = self.parse_primary()?;

        let op = match self.current_kind() {
            TokenKind::Eq => BinaryOperator::Equal,
            TokenKind::NotEq => BinaryOperator::NotEqual,
            TokenKind::LessThan => BinaryOperator::LessThan,
            TokenKind::LessEq => BinaryOperator::LessThanOrEqual,
            TokenKind::GreaterThan => BinaryOperator::GreaterThan,
            TokenKind::GreaterEq => BinaryOperator::GreaterThanOrEqual,
            TokenKind::Like => BinaryOperator::Like,
            TokenKind::Matches => BinaryOperator::Matches,
            TokenKind::Contains => BinaryOperator::Contains,
            TokenKind::StartsWith => BinaryOperator::StartsWith,
            TokenKind::EndsWith => BinaryOperator::EndsWith,
            TokenKind::InRange => BinaryOperator::InRange,

            TokenKind::Between => {
                self.advance();
                return self.parse_between(left);
            }
            TokenKind::In => {
                self.advance();
                return self.parse_in_list(left);
            }

            TokenKind::IsBot => {
                self.advance();
                return Ok(Expression::Unary {
                    op: UnaryOperator::IsBot,
                    operand: Box::new(left),
                });
            }
            TokenKind::IsError => {
                self.advance();
                return Ok(Expression::Unary {
                    op: UnaryOperator::IsError,
                    operand: Box::new(left),
                });
            }
            TokenKind::IsSuccess => {
                self.advance();
                return Ok(Expression::Unary {
                    op: UnaryOperator::IsSuccess,
                    operand: Box::new(left),
                });
            }

            _ => return Ok(left),
        };

        self.advance();
        let right = self.parse_primary()?;
        Ok(Expression::Binary {
            left: Box::new(left),
            op,
            right: Box::new(right),
        })
    }

    /// `left BETWEEN low AND high` desugars to a pair of comparisons.
    fn parse_between(&mut self, left: Expression) -> SlaqResult<Expression> {
        let low = self.parse_primary()?;
        self.expect(TokenKind::And, "AND in BETWEEN")?;
        let high = self.parse_primary()?;

        Ok(Expression::Binary {
            left: Box::new(Expression::Binary {
                left: Box::new(left.clone()),
                op: BinaryOperator::GreaterThanOrEqual,
                right: Box::new(low),
            }),
            op: BinaryOperator::And,
            right: Box::new(Expression::Binary {
                left: Box::new(left),
                op: BinaryOperator::LessThanOrEqual,
                right: Box::new(high),
            }),
        })
    }

    /// `left IN (lit, lit, ...)` — the list holds literals only.
    fn parse_in_list(&mut self, left: Expression) -> SlaqResult<Expression> {
        self.expect(TokenKind::LeftParen, "'(' after IN")?;

        let mut items = Vec::new();
        if self.current_kind() != &TokenKind::RightParen {
            loop {
                items.push(self.parse_literal_value()?);
                if self.current_kind() == &TokenKind::Comma {
                    self.advance();
                } else {
                    break;
                }
            }
        }
        self.expect(TokenKind::RightParen, "')' closing IN list")?;

        Ok(Expression::Binary {
            left: Box::new(left),
            op: BinaryOperator::In,
            right: Box::new(Expression::Literal(Value::List(items))),
        })
    }

    fn parse_literal_value(&mut self) -> SlaqResult<Value> {
        let value = match self.current_kind() {
            TokenKind::String(s) => Value::String(s.clone()),
            TokenKind::Integer(n) => Value::Integer(*n),
            TokenKind::Float(f) => Value::Float(*f),
            TokenKind::Boolean(b) => Value::Boolean(*b),
            TokenKind::Timestamp(ts) => Value::Timestamp(*ts),
            _ => return Err(self.error_here("expected a literal value")),
        };
        self.advance();
        Ok(value)
    }

    fn parse_primary(&mut self) -> SlaqResult<Expression> {
        match self.current_kind().clone() {
            TokenKind::Field(name) => {
                self.advance();
                // A field name followed by '(' is a call to a function the
                // lexer did not recognize; let evaluation report it by name.
                if self.current_kind() == &TokenKind::LeftParen {
                    let args = self.parse_call_args()?;
                    Ok(Expression::FunctionCall {
                        name: name.to_uppercase(),
                        args,
                    })
                } else {
                    Ok(Expression::Field(name))
                }
            }

            TokenKind::Function(name) => {
                self.advance();
                let call_pos = self.current().position;
                if self.current_kind() != &TokenKind::LeftParen {
                    return Err(self.error_here(format!("expected '(' after {}", name)));
                }
                let args = self.parse_call_args()?;

                match AggregateFunc::from_name(&name) {
                    Some(AggregateFunc::Count) => {
                        if !args.is_empty() {
                            return Err(crate::error::SlaqError::parse(
                                "COUNT takes no arguments",
                                call_pos,
                            ));
                        }
                        Ok(Expression::Aggregate {
                            func: AggregateFunc::Count,
                            argument: None,
                        })
                    }
                    Some(func) => {
                        if args.len() != 1 {
                            return Err(crate::error::SlaqError::parse(
                                format!("{} takes exactly one argument", func.name()),
                                call_pos,
                            ));
                        }
                        let argument = args.into_iter().next().unwrap();
                        if argument.contains_aggregate() {
                            return Err(crate::error::SlaqError::parse(
                                format!("{} cannot contain another aggregate", func.name()),
                                call_pos,
                            ));
                        }
                        Ok(Expression::Aggregate {
                            func,
                            argument: Some(Box::new(argument)),
                        })
                    }
                    None => Ok(Expression::FunctionCall { name, args }),
                }
            }

            TokenKind::String(s) => {
                self.advance();
                Ok(Expression::Literal(Value::String(s)))
            }
            TokenKind::Integer(n) => {
                self.advance();
                Ok(Expression::Literal(Value::Integer(n)))
            }
            TokenKind::Float(f) => {
                self.advance();
                Ok(Expression::Literal(Value::Float(f)))
            }
            TokenKind::Boolean(b) => {
                self.advance();
                Ok(Expression::Literal(Value::Boolean(b)))
            }
            TokenKind::Timestamp(ts) => {
                self.advance();
                Ok(Expression::Literal(Value::Timestamp(ts)))
            }

            TokenKind::LeftParen => {
                self.advance();
                let expr = self.parse_expression()?;
                self.expect(TokenKind::RightParen, "')'")?;
                Ok(expr)
            }

            _ => Err(self.error_here(format!(
                "unexpected token '{}' in expression",
                self.current().text
            ))),
        }
    }

    /// Parse `( expr, expr, ... )` after a function name.
    fn parse_call_args(&mut self) -> SlaqResult<Vec<Expression>> {
        self.expect(TokenKind::LeftParen, "'('")?;

        let mut args = Vec::new();
        if self.current_kind() != &TokenKind::RightParen {
            loop {
                args.push(self.parse_expression()?);
                if self.current_kind() == &TokenKind::Comma {
                    self.advance();
                } else {
                    break;
                }
            }
        }
        self.expect(TokenKind::RightParen, "')' closing the argument list")?;
        Ok(args)
    }
}
