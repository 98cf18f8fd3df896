//! SLAQ lexer.
//!
//! Turns raw query text into a token stream ending in exactly one `Eof`.
//! Every token records the offset it started at so parse errors can point
//! back into the query string.
//!
//! Quoted literals are read verbatim (no escape processing) and then
//! reclassified: boolean, then timestamp (three fixed patterns), then
//! integer/float, otherwise string. Bare identifiers classify as keyword,
//! record field, known function, or generic field, in that order.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::error::{SlaqError, SlaqResult};
use crate::value::LogRecord;

/// Names the evaluator resolves as scalar or aggregate functions.
pub const FUNCTION_NAMES: [&str; 15] = [
    "COUNT",
    "SUM",
    "AVG",
    "MIN",
    "MAX",
    "HOUR",
    "DAY",
    "WEEKDAY",
    "DATE",
    "UPPER",
    "LOWER",
    "LENGTH",
    "SUBSTR",
    "IS_PRIVATE_IP",
    "COUNTRY",
];

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Literals
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Timestamp(NaiveDateTime),

    // Identifiers
    Field(String),
    Function(String),

    // Clause keywords
    Select,
    From,
    Where,
    Group,
    Order,
    Having,
    Limit,
    By,
    As,
    Asc,
    Desc,

    // Logical operators
    And,
    Or,
    Not,

    // Comparison operators
    Eq,        // =
    NotEq,     // != or <>
    LessThan,  // <
    LessEq,    // <=
    GreaterThan, // >
    GreaterEq, // >=

    // String matching operators
    Like,
    Matches,
    Contains,
    StartsWith,
    EndsWith,

    // Set / range operators
    In,
    InRange,
    Between,

    // Record predicates
    IsBot,
    IsError,
    IsSuccess,

    // Punctuation
    Star,
    LeftParen,
    RightParen,
    Comma,
    Semicolon,

    Eof,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub position: usize,
}

impl Token {
    fn new(kind: TokenKind, text: impl Into<String>, position: usize) -> Self {
        Self {
            kind,
            text: text.into(),
            position,
        }
    }
}

pub struct Lexer {
    input: Vec<char>,
    position: usize,
    current_char: Option<char>,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        let chars: Vec<char> = input.chars().collect();
        let current_char = chars.first().copied();

        Self {
            input: chars,
            position: 0,
            current_char,
        }
    }

    fn advance(&mut self) {
        self.position += 1;
        self.current_char = self.input.get(self.position).copied();
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.current_char {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn read_number(&mut self) -> SlaqResult<Token> {
        let start = self.position;
        let mut num_str = String::new();
        let mut has_dot = false;

        while let Some(ch) = self.current_char {
            if ch.is_ascii_digit() {
                num_str.push(ch);
                self.advance();
            } else if ch == '.' && !has_dot {
                has_dot = true;
                num_str.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        let kind = if has_dot {
            num_str
                .parse::<f64>()
                .map(TokenKind::Float)
                .map_err(|_| SlaqError::lex(format!("invalid float: {}", num_str), start))?
        } else {
            num_str
                .parse::<i64>()
                .map(TokenKind::Integer)
                .map_err(|_| SlaqError::lex(format!("invalid integer: {}", num_str), start))?
        };

        Ok(Token::new(kind, num_str, start))
    }

    /// Read a quoted literal verbatim, then reclassify its content.
    fn read_quoted(&mut self) -> SlaqResult<Token> {
        let start = self.position;
        let quote = self.current_char.unwrap();
        self.advance(); // skip opening quote

        let mut content = String::new();
        while let Some(ch) = self.current_char {
            if ch == quote {
                self.advance(); // skip closing quote
                return Ok(Token::new(classify_literal(&content), content, start));
            }
            content.push(ch);
            self.advance();
        }

        Err(SlaqError::lex("unterminated string literal", start))
    }

    fn read_identifier(&mut self) -> Token {
        let start = self.position;
        let mut ident = String::new();

        while let Some(ch) = self.current_char {
            if ch.is_alphanumeric() || ch == '_' {
                ident.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        let kind = match ident.to_uppercase().as_str() {
            "SELECT" => TokenKind::Select,
            "FROM" => TokenKind::From,
            "WHERE" => TokenKind::Where,
            "GROUP" => TokenKind::Group,
            "ORDER" => TokenKind::Order,
            "HAVING" => TokenKind::Having,
            "LIMIT" => TokenKind::Limit,
            "BY" => TokenKind::By,
            "AS" => TokenKind::As,
            "ASC" => TokenKind::Asc,
            "DESC" => TokenKind::Desc,
            "AND" => TokenKind::And,
            "OR" => TokenKind::Or,
            "NOT" => TokenKind::Not,
            "LIKE" => TokenKind::Like,
            "MATCHES" => TokenKind::Matches,
            "CONTAINS" => TokenKind::Contains,
            "STARTS_WITH" => TokenKind::StartsWith,
            "ENDS_WITH" => TokenKind::EndsWith,
            "IN" => TokenKind::In,
            "IN_RANGE" => TokenKind::InRange,
            "BETWEEN" => TokenKind::Between,
            "IS_BOT" => TokenKind::IsBot,
            "IS_ERROR" => TokenKind::IsError,
            "IS_SUCCESS" => TokenKind::IsSuccess,
            "TRUE" => TokenKind::Boolean(true),
            "FALSE" => TokenKind::Boolean(false),
            upper => {
                if LogRecord::is_field(&ident) {
                    TokenKind::Field(ident.clone())
                } else if FUNCTION_NAMES.contains(&upper) {
                    TokenKind::Function(upper.to_string())
                } else {
                    // Unknown identifiers stay fields so future record
                    // attributes are not rejected at lex time.
                    TokenKind::Field(ident.clone())
                }
            }
        };

        Token::new(kind, ident, start)
    }

    pub fn next_token(&mut self) -> SlaqResult<Token> {
        self.skip_whitespace();
        let start = self.position;

        let token = match self.current_char {
            None => Token::new(TokenKind::Eof, "", start),

            Some(ch) if ch.is_ascii_digit() => return self.read_number(),

            Some('"') | Some('\'') => return self.read_quoted(),

            Some(ch) if ch.is_alphabetic() || ch == '_' => return Ok(self.read_identifier()),

            Some('=') => {
                self.advance();
                Token::new(TokenKind::Eq, "=", start)
            }

            Some('!') => {
                self.advance();
                if self.current_char == Some('=') {
                    self.advance();
                    Token::new(TokenKind::NotEq, "!=", start)
                } else {
                    return Err(SlaqError::lex("expected '=' after '!'", start));
                }
            }

            Some('<') => {
                self.advance();
                if self.current_char == Some('=') {
                    self.advance();
                    Token::new(TokenKind::LessEq, "<=", start)
                } else if self.current_char == Some('>') {
                    self.advance();
                    Token::new(TokenKind::NotEq, "<>", start)
                } else {
                    Token::new(TokenKind::LessThan, "<", start)
                }
            }

            Some('>') => {
                self.advance();
                if self.current_char == Some('=') {
                    self.advance();
                    Token::new(TokenKind::GreaterEq, ">=", start)
                } else {
                    Token::new(TokenKind::GreaterThan, ">", start)
                }
            }

            Some('*') => {
                self.advance();
                Token::new(TokenKind::Star, "*", start)
            }
            Some('(') => {
                self.advance();
                Token::new(TokenKind::LeftParen, "(", start)
            }
            Some(')') => {
                self.advance();
                Token::new(TokenKind::RightParen, ")", start)
            }
            Some(',') => {
                self.advance();
                Token::new(TokenKind::Comma, ",", start)
            }
            Some(';') => {
                self.advance();
                Token::new(TokenKind::Semicolon, ";", start)
            }

            Some(ch) => {
                return Err(SlaqError::lex(format!("unexpected character: {}", ch), start));
            }
        };

        Ok(token)
    }

    pub fn tokenize(&mut self) -> SlaqResult<Vec<Token>> {
        let mut tokens = Vec::new();

        loop {
            let token = self.next_token()?;
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                break;
            }
        }

        Ok(tokens)
    }
}

/// Reclassify quoted literal content: boolean, then timestamp, then number,
/// otherwise string.
fn classify_literal(content: &str) -> TokenKind {
    if content.eq_ignore_ascii_case("true") {
        return TokenKind::Boolean(true);
    }
    if content.eq_ignore_ascii_case("false") {
        return TokenKind::Boolean(false);
    }

    if let Ok(ts) = NaiveDateTime::parse_from_str(content, "%Y-%m-%d %H:%M:%S") {
        return TokenKind::Timestamp(ts);
    }
    if let Ok(date) = NaiveDate::parse_from_str(content, "%Y-%m-%d") {
        return TokenKind::Timestamp(date.and_hms_opt(0, 0, 0).unwrap());
    }
    if let Ok(time) = NaiveTime::parse_from_str(content, "%H:%M:%S") {
        // Time-only literals anchor to a fixed date so comparisons stay
        // deterministic across runs.
        return TokenKind::Timestamp(NaiveDate::from_ymd_opt(1970, 1, 1).unwrap().and_time(time));
    }

    if let Ok(n) = content.parse::<i64>() {
        return TokenKind::Integer(n);
    }
    if let Ok(f) = content.parse::<f64>() {
        return TokenKind::Float(f);
    }

    TokenKind::String(content.to_string())
}
