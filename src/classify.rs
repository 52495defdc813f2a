//! Routing of compiled statements to Data API endpoints.
//!
//! The Data API serves result-set statements and mutations from different
//! endpoints. Statements built through the query builder carry their root
//! node kind, which decides the route directly. Raw SQL carries nothing, so it
//! is classified by its leading keyword. A leading `with` is ambiguous, since a
//! common table expression may precede a select or any mutation, and is
//! resolved by scanning the remaining tokens for a mutation clause.
//!
//! The scan runs over a small lexer that treats string literals, quoted
//! identifiers and comments as opaque, so keywords inside them never count.

use crate::{CompiledStatement, QueryKind};

/// Endpoint family a statement must be sent to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Route {
    /// Statement returns rows; sent to `query/tuples`.
    ResultSet,
    /// Statement changes data or schema; sent to `exec`.
    Mutation,
}

impl Route {
    /// Data API resource path, relative to `/api/v2/`.
    pub fn resource(self) -> &'static str {
        match self {
            Self::ResultSet => "query/tuples",
            Self::Mutation => "exec",
        }
    }
}

/// Decides which endpoint serves `statement`.
pub fn classify(statement: &CompiledStatement) -> Route {
    match statement.kind {
        QueryKind::Select | QueryKind::Explain => Route::ResultSet,
        QueryKind::Insert
        | QueryKind::Update
        | QueryKind::Delete
        | QueryKind::Replace
        | QueryKind::Ddl => Route::Mutation,
        QueryKind::Raw => classify_sql(&statement.sql),
    }
}

/// Classifies raw SQL text by its leading keyword.
pub fn classify_sql(sql: &str) -> Route {
    let mut tokens = Lexer::new(sql).skip_while(|token| *token == Token::Symbol('('));

    let Some(Token::Word(first)) = tokens.next() else {
        return Route::Mutation;
    };

    if ["select", "explain", "echo"]
        .iter()
        .any(|keyword| first.eq_ignore_ascii_case(keyword))
    {
        return Route::ResultSet;
    }

    if first.eq_ignore_ascii_case("with") && !contains_mutation_clause(tokens) {
        return Route::ResultSet;
    }

    Route::Mutation
}

/// Returns `true` when `sql` holds a second statement after a `;`.
///
/// Trailing separators, whitespace and comments are not a second statement.
pub fn has_multiple_statements(sql: &str) -> bool {
    let mut terminated = false;
    for token in Lexer::new(sql) {
        match token {
            Token::Symbol(';') => terminated = true,
            _ if terminated => return true,
            _ => {}
        }
    }
    false
}

const DELETE_MODIFIERS: &[&str] = &["low_priority", "quick", "ignore"];
const INSERT_MODIFIERS: &[&str] = &["low_priority", "delayed", "high_priority", "ignore"];
const REPLACE_MODIFIERS: &[&str] = &["low_priority", "delayed"];

fn contains_mutation_clause<'a>(tokens: impl Iterator<Item = Token<'a>>) -> bool {
    let tokens: Vec<Token<'a>> = tokens.collect();

    tokens.iter().enumerate().any(|(index, token)| {
        let Token::Word(word) = token else {
            return false;
        };
        let rest = &tokens[index + 1..];

        if word.eq_ignore_ascii_case("delete") {
            followed_by(rest, DELETE_MODIFIERS, "from")
        } else if word.eq_ignore_ascii_case("insert") {
            followed_by(rest, INSERT_MODIFIERS, "into")
        } else if word.eq_ignore_ascii_case("replace") {
            followed_by(rest, REPLACE_MODIFIERS, "into")
        } else if word.eq_ignore_ascii_case("update") {
            rest.iter()
                .any(|token| matches!(token, Token::Word(word) if word.eq_ignore_ascii_case("set")))
        } else {
            false
        }
    })
}

/// Checks that `rest` starts with `keyword`, optionally preceded by modifiers.
fn followed_by(rest: &[Token<'_>], modifiers: &[&str], keyword: &str) -> bool {
    for token in rest {
        match token {
            Token::Word(word) if word.eq_ignore_ascii_case(keyword) => return true,
            Token::Word(word) if modifiers.iter().any(|m| word.eq_ignore_ascii_case(m)) => {}
            _ => return false,
        }
    }
    false
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Token<'a> {
    /// Bare keyword or identifier.
    Word(&'a str),
    /// String literal or quoted identifier.
    Quoted,
    Symbol(char),
}

struct Lexer<'a> {
    sql: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn new(sql: &'a str) -> Self {
        Self { sql, pos: 0 }
    }

    fn peek(&self, offset: usize) -> Option<u8> {
        self.sql.as_bytes().get(self.pos + offset).copied()
    }

    /// `--` opens a comment only when followed by whitespace, a control
    /// character or the end of input; `1--1` is arithmetic.
    fn opens_dash_comment(&self) -> bool {
        self.peek(2)
            .map_or(true, |byte| byte.is_ascii_whitespace() || byte.is_ascii_control())
    }

    fn skip_line(&mut self) {
        while let Some(byte) = self.peek(0) {
            self.pos += 1;
            if byte == b'\n' {
                break;
            }
        }
    }

    fn skip_block_comment(&mut self) {
        self.pos += 2;
        while let Some(byte) = self.peek(0) {
            if byte == b'*' && self.peek(1) == Some(b'/') {
                self.pos += 2;
                return;
            }
            self.pos += 1;
        }
    }

    /// Consumes a quoted run; backslash escapes and doubled quotes stay inside.
    fn skip_quoted(&mut self, quote: u8) {
        self.pos += 1;
        while let Some(byte) = self.peek(0) {
            self.pos += 1;
            if byte == b'\\' && quote != b'`' {
                self.pos += 1;
            } else if byte == quote {
                if self.peek(0) == Some(quote) {
                    self.pos += 1;
                } else {
                    return;
                }
            }
        }
        self.pos = self.pos.min(self.sql.len());
    }
}

fn is_word_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'_' || byte == b'$' || !byte.is_ascii()
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Token<'a>> {
        loop {
            let byte = self.peek(0)?;
            match byte {
                _ if byte.is_ascii_whitespace() => self.pos += 1,
                b'-' if self.peek(1) == Some(b'-') && self.opens_dash_comment() => {
                    self.skip_line()
                }
                b'#' => self.skip_line(),
                b'/' if self.peek(1) == Some(b'*') => self.skip_block_comment(),
                b'\'' | b'"' | b'`' => {
                    self.skip_quoted(byte);
                    return Some(Token::Quoted);
                }
                _ if is_word_byte(byte) => {
                    let start = self.pos;
                    while self.peek(0).is_some_and(is_word_byte) {
                        self.pos += 1;
                    }
                    return Some(Token::Word(&self.sql[start..self.pos]));
                }
                _ => {
                    self.pos += 1;
                    return Some(Token::Symbol(byte as char));
                }
            }
        }
    }
}
