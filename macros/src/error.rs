//! Diagnostic type shared by the SQL parser and planner.

use std::fmt;

/// A compile-time diagnostic for one query string.
///
/// Parser errors carry the lexer position inside the string; planner
/// errors (name resolution, typing) are positionless. Either way the
/// message ends up attached to the query's string literal span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryError {
    message: String,
}

impl QueryError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn at(message: impl fmt::Display, line: u32, column: u32) -> Self {
        Self {
            message: format!("{message} at line {line} column {column}"),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for QueryError {}

pub type Result<T> = std::result::Result<T, QueryError>;
