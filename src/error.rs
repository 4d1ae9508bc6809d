//! Error types.
//!
//! Engine failures that abort a review are [`ReviewError`]. Everything the
//! command-line layer surfaces goes through [`AppError`] with the helper
//! constructors below.

pub use masterror::{AppError, AppResult};
use thiserror::Error;

use crate::rule::{Dialect, RuleType};

/// Errors that stop a review call.
///
/// Findings never travel through this type; they are accumulated as advice.
#[derive(Debug, Error)]
pub enum ReviewError {
    /// Rule payload could not be decoded into the rule's configuration.
    #[error("invalid payload for rule {rule_type}: {message}")]
    InvalidConfig { rule_type: String, message: String },

    /// No advisor is registered for the dialect and rule type.
    #[error("rule {rule_type} is not supported for {dialect}")]
    NotSupported { dialect: Dialect, rule_type: RuleType }
}

impl From<ReviewError> for AppError {
    fn from(err: ReviewError) -> Self {
        AppError::bad_request(err.to_string())
    }
}

/// Create file read error
pub fn file_read_error(path: &str, source: std::io::Error) -> AppError {
    AppError::internal(format!("Failed to read file '{}': {}", path, source))
}

/// Create rules file error
pub fn rules_file_error(path: &str, message: impl std::fmt::Display) -> AppError {
    AppError::bad_request(format!("Invalid rules file '{}': {}", path, message))
}

/// Create database connection error
pub fn database_connect_error(message: impl Into<String>) -> AppError {
    AppError::service(message.into())
}

/// Create config error
pub fn config_error(message: impl Into<String>) -> AppError {
    AppError::bad_request(message.into())
}

/// Line and column reported by sqlparser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SqlPosition {
    pub line:   usize,
    pub column: usize
}

/// Extract the position from a sqlparser error message.
///
/// sqlparser appends `at Line: X, Column: Y` to parser and tokenizer errors.
pub fn extract_position(message: &str) -> Option<SqlPosition> {
    let line_marker = "Line: ";
    let line_start = message.rfind(line_marker)? + line_marker.len();
    let rest = &message[line_start..];
    let line = leading_number(rest)?;
    let column = rest
        .find("Column")
        .map(|idx| rest[idx + "Column".len()..].trim_start_matches([':', ' ']))
        .and_then(leading_number)
        .unwrap_or(0);
    Some(SqlPosition {
        line,
        column
    })
}

fn leading_number(s: &str) -> Option<usize> {
    let end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    s[..end].parse().ok()
}
