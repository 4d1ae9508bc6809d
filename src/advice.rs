//! Review findings and the aggregated review result.
//!
//! - [`Status`] - Advice severity (Success, Warning, Error)
//! - [`Code`] - Stable integer codes callers branch on
//! - [`Advice`] - One finding produced by a rule
//! - [`ReviewResult`] - Ordered findings for one script

use serde::{Serialize, Serializer};

/// Severity of a single advice.
///
/// Ordered from lowest to highest so the overall status of a review is the
/// maximum over its advice. Exit codes follow the same ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    /// Nothing to report (exit code 0)
    Success,
    /// Policy violation that does not block the change (exit code 1)
    Warning,
    /// Policy violation that blocks the change (exit code 2)
    Error
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Success => write!(f, "SUCCESS"),
            Self::Warning => write!(f, "WARN"),
            Self::Error => write!(f, "ERROR")
        }
    }
}

/// Stable advice code.
///
/// The numeric value is the contract with callers; content wording may
/// change between releases, codes never do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Code {
    /// Synthetic success for a rule that found nothing
    Ok,
    /// Diagnostic query or its decoding failed
    Internal,

    /// `DROP DATABASE` or `DROP SCHEMA`
    CompatibilityDropDatabase,
    /// `DROP TABLE`
    CompatibilityDropTable,

    /// Script failed to parse
    StatementSyntaxError,
    /// UPDATE, DELETE or SELECT without WHERE
    StatementNoWhere,
    /// `SELECT *`
    StatementSelectAll,
    /// `LIKE '%...'`
    StatementLeadingWildcardLike,
    /// COMMIT inside a change script
    StatementDisallowCommit,

    /// CREATE TABLE misses a required column
    NoRequiredColumn,
    /// Nullable column
    ColumnCannotNull,

    /// CREATE TABLE without primary key
    TableNoPK,
    /// CREATE TABLE with a foreign key
    TableHasFK,
    /// Table name violates the naming format or length
    TableNamingMismatch,

    /// BLOB or TEXT column in an index
    IndexTypeNoBlob,

    /// INSERT exceeds the configured row count
    InsertTooManyRows,
    /// INSERT without an explicit column list
    InsertNotSpecifyColumn
}

impl Code {
    pub const fn as_u32(self) -> u32 {
        match self {
            Self::Ok => 0,
            Self::Internal => 1,
            Self::CompatibilityDropDatabase => 101,
            Self::CompatibilityDropTable => 103,
            Self::StatementSyntaxError => 201,
            Self::StatementNoWhere => 202,
            Self::StatementSelectAll => 203,
            Self::StatementLeadingWildcardLike => 204,
            Self::StatementDisallowCommit => 206,
            Self::NoRequiredColumn => 401,
            Self::ColumnCannotNull => 402,
            Self::TableNoPK => 601,
            Self::TableHasFK => 602,
            Self::TableNamingMismatch => 603,
            Self::IndexTypeNoBlob => 804,
            Self::InsertTooManyRows => 1101,
            Self::InsertNotSpecifyColumn => 1102
        }
    }
}

impl std::fmt::Display for Code {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_u32())
    }
}

impl Serialize for Code {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.as_u32())
    }
}

/// A single finding produced by one rule against one script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Advice {
    /// Severity derived from the rule level
    pub status:  Status,
    /// Stable code
    pub code:    Code,
    /// Rule type that produced the advice, or a fixed title for engine advice
    pub title:   String,
    /// Human-readable explanation
    pub content: String,
    /// 1-based line of the offending statement, 0 when not applicable
    pub line:    usize
}

impl Advice {
    /// Synthetic entry for a rule that ran and found nothing.
    pub fn ok() -> Self {
        Self {
            status:  Status::Success,
            code:    Code::Ok,
            title:   String::from("OK"),
            content: String::new(),
            line:    0
        }
    }

    /// Error entry for a failed dynamic check.
    pub fn internal(title: impl Into<String>, content: impl Into<String>, line: usize) -> Self {
        Self {
            status:  Status::Error,
            code:    Code::Internal,
            title:   title.into(),
            content: content.into(),
            line
        }
    }
}

/// Ordered advice for one script.
///
/// Every active rule contributes at least one entry, so an empty result only
/// happens when no rule was active.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewResult {
    /// Most severe status present
    pub status:  Status,
    /// Advice in rule order, then statement order, then discovery order
    pub advices: Vec<Advice>
}

impl ReviewResult {
    pub fn new(advices: Vec<Advice>) -> Self {
        let status = advices
            .iter()
            .map(|a| a.status)
            .max()
            .unwrap_or(Status::Success);
        Self {
            status,
            advices
        }
    }

    pub fn error_count(&self) -> usize {
        self.count(Status::Error)
    }

    pub fn warning_count(&self) -> usize {
        self.count(Status::Warning)
    }

    pub fn success_count(&self) -> usize {
        self.count(Status::Success)
    }

    fn count(&self, status: Status) -> usize {
        self.advices.iter().filter(|a| a.status == status).count()
    }
}
