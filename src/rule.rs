//! Rule definitions as supplied by the policy store.
//!
//! A [`Rule`] is read-only input to the engine: its type selects the advisor,
//! its dialect selects the grammar and diagnostic layout, its level selects
//! the advice status and its payload is decoded by [`payload`] into the
//! rule-specific configuration.
//!
//! ```
//! use sql_review::rule::{Dialect, Rule, RuleLevel, RuleType};
//!
//! let rule: Rule = serde_yaml::from_str(
//!     r#"
//! type: statement.insert.row-limit
//! dialect: mysql
//! level: WARNING
//! payload:
//!   number: 1000
//! "#
//! )
//! .unwrap();
//!
//! assert_eq!(rule.rule_type, RuleType::InsertRowLimit);
//! assert_eq!(rule.dialect, Dialect::MySQL);
//! assert_eq!(rule.level, RuleLevel::Warning);
//! ```

pub mod payload;

use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use sqlparser::dialect::{Dialect as ParserDialect, MySqlDialect, PostgreSqlDialect};

use crate::advice::Status;

/// Target database engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dialect {
    #[serde(rename = "mysql", alias = "MYSQL", alias = "MySQL")]
    MySQL,
    #[serde(rename = "postgresql", alias = "POSTGRES", alias = "postgres", alias = "PostgreSQL")]
    PostgreSQL,
    #[serde(rename = "tidb", alias = "TIDB", alias = "TiDB")]
    TiDB
}

impl Dialect {
    pub const ALL: [Dialect; 3] = [Dialect::MySQL, Dialect::PostgreSQL, Dialect::TiDB];

    /// Grammar used to parse scripts for this engine.
    ///
    /// TiDB speaks the MySQL grammar.
    pub fn into_parser_dialect(self) -> Box<dyn ParserDialect> {
        match self {
            Self::MySQL | Self::TiDB => Box::new(MySqlDialect {}),
            Self::PostgreSQL => Box::new(PostgreSqlDialect {})
        }
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MySQL => write!(f, "MySQL"),
            Self::PostgreSQL => write!(f, "PostgreSQL"),
            Self::TiDB => write!(f, "TiDB")
        }
    }
}

/// Configured rule level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RuleLevel {
    #[serde(rename = "DISABLED", alias = "disabled")]
    Disabled,
    #[serde(rename = "INFO", alias = "info")]
    Info,
    #[serde(rename = "WARNING", alias = "warning", alias = "warn")]
    Warning,
    #[serde(rename = "ERROR", alias = "error")]
    Error
}

impl RuleLevel {
    /// Status of the advice this rule emits when triggered.
    ///
    /// `None` for disabled rules, which are never evaluated. Informational
    /// rules report findings without affecting the overall status.
    pub fn status(self) -> Option<Status> {
        match self {
            Self::Disabled => None,
            Self::Info => Some(Status::Success),
            Self::Warning => Some(Status::Warning),
            Self::Error => Some(Status::Error)
        }
    }
}

/// Stable rule type identifier.
///
/// Unknown identifiers are preserved so that lookup can report them as
/// unsupported instead of failing at deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RuleType {
    InsertRowLimit,
    InsertMustSpecifyColumn,
    WhereRequire,
    NoSelectAll,
    NoLeadingWildcardLike,
    DisallowCommit,
    TableRequirePk,
    TableNoForeignKey,
    BackwardCompatibility,
    NamingTable,
    ColumnRequired,
    ColumnNoNull,
    IndexTypeNoBlob,
    Unknown(CompactString)
}

impl RuleType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::InsertRowLimit => "statement.insert.row-limit",
            Self::InsertMustSpecifyColumn => "statement.insert.must-specify-column",
            Self::WhereRequire => "statement.where.require",
            Self::NoSelectAll => "statement.select.no-select-all",
            Self::NoLeadingWildcardLike => "statement.where.no-leading-wildcard-like",
            Self::DisallowCommit => "statement.disallow-commit",
            Self::TableRequirePk => "table.require-pk",
            Self::TableNoForeignKey => "table.no-foreign-key",
            Self::BackwardCompatibility => "schema.backward-compatibility",
            Self::NamingTable => "naming.table",
            Self::ColumnRequired => "column.required",
            Self::ColumnNoNull => "column.no-null",
            Self::IndexTypeNoBlob => "index.type-no-blob",
            Self::Unknown(s) => s.as_str()
        }
    }
}

impl From<&str> for RuleType {
    fn from(s: &str) -> Self {
        match s {
            "statement.insert.row-limit" => Self::InsertRowLimit,
            "statement.insert.must-specify-column" => Self::InsertMustSpecifyColumn,
            "statement.where.require" => Self::WhereRequire,
            "statement.select.no-select-all" => Self::NoSelectAll,
            "statement.where.no-leading-wildcard-like" => Self::NoLeadingWildcardLike,
            "statement.disallow-commit" => Self::DisallowCommit,
            "table.require-pk" => Self::TableRequirePk,
            "table.no-foreign-key" => Self::TableNoForeignKey,
            "schema.backward-compatibility" => Self::BackwardCompatibility,
            "naming.table" => Self::NamingTable,
            "column.required" => Self::ColumnRequired,
            "column.no-null" => Self::ColumnNoNull,
            "index.type-no-blob" => Self::IndexTypeNoBlob,
            other => Self::Unknown(other.into())
        }
    }
}

impl From<String> for RuleType {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

impl From<RuleType> for String {
    fn from(rule_type: RuleType) -> Self {
        rule_type.as_str().to_string()
    }
}

impl std::fmt::Display for RuleType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A configured policy check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    #[serde(rename = "type")]
    pub rule_type: RuleType,
    pub dialect:   Dialect,
    pub level:     RuleLevel,
    /// Opaque rule-specific configuration
    #[serde(default)]
    pub payload:   serde_json::Value
}

impl Rule {
    pub fn new(rule_type: RuleType, dialect: Dialect, level: RuleLevel) -> Self {
        Self {
            rule_type,
            dialect,
            level,
            payload: serde_json::Value::Null
        }
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }
}

/// Ordered rule list as stored in a policy file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuleSet {
    #[serde(default)]
    pub rules: Vec<Rule>
}
