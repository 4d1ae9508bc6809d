//! # SQL Review
//!
//! Policy-driven review of SQL change scripts.
//!
//! `sql-review` checks a proposed change script against an ordered list of
//! configurable rules before the change is allowed to run. Each rule is
//! implemented by an advisor per database engine; advisors walk the parsed
//! statements and report findings as advice with stable codes.
//!
//! # Architecture
//!
//! 1. **Parsing** - [`parser`] splits the script into statements with their
//!    line numbers and lowers each one into the structural tree of [`ast`].
//!    Statements are parsed in parallel using [`rayon`].
//!
//! 2. **Dispatch** - [`registry`] maps `(dialect, rule type)` to an
//!    [`advisor::Advisor`]. The table is built once and never mutated.
//!
//! 3. **Checking** - each advisor decodes its rule payload ([`rule::payload`])
//!    and walks every statement. When the structure cannot decide, e.g. the
//!    row count of `INSERT ... SELECT`, it issues one `EXPLAIN` against a
//!    live database ([`database`]) and decodes the estimate ([`explain`]).
//!
//! 4. **Aggregation** - [`review`] runs all active rules concurrently and
//!    merges their advice in rule declaration order into a
//!    [`advice::ReviewResult`].
//!
//! # Quick Start
//!
//! ```bash
//! # Review a script against a rule file
//! sql-review review -s migration.sql -r rules.yaml
//!
//! # Dynamic checks against a live database
//! sql-review review -s migration.sql -r rules.yaml \
//!     --database-url mysql://reviewer@localhost:3306/app
//!
//! # Machine-readable output
//! sql-review review -s migration.sql -r rules.yaml -f json
//!
//! # Available rules
//! sql-review rules --dialect postgresql
//! ```
//!
//! # Rule File
//!
//! ```yaml
//! rules:
//!   - type: statement.insert.row-limit
//!     dialect: mysql
//!     level: WARNING
//!     payload:
//!       number: 1000
//!   - type: index.type-no-blob
//!     dialect: mysql
//!     level: ERROR
//! ```
//!
//! # Exit Codes
//!
//! - `0` - Success, no findings or only informational ones
//! - `1` - Warnings found
//! - `2` - Errors found, or the review could not run
//!
//! # Library Usage
//!
//! ```
//! use sql_review::{
//!     advice::{Code, Status},
//!     context::CancellationToken,
//!     review::{ReviewRequest, Reviewer},
//!     rule::{Dialect, Rule, RuleLevel, RuleType}
//! };
//!
//! let rules = vec![
//!     Rule::new(RuleType::InsertRowLimit, Dialect::MySQL, RuleLevel::Warning)
//!         .with_payload(serde_json::json!({ "number": 2 }))
//! ];
//! let cancel = CancellationToken::new();
//! let script = "INSERT INTO t VALUES (1), (2), (3)";
//! let request = ReviewRequest::new(script, Dialect::MySQL, &cancel);
//!
//! let runtime = tokio::runtime::Runtime::new().unwrap();
//! let result = runtime
//!     .block_on(Reviewer::builtin().review(&rules, request))
//!     .unwrap();
//!
//! assert_eq!(result.status, Status::Warning);
//! assert_eq!(result.advices[0].code, Code::InsertTooManyRows);
//! ```

pub mod advice;
pub mod advisor;
pub mod app;
pub mod ast;
pub mod cli;
pub mod config;
pub mod context;
pub mod database;
pub mod error;
pub mod explain;
pub mod output;
pub mod parser;
pub mod registry;
pub mod review;
pub mod rule;
