//! Advisors: one rule implementation per dialect.
//!
//! An [`Advisor`] is stateless and shared process-wide through the
//! [`Registry`](crate::registry::Registry). For each check it builds a fresh
//! [`Checker`] from the rule payload and drives it over every statement of
//! the script:
//!
//! 1. the script is parsed; a syntax error becomes the only advice
//! 2. each statement is walked depth-first, the checker reports findings or
//!    asks for a dynamic probe when the structure alone cannot decide
//! 3. probes run one diagnostic query each against the live database, if one
//!    was supplied; failures become `Internal` advice
//! 4. a rule that found nothing contributes a single `OK` advice

mod column;
mod index;
mod insert;
mod statement;
mod table;

use async_trait::async_trait;
pub use column::{ColumnNoNullAdvisor, ColumnRequiredAdvisor};
pub use index::IndexTypeNoBlobAdvisor;
pub use insert::{InsertMustSpecifyColumnAdvisor, InsertRowLimitAdvisor};
pub use statement::{
    DisallowCommitAdvisor, NoLeadingWildcardLikeAdvisor, NoSelectAllAdvisor, WhereRequireAdvisor
};
pub use table::{
    BackwardCompatibilityAdvisor, NamingTableAdvisor, TableNoForeignKeyAdvisor,
    TableRequirePkAdvisor
};

use crate::{
    advice::{Advice, Code, Status},
    ast::{Node, Visit, walk},
    context::Context,
    database::run_diagnostic,
    error::ReviewError,
    explain::decoder_for,
    parser::{Statement, parse_script},
    registry::RegistryBuilder,
    rule::{Dialect, Rule, RuleType}
};

/// Traversal state of one rule over one script.
///
/// A checker lives for a single check call, so it may accumulate
/// cross-statement state such as the tables created earlier in the script.
pub trait Checker: Send + Sync {
    /// Called for every visited node; returning [`Visit::Skip`] stops the
    /// descent below `node`.
    fn enter(&mut self, node: &Node, scope: &mut Scope<'_>) -> Visit;

    /// Content of the advice for a probe whose estimate is known, or `None`
    /// when the estimate satisfies the rule.
    fn on_estimate(&self, _probe: &Probe, _estimated_rows: i64) -> Option<String> {
        None
    }
}

/// A statement that needs a diagnostic query to be decided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Probe {
    pub text: String,
    pub line: usize,
    /// Code of the advice reported if the estimate violates the rule
    pub code: Code
}

#[derive(Debug)]
enum Finding {
    Report {
        code:    Code,
        content: String,
        line:    usize
    },
    Probe(Probe)
}

/// Per-statement reporting handle passed to [`Checker::enter`].
///
/// Text and line always refer to the statement being walked.
pub struct Scope<'s> {
    statement: &'s Statement,
    findings:  &'s mut Vec<Finding>,
    first:     usize
}

impl<'s> Scope<'s> {
    fn new(statement: &'s Statement, findings: &'s mut Vec<Finding>) -> Self {
        let first = findings.len();
        Self {
            statement,
            findings,
            first
        }
    }

    pub fn text(&self) -> &str {
        &self.statement.text
    }

    pub fn line(&self) -> usize {
        self.statement.line
    }

    pub fn report(&mut self, code: Code, content: impl Into<String>) {
        self.findings.push(Finding::Report {
            code,
            content: content.into(),
            line:    self.statement.line
        });
    }

    /// Defer the decision to a diagnostic query on this statement.
    pub fn probe(&mut self, code: Code) {
        self.findings.push(Finding::Probe(Probe {
            text: self.statement.text.clone(),
            line: self.statement.line,
            code
        }));
    }

    /// Whether anything was reported for this statement yet.
    pub fn reported(&self) -> bool {
        self.findings.len() > self.first
    }
}

/// Implementation of one rule type for one dialect.
#[async_trait]
pub trait Advisor: Send + Sync {
    /// Build a checker from the rule payload.
    fn checker(&self, rule: &Rule) -> Result<Box<dyn Checker>, ReviewError>;

    /// Check a script against `ctx.rule`.
    async fn check(&self, ctx: &Context<'_>, script: &str) -> Result<Vec<Advice>, ReviewError> {
        let Some(status) = ctx.rule.level.status() else {
            return Ok(Vec::new());
        };
        let checker = self.checker(ctx.rule)?;
        let statements = match parse_script(script, ctx.rule.dialect, ctx.charset, ctx.collation)
        {
            Ok(statements) => statements,
            Err(err) => return Ok(vec![err.to_advice()])
        };
        Ok(drive(ctx, status, checker, &statements).await)
    }
}

async fn drive(
    ctx: &Context<'_>,
    status: Status,
    mut checker: Box<dyn Checker>,
    statements: &[Statement]
) -> Vec<Advice> {
    let mut findings = Vec::new();
    for statement in statements {
        let mut scope = Scope::new(statement, &mut findings);
        walk(&statement.node, &mut |node| checker.enter(node, &mut scope));
    }

    let title = ctx.rule.rule_type.to_string();
    let mut advices = Vec::with_capacity(findings.len());
    for finding in findings {
        match finding {
            Finding::Report {
                code,
                content,
                line
            } => advices.push(Advice {
                status,
                code,
                title: title.clone(),
                content,
                line
            }),
            Finding::Probe(probe) => {
                if let Some(advice) = verify(ctx, status, checker.as_ref(), &probe).await {
                    advices.push(advice);
                }
            }
        }
    }
    if advices.is_empty() {
        advices.push(Advice::ok());
    }
    advices
}

/// Resolve a probe with one diagnostic query.
async fn verify(
    ctx: &Context<'_>,
    status: Status,
    checker: &dyn Checker,
    probe: &Probe
) -> Option<Advice> {
    let title = ctx.rule.rule_type.to_string();
    let Some(database) = ctx.database else {
        tracing::debug!(rule = %title, line = probe.line, "no live database, skipping dynamic check");
        return None;
    };
    let sql = format!("EXPLAIN {}", probe.text);
    let result = match run_diagnostic(database, &sql, ctx.cancel, ctx.query_timeout).await {
        Ok(result) => result,
        Err(err) => {
            tracing::warn!(rule = %title, line = probe.line, error = %err, "diagnostic query failed");
            return Some(Advice::internal(
                title,
                format!("\"{}\" dry runs failed: {}", probe.text, err),
                probe.line
            ));
        }
    };
    let estimated_rows = match decoder_for(ctx.rule.dialect).estimated_rows(&result) {
        Ok(rows) => rows,
        Err(err) => {
            tracing::warn!(rule = %title, line = probe.line, error = %err, "diagnostic output not understood");
            return Some(Advice::internal(
                title,
                format!("failed to get row count for \"{}\": {}", probe.text, err),
                probe.line
            ));
        }
    };
    tracing::debug!(rule = %title, line = probe.line, estimated_rows, "diagnostic estimate");
    checker
        .on_estimate(probe, estimated_rows)
        .map(|content| Advice {
            status,
            code: probe.code,
            title,
            content,
            line: probe.line
        })
}

/// Register every built-in advisor.
pub(crate) fn register_builtin(builder: &mut RegistryBuilder) {
    for dialect in Dialect::ALL {
        builder.register(dialect, RuleType::InsertRowLimit, Box::new(InsertRowLimitAdvisor));
        builder.register(
            dialect,
            RuleType::InsertMustSpecifyColumn,
            Box::new(InsertMustSpecifyColumnAdvisor)
        );
        builder.register(dialect, RuleType::WhereRequire, Box::new(WhereRequireAdvisor));
        builder.register(dialect, RuleType::NoSelectAll, Box::new(NoSelectAllAdvisor));
        builder.register(
            dialect,
            RuleType::NoLeadingWildcardLike,
            Box::new(NoLeadingWildcardLikeAdvisor)
        );
        builder.register(dialect, RuleType::TableRequirePk, Box::new(TableRequirePkAdvisor));
        builder.register(
            dialect,
            RuleType::TableNoForeignKey,
            Box::new(TableNoForeignKeyAdvisor)
        );
        builder.register(
            dialect,
            RuleType::BackwardCompatibility,
            Box::new(BackwardCompatibilityAdvisor)
        );
        builder.register(dialect, RuleType::NamingTable, Box::new(NamingTableAdvisor));
        builder.register(dialect, RuleType::ColumnRequired, Box::new(ColumnRequiredAdvisor));
        builder.register(dialect, RuleType::ColumnNoNull, Box::new(ColumnNoNullAdvisor));
    }
    // BLOB/TEXT index prefixes and implicit-commit scripts are MySQL family concerns
    for dialect in [Dialect::MySQL, Dialect::TiDB] {
        builder.register(dialect, RuleType::IndexTypeNoBlob, Box::new(IndexTypeNoBlobAdvisor));
        builder.register(dialect, RuleType::DisallowCommit, Box::new(DisallowCommitAdvisor));
    }
}
