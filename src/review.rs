//! Review of one script against an ordered rule list.
//!
//! The script is parsed once up front so that a syntax error aborts the call
//! with a single advice before any rule runs. Every active rule is then
//! dispatched to its advisor; advisors run concurrently and their advice is
//! merged in rule declaration order.

use std::time::Duration;

use futures::future::try_join_all;

use crate::{
    advice::{Advice, ReviewResult},
    context::{CancellationToken, Context},
    database::LiveDatabase,
    error::ReviewError,
    parser::parse_script,
    registry::Registry,
    rule::{Dialect, Rule, RuleLevel}
};

/// Input of one review call.
#[derive(Clone, Copy)]
pub struct ReviewRequest<'a> {
    pub script:        &'a str,
    /// Engine the script targets; rules for other engines are ignored
    pub dialect:       Dialect,
    pub charset:       &'a str,
    pub collation:     &'a str,
    pub database:      Option<&'a dyn LiveDatabase>,
    pub cancel:        &'a CancellationToken,
    pub query_timeout: Option<Duration>
}

impl<'a> ReviewRequest<'a> {
    pub fn new(script: &'a str, dialect: Dialect, cancel: &'a CancellationToken) -> Self {
        Self {
            script,
            dialect,
            charset:   "",
            collation: "",
            database:  None,
            cancel,
            query_timeout: None
        }
    }

    pub fn with_encoding(mut self, charset: &'a str, collation: &'a str) -> Self {
        self.charset = charset;
        self.collation = collation;
        self
    }

    pub fn with_database(mut self, database: &'a dyn LiveDatabase) -> Self {
        self.database = Some(database);
        self
    }

    pub fn with_query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = Some(timeout);
        self
    }
}

/// Runs rule lists through a registry.
#[derive(Debug, Clone, Copy)]
pub struct Reviewer<'r> {
    registry: &'r Registry
}

impl Reviewer<'static> {
    /// Reviewer over the built-in advisors.
    pub fn builtin() -> Self {
        Self::new(Registry::builtin())
    }
}

impl<'r> Reviewer<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        Self {
            registry
        }
    }

    /// Review a script.
    ///
    /// Returns an error if any active rule has no advisor for the dialect or
    /// carries a payload its advisor cannot decode. Findings, including a
    /// syntax error in the script, are returned as advice.
    pub async fn review(
        &self,
        rules: &[Rule],
        request: ReviewRequest<'_>
    ) -> Result<ReviewResult, ReviewError> {
        if let Err(err) = parse_script(
            request.script,
            request.dialect,
            request.charset,
            request.collation
        ) {
            tracing::debug!(line = err.line, "script rejected by parser");
            return Ok(ReviewResult::new(vec![err.to_advice()]));
        }

        let mut active = Vec::with_capacity(rules.len());
        for (index, rule) in rules.iter().enumerate() {
            if rule.level == RuleLevel::Disabled {
                continue;
            }
            if rule.dialect != request.dialect {
                tracing::debug!(rule = %rule.rule_type, dialect = %rule.dialect, "rule targets another engine");
                continue;
            }
            let advisor = self.registry.lookup(rule.dialect, &rule.rule_type)?;
            active.push((index, rule, advisor));
        }
        tracing::debug!(rules = rules.len(), active = active.len(), "reviewing script");

        let checks = active.into_iter().map(|(index, rule, advisor)| async move {
            let ctx = Context {
                rule,
                charset:       request.charset,
                collation:     request.collation,
                database:      request.database,
                cancel:        request.cancel,
                query_timeout: request.query_timeout
            };
            let advices = advisor.check(&ctx, request.script).await?;
            Ok::<_, ReviewError>((index, advices))
        });
        let mut outcomes = try_join_all(checks).await?;

        // completion order is irrelevant; rule declaration order decides
        outcomes.sort_by_key(|(index, _)| *index);
        let advices: Vec<Advice> = outcomes
            .into_iter()
            .flat_map(|(_, advices)| advices)
            .collect();
        let result = ReviewResult::new(advices);
        tracing::info!(
            status = %result.status,
            advices = result.advices.len(),
            "review finished"
        );
        Ok(result)
    }
}
