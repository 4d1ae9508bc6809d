use super::{Advisor, Checker, Probe, Scope};
use crate::{
    advice::Code,
    ast::{InsertSource, Node, Visit},
    error::ReviewError,
    rule::{
        Rule,
        payload::{NumberPayload, decode}
    }
};

/// Caps the number of rows one INSERT may add.
///
/// `VALUES` lists are counted statically. `INSERT ... SELECT` is estimated
/// with a diagnostic query when a live database is available.
pub struct InsertRowLimitAdvisor;

impl Advisor for InsertRowLimitAdvisor {
    fn checker(&self, rule: &Rule) -> Result<Box<dyn Checker>, ReviewError> {
        let payload: NumberPayload = decode(rule)?;
        Ok(Box::new(InsertRowLimitChecker {
            max_rows: (payload.number > 0).then_some(payload.number)
        }))
    }
}

struct InsertRowLimitChecker {
    /// `None` when the limit is not positive, which turns the rule off
    max_rows: Option<i64>
}

impl Checker for InsertRowLimitChecker {
    fn enter(&mut self, node: &Node, scope: &mut Scope<'_>) -> Visit {
        let (Some(max_rows), Node::Insert(insert)) = (self.max_rows, node) else {
            return Visit::Descend;
        };
        match insert.source {
            InsertSource::Values(rows) if rows as i64 > max_rows => {
                let content = too_many_rows(scope.text(), rows as i64, max_rows);
                scope.report(Code::InsertTooManyRows, content);
            }
            InsertSource::Query => scope.probe(Code::InsertTooManyRows),
            InsertSource::Values(_) | InsertSource::Default => {}
        }
        Visit::Skip
    }

    fn on_estimate(&self, probe: &Probe, estimated_rows: i64) -> Option<String> {
        let max_rows = self.max_rows?;
        (estimated_rows > max_rows).then(|| too_many_rows(&probe.text, estimated_rows, max_rows))
    }
}

fn too_many_rows(text: &str, rows: i64, max_rows: i64) -> String {
    format!("\"{}\" inserts {} rows. The count exceeds {}.", text, rows, max_rows)
}

/// INSERT must name its target columns.
pub struct InsertMustSpecifyColumnAdvisor;

impl Advisor for InsertMustSpecifyColumnAdvisor {
    fn checker(&self, _rule: &Rule) -> Result<Box<dyn Checker>, ReviewError> {
        Ok(Box::new(InsertMustSpecifyColumnChecker))
    }
}

struct InsertMustSpecifyColumnChecker;

impl Checker for InsertMustSpecifyColumnChecker {
    fn enter(&mut self, node: &Node, scope: &mut Scope<'_>) -> Visit {
        let Node::Insert(insert) = node else {
            return Visit::Descend;
        };
        if insert.columns.is_empty() && insert.source != InsertSource::Default {
            let content = format!(
                "The INSERT statement must specify columns but \"{}\" does not",
                scope.text()
            );
            scope.report(Code::InsertNotSpecifyColumn, content);
        }
        Visit::Skip
    }
}
