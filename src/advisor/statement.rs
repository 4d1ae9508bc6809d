use super::{Advisor, Checker, Scope};
use crate::{
    advice::Code,
    ast::{Node, Visit},
    error::ReviewError,
    rule::Rule
};

/// UPDATE, DELETE and SELECT over tables must have a WHERE clause.
pub struct WhereRequireAdvisor;

impl Advisor for WhereRequireAdvisor {
    fn checker(&self, _rule: &Rule) -> Result<Box<dyn Checker>, ReviewError> {
        Ok(Box::new(WhereRequireChecker))
    }
}

struct WhereRequireChecker;

impl Checker for WhereRequireChecker {
    fn enter(&mut self, node: &Node, scope: &mut Scope<'_>) -> Visit {
        let missing = match node {
            Node::Update(update) => !update.has_where,
            Node::Delete(delete) => !delete.has_where,
            Node::Select(select) => !select.tables.is_empty() && !select.has_where,
            _ => return Visit::Descend
        };
        if !missing {
            return Visit::Descend;
        }
        let content = format!("\"{}\" requires WHERE clause", scope.text());
        scope.report(Code::StatementNoWhere, content);
        Visit::Skip
    }
}

/// `SELECT *` is not allowed.
pub struct NoSelectAllAdvisor;

impl Advisor for NoSelectAllAdvisor {
    fn checker(&self, _rule: &Rule) -> Result<Box<dyn Checker>, ReviewError> {
        Ok(Box::new(NoSelectAllChecker))
    }
}

struct NoSelectAllChecker;

impl Checker for NoSelectAllChecker {
    fn enter(&mut self, node: &Node, scope: &mut Scope<'_>) -> Visit {
        match node {
            Node::Select(select) if select.wildcard => {
                let content = format!("\"{}\" uses SELECT all", scope.text());
                scope.report(Code::StatementSelectAll, content);
                Visit::Skip
            }
            _ => Visit::Descend
        }
    }
}

/// `LIKE '%...'` cannot use an index.
pub struct NoLeadingWildcardLikeAdvisor;

impl Advisor for NoLeadingWildcardLikeAdvisor {
    fn checker(&self, _rule: &Rule) -> Result<Box<dyn Checker>, ReviewError> {
        Ok(Box::new(NoLeadingWildcardLikeChecker))
    }
}

struct NoLeadingWildcardLikeChecker;

impl Checker for NoLeadingWildcardLikeChecker {
    fn enter(&mut self, node: &Node, scope: &mut Scope<'_>) -> Visit {
        if let Node::Like(like) = node
            && like.pattern.starts_with('%')
            && !scope.reported()
        {
            let content = format!("\"{}\" uses leading wildcard LIKE", scope.text());
            scope.report(Code::StatementLeadingWildcardLike, content);
        }
        Visit::Descend
    }
}

/// Scripts must not commit on their own.
pub struct DisallowCommitAdvisor;

impl Advisor for DisallowCommitAdvisor {
    fn checker(&self, _rule: &Rule) -> Result<Box<dyn Checker>, ReviewError> {
        Ok(Box::new(DisallowCommitChecker))
    }
}

struct DisallowCommitChecker;

impl Checker for DisallowCommitChecker {
    fn enter(&mut self, node: &Node, scope: &mut Scope<'_>) -> Visit {
        if matches!(node, Node::Commit) {
            let content = format!("Commit is not allowed, related statement: \"{}\"", scope.text());
            scope.report(Code::StatementDisallowCommit, content);
        }
        Visit::Descend
    }
}
