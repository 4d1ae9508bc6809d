use super::{Advisor, Checker, Scope};
use crate::{
    advice::Code,
    ast::{ConstraintKind, Node, Visit},
    error::ReviewError,
    rule::{
        Rule,
        payload::{StringListPayload, decode}
    }
};

/// New tables must contain a fixed set of columns.
pub struct ColumnRequiredAdvisor;

impl Advisor for ColumnRequiredAdvisor {
    fn checker(&self, rule: &Rule) -> Result<Box<dyn Checker>, ReviewError> {
        let payload: StringListPayload = decode(rule)?;
        Ok(Box::new(ColumnRequiredChecker {
            required: payload.list
        }))
    }
}

struct ColumnRequiredChecker {
    required: Vec<String>
}

impl Checker for ColumnRequiredChecker {
    fn enter(&mut self, node: &Node, scope: &mut Scope<'_>) -> Visit {
        let Node::CreateTable(create) = node else {
            return Visit::Descend;
        };
        if create.columns.is_empty() {
            return Visit::Skip;
        }
        let missing: Vec<&str> = self
            .required
            .iter()
            .filter(|name| create.column(name).is_none())
            .map(String::as_str)
            .collect();
        if !missing.is_empty() {
            let content = format!("Table `{}` requires columns: {}", create.name, missing.join(", "));
            scope.report(Code::NoRequiredColumn, content);
        }
        Visit::Skip
    }
}

/// Columns must be declared NOT NULL.
pub struct ColumnNoNullAdvisor;

impl Advisor for ColumnNoNullAdvisor {
    fn checker(&self, _rule: &Rule) -> Result<Box<dyn Checker>, ReviewError> {
        Ok(Box::new(ColumnNoNullChecker))
    }
}

struct ColumnNoNullChecker;

impl Checker for ColumnNoNullChecker {
    fn enter(&mut self, node: &Node, scope: &mut Scope<'_>) -> Visit {
        let Node::CreateTable(create) = node else {
            return Visit::Descend;
        };
        for column in &create.columns {
            // primary key columns are implicitly NOT NULL
            let key_column = column.primary_key
                || create.constraints.iter().any(|c| {
                    c.kind == ConstraintKind::PrimaryKey
                        && c.columns.iter().any(|n| n.eq_ignore_ascii_case(&column.name))
                });
            if !column.not_null && !key_column {
                let content = format!("`{}`.`{}` cannot have NULL value", create.name, column.name);
                scope.report(Code::ColumnCannotNull, content);
            }
        }
        Visit::Skip
    }
}
