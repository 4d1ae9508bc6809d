use super::{Advisor, Checker, Scope};
use crate::{
    advice::Code,
    ast::{ConstraintKind, DropObject, Node, Visit},
    error::ReviewError,
    rule::{Rule, payload::NamingFormat}
};

/// New tables must declare a primary key.
pub struct TableRequirePkAdvisor;

impl Advisor for TableRequirePkAdvisor {
    fn checker(&self, _rule: &Rule) -> Result<Box<dyn Checker>, ReviewError> {
        Ok(Box::new(TableRequirePkChecker))
    }
}

struct TableRequirePkChecker;

impl Checker for TableRequirePkChecker {
    fn enter(&mut self, node: &Node, scope: &mut Scope<'_>) -> Visit {
        let Node::CreateTable(create) = node else {
            return Visit::Descend;
        };
        // CREATE TABLE ... AS SELECT takes its shape from the query
        if !create.has_primary_key() && !create.columns.is_empty() {
            let content = format!(
                "Table `{}` requires PRIMARY KEY, related statement: \"{}\"",
                create.name,
                scope.text()
            );
            scope.report(Code::TableNoPK, content);
        }
        Visit::Skip
    }
}

/// Foreign keys are not allowed.
pub struct TableNoForeignKeyAdvisor;

impl Advisor for TableNoForeignKeyAdvisor {
    fn checker(&self, _rule: &Rule) -> Result<Box<dyn Checker>, ReviewError> {
        Ok(Box::new(TableNoForeignKeyChecker))
    }
}

struct TableNoForeignKeyChecker;

impl Checker for TableNoForeignKeyChecker {
    fn enter(&mut self, node: &Node, scope: &mut Scope<'_>) -> Visit {
        let Node::CreateTable(create) = node else {
            return Visit::Descend;
        };
        let has_fk = create.columns.iter().any(|c| c.references)
            || create
                .constraints
                .iter()
                .any(|c| c.kind == ConstraintKind::ForeignKey);
        if has_fk {
            let content = format!(
                "Foreign key is not allowed in the table `{}`, related statement: \"{}\"",
                create.name,
                scope.text()
            );
            scope.report(Code::TableHasFK, content);
        }
        Visit::Skip
    }
}

/// Dropping tables or databases breaks existing data and code.
pub struct BackwardCompatibilityAdvisor;

impl Advisor for BackwardCompatibilityAdvisor {
    fn checker(&self, _rule: &Rule) -> Result<Box<dyn Checker>, ReviewError> {
        Ok(Box::new(BackwardCompatibilityChecker))
    }
}

struct BackwardCompatibilityChecker;

impl Checker for BackwardCompatibilityChecker {
    fn enter(&mut self, node: &Node, scope: &mut Scope<'_>) -> Visit {
        let Node::Drop(target) = node else {
            return Visit::Descend;
        };
        let code = match target.object {
            DropObject::Table => Code::CompatibilityDropTable,
            DropObject::Database => Code::CompatibilityDropDatabase,
            DropObject::View | DropObject::Index | DropObject::Other => return Visit::Skip
        };
        let names: Vec<String> = target.names.iter().map(|n| format!("`{}`", n)).collect();
        let content = format!(
            "\"{}\" drops {}, which may cause incompatibility with the existing data and code",
            scope.text(),
            names.join(", ")
        );
        scope.report(code, content);
        Visit::Skip
    }
}

/// Table names must follow a naming convention.
pub struct NamingTableAdvisor;

impl Advisor for NamingTableAdvisor {
    fn checker(&self, rule: &Rule) -> Result<Box<dyn Checker>, ReviewError> {
        Ok(Box::new(NamingTableChecker {
            naming: NamingFormat::decode(rule)?
        }))
    }
}

struct NamingTableChecker {
    naming: NamingFormat
}

impl Checker for NamingTableChecker {
    fn enter(&mut self, node: &Node, scope: &mut Scope<'_>) -> Visit {
        let Node::CreateTable(create) = node else {
            return Visit::Descend;
        };
        let name = create.name.as_str();
        if !self.naming.regex.is_match(name) {
            scope.report(
                Code::TableNamingMismatch,
                format!(
                    "`{}` mismatches table naming convention, naming format should be \"{}\"",
                    name, self.naming.format
                )
            );
        }
        if name.chars().count() > self.naming.max_length {
            scope.report(
                Code::TableNamingMismatch,
                format!(
                    "`{}` mismatches table naming convention, its length should be within {} characters",
                    name, self.naming.max_length
                )
            );
        }
        Visit::Skip
    }
}
