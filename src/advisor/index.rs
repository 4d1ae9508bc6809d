use std::collections::HashMap;

use compact_str::CompactString;

use super::{Advisor, Checker, Scope};
use crate::{
    advice::Code,
    ast::{ConstraintKind, CreateTable, Node, Visit},
    error::ReviewError,
    rule::Rule
};

const BLOB_TYPES: [&str; 8] = [
    "blob",
    "tinyblob",
    "mediumblob",
    "longblob",
    "text",
    "tinytext",
    "mediumtext",
    "longtext"
];

/// Index key parts must not be BLOB or TEXT columns.
///
/// `CREATE INDEX` is resolved against tables created earlier in the same
/// script; indexes on tables the script does not define are not checked.
pub struct IndexTypeNoBlobAdvisor;

impl Advisor for IndexTypeNoBlobAdvisor {
    fn checker(&self, _rule: &Rule) -> Result<Box<dyn Checker>, ReviewError> {
        Ok(Box::new(IndexTypeNoBlobChecker::default()))
    }
}

#[derive(Default)]
struct IndexTypeNoBlobChecker {
    /// lowercase table name -> lowercase column name -> base type
    tables: HashMap<CompactString, HashMap<CompactString, CompactString>>
}

impl IndexTypeNoBlobChecker {
    fn remember(&mut self, create: &CreateTable) {
        let columns = create
            .columns
            .iter()
            .map(|c| (c.name.to_ascii_lowercase().into(), c.base_type().into()))
            .collect();
        self.tables
            .insert(create.name.to_ascii_lowercase().into(), columns);
    }

    fn column_type(&self, table: &str, column: &str) -> Option<&str> {
        self.tables
            .get(table.to_ascii_lowercase().as_str())?
            .get(column.to_ascii_lowercase().as_str())
            .map(CompactString::as_str)
    }
}

impl Checker for IndexTypeNoBlobChecker {
    fn enter(&mut self, node: &Node, scope: &mut Scope<'_>) -> Visit {
        match node {
            Node::CreateTable(create) => {
                self.remember(create);
                let inline = create
                    .columns
                    .iter()
                    .filter(|c| c.primary_key || c.unique)
                    .map(|c| c.name.as_str());
                let declared = create
                    .constraints
                    .iter()
                    .filter(|c| c.kind != ConstraintKind::ForeignKey)
                    .flat_map(|c| c.columns.iter().map(CompactString::as_str));
                let key_columns: Vec<&str> = inline.chain(declared).collect();
                for column in key_columns {
                    if let Some(data_type) = self.column_type(&create.name, column) {
                        report_blob(scope, &create.name, column, data_type);
                    }
                }
                Visit::Skip
            }
            Node::CreateIndex(index) => {
                for column in &index.columns {
                    if let Some(data_type) = self.column_type(&index.table, column) {
                        report_blob(scope, &index.table, column, data_type);
                    }
                }
                Visit::Skip
            }
            _ => Visit::Descend
        }
    }
}

fn report_blob(scope: &mut Scope<'_>, table: &str, column: &str, data_type: &str) {
    if BLOB_TYPES.contains(&data_type) {
        let content = format!(
            "Columns in index must not be BLOB but `{}`.`{}` is {}",
            table, column, data_type
        );
        scope.report(Code::IndexTypeNoBlob, content);
    }
}
