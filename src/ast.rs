//! Structural tree checked by advisors.
//!
//! Statements parsed by `sqlparser` are lowered into a closed set of
//! [`Node`] kinds that carry only what the rules inspect. Advisors never see
//! the `sqlparser` AST directly, which keeps rule logic independent of the
//! parser's own representation.
//!
//! Traversal is explicit: [`walk`] visits a node, asks the callback whether
//! to descend, then visits children depth-first in source order.
//!
//! ```
//! use sql_review::{
//!     ast::{Node, Visit, walk},
//!     parser::parse_script,
//!     rule::Dialect
//! };
//!
//! let statements = parse_script(
//!     "SELECT * FROM t WHERE id IN (SELECT id FROM u)",
//!     Dialect::MySQL,
//!     "utf8mb4",
//!     ""
//! )
//! .unwrap();
//!
//! let mut selects = 0;
//! walk(&statements[0].node, &mut |node| {
//!     if matches!(node, Node::Select(_)) {
//!         selects += 1;
//!     }
//!     Visit::Descend
//! });
//! assert_eq!(selects, 2);
//! ```

mod lower;

use compact_str::CompactString;
pub(crate) use lower::lower_statement;
use smallvec::SmallVec;

/// Column list of an index or constraint (typically < 8 elements)
pub type ColumnVec = SmallVec<[CompactString; 8]>;

/// Decision returned by a traversal callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visit {
    /// Visit the children of the current node
    Descend,
    /// Do not visit the children of the current node
    Skip
}

/// One node of the structural tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Insert(Insert),
    /// A single SELECT block
    Select(Select),
    /// Query made of several blocks: set operation arms or CTE bodies
    Compound(Vec<Node>),
    Update(Update),
    Delete(Delete),
    CreateTable(CreateTable),
    CreateIndex(CreateIndex),
    Drop(DropTarget),
    Commit,
    /// `LIKE` / `ILIKE` predicate with a literal pattern
    Like(Like),
    /// Any statement kind no rule inspects
    Other(CompactString)
}

impl Node {
    /// Child nodes in source order.
    pub fn children(&self) -> &[Node] {
        match self {
            Self::Insert(insert) => &insert.children,
            Self::Select(select) => &select.children,
            Self::Compound(nodes) => nodes,
            Self::Update(update) => &update.children,
            Self::Delete(delete) => &delete.children,
            Self::CreateTable(create) => &create.children,
            Self::CreateIndex(_) | Self::Drop(_) | Self::Commit | Self::Like(_) | Self::Other(_) => {
                &[]
            }
        }
    }
}

/// Depth-first traversal with an enter callback.
///
/// Children of a node are skipped when the callback returns [`Visit::Skip`]
/// for it, so a rule that matches a subtree reports it once.
pub fn walk<F>(node: &Node, enter: &mut F)
where
    F: FnMut(&Node) -> Visit
{
    if enter(node) == Visit::Skip {
        return;
    }
    for child in node.children() {
        walk(child, enter);
    }
}

/// Where the inserted rows come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertSource {
    /// `VALUES (...), (...)` with the number of row tuples
    Values(usize),
    /// `INSERT ... SELECT`; row count unknown without execution
    Query,
    /// `DEFAULT VALUES` or `SET col = ...`
    Default
}

#[derive(Debug, Clone, PartialEq)]
pub struct Insert {
    pub columns:  Vec<CompactString>,
    pub source:   InsertSource,
    pub children: Vec<Node>
}

#[derive(Debug, Clone, PartialEq)]
pub struct Select {
    /// `*` or `t.*` in the projection
    pub wildcard:  bool,
    pub tables:    Vec<CompactString>,
    pub has_where: bool,
    /// Subqueries and predicates in source order
    pub children:  Vec<Node>
}

#[derive(Debug, Clone, PartialEq)]
pub struct Update {
    pub has_where: bool,
    pub children:  Vec<Node>
}

#[derive(Debug, Clone, PartialEq)]
pub struct Delete {
    pub has_where: bool,
    pub children:  Vec<Node>
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateTable {
    pub name:        CompactString,
    pub columns:     Vec<ColumnDef>,
    pub constraints: Vec<Constraint>,
    /// `CREATE TABLE ... AS SELECT` body
    pub children:    Vec<Node>
}

impl CreateTable {
    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    pub fn has_primary_key(&self) -> bool {
        self.columns.iter().any(|c| c.primary_key)
            || self
                .constraints
                .iter()
                .any(|c| c.kind == ConstraintKind::PrimaryKey)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDef {
    pub name:        CompactString,
    /// Lowercased type as written, e.g. `varchar(255)`
    pub data_type:   CompactString,
    pub not_null:    bool,
    pub primary_key: bool,
    pub unique:      bool,
    pub references:  bool
}

impl ColumnDef {
    /// Type name without length or precision.
    pub fn base_type(&self) -> &str {
        self.data_type
            .split(['(', ' '])
            .next()
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintKind {
    PrimaryKey,
    Unique,
    Index,
    ForeignKey
}

#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    pub kind:    ConstraintKind,
    pub columns: ColumnVec
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateIndex {
    pub table:   CompactString,
    pub columns: ColumnVec
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropObject {
    Table,
    Database,
    View,
    Index,
    Other
}

#[derive(Debug, Clone, PartialEq)]
pub struct DropTarget {
    pub object: DropObject,
    pub names:  Vec<CompactString>
}

#[derive(Debug, Clone, PartialEq)]
pub struct Like {
    pub pattern: String
}
