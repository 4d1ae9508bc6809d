use compact_str::CompactString;
use sqlparser::ast::{
    ColumnOption, Expr, FromTable, IndexColumn, ObjectName, ObjectNamePart, Query, SelectItem,
    SetExpr, Statement, TableConstraint, TableFactor, TableWithJoins
};

use super::{
    ColumnDef, ColumnVec, Constraint, ConstraintKind, CreateIndex, CreateTable, Delete, DropObject,
    DropTarget, Insert, InsertSource, Like, Node, Select, Update
};

/// Lower one parsed statement into the structural tree.
pub(crate) fn lower_statement(stmt: &Statement) -> Node {
    match stmt {
        Statement::Query(query) => lower_query(query),
        Statement::Insert(insert) => {
            let mut children = Vec::new();
            let source = match &insert.source {
                Some(query) => match query.body.as_ref() {
                    SetExpr::Values(values) => InsertSource::Values(values.rows.len()),
                    _ => {
                        children.push(lower_query(query));
                        InsertSource::Query
                    }
                },
                None => InsertSource::Default
            };
            Node::Insert(Insert {
                columns: insert
                    .columns
                    .iter()
                    .map(|c| c.value.as_str().into())
                    .collect(),
                source,
                children
            })
        }
        Statement::Update(update) => {
            let mut tables = Vec::new();
            let mut children = Vec::new();
            collect_table_with_joins(&update.table, &mut tables, &mut children);
            if let Some(selection) = &update.selection {
                collect_expr(selection, &mut children);
            }
            Node::Update(Update {
                has_where: update.selection.is_some(),
                children
            })
        }
        Statement::Delete(delete) => {
            let mut tables = Vec::new();
            let mut children = Vec::new();
            let (FromTable::WithFromKeyword(from) | FromTable::WithoutKeyword(from)) = &delete.from;
            for table in from {
                collect_table_with_joins(table, &mut tables, &mut children);
            }
            if let Some(selection) = &delete.selection {
                collect_expr(selection, &mut children);
            }
            Node::Delete(Delete {
                has_where: delete.selection.is_some(),
                children
            })
        }
        Statement::CreateTable(create) => {
            let columns = create
                .columns
                .iter()
                .map(|column| {
                    let keys: Vec<ConstraintKind> = column
                        .options
                        .iter()
                        .filter_map(|opt| inline_key(&opt.option))
                        .collect();
                    ColumnDef {
                        name:        column.name.value.as_str().into(),
                        data_type:   column.data_type.to_string().to_ascii_lowercase().into(),
                        not_null:    column
                            .options
                            .iter()
                            .any(|opt| matches!(opt.option, ColumnOption::NotNull)),
                        primary_key: keys.contains(&ConstraintKind::PrimaryKey),
                        unique:      keys.contains(&ConstraintKind::Unique),
                        references:  keys.contains(&ConstraintKind::ForeignKey)
                    }
                })
                .collect();
            let children = create
                .query
                .as_ref()
                .map(|query| vec![lower_query(query)])
                .unwrap_or_default();
            Node::CreateTable(CreateTable {
                name: object_name(&create.name),
                columns,
                constraints: create
                    .constraints
                    .iter()
                    .filter_map(lower_constraint)
                    .collect(),
                children
            })
        }
        Statement::CreateIndex(index) => Node::CreateIndex(CreateIndex {
            table:   object_name(&index.table_name),
            columns: index_columns(&index.columns)
        }),
        Statement::Drop {
            object_type,
            names,
            ..
        } => {
            let object = match object_type.to_string().to_ascii_uppercase().as_str() {
                "TABLE" => DropObject::Table,
                "DATABASE" | "SCHEMA" => DropObject::Database,
                "VIEW" => DropObject::View,
                "INDEX" => DropObject::Index,
                _ => DropObject::Other
            };
            Node::Drop(DropTarget {
                object,
                names: names.iter().map(object_name).collect()
            })
        }
        Statement::Commit {
            ..
        } => Node::Commit,
        other => {
            let rendered = other.to_string();
            let keyword = rendered.split_whitespace().next().unwrap_or_default();
            Node::Other(keyword.to_ascii_uppercase().into())
        }
    }
}

fn lower_query(query: &Query) -> Node {
    let body = lower_set_expr(&query.body);
    match &query.with {
        Some(with) if !with.cte_tables.is_empty() => {
            let mut nodes: Vec<Node> = with
                .cte_tables
                .iter()
                .map(|cte| lower_query(&cte.query))
                .collect();
            nodes.push(body);
            Node::Compound(nodes)
        }
        _ => body
    }
}

fn lower_set_expr(set_expr: &SetExpr) -> Node {
    match set_expr {
        SetExpr::Select(select) => {
            let wildcard = select.projection.iter().any(|item| {
                matches!(item, SelectItem::Wildcard(..) | SelectItem::QualifiedWildcard(..))
            });
            let mut tables = Vec::new();
            let mut children = Vec::new();
            for item in &select.projection {
                if let SelectItem::UnnamedExpr(expr)
                | SelectItem::ExprWithAlias {
                    expr, ..
                } = item
                {
                    collect_expr(expr, &mut children);
                }
            }
            for table in &select.from {
                collect_table_with_joins(table, &mut tables, &mut children);
            }
            if let Some(selection) = &select.selection {
                collect_expr(selection, &mut children);
            }
            if let Some(having) = &select.having {
                collect_expr(having, &mut children);
            }
            Node::Select(Select {
                wildcard,
                tables,
                has_where: select.selection.is_some(),
                children
            })
        }
        SetExpr::Query(query) => lower_query(query),
        SetExpr::SetOperation {
            left,
            right,
            ..
        } => Node::Compound(vec![lower_set_expr(left), lower_set_expr(right)]),
        SetExpr::Values(_) => Node::Other("VALUES".into()),
        _ => Node::Other("QUERY".into())
    }
}

fn collect_table_with_joins(
    table: &TableWithJoins,
    tables: &mut Vec<CompactString>,
    children: &mut Vec<Node>
) {
    collect_table_factor(&table.relation, tables, children);
    for join in &table.joins {
        collect_table_factor(&join.relation, tables, children);
    }
}

fn collect_table_factor(
    factor: &TableFactor,
    tables: &mut Vec<CompactString>,
    children: &mut Vec<Node>
) {
    match factor {
        TableFactor::Table {
            name, ..
        } => tables.push(object_name(name)),
        TableFactor::Derived {
            subquery, ..
        } => children.push(lower_query(subquery)),
        TableFactor::NestedJoin {
            table_with_joins, ..
        } => collect_table_with_joins(table_with_joins, tables, children),
        _ => {}
    }
}

/// Collect LIKE predicates and subqueries of an expression in source order.
fn collect_expr(expr: &Expr, out: &mut Vec<Node>) {
    match expr {
        Expr::Like {
            expr,
            pattern,
            ..
        }
        | Expr::ILike {
            expr,
            pattern,
            ..
        } => {
            collect_expr(expr, out);
            if let Some(pattern) = string_literal(pattern) {
                out.push(Node::Like(Like {
                    pattern
                }));
            }
        }
        Expr::BinaryOp {
            left,
            right,
            ..
        } => {
            collect_expr(left, out);
            collect_expr(right, out);
        }
        Expr::UnaryOp {
            expr, ..
        } => collect_expr(expr, out),
        Expr::Nested(inner) | Expr::IsNull(inner) | Expr::IsNotNull(inner) => {
            collect_expr(inner, out)
        }
        Expr::InList {
            expr,
            list,
            ..
        } => {
            collect_expr(expr, out);
            for item in list {
                collect_expr(item, out);
            }
        }
        Expr::InSubquery {
            expr,
            subquery,
            ..
        } => {
            collect_expr(expr, out);
            out.push(lower_query(subquery));
        }
        Expr::Between {
            expr,
            low,
            high,
            ..
        } => {
            collect_expr(expr, out);
            collect_expr(low, out);
            collect_expr(high, out);
        }
        Expr::Subquery(query)
        | Expr::Exists {
            subquery: query, ..
        } => out.push(lower_query(query)),
        _ => {}
    }
}

fn lower_constraint(constraint: &TableConstraint) -> Option<Constraint> {
    let (kind, columns) = match constraint {
        TableConstraint::PrimaryKey(pk) => (ConstraintKind::PrimaryKey, index_columns(&pk.columns)),
        TableConstraint::Unique(unique) => (ConstraintKind::Unique, index_columns(&unique.columns)),
        TableConstraint::Index(index) => (ConstraintKind::Index, index_columns(&index.columns)),
        TableConstraint::ForeignKey(fk) => (
            ConstraintKind::ForeignKey,
            fk.columns.iter().map(|c| c.value.as_str().into()).collect()
        ),
        _ => return None
    };
    Some(Constraint {
        kind,
        columns
    })
}

/// Key kind declared inline on a column definition.
///
/// Matched on the rendered option so that the inline spelling
/// (`PRIMARY KEY`, `UNIQUE`, `REFERENCES t(id)`) decides.
fn inline_key(option: &ColumnOption) -> Option<ConstraintKind> {
    let rendered = option.to_string().to_ascii_uppercase();
    if rendered.starts_with("PRIMARY KEY") {
        Some(ConstraintKind::PrimaryKey)
    } else if rendered.starts_with("UNIQUE") {
        Some(ConstraintKind::Unique)
    } else if rendered.starts_with("REFERENCES") {
        Some(ConstraintKind::ForeignKey)
    } else {
        None
    }
}

fn index_columns(columns: &[IndexColumn]) -> ColumnVec {
    columns
        .iter()
        .filter_map(|c| expr_column(&c.column.expr))
        .collect()
}

/// Column referenced by a key part: `col`, `t.col` or a prefix key `col(10)`.
fn expr_column(expr: &Expr) -> Option<CompactString> {
    match expr {
        Expr::Identifier(ident) => Some(ident.value.as_str().into()),
        Expr::CompoundIdentifier(idents) => idents.last().map(|i| i.value.as_str().into()),
        Expr::Function(func) => Some(object_name(&func.name)),
        _ => None
    }
}

fn string_literal(expr: &Expr) -> Option<String> {
    if let Expr::Value(val) = expr {
        match &val.value {
            sqlparser::ast::Value::SingleQuotedString(s)
            | sqlparser::ast::Value::DoubleQuotedString(s) => return Some(s.clone()),
            _ => {}
        }
    }
    None
}

/// Unquoted last part of a possibly qualified name.
fn object_name(name: &ObjectName) -> CompactString {
    match name.0.last() {
        Some(ObjectNamePart::Identifier(ident)) => ident.value.as_str().into(),
        _ => name.to_string().into()
    }
}
