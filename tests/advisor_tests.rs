use pretty_assertions::assert_eq;
use serde_json::json;
use sql_review::{
    advice::{Advice, Code, Status},
    context::{CancellationToken, Context},
    error::ReviewError,
    registry::Registry,
    rule::{Dialect, Rule, RuleLevel, RuleType}
};

fn rule(rule_type: RuleType) -> Rule {
    Rule::new(rule_type, Dialect::MySQL, RuleLevel::Warning)
}

async fn try_check(rule: &Rule, script: &str) -> Result<Vec<Advice>, ReviewError> {
    let cancel = CancellationToken::new();
    let ctx = Context::offline(rule, &cancel);
    let advisor = Registry::builtin()
        .lookup(rule.dialect, &rule.rule_type)
        .unwrap();
    advisor.check(&ctx, script).await
}

async fn check(rule: Rule, script: &str) -> Vec<Advice> {
    try_check(&rule, script).await.unwrap()
}

fn codes(advices: &[Advice]) -> Vec<Code> {
    advices.iter().map(|a| a.code).collect()
}

#[tokio::test]
async fn test_insert_row_limit_values_exceed() {
    let rule = rule(RuleType::InsertRowLimit).with_payload(json!({"number": 2}));
    let advices = check(rule, "INSERT INTO t VALUES (1), (2), (3)").await;

    assert_eq!(advices.len(), 1);
    assert_eq!(advices[0].status, Status::Warning);
    assert_eq!(advices[0].code, Code::InsertTooManyRows);
    assert_eq!(advices[0].title, "statement.insert.row-limit");
    assert_eq!(advices[0].line, 1);
    assert_eq!(
        advices[0].content,
        "\"INSERT INTO t VALUES (1), (2), (3)\" inserts 3 rows. The count exceeds 2."
    );
}

#[tokio::test]
async fn test_insert_row_limit_within_limit() {
    let rule = rule(RuleType::InsertRowLimit).with_payload(json!({"number": 3}));
    let advices = check(rule, "INSERT INTO t VALUES (1), (2), (3)").await;
    assert_eq!(advices, vec![Advice::ok()]);
}

#[tokio::test]
async fn test_insert_row_limit_non_positive_disables_check() {
    let rule = rule(RuleType::InsertRowLimit).with_payload(json!({"number": 0}));
    let advices = check(rule, "INSERT INTO t VALUES (1), (2), (3)").await;
    assert_eq!(advices, vec![Advice::ok()]);
}

#[tokio::test]
async fn test_insert_select_without_database_is_ok() {
    let rule = rule(RuleType::InsertRowLimit).with_payload(json!({"number": 1}));
    let advices = check(rule, "INSERT INTO t SELECT * FROM u").await;
    assert_eq!(advices, vec![Advice::ok()]);
}

#[tokio::test]
async fn test_insert_row_limit_reports_line_of_each_statement() {
    let rule = rule(RuleType::InsertRowLimit).with_payload(json!({"number": 1}));
    let script = "INSERT INTO t VALUES (1);\n\nINSERT INTO t VALUES (1), (2);\nINSERT INTO t\nVALUES (1), (2), (3);";
    let advices = check(rule, script).await;

    let lines: Vec<usize> = advices.iter().map(|a| a.line).collect();
    assert_eq!(lines, vec![3, 4]);
    assert!(advices[1].content.contains("inserts 3 rows"));
}

#[tokio::test]
async fn test_insert_row_limit_missing_payload_is_invalid() {
    let rule = rule(RuleType::InsertRowLimit);
    let err = try_check(&rule, "INSERT INTO t VALUES (1)").await.unwrap_err();
    assert!(matches!(err, ReviewError::InvalidConfig { .. }));
}

#[tokio::test]
async fn test_disabled_rule_emits_nothing() {
    let rule = Rule::new(RuleType::NoSelectAll, Dialect::MySQL, RuleLevel::Disabled);
    let advices = check(rule, "SELECT * FROM t").await;
    assert!(advices.is_empty());
}

#[tokio::test]
async fn test_info_level_reports_success_status() {
    let rule = Rule::new(RuleType::NoSelectAll, Dialect::MySQL, RuleLevel::Info);
    let advices = check(rule, "SELECT * FROM t").await;
    assert_eq!(advices.len(), 1);
    assert_eq!(advices[0].status, Status::Success);
    assert_eq!(advices[0].code, Code::StatementSelectAll);
}

#[tokio::test]
async fn test_syntax_error_is_single_advice() {
    let rule = rule(RuleType::NoSelectAll);
    let advices = check(rule, "SELECT 1;\nSELECT * FROM;").await;

    assert_eq!(advices.len(), 1);
    assert_eq!(advices[0].status, Status::Error);
    assert_eq!(advices[0].code, Code::StatementSyntaxError);
    assert_eq!(advices[0].line, 2);
}

#[tokio::test]
async fn test_insert_must_specify_column() {
    let advices = check(
        rule(RuleType::InsertMustSpecifyColumn),
        "INSERT INTO t VALUES (1);\nINSERT INTO t (id) VALUES (1)"
    )
    .await;

    assert_eq!(codes(&advices), vec![Code::InsertNotSpecifyColumn]);
    assert_eq!(
        advices[0].content,
        "The INSERT statement must specify columns but \"INSERT INTO t VALUES (1)\" does not"
    );
}

#[tokio::test]
async fn test_where_require() {
    let script = "UPDATE t SET a = 1;\nDELETE FROM t WHERE id = 1;\nDELETE FROM t;\nSELECT 1;\nSELECT a FROM t";
    let advices = check(rule(RuleType::WhereRequire), script).await;

    let lines: Vec<usize> = advices.iter().map(|a| a.line).collect();
    assert_eq!(lines, vec![1, 3, 5]);
    assert!(advices.iter().all(|a| a.code == Code::StatementNoWhere));
    assert_eq!(advices[0].content, "\"UPDATE t SET a = 1\" requires WHERE clause");
}

#[tokio::test]
async fn test_no_select_all_is_shallow() {
    let advices = check(
        rule(RuleType::NoSelectAll),
        "SELECT * FROM t WHERE id IN (SELECT * FROM u)"
    )
    .await;
    assert_eq!(codes(&advices), vec![Code::StatementSelectAll]);
}

#[tokio::test]
async fn test_no_select_all_finds_nested_wildcard() {
    let advices = check(
        rule(RuleType::NoSelectAll),
        "SELECT id FROM t WHERE id IN (SELECT * FROM u)"
    )
    .await;
    assert_eq!(codes(&advices), vec![Code::StatementSelectAll]);
}

#[tokio::test]
async fn test_leading_wildcard_like_once_per_statement() {
    let script = "SELECT a FROM t WHERE a LIKE '%x' OR b LIKE '%y';\nSELECT a FROM t WHERE a LIKE 'x%'";
    let advices = check(rule(RuleType::NoLeadingWildcardLike), script).await;

    assert_eq!(codes(&advices), vec![Code::StatementLeadingWildcardLike]);
    assert_eq!(advices[0].line, 1);
}

#[tokio::test]
async fn test_disallow_commit() {
    let advices = check(rule(RuleType::DisallowCommit), "UPDATE t SET a = 1 WHERE id = 1;\nCOMMIT").await;

    assert_eq!(codes(&advices), vec![Code::StatementDisallowCommit]);
    assert_eq!(advices[0].line, 2);
}

#[tokio::test]
async fn test_table_require_pk() {
    let script = "CREATE TABLE a (id INT PRIMARY KEY);\nCREATE TABLE b (id INT, PRIMARY KEY (id));\nCREATE TABLE c (id INT)";
    let advices = check(rule(RuleType::TableRequirePk), script).await;

    assert_eq!(codes(&advices), vec![Code::TableNoPK]);
    assert_eq!(advices[0].line, 3);
    assert!(advices[0].content.starts_with("Table `c` requires PRIMARY KEY"));
}

#[tokio::test]
async fn test_table_no_foreign_key() {
    let script = "CREATE TABLE t (id INT PRIMARY KEY, u_id INT, FOREIGN KEY (u_id) REFERENCES u (id))";
    let advices = check(rule(RuleType::TableNoForeignKey), script).await;
    assert_eq!(codes(&advices), vec![Code::TableHasFK]);
}

#[tokio::test]
async fn test_backward_compatibility_drop() {
    let script = "DROP TABLE t;\nDROP SCHEMA s;\nDROP VIEW v";
    let advices = check(rule(RuleType::BackwardCompatibility), script).await;

    assert_eq!(
        codes(&advices),
        vec![Code::CompatibilityDropTable, Code::CompatibilityDropDatabase]
    );
    assert_eq!(
        advices[0].content,
        "\"DROP TABLE t\" drops `t`, which may cause incompatibility with the existing data and code"
    );
    assert_eq!(advices[1].content.split(',').next(), Some("\"DROP SCHEMA s\" drops `s`"));
    assert_eq!(Code::CompatibilityDropTable.as_u32(), 103);
    assert_eq!(Code::CompatibilityDropDatabase.as_u32(), 101);
}

#[tokio::test]
async fn test_naming_table_format() {
    let rule = rule(RuleType::NamingTable).with_payload(json!({"format": "^[a-z]+(_[a-z]+)*$"}));
    let advices = check(rule, "CREATE TABLE UserRoles (id INT);\nCREATE TABLE user_roles (id INT)").await;

    assert_eq!(codes(&advices), vec![Code::TableNamingMismatch]);
    assert_eq!(
        advices[0].content,
        "`UserRoles` mismatches table naming convention, naming format should be \"^[a-z]+(_[a-z]+)*$\""
    );
}

#[tokio::test]
async fn test_naming_table_max_length() {
    let rule = rule(RuleType::NamingTable).with_payload(json!({"format": "^[a-z]+$", "maxLength": 5}));
    let advices = check(rule, "CREATE TABLE abcdefg (id INT)").await;

    assert_eq!(codes(&advices), vec![Code::TableNamingMismatch]);
    assert!(advices[0].content.contains("within 5 characters"));
}

#[tokio::test]
async fn test_column_required() {
    let rule = rule(RuleType::ColumnRequired).with_payload(json!({"list": ["id", "created_at"]}));
    let advices = check(rule, "CREATE TABLE t (ID INT)").await;

    assert_eq!(codes(&advices), vec![Code::NoRequiredColumn]);
    assert_eq!(advices[0].content, "Table `t` requires columns: created_at");
}

#[tokio::test]
async fn test_column_no_null() {
    let script = "CREATE TABLE t (id INT PRIMARY KEY, name VARCHAR(10), age INT NOT NULL)";
    let advices = check(rule(RuleType::ColumnNoNull), script).await;

    assert_eq!(codes(&advices), vec![Code::ColumnCannotNull]);
    assert_eq!(advices[0].content, "`t`.`name` cannot have NULL value");
}

#[tokio::test]
async fn test_index_type_no_blob_prefix_key() {
    let advices = check(
        rule(RuleType::IndexTypeNoBlob),
        "CREATE TABLE t (b BLOB, PRIMARY KEY (b(10)))"
    )
    .await;

    assert_eq!(advices.len(), 1);
    assert_eq!(advices[0].code, Code::IndexTypeNoBlob);
    assert_eq!(advices[0].content, "Columns in index must not be BLOB but `t`.`b` is blob");
}

#[tokio::test]
async fn test_index_type_no_blob_plain_key_is_ok() {
    let advices = check(
        rule(RuleType::IndexTypeNoBlob),
        "CREATE TABLE t (id INT, PRIMARY KEY (id))"
    )
    .await;
    assert_eq!(advices, vec![Advice::ok()]);
}

#[tokio::test]
async fn test_index_type_no_blob_create_index_uses_earlier_table() {
    let script = "CREATE TABLE t (id INT PRIMARY KEY, body TEXT);\nCREATE INDEX idx_body ON t (body(20));\nCREATE INDEX idx_x ON other (body(20))";
    let advices = check(rule(RuleType::IndexTypeNoBlob), script).await;

    assert_eq!(codes(&advices), vec![Code::IndexTypeNoBlob]);
    assert_eq!(advices[0].line, 2);
    assert!(advices[0].content.ends_with("`t`.`body` is text"));
}

#[tokio::test]
async fn test_postgres_dialect_where_require() {
    let rule = Rule::new(RuleType::WhereRequire, Dialect::PostgreSQL, RuleLevel::Error);
    let advices = check(rule, "DELETE FROM accounts").await;

    assert_eq!(advices.len(), 1);
    assert_eq!(advices[0].status, Status::Error);
    assert_eq!(advices[0].code, Code::StatementNoWhere);
}
