use pretty_assertions::assert_eq;
use serde_json::json;
use sql_review::{
    advice::{Code, ReviewResult, Status},
    context::CancellationToken,
    error::ReviewError,
    review::{ReviewRequest, Reviewer},
    rule::{Dialect, Rule, RuleLevel, RuleType}
};

fn rule(rule_type: RuleType, level: RuleLevel) -> Rule {
    Rule::new(rule_type, Dialect::MySQL, level)
}

async fn review(rules: &[Rule], script: &str) -> Result<ReviewResult, ReviewError> {
    let cancel = CancellationToken::new();
    let request = ReviewRequest::new(script, Dialect::MySQL, &cancel);
    Reviewer::builtin().review(rules, request).await
}

fn codes(result: &ReviewResult) -> Vec<Code> {
    result.advices.iter().map(|a| a.code).collect()
}

#[tokio::test]
async fn test_advice_follows_rule_then_statement_order() {
    let rules = vec![
        rule(RuleType::NoSelectAll, RuleLevel::Warning),
        rule(RuleType::WhereRequire, RuleLevel::Error),
        rule(RuleType::TableRequirePk, RuleLevel::Warning)
    ];
    let script = "SELECT * FROM t;\nUPDATE t SET a = 1";
    let result = review(&rules, script).await.unwrap();

    assert_eq!(
        codes(&result),
        vec![
            Code::StatementSelectAll,
            Code::StatementNoWhere,
            Code::StatementNoWhere,
            Code::Ok
        ]
    );
    let lines: Vec<usize> = result.advices.iter().map(|a| a.line).collect();
    assert_eq!(lines, vec![1, 1, 2, 0]);
    assert_eq!(result.status, Status::Error);
}

#[tokio::test]
async fn test_review_is_deterministic() {
    let rules: Vec<Rule> = [
        RuleType::NoSelectAll,
        RuleType::WhereRequire,
        RuleType::ColumnNoNull,
        RuleType::TableRequirePk,
        RuleType::BackwardCompatibility
    ]
    .into_iter()
    .map(|t| rule(t, RuleLevel::Warning))
    .collect();
    let script = "CREATE TABLE t (a INT);\nSELECT * FROM t;\nDROP TABLE t";

    let first = review(&rules, script).await.unwrap();
    for _ in 0..5 {
        assert_eq!(review(&rules, script).await.unwrap(), first);
    }
}

#[tokio::test]
async fn test_all_clean_rules_report_ok() {
    let rules = vec![
        rule(RuleType::NoSelectAll, RuleLevel::Error),
        rule(RuleType::WhereRequire, RuleLevel::Error)
    ];
    let result = review(&rules, "SELECT id FROM t WHERE id = 1").await.unwrap();

    assert_eq!(result.status, Status::Success);
    assert_eq!(codes(&result), vec![Code::Ok, Code::Ok]);
}

#[tokio::test]
async fn test_disabled_rules_are_skipped() {
    let rules = vec![
        rule(RuleType::NoSelectAll, RuleLevel::Disabled),
        // disabled rules are not decoded, so a missing payload is fine
        rule(RuleType::InsertRowLimit, RuleLevel::Disabled)
    ];
    let result = review(&rules, "SELECT * FROM t").await.unwrap();

    assert!(result.advices.is_empty());
    assert_eq!(result.status, Status::Success);
}

#[tokio::test]
async fn test_syntax_error_aborts_with_single_advice() {
    let rules = vec![
        rule(RuleType::NoSelectAll, RuleLevel::Warning),
        rule(RuleType::WhereRequire, RuleLevel::Warning)
    ];
    let result = review(&rules, "SELECT 1;\n\nUPDATE SET;").await.unwrap();

    assert_eq!(result.advices.len(), 1);
    assert_eq!(result.advices[0].code, Code::StatementSyntaxError);
    assert_eq!(result.advices[0].status, Status::Error);
    assert_eq!(result.advices[0].line, 3);
    assert_eq!(result.status, Status::Error);
}

#[tokio::test]
async fn test_unsupported_rule_aborts() {
    let rules = vec![
        rule(RuleType::NoSelectAll, RuleLevel::Warning),
        Rule::new(RuleType::IndexTypeNoBlob, Dialect::PostgreSQL, RuleLevel::Error)
    ];
    let cancel = CancellationToken::new();
    let request = ReviewRequest::new("SELECT * FROM t", Dialect::PostgreSQL, &cancel);
    let err = Reviewer::builtin().review(&rules, request).await.unwrap_err();

    assert!(matches!(
        err,
        ReviewError::NotSupported {
            dialect: Dialect::PostgreSQL,
            ..
        }
    ));
}

#[tokio::test]
async fn test_unknown_rule_type_aborts() {
    let rules = vec![rule(RuleType::from("statement.no-such-rule"), RuleLevel::Warning)];
    let err = review(&rules, "SELECT 1").await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "rule statement.no-such-rule is not supported for MySQL"
    );
}

#[tokio::test]
async fn test_invalid_payload_aborts() {
    let rules = vec![
        rule(RuleType::NoSelectAll, RuleLevel::Warning),
        rule(RuleType::InsertRowLimit, RuleLevel::Warning).with_payload(json!({"number": "lots"}))
    ];
    let err = review(&rules, "INSERT INTO t VALUES (1)").await.unwrap_err();
    assert!(matches!(err, ReviewError::InvalidConfig { .. }));
}

#[tokio::test]
async fn test_rules_for_other_dialects_are_ignored() {
    let rules = vec![
        Rule::new(RuleType::NoSelectAll, Dialect::PostgreSQL, RuleLevel::Error),
        rule(RuleType::WhereRequire, RuleLevel::Warning)
    ];
    let result = review(&rules, "SELECT * FROM t").await.unwrap();

    assert_eq!(codes(&result), vec![Code::StatementNoWhere]);
    assert_eq!(result.status, Status::Warning);
}

#[tokio::test]
async fn test_empty_script_reports_ok_per_rule() {
    let rules = vec![rule(RuleType::NoSelectAll, RuleLevel::Warning)];
    let result = review(&rules, "-- nothing to do\n").await.unwrap();
    assert_eq!(codes(&result), vec![Code::Ok]);
}

#[tokio::test]
async fn test_result_serializes_codes_as_numbers() {
    let rules = vec![
        rule(RuleType::InsertRowLimit, RuleLevel::Warning).with_payload(json!({"number": 1}))
    ];
    let result = review(&rules, "INSERT INTO t VALUES (1), (2)").await.unwrap();
    let value = serde_json::to_value(&result).unwrap();

    assert_eq!(value["status"], "WARNING");
    assert_eq!(value["advices"][0]["code"], 1101);
    assert_eq!(value["advices"][0]["line"], 1);
}
