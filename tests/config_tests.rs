use std::{collections::HashMap, io::Write, time::Duration};

use sql_review::config::{Config, ReviewConfig};
use tempfile::NamedTempFile;

fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |name| vars.get(name).cloned()
}

#[test]
fn test_default_config() {
    let config = Config::default();

    assert_eq!(config.review.charset, "utf8mb4");
    assert_eq!(config.review.collation, "utf8mb4_general_ci");
    assert!(config.review.query_timeout().is_none());
    assert!(config.database.url.is_none());
}

#[test]
fn test_config_from_file() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
[review]
charset = "latin1"
query_timeout_ms = 2500

[database]
url = "mysql://reviewer@localhost:3306/app"
"#
    )
    .unwrap();

    let config = Config::from_file(file.path()).unwrap();

    assert_eq!(config.review.charset, "latin1");
    // unspecified keys keep their defaults
    assert_eq!(config.review.collation, "utf8mb4_general_ci");
    assert_eq!(config.review.query_timeout(), Some(Duration::from_millis(2500)));
    assert_eq!(
        config.database.url.as_deref(),
        Some("mysql://reviewer@localhost:3306/app")
    );
}

#[test]
fn test_config_from_invalid_file() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "[review\ncharset = ").unwrap();
    assert!(Config::from_file(file.path()).is_err());
}

#[test]
fn test_env_overrides() {
    let mut config = Config::default();
    config
        .apply_env(env_of(&[
            ("SQL_REVIEW_DATABASE_URL", "postgres://localhost/app"),
            ("SQL_REVIEW_COLLATION", "C"),
            ("SQL_REVIEW_QUERY_TIMEOUT_MS", "750")
        ]))
        .unwrap();

    assert_eq!(config.database.url.as_deref(), Some("postgres://localhost/app"));
    assert_eq!(config.review.charset, "utf8mb4");
    assert_eq!(config.review.collation, "C");
    assert_eq!(config.review.query_timeout_ms, Some(750));
}

#[test]
fn test_env_invalid_timeout() {
    let mut config = Config::default();
    let result = config.apply_env(env_of(&[("SQL_REVIEW_QUERY_TIMEOUT_MS", "soon")]));
    assert!(result.is_err());
}

#[test]
fn test_review_config_default() {
    let config = ReviewConfig::default();
    assert_eq!(config.query_timeout_ms, None);
}
