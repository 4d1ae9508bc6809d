//! Application logic for the SQL Review CLI.
//!
//! This module contains the core application logic separated from the main
//! entry point to enable testing.

use std::{
    fs::read_to_string,
    io::{self, Read},
    path::Path
};

use serde::Deserialize;

use crate::{
    advice::{ReviewResult, Status},
    cli::{Dialect as CliDialect, Format},
    config::Config,
    context::CancellationToken,
    database::{LiveDatabase, MySqlDatabase, PgDatabase},
    error::{AppResult, database_connect_error, file_read_error, rules_file_error},
    output::{OutputFormat, OutputOptions, format_review},
    registry::Registry,
    review::{ReviewRequest, Reviewer},
    rule::{Dialect, Rule, RuleSet}
};

/// Parameters for the review command
#[derive(Debug, Clone)]
pub struct ReviewParams {
    pub script_path:   String,
    pub rules_path:    String,
    pub dialect:       CliDialect,
    pub database_url:  Option<String>,
    pub charset:       Option<String>,
    pub collation:     Option<String>,
    pub output_format: Format,
    pub no_color:      bool
}

/// Rendered review and the process exit code it maps to
#[derive(Debug, Clone)]
pub struct ReviewOutcome {
    pub exit_code: i32,
    pub output:    String,
    pub result:    ReviewResult
}

/// Rule files hold either a `rules` list or a bare list
#[derive(Deserialize)]
#[serde(untagged)]
enum RuleFile {
    Set(RuleSet),
    List(Vec<Rule>)
}

impl From<RuleFile> for Vec<Rule> {
    fn from(file: RuleFile) -> Self {
        match file {
            RuleFile::Set(set) => set.rules,
            RuleFile::List(rules) => rules
        }
    }
}

/// Convert CLI dialect to engine dialect
pub fn convert_dialect(dialect: CliDialect) -> Dialect {
    match dialect {
        CliDialect::Mysql => Dialect::MySQL,
        CliDialect::Postgresql => Dialect::PostgreSQL,
        CliDialect::Tidb => Dialect::TiDB
    }
}

/// Convert CLI format to internal OutputFormat
pub fn convert_format(format: Format) -> OutputFormat {
    match format {
        Format::Text => OutputFormat::Text,
        Format::Json => OutputFormat::Json,
        Format::Yaml => OutputFormat::Yaml
    }
}

/// Exit code for the overall review status
pub fn calculate_exit_code(result: &ReviewResult) -> i32 {
    match result.status {
        Status::Success => 0,
        Status::Warning => 1,
        Status::Error => 2
    }
}

/// Read the change script from file or stdin
pub fn read_script_input(path: &str) -> AppResult<String> {
    if path == "-" {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .map_err(|e| file_read_error("stdin", e))?;
        Ok(buffer)
    } else {
        read_to_string(path).map_err(|e| file_read_error(path, e))
    }
}

/// Load a rule file; the format follows the extension, YAML by default
pub fn load_rules(path: &str) -> AppResult<Vec<Rule>> {
    let content = read_to_string(path).map_err(|e| file_read_error(path, e))?;
    let extension = Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    let file: RuleFile = match extension.as_deref() {
        Some("json") => serde_json::from_str(&content).map_err(|e| rules_file_error(path, e))?,
        Some("toml") => RuleFile::Set(toml::from_str(&content).map_err(|e| rules_file_error(path, e))?),
        _ => serde_yaml::from_str(&content).map_err(|e| rules_file_error(path, e))?
    };
    Ok(file.into())
}

/// Open a pool to the live database for dynamic checks
pub async fn connect_database(dialect: Dialect, url: &str) -> AppResult<Box<dyn LiveDatabase>> {
    let database: Box<dyn LiveDatabase> = match dialect {
        Dialect::MySQL | Dialect::TiDB => Box::new(
            MySqlDatabase::connect(url)
                .await
                .map_err(|e| database_connect_error(e.to_string()))?
        ),
        Dialect::PostgreSQL => Box::new(
            PgDatabase::connect(url)
                .await
                .map_err(|e| database_connect_error(e.to_string()))?
        )
    };
    Ok(database)
}

/// Run the review command
pub async fn run_review(
    params: ReviewParams,
    config: &Config,
    cancel: &CancellationToken
) -> AppResult<ReviewOutcome> {
    let script = read_script_input(&params.script_path)?;
    let rules = load_rules(&params.rules_path)?;
    let dialect = convert_dialect(params.dialect);
    let charset = params
        .charset
        .unwrap_or_else(|| config.review.charset.clone());
    let collation = params
        .collation
        .unwrap_or_else(|| config.review.collation.clone());

    let database = match params.database_url.or_else(|| config.database.url.clone()) {
        Some(url) => Some(connect_database(dialect, &url).await?),
        None => None
    };

    let mut request =
        ReviewRequest::new(&script, dialect, cancel).with_encoding(&charset, &collation);
    if let Some(database) = database.as_deref() {
        request = request.with_database(database);
    }
    if let Some(timeout) = config.review.query_timeout() {
        request = request.with_query_timeout(timeout);
    }

    let result = Reviewer::builtin().review(&rules, request).await?;
    let options = OutputOptions {
        format:  convert_format(params.output_format),
        colored: !params.no_color
    };
    Ok(ReviewOutcome {
        exit_code: calculate_exit_code(&result),
        output:    format_review(&result, &options),
        result
    })
}

/// List the built-in rule types per dialect
pub fn list_rules(dialect: Option<CliDialect>) -> String {
    let registry = Registry::builtin();
    let dialects: Vec<Dialect> = match dialect {
        Some(dialect) => vec![convert_dialect(dialect)],
        None => Dialect::ALL.to_vec()
    };
    let mut output = String::new();
    for dialect in dialects {
        output.push_str(&format!("{}:\n", dialect));
        for rule_type in registry.rule_types(dialect) {
            output.push_str(&format!("  {}\n", rule_type));
        }
    }
    output
}
