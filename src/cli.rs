use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// SQL Review - Check change scripts against database-change policy rules
#[derive(Parser, Debug)]
#[command(name = "sql-review")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Review a change script against a rule file
    Review {
        /// Path to the SQL change script (use - for stdin)
        #[arg(short, long)]
        script: PathBuf,

        /// Path to the rule file (YAML, JSON or TOML)
        #[arg(short, long)]
        rules: PathBuf,

        /// Database engine the script targets
        #[arg(short, long, value_enum, default_value = "mysql")]
        dialect: Dialect,

        /// Live database for dynamic checks
        #[arg(long, env = "SQL_REVIEW_DATABASE_URL")]
        database_url: Option<String>,

        /// Script charset
        #[arg(long)]
        charset: Option<String>,

        /// Script collation
        #[arg(long)]
        collation: Option<String>,

        /// Output format
        #[arg(short = 'f', long, value_enum, default_value = "text")]
        output_format: Format,

        /// Disable colored output
        #[arg(long)]
        no_color: bool
    },

    /// List the rule types available for each dialect
    Rules {
        /// Only list rules for this dialect
        #[arg(short, long, value_enum)]
        dialect: Option<Dialect>
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Dialect {
    Mysql,
    Postgresql,
    Tidb
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Format {
    Text,
    Json,
    Yaml
}
