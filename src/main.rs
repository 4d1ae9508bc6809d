use std::process;

use clap::Parser;
use sql_review::{
    app::{ReviewParams, list_rules, run_review},
    cli::{Cli, Commands},
    config::Config,
    context::CancellationToken,
    error::AppResult
};
use tokio::main;
use tracing_subscriber::EnvFilter;

#[main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
        )
        .with_writer(std::io::stderr)
        .init();

    match run().await {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(2);
        }
    }
}

async fn run() -> AppResult<i32> {
    let cli = Cli::parse();
    let config = Config::load()?;

    match cli.command {
        Commands::Review {
            script,
            rules,
            dialect,
            database_url,
            charset,
            collation,
            output_format,
            no_color
        } => {
            let cancel = CancellationToken::new();
            let on_interrupt = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::warn!("interrupted, cancelling diagnostic queries");
                    on_interrupt.cancel();
                }
            });

            let params = ReviewParams {
                script_path: script.display().to_string(),
                rules_path:  rules.display().to_string(),
                dialect,
                database_url,
                charset,
                collation,
                output_format,
                no_color
            };
            let outcome = run_review(params, &config, &cancel).await?;
            println!("{}", outcome.output);
            Ok(outcome.exit_code)
        }
        Commands::Rules {
            dialect
        } => {
            print!("{}", list_rules(dialect));
            Ok(0)
        }
    }
}
