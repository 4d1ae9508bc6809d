use colored::Colorize;

use crate::advice::{Advice, ReviewResult, Status};

/// Output format for results
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Yaml
}

/// Output options
#[derive(Debug, Clone)]
pub struct OutputOptions {
    pub format:  OutputFormat,
    pub colored: bool
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self {
            format:  OutputFormat::Text,
            colored: true
        }
    }
}

/// Format a review result based on output options
pub fn format_review(result: &ReviewResult, opts: &OutputOptions) -> String {
    match opts.format {
        OutputFormat::Json => serde_json::to_string_pretty(result).unwrap_or_default(),
        OutputFormat::Yaml => serde_yaml::to_string(result).unwrap_or_default(),
        OutputFormat::Text => format_text(result, opts)
    }
}

fn format_text(result: &ReviewResult, opts: &OutputOptions) -> String {
    let mut output = String::new();
    if opts.colored {
        output.push_str(&"=== SQL Review ===".bold().to_string());
    } else {
        output.push_str("=== SQL Review ===");
    }
    output.push_str("\n\n");

    for advice in &result.advices {
        output.push_str(&format_advice(advice, opts.colored));
        output.push('\n');
    }

    let summary = format!(
        "\nStatus: {} ({} error(s), {} warning(s), {} passed)",
        result.status,
        result.error_count(),
        result.warning_count(),
        result.success_count()
    );
    output.push_str(&summary);
    output.push('\n');
    output
}

fn format_advice(advice: &Advice, colored: bool) -> String {
    let tag = format!("[{}]", advice.status);
    let tag = if colored {
        match advice.status {
            Status::Success => tag.green().to_string(),
            Status::Warning => tag.yellow().bold().to_string(),
            Status::Error => tag.red().bold().to_string()
        }
    } else {
        tag
    };

    let mut line = format!("{} {} {}", tag, advice.code, advice.title);
    if advice.line > 0 {
        line.push_str(&format!(" (line {})", advice.line));
    }
    if !advice.content.is_empty() {
        line.push_str(": ");
        line.push_str(&advice.content);
    }
    line
}
