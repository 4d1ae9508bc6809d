//! Script parsing.
//!
//! A change script is split into statements at top-level semicolons using
//! the `sqlparser` tokenizer, so quoted semicolons and comments never split a
//! statement and every statement keeps the line it starts on. Each statement
//! is then parsed and lowered into the structural tree in parallel.
//!
//! A syntax error anywhere rejects the whole script.
//!
//! ```
//! use sql_review::{parser::parse_script, rule::Dialect};
//!
//! let script = "CREATE TABLE t (id INT);\n\nINSERT INTO t (id)\nVALUES (1);";
//! let statements = parse_script(script, Dialect::MySQL, "utf8mb4", "").unwrap();
//!
//! assert_eq!(statements.len(), 2);
//! assert_eq!(statements[1].line, 3);
//! assert_eq!(statements[1].text, "INSERT INTO t (id)\nVALUES (1)");
//! ```

use rayon::prelude::*;
use sqlparser::{
    parser::Parser,
    tokenizer::{Location, Token, Tokenizer}
};
use thiserror::Error;

use crate::{
    advice::{Advice, Code, Status},
    ast::{Node, lower_statement},
    error::extract_position,
    rule::Dialect
};

/// One statement of a script.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    /// Source text without the terminating semicolon
    pub text: String,
    /// 1-based line the statement starts on
    pub line: usize,
    pub node: Node
}

/// The script could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("syntax error at line {line}: {message}")]
pub struct SyntaxError {
    /// Best-effort 1-based line of the error
    pub line:    usize,
    pub message: String
}

impl SyntaxError {
    /// The single advice reported in place of any rule output.
    pub fn to_advice(&self) -> Advice {
        Advice {
            status:  Status::Error,
            code:    Code::StatementSyntaxError,
            title:   String::from("Syntax error"),
            content: self.message.clone(),
            line:    self.line
        }
    }
}

/// Parse a script into statements.
///
/// Charset and collation describe the script's origin; the text itself is
/// already UTF-8 so they only annotate diagnostics.
pub fn parse_script(
    script: &str,
    dialect: Dialect,
    charset: &str,
    collation: &str
) -> Result<Vec<Statement>, SyntaxError> {
    tracing::trace!(%dialect, charset, collation, "parsing script");
    let chunks = split_statements(script, dialect)?;
    let parsed: Vec<Result<Statement, SyntaxError>> = chunks
        .into_par_iter()
        .map(|chunk| parse_chunk(chunk, dialect))
        .collect();
    // first error in source order
    parsed.into_iter().collect()
}

struct Chunk<'a> {
    text: &'a str,
    line: usize
}

fn split_statements(script: &str, dialect: Dialect) -> Result<Vec<Chunk<'_>>, SyntaxError> {
    let parser_dialect = dialect.into_parser_dialect();
    let tokens = Tokenizer::new(parser_dialect.as_ref(), script)
        .tokenize_with_location()
        .map_err(|e| syntax_error(&e.to_string(), 1))?;
    let lines = LineIndex::new(script);
    let mut chunks = Vec::new();
    let mut start: Option<Location> = None;
    for token in &tokens {
        match token.token {
            Token::Whitespace(_) | Token::EOF => {}
            Token::SemiColon => {
                if let Some(begin) = start.take() {
                    chunks.push(lines.chunk(script, begin, lines.offset(script, token.span.start)));
                }
            }
            _ => {
                if start.is_none() {
                    start = Some(token.span.start);
                }
            }
        }
    }
    if let Some(begin) = start {
        chunks.push(lines.chunk(script, begin, script.len()));
    }
    Ok(chunks)
}

fn parse_chunk(chunk: Chunk<'_>, dialect: Dialect) -> Result<Statement, SyntaxError> {
    let parser_dialect = dialect.into_parser_dialect();
    let statements = Parser::parse_sql(parser_dialect.as_ref(), chunk.text)
        .map_err(|e| syntax_error(&e.to_string(), chunk.line))?;
    let node = statements
        .first()
        .map(lower_statement)
        .unwrap_or_else(|| Node::Other("EMPTY".into()));
    Ok(Statement {
        text: chunk.text.to_string(),
        line: chunk.line,
        node
    })
}

/// Build a syntax error whose reported line is relative to `first_line`.
fn syntax_error(message: &str, first_line: usize) -> SyntaxError {
    let line = extract_position(message)
        .map(|pos| first_line + pos.line.saturating_sub(1))
        .unwrap_or(first_line);
    SyntaxError {
        line,
        message: message.to_string()
    }
}

/// Byte offsets of line starts, for mapping tokenizer locations to text.
struct LineIndex {
    starts: Vec<usize>
}

impl LineIndex {
    fn new(text: &str) -> Self {
        let mut starts = vec![0];
        starts.extend(text.match_indices('\n').map(|(idx, _)| idx + 1));
        Self {
            starts
        }
    }

    /// Byte offset of a 1-based line/column location.
    fn offset(&self, text: &str, location: Location) -> usize {
        let line = (location.line as usize).saturating_sub(1);
        let Some(&line_start) = self.starts.get(line) else {
            return text.len();
        };
        let column = (location.column as usize).saturating_sub(1);
        text[line_start..]
            .char_indices()
            .nth(column)
            .map(|(idx, _)| line_start + idx)
            .unwrap_or(text.len())
    }

    fn chunk<'a>(&self, text: &'a str, begin: Location, end: usize) -> Chunk<'a> {
        let start = self.offset(text, begin);
        Chunk {
            text: text[start..end.max(start)].trim_end(),
            line: begin.line as usize
        }
    }
}
