//! Typed rule payloads.
//!
//! Payloads arrive as opaque JSON; each advisor decodes the shape it needs.
//! Any mismatch becomes [`ReviewError::InvalidConfig`] for that rule.

use regex::Regex;
use serde::{Deserialize, de::DeserializeOwned};

use super::Rule;
use crate::error::ReviewError;

/// Default upper bound on identifier length for naming rules.
pub const DEFAULT_NAME_MAX_LENGTH: usize = 64;

/// Single numeric threshold, e.g. the maximum INSERT row count.
#[derive(Debug, Clone, Deserialize)]
pub struct NumberPayload {
    pub number: i64
}

/// Naming convention: a regular expression and a maximum length.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamingPayload {
    pub format:     String,
    #[serde(default = "default_max_length")]
    pub max_length: usize
}

/// Plain list of strings, e.g. required column names.
#[derive(Debug, Clone, Deserialize)]
pub struct StringListPayload {
    pub list: Vec<String>
}

fn default_max_length() -> usize {
    DEFAULT_NAME_MAX_LENGTH
}

/// Decode the rule payload into `T`.
pub fn decode<T: DeserializeOwned>(rule: &Rule) -> Result<T, ReviewError> {
    T::deserialize(&rule.payload).map_err(|e| invalid_config(rule, e.to_string()))
}

/// Naming convention with its format compiled.
#[derive(Debug, Clone)]
pub struct NamingFormat {
    pub format:     String,
    pub regex:      Regex,
    pub max_length: usize
}

impl NamingFormat {
    pub fn decode(rule: &Rule) -> Result<Self, ReviewError> {
        let payload: NamingPayload = decode(rule)?;
        let regex = Regex::new(&payload.format).map_err(|e| {
            invalid_config(rule, format!("invalid naming format '{}': {}", payload.format, e))
        })?;
        Ok(Self {
            format: payload.format,
            regex,
            max_length: payload.max_length
        })
    }
}

fn invalid_config(rule: &Rule, message: String) -> ReviewError {
    ReviewError::InvalidConfig {
        rule_type: rule.rule_type.to_string(),
        message
    }
}
