//! Request input checks
//!
//! Handlers run a [`Validator`] over the decoded body before touching the
//! store. Every failing field is collected, so a client sees all problems in
//! one `400` response.

use serde::Deserialize;

use crate::types::{ConnectorError, FieldError};

/// Collects field errors for one request body
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<FieldError>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value must be present and not blank
    pub fn required(&mut self, param: &str, value: Option<&str>, msg: &str) -> &mut Self {
        if value.map_or(true, |v| v.trim().is_empty()) {
            self.fail(param, msg);
        }
        self
    }

    /// Value must look like an email address
    pub fn email(&mut self, param: &str, value: Option<&str>, msg: &str) -> &mut Self {
        let valid = value
            .map(str::trim)
            .and_then(|v| v.split_once('@'))
            .map_or(false, |(local, domain)| {
                !local.is_empty() && domain.contains('.') && !domain.starts_with('.')
            });
        if !valid {
            self.fail(param, msg);
        }
        self
    }

    /// Value must be at least `min` characters
    pub fn min_len(&mut self, param: &str, value: Option<&str>, min: usize, msg: &str) -> &mut Self {
        if value.map_or(0, |v| v.chars().count()) < min {
            self.fail(param, msg);
        }
        self
    }

    /// Record a failure the built-in checks do not cover
    pub fn fail(&mut self, param: &str, msg: &str) -> &mut Self {
        self.errors.push(FieldError::new(param, msg));
        self
    }

    pub fn finish(&mut self) -> Result<(), ConnectorError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ConnectorError::Validation(std::mem::take(&mut self.errors)))
        }
    }
}

/// Skills arrive either as a comma-separated string or a JSON list
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SkillsInput {
    Csv(String),
    List(Vec<String>),
}

impl SkillsInput {
    /// Trimmed, upper-cased, blanks dropped
    pub fn normalize(&self) -> Vec<String> {
        let raw: Vec<&str> = match self {
            Self::Csv(csv) => csv.split(',').collect(),
            Self::List(list) => list.iter().map(String::as_str).collect(),
        };
        raw.into_iter()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_uppercase)
            .collect()
    }
}

/// Trim a free-text field, dropping it if blank
pub fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
