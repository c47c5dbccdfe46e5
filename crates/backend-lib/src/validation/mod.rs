// ============================
// crates/backend-lib/src/validation/mod.rs
// ============================
//! Declarative payload validation.
//!
//! Each request payload declares a table of [`FieldRules`]; the table is
//! evaluated against the payload's JSON form and every violation is
//! collected, so clients see all problems at once. Paths are dotted and
//! `name[]` visits every element of an array (`questions[].answers`).

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

mod json;
mod payloads;

pub use json::ValidatedJson;

/// RFC 5321 SMTP limit
const MAX_EMAIL_LENGTH: usize = 254;

static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("email pattern compiles")
});

/// One failed constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub field: String,
    pub message: String,
}

/// Every violation found in one payload.
#[derive(Error, Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[error("{}", summarize(.violations))]
pub struct ValidationErrors {
    violations: Vec<Violation>,
}

fn summarize(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(|v| format!("{}: {}", v.field, v.message))
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationErrors {
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = Self::default();
        errors.push(field, message);
        errors
    }

    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.violations.push(Violation {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.violations.iter().any(|v| v.field == field)
    }

    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

/// A single constraint on a field. Absent optional fields pass every rule
/// except `Required`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Rule {
    Required,
    Email,
    /// Length in characters, inclusive.
    Length { min: usize, max: usize },
    /// Inclusive lower bound.
    Min(f64),
    /// Strictly greater than zero.
    Positive,
    MinItems(usize),
    /// Absolute http(s) URL.
    Url,
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rule::Required => f.write_str("is required"),
            Rule::Email => f.write_str("must be a valid email address"),
            Rule::Length { min: 0, max } => write!(f, "must be at most {max} characters"),
            Rule::Length { min, max } => {
                write!(f, "length must be between {min} and {max} characters")
            },
            Rule::Min(min) => write!(f, "must be greater than or equal to {min}"),
            Rule::Positive => f.write_str("must be greater than 0"),
            Rule::MinItems(n) => write!(f, "must contain at least {n} item(s)"),
            Rule::Url => f.write_str("must be an http(s) URL"),
        }
    }
}

/// Rules attached to one field path.
#[derive(Debug, Clone, Copy)]
pub struct FieldRules {
    pub path: &'static str,
    pub rules: &'static [Rule],
}

pub const fn field(path: &'static str, rules: &'static [Rule]) -> FieldRules {
    FieldRules { path, rules }
}

/// Check that an email address is well formed
pub fn is_valid_email(email: &str) -> bool {
    email.len() <= MAX_EMAIL_LENGTH && EMAIL_REGEX.is_match(email)
}

/// Normalise an email for storage and lookups.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn rule_holds(rule: Rule, value: &Value) -> bool {
    match (rule, value) {
        (Rule::Required, _) => true,
        (Rule::Email, Value::String(s)) => is_valid_email(s),
        (Rule::Length { min, max }, Value::String(s)) => {
            let len = s.chars().count();
            len >= min && len <= max
        },
        (Rule::Min(min), Value::Number(n)) => n.as_f64().is_some_and(|n| n >= min),
        (Rule::Positive, Value::Number(n)) => n.as_f64().is_some_and(|n| n > 0.0),
        (Rule::MinItems(n), Value::Array(items)) => items.len() >= n,
        (Rule::Url, Value::String(s)) => {
            (s.starts_with("http://") || s.starts_with("https://"))
                && s.len() > "https://".len()
                && !s.chars().any(char::is_whitespace)
        },
        _ => false,
    }
}

/// Expand a rule path into concrete `(path, value)` pairs.
fn resolve<'a>(
    value: &'a Value,
    segments: &[&str],
    prefix: &str,
    out: &mut Vec<(String, Option<&'a Value>)>,
) {
    let Some((head, rest)) = segments.split_first() else {
        out.push((prefix.to_string(), Some(value)));
        return;
    };
    let (name, each) = match head.strip_suffix("[]") {
        Some(name) => (name, true),
        None => (*head, false),
    };
    let path = if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}.{name}")
    };

    match value.get(name).filter(|v| !v.is_null()) {
        None => out.push((path, None)),
        Some(Value::Array(items)) if each => {
            for (index, item) in items.iter().enumerate() {
                resolve(item, rest, &format!("{path}[{index}]"), out);
            }
        },
        Some(child) if each => out.push((path, Some(child))),
        Some(child) => resolve(child, rest, &path, out),
    }
}

/// Evaluate a rule table against a JSON value.
pub fn check(value: &Value, table: &[FieldRules]) -> ValidationErrors {
    let mut errors = ValidationErrors::default();
    for entry in table {
        let segments: Vec<&str> = entry.path.split('.').collect();
        let mut targets = Vec::new();
        resolve(value, &segments, "", &mut targets);

        for (path, target) in targets {
            for &rule in entry.rules {
                let failed = match target {
                    None => rule == Rule::Required,
                    Some(v) => !rule_holds(rule, v),
                };
                if failed {
                    errors.push(path.clone(), rule.to_string());
                    // one message per field is enough
                    break;
                }
            }
        }
    }
    errors
}

/// A payload with a declarative constraint set.
pub trait Validate: Serialize {
    const RULES: &'static [FieldRules];

    /// Canonicalise fields in place; runs before the rules are checked.
    fn normalize(&mut self) {}

    /// Constraints spanning several fields.
    fn check_relations(&self, _errors: &mut ValidationErrors) {}

    fn validate(&self) -> Result<(), ValidationErrors> {
        let value = serde_json::to_value(self)
            .map_err(|e| ValidationErrors::single("body", e.to_string()))?;
        let mut errors = check(&value, Self::RULES);
        self.check_relations(&mut errors);
        errors.into_result()
    }
}

/// Result type for validation operations
pub type ValidationResult<T> = Result<T, ValidationErrors>;

/// Validate a free-text search term.
pub fn validate_search_query(q: &str) -> ValidationResult<&str> {
    let q = q.trim();
    if q.chars().count() < 2 {
        return Err(ValidationErrors::single("q", "must be at least 2 characters"));
    }
    if q.chars().count() > 100 {
        return Err(ValidationErrors::single("q", "must be at most 100 characters"));
    }
    Ok(q)
}
