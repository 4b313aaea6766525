use serde::{Deserialize, Serialize};
use std::fmt;

/// Error kind for rule-table parse failures.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseErrorKind {
    Syntax,
    TypeMismatch,
    UnknownKey,
}

/// Produced when a declared rule table has an invalid shape.
///
/// These are static errors: the table text or value itself is malformed,
/// independent of any data being validated.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl ParseError {
    pub(crate) fn new(kind: ParseErrorKind, message: impl Into<String>, path: &str) -> Self {
        ParseError {
            kind,
            message: message.into(),
            path: Some(path.to_string()),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(path) = &self.path {
            write!(f, "{}: {}", path, self.message)
        } else {
            write!(f, "{}", self.message)
        }
    }
}

impl std::error::Error for ParseError {}

/// Error kind for execution-time configuration failures.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigErrorKind {
    UnknownRule,
    BadArguments,
}

/// Produced when a rule group references a rule that cannot be executed.
///
/// Unlike a validation failure, this indicates a programming mistake in the
/// rule table: the whole validation pass aborts and the error propagates to
/// the caller. It is never recorded as a per-attribute message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigError {
    pub kind: ConfigErrorKind,
    pub rule: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attribute: Option<String>,
    pub message: String,
}

impl ConfigError {
    pub(crate) fn unknown_rule(rule: &str, attribute: &str) -> Self {
        ConfigError {
            kind: ConfigErrorKind::UnknownRule,
            rule: rule.to_string(),
            attribute: Some(attribute.to_string()),
            message: format!("no validator or sanitizer named '{}' is registered", rule),
        }
    }

    pub(crate) fn bad_arguments(rule: &str, attribute: Option<&str>, detail: &str) -> Self {
        ConfigError {
            kind: ConfigErrorKind::BadArguments,
            rule: rule.to_string(),
            attribute: attribute.map(|a| a.to_string()),
            message: format!("invalid arguments for '{}': {}", rule, detail),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(attr) = &self.attribute {
            write!(f, "rule '{}' on '{}': {}", self.rule, attr, self.message)
        } else {
            write!(f, "rule '{}': {}", self.rule, self.message)
        }
    }
}

impl std::error::Error for ConfigError {}

/// Combined error type for the [`check`](crate::check) entry point.
#[derive(Clone, Debug)]
pub enum RulegateError {
    Parse(ParseError),
    Config(ConfigError),
}

impl fmt::Display for RulegateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RulegateError::Parse(e) => write!(f, "Parse error: {}", e),
            RulegateError::Config(e) => write!(f, "Configuration error: {}", e),
        }
    }
}

impl std::error::Error for RulegateError {}

impl From<ParseError> for RulegateError {
    fn from(e: ParseError) -> Self {
        RulegateError::Parse(e)
    }
}

impl From<ConfigError> for RulegateError {
    fn from(e: ConfigError) -> Self {
        RulegateError::Config(e)
    }
}
