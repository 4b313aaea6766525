//! Builtin validators and sanitizers.
//!
//! Every builtin validator except `required` skips empty input (absent,
//! null, empty or blank-only string): pair with `required` when a value
//! must be present. Sanitizers are string-oriented and leave other value
//! types untouched.

use crate::error::ConfigError;
use crate::registry::{CheckError, Registry, RuleContext, SanitizeRule, ValidateRule};
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").unwrap());

static URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^https?://[^\s/$.?#][^\s]*$").unwrap());

static INTEGER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[+-]?[0-9]+$").unwrap());

static NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[+-]?([0-9]+(\.[0-9]*)?|\.[0-9]+)([eE][+-]?[0-9]+)?$").unwrap());

/// Register every builtin rule into the registry.
pub(crate) fn install(registry: &mut Registry) {
    registry.add_validator("required", Required);
    registry.add_validator("length", Length);
    registry.add_validator("email", Email);
    registry.add_validator("url", Url);
    registry.add_validator("match", Match);
    registry.add_validator("in", InList);
    registry.add_validator("integer", IsInteger);
    registry.add_validator("number", IsNumber);
    registry.add_validator("boolean", IsBoolean);
    registry.add_validator("string", IsString);

    registry.add_sanitizer("trim", Trim);
    registry.add_sanitizer("ltrim", Ltrim);
    registry.add_sanitizer("rtrim", Rtrim);
    registry.add_sanitizer("lowercase", Lowercase);
    registry.add_sanitizer("uppercase", Uppercase);
}

/// Empty input: absent, null, or a string that is empty after trimming.
pub fn is_empty_input(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(_) => false,
    }
}

// ─── Validators ─────────────────────────────────────────────────────────────

/// Fails on empty input.
pub struct Required;

impl ValidateRule for Required {
    fn check(&self, value: Option<&Value>, ctx: &RuleContext<'_>) -> Result<(), CheckError> {
        if is_empty_input(value) {
            return Err(CheckError::Invalid(ctx.message("{{name}} cannot be blank.")));
        }
        Ok(())
    }
}

/// String character-count bounds, `[min, max]`. Either bound may be null
/// to leave that side open.
pub struct Length;

impl ValidateRule for Length {
    fn check(&self, value: Option<&Value>, ctx: &RuleContext<'_>) -> Result<(), CheckError> {
        if is_empty_input(value) {
            return Ok(());
        }
        let Some(Value::String(s)) = value else {
            return Err(CheckError::Invalid(ctx.message("{{name}} must be a string.")));
        };
        let min = bound_arg(ctx, 0, "length")?;
        let max = bound_arg(ctx, 1, "length")?;
        let count = s.chars().count() as u64;
        if let Some(min) = min
            && count < min
        {
            return Err(CheckError::Invalid(ctx.message_with(
                "{{name}} is too short (minimum is {{min}} characters).",
                &[("min", Value::from(min))],
            )));
        }
        if let Some(max) = max
            && count > max
        {
            return Err(CheckError::Invalid(ctx.message_with(
                "{{name}} is too long (maximum is {{max}} characters).",
                &[("max", Value::from(max))],
            )));
        }
        Ok(())
    }
}

/// Read an optional numeric bound argument; null and absent both mean open.
fn bound_arg(ctx: &RuleContext<'_>, index: usize, rule: &str) -> Result<Option<u64>, CheckError> {
    match ctx.arg(index) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) if n.as_u64().is_some() => Ok(n.as_u64()),
        Some(other) => Err(CheckError::Config(ConfigError::bad_arguments(
            rule,
            None,
            &format!("bound must be a non-negative integer or null, got {}", other),
        ))),
    }
}

/// Syntactic email check.
pub struct Email;

impl ValidateRule for Email {
    fn check(&self, value: Option<&Value>, ctx: &RuleContext<'_>) -> Result<(), CheckError> {
        string_pattern_check(value, &EMAIL_RE, || {
            ctx.message("{{name}} is not a valid email address.")
        })
    }
}

/// Accepts http and https URLs.
pub struct Url;

impl ValidateRule for Url {
    fn check(&self, value: Option<&Value>, ctx: &RuleContext<'_>) -> Result<(), CheckError> {
        string_pattern_check(value, &URL_RE, || ctx.message("{{name}} is not a valid URL."))
    }
}

fn string_pattern_check(
    value: Option<&Value>,
    pattern: &Regex,
    message: impl FnOnce() -> String,
) -> Result<(), CheckError> {
    if is_empty_input(value) {
        return Ok(());
    }
    match value {
        Some(Value::String(s)) if pattern.is_match(s) => Ok(()),
        _ => Err(CheckError::Invalid(message())),
    }
}

/// The value must match the regex given as `[pattern]`. An uncompilable
/// pattern is a configuration error, not a validation failure.
pub struct Match;

impl ValidateRule for Match {
    fn check(&self, value: Option<&Value>, ctx: &RuleContext<'_>) -> Result<(), CheckError> {
        let Some(Value::String(pattern)) = ctx.arg(0) else {
            return Err(CheckError::Config(ConfigError::bad_arguments(
                "match",
                None,
                "expected a regex pattern string as the first argument",
            )));
        };
        let re = Regex::new(pattern).map_err(|e| {
            CheckError::Config(ConfigError::bad_arguments(
                "match",
                None,
                &format!("invalid regex: {}", e),
            ))
        })?;
        string_pattern_check(value, &re, || ctx.message("{{name}} is invalid."))
    }
}

/// The value must equal one of the arguments.
pub struct InList;

impl ValidateRule for InList {
    fn check(&self, value: Option<&Value>, ctx: &RuleContext<'_>) -> Result<(), CheckError> {
        if is_empty_input(value) {
            return Ok(());
        }
        let Some(value) = value else { return Ok(()) };
        if ctx.args.contains(value) {
            Ok(())
        } else {
            Err(CheckError::Invalid(
                ctx.message("{{name}} is not in the list of allowed values."),
            ))
        }
    }
}

/// An integral number, or a string spelling one.
pub struct IsInteger;

impl ValidateRule for IsInteger {
    fn check(&self, value: Option<&Value>, ctx: &RuleContext<'_>) -> Result<(), CheckError> {
        if is_empty_input(value) {
            return Ok(());
        }
        let ok = match value {
            Some(Value::Number(n)) => n.as_i64().is_some() || n.as_u64().is_some(),
            Some(Value::String(s)) => INTEGER_RE.is_match(s.trim()),
            _ => false,
        };
        if ok {
            Ok(())
        } else {
            Err(CheckError::Invalid(ctx.message("{{name}} must be an integer.")))
        }
    }
}

/// Any number, or a string spelling one.
pub struct IsNumber;

impl ValidateRule for IsNumber {
    fn check(&self, value: Option<&Value>, ctx: &RuleContext<'_>) -> Result<(), CheckError> {
        if is_empty_input(value) {
            return Ok(());
        }
        let ok = match value {
            Some(Value::Number(_)) => true,
            Some(Value::String(s)) => NUMBER_RE.is_match(s.trim()),
            _ => false,
        };
        if ok {
            Ok(())
        } else {
            Err(CheckError::Invalid(ctx.message("{{name}} must be a number.")))
        }
    }
}

/// A bool, or one of `"0"`, `"1"`, `"true"`, `"false"`.
pub struct IsBoolean;

impl ValidateRule for IsBoolean {
    fn check(&self, value: Option<&Value>, ctx: &RuleContext<'_>) -> Result<(), CheckError> {
        if is_empty_input(value) {
            return Ok(());
        }
        let ok = match value {
            Some(Value::Bool(_)) => true,
            Some(Value::String(s)) => {
                let s = s.trim();
                s == "0" || s == "1" || s.eq_ignore_ascii_case("true") || s.eq_ignore_ascii_case("false")
            }
            _ => false,
        };
        if ok {
            Ok(())
        } else {
            Err(CheckError::Invalid(
                ctx.message("{{name}} must be either true or false."),
            ))
        }
    }
}

/// The value must be a string.
pub struct IsString;

impl ValidateRule for IsString {
    fn check(&self, value: Option<&Value>, ctx: &RuleContext<'_>) -> Result<(), CheckError> {
        if is_empty_input(value) {
            return Ok(());
        }
        match value {
            Some(Value::String(_)) => Ok(()),
            _ => Err(CheckError::Invalid(ctx.message("{{name}} must be a string."))),
        }
    }
}

// ─── Sanitizers ─────────────────────────────────────────────────────────────

/// Strips leading and trailing whitespace.
pub struct Trim;

impl SanitizeRule for Trim {
    fn apply(&self, value: Value, _ctx: &RuleContext<'_>) -> Value {
        match value {
            Value::String(s) => Value::String(s.trim().to_string()),
            other => other,
        }
    }
}

/// Strips leading whitespace.
pub struct Ltrim;

impl SanitizeRule for Ltrim {
    fn apply(&self, value: Value, _ctx: &RuleContext<'_>) -> Value {
        match value {
            Value::String(s) => Value::String(s.trim_start().to_string()),
            other => other,
        }
    }
}

/// Strips trailing whitespace.
pub struct Rtrim;

impl SanitizeRule for Rtrim {
    fn apply(&self, value: Value, _ctx: &RuleContext<'_>) -> Value {
        match value {
            Value::String(s) => Value::String(s.trim_end().to_string()),
            other => other,
        }
    }
}

/// Lowercases the string.
pub struct Lowercase;

impl SanitizeRule for Lowercase {
    fn apply(&self, value: Value, _ctx: &RuleContext<'_>) -> Value {
        match value {
            Value::String(s) => Value::String(s.to_lowercase()),
            other => other,
        }
    }
}

/// Uppercases the string.
pub struct Uppercase;

impl SanitizeRule for Uppercase {
    fn apply(&self, value: Value, _ctx: &RuleContext<'_>) -> Value {
        match value {
            Value::String(s) => Value::String(s.to_uppercase()),
            other => other,
        }
    }
}
