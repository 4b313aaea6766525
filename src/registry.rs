//! The named rule registry and the per-call configuration record.
//!
//! Rules are stateless `Send + Sync` trait objects shared behind `Arc`; all
//! per-invocation state (arguments, placeholders, custom message) rides in
//! [`RuleContext`]. Nothing leaks between attributes, or between models
//! that share one registry across threads.

use crate::error::ConfigError;
use regex::Regex;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

static PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{([a-zA-Z_][a-zA-Z0-9_]*)\}\}").unwrap());

/// Interpolate `{{placeholder}}` tokens in a message template.
///
/// Unknown placeholders are left verbatim. String values substitute as-is;
/// other values substitute in their JSON rendering.
pub fn format_message(template: &str, placeholders: &Map<String, Value>) -> String {
    PLACEHOLDER_RE
        .replace_all(template, |caps: &regex::Captures<'_>| {
            match placeholders.get(&caps[1]) {
                Some(Value::String(s)) => s.clone(),
                Some(other) => other.to_string(),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

/// Per-invocation configuration handed to a rule: resolved arguments, the
/// effective placeholder map, and the group's custom message (if any) for
/// this directive.
pub struct RuleContext<'a> {
    pub args: &'a [Value],
    pub placeholders: &'a Map<String, Value>,
    pub custom_message: Option<&'a str>,
}

impl RuleContext<'_> {
    pub fn arg(&self, index: usize) -> Option<&Value> {
        self.args.get(index)
    }

    /// Format the error message for a failed check: the group's custom
    /// message when declared, otherwise `default_template`.
    pub fn message(&self, default_template: &str) -> String {
        format_message(
            self.custom_message.unwrap_or(default_template),
            self.placeholders,
        )
    }

    /// Like [`message`](Self::message), with extra placeholders layered on
    /// top of the effective map (rule-specific values such as bounds).
    pub fn message_with(&self, default_template: &str, extra: &[(&str, Value)]) -> String {
        let mut placeholders = self.placeholders.clone();
        for (name, value) in extra {
            placeholders.insert((*name).to_string(), value.clone());
        }
        format_message(
            self.custom_message.unwrap_or(default_template),
            &placeholders,
        )
    }
}

/// A validator check that did not pass.
pub enum CheckError {
    /// The value is invalid: carries the formatted message to record
    /// against the attribute. Processing continues.
    Invalid(String),
    /// The rule itself is misconfigured: aborts the whole pass.
    Config(ConfigError),
}

/// The validator half of a named rule.
///
/// `value` is the attribute's current value, `None` when the attribute is
/// absent from the data — the engine never synthesizes a value. Whether an
/// empty value passes is each rule's own policy (most builtins skip empty;
/// `required` does not).
pub trait ValidateRule: Send + Sync {
    fn check(&self, value: Option<&Value>, ctx: &RuleContext<'_>) -> Result<(), CheckError>;
}

/// The sanitizer half of a named rule. Must be total: a value the rule
/// does not apply to is returned unchanged.
pub trait SanitizeRule: Send + Sync {
    fn apply(&self, value: Value, ctx: &RuleContext<'_>) -> Value;
}

/// Named maps from rule name to validator and sanitizer handles.
///
/// A name may be registered on either side or both (`trim` is sanitizer
/// only, `required` validator only; a hypothetical `slug` could be both).
#[derive(Clone, Default)]
pub struct Registry {
    validators: HashMap<String, Arc<dyn ValidateRule>>,
    sanitizers: HashMap<String, Arc<dyn SanitizeRule>>,
}

impl Registry {
    /// A registry with no rules. Useful for fully custom rule sets.
    pub fn empty() -> Self {
        Registry::default()
    }

    /// A registry pre-loaded with the builtin rules (see [`crate::builtin`]).
    pub fn with_builtins() -> Self {
        let mut registry = Registry::default();
        crate::builtin::install(&mut registry);
        registry
    }

    pub fn add_validator(&mut self, name: &str, rule: impl ValidateRule + 'static) {
        self.validators.insert(name.to_string(), Arc::new(rule));
    }

    pub fn add_sanitizer(&mut self, name: &str, rule: impl SanitizeRule + 'static) {
        self.sanitizers.insert(name.to_string(), Arc::new(rule));
    }

    pub fn has_validator(&self, name: &str) -> bool {
        self.validators.contains_key(name)
    }

    pub fn has_sanitizer(&self, name: &str) -> bool {
        self.sanitizers.contains_key(name)
    }

    /// True if the name resolves on either side.
    pub fn has_rule(&self, name: &str) -> bool {
        self.has_validator(name) || self.has_sanitizer(name)
    }

    pub(crate) fn validator(&self, name: &str) -> Option<&Arc<dyn ValidateRule>> {
        self.validators.get(name)
    }

    pub(crate) fn sanitizer(&self, name: &str) -> Option<&Arc<dyn SanitizeRule>> {
        self.sanitizers.get(name)
    }
}
