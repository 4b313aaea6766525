//! Scenario-gated rule-table validation and sanitization for attribute maps.
//!
//! A rule table declares, per group of attributes, an ordered list of
//! directives — sanitizers (`trim`), validators (`required`, `length`),
//! inline handlers, closures — plus optional scenario restrictions, a
//! `one` gate ("stop at the first failing attribute"), and conditional
//! `when` sub-rules. The crate provides the full pipeline:
//!
//! ```text
//! parse_rules(text) → RuleSet → Model::validate() → per-attribute errors
//!                                                 → sanitized values
//! ```
//!
//! # Quick Start
//!
//! ```rust
//! use serde_json::json;
//!
//! let rules = r#"
//! - [[username, email], trim]
//! - [[username, email], required]
//! - [username, {length: [3, 12]}]
//! - [email, email]
//! "#;
//!
//! let report = rulegate::check(
//!     rules,
//!     &json!({"username": "  Tom  ", "email": "tom@example.com"}),
//!     "",
//! )
//! .expect("well-formed rule table");
//!
//! assert!(report.valid);
//! assert_eq!(report.values["username"], "Tom");
//! ```
//!
//! For anything beyond a one-shot check — scenarios, inline handlers,
//! hooks, custom registries — build a [`Model`] directly:
//!
//! ```rust
//! use rulegate::{Model, Registry, RuleGroup, RuleSet};
//! use serde_json::{json, Value};
//! use std::sync::Arc;
//!
//! let rules = RuleSet::new()
//!     .with(RuleGroup::new(["password"]).rule("required").on(["register"]))
//!     .with(RuleGroup::new(["password"]).rule_with("length", [json!(8), Value::Null]));
//!
//! let mut model = Model::new(rules, Arc::new(Registry::with_builtins()));
//! model.set_scenario("register");
//! model.set("password", json!("hunter2"));
//!
//! let ok = model.validate(None).expect("rules are well-formed");
//! assert!(!ok);
//! assert!(model.has_errors_for("password"));
//! ```

pub mod builtin;
pub mod error;
pub mod introspect;
pub mod model;
pub mod parse;
pub mod registry;
pub mod scenario;
pub mod types;

pub(crate) mod execute;

pub use error::*;
pub use model::{AfterHook, BeforeHook, ErrorStore, FieldContext, Handler, Model, generate_label};
pub use registry::{CheckError, Registry, RuleContext, SanitizeRule, ValidateRule, format_message};
pub use types::*;

// Re-export entry-point functions at the crate root for convenience.
pub use introspect::is_required;
pub use parse::{parse_rules, parse_rules_str};
pub use scenario::active_groups;

use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;

/// Result of the [`check`] convenience entry point.
pub struct CheckReport {
    /// Overall verdict: no errors recorded and the pass was not vetoed.
    pub valid: bool,
    /// The attribute values after sanitization.
    pub values: Map<String, Value>,
    /// Per-attribute error messages, in the order they were raised.
    pub errors: HashMap<String, Vec<String>>,
}

/// Convenience entry point composing parse → model → validate.
///
/// Parses `rules` (YAML or JSON text), seeds a [`Model`] backed by the
/// builtin registry with the attributes of the `data` object, and runs a
/// full validation pass under `scenario`.
///
/// # Errors
///
/// Returns [`RulegateError::Parse`] when the rule table or data is
/// malformed, and [`RulegateError::Config`] when a group references an
/// unknown rule or passes invalid arguments.
///
/// # Example
///
/// ```rust
/// use serde_json::json;
///
/// let report = rulegate::check(
///     "- [age, integer]",
///     &json!({"age": "twelve"}),
///     "",
/// )
/// .expect("well-formed rule table");
///
/// assert!(!report.valid);
/// assert_eq!(report.errors["age"], vec!["Age must be an integer."]);
/// ```
pub fn check(rules: &str, data: &Value, scenario: &str) -> Result<CheckReport, RulegateError> {
    let rules = parse::parse_rules_str(rules)?;

    let values = data
        .as_object()
        .cloned()
        .ok_or_else(|| ParseError {
            kind: ParseErrorKind::TypeMismatch,
            message: "data must be an object".to_string(),
            path: Some("data".to_string()),
        })?;

    let mut model = Model::from_values(rules, Arc::new(Registry::with_builtins()), values);
    model.set_scenario(scenario);

    let valid = model.validate(None)?;

    Ok(CheckReport {
        valid,
        values: model.values().clone(),
        errors: model.errors().as_map(),
    })
}
