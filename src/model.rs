//! The attribute store: values under validation, accumulated errors,
//! scenario, display labels, inline handlers, and lifecycle hooks.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::ConfigError;
use crate::execute::ExecCtx;
use crate::registry::Registry;
use crate::types::RuleSet;
use crate::{execute, introspect, scenario};

/// A handler invoked for closure directives and model-registered inline
/// rules. Receives a mutable view of the model focused on the current
/// attribute, plus the directive's resolved arguments. Handlers signal
/// failure by recording errors, not by returning a value.
pub type Handler = Arc<dyn Fn(&mut FieldContext<'_>, &[Value]) + Send + Sync>;

/// Pre-validation hook. Returning `false` vetoes the whole pass.
pub type BeforeHook = Arc<dyn Fn(&mut Model) -> bool + Send + Sync>;

/// Post-validation hook. Runs only when the pass succeeded.
pub type AfterHook = Arc<dyn Fn(&mut Model) + Send + Sync>;

// ─── ErrorStore ─────────────────────────────────────────────────────────────

/// Per-attribute ordered error lists.
///
/// Message order within an attribute is the order errors were raised;
/// duplicates are kept. An attribute with no entry and one with an empty
/// list are the same thing — the API never distinguishes them.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ErrorStore {
    entries: HashMap<String, Vec<String>>,
}

impl ErrorStore {
    pub fn new() -> Self {
        ErrorStore::default()
    }

    /// Append one message to an attribute's error list.
    pub fn add(&mut self, attribute: &str, message: impl Into<String>) {
        self.entries
            .entry(attribute.to_string())
            .or_default()
            .push(message.into());
    }

    /// Merge a map of error lists. Empty lists are dropped.
    pub fn add_all(&mut self, errors: HashMap<String, Vec<String>>) {
        for (attribute, messages) in errors {
            if messages.is_empty() {
                continue;
            }
            self.entries.entry(attribute).or_default().extend(messages);
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn clear_attribute(&mut self, attribute: &str) {
        self.entries.remove(attribute);
    }

    /// True if the attribute has at least one recorded error.
    pub fn has(&self, attribute: &str) -> bool {
        self.entries
            .get(attribute)
            .is_some_and(|messages| !messages.is_empty())
    }

    /// True if any attribute has a recorded error.
    pub fn has_any(&self) -> bool {
        self.entries.values().any(|messages| !messages.is_empty())
    }

    /// All messages for an attribute, oldest first. Empty for unknown names.
    pub fn messages_for(&self, attribute: &str) -> &[String] {
        self.entries
            .get(attribute)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// The first message recorded for an attribute.
    pub fn first(&self, attribute: &str) -> Option<&str> {
        self.messages_for(attribute).first().map(String::as_str)
    }

    /// Attribute → first message, for every attribute with errors.
    pub fn firsts(&self) -> HashMap<String, String> {
        self.entries
            .iter()
            .filter_map(|(attribute, messages)| {
                messages
                    .first()
                    .map(|m| (attribute.clone(), m.clone()))
            })
            .collect()
    }

    /// Total number of recorded messages across all attributes.
    ///
    /// Messages are only ever appended during a pass, so this doubles as
    /// the "has anything changed since" marker for the executor.
    pub fn message_count(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    /// Attribute → messages view, empty lists elided.
    pub fn as_map(&self) -> HashMap<String, Vec<String>> {
        self.entries
            .iter()
            .filter(|(_, messages)| !messages.is_empty())
            .map(|(attribute, messages)| (attribute.clone(), messages.clone()))
            .collect()
    }
}

// ─── FieldContext ───────────────────────────────────────────────────────────

/// Mutable view of the model handed to closure directives and inline
/// handlers, focused on one attribute.
pub struct FieldContext<'a> {
    attribute: &'a str,
    values: &'a mut Map<String, Value>,
    errors: &'a mut ErrorStore,
}

impl<'a> FieldContext<'a> {
    pub(crate) fn new(
        attribute: &'a str,
        values: &'a mut Map<String, Value>,
        errors: &'a mut ErrorStore,
    ) -> Self {
        FieldContext {
            attribute,
            values,
            errors,
        }
    }

    /// The attribute this directive is running against.
    pub fn attribute(&self) -> &str {
        self.attribute
    }

    /// Current value of the focused attribute. `None` when absent.
    pub fn value(&self) -> Option<&Value> {
        self.values.get(self.attribute)
    }

    /// Read any attribute of the model.
    pub fn value_of(&self, attribute: &str) -> Option<&Value> {
        self.values.get(attribute)
    }

    /// The whole attribute map.
    pub fn values(&self) -> &Map<String, Value> {
        self.values
    }

    /// Overwrite the focused attribute's value.
    pub fn set_value(&mut self, value: Value) {
        self.values.insert(self.attribute.to_string(), value);
    }

    /// Overwrite any attribute's value.
    pub fn set(&mut self, attribute: &str, value: Value) {
        self.values.insert(attribute.to_string(), value);
    }

    /// Record an error against the focused attribute.
    pub fn add_error(&mut self, message: impl Into<String>) {
        self.errors.add(self.attribute, message);
    }

    /// Record an error against any attribute.
    pub fn add_error_for(&mut self, attribute: &str, message: impl Into<String>) {
        self.errors.add(attribute, message);
    }

    /// True if the focused attribute already has an error this pass.
    pub fn has_errors(&self) -> bool {
        self.errors.has(self.attribute)
    }
}

// ─── Label generation ───────────────────────────────────────────────────────

/// Derive a display label from an attribute name: `first_name` and
/// `firstName` both become `First Name`.
pub fn generate_label(attribute: &str) -> String {
    let mut spaced = String::with_capacity(attribute.len() + 4);
    let mut prev_word_char = false;
    for c in attribute.chars() {
        if c == '_' || c == '-' || c == '.' {
            spaced.push(' ');
            prev_word_char = false;
        } else if c.is_uppercase() && prev_word_char {
            spaced.push(' ');
            spaced.push(c);
            prev_word_char = false;
        } else {
            prev_word_char = c.is_lowercase() || c.is_ascii_digit();
            spaced.push(c);
        }
    }

    spaced
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

// ─── Model ──────────────────────────────────────────────────────────────────

/// A data object under validation: named attribute values, the rule table
/// that governs them, and the error state of the last pass.
#[derive(Clone)]
pub struct Model {
    rules: RuleSet,
    registry: Arc<Registry>,
    scenario: String,
    values: Map<String, Value>,
    errors: ErrorStore,
    labels: HashMap<String, String>,
    handlers: HashMap<String, Handler>,
    before: Option<BeforeHook>,
    after: Option<AfterHook>,
    label_placeholders: bool,
}

impl Model {
    pub fn new(rules: RuleSet, registry: Arc<Registry>) -> Self {
        Model {
            rules,
            registry,
            scenario: String::new(),
            values: Map::new(),
            errors: ErrorStore::new(),
            labels: HashMap::new(),
            handlers: HashMap::new(),
            before: None,
            after: None,
            label_placeholders: true,
        }
    }

    /// Build a model pre-seeded with attribute values.
    pub fn from_values(
        rules: RuleSet,
        registry: Arc<Registry>,
        values: Map<String, Value>,
    ) -> Self {
        let mut model = Model::new(rules, registry);
        model.values = values;
        model
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn scenario(&self) -> &str {
        &self.scenario
    }

    pub fn set_scenario(&mut self, scenario: &str) {
        self.scenario = scenario.to_string();
    }

    // ── Attribute values ────────────────────────────────────────────────

    pub fn get(&self, attribute: &str) -> Option<&Value> {
        self.values.get(attribute)
    }

    pub fn set(&mut self, attribute: &str, value: Value) {
        self.values.insert(attribute.to_string(), value);
    }

    /// Remove an attribute from the map entirely.
    pub fn unset(&mut self, attribute: &str) -> Option<Value> {
        self.values.shift_remove(attribute)
    }

    pub fn values(&self) -> &Map<String, Value> {
        &self.values
    }

    /// Merge a map of values into the model (bulk assignment).
    pub fn set_values(&mut self, values: Map<String, Value>) {
        self.values.extend(values);
    }

    // ── Labels ──────────────────────────────────────────────────────────

    /// Display label for an attribute: the registered override, or one
    /// generated from the attribute name.
    pub fn label(&self, attribute: &str) -> String {
        match self.labels.get(attribute) {
            Some(label) => label.clone(),
            None => generate_label(attribute),
        }
    }

    pub fn set_label(&mut self, attribute: &str, label: &str) {
        self.labels.insert(attribute.to_string(), label.to_string());
    }

    /// Whether the executor injects the attribute's label as the `name`
    /// placeholder when a group does not supply one. On by default.
    pub fn set_label_placeholders(&mut self, enabled: bool) {
        self.label_placeholders = enabled;
    }

    // ── Inline rules and hooks ──────────────────────────────────────────

    /// Register a named inline rule. Directives naming it dispatch here
    /// before consulting the registry.
    pub fn add_handler<F>(&mut self, name: &str, handler: F)
    where
        F: Fn(&mut FieldContext<'_>, &[Value]) + Send + Sync + 'static,
    {
        self.handlers.insert(name.to_string(), Arc::new(handler));
    }

    /// Hook run before any rule group. Returning `false` cancels the pass:
    /// `validate` reports `false` without recording anything, so callers
    /// must not read an empty error store as success.
    pub fn before_validate<F>(&mut self, hook: F)
    where
        F: Fn(&mut Model) -> bool + Send + Sync + 'static,
    {
        self.before = Some(Arc::new(hook));
    }

    /// Hook run after a pass that recorded no errors.
    pub fn after_validate<F>(&mut self, hook: F)
    where
        F: Fn(&mut Model) + Send + Sync + 'static,
    {
        self.after = Some(Arc::new(hook));
    }

    // ── Validation ──────────────────────────────────────────────────────

    /// Run the active rule groups against the model's values.
    ///
    /// `attributes` limits the pass to a subset; `None` covers every
    /// stored value plus every attribute the rule table declares. Clears
    /// prior errors first; see [`validate_with`](Self::validate_with) to
    /// keep them.
    ///
    /// Returns `Ok(false)` when any error was recorded or the before-hook
    /// vetoed the pass. Returns `Err` only for configuration errors
    /// (unknown rule name, malformed arguments), which abort immediately.
    pub fn validate(&mut self, attributes: Option<&[&str]>) -> Result<bool, ConfigError> {
        self.validate_with(attributes, true)
    }

    /// [`validate`](Self::validate) with control over error clearing.
    pub fn validate_with(
        &mut self,
        attributes: Option<&[&str]>,
        clear_first: bool,
    ) -> Result<bool, ConfigError> {
        if clear_first {
            self.errors.clear();
        }

        if let Some(hook) = self.before.clone()
            && !hook(self)
        {
            return Ok(false);
        }

        let requested: Vec<String> = match attributes {
            Some(list) => list.iter().map(|a| a.to_string()).collect(),
            None => self.default_attribute_set(),
        };

        let Model {
            rules,
            registry,
            scenario: current_scenario,
            values,
            errors,
            labels,
            handlers,
            label_placeholders,
            ..
        } = self;

        let groups = scenario::active_groups(rules, current_scenario, Some(&requested));
        let mut ctx = ExecCtx {
            values,
            errors,
            handlers,
            registry,
            labels,
            label_placeholders: *label_placeholders,
        };

        for group in groups {
            let targets: Vec<String> = group
                .attributes
                .iter()
                .filter(|a| requested.iter().any(|r| r == *a))
                .cloned()
                .collect();
            if targets.is_empty() {
                continue;
            }
            if !execute::run_group(&mut ctx, &targets, &group.body)? {
                break;
            }
        }

        if self.errors.has_any() {
            return Ok(false);
        }
        if let Some(hook) = self.after.clone() {
            hook(self);
        }
        Ok(true)
    }

    /// The default attribute set for a full pass: stored values first,
    /// then rule-declared attributes the data does not contain yet.
    fn default_attribute_set(&self) -> Vec<String> {
        let mut out: Vec<String> = self.values.keys().cloned().collect();
        for attr in self.rules.declared_attributes() {
            if !out.iter().any(|a| *a == attr) {
                out.push(attr);
            }
        }
        out
    }

    /// Static best-effort check: is the attribute unconditionally required
    /// under the current scenario? See [`crate::introspect`].
    pub fn is_attribute_required(&self, attribute: &str) -> bool {
        introspect::is_required(&self.rules, &self.scenario, attribute)
    }

    // ── Error access ────────────────────────────────────────────────────

    pub fn errors(&self) -> &ErrorStore {
        &self.errors
    }

    pub fn errors_for(&self, attribute: &str) -> &[String] {
        self.errors.messages_for(attribute)
    }

    pub fn add_error(&mut self, attribute: &str, message: impl Into<String>) {
        self.errors.add(attribute, message);
    }

    pub fn add_errors(&mut self, errors: HashMap<String, Vec<String>>) {
        self.errors.add_all(errors);
    }

    pub fn clear_errors(&mut self) {
        self.errors.clear();
    }

    pub fn clear_errors_for(&mut self, attribute: &str) {
        self.errors.clear_attribute(attribute);
    }

    pub fn has_errors(&self) -> bool {
        self.errors.has_any()
    }

    pub fn has_errors_for(&self, attribute: &str) -> bool {
        self.errors.has(attribute)
    }

    pub fn first_error(&self, attribute: &str) -> Option<&str> {
        self.errors.first(attribute)
    }

    pub fn first_errors(&self) -> HashMap<String, String> {
        self.errors.firsts()
    }
}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model")
            .field("scenario", &self.scenario)
            .field("values", &self.values)
            .field("errors", &self.errors)
            .finish_non_exhaustive()
    }
}
