//! The rule-group interpreter.
//!
//! Executes one active group's directive list against its narrowed
//! attribute set: gate capture and short-circuit, closure and inline
//! handler dispatch, registry validation and sanitization with
//! suppress-on-error, and recursive `when` bodies.

use serde_json::{Map, Value};
use std::collections::HashMap;

use crate::error::ConfigError;
use crate::model::{self, ErrorStore, FieldContext, Handler};
use crate::registry::{CheckError, Registry, RuleContext};
use crate::types::{Args, Directive, Gate, GroupBody};

/// Execution state shared across one validation pass: split borrows of the
/// model plus the resolved registry.
pub(crate) struct ExecCtx<'a> {
    pub values: &'a mut Map<String, Value>,
    pub errors: &'a mut ErrorStore,
    pub handlers: &'a HashMap<String, Handler>,
    pub registry: &'a Registry,
    pub labels: &'a HashMap<String, String>,
    pub label_placeholders: bool,
}

impl ExecCtx<'_> {
    fn label_for(&self, attribute: &str) -> String {
        match self.labels.get(attribute) {
            Some(label) => label.clone(),
            None => model::generate_label(attribute),
        }
    }
}

/// Execute one rule group body against `attributes`.
///
/// Returns `Ok(false)` only through the `one` gate: an error was recorded
/// and the gate covers the failing attribute, so the caller must stop
/// processing further groups. Errors recorded without a gate still return
/// `Ok(true)` — overall pass failure is judged from the error store.
pub(crate) fn run_group(
    ctx: &mut ExecCtx<'_>,
    attributes: &[String],
    body: &GroupBody,
) -> Result<bool, ConfigError> {
    // Errors are append-only during a pass, so the entry count is the
    // entry state. The `when` body and the gate both compare against it.
    let entry_count = ctx.errors.message_count();
    let mut gate: Option<Gate> = None;

    for attribute in attributes {
        let placeholders = effective_placeholders(ctx, body, attribute);

        for directive in &body.directives {
            match directive {
                Directive::GatePositional => {
                    gate = Some(Gate::Any);
                }
                Directive::GateKeyed(target) => {
                    gate = Some(Gate::Attr(target.clone()));
                }
                Directive::Closure { handler, args, .. } => {
                    let handler = handler.clone();
                    let mut field = FieldContext::new(attribute, ctx.values, ctx.errors);
                    handler(&mut field, args);
                }
                Directive::Bare {
                    name,
                    sanitize_only,
                } => {
                    run_named(ctx, attribute, name, &[], *sanitize_only, &placeholders, body)?;
                }
                Directive::Named {
                    name,
                    args,
                    sanitize_only,
                } => {
                    let args = resolve_args(args, ctx.values, name, attribute)?;
                    run_named(ctx, attribute, name, &args, *sanitize_only, &placeholders, body)?;
                }
            }
        }

        if let Some(g) = &gate
            && ctx.errors.message_count() > entry_count
            && (matches!(g, Gate::Any) || matches!(g, Gate::Attr(a) if a == attribute))
        {
            return Ok(false);
        }
    }

    // Conditional chained body: only when this group stayed clean.
    if let Some(when) = &body.when
        && ctx.errors.message_count() == entry_count
    {
        return run_group(ctx, attributes, when);
    }

    Ok(true)
}

/// Resolve a keyed directive's arguments. Thunks run against the current
/// attribute map and must produce a sequence.
fn resolve_args(
    args: &Args,
    values: &Map<String, Value>,
    rule: &str,
    attribute: &str,
) -> Result<Vec<Value>, ConfigError> {
    match args {
        Args::List(list) => Ok(list.clone()),
        Args::Thunk(thunk) => match thunk(values) {
            Value::Array(items) => Ok(items),
            other => Err(ConfigError::bad_arguments(
                rule,
                Some(attribute),
                &format!(
                    "thunk must resolve to a sequence, got {}",
                    json_type_name(&other)
                ),
            )),
        },
    }
}

/// Dispatch a named directive: model handler first, then the registry.
fn run_named(
    ctx: &mut ExecCtx<'_>,
    attribute: &str,
    name: &str,
    args: &[Value],
    sanitize_only: bool,
    placeholders: &Map<String, Value>,
    body: &GroupBody,
) -> Result<(), ConfigError> {
    // Model-defined inline rules shadow registry rules of the same name.
    if let Some(handler) = ctx.handlers.get(name) {
        let handler = handler.clone();
        let mut field = FieldContext::new(attribute, ctx.values, ctx.errors);
        handler(&mut field, args);
        return Ok(());
    }

    let has_validator = ctx.registry.has_validator(name);
    let has_sanitizer = ctx.registry.has_sanitizer(name);
    if !has_validator && !has_sanitizer {
        return Err(ConfigError::unknown_rule(name, attribute));
    }

    let rule_ctx = RuleContext {
        args,
        placeholders,
        custom_message: body.messages.get(name).map(String::as_str),
    };

    if !sanitize_only
        && let Some(validator) = ctx.registry.validator(name)
    {
        match validator.check(ctx.values.get(attribute), &rule_ctx) {
            Ok(()) => {}
            Err(CheckError::Invalid(message)) => ctx.errors.add(attribute, message),
            Err(CheckError::Config(mut e)) => {
                if e.attribute.is_none() {
                    e.attribute = Some(attribute.to_string());
                }
                return Err(e);
            }
        }
    }

    // Sanitize after validating, and never touch a value that already
    // failed. Absent attributes are not materialized.
    if !ctx.errors.has(attribute)
        && let Some(sanitizer) = ctx.registry.sanitizer(name)
        && let Some(current) = ctx.values.get(attribute).cloned()
    {
        let sanitized = sanitizer.apply(current, &rule_ctx);
        ctx.values.insert(attribute.to_string(), sanitized);
    }

    Ok(())
}

/// The group's placeholders, with the attribute's display label injected
/// as `name` when the group does not supply one.
fn effective_placeholders(
    ctx: &ExecCtx<'_>,
    body: &GroupBody,
    attribute: &str,
) -> Map<String, Value> {
    let mut placeholders = body.placeholders.clone();
    if ctx.label_placeholders && !placeholders.contains_key("name") {
        placeholders.insert("name".to_string(), Value::String(ctx.label_for(attribute)));
    }
    placeholders
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
