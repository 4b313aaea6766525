//! Parse the declared rule-table DSL into a [`RuleSet`].
//!
//! The declared form is deliberately loose — it is what humans write in
//! config — and this module is the only place that interprets it. A table
//! is a sequence of groups; a group is a sequence whose first element
//! declares the covered attributes and whose remaining elements are either
//! bare directive names or mappings of keyed entries:
//!
//! ```yaml
//! - [[username, email], trim]
//! - [[username, email], required]
//! - [username, {length: [3, 12]}, {scenarios: [register]}]
//! - [email, email, {messages: {email: "{{name}} must be a company address."}}]
//! ```
//!
//! Mapping keys are either reserved (`scenarios`, `placeholders`,
//! `messages`, `one`, `when`) or directive names whose value is the
//! argument list. Key order inside a mapping is preserved — directives
//! execute in exactly the declared order.
//!
//! Note for YAML sources: sanitize-only names must be quoted (`'!trim'`),
//! since a bare `!` introduces a YAML tag.
//!
//! Shape errors are reported with a path into the table
//! (`rules[2].length`), never deferred to execution time.

use serde_json::Value;

use crate::error::{ParseError, ParseErrorKind};
use crate::types::{
    Args, Directive, GATE_NAME, GroupBody, KEY_MESSAGES, KEY_PLACEHOLDERS, KEY_SCENARIOS,
    KEY_WHEN, RuleGroup, RuleSet,
};

/// Parse a rule table from YAML (or JSON — valid YAML) text.
pub fn parse_rules_str(input: &str) -> Result<RuleSet, ParseError> {
    if input.trim().is_empty() {
        return Err(ParseError {
            kind: ParseErrorKind::Syntax,
            message: "empty input".to_string(),
            path: None,
        });
    }

    // The DSL declares attribute names as bare scalars (e.g. `y`, `n`). Under
    // serde-saphyr's default YAML 1.1 schema those tokens coerce to booleans;
    // `strict_booleans` restricts boolean inference to the literals `true` and
    // `false`, so such names stay strings as the rule table intends.
    let options = serde_saphyr::Options {
        strict_booleans: true,
        ..serde_saphyr::Options::default()
    };
    let value: Value = serde_saphyr::from_str_with_options(input, options).map_err(|e| ParseError {
        kind: ParseErrorKind::Syntax,
        message: e.to_string(),
        path: None,
    })?;

    parse_rules(&value)
}

/// Parse a rule table from an already-deserialized value.
pub fn parse_rules(value: &Value) -> Result<RuleSet, ParseError> {
    let groups = value.as_array().ok_or_else(|| ParseError {
        kind: ParseErrorKind::TypeMismatch,
        message: "rule table must be a sequence of rule groups".to_string(),
        path: Some("rules".to_string()),
    })?;

    let groups = groups
        .iter()
        .enumerate()
        .map(|(i, group)| parse_group(group, &format!("rules[{}]", i)))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(RuleSet { groups })
}

fn parse_group(value: &Value, path: &str) -> Result<RuleGroup, ParseError> {
    let entries = value.as_array().ok_or_else(|| {
        ParseError::new(
            ParseErrorKind::TypeMismatch,
            "rule group must be a sequence",
            path,
        )
    })?;

    if entries.is_empty() {
        return Err(ParseError::new(
            ParseErrorKind::TypeMismatch,
            "rule group must declare attributes as its first element",
            path,
        ));
    }

    let attributes = parse_attributes(&entries[0], &format!("{}[0]", path))?;
    let (body, scenarios) = parse_entries(&entries[1..], path, 1, true)?;

    Ok(RuleGroup {
        attributes,
        scenarios,
        body,
    })
}

/// Attribute declaration: one name, a comma-separated name string, or a
/// sequence of names.
fn parse_attributes(value: &Value, path: &str) -> Result<Vec<String>, ParseError> {
    match value {
        Value::String(s) => {
            let names: Vec<String> = s
                .split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_string)
                .collect();
            if names.is_empty() {
                return Err(ParseError::new(
                    ParseErrorKind::TypeMismatch,
                    "attribute declaration is empty",
                    path,
                ));
            }
            Ok(names)
        }
        Value::Array(items) => {
            let mut names = Vec::with_capacity(items.len());
            for (i, item) in items.iter().enumerate() {
                match item {
                    Value::String(s) if !s.trim().is_empty() => names.push(s.trim().to_string()),
                    _ => {
                        return Err(ParseError::new(
                            ParseErrorKind::TypeMismatch,
                            "attribute name must be a non-empty string",
                            &format!("{}[{}]", path, i),
                        ));
                    }
                }
            }
            if names.is_empty() {
                return Err(ParseError::new(
                    ParseErrorKind::TypeMismatch,
                    "attribute declaration is empty",
                    path,
                ));
            }
            Ok(names)
        }
        _ => Err(ParseError::new(
            ParseErrorKind::TypeMismatch,
            "attribute declaration must be a string or a sequence of strings",
            path,
        )),
    }
}

/// Parse the directive entries of a group (or `when`) body.
///
/// `top` marks the group level, where `scenarios` is legal; inside `when`
/// bodies scenario gating has already happened and the key is rejected.
fn parse_entries(
    entries: &[Value],
    path: &str,
    offset: usize,
    top: bool,
) -> Result<(GroupBody, Option<Vec<String>>), ParseError> {
    let mut body = GroupBody::new();
    let mut scenarios: Option<Vec<String>> = None;

    for (i, entry) in entries.iter().enumerate() {
        let entry_path = format!("{}[{}]", path, i + offset);
        match entry {
            Value::String(name) => {
                if name.trim().is_empty() {
                    return Err(ParseError::new(
                        ParseErrorKind::TypeMismatch,
                        "directive name is empty",
                        &entry_path,
                    ));
                }
                body.directives.push(Directive::bare(name));
            }
            Value::Object(map) => {
                for (key, value) in map {
                    let key_path = format!("{}.{}", entry_path, key);
                    match key.as_str() {
                        KEY_SCENARIOS if top => {
                            scenarios = Some(parse_scenarios(value, &key_path)?);
                        }
                        KEY_SCENARIOS => {
                            return Err(ParseError::new(
                                ParseErrorKind::UnknownKey,
                                "'scenarios' is not allowed inside a 'when' block",
                                &key_path,
                            ));
                        }
                        KEY_PLACEHOLDERS => {
                            body.placeholders = value
                                .as_object()
                                .cloned()
                                .ok_or_else(|| {
                                    ParseError::new(
                                        ParseErrorKind::TypeMismatch,
                                        "placeholders must be a mapping",
                                        &key_path,
                                    )
                                })?;
                        }
                        KEY_MESSAGES => {
                            parse_messages(value, &key_path, &mut body)?;
                        }
                        GATE_NAME => {
                            body.directives.push(parse_gate(value, &key_path)?);
                        }
                        KEY_WHEN => {
                            let items = value.as_array().ok_or_else(|| {
                                ParseError::new(
                                    ParseErrorKind::TypeMismatch,
                                    "'when' must be a sequence of rule entries",
                                    &key_path,
                                )
                            })?;
                            let (when_body, _) = parse_entries(items, &key_path, 0, false)?;
                            body.when = Some(Box::new(when_body));
                        }
                        name => {
                            let args = value.as_array().cloned().ok_or_else(|| {
                                ParseError::new(
                                    ParseErrorKind::TypeMismatch,
                                    format!("arguments for '{}' must be a sequence", name),
                                    &key_path,
                                )
                            })?;
                            body.directives
                                .push(Directive::named(name, Args::List(args)));
                        }
                    }
                }
            }
            _ => {
                return Err(ParseError::new(
                    ParseErrorKind::TypeMismatch,
                    "rule entry must be a directive name or a mapping",
                    &entry_path,
                ));
            }
        }
    }

    Ok((body, scenarios))
}

/// Scenario restriction: a single name or a sequence of names.
fn parse_scenarios(value: &Value, path: &str) -> Result<Vec<String>, ParseError> {
    match value {
        Value::String(s) => Ok(vec![s.clone()]),
        Value::Array(items) => {
            let mut names = Vec::with_capacity(items.len());
            for (i, item) in items.iter().enumerate() {
                match item {
                    Value::String(s) => names.push(s.clone()),
                    _ => {
                        return Err(ParseError::new(
                            ParseErrorKind::TypeMismatch,
                            "scenario name must be a string",
                            &format!("{}[{}]", path, i),
                        ));
                    }
                }
            }
            Ok(names)
        }
        _ => Err(ParseError::new(
            ParseErrorKind::TypeMismatch,
            "scenarios must be a string or a sequence of strings",
            path,
        )),
    }
}

/// Keyed gate value: `true` or an integer selects the any-attribute form;
/// a string names the single gated attribute.
fn parse_gate(value: &Value, path: &str) -> Result<Directive, ParseError> {
    match value {
        Value::Bool(true) | Value::Number(_) => Ok(Directive::GatePositional),
        Value::String(attribute) => Ok(Directive::GateKeyed(attribute.clone())),
        _ => Err(ParseError::new(
            ParseErrorKind::TypeMismatch,
            "'one' must be true, an integer, or an attribute name",
            path,
        )),
    }
}

fn parse_messages(value: &Value, path: &str, body: &mut GroupBody) -> Result<(), ParseError> {
    let map = value.as_object().ok_or_else(|| {
        ParseError::new(
            ParseErrorKind::TypeMismatch,
            "messages must be a mapping of rule name to message",
            path,
        )
    })?;
    for (rule, message) in map {
        match message {
            Value::String(s) => {
                body.messages.insert(rule.clone(), s.clone());
            }
            _ => {
                return Err(ParseError::new(
                    ParseErrorKind::TypeMismatch,
                    "message must be a string",
                    &format!("{}.{}", path, rule),
                ));
            }
        }
    }
    Ok(())
}
