//! The compiled rule-table model.
//!
//! A declared rule table is a heterogeneous sequence (see [`crate::parse`]);
//! this module is its explicit, typed form. Parsing happens once — execution
//! walks these variants and never re-interprets raw shapes.

use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::model::Handler;

/// Sentinel prefix marking a directive as sanitize-only: the validator half
/// of the named rule is skipped even when one is registered.
pub const SANITIZE_ONLY_MARKER: char = '!';

/// The gate directive name. Declared bare (`one`) or keyed (`one: attr`).
pub const GATE_NAME: &str = "one";

/// The literal directive name the required-ness introspector looks for.
pub(crate) const REQUIRED_NAME: &str = "required";

// Reserved keys. Captured into dedicated fields by the parser; never
// dispatched as directives.
pub(crate) const KEY_SCENARIOS: &str = "scenarios";
pub(crate) const KEY_PLACEHOLDERS: &str = "placeholders";
pub(crate) const KEY_MESSAGES: &str = "messages";
pub(crate) const KEY_WHEN: &str = "when";

/// A thunk producing the argument list for a directive at execution time.
///
/// Invoked with the model's current attribute map; must return a sequence.
pub type ArgThunk = Arc<dyn Fn(&Map<String, Value>) -> Value + Send + Sync>;

/// Arguments of a keyed directive: a literal list, or a thunk resolved
/// against the model when the directive runs.
#[derive(Clone)]
pub enum Args {
    List(Vec<Value>),
    Thunk(ArgThunk),
}

impl Args {
    pub fn empty() -> Self {
        Args::List(Vec::new())
    }

    pub fn list(args: impl IntoIterator<Item = Value>) -> Self {
        Args::List(args.into_iter().collect())
    }

    pub fn thunk<F>(f: F) -> Self
    where
        F: Fn(&Map<String, Value>) -> Value + Send + Sync + 'static,
    {
        Args::Thunk(Arc::new(f))
    }
}

impl fmt::Debug for Args {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Args::List(list) => f.debug_tuple("List").field(list).finish(),
            Args::Thunk(_) => f.write_str("Thunk(..)"),
        }
    }
}

/// One executable entry of a rule group, in declaration order.
#[derive(Clone)]
pub enum Directive {
    /// Positional directive: a rule name with no declared arguments.
    Bare { name: String, sanitize_only: bool },
    /// Keyed directive: a rule name with an argument list (or thunk).
    Named {
        name: String,
        args: Args,
        sanitize_only: bool,
    },
    /// Anonymous callable attached through the builder API. Invoked with a
    /// mutable view of the model, focused on the current attribute.
    Closure {
        /// Diagnostic label; not used for dispatch.
        name: String,
        handler: Handler,
        args: Vec<Value>,
    },
    /// Bare `one`: trip the gate on any covered attribute's failure.
    GatePositional,
    /// Keyed `one: attr`: trip the gate only on that attribute's failure.
    GateKeyed(String),
}

impl Directive {
    /// Build a positional directive from a declared name, folding the
    /// gate name and the sanitize-only marker into their variants.
    pub fn bare(name: &str) -> Directive {
        if name == GATE_NAME {
            return Directive::GatePositional;
        }
        let (name, sanitize_only) = split_marker(name);
        Directive::Bare {
            name: name.to_string(),
            sanitize_only,
        }
    }

    /// Build a keyed directive from a declared name and arguments.
    pub fn named(name: &str, args: Args) -> Directive {
        let (name, sanitize_only) = split_marker(name);
        Directive::Named {
            name: name.to_string(),
            args,
            sanitize_only,
        }
    }
}

impl fmt::Debug for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Directive::Bare {
                name,
                sanitize_only,
            } => f
                .debug_struct("Bare")
                .field("name", name)
                .field("sanitize_only", sanitize_only)
                .finish(),
            Directive::Named {
                name,
                args,
                sanitize_only,
            } => f
                .debug_struct("Named")
                .field("name", name)
                .field("args", args)
                .field("sanitize_only", sanitize_only)
                .finish(),
            Directive::Closure { name, args, .. } => f
                .debug_struct("Closure")
                .field("name", name)
                .field("args", args)
                .finish_non_exhaustive(),
            Directive::GatePositional => f.write_str("GatePositional"),
            Directive::GateKeyed(attr) => f.debug_tuple("GateKeyed").field(attr).finish(),
        }
    }
}

/// Split the sanitize-only marker off a declared directive name.
pub(crate) fn split_marker(name: &str) -> (&str, bool) {
    match name.strip_prefix(SANITIZE_ONLY_MARKER) {
        Some(rest) => (rest, true),
        None => (name, false),
    }
}

/// Gate state captured from `one` directives during group execution.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Gate {
    /// Any covered attribute's failure aborts the group.
    Any,
    /// Only the named attribute's failure aborts the group.
    Attr(String),
}

/// The executable body of a rule group: ordered directives plus the
/// per-group message/placeholder maps and an optional nested `when` body.
///
/// `when` bodies carry the full structure recursively — they may declare
/// their own gates, messages, and further `when` nesting.
#[derive(Clone, Debug, Default)]
pub struct GroupBody {
    pub directives: Vec<Directive>,
    /// Overrides for `{{placeholder}}` interpolation in error messages.
    pub placeholders: Map<String, Value>,
    /// Custom error message per directive name.
    pub messages: HashMap<String, String>,
    /// Conditional chained body: runs only if this body recorded nothing.
    pub when: Option<Box<GroupBody>>,
}

impl GroupBody {
    pub fn new() -> Self {
        GroupBody::default()
    }

    /// Append a positional directive (`"trim"`, `"required"`, `"!lowercase"`).
    pub fn rule(mut self, name: &str) -> Self {
        self.directives.push(Directive::bare(name));
        self
    }

    /// Append a keyed directive with a literal argument list.
    pub fn rule_with(mut self, name: &str, args: impl IntoIterator<Item = Value>) -> Self {
        self.directives.push(Directive::named(name, Args::list(args)));
        self
    }

    /// Append a keyed directive whose arguments are produced at execution
    /// time by a thunk over the model's attribute map.
    pub fn rule_thunk<F>(mut self, name: &str, thunk: F) -> Self
    where
        F: Fn(&Map<String, Value>) -> Value + Send + Sync + 'static,
    {
        self.directives.push(Directive::named(name, Args::thunk(thunk)));
        self
    }

    /// Append an anonymous callable directive.
    pub fn closure(mut self, name: &str, handler: Handler) -> Self {
        self.directives.push(Directive::Closure {
            name: name.to_string(),
            handler,
            args: Vec::new(),
        });
        self
    }

    /// Declare the gate: abort the group as soon as any covered attribute
    /// records an error.
    pub fn gate(mut self) -> Self {
        self.directives.push(Directive::GatePositional);
        self
    }

    /// Declare a keyed gate: abort only when the named attribute fails.
    pub fn gate_attr(mut self, attribute: &str) -> Self {
        self.directives.push(Directive::GateKeyed(attribute.to_string()));
        self
    }

    pub fn placeholder(mut self, name: &str, value: Value) -> Self {
        self.placeholders.insert(name.to_string(), value);
        self
    }

    pub fn message(mut self, rule: &str, message: &str) -> Self {
        self.messages.insert(rule.to_string(), message.to_string());
        self
    }

    /// Attach a conditional body that runs only if this one stays clean.
    pub fn when(mut self, body: GroupBody) -> Self {
        self.when = Some(Box::new(body));
        self
    }
}

/// One declared rule group: a set of covered attributes, an optional
/// scenario restriction, and the executable body.
#[derive(Clone, Debug)]
pub struct RuleGroup {
    pub attributes: Vec<String>,
    /// `None` means the group applies under every scenario.
    pub scenarios: Option<Vec<String>>,
    pub body: GroupBody,
}

impl RuleGroup {
    pub fn new<S: Into<String>>(attributes: impl IntoIterator<Item = S>) -> Self {
        RuleGroup {
            attributes: attributes.into_iter().map(Into::into).collect(),
            scenarios: None,
            body: GroupBody::new(),
        }
    }

    /// True if this group is active under the given scenario.
    pub fn applies_to(&self, scenario: &str) -> bool {
        match &self.scenarios {
            None => true,
            Some(list) => list.iter().any(|s| s == scenario),
        }
    }

    /// Restrict this group to the given scenarios.
    pub fn on<S: Into<String>>(mut self, scenarios: impl IntoIterator<Item = S>) -> Self {
        self.scenarios = Some(scenarios.into_iter().map(Into::into).collect());
        self
    }

    pub fn rule(mut self, name: &str) -> Self {
        self.body = self.body.rule(name);
        self
    }

    pub fn rule_with(mut self, name: &str, args: impl IntoIterator<Item = Value>) -> Self {
        self.body = self.body.rule_with(name, args);
        self
    }

    pub fn rule_thunk<F>(mut self, name: &str, thunk: F) -> Self
    where
        F: Fn(&Map<String, Value>) -> Value + Send + Sync + 'static,
    {
        self.body = self.body.rule_thunk(name, thunk);
        self
    }

    pub fn closure(mut self, name: &str, handler: Handler) -> Self {
        self.body = self.body.closure(name, handler);
        self
    }

    pub fn gate(mut self) -> Self {
        self.body = self.body.gate();
        self
    }

    pub fn gate_attr(mut self, attribute: &str) -> Self {
        self.body = self.body.gate_attr(attribute);
        self
    }

    pub fn placeholder(mut self, name: &str, value: Value) -> Self {
        self.body = self.body.placeholder(name, value);
        self
    }

    pub fn message(mut self, rule: &str, message: &str) -> Self {
        self.body = self.body.message(rule, message);
        self
    }

    pub fn when(mut self, body: GroupBody) -> Self {
        self.body = self.body.when(body);
        self
    }
}

/// An ordered rule table: groups execute in declaration order.
#[derive(Clone, Debug, Default)]
pub struct RuleSet {
    pub groups: Vec<RuleGroup>,
}

impl RuleSet {
    pub fn new() -> Self {
        RuleSet::default()
    }

    pub fn push(&mut self, group: RuleGroup) {
        self.groups.push(group);
    }

    pub fn with(mut self, group: RuleGroup) -> Self {
        self.groups.push(group);
        self
    }

    /// Every attribute any group declares, first-seen order, deduplicated.
    pub fn declared_attributes(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for group in &self.groups {
            for attr in &group.attributes {
                if !out.iter().any(|a| a == attr) {
                    out.push(attr.clone());
                }
            }
        }
        out
    }
}

impl FromIterator<RuleGroup> for RuleSet {
    fn from_iter<T: IntoIterator<Item = RuleGroup>>(iter: T) -> Self {
        RuleSet {
            groups: iter.into_iter().collect(),
        }
    }
}
