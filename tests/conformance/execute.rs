use super::common::{model_from, run};
use rulegate::{
    CheckError, ConfigErrorKind, Model, Registry, RuleContext, RuleGroup, RuleSet, SanitizeRule,
    ValidateRule,
};
use serde_json::{Value, json};
use std::sync::Arc;

// ─── Sanitize before validate interplay ─────────────────────────────────────

#[test]
fn trim_then_required_fails_on_blank_input() {
    let (ok, model) = run("- [a, trim, required]", json!({"a": "  "}));
    assert!(!ok);
    assert_eq!(model.get("a"), Some(&json!("")));
    assert_eq!(model.errors_for("a").len(), 1);
}

#[test]
fn validator_failure_suppresses_later_sanitizer_in_same_group() {
    let (ok, model) = run("- [s, {length: [5, null]}, lowercase]", json!({"s": "ABC"}));
    assert!(!ok);
    // length failed, so lowercase must not have touched the value
    assert_eq!(model.get("s"), Some(&json!("ABC")));
}

#[test]
fn sanitizer_runs_when_validators_pass() {
    let (ok, model) = run("- [s, {length: [3, null]}, lowercase]", json!({"s": "HELLO"}));
    assert!(ok);
    assert_eq!(model.get("s"), Some(&json!("hello")));
}

#[test]
fn sanitizer_does_not_materialize_absent_attributes() {
    let (ok, model) = run("- [s, trim]", json!({}));
    assert!(ok);
    assert_eq!(model.get("s"), None);
}

// ─── The `one` gate ─────────────────────────────────────────────────────────

#[test]
fn gate_reports_exactly_one_error_and_aborts() {
    let (ok, model) = run("- [[x, y, z], required, one]", json!({"y": "present"}));
    assert!(!ok);
    assert_eq!(model.errors_for("x").len(), 1);
    assert!(model.errors_for("y").is_empty());
    assert!(model.errors_for("z").is_empty());
}

#[test]
fn keyed_gate_only_trips_on_its_attribute() {
    let (ok, model) = run("- [[x, y], required, {one: y}]", json!({}));
    assert!(!ok);
    // x's failure does not trip the gate; y's does, after both recorded
    assert_eq!(model.errors_for("x").len(), 1);
    assert_eq!(model.errors_for("y").len(), 1);
}

#[test]
fn gated_group_stops_processing_of_later_groups() {
    let (ok, model) = run("- [x, required, one]\n- [y, required]", json!({}));
    assert!(!ok);
    assert_eq!(model.errors_for("x").len(), 1);
    assert!(
        model.errors_for("y").is_empty(),
        "groups after a tripped gate must not run"
    );
}

#[test]
fn gate_without_errors_lets_the_pass_continue() {
    let (ok, model) = run("- [x, required, one]\n- [y, required]", json!({"x": "v"}));
    assert!(!ok);
    assert!(model.errors_for("x").is_empty());
    assert_eq!(model.errors_for("y").len(), 1);
}

// ─── `when` sub-bodies ──────────────────────────────────────────────────────

#[test]
fn when_runs_only_for_its_own_clean_group() {
    // Group 1 errors; group 2 stays clean, so group 2's `when` must run
    // regardless of group 1's failure.
    let rules = "- [a, required, customValidate]\n- [b, {when: [required]}]";
    let mut model = model_from(rules, json!({"a": "ok"}));
    model.add_handler("customValidate", |field, _args| {
        field.add_error("rejected by inline rule");
    });

    let ok = model.validate(None).expect("rules should be well-formed");
    assert!(!ok);
    assert_eq!(model.errors_for("a"), ["rejected by inline rule"]);
    assert_eq!(
        model.errors_for("b").len(),
        1,
        "the clean group's when body must have run"
    );
}

#[test]
fn when_is_skipped_when_its_group_errored() {
    let (_, model) = run("- [a, required, {when: [required]}]", json!({}));
    // only the primary required error; the when body never ran
    assert_eq!(model.errors_for("a").len(), 1);
}

#[test]
fn nested_when_requires_outer_when_to_stay_clean() {
    let rules = "- [a, required, {when: [{length: [5, null]}, {when: [email]}]}]";
    let (ok, model) = run(rules, json!({"a": "hi"}));
    assert!(!ok);
    // required passed; the outer when's length failed; the inner when
    // (email would also fail on "hi") must have been skipped.
    assert_eq!(model.errors_for("a").len(), 1);
}

#[test]
fn nested_when_runs_when_everything_above_is_clean() {
    let rules = "- [a, required, {when: [{length: [2, null]}, {when: [email]}]}]";
    let (ok, model) = run(rules, json!({"a": "hi"}));
    assert!(!ok);
    // required and length passed; the inner email check fired.
    assert_eq!(model.errors_for("a").len(), 1);
}

// ─── Dispatch ───────────────────────────────────────────────────────────────

#[test]
fn unknown_directive_is_a_configuration_error_not_a_validation_failure() {
    let mut model = model_from("- [a, nosuchrule]", json!({"a": "x"}));
    let err = model.validate(None).expect_err("should abort");
    assert_eq!(err.kind, ConfigErrorKind::UnknownRule);
    assert_eq!(err.rule, "nosuchrule");
    assert!(!model.has_errors());
}

#[test]
fn model_handler_shadows_registry_rule_of_same_name() {
    let mut model = model_from("- [a, required]", json!({}));
    model.add_handler("required", |field, _args| {
        field.set_value(json!("filled in by handler"));
    });

    let ok = model.validate(None).expect("rules should be well-formed");
    assert!(ok, "handler dispatch must win over the builtin validator");
    assert_eq!(model.get("a"), Some(&json!("filled in by handler")));
}

#[test]
fn closure_directive_mutates_the_model_directly() {
    let rules = RuleSet::new().with(RuleGroup::new(["a"]).closure(
        "double",
        Arc::new(|field, _args| {
            let current = field.value().cloned();
            if let Some(Value::String(s)) = current {
                field.set_value(json!(format!("{0}{0}", s)));
            }
        }),
    ));
    let mut model = Model::from_values(
        rules,
        Arc::new(Registry::with_builtins()),
        json!({"a": "ab"}).as_object().cloned().expect("object"),
    );

    let ok = model.validate(None).expect("rules should be well-formed");
    assert!(ok);
    assert_eq!(model.get("a"), Some(&json!("abab")));
}

#[test]
fn handler_receives_declared_arguments() {
    let mut model = model_from("- [n, {atLeast: [10]}]", json!({"n": 3}));
    model.add_handler("atLeast", |field, args| {
        let floor = args[0].as_i64().unwrap_or(0);
        if field.value().and_then(Value::as_i64).unwrap_or(0) < floor {
            field.add_error(format!("must be at least {}", floor));
        }
    });

    let ok = model.validate(None).expect("rules should be well-formed");
    assert!(!ok);
    assert_eq!(model.errors_for("n"), ["must be at least 10"]);
}

// ─── Thunk arguments ────────────────────────────────────────────────────────

#[test]
fn thunk_arguments_resolve_against_current_values() {
    let rules = RuleSet::new().with(RuleGroup::new(["code"]).rule_thunk("in", |values| {
        values.get("allowed").cloned().unwrap_or(json!([]))
    }));
    let mut model = Model::from_values(
        rules,
        Arc::new(Registry::with_builtins()),
        json!({"code": "a", "allowed": ["a", "b"]})
            .as_object()
            .cloned()
            .expect("object"),
    );

    assert!(model.validate(None).expect("rules should be well-formed"));

    model.set("code", json!("z"));
    assert!(!model.validate(None).expect("rules should be well-formed"));
}

#[test]
fn thunk_resolving_to_non_sequence_is_a_configuration_error() {
    let rules = RuleSet::new().with(RuleGroup::new(["a"]).rule_thunk("length", |_| json!("nope")));
    let mut model = Model::from_values(
        rules,
        Arc::new(Registry::with_builtins()),
        json!({"a": "x"}).as_object().cloned().expect("object"),
    );

    let err = model.validate(None).expect_err("should abort");
    assert_eq!(err.kind, ConfigErrorKind::BadArguments);
    assert_eq!(err.rule, "length");
}

// ─── Sanitize-only marker ───────────────────────────────────────────────────

/// A rule registered on both sides, for marker tests: validates that the
/// value is lowercase, sanitizes by lowercasing.
struct LowercaseBoth;

impl ValidateRule for LowercaseBoth {
    fn check(&self, value: Option<&Value>, ctx: &RuleContext<'_>) -> Result<(), CheckError> {
        match value {
            Some(Value::String(s)) if s.chars().any(|c| c.is_uppercase()) => {
                Err(CheckError::Invalid(ctx.message("{{name}} must be lowercase.")))
            }
            _ => Ok(()),
        }
    }
}

impl SanitizeRule for LowercaseBoth {
    fn apply(&self, value: Value, _ctx: &RuleContext<'_>) -> Value {
        match value {
            Value::String(s) => Value::String(s.to_lowercase()),
            other => other,
        }
    }
}

fn registry_with_lc() -> Arc<Registry> {
    let mut registry = Registry::with_builtins();
    registry.add_validator("lc", LowercaseBoth);
    registry.add_sanitizer("lc", LowercaseBoth);
    Arc::new(registry)
}

#[test]
fn dual_rule_validates_then_never_sanitizes_after_failure() {
    let rules = rulegate::parse_rules_str("- [a, lc]").expect("rules should parse");
    let mut model = Model::from_values(
        rules,
        registry_with_lc(),
        json!({"a": "ABC"}).as_object().cloned().expect("object"),
    );

    let ok = model.validate(None).expect("rules should be well-formed");
    assert!(!ok);
    // validation ran first and failed, so the sanitizer was suppressed
    assert_eq!(model.get("a"), Some(&json!("ABC")));
}

#[test]
fn marker_skips_the_validator_half() {
    let rules = rulegate::parse_rules_str("- [a, '!lc']").expect("rules should parse");
    let mut model = Model::from_values(
        rules,
        registry_with_lc(),
        json!({"a": "ABC"}).as_object().cloned().expect("object"),
    );

    let ok = model.validate(None).expect("rules should be well-formed");
    assert!(ok);
    assert_eq!(model.get("a"), Some(&json!("abc")));
}

#[test]
fn gate_is_never_tripped_by_sanitize_only_directives() {
    let rules = rulegate::parse_rules_str("- [a, one, '!lc']").expect("rules should parse");
    let mut model = Model::from_values(
        rules,
        registry_with_lc(),
        json!({"a": "ABC"}).as_object().cloned().expect("object"),
    );

    let ok = model.validate(None).expect("rules should be well-formed");
    assert!(ok, "sanitizers add no errors, so the gate cannot trip");
    assert_eq!(model.get("a"), Some(&json!("abc")));
}
