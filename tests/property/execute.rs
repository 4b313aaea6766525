use proptest::prelude::*;
use rulegate::{Model, Registry, RuleSet};
use serde_json::{Value, json};
use std::sync::Arc;

fn model_for(rules: &str, value: &str) -> Model {
    let rules: RuleSet = rulegate::parse_rules_str(rules).expect("rules should parse");
    let values = json!({ "a": value }).as_object().cloned().expect("object");
    Model::from_values(rules, Arc::new(Registry::with_builtins()), values)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    // required agrees with "trimmed input is non-empty".
    #[test]
    fn required_matches_trimmed_emptiness(value in "[a-z ]{0,12}") {
        let mut model = model_for("- [a, required]", &value);
        let ok = model.validate(None).expect("well-formed rules");
        prop_assert_eq!(ok, !value.trim().is_empty());
    }

    // trim through the engine agrees with str::trim, and is idempotent
    // across repeated passes.
    #[test]
    fn trim_matches_std_and_is_idempotent(value in "[ a-z!?]{0,16}") {
        let mut model = model_for("- [a, trim]", &value);

        model.validate(None).expect("well-formed rules");
        prop_assert_eq!(model.get("a"), Some(&Value::String(value.trim().to_string())));

        model.validate(None).expect("well-formed rules");
        prop_assert_eq!(model.get("a"), Some(&Value::String(value.trim().to_string())));
    }

    // Two passes over unchanged input produce identical error stores.
    #[test]
    fn validation_is_deterministic(value in "[a-z@. ]{0,12}") {
        let mut model = model_for("- [a, trim, required]\n- [a, email]", &value);

        model.validate(None).expect("well-formed rules");
        let first = model.errors().clone();
        model.validate(None).expect("well-formed rules");
        prop_assert_eq!(&first, model.errors());
    }

    // Without a gate, groups are independent: errors are the union of
    // what each group records on its own.
    #[test]
    fn ungated_groups_accumulate_independently(
        a in "[a-z]{0,6}",
        b in "[a-z]{0,6}",
    ) {
        let rules = "- [a, required]\n- [b, required]";
        let rules: RuleSet = rulegate::parse_rules_str(rules).expect("rules should parse");
        let values = json!({ "a": a, "b": b }).as_object().cloned().expect("object");
        let mut model = Model::from_values(rules, Arc::new(Registry::with_builtins()), values);

        model.validate(None).expect("well-formed rules");
        prop_assert_eq!(model.has_errors_for("a"), a.is_empty());
        prop_assert_eq!(model.has_errors_for("b"), b.is_empty());
    }
}
