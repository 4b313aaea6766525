use rulegate::is_required;
use serde_json::json;

use super::common::model_from;

fn rules() -> rulegate::RuleSet {
    rulegate::parse_rules_str(
        "- [x, required]\n\
         - [y, required, {when: [email]}]\n\
         - [z, {when: [required]}]\n\
         - [w, required, {scenarios: admin}]\n\
         - [q, '!required']",
    )
    .expect("rules should parse")
}

#[test]
fn bare_required_without_when_marks_required() {
    assert!(is_required(&rules(), "", "x"));
}

#[test]
fn required_in_a_group_with_when_does_not_count() {
    assert!(!is_required(&rules(), "", "y"));
}

#[test]
fn required_only_inside_a_when_body_does_not_count() {
    assert!(!is_required(&rules(), "", "z"));
}

#[test]
fn scenario_restriction_applies() {
    assert!(!is_required(&rules(), "", "w"));
    assert!(is_required(&rules(), "admin", "w"));
}

#[test]
fn sanitize_only_required_does_not_count() {
    assert!(!is_required(&rules(), "", "q"));
}

#[test]
fn unknown_attribute_is_not_required() {
    assert!(!is_required(&rules(), "", "missing"));
}

#[test]
fn model_surface_delegates_to_the_introspector() {
    let mut model = model_from("- [w, required, {scenarios: admin}]", json!({}));
    assert!(!model.is_attribute_required("w"));
    model.set_scenario("admin");
    assert!(model.is_attribute_required("w"));
}
