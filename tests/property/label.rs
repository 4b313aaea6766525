use proptest::prelude::*;
use rulegate::generate_label;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    // Labeling an already-generated label changes nothing.
    #[test]
    fn generation_is_idempotent(name in "[a-zA-Z0-9_]{0,16}") {
        let label = generate_label(&name);
        prop_assert_eq!(generate_label(&label), label);
    }

    // Every word of a label starts uppercase with a lowercase tail.
    #[test]
    fn words_are_capitalized(name in "[a-z_]{1,16}") {
        let label = generate_label(&name);
        for word in label.split_whitespace() {
            let mut chars = word.chars();
            let first = chars.next().expect("split_whitespace yields non-empty words");
            prop_assert!(first.is_uppercase() || first.is_ascii_digit());
            prop_assert!(chars.all(|c| !c.is_uppercase()));
        }
    }

    // Separators never leak into the label.
    #[test]
    fn no_separators_in_output(name in "[a-z_.-]{0,16}") {
        let label = generate_label(&name);
        prop_assert!(!label.contains(['_', '.', '-']));
        prop_assert!(!label.starts_with(' '));
        prop_assert!(!label.ends_with(' '));
    }
}

#[test]
fn representative_names() {
    assert_eq!(generate_label("first_name"), "First Name");
    assert_eq!(generate_label("firstName"), "First Name");
    assert_eq!(generate_label("address1Line"), "Address1 Line");
    assert_eq!(generate_label("email"), "Email");
    assert_eq!(generate_label(""), "");
}
