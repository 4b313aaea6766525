//! Active rule-group selection.
//!
//! Pure selection over the declared table: reads the rule set and the
//! scenario, never the data being validated.

use crate::types::{RuleGroup, RuleSet};

/// Filter the declared groups to those active for `scenario`, in
/// declaration order.
///
/// A group with no scenario restriction is active everywhere; one with a
/// restriction is active only when `scenario` is a member. When
/// `attribute_filter` is non-empty, a group is kept only if it declares at
/// least one filtered attribute — the caller narrows to the exact
/// intersection when it executes the group.
pub fn active_groups<'a>(
    rules: &'a RuleSet,
    scenario: &str,
    attribute_filter: Option<&[String]>,
) -> Vec<&'a RuleGroup> {
    rules
        .groups
        .iter()
        .filter(|group| group.applies_to(scenario))
        .filter(|group| match attribute_filter {
            None => true,
            Some(filter) if filter.is_empty() => true,
            Some(filter) => group
                .attributes
                .iter()
                .any(|a| filter.iter().any(|f| f == a)),
        })
        .collect()
}
