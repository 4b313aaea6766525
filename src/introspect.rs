//! Static required-ness inspection of a rule table.

use crate::scenario::active_groups;
use crate::types::{Directive, RuleSet};

/// Is the attribute unconditionally required under the given scenario?
///
/// True only when some active group covers the attribute, carries a bare
/// `required` directive, and has no `when` clause — a group gated by a
/// runtime condition can never prove required-ness statically. `!required`
/// does not count: its validator half is disabled.
///
/// This is a best-effort signal for UI and form building, not a
/// validation guarantee.
pub fn is_required(rules: &RuleSet, scenario: &str, attribute: &str) -> bool {
    active_groups(rules, scenario, None).iter().any(|group| {
        group.attributes.iter().any(|a| a == attribute)
            && group.body.when.is_none()
            && group.body.directives.iter().any(|directive| {
                matches!(
                    directive,
                    Directive::Bare {
                        name,
                        sanitize_only: false,
                    } if name == crate::types::REQUIRED_NAME
                )
            })
    })
}
