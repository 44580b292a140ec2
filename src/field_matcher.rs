//! Field matching and the conditional filter.
//!
//! [`matches_field`] decides whether a [`FieldRule`] applies to a data field
//! by tag and indicators. [`ConditionState`] carries the tri-state result of a
//! mapping's conditional filter across the subfields of one field occurrence.
//!
//! # Examples
//!
//! ```
//! use marcmap::field_matcher::matches_field;
//! use marcmap::rules::{FieldRule, IndicatorPattern};
//! use marcmap::Field;
//!
//! let rule = FieldRule::new("700").ind1(IndicatorPattern::Exact('1')).expansion_codes(&['a']);
//! let field = Field::builder("700".to_string(), '1', ' ').subfield_str('a', "Name").build();
//! assert!(matches_field(&rule, &field));
//! ```

use crate::record::Field;
use crate::rules::{Condition, FieldRule, FieldSelector, IndicatorPattern};

/// Returns `true` if the rule's tag and indicator patterns accept the field.
#[must_use]
pub fn matches_field(rule: &FieldRule, field: &Field) -> bool {
    matches_tag_and_indicators(&rule.main_tag, rule.ind1, rule.ind2, field)
}

/// Returns `true` if the selector accepts the field.
#[must_use]
pub fn matches_selector(selector: &FieldSelector, field: &Field) -> bool {
    matches_tag_and_indicators(&selector.main_tag, selector.ind1, selector.ind2, field)
}

fn matches_tag_and_indicators(
    tag: &str,
    ind1: IndicatorPattern,
    ind2: IndicatorPattern,
    field: &Field,
) -> bool {
    field.tag == tag && ind1.matches(field.indicator1) && ind2.matches(field.indicator2)
}

/// Conditional filter state for one field occurrence.
///
/// `None` means no evidence yet, `Some(false)` evidence against and
/// `Some(true)` evidence for. Once true, the state stays true for the rest of
/// the occurrence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConditionState {
    matches: Option<bool>,
}

impl ConditionState {
    /// Fresh state with no evidence.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current tri-state value.
    #[must_use]
    pub fn value(self) -> Option<bool> {
        self.matches
    }

    /// Record the outcome of checking one condition-bearing subfield.
    #[must_use]
    pub fn observe(self, satisfied: bool) -> Self {
        let matches = match (self.matches, satisfied) {
            (_, true) => Some(true),
            (None, false) => Some(false),
            (current, false) => current,
        };
        Self { matches }
    }

    /// Close the occurrence.
    ///
    /// A configured condition that never saw its subfield rejects the
    /// occurrence, except for the blank sentinel, which a missing subfield
    /// satisfies.
    #[must_use]
    pub fn finish(self, condition: Option<&Condition>) -> Self {
        match (condition, self.matches) {
            (Some(condition), None) if !condition.is_empty_sentinel() => Self {
                matches: Some(false),
            },
            _ => self,
        }
    }

    /// Whether the occurrence is accepted.
    #[must_use]
    pub fn accepted(self) -> bool {
        self.matches != Some(false)
    }
}

/// Check a subfield against a mapping's condition.
///
/// Returns `None` when the subfield does not carry the condition code.
#[must_use]
pub fn check_condition(condition: &Condition, code: char, value: &str) -> Option<bool> {
    (condition.code == code).then(|| condition.pattern.is_satisfied_by(value))
}
