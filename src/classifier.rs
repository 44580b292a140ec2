//! Structural classification of records.
//!
//! A record's structural type is chosen from positional codes: leader
//! positions 6, 7 and 19, control field 007 positions 0 and 1, and control
//! field 008 position 21. Rules are tried in configured order and the first
//! rule whose configured positions all hold wins.

use crate::leader::{Leader, BIBLIOGRAPHIC_LEVEL, MULTIPART_LEVEL, RECORD_TYPE};
use crate::rules::ClassificationRule;
use indexmap::IndexMap;

/// The positional codes classification looks at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PositionalCodes {
    /// Leader position 6
    pub leader6: Option<char>,
    /// Leader position 7
    pub leader7: Option<char>,
    /// Leader position 19
    pub leader19: Option<char>,
    /// Control field 007 position 0
    pub field007_0: Option<char>,
    /// Control field 007 position 1
    pub field007_1: Option<char>,
    /// Control field 008 position 21
    pub field008_21: Option<char>,
}

impl PositionalCodes {
    /// Read the codes from a leader and control fields.
    ///
    /// Positions past the end of the leader or a control field, and
    /// positions of absent control fields, are `None`.
    #[must_use]
    pub fn read(leader: &Leader, control_fields: &IndexMap<String, String>) -> Self {
        let control_char = |tag: &str, position: usize| {
            control_fields
                .get(tag)
                .and_then(|value| value.chars().nth(position))
        };

        PositionalCodes {
            leader6: leader.char_at(RECORD_TYPE),
            leader7: leader.char_at(BIBLIOGRAPHIC_LEVEL),
            leader19: leader.char_at(MULTIPART_LEVEL),
            field007_0: control_char("007", 0),
            field007_1: control_char("007", 1),
            field008_21: control_char("008", 21),
        }
    }

    /// Returns `true` if every configured expectation of the rule holds.
    #[must_use]
    pub fn satisfy(&self, rule: &ClassificationRule) -> bool {
        let holds = |expected: Option<char>, actual: Option<char>| {
            expected.map_or(true, |expected| actual == Some(expected))
        };

        holds(rule.leader6, self.leader6)
            && holds(rule.leader7, self.leader7)
            && holds(rule.leader19, self.leader19)
            && holds(rule.field007_0, self.field007_0)
            && holds(rule.field007_1, self.field007_1)
            && holds(rule.field008_21, self.field008_21)
    }
}

/// Pick the structural type for a record.
///
/// A single configured rule is returned without checking its expectations.
///
/// # Examples
///
/// ```
/// use indexmap::IndexMap;
/// use marcmap::classifier::classify;
/// use marcmap::rules::ClassificationRule;
/// use marcmap::Leader;
///
/// let rules = vec![
///     ClassificationRule::new("Periodical").leader7('s'),
///     ClassificationRule::new("Monograph").leader6('a').leader7('m'),
/// ];
/// let leader = Leader::new("00000nam a2200000 c 4500");
/// assert_eq!(classify(&leader, &IndexMap::new(), &rules), Some("Monograph"));
/// ```
#[must_use]
pub fn classify<'a>(
    leader: &Leader,
    control_fields: &IndexMap<String, String>,
    rules: &'a [ClassificationRule],
) -> Option<&'a str> {
    if let [only] = rules {
        return Some(only.type_name.as_str());
    }

    let codes = PositionalCodes::read(leader, control_fields);
    rules
        .iter()
        .find(|rule| codes.satisfy(rule))
        .map(|rule| rule.type_name.as_str())
}
