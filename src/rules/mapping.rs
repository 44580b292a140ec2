//! Field rules and entity mappings.
//!
//! An [`EntityMapping`] describes how one output entity kind (a metadata
//! value, a person or a corporate body) is extracted from a record. It holds
//! one or more [`FieldRule`]s selecting data fields by tag and indicators and
//! naming which subfield codes fill which role.
//!
//! Mappings are built through [`EntityMappingBuilder`], which compiles every
//! pattern and replacement rule up front and rejects incomplete rules.
//!
//! # Examples
//!
//! ```
//! use marcmap::rules::{EntityKind, EntityMapping, FieldRule, IndicatorPattern};
//!
//! let author = EntityMapping::builder(EntityKind::Person, "Author")
//!     .field_rule(
//!         FieldRule::new("700")
//!             .ind1(IndicatorPattern::Exact('1'))
//!             .expansion_codes(&['a']),
//!     )
//!     .identifier_field('0')
//!     .identifier_replacement(r"s/\(DE-588\)//")
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(author.type_name, "Author");
//! ```

use crate::error::{MarcError, Result};
use crate::replacement::{MatchPattern, Replacement};
use std::fmt;

/// Indicator pattern value that matches every indicator.
pub const ANY_INDICATOR: &str = "any";
/// Condition pattern sentinel meaning "the condition subfield must be blank".
pub const EMPTY_CONDITION: &str = "/empty/";
/// Separator used when a mapping does not configure one.
pub const DEFAULT_SEPARATOR: &str = "; ";

/// Expected value of one indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IndicatorPattern {
    /// Matches every indicator value
    #[default]
    Any,
    /// Matches a blank indicator
    Blank,
    /// Matches exactly this character
    Exact(char),
}

impl IndicatorPattern {
    /// Parse a configured indicator pattern.
    ///
    /// `"any"` is the wildcard; a blank value expects a blank indicator; any
    /// other value must be a single character once trimmed.
    ///
    /// # Errors
    ///
    /// Returns the offending value if it is longer than one character.
    pub fn parse(raw: &str) -> std::result::Result<Self, String> {
        if raw == ANY_INDICATOR {
            return Ok(IndicatorPattern::Any);
        }
        let trimmed = raw.trim();
        let mut chars = trimmed.chars();
        match (chars.next(), chars.next()) {
            (None, _) => Ok(IndicatorPattern::Blank),
            (Some(c), None) => Ok(IndicatorPattern::Exact(c)),
            _ => Err(format!(
                "indicator pattern must be '{ANY_INDICATOR}' or a single character, got '{raw}'"
            )),
        }
    }

    /// Check an indicator value against this pattern.
    ///
    /// Indicator values are compared trimmed, so a space indicator only
    /// satisfies [`IndicatorPattern::Blank`].
    #[must_use]
    pub fn matches(self, indicator: char) -> bool {
        match self {
            IndicatorPattern::Any => true,
            IndicatorPattern::Blank => indicator.is_whitespace(),
            IndicatorPattern::Exact(expected) => !indicator.is_whitespace() && indicator == expected,
        }
    }
}

/// Selects data fields by tag and indicators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSelector {
    /// Tag a field must carry exactly
    pub main_tag: String,
    /// First indicator pattern
    pub ind1: IndicatorPattern,
    /// Second indicator pattern
    pub ind2: IndicatorPattern,
}

impl FieldSelector {
    /// Selector for a tag with wildcard indicators.
    #[must_use]
    pub fn new(main_tag: impl Into<String>) -> Self {
        FieldSelector {
            main_tag: main_tag.into(),
            ind1: IndicatorPattern::Any,
            ind2: IndicatorPattern::Any,
        }
    }

    /// Restrict the first indicator.
    #[must_use]
    pub fn ind1(mut self, pattern: IndicatorPattern) -> Self {
        self.ind1 = pattern;
        self
    }

    /// Restrict the second indicator.
    #[must_use]
    pub fn ind2(mut self, pattern: IndicatorPattern) -> Self {
        self.ind2 = pattern;
        self
    }
}

/// One field-level rule of a mapping: which fields it applies to and which
/// subfield codes feed which role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRule {
    /// Tag a field must carry exactly
    pub main_tag: String,
    /// First indicator pattern
    pub ind1: IndicatorPattern,
    /// Second indicator pattern
    pub ind2: IndicatorPattern,
    /// Codes whose values become metadata values
    pub value_codes: Vec<char>,
    /// Codes whose values become person first names
    pub firstname_codes: Vec<char>,
    /// Codes whose values become person last names
    pub lastname_codes: Vec<char>,
    /// Codes holding a full "last, first" name to be split by indicator 1
    pub expansion_codes: Vec<char>,
    /// Codes whose values become the corporate main name
    pub mainname_codes: Vec<char>,
    /// Codes whose values become corporate sub-names
    pub subname_codes: Vec<char>,
    /// Codes whose values become the corporate part name
    pub partname_codes: Vec<char>,
}

impl FieldRule {
    /// Rule for a tag with wildcard indicators and no subfield roles.
    #[must_use]
    pub fn new(main_tag: impl Into<String>) -> Self {
        FieldRule {
            main_tag: main_tag.into(),
            ind1: IndicatorPattern::Any,
            ind2: IndicatorPattern::Any,
            value_codes: Vec::new(),
            firstname_codes: Vec::new(),
            lastname_codes: Vec::new(),
            expansion_codes: Vec::new(),
            mainname_codes: Vec::new(),
            subname_codes: Vec::new(),
            partname_codes: Vec::new(),
        }
    }

    /// Restrict the first indicator.
    #[must_use]
    pub fn ind1(mut self, pattern: IndicatorPattern) -> Self {
        self.ind1 = pattern;
        self
    }

    /// Restrict the second indicator.
    #[must_use]
    pub fn ind2(mut self, pattern: IndicatorPattern) -> Self {
        self.ind2 = pattern;
        self
    }

    /// Take tag and indicators from a selector, keeping the subfield roles.
    #[must_use]
    pub fn with_selector(mut self, selector: &FieldSelector) -> Self {
        self.main_tag.clone_from(&selector.main_tag);
        self.ind1 = selector.ind1;
        self.ind2 = selector.ind2;
        self
    }

    /// Set the metadata value codes.
    #[must_use]
    pub fn value_codes(mut self, codes: &[char]) -> Self {
        self.value_codes = codes.to_vec();
        self
    }

    /// Set the first-name codes.
    #[must_use]
    pub fn firstname_codes(mut self, codes: &[char]) -> Self {
        self.firstname_codes = codes.to_vec();
        self
    }

    /// Set the last-name codes.
    #[must_use]
    pub fn lastname_codes(mut self, codes: &[char]) -> Self {
        self.lastname_codes = codes.to_vec();
        self
    }

    /// Set the expansion codes.
    #[must_use]
    pub fn expansion_codes(mut self, codes: &[char]) -> Self {
        self.expansion_codes = codes.to_vec();
        self
    }

    /// Set the corporate main-name codes.
    #[must_use]
    pub fn mainname_codes(mut self, codes: &[char]) -> Self {
        self.mainname_codes = codes.to_vec();
        self
    }

    /// Set the corporate sub-name codes.
    #[must_use]
    pub fn subname_codes(mut self, codes: &[char]) -> Self {
        self.subname_codes = codes.to_vec();
        self
    }

    /// Set the corporate part-name codes.
    #[must_use]
    pub fn partname_codes(mut self, codes: &[char]) -> Self {
        self.partname_codes = codes.to_vec();
        self
    }

    /// Tag and indicators of this rule as a selector.
    #[must_use]
    pub fn selector(&self) -> FieldSelector {
        FieldSelector {
            main_tag: self.main_tag.clone(),
            ind1: self.ind1,
            ind2: self.ind2,
        }
    }
}

/// The kind of entity a mapping produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    /// A plain metadata value
    Metadata,
    /// A personal name
    Person,
    /// A corporate-body name
    Corporate,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Metadata => write!(f, "metadata"),
            Self::Person => write!(f, "person"),
            Self::Corporate => write!(f, "corporate"),
        }
    }
}

/// How several matches of one mapping become entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SeparationPolicy {
    /// One entity per matching field occurrence
    SeparateEntries,
    /// One entity per qualifying subfield value
    SeparateSubfields,
    /// One entity per distinct main tag, merging its occurrences
    SeparateMainfields,
    /// One entity for the whole record, joining every match
    #[default]
    Concatenate,
}

/// What a condition subfield must look like.
#[derive(Debug, Clone)]
pub enum ConditionPattern {
    /// The condition subfield must be blank (the `/empty/` sentinel)
    Empty,
    /// The condition subfield must contain a match
    Match(MatchPattern),
}

impl ConditionPattern {
    /// Evaluate the pattern against a subfield value.
    #[must_use]
    pub fn is_satisfied_by(&self, value: &str) -> bool {
        match self {
            ConditionPattern::Empty => value.trim().is_empty(),
            ConditionPattern::Match(pattern) => pattern.is_match(value),
        }
    }
}

/// Conditional filter of a mapping.
#[derive(Debug, Clone)]
pub struct Condition {
    /// Subfield code the condition inspects
    pub code: char,
    /// Pattern the subfield must satisfy
    pub pattern: ConditionPattern,
}

impl Condition {
    /// Returns `true` for the `/empty/` sentinel.
    #[must_use]
    pub fn is_empty_sentinel(&self) -> bool {
        matches!(self.pattern, ConditionPattern::Empty)
    }
}

/// Authority identifier extraction of a mapping.
#[derive(Debug, Clone)]
pub struct IdentifierRule {
    /// Subfield code holding the identifier
    pub code: char,
    /// Pattern the raw identifier must match to be taken
    pub condition: Option<MatchPattern>,
    /// Replacement applied to an accepted identifier
    pub replacement: Option<Replacement>,
}

/// A compiled declarative mapping for one output entity kind.
#[derive(Debug, Clone)]
pub struct EntityMapping {
    /// Entity kind produced
    pub kind: EntityKind,
    /// Internal type name assigned to produced entities
    pub type_name: String,
    /// Field rules, tried against every data field
    pub field_rules: Vec<FieldRule>,
    /// Separator used when joining values
    pub separator: String,
    /// Optional conditional filter
    pub condition: Option<Condition>,
    /// Optional identifier extraction
    pub identifier: Option<IdentifierRule>,
    /// Optional replacement applied to emitted values
    pub value_replacement: Option<Replacement>,
    /// Separation policy
    pub policy: SeparationPolicy,
    /// Persons only: skip first/last-name codes once the expansion produced a name
    pub abort_after_first_match: bool,
}

impl EntityMapping {
    /// Start building a mapping.
    #[must_use]
    pub fn builder(kind: EntityKind, type_name: impl Into<String>) -> EntityMappingBuilder {
        EntityMappingBuilder {
            kind,
            type_name: type_name.into(),
            field_rules: Vec::new(),
            separator: DEFAULT_SEPARATOR.to_string(),
            condition_code: None,
            condition_pattern: None,
            identifier_code: None,
            identifier_condition: None,
            identifier_replacement: None,
            value_replacement: None,
            policy: SeparationPolicy::default(),
            abort_after_first_match: true,
        }
    }
}

/// Builder for [`EntityMapping`]; patterns are compiled by [`build`](Self::build).
#[derive(Debug, Clone)]
pub struct EntityMappingBuilder {
    kind: EntityKind,
    type_name: String,
    field_rules: Vec<FieldRule>,
    separator: String,
    condition_code: Option<char>,
    condition_pattern: Option<String>,
    identifier_code: Option<char>,
    identifier_condition: Option<String>,
    identifier_replacement: Option<String>,
    value_replacement: Option<String>,
    policy: SeparationPolicy,
    abort_after_first_match: bool,
}

impl EntityMappingBuilder {
    /// Add a field rule.
    #[must_use]
    pub fn field_rule(mut self, rule: FieldRule) -> Self {
        self.field_rules.push(rule);
        self
    }

    /// Set the join separator.
    #[must_use]
    pub fn separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    /// Configure the conditional filter.
    ///
    /// A blank pattern disables the filter.
    #[must_use]
    pub fn condition(mut self, code: char, pattern: impl Into<String>) -> Self {
        self.condition_code = Some(code);
        self.condition_pattern = Some(pattern.into());
        self
    }

    /// Set the identifier subfield code.
    #[must_use]
    pub fn identifier_field(mut self, code: char) -> Self {
        self.identifier_code = Some(code);
        self
    }

    /// Set the pattern an identifier must match.
    #[must_use]
    pub fn identifier_condition(mut self, pattern: impl Into<String>) -> Self {
        self.identifier_condition = Some(pattern.into());
        self
    }

    /// Set the replacement rule applied to identifiers.
    #[must_use]
    pub fn identifier_replacement(mut self, rule: impl Into<String>) -> Self {
        self.identifier_replacement = Some(rule.into());
        self
    }

    /// Set the replacement rule applied to values.
    #[must_use]
    pub fn value_replacement(mut self, rule: impl Into<String>) -> Self {
        self.value_replacement = Some(rule.into());
        self
    }

    /// Set the separation policy.
    #[must_use]
    pub fn policy(mut self, policy: SeparationPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Set whether first/last-name codes are skipped after an expansion match.
    #[must_use]
    pub fn abort_after_first_match(mut self, abort: bool) -> Self {
        self.abort_after_first_match = abort;
        self
    }

    /// Validate the rules and compile every pattern.
    ///
    /// # Errors
    ///
    /// Returns [`MarcError::InvalidRule`] for a blank type name, a mapping
    /// without field rules, or a field rule lacking the codes its kind needs;
    /// [`MarcError::InvalidPattern`] / [`MarcError::InvalidReplacement`] for
    /// malformed patterns.
    pub fn build(self) -> Result<EntityMapping> {
        let invalid = |reason: &str| MarcError::InvalidRule {
            type_name: self.type_name.clone(),
            reason: reason.to_string(),
        };

        if self.type_name.trim().is_empty() {
            return Err(invalid("missing internal type name"));
        }
        if self.field_rules.is_empty() {
            return Err(invalid("no field rules configured"));
        }
        for rule in &self.field_rules {
            if rule.main_tag.trim().is_empty() {
                return Err(invalid("field rule without main tag"));
            }
            let has_codes = match self.kind {
                EntityKind::Metadata => !rule.value_codes.is_empty(),
                EntityKind::Person => {
                    !(rule.expansion_codes.is_empty()
                        && rule.firstname_codes.is_empty()
                        && rule.lastname_codes.is_empty())
                },
                EntityKind::Corporate => !rule.mainname_codes.is_empty(),
            };
            if !has_codes {
                return Err(invalid(match self.kind {
                    EntityKind::Metadata => "field rule without value subfield codes",
                    EntityKind::Person => "field rule without name subfield codes",
                    EntityKind::Corporate => "field rule without main-name subfield codes",
                }));
            }
        }

        let condition = match (self.condition_code, non_blank(self.condition_pattern.as_deref())) {
            (Some(code), Some(pattern)) => Some(Condition {
                code,
                pattern: if pattern == EMPTY_CONDITION {
                    ConditionPattern::Empty
                } else {
                    ConditionPattern::Match(MatchPattern::parse(pattern)?)
                },
            }),
            _ => None,
        };

        let identifier = match self.identifier_code {
            Some(code) => Some(IdentifierRule {
                code,
                condition: non_blank(self.identifier_condition.as_deref())
                    .map(MatchPattern::parse)
                    .transpose()?,
                replacement: Replacement::parse_optional(self.identifier_replacement.as_deref())?,
            }),
            None => None,
        };

        let value_replacement = Replacement::parse_optional(self.value_replacement.as_deref())?;

        Ok(EntityMapping {
            kind: self.kind,
            type_name: self.type_name,
            field_rules: self.field_rules,
            separator: self.separator,
            condition,
            identifier,
            value_replacement,
            policy: self.policy,
            abort_after_first_match: self.abort_after_first_match,
        })
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}
