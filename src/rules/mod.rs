//! Rule configuration model.
//!
//! A [`RuleSet`] is the immutable, declarative description of an import:
//! entity mappings for metadata, persons and corporate bodies, group
//! mappings, and the ordered classification rules. It is built once (by hand
//! or through [`loader`]) and shared read-only by every extraction pass.

pub mod loader;
mod mapping;

pub use mapping::{
    Condition, ConditionPattern, EntityKind, EntityMapping, EntityMappingBuilder, FieldRule,
    FieldSelector, IdentifierRule, IndicatorPattern, SeparationPolicy, ANY_INDICATOR,
    DEFAULT_SEPARATOR, EMPTY_CONDITION,
};

/// Where a group mapping draws its fields from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupScope {
    /// One group for the whole record
    WholeRecord,
    /// One group per data field matching the selector
    PerMatchingField(FieldSelector),
}

/// Declarative mapping for a metadata group.
#[derive(Debug, Clone)]
pub struct GroupMapping {
    /// Internal group type name
    pub type_name: String,
    /// Nested metadata mappings
    pub metadata: Vec<EntityMapping>,
    /// Nested person mappings
    pub persons: Vec<EntityMapping>,
    /// Nested corporate mappings
    pub corporates: Vec<EntityMapping>,
    /// Record-wide or per-field composition
    pub scope: GroupScope,
}

impl GroupMapping {
    /// Empty group mapping with the given scope.
    #[must_use]
    pub fn new(type_name: impl Into<String>, scope: GroupScope) -> Self {
        GroupMapping {
            type_name: type_name.into(),
            metadata: Vec::new(),
            persons: Vec::new(),
            corporates: Vec::new(),
            scope,
        }
    }

    /// Add a nested mapping, filed by its kind.
    #[must_use]
    pub fn with_mapping(mut self, mapping: EntityMapping) -> Self {
        self.push_mapping(mapping);
        self
    }

    /// Add a nested mapping, filed by its kind.
    pub fn push_mapping(&mut self, mapping: EntityMapping) {
        match mapping.kind {
            EntityKind::Metadata => self.metadata.push(mapping),
            EntityKind::Person => self.persons.push(mapping),
            EntityKind::Corporate => self.corporates.push(mapping),
        }
    }

    /// Returns `true` if the group has no nested mappings at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.metadata.is_empty() && self.persons.is_empty() && self.corporates.is_empty()
    }
}

/// Positional expectations selecting a structural type.
///
/// `None` positions are wildcards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassificationRule {
    /// Structural type selected when the rule matches
    pub type_name: String,
    /// Expected leader position 6
    pub leader6: Option<char>,
    /// Expected leader position 7
    pub leader7: Option<char>,
    /// Expected leader position 19
    pub leader19: Option<char>,
    /// Expected control field 007, position 0
    pub field007_0: Option<char>,
    /// Expected control field 007, position 1
    pub field007_1: Option<char>,
    /// Expected control field 008, position 21
    pub field008_21: Option<char>,
}

impl ClassificationRule {
    /// Rule with no expectations.
    #[must_use]
    pub fn new(type_name: impl Into<String>) -> Self {
        ClassificationRule {
            type_name: type_name.into(),
            ..Self::default()
        }
    }

    /// Expect leader position 6.
    #[must_use]
    pub fn leader6(mut self, c: char) -> Self {
        self.leader6 = Some(c);
        self
    }

    /// Expect leader position 7.
    #[must_use]
    pub fn leader7(mut self, c: char) -> Self {
        self.leader7 = Some(c);
        self
    }

    /// Expect leader position 19.
    #[must_use]
    pub fn leader19(mut self, c: char) -> Self {
        self.leader19 = Some(c);
        self
    }

    /// Expect control field 007 position 0.
    #[must_use]
    pub fn field007_0(mut self, c: char) -> Self {
        self.field007_0 = Some(c);
        self
    }

    /// Expect control field 007 position 1.
    #[must_use]
    pub fn field007_1(mut self, c: char) -> Self {
        self.field007_1 = Some(c);
        self
    }

    /// Expect control field 008 position 21.
    #[must_use]
    pub fn field008_21(mut self, c: char) -> Self {
        self.field008_21 = Some(c);
        self
    }
}

/// Complete rule configuration, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    /// Top-level metadata mappings
    pub metadata: Vec<EntityMapping>,
    /// Top-level person mappings
    pub persons: Vec<EntityMapping>,
    /// Top-level corporate mappings
    pub corporates: Vec<EntityMapping>,
    /// Group mappings
    pub groups: Vec<GroupMapping>,
    /// Classification rules; the first full match wins
    pub classifications: Vec<ClassificationRule>,
}

impl RuleSet {
    /// Empty rule set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a top-level mapping, filed by its kind.
    #[must_use]
    pub fn with_mapping(mut self, mapping: EntityMapping) -> Self {
        self.push_mapping(mapping);
        self
    }

    /// Add a group mapping.
    #[must_use]
    pub fn with_group(mut self, group: GroupMapping) -> Self {
        self.groups.push(group);
        self
    }

    /// Add a classification rule.
    #[must_use]
    pub fn with_classification(mut self, rule: ClassificationRule) -> Self {
        self.classifications.push(rule);
        self
    }

    /// Add a top-level mapping, filed by its kind.
    pub fn push_mapping(&mut self, mapping: EntityMapping) {
        match mapping.kind {
            EntityKind::Metadata => self.metadata.push(mapping),
            EntityKind::Person => self.persons.push(mapping),
            EntityKind::Corporate => self.corporates.push(mapping),
        }
    }

    /// Total number of entity mappings, including nested group mappings.
    #[must_use]
    pub fn mapping_count(&self) -> usize {
        self.metadata.len()
            + self.persons.len()
            + self.corporates.len()
            + self
                .groups
                .iter()
                .map(|g| g.metadata.len() + g.persons.len() + g.corporates.len())
                .sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn title() -> EntityMapping {
        EntityMapping::builder(EntityKind::Metadata, "TitleDocMain")
            .field_rule(FieldRule::new("245").value_codes(&['a']))
            .build()
            .unwrap()
    }

    fn author() -> EntityMapping {
        EntityMapping::builder(EntityKind::Person, "Author")
            .field_rule(FieldRule::new("100").expansion_codes(&['a']))
            .build()
            .unwrap()
    }

    #[test]
    fn test_mappings_are_filed_by_kind() {
        let rules = RuleSet::new()
            .with_mapping(title())
            .with_mapping(author())
            .with_group(GroupMapping::new("PublisherGroup", GroupScope::WholeRecord).with_mapping(title()));

        assert_eq!(rules.metadata.len(), 1);
        assert_eq!(rules.persons.len(), 1);
        assert!(rules.corporates.is_empty());
        assert_eq!(rules.groups[0].metadata.len(), 1);
        assert_eq!(rules.mapping_count(), 3);
    }

    #[test]
    fn test_classification_rule_builder() {
        let rule = ClassificationRule::new("Monograph").leader6('a').leader7('m');
        assert_eq!(rule.leader6, Some('a'));
        assert_eq!(rule.leader7, Some('m'));
        assert_eq!(rule.leader19, None);
        assert_eq!(rule.field008_21, None);
    }

    #[test]
    fn test_empty_group() {
        let group = GroupMapping::new("Empty", GroupScope::WholeRecord);
        assert!(group.is_empty());
        assert!(!group.with_mapping(author()).is_empty());
    }
}
