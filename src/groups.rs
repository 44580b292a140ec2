//! Metadata group composition.
//!
//! A [`GroupMapping`] with [`GroupScope::WholeRecord`] runs its nested
//! mappings over every data field and yields at most one group. With
//! [`GroupScope::PerMatchingField`], each field accepted by the group's
//! selector is treated as a record of its own and yields its own group.

use crate::config::AuthorityScheme;
use crate::entity::Group;
use crate::extractor::{extract_corporates, extract_metadata, extract_persons};
use crate::field_matcher::matches_selector;
use crate::record::Field;
use crate::rules::{GroupMapping, GroupScope};
use std::slice;
use tracing::debug;

/// Compose the groups of one group mapping.
#[must_use]
pub fn compose_group(
    fields: &[Field],
    mapping: &GroupMapping,
    authority: &AuthorityScheme,
) -> Vec<Group> {
    let groups: Vec<Group> = match &mapping.scope {
        GroupScope::WholeRecord => build_group(fields, mapping, authority).into_iter().collect(),
        GroupScope::PerMatchingField(selector) => fields
            .iter()
            .filter(|field| matches_selector(selector, field))
            .filter_map(|field| build_group(slice::from_ref(field), mapping, authority))
            .collect(),
    };

    debug!(group = %mapping.type_name, groups = groups.len(), "composed groups");
    groups
}

/// Compose the groups of every mapping, in mapping order.
#[must_use]
pub fn compose_groups(
    fields: &[Field],
    mappings: &[GroupMapping],
    authority: &AuthorityScheme,
) -> Vec<Group> {
    mappings
        .iter()
        .flat_map(|mapping| compose_group(fields, mapping, authority))
        .collect()
}

fn build_group(fields: &[Field], mapping: &GroupMapping, authority: &AuthorityScheme) -> Option<Group> {
    let mut group = Group::new(mapping.type_name.clone());
    for md in &mapping.metadata {
        group.metadata.extend(extract_metadata(fields, md, authority));
    }
    for person in &mapping.persons {
        group.persons.extend(extract_persons(fields, person, authority));
    }
    for corporate in &mapping.corporates {
        group.corporates.extend(extract_corporates(fields, corporate, authority));
    }

    (!group.is_empty()).then_some(group)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{EntityKind, EntityMapping, FieldRule, FieldSelector, IndicatorPattern};

    fn field(tag: &str, ind2: char, subfields: &[(char, &str)]) -> Field {
        let mut field = Field::new(tag.to_string(), ' ', ind2);
        for (code, value) in subfields {
            field.add_subfield_str(*code, value);
        }
        field
    }

    fn publisher_group(scope: GroupScope) -> GroupMapping {
        let rule = |codes: &[char]| FieldRule::new("264").ind2(IndicatorPattern::Exact('1')).value_codes(codes);
        GroupMapping::new("PublisherGroup", scope)
            .with_mapping(
                EntityMapping::builder(EntityKind::Metadata, "PlaceOfPublication")
                    .field_rule(rule(&['a']))
                    .build()
                    .unwrap(),
            )
            .with_mapping(
                EntityMapping::builder(EntityKind::Metadata, "PublicationYear")
                    .field_rule(rule(&['c']))
                    .build()
                    .unwrap(),
            )
    }

    fn imprints() -> Vec<Field> {
        vec![
            field("264", '1', &[('a', "Stuttgart"), ('c', "1950")]),
            field("245", '0', &[('a', "Title")]),
            field("264", '1', &[('a', "Tübingen"), ('c', "1960")]),
            field("264", '4', &[('c', "©1949")]),
        ]
    }

    #[test]
    fn test_whole_record_group() {
        let groups = compose_group(&imprints(), &publisher_group(GroupScope::WholeRecord), &AuthorityScheme::gnd());
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].metadata.len(), 2);
        assert_eq!(groups[0].metadata[0].value, "Stuttgart; Tübingen");
        assert_eq!(groups[0].metadata[1].value, "1950; 1960");
    }

    #[test]
    fn test_per_matching_field_groups() {
        let selector = FieldSelector::new("264").ind2(IndicatorPattern::Exact('1'));
        let groups = compose_group(
            &imprints(),
            &publisher_group(GroupScope::PerMatchingField(selector)),
            &AuthorityScheme::gnd(),
        );
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].metadata[0].value, "Stuttgart");
        assert_eq!(groups[0].metadata[1].value, "1950");
        assert_eq!(groups[1].metadata[0].value, "Tübingen");
        assert_eq!(groups[1].metadata[1].value, "1960");
    }

    #[test]
    fn test_empty_group_not_emitted() {
        let fields = vec![field("245", '0', &[('a', "Title")])];
        assert!(compose_group(&fields, &publisher_group(GroupScope::WholeRecord), &AuthorityScheme::gnd()).is_empty());

        let selector = FieldSelector::new("264");
        let fields = vec![field("264", '4', &[('c', "©1949")])];
        assert!(compose_group(
            &fields,
            &publisher_group(GroupScope::PerMatchingField(selector)),
            &AuthorityScheme::gnd()
        )
        .is_empty());
    }

    #[test]
    fn test_compose_groups_keeps_mapping_order() {
        let mappings = vec![
            publisher_group(GroupScope::WholeRecord),
            publisher_group(GroupScope::PerMatchingField(FieldSelector::new("264"))),
        ];
        let groups = compose_groups(&imprints(), &mappings, &AuthorityScheme::gnd());
        assert_eq!(groups.len(), 3);
        assert_eq!(groups[0].metadata[0].value, "Stuttgart; Tübingen");
    }
}
