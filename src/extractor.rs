//! Rule-driven entity extraction.
//!
//! Extraction walks the data fields in record order. Every field matched by
//! one of a mapping's [`FieldRule`]s is one occurrence: its subfields are
//! folded into an [`Occurrence`] accumulator that collects role-tagged
//! values, the identifier and the conditional-filter state. Accepted
//! occurrences become drafts, and the mapping's [`SeparationPolicy`] decides
//! how drafts are merged or split into entities:
//!
//! | Policy               | Entities emitted                                   |
//! |----------------------|----------------------------------------------------|
//! | `SeparateEntries`    | one per occurrence                                 |
//! | `SeparateSubfields`  | one per qualifying subfield value                  |
//! | `SeparateMainfields` | one per distinct main tag, in order of appearance  |
//! | `Concatenate`        | one for the whole record                           |
//!
//! Value replacement runs when an entity is emitted, on the final (possibly
//! joined) value; entities left without their required value are dropped.
//!
//! # Examples
//!
//! ```
//! use marcmap::extractor::extract_persons;
//! use marcmap::rules::{EntityKind, EntityMapping, FieldRule, IndicatorPattern};
//! use marcmap::{AuthorityScheme, Field};
//!
//! let author = EntityMapping::builder(EntityKind::Person, "Author")
//!     .field_rule(FieldRule::new("700").ind1(IndicatorPattern::Exact('1')).expansion_codes(&['a']))
//!     .identifier_field('0')
//!     .identifier_replacement(r"s/\(DE-588\)//")
//!     .build()
//!     .unwrap();
//! let fields = vec![Field::builder("700".to_string(), '1', ' ')
//!     .subfield_str('a', "Kutschmann, Theodor")
//!     .subfield_str('0', "(DE-588)115747876X")
//!     .build()];
//!
//! let persons = extract_persons(&fields, &author, &AuthorityScheme::gnd());
//! assert_eq!(persons[0].last_name, "Kutschmann");
//! assert_eq!(persons[0].first_name, "Theodor");
//! assert_eq!(persons[0].authority.as_ref().unwrap().value, "115747876X");
//! ```

use crate::config::AuthorityScheme;
use crate::entity::{Authority, CorporateName, Entity, MetadataValue, PersonName};
use crate::field_matcher::{check_condition, matches_field, ConditionState};
use crate::record::{Field, Subfield};
use crate::replacement;
use crate::rules::{EntityKind, EntityMapping, FieldRule, SeparationPolicy};
use indexmap::IndexMap;
use tracing::debug;

/// Values collected from one matching field occurrence.
#[derive(Debug, Clone, Default)]
pub struct Occurrence {
    /// Tag of the occurrence
    pub main_tag: String,
    /// Metadata value subfields
    pub values: Vec<String>,
    /// (first, last) names split from expansion subfields
    pub expansions: Vec<(String, String)>,
    /// First-name subfields
    pub first_names: Vec<String>,
    /// Last-name subfields
    pub last_names: Vec<String>,
    /// Corporate main-name subfields
    pub main_names: Vec<String>,
    /// Corporate sub-name subfields
    pub sub_names: Vec<String>,
    /// Corporate part-name subfields
    pub part_names: Vec<String>,
    /// Last identifier that passed the identifier condition
    pub identifier: Option<String>,
    /// Conditional filter state
    pub condition: ConditionState,
}

impl Occurrence {
    fn new(main_tag: &str) -> Self {
        Occurrence {
            main_tag: main_tag.to_string(),
            ..Self::default()
        }
    }
}

/// Fold one subfield into the occurrence.
fn scan_subfield(
    mut occ: Occurrence,
    mapping: &EntityMapping,
    rule: &FieldRule,
    indicator1: char,
    subfield: &Subfield,
) -> Occurrence {
    let (code, value) = (subfield.code, subfield.value.as_str());

    if let Some(satisfied) = mapping
        .condition
        .as_ref()
        .and_then(|condition| check_condition(condition, code, value))
    {
        occ.condition = occ.condition.observe(satisfied);
        if !satisfied {
            return occ;
        }
    }

    if let Some(identifier) = mapping.identifier.as_ref().filter(|id| id.code == code) {
        let accepted = identifier
            .condition
            .as_ref()
            .map_or(true, |pattern| pattern.is_match(value));
        if accepted {
            occ.identifier = Some(replacement::apply(identifier.replacement.as_ref(), value));
        }
    }

    let owned = || value.to_string();
    match mapping.kind {
        EntityKind::Metadata => {
            if rule.value_codes.contains(&code) {
                occ.values.push(owned());
            }
        },
        EntityKind::Person => {
            if rule.expansion_codes.contains(&code) {
                if let Some(name) = expand_name(indicator1, value) {
                    occ.expansions.push(name);
                }
            }
            if rule.firstname_codes.contains(&code) {
                occ.first_names.push(owned());
            }
            if rule.lastname_codes.contains(&code) {
                occ.last_names.push(owned());
            }
        },
        EntityKind::Corporate => {
            if rule.mainname_codes.contains(&code) {
                occ.main_names.push(owned());
            }
            if rule.subname_codes.contains(&code) {
                occ.sub_names.push(owned());
            }
            if rule.partname_codes.contains(&code) {
                occ.part_names.push(owned());
            }
        },
    }

    occ
}

/// Split an expansion value by the field's first indicator.
///
/// Returns `(first, last)`. Indicator `1` reads "last, first"; `0` is a
/// forename only; `2` and `3` fill only the last name. Other indicators
/// yield nothing.
#[must_use]
pub fn expand_name(indicator1: char, value: &str) -> Option<(String, String)> {
    match indicator1 {
        '1' => Some(match value.split_once(',') {
            Some((last, first)) => (first.trim().to_string(), last.trim().to_string()),
            None => (String::new(), value.to_string()),
        }),
        '0' => Some((value.to_string(), String::new())),
        '2' | '3' => Some((String::new(), value.to_string())),
        _ => None,
    }
}

/// Collect the accepted occurrences of a mapping, in record order.
///
/// All rules of the mapping that match a field contribute to that field's
/// occurrence and share its conditional filter state.
#[must_use]
pub fn occurrences(fields: &[Field], mapping: &EntityMapping) -> Vec<Occurrence> {
    fields
        .iter()
        .filter_map(|field| {
            let mut rules = mapping
                .field_rules
                .iter()
                .filter(|rule| matches_field(rule, field))
                .peekable();
            rules.peek()?;

            let occ = rules.fold(Occurrence::new(&field.tag), |occ, rule| {
                field.subfields().fold(occ, |occ, subfield| {
                    scan_subfield(occ, mapping, rule, field.indicator1, subfield)
                })
            });

            let condition = occ.condition.finish(mapping.condition.as_ref());
            condition.accepted().then_some(Occurrence { condition, ..occ })
        })
        .collect()
}

/// Join the non-blank parts with a separator.
fn join_non_blank<S: AsRef<str>>(parts: impl IntoIterator<Item = S>, separator: &str) -> String {
    let mut joined = String::new();
    for part in parts {
        let part = part.as_ref();
        if part.trim().is_empty() {
            continue;
        }
        if !joined.is_empty() {
            joined.push_str(separator);
        }
        joined.push_str(part);
    }
    joined
}

/// Last non-blank identifier of a sequence.
fn last_identifier<'a>(identifiers: impl IntoIterator<Item = Option<&'a String>>) -> Option<String> {
    identifiers
        .into_iter()
        .flatten()
        .filter(|id| !id.trim().is_empty())
        .last()
        .cloned()
}

/// An entity under construction, before replacement and the blank check.
trait Draft: Sized {
    type Output: Into<Entity>;

    /// One draft for a whole occurrence.
    fn from_occurrence(occ: &Occurrence, mapping: &EntityMapping) -> Self;

    /// One draft per qualifying subfield of an occurrence.
    fn per_subfield(occ: &Occurrence, mapping: &EntityMapping) -> Vec<Self>;

    /// Merge drafts of several occurrences.
    fn merge(drafts: Vec<Self>, separator: &str) -> Self;

    /// Apply value replacement and drop the draft if its required value is blank.
    fn emit(self, mapping: &EntityMapping, authority: &AuthorityScheme) -> Option<Self::Output>;
}

#[derive(Debug)]
struct MetadataDraft {
    value: String,
    identifier: Option<String>,
}

impl Draft for MetadataDraft {
    type Output = MetadataValue;

    fn from_occurrence(occ: &Occurrence, mapping: &EntityMapping) -> Self {
        MetadataDraft {
            value: join_non_blank(&occ.values, &mapping.separator),
            identifier: occ.identifier.clone(),
        }
    }

    fn per_subfield(occ: &Occurrence, _mapping: &EntityMapping) -> Vec<Self> {
        occ.values
            .iter()
            .map(|value| MetadataDraft {
                value: value.clone(),
                identifier: occ.identifier.clone(),
            })
            .collect()
    }

    fn merge(drafts: Vec<Self>, separator: &str) -> Self {
        MetadataDraft {
            value: join_non_blank(drafts.iter().map(|d| &d.value), separator),
            identifier: last_identifier(drafts.iter().map(|d| d.identifier.as_ref())),
        }
    }

    fn emit(self, mapping: &EntityMapping, authority: &AuthorityScheme) -> Option<MetadataValue> {
        let value = replacement::apply(mapping.value_replacement.as_ref(), &self.value);
        if value.trim().is_empty() {
            return None;
        }
        Some(MetadataValue {
            type_name: mapping.type_name.clone(),
            value,
            authority: Authority::for_identifier(authority, self.identifier.as_deref()),
        })
    }
}

#[derive(Debug)]
struct PersonDraft {
    first_name: String,
    last_name: String,
    identifier: Option<String>,
}

impl PersonDraft {
    /// Whether the first/last-name subfields are used for this occurrence.
    fn uses_name_codes(occ: &Occurrence, mapping: &EntityMapping) -> bool {
        let expanded = occ
            .expansions
            .iter()
            .any(|(first, last)| !first.is_empty() || !last.is_empty());
        !expanded || !mapping.abort_after_first_match
    }
}

impl Draft for PersonDraft {
    type Output = PersonName;

    fn from_occurrence(occ: &Occurrence, mapping: &EntityMapping) -> Self {
        let separator = mapping.separator.as_str();
        let mut firsts: Vec<&str> = occ.expansions.iter().map(|(first, _)| first.as_str()).collect();
        let mut lasts: Vec<&str> = occ.expansions.iter().map(|(_, last)| last.as_str()).collect();
        if Self::uses_name_codes(occ, mapping) {
            firsts.extend(occ.first_names.iter().map(String::as_str));
            lasts.extend(occ.last_names.iter().map(String::as_str));
        }
        PersonDraft {
            first_name: join_non_blank(firsts, separator),
            last_name: join_non_blank(lasts, separator),
            identifier: occ.identifier.clone(),
        }
    }

    fn per_subfield(occ: &Occurrence, mapping: &EntityMapping) -> Vec<Self> {
        let draft = |first: &str, last: &str| PersonDraft {
            first_name: first.to_string(),
            last_name: last.to_string(),
            identifier: occ.identifier.clone(),
        };

        let mut drafts: Vec<Self> = occ
            .expansions
            .iter()
            .map(|(first, last)| draft(first, last))
            .collect();
        if Self::uses_name_codes(occ, mapping) {
            drafts.extend(occ.first_names.iter().map(|first| draft(first, "")));
            drafts.extend(occ.last_names.iter().map(|last| draft("", last)));
        }
        drafts
    }

    fn merge(drafts: Vec<Self>, separator: &str) -> Self {
        PersonDraft {
            first_name: join_non_blank(drafts.iter().map(|d| &d.first_name), separator),
            last_name: join_non_blank(drafts.iter().map(|d| &d.last_name), separator),
            identifier: last_identifier(drafts.iter().map(|d| d.identifier.as_ref())),
        }
    }

    fn emit(self, mapping: &EntityMapping, authority: &AuthorityScheme) -> Option<PersonName> {
        let rule = mapping.value_replacement.as_ref();
        let first_name = replacement::apply(rule, &self.first_name);
        let last_name = replacement::apply(rule, &self.last_name);
        if first_name.trim().is_empty() && last_name.trim().is_empty() {
            return None;
        }
        Some(PersonName {
            type_name: mapping.type_name.clone(),
            first_name,
            last_name,
            authority: Authority::for_identifier(authority, self.identifier.as_deref()),
        })
    }
}

#[derive(Debug)]
struct CorporateDraft {
    main_name: String,
    sub_names: Vec<String>,
    part_name: String,
    identifier: Option<String>,
}

impl Draft for CorporateDraft {
    type Output = CorporateName;

    fn from_occurrence(occ: &Occurrence, mapping: &EntityMapping) -> Self {
        CorporateDraft {
            main_name: join_non_blank(&occ.main_names, &mapping.separator),
            sub_names: occ.sub_names.clone(),
            part_name: join_non_blank(&occ.part_names, &mapping.separator),
            identifier: occ.identifier.clone(),
        }
    }

    fn per_subfield(occ: &Occurrence, mapping: &EntityMapping) -> Vec<Self> {
        let part_name = join_non_blank(&occ.part_names, &mapping.separator);
        occ.main_names
            .iter()
            .map(|main_name| CorporateDraft {
                main_name: main_name.clone(),
                sub_names: occ.sub_names.clone(),
                part_name: part_name.clone(),
                identifier: occ.identifier.clone(),
            })
            .collect()
    }

    fn merge(drafts: Vec<Self>, separator: &str) -> Self {
        CorporateDraft {
            main_name: join_non_blank(drafts.iter().map(|d| &d.main_name), separator),
            sub_names: drafts.iter().flat_map(|d| d.sub_names.iter().cloned()).collect(),
            part_name: join_non_blank(drafts.iter().map(|d| &d.part_name), separator),
            identifier: last_identifier(drafts.iter().map(|d| d.identifier.as_ref())),
        }
    }

    fn emit(self, mapping: &EntityMapping, authority: &AuthorityScheme) -> Option<CorporateName> {
        let rule = mapping.value_replacement.as_ref();
        let main_name = replacement::apply(rule, &self.main_name);
        if main_name.trim().is_empty() {
            return None;
        }
        Some(CorporateName {
            type_name: mapping.type_name.clone(),
            main_name,
            sub_names: self
                .sub_names
                .iter()
                .map(|sub| replacement::apply(rule, sub))
                .filter(|sub| !sub.trim().is_empty())
                .collect(),
            part_name: replacement::apply(rule, &self.part_name),
            authority: Authority::for_identifier(authority, self.identifier.as_deref()),
        })
    }
}

fn run<D: Draft>(fields: &[Field], mapping: &EntityMapping, authority: &AuthorityScheme) -> Vec<D::Output> {
    let occs = occurrences(fields, mapping);
    let separator = mapping.separator.as_str();

    let drafts: Vec<D> = match mapping.policy {
        SeparationPolicy::SeparateEntries => {
            occs.iter().map(|occ| D::from_occurrence(occ, mapping)).collect()
        },
        SeparationPolicy::SeparateSubfields => {
            occs.iter().flat_map(|occ| D::per_subfield(occ, mapping)).collect()
        },
        SeparationPolicy::SeparateMainfields => {
            let mut by_tag: IndexMap<&str, Vec<D>> = IndexMap::new();
            for occ in &occs {
                by_tag
                    .entry(occ.main_tag.as_str())
                    .or_default()
                    .push(D::from_occurrence(occ, mapping));
            }
            by_tag
                .into_values()
                .map(|drafts| D::merge(drafts, separator))
                .collect()
        },
        SeparationPolicy::Concatenate => {
            let drafts = occs.iter().map(|occ| D::from_occurrence(occ, mapping)).collect();
            vec![D::merge(drafts, separator)]
        },
    };

    let entities: Vec<D::Output> = drafts
        .into_iter()
        .filter_map(|draft| draft.emit(mapping, authority))
        .collect();

    debug!(
        type_name = %mapping.type_name,
        policy = ?mapping.policy,
        occurrences = occs.len(),
        entities = entities.len(),
        "extracted {}", mapping.kind
    );
    entities
}

/// Extract metadata values for one mapping.
///
/// Only the mapping's value codes are read, whatever its kind.
#[must_use]
pub fn extract_metadata(
    fields: &[Field],
    mapping: &EntityMapping,
    authority: &AuthorityScheme,
) -> Vec<MetadataValue> {
    run::<MetadataDraft>(fields, mapping, authority)
}

/// Extract personal names for one mapping.
#[must_use]
pub fn extract_persons(
    fields: &[Field],
    mapping: &EntityMapping,
    authority: &AuthorityScheme,
) -> Vec<PersonName> {
    run::<PersonDraft>(fields, mapping, authority)
}

/// Extract corporate-body names for one mapping.
#[must_use]
pub fn extract_corporates(
    fields: &[Field],
    mapping: &EntityMapping,
    authority: &AuthorityScheme,
) -> Vec<CorporateName> {
    run::<CorporateDraft>(fields, mapping, authority)
}

/// Extract the entities of one mapping, dispatching on its kind.
#[must_use]
pub fn extract(fields: &[Field], mapping: &EntityMapping, authority: &AuthorityScheme) -> Vec<Entity> {
    match mapping.kind {
        EntityKind::Metadata => into_entities(extract_metadata(fields, mapping, authority)),
        EntityKind::Person => into_entities(extract_persons(fields, mapping, authority)),
        EntityKind::Corporate => into_entities(extract_corporates(fields, mapping, authority)),
    }
}

fn into_entities<T: Into<Entity>>(values: Vec<T>) -> Vec<Entity> {
    values.into_iter().map(Into::into).collect()
}
