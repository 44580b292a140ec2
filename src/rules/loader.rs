//! Loading a [`RuleSet`] from a preferences document.
//!
//! The `Marc` node is accepted either as the document root or nested as
//! `Preferences/Formats/Marc`:
//!
//! ```xml
//! <Marc>
//!   <Docstruct><Name>Monograph</Name><leader6>a</leader6><leader7>m</leader7></Docstruct>
//!   <Person>
//!     <Name>Author</Name>
//!     <field><fieldMainTag>100</fieldMainTag><fieldInd1>1</fieldInd1><expansion>a</expansion></field>
//!     <identifierField>0</identifierField>
//!     <identifierReplacement>s/\(DE-588\)//</identifierReplacement>
//!   </Person>
//! </Marc>
//! ```
//!
//! Element names are matched exactly. Leading and trailing whitespace of
//! element text is ignored, except inside `separator`.

use super::{
    ClassificationRule, EntityKind, EntityMapping, FieldRule, FieldSelector, GroupMapping,
    GroupScope, IndicatorPattern, RuleSet, SeparationPolicy,
};
use crate::config::ImportConfig;
use crate::error::{MarcError, Result};
use crate::marcxml::root_element;
use lazy_static::lazy_static;
use quick_xml::de::from_str as xml_from_str;
use regex::Regex;
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, warn};

/// Name of the MARC preferences node.
pub const MARC_NODE: &str = "Marc";
/// Name of the preferences document root.
pub const PREFERENCES_NODE: &str = "Preferences";

lazy_static! {
    static ref SEPARATOR_TEXT: Regex =
        Regex::new(r"<separator>([^<&]*)</separator>").expect("separator pattern is valid");
}

#[derive(Debug, Deserialize)]
struct PreferencesNode {
    #[serde(rename = "Formats", default)]
    formats: Option<FormatsNode>,
}

#[derive(Debug, Deserialize)]
struct FormatsNode {
    #[serde(rename = "Marc", default)]
    marc: Option<MarcNode>,
}

/// Children of the `Marc` node, in document order.
#[derive(Debug, Default, Deserialize)]
struct MarcNode {
    #[serde(rename = "$value", default)]
    children: Vec<MarcChild>,
}

#[derive(Debug, Deserialize)]
enum MarcChild {
    Metadata(MappingNode),
    Person(MappingNode),
    Corporate(MappingNode),
    Docstruct(DocstructNode),
    Group(GroupNode),
    SubfieldGroup(GroupNode),
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Default, Deserialize)]
struct MappingNode {
    #[serde(rename = "Name", default)]
    name: Option<String>,
    #[serde(default)]
    separator: Option<String>,
    #[serde(rename = "field", default)]
    fields: Vec<FieldNode>,
    #[serde(rename = "identifierField", default)]
    identifier_field: Option<String>,
    #[serde(rename = "identifierConditionField", default)]
    identifier_condition: Option<String>,
    #[serde(rename = "identifierReplacement", default)]
    identifier_replacement: Option<String>,
    #[serde(rename = "conditionField", default)]
    condition_field: Option<String>,
    #[serde(rename = "conditionValue", default)]
    condition_value: Option<String>,
    #[serde(rename = "fieldReplacement", default)]
    field_replacement: Option<String>,
    #[serde(rename = "separateEntries", default)]
    separate_entries: Option<String>,
    #[serde(rename = "separateSubfields", default)]
    separate_subfields: Option<String>,
    #[serde(rename = "separateMainfields", default)]
    separate_mainfields: Option<String>,
    #[serde(rename = "abortAfterFirstMatch", default)]
    abort_after_first_match: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct FieldNode {
    #[serde(rename = "fieldMainTag", default)]
    main_tag: Option<String>,
    #[serde(rename = "fieldInd1", default)]
    ind1: Option<String>,
    #[serde(rename = "fieldInd2", default)]
    ind2: Option<String>,
    #[serde(rename = "fieldSubTag", default)]
    sub_tags: Vec<String>,
    #[serde(default)]
    firstname: Vec<String>,
    #[serde(default)]
    lastname: Vec<String>,
    #[serde(default)]
    expansion: Vec<String>,
    #[serde(rename = "fieldMainName", default)]
    main_names: Vec<String>,
    #[serde(rename = "fieldSubName", default)]
    sub_names: Vec<String>,
    #[serde(rename = "fieldPartName", default)]
    part_names: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct DocstructNode {
    #[serde(rename = "Name", default)]
    name: Option<String>,
    #[serde(default)]
    leader6: Option<String>,
    #[serde(default)]
    leader7: Option<String>,
    #[serde(default)]
    leader19: Option<String>,
    #[serde(default)]
    field007_0: Option<String>,
    #[serde(default)]
    field007_1: Option<String>,
    #[serde(default)]
    field008_21: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct GroupNode {
    #[serde(rename = "Name", default)]
    name: Option<String>,
    #[serde(rename = "fieldMainTag", default)]
    main_tag: Option<String>,
    #[serde(rename = "fieldInd1", default)]
    ind1: Option<String>,
    #[serde(rename = "fieldInd2", default)]
    ind2: Option<String>,
    #[serde(rename = "Metadata", default)]
    metadata: Vec<MappingNode>,
    #[serde(rename = "Person", default)]
    persons: Vec<MappingNode>,
    #[serde(rename = "Corporate", default)]
    corporates: Vec<MappingNode>,
}

/// Load rules from a preferences document.
///
/// With [`ImportConfig::strict`] unset, a mapping that fails validation is
/// logged and skipped; otherwise the first failure aborts loading.
///
/// # Errors
///
/// Returns [`MarcError::Preferences`] if the document cannot be parsed or has
/// no `Marc` node, and any rule error in strict mode.
pub fn rules_from_str(xml: &str, config: &ImportConfig) -> Result<RuleSet> {
    let protected = protect_separators(xml);
    let marc = match root_element(&protected) {
        Some(MARC_NODE) => parse_node::<MarcNode>(&protected)?,
        Some(PREFERENCES_NODE) => parse_node::<PreferencesNode>(&protected)?
            .formats
            .and_then(|formats| formats.marc)
            .ok_or_else(|| {
                MarcError::Preferences(format!(
                    "node '{MARC_NODE}' not found below '{PREFERENCES_NODE}/Formats'"
                ))
            })?,
        Some(other) => {
            return Err(MarcError::Preferences(format!(
                "unexpected root element '{other}'"
            )))
        },
        None => return Err(MarcError::Preferences("document has no root element".to_string())),
    };

    let rules = build_rule_set(marc, config.strict)?;
    debug!(
        mappings = rules.mapping_count(),
        docstructs = rules.classifications.len(),
        "loaded MARC rules"
    );
    Ok(rules)
}

/// Load rules from a preferences file on disk.
///
/// # Errors
///
/// Returns [`MarcError::IoError`] if the file cannot be read, otherwise as
/// [`rules_from_str`].
pub fn rules_from_path(path: impl AsRef<Path>, config: &ImportConfig) -> Result<RuleSet> {
    let xml = std::fs::read_to_string(path)?;
    rules_from_str(&xml, config)
}

fn parse_node<T: for<'de> Deserialize<'de>>(xml: &str) -> Result<T> {
    xml_from_str(xml).map_err(|e| MarcError::Preferences(format!("Failed to parse preferences: {e}")))
}

/// Wrap separator text in CDATA so its surrounding whitespace survives parsing.
fn protect_separators(xml: &str) -> String {
    SEPARATOR_TEXT
        .replace_all(xml, "<separator><![CDATA[$1]]></separator>")
        .into_owned()
}

fn build_rule_set(marc: MarcNode, strict: bool) -> Result<RuleSet> {
    let mut rules = RuleSet::new();

    for child in marc.children {
        match child {
            MarcChild::Metadata(node) => push_mapping(&mut rules, EntityKind::Metadata, node, strict)?,
            MarcChild::Person(node) => push_mapping(&mut rules, EntityKind::Person, node, strict)?,
            MarcChild::Corporate(node) => push_mapping(&mut rules, EntityKind::Corporate, node, strict)?,
            MarcChild::Docstruct(node) => {
                if let Some(rule) = recover(build_classification(node), strict)? {
                    rules.classifications.push(rule);
                }
            },
            MarcChild::Group(node) => {
                if let Some(group) = recover(build_group(node, false, strict), strict)? {
                    rules.groups.push(group);
                }
            },
            MarcChild::SubfieldGroup(node) => {
                if let Some(group) = recover(build_group(node, true, strict), strict)? {
                    rules.groups.push(group);
                }
            },
            MarcChild::Unknown => {},
        }
    }

    Ok(rules)
}

fn push_mapping(rules: &mut RuleSet, kind: EntityKind, node: MappingNode, strict: bool) -> Result<()> {
    if let Some(mapping) = recover(build_mapping(kind, node, None), strict)? {
        rules.push_mapping(mapping);
    }
    Ok(())
}

/// Log and drop a failed rule unless loading is strict.
fn recover<T>(result: Result<T>, strict: bool) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(err) if strict => Err(err),
        Err(err) => {
            warn!(error = %err, "skipping MARC rule");
            Ok(None)
        },
    }
}

fn build_mapping(
    kind: EntityKind,
    node: MappingNode,
    selector: Option<&FieldSelector>,
) -> Result<EntityMapping> {
    let type_name = text(node.name.as_deref()).unwrap_or_default().to_string();
    let invalid = |reason: String| MarcError::InvalidRule {
        type_name: type_name.clone(),
        reason,
    };

    let mut builder = EntityMapping::builder(kind, type_name.clone())
        .policy(separation_policy(&node))
        .abort_after_first_match(node.abort_after_first_match.as_deref().map_or(true, is_true));

    if let Some(separator) = node.separator {
        builder = builder.separator(separator);
    }

    for field in node.fields {
        let rule = build_field_rule(field).map_err(&invalid)?;
        builder = builder.field_rule(match selector {
            Some(selector) => rule.with_selector(selector),
            None => rule,
        });
    }

    if let Some(code) = text(node.identifier_field.as_deref()) {
        builder = builder.identifier_field(single_code(code).map_err(&invalid)?);
    }
    if let Some(pattern) = node.identifier_condition {
        builder = builder.identifier_condition(pattern);
    }
    if let Some(rule) = node.identifier_replacement {
        builder = builder.identifier_replacement(rule);
    }
    if let (Some(code), Some(pattern)) = (text(node.condition_field.as_deref()), node.condition_value) {
        builder = builder.condition(single_code(code).map_err(&invalid)?, pattern);
    }
    if let Some(rule) = node.field_replacement {
        builder = builder.value_replacement(rule);
    }

    builder.build()
}

fn separation_policy(node: &MappingNode) -> SeparationPolicy {
    let flag = |value: &Option<String>| value.as_deref().is_some_and(is_true);
    if flag(&node.separate_mainfields) {
        SeparationPolicy::SeparateMainfields
    } else if flag(&node.separate_subfields) {
        SeparationPolicy::SeparateSubfields
    } else if flag(&node.separate_entries) {
        SeparationPolicy::SeparateEntries
    } else {
        SeparationPolicy::Concatenate
    }
}

fn build_field_rule(node: FieldNode) -> std::result::Result<FieldRule, String> {
    let rule = FieldRule::new(text(node.main_tag.as_deref()).unwrap_or_default())
        .ind1(indicator(node.ind1.as_deref())?)
        .ind2(indicator(node.ind2.as_deref())?)
        .value_codes(&codes(&node.sub_tags)?)
        .firstname_codes(&codes(&node.firstname)?)
        .lastname_codes(&codes(&node.lastname)?)
        .expansion_codes(&codes(&node.expansion)?)
        .mainname_codes(&codes(&node.main_names)?)
        .subname_codes(&codes(&node.sub_names)?)
        .partname_codes(&codes(&node.part_names)?);
    Ok(rule)
}

fn build_classification(node: DocstructNode) -> Result<ClassificationRule> {
    let type_name = text(node.name.as_deref()).ok_or_else(|| MarcError::InvalidRule {
        type_name: String::new(),
        reason: "Docstruct without Name".to_string(),
    })?;

    Ok(ClassificationRule {
        type_name: type_name.to_string(),
        leader6: position(node.leader6.as_deref()),
        leader7: position(node.leader7.as_deref()),
        leader19: position(node.leader19.as_deref()),
        field007_0: position(node.field007_0.as_deref()),
        field007_1: position(node.field007_1.as_deref()),
        field008_21: position(node.field008_21.as_deref()),
    })
}

fn build_group(node: GroupNode, per_field: bool, strict: bool) -> Result<GroupMapping> {
    let type_name = text(node.name.as_deref()).unwrap_or_default().to_string();
    let invalid = |reason: String| MarcError::InvalidRule {
        type_name: type_name.clone(),
        reason,
    };
    if type_name.is_empty() {
        return Err(invalid("group without Name".to_string()));
    }

    let scope = if per_field {
        let main_tag = text(node.main_tag.as_deref())
            .ok_or_else(|| invalid("subfield group without fieldMainTag".to_string()))?;
        GroupScope::PerMatchingField(
            FieldSelector::new(main_tag)
                .ind1(indicator(node.ind1.as_deref()).map_err(&invalid)?)
                .ind2(indicator(node.ind2.as_deref()).map_err(&invalid)?),
        )
    } else {
        GroupScope::WholeRecord
    };

    let selector = match &scope {
        GroupScope::PerMatchingField(selector) => Some(selector.clone()),
        GroupScope::WholeRecord => None,
    };

    let mut group = GroupMapping::new(type_name.clone(), scope);
    for (kind, nodes) in [
        (EntityKind::Metadata, node.metadata),
        (EntityKind::Person, node.persons),
        (EntityKind::Corporate, node.corporates),
    ] {
        for mapping in nodes {
            if let Some(mapping) = recover(build_mapping(kind, mapping, selector.as_ref()), strict)? {
                group.push_mapping(mapping);
            }
        }
    }

    if group.is_empty() {
        warn!(group = %type_name, "group has no usable mappings");
    }
    Ok(group)
}

/// Trimmed element text, `None` when absent or blank.
fn text(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn is_true(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case("true")
}

fn indicator(value: Option<&str>) -> std::result::Result<IndicatorPattern, String> {
    match value {
        None => Ok(IndicatorPattern::Any),
        Some(raw) => IndicatorPattern::parse(raw.trim()),
    }
}

fn single_code(value: &str) -> std::result::Result<char, String> {
    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (Some(code), None) => Ok(code),
        _ => Err(format!("subfield code must be a single character, got '{value}'")),
    }
}

fn codes(values: &[String]) -> std::result::Result<Vec<char>, String> {
    values
        .iter()
        .filter_map(|v| text(Some(v.as_str())))
        .map(single_code)
        .collect()
}

fn position(value: Option<&str>) -> Option<char> {
    text(value).and_then(|v| v.chars().next())
}
