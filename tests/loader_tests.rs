//! Loading rules and type systems from preferences files.

mod common;

use common::SERIAL_PREFERENCES;
use marcmap::rules::loader::{rules_from_path, rules_from_str};
use marcmap::rules::{GroupScope, IndicatorPattern, SeparationPolicy};
use marcmap::{ImportConfig, MarcError, TypeRegistry, TypeSystem};
use std::io::Write;
use tempfile::NamedTempFile;

fn write_prefs(xml: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create temp file");
    file.write_all(xml.as_bytes()).expect("write preferences");
    file
}

#[test]
fn test_rules_from_path() {
    let file = write_prefs(SERIAL_PREFERENCES);
    let rules = rules_from_path(file.path(), &ImportConfig::default()).unwrap();

    assert_eq!(rules.classifications.len(), 2);
    assert_eq!(rules.classifications[0].type_name, "Periodical");
    assert_eq!(rules.classifications[0].leader7, Some('s'));
    assert_eq!(rules.metadata.len(), 1);
    assert_eq!(rules.persons.len(), 1);
    assert_eq!(rules.persons[0].field_rules[0].ind1, IndicatorPattern::Exact('1'));
    assert_eq!(rules.persons[0].field_rules[0].expansion_codes, vec!['a']);
}

#[test]
fn test_type_system_from_same_file() {
    let file = write_prefs(SERIAL_PREFERENCES);
    let types = TypeSystem::from_preferences_path(file.path()).unwrap();

    assert!(types.has_docstruct_type("Periodical"));
    assert!(types.child_allowed("Periodical", "PeriodicalVolume"));
    assert!(types.metadata_allowed("PeriodicalVolume", "Author"));
    assert!(!types.metadata_allowed("Periodical", "Author"));
}

#[test]
fn test_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let result = rules_from_path(dir.path().join("missing.xml"), &ImportConfig::default());
    assert!(matches!(result, Err(MarcError::IoError(_))));
}

#[test]
fn test_full_mapping_options() {
    let xml = r#"<Marc>
        <Metadata>
            <Name>Subject</Name>
            <separator> / </separator>
            <field>
                <fieldMainTag>650</fieldMainTag>
                <fieldInd1>any</fieldInd1>
                <fieldSubTag>a</fieldSubTag>
                <fieldSubTag>x</fieldSubTag>
            </field>
            <conditionField>2</conditionField>
            <conditionValue>/gnd/</conditionValue>
            <identifierField>0</identifierField>
            <identifierConditionField>/DE-588/</identifierConditionField>
            <identifierReplacement>s/\(DE-588\)//</identifierReplacement>
            <fieldReplacement>s/\s+$//</fieldReplacement>
            <separateEntries>true</separateEntries>
        </Metadata>
        <Corporate>
            <Name>Publisher</Name>
            <field>
                <fieldMainTag>710</fieldMainTag>
                <fieldMainName>a</fieldMainName>
                <fieldSubName>b</fieldSubName>
                <fieldPartName>n</fieldPartName>
            </field>
            <separateMainfields>true</separateMainfields>
        </Corporate>
    </Marc>"#;
    let rules = rules_from_str(xml, &ImportConfig::default()).unwrap();

    let subject = &rules.metadata[0];
    assert_eq!(subject.separator, " / ");
    assert_eq!(subject.policy, SeparationPolicy::SeparateEntries);
    assert_eq!(subject.field_rules[0].ind1, IndicatorPattern::Any);
    assert_eq!(subject.field_rules[0].value_codes, vec!['a', 'x']);
    assert_eq!(subject.condition.as_ref().map(|c| c.code), Some('2'));
    assert!(subject.identifier.is_some());
    assert!(subject.value_replacement.is_some());

    let publisher = &rules.corporates[0];
    assert_eq!(publisher.policy, SeparationPolicy::SeparateMainfields);
    assert_eq!(publisher.field_rules[0].subname_codes, vec!['b']);
    assert_eq!(publisher.field_rules[0].partname_codes, vec!['n']);
}

#[test]
fn test_group_and_subfield_group() {
    let xml = r#"<Marc>
        <Group>
            <Name>PublisherGroup</Name>
            <Metadata>
                <Name>PlaceOfPublication</Name>
                <field><fieldMainTag>264</fieldMainTag><fieldSubTag>a</fieldSubTag></field>
            </Metadata>
        </Group>
        <SubfieldGroup>
            <Name>SubjectGroup</Name>
            <fieldMainTag>689</fieldMainTag>
            <fieldInd1>0</fieldInd1>
            <Metadata>
                <Name>SubjectTopic</Name>
                <field><fieldSubTag>a</fieldSubTag></field>
            </Metadata>
        </SubfieldGroup>
    </Marc>"#;
    let rules = rules_from_str(xml, &ImportConfig::default()).unwrap();

    assert_eq!(rules.groups.len(), 2);
    assert_eq!(rules.groups[0].scope, GroupScope::WholeRecord);
    match &rules.groups[1].scope {
        GroupScope::PerMatchingField(selector) => {
            assert_eq!(selector.main_tag, "689");
            assert_eq!(selector.ind1, IndicatorPattern::Exact('0'));
        },
        GroupScope::WholeRecord => panic!("expected a per-field group"),
    }
    assert_eq!(rules.groups[1].metadata[0].field_rules[0].main_tag, "689");
}

#[test]
fn test_groups_keep_declaration_order() {
    let xml = r#"<Marc>
        <SubfieldGroup>
            <Name>First</Name>
            <fieldMainTag>689</fieldMainTag>
            <Metadata><Name>SubjectTopic</Name><field><fieldSubTag>a</fieldSubTag></field></Metadata>
        </SubfieldGroup>
        <Description>ignored</Description>
        <Group>
            <Name>Second</Name>
            <Metadata>
                <Name>PlaceOfPublication</Name>
                <field><fieldMainTag>264</fieldMainTag><fieldSubTag>a</fieldSubTag></field>
            </Metadata>
        </Group>
        <SubfieldGroup>
            <Name>Third</Name>
            <fieldMainTag>700</fieldMainTag>
            <Person><Name>Contributor</Name><field><expansion>a</expansion></field></Person>
        </SubfieldGroup>
    </Marc>"#;
    let rules = rules_from_str(xml, &ImportConfig::default()).unwrap();

    let names: Vec<&str> = rules.groups.iter().map(|g| g.type_name.as_str()).collect();
    assert_eq!(names, vec!["First", "Second", "Third"]);
    assert!(matches!(rules.groups[0].scope, GroupScope::PerMatchingField(_)));
    assert_eq!(rules.groups[1].scope, GroupScope::WholeRecord);
    assert_eq!(rules.groups[2].persons[0].field_rules[0].main_tag, "700");
}

#[test]
fn test_invalid_replacement_is_strict_error() {
    let xml = r#"<Marc>
        <Metadata>
            <Name>TitleDocMain</Name>
            <field><fieldMainTag>245</fieldMainTag><fieldSubTag>a</fieldSubTag></field>
            <fieldReplacement>s/unterminated</fieldReplacement>
        </Metadata>
    </Marc>"#;

    let lenient = rules_from_str(xml, &ImportConfig::default()).unwrap();
    assert!(lenient.metadata.is_empty());

    let strict = rules_from_str(xml, &ImportConfig::new().with_strict_mode(true));
    assert!(matches!(strict, Err(MarcError::InvalidReplacement { .. })));
}

#[test]
fn test_unexpected_root() {
    let result = rules_from_str("<Other/>", &ImportConfig::default());
    assert!(matches!(result, Err(MarcError::Preferences(_))));
}
