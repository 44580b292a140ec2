//! Structural classification through the importer facade.

mod common;

use common::{record, MONOGRAPH_LEADER, SERIAL_LEADER};
use marcmap::rules::{ClassificationRule, RuleSet};
use marcmap::{ImportConfig, MarcError, MarcImporter, Record};

fn importer() -> MarcImporter {
    let rules = RuleSet::new()
        .with_classification(ClassificationRule::new("Map").leader6('e'))
        .with_classification(
            ClassificationRule::new("Newspaper")
                .leader7('s')
                .field008_21('n'),
        )
        .with_classification(ClassificationRule::new("Periodical").leader7('s'))
        .with_classification(
            ClassificationRule::new("MultivolumeWork")
                .leader7('m')
                .leader19('a'),
        )
        .with_classification(
            ClassificationRule::new("Microform")
                .leader7('m')
                .field007_0('h')
                .field007_1('d'),
        )
        .with_classification(ClassificationRule::new("Monograph").leader7('m'));
    MarcImporter::new(rules, ImportConfig::default())
}

fn serial(position21: char) -> Record {
    let mut record = record(SERIAL_LEADER, Vec::new());
    let mut fixed = String::from("850101c19009999gw d  ");
    fixed.push(position21);
    fixed.push_str("       0   a0ger c");
    record.add_control_field_str("008", &fixed);
    record
}

#[test]
fn test_first_matching_rule_wins() {
    let importer = importer();
    assert_eq!(importer.classify(&serial('n')), Some("Newspaper"));
    assert_eq!(importer.classify(&serial('p')), Some("Periodical"));
    assert_eq!(
        importer.classify(&record(MONOGRAPH_LEADER, Vec::new())),
        Some("Monograph")
    );
}

#[test]
fn test_leader19_rule() {
    let record = record("00000nam a2200000 ca4500", Vec::new());
    assert_eq!(importer().classify(&record), Some("MultivolumeWork"));
}

#[test]
fn test_field007_rule() {
    let mut record = record(MONOGRAPH_LEADER, Vec::new());
    record.add_control_field_str("007", "hd afa012baca");
    assert_eq!(importer().classify(&record), Some("Microform"));
}

#[test]
fn test_missing_control_field_does_not_match_positional_rule() {
    let record = record(SERIAL_LEADER, Vec::new());
    assert_eq!(importer().classify(&record), Some("Periodical"));
}

#[test]
fn test_unclassified_record() {
    let record = record("00000nac a2200000 c 4500", Vec::new());
    assert_eq!(importer().classify(&record), None);
    assert!(matches!(
        importer().extract(&record),
        Err(MarcError::Unclassified { .. })
    ));
}

#[test]
fn test_single_rule_applies_unconditionally() {
    let rules = RuleSet::new().with_classification(ClassificationRule::new("Monograph").leader7('m'));
    let importer = MarcImporter::new(rules, ImportConfig::default());
    assert_eq!(
        importer.classify(&record(SERIAL_LEADER, Vec::new())),
        Some("Monograph")
    );
}
