//! Common test helpers shared across the test suite.

#![allow(dead_code)]

use marcmap::{Field, Leader, Record};

/// Leader of a printed monograph.
pub const MONOGRAPH_LEADER: &str = "00000nam a2200000 c 4500";
/// Leader of a serial.
pub const SERIAL_LEADER: &str = "00000nas a2200000 c 4500";

/// Creates a data field from `(code, value)` pairs.
pub fn field(tag: &str, ind1: char, ind2: char, subfields: &[(char, &str)]) -> Field {
    let mut field = Field::new(tag.to_string(), ind1, ind2);
    for (code, value) in subfields {
        field.add_subfield_str(*code, value);
    }
    field
}

/// Creates a record with the given leader and data fields.
pub fn record(leader: &str, fields: Vec<Field>) -> Record {
    let mut record = Record::new(Leader::new(leader));
    for f in fields {
        record.add_field(f);
    }
    record
}

/// Creates a realistic monograph record.
///
/// Includes a main entry, an added entry with a GND number, a corporate
/// body, a title and two imprint statements.
pub fn create_realistic_record() -> Record {
    let mut record = record(
        MONOGRAPH_LEADER,
        vec![
            field(
                "100",
                '1',
                ' ',
                &[('a', "Fontane, Theodor"), ('0', "(DE-588)118534262")],
            ),
            field(
                "110",
                '2',
                ' ',
                &[
                    ('a', "Deutsche Schillergesellschaft"),
                    ('b', "Arbeitsstelle"),
                    ('b', " "),
                ],
            ),
            field("245", '1', '0', &[('a', "Effi Briest"), ('b', "Roman")]),
            field("264", ' ', '1', &[('a', "Berlin"), ('b', "Fontane"), ('c', "1896")]),
            field("264", ' ', '1', &[('a', "Stuttgart"), ('c', "1950")]),
            field(
                "700",
                '1',
                ' ',
                &[('a', "Kutschmann, Theodor"), ('0', "(DE-588)115747876X"), ('4', "ill")],
            ),
        ],
    );
    record.add_control_field_str("001", "1000001");
    record.add_control_field_str("008", "850101s1896    gw            000 0 ger d");
    record
}

/// MARCXML of a serial followed by one of its volumes.
pub const SERIAL_COLLECTION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<collection xmlns="http://www.loc.gov/MARC21/slim">
  <record>
    <leader>00000nas a2200000 c 4500</leader>
    <controlfield tag="001">2000001</controlfield>
    <datafield tag="245" ind1="0" ind2="0">
      <subfield code="a">Deutsche Rundschau</subfield>
    </datafield>
  </record>
  <record>
    <leader>00000nam a2200000 c 4500</leader>
    <controlfield tag="001">2000002</controlfield>
    <datafield tag="245" ind1="0" ind2="0">
      <subfield code="a">Jahrgang 1</subfield>
    </datafield>
    <datafield tag="100" ind1="1" ind2=" ">
      <subfield code="a">Rodenberg, Julius</subfield>
    </datafield>
  </record>
</collection>"#;

/// Preferences document with a type system and MARC rules for
/// [`SERIAL_COLLECTION`].
pub const SERIAL_PREFERENCES: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Preferences>
  <MetadataType><Name>TitleDocMain</Name></MetadataType>
  <MetadataType type="person"><Name>Author</Name></MetadataType>
  <DocStrctType topStruct="true">
    <Name>Periodical</Name>
    <allowedchildtype>PeriodicalVolume</allowedchildtype>
    <metadata num="1m">TitleDocMain</metadata>
  </DocStrctType>
  <DocStrctType>
    <Name>PeriodicalVolume</Name>
    <metadata num="1m">TitleDocMain</metadata>
    <metadata num="*">Author</metadata>
  </DocStrctType>
  <Formats>
    <Marc>
      <Docstruct><Name>Periodical</Name><leader7>s</leader7></Docstruct>
      <Docstruct><Name>PeriodicalVolume</Name><leader7>m</leader7></Docstruct>
      <Metadata>
        <Name>TitleDocMain</Name>
        <field><fieldMainTag>245</fieldMainTag><fieldSubTag>a</fieldSubTag></field>
      </Metadata>
      <Person>
        <Name>Author</Name>
        <field><fieldMainTag>100</fieldMainTag><fieldInd1>1</fieldInd1><expansion>a</expansion></field>
      </Person>
    </Marc>
  </Formats>
</Preferences>"#;
