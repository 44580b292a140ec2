//! MARCXML deserialization of MARC records.
//!
//! This module converts standard MARCXML, as defined by the Library of Congress
//! (<https://www.loc.gov/standards/marcxml/>), into [`Record`] values. `tag`,
//! `ind1`, `ind2`, and `code` are read from XML **attributes**.
//!
//! Default-namespace (`<record xmlns="...">`), prefix-namespace
//! (`<marc:record xmlns:marc="...">`) and namespace-free forms are all accepted:
//! any element prefix up to the first colon is stripped before parsing.
//!
//! Leader, control field and subfield text is kept verbatim, including
//! leading and trailing whitespace.
//!
//! Writing MARCXML is out of scope; records only flow into the import engine.
//!
//! # Examples
//!
//! ```
//! use marcmap::marcxml;
//!
//! let xml = r#"<marc:record xmlns:marc="http://www.loc.gov/MARC21/slim">
//!     <marc:leader>00000nam a2200000 c 4500</marc:leader>
//!     <marc:datafield tag="245" ind1="1" ind2="0">
//!         <marc:subfield code="a">Title</marc:subfield>
//!     </marc:datafield>
//! </marc:record>"#;
//!
//! let record = marcxml::marcxml_to_record(xml).unwrap();
//! assert_eq!(record.fields[0].get_subfield('a'), Some("Title"));
//! ```

use crate::error::{MarcError, Result};
use crate::leader::Leader;
use crate::record::{Field, Record};
use lazy_static::lazy_static;
use quick_xml::de::from_str as xml_from_str;
use quick_xml::escape::unescape;
use regex::{Captures, Regex};
use serde::Deserialize;

/// Name of the collection wrapper element.
pub const COLLECTION_ELEMENT: &str = "collection";
/// Name of the record element.
pub const RECORD_ELEMENT: &str = "record";

/// A `<record>` element as it appears on the wire.
#[derive(Debug, Deserialize)]
#[serde(rename = "record")]
pub struct MarcxmlRecord {
    /// Leader text, verbatim
    #[serde(default)]
    pub leader: String,
    /// `<controlfield>` children
    #[serde(default)]
    pub controlfield: Vec<MarcxmlControlField>,
    /// Data fields (tags 010+), in document order
    #[serde(default)]
    pub datafield: Vec<MarcxmlDataField>,
}

/// A `<controlfield>` element.
#[derive(Debug, Deserialize)]
pub struct MarcxmlControlField {
    /// `tag` attribute
    #[serde(rename = "@tag")]
    pub tag: String,
    /// Element text
    #[serde(rename = "$text", default)]
    pub value: String,
}

/// A `<datafield>` element.
#[derive(Debug, Deserialize)]
pub struct MarcxmlDataField {
    /// `tag` attribute
    #[serde(rename = "@tag")]
    pub tag: String,
    /// `ind1` attribute, possibly blank or absent
    #[serde(rename = "@ind1", default)]
    pub ind1: String,
    /// `ind2` attribute, possibly blank or absent
    #[serde(rename = "@ind2", default)]
    pub ind2: String,
    /// Subfields
    #[serde(default)]
    pub subfield: Vec<MarcxmlSubfield>,
}

/// A `<subfield>` element.
#[derive(Debug, Deserialize)]
pub struct MarcxmlSubfield {
    /// `code` attribute
    #[serde(rename = "@code")]
    pub code: String,
    /// Element text
    #[serde(rename = "$text", default)]
    pub value: String,
}

/// A `<collection>` element.
#[derive(Debug, Deserialize)]
#[serde(rename = "collection")]
pub struct MarcxmlCollection {
    /// `<record>` children, in document order
    #[serde(default, rename = "record")]
    pub records: Vec<MarcxmlRecord>,
}

/// A parsed MARCXML document, distinguished by its root element.
#[derive(Debug)]
pub enum MarcxmlDocument {
    /// A `<collection>` root wrapping zero or more records, in document order
    Collection(Vec<Record>),
    /// A single `<record>` root
    Record(Record),
}

lazy_static! {
    static ref XMLNS_DECL: Regex = Regex::new(r#"\s+xmlns(?::[\w.-]+)?\s*=\s*"[^"]*""#)
        .expect("xmlns pattern is valid");
    static ref ELEMENT_PREFIX: Regex =
        Regex::new(r"<(/?)[\w.-]+:").expect("element prefix pattern is valid");
    static ref ROOT_ELEMENT: Regex =
        Regex::new(r"<([A-Za-z_][\w.-]*)[\s/>]").expect("root element pattern is valid");
    static ref TEXT_CONTENT: Regex = Regex::new(
        r"<(leader|controlfield|subfield)((?:\s[^>]*[^/>])?)>([^<]*)</(leader|controlfield|subfield)>"
    )
    .expect("text content pattern is valid");
}

/// Drop `xmlns` declarations and element prefixes (`marc:record` reads as `record`).
pub(crate) fn strip_namespaces(xml: &str) -> String {
    let stripped = XMLNS_DECL.replace_all(xml, "");
    ELEMENT_PREFIX.replace_all(&stripped, "<$1").into_owned()
}

/// Wrap padded text content in CDATA so the deserializer keeps its whitespace.
fn preserve_text(cleaned: &str) -> String {
    TEXT_CONTENT
        .replace_all(cleaned, |caps: &Captures| {
            let raw = &caps[3];
            if raw.trim() == raw {
                return caps[0].to_string();
            }
            match unescape(raw) {
                Ok(text) => format!(
                    "<{}{}><![CDATA[{}]]></{}>",
                    &caps[1],
                    &caps[2],
                    text.replace("]]>", "]]]]><![CDATA[>"),
                    &caps[4]
                ),
                Err(_) => caps[0].to_string(),
            }
        })
        .into_owned()
}

/// Name of the first element of an already namespace-stripped document.
pub(crate) fn root_element(cleaned: &str) -> Option<&str> {
    ROOT_ELEMENT
        .captures(cleaned)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Read a single `<record>` document.
///
/// # Errors
///
/// Returns [`MarcError::ParseError`] for malformed XML and
/// [`MarcError::InvalidField`] for a subfield without a code.
pub fn marcxml_to_record(xml: &str) -> Result<Record> {
    read_record(&strip_namespaces(xml))
}

/// Read a `<collection>` document, keeping document order.
///
/// # Errors
///
/// As [`marcxml_to_record`], for any record of the collection.
pub fn marcxml_to_records(xml: &str) -> Result<Vec<Record>> {
    read_collection(&strip_namespaces(xml))
}

/// Read a document whose root is either `<collection>` or `<record>`.
///
/// # Errors
///
/// Returns [`MarcError::ParseError`] for any other root element or malformed
/// XML, and [`MarcError::InvalidField`] for a subfield without a code.
pub fn parse_document(xml: &str) -> Result<MarcxmlDocument> {
    let cleaned = strip_namespaces(xml);
    match root_element(&cleaned) {
        Some(COLLECTION_ELEMENT) => read_collection(&cleaned).map(MarcxmlDocument::Collection),
        Some(RECORD_ELEMENT) => read_record(&cleaned).map(MarcxmlDocument::Record),
        Some(other) => Err(MarcError::ParseError(format!(
            "unexpected root element '{other}', expected '{COLLECTION_ELEMENT}' or '{RECORD_ELEMENT}'"
        ))),
        None => Err(MarcError::ParseError("document has no root element".to_string())),
    }
}

fn read_record(cleaned: &str) -> Result<Record> {
    let wire: MarcxmlRecord = xml_from_str(&preserve_text(cleaned))
        .map_err(|e| MarcError::ParseError(format!("malformed MARCXML record: {e}")))?;
    into_record(wire)
}

fn read_collection(cleaned: &str) -> Result<Vec<Record>> {
    let wire: MarcxmlCollection = xml_from_str(&preserve_text(cleaned))
        .map_err(|e| MarcError::ParseError(format!("malformed MARCXML collection: {e}")))?;
    wire.records.into_iter().map(into_record).collect()
}

/// Blank and missing indicators both become `' '`.
fn indicator(raw: &str) -> char {
    raw.trim().chars().next().unwrap_or(' ')
}

/// Lower a wire record into the in-memory model.
fn into_record(wire: MarcxmlRecord) -> Result<Record> {
    let mut record = Record::new(Leader::new(wire.leader));

    for control in wire.controlfield {
        record.add_control_field(control.tag, control.value);
    }

    for data in wire.datafield {
        let mut field = Field::new(data.tag, indicator(&data.ind1), indicator(&data.ind2));

        for subfield in data.subfield {
            let code = subfield.code.chars().next().ok_or_else(|| {
                MarcError::InvalidField(format!("Missing subfield code in field {}", field.tag))
            })?;
            field.add_subfield(code, subfield.value);
        }

        record.add_field(field);
    }

    Ok(record)
}
