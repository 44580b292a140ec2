//! MARC import facade.
//!
//! [`MarcImporter`] ties the engine together: it classifies a record,
//! extracts every configured entity and group, and attaches the results to a
//! [`DocStruct`] validated by a [`TypeRegistry`]. It holds only immutable
//! configuration, so one importer can serve many records at once.
//!
//! # Examples
//!
//! ```
//! use marcmap::rules::{ClassificationRule, EntityKind, EntityMapping, FieldRule, RuleSet};
//! use marcmap::type_system::TypeSystem;
//! use marcmap::{marcxml, ImportConfig, MarcImporter};
//!
//! let rules = RuleSet::new()
//!     .with_classification(ClassificationRule::new("Monograph"))
//!     .with_mapping(
//!         EntityMapping::builder(EntityKind::Metadata, "TitleDocMain")
//!             .field_rule(FieldRule::new("245").value_codes(&['a']))
//!             .build()
//!             .unwrap(),
//!     );
//! let importer = MarcImporter::new(rules, ImportConfig::default());
//!
//! let record = marcxml::marcxml_to_record(
//!     r#"<record><leader>00000nam a2200000 c 4500</leader>
//!        <datafield tag="245" ind1="1" ind2="0"><subfield code="a">Faust</subfield></datafield>
//!        </record>"#,
//! )
//! .unwrap();
//!
//! let unit = importer.import_record(&record, &TypeSystem::permissive()).unwrap();
//! assert_eq!(unit.type_name, "Monograph");
//! assert_eq!(unit.metadata[0].value, "Faust");
//! ```

use crate::classifier::classify;
use crate::config::ImportConfig;
use crate::document::{DigitalDocument, DocStruct};
use crate::entity::{CorporateName, Group, MetadataValue, PersonName};
use crate::error::{MarcError, Result};
use crate::extractor;
use crate::groups;
use crate::marcxml::{self, MarcxmlDocument};
use crate::record::{Field, Record};
use crate::rules::{loader, EntityMapping, RuleSet};
use crate::type_system::TypeRegistry;
use rayon::prelude::*;
use serde::Serialize;
use std::path::Path;
use tracing::{debug, error, warn};

/// Everything extracted from one record, before attachment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordExtraction {
    /// Structural type chosen by classification
    pub docstruct_type: String,
    /// Metadata values, in mapping order
    pub metadata: Vec<MetadataValue>,
    /// Persons, in mapping order
    pub persons: Vec<PersonName>,
    /// Corporate bodies, in mapping order
    pub corporates: Vec<CorporateName>,
    /// Metadata groups, in mapping order
    pub groups: Vec<Group>,
}

/// Rule-driven MARC importer.
#[derive(Debug, Clone)]
pub struct MarcImporter {
    rules: RuleSet,
    config: ImportConfig,
}

impl MarcImporter {
    /// Create an importer from prepared rules.
    #[must_use]
    pub fn new(rules: RuleSet, config: ImportConfig) -> Self {
        MarcImporter { rules, config }
    }

    /// Create an importer from a preferences document.
    ///
    /// # Errors
    ///
    /// Returns the loader's errors; see [`loader::rules_from_str`].
    pub fn from_preferences_str(xml: &str, config: ImportConfig) -> Result<Self> {
        let rules = loader::rules_from_str(xml, &config)?;
        Ok(Self::new(rules, config))
    }

    /// Create an importer from a preferences file.
    ///
    /// # Errors
    ///
    /// Returns the loader's errors; see [`loader::rules_from_path`].
    pub fn from_preferences_path(path: impl AsRef<Path>, config: ImportConfig) -> Result<Self> {
        let rules = loader::rules_from_path(path, &config)?;
        Ok(Self::new(rules, config))
    }

    /// The rules in use.
    #[must_use]
    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// The configuration in use.
    #[must_use]
    pub fn config(&self) -> &ImportConfig {
        &self.config
    }

    /// Structural type of a record, or `None` if no rule matches.
    #[must_use]
    pub fn classify(&self, record: &Record) -> Option<&str> {
        classify(&record.leader, &record.control_fields, &self.rules.classifications)
    }

    /// Metadata values of all top-level metadata mappings.
    #[must_use]
    pub fn extract_metadata(&self, fields: &[Field]) -> Vec<MetadataValue> {
        let authority = &self.config.authority;
        collect_all(&self.rules.metadata, |m| extractor::extract_metadata(fields, m, authority))
    }

    /// Persons of all top-level person mappings.
    #[must_use]
    pub fn extract_persons(&self, fields: &[Field]) -> Vec<PersonName> {
        let authority = &self.config.authority;
        collect_all(&self.rules.persons, |m| extractor::extract_persons(fields, m, authority))
    }

    /// Corporate bodies of all top-level corporate mappings.
    #[must_use]
    pub fn extract_corporates(&self, fields: &[Field]) -> Vec<CorporateName> {
        let authority = &self.config.authority;
        collect_all(&self.rules.corporates, |m| extractor::extract_corporates(fields, m, authority))
    }

    /// Groups of all group mappings.
    #[must_use]
    pub fn compose_groups(&self, fields: &[Field]) -> Vec<Group> {
        groups::compose_groups(fields, &self.rules.groups, &self.config.authority)
    }

    /// Classify a record and extract everything the rules describe.
    ///
    /// # Errors
    ///
    /// Returns [`MarcError::Unclassified`] if no classification rule matches.
    pub fn extract(&self, record: &Record) -> Result<RecordExtraction> {
        let docstruct_type = self.classify(record).ok_or_else(|| MarcError::Unclassified {
            leader: record.leader.to_string(),
        })?;

        let fields = record.fields.as_slice();
        let extraction = RecordExtraction {
            docstruct_type: docstruct_type.to_string(),
            metadata: self.extract_metadata(fields),
            persons: self.extract_persons(fields),
            corporates: self.extract_corporates(fields),
            groups: self.compose_groups(fields),
        };
        debug!(
            docstruct = %extraction.docstruct_type,
            metadata = extraction.metadata.len(),
            persons = extraction.persons.len(),
            corporates = extraction.corporates.len(),
            groups = extraction.groups.len(),
            "extracted record"
        );
        Ok(extraction)
    }

    /// Extract many records in parallel.
    ///
    /// Results are returned in input order.
    #[must_use]
    pub fn extract_batch(&self, records: &[Record]) -> Vec<Result<RecordExtraction>> {
        records.par_iter().map(|record| self.extract(record)).collect()
    }

    /// Build the structural unit of one record.
    ///
    /// Metadata, corporate bodies, persons and groups are attached in that
    /// order; rejected attachments are logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns [`MarcError::Unclassified`] if no classification rule matches
    /// and [`MarcError::UnknownType`] if the registry does not know the
    /// chosen structural type.
    pub fn import_record(&self, record: &Record, registry: &dyn TypeRegistry) -> Result<DocStruct> {
        let extraction = self.extract(record)?;
        let mut unit = DocStruct::new(&extraction.docstruct_type, registry)?;

        for md in extraction.metadata {
            skip_rejected(unit.add_metadata(md, registry), &extraction.docstruct_type);
        }
        for corporate in extraction.corporates {
            skip_rejected(unit.add_corporate(corporate, registry), &extraction.docstruct_type);
        }
        for person in extraction.persons {
            skip_rejected(unit.add_person(person, registry), &extraction.docstruct_type);
        }
        for group in extraction.groups {
            skip_rejected(unit.add_metadata_group(group, registry), &extraction.docstruct_type);
        }

        Ok(unit)
    }

    /// Import a collection of records into one document.
    ///
    /// Records that cannot be classified are logged and skipped. Each
    /// imported unit becomes the child of the one imported before it.
    ///
    /// # Errors
    ///
    /// Returns [`MarcError::ChildTypeNotAllowed`] if a unit cannot be added
    /// below its predecessor.
    pub fn import_collection(&self, records: &[Record], registry: &dyn TypeRegistry) -> Result<DigitalDocument> {
        let mut document = DigitalDocument::new();
        for (index, record) in records.iter().enumerate() {
            match self.import_record(record, registry) {
                Ok(unit) => document.append(unit, registry)?,
                Err(err) => {
                    error!(record = index, error = %err, "skipping MARC record");
                },
            }
        }
        Ok(document)
    }

    /// Import a MARCXML document with a `collection` or `record` root.
    ///
    /// # Errors
    ///
    /// Returns parse errors, errors of [`import_collection`](Self::import_collection)
    /// for a collection, and errors of [`import_record`](Self::import_record)
    /// for a single record.
    pub fn read_marcxml(&self, xml: &str, registry: &dyn TypeRegistry) -> Result<DigitalDocument> {
        match marcxml::parse_document(xml)? {
            MarcxmlDocument::Collection(records) => self.import_collection(&records, registry),
            MarcxmlDocument::Record(record) => {
                let unit = self.import_record(&record, registry).map_err(|err| {
                    error!(error = %err, "MARC record could not be imported");
                    err
                })?;
                Ok(DigitalDocument::with_root(unit))
            },
        }
    }
}

fn collect_all<T>(mappings: &[EntityMapping], extract: impl Fn(&EntityMapping) -> Vec<T>) -> Vec<T> {
    mappings.iter().flat_map(extract).collect()
}

fn skip_rejected(result: Result<()>, docstruct: &str) {
    if let Err(err) = result {
        warn!(docstruct = %docstruct, error = %err, "ignoring rejected entity");
    }
}

/// A file format able to produce a [`DigitalDocument`].
pub trait Fileformat: std::fmt::Debug {
    /// Read a document from its serialized form, replacing the current one.
    ///
    /// # Errors
    ///
    /// Returns an error if the input cannot be parsed or imported.
    fn read(&mut self, input: &str) -> Result<()>;

    /// Read a document from a file.
    ///
    /// # Errors
    ///
    /// Returns [`MarcError::IoError`] if the file cannot be read, otherwise as
    /// [`read`](Self::read).
    fn read_path(&mut self, path: &Path) -> Result<()> {
        let input = std::fs::read_to_string(path)?;
        self.read(&input)
    }

    /// Write the current document.
    ///
    /// # Errors
    ///
    /// Formats that cannot write return [`MarcError::Unsupported`].
    fn write(&self, path: &Path) -> Result<()>;

    /// Update a previously written document.
    ///
    /// # Errors
    ///
    /// Formats that cannot write return [`MarcError::Unsupported`].
    fn update(&self, path: &Path) -> Result<()>;

    /// Whether [`write`](Self::write) is supported.
    fn is_writable(&self) -> bool {
        false
    }

    /// Whether the format can export documents.
    fn is_exportable(&self) -> bool {
        false
    }

    /// Human-readable format name.
    fn display_name(&self) -> &'static str;

    /// The document read last.
    fn digital_document(&self) -> &DigitalDocument;
}

/// MARCXML as a read-only [`Fileformat`].
#[derive(Debug)]
pub struct MarcFileformat<R: TypeRegistry> {
    importer: MarcImporter,
    registry: R,
    document: DigitalDocument,
}

impl<R: TypeRegistry> MarcFileformat<R> {
    /// Create the format from an importer and the destination type registry.
    pub fn new(importer: MarcImporter, registry: R) -> Self {
        MarcFileformat {
            importer,
            registry,
            document: DigitalDocument::new(),
        }
    }

    /// The importer in use.
    pub fn importer(&self) -> &MarcImporter {
        &self.importer
    }
}

impl<R: TypeRegistry> Fileformat for MarcFileformat<R> {
    fn read(&mut self, input: &str) -> Result<()> {
        self.document = self.importer.read_marcxml(input, &self.registry)?;
        Ok(())
    }

    fn write(&self, _path: &Path) -> Result<()> {
        Err(MarcError::Unsupported("writing MARC documents"))
    }

    fn update(&self, _path: &Path) -> Result<()> {
        Err(MarcError::Unsupported("updating MARC documents"))
    }

    fn display_name(&self) -> &'static str {
        "MARC"
    }

    fn digital_document(&self) -> &DigitalDocument {
        &self.document
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leader::Leader;
    use crate::rules::{ClassificationRule, EntityKind, FieldRule};
    use crate::type_system::TypeSystem;

    fn importer() -> MarcImporter {
        let rules = RuleSet::new()
            .with_classification(ClassificationRule::new("Periodical").leader7('s'))
            .with_classification(ClassificationRule::new("Monograph").leader7('m'))
            .with_mapping(
                EntityMapping::builder(EntityKind::Metadata, "TitleDocMain")
                    .field_rule(FieldRule::new("245").value_codes(&['a']))
                    .build()
                    .unwrap(),
            );
        MarcImporter::new(rules, ImportConfig::default())
    }

    fn record(leader: &str, title: &str) -> Record {
        let mut field = Field::new("245".to_string(), '1', '0');
        field.add_subfield_str('a', title);
        Record::builder(Leader::new(leader)).field(field).build()
    }

    #[test]
    fn test_extract_unclassified() {
        let err = importer().extract(&record("00000nac", "Title")).unwrap_err();
        assert!(matches!(err, MarcError::Unclassified { .. }));
        assert!(err.is_record_level());
    }

    #[test]
    fn test_import_skips_rejected_metadata() {
        let mut types = TypeSystem::new();
        types.add_docstruct_type("Monograph");
        let unit = importer()
            .import_record(&record("00000nam", "Title"), &types)
            .unwrap();
        assert_eq!(unit.type_name, "Monograph");
        assert!(unit.metadata.is_empty());
    }

    #[test]
    fn test_import_collection_skips_unclassified() {
        let records = vec![
            record("00000nas", "Journal"),
            record("00000nax", "Unknown"),
            record("00000nam", "Volume"),
        ];
        let document = importer()
            .import_collection(&records, &TypeSystem::permissive())
            .unwrap();
        assert_eq!(document.chain_len(), 2);
        assert_eq!(document.logical().unwrap().type_name, "Periodical");
        assert_eq!(document.chain()[1].type_name, "Monograph");
    }

    #[test]
    fn test_extract_batch_preserves_order() {
        let records: Vec<Record> = (0..20)
            .map(|i| record("00000nam", &format!("Title {i}")))
            .collect();
        let results = importer().extract_batch(&records);
        assert_eq!(results.len(), 20);
        for (i, result) in results.iter().enumerate() {
            assert_eq!(result.as_ref().unwrap().metadata[0].value, format!("Title {i}"));
        }
    }

    #[test]
    fn test_fileformat_is_read_only() {
        let format = MarcFileformat::new(importer(), TypeSystem::permissive());
        assert_eq!(format.display_name(), "MARC");
        assert!(!format.is_writable());
        assert!(!format.is_exportable());
        assert!(matches!(
            format.write(Path::new("out.xml")),
            Err(MarcError::Unsupported(_))
        ));
        assert!(matches!(
            format.update(Path::new("out.xml")),
            Err(MarcError::Unsupported(_))
        ));
        assert!(format.digital_document().logical().is_none());
    }
}
