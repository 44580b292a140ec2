#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

//! ## Modules
//!
//! - [`record`]: In-memory MARC records (`Record`, `Field`, `Subfield`)
//! - [`leader`]: MARC record leader (24-byte header)
//! - [`marcxml`]: Reading MARCXML documents into records
//! - [`rules`]: Mapping rules and the `Preferences` loader
//! - [`replacement`]: Match patterns and `s/pattern/template/flags` replacements
//! - [`field_matcher`]: Field selection and subfield conditions
//! - [`classifier`]: Structural type classification from leader and control fields
//! - [`extractor`]: Metadata, person and corporate extraction
//! - [`groups`]: Metadata group composition
//! - [`type_system`]: Destination type system
//! - [`document`]: Destination document model
//! - [`importer`]: Record import and the MARC file format
//! - [`config`]: Import configuration
//! - [`error`]: Error types and result type

pub mod classifier;
pub mod config;
pub mod document;
pub mod entity;
pub mod error;
pub mod extractor;
pub mod field_matcher;
pub mod groups;
pub mod importer;
pub mod leader;
pub mod marcxml;
/// Core MARC record structures (`Record`, `Field`, `Subfield`)
pub mod record;
pub mod replacement;
pub mod rules;
pub mod type_system;

pub use classifier::classify;
pub use config::{AuthorityScheme, ImportConfig};
pub use document::{DigitalDocument, DocStruct};
pub use entity::{Authority, CorporateName, Entity, Group, MetadataValue, PersonName};
pub use error::{MarcError, Result};
pub use importer::{Fileformat, MarcFileformat, MarcImporter, RecordExtraction};
pub use leader::Leader;
pub use marcxml::{marcxml_to_record, marcxml_to_records};
pub use record::{Field, FieldBuilder, Record, RecordBuilder, Subfield};
pub use replacement::{MatchPattern, Replacement};
pub use rules::{
    ClassificationRule, EntityKind, EntityMapping, FieldRule, GroupMapping, GroupScope,
    IndicatorPattern, RuleSet, SeparationPolicy,
};
pub use type_system::{TypeRegistry, TypeSystem};
