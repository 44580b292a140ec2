//! Error types for MARC import operations.
//!
//! This module provides the [`MarcError`] type for all library operations
//! and the [`Result`] convenience type.
//!
//! Errors fall into three groups:
//! - configuration errors, raised while rules are built or loaded
//! - per-entity rejections from the destination model, which callers log and skip
//! - record-level failures ([`MarcError::Unclassified`], [`MarcError::ChildTypeNotAllowed`])

use thiserror::Error;

/// Error type for all MARC import operations.
#[derive(Error, Debug)]
pub enum MarcError {
    /// A match pattern could not be compiled.
    #[error("Invalid pattern '{pattern}': {reason}")]
    InvalidPattern {
        /// The pattern as configured
        pattern: String,
        /// Why it was rejected
        reason: String,
    },

    /// A replacement rule is not of the form `s/pattern/template/flags`.
    #[error("Invalid replacement rule '{rule}': {reason}")]
    InvalidReplacement {
        /// The replacement rule as configured
        rule: String,
        /// Why it was rejected
        reason: String,
    },

    /// A mapping rule is missing a required element or carries a malformed one.
    #[error("Invalid rule for '{type_name}': {reason}")]
    InvalidRule {
        /// Internal type name of the offending mapping
        type_name: String,
        /// Why it was rejected
        reason: String,
    },

    /// The preferences document could not be read.
    #[error("Preferences error: {0}")]
    Preferences(String),

    /// Error during parsing of MARCXML data.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Error indicating an invalid field structure.
    #[error("Invalid field: {0}")]
    InvalidField(String),

    /// No classification rule matched the record.
    #[error("No structural type matches record (leader '{leader}')")]
    Unclassified {
        /// Leader of the record that failed classification
        leader: String,
    },

    /// A type name is unknown to the destination type system.
    #[error("Unknown type: {0}")]
    UnknownType(String),

    /// A metadata, person, corporate or group type is not allowed on a structural unit.
    #[error("Type '{type_name}' not allowed for '{docstruct}'")]
    MetadataTypeNotAllowed {
        /// Rejected metadata type
        type_name: String,
        /// Structural type that rejected it
        docstruct: String,
    },

    /// An entity lacks the values the destination model requires.
    #[error("Incomplete {kind} of type '{type_name}'")]
    IncompleteEntity {
        /// Entity kind (person, corporate, ...)
        kind: &'static str,
        /// Type of the incomplete entity
        type_name: String,
    },

    /// A structural unit cannot be added as a child of the given parent.
    #[error("Child type '{child}' not allowed for parent type '{parent}'")]
    ChildTypeNotAllowed {
        /// Parent structural type
        parent: String,
        /// Rejected child structural type
        child: String,
    },

    /// The operation is not supported by the MARC file format.
    #[error("Unsupported operation: {0}")]
    Unsupported(&'static str),

    /// IO error from the underlying source.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl MarcError {
    /// Returns `true` if this error aborts the record it occurred in.
    ///
    /// Per-entity rejections and configuration problems are recovered
    /// locally; only classification and structural failures are fatal.
    #[must_use]
    pub fn is_record_level(&self) -> bool {
        matches!(
            self,
            MarcError::Unclassified { .. } | MarcError::ChildTypeNotAllowed { .. }
        )
    }
}

/// Convenience type alias for [`std::result::Result`] with [`MarcError`].
pub type Result<T> = std::result::Result<T, MarcError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_level_classification() {
        let err = MarcError::Unclassified {
            leader: "00000nam".to_string(),
        };
        assert!(err.is_record_level());

        let err = MarcError::ChildTypeNotAllowed {
            parent: "Monograph".to_string(),
            child: "Volume".to_string(),
        };
        assert!(err.is_record_level());

        let err = MarcError::UnknownType("Foo".to_string());
        assert!(!err.is_record_level());
    }

    #[test]
    fn test_error_display() {
        let err = MarcError::InvalidReplacement {
            rule: "s/a".to_string(),
            reason: "missing template".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid replacement rule 's/a': missing template"
        );
    }
}
