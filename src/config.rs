//! Configuration options for MARC import.
//!
//! This module provides the [`ImportConfig`] struct which controls how rule
//! configuration is loaded and how extracted identifiers are labelled.

use std::fmt;

/// Authority scheme attached to every entity carrying an identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorityScheme {
    /// Scheme label, e.g. `gnd`
    pub id: String,
    /// Prefix that turns an identifier into a resolvable URI
    pub uri_prefix: String,
}

impl AuthorityScheme {
    /// Creates a scheme from its label and URI prefix.
    #[must_use]
    pub fn new(id: impl Into<String>, uri_prefix: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            uri_prefix: uri_prefix.into(),
        }
    }

    /// The Integrated Authority File of the German National Library.
    #[must_use]
    pub fn gnd() -> Self {
        Self::new("gnd", "http://d-nb.info/gnd/")
    }

    /// Resolvable URI for an identifier in this scheme.
    #[must_use]
    pub fn uri_for(&self, identifier: &str) -> String {
        format!("{}{identifier}", self.uri_prefix)
    }
}

impl Default for AuthorityScheme {
    fn default() -> Self {
        Self::gnd()
    }
}

impl fmt::Display for AuthorityScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <{}>", self.id, self.uri_prefix)
    }
}

/// Configuration for MARC import.
///
/// # Examples
///
/// ```
/// use marcmap::{AuthorityScheme, ImportConfig};
///
/// let config = ImportConfig::new()
///     .with_authority(AuthorityScheme::new("viaf", "http://viaf.org/viaf/"))
///     .with_strict_mode(true);
/// assert_eq!(config.authority.id, "viaf");
/// ```
#[derive(Debug, Clone, Default)]
pub struct ImportConfig {
    /// Scheme attached to extracted identifiers.
    pub authority: AuthorityScheme,

    /// Strict rule loading.
    ///
    /// When true, a mapping that fails validation aborts loading.
    /// When false (default), the mapping is logged and skipped.
    pub strict: bool,
}

impl ImportConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the authority scheme.
    #[must_use]
    pub fn with_authority(mut self, authority: AuthorityScheme) -> Self {
        self.authority = authority;
        self
    }

    /// Enables strict rule loading.
    #[must_use]
    pub const fn with_strict_mode(mut self, enabled: bool) -> Self {
        self.strict = enabled;
        self
    }
}
