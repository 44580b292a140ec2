//! Destination type system.
//!
//! Extracted entities are attached to structural units whose types come from
//! a ruleset: which metadata types and groups exist, which of them a given
//! structural type may carry, and which child types it accepts. The
//! [`TypeRegistry`] trait is the seam; [`TypeSystem`] is the in-memory
//! implementation, built in code or read from the `Preferences` document.
//!
//! ```xml
//! <Preferences>
//!   <MetadataType><Name>TitleDocMain</Name></MetadataType>
//!   <Group><Name>PublisherGroup</Name></Group>
//!   <DocStrctType>
//!     <Name>Monograph</Name>
//!     <allowedchildtype>Volume</allowedchildtype>
//!     <metadata num="1m">TitleDocMain</metadata>
//!     <group>PublisherGroup</group>
//!   </DocStrctType>
//! </Preferences>
//! ```

use crate::error::{MarcError, Result};
use indexmap::{IndexMap, IndexSet};
use quick_xml::de::from_str as xml_from_str;
use serde::Deserialize;
use std::path::Path;

/// Queries the import engine asks of the destination type system.
pub trait TypeRegistry: std::fmt::Debug + Send + Sync {
    /// Returns `true` if the structural type exists.
    fn has_docstruct_type(&self, name: &str) -> bool;

    /// Returns `true` if the metadata type exists.
    fn has_metadata_type(&self, name: &str) -> bool;

    /// Returns `true` if the group type exists.
    fn has_group_type(&self, name: &str) -> bool;

    /// Returns `true` if `docstruct` may carry metadata of type `metadata_type`.
    fn metadata_allowed(&self, docstruct: &str, metadata_type: &str) -> bool;

    /// Returns `true` if `docstruct` may carry groups of type `group`.
    fn group_allowed(&self, docstruct: &str, group: &str) -> bool;

    /// Returns `true` if `child` may be added below `parent`.
    fn child_allowed(&self, parent: &str, child: &str) -> bool;
}

/// Allowances of one structural type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocStructType {
    /// Metadata types (including person and corporate roles) it may carry
    pub metadata: IndexSet<String>,
    /// Group types it may carry
    pub groups: IndexSet<String>,
    /// Structural types allowed as children
    pub children: IndexSet<String>,
}

/// In-memory [`TypeRegistry`].
///
/// # Examples
///
/// ```
/// use marcmap::type_system::{TypeRegistry, TypeSystem};
///
/// let mut types = TypeSystem::new();
/// types.add_metadata_type("TitleDocMain");
/// types.add_docstruct_type("Monograph").metadata.insert("TitleDocMain".to_string());
///
/// assert!(types.metadata_allowed("Monograph", "TitleDocMain"));
/// assert!(!types.child_allowed("Monograph", "Volume"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct TypeSystem {
    metadata_types: IndexSet<String>,
    group_types: IndexSet<String>,
    docstructs: IndexMap<String, DocStructType>,
    permissive: bool,
}

impl TypeSystem {
    /// Empty type system that allows nothing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Type system that accepts every type and every attachment.
    #[must_use]
    pub fn permissive() -> Self {
        TypeSystem {
            permissive: true,
            ..Self::default()
        }
    }

    /// Declare a metadata type.
    pub fn add_metadata_type(&mut self, name: impl Into<String>) {
        self.metadata_types.insert(name.into());
    }

    /// Declare a group type.
    pub fn add_group_type(&mut self, name: impl Into<String>) {
        self.group_types.insert(name.into());
    }

    /// Declare a structural type and return its allowances for editing.
    pub fn add_docstruct_type(&mut self, name: impl Into<String>) -> &mut DocStructType {
        self.docstructs.entry(name.into()).or_default()
    }

    /// Allowances of a structural type.
    #[must_use]
    pub fn docstruct_type(&self, name: &str) -> Option<&DocStructType> {
        self.docstructs.get(name)
    }

    /// Read the type definitions of a `Preferences` document.
    ///
    /// # Errors
    ///
    /// Returns [`MarcError::Preferences`] if the document cannot be parsed.
    pub fn from_preferences_str(xml: &str) -> Result<Self> {
        let prefs: TypesNode = xml_from_str(xml)
            .map_err(|e| MarcError::Preferences(format!("Failed to parse ruleset: {e}")))?;

        let mut types = TypeSystem::new();
        for md in prefs.metadata_types {
            if let Some(name) = md.name() {
                types.add_metadata_type(name);
            }
        }
        for group in prefs.groups {
            if let Some(name) = group.name() {
                types.add_group_type(name);
            }
        }
        for ds in prefs.docstructs {
            let Some(name) = ds.name.as_deref().map(str::trim).filter(|n| !n.is_empty()) else {
                continue;
            };
            let allowances = types.add_docstruct_type(name);
            allowances.metadata.extend(texts(ds.metadata));
            allowances.groups.extend(texts(ds.groups));
            allowances.children.extend(texts(ds.children));
        }
        Ok(types)
    }

    /// Read the type definitions of a `Preferences` file.
    ///
    /// # Errors
    ///
    /// Returns [`MarcError::IoError`] if the file cannot be read, otherwise as
    /// [`from_preferences_str`](Self::from_preferences_str).
    pub fn from_preferences_path(path: impl AsRef<Path>) -> Result<Self> {
        let xml = std::fs::read_to_string(path)?;
        Self::from_preferences_str(&xml)
    }
}

impl TypeRegistry for TypeSystem {
    fn has_docstruct_type(&self, name: &str) -> bool {
        self.permissive || self.docstructs.contains_key(name)
    }

    fn has_metadata_type(&self, name: &str) -> bool {
        self.permissive || self.metadata_types.contains(name)
    }

    fn has_group_type(&self, name: &str) -> bool {
        self.permissive || self.group_types.contains(name)
    }

    fn metadata_allowed(&self, docstruct: &str, metadata_type: &str) -> bool {
        self.permissive
            || self
                .docstructs
                .get(docstruct)
                .is_some_and(|ds| ds.metadata.contains(metadata_type))
    }

    fn group_allowed(&self, docstruct: &str, group: &str) -> bool {
        self.permissive
            || self
                .docstructs
                .get(docstruct)
                .is_some_and(|ds| ds.groups.contains(group))
    }

    fn child_allowed(&self, parent: &str, child: &str) -> bool {
        self.permissive
            || self
                .docstructs
                .get(parent)
                .is_some_and(|ds| ds.children.contains(child))
    }
}

#[derive(Debug, Deserialize)]
struct TypesNode {
    #[serde(rename = "MetadataType", default)]
    metadata_types: Vec<NamedNode>,
    #[serde(rename = "Group", default)]
    groups: Vec<NamedNode>,
    #[serde(rename = "DocStrctType", default)]
    docstructs: Vec<DocStrctNode>,
}

#[derive(Debug, Deserialize)]
struct NamedNode {
    #[serde(rename = "Name", default)]
    name: Option<String>,
}

impl NamedNode {
    fn name(&self) -> Option<&str> {
        self.name.as_deref().map(str::trim).filter(|n| !n.is_empty())
    }
}

#[derive(Debug, Deserialize)]
struct DocStrctNode {
    #[serde(rename = "Name", default)]
    name: Option<String>,
    #[serde(rename = "metadata", default)]
    metadata: Vec<TextNode>,
    #[serde(rename = "group", default)]
    groups: Vec<TextNode>,
    #[serde(rename = "allowedchildtype", default)]
    children: Vec<TextNode>,
}

#[derive(Debug, Deserialize)]
struct TextNode {
    #[serde(rename = "$text", default)]
    value: String,
}

fn texts(nodes: Vec<TextNode>) -> impl Iterator<Item = String> {
    nodes
        .into_iter()
        .map(|node| node.value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    const RULESET: &str = r#"<Preferences>
        <MetadataType><Name>TitleDocMain</Name></MetadataType>
        <MetadataType type="person"><Name>Author</Name></MetadataType>
        <Group><Name>PublisherGroup</Name><metadata>PlaceOfPublication</metadata></Group>
        <DocStrctType topStruct="true">
            <Name>Periodical</Name>
            <allowedchildtype>PeriodicalVolume</allowedchildtype>
            <metadata num="1m" DefaultDisplay="true">TitleDocMain</metadata>
        </DocStrctType>
        <DocStrctType>
            <Name>Monograph</Name>
            <metadata num="1m">TitleDocMain</metadata>
            <metadata num="*">Author</metadata>
            <group num="*">PublisherGroup</group>
        </DocStrctType>
        <Formats><Marc/></Formats>
    </Preferences>"#;

    #[test]
    fn test_load_ruleset() {
        let types = TypeSystem::from_preferences_str(RULESET).unwrap();

        assert!(types.has_metadata_type("Author"));
        assert!(types.has_group_type("PublisherGroup"));
        assert!(types.has_docstruct_type("Monograph"));
        assert!(!types.has_docstruct_type("Map"));

        assert!(types.metadata_allowed("Monograph", "Author"));
        assert!(!types.metadata_allowed("Periodical", "Author"));
        assert!(types.group_allowed("Monograph", "PublisherGroup"));
        assert!(!types.group_allowed("Periodical", "PublisherGroup"));
        assert!(types.child_allowed("Periodical", "PeriodicalVolume"));
        assert!(!types.child_allowed("Monograph", "PeriodicalVolume"));
    }

    #[test]
    fn test_permissive() {
        let types = TypeSystem::permissive();
        assert!(types.has_docstruct_type("Anything"));
        assert!(types.metadata_allowed("Anything", "Whatever"));
        assert!(types.child_allowed("A", "B"));
    }

    #[test]
    fn test_unknown_docstruct_allows_nothing() {
        let mut types = TypeSystem::new();
        types.add_metadata_type("TitleDocMain");
        assert!(!types.metadata_allowed("Monograph", "TitleDocMain"));
        types.add_docstruct_type("Monograph");
        assert!(!types.metadata_allowed("Monograph", "TitleDocMain"));
    }
}
