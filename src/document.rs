//! Destination document model.
//!
//! A [`DocStruct`] is one structural unit with the entities attached to it.
//! Every attachment is validated against a [`TypeRegistry`]; a rejected
//! attachment leaves the unit unchanged.

use crate::entity::{CorporateName, Group, MetadataValue, PersonName};
use crate::error::{MarcError, Result};
use crate::type_system::TypeRegistry;
use serde::Serialize;

/// A structural unit of a digital document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocStruct {
    /// Structural type
    pub type_name: String,
    /// Attached metadata values
    pub metadata: Vec<MetadataValue>,
    /// Attached persons
    pub persons: Vec<PersonName>,
    /// Attached corporate bodies
    pub corporates: Vec<CorporateName>,
    /// Attached metadata groups
    pub groups: Vec<Group>,
    /// Child units
    pub children: Vec<DocStruct>,
}

impl DocStruct {
    /// Create a unit of a known structural type.
    ///
    /// # Errors
    ///
    /// Returns [`MarcError::UnknownType`] if the registry does not know the type.
    pub fn new(type_name: &str, registry: &dyn TypeRegistry) -> Result<Self> {
        if !registry.has_docstruct_type(type_name) {
            return Err(MarcError::UnknownType(type_name.to_string()));
        }
        Ok(DocStruct {
            type_name: type_name.to_string(),
            metadata: Vec::new(),
            persons: Vec::new(),
            corporates: Vec::new(),
            groups: Vec::new(),
            children: Vec::new(),
        })
    }

    fn check_metadata_type(&self, type_name: &str, registry: &dyn TypeRegistry) -> Result<()> {
        if !registry.has_metadata_type(type_name) {
            return Err(MarcError::UnknownType(type_name.to_string()));
        }
        if !registry.metadata_allowed(&self.type_name, type_name) {
            return Err(MarcError::MetadataTypeNotAllowed {
                type_name: type_name.to_string(),
                docstruct: self.type_name.clone(),
            });
        }
        Ok(())
    }

    /// Attach a metadata value.
    ///
    /// # Errors
    ///
    /// Returns [`MarcError::UnknownType`] or [`MarcError::MetadataTypeNotAllowed`].
    pub fn add_metadata(&mut self, metadata: MetadataValue, registry: &dyn TypeRegistry) -> Result<()> {
        self.check_metadata_type(&metadata.type_name, registry)?;
        self.metadata.push(metadata);
        Ok(())
    }

    /// Attach a person.
    ///
    /// # Errors
    ///
    /// Returns [`MarcError::IncompleteEntity`] for a person without any name,
    /// otherwise as [`add_metadata`](Self::add_metadata).
    pub fn add_person(&mut self, person: PersonName, registry: &dyn TypeRegistry) -> Result<()> {
        if person.first_name.trim().is_empty() && person.last_name.trim().is_empty() {
            return Err(MarcError::IncompleteEntity {
                kind: "person",
                type_name: person.type_name,
            });
        }
        self.check_metadata_type(&person.type_name, registry)?;
        self.persons.push(person);
        Ok(())
    }

    /// Attach a corporate body.
    ///
    /// # Errors
    ///
    /// Returns [`MarcError::IncompleteEntity`] for a corporate body without a
    /// main name, otherwise as [`add_metadata`](Self::add_metadata).
    pub fn add_corporate(&mut self, corporate: CorporateName, registry: &dyn TypeRegistry) -> Result<()> {
        if corporate.main_name.trim().is_empty() {
            return Err(MarcError::IncompleteEntity {
                kind: "corporate",
                type_name: corporate.type_name,
            });
        }
        self.check_metadata_type(&corporate.type_name, registry)?;
        self.corporates.push(corporate);
        Ok(())
    }

    /// Attach a metadata group.
    ///
    /// # Errors
    ///
    /// Returns [`MarcError::UnknownType`] or [`MarcError::MetadataTypeNotAllowed`].
    pub fn add_metadata_group(&mut self, group: Group, registry: &dyn TypeRegistry) -> Result<()> {
        if !registry.has_group_type(&group.type_name) {
            return Err(MarcError::UnknownType(group.type_name));
        }
        if !registry.group_allowed(&self.type_name, &group.type_name) {
            return Err(MarcError::MetadataTypeNotAllowed {
                type_name: group.type_name,
                docstruct: self.type_name.clone(),
            });
        }
        self.groups.push(group);
        Ok(())
    }

    /// Add a child unit.
    ///
    /// # Errors
    ///
    /// Returns [`MarcError::ChildTypeNotAllowed`] if the registry forbids the child type here.
    pub fn add_child(&mut self, child: DocStruct, registry: &dyn TypeRegistry) -> Result<()> {
        self.check_child(&child, registry)?;
        self.children.push(child);
        Ok(())
    }

    fn check_child(&self, child: &DocStruct, registry: &dyn TypeRegistry) -> Result<()> {
        if registry.child_allowed(&self.type_name, &child.type_name) {
            Ok(())
        } else {
            Err(MarcError::ChildTypeNotAllowed {
                parent: self.type_name.clone(),
                child: child.type_name.clone(),
            })
        }
    }
}

/// A digital document: the logical structure built from imported records.
///
/// Imported units form a linear chain. The first unit is the logical root
/// and every later unit is the child of the one before it. The chain is held
/// flat, so its length never adds to the nesting depth of any [`DocStruct`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DigitalDocument {
    chain: Vec<DocStruct>,
}

impl DigitalDocument {
    /// Empty document.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Document whose logical root is `unit`.
    #[must_use]
    pub fn with_root(unit: DocStruct) -> Self {
        DigitalDocument { chain: vec![unit] }
    }

    /// Append a unit to the chain.
    ///
    /// The first unit becomes the logical root; every later one becomes the
    /// child of the unit appended before it.
    ///
    /// # Errors
    ///
    /// Returns [`MarcError::ChildTypeNotAllowed`] if the previous unit does not
    /// accept the new one as a child.
    pub fn append(&mut self, unit: DocStruct, registry: &dyn TypeRegistry) -> Result<()> {
        if let Some(parent) = self.chain.last() {
            parent.check_child(&unit, registry)?;
        }
        self.chain.push(unit);
        Ok(())
    }

    /// Top-level logical unit.
    #[must_use]
    pub fn logical(&self) -> Option<&DocStruct> {
        self.chain.first()
    }

    /// Units from the root down; each is the child of its predecessor.
    #[must_use]
    pub fn chain(&self) -> &[DocStruct] {
        &self.chain
    }

    /// Number of units in the chain.
    #[must_use]
    pub fn chain_len(&self) -> usize {
        self.chain.len()
    }

    /// Consume the document, returning its chain.
    #[must_use]
    pub fn into_chain(self) -> Vec<DocStruct> {
        self.chain
    }
}
