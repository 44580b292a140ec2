//! Extracted entities.
//!
//! Extraction produces plain values with no identity beyond the pass that
//! created them; attaching them to a document is up to the caller.

use crate::config::AuthorityScheme;
use serde::Serialize;

/// An authority-file reference attached to an entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Authority {
    /// Scheme label, e.g. `gnd`
    pub id: String,
    /// Resolvable URI of the identifier
    pub uri: String,
    /// The identifier itself
    pub value: String,
}

impl Authority {
    /// Reference to `identifier` in `scheme`.
    #[must_use]
    pub fn new(scheme: &AuthorityScheme, identifier: &str) -> Self {
        Authority {
            id: scheme.id.clone(),
            uri: scheme.uri_for(identifier),
            value: identifier.to_string(),
        }
    }

    /// Reference for a non-blank identifier, `None` otherwise.
    #[must_use]
    pub fn for_identifier(scheme: &AuthorityScheme, identifier: Option<&str>) -> Option<Self> {
        identifier
            .filter(|id| !id.trim().is_empty())
            .map(|id| Self::new(scheme, id))
    }
}

/// A descriptive metadata value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetadataValue {
    /// Internal metadata type
    pub type_name: String,
    /// The value
    pub value: String,
    /// Authority reference, if an identifier was found
    pub authority: Option<Authority>,
}

/// A personal name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PersonName {
    /// Internal type (role)
    pub type_name: String,
    /// First name, possibly empty
    pub first_name: String,
    /// Last name, possibly empty
    pub last_name: String,
    /// Authority reference, if an identifier was found
    pub authority: Option<Authority>,
}

impl PersonName {
    /// Name in "last, first" form, or whichever part is present.
    ///
    /// ```
    /// use marcmap::PersonName;
    ///
    /// let person = PersonName {
    ///     type_name: "Author".to_string(),
    ///     first_name: "Theodor".to_string(),
    ///     last_name: "Kutschmann".to_string(),
    ///     authority: None,
    /// };
    /// assert_eq!(person.display_name(), "Kutschmann, Theodor");
    /// ```
    #[must_use]
    pub fn display_name(&self) -> String {
        match (self.last_name.is_empty(), self.first_name.is_empty()) {
            (false, false) => format!("{}, {}", self.last_name, self.first_name),
            (false, true) => self.last_name.clone(),
            (true, _) => self.first_name.clone(),
        }
    }
}

/// A corporate-body name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CorporateName {
    /// Internal type (role)
    pub type_name: String,
    /// Main name
    pub main_name: String,
    /// Subordinate unit names, in record order
    pub sub_names: Vec<String>,
    /// Part name, possibly empty
    pub part_name: String,
    /// Authority reference, if an identifier was found
    pub authority: Option<Authority>,
}

/// Any extracted entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind")]
pub enum Entity {
    /// A metadata value
    Metadata(MetadataValue),
    /// A personal name
    Person(PersonName),
    /// A corporate-body name
    Corporate(CorporateName),
}

impl Entity {
    /// Internal type of the entity.
    #[must_use]
    pub fn type_name(&self) -> &str {
        match self {
            Entity::Metadata(md) => &md.type_name,
            Entity::Person(person) => &person.type_name,
            Entity::Corporate(corporate) => &corporate.type_name,
        }
    }

    /// Authority reference of the entity, if any.
    #[must_use]
    pub fn authority(&self) -> Option<&Authority> {
        match self {
            Entity::Metadata(md) => md.authority.as_ref(),
            Entity::Person(person) => person.authority.as_ref(),
            Entity::Corporate(corporate) => corporate.authority.as_ref(),
        }
    }
}

impl From<MetadataValue> for Entity {
    fn from(value: MetadataValue) -> Self {
        Entity::Metadata(value)
    }
}

impl From<PersonName> for Entity {
    fn from(value: PersonName) -> Self {
        Entity::Person(value)
    }
}

impl From<CorporateName> for Entity {
    fn from(value: CorporateName) -> Self {
        Entity::Corporate(value)
    }
}

/// A metadata group with its nested entities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Group {
    /// Internal group type
    pub type_name: String,
    /// Nested metadata values
    pub metadata: Vec<MetadataValue>,
    /// Nested persons
    pub persons: Vec<PersonName>,
    /// Nested corporate bodies
    pub corporates: Vec<CorporateName>,
}

impl Group {
    /// Empty group of the given type.
    #[must_use]
    pub fn new(type_name: impl Into<String>) -> Self {
        Group {
            type_name: type_name.into(),
            metadata: Vec::new(),
            persons: Vec::new(),
            corporates: Vec::new(),
        }
    }

    /// Returns `true` if the group holds no entities.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.metadata.is_empty() && self.persons.is_empty() && self.corporates.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authority_for_blank_identifier() {
        let gnd = AuthorityScheme::gnd();
        assert!(Authority::for_identifier(&gnd, None).is_none());
        assert!(Authority::for_identifier(&gnd, Some("  ")).is_none());

        let authority = Authority::for_identifier(&gnd, Some("115747876X")).unwrap();
        assert_eq!(authority.id, "gnd");
        assert_eq!(authority.uri, "http://d-nb.info/gnd/115747876X");
        assert_eq!(authority.value, "115747876X");
    }

    #[test]
    fn test_display_name_variants() {
        let mut person = PersonName {
            type_name: "Author".to_string(),
            first_name: String::new(),
            last_name: "Goethe".to_string(),
            authority: None,
        };
        assert_eq!(person.display_name(), "Goethe");
        person.last_name.clear();
        person.first_name = "Homer".to_string();
        assert_eq!(person.display_name(), "Homer");
    }

    #[test]
    fn test_entity_accessors() {
        let entity: Entity = MetadataValue {
            type_name: "TitleDocMain".to_string(),
            value: "Faust".to_string(),
            authority: None,
        }
        .into();
        assert_eq!(entity.type_name(), "TitleDocMain");
        assert!(entity.authority().is_none());
    }
}
