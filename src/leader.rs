//! MARC record leader access.
//!
//! The MARC leader is a 24-character fixed-length field at the start of every
//! MARC record. Only a few positions matter for structural classification:
//!
//! - Position 6: Record type (a = language material, c = music, etc.)
//! - Position 7: Bibliographic level (m = monograph, s = serial, etc.)
//! - Position 19: Multipart resource record level
//!
//! Leaders delivered inside MARCXML are frequently malformed (some union
//! catalogues ship truncated or padded leaders), so the leader is kept as the
//! raw string it was read from. Positions beyond its end are simply absent.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Position of the record type code.
pub const RECORD_TYPE: usize = 6;
/// Position of the bibliographic level code.
pub const BIBLIOGRAPHIC_LEVEL: usize = 7;
/// Position of the multipart resource record level code.
pub const MULTIPART_LEVEL: usize = 19;

/// MARC leader, stored verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Leader(String);

impl Leader {
    /// Create a leader from its raw text.
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Leader(raw.into())
    }

    /// The raw leader text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Character at a zero-based position, or `None` if the leader is too short.
    ///
    /// # Examples
    ///
    /// ```
    /// use marcmap::Leader;
    ///
    /// let leader = Leader::new("00000nam a2200000 c 4500");
    /// assert_eq!(leader.char_at(6), Some('a'));
    /// assert_eq!(leader.char_at(30), None);
    /// ```
    #[must_use]
    pub fn char_at(&self, position: usize) -> Option<char> {
        self.0.chars().nth(position)
    }

    /// Type of record (position 6)
    #[must_use]
    pub fn record_type(&self) -> Option<char> {
        self.char_at(RECORD_TYPE)
    }

    /// Bibliographic level (position 7)
    #[must_use]
    pub fn bibliographic_level(&self) -> Option<char> {
        self.char_at(BIBLIOGRAPHIC_LEVEL)
    }

    /// Multipart resource record level (position 19)
    #[must_use]
    pub fn multipart_level(&self) -> Option<char> {
        self.char_at(MULTIPART_LEVEL)
    }
}

impl fmt::Display for Leader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Leader {
    fn from(raw: &str) -> Self {
        Leader::new(raw)
    }
}

impl From<String> for Leader {
    fn from(raw: String) -> Self {
        Leader(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positions_of_full_leader() {
        let leader = Leader::new("01142cam  2200301 a 4500");
        assert_eq!(leader.record_type(), Some('a'));
        assert_eq!(leader.bibliographic_level(), Some('m'));
        assert_eq!(leader.multipart_level(), Some(' '));
    }

    #[test]
    fn test_short_leader_has_no_multipart_level() {
        let leader = Leader::new("00000nam a22");
        assert_eq!(leader.record_type(), Some('a'));
        assert_eq!(leader.bibliographic_level(), Some('m'));
        assert_eq!(leader.multipart_level(), None);
    }

    #[test]
    fn test_empty_leader() {
        let leader = Leader::default();
        assert_eq!(leader.as_str(), "");
        assert_eq!(leader.record_type(), None);
    }
}
