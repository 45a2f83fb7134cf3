//! Contact Data Structure
//!
//! Represents one address-book entry owned by the current user.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An address-book entry owned by one user.
///
/// The wire field names (`id`, `name`, `photoUrl`, `tags`) match the
/// persisted document layout of the remote store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Contact {
    /// Unique contact ID, assigned by the remote store's id generator at
    /// creation time. Immutable thereafter.
    pub id: Uuid,
    /// Display name. Determines canonical ordering of the contact list.
    pub name: String,
    /// Optional display image reference.
    #[serde(rename = "photoUrl", default)]
    pub photo_url: Option<String>,
    /// Tag references in canonical display order. Duplicate-free; uniqueness
    /// is enforced by the sync engine when mapping remote documents, not by
    /// the storage layer.
    pub tags: Vec<Uuid>,
}

impl Contact {
    /// Create a contact with no photo and no tags
    pub fn new(id: Uuid, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            photo_url: None,
            tags: Vec::new(),
        }
    }

    /// Whether this contact carries the given tag reference
    pub fn has_tag(&self, tag_id: &Uuid) -> bool {
        self.tags.contains(tag_id)
    }
}

/// The exact field set a contact rename writes: `name` and `photoUrl`,
/// nothing else.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContactUpdate {
    /// New display name
    pub name: String,
    /// New photo reference, `None` clears it
    #[serde(rename = "photoUrl", default)]
    pub photo_url: Option<String>,
}

impl ContactUpdate {
    pub fn new(name: impl Into<String>, photo_url: Option<String>) -> Self {
        Self {
            name: name.into(),
            photo_url,
        }
    }
}
