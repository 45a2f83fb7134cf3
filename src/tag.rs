//! Tag References and Canonical Ordering
//!
//! Tags are owned by a separate catalog component; contacts reference them
//! by id only. The sync engine never creates or deletes tags, it only
//! attaches and detaches references, and consumes the catalog through a
//! single capability: putting a set of tag references into a stable
//! canonical display order.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A label entity referenced by id from contacts
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Tag {
    /// Unique tag ID
    pub id: Uuid,
    /// Display name
    pub name: String,
}

impl Tag {
    pub fn new(id: Uuid, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// Canonical display ordering for a set of tag references.
///
/// Implementations must return every input id exactly once; a reference the
/// catalog does not recognize must still appear in the output.
pub trait TagOrdering: Send + Sync {
    fn canonical_order(&self, tag_ids: &BTreeSet<Uuid>) -> Vec<Uuid>;
}

/// In-crate catalog implementation of [`TagOrdering`].
///
/// Known tags are ordered by display name (ties broken by id); references
/// the catalog has not seen yet are kept, appended after the known tags in
/// id order, so a contact's tag list survives catalog lag.
#[derive(Debug, Default)]
pub struct TagCatalog {
    tags: Vec<Tag>,
}

impl TagCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tags(tags: Vec<Tag>) -> Self {
        Self { tags }
    }

    /// Register a tag with the catalog
    pub fn insert(&mut self, tag: Tag) {
        self.tags.push(tag);
    }

    /// Look up a tag by id
    pub fn get(&self, tag_id: &Uuid) -> Option<&Tag> {
        self.tags.iter().find(|t| t.id == *tag_id)
    }
}

impl TagOrdering for TagCatalog {
    fn canonical_order(&self, tag_ids: &BTreeSet<Uuid>) -> Vec<Uuid> {
        let mut known: Vec<&Tag> = self
            .tags
            .iter()
            .filter(|t| tag_ids.contains(&t.id))
            .collect();
        known.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));

        let mut ordered: Vec<Uuid> = known.iter().map(|t| t.id).collect();
        // BTreeSet iteration is already id-ordered for the unknown remainder
        ordered.extend(tag_ids.iter().filter(|id| self.get(id).is_none()));
        ordered
    }
}
