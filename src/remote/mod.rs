//! Remote Contact Store Interface
//!
//! The sync engine talks to the backing document database through the
//! [`RemoteContactStore`] trait: a per-user document collection supporting
//! live-subscribed ordered queries, client-side id allocation, and
//! per-document atomic field updates. Production code plugs a real database
//! adapter in here; tests use the in-memory implementation from
//! [`memory`].
//!
//! # Snapshot Delivery
//!
//! A subscription delivers *full snapshots*: the complete current ordered
//! document set for the owner scope, emitted once immediately on subscribe
//! and again after every create, update or delete that touches the scope.
//! Dropping the stream cancels the subscription.

use async_trait::async_trait;
use futures_util::stream::BoxStream;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::StoreResult;

pub mod memory;

/// A contact document as persisted by the remote store
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContactDocument {
    /// Document id, equal to the document key
    pub id: Uuid,
    /// Display name, the ordering field
    pub name: String,
    /// Optional photo reference
    #[serde(rename = "photoUrl", default)]
    pub photo_url: Option<String>,
    /// Tag references; the storage layer does not enforce uniqueness
    pub tags: Vec<Uuid>,
}

impl ContactDocument {
    /// Create a fresh document with no photo and no tags
    pub fn new(id: Uuid, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            photo_url: None,
            tags: Vec::new(),
        }
    }
}

/// A complete, ordered representation of one owner's contact collection,
/// delivered by a live subscription
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContactSnapshot {
    /// Documents in query order
    pub docs: Vec<ContactDocument>,
}

impl ContactSnapshot {
    pub fn new(docs: Vec<ContactDocument>) -> Self {
        Self { docs }
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }
}

/// Partial field update for one document. Only fields that are present are
/// written; absent fields are left untouched by the store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactPatch {
    /// New display name
    pub name: Option<String>,
    /// New photo reference; the inner `None` clears the field
    pub photo_url: Option<Option<String>>,
    /// Replacement tag list
    pub tags: Option<Vec<Uuid>>,
}

impl ContactPatch {
    /// Patch writing exactly `name` and `photoUrl`
    pub fn contact_fields(name: impl Into<String>, photo_url: Option<String>) -> Self {
        Self {
            name: Some(name.into()),
            photo_url: Some(photo_url),
            tags: None,
        }
    }

    /// Patch replacing the `tags` field
    pub fn tag_list(tags: Vec<Uuid>) -> Self {
        Self {
            name: None,
            photo_url: None,
            tags: Some(tags),
        }
    }
}

/// Live stream of full snapshots for one owner scope
pub type SnapshotStream = BoxStream<'static, ContactSnapshot>;

/// The capabilities the sync engine requires from the backing document
/// store. All operations are scoped to an owner (the authenticated user id
/// partitioning the contact collection).
#[async_trait]
pub trait RemoteContactStore: Send + Sync {
    /// Open a live subscription over the owner's contact collection,
    /// ordered ascending by `order_by`. The initial snapshot is emitted
    /// immediately; a new snapshot follows every write affecting the scope.
    /// Dropping the returned stream cancels the subscription.
    async fn subscribe(&self, owner: Uuid, order_by: &str) -> StoreResult<SnapshotStream>;

    /// Allocate a new unique document id. Purely client-side, no round trip.
    fn generate_id(&self, owner: Uuid) -> Uuid;

    /// Create a document under the owner scope
    async fn create(&self, owner: Uuid, id: Uuid, doc: ContactDocument) -> StoreResult<()>;

    /// Atomically update the fields present in `patch`
    async fn update(&self, owner: Uuid, id: Uuid, patch: ContactPatch) -> StoreResult<()>;

    /// Delete a document. Deleting an absent document is not an error.
    async fn delete(&self, owner: Uuid, id: Uuid) -> StoreResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_wire_names() {
        let mut doc = ContactDocument::new(Uuid::new_v4(), "Alice");
        doc.photo_url = Some("https://example.com/a.png".to_string());

        let json = serde_json::to_value(&doc).unwrap();
        assert!(json.get("photoUrl").is_some());
        assert!(json.get("photo_url").is_none());
    }

    #[test]
    fn test_document_missing_photo_url_defaults() {
        let json = serde_json::json!({
            "id": Uuid::new_v4(),
            "name": "Bob",
            "tags": [],
        });
        let doc: ContactDocument = serde_json::from_value(json).unwrap();
        assert!(doc.photo_url.is_none());
    }

    #[test]
    fn test_contact_fields_patch_shape() {
        let patch = ContactPatch::contact_fields("Alice", None);
        assert_eq!(patch.name.as_deref(), Some("Alice"));
        assert_eq!(patch.photo_url, Some(None));
        assert!(patch.tags.is_none());
    }

    #[test]
    fn test_tag_list_patch_shape() {
        let tag = Uuid::new_v4();
        let patch = ContactPatch::tag_list(vec![tag]);
        assert!(patch.name.is_none());
        assert!(patch.photo_url.is_none());
        assert_eq!(patch.tags, Some(vec![tag]));
    }
}
