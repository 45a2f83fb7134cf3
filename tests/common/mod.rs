//! Common test fixtures for the integration suite

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;
use xfcontacts::{ContactDocument, ContactStore, MemoryRemoteStore, Tag, TagCatalog};

/// Engine wired to an in-memory remote store and a tag catalog
pub struct Harness {
    pub store: ContactStore,
    pub remote: Arc<MemoryRemoteStore>,
    pub owner: Uuid,
}

pub fn harness() -> Harness {
    harness_with_catalog(TagCatalog::new())
}

pub fn harness_with_catalog(catalog: TagCatalog) -> Harness {
    let remote = Arc::new(MemoryRemoteStore::new());
    let store = ContactStore::new(remote.clone(), Arc::new(catalog));
    Harness {
        store,
        remote,
        owner: Uuid::new_v4(),
    }
}

/// Poll until `cond` holds; panics if it does not hold within two seconds
pub async fn wait_for(mut cond: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while !cond() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "condition not reached within deadline"
        );
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

pub fn doc(id: Uuid, name: &str, tags: &[Uuid]) -> ContactDocument {
    ContactDocument {
        id,
        name: name.to_string(),
        photo_url: None,
        tags: tags.to_vec(),
    }
}

pub fn tag(name: &str) -> Tag {
    Tag::new(Uuid::new_v4(), name)
}
