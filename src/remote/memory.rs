//! In-Memory Remote Store
//!
//! A [`RemoteContactStore`] implementation holding every owner's collection
//! in process memory and fanning snapshots out to live subscribers on each
//! write. Backs the test suite, and works as a demo backend when no real
//! database is wired up.
//!
//! Write failures can be injected with [`MemoryRemoteStore::fail_writes`],
//! and [`MemoryRemoteStore::write_count`] counts every issued
//! create/update/delete, which lets tests assert that guarded operations
//! issue zero remote writes.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use crate::remote::{ContactDocument, ContactPatch, ContactSnapshot, RemoteContactStore, SnapshotStream};

/// The only ordering field this store supports
const ORDER_FIELD_NAME: &str = "name";

/// In-memory document store with live snapshot delivery
#[derive(Debug, Default)]
pub struct MemoryRemoteStore {
    /// Documents per owner scope, keyed by document id
    documents: Mutex<HashMap<Uuid, BTreeMap<Uuid, ContactDocument>>>,
    /// Live subscribers per owner scope
    watchers: Mutex<HashMap<Uuid, Vec<mpsc::UnboundedSender<ContactSnapshot>>>>,
    fail_writes: AtomicBool,
    writes_issued: AtomicU64,
}

impl MemoryRemoteStore {
    /// Build an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// When set, every subsequent create/update/delete fails with a
    /// transport error without touching the documents
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of create/update/delete calls issued so far, including ones
    /// that failed
    pub fn write_count(&self) -> u64 {
        self.writes_issued.load(Ordering::SeqCst)
    }

    /// Current document state, if present
    pub fn document(&self, owner: Uuid, id: Uuid) -> Option<ContactDocument> {
        self.documents
            .lock()
            .unwrap()
            .get(&owner)
            .and_then(|docs| docs.get(&id))
            .cloned()
    }

    /// Replace the owner's whole collection and notify subscribers, as if
    /// the change had happened on the server side
    pub fn set_documents(&self, owner: Uuid, docs: Vec<ContactDocument>) {
        {
            let mut documents = self.documents.lock().unwrap();
            let scope = documents.entry(owner).or_default();
            scope.clear();
            for doc in docs {
                scope.insert(doc.id, doc);
            }
        }
        self.notify(owner);
    }

    /// Name-ascending snapshot of the owner's collection
    fn snapshot_for(&self, owner: Uuid) -> ContactSnapshot {
        let documents = self.documents.lock().unwrap();
        let mut docs: Vec<ContactDocument> = documents
            .get(&owner)
            .map(|scope| scope.values().cloned().collect())
            .unwrap_or_default();
        docs.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        ContactSnapshot::new(docs)
    }

    /// Deliver a fresh snapshot to every live subscriber of this scope,
    /// dropping subscribers whose stream has been cancelled
    fn notify(&self, owner: Uuid) {
        let snapshot = self.snapshot_for(owner);
        let mut watchers = self.watchers.lock().unwrap();
        if let Some(senders) = watchers.get_mut(&owner) {
            senders.retain(|tx| tx.send(snapshot.clone()).is_ok());
        }
    }

    /// Record an issued write and apply the failure switch
    fn check_write(&self) -> StoreResult<()> {
        self.writes_issued.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            Err(StoreError::transport("injected write failure"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl RemoteContactStore for MemoryRemoteStore {
    async fn subscribe(&self, owner: Uuid, order_by: &str) -> StoreResult<SnapshotStream> {
        if order_by != ORDER_FIELD_NAME {
            return Err(StoreError::subscription(format!(
                "unsupported order field: {order_by}"
            )));
        }

        let (tx, rx) = mpsc::unbounded_channel();
        // Initial snapshot is delivered before the subscriber can observe
        // any later write
        tx.send(self.snapshot_for(owner))
            .map_err(|_| StoreError::subscription("subscriber channel closed"))?;
        self.watchers.lock().unwrap().entry(owner).or_default().push(tx);

        Ok(UnboundedReceiverStream::new(rx).boxed())
    }

    fn generate_id(&self, _owner: Uuid) -> Uuid {
        Uuid::new_v4()
    }

    async fn create(&self, owner: Uuid, id: Uuid, doc: ContactDocument) -> StoreResult<()> {
        self.check_write()?;
        self.documents
            .lock()
            .unwrap()
            .entry(owner)
            .or_default()
            .insert(id, doc);
        self.notify(owner);
        Ok(())
    }

    async fn update(&self, owner: Uuid, id: Uuid, patch: ContactPatch) -> StoreResult<()> {
        self.check_write()?;
        {
            let mut documents = self.documents.lock().unwrap();
            let doc = documents
                .get_mut(&owner)
                .and_then(|scope| scope.get_mut(&id))
                .ok_or(StoreError::not_found(id))?;
            if let Some(name) = patch.name {
                doc.name = name;
            }
            if let Some(photo_url) = patch.photo_url {
                doc.photo_url = photo_url;
            }
            if let Some(tags) = patch.tags {
                doc.tags = tags;
            }
        }
        self.notify(owner);
        Ok(())
    }

    async fn delete(&self, owner: Uuid, id: Uuid) -> StoreResult<()> {
        self.check_write()?;
        let removed = self
            .documents
            .lock()
            .unwrap()
            .get_mut(&owner)
            .and_then(|scope| scope.remove(&id));
        if removed.is_some() {
            self.notify(owner);
        }
        Ok(())
    }
}
