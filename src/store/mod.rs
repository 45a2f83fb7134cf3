//! Contact Cache & Sync Engine
//!
//! [`ContactStore`] owns an in-memory view of one user's contact collection
//! and keeps it consistent with the remote store through a live
//! subscription. Mutations write through to the remote store and become
//! visible in the cache only once the subscription echoes them back; no
//! optimistic local update is performed.
//!
//! # Cache Discipline
//!
//! The subscription apply task is the single writer of `contacts` and
//! `contact_ids`. Both are replaced wholesale, together, on every emitted
//! snapshot; no observer can see one without the other. Mutation calls read
//! the cache for their guards but never write it, so the cache is always
//! exactly one subscription round-trip behind issued mutations.
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use xfcontacts::{ContactStore, MemoryRemoteStore, TagCatalog};
//!
//! # async fn example() -> Result<(), xfcontacts::StoreError> {
//! let remote = Arc::new(MemoryRemoteStore::new());
//! let catalog = Arc::new(TagCatalog::new());
//! let store = ContactStore::new(remote, catalog);
//!
//! let user = uuid::Uuid::new_v4();
//! let subscription = store.initialize(user).await?;
//!
//! store.add_contact("Alice").await;
//! // The new contact shows up in store.contacts() once the
//! // subscription echo lands.
//!
//! subscription.cancel();
//! # Ok(())
//! # }
//! ```

mod metrics;
mod subscription;

pub use metrics::SyncMetricsSnapshot;
pub use subscription::{SubscriptionHandle, SubscriptionStatus};

use std::collections::{BTreeSet, HashMap, HashSet};
use std::future::Future;
use std::sync::{Arc, Mutex as StdMutex, RwLock};

use tokio::sync::Mutex as AsyncMutex;
use uuid::Uuid;

use crate::contact::{Contact, ContactUpdate};
use crate::error::{StoreError, StoreResult};
use crate::remote::{ContactDocument, ContactPatch, ContactSnapshot, RemoteContactStore};
use crate::tag::{Tag, TagOrdering};
use metrics::SyncMetrics;

/// Ordering field for the contact subscription query
const ORDER_BY_NAME: &str = "name";

/// Why a mutation was skipped without issuing a remote write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The engine has no bound user
    NotInitialized,
    /// The target contact is not a current member of the cache
    NotInCache,
    /// The tag reference is already present on the cached contact
    TagAlreadyPresent,
    /// The tag reference is not present on the cached contact
    TagNotPresent,
}

/// Outcome of a mutation call.
///
/// Every failure is logged before it is returned, so a caller that drops
/// the value gets plain log-and-swallow behavior; a caller that inspects it
/// can layer its own retry or notification policy on top. The engine never
/// retries and never rolls anything back (there is no optimistic local
/// state to roll back).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The write was accepted by the remote store
    Applied,
    /// A precondition failed; no remote write was issued
    Skipped(SkipReason),
    /// The write was issued and rejected
    Failed(StoreError),
}

impl WriteOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, WriteOutcome::Applied)
    }

    /// Whether a remote write was issued at all
    pub fn was_issued(&self) -> bool {
        !matches!(self, WriteOutcome::Skipped(_))
    }
}

/// Atomic point-in-time view of the whole engine state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreSnapshot {
    pub user: Option<Uuid>,
    pub contacts: Vec<Contact>,
    pub contact_ids: Vec<Uuid>,
    pub selected_contact_id: Option<Uuid>,
    pub is_loading: bool,
}

#[derive(Debug)]
struct StoreState {
    user: Option<Uuid>,
    contacts: Vec<Contact>,
    /// Exact id-projection of `contacts`, same order. Rebuilt in the same
    /// critical section as `contacts`; must never drift.
    contact_ids: Vec<Uuid>,
    /// Weak reference: may point at a contact that no longer exists
    selected_contact_id: Option<Uuid>,
    is_loading: bool,
}

impl Default for StoreState {
    fn default() -> Self {
        Self {
            user: None,
            contacts: Vec::new(),
            contact_ids: Vec::new(),
            selected_contact_id: None,
            is_loading: true,
        }
    }
}

pub(crate) struct StoreInner {
    remote: Arc<dyn RemoteContactStore>,
    tag_order: Arc<dyn TagOrdering>,
    state: RwLock<StoreState>,
    /// Per-contact serialization of tag mutations
    tag_locks: StdMutex<HashMap<Uuid, Arc<AsyncMutex<()>>>>,
    metrics: SyncMetrics,
}

impl StoreInner {
    /// Fold one remote snapshot into the cache. `contacts` and
    /// `contact_ids` are replaced together under one write lock; every
    /// emission is a full resynchronization, never an incremental merge.
    pub(crate) fn apply_snapshot(&self, snapshot: ContactSnapshot) {
        let contacts: Vec<Contact> = snapshot
            .docs
            .into_iter()
            .map(|doc| {
                // Uniqueness is enforced here, not by the storage layer
                let unique: BTreeSet<Uuid> = doc.tags.iter().copied().collect();
                Contact {
                    id: doc.id,
                    name: doc.name,
                    photo_url: doc.photo_url,
                    tags: self.tag_order.canonical_order(&unique),
                }
            })
            .collect();
        let contact_ids: Vec<Uuid> = contacts.iter().map(|c| c.id).collect();
        let live: HashSet<Uuid> = contact_ids.iter().copied().collect();
        let count = contacts.len();

        {
            let mut state = self.state.write().unwrap();
            state.contacts = contacts;
            state.contact_ids = contact_ids;
            state.is_loading = false;
        }

        // Serialization locks for contacts that left the collection are
        // unreachable through the guards
        self.tag_locks.lock().unwrap().retain(|id, _| live.contains(id));

        self.metrics.record_snapshot();
        tracing::debug!("[Sync] applied contact snapshot ({} contacts)", count);
    }
}

/// The contact cache & sync engine. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct ContactStore {
    inner: Arc<StoreInner>,
}

impl ContactStore {
    /// Build an engine around an injected remote store and tag-ordering
    /// collaborator. State starts empty with `is_loading` set.
    pub fn new(remote: Arc<dyn RemoteContactStore>, tag_order: Arc<dyn TagOrdering>) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                remote,
                tag_order,
                state: RwLock::new(StoreState::default()),
                tag_locks: StdMutex::new(HashMap::new()),
                metrics: SyncMetrics::default(),
            }),
        }
    }

    /// Bind the authenticated user and open the live, name-ordered
    /// subscription over their contact collection.
    ///
    /// The returned handle is the only way to cancel the subscription.
    /// Cancelling it before calling `initialize` again, and after
    /// [`ContactStore::reset`], is the caller's responsibility; the engine
    /// does not enforce it, and a second `initialize` with the first
    /// subscription still live leaves two writers racing on the cache.
    pub async fn initialize(&self, user: Uuid) -> StoreResult<SubscriptionHandle> {
        self.inner.state.write().unwrap().user = Some(user);
        let stream = self.inner.remote.subscribe(user, ORDER_BY_NAME).await?;
        tracing::info!("[Sync] contact subscription opened for user {}", user);
        Ok(subscription::spawn(Arc::clone(&self.inner), stream))
    }

    /// Create a contact with the given display name and an empty tag list.
    ///
    /// The name is not validated; empty and duplicate names are accepted.
    /// The new contact becomes visible in the cache only once the
    /// subscription echo lands.
    pub async fn add_contact(&self, name: impl Into<String>) -> WriteOutcome {
        let Some(user) = self.user() else {
            return WriteOutcome::Skipped(SkipReason::NotInitialized);
        };
        let name = name.into();

        self.set_loading(true);
        let id = self.inner.remote.generate_id(user);
        let doc = ContactDocument::new(id, name);
        let outcome = self
            .issue_write(self.inner.remote.create(user, id, doc), "creating contact")
            .await;
        self.set_loading(false);
        outcome
    }

    /// Write new `name` and `photoUrl` fields for a contact. Silent no-op
    /// when the id is not a current cache member.
    pub async fn update_contact(&self, contact_id: Uuid, update: ContactUpdate) -> WriteOutcome {
        let Some(user) = self.user() else {
            return WriteOutcome::Skipped(SkipReason::NotInitialized);
        };

        self.set_loading(true);
        let outcome = if self.get_contact(contact_id).is_some() {
            let patch = ContactPatch::contact_fields(update.name, update.photo_url);
            self.issue_write(
                self.inner.remote.update(user, contact_id, patch),
                "updating contact",
            )
            .await
        } else {
            tracing::debug!("[Sync] update for contact {} not in cache", contact_id);
            WriteOutcome::Skipped(SkipReason::NotInCache)
        };
        self.set_loading(false);
        outcome
    }

    /// Delete a contact document. Silent no-op when the id is not a
    /// current cache member.
    pub async fn delete_contact(&self, contact_id: Uuid) -> WriteOutcome {
        let Some(user) = self.user() else {
            return WriteOutcome::Skipped(SkipReason::NotInitialized);
        };
        if self.get_contact(contact_id).is_none() {
            return WriteOutcome::Skipped(SkipReason::NotInCache);
        }

        self.set_loading(true);
        let outcome = self
            .issue_write(
                self.inner.remote.delete(user, contact_id),
                "removing contact",
            )
            .await;
        self.set_loading(false);
        outcome
    }

    /// Pure lookup over the current cache
    pub fn get_contact(&self, contact_id: Uuid) -> Option<Contact> {
        self.inner
            .state
            .read()
            .unwrap()
            .contacts
            .iter()
            .find(|c| c.id == contact_id)
            .cloned()
    }

    /// Unconditional assignment; existence is not validated. The selection
    /// is a weak reference resolved lazily by
    /// [`ContactStore::selected_contact`].
    pub fn set_selected_contact_id(&self, contact_id: Uuid) {
        self.inner.state.write().unwrap().selected_contact_id = Some(contact_id);
    }

    pub fn selected_contact_id(&self) -> Option<Uuid> {
        self.inner.state.read().unwrap().selected_contact_id
    }

    /// Resolve the selection against the current cache. Returns `None` when
    /// nothing is selected or the selected contact no longer exists.
    pub fn selected_contact(&self) -> Option<Contact> {
        let state = self.inner.state.read().unwrap();
        let id = state.selected_contact_id?;
        state.contacts.iter().find(|c| c.id == id).cloned()
    }

    /// Attach a tag reference to a contact.
    ///
    /// Preconditions: the contact is a current cache member and does not
    /// already carry `tag.id`; otherwise the call is a silent no-op. The
    /// new tag list is computed from the cached contact, not the caller's
    /// value, and same-contact tag mutations are serialized, so two racing
    /// calls cannot interleave their read-compute-write spans. The cache
    /// itself may still lag remote writes that have not echoed back yet.
    pub async fn add_tag_to_contact(&self, contact: &Contact, tag: &Tag) -> WriteOutcome {
        let Some(user) = self.user() else {
            return WriteOutcome::Skipped(SkipReason::NotInitialized);
        };

        self.set_loading(true);
        let lock = self.tag_lock(contact.id);
        let _guard = lock.lock().await;

        let outcome = match self.get_contact(contact.id) {
            None => WriteOutcome::Skipped(SkipReason::NotInCache),
            Some(current) if current.has_tag(&tag.id) => {
                WriteOutcome::Skipped(SkipReason::TagAlreadyPresent)
            }
            Some(current) => {
                let mut tags = current.tags;
                tags.push(tag.id);
                self.issue_write(
                    self.inner
                        .remote
                        .update(user, contact.id, ContactPatch::tag_list(tags)),
                    "adding tag to contact",
                )
                .await
            }
        };
        self.set_loading(false);
        outcome
    }

    /// Detach a tag reference from a contact. Mirror of
    /// [`ContactStore::add_tag_to_contact`]: requires cache membership and
    /// the tag currently present.
    pub async fn delete_tag_from_contact(&self, contact: &Contact, tag: &Tag) -> WriteOutcome {
        let Some(user) = self.user() else {
            return WriteOutcome::Skipped(SkipReason::NotInitialized);
        };

        self.set_loading(true);
        let lock = self.tag_lock(contact.id);
        let _guard = lock.lock().await;

        let outcome = match self.get_contact(contact.id) {
            None => WriteOutcome::Skipped(SkipReason::NotInCache),
            Some(current) if !current.has_tag(&tag.id) => {
                WriteOutcome::Skipped(SkipReason::TagNotPresent)
            }
            Some(current) => {
                let tags: Vec<Uuid> = current.tags.into_iter().filter(|t| *t != tag.id).collect();
                self.issue_write(
                    self.inner
                        .remote
                        .update(user, contact.id, ContactPatch::tag_list(tags)),
                    "deleting tag from contact",
                )
                .await
            }
        };
        self.set_loading(false);
        outcome
    }

    /// Write an empty tag list for a contact. Requires cache membership
    /// only; idempotent.
    pub async fn delete_all_tags_from_contact(&self, contact: &Contact) -> WriteOutcome {
        let Some(user) = self.user() else {
            return WriteOutcome::Skipped(SkipReason::NotInitialized);
        };

        self.set_loading(true);
        let lock = self.tag_lock(contact.id);
        let _guard = lock.lock().await;

        let outcome = if self.get_contact(contact.id).is_some() {
            self.issue_write(
                self.inner
                    .remote
                    .update(user, contact.id, ContactPatch::tag_list(Vec::new())),
                "clearing tags from contact",
            )
            .await
        } else {
            WriteOutcome::Skipped(SkipReason::NotInCache)
        };
        self.set_loading(false);
        outcome
    }

    /// Drop the cache, the bound user and the selection, and mark the
    /// engine un-synced (`is_loading` set).
    ///
    /// Does NOT cancel the live subscription; pair this with
    /// [`SubscriptionHandle::cancel`].
    pub fn reset(&self) {
        let mut state = self.inner.state.write().unwrap();
        state.user = None;
        state.contacts = Vec::new();
        state.contact_ids = Vec::new();
        state.selected_contact_id = None;
        state.is_loading = true;
    }

    /// Order identifiers by the referenced contact's display name,
    /// lexicographic ascending. Stable: identifiers that no longer resolve
    /// compare equal to everything, so their relative position is
    /// unspecified while resolvable pairs keep their name order.
    pub fn sort_contacts(&self, mut contact_ids: Vec<Uuid>) -> Vec<Uuid> {
        let state = self.inner.state.read().unwrap();
        contact_ids.sort_by(|a, b| {
            let contact_a = state.contacts.iter().find(|c| c.id == *a);
            let contact_b = state.contacts.iter().find(|c| c.id == *b);
            match (contact_a, contact_b) {
                (Some(contact_a), Some(contact_b)) => contact_a.name.cmp(&contact_b.name),
                _ => std::cmp::Ordering::Equal,
            }
        });
        contact_ids
    }

    /// Case-insensitive name filter over the cache; an empty query returns
    /// every contact
    pub fn search_contacts(&self, query: &str) -> Vec<Contact> {
        let query = query.trim().to_lowercase();
        let state = self.inner.state.read().unwrap();

        if query.is_empty() {
            return state.contacts.clone();
        }

        state
            .contacts
            .iter()
            .filter(|c| c.name.to_lowercase().contains(query.as_str()))
            .cloned()
            .collect()
    }

    /// Contacts in subscription (name) order
    pub fn contacts(&self) -> Vec<Contact> {
        self.inner.state.read().unwrap().contacts.clone()
    }

    /// Id-projection of [`ContactStore::contacts`], same order
    pub fn contact_ids(&self) -> Vec<Uuid> {
        self.inner.state.read().unwrap().contact_ids.clone()
    }

    /// Coarse in-flight indicator: set on construction and by `reset`,
    /// cleared by every applied snapshot, toggled around mutations
    pub fn is_loading(&self) -> bool {
        self.inner.state.read().unwrap().is_loading
    }

    /// The bound authenticated user, if initialized
    pub fn user(&self) -> Option<Uuid> {
        self.inner.state.read().unwrap().user
    }

    /// Read the whole engine state atomically
    pub fn state(&self) -> StoreSnapshot {
        let state = self.inner.state.read().unwrap();
        StoreSnapshot {
            user: state.user,
            contacts: state.contacts.clone(),
            contact_ids: state.contact_ids.clone(),
            selected_contact_id: state.selected_contact_id,
            is_loading: state.is_loading,
        }
    }

    /// Current sync counters
    pub fn metrics(&self) -> SyncMetricsSnapshot {
        self.inner.metrics.snapshot()
    }

    fn set_loading(&self, loading: bool) {
        self.inner.state.write().unwrap().is_loading = loading;
    }

    fn tag_lock(&self, contact_id: Uuid) -> Arc<AsyncMutex<()>> {
        let mut locks = self.inner.tag_locks.lock().unwrap();
        Arc::clone(locks.entry(contact_id).or_default())
    }

    /// Await a remote write, logging and counting any failure before it is
    /// surfaced in the outcome
    async fn issue_write<F>(&self, op: F, action: &str) -> WriteOutcome
    where
        F: Future<Output = StoreResult<()>>,
    {
        self.inner.metrics.record_write_issued();
        match op.await {
            Ok(()) => WriteOutcome::Applied,
            Err(err) => {
                tracing::error!("Error {}: {}", action, err);
                self.inner.metrics.record_write_failed();
                WriteOutcome::Failed(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::memory::MemoryRemoteStore;
    use crate::tag::TagCatalog;

    fn empty_store() -> ContactStore {
        ContactStore::new(
            Arc::new(MemoryRemoteStore::new()),
            Arc::new(TagCatalog::new()),
        )
    }

    #[test]
    fn test_starts_empty_and_loading() {
        let store = empty_store();
        let state = store.state();
        assert!(state.user.is_none());
        assert!(state.contacts.is_empty());
        assert!(state.contact_ids.is_empty());
        assert!(state.selected_contact_id.is_none());
        assert!(state.is_loading);
    }

    #[test]
    fn test_get_contact_on_empty_cache() {
        let store = empty_store();
        assert!(store.get_contact(Uuid::new_v4()).is_none());
    }

    #[test]
    fn test_selection_is_a_weak_reference() {
        let store = empty_store();
        let id = Uuid::new_v4();
        store.set_selected_contact_id(id);
        assert_eq!(store.selected_contact_id(), Some(id));
        // Nothing in the cache resolves it
        assert!(store.selected_contact().is_none());
    }

    #[test]
    fn test_reset_restores_initial_state() {
        let store = empty_store();
        store.set_selected_contact_id(Uuid::new_v4());
        store.reset();
        let state = store.state();
        assert!(state.user.is_none());
        assert!(state.selected_contact_id.is_none());
        assert!(state.is_loading);
        assert_eq!(state.contact_ids, Vec::<Uuid>::new());
    }

    #[test]
    fn test_sort_contacts_with_empty_cache_preserves_input() {
        let store = empty_store();
        let ids = vec![Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4()];
        // Every id is unresolvable, so every pair compares equal
        assert_eq!(store.sort_contacts(ids.clone()), ids);
    }

    #[tokio::test]
    async fn test_mutations_before_initialize_are_skipped() {
        let store = empty_store();
        let contact = Contact::new(Uuid::new_v4(), "Alice");
        let tag = Tag::new(Uuid::new_v4(), "work");

        let outcome = store.add_contact("Bob").await;
        assert_eq!(outcome, WriteOutcome::Skipped(SkipReason::NotInitialized));
        let outcome = store.add_tag_to_contact(&contact, &tag).await;
        assert_eq!(outcome, WriteOutcome::Skipped(SkipReason::NotInitialized));
        assert!(!outcome.was_issued());
    }

    #[test]
    fn test_write_outcome_helpers() {
        assert!(WriteOutcome::Applied.is_applied());
        assert!(WriteOutcome::Applied.was_issued());
        assert!(WriteOutcome::Failed(StoreError::transport("x")).was_issued());
        assert!(!WriteOutcome::Skipped(SkipReason::NotInCache).was_issued());
    }
}
