//! XFContacts - Contact Cache & Sync Engine
//!
//! XFContacts is the client-side synchronization and mutation layer for a
//! user's contact collection backed by a remote document database. It keeps
//! a local reactive cache consistent with a live subscription and exposes
//! write-through mutation operations whose results reach the cache only via
//! the subscription echo.
//!
//! # Overview
//!
//! This library provides:
//! - A reactive in-memory contact cache with deterministic name ordering
//! - Full-snapshot resynchronization driven by a live subscription
//! - Create/rename/delete and tag attach/detach mutations with per-call
//!   outcomes
//! - An injectable remote-store interface with an in-memory reference
//!   implementation
//!
//! # Module Structure
//!
//! - **`contact`** - Contact data types
//! - **`tag`** - Tag references and the canonical-ordering collaborator
//! - **`error`** - Store error types
//! - **`remote`** - The remote document store interface and the in-memory
//!   implementation
//! - **`store`** - The cache & sync engine, subscription handling, metrics
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use xfcontacts::{ContactStore, MemoryRemoteStore, TagCatalog};
//!
//! # async fn example() -> Result<(), xfcontacts::StoreError> {
//! let store = ContactStore::new(
//!     Arc::new(MemoryRemoteStore::new()),
//!     Arc::new(TagCatalog::new()),
//! );
//!
//! let subscription = store.initialize(uuid::Uuid::new_v4()).await?;
//! store.add_contact("Alice").await;
//! subscription.cancel();
//! # Ok(())
//! # }
//! ```
//!
//! # Consistency Model
//!
//! Mutations are write-through, not optimistic: no local field changes
//! until the remote store's subscription delivers a fresh snapshot. The
//! subscription apply task is the only writer of the cache, and `contacts`
//! together with its `contact_ids` projection are replaced atomically on
//! every snapshot. Offline-first conflict resolution and pagination are out
//! of scope.

/// Contact data types
pub mod contact;

/// Store error types
pub mod error;

/// Remote document store interface
pub mod remote;

/// The cache & sync engine
pub mod store;

/// Tag references and canonical ordering
pub mod tag;

/// Re-export commonly used types for convenience
pub use contact::{Contact, ContactUpdate};
pub use error::{StoreError, StoreResult};
pub use remote::memory::MemoryRemoteStore;
pub use remote::{
    ContactDocument, ContactPatch, ContactSnapshot, RemoteContactStore, SnapshotStream,
};
pub use store::{
    ContactStore, SkipReason, StoreSnapshot, SubscriptionHandle, SubscriptionStatus,
    SyncMetricsSnapshot, WriteOutcome,
};
pub use tag::{Tag, TagCatalog, TagOrdering};
