//! Storage abstraction for the knowledge base.
//!
//! The [`DocumentStore`] trait defines the operations the knowledge base
//! and the retrievers need, so the in-memory backend can be replaced by a
//! persistent document or vector store without touching callers.
//!
//! Implementations must be `Send + Sync` to be shared across async tasks.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{DocumentStatus, KnowledgeDocument};

/// Abstract storage backend for knowledge documents.
///
/// # Operations
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`insert`](DocumentStore::insert) | Append a document (or replace one with the same id) |
/// | [`get`](DocumentStore::get) | Look up a document by id |
/// | [`list`](DocumentStore::list) | Snapshot of every document, insertion order |
/// | [`remove`](DocumentStore::remove) | Delete a document by id |
/// | [`update_status`](DocumentStore::update_status) | Record an indexing status transition |
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert a document. A document with the same id is replaced in place.
    async fn insert(&self, doc: KnowledgeDocument) -> Result<()>;

    /// Retrieve a document by id.
    async fn get(&self, id: &str) -> Result<Option<KnowledgeDocument>>;

    /// Return a copy of every stored document in insertion order.
    ///
    /// The copy must be taken atomically with respect to concurrent
    /// inserts and removals.
    async fn list(&self) -> Result<Vec<KnowledgeDocument>>;

    /// Remove a document. Returns `false` if no document had this id.
    async fn remove(&self, id: &str) -> Result<bool>;

    /// Set the status (and failure reason) of a document.
    ///
    /// Returns `false` without inserting anything if the document is gone.
    async fn update_status(
        &self,
        id: &str,
        status: DocumentStatus,
        error: Option<String>,
    ) -> Result<bool>;
}
