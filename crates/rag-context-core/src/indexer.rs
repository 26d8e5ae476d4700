//! Indexing capability.
//!
//! An [`Indexer`] performs the per-document work (embedding, tokenizing,
//! pushing to an external index) that must finish before a document is
//! marked `indexed`. Concrete implementations live in the application
//! crate, which also owns scheduling, timeouts, and cancellation.

use anyhow::Result;
use async_trait::async_trait;

use crate::models::KnowledgeDocument;

#[async_trait]
pub trait Indexer: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &str;

    /// Index one document. An error marks the document as failed, with the
    /// error message as the reported reason.
    async fn index(&self, doc: &KnowledgeDocument) -> Result<()>;
}
