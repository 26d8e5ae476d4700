//! Built-in [`Indexer`] implementations.
//!
//! No external index backs the knowledge base yet, so [`SimulatedIndexer`]
//! stands in for embedding work with a fixed, deterministic delay.

use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;
use rag_context_core::indexer::Indexer;
use rag_context_core::KnowledgeDocument;

/// Sleeps for `delay`, then accepts any document with non-blank content.
pub struct SimulatedIndexer {
    delay: Duration,
}

impl SimulatedIndexer {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl Indexer for SimulatedIndexer {
    fn name(&self) -> &str {
        "simulated"
    }

    async fn index(&self, doc: &KnowledgeDocument) -> Result<()> {
        tokio::time::sleep(self.delay).await;
        if doc.content.trim().is_empty() {
            bail!("document has no content to index");
        }
        Ok(())
    }
}
