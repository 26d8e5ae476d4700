//! Startup seeding.
//!
//! The store is in-memory, so every process starts empty. Seeding adds
//! the built-in fixtures (a brand style guide and a product manual) and
//! any documents listed in a JSON file:
//!
//! ```json
//! [
//!   { "title": "FAQ", "content": "...", "type": "text", "tags": ["support"] }
//! ]
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use rag_context_core::{DocumentType, KnowledgeDocument, NewDocument};
use tracing::info;

use crate::config::SeedConfig;
use crate::knowledge::KnowledgeBase;

/// The two reference documents.
pub fn default_fixtures() -> Vec<NewDocument> {
    vec![
        NewDocument::new(
            "Brand Style Guide 2025",
            "DigitalMEng speaks with a confident, warm and concise voice. \
             Headlines use sentence case, body copy stays under twenty words per \
             sentence, and the primary palette is deep navy with coral accents. \
             Avoid jargon and exclamation marks in customer-facing copy.",
        )
        .with_type(DocumentType::Pdf)
        .with_tags(["branding", "guidelines"]),
        NewDocument::new(
            "Product Manual - V3",
            "Version 3 of the product introduces new features including real-time \
             collaboration, an analytics dashboard, scheduled publishing and \
             role-based access control for teams.",
        )
        .with_type(DocumentType::Text)
        .with_tags(["product", "features"]),
    ]
}

/// Read a JSON array of [`NewDocument`]s.
pub fn load_documents_file(path: &Path) -> Result<Vec<NewDocument>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read seed documents: {}", path.display()))?;
    let docs: Vec<NewDocument> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse seed documents: {}", path.display()))?;
    Ok(docs)
}

/// Add `docs` concurrently and wait for all of them to be indexed.
///
/// Fails on the first document that cannot be indexed.
pub async fn seed_documents(
    kb: &KnowledgeBase,
    docs: Vec<NewDocument>,
) -> Result<Vec<KnowledgeDocument>> {
    let mut handles = Vec::with_capacity(docs.len());
    for doc in docs {
        handles.push(kb.submit_document(doc).await?);
    }

    let mut indexed = Vec::with_capacity(handles.len());
    for handle in handles {
        indexed.push(handle.wait().await?);
    }
    Ok(indexed)
}

/// Apply the `[seed]` configuration.
pub async fn seed_from_config(kb: &KnowledgeBase, config: &SeedConfig) -> Result<usize> {
    let mut docs = Vec::new();
    if config.fixtures {
        docs.extend(default_fixtures());
    }
    if let Some(path) = &config.documents_path {
        docs.extend(load_documents_file(path)?);
    }
    if docs.is_empty() {
        return Ok(0);
    }

    let seeded = seed_documents(kb, docs).await?;
    info!(count = seeded.len(), "Seeded knowledge base");
    Ok(seeded.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Arc;
    use std::time::Duration;

    use rag_context_core::store::memory::InMemoryStore;

    use crate::indexer::SimulatedIndexer;

    fn kb() -> KnowledgeBase {
        KnowledgeBase::new(
            Arc::new(InMemoryStore::new()),
            Arc::new(SimulatedIndexer::new(Duration::ZERO)),
        )
    }

    #[tokio::test]
    async fn test_fixtures_answer_product_question() {
        let kb = kb();
        seed_documents(&kb, default_fixtures()).await.unwrap();

        let docs = kb.get_documents().await.unwrap();
        assert_eq!(docs[0].title, "Brand Style Guide 2025");
        assert_eq!(docs[1].title, "Product Manual - V3");

        let results = kb
            .retrieve_context("What are the product features?", None)
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].document_id, docs[1].id);
        assert!((results[0].score - 1.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_seed_from_config_with_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"title": "Refund policy", "content": "Refunds within 30 days", "tags": ["billing"]}}]"#
        )
        .unwrap();

        let kb = kb();
        let config = SeedConfig {
            fixtures: true,
            documents_path: Some(file.path().to_path_buf()),
        };
        assert_eq!(seed_from_config(&kb, &config).await.unwrap(), 3);

        let results = kb.retrieve_context("billing refunds", None).await.unwrap();
        assert_eq!(results.len(), 1);
        assert!(results[0].content.starts_with("Refunds"));
    }

    #[tokio::test]
    async fn test_seed_disabled() {
        let kb = kb();
        let config = SeedConfig {
            fixtures: false,
            documents_path: None,
        };
        assert_eq!(seed_from_config(&kb, &config).await.unwrap(), 0);
        assert!(kb.get_documents().await.unwrap().is_empty());
    }

    #[test]
    fn test_bad_seed_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        let err = load_documents_file(file.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse seed documents"));
    }
}
