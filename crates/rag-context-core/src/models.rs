//! Core data models for the knowledge base.
//!
//! These types represent the documents that flow into the store and the
//! scored results that flow out of retrieval and into prompt formatting.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Provenance of a document. Not used in scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    Pdf,
    #[default]
    Text,
    Url,
    PastContent,
}

/// Lifecycle state of a stored document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    Indexed,
    Processing,
    Error,
}

/// Payload accepted when adding a document.
///
/// `id`, `date_added` and `status` are assigned by the knowledge base.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewDocument {
    pub title: String,
    pub content: String,
    #[serde(rename = "type", default)]
    pub doc_type: DocumentType,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl NewDocument {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            doc_type: DocumentType::Text,
            tags: Vec::new(),
        }
    }

    pub fn with_type(mut self, doc_type: DocumentType) -> Self {
        self.doc_type = doc_type;
        self
    }

    pub fn with_tags<I, T>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }
}

/// A document held by a [`DocumentStore`](crate::store::DocumentStore).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeDocument {
    pub id: String,
    pub title: String,
    pub content: String,
    #[serde(rename = "type")]
    pub doc_type: DocumentType,
    pub tags: Vec<String>,
    pub date_added: DateTime<Utc>,
    pub status: DocumentStatus,
    /// Reason for the failure when `status` is [`DocumentStatus::Error`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl KnowledgeDocument {
    /// Builds a fresh `processing` document with a new UUID and the current
    /// timestamp. Tags are normalized via [`normalize_tags`].
    pub fn processing(new: NewDocument) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: new.title,
            content: new.content,
            doc_type: new.doc_type,
            tags: normalize_tags(new.tags),
            date_added: Utc::now(),
            status: DocumentStatus::Processing,
            error: None,
        }
    }

    pub fn is_indexed(&self) -> bool {
        self.status == DocumentStatus::Indexed
    }
}

/// Trim tags, drop empty ones, and drop case-insensitive duplicates while
/// keeping the first occurrence.
///
/// An empty tag would otherwise match every query.
pub fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut seen: Vec<String> = Vec::with_capacity(tags.len());
    let mut out = Vec::with_capacity(tags.len());
    for tag in tags {
        let trimmed = tag.trim();
        if trimmed.is_empty() {
            continue;
        }
        let key = trimmed.to_lowercase();
        if seen.contains(&key) {
            continue;
        }
        seen.push(key);
        out.push(trimmed.to_string());
    }
    out
}

/// A scored match produced by a [`Retriever`](crate::search::Retriever).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalResult {
    /// Id of the source document. Looked up, not owned.
    pub document_id: String,
    /// Copy of the document content at query time.
    pub content: String,
    /// Relevance score in `[0.0, 1.0]`.
    pub score: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_processing_assigns_fresh_ids() {
        let a = KnowledgeDocument::processing(NewDocument::new("A", "alpha"));
        let b = KnowledgeDocument::processing(NewDocument::new("A", "alpha"));
        assert_ne!(a.id, b.id);
        assert_eq!(a.status, DocumentStatus::Processing);
        assert!(a.error.is_none());
    }

    #[test]
    fn test_normalize_tags() {
        let tags = vec![
            " branding ".to_string(),
            "".to_string(),
            "Branding".to_string(),
            "guidelines".to_string(),
            "   ".to_string(),
        ];
        assert_eq!(normalize_tags(tags), vec!["branding", "guidelines"]);
    }

    #[test]
    fn test_document_type_wire_names() {
        let json = serde_json::to_string(&DocumentType::PastContent).unwrap();
        assert_eq!(json, "\"past_content\"");
    }

    #[test]
    fn test_new_document_deserialize_defaults() {
        let doc: NewDocument =
            serde_json::from_str(r#"{"title": "T", "content": "C"}"#).unwrap();
        assert_eq!(doc.doc_type, DocumentType::Text);
        assert!(doc.tags.is_empty());

        let doc: NewDocument = serde_json::from_str(
            r#"{"title": "T", "content": "C", "type": "pdf", "tags": ["a"]}"#,
        )
        .unwrap();
        assert_eq!(doc.doc_type, DocumentType::Pdf);
        assert_eq!(doc.tags, vec!["a"]);
    }
}
