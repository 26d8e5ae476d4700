//! Lexical retrieval over the knowledge store.
//!
//! The [`Retriever`] trait is the query-side seam: query in, ranked
//! [`RetrievalResult`]s out, scores in `[0, 1]`. [`LexicalRetriever`] is the
//! keyword-overlap implementation; an embedding backend can replace it
//! without changing callers.
//!
//! # Scoring Algorithm
//!
//! 1. Lowercase the query, split on whitespace, trim edge punctuation, and
//!    drop tokens of three characters or fewer.
//! 2. Per token: `+0.3` if it occurs in the lowercased content, `+0.5` if it
//!    occurs in the lowercased title. Both may fire.
//! 3. Per document tag: `+0.4` if the lowercased tag occurs in the
//!    lowercased query.
//! 4. Clamp to `1.0`.
//! 5. Keep scores above `0.1`, stable-sort descending, truncate to `limit`.
//!
//! Only documents with status `indexed` are scored.

use std::cmp::Ordering;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{KnowledgeDocument, RetrievalResult};
use crate::store::DocumentStore;

/// Number of results returned when the caller does not specify a limit.
pub const DEFAULT_LIMIT: usize = 3;
/// Results must score strictly above this to be returned.
pub const MIN_SCORE: f64 = 0.1;

const CONTENT_WEIGHT: f64 = 0.3;
const TITLE_WEIGHT: f64 = 0.5;
const TAG_WEIGHT: f64 = 0.4;
const MAX_SCORE: f64 = 1.0;
/// Tokens at or below this many characters are treated as stop words.
const MIN_TOKEN_CHARS: usize = 3;

/// Query-side retrieval capability.
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Short backend name for logs and health output.
    fn name(&self) -> &str;

    /// Return at most `limit` results ordered by descending score.
    async fn retrieve(&self, query: &str, limit: usize) -> Result<Vec<RetrievalResult>>;
}

/// A query prepared for scoring.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryTerms {
    lowered: String,
    tokens: Vec<String>,
}

impl QueryTerms {
    /// Returns `None` for an empty or whitespace-only query.
    pub fn parse(query: &str) -> Option<Self> {
        if query.trim().is_empty() {
            return None;
        }
        let lowered = query.to_lowercase();
        let tokens = lowered
            .split_whitespace()
            .map(|t| t.trim_matches(|c: char| c.is_ascii_punctuation()))
            .filter(|t| t.chars().count() > MIN_TOKEN_CHARS)
            .map(str::to_string)
            .collect();
        Some(Self { lowered, tokens })
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }
}

/// Score one document against a parsed query. Always within `[0, 1]`.
pub fn score_document(terms: &QueryTerms, doc: &KnowledgeDocument) -> f64 {
    let content = doc.content.to_lowercase();
    let title = doc.title.to_lowercase();

    let mut score = 0.0;
    for token in &terms.tokens {
        if content.contains(token.as_str()) {
            score += CONTENT_WEIGHT;
        }
        if title.contains(token.as_str()) {
            score += TITLE_WEIGHT;
        }
    }
    for tag in &doc.tags {
        let tag = tag.to_lowercase();
        if !tag.is_empty() && terms.lowered.contains(tag.as_str()) {
            score += TAG_WEIGHT;
        }
    }

    score.min(MAX_SCORE)
}

/// Score, filter, and rank a document snapshot.
///
/// Ties keep the snapshot order since the sort is stable.
pub fn rank_documents(
    docs: &[KnowledgeDocument],
    query: &str,
    limit: usize,
) -> Vec<RetrievalResult> {
    let terms = match QueryTerms::parse(query) {
        Some(t) => t,
        None => return Vec::new(),
    };
    if limit == 0 {
        return Vec::new();
    }

    let mut results: Vec<RetrievalResult> = docs
        .iter()
        .filter(|d| d.is_indexed())
        .filter_map(|d| {
            let score = score_document(&terms, d);
            (score > MIN_SCORE).then(|| RetrievalResult {
                document_id: d.id.clone(),
                content: d.content.clone(),
                score,
            })
        })
        .collect();

    results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    results.truncate(limit);
    results
}

/// Keyword-overlap [`Retriever`] over any [`DocumentStore`].
pub struct LexicalRetriever<S: DocumentStore + ?Sized> {
    store: Arc<S>,
}

impl<S: DocumentStore + ?Sized> LexicalRetriever<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl<S: DocumentStore + ?Sized> Retriever for LexicalRetriever<S> {
    fn name(&self) -> &str {
        "lexical"
    }

    async fn retrieve(&self, query: &str, limit: usize) -> Result<Vec<RetrievalResult>> {
        if QueryTerms::parse(query).is_none() {
            return Ok(Vec::new());
        }
        let snapshot = self.store.list().await?;
        Ok(rank_documents(&snapshot, query, limit))
    }
}
