//! # RAG Context Core
//!
//! Runtime-agnostic logic for the RAG context engine: the knowledge
//! document model, the store and retriever capabilities, the lexical
//! scoring heuristic, and the prompt formatter.
//!
//! This crate contains no tokio, network, or filesystem dependencies.
//! Indexing tasks, configuration, and the HTTP surface live in the
//! `rag-context` application crate.

pub mod error;
pub mod indexer;
pub mod models;
pub mod prompt;
pub mod search;
pub mod store;

pub use error::{RagError, Result};
pub use models::{DocumentStatus, DocumentType, KnowledgeDocument, NewDocument, RetrievalResult};
