//! Error taxonomy for knowledge-base operations.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, RagError>;

#[derive(Error, Debug)]
pub enum RagError {
    #[error("document not found: {0}")]
    NotFound(String),

    #[error("invalid document: {0}")]
    InvalidDocument(String),

    #[error("indexing failed for document {id}: {reason}")]
    IndexingFailed { id: String, reason: String },

    #[error("invalid prompt template: {0}")]
    InvalidTemplate(String),

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}
