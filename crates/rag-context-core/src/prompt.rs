//! Context-block formatting for downstream prompts.
//!
//! Renders [`RetrievalResult`]s into a fixed-template text block:
//!
//! ```text
//! Relevant context from the knowledge base:
//!
//! [SOURCE 1]: first result content
//!
//! [SOURCE 2]: second result content
//!
//! Use this context to ground your response where it is relevant.
//! ```
//!
//! An empty result list renders as the empty string, which callers treat
//! as "omit the context block".

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};
use crate::models::RetrievalResult;

pub const RESULTS_PLACEHOLDER: &str = "{results}";
pub const INDEX_PLACEHOLDER: &str = "{index}";
pub const CONTENT_PLACEHOLDER: &str = "{content}";

pub const DEFAULT_BLOCK: &str = "Relevant context from the knowledge base:\n\n{results}\n\nUse this context to ground your response where it is relevant.";
pub const DEFAULT_ENTRY: &str = "[SOURCE {index}]: {content}";
pub const DEFAULT_SEPARATOR: &str = "\n\n";

/// Text template for the context block.
///
/// `block` wraps the rendered entries via `{results}`; `entry` renders one
/// result via `{index}` (1-based) and `{content}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptTemplate {
    pub block: String,
    pub entry: String,
    pub separator: String,
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self {
            block: DEFAULT_BLOCK.to_string(),
            entry: DEFAULT_ENTRY.to_string(),
            separator: DEFAULT_SEPARATOR.to_string(),
        }
    }
}

impl PromptTemplate {
    /// Build a template, rejecting ones that would drop the results.
    pub fn new(
        block: impl Into<String>,
        entry: impl Into<String>,
        separator: impl Into<String>,
    ) -> Result<Self> {
        let template = Self {
            block: block.into(),
            entry: entry.into(),
            separator: separator.into(),
        };
        template.validate()?;
        Ok(template)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.block.contains(RESULTS_PLACEHOLDER) {
            return Err(RagError::InvalidTemplate(format!(
                "block must contain {}",
                RESULTS_PLACEHOLDER
            )));
        }
        if !self.entry.contains(CONTENT_PLACEHOLDER) {
            return Err(RagError::InvalidTemplate(format!(
                "entry must contain {}",
                CONTENT_PLACEHOLDER
            )));
        }
        Ok(())
    }

    /// Render results into a context block, or `""` when there are none.
    pub fn render(&self, results: &[RetrievalResult]) -> String {
        if results.is_empty() {
            return String::new();
        }

        // Content is substituted last so placeholder-like text inside
        // documents is never expanded.
        let entries: Vec<String> = results
            .iter()
            .enumerate()
            .map(|(i, r)| {
                self.entry
                    .replace(INDEX_PLACEHOLDER, &(i + 1).to_string())
                    .replace(CONTENT_PLACEHOLDER, &r.content)
            })
            .collect();

        self.block
            .replacen(RESULTS_PLACEHOLDER, &entries.join(&self.separator), 1)
    }
}

/// Render with the default template.
pub fn format_context_for_prompt(results: &[RetrievalResult]) -> String {
    PromptTemplate::default().render(results)
}
