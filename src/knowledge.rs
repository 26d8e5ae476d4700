//! The knowledge base service.
//!
//! [`KnowledgeBase`] ties a [`DocumentStore`], a [`Retriever`], an
//! [`Indexer`] and a [`PromptTemplate`] together, and owns the background
//! indexing tasks. It is constructed once at startup and shared by
//! reference (usually behind an `Arc`) with the CLI and HTTP handlers.
//!
//! # Document Lifecycle
//!
//! ```text
//! add/submit ──▶ processing ──┬──▶ indexed
//!                             └──▶ error (indexer failure, timeout, cancel)
//! ```
//!
//! A document is inserted as `processing` before its indexing task starts,
//! so the transition is observable through [`KnowledgeBase::get_document`].
//! Indexing runs on its own tokio task, outside any store lock: reads and
//! retrievals of already-indexed documents are never blocked by it.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use rag_context_core::indexer::Indexer;
use rag_context_core::prompt::PromptTemplate;
use rag_context_core::search::{LexicalRetriever, Retriever, DEFAULT_LIMIT};
use rag_context_core::store::memory::InMemoryStore;
use rag_context_core::store::DocumentStore;
use rag_context_core::{
    DocumentStatus, KnowledgeDocument, NewDocument, RagError, Result, RetrievalResult,
};
use serde::Serialize;
use tokio::task::{AbortHandle, JoinHandle};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::indexer::SimulatedIndexer;

pub const CANCELLED_REASON: &str = "indexing cancelled";
const REMOVED_REASON: &str = "document was removed during indexing";
const DEFAULT_INDEXING_TIMEOUT: Duration = Duration::from_secs(30);

type TaskMap = Arc<Mutex<HashMap<String, AbortHandle>>>;

/// Retrieval results together with their rendered context block.
#[derive(Debug, Clone, Serialize)]
pub struct ContextBlock {
    pub results: Vec<RetrievalResult>,
    /// Empty when there are no results.
    pub context: String,
}

pub struct KnowledgeBase {
    store: Arc<dyn DocumentStore>,
    retriever: Arc<dyn Retriever>,
    indexer: Arc<dyn Indexer>,
    template: PromptTemplate,
    default_limit: usize,
    indexing_timeout: Duration,
    tasks: TaskMap,
}

impl KnowledgeBase {
    /// Build a knowledge base with a [`LexicalRetriever`] over `store`, the
    /// default prompt template, and a 30 second indexing timeout.
    pub fn new(store: Arc<dyn DocumentStore>, indexer: Arc<dyn Indexer>) -> Self {
        let retriever: Arc<dyn Retriever> = Arc::new(LexicalRetriever::new(store.clone()));
        Self {
            store,
            retriever,
            indexer,
            template: PromptTemplate::default(),
            default_limit: DEFAULT_LIMIT,
            indexing_timeout: DEFAULT_INDEXING_TIMEOUT,
            tasks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// In-memory store and simulated indexer, tuned from `config`.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let store: Arc<dyn DocumentStore> = Arc::new(InMemoryStore::new());
        let indexer: Arc<dyn Indexer> = Arc::new(SimulatedIndexer::new(config.indexing.delay()));
        Ok(Self::new(store, indexer)
            .with_template(config.prompt.template()?)
            .with_default_limit(config.retrieval.default_limit)
            .with_indexing_timeout(config.indexing.timeout()))
    }

    pub fn with_retriever(mut self, retriever: Arc<dyn Retriever>) -> Self {
        self.retriever = retriever;
        self
    }

    pub fn with_template(mut self, template: PromptTemplate) -> Self {
        self.template = template;
        self
    }

    pub fn with_default_limit(mut self, limit: usize) -> Self {
        self.default_limit = limit;
        self
    }

    pub fn with_indexing_timeout(mut self, timeout: Duration) -> Self {
        self.indexing_timeout = timeout;
        self
    }

    pub fn retriever_name(&self) -> &str {
        self.retriever.name()
    }

    pub fn indexer_name(&self) -> &str {
        self.indexer.name()
    }

    /// Number of indexing tasks still in flight.
    pub fn pending_indexing(&self) -> usize {
        self.tasks.lock().len()
    }

    /// Add a document and wait for it to be indexed.
    ///
    /// On indexer failure, timeout, or cancellation the stored document is
    /// left with status `error` and this returns [`RagError::IndexingFailed`].
    pub async fn add_document(&self, new: NewDocument) -> Result<KnowledgeDocument> {
        self.submit_document(new).await?.wait().await
    }

    /// Insert a document as `processing` and start indexing it in the
    /// background. The returned handle can be awaited for the final state.
    pub async fn submit_document(&self, new: NewDocument) -> Result<IndexingHandle> {
        if new.title.trim().is_empty() {
            return Err(RagError::InvalidDocument(
                "title must not be empty".to_string(),
            ));
        }

        let doc = KnowledgeDocument::processing(new);
        let id = doc.id.clone();
        self.store.insert(doc.clone()).await?;
        debug!(document_id = %id, title = %doc.title, "Indexing document");

        let job = run_indexing(
            self.store.clone(),
            self.indexer.clone(),
            self.tasks.clone(),
            doc,
            self.indexing_timeout,
        );

        // The task must be registered before it can look itself up on completion.
        let task = {
            let mut tasks = self.tasks.lock();
            let task = tokio::spawn(job);
            tasks.insert(id.clone(), task.abort_handle());
            task
        };

        Ok(IndexingHandle { id, task })
    }

    /// Abort an in-flight indexing task and mark its document `error`.
    ///
    /// Returns `false` if the document is not being indexed.
    pub async fn cancel_indexing(&self, id: &str) -> Result<bool> {
        let pending = self.tasks.lock().remove(id);
        match pending {
            Some(handle) => {
                handle.abort();
                self.store
                    .update_status(id, DocumentStatus::Error, Some(CANCELLED_REASON.to_string()))
                    .await?;
                info!(document_id = %id, "Indexing cancelled");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Snapshot of every document, in insertion order.
    pub async fn get_documents(&self) -> Result<Vec<KnowledgeDocument>> {
        Ok(self.store.list().await?)
    }

    pub async fn get_document(&self, id: &str) -> Result<Option<KnowledgeDocument>> {
        Ok(self.store.get(id).await?)
    }

    /// Remove a document, cancelling its indexing task if one is running.
    ///
    /// Unknown ids are not an error; the return value only reports whether
    /// anything was removed.
    pub async fn remove_document(&self, id: &str) -> Result<bool> {
        let pending = self.tasks.lock().remove(id);
        if let Some(handle) = pending {
            handle.abort();
        }
        let removed = self.store.remove(id).await?;
        if removed {
            info!(document_id = %id, "Document removed");
        }
        Ok(removed)
    }

    /// Rank indexed documents against `query`. `limit` defaults to the
    /// configured retrieval limit.
    pub async fn retrieve_context(
        &self,
        query: &str,
        limit: Option<usize>,
    ) -> Result<Vec<RetrievalResult>> {
        let limit = limit.unwrap_or(self.default_limit);
        let results = self.retriever.retrieve(query, limit).await?;
        debug!(
            query = %query,
            limit,
            matches = results.len(),
            retriever = self.retriever.name(),
            "Retrieved context"
        );
        Ok(results)
    }

    /// Render results with the configured template. Empty for no results.
    pub fn format_context(&self, results: &[RetrievalResult]) -> String {
        self.template.render(results)
    }

    /// Retrieve and format in one step.
    pub async fn build_context(&self, query: &str, limit: Option<usize>) -> Result<ContextBlock> {
        let results = self.retrieve_context(query, limit).await?;
        let context = self.format_context(&results);
        Ok(ContextBlock { results, context })
    }
}

impl Drop for KnowledgeBase {
    fn drop(&mut self) {
        for (_, handle) in self.tasks.lock().drain() {
            handle.abort();
        }
    }
}

/// Completion handle for a submitted document.
pub struct IndexingHandle {
    id: String,
    task: JoinHandle<Result<KnowledgeDocument>>,
}

impl IndexingHandle {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Wait for indexing to finish. Returns the `indexed` document, or
    /// [`RagError::IndexingFailed`].
    pub async fn wait(self) -> Result<KnowledgeDocument> {
        match self.task.await {
            Ok(result) => result,
            Err(e) if e.is_cancelled() => Err(RagError::IndexingFailed {
                id: self.id,
                reason: CANCELLED_REASON.to_string(),
            }),
            Err(e) => Err(RagError::IndexingFailed {
                id: self.id,
                reason: format!("indexing task failed: {}", e),
            }),
        }
    }
}

/// Aborts the wrapped task when dropped, including when the owning task
/// is itself aborted.
struct AbortOnDrop(AbortHandle);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

async fn run_indexing(
    store: Arc<dyn DocumentStore>,
    indexer: Arc<dyn Indexer>,
    tasks: TaskMap,
    mut doc: KnowledgeDocument,
    timeout: Duration,
) -> Result<KnowledgeDocument> {
    let id = doc.id.clone();

    // Run the indexer on its own task so a panic is reported as a failure.
    let work_doc = doc.clone();
    let work_indexer = indexer.clone();
    let mut work = tokio::spawn(async move { work_indexer.index(&work_doc).await });
    let _guard = AbortOnDrop(work.abort_handle());

    let outcome = match tokio::time::timeout(timeout, &mut work).await {
        Ok(Ok(Ok(()))) => Ok(()),
        Ok(Ok(Err(e))) => Err(format!("{:#}", e)),
        Ok(Err(e)) => Err(format!("{} indexer failed: {}", indexer.name(), e)),
        Err(_) => Err(format!("indexing timed out after {:?}", timeout)),
    };

    // Whoever removes the task entry owns the final status write, so a
    // cancelled document never flips back to indexed.
    if tasks.lock().remove(&id).is_none() {
        return Err(RagError::IndexingFailed {
            id,
            reason: CANCELLED_REASON.to_string(),
        });
    }

    match outcome {
        Ok(()) => {
            if !store.update_status(&id, DocumentStatus::Indexed, None).await? {
                return Err(RagError::IndexingFailed {
                    id,
                    reason: REMOVED_REASON.to_string(),
                });
            }
            info!(document_id = %id, title = %doc.title, "Document indexed");
            doc.status = DocumentStatus::Indexed;
            Ok(doc)
        }
        Err(reason) => {
            store
                .update_status(&id, DocumentStatus::Error, Some(reason.clone()))
                .await?;
            warn!(document_id = %id, reason = %reason, "Indexing failed");
            Err(RagError::IndexingFailed { id, reason })
        }
    }
}
