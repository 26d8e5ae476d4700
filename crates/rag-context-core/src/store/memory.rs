//! In-memory [`DocumentStore`] implementation.
//!
//! Uses an insertion-ordered `IndexMap` behind a `parking_lot::RwLock`.
//! Every operation holds the lock only for the map access itself, so a
//! slow indexing task never blocks readers.

use anyhow::Result;
use async_trait::async_trait;
use indexmap::IndexMap;
use parking_lot::RwLock;

use crate::models::{DocumentStatus, KnowledgeDocument};

use super::DocumentStore;

/// Process-local document store. Contents are lost on restart.
pub struct InMemoryStore {
    docs: RwLock<IndexMap<String, KnowledgeDocument>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            docs: RwLock::new(IndexMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.docs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.read().is_empty()
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn insert(&self, doc: KnowledgeDocument) -> Result<()> {
        self.docs.write().insert(doc.id.clone(), doc);
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<KnowledgeDocument>> {
        Ok(self.docs.read().get(id).cloned())
    }

    async fn list(&self) -> Result<Vec<KnowledgeDocument>> {
        Ok(self.docs.read().values().cloned().collect())
    }

    async fn remove(&self, id: &str) -> Result<bool> {
        // shift_remove keeps the remaining documents in insertion order
        Ok(self.docs.write().shift_remove(id).is_some())
    }

    async fn update_status(
        &self,
        id: &str,
        status: DocumentStatus,
        error: Option<String>,
    ) -> Result<bool> {
        let mut docs = self.docs.write();
        match docs.get_mut(id) {
            Some(doc) => {
                doc.status = status;
                doc.error = error;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewDocument;

    fn doc(title: &str) -> KnowledgeDocument {
        KnowledgeDocument::processing(NewDocument::new(title, format!("{} body", title)))
    }

    #[tokio::test]
    async fn test_list_preserves_insertion_order() {
        let store = InMemoryStore::new();
        for title in ["one", "two", "three"] {
            store.insert(doc(title)).await.unwrap();
        }
        let titles: Vec<String> = store
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|d| d.title)
            .collect();
        assert_eq!(titles, vec!["one", "two", "three"]);
    }

    #[tokio::test]
    async fn test_remove_keeps_order_and_is_idempotent() {
        let store = InMemoryStore::new();
        let a = doc("a");
        let b = doc("b");
        let c = doc("c");
        let b_id = b.id.clone();
        for d in [a, b, c] {
            store.insert(d).await.unwrap();
        }

        assert!(store.remove(&b_id).await.unwrap());
        let after_first = store.list().await.unwrap();
        assert!(!store.remove(&b_id).await.unwrap());
        let after_second = store.list().await.unwrap();

        assert_eq!(after_first, after_second);
        let titles: Vec<&str> = after_second.iter().map(|d| d.title.as_str()).collect();
        assert_eq!(titles, vec!["a", "c"]);
    }

    #[tokio::test]
    async fn test_list_is_a_copy() {
        let store = InMemoryStore::new();
        let d = doc("a");
        let id = d.id.clone();
        store.insert(d).await.unwrap();

        let snapshot = store.list().await.unwrap();
        store.remove(&id).await.unwrap();
        store.insert(doc("b")).await.unwrap();

        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].id, id);
    }

    #[tokio::test]
    async fn test_update_status() {
        let store = InMemoryStore::new();
        let d = doc("a");
        let id = d.id.clone();
        store.insert(d).await.unwrap();

        assert!(store
            .update_status(&id, DocumentStatus::Error, Some("boom".to_string()))
            .await
            .unwrap());
        let stored = store.get(&id).await.unwrap().unwrap();
        assert_eq!(stored.status, DocumentStatus::Error);
        assert_eq!(stored.error.as_deref(), Some("boom"));

        assert!(!store
            .update_status("missing", DocumentStatus::Indexed, None)
            .await
            .unwrap());
        assert_eq!(store.len(), 1);
    }
}
