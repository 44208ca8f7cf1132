use super::store::{validate_key, DocumentStore};
use crate::domain::Document;
use anyhow::Result;
use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

/// In-process store. Documents are kept detached from their history.
#[derive(Default)]
pub struct MemoryDocumentStore {
    documents: RwLock<BTreeMap<String, Document>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn get(&self, key: &str) -> Result<Option<Document>> {
        validate_key(key)?;
        Ok(self.documents.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, document: &Document) -> Result<()> {
        validate_key(key)?;
        self.documents
            .write()
            .await
            .insert(key.to_string(), document.detached());
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>> {
        Ok(self.documents.read().await.keys().cloned().collect())
    }
}
