//! Crawled document store, keyed by URL

use crate::error::{CampusQaError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// A crawled page: its URL and full scraped text
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Document {
    #[serde(rename = "URL", alias = "url")]
    pub url: String,
    pub content: String,
}

/// Read-only URL → document map, loaded once at startup
#[derive(Debug, Default)]
pub struct DocumentStore {
    documents: Vec<Document>,
    by_url: HashMap<String, usize>,
}

impl DocumentStore {
    /// Load a JSON array of `{ "URL": ..., "content": ... }` records
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            CampusQaError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to read documents {:?}: {}", path, e),
            ))
        })?;
        let documents: Vec<Document> = serde_json::from_str(&raw)?;
        let store = Self::from_documents(documents);
        tracing::info!("Loaded {} documents from {}", store.len(), path.display());
        Ok(store)
    }

    /// Build a store; the first record for a URL wins
    pub fn from_documents(documents: impl IntoIterator<Item = Document>) -> Self {
        let mut store = Self::default();
        let mut duplicates = 0usize;

        for doc in documents {
            if store.by_url.contains_key(&doc.url) {
                duplicates += 1;
                tracing::debug!("Duplicate document ignored: {}", doc.url);
                continue;
            }
            store.by_url.insert(doc.url.clone(), store.documents.len());
            store.documents.push(doc);
        }

        if duplicates > 0 {
            tracing::warn!("Ignored {} duplicate document URLs", duplicates);
        }
        store
    }

    pub fn get(&self, url: &str) -> Option<&Document> {
        self.by_url.get(url).map(|&idx| &self.documents[idx])
    }

    /// Documents in load order
    pub fn iter(&self) -> impl Iterator<Item = &Document> {
        self.documents.iter()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}
