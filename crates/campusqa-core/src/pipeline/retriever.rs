//! Embedding-based candidate retrieval

use crate::corpus::{normalize, DocumentStore, VectorIndex};
use crate::error::Result;
use crate::llm::Embedder;
use serde::Serialize;
use std::sync::Arc;

/// A retrieved document not yet judged for relevance
#[derive(Debug, Clone, Serialize)]
pub struct CandidateDocument {
    pub url: String,
    pub content: String,
    /// Inner product with the query, roughly in [-1, 1]
    pub score: f32,
    /// Position in descending score order, 0-based
    pub rank: usize,
}

/// Vector index + document store behind one query embedder
pub struct Retriever {
    index: Arc<VectorIndex>,
    documents: Arc<DocumentStore>,
    embedder: Arc<dyn Embedder>,
}

impl Retriever {
    pub fn new(
        index: Arc<VectorIndex>,
        documents: Arc<DocumentStore>,
        embedder: Arc<dyn Embedder>,
    ) -> Self {
        Self {
            index,
            documents,
            embedder,
        }
    }

    /// Top-`top_k` candidates for `query`, descending by score.
    ///
    /// Indexed URLs missing from the store are skipped, so fewer than `top_k`
    /// candidates may come back.
    pub async fn retrieve(&self, query: &str, top_k: usize) -> Result<Vec<CandidateDocument>> {
        let mut query_embedding = self.embedder.embed(query).await?;
        normalize(&mut query_embedding);

        let hits = self.index.search(&query_embedding, top_k)?;

        let candidates: Vec<CandidateDocument> = hits
            .into_iter()
            .filter_map(|(url, score)| match self.documents.get(&url) {
                Some(doc) => Some((doc.content.clone(), url, score)),
                None => {
                    tracing::debug!("Indexed URL missing from document store: {}", url);
                    None
                }
            })
            .enumerate()
            .map(|(rank, (content, url, score))| CandidateDocument {
                url,
                content,
                score,
                rank,
            })
            .collect();

        tracing::debug!("Retrieved {} candidates for {:?}", candidates.len(), query);
        Ok(candidates)
    }
}
