//! Pre-crawled corpus: documents, their embeddings and the vector index

mod documents;
mod embeddings;
mod index;

pub use documents::{Document, DocumentStore};
pub use embeddings::{EmbeddingManifest, EmbeddingMatrix, EmbeddingRecord};
pub use index::{inner_product, normalize, VectorIndex};

use crate::config::CorpusConfig;
use crate::error::Result;
use crate::llm::Embedder;
use std::sync::Arc;

/// Documents and index loaded together at startup; read-only afterwards
pub struct Corpus {
    pub documents: Arc<DocumentStore>,
    pub index: Arc<VectorIndex>,
}

impl Corpus {
    /// Load documents and embeddings, failing fast if the matrix was not built
    /// by `embedder`'s model at its dimensionality.
    pub fn load(config: &CorpusConfig, embedder: &dyn Embedder) -> Result<Self> {
        let documents = DocumentStore::load(&config.documents)?;
        let matrix = EmbeddingMatrix::load(&config.embeddings)?;
        matrix.check_compatible(embedder.model_name(), embedder.dimensions())?;

        let missing = matrix
            .records
            .iter()
            .filter(|r| documents.get(&r.url).is_none())
            .count();
        if missing > 0 {
            tracing::warn!(
                "{} indexed URLs have no stored document and will be skipped at query time",
                missing
            );
        }

        let index = VectorIndex::from_matrix(matrix)?;
        Ok(Self {
            documents: Arc::new(documents),
            index: Arc::new(index),
        })
    }
}
