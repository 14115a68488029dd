//! Exact inner-product vector index
//!
//! Vectors are L2-normalized on insert, so inner product equals cosine
//! similarity. Query vectors must be normalized the same way (see
//! [`normalize`]) or scores are not comparable.

use super::embeddings::{EmbeddingMatrix, EmbeddingRecord};
use crate::error::{CampusQaError, Result};
use std::cmp::Ordering;

/// L2-normalize in place; zero vectors are left as they are
pub fn normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        vector.iter_mut().for_each(|x| *x /= norm);
    }
}

pub fn inner_product(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// Flat (brute-force) index over normalized document embeddings
#[derive(Debug, Default)]
pub struct VectorIndex {
    urls: Vec<String>,
    vectors: Vec<f32>,
    dimensions: usize,
}

impl VectorIndex {
    /// Build from records. No incremental insert after construction.
    pub fn build(records: Vec<EmbeddingRecord>) -> Result<Self> {
        let dimensions = records.first().map(|r| r.vector.len()).unwrap_or(0);
        let mut urls = Vec::with_capacity(records.len());
        let mut vectors = Vec::with_capacity(records.len() * dimensions);

        for EmbeddingRecord { url, mut vector } in records {
            if vector.len() != dimensions {
                return Err(CampusQaError::IndexMismatch(format!(
                    "embedding for {} has {} dimensions, expected {}",
                    url,
                    vector.len(),
                    dimensions
                )));
            }
            normalize(&mut vector);
            urls.push(url);
            vectors.extend(vector);
        }

        Ok(Self {
            urls,
            vectors,
            dimensions,
        })
    }

    pub fn from_matrix(matrix: EmbeddingMatrix) -> Result<Self> {
        Self::build(matrix.records)
    }

    /// Top-`k` identifiers by descending inner product with `query`.
    ///
    /// `query` must already be normalized. An empty index returns no results;
    /// a query of the wrong width is an error.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<(String, f32)>> {
        if self.is_empty() || k == 0 {
            return Ok(Vec::new());
        }
        if query.len() != self.dimensions {
            return Err(CampusQaError::IndexMismatch(format!(
                "query has {} dimensions, index has {}",
                query.len(),
                self.dimensions
            )));
        }

        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .chunks_exact(self.dimensions)
            .map(|row| inner_product(query, row))
            .enumerate()
            .filter(|(_, score)| !score.is_nan())
            .collect();

        let by_score_desc = |a: &(usize, f32), b: &(usize, f32)| {
            b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal)
        };

        if k < scored.len() {
            scored.select_nth_unstable_by(k - 1, by_score_desc);
            scored.truncate(k);
        }
        scored.sort_by(by_score_desc);

        Ok(scored
            .into_iter()
            .map(|(idx, score)| (self.urls[idx].clone(), score))
            .collect())
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}
