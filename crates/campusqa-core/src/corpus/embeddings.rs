//! Embedding matrix storage
//!
//! The matrix is a CSV with a `URL` column and one float column per
//! dimension. A sidecar `<file>.meta.json` manifest records which model built
//! it, so a query-time embedder of another model or width fails at load time
//! instead of producing meaningless similarity scores.

use crate::error::{CampusQaError, Result};
use chrono::{DateTime, Utc};
use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const URL_COLUMN: &str = "URL";

/// One document's embedding
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingRecord {
    pub url: String,
    pub vector: Vec<f32>,
}

/// Build-time facts about an embedding matrix
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmbeddingManifest {
    pub model: String,
    pub dimensions: usize,
    #[serde(default)]
    pub count: usize,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Rows of the embedding matrix plus its manifest, if one was recorded
#[derive(Debug, Clone)]
pub struct EmbeddingMatrix {
    pub records: Vec<EmbeddingRecord>,
    pub dimensions: usize,
    pub manifest: Option<EmbeddingManifest>,
}

impl EmbeddingMatrix {
    /// Create a matrix from records; every vector must share one width
    pub fn new(records: Vec<EmbeddingRecord>, manifest: Option<EmbeddingManifest>) -> Result<Self> {
        let dimensions = records.first().map(|r| r.vector.len()).unwrap_or(0);
        if let Some(bad) = records.iter().find(|r| r.vector.len() != dimensions) {
            return Err(CampusQaError::IndexMismatch(format!(
                "embedding for {} has {} dimensions, expected {}",
                bad.url,
                bad.vector.len(),
                dimensions
            )));
        }
        Ok(Self {
            records,
            dimensions,
            manifest,
        })
    }

    /// Sidecar manifest path for a matrix file
    pub fn manifest_path(path: &Path) -> PathBuf {
        let mut name = path.as_os_str().to_owned();
        name.push(".meta.json");
        PathBuf::from(name)
    }

    /// Load the CSV matrix and its manifest (if present)
    pub fn load(path: &Path) -> Result<Self> {
        let mut reader = ReaderBuilder::new().has_headers(true).from_path(path)?;
        let headers = reader.headers()?.clone();

        let url_idx = headers
            .iter()
            .position(|h| h.eq_ignore_ascii_case(URL_COLUMN))
            .ok_or_else(|| {
                CampusQaError::Parse(format!("{:?} has no {} column", path, URL_COLUMN))
            })?;

        let mut records = Vec::new();
        for (row_num, row) in reader.records().enumerate() {
            let row = row?;
            records.push(parse_row(&row, url_idx, row_num + 1)?);
        }

        let manifest_path = Self::manifest_path(path);
        let manifest = if manifest_path.exists() {
            let raw = std::fs::read_to_string(&manifest_path)?;
            Some(serde_json::from_str::<EmbeddingManifest>(&raw)?)
        } else {
            None
        };

        let matrix = Self::new(records, manifest)?;
        tracing::info!(
            "Loaded {} embeddings ({} dimensions) from {}",
            matrix.records.len(),
            matrix.dimensions,
            path.display()
        );
        Ok(matrix)
    }

    /// Fail fast unless the matrix was built by `model` at `dimensions`.
    ///
    /// Matrices without a manifest are accepted on width alone.
    pub fn check_compatible(&self, model: &str, dimensions: usize) -> Result<()> {
        if !self.records.is_empty() && self.dimensions != dimensions {
            return Err(CampusQaError::IndexMismatch(format!(
                "matrix has {} dimensions but embedder {} produces {}",
                self.dimensions, model, dimensions
            )));
        }

        match &self.manifest {
            Some(manifest) if manifest.model != model => {
                Err(CampusQaError::IndexMismatch(format!(
                    "matrix was built with {} but queries use {}",
                    manifest.model, model
                )))
            }
            Some(manifest) if manifest.dimensions != dimensions => {
                Err(CampusQaError::IndexMismatch(format!(
                    "manifest records {} dimensions but embedder {} produces {}",
                    manifest.dimensions, model, dimensions
                )))
            }
            Some(_) => Ok(()),
            None => {
                tracing::warn!(
                    "Embedding matrix has no manifest; cannot verify it was built with {}",
                    model
                );
                Ok(())
            }
        }
    }

    /// Write the CSV matrix and its manifest
    pub fn write(&self, path: &Path, model: &str) -> Result<EmbeddingManifest> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut writer = WriterBuilder::new().from_path(path)?;
        let mut header = vec![URL_COLUMN.to_string()];
        header.extend((0..self.dimensions).map(|i| i.to_string()));
        writer.write_record(&header)?;

        for record in &self.records {
            let mut row = Vec::with_capacity(self.dimensions + 1);
            row.push(record.url.clone());
            row.extend(record.vector.iter().map(|v| v.to_string()));
            writer.write_record(&row)?;
        }
        writer.flush()?;

        let manifest = EmbeddingManifest {
            model: model.to_string(),
            dimensions: self.dimensions,
            count: self.records.len(),
            created_at: Some(Utc::now()),
        };
        std::fs::write(
            Self::manifest_path(path),
            serde_json::to_string_pretty(&manifest)?,
        )?;

        Ok(manifest)
    }
}

fn parse_row(row: &StringRecord, url_idx: usize, row_num: usize) -> Result<EmbeddingRecord> {
    let url = row
        .get(url_idx)
        .filter(|u| !u.is_empty())
        .ok_or_else(|| CampusQaError::Parse(format!("row {} has no URL", row_num)))?
        .to_string();

    let vector = row
        .iter()
        .enumerate()
        .filter(|(idx, _)| *idx != url_idx)
        .map(|(idx, field)| {
            field.trim().parse::<f32>().map_err(|e| {
                CampusQaError::Parse(format!("row {} column {}: {}", row_num, idx, e))
            })
        })
        .collect::<Result<Vec<f32>>>()?;

    Ok(EmbeddingRecord { url, vector })
}
