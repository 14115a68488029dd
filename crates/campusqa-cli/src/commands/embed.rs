//! Embed command

use crate::app::EmbedArgs;
use crate::progress::ProgressReporter;
use anyhow::Result;
use campusqa_core::corpus::EmbeddingRecord;
use campusqa_core::text::truncate_chars;
use campusqa_core::{Config, DocumentStore, Embedder, EmbeddingMatrix, HttpLlmClient};

/// Page text beyond this is not sent to the embedding service
const MAX_EMBED_CHARS: usize = 8000;

pub async fn run(args: EmbedArgs, config: &Config) -> Result<()> {
    let documents = DocumentStore::load(&config.corpus.documents)?;
    let output = args
        .output
        .unwrap_or_else(|| config.corpus.embeddings.clone());

    let client = HttpLlmClient::from_config(config)?;
    println!(
        "Embedding {} pages with {} ({} dimensions)",
        documents.len(),
        client.model_name(),
        client.dimensions()
    );

    let pages: Vec<_> = documents.iter().collect();
    let group_size = args.batch_size.max(1) * args.concurrency.max(1);
    let mut progress = ProgressReporter::new(pages.len());
    let mut records = Vec::with_capacity(pages.len());

    for group in pages.chunks(group_size) {
        let texts: Vec<String> = group
            .iter()
            .map(|doc| truncate_chars(&doc.content, MAX_EMBED_CHARS).to_string())
            .collect();
        let vectors = client
            .embed_batch_parallel(&texts, args.batch_size, args.concurrency)
            .await?;

        records.extend(group.iter().zip(vectors).map(|(doc, vector)| EmbeddingRecord {
            url: doc.url.clone(),
            vector,
        }));
        progress.advance(group.len());
    }
    progress.finish();

    let matrix = EmbeddingMatrix::new(records, None)?;
    let manifest = matrix.write(&output, client.model_name())?;

    println!("Embedding complete:");
    println!("  Pages:      {}", manifest.count);
    println!("  Dimensions: {}", manifest.dimensions);
    println!("  Matrix:     {}", output.display());
    println!(
        "  Manifest:   {}",
        EmbeddingMatrix::manifest_path(&output).display()
    );

    Ok(())
}
