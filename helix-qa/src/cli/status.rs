use serde::Serialize;

use helix_qa::Result;
use helix_qa::ports::{DocumentRepository, VectorIndex};

use super::{App, print_json};

#[derive(Serialize)]
struct StatusResponse {
    data_dir: String,
    documents: usize,
    indexed_documents: usize,
    index_entries: usize,
    embedder: String,
    dimension: usize,
    generation_model: String,
    chunk_window: usize,
    chunk_overlap: usize,
    top_k: usize,
}

pub async fn run(app: &App, json: bool) -> Result<()> {
    let chunker = app.ingestion.chunker();
    let status = StatusResponse {
        data_dir: app.config.data_dir.display().to_string(),
        documents: app.repo.list_documents().await?.len(),
        indexed_documents: app.index.document_count(),
        index_entries: app.index.len(),
        embedder: app.fingerprint().to_string(),
        dimension: app.index.dimension(),
        generation_model: app.config.generation.model.clone(),
        chunk_window: chunker.window(),
        chunk_overlap: chunker.overlap(),
        top_k: app.config.retrieval.top_k,
    };

    if json {
        return print_json(&status);
    }

    println!("Data dir:    {}", status.data_dir);
    println!(
        "Documents:   {} stored, {} indexed ({} entries)",
        status.documents, status.indexed_documents, status.index_entries
    );
    println!("Embedder:    {} (dimension {})", status.embedder, status.dimension);
    println!("Generator:   {}", status.generation_model);
    println!(
        "Chunking:    {} words, {} overlap | top-k {}",
        status.chunk_window, status.chunk_overlap, status.top_k
    );
    Ok(())
}
