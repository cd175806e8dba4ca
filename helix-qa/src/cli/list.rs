use serde::Serialize;

use helix_qa::Result;
use helix_qa::domain::DocId;
use helix_qa::ports::{DocumentRepository, VectorIndex};

use super::{App, print_json};

#[derive(Serialize)]
struct DocumentRow {
    id: DocId,
    name: String,
    version: String,
    chunks: usize,
    indexed: bool,
    updated_at: chrono::DateTime<chrono::Utc>,
}

pub async fn run(app: &App, json: bool) -> Result<()> {
    let rows: Vec<DocumentRow> = app
        .repo
        .list_documents()
        .await?
        .into_iter()
        .map(|doc| {
            let indexed = app.index.document_version(&doc.id).as_deref() == Some(doc.version.as_str());
            DocumentRow {
                chunks: app.index.chunks_for(&doc.id).len(),
                indexed,
                id: doc.id,
                name: doc.name,
                version: doc.version,
                updated_at: doc.updated_at,
            }
        })
        .collect();

    if json {
        return print_json(&rows);
    }

    if rows.is_empty() {
        println!("No documents. Add one with `helix-qa add <file>`.");
        return Ok(());
    }

    for row in &rows {
        let state = if row.indexed { "indexed" } else { "stale" };
        println!(
            "{}  {}  {} chunks  [{}]  {}",
            row.id,
            &row.version[..12.min(row.version.len())],
            row.chunks,
            state,
            row.name
        );
    }
    Ok(())
}
