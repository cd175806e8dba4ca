use std::path::PathBuf;

use serde::Serialize;

use helix_qa::Result;
use helix_qa::adapters::PlainTextExtractor;
use helix_qa::domain::{DocId, NewDocument};
use helix_qa::ports::{DocumentRepository, FileKind, TextExtractor};
use helix_qa::services::IngestionOutcome;

use super::{App, print_json};

#[derive(Serialize)]
struct AddResponse {
    id: DocId,
    name: String,
    version: String,
    #[serde(flatten)]
    outcome: IngestionOutcome,
}

pub async fn run(
    app: &App,
    file: PathBuf,
    name: Option<String>,
    replace: Option<String>,
    json: bool,
) -> Result<()> {
    let bytes = tokio::fs::read(&file).await?;
    let text = PlainTextExtractor.extract(&bytes, &FileKind::from_path(&file))?;
    if text.trim().is_empty() {
        return Err(helix_qa::HelixQaError::UnsupportedContent(format!(
            "{} contains no text",
            file.display()
        )));
    }

    let name = name.unwrap_or_else(|| {
        file.file_name()
            .map_or_else(|| file.display().to_string(), |n| n.to_string_lossy().to_string())
    });
    let mut new_doc = NewDocument::new(name, text);
    if let Some(id) = replace {
        let id = DocId::from_string(id);
        if app.repo.get_document(&id).await?.is_none() {
            return Err(helix_qa::HelixQaError::DocumentNotFound(id.to_string()));
        }
        new_doc = new_doc.replacing(id);
    }

    let (doc, outcome) = app.ingestion.add_document(app.repo.as_ref(), new_doc).await?;
    app.persist()?;

    let response = AddResponse {
        id: doc.id,
        name: doc.name,
        version: doc.version,
        outcome,
    };
    if json {
        return print_json(&response);
    }

    let verb = match &response.outcome {
        IngestionOutcome::Indexed { .. } => "Indexed",
        IngestionOutcome::Replaced { .. } => "Re-indexed",
        IngestionOutcome::Unchanged { .. } => "Unchanged",
    };
    println!(
        "{verb} {} ({}) in {} chunks",
        response.name,
        response.id,
        response.outcome.chunks()
    );
    Ok(())
}
