use serde_json::json;

use helix_qa::domain::DocId;
use helix_qa::ports::DocumentRepository;
use helix_qa::{HelixQaError, Result};

use super::{App, print_json};

pub async fn run(app: &App, id: String, json: bool) -> Result<()> {
    let id = DocId::from_string(id);
    if !app.repo.delete_document(&id).await? {
        return Err(HelixQaError::DocumentNotFound(id.to_string()));
    }
    let entries = app.ingestion.remove(&id).await?;
    app.persist()?;

    if json {
        return print_json(&json!({ "id": id, "entries_removed": entries }));
    }
    println!("Removed {id} ({entries} index entries)");
    Ok(())
}
