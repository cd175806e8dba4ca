use helix_qa::ports::VectorIndex;
use helix_qa::{HelixQaError, Result};

use super::{App, print_json};

pub async fn run(app: &App, query: &str, limit: usize, json: bool) -> Result<()> {
    if app.index.is_empty() {
        return Err(HelixQaError::EmptyIndex);
    }

    let hits = app.answers.retrieval().retrieve(query, limit).await?;

    if json {
        return print_json(&hits);
    }

    if hits.is_empty() {
        println!("No results found for: \"{query}\"");
        return Ok(());
    }

    println!();
    println!("Query: \"{query}\"");
    println!("Found: {} results", hits.len());
    println!();

    for (i, hit) in hits.iter().enumerate() {
        println!("[{}] {} | Score: {:.3}", i + 1, hit.chunk.id(), hit.score);
        let preview: String = hit.chunk.text.chars().take(240).collect();
        println!("    {}", preview.replace('\n', " "));
        println!();
    }
    Ok(())
}
