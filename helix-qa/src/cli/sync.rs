use helix_qa::Result;

use super::{App, print_json};

pub async fn run(app: &App, json: bool) -> Result<()> {
    let report = app.ingestion.sync(app.repo.as_ref()).await?;
    app.persist()?;

    if json {
        return print_json(&report);
    }

    println!(
        "Indexed {}, re-indexed {}, unchanged {}, removed {} ({} entries)",
        report.documents_indexed,
        report.documents_replaced,
        report.documents_unchanged,
        report.documents_removed,
        report.entries
    );
    for error in &report.errors {
        eprintln!("  failed: {error}");
    }
    Ok(())
}
