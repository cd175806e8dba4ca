use helix_qa::Result;
use helix_qa::domain::{AnswerRecord, AnswerStatus};

use super::{App, print_json};

pub async fn run(app: &App, question: &str, show_context: bool, json: bool) -> Result<()> {
    let record = app.answers.answer(question).await?;

    if json {
        print_json(&record)?;
    } else {
        print_answer(&record, show_context);
    }

    if record.status == AnswerStatus::NoContext {
        std::process::exit(helix_qa::HelixQaError::NoContext.exit_code());
    }
    Ok(())
}

fn print_answer(record: &AnswerRecord, show_context: bool) {
    println!();
    println!("Question: {}", record.question);
    println!();

    match (&record.answer, &record.error) {
        (Some(answer), _) => println!("{answer}"),
        (None, Some(error)) => println!("{}", error.message),
        (None, None) => {}
    }

    if show_context && !record.retrieved_chunks.is_empty() {
        println!();
        println!("Context:");
        for (i, hit) in record.retrieved_chunks.iter().enumerate() {
            println!(
                "  [{}] {} (score: {:.3})",
                i + 1,
                hit.chunk.id(),
                hit.score
            );
        }
    }

    println!();
    println!("{}", record.response_time());
}
