use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use helix_qa::Result;

mod add;
mod app;
mod ask;
mod list;
mod remove;
mod search;
mod status;
mod sync;

use app::App;

#[derive(Parser)]
#[command(name = "helix-qa")]
#[command(about = "Ask questions about your documents, answered from their most relevant passages")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output as JSON")]
    pub json: bool,

    #[arg(short, long, global = true, action = clap::ArgAction::Count, help = "Increase log verbosity")]
    pub verbose: u8,

    #[arg(long, global = true, value_enum, default_value = "text", help = "Log output format")]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Add a .txt or .md file and index it")]
    Add {
        #[arg(help = "Path to the file")]
        file: PathBuf,

        #[arg(long, help = "Display name (defaults to the file name)")]
        name: Option<String>,

        #[arg(long, help = "Replace the content of an existing document ID")]
        replace: Option<String>,
    },

    #[command(about = "Answer a question from the indexed documents")]
    Ask {
        #[arg(help = "Question to answer")]
        question: String,

        #[arg(long, help = "Show the retrieved passages")]
        show_context: bool,
    },

    #[command(about = "Show the passages most relevant to a query")]
    Search {
        #[arg(help = "Search query")]
        query: String,

        #[arg(long, default_value = "5", help = "Maximum results to return")]
        limit: usize,
    },

    #[command(about = "List stored documents")]
    List,

    #[command(about = "Remove a document and its index entries")]
    Remove {
        #[arg(help = "Document ID to remove")]
        id: String,
    },

    #[command(about = "Re-index new or changed documents and drop deleted ones")]
    Sync,

    #[command(about = "Show corpus and index statistics")]
    Status,
}

/// Initialize tracing from the CLI flags; `RUST_LOG` takes precedence.
pub fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "helix_qa=warn",
        1 => "helix_qa=info",
        2 => "helix_qa=debug",
        _ => "helix_qa=trace",
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init(),
        LogFormat::Json => fmt()
            .json()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init(),
    }
}

pub async fn run(cli: Cli) -> Result<()> {
    let app = App::open(helix_qa::config::Config::load()?).await?;

    match cli.command {
        Commands::Add {
            file,
            name,
            replace,
        } => add::run(&app, file, name, replace, cli.json).await,
        Commands::Ask {
            question,
            show_context,
        } => ask::run(&app, &question, show_context, cli.json).await,
        Commands::Search { query, limit } => search::run(&app, &query, limit, cli.json).await,
        Commands::List => list::run(&app, cli.json).await,
        Commands::Remove { id } => remove::run(&app, id, cli.json).await,
        Commands::Sync => sync::run(&app, cli.json).await,
        Commands::Status => status::run(&app, cli.json).await,
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
