use clap::Parser;

mod cli;

use cli::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    cli::init_tracing(&cli);
    let json = cli.json;

    if let Err(err) = cli::run(cli).await {
        if json {
            let report = serde_json::to_string_pretty(&err.report()).unwrap_or_default();
            eprintln!("{report}");
        } else {
            eprintln!("error: {err}");
        }
        std::process::exit(err.exit_code());
    }
}
