mod app;
mod backend;
mod commands;
mod config;
mod events;
mod exchange;
mod logging;
mod transcript;
mod ui;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::config::Config;
use crate::events::Company;

#[derive(Parser)]
#[command(name = "finchat")]
#[command(version)]
#[command(about = "Chat about company financial results", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask a single question and print the answer
    Ask {
        /// Company to ask about (bajaj, tcs, axis, godrej, reliance)
        #[arg(short, long)]
        company: Option<String>,
        /// The question
        question: String,
    },
    /// List available companies
    Companies,
    /// List saved transcripts
    Transcripts,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load()?;
    logging::init(&config.finchat_home)?;

    match cli.command {
        None => app::run(config).await,
        Some(Commands::Ask { company, question }) => {
            let company = match company {
                Some(name) => name
                    .to_lowercase()
                    .parse::<Company>()
                    .map_err(|_| anyhow::anyhow!("Unknown company '{}'", name))?,
                None => config.default_company,
            };
            commands::ask(&config, company, &question).await
        }
        Some(Commands::Companies) => {
            commands::companies();
            Ok(())
        }
        Some(Commands::Transcripts) => commands::transcripts(&config),
    }
}
