use anyhow::{anyhow, Result};
use strum::IntoEnumIterator;

use crate::backend::BackendClient;
use crate::config::Config;
use crate::events::Company;
use crate::exchange::ask_with_retry;
use crate::transcript::TranscriptStore;

/// One-shot question from the command line. Applies the same
/// single-retry rate-limit policy the TUI uses.
pub async fn ask(config: &Config, company: Company, question: &str) -> Result<()> {
    if question.trim().is_empty() {
        return Err(anyhow!("Question cannot be empty"));
    }

    let client = BackendClient::new(config);
    let answer = ask_with_retry(&client, company, question)
        .await
        .map_err(|err| anyhow!(err.user_message()))?;

    println!("{}", answer);
    Ok(())
}

/// List the companies the backend knows about.
pub fn companies() {
    println!("Available companies:");
    for company in Company::iter() {
        println!("  {} ({})", company.display_name(), company.wire_name());
    }
}

/// List saved transcripts, newest first.
pub fn transcripts(config: &Config) -> Result<()> {
    let store = TranscriptStore::new(config.transcripts_dir.clone());
    let summaries = store.list()?;

    if summaries.is_empty() {
        println!("No transcripts saved yet. Use /save inside the chat.");
        return Ok(());
    }

    println!("Saved transcripts:");
    for summary in summaries {
        println!(
            "  {}  {} messages  {}",
            summary.saved_at.format("%Y-%m-%d %H:%M:%S"),
            summary.message_count,
            summary.path.display()
        );
    }

    Ok(())
}
