use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::events::TranscriptEntry;

/// A saved conversation
#[derive(Debug, Serialize, Deserialize)]
pub struct Transcript {
    pub id: Uuid,
    pub saved_at: DateTime<Utc>,
    pub entries: Vec<TranscriptEntry>,
}

/// Summary of a saved transcript for listings
#[derive(Debug)]
pub struct TranscriptSummary {
    pub id: Uuid,
    pub saved_at: DateTime<Utc>,
    pub message_count: usize,
    pub path: PathBuf,
}

/// Reads and writes transcripts under the configured directory
pub struct TranscriptStore {
    transcripts_dir: PathBuf,
}

impl TranscriptStore {
    pub fn new(transcripts_dir: impl Into<PathBuf>) -> Self {
        Self {
            transcripts_dir: transcripts_dir.into(),
        }
    }

    fn ensure_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.transcripts_dir)
            .context("Failed to create transcripts directory")
    }

    /// Save a conversation; returns the path written.
    pub fn save(&self, entries: Vec<TranscriptEntry>) -> Result<PathBuf> {
        self.ensure_dir()?;

        let transcript = Transcript {
            id: Uuid::new_v4(),
            saved_at: Utc::now(),
            entries,
        };

        let path = self.transcripts_dir.join(format!("{}.json", transcript.id));
        let content = serde_json::to_string_pretty(&transcript)
            .context("Failed to serialize transcript")?;
        fs::write(&path, content).context("Failed to write transcript")?;

        Ok(path)
    }

    /// Load one transcript by path.
    #[allow(dead_code)]
    pub fn load(&self, path: &Path) -> Result<Transcript> {
        let content = fs::read_to_string(path).context("Failed to read transcript")?;
        serde_json::from_str(&content).context("Failed to parse transcript")
    }

    /// List saved transcripts, newest first.
    pub fn list(&self) -> Result<Vec<TranscriptSummary>> {
        if !self.transcripts_dir.exists() {
            return Ok(Vec::new());
        }

        let mut summaries = Vec::new();
        let entries =
            fs::read_dir(&self.transcripts_dir).context("Failed to read transcripts directory")?;

        for entry in entries {
            let entry = entry.context("Failed to read directory entry")?;
            let path = entry.path();
            if path.extension().and_then(|s| s.to_str()) != Some("json") {
                continue;
            }

            // Skip files we cannot parse rather than failing the listing.
            if let Ok(content) = fs::read_to_string(&path) {
                if let Ok(transcript) = serde_json::from_str::<Transcript>(&content) {
                    summaries.push(TranscriptSummary {
                        id: transcript.id,
                        saved_at: transcript.saved_at,
                        message_count: transcript.entries.len(),
                        path,
                    });
                }
            }
        }

        summaries.sort_by(|a, b| b.saved_at.cmp(&a.saved_at));
        Ok(summaries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{ChatRole, Company};
    use tempfile::TempDir;

    fn entry(role: ChatRole, content: &str) -> TranscriptEntry {
        TranscriptEntry {
            role,
            content: content.to_string(),
            company: Company::Tcs,
            timestamp: Utc::now(),
            is_error: false,
        }
    }

    #[test]
    fn save_then_list_and_load() {
        let dir = TempDir::new().unwrap();
        let store = TranscriptStore::new(dir.path().join("transcripts"));

        let path = store
            .save(vec![
                entry(ChatRole::User, "How was the quarter?"),
                entry(ChatRole::Bot, "Strong revenue growth."),
            ])
            .unwrap();

        let summaries = store.list().unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].message_count, 2);
        assert_eq!(summaries[0].path, path);

        let transcript = store.load(&path).unwrap();
        assert_eq!(transcript.entries[0].content, "How was the quarter?");
        assert_eq!(transcript.entries[1].role, ChatRole::Bot);
    }

    #[test]
    fn listing_empty_store_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = TranscriptStore::new(dir.path().join("transcripts"));
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn listing_skips_unparseable_files() {
        let dir = TempDir::new().unwrap();
        let transcripts = dir.path().join("transcripts");
        fs::create_dir_all(&transcripts).unwrap();
        fs::write(transcripts.join("garbage.json"), "not json").unwrap();

        let store = TranscriptStore::new(&transcripts);
        store.save(vec![entry(ChatRole::User, "hello")]).unwrap();

        assert_eq!(store.list().unwrap().len(), 1);
    }
}
