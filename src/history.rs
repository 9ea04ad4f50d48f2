//! Persistent word history
//!
//! Submitted words are appended to a human-readable text log, one
//! `timestamp: word` line per entry. The file handle is opened and closed
//! per write, so an external reader sees either the old or the new content.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDateTime;

/// Log line timestamp format, e.g. `2026-08-07 14:03:21`
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One submitted word
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub word: String,
    pub timestamp: NaiveDateTime,
}

impl HistoryEntry {
    /// Render as one log line
    fn to_line(&self) -> String {
        format!("{}: {}", self.timestamp.format(TIMESTAMP_FORMAT), self.word)
    }

    /// Parse one log line. The timestamp occupies a fixed 19 characters,
    /// followed by `": "` and the word.
    fn parse_line(line: &str) -> Option<Self> {
        if line.len() < 19 {
            return None;
        }
        let (stamp, rest) = line.split_at(19);
        let word = rest.strip_prefix(": ")?;
        let timestamp = NaiveDateTime::parse_from_str(stamp, TIMESTAMP_FORMAT).ok()?;
        if word.is_empty() {
            return None;
        }
        Some(Self {
            word: word.to_string(),
            timestamp,
        })
    }
}

/// Append-only record of submitted words, mirrored to a log file
#[derive(Debug)]
pub struct WordHistory {
    path: PathBuf,
    entries: Vec<HistoryEntry>,
}

impl WordHistory {
    /// Open the history at `path`, loading any existing entries. A missing
    /// file means an empty history; malformed lines are skipped with a
    /// warning so one bad line never loses the rest of the log.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mut entries = Vec::new();

        match std::fs::read_to_string(&path) {
            Ok(contents) => {
                for line in contents.lines() {
                    if line.trim().is_empty() {
                        continue;
                    }
                    match HistoryEntry::parse_line(line) {
                        Some(entry) => entries.push(entry),
                        None => log::warn!("Skipping malformed history line: {:?}", line),
                    }
                }
                log::info!("Loaded {} history entries from {:?}", entries.len(), path);
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => log::warn!("Failed to read history file {:?}: {}", path, e),
        }

        Self { path, entries }
    }

    /// Append a submitted word to the log file, then to the in-memory list.
    /// On error nothing is recorded, so the caller can keep the word and
    /// retry on the next submit.
    pub fn submit(&mut self, word: &str, timestamp: NaiveDateTime) -> Result<()> {
        let entry = HistoryEntry {
            word: word.to_string(),
            timestamp,
        };

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating history directory {:?}", parent))?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("opening history file {:?}", self.path))?;
        writeln!(file, "{}", entry.to_line())
            .with_context(|| format!("appending to history file {:?}", self.path))?;

        log::info!("Submitted word {:?}", entry.word);
        self.entries.push(entry);
        Ok(())
    }

    /// Truncate the log file and forget all entries. Idempotent.
    pub fn clear(&mut self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating history directory {:?}", parent))?;
        }
        File::create(&self.path)
            .with_context(|| format!("truncating history file {:?}", self.path))?;
        self.entries.clear();
        log::info!("Cleared word history");
        Ok(())
    }

    /// All entries, oldest first
    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    /// The most recent `n` entries, oldest first
    pub fn recent(&self, n: usize) -> &[HistoryEntry] {
        let start = self.entries.len().saturating_sub(n);
        &self.entries[start..]
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Path of the backing log file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn stamp() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 8, 7)
            .unwrap()
            .and_hms_opt(12, 30, 0)
            .unwrap()
    }

    #[test]
    fn test_submit_appends_one_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("spelled_words.txt");

        let mut history = WordHistory::load(&path);
        history.submit("HELLO", stamp()).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "2026-08-07 12:30:00: HELLO\n");
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn test_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("spelled_words.txt");

        let mut history = WordHistory::load(&path);
        history.submit("CAT", stamp()).unwrap();
        history.submit("DOG HOUSE", stamp()).unwrap();

        let reloaded = WordHistory::load(&path);
        assert_eq!(reloaded.entries(), history.entries());
    }

    #[test]
    fn test_malformed_lines_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("spelled_words.txt");
        std::fs::write(
            &path,
            "2026-08-07 12:30:00: GOOD\nnot a history line\n2026-08-07 12:31:00: ALSOGOOD\n",
        )
        .unwrap();

        let history = WordHistory::load(&path);
        assert_eq!(history.len(), 2);
        assert_eq!(history.entries()[0].word, "GOOD");
        assert_eq!(history.entries()[1].word, "ALSOGOOD");
    }

    #[test]
    fn test_clear_empties_file_regardless_of_size() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("spelled_words.txt");

        let mut history = WordHistory::load(&path);
        for word in ["A", "AB", "ABC", "ABCD"] {
            history.submit(word, stamp()).unwrap();
        }
        history.clear().unwrap();

        assert!(history.is_empty());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "");

        // Clearing an already-empty history is a no-op
        history.clear().unwrap();
        assert!(history.is_empty());
    }

    #[test]
    fn test_missing_file_is_empty_history() {
        let dir = tempfile::tempdir().unwrap();
        let history = WordHistory::load(dir.path().join("does_not_exist.txt"));
        assert!(history.is_empty());
    }

    #[test]
    fn test_recent_returns_tail() {
        let dir = tempfile::tempdir().unwrap();
        let mut history = WordHistory::load(dir.path().join("spelled_words.txt"));
        for word in ["ONE", "TWO", "THREE", "FOUR"] {
            history.submit(word, stamp()).unwrap();
        }

        let recent: Vec<_> = history.recent(3).iter().map(|e| e.word.as_str()).collect();
        assert_eq!(recent, vec!["TWO", "THREE", "FOUR"]);
        assert_eq!(history.recent(10).len(), 4);
    }
}
