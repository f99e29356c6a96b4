use std::fs::File;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;

use crate::error::Result;

const SUMMARY_HEADER: &str = "\n--- Summary ---\n";

/// Append-only debug log of every summary produced during a session. Created
/// fresh at session start so the file only ever describes the current run.
#[derive(Debug)]
pub struct SummaryTranscript {
    path: PathBuf,
}

impl SummaryTranscript {
    /// Truncates any file left over from a previous run.
    pub fn create(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        File::create(&path)?;
        Ok(Self { path })
    }

    /// Appends one summary under the fixed header. Non-ASCII characters are
    /// replaced with `?` so the file reads cleanly in a plain console.
    pub fn append(&self, summary: &str) -> Result<()> {
        let mut file = OpenOptions::new().append(true).open(&self.path)?;
        file.write_all(SUMMARY_HEADER.as_bytes())?;
        file.write_all(ascii_safe(summary).as_bytes())?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn ascii_safe(text: &str) -> String {
    text.chars()
        .map(|ch| if ch.is_ascii() { ch } else { '?' })
        .collect()
}
