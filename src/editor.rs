//! Insertion targets: where the synthesized answer (or a guidance message)
//! is written. Invoked exactly once per command.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;

pub trait InsertTarget {
    fn insert(&mut self, text: &str) -> Result<()>;
}

/// Inserts text into a note file before a 1-based line number.
///
/// A line past the end of the file appends instead. The inserted text gets
/// its own line.
pub struct FileCursor {
    path: PathBuf,
    line: usize,
}

impl FileCursor {
    pub fn new(path: impl Into<PathBuf>, line: usize) -> Self {
        Self {
            path: path.into(),
            line: line.max(1),
        }
    }

    /// Cursor positioned past any existing content, so inserts append.
    pub fn at_end(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            line: usize::MAX,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl InsertTarget for FileCursor {
    fn insert(&mut self, text: &str) -> Result<()> {
        let original = fs::read_to_string(&self.path)?;
        let mut lines: Vec<&str> = original.lines().collect();

        let index = (self.line - 1).min(lines.len());
        lines.insert(index, text);

        let mut updated = lines.join("\n");
        if original.ends_with('\n') || original.is_empty() {
            updated.push('\n');
        }
        fs::write(&self.path, updated)?;
        Ok(())
    }
}

/// Prints the text instead of touching any file.
pub struct StdoutTarget;

impl InsertTarget for StdoutTarget {
    fn insert(&mut self, text: &str) -> Result<()> {
        println!("{}", text);
        Ok(())
    }
}
