use std::path::{Path, PathBuf};

use async_trait::async_trait;
use ignore::WalkBuilder;

use crate::error::{Result, WeaverError};
use crate::store::NoteStore;

const NOTE_EXTENSIONS: &[&str] = &["md", "markdown", "txt"];

/// Filesystem-backed note store rooted at a vault directory.
pub struct FsNoteStore {
    root: PathBuf,
}

impl FsNoteStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn absolute(&self, path: &str) -> PathBuf {
        self.root.join(path)
    }

    fn relative(&self, path: &Path) -> Option<String> {
        let rel = path.strip_prefix(&self.root).ok()?;
        let mut parts = Vec::new();
        for component in rel.components() {
            parts.push(component.as_os_str().to_str()?.to_string());
        }
        Some(parts.join("/"))
    }

    fn is_note(path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| NOTE_EXTENSIONS.contains(&ext))
            .unwrap_or(false)
    }
}

#[async_trait]
impl NoteStore for FsNoteStore {
    async fn list_notes(&self) -> Result<Vec<String>> {
        let mut notes = Vec::new();

        let walker = WalkBuilder::new(&self.root)
            .hidden(true)
            .git_ignore(true)
            .git_global(true)
            .git_exclude(true)
            .ignore(true)
            .build();

        for entry in walker.flatten() {
            let path = entry.path();
            if path.is_file() && Self::is_note(path) {
                if let Some(rel) = self.relative(path) {
                    notes.push(rel);
                }
            }
        }

        Ok(notes)
    }

    async fn read_content(&self, path: &str) -> Result<String> {
        let absolute = self.absolute(path);
        match tokio::fs::read_to_string(&absolute).await {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(WeaverError::NoteNotFound(path.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn resolve(&self, path: &str) -> Option<String> {
        let absolute = self.absolute(path);
        match tokio::fs::metadata(&absolute).await {
            Ok(meta) if meta.is_file() => Some(path.to_string()),
            _ => None,
        }
    }
}
