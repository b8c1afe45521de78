//! Note store collaborator: enumeration and content access for a vault.

pub mod fs;

use async_trait::async_trait;

use crate::error::Result;

/// Read-only access to the notes in a vault.
///
/// Paths are vault-relative and `/`-separated regardless of platform, so
/// they can be compared and prefix-filtered as plain strings. Enumeration
/// order is whatever the store yields; callers must not re-sort.
#[async_trait]
pub trait NoteStore: Send + Sync {
    /// All note paths currently in the store.
    async fn list_notes(&self) -> Result<Vec<String>>;

    /// Full text of one note.
    async fn read_content(&self, path: &str) -> Result<String>;

    /// Resolve a path to a note handle, or `None` if it no longer exists.
    async fn resolve(&self, path: &str) -> Option<String>;
}

pub use fs::FsNoteStore;
