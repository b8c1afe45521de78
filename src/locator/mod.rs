//! Note Locator: tag-based note discovery under a folder prefix.

use std::sync::Arc;

use crate::error::{Result, WeaverError};
use crate::store::NoteStore;

/// Marker tag looked for when none is given on the command line.
pub const DEFAULT_TAG: &str = "&related";

/// Message rendered by the trigger surface when discovery finds nothing.
pub const NO_RELATED_NOTES: &str = "No related notes found.";

/// Decides whether a note's content carries a tag.
///
/// The default is literal substring containment; stricter syntaxes
/// (word-boundary, structured tags) can be swapped in without touching the
/// locator's control flow.
pub trait TagMatcher: Send + Sync {
    fn matches(&self, tag: &str, content: &str) -> bool;
}

/// Literal substring containment, case-sensitive.
pub struct SubstringMatcher;

impl TagMatcher for SubstringMatcher {
    fn matches(&self, tag: &str, content: &str) -> bool {
        content.contains(tag)
    }
}

/// Folder scope of a triggering note: everything before the last `/`.
///
/// Empty when the path has no separator, which scopes discovery vault-wide.
pub fn folder_scope_of(path: &str) -> &str {
    match path.rfind('/') {
        Some(pos) => &path[..pos],
        None => "",
    }
}

/// Discovers notes under a folder prefix whose content carries a tag.
pub struct NoteLocator {
    store: Arc<dyn NoteStore>,
    matcher: Box<dyn TagMatcher>,
}

impl NoteLocator {
    pub fn new(store: Arc<dyn NoteStore>) -> Self {
        Self::with_matcher(store, Box::new(SubstringMatcher))
    }

    pub fn with_matcher(store: Arc<dyn NoteStore>, matcher: Box<dyn TagMatcher>) -> Self {
        Self { store, matcher }
    }

    /// Paths of notes under `folder_scope` whose content matches `tag`, in
    /// store enumeration order.
    ///
    /// An unreadable note is logged and skipped; only store enumeration
    /// failure aborts the scan. An empty result is a valid outcome, not an
    /// error.
    pub async fn locate(&self, tag: &str, folder_scope: &str) -> Result<Vec<String>> {
        if tag.is_empty() {
            return Err(WeaverError::InvalidInput("tag must not be empty".to_string()));
        }

        let all = self.store.list_notes().await?;
        let mut matches = Vec::new();

        for path in all {
            if !path.starts_with(folder_scope) {
                continue;
            }
            match self.store.read_content(&path).await {
                Ok(content) => {
                    if self.matcher.matches(tag, &content) {
                        matches.push(path);
                    }
                }
                Err(e) => {
                    tracing::warn!("skipping unreadable note {}: {}", path, e);
                }
            }
        }

        Ok(matches)
    }
}
