pub mod config;
pub mod editor;
pub mod error;
pub mod locator;
pub mod store;
pub mod synthesizer;

pub use config::ProviderConfig;
pub use editor::{FileCursor, InsertTarget, StdoutTarget};
pub use error::{Result, WeaverError};
pub use locator::{
    folder_scope_of, NoteLocator, SubstringMatcher, TagMatcher, DEFAULT_TAG, NO_RELATED_NOTES,
};
pub use store::{FsNoteStore, NoteStore};
pub use synthesizer::{
    Completion, CompletionClient, Synthesizer, TokenUsage, EMPTY_RESPONSE, MISSING_CREDENTIAL,
    PROMPT_LEAD_IN, PROVIDER_FAILURE,
};
