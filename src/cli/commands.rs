use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};

use note_weaver::config::{self, ProviderConfig};
use note_weaver::editor::{FileCursor, InsertTarget, StdoutTarget};
use note_weaver::error::Result;
use note_weaver::locator::{folder_scope_of, NoteLocator, DEFAULT_TAG, NO_RELATED_NOTES};
use note_weaver::store::FsNoteStore;
use note_weaver::synthesizer::Synthesizer;

#[derive(Parser)]
#[command(name = "note-weaver")]
#[command(about = "Find tagged notes in a vault and ask an LLM how they relate")]
#[command(version)]
#[command(after_long_help = r##"
EXAMPLES:
    # Insert the synthesized answer at the end of the triggering note
    note-weaver uncover proj/current.md

    # Insert before line 12 instead
    note-weaver uncover proj/current.md --line 12

    # Print the answer instead of editing the note
    note-weaver uncover proj/current.md --print

    # Use a custom marker tag
    note-weaver uncover proj/current.md --tag "#synthesize"

    # List the notes that would be collected, without calling the provider
    note-weaver locate proj/current.md

    # Check provider configuration
    note-weaver config
"##)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to the vault root
    #[arg(long, default_value = ".")]
    pub vault: PathBuf,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Collect tagged notes near a note and insert the model's answer into it
    Uncover {
        /// Vault-relative path of the triggering note
        note: String,

        /// Marker tag that flags notes for inclusion
        #[arg(long, default_value = DEFAULT_TAG)]
        tag: String,

        /// 1-based line to insert before (appends when omitted)
        #[arg(long)]
        line: Option<usize>,

        /// Print the answer to stdout instead of editing the note
        #[arg(long)]
        print: bool,
    },

    /// List tagged notes in the triggering note's folder
    Locate {
        /// Vault-relative path of the triggering note
        note: String,

        /// Marker tag that flags notes for inclusion
        #[arg(long, default_value = DEFAULT_TAG)]
        tag: String,
    },

    /// Show provider configuration status
    Config,
}

pub async fn uncover(
    vault: &Path,
    note: &str,
    tag: &str,
    line: Option<usize>,
    print: bool,
) -> Result<()> {
    let store = Arc::new(FsNoteStore::new(vault));
    let locator = NoteLocator::new(store.clone());

    let scope = folder_scope_of(note);
    let matches = locator.locate(tag, scope).await?;
    tracing::debug!("found {} tagged notes under '{}'", matches.len(), scope);

    let output = if matches.is_empty() {
        NO_RELATED_NOTES.to_string()
    } else {
        let synthesizer = Synthesizer::new(store, ProviderConfig::from_env())?;
        synthesizer.synthesize(&matches).await
    };

    let mut target: Box<dyn InsertTarget> = if print {
        Box::new(StdoutTarget)
    } else {
        let note_path = vault.join(note);
        match line {
            Some(n) => Box::new(FileCursor::new(note_path, n)),
            None => Box::new(FileCursor::at_end(note_path)),
        }
    };
    target.insert(&output)?;

    Ok(())
}

pub async fn locate_notes(vault: &Path, note: &str, tag: &str) -> Result<()> {
    let store = Arc::new(FsNoteStore::new(vault));
    let locator = NoteLocator::new(store);

    let matches = locator.locate(tag, folder_scope_of(note)).await?;

    if matches.is_empty() {
        println!("{}", NO_RELATED_NOTES);
        return Ok(());
    }

    println!("Found {} related notes:", matches.len());
    for path in &matches {
        println!("  {}", path);
    }

    Ok(())
}

pub fn show_config() -> Result<()> {
    let config = ProviderConfig::from_env();

    println!("Provider configuration:");
    match config.masked_api_key() {
        Some(masked) => println!("  API key: {}", masked),
        None => println!("  API key: not set ({})", config::API_KEY_VAR),
    }
    println!(
        "  Organization: {}",
        config.organization.as_deref().unwrap_or("not set")
    );
    println!(
        "  Project: {}",
        config.project.as_deref().unwrap_or("not set")
    );
    println!("  Model: {}", config.model);
    println!("  Endpoint: {}", config.endpoint);

    Ok(())
}
