use thiserror::Error;

#[derive(Error, Debug)]
pub enum WeaverError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Note not found: {0}")]
    NoteNotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Provider returned no response content")]
    EmptyResponse,
}

pub type Result<T> = std::result::Result<T, WeaverError>;
