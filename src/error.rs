// src/error.rs
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GeneratorError {
    #[error("Length must be a positive number, got {0:?}")]
    InvalidLength(String),
    #[error("Choose at least one character class (letters, digits, special)")]
    NoCharacterClassSelected,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(String), // from serde_json
}

#[derive(Debug, Error)]
pub enum TuiError {
    #[error("Terminal I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Generator error: {0}")]
    Generator(#[from] GeneratorError),
    #[error("History error: {0}")]
    Store(#[from] StoreError),
    #[error("TUI error: {0}")]
    Tui(#[from] TuiError),
    #[error("Clipboard error: {0}")]
    Clipboard(#[from] arboard::Error),
    #[error("CLI error: {0}")]
    Cli(String),
}

pub type AppResult<T> = Result<T, AppError>;
pub type GeneratorResult<T> = Result<T, GeneratorError>;
pub type StoreResult<T> = Result<T, StoreError>;
