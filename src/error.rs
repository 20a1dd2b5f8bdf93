use std::path::PathBuf;

use thiserror::Error;

/// Result type for mdpress operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that reach the caller.
///
/// Structural problems in the Markdown source never show up here; the parser
/// recovers from those and reports them as [`crate::Diagnostic`]s instead.
#[derive(Error, Debug)]
pub enum Error {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),

    #[error("invalid color {0:?}: expected #RRGGBB")]
    InvalidColor(String),

    /// Typst compilation error
    #[error("Typst compilation failed: {0}")]
    Compilation(String),

    #[error("PDF generation failed: {0}")]
    Pdf(String),

    #[error("failed to serialize document: {0}")]
    Json(#[from] serde_json::Error),
}
