//! Error types for topic-to-deck generation.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while turning a topic into a slide deck.
#[derive(Error, Debug)]
pub enum Error {
    /// The topic was empty after trimming.
    #[error("Topic is empty")]
    EmptyTopic,

    /// The reference summary could not be retrieved.
    #[error("Summary lookup failed: {0}")]
    LookupFailed(String),

    /// The language model call failed or returned nothing usable.
    #[error("LLM request failed: {0}")]
    LlmFailed(String),

    /// The deck could not be written.
    #[error("Deck rendering failed: {0}")]
    RenderFailed(String),

    /// Filesystem error.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// ZIP archive error (for PPTX).
    #[error("ZIP error: {0}")]
    ZipError(String),

    /// XML writing or parsing error (for PPTX).
    #[error("XML error: {0}")]
    XmlError(String),

    /// Failed to parse an existing PPTX file.
    #[error("PPTX parsing error: {0}")]
    PptxParseError(String),

    /// A requested deck file name is not a plain file name.
    #[error("Invalid deck file name: {0}")]
    InvalidFileName(String),

    /// Invalid configuration value.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl Error {
    /// Short, user-facing description that never leaks collaborator details.
    pub fn public_message(&self) -> &'static str {
        match self {
            Error::EmptyTopic => "❓ Please enter a topic.",
            Error::LookupFailed(_) => "Summary lookup failed.",
            Error::LlmFailed(_) => "LLM Error: could not generate slide content.",
            Error::InvalidFileName(_) => "Invalid file name.",
            _ => "❌ Failed to build the presentation.",
        }
    }
}
