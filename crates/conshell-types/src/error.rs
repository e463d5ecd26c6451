//! Error types for conshell.

use std::io;

/// Errors produced by the console engine and its providers.
#[derive(Debug, thiserror::Error)]
pub enum ConsoleError {
    #[error("invalid definition: {0}")]
    InvalidDefinition(String),

    #[error("invalid command: {0}")]
    CommandNotFound(String),

    #[error("ambiguous command: {name}, matches: {}", matches.join(", "))]
    AmbiguousCommand { name: String, matches: Vec<String> },

    #[error("handler failure: {0}")]
    Handler(String),

    #[error("invalid submission: {0}")]
    InvalidSubmission(String),

    #[error("a read is already pending for this command")]
    ReadPending,

    #[error("capability not installed: {0}")]
    CapabilityMissing(&'static str),

    #[error("config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ConsoleError {
    /// Soft errors are reported to the output surface and never abort the
    /// engine; everything else is API misuse signalled to the caller.
    pub fn is_soft(&self) -> bool {
        matches!(
            self,
            Self::CommandNotFound(_) | Self::AmbiguousCommand { .. } | Self::Handler(_)
        )
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, ConsoleError>;
