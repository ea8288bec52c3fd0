//! Error types for panel requests.

use thiserror::Error;

/// Failures a panel request can end in.
///
/// Validation errors are reported to the user before any state changes.
/// Everything that goes wrong on the wire is treated the same way by the
/// panel, the variants only exist for logging.
#[derive(Debug, Error)]
pub enum PanelError {
    #[error("Please enter a prompt!")]
    EmptyPrompt,

    #[error("Please select at least one AI model!")]
    NoActiveAgents,

    #[error("Failed to send request: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP {status}: {reason}")]
    Http { status: u16, reason: String },

    #[error("Failed to parse panel response: {0}")]
    Decode(String),
}

impl PanelError {
    /// Whether this is a user input problem rather than an endpoint failure.
    pub fn is_validation(&self) -> bool {
        matches!(self, PanelError::EmptyPrompt | PanelError::NoActiveAgents)
    }
}

pub type PanelResult<T> = std::result::Result<T, PanelError>;
