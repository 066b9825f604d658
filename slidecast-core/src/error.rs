//! Error types for slidecast-core
//!
//! Nothing here is fatal: every variant leaves the wizard and the playback
//! controller in a navigable state. Partial slide failures never surface as
//! errors at all; they are carried as warnings on the load report.

use slidecast_common::SessionId;
use thiserror::Error;

/// Main error type for slidecast-core
#[derive(Error, Debug)]
pub enum Error {
    /// Wizard transition blocked by draft validation (user-correctable)
    #[error("Validation refused: {0}")]
    Validation(String),

    /// Operation not allowed in the current stage
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Neither loading strategy produced a usable slide
    #[error("No content available for session {session_id}")]
    NoContentAvailable { session_id: SessionId },

    /// Session store rejected an update
    #[error("Failed to persist session {session_id}: {source}")]
    Persist {
        session_id: SessionId,
        #[source]
        source: ApiError,
    },

    /// Collaborator call failed
    #[error("Collaborator error: {0}")]
    Api(#[from] ApiError),

    /// Shared configuration/IO errors
    #[error(transparent)]
    Common(#[from] slidecast_common::Error),
}

/// Convenience Result type using slidecast-core Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by collaborator calls (session store, generation
/// trigger, presentation source)
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    /// Network communication error
    #[error("Network error: {0}")]
    Network(String),

    /// Resource does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Backend answered with an error status
    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    /// Response body could not be decoded
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Narration resource could not be bound or played
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MediaError {
    /// Slide has no narration to bind
    #[error("No narration for this slide")]
    NoNarration,

    /// Resource could not be opened or decoded
    #[error("Failed to open narration: {0}")]
    Open(String),

    /// Resource refused to start
    #[error("Playback failed: {0}")]
    Playback(String),
}
