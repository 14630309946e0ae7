//! Error taxonomy for pagination sessions.
//!
//! Configuration and resolution errors are returned from the operation that
//! hit them. Failures inside a running collector task are never propagated;
//! they are forwarded through the [`PaginationEvent::Error`] event instead.
//!
//! [`PaginationEvent::Error`]: crate::events::PaginationEvent::Error

use thiserror::Error;

/// Errors produced by pagination builders and sessions.
#[derive(Debug, Error)]
pub enum PaginationError {
    /// Send was called on a pagination without any pages.
    #[error("pagination does not have any pages")]
    NoPages,
    /// Send was called on a pagination that was already sent.
    #[error("pagination is already sent")]
    AlreadySent,
    /// An operation that requires a live message ran before send.
    #[error("pagination is not sent")]
    NotSent,
    /// The command trigger has no channel to create the message in.
    #[error("pagination command channel is not available")]
    MissingChannel,
    /// Editing a command message requires it to be authored by the current user.
    #[error("command message was not sent by the current user")]
    MessageNotEditable,
    /// Editing an interaction response requires a prior acknowledgement.
    #[error("interaction is not acknowledged")]
    InteractionNotAcknowledged,
    /// Replying to an already-acknowledged interaction without a follow-up.
    #[error("interaction is already acknowledged")]
    InteractionAlreadyAcknowledged,
    /// Reaction controllers cannot attach to an ephemeral response.
    #[error("reactions cannot be attached to an ephemeral message")]
    EphemeralReactions,
    /// The requested page index cannot be resolved.
    #[error("no page at index {0}")]
    PageOutOfRange(usize),
    /// A dynamic page producer returned an error.
    #[error("page producer failed: {0}")]
    PageProducer(anyhow::Error),
    /// An emoji reference could not be parsed into an emoji identity.
    #[error("invalid emoji string: {0:?}")]
    InvalidEmoji(String),
    /// A config-facing enum name did not match any known value.
    #[error("unknown controller action: {0:?}")]
    InvalidControllerAction(String),
    /// A config-facing enum name did not match any known value.
    #[error("unknown config value: {0:?}")]
    InvalidConfigValue(String),
    #[error("http request failed")]
    Http(#[from] twilight_http::Error),
    #[error("failed to deserialize http response")]
    Deserialize(#[from] twilight_http::response::DeserializeBodyError),
}

/// Result alias used across the crate.
pub type PaginationResult<T> = Result<T, PaginationError>;
