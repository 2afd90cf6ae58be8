//! Error types shared across the client.

use thiserror::Error;

use crate::framing::FramingError;
use crate::punter::SiteId;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("framing error: {0}")]
    Framing(#[from] FramingError),

    #[error("malformed message: {0}")]
    MessageFormat(#[from] serde_json::Error),

    #[error("unrecognized server message: {0}")]
    Unrecognized(String),

    #[error("expected {expected} message, got {found}")]
    UnexpectedMessage {
        expected: &'static str,
        found: &'static str,
    },

    #[error("server message carries no game state")]
    MissingState,

    #[error("no river between {from} and {to}")]
    UnknownRiver { from: SiteId, to: SiteId },

    #[error("{0}")]
    Usage(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether the session can carry on after this error.
    ///
    /// Only graph inconsistencies qualify: the server is authoritative, so a
    /// missed claim is logged and skipped rather than forfeiting the game.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Error::UnknownRiver { .. } => true,
            _ => false,
        }
    }
}
