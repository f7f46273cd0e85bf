use crate::error::launch::LaunchError;

use common::ErrorLocation;
use models::ModelError;

use std::io::Error as IoError;
use std::io::ErrorKind;
use std::panic::Location;

use thiserror::Error as ThisError;

/// Errors surfaced by [`JvmLinkClient`](crate::client::JvmLinkClient) operations.
///
/// Transport failures (`Io`) are kept apart from conditions the peer reported
/// (`Protocol`, `NotFound`) so callers can tell a dead connection from a
/// rejected request.
#[derive(Debug, ThisError)]
pub enum LinkError {
    #[error(transparent)]
    Launch(#[from] LaunchError),

    #[error("Connection Error: {message} {location}")]
    Connection {
        message: String,
        location: ErrorLocation,
    },

    #[error("State Error: {message} {location}")]
    State {
        message: String,
        location: ErrorLocation,
    },

    #[error("IO Error: {message} {location}")]
    Io {
        message: String,
        location: ErrorLocation,
    },

    #[error("Protocol Error: {message} {location}")]
    Protocol {
        message: String,
        location: ErrorLocation,
    },

    #[error("Not Found Error: variable '{name}' is not bound on the peer {location}")]
    NotFound {
        name: String,
        location: ErrorLocation,
    },

    #[error("Validation Error: {message} {location}")]
    Validation {
        message: String,
        location: ErrorLocation,
    },
}

impl From<IoError> for LinkError {
    #[track_caller]
    fn from(error: IoError) -> Self {
        let message = match error.kind() {
            ErrorKind::UnexpectedEof => format!("Connection closed by peer: {error}"),
            _ => error.to_string(),
        };

        LinkError::Io {
            message,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<ModelError> for LinkError {
    #[track_caller]
    fn from(error: ModelError) -> Self {
        match error {
            ModelError::Validation { message, location } => {
                LinkError::Validation { message, location }
            }
        }
    }
}
