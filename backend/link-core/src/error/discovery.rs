use common::ErrorLocation;

use std::error::Error as StdError;

use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum DiscoveryError {
    #[error("Network Query Error: {message} {location}")]
    NetworkQuery {
        message: String,
        location: ErrorLocation,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    #[error("Validation Error: {message} {location}")]
    Validation {
        message: String,
        location: ErrorLocation,
    },
}

impl From<models::ModelError> for DiscoveryError {
    fn from(error: models::ModelError) -> Self {
        match error {
            models::ModelError::Validation { message, location } => {
                DiscoveryError::Validation { message, location }
            }
        }
    }
}
