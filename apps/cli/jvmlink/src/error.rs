use common::ErrorLocation;
use link_core::error::CoreError;
use link_core::error::config::ConfigError;
use link_core::error::link::LinkError;

use thiserror::Error;

/// Errors that end a `jvmlink` run.
#[derive(Debug, Error)]
pub enum AppError {
    /// Error from this App
    #[error("App Error: {message} {location}")]
    App {
        message: String,
        location: ErrorLocation,
    },

    /// Error from link-core operations (config, launch, link)
    #[error(transparent)]
    Core(#[from] CoreError),
}

impl From<LinkError> for AppError {
    fn from(error: LinkError) -> Self {
        AppError::Core(CoreError::Link(error))
    }
}

impl From<ConfigError> for AppError {
    fn from(error: ConfigError) -> Self {
        AppError::Core(CoreError::Config(error))
    }
}
