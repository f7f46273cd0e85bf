pub mod config;
pub mod discovery;
pub mod launch;
pub mod link;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Discovery(#[from] discovery::DiscoveryError),

    #[error(transparent)]
    Launch(#[from] launch::LaunchError),

    #[error(transparent)]
    Link(#[from] link::LinkError),

    #[error(transparent)]
    Config(#[from] config::ConfigError),
}
