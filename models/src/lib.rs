//! Domain models for JVMLink.
//!
//! This crate contains the pure data exchanged with, or describing, the peer
//! process. Models have no I/O - the wire encoding lives in `link-core`.

pub mod error;
pub mod peer_info;
pub mod variable;

pub use common::ErrorLocation;
pub use error::model_error::ModelError;
pub use peer_info::PeerInfo;
pub use peer_info::builder::PeerInfoBuilder;
pub use variable::{VarKind, VarValue, Variable};

#[cfg(test)]
mod tests;
