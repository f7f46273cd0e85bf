//! Shared building blocks for the JVMLink workspace.
//!
//! Every error type in the workspace records where it was raised through
//! [`ErrorLocation`], so this crate sits at the bottom of the dependency graph:
//!
//! - **common** (this crate): error location tracking
//! - **models**: pure data exchanged with the peer
//! - **link-core**: launcher, wire protocol and client
//! - **jvmlink**: command-line application wiring everything together

pub mod error;

pub use error::error_location::ErrorLocation;
