//! Peer process launching and identification.
//!
//! This module provides functionality for:
//! - Spawning the peer with a caller-supplied command line and working directory
//! - Waiting for the peer to announce readiness on stdout
//! - Shutting an owned peer down, asynchronously or from `Drop`
//! - Identifying an externally started peer by the port it listens on

pub mod process;
pub mod spawn;

pub use process::{discover_on_port, find_listening_pid, is_pid_running};
pub use spawn::{PeerCommand, PeerProcess, compile_ready_pattern, launch_peer};
