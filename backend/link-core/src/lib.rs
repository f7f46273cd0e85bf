pub mod client;
pub mod config;
pub mod error;
pub mod launcher;
pub mod protocol;

#[cfg(test)]
mod tests;

pub use client::{JvmLinkClient, LinkState};
pub use config::LinkConfig;

pub const PEER_HOSTNAME: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 20345;
pub const DEFAULT_PEER_JAR: &str = "loci_tools.jar";
pub const DEFAULT_PEER_CLASS: &str = "loci.jvmlink.JVMLinkServer";
pub const DEFAULT_PEER_COMMAND: &str =
    const_format::concatcp!("java -cp ", DEFAULT_PEER_JAR, " ", DEFAULT_PEER_CLASS);
pub const DEFAULT_READY_PATTERN: &str = r"(?i)listening on port (?P<port>\d+)";
