pub mod builder;

/// Identity of the peer process a client is talking to.
///
/// `owned` records whether this client launched the peer. Only an owned peer
/// is shut down when the client goes away; an externally started peer is
/// merely disconnected from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerInfo {
    pub pid: u32,
    pub port: u16,
    pub name: String,
    pub command: String,
    pub owned: bool,
}
