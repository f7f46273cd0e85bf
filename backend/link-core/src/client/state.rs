use std::fmt::{Display, Formatter, Result as FormatResult};

/// Lifecycle of a [`JvmLinkClient`](super::JvmLinkClient).
///
/// ```text
/// Unstarted --start_java--> Started --establish_connection--> Connected
///                                                                 |
///              close_connection / shut_java                      v
///                                                               Closed
/// ```
///
/// `establish_connection` is also accepted from `Unstarted` (attaching to a
/// peer started elsewhere) and from `Closed` (re-establishing after a drop).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinkState {
    #[default]
    Unstarted,
    Started,
    Connected,
    Closed,
}

impl LinkState {
    pub fn is_connected(self) -> bool {
        self == LinkState::Connected
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LinkState::Unstarted => "unstarted",
            LinkState::Started => "started",
            LinkState::Connected => "connected",
            LinkState::Closed => "closed",
        }
    }
}

impl Display for LinkState {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> FormatResult {
        formatter.write_str(self.as_str())
    }
}
