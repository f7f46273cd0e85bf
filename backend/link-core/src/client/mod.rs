//! Typed request/response client for a JVMLink peer.
//!
//! A [`JvmLinkClient`] owns at most one peer process and exactly one socket.
//! Requests are strictly sequential: every call writes one frame and waits
//! for its reply before returning, so `&mut self` is all the synchronization
//! the client needs.
//!
//! A call that fails with [`LinkError::Io`], or with a [`LinkError::Protocol`]
//! raised while decoding a reply, leaves unread bytes of unknown length on the
//! socket. The client drops that connection and moves to
//! [`LinkState::Closed`]; the caller must
//! [`establish_connection`](JvmLinkClient::establish_connection) again.
//! Failures the peer reports in a complete reply (a rejected SET or EXEC, an
//! unbound variable) keep the connection open.
//!
//! # Example
//!
//! ```no_run
//! # async fn run() -> Result<(), link_core::error::link::LinkError> {
//! use link_core::{JvmLinkClient, LinkConfig};
//!
//! let mut client = JvmLinkClient::new(LinkConfig::default());
//! client.start_configured_java().await?;
//! client.establish_connection().await?;
//!
//! client.set("x", 42).await?;
//! let x = client.get_var("x").await?;
//! assert_eq!(x.value(), &models::VarValue::Int(42));
//!
//! client.shut_java().await?;
//! # Ok(())
//! # }
//! ```

mod connection;
mod state;

pub use state::LinkState;

use connection::Connection;

use crate::config::LinkConfig;
use crate::error::link::LinkError;
use crate::launcher::{PeerCommand, PeerProcess, compile_ready_pattern, discover_on_port, launch_peer};
use crate::protocol::{PeerStatus, Request};

use common::ErrorLocation;
use models::{PeerInfo, PeerInfoBuilder, VarValue, Variable};

use std::panic::Location;
use std::path::Path;
use std::time::Duration;

use log::{debug, info, warn};
use tokio::task::spawn_blocking;

pub struct JvmLinkClient {
    config: LinkConfig,
    state: LinkState,
    port: u16,
    peer: Option<PeerProcess>,
    peer_info: Option<PeerInfo>,
    connection: Option<Connection>,
}

impl JvmLinkClient {
    /// Create a client. Performs no I/O.
    pub fn new(config: LinkConfig) -> Self {
        let port = config.connection.port;
        Self {
            config,
            state: LinkState::Unstarted,
            port,
            peer: None,
            peer_info: None,
            connection: None,
        }
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    /// Port the next connection targets. A launched peer may override the
    /// configured port by announcing its own on the readiness line.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Whether this client started the peer and is responsible for stopping it.
    pub fn owns_peer(&self) -> bool {
        self.peer.is_some()
    }

    pub fn peer_info(&self) -> Option<&PeerInfo> {
        self.peer_info.as_ref()
    }

    pub fn config(&self) -> &LinkConfig {
        &self.config
    }

    /// Launch the peer and wait until it signals readiness.
    ///
    /// # Errors
    ///
    /// * [`LinkError::State`] - a peer owned by this client is still running,
    ///   or a connection is open
    /// * [`LinkError::Launch`] - the process could not be spawned or never
    ///   became ready within `startup_timeout`
    pub async fn start_java(
        &mut self,
        startup_timeout: Duration,
        command: &PeerCommand,
        working_dir: Option<&Path>,
    ) -> Result<(), LinkError> {
        if self.state.is_connected() {
            return Err(LinkError::State {
                message: String::from("Cannot start the peer while a connection is open"),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        if let Some(peer) = self.peer.as_mut() {
            if !peer.has_exited() {
                return Err(LinkError::State {
                    message: format!("Peer already running (PID: {})", peer.pid()),
                    location: ErrorLocation::from(Location::caller()),
                });
            }
            debug!("Releasing handle of exited peer (PID: {})", peer.pid());
            self.peer = None;
            self.peer_info = None;
        }

        let ready_pattern = compile_ready_pattern(&self.config.peer.ready_pattern)?;
        let process = launch_peer(command, working_dir, startup_timeout, &ready_pattern).await?;

        if let Some(port) = process.reported_port() {
            if port != self.port {
                info!("Peer announced port {port}, overriding {}", self.port);
            }
            self.port = port;
        }

        self.peer_info = match PeerInfoBuilder::default()
            .with_pid(process.pid())
            .with_port(self.port)
            .with_name(process.program_name())
            .with_command(process.command_line())
            .with_owned(true)
            .build()
        {
            Ok(info) => Some(info),
            Err(e) => {
                warn!("Failed to describe launched peer: {e}");
                None
            }
        };

        self.peer = Some(process);
        self.state = LinkState::Started;
        Ok(())
    }

    /// [`start_java`](Self::start_java) with the command, working directory and
    /// timeout taken from the `[peer]` config section.
    pub async fn start_configured_java(&mut self) -> Result<(), LinkError> {
        let command = PeerCommand::from_command_line(&self.config.peer.command)?;
        let working_dir = self.config.peer.working_dir.clone();
        let startup_timeout = self.config.peer.startup_timeout();

        self.start_java(startup_timeout, &command, working_dir.as_deref())
            .await
    }

    /// Open the socket to the peer on [`port`](Self::port).
    ///
    /// # Errors
    ///
    /// Returns [`LinkError::Connection`] if a connection already exists, or the
    /// peer is not listening, or the connect timeout elapses.
    pub async fn establish_connection(&mut self) -> Result<(), LinkError> {
        if self.connection.is_some() {
            return Err(LinkError::Connection {
                message: String::from("A connection already exists; close it first"),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let connection = Connection::open(self.port, &self.config.connection).await?;
        info!("Connected to peer at {}", connection.address());

        if self.peer.is_none() {
            let port = self.port;
            match spawn_blocking(move || discover_on_port(port)).await {
                Ok(Ok(info)) => self.peer_info = info,
                Ok(Err(e)) => debug!("Could not identify peer on port {port}: {e}"),
                Err(e) => debug!("Peer discovery on port {port} did not finish: {e}"),
            }
        }

        self.connection = Some(connection);
        self.state = LinkState::Connected;
        Ok(())
    }

    /// Close the socket. Calling this on a closed connection succeeds
    /// trivially. The peer process is left running.
    pub async fn close_connection(&mut self) -> Result<(), LinkError> {
        match self.connection.take() {
            Some(connection) => {
                connection.shutdown().await;
                self.state = LinkState::Closed;
            }
            None => debug!("close_connection: no open connection"),
        }
        Ok(())
    }

    /// Ask the peer to exit and release it.
    ///
    /// Sends BYE when connected, then closes the socket. An owned peer gets
    /// `shutdown_grace` to exit before it is killed. A peer that has already
    /// exited is not an error.
    pub async fn shut_java(&mut self) -> Result<(), LinkError> {
        if let Some(mut connection) = self.connection.take() {
            if let Err(e) = connection.send_bye().await {
                debug!("BYE not delivered to {}: {e}", connection.address());
            }
            connection.shutdown().await;
            self.state = LinkState::Closed;
        }

        if let Some(mut peer) = self.peer.take() {
            let pid = peer.pid();
            if peer.shutdown(self.config.peer.shutdown_grace()).await {
                info!("Peer (PID: {pid}) stopped");
            } else {
                warn!("Peer (PID: {pid}) may still be running");
            }
            self.peer_info = None;
            self.state = LinkState::Closed;
        }

        Ok(())
    }

    /// Write a raw length-prefixed string.
    pub async fn send_message(&mut self, message: &str) -> Result<(), LinkError> {
        let result = self
            .connection_mut("send a message")?
            .send_string(message)
            .await;
        self.settle(result)
    }

    /// Write a raw 4-byte integer.
    pub async fn send_int(&mut self, value: i32) -> Result<(), LinkError> {
        let result = self.connection_mut("send an integer")?.send_int(value).await;
        self.settle(result)
    }

    /// Read a length-prefixed string.
    ///
    /// A negative declared length, or one above `max_message_bytes`, fails
    /// with [`LinkError::Io`] before anything is allocated, and the connection
    /// is dropped.
    pub async fn read_message(&mut self) -> Result<String, LinkError> {
        let result = self.connection_mut("read a message")?.read_string().await;
        self.settle(result)
    }

    pub async fn read_int(&mut self) -> Result<i32, LinkError> {
        let result = self.connection_mut("read an integer")?.read_int().await;
        self.settle(result)
    }

    /// Read exactly `size` bytes.
    ///
    /// A `size` above `max_message_bytes` is a [`LinkError::Validation`]
    /// error; nothing is read and the connection stays open.
    pub async fn read_bytes(&mut self, size: usize) -> Result<Vec<u8>, LinkError> {
        let result = self.connection_mut("read bytes")?.read_bytes(size).await;
        self.settle(result)
    }

    /// Fetch a variable from the peer.
    ///
    /// # Errors
    ///
    /// * [`LinkError::Validation`] - `name` is empty; nothing is sent
    /// * [`LinkError::NotFound`] - the peer has no variable called `name`
    /// * [`LinkError::Protocol`] - the reply carries an unknown type tag or a
    ///   malformed value
    pub async fn get_var(&mut self, name: &str) -> Result<Variable, LinkError> {
        Variable::check_name(name)?;

        let result = self.connection_mut("get a variable")?.fetch(name).await;

        match self.settle(result)? {
            Some(value) => Ok(Variable::new(name, value)?),
            None => Err(LinkError::NotFound {
                name: name.to_string(),
                location: ErrorLocation::from(Location::caller()),
            }),
        }
    }

    /// Bind a variable on the peer and wait for the acknowledgement.
    pub async fn set_var(&mut self, variable: &Variable) -> Result<(), LinkError> {
        let result = self
            .connection_mut("set a variable")?
            .acknowledged(Request::Set(variable))
            .await;
        let status = self.settle(result)?;

        match status {
            PeerStatus::Ok => {
                debug!("Set {variable}");
                Ok(())
            }
            PeerStatus::Failed(message) => Err(LinkError::Protocol {
                message: format!("Peer rejected '{}': {message}", variable.name()),
                location: ErrorLocation::from(Location::caller()),
            }),
        }
    }

    /// [`set_var`](Self::set_var) for any primitive convertible to a [`VarValue`].
    pub async fn set(
        &mut self,
        name: &str,
        value: impl Into<VarValue>,
    ) -> Result<(), LinkError> {
        let variable = Variable::new(name, value.into())?;
        self.set_var(&variable).await
    }

    /// Hand `code` to the peer for execution. The string is never inspected.
    ///
    /// A failure reported by the peer is a [`LinkError::Protocol`] carrying
    /// the peer's message.
    pub async fn exec(&mut self, code: &str) -> Result<(), LinkError> {
        let result = self
            .connection_mut("execute code")?
            .acknowledged(Request::Exec(code))
            .await;
        let status = self.settle(result)?;

        match status {
            PeerStatus::Ok => Ok(()),
            PeerStatus::Failed(message) => Err(LinkError::Protocol {
                message: format!("Peer failed to execute code: {message}"),
                location: ErrorLocation::from(Location::caller()),
            }),
        }
    }

    /// Drop the connection when `result` leaves the stream at an unknown offset.
    fn settle<T>(&mut self, result: Result<T, LinkError>) -> Result<T, LinkError> {
        if let Err(error) = &result
            && breaks_framing(error)
            && let Some(connection) = self.connection.take()
        {
            warn!("Dropping connection to {}: {error}", connection.address());
            self.state = LinkState::Closed;
        }
        result
    }

    #[track_caller]
    fn connection_mut(&mut self, operation: &str) -> Result<&mut Connection, LinkError> {
        let state = self.state;

        match self.connection.as_mut() {
            Some(connection) if state.is_connected() => Ok(connection),
            _ => Err(LinkError::State {
                message: format!("Cannot {operation} while {state}; establish a connection first"),
                location: ErrorLocation::from(Location::caller()),
            }),
        }
    }
}

/// Errors coming out of a [`Connection`] call that may have stopped mid-frame.
/// Peer-reported failures are built by the client from complete replies and
/// never pass through here.
fn breaks_framing(error: &LinkError) -> bool {
    matches!(error, LinkError::Io { .. } | LinkError::Protocol { .. })
}

impl Drop for JvmLinkClient {
    fn drop(&mut self) {
        let Some(mut peer) = self.peer.take() else {
            return;
        };

        let pid = peer.pid();

        if peer.has_exited() {
            debug!("Owned peer (PID: {pid}) already exited");
            return;
        }

        if let Some(connection) = self.connection.take()
            && connection.try_send_bye()
        {
            debug!("Sent BYE to peer (PID: {pid}) on drop");
        }

        if peer.terminate_blocking(self.config.peer.shutdown_grace()) {
            debug!("Owned peer (PID: {pid}) stopped on drop");
        } else {
            warn!("Owned peer (PID: {pid}) could not be stopped on drop");
        }
    }
}
