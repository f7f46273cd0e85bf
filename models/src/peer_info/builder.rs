use crate::error::model_error::ModelError;
use crate::{ErrorLocation, PeerInfo};

use std::panic::Location;

/// Collects what is known about a peer process, then checks it in [`build`](Self::build).
///
/// Every field is mandatory. A zero pid or port and an empty name or command
/// are rejected, since they would describe a process that cannot be stopped
/// or reconnected to.
#[derive(Debug, Default)]
pub struct PeerInfoBuilder {
    pid: Option<u32>,
    port: Option<u16>,
    name: Option<String>,
    command: Option<String>,
    owned: Option<bool>,
}

impl PeerInfoBuilder {
    pub fn with_pid(mut self, pid: u32) -> Self {
        self.pid = Some(pid);
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = Some(command.into());
        self
    }

    pub fn with_owned(mut self, owned: bool) -> Self {
        self.owned = Some(owned);
        self
    }

    #[track_caller]
    pub fn build(self) -> Result<PeerInfo, ModelError> {
        let pid = required(self.pid, "PID")?;
        let port = required(self.port, "Port")?;
        check(pid != 0, "PID must be non-zero")?;
        check(port != 0, "Port must be non-zero")?;

        let name = required(self.name, "Peer name")?;
        check(!name.is_empty(), "Peer name cannot be empty")?;

        let command = required(self.command, "Command")?;
        check(!command.is_empty(), "Command cannot be empty")?;

        Ok(PeerInfo {
            pid,
            port,
            name,
            command,
            owned: required(self.owned, "Owned")?,
        })
    }
}

#[track_caller]
fn required<T>(field: Option<T>, label: &str) -> Result<T, ModelError> {
    match field {
        Some(value) => Ok(value),
        None => Err(invalid(format!("{label} is required"))),
    }
}

#[track_caller]
fn check(holds: bool, message: &str) -> Result<(), ModelError> {
    if holds {
        Ok(())
    } else {
        Err(invalid(message.to_string()))
    }
}

#[track_caller]
fn invalid(message: String) -> ModelError {
    ModelError::Validation {
        message,
        location: ErrorLocation::from(Location::caller()),
    }
}
