use crate::error::discovery::DiscoveryError;

use common::ErrorLocation;
use models::{PeerInfo, PeerInfoBuilder};

use std::panic::Location;

use log::{debug, trace};
use netstat2::{
    AddressFamilyFlags, ProtocolFlags, ProtocolSocketInfo, SocketInfo, TcpState, get_sockets_info,
};
use sysinfo::{Pid, Process, ProcessStatus, ProcessesToUpdate, System};

#[track_caller]
fn query_tcp_sockets() -> Result<Vec<SocketInfo>, DiscoveryError> {
    get_sockets_info(
        AddressFamilyFlags::IPV4 | AddressFamilyFlags::IPV6,
        ProtocolFlags::TCP,
    )
    .map_err(|e| DiscoveryError::NetworkQuery {
        message: format!("Failed to query network sockets: {e}"),
        location: ErrorLocation::from(Location::caller()),
        source: Box::new(e),
    })
}

/// Find the PID of the process listening on a local TCP port.
#[track_caller]
pub fn find_listening_pid(port: u16) -> Result<Option<u32>, DiscoveryError> {
    let sockets = query_tcp_sockets()?;

    for s in sockets {
        if let ProtocolSocketInfo::Tcp(tcp) = s.protocol_socket_info
            && tcp.state == TcpState::Listen
            && tcp.local_port == port
            && let Some(&pid) = s.associated_pids.first()
        {
            trace!("Found process {pid} listening on port {port}");
            return Ok(Some(pid));
        }
    }

    debug!("No process found listening on port {port}");
    Ok(None)
}

/// Identify an externally started peer listening on `port`.
///
/// The returned [`PeerInfo`] is always `owned = false`: a peer found this way
/// was not launched by us and must never be terminated on our behalf.
///
/// # Returns
///
/// * `Ok(Some(PeerInfo))` - a process is listening and could be inspected
/// * `Ok(None)` - nothing listens on the port, or the process vanished
/// * `Err(DiscoveryError)` - the socket table could not be queried
#[track_caller]
pub fn discover_on_port(port: u16) -> Result<Option<PeerInfo>, DiscoveryError> {
    let Some(pid) = find_listening_pid(port)? else {
        return Ok(None);
    };

    let data = with_process(pid, |p| {
        (p.name().to_string_lossy().to_string(), format_command(p))
    });

    let Some((name, command)) = data else {
        trace!("Process {pid} disappeared before we could read its info");
        return Ok(None);
    };

    debug!("Discovered peer: {name} (PID: {pid}) on port {port}");

    let command = if command.is_empty() {
        name.clone()
    } else {
        command
    };

    let peer_info = PeerInfoBuilder::default()
        .with_pid(pid)
        .with_port(port)
        .with_name(name)
        .with_command(command)
        .with_owned(false)
        .build()?;

    Ok(Some(peer_info))
}

pub(crate) fn with_process<F, R>(pid: u32, f: F) -> Option<R>
where
    F: FnOnce(&Process) -> R,
{
    let mut sys = System::new();
    sys.refresh_processes(ProcessesToUpdate::Some(&[Pid::from_u32(pid)]), true);

    sys.process(Pid::from_u32(pid)).map(f)
}

pub(crate) fn format_command(process: &Process) -> String {
    process
        .cmd()
        .iter()
        .map(|s| s.to_string_lossy().to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Whether a process with this PID is alive. Zombies count as exited.
pub fn is_pid_running(pid: u32) -> bool {
    with_process(pid, |p| p.status() != ProcessStatus::Zombie).unwrap_or(false)
}
