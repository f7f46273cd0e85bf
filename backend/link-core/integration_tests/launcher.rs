use crate::helpers::{TestPeer, shell_peer, unused_port};

use link_core::error::launch::LaunchError;
use link_core::launcher::{
    PeerCommand, compile_ready_pattern, discover_on_port, find_listening_pid, is_pid_running,
    launch_peer,
};
use link_core::DEFAULT_READY_PATTERN;

use std::path::Path;
use std::time::Duration;

fn default_pattern() -> regex::Regex {
    compile_ready_pattern(DEFAULT_READY_PATTERN).unwrap()
}

// ============================================================================
// launch_peer()
// ============================================================================

/// **VALUE**: A peer that prints the readiness line is reported ready with its announced port.
///
/// **WHY THIS MATTERS**: The announced port is how a peer started on a dynamic port is found.
///
/// **BUG THIS CATCHES**: Would catch lines before the announcement being mistaken for it,
/// or the port capture being dropped.
#[cfg(unix)]
#[tokio::test]
async fn given_announcing_peer_when_launched_then_ready_with_reported_port() {
    // GIVEN: A peer that logs, then announces port 23456
    let command = shell_peer("echo booting; echo 'JVMLink listening on port 23456'; exec sleep 30");

    // WHEN: Launching it
    let mut process = launch_peer(&command, None, Duration::from_secs(5), &default_pattern())
        .await
        .unwrap();

    // THEN: Running, with the announced port and a usable description
    assert!(process.pid() > 0);
    assert!(is_pid_running(process.pid()));
    assert_eq!(process.reported_port(), Some(23456));
    assert_eq!(process.program_name(), "sh");
    assert!(process.command_line().starts_with("sh -c"));
    assert!(!process.has_exited());

    // AND: Shutdown stops it
    let pid = process.pid();
    assert!(process.shutdown(Duration::from_millis(100)).await);
    assert!(!is_pid_running(pid));
}

#[cfg(unix)]
#[tokio::test]
async fn given_pattern_without_port_group_when_launched_then_no_reported_port() {
    // GIVEN: A custom pattern with no capture
    let pattern = compile_ready_pattern(r"^READY$").unwrap();
    let command = shell_peer("echo READY; exec sleep 30");

    // WHEN: Launching
    let mut process = launch_peer(&command, None, Duration::from_secs(5), &pattern)
        .await
        .unwrap();

    // THEN: Ready, but no port announced
    assert_eq!(process.reported_port(), None);
    assert!(process.terminate_blocking(Duration::from_millis(50)));
}

#[cfg(unix)]
#[tokio::test]
async fn given_working_dir_when_launched_then_peer_runs_there() {
    // GIVEN: A temporary directory and a peer that announces only if it runs there
    let dir = tempfile::TempDir::new().unwrap();
    let marker = dir.path().join("peer.marker");
    std::fs::write(&marker, "").unwrap();
    let command = shell_peer("test -f peer.marker && echo 'listening on port 1'; exec sleep 30");

    // WHEN: Launching in that directory
    let mut process = launch_peer(
        &command,
        Some(dir.path()),
        Duration::from_secs(5),
        &default_pattern(),
    )
    .await
    .unwrap();

    // THEN: The readiness line was printed
    assert_eq!(process.reported_port(), Some(1));
    assert!(process.shutdown(Duration::from_millis(50)).await);
}

/// **VALUE**: A peer that never announces readiness is killed after the startup timeout.
///
/// **WHY THIS MATTERS**: A hung JVM must not block the caller forever or be left running.
///
/// **BUG THIS CATCHES**: Would catch the timeout not being applied, or the child leaking
/// when it fires.
#[cfg(unix)]
#[tokio::test]
async fn given_silent_peer_when_launched_then_times_out() {
    // GIVEN: A peer that never prints
    let command = shell_peer("exec sleep 30");

    // WHEN: Launching with a short timeout
    let result = launch_peer(&command, None, Duration::from_millis(300), &default_pattern()).await;

    // THEN: Timeout error
    assert!(matches!(result, Err(LaunchError::Timeout { .. })));
}

#[cfg(unix)]
#[tokio::test]
async fn given_peer_exiting_before_ready_when_launched_then_returns_exited() {
    // GIVEN: A peer that dies during startup
    let command = shell_peer("echo starting; echo 'no class found' >&2; exit 3");

    // WHEN/THEN: Exited error
    let result = launch_peer(&command, None, Duration::from_secs(5), &default_pattern()).await;
    assert!(matches!(result, Err(LaunchError::Exited { .. })));
}

/// **VALUE**: A missing executable is a Spawn error that names the command.
///
/// **WHY THIS MATTERS**: "java not found" is the most common setup mistake.
///
/// **BUG THIS CATCHES**: Would catch a panic on spawn failure or a message without the command.
#[tokio::test]
async fn given_missing_binary_when_launched_then_returns_spawn_error() {
    // GIVEN: A command that cannot exist
    let command = PeerCommand::new("jvmlink-definitely-not-installed").arg("--version");

    // WHEN: Launching it
    let result = launch_peer(&command, None, Duration::from_secs(1), &default_pattern()).await;

    // THEN: Spawn error naming the command
    match result {
        Err(LaunchError::Spawn { message, .. }) => {
            assert!(message.contains("jvmlink-definitely-not-installed"));
        }
        other => panic!("Expected Spawn error, got {other:?}"),
    }
}

#[tokio::test]
async fn given_missing_working_dir_when_launched_then_returns_spawn_error() {
    let command = PeerCommand::new("java");
    let dir = Path::new("/nonexistent/jvmlink/peer/dir");

    let result = launch_peer(&command, Some(dir), Duration::from_secs(1), &default_pattern()).await;

    assert!(matches!(result, Err(LaunchError::Spawn { .. })));
}

// ============================================================================
// Discovery
// ============================================================================

#[tokio::test]
async fn given_nothing_listening_when_discover_on_port_then_returns_none() {
    // GIVEN: A port with no listener
    let port = unused_port().await;

    // WHEN/THEN: Ok(None) from both lookups
    assert!(matches!(find_listening_pid(port), Ok(None)));
    assert!(matches!(discover_on_port(port), Ok(None)));
}

/// **VALUE**: A listening peer is identified, and never as owned.
///
/// **WHY THIS MATTERS**: The client reports who it is talking to, but must not claim
/// ownership of a process it did not start.
///
/// **BUG THIS CATCHES**: Would catch the wrong socket being matched or `owned` defaulting to true.
#[tokio::test]
async fn given_listening_peer_when_discover_on_port_then_identifies_unowned_process() {
    // GIVEN: A peer listening inside this test process
    let peer = TestPeer::start().await;

    // WHEN: Discovering it
    let result = discover_on_port(peer.port());

    // THEN: If the platform exposes socket owners, it is this process and not owned
    if let Ok(Some(info)) = result {
        assert_eq!(info.pid, std::process::id());
        assert_eq!(info.port, peer.port());
        assert!(!info.owned);
        assert!(!info.name.is_empty());
    }
}
