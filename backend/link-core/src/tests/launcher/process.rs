// Unit tests for process module private functions

use crate::launcher::is_pid_running;
use crate::launcher::process::{format_command, with_process};

/// **VALUE**: Tests the private `format_command()` helper against a real process.
///
/// **WHY THIS MATTERS**: Discovered peers are described by their command line. An empty or
/// panicking result would break attaching to an external peer.
///
/// **BUG THIS CATCHES**: Would catch the join dropping arguments or returning nothing.
#[test]
fn given_valid_process_when_format_command_called_then_returns_command_string() {
    // GIVEN: Our own PID
    let our_pid = std::process::id();

    // WHEN: Formatting its command line
    let result = with_process(our_pid, format_command);

    // THEN: A non-empty command string
    assert!(result.is_some(), "Should find the process");
    assert!(!result.unwrap().is_empty(), "Command string should not be empty");
}

/// **VALUE**: Tests that `with_process()` handles PIDs that do not exist.
///
/// **WHY THIS MATTERS**: A peer can exit between the socket scan and the process lookup.
///
/// **BUG THIS CATCHES**: Would catch a panic instead of `None` for vanished processes.
#[test]
fn given_nonexistent_pid_when_with_process_called_then_returns_none() {
    // GIVEN/WHEN: A PID that doesn't exist
    let result = with_process(u32::MAX, |_| true);

    // THEN: None
    assert!(result.is_none());
}

#[test]
fn given_own_pid_when_is_pid_running_called_then_returns_true() {
    assert!(is_pid_running(std::process::id()));
}

#[test]
fn given_nonexistent_pid_when_is_pid_running_called_then_returns_false() {
    assert!(!is_pid_running(u32::MAX));
}
