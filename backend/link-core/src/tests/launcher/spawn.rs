// Unit tests for spawn module private functions
// Integration tests for launching real processes are in integration_tests/launcher.rs

use crate::error::launch::LaunchError;
use crate::launcher::PeerCommand;
use crate::launcher::spawn::{build_peer_command, compile_ready_pattern, get_ready_regex};
use crate::{DEFAULT_PEER_COMMAND, DEFAULT_READY_PATTERN};

use std::path::Path;

/// **VALUE**: Verifies that `build_peer_command()` passes program and arguments through untouched.
///
/// **WHY THIS MATTERS**: The peer is launched from a user-supplied command line. Any reordering
/// or dropped argument starts the wrong class or no peer at all.
///
/// **BUG THIS CATCHES**: Would catch the program being passed as the first argument, or
/// arguments being joined into one string.
#[test]
fn given_peer_command_when_build_peer_command_called_then_sets_program_args_and_dir() {
    // GIVEN: A command with arguments and a working directory
    let command = PeerCommand::new("java")
        .arg("-cp")
        .arg("loci_tools.jar")
        .arg("loci.jvmlink.JVMLinkServer");
    let dir = Path::new("/tmp");

    // WHEN: Building the process command
    let cmd = build_peer_command(&command, Some(dir));

    // THEN: Program, arguments and directory are preserved in order
    let std_cmd = cmd.as_std();
    assert_eq!(std_cmd.get_program(), "java");
    let args: Vec<_> = std_cmd.get_args().collect();
    assert_eq!(args, vec!["-cp", "loci_tools.jar", "loci.jvmlink.JVMLinkServer"]);
    assert_eq!(std_cmd.get_current_dir(), Some(dir));
}

#[test]
fn given_no_working_dir_when_build_peer_command_called_then_inherits_current_dir() {
    // GIVEN/WHEN: A command without a working directory
    let cmd = build_peer_command(&PeerCommand::new("java"), None);

    // THEN: No directory override
    assert_eq!(cmd.as_std().get_current_dir(), None);
}

/// **VALUE**: Checks that command lines split on whitespace into program and arguments.
///
/// **WHY THIS MATTERS**: Config and the environment carry the peer command as a single line.
///
/// **BUG THIS CATCHES**: Would catch repeated spaces producing empty arguments.
#[test]
fn given_command_line_when_parsed_then_splits_program_and_args() {
    // GIVEN: The default peer command with extra whitespace
    let line = format!("  {DEFAULT_PEER_COMMAND}   ");

    // WHEN: Parsing it
    let command = PeerCommand::from_command_line(&line).unwrap();

    // THEN: Program is java, arguments follow, Display rejoins them
    assert_eq!(command.program(), "java");
    assert_eq!(
        command.arguments(),
        ["-cp", "loci_tools.jar", "loci.jvmlink.JVMLinkServer"]
    );
    assert_eq!(command.to_string(), DEFAULT_PEER_COMMAND);
}

#[test]
fn given_blank_command_line_when_parsed_then_returns_validation_error() {
    // GIVEN/WHEN: Parsing a blank line
    let result = PeerCommand::from_command_line("   ");

    // THEN: Validation error
    assert!(matches!(result, Err(LaunchError::Validation { .. })));
}

#[test]
fn given_program_path_when_program_name_called_then_returns_file_name() {
    let command = PeerCommand::new("/usr/lib/jvm/bin/java");
    assert_eq!(command.program_name(), "java");
}

/// **VALUE**: Tests that the readiness regex matches the peer's announcement and captures the port.
///
/// **WHY THIS MATTERS**: If the pattern stops matching, every launch waits until the startup
/// timeout and fails even though the peer is up.
///
/// **BUG THIS CATCHES**: Would catch a renamed capture group or a case-sensitive pattern.
#[test]
fn given_readiness_lines_when_default_regex_applied_then_matches_and_extracts_port() {
    // GIVEN: Announcements in different casings
    let re = get_ready_regex();
    let cases = vec![
        ("JVMLink listening on port 20345", "20345"),
        ("Server LISTENING ON PORT 1", "1"),
        ("[main] listening on port 65535 (loopback)", "65535"),
    ];

    // WHEN/THEN: Each matches and yields its port
    for (line, expected_port) in cases {
        let caps = re.captures(line);
        assert!(caps.is_some(), "Should match: {line}");
        assert_eq!(caps.unwrap().name("port").unwrap().as_str(), expected_port);
    }
}

#[test]
fn given_unrelated_output_when_default_regex_applied_then_does_not_match() {
    let re = get_ready_regex();
    let invalid_cases = vec![
        "Starting JVMLink server",
        "listening on port",
        "port 20345 in use",
    ];

    for invalid in invalid_cases {
        assert!(re.captures(invalid).is_none(), "Should not match: {invalid}");
    }
}

#[test]
fn given_custom_and_invalid_patterns_when_compiled_then_validates() {
    // GIVEN/WHEN: The default, a custom and a broken pattern
    let default = compile_ready_pattern(DEFAULT_READY_PATTERN).unwrap();
    let custom = compile_ready_pattern(r"^READY$").unwrap();
    let broken = compile_ready_pattern(r"(unclosed");

    // THEN: The first two compile, the last is a validation error
    assert_eq!(default.as_str(), DEFAULT_READY_PATTERN);
    assert!(custom.is_match("READY"));
    assert!(matches!(broken, Err(LaunchError::Validation { .. })));
}
