use crate::{ModelError, PeerInfoBuilder};

fn valid_builder() -> PeerInfoBuilder {
    PeerInfoBuilder::default()
        .with_pid(12345)
        .with_port(20345)
        .with_name("java")
        .with_command("java -cp loci_tools.jar loci.jvmlink.JVMLinkServer")
        .with_owned(true)
}

/// **VALUE**: Verifies that builder validation rejects zero PIDs.
///
/// **WHY THIS MATTERS**: Teardown uses the PID to confirm the peer exited.
/// PID 0 would make every exit check meaningless.
///
/// **BUG THIS CATCHES**: Would catch if the non-zero PID check is removed.
#[test]
fn given_zero_pid_when_building_peer_info_then_returns_validation_error() {
    // GIVEN: Builder with PID set to zero
    let builder = valid_builder().with_pid(0);

    // WHEN: Attempting to build
    let result = builder.build();

    // THEN: Should return validation error
    match result {
        Err(ModelError::Validation { message, .. }) => {
            assert_eq!(message, "PID must be non-zero");
        }
        Ok(info) => panic!("Expected validation error, got {info:?}"),
    }
}

/// **VALUE**: Verifies that builder validation rejects missing PID.
///
/// **WHY THIS MATTERS**: Every PeerInfo must identify a process.
///
/// **BUG THIS CATCHES**: Would catch if required field validation is bypassed.
#[test]
fn given_missing_pid_when_building_then_returns_validation_error() {
    // GIVEN: Builder without PID
    let builder = PeerInfoBuilder::default()
        .with_port(20345)
        .with_name("java")
        .with_command("java")
        .with_owned(true);

    // WHEN: Attempting to build
    let result = builder.build();

    // THEN: Should return validation error
    match result {
        Err(ModelError::Validation { message, .. }) => assert_eq!(message, "PID is required"),
        Ok(info) => panic!("Expected validation error, got {info:?}"),
    }
}

/// **VALUE**: Verifies that port 0 is rejected.
///
/// **WHY THIS MATTERS**: Port 0 means "pick any port" when binding; a client
/// can never connect to it.
///
/// **BUG THIS CATCHES**: Would catch if a peer announcing port 0 slips through.
#[test]
fn given_zero_port_when_building_then_returns_validation_error() {
    // GIVEN: Builder with port zero
    let builder = valid_builder().with_port(0);

    // WHEN: Attempting to build
    let result = builder.build();

    // THEN: Should return validation error
    match result {
        Err(ModelError::Validation { message, .. }) => {
            assert_eq!(message, "Port must be non-zero")
        }
        Ok(info) => panic!("Expected validation error, got {info:?}"),
    }
}

/// **VALUE**: Verifies that builder validation rejects empty names and commands.
///
/// **WHY THIS MATTERS**: Both are logged on every launch and shutdown.
///
/// **BUG THIS CATCHES**: Would catch if empty string validation is removed.
#[test]
fn given_empty_name_or_command_when_building_then_returns_validation_error() {
    // GIVEN: Builders with an empty name and an empty command
    let empty_name = valid_builder().with_name("");
    let empty_command = valid_builder().with_command("");

    // WHEN: Attempting to build both
    let name_result = empty_name.build();
    let command_result = empty_command.build();

    // THEN: Both should fail with specific messages
    match name_result {
        Err(ModelError::Validation { message, .. }) => {
            assert_eq!(message, "Peer name cannot be empty")
        }
        Ok(info) => panic!("Expected validation error, got {info:?}"),
    }
    match command_result {
        Err(ModelError::Validation { message, .. }) => {
            assert_eq!(message, "Command cannot be empty")
        }
        Ok(info) => panic!("Expected validation error, got {info:?}"),
    }
}

/// **VALUE**: Verifies that builder validation rejects a missing owned flag.
///
/// **WHY THIS MATTERS**: The owned flag decides whether dropping the client kills
/// the peer. Guessing a default would either orphan a peer or kill someone else's.
///
/// **BUG THIS CATCHES**: Would catch if the owned flag silently defaults.
#[test]
fn given_missing_owned_flag_when_building_then_returns_validation_error() {
    // GIVEN: Builder without owned flag
    let builder = PeerInfoBuilder::default()
        .with_pid(12345)
        .with_port(20345)
        .with_name("java")
        .with_command("java");

    // WHEN: Attempting to build
    let result = builder.build();

    // THEN: Should return validation error
    match result {
        Err(ModelError::Validation { message, .. }) => assert_eq!(message, "Owned is required"),
        Ok(info) => panic!("Expected validation error, got {info:?}"),
    }
}

/// **VALUE**: Verifies the happy path populates every field.
///
/// **WHY THIS MATTERS**: Launch and discovery both go through this builder.
///
/// **BUG THIS CATCHES**: Would catch swapped or dropped field assignments.
#[test]
fn given_all_valid_fields_when_building_then_returns_peer_info() {
    // GIVEN: Builder with all valid fields, external peer
    let builder = valid_builder().with_owned(false);

    // WHEN: Building
    let info = builder.build().expect("valid builder should build");

    // THEN: Should carry every field through
    assert_eq!(info.pid, 12345);
    assert_eq!(info.port, 20345);
    assert_eq!(info.name, "java");
    assert_eq!(
        info.command,
        "java -cp loci_tools.jar loci.jvmlink.JVMLinkServer"
    );
    assert!(!info.owned);
}
