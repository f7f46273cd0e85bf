use crate::helpers::{
    RAISE_CODE, RAISE_MESSAGE, RawPeer, TestPeer, config_for, shell_peer, unused_port,
};

use link_core::error::launch::LaunchError;
use link_core::error::link::LinkError;
use link_core::launcher::is_pid_running;
use link_core::protocol::{CMD_EXEC, CMD_GETVAR, CMD_SETVAR, TYPE_ARRAY, TYPE_INT, TYPE_STRING};
use link_core::{JvmLinkClient, LinkState};

use models::{VarKind, VarValue, Variable};

use std::time::Duration;

const WAIT: Duration = Duration::from_secs(2);

async fn connected_client(peer: &TestPeer) -> JvmLinkClient {
    let mut client = JvmLinkClient::new(config_for(peer.port()));
    client.establish_connection().await.unwrap();
    client
}

// ============================================================================
// Variables
// ============================================================================

/// **VALUE**: The canonical scenario: SET x=42, then GET x returns 42 as an int.
///
/// **WHY THIS MATTERS**: This is the basic contract of the client. If it fails, nothing else
/// about the link is usable.
///
/// **BUG THIS CATCHES**: Would catch the SET not being acknowledged, the GET decoding the
/// wrong width, or the kind being lost on the way back.
#[tokio::test]
async fn given_test_peer_when_set_x_42_then_get_x_returns_int_42() {
    // GIVEN: A connected client
    let peer = TestPeer::start().await;
    let mut client = connected_client(&peer).await;

    // WHEN: Setting and reading back x
    client.set("x", 42).await.unwrap();
    let x = client.get_var("x").await.unwrap();

    // THEN: 42, kind int, and the peer saw SET then GET
    assert_eq!(x.name(), "x");
    assert_eq!(x.value(), &VarValue::Int(42));
    assert_eq!(x.kind(), VarKind::Int);
    assert_eq!(peer.commands(), vec![CMD_SETVAR, CMD_GETVAR]);
}

/// **VALUE**: Every primitive kind survives SET followed by GET with exact value and kind.
///
/// **WHY THIS MATTERS**: Each kind has its own width and encoding. One wrong width corrupts
/// every frame after it.
///
/// **BUG THIS CATCHES**: Would catch a kind encoded with one width and decoded with another,
/// a sign lost on short/long, or float/double precision being narrowed.
#[tokio::test]
async fn given_every_kind_when_set_then_get_round_trips_exact_value_and_kind() {
    // GIVEN: One variable of each kind, including edge values
    let peer = TestPeer::start().await;
    let mut client = connected_client(&peer).await;

    let variables = vec![
        Variable::int("i", i32::MIN).unwrap(),
        Variable::string("s", "héllo wörld").unwrap(),
        Variable::byte("b", 0xF0).unwrap(),
        Variable::char("c", 'λ').unwrap(),
        Variable::float("f", -1.25).unwrap(),
        Variable::bool("z", true).unwrap(),
        Variable::double("d", std::f64::consts::PI).unwrap(),
        Variable::long("j", i64::MAX).unwrap(),
        Variable::short("h", -12).unwrap(),
    ];

    for variable in &variables {
        // WHEN: Setting and getting it back
        client.set_var(variable).await.unwrap();
        let echoed = client.get_var(variable.name()).await.unwrap();

        // THEN: Identical
        assert_eq!(&echoed, variable, "round trip of {}", variable.kind());
    }
}

#[tokio::test]
async fn given_empty_string_when_set_then_get_returns_empty_string() {
    let peer = TestPeer::start().await;
    let mut client = connected_client(&peer).await;

    client.set("empty", "").await.unwrap();

    let value = client.get_var("empty").await.unwrap();
    assert_eq!(value.value(), &VarValue::String(String::new()));
}

/// **VALUE**: A variable the peer does not know is reported as NotFound with its name.
///
/// **WHY THIS MATTERS**: Callers distinguish "unset" from "broken link".
///
/// **BUG THIS CATCHES**: Would catch the null marker being decoded as a type tag.
#[tokio::test]
async fn given_unbound_name_when_get_var_then_returns_not_found() {
    // GIVEN: A peer with no variables
    let peer = TestPeer::start().await;
    let mut client = connected_client(&peer).await;

    // WHEN: Getting a missing variable
    let result = client.get_var("missing").await;

    // THEN: NotFound naming the variable, and the link still works
    match result {
        Err(LinkError::NotFound { name, .. }) => assert_eq!(name, "missing"),
        other => panic!("Expected NotFound, got {other:?}"),
    }
    client.set("now", 1).await.unwrap();
    assert_eq!(client.get_var("now").await.unwrap().value(), &VarValue::Int(1));
}

#[tokio::test]
async fn given_array_tag_reply_when_get_var_then_returns_protocol_error() {
    // GIVEN: A peer that answers with the reserved array tag
    let peer = RawPeer::start(TYPE_ARRAY.to_le_bytes().to_vec()).await;
    let mut client = JvmLinkClient::new(config_for(peer.port()));
    client.establish_connection().await.unwrap();

    // WHEN/THEN: Protocol error, and the undecodable reply closes the link
    let result = client.get_var("arr").await;
    assert!(matches!(result, Err(LinkError::Protocol { .. })));
    assert_eq!(client.state(), LinkState::Closed);
}

#[tokio::test]
async fn given_invalid_name_when_set_then_returns_validation_error_without_io() {
    let peer = TestPeer::start().await;
    let mut client = connected_client(&peer).await;

    let result = client.set("", 1).await;

    assert!(matches!(result, Err(LinkError::Validation { .. })));
    assert!(peer.commands().is_empty());
}

/// **VALUE**: An empty name is refused before a GET frame is written.
///
/// **WHY THIS MATTERS**: The peer cannot bind an empty name, so any answer it gives is
/// meaningless. Asking anyway costs a round trip and can surface as NotFound.
///
/// **BUG THIS CATCHES**: Would catch the name only being checked when the reply is turned
/// into a Variable.
#[tokio::test]
async fn given_empty_name_when_get_var_then_returns_validation_error_without_io() {
    // GIVEN: A connected client
    let peer = TestPeer::start().await;
    let mut client = connected_client(&peer).await;

    // WHEN: Asking for an unnamed variable
    let result = client.get_var("").await;

    // THEN: Validation error, the peer saw nothing, the link is untouched
    assert!(matches!(result, Err(LinkError::Validation { .. })));
    assert!(peer.commands().is_empty());
    assert_eq!(client.state(), LinkState::Connected);
}

#[tokio::test]
async fn given_negative_string_length_in_reply_when_get_var_then_returns_protocol_error() {
    // GIVEN: A peer answering with a string value whose length is -5
    let mut reply = TYPE_STRING.to_le_bytes().to_vec();
    reply.extend_from_slice(&(-5i32).to_le_bytes());
    let peer = RawPeer::start(reply).await;
    let mut client = JvmLinkClient::new(config_for(peer.port()));
    client.establish_connection().await.unwrap();

    // WHEN/THEN: The malformed reply is a Protocol error, not Io
    match client.get_var("s").await {
        Err(LinkError::Protocol { message, .. }) => assert!(message.contains("Negative")),
        other => panic!("Expected Protocol error, got {other:?}"),
    }
}

// ============================================================================
// Exec
// ============================================================================

/// **VALUE**: A failure reported by the peer surfaces as a Protocol error carrying its message.
///
/// **WHY THIS MATTERS**: Peer-side failures are the caller's problem to handle; they must not
/// look like a broken transport that calls for reconnecting.
///
/// **BUG THIS CATCHES**: Would catch the status being ignored, or the error mapped to Io.
#[tokio::test]
async fn given_failing_code_when_exec_then_returns_protocol_error_with_peer_message() {
    // GIVEN: A peer that fails "raise"
    let peer = TestPeer::start().await;
    let mut client = connected_client(&peer).await;

    // WHEN: Executing it
    let result = client.exec(RAISE_CODE).await;

    // THEN: Protocol error carrying the peer's message
    match result {
        Err(LinkError::Protocol { message, .. }) => assert!(message.contains(RAISE_MESSAGE)),
        other => panic!("Expected Protocol error, got {other:?}"),
    }

    // AND: The connection is still usable
    client.exec("println 1").await.unwrap();
    assert_eq!(peer.execs(), vec![RAISE_CODE.to_string(), "println 1".to_string()]);
}

#[tokio::test]
async fn given_code_when_exec_then_sent_verbatim() {
    let peer = TestPeer::start().await;
    let mut client = connected_client(&peer).await;
    let code = "import loci.formats.*; r = new ImageReader();\n r.close()";

    client.exec(code).await.unwrap();

    assert_eq!(peer.execs(), vec![code.to_string()]);
    assert_eq!(peer.commands(), vec![CMD_EXEC]);
}

// ============================================================================
// State machine
// ============================================================================

/// **VALUE**: Operations before connecting fail with State and never touch the network.
///
/// **WHY THIS MATTERS**: Out-of-sequence calls must be reported as such, not cause a hidden
/// connection attempt.
///
/// **BUG THIS CATCHES**: Would catch an implicit connect inside get/set/exec.
#[tokio::test]
async fn given_listening_peer_when_operations_called_before_connect_then_state_error_and_no_io() {
    // GIVEN: A peer that is listening, and a client pointing at it
    let peer = RawPeer::start(Vec::new()).await;
    let mut client = JvmLinkClient::new(config_for(peer.port()));

    // WHEN: Calling operations without connecting
    let get = client.get_var("x").await;
    let set = client.set("x", 1).await;
    let exec = client.exec("noop").await;

    // THEN: State errors, and the peer never saw a connection
    assert!(matches!(get, Err(LinkError::State { .. })));
    assert!(matches!(set, Err(LinkError::State { .. })));
    assert!(matches!(exec, Err(LinkError::State { .. })));
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(peer.accepted(), 0);
}

/// **VALUE**: Closing twice is harmless, and a closed link can be re-established explicitly.
///
/// **WHY THIS MATTERS**: Cleanup paths call close without knowing whether it already ran.
///
/// **BUG THIS CATCHES**: Would catch the second close failing, or Closed being a dead end.
#[tokio::test]
async fn given_connected_client_when_closed_twice_then_idempotent_and_reconnectable() {
    // GIVEN: A connected client
    let peer = TestPeer::start().await;
    let mut client = connected_client(&peer).await;
    assert_eq!(client.state(), LinkState::Connected);

    // WHEN: Closing twice
    client.close_connection().await.unwrap();
    client.close_connection().await.unwrap();

    // THEN: Closed, operations refused
    assert_eq!(client.state(), LinkState::Closed);
    assert!(matches!(client.exec("x").await, Err(LinkError::State { .. })));

    // AND: A fresh connection works
    client.establish_connection().await.unwrap();
    assert_eq!(client.state(), LinkState::Connected);
    client.exec("x").await.unwrap();
    assert_eq!(peer.connections(), 2);
}

#[tokio::test]
async fn given_connected_client_when_established_again_then_returns_connection_error() {
    // GIVEN: A connected client
    let peer = TestPeer::start().await;
    let mut client = connected_client(&peer).await;

    // WHEN: Connecting again without closing
    let result = client.establish_connection().await;

    // THEN: Connection error, original connection intact
    assert!(matches!(result, Err(LinkError::Connection { .. })));
    assert_eq!(client.state(), LinkState::Connected);
    client.exec("still here").await.unwrap();
}

#[tokio::test]
async fn given_nothing_listening_when_establish_connection_then_returns_connection_error() {
    // GIVEN: A port with no listener
    let port = unused_port().await;
    let mut client = JvmLinkClient::new(config_for(port));

    // WHEN/THEN: Connection error, state unchanged
    let result = client.establish_connection().await;
    assert!(matches!(result, Err(LinkError::Connection { .. })));
    assert_eq!(client.state(), LinkState::Unstarted);
}

/// **VALUE**: Attaching to a peer this client did not start never marks it as owned.
///
/// **WHY THIS MATTERS**: Only owned peers are terminated. Misclassifying an external peer
/// would kill a process someone else depends on.
///
/// **BUG THIS CATCHES**: Would catch discovery reporting `owned = true`.
#[tokio::test]
async fn given_external_peer_when_connected_then_not_owned() {
    // GIVEN: A peer running inside this test process
    let peer = TestPeer::start().await;

    // WHEN: Attaching to it
    let client = connected_client(&peer).await;

    // THEN: Not owned; when identified, it is this process on that port
    assert!(!client.owns_peer());
    if let Some(info) = client.peer_info() {
        assert!(!info.owned);
        assert_eq!(info.port, peer.port());
        assert_eq!(info.pid, std::process::id());
    }
}

#[tokio::test]
async fn given_external_peer_when_shut_java_then_sends_bye_and_closes() {
    // GIVEN: A connected client to an external peer
    let peer = TestPeer::start().await;
    let mut client = connected_client(&peer).await;

    // WHEN: Shutting the peer down
    client.shut_java().await.unwrap();

    // THEN: BYE delivered, connection closed
    assert!(peer.wait_for_bye(WAIT).await);
    assert_eq!(client.state(), LinkState::Closed);
}

// ============================================================================
// Raw messages
// ============================================================================

#[tokio::test]
async fn given_connected_client_when_sending_raw_values_then_peer_receives_exact_bytes() {
    // GIVEN: A recording peer
    let peer = RawPeer::start(Vec::new()).await;
    let mut client = JvmLinkClient::new(config_for(peer.port()));
    client.establish_connection().await.unwrap();

    // WHEN: Sending a string and an integer
    client.send_message("hi").await.unwrap();
    client.send_int(258).await.unwrap();

    // THEN: Length-prefixed string followed by a little-endian int
    let received = peer.wait_for_bytes(10, WAIT).await;
    assert_eq!(received, vec![2, 0, 0, 0, b'h', b'i', 2, 1, 0, 0]);
}

#[tokio::test]
async fn given_peer_reply_when_reading_raw_values_then_decodes_in_order() {
    // GIVEN: A peer that sends a string, an int and 3 raw bytes
    let mut reply = 5i32.to_le_bytes().to_vec();
    reply.extend_from_slice(b"hello");
    reply.extend_from_slice(&(-7i32).to_le_bytes());
    reply.extend_from_slice(&[9, 8, 7]);

    let peer = RawPeer::start(reply).await;
    let mut client = JvmLinkClient::new(config_for(peer.port()));
    client.establish_connection().await.unwrap();

    // WHEN/THEN: Each read returns its part
    assert_eq!(client.read_message().await.unwrap(), "hello");
    assert_eq!(client.read_int().await.unwrap(), -7);
    assert_eq!(client.read_bytes(3).await.unwrap(), vec![9, 8, 7]);
}

/// **VALUE**: An oversized declared length is refused as an Io error.
///
/// **WHY THIS MATTERS**: The length comes from the peer; trusting it lets one bad frame
/// exhaust memory.
///
/// **BUG THIS CATCHES**: Would catch the configured limit not reaching the decoder.
#[tokio::test]
async fn given_declared_length_over_max_when_read_message_then_returns_io_error() {
    // GIVEN: A 64-byte limit and a peer declaring 65 bytes
    let peer = RawPeer::start(65i32.to_le_bytes().to_vec()).await;
    let mut config = config_for(peer.port());
    config.connection.max_message_bytes = 64;
    let mut client = JvmLinkClient::new(config);
    client.establish_connection().await.unwrap();

    // WHEN/THEN: Io error
    let result = client.read_message().await;
    assert!(matches!(result, Err(LinkError::Io { .. })));
}

#[tokio::test]
async fn given_negative_declared_length_when_read_message_then_returns_io_error() {
    let peer = RawPeer::start(i32::MIN.to_le_bytes().to_vec()).await;
    let mut client = JvmLinkClient::new(config_for(peer.port()));
    client.establish_connection().await.unwrap();

    let result = client.read_message().await;
    assert!(matches!(result, Err(LinkError::Io { .. })));
}

#[tokio::test]
async fn given_silent_peer_when_read_message_then_times_out_with_io_error() {
    // GIVEN: A peer that never replies and a short I/O timeout
    let peer = RawPeer::start(Vec::new()).await;
    let mut config = config_for(peer.port());
    config.connection.io_timeout_ms = 200;
    let mut client = JvmLinkClient::new(config);
    client.establish_connection().await.unwrap();

    // WHEN/THEN: Io error after the timeout
    match client.read_message().await {
        Err(LinkError::Io { message, .. }) => assert!(message.contains("did not complete")),
        other => panic!("Expected Io timeout, got {other:?}"),
    }
}

// ============================================================================
// Broken links
// ============================================================================

/// **VALUE**: A reply that arrives after the I/O timeout is never handed to a later request.
///
/// **WHY THIS MATTERS**: After a timeout the late reply is still on its way. Reading the
/// next answer from that socket would return the old variable's value under a new name.
///
/// **BUG THIS CATCHES**: Would catch the client staying Connected after a timeout.
#[tokio::test]
async fn given_reply_later_than_io_timeout_when_get_var_then_link_closes() {
    // GIVEN: A peer that answers the first GET with int 1, 400 ms late
    let mut reply = TYPE_INT.to_le_bytes().to_vec();
    reply.extend_from_slice(&1i32.to_le_bytes());
    let peer = RawPeer::start_delayed(reply, Duration::from_millis(400)).await;

    let mut config = config_for(peer.port());
    config.connection.io_timeout_ms = 200;
    let mut client = JvmLinkClient::new(config);
    client.establish_connection().await.unwrap();

    // WHEN: The first GET times out
    let first = client.get_var("a").await;

    // THEN: Io error and the link is closed
    assert!(matches!(first, Err(LinkError::Io { .. })));
    assert_eq!(client.state(), LinkState::Closed);

    // AND: A second GET is refused instead of reading the late reply
    tokio::time::sleep(Duration::from_millis(300)).await;
    let second = client.get_var("b").await;
    assert!(matches!(second, Err(LinkError::State { .. })), "got {second:?}");
}

/// **VALUE**: The body of a rejected frame is not decoded as the answer to the next request.
///
/// **WHY THIS MATTERS**: Refusing a length prefix leaves its body unread. Those bytes look
/// like a valid reply to whatever is asked next.
///
/// **BUG THIS CATCHES**: Would catch a GET after a rejected frame returning the leftover
/// body as the variable's value.
#[tokio::test]
async fn given_rejected_length_when_next_request_then_fails_with_state_error() {
    // GIVEN: A 4-byte limit and a peer declaring 8 bytes whose body reads as int 7
    let mut reply = 8i32.to_le_bytes().to_vec();
    reply.extend_from_slice(&TYPE_INT.to_le_bytes());
    reply.extend_from_slice(&7i32.to_le_bytes());
    let peer = RawPeer::start(reply).await;

    let mut config = config_for(peer.port());
    config.connection.max_message_bytes = 4;
    let mut client = JvmLinkClient::new(config);
    client.establish_connection().await.unwrap();

    // WHEN: The frame is rejected
    let rejected = client.read_message().await;
    assert!(matches!(rejected, Err(LinkError::Io { .. })));

    // THEN: The next request does not see the leftover body
    let next = client.get_var("y").await;
    assert!(matches!(next, Err(LinkError::State { .. })), "got {next:?}");
    assert_eq!(client.state(), LinkState::Closed);
}

/// **VALUE**: Failures carried in a complete reply leave the link open.
///
/// **WHY THIS MATTERS**: Only a stream at an unknown offset must be abandoned. Closing on
/// every error would force a reconnect after each typo.
///
/// **BUG THIS CATCHES**: Would catch peer-reported failures and caller mistakes being
/// treated like transport failures.
#[tokio::test]
async fn given_complete_failure_replies_when_handled_then_link_stays_connected() {
    // GIVEN: A connected client
    let peer = TestPeer::start().await;
    let mut client = connected_client(&peer).await;

    // WHEN: The peer fails code, lacks a variable, and the caller over-asks
    let raised = client.exec(RAISE_CODE).await;
    let missing = client.get_var("missing").await;
    let oversized = client.read_bytes(usize::MAX).await;

    // THEN: Each is reported and the link survives
    assert!(matches!(raised, Err(LinkError::Protocol { .. })));
    assert!(matches!(missing, Err(LinkError::NotFound { .. })));
    assert!(matches!(oversized, Err(LinkError::Validation { .. })));
    assert_eq!(client.state(), LinkState::Connected);

    client.set("x", 3).await.unwrap();
    assert_eq!(client.get_var("x").await.unwrap().value(), &VarValue::Int(3));
}

#[tokio::test]
async fn given_link_closed_by_failure_when_reestablished_then_connected_again() {
    // GIVEN: A link closed by a timed-out read
    let peer = RawPeer::start(Vec::new()).await;
    let mut config = config_for(peer.port());
    config.connection.io_timeout_ms = 100;
    let mut client = JvmLinkClient::new(config);
    client.establish_connection().await.unwrap();
    assert!(client.read_int().await.is_err());
    assert_eq!(client.state(), LinkState::Closed);

    // WHEN: The caller closes and reconnects
    client.close_connection().await.unwrap();
    client.establish_connection().await.unwrap();

    // THEN: The client is connected again
    assert_eq!(client.state(), LinkState::Connected);
}

// ============================================================================
// Owned peer lifecycle (needs a POSIX shell)
// ============================================================================

/// **VALUE**: Destroying a client that owns a running peer leaves no peer process behind.
///
/// **WHY THIS MATTERS**: An orphaned peer holds its port and memory forever. Drop is the
/// last line of defence when the caller forgets `shut_java`.
///
/// **BUG THIS CATCHES**: Would catch Drop not terminating the child, or terminating it
/// without reaping so it lingers as a zombie.
#[cfg(unix)]
#[tokio::test]
async fn given_owned_running_peer_when_client_dropped_then_peer_process_gone() {
    // GIVEN: A launched process that announces the test peer's port and never exits
    let peer = TestPeer::start().await;
    let script = format!("echo 'JVMLink listening on port {}'; exec sleep 30", peer.port());
    let mut client = JvmLinkClient::new(config_for(1));

    client
        .start_java(Duration::from_secs(5), &shell_peer(&script), None)
        .await
        .unwrap();

    assert_eq!(client.state(), LinkState::Started);
    assert!(client.owns_peer());
    assert_eq!(client.port(), peer.port(), "announced port overrides config");
    let info = client.peer_info().unwrap().clone();
    assert!(info.owned);
    assert!(is_pid_running(info.pid));

    client.establish_connection().await.unwrap();
    client.set("x", 42).await.unwrap();

    // WHEN: Dropping the client
    drop(client);

    // THEN: The process is gone and the peer was told to exit
    assert!(!is_pid_running(info.pid), "peer must not outlive its client");
    assert!(peer.wait_for_bye(WAIT).await);
}

#[cfg(unix)]
#[tokio::test]
async fn given_owned_running_peer_when_shut_java_then_process_stopped_and_released() {
    // GIVEN: An owned, connected peer
    let peer = TestPeer::start().await;
    let script = format!("echo 'listening on port {}'; exec sleep 30", peer.port());
    let mut client = JvmLinkClient::new(config_for(1));
    client
        .start_java(Duration::from_secs(5), &shell_peer(&script), None)
        .await
        .unwrap();
    let pid = client.peer_info().unwrap().pid;
    client.establish_connection().await.unwrap();

    // WHEN: Shutting down
    client.shut_java().await.unwrap();

    // THEN: BYE sent, process gone, ownership released
    assert!(peer.wait_for_bye(WAIT).await);
    assert!(!is_pid_running(pid));
    assert!(!client.owns_peer());
    assert!(client.peer_info().is_none());
    assert_eq!(client.state(), LinkState::Closed);

    // AND: A second shut_java is a no-op
    client.shut_java().await.unwrap();
}

#[cfg(unix)]
#[tokio::test]
async fn given_peer_that_already_exited_when_shut_java_then_succeeds() {
    // GIVEN: A peer that exits right after announcing readiness
    let mut client = JvmLinkClient::new(config_for(1));
    client
        .start_java(
            Duration::from_secs(5),
            &shell_peer("echo 'listening on port 20999'; exit 0"),
            None,
        )
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    // WHEN/THEN: Shutting down does not fail
    client.shut_java().await.unwrap();
    assert!(!client.owns_peer());
}

#[cfg(unix)]
#[tokio::test]
async fn given_running_owned_peer_when_start_java_again_then_returns_state_error() {
    // GIVEN: An owned peer that is still running
    let mut client = JvmLinkClient::new(config_for(1));
    let command = shell_peer("echo 'listening on port 20998'; exec sleep 30");
    client
        .start_java(Duration::from_secs(5), &command, None)
        .await
        .unwrap();
    let pid = client.peer_info().unwrap().pid;

    // WHEN: Starting again
    let result = client.start_java(Duration::from_secs(5), &command, None).await;

    // THEN: State error, first peer still owned
    assert!(matches!(result, Err(LinkError::State { .. })));
    assert_eq!(client.peer_info().unwrap().pid, pid);

    client.shut_java().await.unwrap();
}

#[cfg(unix)]
#[tokio::test]
async fn given_peer_that_never_signals_when_start_java_then_returns_launch_timeout() {
    // GIVEN: A process that never prints the readiness line
    let mut client = JvmLinkClient::new(config_for(1));

    // WHEN: Starting it with a short timeout
    let result = client
        .start_java(
            Duration::from_millis(300),
            &shell_peer("exec sleep 30"),
            None,
        )
        .await;

    // THEN: Launch timeout, nothing owned
    assert!(matches!(
        result,
        Err(LinkError::Launch(LaunchError::Timeout { .. }))
    ));
    assert!(!client.owns_peer());
    assert_eq!(client.state(), LinkState::Unstarted);
}
