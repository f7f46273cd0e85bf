use crate::error::AppError;
use crate::session::{SessionCommand, is_recoverable, parse_line, run};

use common::ErrorLocation;
use link_core::error::CoreError;
use link_core::error::link::LinkError;
use link_core::{JvmLinkClient, LinkConfig, LinkState};

use std::panic::Location;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

#[test]
fn given_session_lines_when_parsed_then_map_to_commands() {
    assert_eq!(parse_line(":quit"), Some(SessionCommand::Quit));
    assert_eq!(parse_line("  :quit  "), Some(SessionCommand::Quit));
    assert_eq!(
        parse_line(":get imageCount"),
        Some(SessionCommand::Get("imageCount".to_string()))
    );
    assert_eq!(
        parse_line("r.setId(\"a.tif\")"),
        Some(SessionCommand::Exec("r.setId(\"a.tif\")".to_string()))
    );
    assert_eq!(parse_line(""), None);
    assert_eq!(parse_line("   "), None);
}

/// **VALUE**: Only an exact `:get` keyword is a GET; anything else is code for the peer.
///
/// **WHY THIS MATTERS**: Peer code may legitimately start with ":get" as part of a longer
/// identifier. Misreading it would silently skip the exec.
///
/// **BUG THIS CATCHES**: Would catch a plain `starts_with(":get")` check.
#[test]
fn given_get_prefix_without_separator_when_parsed_then_is_exec() {
    assert_eq!(
        parse_line(":getter()"),
        Some(SessionCommand::Exec(":getter()".to_string()))
    );
    assert_eq!(parse_line(":get"), Some(SessionCommand::Get(String::new())));
}

#[test]
fn given_link_errors_when_checked_then_only_peer_reported_ones_are_recoverable() {
    let location = ErrorLocation::from(Location::caller());

    assert!(is_recoverable(&LinkError::Protocol {
        message: String::from("raise"),
        location,
    }));
    assert!(is_recoverable(&LinkError::NotFound {
        name: String::from("x"),
        location,
    }));
    assert!(!is_recoverable(&LinkError::Io {
        message: String::from("reset"),
        location,
    }));
    assert!(!is_recoverable(&LinkError::State {
        message: String::from("closed"),
        location,
    }));
}

#[tokio::test]
async fn given_quit_first_when_run_then_returns_ok_without_touching_client() {
    // GIVEN: An unconnected client and input that quits before any exec
    let mut client = JvmLinkClient::new(LinkConfig::default());
    let input: &[u8] = b"\n:quit\nnever sent\n";
    let mut output = Vec::new();

    // WHEN: Running the session
    let result = run(&mut client, input, &mut output).await;

    // THEN: Ok, nothing printed
    assert!(result.is_ok());
    assert!(output.is_empty());
}

/// **VALUE**: A state failure ends the session with an error instead of looping.
///
/// **WHY THIS MATTERS**: Without a connection every further command would fail the same way.
///
/// **BUG THIS CATCHES**: Would catch State errors being printed and swallowed.
#[tokio::test]
async fn given_unconnected_client_when_run_with_exec_then_returns_state_error() {
    // GIVEN: An unconnected client
    let mut client = JvmLinkClient::new(LinkConfig::default());
    let input: &[u8] = b"do something\n";
    let mut output = Vec::new();

    // WHEN: Running the session
    let result = run(&mut client, input, &mut output).await;

    // THEN: The State error surfaces
    assert!(matches!(
        result,
        Err(AppError::Core(CoreError::Link(LinkError::State { .. })))
    ));
}

/// **VALUE**: A reply the client could not decode ends the session even though its error
/// kind is normally recoverable.
///
/// **WHY THIS MATTERS**: The client closes the link after an undecodable reply. Carrying on
/// would turn every later line into a State error.
///
/// **BUG THIS CATCHES**: Would catch the session printing the error and reading the next line.
#[tokio::test]
async fn given_undecodable_exec_reply_when_run_then_session_ends_with_protocol_error() {
    // GIVEN: A peer that acknowledges EXEC with an unknown status
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let peer = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        stream.write_all(&7i32.to_le_bytes()).await.unwrap();
        let mut sink = Vec::new();
        let _ = stream.read_to_end(&mut sink).await;
    });

    let mut config = LinkConfig::default();
    config.connection.port = port;
    let mut client = JvmLinkClient::new(config);
    client.establish_connection().await.unwrap();

    let input: &[u8] = b"first\nsecond\n";
    let mut output = Vec::new();

    // WHEN: Running the session
    let result = run(&mut client, input, &mut output).await;

    // THEN: The Protocol error ends the session and nothing was printed
    assert!(matches!(
        result,
        Err(AppError::Core(CoreError::Link(LinkError::Protocol { .. })))
    ));
    assert!(output.is_empty());
    assert_eq!(client.state(), LinkState::Closed);

    peer.abort();
}
