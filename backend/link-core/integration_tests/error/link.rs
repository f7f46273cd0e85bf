use link_core::error::link::LinkError;

use common::ErrorLocation;
use models::Variable;

use std::io::Error as IoError;
use std::io::ErrorKind;
use std::panic::Location;

/// **VALUE**: Every link error kind renders as "<Kind> Error: <message> [file:line:col]".
///
/// **WHY THIS MATTERS**: Logs are the only record of why a session with the peer broke.
/// The kind prefix tells transport trouble from peer-reported trouble at a glance.
///
/// **BUG THIS CATCHES**: Would catch two variants sharing a prefix, or a variant missing
/// its location.
#[test]
fn given_each_link_variant_when_formatted_then_has_kind_message_and_location() {
    // GIVEN: One error of each message-carrying kind
    let location = ErrorLocation::from(Location::caller());
    let cases = vec![
        (
            LinkError::Connection {
                message: "refused".to_string(),
                location,
            },
            "Connection Error: refused",
        ),
        (
            LinkError::State {
                message: "not connected".to_string(),
                location,
            },
            "State Error: not connected",
        ),
        (
            LinkError::Io {
                message: "reset".to_string(),
                location,
            },
            "IO Error: reset",
        ),
        (
            LinkError::Protocol {
                message: "bad tag".to_string(),
                location,
            },
            "Protocol Error: bad tag",
        ),
        (
            LinkError::Validation {
                message: "empty name".to_string(),
                location,
            },
            "Validation Error: empty name",
        ),
    ];

    // WHEN/THEN: Each starts with its kind and ends with the location
    for (err, prefix) in cases {
        let text = err.to_string();
        assert!(text.starts_with(prefix), "{text}");
        assert!(text.contains("link.rs"), "{text}");
    }
}

#[test]
fn given_not_found_error_when_formatted_then_names_variable() {
    let err = LinkError::NotFound {
        name: "imageCount".to_string(),
        location: ErrorLocation::from(Location::caller()),
    };

    let text = err.to_string();

    assert!(text.starts_with("Not Found Error"));
    assert!(text.contains("'imageCount'"));
}

/// **VALUE**: A peer closing the socket mid-frame is reported as a closed connection.
///
/// **WHY THIS MATTERS**: "early eof" means nothing to a user; "connection closed by peer"
/// tells them the JVM went away.
///
/// **BUG THIS CATCHES**: Would catch the UnexpectedEof special case being dropped.
#[test]
fn given_unexpected_eof_when_converted_then_io_error_says_connection_closed() {
    // GIVEN: An EOF error
    let io = IoError::new(ErrorKind::UnexpectedEof, "early eof");

    // WHEN: Converting
    let err = LinkError::from(io);

    // THEN: Io error with a clear message and this file as location
    match err {
        LinkError::Io { message, location } => {
            assert!(message.starts_with("Connection closed by peer"));
            assert!(location.file.contains("link.rs"));
        }
        other => panic!("Expected Io, got {other:?}"),
    }
}

#[test]
fn given_other_io_error_when_converted_then_keeps_original_message() {
    let io = IoError::new(ErrorKind::ConnectionReset, "connection reset by peer");

    let err = LinkError::from(io);

    assert!(matches!(err, LinkError::Io { ref message, .. } if message == "connection reset by peer"));
}

#[test]
fn given_model_validation_error_when_converted_then_becomes_link_validation() {
    // GIVEN: A variable with an empty name
    let model_err = Variable::int("", 1).unwrap_err();

    // WHEN: Converting
    let err = LinkError::from(model_err);

    // THEN: Validation error
    assert!(matches!(err, LinkError::Validation { .. }));
}
