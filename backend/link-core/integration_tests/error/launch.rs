use link_core::error::CoreError;
use link_core::error::launch::LaunchError;
use link_core::error::link::LinkError;

use common::ErrorLocation;

use std::error::Error;
use std::io::Error as IoError;
use std::io::ErrorKind;
use std::panic::Location;

/// **VALUE**: Verifies that `LaunchError::Spawn` includes file/line/column location tracking.
///
/// **WHY THIS MATTERS**: Spawning can fail at several points (missing working directory,
/// missing binary). The location tells developers which one.
///
/// **BUG THIS CATCHES**: Would catch the location being dropped from the Display format.
#[test]
fn given_spawn_error_when_formatted_then_includes_location() {
    // GIVEN: A Spawn error with location
    let io_err = IoError::new(ErrorKind::NotFound, "java not found");
    let location = ErrorLocation::from(Location::caller());
    let err = LaunchError::Spawn {
        message: "Failed to spawn 'java -cp loci_tools.jar'".to_string(),
        location,
        source: Box::new(io_err),
    };

    // WHEN: Formatting the error as string
    let error_string = format!("{err}");

    // THEN: Should include error type, message, and file location
    assert!(error_string.contains("Spawn Error"));
    assert!(error_string.contains("Failed to spawn 'java -cp loci_tools.jar'"));
    assert!(error_string.contains("launch.rs"));
}

/// **VALUE**: Verifies that the underlying I/O error stays reachable through `source()`.
///
/// **WHY THIS MATTERS**: Callers inspect the OS error (not found vs permission denied) to
/// tell the user what to fix.
///
/// **BUG THIS CATCHES**: Would catch the `#[source]` attribute being removed.
#[test]
fn given_spawn_error_when_source_requested_then_returns_io_error() {
    // GIVEN: A Spawn error wrapping a permission error
    let err = LaunchError::Spawn {
        message: "Failed to spawn".to_string(),
        location: ErrorLocation::from(Location::caller()),
        source: Box::new(IoError::new(ErrorKind::PermissionDenied, "denied")),
    };

    // WHEN: Walking to the source
    let source = err.source().expect("Spawn error should carry its source");

    // THEN: It is the original I/O error
    let io = source.downcast_ref::<IoError>().unwrap();
    assert_eq!(io.kind(), ErrorKind::PermissionDenied);
}

#[test]
fn given_each_launch_variant_when_formatted_then_has_distinct_prefix() {
    let location = ErrorLocation::from(Location::caller());

    let cases = vec![
        (
            LaunchError::Exited {
                message: "closed".to_string(),
                location,
            },
            "Exited Error: closed",
        ),
        (
            LaunchError::Readiness {
                message: "no line".to_string(),
                location,
            },
            "Readiness Error: no line",
        ),
        (
            LaunchError::Timeout {
                message: "30s".to_string(),
                location,
            },
            "Timeout Error: 30s",
        ),
        (
            LaunchError::Validation {
                message: "empty".to_string(),
                location,
            },
            "Validation Error: empty",
        ),
    ];

    for (err, prefix) in cases {
        assert!(err.to_string().starts_with(prefix), "{err}");
    }
}

/// **VALUE**: A launch failure passes through `LinkError` and `CoreError` unchanged.
///
/// **WHY THIS MATTERS**: Callers match on the launch variant regardless of which layer
/// returned it.
///
/// **BUG THIS CATCHES**: Would catch a wrapper adding its own prefix or losing the variant.
#[test]
fn given_launch_error_when_converted_upward_then_display_is_transparent() {
    // GIVEN: A timeout
    let err = LaunchError::Timeout {
        message: "peer silent".to_string(),
        location: ErrorLocation::from(Location::caller()),
    };
    let expected = err.to_string();

    // WHEN: Converting through both layers
    let link: LinkError = err.into();
    let link_string = link.to_string();
    let core: CoreError = link.into();

    // THEN: Same text, variant preserved
    assert_eq!(link_string, expected);
    assert_eq!(core.to_string(), expected);
    assert!(matches!(
        core,
        CoreError::Link(LinkError::Launch(LaunchError::Timeout { .. }))
    ));
}
