//! Line-driven session against a connected peer.
//!
//! ```text
//! :get NAME   print the peer's value of NAME
//! :quit       end the session
//! anything    sent verbatim to the peer with exec
//! ```

use crate::error::AppError;

use common::ErrorLocation;
use link_core::JvmLinkClient;
use link_core::error::link::LinkError;

use std::panic::Location;

use log::{debug, warn};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

const GET_PREFIX: &str = ":get";
const QUIT_COMMAND: &str = ":quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    Get(String),
    Quit,
    Exec(String),
}

/// Parse one input line. Blank lines yield `None`.
pub fn parse_line(line: &str) -> Option<SessionCommand> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }

    if trimmed == QUIT_COMMAND {
        return Some(SessionCommand::Quit);
    }

    if let Some(rest) = trimmed.strip_prefix(GET_PREFIX)
        && (rest.is_empty() || rest.starts_with(char::is_whitespace))
    {
        return Some(SessionCommand::Get(rest.trim().to_string()));
    }

    Some(SessionCommand::Exec(line.trim_end_matches(['\r', '\n']).to_string()))
}

/// Whether an error kind can leave the link usable for the next command.
///
/// The client still closes the link when a `Protocol` error came from a reply
/// it could not decode, so [`run`] also checks the client state.
pub fn is_recoverable(error: &LinkError) -> bool {
    matches!(
        error,
        LinkError::Protocol { .. } | LinkError::NotFound { .. } | LinkError::Validation { .. }
    )
}

/// Run commands from `input` until `:quit` or end of input.
///
/// Values and peer-reported failures are written to `output`. Transport or
/// state failures, and any failure that closed the link, end the session with
/// an error.
pub async fn run<R, W>(client: &mut JvmLinkClient, input: R, output: &mut W) -> Result<(), AppError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();

    while let Some(line) = lines.next_line().await.map_err(|e| AppError::App {
        message: format!("Failed to read input: {e}"),
        location: ErrorLocation::from(Location::caller()),
    })? {
        let Some(command) = parse_line(&line) else {
            continue;
        };

        debug!("Session command: {command:?}");

        let outcome = match command {
            SessionCommand::Quit => break,
            SessionCommand::Get(name) => match client.get_var(&name).await {
                Ok(variable) => format!("{variable}\n"),
                Err(e) => recover(client, e)?,
            },
            SessionCommand::Exec(code) => match client.exec(&code).await {
                Ok(()) => continue,
                Err(e) => recover(client, e)?,
            },
        };

        write_output(output, &outcome).await?;
    }

    Ok(())
}

fn recover(client: &JvmLinkClient, error: LinkError) -> Result<String, AppError> {
    if is_recoverable(&error) && client.state().is_connected() {
        warn!("{error}");
        return Ok(format!("error: {error}\n"));
    }
    Err(error.into())
}

async fn write_output<W>(output: &mut W, text: &str) -> Result<(), AppError>
where
    W: AsyncWrite + Unpin,
{
    output
        .write_all(text.as_bytes())
        .await
        .map_err(|e| AppError::App {
            message: format!("Failed to write output: {e}"),
            location: ErrorLocation::from(Location::caller()),
        })?;

    output.flush().await.map_err(|e| AppError::App {
        message: format!("Failed to flush output: {e}"),
        location: ErrorLocation::from(Location::caller()),
    })
}
