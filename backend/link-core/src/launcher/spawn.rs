use crate::DEFAULT_READY_PATTERN;
use crate::error::launch::LaunchError;

use common::ErrorLocation;

use std::fmt::{Display, Formatter, Result as FormatResult};
use std::io::Error as IoError;
use std::io::ErrorKind;
use std::panic::Location;
use std::path::Path;
use std::process::Stdio;
use std::sync::OnceLock;
use std::thread::sleep;
use std::time::Duration;

use backoff::{ExponentialBackoff, backoff::Backoff};
use log::{debug, info, trace, warn};
use regex::Regex;
use tokio::io::{AsyncBufReadExt, BufReader, Lines};
use tokio::process::Child as TokioChild;
use tokio::process::ChildStdout;
use tokio::process::Command as TokioCommand;
use tokio::spawn as TokioSpawn;
use tokio::time::timeout as TokioTimeout;

const SPAWN_MAX_OUTPUT_LINES: usize = 200;
const READY_CAPTURE_PORT: &str = "port";
const KILL_VERIFY_MAX_ELAPSED: Duration = Duration::from_secs(5);
const EXIT_POLL_INITIAL_INTERVAL: Duration = Duration::from_millis(10);

static READY_REGEX: OnceLock<Regex> = OnceLock::new();

pub(crate) fn get_ready_regex() -> &'static Regex {
    READY_REGEX.get_or_init(|| Regex::new(DEFAULT_READY_PATTERN).expect("valid regex pattern"))
}

/// Compile a readiness pattern, reusing the cached default when possible.
#[track_caller]
pub fn compile_ready_pattern(pattern: &str) -> Result<Regex, LaunchError> {
    if pattern == DEFAULT_READY_PATTERN {
        return Ok(get_ready_regex().clone());
    }

    Regex::new(pattern).map_err(|e| LaunchError::Validation {
        message: format!("Invalid readiness pattern '{pattern}': {e}"),
        location: ErrorLocation::from(Location::caller()),
    })
}

/// Program and arguments used to start the peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerCommand {
    program: String,
    args: Vec<String>,
}

impl PeerCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Split a command line on whitespace. No quoting is recognised; build the
    /// command with [`PeerCommand::arg`] when an argument contains spaces.
    #[track_caller]
    pub fn from_command_line(line: &str) -> Result<Self, LaunchError> {
        let mut parts = line.split_whitespace();

        let program = parts.next().ok_or_else(|| LaunchError::Validation {
            message: String::from("Peer command line cannot be empty"),
            location: ErrorLocation::from(Location::caller()),
        })?;

        Ok(Self::new(program).args(parts))
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn arguments(&self) -> &[String] {
        &self.args
    }

    /// File name of the program, used to label the peer in logs.
    pub fn program_name(&self) -> String {
        Path::new(&self.program)
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.program.clone())
    }
}

impl Display for PeerCommand {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> FormatResult {
        formatter.write_str(&self.program)?;
        for arg in &self.args {
            write!(formatter, " {arg}")?;
        }
        Ok(())
    }
}

pub(crate) fn build_peer_command(command: &PeerCommand, working_dir: Option<&Path>) -> TokioCommand {
    let mut cmd = TokioCommand::new(&command.program);
    cmd.args(&command.args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    if let Some(dir) = working_dir {
        cmd.current_dir(dir);
    }

    cmd
}

/// A peer process started by this client.
///
/// Dropping a `PeerProcess` kills the child (`kill_on_drop`), but callers are
/// expected to go through [`PeerProcess::shutdown`] or
/// [`PeerProcess::terminate_blocking`] so the exit is observed and reaped.
#[derive(Debug)]
pub struct PeerProcess {
    child: TokioChild,
    pid: u32,
    reported_port: Option<u16>,
    command_line: String,
    program_name: String,
}

impl PeerProcess {
    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Port announced on the readiness line, if the pattern captured one.
    pub fn reported_port(&self) -> Option<u16> {
        self.reported_port
    }

    pub fn command_line(&self) -> &str {
        &self.command_line
    }

    pub fn program_name(&self) -> &str {
        &self.program_name
    }

    pub fn has_exited(&mut self) -> bool {
        match self.child.try_wait() {
            Ok(Some(status)) => {
                debug!("Peer (PID: {}) has exited: {status}", self.pid);
                true
            }
            Ok(None) => false,
            Err(e) => {
                debug!("Failed to poll peer (PID: {}): {e}", self.pid);
                false
            }
        }
    }

    /// Wait up to `grace` for the peer to exit on its own, then kill it.
    ///
    /// Returns `true` once the process is known to be gone.
    pub async fn shutdown(&mut self, grace: Duration) -> bool {
        match TokioTimeout(grace, self.child.wait()).await {
            Ok(Ok(status)) => {
                info!("Peer (PID: {}) exited: {status}", self.pid);
                return true;
            }
            Ok(Err(e)) => warn!("Failed to wait for peer (PID: {}): {e}", self.pid),
            Err(_) => debug!(
                "Peer (PID: {}) still running after {grace:?}, killing",
                self.pid
            ),
        }

        match self.child.kill().await {
            Ok(()) => {
                info!("Killed peer (PID: {})", self.pid);
                true
            }
            Err(e) => {
                warn!("Failed to kill peer (PID: {}): {e}", self.pid);
                self.has_exited()
            }
        }
    }

    /// Synchronous shutdown for use from `Drop`.
    ///
    /// Polls for a graceful exit with exponential backoff for up to `grace`,
    /// then kills the child and polls again until it has been reaped.
    pub fn terminate_blocking(&mut self, grace: Duration) -> bool {
        if self.poll_exit(grace) {
            return true;
        }

        debug!("Peer (PID: {}) still running after {grace:?}, killing", self.pid);

        if let Err(e) = self.child.start_kill() {
            warn!("Failed to kill peer (PID: {}): {e}", self.pid);
        }

        let exited = self.poll_exit(KILL_VERIFY_MAX_ELAPSED);
        if !exited {
            warn!(
                "Peer (PID: {}) still running after {KILL_VERIFY_MAX_ELAPSED:?}",
                self.pid
            );
        }
        exited
    }

    fn poll_exit(&mut self, max_elapsed: Duration) -> bool {
        let mut backoff = ExponentialBackoff {
            initial_interval: EXIT_POLL_INITIAL_INTERVAL,
            max_elapsed_time: Some(max_elapsed),
            ..Default::default()
        };

        loop {
            match self.child.try_wait() {
                Ok(Some(status)) => {
                    debug!("Peer (PID: {}) exited: {status}", self.pid);
                    return true;
                }
                Ok(None) => {}
                Err(e) => {
                    debug!("Failed to poll peer (PID: {}): {e}", self.pid);
                    return false;
                }
            }

            match backoff.next_backoff() {
                Some(duration) => {
                    trace!("Peer (PID: {}) still alive, retrying after {duration:?}", self.pid);
                    sleep(duration);
                }
                None => return false,
            }
        }
    }
}

/// Spawn the peer and wait until it announces readiness.
///
/// The peer's stdout is scanned line by line for `ready_pattern`. If the
/// pattern has a `port` capture group, the captured port is returned through
/// [`PeerProcess::reported_port`].
///
/// # Errors
///
/// * [`LaunchError::Spawn`] - the command could not be started
/// * [`LaunchError::Exited`] - stdout closed before the readiness line
/// * [`LaunchError::Readiness`] - no readiness line in the first lines of output
/// * [`LaunchError::Timeout`] - no readiness within `startup_timeout`
///
/// On every error path the child is killed before returning.
pub async fn launch_peer(
    command: &PeerCommand,
    working_dir: Option<&Path>,
    startup_timeout: Duration,
    ready_pattern: &Regex,
) -> Result<PeerProcess, LaunchError> {
    info!("Launching peer: {command}");

    let mut child = spawn_peer_process(command, working_dir)?;
    let pid = child.id().unwrap_or_default();

    let stdout = match child.stdout.take() {
        Some(stdout) => stdout,
        None => {
            let _ = child.kill().await;
            return Err(LaunchError::Readiness {
                message: String::from("Child process has no stdout"),
                location: ErrorLocation::from(Location::caller()),
            });
        }
    };

    if let Some(stderr) = child.stderr.take() {
        TokioSpawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                trace!("Peer stderr: {line}");
            }
        });
    }

    let mut lines = BufReader::new(stdout).lines();

    let reported_port =
        match TokioTimeout(startup_timeout, wait_for_ready(&mut lines, ready_pattern)).await {
            Ok(Ok(port)) => port,
            Ok(Err(e)) => {
                warn!("Peer (PID: {pid}) failed to become ready, killing it");
                let _ = child.kill().await;
                return Err(e);
            }
            Err(_) => {
                warn!("Peer (PID: {pid}) not ready within {startup_timeout:?}, killing it");
                let _ = child.kill().await;
                return Err(LaunchError::Timeout {
                    message: format!(
                        "Peer '{command}' did not signal readiness within {startup_timeout:?}"
                    ),
                    location: ErrorLocation::from(Location::caller()),
                });
            }
        };

    // A peer that keeps logging must never block on a full stdout pipe.
    TokioSpawn(async move {
        while let Ok(Some(line)) = lines.next_line().await {
            trace!("Peer output: {line}");
        }
    });

    info!("Peer ready (PID: {pid}, announced port: {reported_port:?})");

    Ok(PeerProcess {
        child,
        pid,
        reported_port,
        command_line: command.to_string(),
        program_name: command.program_name(),
    })
}

#[track_caller]
fn spawn_peer_process(
    command: &PeerCommand,
    working_dir: Option<&Path>,
) -> Result<TokioChild, LaunchError> {
    if let Some(dir) = working_dir
        && !dir.is_dir()
    {
        return Err(LaunchError::Spawn {
            message: format!("Working directory does not exist: {}", dir.display()),
            location: ErrorLocation::from(Location::caller()),
            source: Box::new(IoError::new(ErrorKind::NotFound, "no such directory")),
        });
    }

    match build_peer_command(command, working_dir).spawn() {
        Ok(child) => {
            info!("Spawned {} (PID: {:?})", command.program(), child.id());
            Ok(child)
        }
        Err(err) => Err(LaunchError::Spawn {
            message: format!("Failed to spawn '{command}': {err}"),
            location: ErrorLocation::from(Location::caller()),
            source: Box::new(err),
        }),
    }
}

async fn wait_for_ready(
    lines: &mut Lines<BufReader<ChildStdout>>,
    ready_pattern: &Regex,
) -> Result<Option<u16>, LaunchError> {
    for _ in 0..SPAWN_MAX_OUTPUT_LINES {
        match lines.next_line().await {
            Ok(Some(line)) => {
                trace!("Peer output: {line}");

                if let Some(cap) = ready_pattern.captures(&line) {
                    let port = cap.name(READY_CAPTURE_PORT).and_then(|m| {
                        match m.as_str().parse::<u16>() {
                            Ok(port) if port != 0 => Some(port),
                            Ok(_) => {
                                warn!("Peer announced port 0, keeping configured port");
                                None
                            }
                            Err(e) => {
                                warn!("Failed to parse announced port '{}': {e}", m.as_str());
                                None
                            }
                        }
                    });

                    debug!("Readiness line matched: {line}");
                    return Ok(port);
                }
            }
            Ok(None) => {
                return Err(LaunchError::Exited {
                    message: String::from("Peer closed its output before signalling readiness"),
                    location: ErrorLocation::from(Location::caller()),
                });
            }
            Err(e) => {
                return Err(LaunchError::Readiness {
                    message: format!("Failed to read peer output: {e}"),
                    location: ErrorLocation::from(Location::caller()),
                });
            }
        }
    }

    Err(LaunchError::Readiness {
        message: format!("No readiness line found in first {SPAWN_MAX_OUTPUT_LINES} lines of output"),
        location: ErrorLocation::from(Location::caller()),
    })
}
