//! Test doubles for client integration tests.
//!
//! - [`TestPeer`]: a loopback peer speaking the JVMLink protocol. It stores
//!   every SET verbatim and echoes it back on GET, fails EXEC of
//!   [`RAISE_CODE`], and records BYE.
//! - [`RawPeer`]: accepts one connection, writes a canned reply (optionally
//!   late), and records every byte the client sends.

use link_core::LinkConfig;
use link_core::launcher::PeerCommand;
use link_core::protocol::{
    CMD_BYE, CMD_EXEC, CMD_GETVAR, CMD_SETVAR, STATUS_ERROR, STATUS_OK, TYPE_BOOL, TYPE_BYTE,
    TYPE_CHAR, TYPE_DOUBLE, TYPE_FLOAT, TYPE_INT, TYPE_LONG, TYPE_NULL, TYPE_SHORT, TYPE_STRING,
};

use std::collections::HashMap;
use std::io::{Error as IoError, ErrorKind};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep};

pub const RAISE_CODE: &str = "raise";
pub const RAISE_MESSAGE: &str = "java.lang.RuntimeException: raise";

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Config pointing at `port` with short timeouts.
pub fn config_for(port: u16) -> LinkConfig {
    let mut config = LinkConfig::default();
    config.connection.port = port;
    config.connection.connect_timeout_ms = 2_000;
    config.connection.io_timeout_ms = 2_000;
    config.peer.startup_timeout_ms = 5_000;
    config.peer.shutdown_grace_ms = 200;
    config
}

/// A `sh -c` peer command.
pub fn shell_peer(script: &str) -> PeerCommand {
    PeerCommand::new("sh").arg("-c").arg(script)
}

/// A local port with nothing listening on it.
pub async fn unused_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap().port()
}

#[derive(Debug, Default)]
pub struct PeerLog {
    pub connections: usize,
    pub commands: Vec<i32>,
    pub execs: Vec<String>,
    pub byes: usize,
}

pub struct TestPeer {
    port: u16,
    log: Arc<Mutex<PeerLog>>,
    task: JoinHandle<()>,
}

impl TestPeer {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let log = Arc::new(Mutex::new(PeerLog::default()));

        let task_log = log.clone();
        let task = tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                task_log.lock().unwrap().connections += 1;
                let conn_log = task_log.clone();
                tokio::spawn(async move {
                    let _ = serve(stream, conn_log).await;
                });
            }
        });

        Self { port, log, task }
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn connections(&self) -> usize {
        self.log.lock().unwrap().connections
    }

    pub fn execs(&self) -> Vec<String> {
        self.log.lock().unwrap().execs.clone()
    }

    pub fn commands(&self) -> Vec<i32> {
        self.log.lock().unwrap().commands.clone()
    }

    /// Wait until a BYE has been received.
    pub async fn wait_for_bye(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if self.log.lock().unwrap().byes > 0 {
                return true;
            }
            sleep(POLL_INTERVAL).await;
        }
        false
    }
}

impl Drop for TestPeer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn read_string(stream: &mut TcpStream) -> std::io::Result<String> {
    let len = stream.read_i32_le().await?;
    let mut body = vec![0u8; len as usize];
    stream.read_exact(&mut body).await?;
    String::from_utf8(body).map_err(|e| IoError::new(ErrorKind::InvalidData, e))
}

async fn write_string(stream: &mut TcpStream, value: &str) -> std::io::Result<()> {
    stream.write_i32_le(value.len() as i32).await?;
    stream.write_all(value.as_bytes()).await
}

/// Read a value exactly as sent so it can be echoed byte for byte.
async fn read_raw_value(stream: &mut TcpStream, tag: i32) -> std::io::Result<Vec<u8>> {
    let width = match tag {
        TYPE_BYTE | TYPE_BOOL => 1,
        TYPE_CHAR | TYPE_SHORT => 2,
        TYPE_INT | TYPE_FLOAT => 4,
        TYPE_DOUBLE | TYPE_LONG => 8,
        TYPE_STRING => {
            let len = stream.read_i32_le().await?;
            let mut raw = len.to_le_bytes().to_vec();
            let mut body = vec![0u8; len as usize];
            stream.read_exact(&mut body).await?;
            raw.extend_from_slice(&body);
            return Ok(raw);
        }
        other => {
            return Err(IoError::new(
                ErrorKind::InvalidData,
                format!("unexpected type tag {other}"),
            ));
        }
    };

    let mut raw = vec![0u8; width];
    stream.read_exact(&mut raw).await?;
    Ok(raw)
}

async fn serve(mut stream: TcpStream, log: Arc<Mutex<PeerLog>>) -> std::io::Result<()> {
    let mut vars: HashMap<String, (i32, Vec<u8>)> = HashMap::new();

    loop {
        let Ok(command) = stream.read_i32_le().await else {
            return Ok(());
        };
        log.lock().unwrap().commands.push(command);

        match command {
            CMD_BYE => {
                log.lock().unwrap().byes += 1;
                return Ok(());
            }
            CMD_SETVAR => {
                let name = read_string(&mut stream).await?;
                let tag = stream.read_i32_le().await?;
                let raw = read_raw_value(&mut stream, tag).await?;
                vars.insert(name, (tag, raw));
                stream.write_i32_le(STATUS_OK).await?;
            }
            CMD_GETVAR => {
                let name = read_string(&mut stream).await?;
                match vars.get(&name) {
                    Some((tag, raw)) => {
                        stream.write_i32_le(*tag).await?;
                        stream.write_all(raw).await?;
                    }
                    None => stream.write_i32_le(TYPE_NULL).await?,
                }
            }
            CMD_EXEC => {
                let code = read_string(&mut stream).await?;
                log.lock().unwrap().execs.push(code.clone());
                if code == RAISE_CODE {
                    stream.write_i32_le(STATUS_ERROR).await?;
                    write_string(&mut stream, RAISE_MESSAGE).await?;
                } else {
                    stream.write_i32_le(STATUS_OK).await?;
                }
            }
            other => {
                return Err(IoError::new(
                    ErrorKind::InvalidData,
                    format!("unexpected command {other}"),
                ));
            }
        }

        stream.flush().await?;
    }
}

pub struct RawPeer {
    port: u16,
    accepted: Arc<AtomicUsize>,
    received: Arc<Mutex<Vec<u8>>>,
    task: JoinHandle<()>,
}

impl RawPeer {
    /// Accept one connection, write `reply`, then record everything received.
    pub async fn start(reply: Vec<u8>) -> Self {
        Self::start_delayed(reply, Duration::ZERO).await
    }

    /// Like [`start`](Self::start), but hold `reply` back for `delay` after accepting.
    /// The listener stays open, so later connects land in its backlog.
    pub async fn start_delayed(reply: Vec<u8>, delay: Duration) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let accepted = Arc::new(AtomicUsize::new(0));
        let received = Arc::new(Mutex::new(Vec::new()));

        let task_accepted = accepted.clone();
        let task_received = received.clone();
        let task = tokio::spawn(async move {
            let Ok((mut stream, _)) = listener.accept().await else {
                return;
            };
            task_accepted.fetch_add(1, Ordering::SeqCst);

            sleep(delay).await;
            if stream.write_all(&reply).await.is_err() {
                return;
            }

            let mut buf = [0u8; 1024];
            while let Ok(n) = stream.read(&mut buf).await {
                if n == 0 {
                    break;
                }
                task_received.lock().unwrap().extend_from_slice(&buf[..n]);
            }
        });

        Self {
            port,
            accepted,
            received,
            task,
        }
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn accepted(&self) -> usize {
        self.accepted.load(Ordering::SeqCst)
    }

    /// Wait until at least `len` bytes have arrived and return them.
    pub async fn wait_for_bytes(&self, len: usize, timeout: Duration) -> Vec<u8> {
        let deadline = Instant::now() + timeout;
        loop {
            let received = self.received.lock().unwrap().clone();
            if received.len() >= len || Instant::now() >= deadline {
                return received;
            }
            sleep(POLL_INTERVAL).await;
        }
    }
}

impl Drop for RawPeer {
    fn drop(&mut self) {
        self.task.abort();
    }
}
