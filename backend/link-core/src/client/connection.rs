use crate::PEER_HOSTNAME;
use crate::config::ConnectionConfig;
use crate::error::link::LinkError;
use crate::protocol::{
    CMD_BYE, PeerStatus, Request, TYPE_NULL, put_int, put_string, read_bytes, read_int,
    read_status, read_string, read_value, write_frame,
};

use common::ErrorLocation;
use models::VarValue;

use std::future::Future;
use std::panic::Location;
use std::time::Duration;

use log::{debug, trace};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::time::timeout as TokioTimeout;

/// The single socket a client holds to its peer.
///
/// Every public operation is one request/response pair bounded by the
/// configured I/O timeout.
#[derive(Debug)]
pub(crate) struct Connection {
    stream: TcpStream,
    address: String,
    io_timeout: Duration,
    max_message_bytes: usize,
}

async fn bounded<F, T>(io_timeout: Duration, operation: &str, future: F) -> Result<T, LinkError>
where
    F: Future<Output = Result<T, LinkError>>,
{
    match TokioTimeout(io_timeout, future).await {
        Ok(result) => result,
        Err(_) => Err(LinkError::Io {
            message: format!("{operation} did not complete within {io_timeout:?}"),
            location: ErrorLocation::from(Location::caller()),
        }),
    }
}

impl Connection {
    pub(crate) async fn open(port: u16, settings: &ConnectionConfig) -> Result<Self, LinkError> {
        let address = format!("{PEER_HOSTNAME}:{port}");
        let connect_timeout = settings.connect_timeout();

        let stream = match TokioTimeout(connect_timeout, TcpStream::connect(&address)).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => {
                return Err(LinkError::Connection {
                    message: format!("Failed to connect to {address}: {e}"),
                    location: ErrorLocation::from(Location::caller()),
                });
            }
            Err(_) => {
                return Err(LinkError::Connection {
                    message: format!("Connecting to {address} timed out after {connect_timeout:?}"),
                    location: ErrorLocation::from(Location::caller()),
                });
            }
        };

        if let Err(e) = stream.set_nodelay(true) {
            debug!("Failed to set TCP_NODELAY on {address}: {e}");
        }

        debug!("Connected to peer at {address}");

        Ok(Self {
            stream,
            address,
            io_timeout: settings.io_timeout(),
            max_message_bytes: settings.max_message_bytes,
        })
    }

    pub(crate) fn address(&self) -> &str {
        &self.address
    }

    /// Send a request and wait for its status acknowledgement.
    pub(crate) async fn acknowledged(
        &mut self,
        request: Request<'_>,
    ) -> Result<PeerStatus, LinkError> {
        let frame = request.encode()?;
        let max = self.max_message_bytes;
        let stream = &mut self.stream;

        trace!("Sending command {} ({} bytes)", request.command(), frame.len());

        bounded(self.io_timeout, "Acknowledged request", async move {
            write_frame(stream, &frame).await?;
            read_status(stream, max).await
        })
        .await
    }

    /// GET a variable. `None` means the peer answered with the null marker.
    pub(crate) async fn fetch(&mut self, name: &str) -> Result<Option<VarValue>, LinkError> {
        let frame = Request::Get(name).encode()?;
        let max = self.max_message_bytes;
        let stream = &mut self.stream;

        bounded(self.io_timeout, "GET request", async move {
            write_frame(stream, &frame).await?;

            let tag = read_int(stream).await?;
            if tag == TYPE_NULL {
                return Ok(None);
            }

            read_value(stream, tag, max).await.map(Some)
        })
        .await
    }

    pub(crate) async fn send_bye(&mut self) -> Result<(), LinkError> {
        let frame = Request::Bye.encode()?;
        let stream = &mut self.stream;
        bounded(self.io_timeout, "BYE", write_frame(stream, &frame)).await
    }

    /// Non-blocking BYE for teardown paths that cannot await.
    pub(crate) fn try_send_bye(&self) -> bool {
        let frame = CMD_BYE.to_le_bytes();

        match self.stream.try_write(&frame) {
            Ok(written) if written == frame.len() => true,
            Ok(written) => {
                debug!("Partial BYE to {} ({written} of {} bytes)", self.address, frame.len());
                false
            }
            Err(e) => {
                debug!("Failed to send BYE to {}: {e}", self.address);
                false
            }
        }
    }

    pub(crate) async fn send_string(&mut self, message: &str) -> Result<(), LinkError> {
        let mut frame = Vec::with_capacity(message.len() + 4);
        put_string(&mut frame, message)?;
        let stream = &mut self.stream;
        bounded(self.io_timeout, "Sending string", write_frame(stream, &frame)).await
    }

    pub(crate) async fn send_int(&mut self, value: i32) -> Result<(), LinkError> {
        let mut frame = Vec::with_capacity(4);
        put_int(&mut frame, value);
        let stream = &mut self.stream;
        bounded(self.io_timeout, "Sending integer", write_frame(stream, &frame)).await
    }

    pub(crate) async fn read_string(&mut self) -> Result<String, LinkError> {
        let max = self.max_message_bytes;
        let stream = &mut self.stream;
        bounded(self.io_timeout, "Reading string", read_string(stream, max)).await
    }

    pub(crate) async fn read_int(&mut self) -> Result<i32, LinkError> {
        let stream = &mut self.stream;
        bounded(self.io_timeout, "Reading integer", read_int(stream)).await
    }

    pub(crate) async fn read_bytes(&mut self, size: usize) -> Result<Vec<u8>, LinkError> {
        let max = self.max_message_bytes;
        let stream = &mut self.stream;
        bounded(self.io_timeout, "Reading bytes", read_bytes(stream, size, max)).await
    }

    pub(crate) async fn shutdown(mut self) {
        if let Err(e) = self.stream.shutdown().await {
            debug!("Socket shutdown for {} failed: {e}", self.address);
        }
        debug!("Connection to {} closed", self.address);
    }
}
