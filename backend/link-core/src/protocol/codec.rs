//! Little-endian encoders and async decoders for JVMLink frames.
//!
//! Encoders append to a `Vec<u8>` so a whole request can be built before any
//! byte reaches the socket. Decoders are generic over [`AsyncRead`] and read
//! exactly what the wire format declares, never more.

use crate::error::link::LinkError;
use crate::protocol::{STATUS_ERROR, STATUS_OK, kind_from_tag};

use common::ErrorLocation;
use models::{VarKind, VarValue};

use std::panic::Location;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Acknowledgement returned by the peer for SET and EXEC.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeerStatus {
    Ok,
    Failed(String),
}

pub fn put_int(buf: &mut Vec<u8>, value: i32) {
    buf.extend_from_slice(&value.to_le_bytes());
}

#[track_caller]
pub fn put_string(buf: &mut Vec<u8>, value: &str) -> Result<(), LinkError> {
    let len = i32::try_from(value.len()).map_err(|_| LinkError::Validation {
        message: format!(
            "String of {} bytes does not fit in an i32 length prefix",
            value.len()
        ),
        location: ErrorLocation::from(Location::caller()),
    })?;

    put_int(buf, len);
    buf.extend_from_slice(value.as_bytes());
    Ok(())
}

#[track_caller]
pub fn put_value(buf: &mut Vec<u8>, value: &VarValue) -> Result<(), LinkError> {
    match value {
        VarValue::Int(v) => buf.extend_from_slice(&v.to_le_bytes()),
        VarValue::String(v) => put_string(buf, v)?,
        VarValue::Byte(v) => buf.push(*v),
        VarValue::Char(c) => {
            let mut units = [0u16; 2];
            let encoded = c.encode_utf16(&mut units);
            if encoded.len() != 1 {
                return Err(LinkError::Validation {
                    message: format!("Character {c:?} needs a surrogate pair"),
                    location: ErrorLocation::from(Location::caller()),
                });
            }
            buf.extend_from_slice(&encoded[0].to_le_bytes());
        }
        VarValue::Float(v) => buf.extend_from_slice(&v.to_le_bytes()),
        VarValue::Bool(v) => buf.push(u8::from(*v)),
        VarValue::Double(v) => buf.extend_from_slice(&v.to_le_bytes()),
        VarValue::Long(v) => buf.extend_from_slice(&v.to_le_bytes()),
        VarValue::Short(v) => buf.extend_from_slice(&v.to_le_bytes()),
    }

    Ok(())
}

/// Write a fully encoded frame and flush it.
pub async fn write_frame<W>(writer: &mut W, frame: &[u8]) -> Result<(), LinkError>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(frame).await?;
    writer.flush().await?;
    Ok(())
}

pub async fn read_int<R>(reader: &mut R) -> Result<i32, LinkError>
where
    R: AsyncRead + Unpin,
{
    Ok(reader.read_i32_le().await?)
}

/// Check a declared length before anything is allocated.
fn checked_length(declared: i32, max: usize) -> Result<usize, String> {
    let len = usize::try_from(declared).map_err(|_| format!("Negative length prefix {declared}"))?;

    if len > max {
        return Err(format!("Declared length {len} exceeds maximum of {max} bytes"));
    }

    Ok(len)
}

async fn read_utf8<R>(reader: &mut R, len: usize) -> Result<String, LinkError>
where
    R: AsyncRead + Unpin,
{
    let mut body = vec![0u8; len];
    reader.read_exact(&mut body).await?;

    String::from_utf8(body).map_err(|e| LinkError::Protocol {
        message: format!("String payload is not valid UTF-8: {e}"),
        location: ErrorLocation::from(Location::caller()),
    })
}

/// Read a raw length-prefixed string. A bad length prefix is an
/// [`LinkError::Io`] failure of the stream.
pub async fn read_string<R>(reader: &mut R, max: usize) -> Result<String, LinkError>
where
    R: AsyncRead + Unpin,
{
    let declared = read_int(reader).await?;
    let len = checked_length(declared, max).map_err(|message| LinkError::Io {
        message,
        location: ErrorLocation::from(Location::caller()),
    })?;

    read_utf8(reader, len).await
}

/// A string embedded in a GET reply or an acknowledgement. A bad length
/// prefix there is a malformed reply, so it is a [`LinkError::Protocol`] failure.
async fn read_reply_string<R>(reader: &mut R, max: usize) -> Result<String, LinkError>
where
    R: AsyncRead + Unpin,
{
    let declared = read_int(reader).await?;
    let len = checked_length(declared, max).map_err(|message| LinkError::Protocol {
        message: format!("Malformed reply: {message}"),
        location: ErrorLocation::from(Location::caller()),
    })?;

    read_utf8(reader, len).await
}

/// Read exactly `size` bytes. `size` is caller-chosen, but still bounded by `max`.
pub async fn read_bytes<R>(reader: &mut R, size: usize, max: usize) -> Result<Vec<u8>, LinkError>
where
    R: AsyncRead + Unpin,
{
    if size > max {
        return Err(LinkError::Validation {
            message: format!("Requested {size} bytes exceeds maximum of {max} bytes"),
            location: ErrorLocation::from(Location::caller()),
        });
    }

    let mut body = vec![0u8; size];
    reader.read_exact(&mut body).await?;
    Ok(body)
}

/// Decode a value whose type tag has already been read.
pub async fn read_value<R>(reader: &mut R, tag: i32, max: usize) -> Result<VarValue, LinkError>
where
    R: AsyncRead + Unpin,
{
    let kind = kind_from_tag(tag).ok_or_else(|| LinkError::Protocol {
        message: format!("Unknown or unsupported type tag {tag}"),
        location: ErrorLocation::from(Location::caller()),
    })?;

    let value = match kind {
        VarKind::Int => VarValue::Int(reader.read_i32_le().await?),
        VarKind::String => VarValue::String(read_reply_string(reader, max).await?),
        VarKind::Byte => VarValue::Byte(reader.read_u8().await?),
        VarKind::Char => {
            let unit = reader.read_u16_le().await?;
            let c = char::from_u32(u32::from(unit)).ok_or_else(|| LinkError::Protocol {
                message: format!("Character value {unit:#06x} is an unpaired surrogate"),
                location: ErrorLocation::from(Location::caller()),
            })?;
            VarValue::Char(c)
        }
        VarKind::Float => VarValue::Float(reader.read_f32_le().await?),
        VarKind::Bool => match reader.read_u8().await? {
            0 => VarValue::Bool(false),
            1 => VarValue::Bool(true),
            other => {
                return Err(LinkError::Protocol {
                    message: format!("Boolean byte must be 0 or 1, got {other}"),
                    location: ErrorLocation::from(Location::caller()),
                });
            }
        },
        VarKind::Double => VarValue::Double(reader.read_f64_le().await?),
        VarKind::Long => VarValue::Long(reader.read_i64_le().await?),
        VarKind::Short => VarValue::Short(reader.read_i16_le().await?),
    };

    Ok(value)
}

pub async fn read_status<R>(reader: &mut R, max: usize) -> Result<PeerStatus, LinkError>
where
    R: AsyncRead + Unpin,
{
    match read_int(reader).await? {
        STATUS_OK => Ok(PeerStatus::Ok),
        STATUS_ERROR => Ok(PeerStatus::Failed(read_reply_string(reader, max).await?)),
        other => Err(LinkError::Protocol {
            message: format!("Unknown acknowledgement status {other}"),
            location: ErrorLocation::from(Location::caller()),
        }),
    }
}
