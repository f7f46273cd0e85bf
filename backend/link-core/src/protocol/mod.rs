//! JVMLink wire protocol.
//!
//! One TCP connection carries synchronous request/response pairs. Every
//! multi-byte number is **little-endian**; tags and lengths are 4-byte signed
//! words. See `docs/protocol.md` for the full description.
//!
//! # Requests
//!
//! ```text
//! SET  : [CMD_SETVAR:i32][name:str][type:i32][value]   -> [status:i32]([message:str])
//! GET  : [CMD_GETVAR:i32][name:str]                    -> [type:i32][value] | [TYPE_NULL]
//! EXEC : [CMD_EXEC:i32][code:str]                      -> [status:i32]([message:str])
//! BYE  : [CMD_BYE:i32]                                 -> (no response)
//! ```
//!
//! `str` is `[len:i32][len bytes of UTF-8]`.

pub mod codec;

pub use codec::{
    PeerStatus, put_int, put_string, put_value, read_bytes, read_int, read_status, read_string,
    read_value, write_frame,
};

use crate::error::link::LinkError;

use models::{VarKind, Variable};

pub const CMD_BYE: i32 = -1;
pub const CMD_SETVAR: i32 = 0;
pub const CMD_GETVAR: i32 = 1;
pub const CMD_EXEC: i32 = 2;

/// Marker sent instead of a type tag when a GET names an unbound variable.
pub const TYPE_NULL: i32 = -1;
/// Reserved for arrays, which this client never sends and rejects on receipt.
pub const TYPE_ARRAY: i32 = 0;
pub const TYPE_INT: i32 = 1;
pub const TYPE_STRING: i32 = 2;
pub const TYPE_BYTE: i32 = 3;
pub const TYPE_CHAR: i32 = 4;
pub const TYPE_FLOAT: i32 = 5;
pub const TYPE_BOOL: i32 = 6;
pub const TYPE_DOUBLE: i32 = 7;
pub const TYPE_LONG: i32 = 8;
pub const TYPE_SHORT: i32 = 9;

pub const STATUS_OK: i32 = 0;
pub const STATUS_ERROR: i32 = 1;

/// Upper bound for any length-prefixed payload unless configured otherwise.
pub const DEFAULT_MAX_MESSAGE_BYTES: usize = 16 * 1024 * 1024;

pub fn kind_tag(kind: VarKind) -> i32 {
    match kind {
        VarKind::Int => TYPE_INT,
        VarKind::String => TYPE_STRING,
        VarKind::Byte => TYPE_BYTE,
        VarKind::Char => TYPE_CHAR,
        VarKind::Float => TYPE_FLOAT,
        VarKind::Bool => TYPE_BOOL,
        VarKind::Double => TYPE_DOUBLE,
        VarKind::Long => TYPE_LONG,
        VarKind::Short => TYPE_SHORT,
    }
}

pub fn kind_from_tag(tag: i32) -> Option<VarKind> {
    match tag {
        TYPE_INT => Some(VarKind::Int),
        TYPE_STRING => Some(VarKind::String),
        TYPE_BYTE => Some(VarKind::Byte),
        TYPE_CHAR => Some(VarKind::Char),
        TYPE_FLOAT => Some(VarKind::Float),
        TYPE_BOOL => Some(VarKind::Bool),
        TYPE_DOUBLE => Some(VarKind::Double),
        TYPE_LONG => Some(VarKind::Long),
        TYPE_SHORT => Some(VarKind::Short),
        _ => None,
    }
}

/// A request frame. Encoded in full before it is written so a request is
/// never left half-sent by an encoding failure.
#[derive(Debug, Clone, Copy)]
pub enum Request<'a> {
    Set(&'a Variable),
    Get(&'a str),
    Exec(&'a str),
    Bye,
}

impl Request<'_> {
    pub fn command(&self) -> i32 {
        match self {
            Request::Set(_) => CMD_SETVAR,
            Request::Get(_) => CMD_GETVAR,
            Request::Exec(_) => CMD_EXEC,
            Request::Bye => CMD_BYE,
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>, LinkError> {
        let mut buf = Vec::new();
        put_int(&mut buf, self.command());

        match self {
            Request::Set(var) => {
                put_string(&mut buf, var.name())?;
                put_int(&mut buf, kind_tag(var.kind()));
                put_value(&mut buf, var.value())?;
            }
            Request::Get(name) => put_string(&mut buf, name)?,
            Request::Exec(code) => put_string(&mut buf, code)?,
            Request::Bye => {}
        }

        Ok(buf)
    }
}
