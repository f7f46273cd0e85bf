//! Named, typed values exchanged with the peer.
//!
//! A [`Variable`] is always one of a fixed set of primitive kinds. There are
//! no composite or nested values: arrays and objects stay on the peer side.

use crate::error::model_error::ModelError;
use crate::ErrorLocation;

use std::fmt::{Display, Formatter, Result as FormatResult};
use std::panic::Location;

/// The primitive kinds a [`Variable`] can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VarKind {
    Int,
    String,
    Byte,
    Char,
    Float,
    Bool,
    Double,
    Long,
    Short,
}

impl VarKind {
    pub const ALL: [VarKind; 9] = [
        VarKind::Int,
        VarKind::String,
        VarKind::Byte,
        VarKind::Char,
        VarKind::Float,
        VarKind::Bool,
        VarKind::Double,
        VarKind::Long,
        VarKind::Short,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            VarKind::Int => "int",
            VarKind::String => "string",
            VarKind::Byte => "byte",
            VarKind::Char => "char",
            VarKind::Float => "float",
            VarKind::Bool => "bool",
            VarKind::Double => "double",
            VarKind::Long => "long",
            VarKind::Short => "short",
        }
    }
}

impl Display for VarKind {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> FormatResult {
        formatter.write_str(self.as_str())
    }
}

/// A primitive value tagged with its kind.
#[derive(Debug, Clone, PartialEq)]
pub enum VarValue {
    Int(i32),
    String(String),
    Byte(u8),
    Char(char),
    Float(f32),
    Bool(bool),
    Double(f64),
    Long(i64),
    Short(i16),
}

impl VarValue {
    pub fn kind(&self) -> VarKind {
        match self {
            VarValue::Int(_) => VarKind::Int,
            VarValue::String(_) => VarKind::String,
            VarValue::Byte(_) => VarKind::Byte,
            VarValue::Char(_) => VarKind::Char,
            VarValue::Float(_) => VarKind::Float,
            VarValue::Bool(_) => VarKind::Bool,
            VarValue::Double(_) => VarKind::Double,
            VarValue::Long(_) => VarKind::Long,
            VarValue::Short(_) => VarKind::Short,
        }
    }
}

impl Display for VarValue {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> FormatResult {
        match self {
            VarValue::Int(v) => write!(formatter, "{v}"),
            VarValue::String(v) => write!(formatter, "{v:?}"),
            VarValue::Byte(v) => write!(formatter, "{v:#04x}"),
            VarValue::Char(v) => write!(formatter, "{v:?}"),
            VarValue::Float(v) => write!(formatter, "{v}"),
            VarValue::Bool(v) => write!(formatter, "{v}"),
            VarValue::Double(v) => write!(formatter, "{v}"),
            VarValue::Long(v) => write!(formatter, "{v}"),
            VarValue::Short(v) => write!(formatter, "{v}"),
        }
    }
}

impl From<i32> for VarValue {
    fn from(value: i32) -> Self {
        VarValue::Int(value)
    }
}

impl From<String> for VarValue {
    fn from(value: String) -> Self {
        VarValue::String(value)
    }
}

impl From<&str> for VarValue {
    fn from(value: &str) -> Self {
        VarValue::String(value.to_string())
    }
}

impl From<u8> for VarValue {
    fn from(value: u8) -> Self {
        VarValue::Byte(value)
    }
}

impl From<char> for VarValue {
    fn from(value: char) -> Self {
        VarValue::Char(value)
    }
}

impl From<f32> for VarValue {
    fn from(value: f32) -> Self {
        VarValue::Float(value)
    }
}

impl From<bool> for VarValue {
    fn from(value: bool) -> Self {
        VarValue::Bool(value)
    }
}

impl From<f64> for VarValue {
    fn from(value: f64) -> Self {
        VarValue::Double(value)
    }
}

impl From<i64> for VarValue {
    fn from(value: i64) -> Self {
        VarValue::Long(value)
    }
}

impl From<i16> for VarValue {
    fn from(value: i16) -> Self {
        VarValue::Short(value)
    }
}

/// A named value bound on the peer.
///
/// Construction validates the invariants the peer relies on:
/// - the name is non-empty
/// - a `Char` fits in a single UTF-16 code unit (the peer's character type is 16-bit)
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    name: String,
    value: VarValue,
}

impl Variable {
    /// Check a name without building a value, e.g. before asking the peer for it.
    #[track_caller]
    pub fn check_name(name: &str) -> Result<(), ModelError> {
        if name.is_empty() {
            return Err(ModelError::Validation {
                message: String::from("Variable name cannot be empty"),
                location: ErrorLocation::from(Location::caller()),
            });
        }
        Ok(())
    }

    #[track_caller]
    pub fn new(name: impl Into<String>, value: impl Into<VarValue>) -> Result<Self, ModelError> {
        let name = name.into();
        let value = value.into();

        Self::check_name(&name)?;

        if let VarValue::Char(c) = value
            && c.len_utf16() != 1
        {
            return Err(ModelError::Validation {
                message: format!(
                    "Character {c:?} in '{name}' does not fit in a single UTF-16 code unit"
                ),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        Ok(Self { name, value })
    }

    #[track_caller]
    pub fn int(name: impl Into<String>, value: i32) -> Result<Self, ModelError> {
        Self::new(name, value)
    }

    #[track_caller]
    pub fn string(name: impl Into<String>, value: impl Into<String>) -> Result<Self, ModelError> {
        Self::new(name, VarValue::String(value.into()))
    }

    #[track_caller]
    pub fn byte(name: impl Into<String>, value: u8) -> Result<Self, ModelError> {
        Self::new(name, value)
    }

    #[track_caller]
    pub fn char(name: impl Into<String>, value: char) -> Result<Self, ModelError> {
        Self::new(name, value)
    }

    #[track_caller]
    pub fn float(name: impl Into<String>, value: f32) -> Result<Self, ModelError> {
        Self::new(name, value)
    }

    #[track_caller]
    pub fn bool(name: impl Into<String>, value: bool) -> Result<Self, ModelError> {
        Self::new(name, value)
    }

    #[track_caller]
    pub fn double(name: impl Into<String>, value: f64) -> Result<Self, ModelError> {
        Self::new(name, value)
    }

    #[track_caller]
    pub fn long(name: impl Into<String>, value: i64) -> Result<Self, ModelError> {
        Self::new(name, value)
    }

    #[track_caller]
    pub fn short(name: impl Into<String>, value: i16) -> Result<Self, ModelError> {
        Self::new(name, value)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &VarValue {
        &self.value
    }

    pub fn kind(&self) -> VarKind {
        self.value.kind()
    }

    pub fn into_parts(self) -> (String, VarValue) {
        (self.name, self.value)
    }
}

impl Display for Variable {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> FormatResult {
        write!(formatter, "{} = {} ({})", self.name, self.value, self.kind())
    }
}
