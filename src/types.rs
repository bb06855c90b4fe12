//! Core data types for simtrace-rs
//!
//! This module contains the primitive building blocks shared by every
//! decoder.
//!
//! # Main Types
//!
//! - [`ByteOrder`] - Byte order of a trace file (little or big endian)
//! - [`FieldType`] - Enum of primitive field types (u32, f64, etc.)
//! - [`Value`] - A single decoded cell of a table
//!
//! # Field Types
//!
//! Traces are written by C code as packed structs, so every field is one of:
//! - Unsigned integers: u8, u16, u32, u64
//! - Signed integers: i8, i16, i32, i64
//! - Floating point: f32, f64

use serde::{Deserialize, Serialize};

/// Byte order used for every header and payload of one file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ByteOrder {
    Little,
    Big,
}

impl ByteOrder {
    /// Byte order of the host, used when a file gives no usable hint
    #[cfg(target_endian = "little")]
    pub const NATIVE: ByteOrder = ByteOrder::Little;
    #[cfg(target_endian = "big")]
    pub const NATIVE: ByteOrder = ByteOrder::Big;

    /// Candidates tried in order when inferring a file's byte order
    pub const CANDIDATES: [ByteOrder; 2] = [ByteOrder::Little, ByteOrder::Big];
}

impl std::fmt::Display for ByteOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ByteOrder::Little => write!(f, "little-endian"),
            ByteOrder::Big => write!(f, "big-endian"),
        }
    }
}

/// Represents the type of a packed field in a header or payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    /// 8-bit unsigned integer
    U8,
    /// 16-bit unsigned integer
    U16,
    /// 32-bit unsigned integer
    U32,
    /// 64-bit unsigned integer
    U64,
    /// 8-bit signed integer
    I8,
    /// 16-bit signed integer
    I16,
    /// 32-bit signed integer
    I32,
    /// 64-bit signed integer
    I64,
    /// 32-bit floating point
    F32,
    /// 64-bit floating point
    F64,
}

impl FieldType {
    /// Returns the size in bytes of this field type
    pub const fn size_bytes(&self) -> usize {
        match self {
            FieldType::U8 | FieldType::I8 => 1,
            FieldType::U16 | FieldType::I16 => 2,
            FieldType::U32 | FieldType::I32 | FieldType::F32 => 4,
            FieldType::U64 | FieldType::I64 | FieldType::F64 => 8,
        }
    }

    /// Whether values of this type are integers (usable as a discriminator)
    pub fn is_integer(&self) -> bool {
        !matches!(self, FieldType::F32 | FieldType::F64)
    }

    /// Decode a value from the start of `bytes`
    ///
    /// Returns `None` if fewer than [`size_bytes`](Self::size_bytes) bytes are available.
    pub fn decode(&self, bytes: &[u8], order: ByteOrder) -> Option<Value> {
        macro_rules! read {
            ($ty:ty, $n:expr) => {{
                let raw: [u8; $n] = bytes.get(..$n)?.try_into().ok()?;
                match order {
                    ByteOrder::Little => <$ty>::from_le_bytes(raw),
                    ByteOrder::Big => <$ty>::from_be_bytes(raw),
                }
            }};
        }

        Some(match self {
            FieldType::U8 => Value::UInt(read!(u8, 1) as u64),
            FieldType::U16 => Value::UInt(read!(u16, 2) as u64),
            FieldType::U32 => Value::UInt(read!(u32, 4) as u64),
            FieldType::U64 => Value::UInt(read!(u64, 8)),
            FieldType::I8 => Value::Int(read!(i8, 1) as i64),
            FieldType::I16 => Value::Int(read!(i16, 2) as i64),
            FieldType::I32 => Value::Int(read!(i32, 4) as i64),
            FieldType::I64 => Value::Int(read!(i64, 8)),
            FieldType::F32 => Value::Float(read!(f32, 4) as f64),
            FieldType::F64 => Value::Float(read!(f64, 8)),
        })
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldType::U8 => write!(f, "u8"),
            FieldType::U16 => write!(f, "u16"),
            FieldType::U32 => write!(f, "u32"),
            FieldType::U64 => write!(f, "u64"),
            FieldType::I8 => write!(f, "i8"),
            FieldType::I16 => write!(f, "i16"),
            FieldType::I32 => write!(f, "i32"),
            FieldType::I64 => write!(f, "i64"),
            FieldType::F32 => write!(f, "f32"),
            FieldType::F64 => write!(f, "f64"),
        }
    }
}

/// A single cell of a decoded table
///
/// Decoders only ever produce the numeric variants. `Text` and `Null` exist so
/// that tables built by callers (or the gaps left by [`Frame::concat`]) still
/// go through the same numeric coercion as decoded data.
///
/// [`Frame::concat`]: crate::frame::Frame::concat
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    UInt(u64),
    Int(i64),
    Float(f64),
    Text(String),
    Null,
}

impl Value {
    /// Numeric coercion: integers and floats convert, text is parsed,
    /// anything unparsable becomes NaN
    pub fn as_f64(&self) -> f64 {
        match self {
            Value::UInt(v) => *v as f64,
            Value::Int(v) => *v as f64,
            Value::Float(v) => *v,
            Value::Text(s) => s.trim().parse::<f64>().unwrap_or(f64::NAN),
            Value::Null => f64::NAN,
        }
    }

    /// Integer view of the value, used for discriminator fields
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::UInt(v) => i64::try_from(*v).ok(),
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Unsigned view of the value (negative or non-integer values yield `None`)
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::UInt(v) => Some(*v),
            Value::Int(v) => u64::try_from(*v).ok(),
            _ => None,
        }
    }

    /// Check if the value coerces to a finite number
    pub fn is_finite(&self) -> bool {
        self.as_f64().is_finite()
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::UInt(v) => write!(f, "{}", v),
            Value::Int(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::Text(s) => write!(f, "{}", s),
            Value::Null => Ok(()),
        }
    }
}
