//! Data type registry.
//!
//! Every typed access goes through a [`DataType`]. A type is known both by a
//! one-character symbol (`h`, `H`, `i`, `f`, ...) and by a canonical name
//! (`SWORD`, `UWORD`, `SDWORD`, `FLOAT`, ...). Lower-case symbols are signed,
//! upper-case symbols are unsigned; both spellings of the same letter share a
//! size.
//!
//! | Symbol | Name   | Size (bytes) | Words |
//! |--------|--------|:------------:|:-----:|
//! | `b`    | BIT    | 2            | 1     |
//! | `h`    | SWORD  | 2            | 1     |
//! | `H`    | UWORD  | 2            | 1     |
//! | `i`    | SDWORD | 4            | 2     |
//! | `I`    | UDWORD | 4            | 2     |
//! | `f`    | FLOAT  | 4            | 2     |
//! | `d`    | DOUBLE | 8            | 4     |
//! | `q`    | SLWORD | 8            | 4     |
//! | `Q`    | ULWORD | 8            | 4     |
//!
//! # Example
//!
//! ```
//! use melsec_mc::DataType;
//!
//! let dt: DataType = "f".parse().unwrap();
//! assert_eq!(dt, DataType::Float);
//! assert_eq!(dt.name(), "FLOAT");
//! assert_eq!(dt.size(), 4);
//! assert_eq!("SDWORD".parse::<DataType>().unwrap().symbol(), 'i');
//! ```

use std::fmt;
use std::str::FromStr;

use crate::error::{McError, Result};

/// Data types that can be read from or written to PLC devices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DataType {
    /// Single bit, transmitted as a word.
    Bit,
    /// Signed 16-bit word.
    SWord,
    /// Unsigned 16-bit word.
    UWord,
    /// Signed 32-bit double word.
    SDWord,
    /// Unsigned 32-bit double word.
    UDWord,
    /// IEEE 754 single precision float.
    Float,
    /// IEEE 754 double precision float.
    Double,
    /// Signed 64-bit long word.
    SLWord,
    /// Unsigned 64-bit long word.
    ULWord,
}

impl DataType {
    /// All data types, in registry order.
    pub const ALL: [DataType; 9] = [
        DataType::Bit,
        DataType::SWord,
        DataType::UWord,
        DataType::SDWord,
        DataType::UDWord,
        DataType::Float,
        DataType::Double,
        DataType::SLWord,
        DataType::ULWord,
    ];

    /// Looks a data type up by its one-character symbol.
    ///
    /// # Errors
    ///
    /// Returns `McError::DataType` for unknown symbols.
    pub fn from_symbol(symbol: char) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|dt| dt.symbol() == symbol)
            .ok_or_else(|| McError::DataType(symbol.to_string()))
    }

    /// Looks a data type up by its canonical name (`"SWORD"`, `"FLOAT"`, ...).
    ///
    /// # Errors
    ///
    /// Returns `McError::DataType` for unknown names.
    pub fn from_name(name: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|dt| dt.name() == name)
            .ok_or_else(|| McError::DataType(name.to_string()))
    }

    /// Returns the one-character symbol.
    pub fn symbol(self) -> char {
        match self {
            DataType::Bit => 'b',
            DataType::SWord => 'h',
            DataType::UWord => 'H',
            DataType::SDWord => 'i',
            DataType::UDWord => 'I',
            DataType::Float => 'f',
            DataType::Double => 'd',
            DataType::SLWord => 'q',
            DataType::ULWord => 'Q',
        }
    }

    /// Returns the canonical name.
    pub fn name(self) -> &'static str {
        match self {
            DataType::Bit => "BIT",
            DataType::SWord => "SWORD",
            DataType::UWord => "UWORD",
            DataType::SDWord => "SDWORD",
            DataType::UDWord => "UDWORD",
            DataType::Float => "FLOAT",
            DataType::Double => "DOUBLE",
            DataType::SLWord => "SLWORD",
            DataType::ULWord => "ULWORD",
        }
    }

    /// Returns the size in bytes on the wire (binary mode).
    ///
    /// `BIT` is 2 because a bit travels as a full word in typed accesses.
    pub fn size(self) -> usize {
        match self {
            DataType::Bit | DataType::SWord | DataType::UWord => 2,
            DataType::SDWord | DataType::UDWord | DataType::Float => 4,
            DataType::Double | DataType::SLWord | DataType::ULWord => 8,
        }
    }

    /// Returns the number of consecutive word devices the type occupies.
    pub fn word_count(self) -> usize {
        self.size() / 2
    }

    /// Returns whether the type is a floating point type.
    pub fn is_float(self) -> bool {
        matches!(self, DataType::Float | DataType::Double)
    }

    /// Returns whether the type is a signed integer type.
    pub fn is_signed(self) -> bool {
        matches!(self, DataType::SWord | DataType::SDWord | DataType::SLWord)
    }
}

impl FromStr for DataType {
    type Err = McError;

    /// Accepts either a symbol (`"h"`) or a canonical name (`"SWORD"`).
    fn from_str(s: &str) -> Result<Self> {
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(symbol), None) => Self::from_symbol(symbol),
            _ => Self::from_name(s),
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A scalar value read from or written to a device.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Value {
    /// Bit value.
    Bit(bool),
    /// Signed integer.
    Int(i64),
    /// Unsigned integer.
    UInt(u64),
    /// Floating point number.
    Float(f64),
}

impl Value {
    /// Returns the value as a signed integer when it is integral.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Value::Bit(b) => Some(i64::from(b)),
            Value::Int(v) => Some(v),
            Value::UInt(v) => i64::try_from(v).ok(),
            Value::Float(_) => None,
        }
    }

    /// Returns the value as a float.
    pub fn as_f64(&self) -> f64 {
        match *self {
            Value::Bit(b) => f64::from(u8::from(b)),
            Value::Int(v) => v as f64,
            Value::UInt(v) => v as f64,
            Value::Float(v) => v,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bit(b) => write!(f, "{}", u8::from(*b)),
            Value::Int(v) => write!(f, "{}", v),
            Value::UInt(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bit(value)
    }
}

impl From<i16> for Value {
    fn from(value: i16) -> Self {
        Value::Int(i64::from(value))
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(i64::from(value))
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<u16> for Value {
    fn from(value: u16) -> Self {
        Value::UInt(u64::from(value))
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::UInt(u64::from(value))
    }
}

impl From<u64> for Value {
    fn from(value: u64) -> Self {
        Value::UInt(value)
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Value::Float(f64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}
