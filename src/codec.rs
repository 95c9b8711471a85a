//! Scalar value codec for binary and ASCII communication.
//!
//! The MC protocol carries the same logical frame in two encodings:
//!
//! - **Binary**: integers travel as raw bytes in the configured byte order
//!   (little-endian unless told otherwise).
//! - **ASCII**: the same integer is sent as fixed-width uppercase hexadecimal
//!   text, two characters per binary byte (`0x0401` as a word is `"0401"`).
//!
//! Every other module works with typed integers and hands them to a
//! [`Codec`]; raw hex text never leaves this module. Bit device data, which
//! is packed two points per byte in binary mode and one character per point
//! in ASCII mode, is handled here as well.
//!
//! # Example
//!
//! ```
//! use melsec_mc::codec::{Codec, Width};
//!
//! let binary = Codec::binary();
//! assert_eq!(binary.encode(0x0401, Width::Word, false).unwrap(), vec![0x01, 0x04]);
//!
//! let ascii = Codec::ascii();
//! assert_eq!(ascii.encode(0x0401, Width::Word, false).unwrap(), b"0401".to_vec());
//! assert_eq!(ascii.decode(b"FFFF", Width::Word, true).unwrap(), -1);
//! ```

use std::fmt;
use std::str::FromStr;

use crate::datatype::{DataType, Value};
use crate::error::{McError, Result};

/// Wire encoding of MC frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CommType {
    /// Raw binary fields.
    #[default]
    Binary,
    /// Hexadecimal text fields.
    Ascii,
}

impl CommType {
    /// Returns how many bytes one 16-bit word occupies on the wire (2 or 4).
    pub fn word_size(self) -> usize {
        match self {
            CommType::Binary => 2,
            CommType::Ascii => 4,
        }
    }

    /// Returns the configuration name (`"binary"` or `"ascii"`).
    pub fn as_str(self) -> &'static str {
        match self {
            CommType::Binary => "binary",
            CommType::Ascii => "ascii",
        }
    }
}

impl FromStr for CommType {
    type Err = McError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "binary" => Ok(CommType::Binary),
            "ascii" => Ok(CommType::Ascii),
            other => Err(McError::CommType(other.to_string())),
        }
    }
}

impl fmt::Display for CommType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Byte order used for binary fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Endian {
    /// Least significant byte first (MC default).
    #[default]
    Little,
    /// Most significant byte first.
    Big,
}

/// Width of an integer field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Width {
    /// 8 bits.
    Byte,
    /// 16 bits.
    Word,
    /// 32 bits.
    DWord,
    /// 64 bits.
    LWord,
}

impl Width {
    /// Returns the width in bytes in binary mode.
    pub fn bytes(self) -> usize {
        match self {
            Width::Byte => 1,
            Width::Word => 2,
            Width::DWord => 4,
            Width::LWord => 8,
        }
    }

    /// Returns the width in bits.
    pub fn bits(self) -> u32 {
        self.bytes() as u32 * 8
    }

    fn mask(self) -> u64 {
        match self {
            Width::LWord => u64::MAX,
            other => (1u64 << other.bits()) - 1,
        }
    }

    fn for_size(size: usize) -> Width {
        match size {
            1 => Width::Byte,
            2 => Width::Word,
            4 => Width::DWord,
            _ => Width::LWord,
        }
    }
}

/// Encoder/decoder for scalar fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Codec {
    /// Binary or ASCII wire encoding.
    pub comm_type: CommType,
    /// Byte order of binary fields.
    pub endian: Endian,
}

impl Codec {
    /// Creates a codec.
    pub fn new(comm_type: CommType, endian: Endian) -> Self {
        Self { comm_type, endian }
    }

    /// Little-endian binary codec.
    pub fn binary() -> Self {
        Self::new(CommType::Binary, Endian::Little)
    }

    /// ASCII codec.
    pub fn ascii() -> Self {
        Self::new(CommType::Ascii, Endian::Little)
    }

    /// Returns whether this codec produces ASCII text.
    pub fn is_ascii(&self) -> bool {
        self.comm_type == CommType::Ascii
    }

    /// Bytes per word on the wire (2 binary, 4 ASCII).
    pub fn word_size(&self) -> usize {
        self.comm_type.word_size()
    }

    /// Number of wire bytes a field of the given width occupies.
    pub fn field_len(&self, width: Width) -> usize {
        match self.comm_type {
            CommType::Binary => width.bytes(),
            CommType::Ascii => width.bytes() * 2,
        }
    }

    /// Encodes an integer, checking it against the signed or unsigned range of `width`.
    ///
    /// # Errors
    ///
    /// Returns `McError::ValueRange` when the value does not fit.
    pub fn encode(&self, value: i64, width: Width, signed: bool) -> Result<Vec<u8>> {
        let bits = width.bits();
        let in_range = if signed {
            bits == 64 || {
                let limit = 1i64 << (bits - 1);
                (-limit..limit).contains(&value)
            }
        } else {
            value >= 0 && (bits == 64 || value < (1i64 << bits))
        };
        if !in_range {
            return Err(McError::value_range(value, bits));
        }
        Ok(self.encode_raw(value as u64 & width.mask(), width))
    }

    /// Encodes an unsigned integer.
    ///
    /// # Errors
    ///
    /// Returns `McError::ValueRange` when the value does not fit.
    pub fn encode_unsigned(&self, value: u64, width: Width) -> Result<Vec<u8>> {
        if value & !width.mask() != 0 {
            return Err(McError::value_range(value, width.bits()));
        }
        Ok(self.encode_raw(value, width))
    }

    /// Encodes the low `width` bits of a raw bit pattern without range checks.
    pub fn encode_raw(&self, bits: u64, width: Width) -> Vec<u8> {
        let bits = bits & width.mask();
        match self.comm_type {
            CommType::Binary => {
                let n = width.bytes();
                match self.endian {
                    Endian::Little => bits.to_le_bytes()[..n].to_vec(),
                    Endian::Big => bits.to_be_bytes()[8 - n..].to_vec(),
                }
            }
            CommType::Ascii => {
                format!("{:0w$X}", bits, w = width.bytes() * 2).into_bytes()
            }
        }
    }

    /// Decodes a field into its raw bit pattern.
    ///
    /// # Errors
    ///
    /// Returns `McError::Decode` if the length is wrong or the ASCII text is
    /// not hexadecimal.
    pub fn decode_raw(&self, data: &[u8], width: Width) -> Result<u64> {
        let expected = self.field_len(width);
        if data.len() != expected {
            return Err(McError::decode(format!(
                "expected {} bytes for a {}-bit field, got {}",
                expected,
                width.bits(),
                data.len()
            )));
        }
        match self.comm_type {
            CommType::Binary => {
                let fold = |acc: u64, b: &u8| (acc << 8) | u64::from(*b);
                Ok(match self.endian {
                    Endian::Little => data.iter().rev().fold(0, fold),
                    Endian::Big => data.iter().fold(0, fold),
                })
            }
            CommType::Ascii => {
                if !data.iter().all(u8::is_ascii_hexdigit) {
                    return Err(McError::decode(format!(
                        "malformed hex text {:?}",
                        String::from_utf8_lossy(data)
                    )));
                }
                let text = std::str::from_utf8(data).map_err(|e| McError::decode(e.to_string()))?;
                u64::from_str_radix(text, 16).map_err(|e| McError::decode(e.to_string()))
            }
        }
    }

    /// Decodes a field as a signed or unsigned integer.
    ///
    /// Unsigned 64-bit values above `i64::MAX` cannot be represented; use
    /// [`Codec::decode_raw`] for those.
    ///
    /// # Errors
    ///
    /// Returns `McError::Decode` on malformed input.
    pub fn decode(&self, data: &[u8], width: Width, signed: bool) -> Result<i64> {
        let raw = self.decode_raw(data, width)?;
        if signed {
            let shift = 64 - width.bits();
            Ok(((raw << shift) as i64) >> shift)
        } else {
            i64::try_from(raw).map_err(|_| McError::decode(format!("{} overflows i64", raw)))
        }
    }

    /// Encodes a typed value using the full width of its data type.
    ///
    /// # Errors
    ///
    /// Returns `McError::ValueRange` or `McError::InvalidParameter` if the
    /// value does not suit the data type.
    pub fn encode_value(&self, value: &Value, data_type: DataType) -> Result<Vec<u8>> {
        let raw = value_to_raw(value, data_type)?;
        Ok(self.encode_raw(raw, Width::for_size(data_type.size())))
    }

    /// Decodes a typed value spanning the full width of its data type.
    ///
    /// # Errors
    ///
    /// Returns `McError::Decode` on malformed input.
    pub fn decode_value(&self, data: &[u8], data_type: DataType) -> Result<Value> {
        let raw = self.decode_raw(data, Width::for_size(data_type.size()))?;
        Ok(raw_to_value(raw, data_type))
    }

    /// Encodes bit device points: packed two per byte in binary mode, one
    /// `'0'`/`'1'` character per point in ASCII mode.
    pub fn encode_bits(&self, values: &[bool]) -> Vec<u8> {
        match self.comm_type {
            CommType::Binary => pack_bits(values),
            CommType::Ascii => values
                .iter()
                .map(|&v| if v { b'1' } else { b'0' })
                .collect(),
        }
    }

    /// Decodes `count` bit device points.
    ///
    /// # Errors
    ///
    /// Returns `McError::Decode` if the data is too short or contains
    /// characters other than `'0'`/`'1'` in ASCII mode.
    pub fn decode_bits(&self, data: &[u8], count: usize) -> Result<Vec<bool>> {
        match self.comm_type {
            CommType::Binary => unpack_bits(data, count),
            CommType::Ascii => {
                if data.len() < count {
                    return Err(McError::decode(format!(
                        "expected {} bit characters, got {}",
                        count,
                        data.len()
                    )));
                }
                data[..count]
                    .iter()
                    .map(|c| match c {
                        b'0' => Ok(false),
                        b'1' => Ok(true),
                        other => Err(McError::decode(format!(
                            "invalid bit character 0x{:02X}",
                            other
                        ))),
                    })
                    .collect()
            }
        }
    }
}

/// Packs bit values two per byte: even points in bit 4, odd points in bit 0.
///
/// # Example
///
/// ```
/// use melsec_mc::codec::pack_bits;
///
/// assert_eq!(pack_bits(&[true, false, true]), vec![0x10, 0x10]);
/// assert_eq!(pack_bits(&[false, true]), vec![0x01]);
/// ```
pub fn pack_bits(values: &[bool]) -> Vec<u8> {
    let mut packed = vec![0u8; values.len().div_ceil(2)];
    for (i, &value) in values.iter().enumerate() {
        if value {
            packed[i / 2] |= if i % 2 == 0 { 1 << 4 } else { 1 << 0 };
        }
    }
    packed
}

/// Unpacks `count` bit values packed by [`pack_bits`].
///
/// # Errors
///
/// Returns `McError::Decode` if `data` holds fewer than `count` points.
pub fn unpack_bits(data: &[u8], count: usize) -> Result<Vec<bool>> {
    let needed = count.div_ceil(2);
    if data.len() < needed {
        return Err(McError::decode(format!(
            "expected {} bytes for {} bit points, got {}",
            needed,
            count,
            data.len()
        )));
    }
    Ok((0..count)
        .map(|i| {
            let byte = data[i / 2];
            let mask = if i % 2 == 0 { 1 << 4 } else { 1 << 0 };
            byte & mask != 0
        })
        .collect())
}

/// Converts a typed value into the raw bit pattern of its data type.
///
/// # Errors
///
/// - `McError::ValueRange` if an integer does not fit the data type
/// - `McError::InvalidParameter` for a bit value other than 0/1 or a
///   fractional value for an integer type
pub fn value_to_raw(value: &Value, data_type: DataType) -> Result<u64> {
    match data_type {
        DataType::Bit => match value.as_i64() {
            Some(0) => Ok(0),
            Some(1) => Ok(1),
            _ => Err(McError::invalid_parameter(
                "value",
                format!("bit value must be 0 (OFF) or 1 (ON), got {}", value),
            )),
        },
        DataType::Float => Ok(u64::from((value.as_f64() as f32).to_bits())),
        DataType::Double => Ok(value.as_f64().to_bits()),
        DataType::ULWord => match *value {
            Value::UInt(v) => Ok(v),
            _ => {
                let v = integral(value, data_type)?;
                u64::try_from(v).map_err(|_| McError::value_range(v, 64))
            }
        },
        _ => {
            let width = Width::for_size(data_type.size());
            let v = integral(value, data_type)?;
            let bits = width.bits();
            let in_range = if data_type.is_signed() {
                bits == 64 || {
                    let limit = 1i64 << (bits - 1);
                    (-limit..limit).contains(&v)
                }
            } else {
                v >= 0 && v < (1i64 << bits)
            };
            if !in_range {
                return Err(McError::value_range(v, bits));
            }
            Ok(v as u64 & width.mask())
        }
    }
}

fn integral(value: &Value, data_type: DataType) -> Result<i64> {
    match *value {
        Value::UInt(v) => i64::try_from(v).map_err(|_| McError::value_range(v, 64)),
        Value::Float(v) => Err(McError::invalid_parameter(
            "value",
            format!("{} is not an integer value for {}", v, data_type),
        )),
        _ => value.as_i64().ok_or_else(|| {
            McError::invalid_parameter("value", format!("{} is not valid for {}", value, data_type))
        }),
    }
}

/// Converts a raw bit pattern into a typed value.
///
/// Floating point results are normalised with [`round_float`].
pub fn raw_to_value(raw: u64, data_type: DataType) -> Value {
    match data_type {
        DataType::Bit => Value::Bit(raw & 1 != 0),
        DataType::SWord => Value::Int(i64::from(raw as u16 as i16)),
        DataType::UWord => Value::UInt(raw & 0xFFFF),
        DataType::SDWord => Value::Int(i64::from(raw as u32 as i32)),
        DataType::UDWord => Value::UInt(raw & 0xFFFF_FFFF),
        DataType::Float => Value::Float(round_float(f64::from(f32::from_bits(raw as u32)))),
        DataType::Double => Value::Float(round_float(f64::from_bits(raw))),
        DataType::SLWord => Value::Int(raw as i64),
        DataType::ULWord => Value::UInt(raw),
    }
}

/// Rounds a float to at most 6 decimal digits to hide binary noise.
///
/// # Example
///
/// ```
/// use melsec_mc::codec::round_float;
///
/// assert_eq!(round_float(f64::from(3.14f32)), 3.14);
/// assert_eq!(round_float(2.0), 2.0);
/// ```
pub fn round_float(value: f64) -> f64 {
    format!("{:.6}", value).parse().unwrap_or(value)
}

/// Splits a raw value into `count` words, least significant word first.
pub fn split_words(raw: u64, count: usize) -> Vec<u16> {
    (0..count).map(|i| (raw >> (16 * i)) as u16).collect()
}

/// Joins words produced by [`split_words`].
pub fn join_words(words: &[u16]) -> u64 {
    words
        .iter()
        .enumerate()
        .fold(0, |acc, (i, &w)| acc | (u64::from(w) << (16 * i)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binary_word_little_endian() {
        let codec = Codec::binary();
        assert_eq!(codec.encode(0x1234, Width::Word, false).unwrap(), vec![0x34, 0x12]);
        assert_eq!(codec.decode(&[0x34, 0x12], Width::Word, false).unwrap(), 0x1234);
    }

    #[test]
    fn test_binary_big_endian() {
        let codec = Codec::new(CommType::Binary, Endian::Big);
        assert_eq!(
            codec.encode(0x0102_0304, Width::DWord, false).unwrap(),
            vec![0x01, 0x02, 0x03, 0x04]
        );
        assert_eq!(
            codec.decode(&[0x01, 0x02, 0x03, 0x04], Width::DWord, false).unwrap(),
            0x0102_0304
        );
    }

    #[test]
    fn test_ascii_widths() {
        let codec = Codec::ascii();
        assert_eq!(codec.encode(0xFF, Width::Byte, false).unwrap(), b"FF".to_vec());
        assert_eq!(codec.encode(0x3FF, Width::Word, false).unwrap(), b"03FF".to_vec());
        assert_eq!(codec.encode(10, Width::DWord, false).unwrap(), b"0000000A".to_vec());
    }

    #[test]
    fn test_signed_roundtrip_both_modes() {
        for codec in [Codec::binary(), Codec::ascii()] {
            for width in [Width::Byte, Width::Word, Width::DWord, Width::LWord] {
                let bytes = codec.encode(-1, width, true).unwrap();
                assert_eq!(bytes.len(), codec.field_len(width));
                assert_eq!(codec.decode(&bytes, width, true).unwrap(), -1);
            }
        }
    }

    #[test]
    fn test_negative_requires_signed() {
        let codec = Codec::binary();
        assert!(matches!(
            codec.encode(-1, Width::Word, false),
            Err(McError::ValueRange { bits: 16, .. })
        ));
        let bytes = codec.encode(-1, Width::Word, true).unwrap();
        assert_eq!(codec.decode(&bytes, Width::Word, false).unwrap(), 0xFFFF);
    }

    #[test]
    fn test_overflow() {
        let codec = Codec::ascii();
        assert!(codec.encode(256, Width::Byte, false).is_err());
        assert!(codec.encode(128, Width::Byte, true).is_err());
        assert!(codec.encode(-129, Width::Byte, true).is_err());
        assert!(codec.encode(65_535, Width::Word, false).is_ok());
        assert!(codec.encode_unsigned(0x1_0000, Width::Word).is_err());
    }

    #[test]
    fn test_decode_errors() {
        let ascii = Codec::ascii();
        assert!(matches!(
            ascii.decode(b"12G4", Width::Word, false),
            Err(McError::Decode { .. })
        ));
        assert!(ascii.decode(b"+123", Width::Word, false).is_err());
        assert!(ascii.decode(b"123", Width::Word, false).is_err());
        assert!(Codec::binary().decode(&[0x01], Width::Word, false).is_err());
    }

    #[test]
    fn test_ascii_decode_lowercase() {
        assert_eq!(Codec::ascii().decode(b"c056", Width::Word, false).unwrap(), 0xC056);
    }

    #[test]
    fn test_pack_bits_even_and_odd() {
        assert_eq!(pack_bits(&[true, true, false, true]), vec![0x11, 0x01]);
        assert_eq!(pack_bits(&[true]), vec![0x10]);
        assert!(pack_bits(&[]).is_empty());
    }

    #[test]
    fn test_unpack_bits() {
        assert_eq!(
            unpack_bits(&[0x11, 0x01], 4).unwrap(),
            vec![true, true, false, true]
        );
        assert_eq!(unpack_bits(&[0x10, 0xFF], 3).unwrap(), vec![true, false, true]);
        assert!(unpack_bits(&[0x10], 3).is_err());
    }

    #[test]
    fn test_bits_roundtrip_odd_count() {
        let values = [true, false, false, true, true];
        for codec in [Codec::binary(), Codec::ascii()] {
            let wire = codec.encode_bits(&values);
            assert_eq!(codec.decode_bits(&wire, values.len()).unwrap(), values);
        }
    }

    #[test]
    fn test_ascii_bits() {
        let codec = Codec::ascii();
        assert_eq!(codec.encode_bits(&[true, false, true]), b"101".to_vec());
        assert!(codec.decode_bits(b"12", 2).is_err());
    }

    #[test]
    fn test_typed_values() {
        let codec = Codec::binary();
        let bytes = codec.encode_value(&Value::Int(-2), DataType::SDWord).unwrap();
        assert_eq!(bytes, vec![0xFE, 0xFF, 0xFF, 0xFF]);
        assert_eq!(
            codec.decode_value(&bytes, DataType::SDWord).unwrap(),
            Value::Int(-2)
        );
        assert_eq!(
            codec.decode_value(&bytes, DataType::UDWord).unwrap(),
            Value::UInt(0xFFFF_FFFE)
        );
    }

    #[test]
    fn test_float_value_rounding() {
        let codec = Codec::ascii();
        let bytes = codec.encode_value(&Value::Float(3.14), DataType::Float).unwrap();
        assert_eq!(bytes.len(), 8);
        assert_eq!(
            codec.decode_value(&bytes, DataType::Float).unwrap(),
            Value::Float(3.14)
        );
    }

    #[test]
    fn test_value_to_raw_validation() {
        assert!(value_to_raw(&Value::Int(2), DataType::Bit).is_err());
        assert_eq!(value_to_raw(&Value::Bit(true), DataType::Bit).unwrap(), 1);
        assert!(value_to_raw(&Value::Int(-1), DataType::UWord).is_err());
        assert!(value_to_raw(&Value::Int(40_000), DataType::SWord).is_err());
        assert!(value_to_raw(&Value::Float(1.5), DataType::SWord).is_err());
        assert_eq!(
            value_to_raw(&Value::UInt(u64::MAX), DataType::ULWord).unwrap(),
            u64::MAX
        );
        assert_eq!(value_to_raw(&Value::Int(-1), DataType::SLWord).unwrap(), u64::MAX);
    }

    #[test]
    fn test_split_join_words() {
        let raw = 0x1122_3344_5566_7788;
        let words = split_words(raw, 4);
        assert_eq!(words, vec![0x7788, 0x5566, 0x3344, 0x1122]);
        assert_eq!(join_words(&words), raw);
    }

    #[test]
    fn test_comm_type_parse() {
        assert_eq!("ascii".parse::<CommType>().unwrap(), CommType::Ascii);
        assert!(matches!(
            "hex".parse::<CommType>(),
            Err(McError::CommType(ref s)) if s == "hex"
        ));
        assert_eq!(CommType::Binary.word_size(), 2);
        assert_eq!(CommType::Ascii.word_size(), 4);
    }
}
