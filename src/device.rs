//! Device address table for MELSEC PLCs.
//!
//! A device address such as `D100` or `X1A0` is split into a device name
//! (`D`, `X`) and a number. The number is decimal or hexadecimal depending on
//! the device. Each device has a binary code, a numeric base and a class
//! (bit, word or double word).
//!
//! | Device | Code | Base | Class | | Device | Code | Base | Class |
//! |--------|------|:----:|-------|-|--------|------|:----:|-------|
//! | SM     | 0x91 | 10   | bit   | | CS     | 0xC4 | 10   | bit   |
//! | SD     | 0xA9 | 10   | word  | | CC     | 0xC3 | 10   | bit   |
//! | X      | 0x9C | 16   | bit   | | CN     | 0xC5 | 10   | word  |
//! | Y      | 0x9D | 16   | bit   | | SB     | 0xA1 | 16   | bit   |
//! | M      | 0x90 | 10   | bit   | | SW     | 0xB5 | 16   | word  |
//! | L      | 0x92 | 10   | bit   | | DX     | 0xA2 | 16   | bit   |
//! | F      | 0x93 | 10   | bit   | | DY     | 0xA3 | 16   | bit   |
//! | V      | 0x94 | 10   | bit   | | R      | 0xAF | 10   | word  |
//! | B      | 0xA0 | 16   | bit   | | ZR     | 0xB0 | 16   | word  |
//! | D      | 0xA8 | 10   | word  | | W      | 0xB4 | 16   | word  |
//! | TS     | 0xC1 | 10   | bit   | | STS    | 0xC7 | 10   | bit   |
//! | TC     | 0xC0 | 10   | bit   | | STC    | 0xC6 | 10   | bit   |
//! | TN     | 0xC2 | 10   | word  | | STN    | 0xC8 | 10   | word  |
//!
//! iQ-R additionally knows the long timer/counter family (`LTS`, `LTC`, `LTN`,
//! `LSTS`, `LSTC`, `LSTN`, `LCS`, `LCC`, `LCN`), the long index register `LZ`
//! and the refresh data register `RD`.
//!
//! # Example
//!
//! ```
//! use melsec_mc::{DeviceAddress, PlcSeries};
//!
//! let addr = DeviceAddress::parse(PlcSeries::Q, "X1A0").unwrap();
//! assert_eq!(addr.name(), "X");
//! assert_eq!(addr.index(), 0x1A0);
//! assert_eq!(addr.to_string(), "X1A0");
//!
//! assert!(DeviceAddress::parse(PlcSeries::Q, "LZ0").is_err());
//! assert!(DeviceAddress::parse(PlcSeries::IqR, "LZ0").is_ok());
//! ```

use std::fmt;

use crate::codec::{Codec, CommType, Endian, Width};
use crate::error::{McError, Result};
use crate::series::PlcSeries;

/// Kind of data a device holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceClass {
    /// Bit device (contacts, coils, relays).
    Bit,
    /// 16-bit word device.
    Word,
    /// 32-bit double word device.
    DWord,
}

/// Static description of a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Device {
    name: &'static str,
    code: u8,
    base: u32,
    class: DeviceClass,
    iqr_only: bool,
}

const fn dev(name: &'static str, code: u8, base: u32, class: DeviceClass) -> Device {
    Device {
        name,
        code,
        base,
        class,
        iqr_only: false,
    }
}

const fn iqr(name: &'static str, code: u8, class: DeviceClass) -> Device {
    Device {
        name,
        code,
        base: 10,
        class,
        iqr_only: true,
    }
}

use DeviceClass::{Bit, DWord, Word};

static DEVICES: [Device; 37] = [
    dev("SM", 0x91, 10, Bit),
    dev("SD", 0xA9, 10, Word),
    dev("X", 0x9C, 16, Bit),
    dev("Y", 0x9D, 16, Bit),
    dev("M", 0x90, 10, Bit),
    dev("L", 0x92, 10, Bit),
    dev("F", 0x93, 10, Bit),
    dev("V", 0x94, 10, Bit),
    dev("B", 0xA0, 16, Bit),
    dev("D", 0xA8, 10, Word),
    dev("W", 0xB4, 16, Word),
    dev("TS", 0xC1, 10, Bit),
    dev("TC", 0xC0, 10, Bit),
    dev("TN", 0xC2, 10, Word),
    dev("STS", 0xC7, 10, Bit),
    dev("STC", 0xC6, 10, Bit),
    dev("STN", 0xC8, 10, Word),
    dev("CS", 0xC4, 10, Bit),
    dev("CC", 0xC3, 10, Bit),
    dev("CN", 0xC5, 10, Word),
    dev("SB", 0xA1, 16, Bit),
    dev("SW", 0xB5, 16, Word),
    dev("DX", 0xA2, 16, Bit),
    dev("DY", 0xA3, 16, Bit),
    dev("R", 0xAF, 10, Word),
    dev("ZR", 0xB0, 16, Word),
    iqr("LTS", 0x51, Bit),
    iqr("LTC", 0x50, Bit),
    iqr("LTN", 0x52, DWord),
    iqr("LSTS", 0x59, Bit),
    iqr("LSTC", 0x58, Bit),
    iqr("LSTN", 0x5A, DWord),
    iqr("LCS", 0x55, Bit),
    iqr("LCC", 0x54, Bit),
    iqr("LCN", 0x56, DWord),
    iqr("LZ", 0x62, DWord),
    iqr("RD", 0x2C, Word),
];

impl Device {
    /// Looks a device up by name for the given series.
    ///
    /// # Errors
    ///
    /// Returns `McError::DeviceCode` if the name is unknown or the device is
    /// not available on `series`.
    pub fn lookup(series: PlcSeries, name: &str) -> Result<&'static Device> {
        DEVICES
            .iter()
            .find(|d| d.name == name && (series.is_iqr() || !d.iqr_only))
            .ok_or_else(|| McError::device_code(series, name))
    }

    /// Returns the device name (`"D"`, `"STN"`, ...).
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the binary device code.
    pub fn code(&self) -> u8 {
        self.code
    }

    /// Returns the numeric base of device numbers (10 or 16).
    pub fn base(&self) -> u32 {
        self.base
    }

    /// Returns the device class.
    pub fn class(&self) -> DeviceClass {
        self.class
    }

    /// Returns whether the device only exists on iQ-R.
    pub fn is_iqr_only(&self) -> bool {
        self.iqr_only
    }

    /// Returns the device code as sent in ASCII mode, padded with `*` to two
    /// characters (four on iQ-R).
    ///
    /// Outside iQ-R the retentive timer devices `STS`/`STC`/`STN` go on the
    /// wire as `SS`/`SC`/`SN`.
    pub fn ascii_code(&self, series: PlcSeries) -> String {
        if series.is_iqr() {
            return format!("{:*<4}", self.name);
        }
        let name = match self.name {
            "STS" => "SS",
            "STC" => "SC",
            "STN" => "SN",
            other => other,
        };
        format!("{:*<2}", name)
    }

    fn from_ascii_code(series: PlcSeries, code: &str) -> Result<&'static Device> {
        let name = code.trim_end_matches('*');
        let name = if series.is_iqr() {
            name
        } else {
            match name {
                "SS" => "STS",
                "SC" => "STC",
                "SN" => "STN",
                other => other,
            }
        };
        Device::lookup(series, name)
    }

    fn from_code(series: PlcSeries, code: u16) -> Result<&'static Device> {
        DEVICES
            .iter()
            .find(|d| u16::from(d.code) == code && (series.is_iqr() || !d.iqr_only))
            .ok_or_else(|| McError::device_code(series, format!("0x{:02X}", code)))
    }
}

/// A parsed device address: device plus number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceAddress {
    device: &'static Device,
    index: u32,
}

impl DeviceAddress {
    /// Parses an address like `"D100"` or `"X0FFF"`.
    ///
    /// The leading non-digit run names the device, the rest is the number in
    /// that device's base. A hexadecimal number starting with a letter needs a
    /// leading zero (`X0FFF`, not `XFFF`).
    ///
    /// # Errors
    ///
    /// - `McError::DeviceCode` if the device is unknown for the series
    /// - `McError::InvalidParameter` if the number is missing or malformed
    pub fn parse(series: PlcSeries, address: &str) -> Result<Self> {
        let split = address
            .find(|c: char| c.is_ascii_digit())
            .unwrap_or(address.len());
        let (name, number) = address.split_at(split);
        let device = Device::lookup(series, name)?;
        if number.is_empty() {
            return Err(McError::invalid_parameter(
                "device",
                format!("\"{}\" has no device number", address),
            ));
        }
        let index = u32::from_str_radix(number, device.base).map_err(|_| {
            McError::invalid_parameter(
                "device",
                format!(
                    "\"{}\" is not a valid base-{} device number",
                    number, device.base
                ),
            )
        })?;
        Ok(Self { device, index })
    }

    /// Creates an address from a device and number.
    pub fn new(device: &'static Device, index: u32) -> Self {
        Self { device, index }
    }

    /// Returns the device descriptor.
    pub fn device(&self) -> &'static Device {
        self.device
    }

    /// Returns the device name.
    pub fn name(&self) -> &'static str {
        self.device.name
    }

    /// Returns the device number.
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Returns the address `offset` points further on.
    ///
    /// # Errors
    ///
    /// Returns `McError::ValueRange` if the number overflows.
    pub fn offset(&self, offset: u32) -> Result<Self> {
        let index = self
            .index
            .checked_add(offset)
            .ok_or_else(|| McError::value_range(u64::from(self.index) + u64::from(offset), 32))?;
        Ok(Self {
            device: self.device,
            index,
        })
    }

    /// Returns `count` consecutive addresses starting at this one.
    ///
    /// Used for values that span several word devices (`D200`, `D201`, ...).
    ///
    /// # Errors
    ///
    /// Returns `McError::ValueRange` if the number overflows.
    pub fn span(&self, count: usize) -> Result<Vec<Self>> {
        (0..count as u32).map(|i| self.offset(i)).collect()
    }

    /// Encodes the device reference used inside request payloads.
    ///
    /// - binary: 3-byte number + 1-byte code (iQ-R: 4-byte number + 2-byte code)
    /// - ASCII: `*`-padded code + number in the device's base, 6 digits
    ///   (iQ-R: 4-character code + 8 digits)
    ///
    /// # Errors
    ///
    /// Returns `McError::ValueRange` if the number does not fit the field.
    pub fn encode(&self, series: PlcSeries, codec: &Codec) -> Result<Vec<u8>> {
        let digits = if series.is_iqr() { 8 } else { 6 };
        match codec.comm_type {
            CommType::Binary => {
                let (number_len, code_width) = if series.is_iqr() {
                    (4, Width::Word)
                } else {
                    (3, Width::Byte)
                };
                if u64::from(self.index) >> (number_len * 8) != 0 {
                    return Err(McError::value_range(self.index, number_len as u32 * 8));
                }
                let number = codec.encode_raw(u64::from(self.index), Width::DWord);
                let mut out = match codec.endian {
                    Endian::Little => number[..number_len].to_vec(),
                    Endian::Big => number[4 - number_len..].to_vec(),
                };
                out.extend(codec.encode_raw(u64::from(self.device.code), code_width));
                Ok(out)
            }
            CommType::Ascii => {
                let number = if self.device.base == 16 {
                    format!("{:0w$X}", self.index, w = digits)
                } else {
                    format!("{:0w$}", self.index, w = digits)
                };
                if number.len() > digits {
                    return Err(McError::value_range(
                        self.index,
                        if series.is_iqr() { 32 } else { 24 },
                    ));
                }
                let mut out = self.device.ascii_code(series).into_bytes();
                out.extend(number.into_bytes());
                Ok(out)
            }
        }
    }

    /// Returns the length of an encoded device reference.
    pub fn encoded_len(series: PlcSeries, codec: &Codec) -> usize {
        match (codec.comm_type, series.is_iqr()) {
            (CommType::Binary, false) => 4,
            (CommType::Binary, true) => 6,
            (CommType::Ascii, false) => 8,
            (CommType::Ascii, true) => 12,
        }
    }

    /// Decodes a device reference produced by [`DeviceAddress::encode`].
    ///
    /// # Errors
    ///
    /// Returns `McError::Decode` for a wrong length or malformed number and
    /// `McError::DeviceCode` for an unknown code.
    pub fn decode(series: PlcSeries, codec: &Codec, data: &[u8]) -> Result<Self> {
        if data.len() != Self::encoded_len(series, codec) {
            return Err(McError::decode(format!(
                "device reference must be {} bytes, got {}",
                Self::encoded_len(series, codec),
                data.len()
            )));
        }
        match codec.comm_type {
            CommType::Binary => {
                let number_len = if series.is_iqr() { 4 } else { 3 };
                let (number, code) = data.split_at(number_len);
                let mut padded = [0u8; 4];
                match codec.endian {
                    Endian::Little => padded[..number_len].copy_from_slice(number),
                    Endian::Big => padded[4 - number_len..].copy_from_slice(number),
                }
                let index = codec.decode_raw(&padded, Width::DWord)? as u32;
                let code_width = if series.is_iqr() { Width::Word } else { Width::Byte };
                let code = codec.decode_raw(code, code_width)? as u16;
                Ok(Self {
                    device: Device::from_code(series, code)?,
                    index,
                })
            }
            CommType::Ascii => {
                let code_len = if series.is_iqr() { 4 } else { 2 };
                if !data.is_ascii() {
                    return Err(McError::decode("device reference is not ASCII text"));
                }
                let text = std::str::from_utf8(data).map_err(|e| McError::decode(e.to_string()))?;
                let (code, number) = text.split_at(code_len);
                let device = Device::from_ascii_code(series, code)?;
                let index = u32::from_str_radix(number, device.base)
                    .map_err(|e| McError::decode(e.to_string()))?;
                Ok(Self { device, index })
            }
        }
    }
}

impl fmt::Display for DeviceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.device.base == 16 {
            write!(f, "{}{:X}", self.device.name, self.index)
        } else {
            write!(f, "{}{}", self.device.name, self.index)
        }
    }
}
