//! MC frame headers and access routes.
//!
//! Every request is wrapped in a 3E or 4E frame. The 3E binary layout is:
//!
//! | Bytes | Field                | Encoding                |
//! |-------|----------------------|-------------------------|
//! | 0-1   | Subheader (`0x5000`) | always big-endian       |
//! | 2     | Network number       | byte                    |
//! | 3     | PC number            | byte                    |
//! | 4-5   | Module I/O number    | word                    |
//! | 6     | Module station       | byte                    |
//! | 7-8   | Request data length  | word                    |
//! | 9-10  | Monitoring timer     | word                    |
//! | 11-   | Command payload      |                         |
//!
//! The 4E frame uses subheader `0x5400` followed by a serial number word and
//! a reserved zero word before the network number. The request data length
//! counts the monitoring timer plus the payload.
//!
//! In ASCII mode each field is hexadecimal text, twice as long.
//!
//! # Example
//!
//! ```
//! use melsec_mc::codec::Codec;
//! use melsec_mc::frame::{AccessRoute, FrameHeader, FrameType};
//!
//! let header = FrameHeader::new(FrameType::E3, AccessRoute::default(), 4);
//! let frame = header.build(&Codec::binary(), &[0x01, 0x04]).unwrap();
//! assert_eq!(
//!     frame,
//!     vec![0x50, 0x00, 0x00, 0xFF, 0xFF, 0x03, 0x00, 0x04, 0x00, 0x04, 0x00, 0x01, 0x04]
//! );
//! ```

use std::fmt;
use std::str::FromStr;

use crate::codec::{Codec, CommType, Width};
use crate::error::{McError, Result};

/// MC frame variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FrameType {
    /// 3E frame.
    #[default]
    E3,
    /// 4E frame, carrying a serial number.
    E4,
}

impl FrameType {
    /// Request subheader.
    pub fn request_subheader(self) -> u16 {
        match self {
            FrameType::E3 => 0x5000,
            FrameType::E4 => 0x5400,
        }
    }

    /// Response subheader.
    pub fn response_subheader(self) -> u16 {
        match self {
            FrameType::E3 => 0xD000,
            FrameType::E4 => 0xD400,
        }
    }

    /// Offset of the end code in a response.
    pub fn status_offset(self, comm_type: CommType) -> usize {
        match (self, comm_type) {
            (FrameType::E3, CommType::Binary) => 9,
            (FrameType::E3, CommType::Ascii) => 18,
            (FrameType::E4, CommType::Binary) => 13,
            (FrameType::E4, CommType::Ascii) => 26,
        }
    }

    /// Offset of the response data length field.
    pub fn length_offset(self, comm_type: CommType) -> usize {
        self.status_offset(comm_type) - comm_type.word_size()
    }

    /// Offset of the response data, right after the end code.
    pub fn data_offset(self, comm_type: CommType) -> usize {
        self.status_offset(comm_type) + comm_type.word_size()
    }
}

impl FromStr for FrameType {
    type Err = McError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "3E" => Ok(FrameType::E3),
            "4E" => Ok(FrameType::E4),
            other => Err(McError::invalid_parameter(
                "frame_type",
                format!("must be \"3E\" or \"4E\", got \"{}\"", other),
            )),
        }
    }
}

impl fmt::Display for FrameType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FrameType::E3 => "3E",
            FrameType::E4 => "4E",
        })
    }
}

/// Route to the target station.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AccessRoute {
    /// Network number (0 = own network).
    pub network: u8,
    /// PC number (0xFF = own station).
    pub pc: u8,
    /// Request destination module I/O number (0x03FF = own CPU).
    pub module_io: u16,
    /// Request destination module station number.
    pub module_station: u8,
}

impl AccessRoute {
    /// Creates a route.
    pub fn new(network: u8, pc: u8, module_io: u16, module_station: u8) -> Self {
        Self {
            network,
            pc,
            module_io,
            module_station,
        }
    }
}

impl Default for AccessRoute {
    /// Connected station: network 0, PC 0xFF, module I/O 0x03FF, station 0.
    fn default() -> Self {
        Self::new(0, 0xFF, 0x03FF, 0)
    }
}

/// Frame header fields common to every request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    /// Frame variant.
    pub frame_type: FrameType,
    /// Serial number (4E only).
    pub serial: u16,
    /// Target route.
    pub route: AccessRoute,
    /// Monitoring timer in units of 250 ms.
    pub timer: u16,
}

impl FrameHeader {
    /// Creates a header with serial number 0.
    pub fn new(frame_type: FrameType, route: AccessRoute, timer: u16) -> Self {
        Self {
            frame_type,
            serial: 0,
            route,
            timer,
        }
    }

    /// Wraps `payload` into a complete request frame.
    ///
    /// # Errors
    ///
    /// Returns `McError::ValueRange` if the payload is too long for the
    /// length field.
    pub fn build(&self, codec: &Codec, payload: &[u8]) -> Result<Vec<u8>> {
        let mut frame = Vec::with_capacity(payload.len() + 30);
        let subheader = self.frame_type.request_subheader();
        match codec.comm_type {
            CommType::Binary => frame.extend_from_slice(&subheader.to_be_bytes()),
            CommType::Ascii => frame.extend(format!("{:04X}", subheader).into_bytes()),
        }
        if self.frame_type == FrameType::E4 {
            frame.extend(codec.encode_raw(u64::from(self.serial), Width::Word));
            frame.extend(codec.encode_raw(0, Width::Word));
        }
        frame.extend(codec.encode_raw(u64::from(self.route.network), Width::Byte));
        frame.extend(codec.encode_raw(u64::from(self.route.pc), Width::Byte));
        frame.extend(codec.encode_raw(u64::from(self.route.module_io), Width::Word));
        frame.extend(codec.encode_raw(u64::from(self.route.module_station), Width::Byte));
        let length = codec.word_size() + payload.len();
        frame.extend(codec.encode_unsigned(length as u64, Width::Word)?);
        frame.extend(codec.encode_raw(u64::from(self.timer), Width::Word));
        frame.extend_from_slice(payload);
        Ok(frame)
    }
}
