//! MC response parsing and validation.
//!
//! A response mirrors the request frame: subheader (`0xD000` for 3E,
//! `0xD400` for 4E), optional serial number, route fields, the response data
//! length, an end code and the data.
//!
//! | Frame | Mode   | End code offset | Data offset |
//! |-------|--------|:---------------:|:-----------:|
//! | 3E    | binary | 9               | 11          |
//! | 3E    | ASCII  | 18              | 22          |
//! | 4E    | binary | 13              | 15          |
//! | 4E    | ASCII  | 26              | 30          |
//!
//! The response data length sits one word before the end code and counts the
//! end code plus the data. A response is successful if the end code is zero.
//!
//! # Example
//!
//! ```
//! use melsec_mc::codec::Codec;
//! use melsec_mc::frame::FrameType;
//! use melsec_mc::McResponse;
//!
//! let bytes = [
//!     0xD0, 0x00, 0x00, 0xFF, 0xFF, 0x03, 0x00, // subheader + route
//!     0x04, 0x00, // data length
//!     0x00, 0x00, // end code
//!     0x34, 0x12, // data
//! ];
//! let response = McResponse::from_bytes(FrameType::E3, &Codec::binary(), &bytes).unwrap();
//! assert!(response.is_success());
//! assert_eq!(response.data, vec![0x34, 0x12]);
//! ```

use crate::codec::{Codec, CommType, Width};
use crate::error::{check_status, McError, Result};
use crate::frame::FrameType;

/// Parsed MC response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct McResponse {
    /// Serial number echoed by a 4E frame.
    pub serial: Option<u16>,
    /// End code (0 = success).
    pub status: u16,
    /// Response data following the end code.
    pub data: Vec<u8>,
}

impl McResponse {
    /// Parses a complete response frame.
    ///
    /// Bytes beyond the declared data length are ignored.
    ///
    /// # Errors
    ///
    /// Returns `McError::InvalidResponse` if the frame is short, truncated or
    /// carries the wrong subheader, and `McError::Decode` for malformed fields.
    pub fn from_bytes(frame_type: FrameType, codec: &Codec, raw: &[u8]) -> Result<Self> {
        let word = codec.word_size();
        let status_offset = frame_type.status_offset(codec.comm_type);
        if raw.len() < status_offset + word {
            return Err(McError::invalid_response(format!(
                "response too short: expected at least {} bytes, got {}",
                status_offset + word,
                raw.len()
            )));
        }

        let subheader = match codec.comm_type {
            CommType::Binary => u16::from_be_bytes([raw[0], raw[1]]),
            CommType::Ascii => Codec::ascii().decode_raw(&raw[..4], Width::Word)? as u16,
        };
        if subheader != frame_type.response_subheader() {
            return Err(McError::invalid_response(format!(
                "unexpected subheader 0x{:04X}, expected 0x{:04X}",
                subheader,
                frame_type.response_subheader()
            )));
        }

        let serial = match frame_type {
            FrameType::E3 => None,
            FrameType::E4 => {
                let start = codec.field_len(Width::Word);
                Some(codec.decode_raw(&raw[start..start + word], Width::Word)? as u16)
            }
        };

        let end = match Self::frame_len(frame_type, codec, raw)? {
            Some(end) => end,
            None => status_offset + word,
        };
        if end < status_offset + word {
            return Err(McError::invalid_response(format!(
                "declared data length {} cannot hold the end code",
                end - status_offset
            )));
        }
        if raw.len() < end {
            return Err(McError::invalid_response(format!(
                "response truncated: expected {} bytes, got {}",
                end,
                raw.len()
            )));
        }

        let status = codec.decode_raw(&raw[status_offset..status_offset + word], Width::Word)? as u16;
        Ok(Self {
            serial,
            status,
            data: raw[status_offset + word..end].to_vec(),
        })
    }

    /// Returns the total frame length announced by a (possibly partial) response.
    ///
    /// Returns `Ok(None)` while the length field has not been received yet.
    ///
    /// # Errors
    ///
    /// Returns `McError::Decode` if the length field is malformed.
    pub fn frame_len(frame_type: FrameType, codec: &Codec, raw: &[u8]) -> Result<Option<usize>> {
        let offset = frame_type.length_offset(codec.comm_type);
        let word = codec.word_size();
        if raw.len() < offset + word {
            return Ok(None);
        }
        let declared = codec.decode_raw(&raw[offset..offset + word], Width::Word)? as usize;
        Ok(Some(offset + word + declared))
    }

    /// Returns whether the end code is zero.
    pub fn is_success(&self) -> bool {
        self.status == 0
    }

    /// Validates the end code.
    ///
    /// # Errors
    ///
    /// Returns `McError::Plc` for any non-zero end code.
    pub fn check_error(&self) -> Result<()> {
        check_status(self.status)
    }

    /// Returns `len` data bytes starting at `offset`.
    ///
    /// # Errors
    ///
    /// Returns `McError::InvalidResponse` if the data is too short.
    pub fn slice(&self, offset: usize, len: usize) -> Result<&[u8]> {
        self.data.get(offset..offset + len).ok_or_else(|| {
            McError::invalid_response(format!(
                "response data too short: need {} bytes at offset {}, have {}",
                len,
                offset,
                self.data.len()
            ))
        })
    }

    /// Decodes an integer field from the data.
    ///
    /// # Errors
    ///
    /// Returns `McError::InvalidResponse` if the data is too short, or
    /// `McError::Decode` for malformed fields.
    pub fn field(&self, codec: &Codec, offset: usize, width: Width) -> Result<u64> {
        codec.decode_raw(self.slice(offset, codec.field_len(width))?, width)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn binary_3e(status: u16, data: &[u8]) -> Vec<u8> {
        let mut raw = vec![0xD0, 0x00, 0x00, 0xFF, 0xFF, 0x03, 0x00];
        raw.extend(((2 + data.len()) as u16).to_le_bytes());
        raw.extend(status.to_le_bytes());
        raw.extend_from_slice(data);
        raw
    }

    #[test]
    fn test_success_with_data() {
        let raw = binary_3e(0, &[0x01, 0x02, 0x03, 0x04]);
        let response = McResponse::from_bytes(FrameType::E3, &Codec::binary(), &raw).unwrap();
        assert!(response.is_success());
        assert!(response.check_error().is_ok());
        assert_eq!(response.serial, None);
        assert_eq!(response.field(&Codec::binary(), 2, Width::Word).unwrap(), 0x0403);
    }

    #[test]
    fn test_error_status() {
        let raw = binary_3e(0xC059, &[0x00, 0xFF, 0xFF, 0x03, 0x00, 0x01, 0x04, 0x00, 0x00]);
        let response = McResponse::from_bytes(FrameType::E3, &Codec::binary(), &raw).unwrap();
        assert!(!response.is_success());
        assert_eq!(response.check_error().unwrap_err().end_code(), Some(0xC059));
    }

    #[test]
    fn test_ascii_4e() {
        let raw = b"D4000007000000FF03FF00000800001234";
        let response = McResponse::from_bytes(FrameType::E4, &Codec::ascii(), raw).unwrap();
        assert_eq!(response.serial, Some(0x0007));
        assert_eq!(response.status, 0);
        assert_eq!(response.data, b"1234".to_vec());
    }

    #[test]
    fn test_trailing_bytes_ignored() {
        let mut raw = binary_3e(0, &[0xAA, 0xBB]);
        raw.extend([0xCC, 0xDD]);
        let response = McResponse::from_bytes(FrameType::E3, &Codec::binary(), &raw).unwrap();
        assert_eq!(response.data, vec![0xAA, 0xBB]);
    }

    #[test]
    fn test_truncated() {
        let mut raw = binary_3e(0, &[0xAA, 0xBB]);
        raw.pop();
        assert!(matches!(
            McResponse::from_bytes(FrameType::E3, &Codec::binary(), &raw),
            Err(McError::InvalidResponse { .. })
        ));
    }

    #[test]
    fn test_too_short() {
        assert!(McResponse::from_bytes(FrameType::E3, &Codec::binary(), &[0xD0, 0x00]).is_err());
    }

    #[test]
    fn test_wrong_subheader() {
        let mut raw = binary_3e(0, &[]);
        raw[0] = 0x50;
        assert!(McResponse::from_bytes(FrameType::E3, &Codec::binary(), &raw).is_err());
    }

    #[test]
    fn test_frame_len() {
        let raw = binary_3e(0, &[1, 2, 3]);
        assert_eq!(
            McResponse::frame_len(FrameType::E3, &Codec::binary(), &raw[..9]).unwrap(),
            Some(raw.len())
        );
        assert_eq!(
            McResponse::frame_len(FrameType::E3, &Codec::binary(), &raw[..8]).unwrap(),
            None
        );
    }

    #[test]
    fn test_slice_out_of_range() {
        let raw = binary_3e(0, &[1, 2]);
        let response = McResponse::from_bytes(FrameType::E3, &Codec::binary(), &raw).unwrap();
        assert!(response.slice(1, 2).is_err());
    }
}
