//! Error types for the MC protocol.
//!
//! Besides the [`McError`] enum this module holds the end-code table used to
//! turn a non-zero response status into a readable description.

use std::fmt;
use std::io;
use thiserror::Error;

/// Result type alias for MC protocol operations.
pub type Result<T> = std::result::Result<T, McError>;

/// Errors that can occur during MC protocol communication.
#[derive(Debug, Error)]
pub enum McError {
    /// Unsupported PLC series name.
    #[error("PLC type must be \"Q\", \"L\", \"QnA\", \"iQ-L\" or \"iQ-R\", got \"{0}\"")]
    PlcType(String),

    /// Unsupported communication (encoding) type.
    #[error("communication type must be \"binary\" or \"ascii\", got \"{0}\"")]
    CommType(String),

    /// Device name not available on the selected PLC series.
    #[error(
        "device \"{device}\" is not supported by \"{series}\" series PLC. Hexadecimal devices \
         (X, Y, B, W, SB, SW, DX, DY, ZR) whose number starts with a letter need a leading zero \
         between device name and number (e.g. XFFF -> X0FFF)"
    )]
    DeviceCode {
        /// PLC series name.
        series: String,
        /// Device name as parsed from the address.
        device: String,
    },

    /// Unknown data type symbol or name.
    #[error("unknown data type \"{0}\"")]
    DataType(String),

    /// Non-zero end code returned by the PLC.
    #[error("{}", format_end_code(.code))]
    Plc {
        /// Raw end code.
        code: u16,
    },

    /// Value does not fit the target field.
    #[error("value {value} exceeds the range of a {bits}-bit field")]
    ValueRange {
        /// Offending value rendered as text.
        value: String,
        /// Field width in bits.
        bits: u32,
    },

    /// Wire data could not be decoded.
    #[error("could not decode value: {reason}")]
    Decode {
        /// Description of the decoding failure.
        reason: String,
    },

    /// Invalid parameter provided.
    #[error("invalid parameter '{parameter}': {reason}")]
    InvalidParameter {
        /// Name of the invalid parameter.
        parameter: String,
        /// Description of why the parameter is invalid.
        reason: String,
    },

    /// Invalid response received from the PLC.
    #[error("invalid response: {reason}")]
    InvalidResponse {
        /// Description of the response error.
        reason: String,
    },

    /// The PLC answered successfully but the content does not match the request.
    #[error("response content mismatch: expected length {expected}, received {received}")]
    ContentMismatch {
        /// Expected length.
        expected: usize,
        /// Length reported by the PLC.
        received: usize,
    },

    /// Operation attempted without an open connection.
    #[error("socket is not connected, call connect() first")]
    NotConnected,

    /// Communication timeout.
    #[error("communication timeout")]
    Timeout,

    /// I/O error during communication.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl McError {
    /// Creates a new `Plc` error from an end code.
    ///
    /// # Example
    ///
    /// ```
    /// use melsec_mc::McError;
    ///
    /// let err = McError::plc(0xC056);
    /// assert!(err.to_string().contains("exceeds the maximum address"));
    /// ```
    pub fn plc(code: u16) -> Self {
        Self::Plc { code }
    }

    /// Creates a new `DeviceCode` error.
    pub fn device_code(series: impl fmt::Display, device: impl Into<String>) -> Self {
        Self::DeviceCode {
            series: series.to_string(),
            device: device.into(),
        }
    }

    /// Creates a new `ValueRange` error.
    pub fn value_range(value: impl fmt::Display, bits: u32) -> Self {
        Self::ValueRange {
            value: value.to_string(),
            bits,
        }
    }

    /// Creates a new `Decode` error.
    pub fn decode(reason: impl Into<String>) -> Self {
        Self::Decode {
            reason: reason.into(),
        }
    }

    /// Creates a new `InvalidParameter` error.
    ///
    /// # Example
    ///
    /// ```
    /// use melsec_mc::McError;
    ///
    /// let err = McError::invalid_parameter("password", "length must be 4");
    /// ```
    pub fn invalid_parameter(parameter: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            parameter: parameter.into(),
            reason: reason.into(),
        }
    }

    /// Creates a new `InvalidResponse` error.
    pub fn invalid_response(reason: impl Into<String>) -> Self {
        Self::InvalidResponse {
            reason: reason.into(),
        }
    }

    /// Creates a new `ContentMismatch` error.
    pub fn content_mismatch(expected: usize, received: usize) -> Self {
        Self::ContentMismatch { expected, received }
    }

    /// Returns the PLC end code if this is a `Plc` error.
    pub fn end_code(&self) -> Option<u16> {
        match self {
            Self::Plc { code } => Some(*code),
            _ => None,
        }
    }
}

/// Renders an end code as `0xC056: <description>`, or the bare code when unknown.
fn format_end_code(code: &u16) -> String {
    match mc_error_description(*code) {
        Some(text) => format!("0x{:04X}: {}", code, text),
        None => format!("0x{:04X}", code),
    }
}

/// Returns the description of a known MC end code.
///
/// Unknown codes return `None`; they are still errors, see [`check_status`].
///
/// # Example
///
/// ```
/// use melsec_mc::mc_error_description;
///
/// assert!(mc_error_description(0xC059).is_some());
/// assert!(mc_error_description(0x9999).is_none());
/// ```
pub fn mc_error_description(code: u16) -> Option<&'static str> {
    let text = match code {
        0x0050 => {
            "When \"Communication Data Code\" is set to ASCII Code, ASCII code data that cannot \
             be converted to binary were received."
        }
        0x0051..=0x0054 => "The number of read or write points is outside the allowable range.",
        0x0055 => {
            "Although online change is disabled, the connected device requested the RUN-state \
             CPU module for data writing."
        }
        0xC056 => "The read or write request exceeds the maximum address.",
        0xC058 => {
            "The request data length after ASCII-to-binary conversion does not match the data \
             size of the character area (a part of text data)."
        }
        0xC059 => {
            "The command and/or subcommand are specified incorrectly. The CPU module does not \
             support the command and/or subcommand."
        }
        0xC05B => "The CPU module cannot read data from or write data to the specified device.",
        0xC05C => {
            "The request data is incorrect. (e.g. reading or writing data in units of bits from \
             or to a word device)"
        }
        0xC05D => "No monitor registration.",
        0xC05F => "The request cannot be executed to the CPU module.",
        0xC060 => {
            "The request data is incorrect. (e.g. incorrect specification of data for bit devices)"
        }
        0xC061 => {
            "The request data length does not match the number of data in the character area \
             (a part of text data)."
        }
        0xC06F => {
            "The CPU module received a request message in ASCII format when \"Communication Data \
             Code\" is set to Binary Code, or received it in binary format when the setting is \
             set to ASCII Code."
        }
        0xC070 => "The device memory extension cannot be specified for the target station.",
        0xC0B5 => "The CPU module cannot handle the data specified.",
        0xC200 => "The remote password is incorrect.",
        0xC201 => {
            "The port used for communication is locked with the remote password. Or, because of \
             the remote password lock status with \"Communication Data Code\" set to ASCII Code, \
             the subcommand and later part cannot be converted to a binary code."
        }
        0xC204 => {
            "The connected device is different from the one that requested for unlock \
             processing of the remote password."
        }
        _ => return None,
    };
    Some(text)
}

/// Checks a response end code.
///
/// # Errors
///
/// Returns `McError::Plc` for every non-zero code, known or not.
///
/// # Example
///
/// ```
/// use melsec_mc::check_status;
///
/// assert!(check_status(0x0000).is_ok());
/// assert!(check_status(0x9999).is_err());
/// ```
pub fn check_status(code: u16) -> Result<()> {
    if code == 0 {
        Ok(())
    } else {
        Err(McError::plc(code))
    }
}
