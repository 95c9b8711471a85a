//! Tags and result records returned by the client.

use std::fmt;

use crate::datatype::{DataType, Value};

/// A typed read/write unit: one logical device with its data type.
///
/// `error` is set when the element failed on its own (for example an
/// unknown data type) inside a heterogeneous [`Client::read`] or
/// [`Client::write`](crate::Client::write).
///
/// [`Client::read`]: crate::Client::read
///
/// # Example
///
/// ```
/// use melsec_mc::{DataType, Tag};
///
/// let tag = Tag::with_value("D100", DataType::Float, 1.5f32);
/// assert!(tag.is_ok());
/// assert_eq!(tag.to_string(), "D100, 1.5, FLOAT, None");
///
/// let read = Tag::new("D200", "SDWORD");
/// assert!(!read.is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tag {
    /// Device address, e.g. `"D100"`.
    pub device: String,
    /// Value read or to be written.
    pub value: Option<Value>,
    /// Data type symbol or name.
    pub data_type: String,
    /// Per-element error message.
    pub error: Option<String>,
}

impl Tag {
    /// Creates a tag without a value, for reading.
    pub fn new(device: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            device: device.into(),
            value: None,
            data_type: data_type.into(),
            error: None,
        }
    }

    /// Creates a tag carrying a value, for writing.
    pub fn with_value(
        device: impl Into<String>,
        data_type: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        Self {
            value: Some(value.into()),
            ..Self::new(device, data_type)
        }
    }

    /// Returns a copy of this tag carrying `error`.
    pub fn with_error(&self, error: impl fmt::Display) -> Self {
        Self {
            error: Some(error.to_string()),
            ..self.clone()
        }
    }

    /// Returns whether the tag holds a value and no error.
    pub fn is_ok(&self) -> bool {
        self.value.is_some() && self.error.is_none()
    }
}

impl From<DataType> for String {
    fn from(data_type: DataType) -> Self {
        data_type.name().to_string()
    }
}

fn or_none<T: fmt::Display>(value: &Option<T>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => "None".to_string(),
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}, {}, {}, {}",
            self.device,
            or_none(&self.value),
            self.data_type,
            or_none(&self.error)
        )
    }
}

/// CPU model name and code.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CpuModel {
    /// Model name with padding removed, e.g. `"Q03UDVCPU"`.
    pub name: String,
    /// Model code as four hex digits, e.g. `"0366"`.
    pub code: String,
}

impl fmt::Display for CpuModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (0x{})", self.name, self.code)
    }
}

/// Operating state from `SD203`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CpuState {
    /// RUN.
    Run,
    /// STEP-RUN.
    StepRun,
    /// STOP.
    Stop,
    /// PAUSE.
    Pause,
    /// Not readable.
    Unknown,
}

impl CpuState {
    pub(crate) fn from_bits(bits: u16) -> Option<Self> {
        match bits {
            0 => Some(CpuState::Run),
            1 => Some(CpuState::StepRun),
            2 => Some(CpuState::Stop),
            3 => Some(CpuState::Pause),
            _ => None,
        }
    }
}

impl fmt::Display for CpuState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CpuState::Run => "Run",
            CpuState::StepRun => "Step Run",
            CpuState::Stop => "Stop",
            CpuState::Pause => "Pause",
            CpuState::Unknown => "Unknown",
        })
    }
}

/// Cause of the last STOP/PAUSE from `SD203`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StopCause {
    /// RUN/STOP switch.
    BySwitch,
    /// Remote contact.
    RemoteRelay,
    /// Remote operation from a device.
    RemoteDevice,
    /// Program instruction.
    ByProgram,
    /// Error.
    ByError,
    /// Not readable.
    Unknown,
}

impl StopCause {
    pub(crate) fn from_bits(bits: u16) -> Option<Self> {
        match bits {
            0 => Some(StopCause::BySwitch),
            1 => Some(StopCause::RemoteRelay),
            2 => Some(StopCause::RemoteDevice),
            3 => Some(StopCause::ByProgram),
            4 => Some(StopCause::ByError),
            _ => None,
        }
    }
}

impl fmt::Display for StopCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StopCause::BySwitch => "By Switch",
            StopCause::RemoteRelay => "Remote Relay",
            StopCause::RemoteDevice => "Remote Device",
            StopCause::ByProgram => "By Program",
            StopCause::ByError => "By Error",
            StopCause::Unknown => "Unknown",
        })
    }
}

/// CPU operating state and stop cause.
///
/// Either field is `None` when the register held a value outside the known set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CpuStatus {
    /// Operating state.
    pub state: Option<CpuState>,
    /// Stop/pause cause.
    pub cause: Option<StopCause>,
}

impl CpuStatus {
    /// Status reported when the register could not be read.
    pub const UNKNOWN: CpuStatus = CpuStatus {
        state: Some(CpuState::Unknown),
        cause: Some(StopCause::Unknown),
    };

    /// Decodes the `SD203` word.
    pub fn from_register(word: u16) -> Self {
        Self {
            state: CpuState::from_bits(word & 0x800F),
            cause: StopCause::from_bits((word & 0x80F0) >> 4),
        }
    }
}

impl fmt::Display for CpuStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", or_none(&self.state), or_none(&self.cause))
    }
}

/// RUN/STOP switch position from `SD200`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SwitchStatus {
    /// RUN.
    Run,
    /// STOP.
    Stop,
    /// L.CLR.
    LatchClear,
    /// Not readable.
    Unknown,
}

impl SwitchStatus {
    /// Decodes the `SD200` word; unknown positions yield `None`.
    pub fn from_register(word: u16) -> Option<Self> {
        match word {
            0 => Some(SwitchStatus::Run),
            1 => Some(SwitchStatus::Stop),
            2 => Some(SwitchStatus::LatchClear),
            _ => None,
        }
    }
}

impl fmt::Display for SwitchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SwitchStatus::Run => "Run",
            SwitchStatus::Stop => "Stop",
            SwitchStatus::LatchClear => "Latch Clear",
            SwitchStatus::Unknown => "Unknown",
        })
    }
}

/// Echo returned by a loopback test.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LoopbackResult {
    /// Length reported by the PLC.
    pub length: usize,
    /// Echoed data.
    pub data: String,
}

impl fmt::Display for LoopbackResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.length, self.data)
    }
}
