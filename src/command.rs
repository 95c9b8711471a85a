//! MC command structures and serialization.
//!
//! Each command builds the request payload that follows the frame header:
//! a command word, a subcommand word and the command-specific fields. All
//! integers go through the [`Codec`] of the session, so the same structure
//! serializes to binary or ASCII.
//!
//! # Command Types
//!
//! ## Device Access
//! - [`BatchReadCommand`] - Read a contiguous range of bits or words
//! - [`BatchWriteWordsCommand`] - Write a contiguous range of words
//! - [`BatchWriteBitsCommand`] - Write a contiguous range of bits
//! - [`RandomReadCommand`] - Read scattered word and double word devices
//! - [`RandomWriteCommand`] - Write scattered word and double word devices
//! - [`RandomWriteBitsCommand`] - Write scattered bit devices
//!
//! ## PLC Control
//! - [`RemoteCommand`] - Remote run, stop, pause, latch clear and reset
//! - [`RemotePasswordCommand`] - Remote lock and unlock
//! - [`LedOffCommand`] - Error LED and indicator LED off
//!
//! ## Diagnostics
//! - [`CpuModelCommand`] - Read the CPU model name and code
//! - [`LoopbackCommand`] - Loopback test
//!
//! # Example
//!
//! ```
//! use melsec_mc::codec::Codec;
//! use melsec_mc::{AccessUnit, BatchReadCommand, DeviceAddress, Dialect, PlcSeries};
//!
//! let dialect = Dialect::new(PlcSeries::Q, Codec::binary());
//! let device = DeviceAddress::parse(PlcSeries::Q, "D100").unwrap();
//! let cmd = BatchReadCommand::new(device, 3, AccessUnit::Word).unwrap();
//! assert_eq!(
//!     cmd.to_bytes(&dialect).unwrap(),
//!     vec![0x01, 0x04, 0x00, 0x00, 0x64, 0x00, 0x00, 0xA8, 0x03, 0x00]
//! );
//! ```

use crate::codec::{Codec, Width};
use crate::device::DeviceAddress;
use crate::error::{McError, Result};
use crate::series::PlcSeries;

/// Batch read command.
pub(crate) const BATCH_READ: u16 = 0x0401;
/// Batch write command.
pub(crate) const BATCH_WRITE: u16 = 0x1401;
/// Random read command.
pub(crate) const RANDOM_READ: u16 = 0x0403;
/// Random write command.
pub(crate) const RANDOM_WRITE: u16 = 0x1402;
/// Remote run command.
pub(crate) const REMOTE_RUN: u16 = 0x1001;
/// Remote stop command.
pub(crate) const REMOTE_STOP: u16 = 0x1002;
/// Remote pause command.
pub(crate) const REMOTE_PAUSE: u16 = 0x1003;
/// Remote latch clear command.
pub(crate) const REMOTE_LATCH_CLEAR: u16 = 0x1005;
/// Remote reset command.
pub(crate) const REMOTE_RESET: u16 = 0x1006;
/// Remote unlock command.
pub(crate) const REMOTE_UNLOCK: u16 = 0x1630;
/// Remote lock command.
pub(crate) const REMOTE_LOCK: u16 = 0x1631;
/// Error LED off command.
pub(crate) const ERROR_LED_OFF: u16 = 0x1617;
/// CPU model read command.
pub(crate) const READ_CPU_MODEL: u16 = 0x0101;
/// Loopback test command.
pub(crate) const LOOPBACK_TEST: u16 = 0x0619;

/// Maximum number of characters in a loopback test.
pub const MAX_LOOPBACK_LEN: usize = 960;

/// Series and codec a payload is serialized for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Dialect {
    /// Target PLC series.
    pub series: PlcSeries,
    /// Wire codec.
    pub codec: Codec,
}

impl Dialect {
    /// Creates a dialect.
    pub fn new(series: PlcSeries, codec: Codec) -> Self {
        Self { series, codec }
    }

    /// Command and subcommand words.
    fn header(&self, command: u16, subcommand: u16) -> Vec<u8> {
        let mut bytes = self.codec.encode_raw(u64::from(command), Width::Word);
        bytes.extend(self.codec.encode_raw(u64::from(subcommand), Width::Word));
        bytes
    }

    /// Subcommand for word unit access.
    pub fn word_subcommand(&self) -> u16 {
        if self.series.is_iqr() {
            0x0002
        } else {
            0x0000
        }
    }

    /// Subcommand for bit unit access.
    pub fn bit_subcommand(&self) -> u16 {
        if self.series.is_iqr() {
            0x0003
        } else {
            0x0001
        }
    }

    fn device(&self, device: &DeviceAddress) -> Result<Vec<u8>> {
        device.encode(self.series, &self.codec)
    }
}

/// Unit of a batch access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessUnit {
    /// One point per bit.
    Bit,
    /// One point per 16-bit word.
    Word,
}

/// Command for reading a contiguous device range.
#[derive(Debug, Clone)]
pub struct BatchReadCommand {
    device: DeviceAddress,
    count: u16,
    unit: AccessUnit,
}

impl BatchReadCommand {
    /// Creates a batch read of `count` points starting at `device`.
    ///
    /// # Errors
    ///
    /// Returns an error if count is 0.
    pub fn new(device: DeviceAddress, count: u16, unit: AccessUnit) -> Result<Self> {
        if count == 0 {
            return Err(McError::invalid_parameter("count", "must be greater than 0"));
        }
        Ok(Self { device, count, unit })
    }

    /// Returns the number of points requested.
    pub fn count(&self) -> u16 {
        self.count
    }

    /// Serializes the payload.
    pub fn to_bytes(&self, dialect: &Dialect) -> Result<Vec<u8>> {
        let subcommand = match self.unit {
            AccessUnit::Bit => dialect.bit_subcommand(),
            AccessUnit::Word => dialect.word_subcommand(),
        };
        let mut bytes = dialect.header(BATCH_READ, subcommand);
        bytes.extend(dialect.device(&self.device)?);
        bytes.extend(dialect.codec.encode_raw(u64::from(self.count), Width::Word));
        Ok(bytes)
    }
}

/// Command for writing a contiguous range of words.
#[derive(Debug, Clone)]
pub struct BatchWriteWordsCommand {
    device: DeviceAddress,
    values: Vec<u16>,
}

impl BatchWriteWordsCommand {
    /// Creates a batch word write.
    ///
    /// # Errors
    ///
    /// Returns an error if `values` is empty or longer than a word count can express.
    pub fn new(device: DeviceAddress, values: &[u16]) -> Result<Self> {
        check_points("values", values.len())?;
        Ok(Self {
            device,
            values: values.to_vec(),
        })
    }

    /// Serializes the payload.
    pub fn to_bytes(&self, dialect: &Dialect) -> Result<Vec<u8>> {
        let codec = &dialect.codec;
        let mut bytes = dialect.header(BATCH_WRITE, dialect.word_subcommand());
        bytes.extend(dialect.device(&self.device)?);
        bytes.extend(codec.encode_raw(self.values.len() as u64, Width::Word));
        for value in &self.values {
            bytes.extend(codec.encode_raw(u64::from(*value), Width::Word));
        }
        Ok(bytes)
    }
}

/// Command for writing a contiguous range of bits.
#[derive(Debug, Clone)]
pub struct BatchWriteBitsCommand {
    device: DeviceAddress,
    values: Vec<bool>,
}

impl BatchWriteBitsCommand {
    /// Creates a batch bit write.
    ///
    /// # Errors
    ///
    /// Returns an error if `values` is empty or longer than a word count can express.
    pub fn new(device: DeviceAddress, values: &[bool]) -> Result<Self> {
        check_points("values", values.len())?;
        Ok(Self {
            device,
            values: values.to_vec(),
        })
    }

    /// Serializes the payload. Binary mode packs two points per byte.
    pub fn to_bytes(&self, dialect: &Dialect) -> Result<Vec<u8>> {
        let codec = &dialect.codec;
        let mut bytes = dialect.header(BATCH_WRITE, dialect.bit_subcommand());
        bytes.extend(dialect.device(&self.device)?);
        bytes.extend(codec.encode_raw(self.values.len() as u64, Width::Word));
        bytes.extend(codec.encode_bits(&self.values));
        Ok(bytes)
    }
}

fn check_points(parameter: &str, len: usize) -> Result<()> {
    if len == 0 {
        return Err(McError::invalid_parameter(parameter, "must not be empty"));
    }
    if len > usize::from(u16::MAX) {
        return Err(McError::invalid_parameter(
            parameter,
            format!("must not exceed {} points", u16::MAX),
        ));
    }
    Ok(())
}

/// Command for reading scattered word and double word devices.
#[derive(Debug, Clone)]
pub struct RandomReadCommand {
    words: Vec<DeviceAddress>,
    dwords: Vec<DeviceAddress>,
}

impl RandomReadCommand {
    /// Creates a random read.
    ///
    /// # Errors
    ///
    /// Returns an error if both lists are empty.
    pub fn new(words: Vec<DeviceAddress>, dwords: Vec<DeviceAddress>) -> Result<Self> {
        if words.is_empty() && dwords.is_empty() {
            return Err(McError::invalid_parameter("devices", "must not be empty"));
        }
        Ok(Self { words, dwords })
    }

    /// Serializes the payload.
    ///
    /// # Errors
    ///
    /// Returns `McError::ValueRange` if either list has more than 255 entries.
    pub fn to_bytes(&self, dialect: &Dialect) -> Result<Vec<u8>> {
        let codec = &dialect.codec;
        let mut bytes = dialect.header(RANDOM_READ, dialect.word_subcommand());
        bytes.extend(codec.encode_unsigned(self.words.len() as u64, Width::Byte)?);
        bytes.extend(codec.encode_unsigned(self.dwords.len() as u64, Width::Byte)?);
        for device in self.words.iter().chain(&self.dwords) {
            bytes.extend(dialect.device(device)?);
        }
        Ok(bytes)
    }
}

/// Command for writing scattered word and double word devices.
#[derive(Debug, Clone)]
pub struct RandomWriteCommand {
    words: Vec<(DeviceAddress, u16)>,
    dwords: Vec<(DeviceAddress, u32)>,
}

impl RandomWriteCommand {
    /// Creates a random write. Values are raw bit patterns.
    ///
    /// # Errors
    ///
    /// Returns an error if both lists are empty.
    pub fn new(words: Vec<(DeviceAddress, u16)>, dwords: Vec<(DeviceAddress, u32)>) -> Result<Self> {
        if words.is_empty() && dwords.is_empty() {
            return Err(McError::invalid_parameter("devices", "must not be empty"));
        }
        Ok(Self { words, dwords })
    }

    /// Serializes the payload.
    ///
    /// # Errors
    ///
    /// Returns `McError::ValueRange` if either list has more than 255 entries.
    pub fn to_bytes(&self, dialect: &Dialect) -> Result<Vec<u8>> {
        let codec = &dialect.codec;
        let mut bytes = dialect.header(RANDOM_WRITE, dialect.word_subcommand());
        bytes.extend(codec.encode_unsigned(self.words.len() as u64, Width::Byte)?);
        bytes.extend(codec.encode_unsigned(self.dwords.len() as u64, Width::Byte)?);
        for (device, value) in &self.words {
            bytes.extend(dialect.device(device)?);
            bytes.extend(codec.encode_raw(u64::from(*value), Width::Word));
        }
        for (device, value) in &self.dwords {
            bytes.extend(dialect.device(device)?);
            bytes.extend(codec.encode_raw(u64::from(*value), Width::DWord));
        }
        Ok(bytes)
    }
}

/// Command for writing scattered bit devices.
#[derive(Debug, Clone)]
pub struct RandomWriteBitsCommand {
    points: Vec<(DeviceAddress, bool)>,
}

impl RandomWriteBitsCommand {
    /// Creates a random bit write.
    ///
    /// # Errors
    ///
    /// Returns an error if `points` is empty.
    pub fn new(points: Vec<(DeviceAddress, bool)>) -> Result<Self> {
        if points.is_empty() {
            return Err(McError::invalid_parameter("devices", "must not be empty"));
        }
        Ok(Self { points })
    }

    /// Serializes the payload. Each value is a byte (a word on iQ-R).
    ///
    /// # Errors
    ///
    /// Returns `McError::ValueRange` for more than 255 points.
    pub fn to_bytes(&self, dialect: &Dialect) -> Result<Vec<u8>> {
        let codec = &dialect.codec;
        let value_width = if dialect.series.is_iqr() {
            Width::Word
        } else {
            Width::Byte
        };
        let mut bytes = dialect.header(RANDOM_WRITE, dialect.bit_subcommand());
        bytes.extend(codec.encode_unsigned(self.points.len() as u64, Width::Byte)?);
        for (device, value) in &self.points {
            bytes.extend(dialect.device(device)?);
            bytes.extend(codec.encode_raw(u64::from(*value), value_width));
        }
        Ok(bytes)
    }
}

/// Remote operation commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteCommand {
    /// Switch to RUN.
    Run {
        /// Execute even if another device holds the operation right.
        force: bool,
        /// Device memory clear mode (0 none, 1 outside latch range, 2 all).
        clear_mode: u8,
    },
    /// Switch to STOP.
    Stop,
    /// Switch to PAUSE.
    Pause {
        /// Execute even if another device holds the operation right.
        force: bool,
    },
    /// Clear latched devices.
    LatchClear,
    /// Reset the CPU.
    Reset,
}

impl RemoteCommand {
    /// Creates a remote run command.
    ///
    /// # Errors
    ///
    /// Returns an error if `clear_mode` is not 0, 1 or 2.
    ///
    /// # Example
    ///
    /// ```
    /// use melsec_mc::RemoteCommand;
    ///
    /// assert!(RemoteCommand::run(false, 2).is_ok());
    /// assert!(RemoteCommand::run(false, 3).is_err());
    /// ```
    pub fn run(force: bool, clear_mode: u8) -> Result<Self> {
        if clear_mode > 2 {
            return Err(McError::invalid_parameter(
                "clear_mode",
                format!("must be 0, 1 or 2, got {}", clear_mode),
            ));
        }
        Ok(RemoteCommand::Run { force, clear_mode })
    }

    fn mode(force: bool) -> u64 {
        if force {
            0x0003
        } else {
            0x0001
        }
    }

    /// Serializes the payload.
    pub fn to_bytes(&self, dialect: &Dialect) -> Vec<u8> {
        let codec = &dialect.codec;
        match *self {
            RemoteCommand::Run { force, clear_mode } => {
                let mut bytes = dialect.header(REMOTE_RUN, 0x0000);
                bytes.extend(codec.encode_raw(Self::mode(force), Width::Word));
                bytes.extend(codec.encode_raw(u64::from(clear_mode), Width::Byte));
                bytes.extend(codec.encode_raw(0, Width::Byte));
                bytes
            }
            RemoteCommand::Pause { force } => {
                let mut bytes = dialect.header(REMOTE_PAUSE, 0x0000);
                bytes.extend(codec.encode_raw(Self::mode(force), Width::Word));
                bytes
            }
            RemoteCommand::Stop | RemoteCommand::LatchClear | RemoteCommand::Reset => {
                let command = match self {
                    RemoteCommand::Stop => REMOTE_STOP,
                    RemoteCommand::LatchClear => REMOTE_LATCH_CLEAR,
                    _ => REMOTE_RESET,
                };
                let mut bytes = dialect.header(command, 0x0000);
                bytes.extend(codec.encode_raw(0x0001, Width::Word));
                bytes
            }
        }
    }
}

/// Remote password lock or unlock.
#[derive(Debug, Clone)]
pub struct RemotePasswordCommand {
    lock: bool,
    password: String,
}

impl RemotePasswordCommand {
    /// Creates a remote lock command.
    ///
    /// # Errors
    ///
    /// See [`RemotePasswordCommand::unlock`].
    pub fn lock(series: PlcSeries, password: &str) -> Result<Self> {
        check_password(series, password)?;
        Ok(Self {
            lock: true,
            password: password.to_string(),
        })
    }

    /// Creates a remote unlock command.
    ///
    /// # Errors
    ///
    /// Returns an error if the password is not ASCII or its length does not
    /// suit the series: exactly 4 characters for Q/L/QnA/iQ-L, 6 to 32 for iQ-R.
    ///
    /// # Example
    ///
    /// ```
    /// use melsec_mc::{PlcSeries, RemotePasswordCommand};
    ///
    /// assert!(RemotePasswordCommand::unlock(PlcSeries::Q, "abcd").is_ok());
    /// assert!(RemotePasswordCommand::unlock(PlcSeries::IqR, "abcd").is_err());
    /// ```
    pub fn unlock(series: PlcSeries, password: &str) -> Result<Self> {
        check_password(series, password)?;
        Ok(Self {
            lock: false,
            password: password.to_string(),
        })
    }

    /// Serializes the payload.
    pub fn to_bytes(&self, dialect: &Dialect) -> Vec<u8> {
        let command = if self.lock { REMOTE_LOCK } else { REMOTE_UNLOCK };
        let mut bytes = dialect.header(command, 0x0000);
        bytes.extend(
            dialect
                .codec
                .encode_raw(self.password.len() as u64, Width::Word),
        );
        bytes.extend_from_slice(self.password.as_bytes());
        bytes
    }
}

fn check_password(series: PlcSeries, password: &str) -> Result<()> {
    if !password.is_ascii() {
        return Err(McError::invalid_parameter(
            "password",
            "must contain only ASCII characters",
        ));
    }
    let len = password.len();
    if series.is_iqr() {
        if !(6..=32).contains(&len) {
            return Err(McError::invalid_parameter(
                "password",
                format!("length must be 6 to 32 characters for {}, got {}", series, len),
            ));
        }
    } else if len != 4 {
        return Err(McError::invalid_parameter(
            "password",
            format!("length must be 4 characters for {}, got {}", series, len),
        ));
    }
    Ok(())
}

/// Error LED or indicator LED off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedOffCommand {
    subcommand: u16,
}

impl LedOffCommand {
    /// Turns the error LED off and clears the error.
    pub fn error_led() -> Self {
        Self { subcommand: 0x0000 }
    }

    /// Turns the COM.ERR indicator off for `channel` (1, 2 or 3 for both).
    ///
    /// iQ-R has a single indicator and ignores the channel.
    ///
    /// # Errors
    ///
    /// Returns an error for any other channel outside iQ-R.
    pub fn indicator(series: PlcSeries, channel: u8) -> Result<Self> {
        let subcommand = if series.is_iqr() {
            0x0001
        } else {
            match channel {
                1 => 0x0005,
                2 => 0x000A,
                3 => 0x000F,
                other => {
                    return Err(McError::invalid_parameter(
                        "channel",
                        format!("must be 1, 2 or 3, got {}", other),
                    ))
                }
            }
        };
        Ok(Self { subcommand })
    }

    /// Serializes the payload.
    pub fn to_bytes(&self, dialect: &Dialect) -> Vec<u8> {
        dialect.header(ERROR_LED_OFF, self.subcommand)
    }
}

/// CPU model name read.
#[derive(Debug, Clone, Copy, Default)]
pub struct CpuModelCommand;

impl CpuModelCommand {
    /// Length of the space padded model name in the response.
    pub const NAME_LEN: usize = 16;

    /// Serializes the payload.
    pub fn to_bytes(&self, dialect: &Dialect) -> Vec<u8> {
        dialect.header(READ_CPU_MODEL, 0x0000)
    }
}

/// Loopback test.
#[derive(Debug, Clone)]
pub struct LoopbackCommand {
    data: String,
}

impl LoopbackCommand {
    /// Creates a loopback test echoing `data`.
    ///
    /// # Errors
    ///
    /// Returns an error unless `data` is 1 to 960 ASCII alphanumeric characters.
    pub fn new(data: &str) -> Result<Self> {
        if data.is_empty() || data.len() > MAX_LOOPBACK_LEN {
            return Err(McError::invalid_parameter(
                "data",
                format!("length must be 1 to {}, got {}", MAX_LOOPBACK_LEN, data.len()),
            ));
        }
        if !data.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(McError::invalid_parameter(
                "data",
                "must contain only alphanumeric characters",
            ));
        }
        Ok(Self {
            data: data.to_string(),
        })
    }

    /// Returns the echo data.
    pub fn data(&self) -> &str {
        &self.data
    }

    /// Serializes the payload.
    pub fn to_bytes(&self, dialect: &Dialect) -> Vec<u8> {
        let mut bytes = dialect.header(LOOPBACK_TEST, 0x0000);
        bytes.extend(dialect.codec.encode_raw(self.data.len() as u64, Width::Word));
        bytes.extend_from_slice(self.data.as_bytes());
        bytes
    }
}
