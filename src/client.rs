//! High-level MC client for communicating with MELSEC PLCs.
//!
//! This module provides the [`Client`] struct, which is the primary interface
//! for communicating with Mitsubishi PLCs using the MC protocol.
//!
//! # Overview
//!
//! The client provides a high-level API that handles:
//! - Command construction and serialization for the configured series and encoding
//! - Frame reassembly keyed on the response data length
//! - Response parsing and end code checking
//! - Typed tag access spanning several word devices
//!
//! # Example
//!
//! ```no_run
//! use melsec_mc::{Client, ClientConfig, DataType, PlcSeries, Tag};
//!
//! let config = ClientConfig::new("192.168.1.10", PlcSeries::Q).with_port(5007);
//! let mut client = Client::new(config);
//! client.connect()?;
//!
//! let words = client.batch_read_words("D100", 10)?;
//! client.batch_write_bits("M0", &[true, false, true])?;
//!
//! let tags = client.read(&[Tag::new("D200", DataType::Float), Tag::new("D210", "h")])?;
//! for tag in &tags {
//!     println!("{}", tag);
//! }
//! client.close()?;
//! # Ok::<(), melsec_mc::McError>(())
//! ```
//!
//! # Configuration
//!
//! The [`ClientConfig`] struct allows customization of:
//! - PLC host and port
//! - PLC series, frame type, encoding and byte order
//! - Access route and monitoring timer
//! - Reconnection behaviour after a remote reset
//!
//! # Thread Safety
//!
//! All operations take `&mut self`: one request is sent and its response fully
//! consumed before the next one. Share a client between threads behind a mutex.

use std::thread;
use std::time::Duration;

use chrono::{Datelike, Local, NaiveDate, NaiveDateTime, Timelike, Utc};
use tracing::{debug, info, warn};

use crate::codec::{join_words, raw_to_value, split_words, value_to_raw, Codec, CommType, Endian, Width};
use crate::command::{
    AccessUnit, BatchReadCommand, BatchWriteBitsCommand, BatchWriteWordsCommand, CpuModelCommand,
    Dialect, LedOffCommand, LoopbackCommand, RandomReadCommand, RandomWriteBitsCommand,
    RandomWriteCommand, RemoteCommand, RemotePasswordCommand,
};
use crate::datatype::{DataType, Value};
use crate::device::{DeviceAddress, DeviceClass};
use crate::error::{McError, Result};
use crate::frame::{AccessRoute, FrameHeader, FrameType};
use crate::response::McResponse;
use crate::series::PlcSeries;
use crate::tag::{CpuModel, CpuStatus, LoopbackResult, SwitchStatus, Tag};
use crate::transport::{TcpTransport, Transport, DEFAULT_MC_PORT};

/// Default monitoring timer in 250 ms units (1 second).
pub const DEFAULT_TIMER: u16 = 4;

/// Largest monitoring timer accepted by [`AccessOptions::timer_sec`].
pub const MAX_TIMER_SEC: u16 = 16383;

/// Socket timeout used while waiting for the remote reset answer.
const RESET_TIMEOUT: Duration = Duration::from_secs(1);

/// Retry policy applied when a remote reset drops the connection.
///
/// The PLC may close the TCP session while resetting. The client then waits
/// `backoff` and reconnects up to `attempts` times; the last failure is returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    /// Number of reconnection attempts.
    pub attempts: u32,
    /// Wait before each attempt.
    pub backoff: Duration,
}

impl Default for ReconnectPolicy {
    /// One attempt after one second.
    fn default() -> Self {
        Self {
            attempts: 1,
            backoff: Duration::from_secs(1),
        }
    }
}

/// Configuration for creating an MC client.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ClientConfig {
    /// PLC host name or IP address.
    pub host: String,
    /// PLC TCP port.
    pub port: u16,
    /// PLC series.
    pub series: PlcSeries,
    /// Frame variant.
    pub frame_type: FrameType,
    /// Wire encoding.
    pub comm_type: CommType,
    /// Byte order of binary fields.
    pub endian: Endian,
    /// Target route.
    pub route: AccessRoute,
    /// Monitoring timer in 250 ms units.
    pub timer: u16,
    /// 4E serial number.
    pub serial: u16,
    /// Remote reset reconnection policy.
    #[cfg_attr(feature = "serde", serde(skip))]
    pub reconnect: ReconnectPolicy,
}

impl ClientConfig {
    /// Creates a configuration with defaults: port 5007, 3E frame, binary,
    /// little-endian, own-station route and a 1 second monitoring timer.
    ///
    /// # Example
    ///
    /// ```
    /// use melsec_mc::{ClientConfig, PlcSeries};
    /// use std::time::Duration;
    ///
    /// let config = ClientConfig::new("192.168.1.10", PlcSeries::IqR);
    /// assert_eq!(config.port, 5007);
    /// assert_eq!(config.socket_timeout(), Duration::from_secs(2));
    /// ```
    pub fn new(host: impl Into<String>, series: PlcSeries) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_MC_PORT,
            series,
            frame_type: FrameType::E3,
            comm_type: CommType::Binary,
            endian: Endian::Little,
            route: AccessRoute::default(),
            timer: DEFAULT_TIMER,
            serial: 0,
            reconnect: ReconnectPolicy::default(),
        }
    }

    /// Sets the PLC port (default is 5007).
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the frame type (default is 3E).
    ///
    /// # Example
    ///
    /// ```
    /// use melsec_mc::frame::FrameType;
    /// use melsec_mc::{ClientConfig, PlcSeries};
    ///
    /// let config = ClientConfig::new("192.168.1.10", PlcSeries::Q)
    ///     .with_frame_type(FrameType::E4)
    ///     .with_serial(0x1234);
    /// ```
    pub fn with_frame_type(mut self, frame_type: FrameType) -> Self {
        self.frame_type = frame_type;
        self
    }

    /// Sets the communication type (default is binary).
    pub fn with_comm_type(mut self, comm_type: CommType) -> Self {
        self.comm_type = comm_type;
        self
    }

    /// Sets the byte order of binary fields (default is little-endian).
    pub fn with_endian(mut self, endian: Endian) -> Self {
        self.endian = endian;
        self
    }

    /// Sets the access route.
    pub fn with_route(mut self, route: AccessRoute) -> Self {
        self.route = route;
        self
    }

    /// Sets the monitoring timer in 250 ms units.
    pub fn with_timer(mut self, timer: u16) -> Self {
        self.timer = timer;
        self
    }

    /// Sets the 4E serial number.
    pub fn with_serial(mut self, serial: u16) -> Self {
        self.serial = serial;
        self
    }

    /// Sets the remote reset reconnection policy.
    pub fn with_reconnect_policy(mut self, policy: ReconnectPolicy) -> Self {
        self.reconnect = policy;
        self
    }

    /// Socket timeout: the monitoring timer plus one second.
    pub fn socket_timeout(&self) -> Duration {
        Duration::from_millis(u64::from(self.timer) * 250) + Duration::from_secs(1)
    }

    /// Codec for the configured encoding and byte order.
    pub fn codec(&self) -> Codec {
        Codec::new(self.comm_type, self.endian)
    }

    /// Dialect for the configured series and codec.
    pub fn dialect(&self) -> Dialect {
        Dialect::new(self.series, self.codec())
    }
}

/// Access options changeable on a live client.
///
/// Unset fields keep their current value.
///
/// # Example
///
/// ```
/// use melsec_mc::codec::CommType;
/// use melsec_mc::AccessOptions;
///
/// let options = AccessOptions {
///     comm_type: Some(CommType::Ascii),
///     timer_sec: Some(2),
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccessOptions {
    /// Wire encoding.
    pub comm_type: Option<CommType>,
    /// Network number.
    pub network: Option<u8>,
    /// PC number.
    pub pc: Option<u8>,
    /// Module I/O number.
    pub module_io: Option<u16>,
    /// Module station number.
    pub module_station: Option<u8>,
    /// Monitoring timer in seconds (0 to 16383).
    pub timer_sec: Option<u16>,
}

/// MC client for communicating with MELSEC PLCs.
///
/// Each operation produces exactly one request and consumes one response,
/// except the documented composite operations (typed tag access, PLC clock,
/// CPU status). The only automatic reconnection is the one after
/// [`Client::remote_reset`].
pub struct Client<T: Transport = TcpTransport> {
    transport: T,
    config: ClientConfig,
}

impl Client<TcpTransport> {
    /// Creates a disconnected client using TCP.
    pub fn new(config: ClientConfig) -> Self {
        Self::with_transport(config, TcpTransport::new())
    }
}

impl<T: Transport> Client<T> {
    /// Creates a client on top of an existing transport.
    pub fn with_transport(config: ClientConfig, transport: T) -> Self {
        Self { transport, config }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Returns the transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Returns the transport mutably.
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Returns whether the transport is connected.
    pub fn is_connected(&self) -> bool {
        self.transport.is_connected()
    }

    /// Connects to the configured host and port.
    ///
    /// # Errors
    ///
    /// Returns an I/O or timeout error if the connection fails.
    pub fn connect(&mut self) -> Result<()> {
        self.transport.set_timeout(self.config.socket_timeout())?;
        self.transport.connect(&self.config.host, self.config.port)?;
        info!(host = %self.config.host, port = self.config.port, series = %self.config.series, "connected");
        Ok(())
    }

    /// Closes the connection.
    pub fn close(&mut self) -> Result<()> {
        self.transport.close()?;
        info!(host = %self.config.host, "connection closed");
        Ok(())
    }

    /// Changes encoding, route or timer.
    ///
    /// When connected, the socket timeout follows the new timer immediately.
    ///
    /// # Errors
    ///
    /// Returns an error if `timer_sec` exceeds 16383.
    pub fn set_access_options(&mut self, options: AccessOptions) -> Result<()> {
        if let Some(timer_sec) = options.timer_sec {
            if timer_sec > MAX_TIMER_SEC {
                return Err(McError::invalid_parameter(
                    "timer_sec",
                    format!("must be 0 to {}, got {}", MAX_TIMER_SEC, timer_sec),
                ));
            }
        }
        if let Some(comm_type) = options.comm_type {
            self.config.comm_type = comm_type;
        }
        if let Some(network) = options.network {
            self.config.route.network = network;
        }
        if let Some(pc) = options.pc {
            self.config.route.pc = pc;
        }
        if let Some(module_io) = options.module_io {
            self.config.route.module_io = module_io;
        }
        if let Some(module_station) = options.module_station {
            self.config.route.module_station = module_station;
        }
        if let Some(timer_sec) = options.timer_sec {
            self.config.timer = timer_sec * 4;
            if self.transport.is_connected() {
                self.transport.set_timeout(self.config.socket_timeout())?;
            }
        }
        Ok(())
    }

    /// Sets the serial number carried by 4E frames.
    pub fn set_subheader_serial(&mut self, serial: u16) {
        self.config.serial = serial;
    }

    fn parse(&self, device: &str) -> Result<DeviceAddress> {
        DeviceAddress::parse(self.config.series, device)
    }

    /// Parses a device for word access; random access does not take bit devices.
    fn parse_word(&self, device: &str) -> Result<DeviceAddress> {
        let address = self.parse(device)?;
        if address.device().class() == DeviceClass::Bit {
            return Err(McError::invalid_parameter(
                "device",
                format!("{} is a bit device", device),
            ));
        }
        Ok(address)
    }

    fn send_request(&mut self, payload: &[u8]) -> Result<()> {
        let header = FrameHeader {
            serial: self.config.serial,
            ..FrameHeader::new(self.config.frame_type, self.config.route, self.config.timer)
        };
        let frame = header.build(&self.config.codec(), payload)?;
        debug!(frame = %hex::encode(&frame), "send");
        self.transport.send(&frame)
    }

    fn receive_response(&mut self) -> Result<McResponse> {
        let frame_type = self.config.frame_type;
        let codec = self.config.codec();
        let mut raw = Vec::new();
        loop {
            let chunk = self.transport.recv()?;
            if chunk.is_empty() {
                return Err(McError::invalid_response("connection closed by the PLC"));
            }
            raw.extend_from_slice(&chunk);
            if let Some(total) = McResponse::frame_len(frame_type, &codec, &raw)? {
                if raw.len() >= total {
                    break;
                }
            }
        }
        debug!(frame = %hex::encode(&raw), "recv");

        let response = McResponse::from_bytes(frame_type, &codec, &raw)?;
        if frame_type == FrameType::E4 && response.serial != Some(self.config.serial) {
            return Err(McError::invalid_response(format!(
                "serial mismatch: expected {}, got {:?}",
                self.config.serial, response.serial
            )));
        }
        response.check_error()?;
        Ok(response)
    }

    fn execute(&mut self, payload: &[u8]) -> Result<McResponse> {
        self.send_request(payload)?;
        self.receive_response()
    }

    /// Reads `count` words starting at `device`, as signed values.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use melsec_mc::{Client, ClientConfig, PlcSeries};
    /// # let mut client = Client::new(ClientConfig::new("192.168.1.10", PlcSeries::Q));
    /// let values = client.batch_read_words("D1000", 4)?;
    /// # Ok::<(), melsec_mc::McError>(())
    /// ```
    pub fn batch_read_words(&mut self, device: &str, count: u16) -> Result<Vec<i16>> {
        let codec = self.config.codec();
        let response = self.batch_read_words_response(device, count)?;
        (0..usize::from(count))
            .map(|i| {
                let offset = i * codec.word_size();
                Ok(response.field(&codec, offset, Width::Word)? as u16 as i16)
            })
            .collect()
    }

    /// Reads `count` words starting at `device` without decoding them.
    ///
    /// Each entry is the word as it appeared on the wire (2 bytes binary, 4 ASCII).
    pub fn batch_read_words_raw(&mut self, device: &str, count: u16) -> Result<Vec<Vec<u8>>> {
        let word = self.config.codec().word_size();
        let response = self.batch_read_words_response(device, count)?;
        (0..usize::from(count))
            .map(|i| Ok(response.slice(i * word, word)?.to_vec()))
            .collect()
    }

    fn batch_read_words_response(&mut self, device: &str, count: u16) -> Result<McResponse> {
        let cmd = BatchReadCommand::new(self.parse(device)?, count, AccessUnit::Word)?;
        let payload = cmd.to_bytes(&self.config.dialect())?;
        self.execute(&payload)
    }

    /// Reads `count` bits starting at `device`.
    pub fn batch_read_bits(&mut self, device: &str, count: u16) -> Result<Vec<bool>> {
        let cmd = BatchReadCommand::new(self.parse(device)?, count, AccessUnit::Bit)?;
        let payload = cmd.to_bytes(&self.config.dialect())?;
        let response = self.execute(&payload)?;
        self.config
            .codec()
            .decode_bits(&response.data, usize::from(count))
    }

    /// Writes words starting at `device`.
    pub fn batch_write_words(&mut self, device: &str, values: &[i16]) -> Result<()> {
        let raw: Vec<u16> = values.iter().map(|&v| v as u16).collect();
        let cmd = BatchWriteWordsCommand::new(self.parse(device)?, &raw)?;
        let payload = cmd.to_bytes(&self.config.dialect())?;
        self.execute(&payload)?;
        Ok(())
    }

    /// Writes bits starting at `device`.
    pub fn batch_write_bits(&mut self, device: &str, values: &[bool]) -> Result<()> {
        let cmd = BatchWriteBitsCommand::new(self.parse(device)?, values)?;
        let payload = cmd.to_bytes(&self.config.dialect())?;
        self.execute(&payload)?;
        Ok(())
    }

    /// Reads scattered words (signed 16-bit) and double words (signed 32-bit).
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use melsec_mc::{Client, ClientConfig, PlcSeries};
    /// # let mut client = Client::new(ClientConfig::new("192.168.1.10", PlcSeries::Q));
    /// let (words, dwords) = client.random_read(&["D1000", "D2000"], &["D3000"])?;
    /// # Ok::<(), melsec_mc::McError>(())
    /// ```
    pub fn random_read(
        &mut self,
        word_devices: &[&str],
        dword_devices: &[&str],
    ) -> Result<(Vec<i16>, Vec<i32>)> {
        let codec = self.config.codec();
        let response = self.random_read_response(word_devices, dword_devices)?;
        let dword_start = word_devices.len() * codec.field_len(Width::Word);
        let words = (0..word_devices.len())
            .map(|i| {
                let offset = i * codec.field_len(Width::Word);
                Ok(response.field(&codec, offset, Width::Word)? as u16 as i16)
            })
            .collect::<Result<Vec<_>>>()?;
        let dwords = (0..dword_devices.len())
            .map(|i| {
                let offset = dword_start + i * codec.field_len(Width::DWord);
                Ok(response.field(&codec, offset, Width::DWord)? as u32 as i32)
            })
            .collect::<Result<Vec<_>>>()?;
        Ok((words, dwords))
    }

    /// Reads scattered words and double words without decoding them.
    pub fn random_read_raw(
        &mut self,
        word_devices: &[&str],
        dword_devices: &[&str],
    ) -> Result<(Vec<Vec<u8>>, Vec<Vec<u8>>)> {
        let codec = self.config.codec();
        let response = self.random_read_response(word_devices, dword_devices)?;
        let word = codec.field_len(Width::Word);
        let dword = codec.field_len(Width::DWord);
        let dword_start = word_devices.len() * word;
        let words = (0..word_devices.len())
            .map(|i| Ok(response.slice(i * word, word)?.to_vec()))
            .collect::<Result<Vec<_>>>()?;
        let dwords = (0..dword_devices.len())
            .map(|i| Ok(response.slice(dword_start + i * dword, dword)?.to_vec()))
            .collect::<Result<Vec<_>>>()?;
        Ok((words, dwords))
    }

    fn random_read_response(
        &mut self,
        word_devices: &[&str],
        dword_devices: &[&str],
    ) -> Result<McResponse> {
        let words = self.parse_all(word_devices)?;
        let dwords = self.parse_all(dword_devices)?;
        let payload = RandomReadCommand::new(words, dwords)?.to_bytes(&self.config.dialect())?;
        self.execute(&payload)
    }

    fn parse_all(&self, devices: &[&str]) -> Result<Vec<DeviceAddress>> {
        devices.iter().map(|d| self.parse_word(d)).collect()
    }

    /// Writes scattered words and double words.
    ///
    /// # Errors
    ///
    /// Bit devices are rejected with `McError::InvalidParameter` before
    /// anything is sent.
    pub fn random_write(&mut self, words: &[(&str, i16)], dwords: &[(&str, i32)]) -> Result<()> {
        let words = words
            .iter()
            .map(|&(d, v)| Ok((self.parse_word(d)?, v as u16)))
            .collect::<Result<Vec<_>>>()?;
        let dwords = dwords
            .iter()
            .map(|&(d, v)| Ok((self.parse_word(d)?, v as u32)))
            .collect::<Result<Vec<_>>>()?;
        let payload = RandomWriteCommand::new(words, dwords)?.to_bytes(&self.config.dialect())?;
        self.execute(&payload)?;
        Ok(())
    }

    /// Writes scattered bits.
    pub fn random_write_bits(&mut self, points: &[(&str, bool)]) -> Result<()> {
        let points = points
            .iter()
            .map(|&(d, v)| Ok((self.parse(d)?, v)))
            .collect::<Result<Vec<_>>>()?;
        let payload = RandomWriteBitsCommand::new(points)?.to_bytes(&self.config.dialect())?;
        self.execute(&payload)?;
        Ok(())
    }

    /// Reads tags of mixed data types.
    ///
    /// Word-based tags are read with one random read; a tag wider than one
    /// word is requested as consecutive word devices (`D200`, `D201`) and
    /// reassembled. `BIT` tags are read one by one with a bit batch read.
    /// A tag whose data type is unknown is returned with `error` set and
    /// does not abort the batch.
    ///
    /// # Errors
    ///
    /// Device errors and communication errors abort the whole call.
    pub fn read(&mut self, tags: &[Tag]) -> Result<Vec<Tag>> {
        enum Plan {
            Failed(Tag),
            Bit(DeviceAddress),
            Words(DataType, usize),
        }

        let mut plans = Vec::with_capacity(tags.len());
        let mut word_devices = Vec::new();
        for tag in tags {
            let data_type = match tag.data_type.parse::<DataType>() {
                Ok(dt) => dt,
                Err(e) => {
                    warn!(device = %tag.device, error = %e, "tag skipped");
                    plans.push(Plan::Failed(tag.with_error(e)));
                    continue;
                }
            };
            if data_type == DataType::Bit {
                plans.push(Plan::Bit(self.parse(&tag.device)?));
            } else {
                let device = self.parse_word(&tag.device)?;
                plans.push(Plan::Words(data_type, word_devices.len()));
                word_devices.extend(device.span(data_type.word_count())?);
            }
        }

        let mut words = Vec::with_capacity(word_devices.len());
        if !word_devices.is_empty() {
            let codec = self.config.codec();
            let count = word_devices.len();
            let payload =
                RandomReadCommand::new(word_devices, Vec::new())?.to_bytes(&self.config.dialect())?;
            let response = self.execute(&payload)?;
            for i in 0..count {
                words.push(response.field(&codec, i * codec.word_size(), Width::Word)? as u16);
            }
        }

        let mut output = Vec::with_capacity(tags.len());
        for (tag, plan) in tags.iter().zip(plans) {
            let (value, data_type) = match plan {
                Plan::Failed(failed) => {
                    output.push(failed);
                    continue;
                }
                Plan::Bit(device) => {
                    let cmd = BatchReadCommand::new(device, 1, AccessUnit::Bit)?;
                    let payload = cmd.to_bytes(&self.config.dialect())?;
                    let response = self.execute(&payload)?;
                    let bits = self.config.codec().decode_bits(&response.data, 1)?;
                    (Value::Bit(bits[0]), DataType::Bit)
                }
                Plan::Words(data_type, start) => {
                    let raw = join_words(&words[start..start + data_type.word_count()]);
                    (raw_to_value(raw, data_type), data_type)
                }
            };
            output.push(Tag {
                device: tag.device.clone(),
                value: Some(value),
                data_type: data_type.name().to_string(),
                error: None,
            });
        }
        Ok(output)
    }

    /// Writes tags of mixed data types.
    ///
    /// Word-based tags are combined into one random write, a multi-word value
    /// going to consecutive devices low word first. `BIT` tags are written one
    /// by one with a bit batch write.
    ///
    /// Returns the tags whose data type could not be resolved, or `None` when
    /// every tag was written.
    ///
    /// # Errors
    ///
    /// Missing or out-of-range values, device errors and communication errors
    /// abort the call.
    pub fn write(&mut self, tags: &[Tag]) -> Result<Option<Vec<Tag>>> {
        let mut failed = Vec::new();
        let mut bits = Vec::new();
        let mut words = Vec::new();
        for tag in tags {
            let data_type = match tag.data_type.parse::<DataType>() {
                Ok(dt) => dt,
                Err(e) => {
                    warn!(device = %tag.device, error = %e, "tag skipped");
                    failed.push(tag.with_error(e));
                    continue;
                }
            };
            let device = if data_type == DataType::Bit {
                self.parse(&tag.device)?
            } else {
                self.parse_word(&tag.device)?
            };
            let value = tag.value.as_ref().ok_or_else(|| {
                McError::invalid_parameter("value", format!("tag {} has no value", tag.device))
            })?;
            let raw = value_to_raw(value, data_type)?;
            if data_type == DataType::Bit {
                bits.push((device, raw != 0));
            } else {
                let span = device.span(data_type.word_count())?;
                let parts = split_words(raw, data_type.word_count());
                words.extend(span.into_iter().zip(parts));
            }
        }

        for (device, value) in bits {
            let payload = BatchWriteBitsCommand::new(device, &[value])?
                .to_bytes(&self.config.dialect())?;
            self.execute(&payload)?;
        }
        if !words.is_empty() {
            let payload =
                RandomWriteCommand::new(words, Vec::new())?.to_bytes(&self.config.dialect())?;
            self.execute(&payload)?;
        }

        Ok(if failed.is_empty() { None } else { Some(failed) })
    }

    /// Switches the PLC to RUN.
    ///
    /// `clear_mode`: 0 no clear, 1 clear outside the latch range, 2 clear all.
    pub fn remote_run(&mut self, clear_mode: u8, force: bool) -> Result<()> {
        let payload = RemoteCommand::run(force, clear_mode)?.to_bytes(&self.config.dialect());
        self.execute(&payload)?;
        Ok(())
    }

    /// Switches the PLC to STOP.
    pub fn remote_stop(&mut self) -> Result<()> {
        let payload = RemoteCommand::Stop.to_bytes(&self.config.dialect());
        self.execute(&payload)?;
        Ok(())
    }

    /// Switches the PLC to PAUSE.
    pub fn remote_pause(&mut self, force: bool) -> Result<()> {
        let payload = RemoteCommand::Pause { force }.to_bytes(&self.config.dialect());
        self.execute(&payload)?;
        Ok(())
    }

    /// Clears latched devices. The PLC must be stopped.
    pub fn remote_latch_clear(&mut self) -> Result<()> {
        let payload = RemoteCommand::LatchClear.to_bytes(&self.config.dialect());
        self.execute(&payload)?;
        Ok(())
    }

    /// Resets the PLC. The PLC must be stopped.
    ///
    /// The PLC may drop the connection instead of answering. A missing or
    /// failed answer closes the transport and reconnects following the
    /// configured [`ReconnectPolicy`].
    ///
    /// # Errors
    ///
    /// Returns the last reconnection error if every attempt fails.
    pub fn remote_reset(&mut self) -> Result<()> {
        let payload = RemoteCommand::Reset.to_bytes(&self.config.dialect());
        self.send_request(&payload)?;
        self.transport.set_timeout(RESET_TIMEOUT)?;
        match self.receive_response() {
            Ok(_) => self.transport.set_timeout(self.config.socket_timeout()),
            Err(e) => {
                warn!(error = %e, "no answer to remote reset, reconnecting");
                self.reconnect()
            }
        }
    }

    fn reconnect(&mut self) -> Result<()> {
        if let Err(e) = self.transport.close() {
            debug!(error = %e, "close before reconnect failed");
        }
        let policy = self.config.reconnect;
        let mut last_error = McError::NotConnected;
        for attempt in 1..=policy.attempts {
            thread::sleep(policy.backoff);
            match self.connect() {
                Ok(()) => {
                    info!(attempt, "reconnected after remote reset");
                    return Ok(());
                }
                Err(e) => {
                    warn!(attempt, error = %e, "reconnect failed");
                    last_error = e;
                }
            }
        }
        Err(last_error)
    }

    /// Locks the PLC with the remote password.
    ///
    /// # Errors
    ///
    /// Returns an error if the password is not ASCII or has the wrong length
    /// for the series (4 for Q/L/QnA/iQ-L, 6 to 32 for iQ-R).
    pub fn remote_lock(&mut self, password: &str) -> Result<()> {
        let payload = RemotePasswordCommand::lock(self.config.series, password)?
            .to_bytes(&self.config.dialect());
        self.execute(&payload)?;
        Ok(())
    }

    /// Unlocks the PLC with the remote password.
    ///
    /// # Errors
    ///
    /// See [`Client::remote_lock`].
    pub fn remote_unlock(&mut self, password: &str) -> Result<()> {
        let payload = RemotePasswordCommand::unlock(self.config.series, password)?
            .to_bytes(&self.config.dialect());
        self.execute(&payload)?;
        Ok(())
    }

    /// Turns the error LED off and clears the error.
    pub fn error_led_off(&mut self) -> Result<()> {
        let payload = LedOffCommand::error_led().to_bytes(&self.config.dialect());
        self.execute(&payload)?;
        Ok(())
    }

    /// Turns the COM.ERR indicator off (channel 1, 2 or 3 for both).
    pub fn indicator_led_off(&mut self, channel: u8) -> Result<()> {
        let payload =
            LedOffCommand::indicator(self.config.series, channel)?.to_bytes(&self.config.dialect());
        self.execute(&payload)?;
        Ok(())
    }

    /// Reads the CPU model name and code.
    pub fn read_cpu_model(&mut self) -> Result<CpuModel> {
        let payload = CpuModelCommand.to_bytes(&self.config.dialect());
        let response = self.execute(&payload)?;
        let name_bytes = response.slice(0, CpuModelCommand::NAME_LEN)?;
        let name: String = String::from_utf8_lossy(name_bytes)
            .chars()
            .filter(|&c| c != ' ' && c != '\0')
            .collect();
        let code = response.field(&self.config.codec(), CpuModelCommand::NAME_LEN, Width::Word)?;
        Ok(CpuModel {
            name,
            code: format!("{:04X}", code),
        })
    }

    /// Reads the operating state and stop cause from `SD203`.
    ///
    /// Never fails: any error yields [`CpuStatus::UNKNOWN`].
    pub fn read_cpu_status(&mut self) -> CpuStatus {
        match self.batch_read_words("SD203", 1) {
            Ok(words) => CpuStatus::from_register(words[0] as u16),
            Err(e) => {
                warn!(error = %e, "cpu status unavailable");
                CpuStatus::UNKNOWN
            }
        }
    }

    /// Reads the RUN/STOP switch position from `SD200`.
    ///
    /// Never fails: any error yields `Some(SwitchStatus::Unknown)`; an
    /// unexpected register value yields `None`.
    pub fn read_switch_status(&mut self) -> Option<SwitchStatus> {
        match self.batch_read_words("SD200", 1) {
            Ok(words) => SwitchStatus::from_register(words[0] as u16),
            Err(e) => {
                warn!(error = %e, "switch status unavailable");
                Some(SwitchStatus::Unknown)
            }
        }
    }

    /// Reads the PLC clock.
    ///
    /// Sets `SM213` so the clock is latched into `SD210`..`SD217`, reads the
    /// registers and clears `SM213` again, even if the read failed.
    pub fn read_plc_time(&mut self) -> Result<NaiveDateTime> {
        self.batch_write_bits("SM213", &[true])?;
        let result = self.batch_read_words("SD210", 8);
        let release = self.batch_write_bits("SM213", &[false]);
        let r = result?;
        release?;

        let field = |i: usize| u32::try_from(r[i]).unwrap_or(u32::MAX);
        NaiveDate::from_ymd_opt(i32::from(r[0]), field(1), field(2))
            .and_then(|date| date.and_hms_opt(field(3), field(4), field(5)))
            .ok_or_else(|| {
                McError::invalid_response(format!("PLC clock holds an invalid date {:?}", &r[..6]))
            })
    }

    /// Sets the PLC clock.
    ///
    /// Clears `SM211`/`SM213`, writes year, month, day, hour, minute, second
    /// and weekday to `SD210`, then strobes `SM210` off, on, off.
    ///
    /// The weekday follows the PLC's `SD216` numbering, Sunday = 0 through
    /// Saturday = 6, not the Monday = 0 numbering of ISO weekdays.
    pub fn set_plc_time(&mut self, time: NaiveDateTime) -> Result<()> {
        let fields = [
            time.year(),
            time.month() as i32,
            time.day() as i32,
            time.hour() as i32,
            time.minute() as i32,
            time.second() as i32,
            time.weekday().num_days_from_sunday() as i32,
            0,
        ];
        let values = fields
            .iter()
            .map(|&v| i16::try_from(v).map_err(|_| McError::value_range(v, 16)))
            .collect::<Result<Vec<_>>>()?;

        self.random_write_bits(&[("SM211", false), ("SM213", false)])?;
        self.batch_write_words("SD210", &values)?;
        for strobe in [false, true, false] {
            self.batch_write_bits("SM210", &[strobe])?;
        }
        info!(%time, "plc clock set");
        Ok(())
    }

    /// Sets the PLC clock to the host clock, UTC or local time.
    ///
    /// Returns the time that was written.
    pub fn sync_plc_time(&mut self, utc: bool) -> Result<NaiveDateTime> {
        let now = if utc {
            Utc::now().naive_utc()
        } else {
            Local::now().naive_local()
        };
        self.set_plc_time(now)?;
        Ok(now)
    }

    /// Runs a loopback test with 1 to 960 alphanumeric characters.
    ///
    /// # Errors
    ///
    /// Returns `McError::ContentMismatch` if the echoed length differs from
    /// the sent length, even when the end code was zero.
    pub fn loopback_test(&mut self, data: &str) -> Result<LoopbackResult> {
        let cmd = LoopbackCommand::new(data)?;
        let payload = cmd.to_bytes(&self.config.dialect());
        let response = self.execute(&payload)?;
        let codec = self.config.codec();
        let length = response.field(&codec, 0, Width::Word)? as usize;
        if length != cmd.data().len() {
            return Err(McError::content_mismatch(cmd.data().len(), length));
        }
        let echoed = response.slice(codec.word_size(), length)?;
        Ok(LoopbackResult {
            length,
            data: String::from_utf8_lossy(echoed).into_owned(),
        })
    }
}

impl<T: Transport + std::fmt::Debug> std::fmt::Debug for Client<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("config", &self.config)
            .field("transport", &self.transport)
            .finish()
    }
}
