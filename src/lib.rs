//! # MELSEC MC Protocol Library
//!
//! A Rust library for communicating with Mitsubishi MELSEC PLCs using the MC
//! (MELSEC Communication) protocol over TCP.
//!
//! This is a **protocol-only** library: no polling, schedulers or caching.
//! Each call produces one request and one response, except the composite
//! operations documented on [`Client`].
//!
//! ## Features
//!
//! - **Five PLC series**: Q, L, QnA, iQ-L and iQ-R, with their device tables
//! - **3E and 4E frames** in binary or ASCII encoding
//! - **Typed tags**: 16/32/64-bit integers and floats spanning several word devices
//! - **Remote control**: run, stop, pause, latch clear, reset, password lock
//! - **PLC clock**: read, set and sync from the host clock
//! - **No panics**: all errors returned as `Result<T, McError>`
//!
//! ## Quick Start
//!
//! ```no_run
//! use melsec_mc::{Client, ClientConfig, PlcSeries};
//!
//! fn main() -> melsec_mc::Result<()> {
//!     let config = ClientConfig::new("192.168.1.10", PlcSeries::Q);
//!     let mut client = Client::new(config);
//!     client.connect()?;
//!
//!     // Read D100..D109
//!     let data = client.batch_read_words("D100", 10)?;
//!     println!("D100-D109: {:?}", data);
//!
//!     // Write M0..M2
//!     client.batch_write_bits("M0", &[true, false, true])?;
//!
//!     // Scattered access
//!     let (words, dwords) = client.random_read(&["D1000", "W0A"], &["D2000"])?;
//!     println!("{:?} {:?}", words, dwords);
//!
//!     client.close()
//! }
//! ```
//!
//! ## Devices
//!
//! Devices are addressed by name and number, e.g. `"D100"`, `"X1F"`, `"ZR0"`.
//! Numbers of X, Y, B, W, SB, SW, DX, DY and ZR are hexadecimal; a number
//! starting with a letter needs a leading zero (`"X0FFF"`).
//!
//! ```
//! use melsec_mc::{DeviceAddress, PlcSeries};
//!
//! let address = DeviceAddress::parse(PlcSeries::Q, "X1F")?;
//! assert_eq!(address.index(), 0x1F);
//! assert_eq!(address.to_string(), "X1F");
//!
//! // Long devices only exist on iQ-R
//! assert!(DeviceAddress::parse(PlcSeries::Q, "LTN0").is_err());
//! # Ok::<(), melsec_mc::McError>(())
//! ```
//!
//! ## Typed Tags
//!
//! ```no_run
//! # use melsec_mc::{Client, ClientConfig, PlcSeries};
//! use melsec_mc::{DataType, Tag};
//! # let mut client = Client::new(ClientConfig::new("192.168.1.10", PlcSeries::Q));
//!
//! // A FLOAT at D200 occupies D200 and D201
//! client.write(&[
//!     Tag::with_value("D200", DataType::Float, 12.5f32),
//!     Tag::with_value("M10", DataType::Bit, true),
//! ])?;
//!
//! for tag in client.read(&[Tag::new("D200", "f"), Tag::new("M10", "b")])? {
//!     println!("{}", tag);
//! }
//! # Ok::<(), melsec_mc::McError>(())
//! ```
//!
//! ## Error Handling
//!
//! ```no_run
//! use melsec_mc::{Client, ClientConfig, McError, PlcSeries};
//!
//! let mut client = Client::new(ClientConfig::new("192.168.1.10", PlcSeries::Q));
//! client.connect()?;
//!
//! match client.batch_read_words("D100", 10) {
//!     Ok(data) => println!("Data: {:?}", data),
//!     Err(McError::Timeout) => println!("Communication timeout"),
//!     Err(McError::Plc { code }) => {
//!         println!("PLC end code 0x{:04X}: {:?}", code, melsec_mc::mc_error_description(code));
//!     }
//!     Err(e) => println!("Error: {}", e),
//! }
//! # Ok::<(), McError>(())
//! ```
//!
//! ## Configuration
//!
//! ```no_run
//! use melsec_mc::codec::CommType;
//! use melsec_mc::frame::FrameType;
//! use melsec_mc::{ClientConfig, PlcSeries};
//!
//! let config = ClientConfig::new("192.168.1.10", PlcSeries::IqR)
//!     .with_port(1025)                       // default: 5007
//!     .with_frame_type(FrameType::E4)        // default: 3E
//!     .with_comm_type(CommType::Ascii)       // default: binary
//!     .with_timer(8);                        // 250 ms units, default: 4
//! ```
//!
//! ## Logging
//!
//! The library emits [`tracing`] events: frames as hex at `debug`, connection
//! changes at `info`, and swallowed errors at `warn`. Install any subscriber
//! to see them.

#![warn(clippy::all)]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

mod client;
pub mod codec;
mod command;
mod datatype;
mod device;
mod error;
pub mod frame;
mod response;
mod series;
mod tag;
mod transport;

// Public re-exports
pub use client::{AccessOptions, Client, ClientConfig, ReconnectPolicy, DEFAULT_TIMER, MAX_TIMER_SEC};
pub use codec::{Codec, CommType, Endian};
pub use command::{
    AccessUnit, BatchReadCommand, BatchWriteBitsCommand, BatchWriteWordsCommand, CpuModelCommand,
    Dialect, LedOffCommand, LoopbackCommand, RandomReadCommand, RandomWriteBitsCommand,
    RandomWriteCommand, RemoteCommand, RemotePasswordCommand, MAX_LOOPBACK_LEN,
};
pub use datatype::{DataType, Value};
pub use device::{Device, DeviceAddress, DeviceClass};
pub use error::{check_status, mc_error_description, McError, Result};
pub use frame::{AccessRoute, FrameHeader, FrameType};
pub use response::McResponse;
pub use series::PlcSeries;
pub use tag::{CpuModel, CpuState, CpuStatus, LoopbackResult, StopCause, SwitchStatus, Tag};
pub use transport::{TcpTransport, Transport, DEFAULT_MC_PORT, RECV_BUFFER_SIZE};
