//! TCP transport layer for MC communication.
//!
//! This module provides the [`Transport`] trait the [`Client`](crate::Client)
//! talks to and its default implementation, [`TcpTransport`]. The transport
//! layer is completely separated from the protocol layer: it only knows about
//! sockets and bytes.
//!
//! # Constants
//!
//! - [`DEFAULT_MC_PORT`] - Default MC protocol TCP port (5007)
//! - [`RECV_BUFFER_SIZE`] - Bytes read per `recv` call (4096)
//!
//! # Example
//!
//! ```no_run
//! use melsec_mc::{TcpTransport, Transport};
//! use std::time::Duration;
//!
//! let mut transport = TcpTransport::new();
//! transport.set_timeout(Duration::from_secs(2)).unwrap();
//! transport.connect("192.168.1.10", 5007).unwrap();
//! transport.send(&[0x50, 0x00 /* ... rest of the frame */]).unwrap();
//! let response = transport.recv().unwrap();
//! ```

use std::io::{ErrorKind, Read, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::time::Duration;

use tracing::debug;

use crate::error::{McError, Result};

/// Default MC protocol TCP port.
pub const DEFAULT_MC_PORT: u16 = 5007;

/// Bytes read per `recv` call.
pub const RECV_BUFFER_SIZE: usize = 4096;

/// Byte transport used by the client.
///
/// Implementations only move bytes; framing and reassembly are done by the client.
pub trait Transport {
    /// Opens a connection to `host:port`.
    fn connect(&mut self, host: &str, port: u16) -> Result<()>;

    /// Closes the connection. Closing a closed transport is a no-op.
    fn close(&mut self) -> Result<()>;

    /// Sends all bytes.
    ///
    /// Fails with `McError::NotConnected` when no connection is open.
    fn send(&mut self, data: &[u8]) -> Result<()>;

    /// Receives the next chunk of bytes, blocking up to the timeout.
    ///
    /// An empty vector means the peer closed the connection.
    fn recv(&mut self) -> Result<Vec<u8>>;

    /// Sets the read/write timeout, applied to the current and future connections.
    fn set_timeout(&mut self, timeout: Duration) -> Result<()>;

    /// Returns whether a connection is open.
    fn is_connected(&self) -> bool;
}

/// Blocking TCP transport.
#[derive(Debug, Default)]
pub struct TcpTransport {
    stream: Option<TcpStream>,
    timeout: Option<Duration>,
}

impl TcpTransport {
    /// Creates a disconnected transport.
    pub fn new() -> Self {
        Self::default()
    }

    fn stream(&mut self) -> Result<&mut TcpStream> {
        self.stream.as_mut().ok_or(McError::NotConnected)
    }
}

fn map_io(e: std::io::Error) -> McError {
    match e.kind() {
        ErrorKind::WouldBlock | ErrorKind::TimedOut => McError::Timeout,
        _ => McError::Io(e),
    }
}

impl Transport for TcpTransport {
    fn connect(&mut self, host: &str, port: u16) -> Result<()> {
        let mut last_error = None;
        for addr in (host, port).to_socket_addrs()? {
            let attempt = match self.timeout {
                Some(timeout) => TcpStream::connect_timeout(&addr, timeout),
                None => TcpStream::connect(addr),
            };
            match attempt {
                Ok(stream) => {
                    stream.set_read_timeout(self.timeout)?;
                    stream.set_write_timeout(self.timeout)?;
                    stream.set_nodelay(true)?;
                    debug!(%addr, "tcp connected");
                    self.stream = Some(stream);
                    return Ok(());
                }
                Err(e) => last_error = Some(e),
            }
        }
        Err(last_error.map(map_io).unwrap_or_else(|| {
            McError::invalid_parameter("host", format!("\"{}\" did not resolve", host))
        }))
    }

    fn close(&mut self) -> Result<()> {
        if let Some(stream) = self.stream.take() {
            match stream.shutdown(Shutdown::Both) {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotConnected => {}
                Err(e) => return Err(McError::Io(e)),
            }
        }
        Ok(())
    }

    fn send(&mut self, data: &[u8]) -> Result<()> {
        self.stream()?.write_all(data).map_err(map_io)
    }

    fn recv(&mut self) -> Result<Vec<u8>> {
        let stream = self.stream()?;
        let mut buffer = vec![0u8; RECV_BUFFER_SIZE];
        let size = stream.read(&mut buffer).map_err(map_io)?;
        buffer.truncate(size);
        Ok(buffer)
    }

    fn set_timeout(&mut self, timeout: Duration) -> Result<()> {
        self.timeout = Some(timeout);
        if let Some(stream) = &self.stream {
            stream.set_read_timeout(Some(timeout))?;
            stream.set_write_timeout(Some(timeout))?;
        }
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.stream.is_some()
    }
}
