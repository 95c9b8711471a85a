//! Scripted transport and response builders shared by the integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::time::Duration;

use melsec_mc::codec::{CommType, Width};
use melsec_mc::frame::FrameType;
use melsec_mc::{Client, ClientConfig, McError, PlcSeries, Result, Transport};

/// Transport answering from a queue of scripted replies.
///
/// An exhausted queue behaves like a silent PLC and yields `McError::Timeout`.
#[derive(Debug, Default)]
pub struct MockTransport {
    pub replies: VecDeque<Result<Vec<u8>>>,
    pub sent: Vec<Vec<u8>>,
    pub timeouts: Vec<Duration>,
    pub connects: usize,
    pub closes: usize,
    pub refuse_connect: bool,
    connected: bool,
}

impl MockTransport {
    pub fn connected() -> Self {
        Self {
            connected: true,
            ..Self::default()
        }
    }

    pub fn push(&mut self, reply: Vec<u8>) {
        self.replies.push_back(Ok(reply));
    }

    pub fn push_err(&mut self, error: McError) {
        self.replies.push_back(Err(error));
    }
}

impl Transport for MockTransport {
    fn connect(&mut self, _host: &str, _port: u16) -> Result<()> {
        self.connects += 1;
        if self.refuse_connect {
            return Err(McError::Timeout);
        }
        self.connected = true;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.closes += 1;
        self.connected = false;
        Ok(())
    }

    fn send(&mut self, data: &[u8]) -> Result<()> {
        if !self.connected {
            return Err(McError::NotConnected);
        }
        self.sent.push(data.to_vec());
        Ok(())
    }

    fn recv(&mut self) -> Result<Vec<u8>> {
        if !self.connected {
            return Err(McError::NotConnected);
        }
        self.replies.pop_front().unwrap_or(Err(McError::Timeout))
    }

    fn set_timeout(&mut self, timeout: Duration) -> Result<()> {
        self.timeouts.push(timeout);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}

/// Builds a response frame for the given configuration.
pub fn reply(config: &ClientConfig, status: u16, data: &[u8]) -> Vec<u8> {
    let codec = config.codec();
    let mut raw = match codec.comm_type {
        CommType::Binary => config.frame_type.response_subheader().to_be_bytes().to_vec(),
        CommType::Ascii => format!("{:04X}", config.frame_type.response_subheader()).into_bytes(),
    };
    if config.frame_type == FrameType::E4 {
        raw.extend(codec.encode_raw(u64::from(config.serial), Width::Word));
        raw.extend(codec.encode_raw(0, Width::Word));
    }
    raw.extend(codec.encode_raw(u64::from(config.route.network), Width::Byte));
    raw.extend(codec.encode_raw(u64::from(config.route.pc), Width::Byte));
    raw.extend(codec.encode_raw(u64::from(config.route.module_io), Width::Word));
    raw.extend(codec.encode_raw(u64::from(config.route.module_station), Width::Byte));
    raw.extend(codec.encode_raw((codec.word_size() + data.len()) as u64, Width::Word));
    raw.extend(codec.encode_raw(u64::from(status), Width::Word));
    raw.extend_from_slice(data);
    raw
}

/// Successful response without data.
pub fn ok(config: &ClientConfig) -> Vec<u8> {
    reply(config, 0, &[])
}

/// Little-endian bytes of binary words.
pub fn words(values: &[u16]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

/// Length of the request header before the command word.
pub fn header_len(config: &ClientConfig) -> usize {
    let binary = match config.frame_type {
        FrameType::E3 => 11,
        FrameType::E4 => 15,
    };
    binary * config.codec().word_size() / 2
}

/// Binary 3E client for a Q series PLC.
pub fn binary_client() -> Client<MockTransport> {
    client(ClientConfig::new("127.0.0.1", PlcSeries::Q))
}

pub fn client(config: ClientConfig) -> Client<MockTransport> {
    Client::with_transport(config, MockTransport::connected())
}
