// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Server descriptors.

use std::fmt;
use std::str::FromStr;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use vak_proto::ProtocolVersion;

use crate::error::ConfigError;

/// Length of an Ed25519 long-term public key.
pub const PUBLIC_KEY_LEN: usize = 32;

/// How requests reach a server.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum TransportProtocol {
    /// One datagram each way; requests are padded.
    #[default]
    Udp,
    /// A stream connection per query; requests are not padded.
    Tcp,
}

impl FromStr for TransportProtocol {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<TransportProtocol, ConfigError> {
        match s.to_ascii_lowercase().as_str() {
            "udp" => Ok(TransportProtocol::Udp),
            "tcp" => Ok(TransportProtocol::Tcp),
            _ => Err(ConfigError::UnsupportedTransport {
                transport: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for TransportProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportProtocol::Udp => write!(f, "udp"),
            TransportProtocol::Tcp => write!(f, "tcp"),
        }
    }
}

/// Everything needed to query one server.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ServerDescriptor {
    /// Human-readable name, if known.
    pub name: Option<String>,
    /// Host name or IP literal.
    pub address: String,
    /// Port number.
    pub port: u16,
    /// Datagram or stream.
    pub transport: TransportProtocol,
    /// Long-term Ed25519 public key.
    pub public_key: [u8; PUBLIC_KEY_LEN],
    /// Framing variant the server speaks.
    pub version: ProtocolVersion,
}

impl ServerDescriptor {
    /// A UDP server speaking the IETF variant.
    pub fn new(address: impl Into<String>, port: u16, public_key: [u8; PUBLIC_KEY_LEN]) -> Self {
        ServerDescriptor {
            name: None,
            address: address.into(),
            port,
            transport: TransportProtocol::Udp,
            public_key,
            version: ProtocolVersion::Ietf,
        }
    }

    /// Like [`ServerDescriptor::new`] with a base64-encoded key.
    pub fn with_base64_key(
        address: impl Into<String>,
        port: u16,
        public_key: &str,
    ) -> Result<Self, ConfigError> {
        Ok(ServerDescriptor::new(address, port, decode_public_key(public_key)?))
    }

    /// Set the display name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the transport.
    pub fn transport(mut self, transport: TransportProtocol) -> Self {
        self.transport = transport;
        self
    }

    /// Set the protocol variant.
    pub fn version(mut self, version: ProtocolVersion) -> Self {
        self.version = version;
        self
    }

    /// Name if set, otherwise `address:port`.
    pub fn label(&self) -> String {
        match &self.name {
            Some(n) => n.clone(),
            None => format!("{}:{}", self.address, self.port),
        }
    }
}

/// Decode a base64-encoded Ed25519 public key.
///
/// ```
/// let pk = vak_client::server::decode_public_key(
///     "0GD7c3yP8xEc4Zl2zeuN2SlLvDVVocjsPSL8/Rl/7zg="
/// ).unwrap();
/// assert_eq!(pk.len(), 32);
/// ```
pub fn decode_public_key(encoded: &str) -> Result<[u8; PUBLIC_KEY_LEN], ConfigError> {
    let bytes = STANDARD
        .decode(encoded.trim())
        .map_err(|e| ConfigError::InvalidPublicKey {
            detail: e.to_string(),
        })?;
    bytes
        .try_into()
        .map_err(|b: Vec<u8>| ConfigError::InvalidPublicKey {
            detail: format!("expected {PUBLIC_KEY_LEN} bytes, got {}", b.len()),
        })
}
