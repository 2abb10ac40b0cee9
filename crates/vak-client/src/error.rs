// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Error types for the Roughtime client.
//!
//! Fallible operations return [`VakError`]. It converts into `io::Error` for
//! callers that prefer `io::Result`, and the typed error survives the trip:
//!
//! ```
//! use std::io;
//! use vak_client::error::{TimeoutError, VakError};
//!
//! let io_err: io::Error = VakError::Timeout(TimeoutError::Query).into();
//! assert_eq!(io_err.kind(), io::ErrorKind::TimedOut);
//! let inner = io_err.get_ref().and_then(|e| e.downcast_ref::<VakError>());
//! assert!(matches!(inner, Some(VakError::Timeout(TimeoutError::Query))));
//! ```

pub use vak_proto::{ErrorClass, RoughtimeError};

use std::fmt;
use std::io;

/// Errors that can occur during Roughtime client operations.
#[derive(Debug)]
pub enum VakError {
    /// The reply was malformed or failed verification.
    Protocol(RoughtimeError),
    /// No reply arrived in time.
    Timeout(TimeoutError),
    /// Invalid server description or configuration.
    Config(ConfigError),
    /// Underlying I/O error (socket bind, DNS resolution, etc.).
    Io(io::Error),
}

/// Timeout errors.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TimeoutError {
    /// No matching reply within the overall query deadline.
    Query,
    /// A stream transport did not deliver the whole reply in time.
    Read,
}

/// Configuration errors.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ConfigError {
    /// No servers were supplied.
    NoServers,
    /// Address resolved to no socket addresses.
    NoAddresses {
        /// The address that failed to resolve.
        address: String,
    },
    /// A public key is not valid base64 or not 32 bytes long.
    InvalidPublicKey {
        /// Detail about the invalid key.
        detail: String,
    },
    /// A server list names a key type other than `ed25519`.
    UnsupportedKeyType {
        /// The key type found.
        key_type: String,
    },
    /// A transport other than `udp` or `tcp`.
    UnsupportedTransport {
        /// The transport name found.
        transport: String,
    },
    /// A server list could not be parsed.
    InvalidServerList {
        /// Detail from the parser.
        detail: String,
    },
}

impl VakError {
    /// Returns `true` if a reply arrived but failed cryptographic or consistency checks.
    pub fn is_verification(&self) -> bool {
        matches!(self, VakError::Protocol(e) if e.is_verification())
    }
}

// ── Display implementations ─────────────────────────────────────────

impl fmt::Display for VakError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VakError::Protocol(e) => match e.class() {
                ErrorClass::Format => write!(f, "malformed Roughtime reply: {e}"),
                ErrorClass::Verification => write!(f, "Roughtime reply failed verification: {e}"),
            },
            VakError::Timeout(e) => write!(f, "Roughtime timeout: {e}"),
            VakError::Config(e) => write!(f, "Roughtime config error: {e}"),
            VakError::Io(e) => write!(f, "{e}"),
        }
    }
}

impl fmt::Display for TimeoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeoutError::Query => write!(f, "no reply before the query deadline"),
            TimeoutError::Read => write!(f, "reply read timed out"),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::NoServers => write!(f, "at least one server is required"),
            ConfigError::NoAddresses { address } => {
                write!(f, "address resolved to no socket addresses: {address}")
            }
            ConfigError::InvalidPublicKey { detail } => {
                write!(f, "invalid public key: {detail}")
            }
            ConfigError::UnsupportedKeyType { key_type } => {
                write!(f, "unsupported public key type: {key_type}")
            }
            ConfigError::UnsupportedTransport { transport } => {
                write!(f, "unsupported transport: {transport}")
            }
            ConfigError::InvalidServerList { detail } => {
                write!(f, "invalid server list: {detail}")
            }
        }
    }
}

// ── Error trait implementations ─────────────────────────────────────

impl std::error::Error for VakError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            VakError::Protocol(e) => Some(e),
            VakError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl std::error::Error for TimeoutError {}
impl std::error::Error for ConfigError {}

// ── From conversions ────────────────────────────────────────────────

impl From<VakError> for io::Error {
    fn from(err: VakError) -> io::Error {
        let kind = match &err {
            VakError::Protocol(_) => io::ErrorKind::InvalidData,
            VakError::Timeout(_) => io::ErrorKind::TimedOut,
            VakError::Config(_) => io::ErrorKind::InvalidInput,
            VakError::Io(e) => e.kind(),
        };
        // Preserve the original io::Error directly for the Io variant.
        if let VakError::Io(e) = err {
            return e;
        }
        io::Error::new(kind, err)
    }
}

impl From<io::Error> for VakError {
    fn from(err: io::Error) -> VakError {
        VakError::Io(err)
    }
}

impl From<RoughtimeError> for VakError {
    fn from(err: RoughtimeError) -> VakError {
        VakError::Protocol(err)
    }
}

impl From<ConfigError> for VakError {
    fn from(err: ConfigError) -> VakError {
        VakError::Config(err)
    }
}

impl From<TimeoutError> for VakError {
    fn from(err: TimeoutError) -> VakError {
        VakError::Timeout(err)
    }
}

// ── Tests ───────────────────────────────────────────────────────────
