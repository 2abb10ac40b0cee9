// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Protocol variants and the parameters that differ between them.

use core::fmt;

/// Value of the `VER` tag sent by [`ProtocolVersion::Ietf`] clients.
pub const IETF_VERSION: u32 = 0x8000_0003;

/// Roughtime framing variant spoken by a server.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum ProtocolVersion {
    /// The original Google protocol: 64-byte nonces and tree nodes, no envelope.
    Legacy,
    /// The IETF draft protocol: 32-byte nonces and tree nodes, enveloped
    /// packets, `VER` in the request and `NONC` echoed in the reply.
    #[default]
    Ietf,
}

impl ProtocolVersion {
    /// Map the `newver` flag of a server list entry.
    pub fn from_newver(newver: bool) -> ProtocolVersion {
        if newver {
            ProtocolVersion::Ietf
        } else {
            ProtocolVersion::Legacy
        }
    }

    /// Nonce length in bytes.
    pub fn nonce_len(self) -> usize {
        match self {
            ProtocolVersion::Legacy => 64,
            ProtocolVersion::Ietf => 32,
        }
    }

    /// Merkle tree node size in bytes.
    pub fn node_size(self) -> usize {
        self.nonce_len()
    }

    /// Whether packets are wrapped in the `ROUGHTIM` envelope.
    pub fn uses_envelope(self) -> bool {
        self == ProtocolVersion::Ietf
    }

    /// The `VER` value carried in requests, if any.
    pub fn version_tag(self) -> Option<u32> {
        match self {
            ProtocolVersion::Legacy => None,
            ProtocolVersion::Ietf => Some(IETF_VERSION),
        }
    }

    /// Whether the reply must echo the request nonce in `NONC`.
    pub fn echoes_nonce(self) -> bool {
        self == ProtocolVersion::Ietf
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolVersion::Legacy => write!(f, "legacy"),
            ProtocolVersion::Ietf => write!(f, "ietf"),
        }
    }
}
