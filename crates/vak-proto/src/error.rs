// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Error types for Roughtime packet decoding and reply verification.
//!
//! [`RoughtimeError`] is `no_std`-compatible via `core::fmt::Display`, with
//! [`std::error::Error`] and `From<RoughtimeError> for std::io::Error` behind
//! `#[cfg(feature = "std")]`.
//!
//! Every variant belongs to one [`ErrorClass`]. Format errors mean the reply
//! could not be parsed; verification errors mean it parsed but its claims did
//! not check out, which may indicate an attack rather than line noise.

use core::fmt;

use crate::tag;

/// Broad category of a [`RoughtimeError`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorClass {
    /// The bytes do not form a well-formed Roughtime message.
    Format,
    /// The message is well formed but a cryptographic or consistency check failed.
    Verification,
}

/// Errors that can occur while encoding, decoding, or verifying Roughtime messages.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum RoughtimeError {
    /// A message or value length is not a multiple of four bytes.
    NotAligned {
        /// The offending length.
        len: usize,
    },
    /// The message is shorter than the minimum required length.
    MessageTooShort {
        /// Number of bytes needed.
        needed: usize,
        /// Number of bytes available.
        available: usize,
    },
    /// The envelope length field disagrees with the number of bytes received.
    EnvelopeLengthMismatch {
        /// Length declared in the envelope header.
        declared: usize,
        /// Length of the body actually present.
        actual: usize,
    },
    /// The envelope magic is missing where the protocol variant requires it.
    InvalidMagic,
    /// A tag-value offset points beyond the packet or before the previous value.
    OffsetOutOfBounds,
    /// A tag key appears more than once in the same packet.
    DuplicateTag {
        /// The repeated 4-byte key.
        tag: [u8; 4],
    },
    /// A tag key is neither a known leaf nor a known parent tag.
    UnknownTag {
        /// The unrecognized 4-byte key.
        tag: [u8; 4],
    },
    /// A tag key name is longer than four bytes.
    InvalidTagKey {
        /// Length of the rejected key name.
        len: usize,
    },
    /// A required tag is missing from the message.
    MissingTag {
        /// The 4-byte key that was expected.
        tag: [u8; 4],
    },
    /// A tag's value has an unexpected length.
    InvalidTagLength {
        /// The 4-byte key.
        tag: [u8; 4],
        /// The expected length.
        expected: usize,
        /// The actual length.
        actual: usize,
    },
    /// Parent tags are nested deeper than the decoder allows.
    NestingTooDeep,
    /// A nested packet was expected but the tag holds raw bytes, or vice versa.
    UnexpectedTagKind {
        /// The 4-byte key.
        tag: [u8; 4],
    },
    /// The reply's `NONC` tag is absent or does not match the nonce that was
    /// sent.
    NonceMismatch,
    /// The delegation certificate signature (`CERT.SIG`) did not verify under
    /// the server's long-term key.
    CertificateSignatureInvalid,
    /// The response signature (`SIG`) did not verify under the delegated key.
    ResponseSignatureInvalid,
    /// `MIDP` lies outside the delegated key's `[MINT, MAXT]` validity window.
    DelegationExpired {
        /// The midpoint claimed by the server.
        midpoint: u64,
        /// Start of the delegation window.
        mint: u64,
        /// End of the delegation window.
        maxt: u64,
    },
    /// `PATH` is not a whole number of Merkle tree nodes.
    MerklePathLength {
        /// Length of `PATH` in bytes.
        len: usize,
        /// Node size for the protocol variant.
        node_size: usize,
    },
    /// `PATH` describes a tree deeper than the permitted maximum.
    MerklePathTooLong {
        /// Number of levels in `PATH`.
        levels: usize,
    },
    /// `INDX` still has bits set after the whole path was consumed.
    MerkleIndexNotConsumed,
    /// The recomputed Merkle root does not equal `ROOT`.
    MerkleRootMismatch,
}

impl RoughtimeError {
    /// Classify this error as a format or verification failure.
    pub fn class(&self) -> ErrorClass {
        match self {
            RoughtimeError::NonceMismatch
            | RoughtimeError::CertificateSignatureInvalid
            | RoughtimeError::ResponseSignatureInvalid
            | RoughtimeError::DelegationExpired { .. }
            | RoughtimeError::MerklePathLength { .. }
            | RoughtimeError::MerklePathTooLong { .. }
            | RoughtimeError::MerkleIndexNotConsumed
            | RoughtimeError::MerkleRootMismatch => ErrorClass::Verification,
            _ => ErrorClass::Format,
        }
    }

    /// Returns `true` if this is a verification failure.
    pub fn is_verification(&self) -> bool {
        self.class() == ErrorClass::Verification
    }
}

impl fmt::Display for RoughtimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoughtimeError::NotAligned { len } => {
                write!(f, "length {} is not a multiple of four", len)
            }
            RoughtimeError::MessageTooShort { needed, available } => {
                write!(
                    f,
                    "message too short: needed {} bytes, got {}",
                    needed, available
                )
            }
            RoughtimeError::EnvelopeLengthMismatch { declared, actual } => {
                write!(
                    f,
                    "envelope declares {} bytes but {} are present",
                    declared, actual
                )
            }
            RoughtimeError::InvalidMagic => write!(f, "invalid Roughtime envelope magic"),
            RoughtimeError::OffsetOutOfBounds => write!(f, "tag-value offset out of bounds"),
            RoughtimeError::DuplicateTag { tag } => {
                write!(f, "duplicate tag: {}", tag::Display(tag))
            }
            RoughtimeError::UnknownTag { tag } => {
                write!(f, "unknown tag: {}", tag::Display(tag))
            }
            RoughtimeError::InvalidTagKey { len } => {
                write!(f, "tag key is {} bytes, at most 4 allowed", len)
            }
            RoughtimeError::MissingTag { tag } => {
                write!(f, "missing required tag: {}", tag::Display(tag))
            }
            RoughtimeError::InvalidTagLength {
                tag,
                expected,
                actual,
            } => {
                write!(
                    f,
                    "tag {} has invalid length: expected {}, got {}",
                    tag::Display(tag),
                    expected,
                    actual
                )
            }
            RoughtimeError::NestingTooDeep => write!(f, "parent tags nested too deeply"),
            RoughtimeError::UnexpectedTagKind { tag } => {
                write!(f, "tag {} has the wrong value kind", tag::Display(tag))
            }
            RoughtimeError::NonceMismatch => write!(f, "nonce mismatch"),
            RoughtimeError::CertificateSignatureInvalid => {
                write!(f, "long-term key signature over DELE is invalid")
            }
            RoughtimeError::ResponseSignatureInvalid => {
                write!(f, "delegated key signature over SREP is invalid")
            }
            RoughtimeError::DelegationExpired {
                midpoint,
                mint,
                maxt,
            } => {
                write!(
                    f,
                    "MIDP {} outside delegated key validity [{}, {}]",
                    midpoint, mint, maxt
                )
            }
            RoughtimeError::MerklePathLength { len, node_size } => {
                write!(
                    f,
                    "PATH length {} is not a multiple of {}",
                    len, node_size
                )
            }
            RoughtimeError::MerklePathTooLong { levels } => {
                write!(f, "Merkle path has {} levels", levels)
            }
            RoughtimeError::MerkleIndexNotConsumed => {
                write!(f, "INDX not zero after traversing PATH")
            }
            RoughtimeError::MerkleRootMismatch => {
                write!(f, "final Merkle tree value not equal to ROOT")
            }
        }
    }
}

#[cfg(feature = "std")]
impl From<RoughtimeError> for std::io::Error {
    fn from(err: RoughtimeError) -> std::io::Error {
        let kind = match &err {
            RoughtimeError::MessageTooShort { .. } => std::io::ErrorKind::UnexpectedEof,
            _ => std::io::ErrorKind::InvalidData,
        };
        std::io::Error::new(kind, err)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for RoughtimeError {}
