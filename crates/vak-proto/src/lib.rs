// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Roughtime wire format, request construction, and reply verification.
//!
//! This crate knows bytes and cryptography but not sockets: it encodes and
//! decodes the nested tag-value packet format, builds chained requests, and
//! verifies replies (delegation certificate, Merkle audit path, response
//! signature) for both the legacy and the IETF variants of the protocol.
//!
//! ```
//! use vak_proto::{ProtocolVersion, Request};
//!
//! let blind = [0u8; vak_proto::request::BLIND_LEN];
//! let req = Request::chained(ProtocolVersion::Ietf, None, &blind, true).unwrap();
//! assert_eq!(req.nonce().len(), 32);
//! assert_eq!(req.to_bytes().len(), 12 + 1024);
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]

extern crate alloc;

/// Error types for decoding and verification.
pub mod error;

/// Merkle audit-path verification.
pub mod merkle;

/// Packet encoding, decoding, padding and the envelope.
pub mod packet;

/// Request construction and nonce chaining.
pub mod request;

/// Detached-signature verification seam and the Ed25519 implementation.
pub mod signature;

/// Tag keys and values.
pub mod tag;

/// Timestamp decoding.
pub mod timestamp;

/// Full reply verification.
pub mod verify;

/// Protocol variants.
pub mod version;

pub use error::{ErrorClass, RoughtimeError};
pub use packet::Packet;
pub use request::Request;
pub use signature::{Ed25519Verifier, SignatureVerifier};
pub use tag::{Tag, TagKey, TagValue};
pub use verify::{VerifiedReply, verify_reply, verify_reply_bytes};
pub use version::ProtocolVersion;
