// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Roughtime tag keys and tag values.
//!
//! A tag key is four bytes, usually ASCII right-padded with NUL. Keys are
//! ordered by their little-endian `u32` interpretation, which is the order
//! they must appear in on the wire.

use alloc::vec::Vec;
use core::fmt;

use byteorder::{ByteOrder, LittleEndian};

use crate::error::RoughtimeError;
use crate::packet::Packet;

/// A 4-byte Roughtime tag key.
pub type TagKey = [u8; 4];

/// Ed25519 signature (64 bytes).
pub const SIG: TagKey = *b"SIG\0";
/// Index of the request's leaf in the Merkle tree.
pub const INDX: TagKey = *b"INDX";
/// Merkle audit path, concatenated sibling nodes.
pub const PATH: TagKey = *b"PATH";
/// Merkle tree root.
pub const ROOT: TagKey = *b"ROOT";
/// Midpoint timestamp.
pub const MIDP: TagKey = *b"MIDP";
/// Radius of uncertainty in microseconds.
pub const RADI: TagKey = *b"RADI";
/// Server-side padding.
pub const PAD: TagKey = *b"PAD\0";
/// Client-side padding, as sent by clients to reach the minimum request size.
pub const PAD_CLIENT: TagKey = *b"PAD\xff";
/// Request nonce.
pub const NONC: TagKey = *b"NONC";
/// Start of the delegated key's validity window.
pub const MINT: TagKey = *b"MINT";
/// End of the delegated key's validity window.
pub const MAXT: TagKey = *b"MAXT";
/// Delegated public key.
pub const PUBK: TagKey = *b"PUBK";
/// Protocol version.
pub const VER: TagKey = *b"VER\0";
/// TAI minus UTC offset in seconds.
pub const DTAI: TagKey = *b"DTAI";
/// UT1 minus UTC offset.
pub const DUT1: TagKey = *b"DUT1";
/// Leap second table.
pub const LEAP: TagKey = *b"LEAP";
/// Signed response (nested).
pub const SREP: TagKey = *b"SREP";
/// Delegation certificate (nested).
pub const CERT: TagKey = *b"CERT";
/// Delegation (nested inside `CERT`).
pub const DELE: TagKey = *b"DELE";

/// Keys whose values are opaque byte strings.
pub const LEAF_TAGS: [TagKey; 16] = [
    SIG, INDX, PATH, ROOT, MIDP, RADI, PAD, PAD_CLIENT, NONC, MINT, MAXT, PUBK, VER, DTAI, DUT1,
    LEAP,
];

/// Keys whose values are themselves packets.
pub const PARENT_TAGS: [TagKey; 3] = [SREP, CERT, DELE];

/// Returns `true` if `key` holds opaque bytes.
pub fn is_leaf(key: &TagKey) -> bool {
    LEAF_TAGS.contains(key)
}

/// Returns `true` if `key` holds a nested packet.
pub fn is_parent(key: &TagKey) -> bool {
    PARENT_TAGS.contains(key)
}

/// Wire ordering value of a key.
pub fn sort_key(key: &TagKey) -> u32 {
    LittleEndian::read_u32(key)
}

/// Build a key from a name of at most four bytes, right-padding with NUL.
pub fn key_from_name(name: &[u8]) -> Result<TagKey, RoughtimeError> {
    if name.len() > 4 {
        return Err(RoughtimeError::InvalidTagKey { len: name.len() });
    }
    let mut key = [0u8; 4];
    key[..name.len()].copy_from_slice(name);
    Ok(key)
}

/// Printable form of a key: trailing NULs dropped, other non-ASCII bytes escaped.
pub struct Display<'a>(pub &'a TagKey);

impl fmt::Display for Display<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let end = self.0.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
        for &b in &self.0[..end] {
            if b.is_ascii_graphic() {
                write!(f, "{}", b as char)?;
            } else {
                write!(f, "\\x{:02x}", b)?;
            }
        }
        Ok(())
    }
}

/// The value carried by a tag.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TagValue {
    /// Opaque bytes, length a multiple of four.
    Bytes(Vec<u8>),
    /// A nested packet (only for [`PARENT_TAGS`]).
    Packet(Packet),
}

/// A single key/value entry of a [`Packet`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Tag {
    key: TagKey,
    value: TagValue,
}

impl Tag {
    /// Create a leaf tag. The value must be 4-byte aligned.
    pub fn new(key: TagKey, value: Vec<u8>) -> Result<Tag, RoughtimeError> {
        if value.len() % 4 != 0 {
            return Err(RoughtimeError::NotAligned { len: value.len() });
        }
        Ok(Tag {
            key,
            value: TagValue::Bytes(value),
        })
    }

    /// Create a leaf tag from a name such as `"NONC"` or `"SIG"`.
    pub fn named(name: &str, value: Vec<u8>) -> Result<Tag, RoughtimeError> {
        Tag::new(key_from_name(name.as_bytes())?, value)
    }

    /// Create a parent tag holding `packet`.
    pub fn nested(key: TagKey, packet: Packet) -> Tag {
        Tag {
            key,
            value: TagValue::Packet(packet),
        }
    }

    /// Leaf tag holding a little-endian `u32`.
    pub fn from_u32(key: TagKey, value: u32) -> Tag {
        let mut buf = [0u8; 4];
        LittleEndian::write_u32(&mut buf, value);
        Tag {
            key,
            value: TagValue::Bytes(buf.to_vec()),
        }
    }

    /// Leaf tag holding a little-endian `u64`.
    pub fn from_u64(key: TagKey, value: u64) -> Tag {
        let mut buf = [0u8; 8];
        LittleEndian::write_u64(&mut buf, value);
        Tag {
            key,
            value: TagValue::Bytes(buf.to_vec()),
        }
    }

    /// The tag's key.
    pub fn key(&self) -> &TagKey {
        &self.key
    }

    /// The tag's value.
    pub fn value(&self) -> &TagValue {
        &self.value
    }

    /// Raw bytes of a leaf tag, `None` for a parent tag.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match &self.value {
            TagValue::Bytes(b) => Some(b),
            TagValue::Packet(_) => None,
        }
    }

    /// Nested packet of a parent tag, `None` for a leaf tag.
    pub fn as_packet(&self) -> Option<&Packet> {
        match &self.value {
            TagValue::Packet(p) => Some(p),
            TagValue::Bytes(_) => None,
        }
    }

    /// Number of bytes the value occupies on the wire.
    pub fn encoded_len(&self) -> usize {
        match &self.value {
            TagValue::Bytes(b) => b.len(),
            TagValue::Packet(p) => p.encoded_len(),
        }
    }

    pub(crate) fn write_value(&self, out: &mut Vec<u8>) {
        match &self.value {
            TagValue::Bytes(b) => out.extend_from_slice(b),
            TagValue::Packet(p) => p.write_to(out),
        }
    }
}
