// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Roughtime packet codec.
//!
//! A packet is a tag-value map:
//! ```text
//! num_tags: u32 LE
//! offsets:  [u32 LE; N-1]   (value offsets, the first value's zero offset is implicit)
//! keys:     [[u8; 4]; N]    (ascending by LE u32)
//! values:   [u8]            (concatenated, 4-byte aligned)
//! ```
//!
//! The header therefore occupies `8 * N` bytes. Parent tags (`SREP`, `CERT`,
//! `DELE`) hold nested packets in the same format.
//!
//! Newer servers wrap the top-level packet in an envelope: the magic
//! `"ROUGHTIM"` as a LE `u64`, then the body length as a LE `u32`.

use alloc::borrow::Cow;
use alloc::vec;
use alloc::vec::Vec;

use byteorder::{ByteOrder, LittleEndian};

use crate::error::RoughtimeError;
use crate::tag::{self, Tag, TagKey};

/// Magic bytes for a Roughtime envelope: `"ROUGHTIM"` read as a LE u64.
pub const ENVELOPE_MAGIC: u64 = 0x4d49_5448_4755_4f52;

/// Envelope header size: 8 (magic) + 4 (length).
pub const ENVELOPE_HEADER_LEN: usize = 12;

/// Minimum encoded size of a padded request.
pub const MIN_REQUEST_LEN: usize = 1024;

/// Deepest chain of parent tags the decoder follows.
const MAX_NESTING: usize = 8;

/// An ordered set of tags, unique by key and sorted in wire order.
///
/// A decoded packet remembers the exact bytes it was decoded from; signatures
/// are always checked over those bytes rather than over a re-encoding.
#[derive(Clone, Debug, Default, Eq)]
pub struct Packet {
    tags: Vec<Tag>,
    received: Option<Vec<u8>>,
}

impl PartialEq for Packet {
    fn eq(&self, other: &Packet) -> bool {
        self.tags == other.tags
    }
}

impl Packet {
    /// An empty packet.
    pub fn new() -> Packet {
        Packet::default()
    }

    /// Build a packet from tags in any order.
    pub fn from_tags<I>(tags: I) -> Result<Packet, RoughtimeError>
    where
        I: IntoIterator<Item = Tag>,
    {
        let mut packet = Packet::new();
        for t in tags {
            packet.add(t)?;
        }
        Ok(packet)
    }

    /// Insert `tag` at its sorted position.
    ///
    /// Fails with [`RoughtimeError::DuplicateTag`] if the key is already
    /// present; the packet is left unchanged.
    pub fn add(&mut self, tag: Tag) -> Result<(), RoughtimeError> {
        let wanted = tag::sort_key(tag.key());
        match self
            .tags
            .binary_search_by_key(&wanted, |t| tag::sort_key(t.key()))
        {
            Ok(_) => Err(RoughtimeError::DuplicateTag { tag: *tag.key() }),
            Err(pos) => {
                self.tags.insert(pos, tag);
                // Any local change invalidates the received span.
                self.received = None;
                Ok(())
            }
        }
    }

    /// Look up a tag by key.
    pub fn get(&self, key: &TagKey) -> Option<&Tag> {
        let wanted = tag::sort_key(key);
        self.tags
            .binary_search_by_key(&wanted, |t| tag::sort_key(t.key()))
            .ok()
            .map(|i| &self.tags[i])
    }

    /// Returns `true` if a tag with `key` is present.
    pub fn contains(&self, key: &TagKey) -> bool {
        self.get(key).is_some()
    }

    /// Bytes of a leaf tag, or `None` if absent or nested.
    pub fn bytes(&self, key: &TagKey) -> Option<&[u8]> {
        self.get(key).and_then(Tag::as_bytes)
    }

    /// Bytes of a required leaf tag.
    pub fn require_bytes(&self, key: &TagKey) -> Result<&[u8], RoughtimeError> {
        let t = self
            .get(key)
            .ok_or(RoughtimeError::MissingTag { tag: *key })?;
        t.as_bytes()
            .ok_or(RoughtimeError::UnexpectedTagKind { tag: *key })
    }

    /// Nested packet of a required parent tag.
    pub fn require_packet(&self, key: &TagKey) -> Result<&Packet, RoughtimeError> {
        let t = self
            .get(key)
            .ok_or(RoughtimeError::MissingTag { tag: *key })?;
        t.as_packet()
            .ok_or(RoughtimeError::UnexpectedTagKind { tag: *key })
    }

    /// Tags in wire order.
    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    /// Number of tags.
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    /// Returns `true` if the packet holds no tags.
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// The bytes this packet was decoded from, if it was decoded.
    pub fn received(&self) -> Option<&[u8]> {
        self.received.as_deref()
    }

    /// Received bytes if available, otherwise a fresh encoding.
    pub fn raw(&self) -> Cow<'_, [u8]> {
        match &self.received {
            Some(r) => Cow::Borrowed(r),
            None => Cow::Owned(self.encode()),
        }
    }

    /// Size of [`Packet::encode`]'s output.
    pub fn encoded_len(&self) -> usize {
        header_len(self.tags.len()) + self.tags.iter().map(Tag::encoded_len).sum::<usize>()
    }

    /// Encode without an envelope.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.encoded_len());
        self.write_to(&mut out);
        out
    }

    /// Encode, optionally wrapped in an envelope.
    pub fn to_bytes(&self, envelope: bool) -> Vec<u8> {
        if !envelope {
            return self.encode();
        }
        let body_len = self.encoded_len();
        let mut out = Vec::with_capacity(ENVELOPE_HEADER_LEN + body_len);
        let mut header = [0u8; ENVELOPE_HEADER_LEN];
        LittleEndian::write_u64(&mut header[..8], ENVELOPE_MAGIC);
        LittleEndian::write_u32(&mut header[8..], body_len as u32);
        out.extend_from_slice(&header);
        self.write_to(&mut out);
        out
    }

    pub(crate) fn write_to(&self, out: &mut Vec<u8>) {
        let mut word = [0u8; 4];
        LittleEndian::write_u32(&mut word, self.tags.len() as u32);
        out.extend_from_slice(&word);

        let mut offset = 0usize;
        for t in self.tags.iter().take(self.tags.len().saturating_sub(1)) {
            offset += t.encoded_len();
            LittleEndian::write_u32(&mut word, offset as u32);
            out.extend_from_slice(&word);
        }
        for t in &self.tags {
            out.extend_from_slice(t.key());
        }
        for t in &self.tags {
            t.write_value(out);
        }
    }

    /// Add a client padding tag so the encoding reaches [`MIN_REQUEST_LEN`].
    ///
    /// No-op when the packet is already large enough.
    pub fn pad(&mut self) -> Result<(), RoughtimeError> {
        let len = self.encoded_len();
        if len >= MIN_REQUEST_LEN {
            return Ok(());
        }
        let growth = header_len(self.tags.len() + 1) - header_len(self.tags.len());
        let fill = MIN_REQUEST_LEN.saturating_sub(len + growth);
        self.add(Tag::new(tag::PAD_CLIENT, vec![0u8; fill])?)
    }

    /// Decode a packet without an envelope.
    pub fn decode(buf: &[u8]) -> Result<Packet, RoughtimeError> {
        decode_at_depth(buf, 0)
    }

    /// Decode a packet, expecting an envelope when `envelope` is set.
    pub fn from_bytes(buf: &[u8], envelope: bool) -> Result<Packet, RoughtimeError> {
        if envelope {
            Packet::decode(open_envelope(buf)?)
        } else {
            Packet::decode(buf)
        }
    }
}

/// Strip the envelope, returning the body.
///
/// The declared length must equal the number of bytes after the header.
pub fn open_envelope(buf: &[u8]) -> Result<&[u8], RoughtimeError> {
    if buf.len() < ENVELOPE_HEADER_LEN {
        return Err(RoughtimeError::MessageTooShort {
            needed: ENVELOPE_HEADER_LEN,
            available: buf.len(),
        });
    }
    if LittleEndian::read_u64(&buf[..8]) != ENVELOPE_MAGIC {
        return Err(RoughtimeError::InvalidMagic);
    }
    let declared = LittleEndian::read_u32(&buf[8..12]) as usize;
    let body = &buf[ENVELOPE_HEADER_LEN..];
    if declared != body.len() {
        return Err(RoughtimeError::EnvelopeLengthMismatch {
            declared,
            actual: body.len(),
        });
    }
    Ok(body)
}

fn header_len(num_tags: usize) -> usize {
    if num_tags == 0 { 4 } else { 8 * num_tags }
}

fn decode_at_depth(buf: &[u8], depth: usize) -> Result<Packet, RoughtimeError> {
    if depth > MAX_NESTING {
        return Err(RoughtimeError::NestingTooDeep);
    }
    if buf.len() % 4 != 0 {
        return Err(RoughtimeError::NotAligned { len: buf.len() });
    }
    if buf.len() < 4 {
        return Err(RoughtimeError::MessageTooShort {
            needed: 4,
            available: buf.len(),
        });
    }

    let num_tags = LittleEndian::read_u32(&buf[..4]) as usize;
    let header = match num_tags.checked_mul(8) {
        Some(0) => 4,
        Some(h) => h,
        None => usize::MAX,
    };
    if buf.len() < header {
        return Err(RoughtimeError::MessageTooShort {
            needed: header,
            available: buf.len(),
        });
    }

    let offsets = &buf[4..4 + 4 * num_tags.saturating_sub(1)];
    let keys_start = 4 + offsets.len();
    let mut packet = Packet::new();
    let mut start = header;

    for i in 0..num_tags {
        let end = if i + 1 == num_tags {
            buf.len()
        } else {
            let off = LittleEndian::read_u32(&offsets[4 * i..4 * i + 4]) as usize;
            header.checked_add(off).unwrap_or(usize::MAX)
        };
        if end < start || end > buf.len() {
            return Err(RoughtimeError::OffsetOutOfBounds);
        }
        if (end - start) % 4 != 0 {
            return Err(RoughtimeError::NotAligned { len: end - start });
        }

        let mut key = [0u8; 4];
        key.copy_from_slice(&buf[keys_start + 4 * i..keys_start + 4 * i + 4]);
        if packet.contains(&key) {
            return Err(RoughtimeError::DuplicateTag { tag: key });
        }

        let value = &buf[start..end];
        let entry = if tag::is_parent(&key) {
            Tag::nested(key, decode_at_depth(value, depth + 1)?)
        } else if tag::is_leaf(&key) {
            Tag::new(key, value.to_vec())?
        } else {
            return Err(RoughtimeError::UnknownTag { tag: key });
        };
        packet.add(entry)?;
        start = end;
    }

    packet.received = Some(buf.to_vec());
    Ok(packet)
}
