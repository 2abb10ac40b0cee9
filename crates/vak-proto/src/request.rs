// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Request construction and nonce chaining.
//!
//! Each nonce commits to the previous reply:
//! `nonce = SHA-512(previous_reply || blind)`, or `SHA-512(blind)` for the
//! first request, truncated to the variant's nonce length. A chain of replies
//! built this way lets a third party prove that a server's answer was produced
//! after an earlier, possibly contradicting, answer from another server.

use alloc::vec::Vec;

use ring::digest;

use crate::error::RoughtimeError;
use crate::packet::Packet;
use crate::tag::{self, Tag};
use crate::version::ProtocolVersion;

/// Length of the random blinding value.
pub const BLIND_LEN: usize = 64;

/// Derive the nonce for the next request.
pub fn derive_nonce(
    previous_reply: Option<&[u8]>,
    blind: &[u8; BLIND_LEN],
    version: ProtocolVersion,
) -> Vec<u8> {
    let mut ctx = digest::Context::new(&digest::SHA512);
    if let Some(prev) = previous_reply {
        ctx.update(prev);
    }
    ctx.update(blind);
    let hash = ctx.finish();
    hash.as_ref()[..version.nonce_len()].to_vec()
}

/// A request ready to send, along with the nonce needed to check its reply.
#[derive(Clone, Debug)]
pub struct Request {
    version: ProtocolVersion,
    nonce: Vec<u8>,
    packet: Packet,
}

impl Request {
    /// Build a request carrying `nonce`.
    ///
    /// `pad` should be set for datagram transports so the request is at least
    /// as large as any reply it elicits.
    pub fn new(version: ProtocolVersion, nonce: Vec<u8>, pad: bool) -> Result<Request, RoughtimeError> {
        if nonce.len() != version.nonce_len() {
            return Err(RoughtimeError::InvalidTagLength {
                tag: tag::NONC,
                expected: version.nonce_len(),
                actual: nonce.len(),
            });
        }
        let mut packet = Packet::new();
        if let Some(ver) = version.version_tag() {
            packet.add(Tag::from_u32(tag::VER, ver))?;
        }
        packet.add(Tag::new(tag::NONC, nonce.clone())?)?;
        if pad {
            packet.pad()?;
        }
        Ok(Request {
            version,
            nonce,
            packet,
        })
    }

    /// Build a request whose nonce chains onto `previous_reply`.
    pub fn chained(
        version: ProtocolVersion,
        previous_reply: Option<&[u8]>,
        blind: &[u8; BLIND_LEN],
        pad: bool,
    ) -> Result<Request, RoughtimeError> {
        Request::new(version, derive_nonce(previous_reply, blind, version), pad)
    }

    /// The nonce sent in this request.
    pub fn nonce(&self) -> &[u8] {
        &self.nonce
    }

    /// The protocol variant this request was built for.
    pub fn version(&self) -> ProtocolVersion {
        self.version
    }

    /// The request packet.
    pub fn packet(&self) -> &Packet {
        &self.packet
    }

    /// Wire bytes, enveloped when the variant calls for it.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.packet.to_bytes(self.version.uses_envelope())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::{ENVELOPE_HEADER_LEN, MIN_REQUEST_LEN};
    use alloc::vec;

    #[test]
    fn test_nonce_without_history() {
        let blind = [5u8; BLIND_LEN];
        let nonce = derive_nonce(None, &blind, ProtocolVersion::Legacy);
        let expected = digest::digest(&digest::SHA512, &blind);
        assert_eq!(nonce, expected.as_ref());
    }

    #[test]
    fn test_nonce_chains_previous_reply() {
        let blind = [5u8; BLIND_LEN];
        let prev = b"previous reply bytes";
        let nonce = derive_nonce(Some(&prev[..]), &blind, ProtocolVersion::Ietf);

        let mut input = prev.to_vec();
        input.extend_from_slice(&blind);
        let expected = digest::digest(&digest::SHA512, &input);
        assert_eq!(nonce, &expected.as_ref()[..32]);
        assert_ne!(nonce, derive_nonce(None, &blind, ProtocolVersion::Ietf));
    }

    #[test]
    fn test_ietf_request_layout() {
        let req = Request::new(ProtocolVersion::Ietf, vec![0xAA; 32], true).unwrap();
        let bytes = req.to_bytes();
        assert_eq!(bytes.len(), ENVELOPE_HEADER_LEN + MIN_REQUEST_LEN);

        let decoded = Packet::from_bytes(&bytes, true).unwrap();
        assert_eq!(decoded.bytes(&tag::NONC), Some(&[0xAA; 32][..]));
        assert_eq!(
            decoded.bytes(&tag::VER),
            Some(&0x8000_0003u32.to_le_bytes()[..])
        );
        assert!(decoded.contains(&tag::PAD_CLIENT));
    }

    #[test]
    fn test_legacy_request_layout() {
        let req = Request::new(ProtocolVersion::Legacy, vec![0xBB; 64], false).unwrap();
        let bytes = req.to_bytes();
        let decoded = Packet::decode(&bytes).unwrap();
        assert_eq!(decoded.len(), 1);
        assert!(!decoded.contains(&tag::VER));
        assert_eq!(req.nonce(), &[0xBB; 64][..]);
    }

    #[test]
    fn test_wrong_nonce_length() {
        assert_eq!(
            Request::new(ProtocolVersion::Ietf, vec![0; 64], false).unwrap_err(),
            RoughtimeError::InvalidTagLength {
                tag: tag::NONC,
                expected: 32,
                actual: 64
            }
        );
    }

    #[test]
    fn test_chained_is_deterministic() {
        let blind = [0x11; BLIND_LEN];
        let a = Request::chained(ProtocolVersion::Ietf, Some(&b"reply"[..]), &blind, true).unwrap();
        let b = Request::chained(ProtocolVersion::Ietf, Some(&b"reply"[..]), &blind, true).unwrap();
        assert_eq!(a.nonce(), b.nonce());
        assert_eq!(a.to_bytes(), b.to_bytes());
    }
}
