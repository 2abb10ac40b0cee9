// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Reply verification.
//!
//! [`verify_reply`] runs every check a client needs before trusting a reply:
//!
//! 1. `SREP`, `CERT` and `CERT.DELE` are present
//! 2. `NONC` echoes the request nonce (IETF variant)
//! 3. every field needed below is present and well sized
//! 4. the long-term key signed `DELE`
//! 5. `MINT <= MIDP <= MAXT`
//! 6. the Merkle path proves the nonce is under `ROOT`
//! 7. the delegated key signed `SREP`
//!
//! Signatures are checked over the bytes exactly as received.

use alloc::vec::Vec;

use byteorder::{ByteOrder, LittleEndian};

use crate::error::RoughtimeError;
use crate::merkle;
use crate::packet::Packet;
use crate::signature::{CERTIFICATE_CONTEXT, RESPONSE_CONTEXT, SignatureVerifier, signed_message};
use crate::tag::{self, TagKey};
use crate::timestamp;
use crate::version::ProtocolVersion;

/// Top bit of a `LEAP` entry marks the direction; the rest is the day number.
const LEAP_DAY_MASK: u32 = 0x7fff_ffff;

/// A reply that passed every check.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct VerifiedReply {
    /// Raw `MIDP` value.
    pub midpoint: u64,
    /// `RADI` in microseconds.
    pub radius: u64,
    /// Raw `MINT` value.
    pub mint: u64,
    /// Raw `MAXT` value.
    pub maxt: u64,
    /// Number of levels in the Merkle audit path.
    pub path_len: usize,
    /// `DTAI`, if the server sent one.
    pub dtai: Option<u64>,
    /// `LEAP` entries with the direction bit cleared, if the server sent any.
    pub leap: Option<Vec<u32>>,
}

impl VerifiedReply {
    /// Midpoint as fractional Unix seconds.
    pub fn midpoint_seconds(&self) -> Option<f64> {
        timestamp::to_unix_seconds(self.midpoint)
    }

    /// Radius in fractional seconds.
    pub fn radius_seconds(&self) -> f64 {
        self.radius as f64 / 1e6
    }
}

/// Read an integer tag. Four- and eight-byte encodings are both accepted.
pub fn read_int(packet: &Packet, key: &TagKey) -> Result<u64, RoughtimeError> {
    let data = packet.require_bytes(key)?;
    match data.len() {
        4 => Ok(u64::from(LittleEndian::read_u32(data))),
        8 => Ok(LittleEndian::read_u64(data)),
        n => Err(RoughtimeError::InvalidTagLength {
            tag: *key,
            expected: 8,
            actual: n,
        }),
    }
}

fn read_optional_int(packet: &Packet, key: &TagKey) -> Result<Option<u64>, RoughtimeError> {
    if packet.contains(key) {
        read_int(packet, key).map(Some)
    } else {
        Ok(None)
    }
}

fn read_leap(packet: &Packet) -> Result<Option<Vec<u32>>, RoughtimeError> {
    if !packet.contains(&tag::LEAP) {
        return Ok(None);
    }
    let data = packet.require_bytes(&tag::LEAP)?;
    Ok(Some(
        data.chunks_exact(4)
            .map(|c| LittleEndian::read_u32(c) & LEAP_DAY_MASK)
            .collect(),
    ))
}

/// `SREP.MIDP` and `SREP.RADI` of a decoded reply, without verifying anything.
pub fn midpoint_and_radius(reply: &Packet) -> Result<(u64, u64), RoughtimeError> {
    let srep = reply.require_packet(&tag::SREP)?;
    Ok((read_int(srep, &tag::MIDP)?, read_int(srep, &tag::RADI)?))
}

/// Verify a decoded reply to a request that carried `nonce`.
pub fn verify_reply<V>(
    reply: &Packet,
    nonce: &[u8],
    long_term_key: &[u8],
    version: ProtocolVersion,
    verifier: &V,
) -> Result<VerifiedReply, RoughtimeError>
where
    V: SignatureVerifier + ?Sized,
{
    let srep = reply.require_packet(&tag::SREP)?;
    let cert = reply.require_packet(&tag::CERT)?;
    let dele = cert.require_packet(&tag::DELE)?;

    // An absent echo is treated like a wrong one.
    if version.echoes_nonce() && reply.bytes(&tag::NONC) != Some(nonce) {
        return Err(RoughtimeError::NonceMismatch);
    }

    let cert_sig = cert.require_bytes(&tag::SIG)?;
    let dtai = read_optional_int(srep, &tag::DTAI)?;
    let leap = read_leap(srep)?;
    let midpoint = read_int(srep, &tag::MIDP)?;
    let radius = read_int(srep, &tag::RADI)?;
    let root = srep.require_bytes(&tag::ROOT)?;
    let sig = reply.require_bytes(&tag::SIG)?;
    let index = read_int(reply, &tag::INDX)?;
    let path = reply.require_bytes(&tag::PATH)?;
    let delegated_key = dele.require_bytes(&tag::PUBK)?;
    let mint = read_int(dele, &tag::MINT)?;
    let maxt = read_int(dele, &tag::MAXT)?;

    let dele_msg = signed_message(CERTIFICATE_CONTEXT, &dele.raw());
    if !verifier.verify(long_term_key, &dele_msg, cert_sig) {
        return Err(RoughtimeError::CertificateSignatureInvalid);
    }

    if mint > midpoint || maxt < midpoint {
        return Err(RoughtimeError::DelegationExpired {
            midpoint,
            mint,
            maxt,
        });
    }

    // An index wider than 32 bits can never be consumed by a legal path.
    let index = u32::try_from(index).map_err(|_| RoughtimeError::MerkleIndexNotConsumed)?;
    let node_size = version.node_size();
    merkle::verify(nonce, index, path, root, node_size)?;

    let srep_msg = signed_message(RESPONSE_CONTEXT, &srep.raw());
    if !verifier.verify(delegated_key, &srep_msg, sig) {
        return Err(RoughtimeError::ResponseSignatureInvalid);
    }

    Ok(VerifiedReply {
        midpoint,
        radius,
        mint,
        maxt,
        path_len: path.len() / node_size,
        dtai,
        leap,
    })
}

/// Decode `reply_bytes` and verify it. Decoding failures are format errors.
pub fn verify_reply_bytes<V>(
    reply_bytes: &[u8],
    nonce: &[u8],
    long_term_key: &[u8],
    version: ProtocolVersion,
    verifier: &V,
) -> Result<VerifiedReply, RoughtimeError>
where
    V: SignatureVerifier + ?Sized,
{
    let reply = Packet::from_bytes(reply_bytes, version.uses_envelope())?;
    verify_reply(&reply, nonce, long_term_key, version, verifier)
}
