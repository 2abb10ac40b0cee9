// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

#![no_main]
use libfuzzer_sys::fuzz_target;
use vak_proto::{Ed25519Verifier, ProtocolVersion, verify_reply_bytes};

fuzz_target!(|data: &[u8]| {
    // Verification of hostile replies must fail closed, never panic.
    let nonce = [0u8; 64];
    let key = [0u8; 32];
    let _ = verify_reply_bytes(data, &nonce[..32], &key, ProtocolVersion::Ietf, &Ed25519Verifier);
    let _ = verify_reply_bytes(data, &nonce, &key, ProtocolVersion::Legacy, &Ed25519Verifier);
});
