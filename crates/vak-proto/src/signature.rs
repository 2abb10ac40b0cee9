// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Detached-signature verification.
//!
//! Reply verification only needs "does this signature over this message
//! verify under this key". [`SignatureVerifier`] is that seam;
//! [`Ed25519Verifier`] implements it with `ring`.

use alloc::vec::Vec;

use ring::signature;

/// Context prepended to `DELE` before the long-term key signs it.
pub const CERTIFICATE_CONTEXT: &[u8] = b"RoughTime v1 delegation signature--\0";

/// Context prepended to `SREP` before the delegated key signs it.
pub const RESPONSE_CONTEXT: &[u8] = b"RoughTime v1 response signature\0";

/// Ed25519 public key length.
pub const PUBLIC_KEY_LEN: usize = 32;

/// Ed25519 signature length.
pub const SIGNATURE_LEN: usize = 64;

/// Verifies detached signatures.
pub trait SignatureVerifier {
    /// Returns `true` if `sig` is a valid signature of `message` under `public_key`.
    ///
    /// Must return `false`, never panic, for malformed keys or signatures.
    fn verify(&self, public_key: &[u8], message: &[u8], sig: &[u8]) -> bool;
}

/// Ed25519 verification backed by `ring`.
#[derive(Clone, Copy, Debug, Default)]
pub struct Ed25519Verifier;

impl SignatureVerifier for Ed25519Verifier {
    fn verify(&self, public_key: &[u8], message: &[u8], sig: &[u8]) -> bool {
        if public_key.len() != PUBLIC_KEY_LEN || sig.len() != SIGNATURE_LEN {
            return false;
        }
        signature::UnparsedPublicKey::new(&signature::ED25519, public_key)
            .verify(message, sig)
            .is_ok()
    }
}

/// `context || payload`, the byte string actually signed.
pub fn signed_message(context: &[u8], payload: &[u8]) -> Vec<u8> {
    let mut msg = Vec::with_capacity(context.len() + payload.len());
    msg.extend_from_slice(context);
    msg.extend_from_slice(payload);
    msg
}

#[cfg(test)]
mod tests {
    use super::*;
    use ring::rand::SystemRandom;
    use ring::signature::{Ed25519KeyPair, KeyPair};

    fn keypair() -> Ed25519KeyPair {
        let rng = SystemRandom::new();
        let pkcs8 = Ed25519KeyPair::generate_pkcs8(&rng).unwrap();
        Ed25519KeyPair::from_pkcs8(pkcs8.as_ref()).unwrap()
    }

    #[test]
    fn test_valid_signature() {
        let kp = keypair();
        let msg = signed_message(RESPONSE_CONTEXT, b"payload!");
        let sig = kp.sign(&msg);
        assert!(Ed25519Verifier.verify(kp.public_key().as_ref(), &msg, sig.as_ref()));
    }

    #[test]
    fn test_wrong_context_rejected() {
        let kp = keypair();
        let sig = kp.sign(&signed_message(RESPONSE_CONTEXT, b"payload!"));
        let msg = signed_message(CERTIFICATE_CONTEXT, b"payload!");
        assert!(!Ed25519Verifier.verify(kp.public_key().as_ref(), &msg, sig.as_ref()));
    }

    #[test]
    fn test_malformed_inputs_rejected() {
        let kp = keypair();
        let msg = b"message";
        let sig = kp.sign(msg);
        assert!(!Ed25519Verifier.verify(&[0; 31], msg, sig.as_ref()));
        assert!(!Ed25519Verifier.verify(kp.public_key().as_ref(), msg, &sig.as_ref()[..63]));
        assert!(!Ed25519Verifier.verify(kp.public_key().as_ref(), msg, &[0; 64]));
    }

    #[test]
    fn test_contexts_are_nul_terminated() {
        assert_eq!(CERTIFICATE_CONTEXT.last(), Some(&0));
        assert_eq!(RESPONSE_CONTEXT.last(), Some(&0));
        assert_eq!(CERTIFICATE_CONTEXT.len(), 36);
        assert_eq!(RESPONSE_CONTEXT.len(), 32);
    }
}
