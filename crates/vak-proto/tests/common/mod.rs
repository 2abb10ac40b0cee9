// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Shared helpers for integration tests: a signing server that answers a
//! batch of nonces the way a real Roughtime server does.

#![allow(dead_code, unreachable_pub)]

use ring::rand::SystemRandom;
use ring::signature::{Ed25519KeyPair, KeyPair};
use vak_proto::merkle;
use vak_proto::signature::{CERTIFICATE_CONTEXT, RESPONSE_CONTEXT, signed_message};
use vak_proto::tag;
use vak_proto::{Packet, ProtocolVersion, Tag};

pub fn keypair() -> Ed25519KeyPair {
    let rng = SystemRandom::new();
    let pkcs8 = Ed25519KeyPair::generate_pkcs8(&rng).unwrap();
    Ed25519KeyPair::from_pkcs8(pkcs8.as_ref()).unwrap()
}

/// A Merkle tree over a power-of-two batch of nonces.
pub struct Tree {
    levels: Vec<Vec<Vec<u8>>>,
}

impl Tree {
    pub fn new(nonces: &[Vec<u8>], node_size: usize) -> Tree {
        assert!(nonces.len().is_power_of_two());
        let mut levels = vec![
            nonces
                .iter()
                .map(|n| merkle::leaf_hash(n, node_size))
                .collect::<Vec<_>>(),
        ];
        while levels.last().unwrap().len() > 1 {
            let next = levels
                .last()
                .unwrap()
                .chunks(2)
                .map(|pair| merkle::node_hash(&pair[0], &pair[1], node_size))
                .collect();
            levels.push(next);
        }
        Tree { levels }
    }

    pub fn root(&self) -> Vec<u8> {
        self.levels.last().unwrap()[0].clone()
    }

    pub fn path(&self, index: usize) -> Vec<u8> {
        let mut path = Vec::new();
        let mut i = index;
        for level in &self.levels[..self.levels.len() - 1] {
            path.extend_from_slice(&level[i ^ 1]);
            i >>= 1;
        }
        path
    }
}

/// What the server puts into the signed parts of its reply.
#[derive(Clone, Debug)]
pub struct ReplyParams {
    pub midpoint: u64,
    pub radius: u32,
    pub mint: u64,
    pub maxt: u64,
    pub dtai: Option<u32>,
    pub leap: Option<Vec<u32>>,
}

impl Default for ReplyParams {
    fn default() -> ReplyParams {
        ReplyParams {
            midpoint: 1_700_000_000_000_000,
            radius: 1_000_000,
            mint: 1_600_000_000_000_000,
            maxt: 1_800_000_000_000_000,
            dtai: None,
            leap: None,
        }
    }
}

pub struct TestServer {
    pub version: ProtocolVersion,
    long_term: Ed25519KeyPair,
    delegated: Ed25519KeyPair,
}

impl TestServer {
    pub fn new(version: ProtocolVersion) -> TestServer {
        TestServer {
            version,
            long_term: keypair(),
            delegated: keypair(),
        }
    }

    pub fn public_key(&self) -> Vec<u8> {
        self.long_term.public_key().as_ref().to_vec()
    }

    pub fn srep(&self, root: Vec<u8>, params: &ReplyParams) -> Packet {
        let mut srep = Packet::from_tags([
            Tag::new(tag::ROOT, root).unwrap(),
            Tag::from_u64(tag::MIDP, params.midpoint),
            Tag::from_u32(tag::RADI, params.radius),
        ])
        .unwrap();
        if let Some(dtai) = params.dtai {
            srep.add(Tag::from_u32(tag::DTAI, dtai)).unwrap();
        }
        if let Some(leap) = &params.leap {
            let bytes = leap.iter().flat_map(|l| l.to_le_bytes()).collect();
            srep.add(Tag::new(tag::LEAP, bytes).unwrap()).unwrap();
        }
        srep
    }

    pub fn cert(&self, params: &ReplyParams) -> Packet {
        let dele = Packet::from_tags([
            Tag::new(tag::PUBK, self.delegated.public_key().as_ref().to_vec()).unwrap(),
            Tag::from_u64(tag::MINT, params.mint),
            Tag::from_u64(tag::MAXT, params.maxt),
        ])
        .unwrap();
        let sig = self
            .long_term
            .sign(&signed_message(CERTIFICATE_CONTEXT, &dele.encode()));
        Packet::from_tags([
            Tag::new(tag::SIG, sig.as_ref().to_vec()).unwrap(),
            Tag::nested(tag::DELE, dele),
        ])
        .unwrap()
    }

    /// Sign `srep` with the delegated key.
    pub fn sign_srep(&self, srep: &Packet) -> Vec<u8> {
        self.delegated
            .sign(&signed_message(RESPONSE_CONTEXT, &srep.encode()))
            .as_ref()
            .to_vec()
    }

    /// Assemble a reply from already-built parts.
    pub fn assemble(
        &self,
        nonce: &[u8],
        srep: Packet,
        sig: Vec<u8>,
        cert: Packet,
        index: u32,
        path: Vec<u8>,
    ) -> Packet {
        let mut reply = Packet::from_tags([
            Tag::new(tag::SIG, sig).unwrap(),
            Tag::nested(tag::SREP, srep),
            Tag::nested(tag::CERT, cert),
            Tag::from_u32(tag::INDX, index),
            Tag::new(tag::PATH, path).unwrap(),
        ])
        .unwrap();
        if self.version.echoes_nonce() {
            reply.add(Tag::new(tag::NONC, nonce.to_vec()).unwrap()).unwrap();
        }
        reply
    }

    /// Reply packet for `nonces[index]` out of a signed batch.
    pub fn reply_packet(&self, nonces: &[Vec<u8>], index: usize, params: &ReplyParams) -> Packet {
        let tree = Tree::new(nonces, self.version.node_size());
        let srep = self.srep(tree.root(), params);
        let sig = self.sign_srep(&srep);
        self.assemble(
            &nonces[index],
            srep,
            sig,
            self.cert(params),
            index as u32,
            tree.path(index),
        )
    }

    /// Wire bytes of a single-request reply.
    pub fn reply(&self, nonce: &[u8], params: &ReplyParams) -> Vec<u8> {
        self.reply_packet(&[nonce.to_vec()], 0, params)
            .to_bytes(self.version.uses_envelope())
    }
}
