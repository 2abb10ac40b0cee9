// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Merkle audit-path verification.
//!
//! A server answers a batch of requests with one signature over the root of a
//! tree whose leaves are the request nonces.
//!
//! - `leaf = H(0x00 || nonce)[..node]`
//! - `node = H(0x01 || left || right)[..node]`
//! - Bit `i` of `INDX` says whether the running hash is the right (1) or
//!   left (0) child at level `i`.
//!
//! `H` is SHA-512 and `node` is the variant's node size (32 or 64 bytes).

use alloc::vec::Vec;

use ring::digest;

use crate::error::RoughtimeError;

/// Maximum number of levels in an audit path.
pub const MAX_PATH_LEVELS: usize = 32;

const LEAF_PREFIX: u8 = 0x00;
const NODE_PREFIX: u8 = 0x01;

/// Hash of the leaf holding `nonce`.
pub fn leaf_hash(nonce: &[u8], node_size: usize) -> Vec<u8> {
    let mut ctx = digest::Context::new(&digest::SHA512);
    ctx.update(&[LEAF_PREFIX]);
    ctx.update(nonce);
    truncate(ctx.finish(), node_size)
}

/// Hash of an interior node with children `left` and `right`.
pub fn node_hash(left: &[u8], right: &[u8], node_size: usize) -> Vec<u8> {
    let mut ctx = digest::Context::new(&digest::SHA512);
    ctx.update(&[NODE_PREFIX]);
    ctx.update(left);
    ctx.update(right);
    truncate(ctx.finish(), node_size)
}

fn truncate(d: digest::Digest, node_size: usize) -> Vec<u8> {
    let bytes = d.as_ref();
    bytes[..node_size.min(bytes.len())].to_vec()
}

/// Recompute the root from `nonce`, its leaf `index` and the sibling `path`.
pub fn compute_root(
    nonce: &[u8],
    index: u32,
    path: &[u8],
    node_size: usize,
) -> Result<Vec<u8>, RoughtimeError> {
    if node_size == 0 || path.len() % node_size != 0 {
        return Err(RoughtimeError::MerklePathLength {
            len: path.len(),
            node_size,
        });
    }
    let levels = path.len() / node_size;
    if levels > MAX_PATH_LEVELS {
        return Err(RoughtimeError::MerklePathTooLong { levels });
    }

    let mut index = index;
    let mut hash = leaf_hash(nonce, node_size);
    for sibling in path.chunks_exact(node_size) {
        hash = if index & 1 == 0 {
            node_hash(&hash, sibling, node_size)
        } else {
            node_hash(sibling, &hash, node_size)
        };
        index >>= 1;
    }

    if index != 0 {
        return Err(RoughtimeError::MerkleIndexNotConsumed);
    }
    Ok(hash)
}

/// Check that `nonce` at `index` is included under `root`.
pub fn verify(
    nonce: &[u8],
    index: u32,
    path: &[u8],
    root: &[u8],
    node_size: usize,
) -> Result<(), RoughtimeError> {
    let computed = compute_root(nonce, index, path, node_size)?;
    if computed != root {
        return Err(RoughtimeError::MerkleRootMismatch);
    }
    Ok(())
}
