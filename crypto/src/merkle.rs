//! Merkle tree over 32-byte leaves.
//!
//! Leaf and intermediate nodes are hashed under distinct prefixes so a leaf can never be
//! passed off as an interior node (second pre-image). Siblings are hashed in sorted
//! order, so a proof is just the list of sibling hashes. A level with an odd node count
//! promotes its last node unchanged.

use crate::hash::blake2b_256_multi;
use serde::{Deserialize, Serialize};
use tally_types::Hash256;

const LEAF_PREFIX: &[u8] = &[0];
const INTERMEDIATE_PREFIX: &[u8] = &[1];

fn hash_leaf(leaf: &Hash256) -> Hash256 {
    Hash256::new(blake2b_256_multi(&[LEAF_PREFIX, leaf.as_bytes()]))
}

fn hash_intermediate(a: &Hash256, b: &Hash256) -> Hash256 {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    Hash256::new(blake2b_256_multi(&[
        INTERMEDIATE_PREFIX,
        lo.as_bytes(),
        hi.as_bytes(),
    ]))
}

/// Sibling hashes from a leaf up to the root.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerkleProof(pub Vec<Hash256>);

impl MerkleProof {
    pub fn siblings(&self) -> &[Hash256] {
        &self.0
    }
}

/// A fully materialised Merkle tree.
#[derive(Clone, Debug)]
pub struct MerkleTree {
    /// `levels[0]` holds the hashed leaves, the last level holds the root.
    levels: Vec<Vec<Hash256>>,
}

impl MerkleTree {
    pub fn new(leaves: &[Hash256]) -> Self {
        let mut levels = vec![leaves.iter().map(hash_leaf).collect::<Vec<_>>()];
        while levels.last().map_or(0, Vec::len) > 1 {
            let current = &levels[levels.len() - 1];
            let next = current
                .chunks(2)
                .map(|pair| match pair {
                    [a, b] => hash_intermediate(a, b),
                    [single] => *single,
                    _ => unreachable!("chunks(2) yields one or two nodes"),
                })
                .collect();
            levels.push(next);
        }
        Self { levels }
    }

    /// The root, or [`Hash256::ZERO`] for an empty tree.
    pub fn root(&self) -> Hash256 {
        self.levels
            .last()
            .and_then(|level| level.first())
            .copied()
            .unwrap_or(Hash256::ZERO)
    }

    pub fn leaf_count(&self) -> usize {
        self.levels[0].len()
    }

    /// Inclusion proof for the leaf at `index`.
    pub fn proof(&self, index: usize) -> Option<MerkleProof> {
        if index >= self.leaf_count() {
            return None;
        }
        let mut siblings = Vec::new();
        let mut idx = index;
        for level in &self.levels[..self.levels.len() - 1] {
            if let Some(sibling) = level.get(idx ^ 1) {
                siblings.push(*sibling);
            }
            idx /= 2;
        }
        Some(MerkleProof(siblings))
    }
}

/// Check that `leaf` is included under `root`.
pub fn verify_proof(leaf: &Hash256, proof: &[Hash256], root: &Hash256) -> bool {
    let node = proof
        .iter()
        .fold(hash_leaf(leaf), |node, sibling| hash_intermediate(&node, sibling));
    node == *root
}
