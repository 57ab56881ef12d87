//! Cryptographic primitives for TierTally.
//!
//! - **Blake2b-256** for vote leaves, Merkle nodes and signed digests
//! - **Merkle trees** with sorted-pair hashing, so proofs carry no direction bits
//! - **Ed25519** for validator signatures over rollup batches and the national result

pub mod hash;
pub mod keys;
pub mod leaf;
pub mod merkle;
pub mod sign;

pub use hash::{blake2b_256, blake2b_256_multi, digest};
pub use keys::{generate_keypair, keypair_from_seed, public_from_private};
pub use leaf::{generate_leaf, LEAF_DOMAIN};
pub use merkle::{verify_proof, MerkleProof, MerkleTree};
pub use sign::{sign_digest, sign_message, verify_digest, verify_signature};
