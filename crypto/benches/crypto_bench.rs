use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tally_types::{Hash256, Timestamp, VoterId};

fn generate_leaf_bench(c: &mut Criterion) {
    let voter = VoterId::new("voter-000123").unwrap();

    c.bench_function("generate_leaf", |b| {
        b.iter(|| tally_crypto::generate_leaf(black_box(&voter), 3, Timestamp::new(1_700_000_000)))
    });
}

fn merkle_root_bench(c: &mut Criterion) {
    let leaves: Vec<Hash256> = (0..10_000u64)
        .map(|i| Hash256::new(tally_crypto::blake2b_256(&i.to_le_bytes())))
        .collect();

    c.bench_function("merkle_root_10k_leaves", |b| {
        b.iter(|| tally_crypto::MerkleTree::new(black_box(&leaves)).root())
    });
}

fn merkle_verify_bench(c: &mut Criterion) {
    let leaves: Vec<Hash256> = (0..10_000u64)
        .map(|i| Hash256::new(tally_crypto::blake2b_256(&i.to_le_bytes())))
        .collect();
    let tree = tally_crypto::MerkleTree::new(&leaves);
    let proof = tree.proof(4_321).unwrap();
    let root = tree.root();

    c.bench_function("merkle_verify_10k_leaves", |b| {
        b.iter(|| tally_crypto::verify_proof(black_box(&leaves[4_321]), proof.siblings(), &root))
    });
}

fn ed25519_verify_digest_bench(c: &mut Criterion) {
    let kp = tally_crypto::generate_keypair();
    let digest = Hash256::new([42u8; 32]);
    let sig = tally_crypto::sign_digest(&digest, &kp.private);
    let id = kp.validator_id();

    c.bench_function("ed25519_verify_digest", |b| {
        b.iter(|| tally_crypto::verify_digest(black_box(&digest), &sig, &id))
    });
}

criterion_group!(
    benches,
    generate_leaf_bench,
    merkle_root_bench,
    merkle_verify_bench,
    ed25519_verify_digest_bench
);
criterion_main!(benches);
