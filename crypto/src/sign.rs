//! Ed25519 signing and verification.

use ed25519_dalek::{Signer, SigningKey, Verifier, VerifyingKey};
use tally_types::{Hash256, PrivateKey, PublicKey, Signature, ValidatorId};

/// Sign a message with a private key.
pub fn sign_message(message: &[u8], private_key: &PrivateKey) -> Signature {
    let signing_key = SigningKey::from_bytes(&private_key.0);
    Signature(signing_key.sign(message).to_bytes())
}

/// Verify a signature against a message and public key.
///
/// Returns `false` for malformed keys as well as bad signatures.
pub fn verify_signature(message: &[u8], signature: &Signature, public_key: &PublicKey) -> bool {
    let Ok(verifying_key) = VerifyingKey::from_bytes(&public_key.0) else {
        return false;
    };
    let dalek_sig = ed25519_dalek::Signature::from_bytes(&signature.0);
    verifying_key.verify_strict(message, &dalek_sig).is_ok()
}

/// Sign a 32-byte digest (batch digest, national result digest).
pub fn sign_digest(digest: &Hash256, private_key: &PrivateKey) -> Signature {
    sign_message(digest.as_bytes(), private_key)
}

/// Verify that `validator` signed `digest`.
pub fn verify_digest(digest: &Hash256, signature: &Signature, validator: &ValidatorId) -> bool {
    verify_signature(digest.as_bytes(), signature, &validator.public_key())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::{generate_keypair, keypair_from_seed};

    #[test]
    fn sign_and_verify() {
        let kp = generate_keypair();
        let sig = sign_message(b"batch 7", &kp.private);
        assert!(verify_signature(b"batch 7", &sig, &kp.public));
        assert!(!verify_signature(b"batch 8", &sig, &kp.public));
    }

    #[test]
    fn wrong_key_fails() {
        let kp1 = keypair_from_seed(&[1u8; 32]);
        let kp2 = keypair_from_seed(&[2u8; 32]);
        let sig = sign_message(b"m", &kp1.private);
        assert!(!verify_signature(b"m", &sig, &kp2.public));
    }

    #[test]
    fn digest_signature_binds_validator() {
        let kp = keypair_from_seed(&[9u8; 32]);
        let other = keypair_from_seed(&[10u8; 32]);
        let digest = Hash256::new([5u8; 32]);
        let sig = sign_digest(&digest, &kp.private);
        assert!(verify_digest(&digest, &sig, &kp.validator_id()));
        assert!(!verify_digest(&digest, &sig, &other.validator_id()));
        assert!(!verify_digest(&Hash256::new([6u8; 32]), &sig, &kp.validator_id()));
    }

    #[test]
    fn invalid_public_key() {
        let kp = generate_keypair();
        let sig = sign_message(b"test", &kp.private);
        assert!(!verify_signature(b"test", &sig, &PublicKey([0xFF; 32])));
    }
}
