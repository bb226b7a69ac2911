//! Ed25519 signatures over rating messages.
//!
//! The protocol stores signatures without checking them; verification is
//! offered for auditors and tooling that want to prove a review's origin.

use ed25519_dalek::{Signer, SigningKey, Verifier, VerifyingKey};
use ratings_types::{PrivateKey, PublicKey, Signature};

pub fn sign_message(message: &[u8], private_key: &PrivateKey) -> Signature {
    let signature = SigningKey::from_bytes(&private_key.0).sign(message);
    Signature(signature.to_bytes().to_vec())
}

/// `true` only for a well-formed 64-byte signature by `public_key` over
/// exactly `message`. Malformed keys or signatures verify as `false`.
pub fn verify_signature(message: &[u8], signature: &Signature, public_key: &PublicKey) -> bool {
    let (Ok(key), Ok(signature)) = (
        VerifyingKey::from_bytes(public_key.as_bytes()),
        ed25519_dalek::Signature::from_slice(signature.as_bytes()),
    ) else {
        return false;
    };
    key.verify(message, &signature).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::{generate_keypair, keypair_from_seed};

    const MESSAGE: &[u8] = b"Rate service 1 with 4 stars";

    #[test]
    fn voter_signature_verifies() {
        let voter = generate_keypair();
        let signature = sign_message(MESSAGE, &voter.private);
        assert_eq!(signature.as_bytes().len(), 64);
        assert!(verify_signature(MESSAGE, &signature, &voter.public));
    }

    #[test]
    fn changed_star_count_is_detected() {
        let voter = generate_keypair();
        let signature = sign_message(MESSAGE, &voter.private);
        assert!(!verify_signature(
            b"Rate service 1 with 5 stars",
            &signature,
            &voter.public
        ));
    }

    #[test]
    fn other_voter_does_not_verify() {
        let voter = generate_keypair();
        let impostor = generate_keypair();
        let signature = sign_message(MESSAGE, &impostor.private);
        assert!(!verify_signature(MESSAGE, &signature, &voter.public));
    }

    #[test]
    fn same_seed_signs_identically() {
        let a = keypair_from_seed(&[7; 32]);
        let b = keypair_from_seed(&[7; 32]);
        assert_eq!(sign_message(MESSAGE, &a.private), sign_message(MESSAGE, &b.private));
    }

    #[test]
    fn malformed_inputs_verify_false() {
        let voter = generate_keypair();
        let mut short = sign_message(MESSAGE, &voter.private);
        short.0.truncate(32);
        assert!(!verify_signature(MESSAGE, &short, &voter.public));

        let full = sign_message(MESSAGE, &voter.private);
        assert!(!verify_signature(MESSAGE, &full, &PublicKey([0xFF; 32])));
    }
}
