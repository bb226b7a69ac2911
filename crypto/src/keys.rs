//! Ed25519 key pairs for voter wallets.

use ed25519_dalek::SigningKey;
use rand::rngs::OsRng;
use ratings_types::{KeyPair, PrivateKey, PublicKey};

fn from_signing_key(signing_key: &SigningKey) -> KeyPair {
    KeyPair {
        public: PublicKey(signing_key.verifying_key().to_bytes()),
        private: PrivateKey(signing_key.to_bytes()),
    }
}

/// Generate a new key pair from the OS random source.
pub fn generate_keypair() -> KeyPair {
    from_signing_key(&SigningKey::generate(&mut OsRng))
}

/// Rebuild the key pair for an existing private key.
pub fn keypair_from_private(private: PrivateKey) -> KeyPair {
    keypair_from_seed(&private.0)
}

/// Derive a key pair from a 32-byte seed (deterministic).
///
/// Test fixtures use this to get stable voter addresses.
pub fn keypair_from_seed(seed: &[u8; 32]) -> KeyPair {
    from_signing_key(&SigningKey::from_bytes(seed))
}
