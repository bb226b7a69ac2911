//! Cryptographic primitives for wallet identities.
//!
//! - **Ed25519** for message signing and signature verification
//! - Address derivation: `0x` + hex of the last 20 bytes of Blake2b-256(public key)

pub mod address;
pub mod keys;
pub mod sign;

pub use address::derive_address;
pub use keys::{generate_keypair, keypair_from_private, keypair_from_seed};
pub use sign::{sign_message, verify_signature};
