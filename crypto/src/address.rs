//! Wallet address derivation from public keys.
//!
//! Address format: `0x` + hex(last 20 bytes of Blake2b-256(public_key)).
//! Total address length: 2 (prefix) + 40 = 42 characters.

use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};
use ratings_types::{PublicKey, WalletAddress};

type Blake2b256 = Blake2b<U32>;

/// Number of trailing hash bytes kept for the address.
const ADDRESS_BYTES: usize = 20;

/// Derive a wallet address from an Ed25519 public key.
pub fn derive_address(public_key: &PublicKey) -> WalletAddress {
    let digest = Blake2b256::digest(public_key.as_bytes());
    let mut bytes = [0u8; ADDRESS_BYTES];
    bytes.copy_from_slice(&digest[digest.len() - ADDRESS_BYTES..]);
    WalletAddress::from_bytes(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::{generate_keypair, keypair_from_seed};

    #[test]
    fn address_is_well_formed() {
        let kp = generate_keypair();
        let addr = derive_address(&kp.public);
        assert_eq!(addr.as_str().len(), 42);
        assert!(WalletAddress::parse(addr.as_str()).is_ok());
    }

    #[test]
    fn address_is_deterministic() {
        let kp = keypair_from_seed(&[7u8; 32]);
        assert_eq!(derive_address(&kp.public), derive_address(&kp.public));
    }

    #[test]
    fn different_keys_give_different_addresses() {
        let a = derive_address(&keypair_from_seed(&[1u8; 32]).public);
        let b = derive_address(&keypair_from_seed(&[2u8; 32]).public);
        assert_ne!(a, b);
    }
}
