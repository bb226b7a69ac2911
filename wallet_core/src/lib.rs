//! Wallet identity provider for the service rating directory.
//!
//! Provides what the rating flow needs from a wallet:
//! - The connected voter address (or none when disconnected)
//! - Message signing, gated on user approval, which may be declined
//! - A local Ed25519 wallet and an encrypted keystore to persist its key

pub mod error;
pub mod keystore;
pub mod provider;
pub mod wallet;

pub use error::WalletError;
pub use keystore::{
    decrypt_keystore, encrypt_keystore, load_keystore, save_keystore, KeystoreFile,
};
pub use provider::{ApprovalGate, AutoApprove, WalletProvider};
pub use wallet::LocalWallet;
