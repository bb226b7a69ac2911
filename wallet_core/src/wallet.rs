//! Local Ed25519 wallet.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use ratings_types::{KeyPair, PrivateKey, PublicKey, Signature, WalletAddress};

use crate::error::WalletError;
use crate::keystore::{decrypt_keystore, encrypt_keystore, load_keystore, save_keystore};
use crate::provider::{ApprovalGate, WalletProvider};

/// A wallet holding its own key pair.
///
/// Starts disconnected; call [`LocalWallet::connect`] before it reports an
/// address or signs anything.
pub struct LocalWallet {
    keys: KeyPair,
    address: WalletAddress,
    connected: AtomicBool,
    approval: Arc<dyn ApprovalGate>,
}

impl LocalWallet {
    fn from_keys(keys: KeyPair, approval: Arc<dyn ApprovalGate>) -> Self {
        let address = ratings_crypto::derive_address(&keys.public);
        Self {
            keys,
            address,
            connected: AtomicBool::new(false),
            approval,
        }
    }

    /// Create a new wallet with a fresh key pair.
    pub fn create(approval: Arc<dyn ApprovalGate>) -> Self {
        Self::from_keys(ratings_crypto::generate_keypair(), approval)
    }

    /// Restore a wallet from a 32-byte seed (deterministic).
    pub fn from_seed(seed: &[u8; 32], approval: Arc<dyn ApprovalGate>) -> Self {
        Self::from_keys(ratings_crypto::keypair_from_seed(seed), approval)
    }

    /// Restore a wallet from an existing private key.
    pub fn from_private_key(
        private_key_bytes: &[u8],
        approval: Arc<dyn ApprovalGate>,
    ) -> Result<Self, WalletError> {
        let key_bytes: [u8; 32] = private_key_bytes.try_into().map_err(|_| {
            WalletError::Key(format!(
                "private key must be 32 bytes, got {}",
                private_key_bytes.len()
            ))
        })?;
        let keys = ratings_crypto::keypair_from_private(PrivateKey(key_bytes));
        Ok(Self::from_keys(keys, approval))
    }

    /// Unlock a wallet stored in an encrypted keystore file.
    pub fn from_keystore(
        path: &Path,
        password: &str,
        approval: Arc<dyn ApprovalGate>,
    ) -> Result<Self, WalletError> {
        let keystore = load_keystore(path)?;
        let secret = decrypt_keystore(&keystore, password)?;
        Self::from_private_key(&secret, approval)
    }

    /// Encrypt this wallet's private key into a keystore file.
    pub fn save_keystore(&self, path: &Path, password: &str) -> Result<(), WalletError> {
        let keystore = encrypt_keystore(&self.keys.private.0, password)?;
        save_keystore(&keystore, path)
    }

    pub fn address(&self) -> &WalletAddress {
        &self.address
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.keys.public
    }

    pub fn connect(&self) {
        self.connected.store(true, Ordering::SeqCst);
        tracing::debug!(address = %self.address, "wallet connected");
    }

    pub fn disconnect(&self) {
        self.connected.store(false, Ordering::SeqCst);
        tracing::debug!(address = %self.address, "wallet disconnected");
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WalletProvider for LocalWallet {
    fn current_address(&self) -> Option<WalletAddress> {
        self.is_connected().then(|| self.address.clone())
    }

    async fn sign_message(&self, message: &str) -> Result<Signature, WalletError> {
        if !self.is_connected() {
            return Err(WalletError::NotConnected);
        }
        if !self.approval.approve(message).await {
            tracing::debug!(address = %self.address, "signature request declined");
            return Err(WalletError::Rejected);
        }
        Ok(ratings_crypto::sign_message(
            message.as_bytes(),
            &self.keys.private,
        ))
    }
}
