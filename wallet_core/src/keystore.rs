//! Encrypted keystore for the local wallet's Ed25519 private key.
//!
//! The secret is sealed with AES-256-GCM under a key stretched from the
//! user's password by Argon2id. The voter address is stored in the clear so
//! the wallet can be identified without unlocking it.

use std::path::Path;

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use argon2::{Algorithm, Argon2, Params, Version};
use rand::RngCore;
use ratings_types::WalletAddress;
use serde::{Deserialize, Serialize};

use crate::error::WalletError;

const KEYSTORE_VERSION: u32 = 1;
const CIPHER: &str = "aes-256-gcm";
const KDF: &str = "argon2id";

/// Argon2id cost: 64 MiB of memory, 3 passes, 1 lane.
const ARGON2_MEMORY_KIB: u32 = 65536;
const ARGON2_ITERATIONS: u32 = 3;
const ARGON2_PARALLELISM: u32 = 1;

const SALT_LEN: usize = 32;
const NONCE_LEN: usize = 12;

/// On-disk keystore, serialized as JSON.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct KeystoreFile {
    pub version: u32,
    pub address: WalletAddress,
    pub crypto: KeystoreCrypto,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct KeystoreCrypto {
    pub cipher: String,
    pub kdf: String,
    pub kdf_params: KdfParams,
    /// Hex-encoded.
    pub salt: String,
    /// Hex-encoded.
    pub nonce: String,
    /// Hex-encoded.
    pub ciphertext: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfParams {
    pub memory: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            memory: ARGON2_MEMORY_KIB,
            iterations: ARGON2_ITERATIONS,
            parallelism: ARGON2_PARALLELISM,
        }
    }
}

/// Seal a 32-byte secret key under `password`.
pub fn encrypt_keystore(secret_key: &[u8; 32], password: &str) -> Result<KeystoreFile, WalletError> {
    let mut rng = rand::thread_rng();
    let mut salt = [0u8; SALT_LEN];
    rng.fill_bytes(&mut salt);
    let mut nonce_bytes = [0u8; NONCE_LEN];
    rng.fill_bytes(&mut nonce_bytes);

    let kdf_params = KdfParams::default();
    let cipher = cipher_for(password, &salt, &kdf_params)?;
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce_bytes), secret_key.as_ref())
        .map_err(|e| WalletError::Key(format!("encryption failed: {e}")))?;

    let keys = ratings_crypto::keypair_from_seed(secret_key);
    Ok(KeystoreFile {
        version: KEYSTORE_VERSION,
        address: ratings_crypto::derive_address(&keys.public),
        crypto: KeystoreCrypto {
            cipher: CIPHER.to_string(),
            kdf: KDF.to_string(),
            kdf_params,
            salt: hex::encode(salt),
            nonce: hex::encode(nonce_bytes),
            ciphertext: hex::encode(ciphertext),
        },
    })
}

/// Unseal a keystore, returning the 32-byte secret key.
///
/// The KDF cost recorded in the file is used, so keystores written with
/// other parameters still open.
pub fn decrypt_keystore(keystore: &KeystoreFile, password: &str) -> Result<[u8; 32], WalletError> {
    if keystore.version != KEYSTORE_VERSION {
        return Err(WalletError::Key(format!(
            "unsupported keystore version: {}",
            keystore.version
        )));
    }
    let crypto = &keystore.crypto;
    if crypto.cipher != CIPHER || crypto.kdf != KDF {
        return Err(WalletError::Key(format!(
            "unsupported keystore scheme: {}/{}",
            crypto.kdf, crypto.cipher
        )));
    }

    let salt = decode_field("salt", &crypto.salt)?;
    let nonce_bytes = decode_field("nonce", &crypto.nonce)?;
    let ciphertext = decode_field("ciphertext", &crypto.ciphertext)?;
    if nonce_bytes.len() != NONCE_LEN {
        return Err(WalletError::Key(format!(
            "invalid nonce length: expected {NONCE_LEN}, got {}",
            nonce_bytes.len()
        )));
    }

    let cipher = cipher_for(password, &salt, &crypto.kdf_params)?;
    let plaintext = cipher
        .decrypt(Nonce::from_slice(&nonce_bytes), ciphertext.as_ref())
        .map_err(|_| WalletError::Key("decryption failed: wrong password or corrupted data".into()))?;

    plaintext.as_slice().try_into().map_err(|_| {
        WalletError::Key(format!(
            "decrypted key has wrong length: expected 32, got {}",
            plaintext.len()
        ))
    })
}

pub fn save_keystore(keystore: &KeystoreFile, path: &Path) -> Result<(), WalletError> {
    let json = serde_json::to_string_pretty(keystore)
        .map_err(|e| WalletError::Other(format!("keystore serialization failed: {e}")))?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| WalletError::Other(format!("failed to create {}: {e}", parent.display())))?;
    }
    std::fs::write(path, json)
        .map_err(|e| WalletError::Other(format!("failed to write {}: {e}", path.display())))?;
    tracing::info!(path = %path.display(), address = %keystore.address, "keystore saved");
    Ok(())
}

pub fn load_keystore(path: &Path) -> Result<KeystoreFile, WalletError> {
    let json = std::fs::read_to_string(path)
        .map_err(|e| WalletError::Other(format!("failed to read {}: {e}", path.display())))?;
    serde_json::from_str(&json)
        .map_err(|e| WalletError::Other(format!("invalid keystore JSON: {e}")))
}

fn decode_field(name: &str, value: &str) -> Result<Vec<u8>, WalletError> {
    hex::decode(value).map_err(|e| WalletError::Key(format!("invalid {name} hex: {e}")))
}

fn cipher_for(password: &str, salt: &[u8], kdf: &KdfParams) -> Result<Aes256Gcm, WalletError> {
    let params = Params::new(kdf.memory, kdf.iterations, kdf.parallelism, Some(32))
        .map_err(|e| WalletError::Key(format!("argon2 params: {e}")))?;
    let mut key = [0u8; 32];
    Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
        .hash_password_into(password.as_bytes(), salt, &mut key)
        .map_err(|e| WalletError::Key(format!("argon2 hashing failed: {e}")))?;
    Aes256Gcm::new_from_slice(&key).map_err(|e| WalletError::Key(format!("AES key init failed: {e}")))
}
