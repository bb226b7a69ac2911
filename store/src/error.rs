use ratings_types::{ServiceId, WalletAddress};
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("key not found: {0}")]
    NotFound(String),

    /// A review for this (service, voter) pair already exists.
    #[error("voter {voter} has already reviewed service {service_id}")]
    UniqueViolation {
        service_id: ServiceId,
        voter: WalletAddress,
    },

    #[error("storage backend error: {0}")]
    Backend(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("database is corrupted: {0}")]
    Corruption(String),
}

impl StoreError {
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, Self::UniqueViolation { .. })
    }
}
