//! Review (vote) storage trait.

use crate::StoreError;
use ratings_types::{Rating, ServiceId, Signature, Timestamp, WalletAddress};
use serde::{Deserialize, Serialize};

/// One voter's single, immutable rating for one service.
///
/// Identity is the `(service_id, voter)` pair.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub service_id: ServiceId,
    pub voter: WalletAddress,
    pub rating: Rating,
    /// Signed-message artifact kept for audit. Never verified by the store.
    pub signature: Signature,
    pub created_at: Timestamp,
}

/// Fields supplied when recording a vote.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewReview {
    pub service_id: ServiceId,
    pub voter: WalletAddress,
    pub rating: Rating,
    pub signature: Signature,
}

/// Trait for review storage operations.
///
/// There is no update or delete: a review is written once and kept.
pub trait ReviewStore {
    /// Look up the review a voter left on a service, if any.
    fn find_review(
        &self,
        service_id: ServiceId,
        voter: &WalletAddress,
    ) -> Result<Option<Review>, StoreError>;

    /// Record a vote.
    ///
    /// Fails with [`StoreError::UniqueViolation`] when the voter already has a
    /// review for this service, and [`StoreError::NotFound`] when the service
    /// does not exist.
    fn insert_review(&self, new: &NewReview) -> Result<Review, StoreError>;

    /// Every review left on a service.
    fn reviews_for_service(&self, service_id: ServiceId) -> Result<Vec<Review>, StoreError>;

    fn review_count(&self) -> Result<u64, StoreError>;
}
