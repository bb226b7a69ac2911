//! Vote eligibility check.

use ratings_store::{ReviewStore, StoreError};
use ratings_types::{Rating, ServiceId, WalletAddress};
use serde::Serialize;

/// Whether the current voter may rate a service.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "rating", rename_all = "snake_case")]
pub enum Eligibility {
    /// No wallet connected. Rating is unavailable.
    Disconnected,
    Eligible,
    /// A review already exists for this voter, with this rating.
    AlreadyVoted(Rating),
}

impl Eligibility {
    pub fn can_vote(&self) -> bool {
        matches!(self, Self::Eligible)
    }
}

/// Look up whether `voter` has already reviewed `service_id`.
///
/// Read-only. With no voter the store is not consulted.
pub fn check_eligibility<S>(
    store: &S,
    service_id: ServiceId,
    voter: Option<&WalletAddress>,
) -> Result<Eligibility, StoreError>
where
    S: ReviewStore + ?Sized,
{
    let Some(voter) = voter else {
        return Ok(Eligibility::Disconnected);
    };
    Ok(match store.find_review(service_id, voter)? {
        Some(review) => Eligibility::AlreadyVoted(review.rating),
        None => Eligibility::Eligible,
    })
}
