//! Aggregate maintenance for the `(rating_sum, rating_count)` pair.
//!
//! The store does not derive the aggregate from review rows, so the
//! protocol keeps it in step after each recorded vote. Two update
//! strategies are available:
//!
//! - [`AggregatePolicy::ReadModifyWrite`] reads the pair, adds the vote and
//!   writes it back in separate store calls. Two voters racing on the same
//!   service can both read the same snapshot, and one vote is then lost
//!   from the aggregate (the review row itself is kept).
//! - [`AggregatePolicy::AtomicIncrement`] asks the store to add the vote in
//!   one step, so racing writers are serialized.
//!
//! Without a race both produce the same result. [`reconcile_aggregate`]
//! rebuilds the pair from review rows and repairs any drift.

use std::fmt;
use std::str::FromStr;

use ratings_store::{Aggregate, ReviewStore, ServiceStore, StoreError};
use ratings_types::{Rating, ServiceId};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregatePolicy {
    /// Separate read and write. Subject to lost updates under contention.
    ReadModifyWrite,
    #[default]
    AtomicIncrement,
}

impl fmt::Display for AggregatePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadModifyWrite => f.write_str("read_modify_write"),
            Self::AtomicIncrement => f.write_str("atomic_increment"),
        }
    }
}

impl FromStr for AggregatePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "read_modify_write" => Ok(Self::ReadModifyWrite),
            "atomic_increment" => Ok(Self::AtomicIncrement),
            other => Err(format!(
                "unknown aggregate policy '{other}' (expected read_modify_write or atomic_increment)"
            )),
        }
    }
}

/// Add one vote of `rating` to the service's aggregate and return the
/// pair as written.
pub fn apply_vote<S>(
    store: &S,
    service_id: ServiceId,
    rating: Rating,
    policy: AggregatePolicy,
) -> Result<Aggregate, StoreError>
where
    S: ServiceStore + ?Sized,
{
    match policy {
        AggregatePolicy::ReadModifyWrite => {
            let current = store.get_service_aggregate(service_id)?;
            let updated = current.with_vote(rating);
            store.update_service_aggregate(service_id, updated)?;
            Ok(updated)
        }
        AggregatePolicy::AtomicIncrement => store.increment_service_aggregate(service_id, rating),
    }
}

/// Recompute the aggregate from the service's review rows and store it.
///
/// Not safe to run concurrently with votes on the same service: a vote
/// landing between the scan and the write is overwritten.
pub fn reconcile_aggregate<S>(store: &S, service_id: ServiceId) -> Result<Aggregate, StoreError>
where
    S: ServiceStore + ReviewStore + ?Sized,
{
    let stored = store.get_service_aggregate(service_id)?;
    let actual = store
        .reviews_for_service(service_id)?
        .iter()
        .fold(Aggregate::EMPTY, |agg, review| agg.with_vote(review.rating));

    if stored != actual {
        tracing::warn!(
            %service_id,
            stored_sum = stored.rating_sum,
            stored_count = stored.rating_count,
            actual_sum = actual.rating_sum,
            actual_count = actual.rating_count,
            "aggregate drifted from reviews, rewriting"
        );
        store.update_service_aggregate(service_id, actual)?;
    }
    Ok(actual)
}
