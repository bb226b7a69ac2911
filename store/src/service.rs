//! Service storage trait.

use crate::StoreError;
use ratings_types::{Rating, ServiceId, Timestamp};
use serde::{Deserialize, Serialize};

/// A listed external API or product.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub id: ServiceId,
    pub name: String,
    pub url: String,
    pub description: Option<String>,
    /// Sum of every star value ever cast for this service.
    pub rating_sum: u64,
    /// Number of votes cast.
    pub rating_count: u64,
    pub created_at: Timestamp,
}

impl Service {
    pub fn aggregate(&self) -> Aggregate {
        Aggregate {
            rating_sum: self.rating_sum,
            rating_count: self.rating_count,
        }
    }
}

/// Fields supplied when creating a service. The store assigns the id and
/// starts the aggregate at zero.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewService {
    pub name: String,
    pub url: String,
    pub description: Option<String>,
}

/// The running `(rating_sum, rating_count)` pair kept on each service row.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Aggregate {
    pub rating_sum: u64,
    pub rating_count: u64,
}

impl Aggregate {
    pub const EMPTY: Self = Self {
        rating_sum: 0,
        rating_count: 0,
    };

    /// Average star value, or `None` when nobody has voted yet.
    pub fn average(&self) -> Option<f64> {
        if self.rating_count == 0 {
            None
        } else {
            Some(self.rating_sum as f64 / self.rating_count as f64)
        }
    }

    /// The aggregate after one more vote of `rating`.
    pub fn with_vote(self, rating: Rating) -> Self {
        Self {
            rating_sum: self.rating_sum.saturating_add(u64::from(rating)),
            rating_count: self.rating_count.saturating_add(1),
        }
    }
}

/// Trait for service storage operations.
pub trait ServiceStore {
    /// Create a service with a zero aggregate.
    fn insert_service(&self, new: &NewService) -> Result<Service, StoreError>;

    fn get_service(&self, id: ServiceId) -> Result<Service, StoreError>;

    /// All services, most-voted first. Ties are broken by ascending id so
    /// repeated listings are stable.
    fn list_services(&self) -> Result<Vec<Service>, StoreError>;

    fn get_service_aggregate(&self, id: ServiceId) -> Result<Aggregate, StoreError> {
        self.get_service(id).map(|s| s.aggregate())
    }

    /// Overwrite the aggregate with caller-computed values.
    fn update_service_aggregate(&self, id: ServiceId, aggregate: Aggregate)
        -> Result<(), StoreError>;

    /// Add one vote to the aggregate as a single atomic step and return the
    /// new pair.
    fn increment_service_aggregate(
        &self,
        id: ServiceId,
        rating: Rating,
    ) -> Result<Aggregate, StoreError>;

    fn service_count(&self) -> Result<u64, StoreError>;
}

/// Order services most-voted first, ties by ascending id.
pub fn sort_by_popularity(services: &mut [Service]) {
    services.sort_by(|a, b| {
        b.rating_count
            .cmp(&a.rating_count)
            .then_with(|| a.id.cmp(&b.id))
    });
}
