//! Abstract storage traits for the service rating directory.
//!
//! Every storage backend (LMDB, in-memory for testing) implements these
//! traits. The rating protocol depends only on the traits.

pub mod error;
pub mod meta;
pub mod review;
pub mod service;

pub use error::StoreError;
pub use meta::MetaStore;
pub use review::{NewReview, Review, ReviewStore};
pub use service::{sort_by_popularity, Aggregate, NewService, Service, ServiceStore};

/// Everything the rating protocol needs from a backend, shareable across tasks.
pub trait RatingStore: ServiceStore + ReviewStore + Send + Sync {}

impl<T: ServiceStore + ReviewStore + Send + Sync> RatingStore for T {}
