//! LMDB storage backend for the service rating directory.
//!
//! Implements all storage traits from `ratings-store` using the `heed` LMDB bindings.
//! Services, reviews and metadata each live in their own named database
//! within a single environment.

pub mod environment;
pub mod error;
pub mod integrity;
pub mod meta;
pub mod migration;
pub mod review;
pub mod service;

pub use environment::{LmdbEnvironment, LmdbStore};
pub use error::LmdbError;
pub use integrity::{check_data_dir, check_integrity, AggregateDrift, IntegrityReport};
pub use meta::LmdbMetaStore;
