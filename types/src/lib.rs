//! Fundamental types for the service rating directory.
//!
//! This crate defines the primitives shared across every other crate in the workspace:
//! service identifiers, star ratings, voter addresses, signatures, keys, and timestamps.

pub mod address;
pub mod error;
pub mod keys;
pub mod rating;
pub mod service;
pub mod time;

pub use address::WalletAddress;
pub use error::RatingsError;
pub use keys::{KeyPair, PrivateKey, PublicKey, Signature};
pub use rating::Rating;
pub use service::ServiceId;
pub use time::Timestamp;
