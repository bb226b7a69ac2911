//! Nullable infrastructure for deterministic testing.
//!
//! The store, the wallet and the clock are abstracted behind traits or
//! plain types. This crate provides test-friendly stand-ins that:
//! - Return deterministic values
//! - Can be controlled programmatically (held signatures, gated reads)
//! - Never touch the filesystem
//!
//! Usage: swap real implementations for nullables in tests.

pub mod clock;
pub mod store;
pub mod wallet;

pub use clock::NullClock;
pub use store::NullStore;
pub use wallet::{NullWallet, SignResponse};
