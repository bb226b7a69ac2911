//! Rating submission protocol.
//!
//! Coordinates the wallet identity provider and the persistent store:
//! eligibility check, signature capture, review insert, aggregate update,
//! then a list refresh. Also hosts the read side (service listing) and the
//! admin path that creates services.

pub mod admin;
pub mod aggregate;
pub mod eligibility;
pub mod error;
pub mod listing;
pub mod message;
pub mod refresh;
pub mod session;
pub mod state;

pub use admin::{create_service, AdminPolicy};
pub use aggregate::{apply_vote, reconcile_aggregate, AggregatePolicy};
pub use eligibility::{check_eligibility, Eligibility};
pub use error::{CreateServiceError, SubmissionError};
pub use listing::{load_services, ServiceView, StarGlyphs};
pub use message::canonical_message;
pub use refresh::{ListRefresh, NoRefresh};
pub use session::{IgnoreReason, RatingWidget, SubmitOutcome};
pub use state::SubmissionState;
