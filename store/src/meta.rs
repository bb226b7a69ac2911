//! Backend bookkeeping that is neither a service nor a review.

use ratings_types::ServiceId;

use crate::StoreError;

/// Schema version and id allocation state of a backend.
pub trait MetaStore {
    /// Schema version the backend was last migrated to. A store that has
    /// never been migrated reports 0.
    fn schema_version(&self) -> Result<u32, StoreError>;

    fn set_schema_version(&self, version: u32) -> Result<(), StoreError>;

    /// Id the next inserted service will receive.
    fn next_service_id(&self) -> Result<ServiceId, StoreError>;
}
