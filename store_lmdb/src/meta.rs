//! Schema version and service id counter, kept in the `meta` database.

use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env, RoTxn};

use ratings_store::meta::MetaStore;
use ratings_store::StoreError;
use ratings_types::ServiceId;

use crate::LmdbError;

const SCHEMA_VERSION_KEY: &[u8] = b"schema_version";
pub(crate) const NEXT_SERVICE_ID_KEY: &[u8] = b"next_service_id";

/// Counter value read from a `next_service_id` entry; 1 when absent.
pub(crate) fn read_next_service_id(
    meta_db: &Database<Bytes, Bytes>,
    txn: &RoTxn,
) -> Result<ServiceId, LmdbError> {
    match meta_db.get(txn, NEXT_SERVICE_ID_KEY)? {
        Some(bytes) => {
            let arr: [u8; 8] = bytes.try_into().map_err(|_| {
                LmdbError::Corruption(format!("next_service_id is {} bytes", bytes.len()))
            })?;
            Ok(ServiceId::new(u64::from_be_bytes(arr)))
        }
        None => Ok(ServiceId::new(1)),
    }
}

pub struct LmdbMetaStore {
    pub(crate) env: Arc<Env>,
    pub(crate) meta_db: Database<Bytes, Bytes>,
}

impl MetaStore for LmdbMetaStore {
    fn schema_version(&self) -> Result<u32, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        match self.meta_db.get(&rtxn, SCHEMA_VERSION_KEY).map_err(LmdbError::from)? {
            Some(bytes) => {
                let arr: [u8; 4] = bytes.try_into().map_err(|_| {
                    StoreError::Corruption(format!("schema_version is {} bytes", bytes.len()))
                })?;
                Ok(u32::from_le_bytes(arr))
            }
            None => Ok(0),
        }
    }

    fn set_schema_version(&self, version: u32) -> Result<(), StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        self.meta_db
            .put(&mut wtxn, SCHEMA_VERSION_KEY, &version.to_le_bytes())
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn next_service_id(&self) -> Result<ServiceId, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        Ok(read_next_service_id(&self.meta_db, &rtxn)?)
    }
}
