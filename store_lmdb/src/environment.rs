//! LMDB environment setup.

use std::path::Path;
use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions};

use crate::meta::LmdbMetaStore;
use crate::migration;
use crate::LmdbError;

/// Database names created in every environment.
pub(crate) const SERVICES_DB: &str = "services";
pub(crate) const REVIEWS_DB: &str = "reviews";
pub(crate) const META_DB: &str = "meta";

/// Wraps the LMDB environment and all database handles.
pub struct LmdbEnvironment {
    env: Arc<Env>,
    pub(crate) services_db: Database<Bytes, Bytes>,
    pub(crate) reviews_db: Database<Bytes, Bytes>,
    pub(crate) meta_db: Database<Bytes, Bytes>,
}

impl LmdbEnvironment {
    /// Open or create an LMDB environment at the given path.
    ///
    /// Creates the directory if it does not exist and brings the schema up
    /// to date before returning.
    pub fn open(path: &Path, max_dbs: u32, map_size: usize) -> Result<Self, LmdbError> {
        std::fs::create_dir_all(path)?;

        // SAFETY: the environment is opened once per process for this path
        // and never mapped twice concurrently by this crate.
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(map_size)
                .max_dbs(max_dbs)
                .open(path)?
        };

        let mut wtxn = env.write_txn()?;
        let services_db = env.create_database(&mut wtxn, Some(SERVICES_DB))?;
        let reviews_db = env.create_database(&mut wtxn, Some(REVIEWS_DB))?;
        let meta_db = env.create_database(&mut wtxn, Some(META_DB))?;
        wtxn.commit()?;

        let this = Self {
            env: Arc::new(env),
            services_db,
            reviews_db,
            meta_db,
        };
        migration::migrate(&this.meta_store())?;

        tracing::info!(path = %path.display(), "opened LMDB environment");
        Ok(this)
    }

    pub fn env(&self) -> &Arc<Env> {
        &self.env
    }

    /// A handle implementing the service and review stores.
    pub fn store(&self) -> LmdbStore {
        LmdbStore {
            env: Arc::clone(&self.env),
            services_db: self.services_db,
            reviews_db: self.reviews_db,
            meta_db: self.meta_db,
        }
    }

    pub fn meta_store(&self) -> LmdbMetaStore {
        LmdbMetaStore {
            env: Arc::clone(&self.env),
            meta_db: self.meta_db,
        }
    }
}

/// Cheap, cloneable handle over the service, review and meta databases.
///
/// Implements [`ratings_store::ServiceStore`] and [`ratings_store::ReviewStore`].
#[derive(Clone)]
pub struct LmdbStore {
    pub(crate) env: Arc<Env>,
    pub(crate) services_db: Database<Bytes, Bytes>,
    pub(crate) reviews_db: Database<Bytes, Bytes>,
    pub(crate) meta_db: Database<Bytes, Bytes>,
}

#[cfg(test)]
pub(crate) fn open_test_env() -> (tempfile::TempDir, LmdbEnvironment) {
    let dir = tempfile::tempdir().unwrap();
    let env = LmdbEnvironment::open(dir.path(), 8, 1 << 20).unwrap();
    (dir, env)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratings_store::MetaStore;

    #[test]
    fn open_creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("nested").join("db");
        let env = LmdbEnvironment::open(&nested, 8, 1 << 20).unwrap();
        assert!(nested.join("data.mdb").exists());
        drop(env);
    }

    #[test]
    fn open_sets_schema_version() {
        let (_dir, env) = open_test_env();
        assert_eq!(
            env.meta_store().schema_version().unwrap(),
            crate::migration::CURRENT_SCHEMA_VERSION
        );
    }

    #[test]
    fn reopen_keeps_data() {
        use ratings_store::{NewService, ServiceStore};

        let dir = tempfile::tempdir().unwrap();
        {
            let env = LmdbEnvironment::open(dir.path(), 8, 1 << 20).unwrap();
            env.store()
                .insert_service(&NewService {
                    name: "Weather API".into(),
                    url: "https://weather.example".into(),
                    description: None,
                })
                .unwrap();
        }
        let env = LmdbEnvironment::open(dir.path(), 8, 1 << 20).unwrap();
        assert_eq!(env.store().service_count().unwrap(), 1);
    }
}
