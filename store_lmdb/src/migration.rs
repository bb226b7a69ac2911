//! Schema versioning for the LMDB environment.
//!
//! The version is recorded in the meta database. Opening an environment
//! applies every step above the recorded version in order; a recorded
//! version above [`CURRENT_SCHEMA_VERSION`] was written by a newer build
//! and the open is refused.

use ratings_store::MetaStore;

use crate::LmdbError;

pub const CURRENT_SCHEMA_VERSION: u32 = 1;

/// Takes the store from `version - 1` to `version`.
struct Step {
    version: u32,
    summary: &'static str,
    apply: fn(&dyn MetaStore) -> Result<(), LmdbError>,
}

const STEPS: &[Step] = &[Step {
    version: 1,
    summary: "services, reviews keyed by (service, voter), meta",
    apply: initial_layout,
}];

/// The named databases are created on open; nothing to rewrite.
fn initial_layout(_meta: &dyn MetaStore) -> Result<(), LmdbError> {
    Ok(())
}

/// Bring the environment up to [`CURRENT_SCHEMA_VERSION`], returning the
/// version found before any step ran.
pub fn migrate(meta: &dyn MetaStore) -> Result<u32, LmdbError> {
    let recorded = meta.schema_version()?;
    if recorded > CURRENT_SCHEMA_VERSION {
        return Err(LmdbError::Schema(format!(
            "store has schema version {recorded}, this build understands up to {CURRENT_SCHEMA_VERSION}"
        )));
    }

    for step in STEPS.iter().filter(|s| s.version > recorded) {
        tracing::info!(version = step.version, summary = step.summary, "applying schema step");
        (step.apply)(meta)?;
        meta.set_schema_version(step.version)?;
    }

    if recorded < CURRENT_SCHEMA_VERSION {
        tracing::info!(from = recorded, to = CURRENT_SCHEMA_VERSION, "schema migrated");
    } else {
        tracing::debug!(version = recorded, "schema is current");
    }
    Ok(recorded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::open_test_env;

    #[test]
    fn steps_are_contiguous() {
        for (i, step) in STEPS.iter().enumerate() {
            assert_eq!(step.version, i as u32 + 1);
        }
        assert_eq!(STEPS.last().map(|s| s.version), Some(CURRENT_SCHEMA_VERSION));
    }

    #[test]
    fn migrated_store_is_left_alone() {
        let (_dir, env) = open_test_env();
        assert_eq!(migrate(&env.meta_store()).unwrap(), CURRENT_SCHEMA_VERSION);
    }

    #[test]
    fn newer_schema_is_refused() {
        let (_dir, env) = open_test_env();
        let meta = env.meta_store();
        meta.set_schema_version(CURRENT_SCHEMA_VERSION + 1).unwrap();
        assert!(matches!(migrate(&meta), Err(LmdbError::Schema(_))));
    }

    #[test]
    fn unversioned_store_is_brought_current() {
        let (_dir, env) = open_test_env();
        let meta = env.meta_store();
        meta.set_schema_version(0).unwrap();
        assert_eq!(migrate(&meta).unwrap(), 0);
        assert_eq!(meta.schema_version().unwrap(), CURRENT_SCHEMA_VERSION);
    }
}
