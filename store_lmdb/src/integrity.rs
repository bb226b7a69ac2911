//! LMDB database integrity checks.
//!
//! Besides confirming every expected database opens, the check recomputes
//! each service's aggregate from its review rows. The aggregate is kept by
//! the application rather than the database, so it can drift from the
//! reviews after racing read-modify-write updates or a crash between the
//! review insert and the aggregate write.

use std::collections::BTreeMap;
use std::path::Path;

use ratings_store::{Aggregate, Review, Service};
use ratings_types::ServiceId;

use crate::environment::{LmdbEnvironment, META_DB, REVIEWS_DB, SERVICES_DB};
use crate::meta::read_next_service_id;
use crate::LmdbError;

/// A service whose stored aggregate disagrees with its review rows.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AggregateDrift {
    pub service_id: ServiceId,
    pub stored: Aggregate,
    pub actual: Aggregate,
}

/// Summary of an integrity check run.
#[derive(Debug, Default)]
pub struct IntegrityReport {
    pub databases_checked: u32,
    pub total_entries: u64,
    pub drifted: Vec<AggregateDrift>,
    /// Reviews pointing at a service that does not exist.
    pub orphaned_reviews: u64,
    pub errors: Vec<String>,
}

impl IntegrityReport {
    /// Returns `true` if no errors, drift or orphans were detected.
    pub fn is_healthy(&self) -> bool {
        self.errors.is_empty() && self.drifted.is_empty() && self.orphaned_reviews == 0
    }
}

/// Database names that we expect to exist in a valid environment.
const EXPECTED_DATABASES: &[&str] = &[SERVICES_DB, REVIEWS_DB, META_DB];

/// Check LMDB database integrity.
///
/// Read failures and undecodable records are recorded in the report rather
/// than causing a hard error.
pub fn check_integrity(env: &LmdbEnvironment) -> Result<IntegrityReport, LmdbError> {
    let mut report = IntegrityReport::default();
    let rtxn = env.env().read_txn()?;

    for &db_name in EXPECTED_DATABASES {
        match env
            .env()
            .open_database::<heed::types::Bytes, heed::types::Bytes>(&rtxn, Some(db_name))
        {
            Ok(Some(db)) => {
                report.databases_checked += 1;
                match db.len(&rtxn) {
                    Ok(count) => report.total_entries += count,
                    Err(e) => report
                        .errors
                        .push(format!("failed to read database '{}': {}", db_name, e)),
                }
            }
            Ok(None) => report
                .errors
                .push(format!("database '{}' is missing", db_name)),
            Err(e) => report
                .errors
                .push(format!("failed to open database '{}': {}", db_name, e)),
        }
    }

    let mut stored: BTreeMap<ServiceId, Aggregate> = BTreeMap::new();
    for entry in env.services_db.iter(&rtxn)? {
        let (_key, val) = entry?;
        match bincode::deserialize::<Service>(val) {
            Ok(service) => {
                stored.insert(service.id, service.aggregate());
            }
            Err(e) => report.errors.push(format!("undecodable service: {e}")),
        }
    }

    let mut actual: BTreeMap<ServiceId, Aggregate> = BTreeMap::new();
    for entry in env.reviews_db.iter(&rtxn)? {
        let (_key, val) = entry?;
        match bincode::deserialize::<Review>(val) {
            Ok(review) if stored.contains_key(&review.service_id) => {
                let agg = actual.entry(review.service_id).or_default();
                *agg = agg.with_vote(review.rating);
            }
            Ok(_) => report.orphaned_reviews += 1,
            Err(e) => report.errors.push(format!("undecodable review: {e}")),
        }
    }

    match read_next_service_id(&env.meta_db, &rtxn) {
        Ok(next) => {
            if let Some(&highest) = stored.keys().next_back() {
                if highest >= next {
                    report.errors.push(format!(
                        "service id counter at {next} but service {highest} exists"
                    ));
                }
            }
        }
        Err(e) => report.errors.push(e.to_string()),
    }

    for (service_id, stored) in stored {
        let actual = actual.remove(&service_id).unwrap_or_default();
        if stored != actual {
            report.drifted.push(AggregateDrift {
                service_id,
                stored,
                actual,
            });
        }
    }

    Ok(report)
}

/// Check if the LMDB data directory looks valid before opening.
///
/// Returns `Ok(())` for a fresh (nonexistent) directory. Returns an error
/// if the directory exists but `data.mdb` is missing, which suggests
/// corruption or misconfiguration.
pub fn check_data_dir(path: &Path) -> Result<(), String> {
    if !path.exists() {
        return Ok(());
    }
    let data_file = path.join("data.mdb");
    if !data_file.exists() {
        return Err(format!(
            "LMDB directory exists but data.mdb is missing at {}",
            path.display()
        ));
    }
    Ok(())
}
