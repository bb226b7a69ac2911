//! LMDB implementation of ReviewStore.
//!
//! Key format: `service_id (8 bytes BE) ++ voter.as_str().as_bytes()`
//! (binary composite key). The fixed-width service prefix lets a range scan
//! collect every review of one service, and the full key doubles as the
//! uniqueness constraint on `(service_id, voter)`.

use std::ops::Bound;

use ratings_store::review::{NewReview, Review, ReviewStore};
use ratings_store::StoreError;
use ratings_types::{ServiceId, Timestamp, WalletAddress};

use crate::environment::LmdbStore;
use crate::LmdbError;

/// Build the binary composite key `service_id_be ++ voter_bytes`.
fn review_key(service_id: ServiceId, voter: &WalletAddress) -> Vec<u8> {
    let voter = voter.as_str().as_bytes();
    let mut key = Vec::with_capacity(8 + voter.len());
    key.extend_from_slice(&service_id.to_be_bytes());
    key.extend_from_slice(voter);
    key
}

impl ReviewStore for LmdbStore {
    fn find_review(
        &self,
        service_id: ServiceId,
        voter: &WalletAddress,
    ) -> Result<Option<Review>, StoreError> {
        let key = review_key(service_id, voter);
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        match self.reviews_db.get(&rtxn, &key).map_err(LmdbError::from)? {
            Some(bytes) => {
                let review: Review = bincode::deserialize(bytes).map_err(LmdbError::from)?;
                Ok(Some(review))
            }
            None => Ok(None),
        }
    }

    fn insert_review(&self, new: &NewReview) -> Result<Review, StoreError> {
        let key = review_key(new.service_id, &new.voter);
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;

        // Foreign key: the service must exist.
        self.read_service(&wtxn, new.service_id)?;

        if self
            .reviews_db
            .get(&wtxn, &key)
            .map_err(LmdbError::from)?
            .is_some()
        {
            return Err(StoreError::UniqueViolation {
                service_id: new.service_id,
                voter: new.voter.clone(),
            });
        }

        let review = Review {
            service_id: new.service_id,
            voter: new.voter.clone(),
            rating: new.rating,
            signature: new.signature.clone(),
            created_at: Timestamp::now(),
        };
        let bytes = bincode::serialize(&review).map_err(LmdbError::from)?;
        self.reviews_db
            .put(&mut wtxn, &key, &bytes)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(review)
    }

    fn reviews_for_service(&self, service_id: ServiceId) -> Result<Vec<Review>, StoreError> {
        let lower = service_id.to_be_bytes();
        let upper = service_id.as_u64().checked_add(1).map(u64::to_be_bytes);

        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let bounds: (Bound<&[u8]>, Bound<&[u8]>) = match &upper {
            Some(upper) => (Bound::Included(&lower[..]), Bound::Excluded(&upper[..])),
            None => (Bound::Included(&lower[..]), Bound::Unbounded),
        };
        let iter = self
            .reviews_db
            .range(&rtxn, &bounds)
            .map_err(LmdbError::from)?;
        let mut results = Vec::new();
        for entry in iter {
            let (_key, val) = entry.map_err(LmdbError::from)?;
            let review: Review = bincode::deserialize(val).map_err(LmdbError::from)?;
            results.push(review);
        }
        Ok(results)
    }

    fn review_count(&self) -> Result<u64, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let count = self.reviews_db.len(&rtxn).map_err(LmdbError::from)?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::open_test_env;
    use ratings_store::{NewService, ServiceStore};
    use ratings_types::{Rating, Signature};

    fn voter(byte: u8) -> WalletAddress {
        WalletAddress::from_bytes(&[byte; 20])
    }

    fn vote(service_id: ServiceId, who: &WalletAddress, stars: u8) -> NewReview {
        NewReview {
            service_id,
            voter: who.clone(),
            rating: Rating::new(stars).unwrap(),
            signature: Signature(vec![stars; 64]),
        }
    }

    fn seed_service(store: &LmdbStore, name: &str) -> ServiceId {
        store
            .insert_service(&NewService {
                name: name.into(),
                url: format!("https://{name}.example"),
                description: None,
            })
            .unwrap()
            .id
    }

    #[test]
    fn insert_then_find() {
        let (_dir, env) = open_test_env();
        let store = env.store();
        let id = seed_service(&store, "alpha");
        let alice = voter(0xa1);

        assert_eq!(store.find_review(id, &alice).unwrap(), None);
        store.insert_review(&vote(id, &alice, 4)).unwrap();

        let found = store.find_review(id, &alice).unwrap().unwrap();
        assert_eq!(found.rating.stars(), 4);
        assert_eq!(found.signature, Signature(vec![4; 64]));
    }

    #[test]
    fn second_review_for_same_pair_is_unique_violation() {
        let (_dir, env) = open_test_env();
        let store = env.store();
        let id = seed_service(&store, "alpha");
        let alice = voter(0xa1);

        store.insert_review(&vote(id, &alice, 4)).unwrap();
        let err = store.insert_review(&vote(id, &alice, 1)).unwrap_err();
        assert!(err.is_unique_violation());

        // The first row is left intact.
        let kept = store.find_review(id, &alice).unwrap().unwrap();
        assert_eq!(kept.rating.stars(), 4);
        assert_eq!(store.review_count().unwrap(), 1);
    }

    #[test]
    fn same_voter_may_review_different_services() {
        let (_dir, env) = open_test_env();
        let store = env.store();
        let a = seed_service(&store, "alpha");
        let b = seed_service(&store, "beta");
        let alice = voter(0xa1);

        store.insert_review(&vote(a, &alice, 5)).unwrap();
        store.insert_review(&vote(b, &alice, 2)).unwrap();
        assert_eq!(store.review_count().unwrap(), 2);
    }

    #[test]
    fn review_for_unknown_service_is_not_found() {
        let (_dir, env) = open_test_env();
        let store = env.store();
        let err = store
            .insert_review(&vote(ServiceId::new(9), &voter(1), 3))
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[test]
    fn reviews_for_service_scans_only_that_service() {
        let (_dir, env) = open_test_env();
        let store = env.store();
        let a = seed_service(&store, "alpha");
        let b = seed_service(&store, "beta");

        store.insert_review(&vote(a, &voter(1), 5)).unwrap();
        store.insert_review(&vote(a, &voter(2), 3)).unwrap();
        store.insert_review(&vote(b, &voter(1), 1)).unwrap();

        let reviews = store.reviews_for_service(a).unwrap();
        assert_eq!(reviews.len(), 2);
        assert!(reviews.iter().all(|r| r.service_id == a));
        assert_eq!(store.reviews_for_service(b).unwrap().len(), 1);
    }
}
