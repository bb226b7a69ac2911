//! Nullable store: thread-safe in-memory storage for testing.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Barrier, Mutex, MutexGuard, PoisonError};

use ratings_store::{
    sort_by_popularity, Aggregate, NewReview, NewService, Review, ReviewStore, Service,
    ServiceStore, StoreError,
};
use ratings_types::{Rating, ServiceId, WalletAddress};

use crate::NullClock;

/// An in-memory service + review store for testing.
///
/// Enforces the same constraints as the LMDB store: one review per
/// `(service, voter)` and reviews only for existing services. Timestamps
/// come from the embedded [`NullClock`].
///
/// Two hooks let tests provoke failure modes:
/// - [`NullStore::gate_aggregate_access`] parks aggregate reads (after the
///   snapshot) and increments (before the write lock) on a barrier, so
///   concurrent aggregate updates are forced to overlap.
/// - [`NullStore::fail_next_aggregate_write`] makes the next aggregate write
///   return a backend error.
pub struct NullStore {
    services: Mutex<BTreeMap<ServiceId, Service>>,
    reviews: Mutex<HashMap<(ServiceId, WalletAddress), Review>>,
    next_id: Mutex<u64>,
    clock: NullClock,
    access_gate: Mutex<Option<Arc<Barrier>>>,
    gated_passes: AtomicUsize,
    fail_aggregate_write: AtomicBool,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl NullStore {
    pub fn new() -> Self {
        Self {
            services: Mutex::new(BTreeMap::new()),
            reviews: Mutex::new(HashMap::new()),
            next_id: Mutex::new(1),
            clock: NullClock::default(),
            access_gate: Mutex::new(None),
            gated_passes: AtomicUsize::new(0),
            fail_aggregate_write: AtomicBool::new(false),
        }
    }

    pub fn clock(&self) -> &NullClock {
        &self.clock
    }

    /// Convenience for tests: create a service and return its id.
    pub fn seed_service(&self, name: &str) -> ServiceId {
        let new = NewService {
            name: name.to_string(),
            url: format!("https://{}.example", name.to_lowercase()),
            description: None,
        };
        let id = self.allocate_id();
        let service = self.build_service(id, &new);
        lock(&self.services).insert(id, service);
        id
    }

    /// The next `passes` aggregate reads or increments each wait on
    /// `barrier`. A read waits after taking its snapshot; an increment waits
    /// before it locks the service table.
    pub fn gate_aggregate_access(&self, barrier: Arc<Barrier>, passes: usize) {
        *lock(&self.access_gate) = Some(barrier);
        self.gated_passes.store(passes, Ordering::SeqCst);
    }

    pub fn fail_next_aggregate_write(&self) {
        self.fail_aggregate_write.store(true, Ordering::SeqCst);
    }

    fn allocate_id(&self) -> ServiceId {
        let mut next = lock(&self.next_id);
        let id = ServiceId::new(*next);
        *next += 1;
        id
    }

    fn build_service(&self, id: ServiceId, new: &NewService) -> Service {
        Service {
            id,
            name: new.name.clone(),
            url: new.url.clone(),
            description: new.description.clone(),
            rating_sum: 0,
            rating_count: 0,
            created_at: self.clock.now(),
        }
    }

    fn pass_gate(&self) {
        let claimed = self
            .gated_passes
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if !claimed {
            return;
        }
        let barrier = lock(&self.access_gate).clone();
        if let Some(barrier) = barrier {
            barrier.wait();
        }
    }

    fn check_write_fault(&self) -> Result<(), StoreError> {
        if self.fail_aggregate_write.swap(false, Ordering::SeqCst) {
            return Err(StoreError::Backend("injected aggregate write failure".into()));
        }
        Ok(())
    }
}

impl Default for NullStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceStore for NullStore {
    fn insert_service(&self, new: &NewService) -> Result<Service, StoreError> {
        let id = self.allocate_id();
        let service = self.build_service(id, new);
        lock(&self.services).insert(id, service.clone());
        Ok(service)
    }

    fn get_service(&self, id: ServiceId) -> Result<Service, StoreError> {
        lock(&self.services)
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("service {id}")))
    }

    fn list_services(&self) -> Result<Vec<Service>, StoreError> {
        let mut services: Vec<Service> = lock(&self.services).values().cloned().collect();
        sort_by_popularity(&mut services);
        Ok(services)
    }

    fn get_service_aggregate(&self, id: ServiceId) -> Result<Aggregate, StoreError> {
        let snapshot = self.get_service(id)?.aggregate();
        self.pass_gate();
        Ok(snapshot)
    }

    fn update_service_aggregate(
        &self,
        id: ServiceId,
        aggregate: Aggregate,
    ) -> Result<(), StoreError> {
        self.check_write_fault()?;
        let mut services = lock(&self.services);
        let service = services
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("service {id}")))?;
        service.rating_sum = aggregate.rating_sum;
        service.rating_count = aggregate.rating_count;
        Ok(())
    }

    fn increment_service_aggregate(
        &self,
        id: ServiceId,
        rating: Rating,
    ) -> Result<Aggregate, StoreError> {
        self.check_write_fault()?;
        self.pass_gate();
        let mut services = lock(&self.services);
        let service = services
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("service {id}")))?;
        let updated = service.aggregate().with_vote(rating);
        service.rating_sum = updated.rating_sum;
        service.rating_count = updated.rating_count;
        Ok(updated)
    }

    fn service_count(&self) -> Result<u64, StoreError> {
        Ok(lock(&self.services).len() as u64)
    }
}

impl ReviewStore for NullStore {
    fn find_review(
        &self,
        service_id: ServiceId,
        voter: &WalletAddress,
    ) -> Result<Option<Review>, StoreError> {
        Ok(lock(&self.reviews)
            .get(&(service_id, voter.clone()))
            .cloned())
    }

    fn insert_review(&self, new: &NewReview) -> Result<Review, StoreError> {
        if !lock(&self.services).contains_key(&new.service_id) {
            return Err(StoreError::NotFound(format!("service {}", new.service_id)));
        }
        let mut reviews = lock(&self.reviews);
        let key = (new.service_id, new.voter.clone());
        if reviews.contains_key(&key) {
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
            created_at: self.clock.now(),
        };
        reviews.insert(key, review.clone());
        Ok(review)
    }

    fn reviews_for_service(&self, service_id: ServiceId) -> Result<Vec<Review>, StoreError> {
        let mut reviews: Vec<Review> = lock(&self.reviews)
            .values()
            .filter(|r| r.service_id == service_id)
            .cloned()
            .collect();
        reviews.sort_by(|a, b| a.voter.as_str().cmp(b.voter.as_str()));
        Ok(reviews)
    }

    fn review_count(&self) -> Result<u64, StoreError> {
        Ok(lock(&self.reviews).len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratings_types::Signature;

    fn vote(service_id: ServiceId, byte: u8, stars: u8) -> NewReview {
        NewReview {
            service_id,
            voter: WalletAddress::from_bytes(&[byte; 20]),
            rating: Rating::new(stars).unwrap(),
            signature: Signature(vec![byte]),
        }
    }

    #[test]
    fn duplicate_review_is_unique_violation() {
        let store = NullStore::new();
        let id = store.seed_service("Alpha");
        store.insert_review(&vote(id, 1, 4)).unwrap();
        assert!(store.insert_review(&vote(id, 1, 2)).unwrap_err().is_unique_violation());
        assert_eq!(store.review_count().unwrap(), 1);
    }

    #[test]
    fn review_requires_existing_service() {
        let store = NullStore::new();
        let err = store.insert_review(&vote(ServiceId::new(5), 1, 4)).unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[test]
    fn timestamps_come_from_clock() {
        let store = NullStore::new();
        store.clock().set(1_700_000_000);
        let id = store.seed_service("Alpha");
        assert_eq!(store.get_service(id).unwrap().created_at.as_secs(), 1_700_000_000);
    }

    #[test]
    fn injected_write_failure_fires_once() {
        let store = NullStore::new();
        let id = store.seed_service("Alpha");
        store.fail_next_aggregate_write();
        let four = Rating::new(4).unwrap();
        assert!(matches!(
            store.increment_service_aggregate(id, four),
            Err(StoreError::Backend(_))
        ));
        assert_eq!(store.increment_service_aggregate(id, four).unwrap().rating_count, 1);
    }

    #[test]
    fn gated_increments_park_before_writing() {
        let store = Arc::new(NullStore::new());
        let id = store.seed_service("Alpha");
        let gate = Arc::new(Barrier::new(3));
        store.gate_aggregate_access(Arc::clone(&gate), 2);

        let writers: Vec<_> = [4u8, 5]
            .into_iter()
            .map(|stars| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    store
                        .increment_service_aggregate(id, Rating::new(stars).unwrap())
                        .unwrap()
                })
            })
            .collect();

        // Neither increment can write until this thread joins the barrier.
        assert_eq!(store.get_service(id).unwrap().aggregate(), Aggregate::EMPTY);
        gate.wait();
        for writer in writers {
            writer.join().unwrap();
        }
        assert_eq!(
            store.get_service(id).unwrap().aggregate(),
            Aggregate {
                rating_sum: 9,
                rating_count: 2
            }
        );
    }

    #[test]
    fn ungated_reads_do_not_block() {
        let store = NullStore::new();
        let id = store.seed_service("Alpha");
        store.gate_aggregate_access(Arc::new(Barrier::new(1)), 1);
        // Barrier of one releases immediately; the second read is ungated.
        assert_eq!(store.get_service_aggregate(id).unwrap(), Aggregate::EMPTY);
        assert_eq!(store.get_service_aggregate(id).unwrap(), Aggregate::EMPTY);
    }
}
