//! LMDB implementation of ServiceStore.
//!
//! Key format: `service_id` as 8 big-endian bytes, so iteration order is
//! creation order. Values are bincode-encoded [`Service`] records.

use heed::{RoTxn, RwTxn};

use ratings_store::service::{sort_by_popularity, Aggregate, NewService, Service, ServiceStore};
use ratings_store::StoreError;
use ratings_types::{Rating, ServiceId, Timestamp};

use crate::environment::LmdbStore;
use crate::meta::{read_next_service_id, NEXT_SERVICE_ID_KEY};
use crate::LmdbError;

impl LmdbStore {
    /// Reserve the next service id inside the caller's write transaction.
    fn allocate_service_id(&self, wtxn: &mut RwTxn) -> Result<ServiceId, LmdbError> {
        let id = read_next_service_id(&self.meta_db, wtxn)?;
        self.meta_db
            .put(wtxn, NEXT_SERVICE_ID_KEY, &(id.as_u64() + 1).to_be_bytes())?;
        Ok(id)
    }

    pub(crate) fn read_service(&self, txn: &RoTxn, id: ServiceId) -> Result<Service, LmdbError> {
        let bytes = self
            .services_db
            .get(txn, &id.to_be_bytes())?
            .ok_or_else(|| LmdbError::NotFound(format!("service {id}")))?;
        Ok(bincode::deserialize(bytes)?)
    }

    fn write_service(&self, wtxn: &mut RwTxn, service: &Service) -> Result<(), LmdbError> {
        let bytes = bincode::serialize(service)?;
        self.services_db
            .put(wtxn, &service.id.to_be_bytes(), &bytes)?;
        Ok(())
    }
}

impl ServiceStore for LmdbStore {
    fn insert_service(&self, new: &NewService) -> Result<Service, StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let id = self.allocate_service_id(&mut wtxn)?;
        let service = Service {
            id,
            name: new.name.clone(),
            url: new.url.clone(),
            description: new.description.clone(),
            rating_sum: 0,
            rating_count: 0,
            created_at: Timestamp::now(),
        };
        self.write_service(&mut wtxn, &service)?;
        wtxn.commit().map_err(LmdbError::from)?;
        tracing::debug!(service_id = %id, name = %service.name, "service inserted");
        Ok(service)
    }

    fn get_service(&self, id: ServiceId) -> Result<Service, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        Ok(self.read_service(&rtxn, id)?)
    }

    fn list_services(&self) -> Result<Vec<Service>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let iter = self.services_db.iter(&rtxn).map_err(LmdbError::from)?;
        let mut services = Vec::new();
        for entry in iter {
            let (_key, val) = entry.map_err(LmdbError::from)?;
            let service: Service = bincode::deserialize(val).map_err(LmdbError::from)?;
            services.push(service);
        }
        sort_by_popularity(&mut services);
        Ok(services)
    }

    fn update_service_aggregate(
        &self,
        id: ServiceId,
        aggregate: Aggregate,
    ) -> Result<(), StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let mut service = self.read_service(&wtxn, id)?;
        service.rating_sum = aggregate.rating_sum;
        service.rating_count = aggregate.rating_count;
        self.write_service(&mut wtxn, &service)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn increment_service_aggregate(
        &self,
        id: ServiceId,
        rating: Rating,
    ) -> Result<Aggregate, StoreError> {
        // LMDB admits one write transaction at a time, so the read and the
        // write below cannot interleave with another writer.
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let mut service = self.read_service(&wtxn, id)?;
        let updated = service.aggregate().with_vote(rating);
        service.rating_sum = updated.rating_sum;
        service.rating_count = updated.rating_count;
        self.write_service(&mut wtxn, &service)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(updated)
    }

    fn service_count(&self) -> Result<u64, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let count = self.services_db.len(&rtxn).map_err(LmdbError::from)?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::open_test_env;

    fn new_service(name: &str) -> NewService {
        NewService {
            name: name.to_string(),
            url: format!("https://{}.example", name.to_lowercase()),
            description: None,
        }
    }

    #[test]
    fn ids_are_assigned_sequentially() {
        let (_dir, env) = open_test_env();
        let store = env.store();
        let a = store.insert_service(&new_service("Alpha")).unwrap();
        let b = store.insert_service(&new_service("Beta")).unwrap();
        assert_eq!(a.id, ServiceId::new(1));
        assert_eq!(b.id, ServiceId::new(2));
    }

    #[test]
    fn new_service_starts_with_empty_aggregate() {
        let (_dir, env) = open_test_env();
        let store = env.store();
        let svc = store
            .insert_service(&NewService {
                name: "Alpha".into(),
                url: "https://alpha.example".into(),
                description: Some("weather data".into()),
            })
            .unwrap();
        let fetched = store.get_service(svc.id).unwrap();
        assert_eq!(fetched.aggregate(), Aggregate::EMPTY);
        assert_eq!(fetched.description.as_deref(), Some("weather data"));
    }

    #[test]
    fn missing_service_is_not_found() {
        let (_dir, env) = open_test_env();
        let result = env.store().get_service(ServiceId::new(42));
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    #[test]
    fn list_orders_by_vote_count_then_id() {
        let (_dir, env) = open_test_env();
        let store = env.store();
        let a = store.insert_service(&new_service("Alpha")).unwrap();
        let b = store.insert_service(&new_service("Beta")).unwrap();
        let c = store.insert_service(&new_service("Gamma")).unwrap();
        store
            .update_service_aggregate(
                c.id,
                Aggregate {
                    rating_sum: 9,
                    rating_count: 2,
                },
            )
            .unwrap();

        let ids: Vec<ServiceId> = store.list_services().unwrap().iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![c.id, a.id, b.id]);
    }

    #[test]
    fn increment_adds_one_vote() {
        let (_dir, env) = open_test_env();
        let store = env.store();
        let svc = store.insert_service(&new_service("Alpha")).unwrap();
        store
            .increment_service_aggregate(svc.id, Rating::new(4).unwrap())
            .unwrap();
        let agg = store
            .increment_service_aggregate(svc.id, Rating::new(3).unwrap())
            .unwrap();
        assert_eq!(
            agg,
            Aggregate {
                rating_sum: 7,
                rating_count: 2
            }
        );
        assert_eq!(store.get_service_aggregate(svc.id).unwrap(), agg);
    }

    #[test]
    fn concurrent_increments_are_all_counted() {
        let (_dir, env) = open_test_env();
        let store = env.store();
        let svc = store.insert_service(&new_service("Alpha")).unwrap();

        std::thread::scope(|scope| {
            for _ in 0..8 {
                let store = store.clone();
                scope.spawn(move || {
                    for _ in 0..10 {
                        store
                            .increment_service_aggregate(svc.id, Rating::new(5).unwrap())
                            .unwrap();
                    }
                });
            }
        });

        let agg = store.get_service_aggregate(svc.id).unwrap();
        assert_eq!(agg.rating_count, 80);
        assert_eq!(agg.rating_sum, 400);
    }
}
