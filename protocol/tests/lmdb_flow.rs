//! The submission flow against the LMDB backend.

use std::sync::Arc;

use ratings_nullables::NullWallet;
use ratings_protocol::{
    create_service, load_services, AdminPolicy, AggregatePolicy, NoRefresh, RatingWidget,
    SubmitOutcome,
};
use ratings_store::{Aggregate, NewService, ReviewStore};
use ratings_store_lmdb::{check_integrity, LmdbEnvironment, LmdbStore};
use ratings_types::WalletAddress;

fn open() -> (tempfile::TempDir, LmdbEnvironment) {
    let dir = tempfile::tempdir().unwrap();
    let env = LmdbEnvironment::open(dir.path(), 8, 16 * 1024 * 1024).unwrap();
    (dir, env)
}

#[tokio::test]
async fn votes_persist_and_audit_clean() {
    let (_dir, env) = open();
    let store: Arc<LmdbStore> = Arc::new(env.store());
    let service = create_service(
        &*store,
        &NewService {
            name: "Weather API".into(),
            url: "https://weather.example".into(),
            description: Some("Forecasts".into()),
        },
        None,
        &AdminPolicy::Open,
    )
    .unwrap();

    for (byte, stars) in [(1u8, 5u8), (2, 3), (3, 4)] {
        let wallet = Arc::new(NullWallet::connected(WalletAddress::from_bytes(&[byte; 20])));
        let widget = RatingWidget::new(
            service.id,
            Arc::clone(&store),
            wallet,
            Arc::new(NoRefresh),
            AggregatePolicy::ReadModifyWrite,
        );
        assert!(matches!(
            widget.submit(stars).await.unwrap(),
            SubmitOutcome::Recorded(_)
        ));
        assert!(matches!(
            widget.submit(1).await.unwrap(),
            SubmitOutcome::Ignored(_)
        ));
    }

    let views = load_services(&*store).unwrap();
    assert_eq!(
        views[0].service.aggregate(),
        Aggregate {
            rating_sum: 12,
            rating_count: 3
        }
    );
    assert_eq!(views[0].average_label(), "4.0");
    assert_eq!(store.review_count().unwrap(), 3);
    assert!(check_integrity(&env).unwrap().is_healthy());
}
