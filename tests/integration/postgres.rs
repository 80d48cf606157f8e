//! Store behavior against a live Postgres database.
//!
//! Run with: DATABASE_URL=postgres://... cargo test -- --ignored
//! Each test purges the tables it uses, so point it at a scratch database.

use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use tokio::sync::Mutex;

use bookshelf_server::{
    error::AppError,
    models::{load_report::ReservationSeed, purge::Confirmation},
    repository::PgStore,
    services::Services,
};

use crate::common::{admin, book_seed, test_auth_config};

/// Tests share one database; run them one at a time
static PG_LOCK: Mutex<()> = Mutex::const_new(());

async fn pg_services() -> Services {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for Postgres tests");
    let pool = PgPoolOptions::new()
        .max_connections(8)
        .connect(&url)
        .await
        .expect("Failed to connect to database");
    let store = PgStore::new(pool);
    store.migrate().await.expect("Failed to run migrations");

    let services = Services::new(Arc::new(store), test_auth_config());
    services
        .purge
        .purge_all(Confirmation::Confirmed)
        .await
        .expect("Failed to reset tables");
    services
}

#[tokio::test]
#[ignore]
async fn test_pg_concurrent_reservations_admit_exactly_one() {
    let _guard = PG_LOCK.lock().await;
    let services = pg_services().await;
    services.loader.load_books(&[book_seed("pg-1", "Dune")]).await.unwrap();
    let book = services.catalog.list_books().await.unwrap().remove(0);

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let services = services.clone();
            tokio::spawn(async move { services.reservations.reserve(book.id, &format!("u{}", i)).await })
        })
        .collect();

    let mut successes = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => successes += 1,
            Err(AppError::Conflict(_)) => {}
            Err(e) => panic!("unexpected error: {}", e),
        }
    }

    assert_eq!(successes, 1);
    assert!(!services.catalog.get_book(book.id).await.unwrap().available);
}

#[tokio::test]
#[ignore]
async fn test_pg_concurrent_release_applies_once() {
    let _guard = PG_LOCK.lock().await;
    let services = pg_services().await;
    services.loader.load_books(&[book_seed("pg-2", "Dune")]).await.unwrap();
    let book = services.catalog.list_books().await.unwrap().remove(0);
    let reservation = services.reservations.reserve(book.id, "u1").await.unwrap();

    let returner = {
        let services = services.clone();
        tokio::spawn(async move { services.reservations.return_reservation(reservation.id, &admin()).await })
    };
    let canceller = {
        let services = services.clone();
        tokio::spawn(async move { services.reservations.cancel_reservation(reservation.id, &admin()).await })
    };

    let results = [returner.await.unwrap(), canceller.await.unwrap()];
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results
        .iter()
        .any(|r| matches!(r, Err(AppError::InvalidState(_)))));
    assert!(services.catalog.get_book(book.id).await.unwrap().available);
}

#[tokio::test]
#[ignore]
async fn test_pg_loader_is_idempotent() {
    let _guard = PG_LOCK.lock().await;
    let services = pg_services().await;
    let seeds = vec![book_seed("pg-3", "Dune"), book_seed("pg-4", "Dune Messiah")];

    services.loader.load_books(&seeds).await.unwrap();
    let before = services.catalog.list_books().await.unwrap();
    let report = services.loader.load_books(&seeds).await.unwrap();
    let after = services.catalog.list_books().await.unwrap();

    assert_eq!(report.unchanged, 2);
    assert_eq!(before, after);

    let reservations = vec![ReservationSeed {
        book_external_id: "pg-3".to_string(),
        requester_id: "u1".to_string(),
    }];
    services.loader.load_reservations(&reservations).await.unwrap();
    let again = services.loader.load_reservations(&reservations).await.unwrap();
    assert_eq!(again.unchanged, 1);
    assert_eq!(services.reservations.count_active().await.unwrap(), 1);
}

#[tokio::test]
#[ignore]
async fn test_pg_books_purge_refused_under_reservations() {
    let _guard = PG_LOCK.lock().await;
    let services = pg_services().await;
    services.loader.load_books(&[book_seed("pg-5", "Dune")]).await.unwrap();
    let book = services.catalog.list_books().await.unwrap().remove(0);
    services.reservations.reserve(book.id, "u1").await.unwrap();

    let refused = services.purge.purge_books(Confirmation::Confirmed).await;
    assert!(matches!(refused, Err(AppError::Conflict(_))));

    services
        .purge
        .purge_reservations(Confirmation::Confirmed)
        .await
        .unwrap();
    let summary = services.purge.purge_books(Confirmation::Confirmed).await.unwrap();
    assert_eq!(summary.books, 1);
}
