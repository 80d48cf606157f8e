//! Reservation lifecycle and availability consistency

use bookshelf_server::{
    error::AppError,
    models::reservation::{ReservationQuery, ReservationState},
};
use tokio_test::assert_ok;
use uuid::Uuid;

use crate::common::{admin, dune, memory_services, reader};

#[tokio::test]
async fn test_reserve_then_return_restores_availability() {
    let services = memory_services();
    let book = services.catalog.create_book(dune()).await.unwrap();
    assert!(book.available);

    let reservation = services.reservations.reserve(book.id, "u1").await.unwrap();
    assert_eq!(reservation.state, ReservationState::Active);
    assert_eq!(reservation.requester_id, "u1");
    assert!(!services.catalog.get_book(book.id).await.unwrap().available);

    let second = services.reservations.reserve(book.id, "u2").await;
    assert!(matches!(second, Err(AppError::Conflict(_))));

    let returned = services.reservations.return_reservation(reservation.id, &admin()).await.unwrap();
    assert_eq!(returned.state, ReservationState::Returned);
    assert!(services.catalog.get_book(book.id).await.unwrap().available);

    // The book can be reserved again once released
    let again = assert_ok!(services.reservations.reserve(book.id, "u2").await);
    assert_eq!(again.requester_id, "u2");
    assert_eq!(services.reservations.count_active().await.unwrap(), 1);
}

#[tokio::test]
async fn test_cancel_restores_availability() {
    let services = memory_services();
    let book = services.catalog.create_book(dune()).await.unwrap();
    let reservation = services.reservations.reserve(book.id, "u1").await.unwrap();

    let cancelled = services.reservations.cancel_reservation(reservation.id, &admin()).await.unwrap();
    assert_eq!(cancelled.state, ReservationState::Cancelled);
    assert!(services.catalog.get_book(book.id).await.unwrap().available);
    assert!(services.reservations.active_for_book(book.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_reserve_unknown_book_is_not_found() {
    let services = memory_services();
    let result = services.reservations.reserve(Uuid::new_v4(), "u1").await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn test_release_of_terminal_reservation_is_invalid_state() {
    let services = memory_services();
    let book = services.catalog.create_book(dune()).await.unwrap();
    let first = services.reservations.reserve(book.id, "u1").await.unwrap();
    services.reservations.return_reservation(first.id, &admin()).await.unwrap();

    // Someone else holds the book now; releasing the old one must not touch it
    let current = services.reservations.reserve(book.id, "u2").await.unwrap();

    let again = services.reservations.return_reservation(first.id, &admin()).await;
    assert!(matches!(again, Err(AppError::InvalidState(_))));
    let cancel = services.reservations.cancel_reservation(first.id, &admin()).await;
    assert!(matches!(cancel, Err(AppError::InvalidState(_))));

    assert!(!services.catalog.get_book(book.id).await.unwrap().available);
    let active = services.reservations.active_for_book(book.id).await.unwrap();
    assert_eq!(active.map(|r| r.id), Some(current.id));
}

#[tokio::test]
async fn test_unknown_reservation_is_not_found() {
    let services = memory_services();
    let result = services.reservations.return_reservation(Uuid::new_v4(), &admin()).await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn test_concurrent_reservations_admit_exactly_one() {
    let services = memory_services();
    let book = services.catalog.create_book(dune()).await.unwrap();

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let services = services.clone();
            tokio::spawn(async move { services.reservations.reserve(book.id, &format!("u{}", i)).await })
        })
        .collect();

    let mut successes = 0;
    let mut conflicts = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => successes += 1,
            Err(AppError::Conflict(_)) => conflicts += 1,
            Err(e) => panic!("unexpected error: {}", e),
        }
    }

    assert_eq!(successes, 1);
    assert_eq!(conflicts, 7);
    assert!(!services.catalog.get_book(book.id).await.unwrap().available);
    assert_eq!(services.reservations.count_active().await.unwrap(), 1);
}

#[tokio::test]
async fn test_concurrent_return_and_cancel_apply_once() {
    let services = memory_services();
    let book = services.catalog.create_book(dune()).await.unwrap();
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
    let applied = results.iter().filter(|r| r.is_ok()).count();
    let refused = results
        .iter()
        .filter(|r| matches!(r, Err(AppError::InvalidState(_))))
        .count();
    assert_eq!(applied, 1);
    assert_eq!(refused, 1);

    let stored = services.reservations.get_reservation(reservation.id).await.unwrap();
    assert!(stored.state.is_terminal());
    assert!(services.catalog.get_book(book.id).await.unwrap().available);
}

#[tokio::test]
async fn test_list_for_book_pages_history() {
    let services = memory_services();
    let book = services.catalog.create_book(dune()).await.unwrap();
    for requester in ["u1", "u2", "u3"] {
        let r = services.reservations.reserve(book.id, requester).await.unwrap();
        services.reservations.return_reservation(r.id, &admin()).await.unwrap();
    }
    services.reservations.reserve(book.id, "u4").await.unwrap();

    let page = services
        .reservations
        .list_for_book(book.id, &ReservationQuery { offset: Some(2), limit: Some(10) })
        .await
        .unwrap();
    assert_eq!(page.total_count, 4);
    assert_eq!(page.items.len(), 2);
    assert_eq!(page.items[1].requester_id, "u4");

    let negative = services
        .reservations
        .list_for_book(book.id, &ReservationQuery { offset: None, limit: Some(-5) })
        .await;
    assert!(matches!(negative, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn test_availability_cannot_be_set_directly() {
    let services = memory_services();
    let book = services.catalog.create_book(dune()).await.unwrap();

    let update = bookshelf_server::models::book::UpdateBook {
        available: Some(false),
        ..Default::default()
    };
    let result = services.catalog.update_book(book.id, update).await;
    assert!(matches!(result, Err(AppError::Validation(_))));
    assert!(services.catalog.get_book(book.id).await.unwrap().available);
}

#[tokio::test]
async fn test_only_holder_or_admin_releases() {
    let services = memory_services();
    let book = services.catalog.create_book(dune()).await.unwrap();
    let owner = reader();
    let reservation = services
        .reservations
        .reserve(book.id, &owner.requester_id())
        .await
        .unwrap();

    let stranger = reader();
    let refused = services.reservations.cancel_reservation(reservation.id, &stranger).await;
    assert!(matches!(refused, Err(AppError::Authorization(_))));
    let refused = services.reservations.return_reservation(reservation.id, &stranger).await;
    assert!(matches!(refused, Err(AppError::Authorization(_))));
    assert!(!services.catalog.get_book(book.id).await.unwrap().available);
    assert!(services
        .reservations
        .get_reservation(reservation.id)
        .await
        .unwrap()
        .is_active());

    let returned = assert_ok!(services.reservations.return_reservation(reservation.id, &owner).await);
    assert_eq!(returned.state, ReservationState::Returned);
    assert!(services.catalog.get_book(book.id).await.unwrap().available);
}

#[tokio::test]
async fn test_editing_a_reserved_book_keeps_the_reservation() {
    let services = memory_services();
    let book = services.catalog.create_book(dune()).await.unwrap();
    let reservation = services.reservations.reserve(book.id, "u1").await.unwrap();

    let update = bookshelf_server::models::book::UpdateBook {
        title: Some("Dune II".to_string()),
        ..Default::default()
    };
    let updated = services.catalog.update_book(book.id, update).await.unwrap();
    assert_eq!(updated.title, "Dune II");
    assert!(!updated.available);

    let active = services.reservations.active_for_book(book.id).await.unwrap();
    assert_eq!(active.map(|r| (r.id, r.state)), Some((reservation.id, ReservationState::Active)));
}

#[tokio::test]
async fn test_update_unknown_book_is_not_found() {
    let services = memory_services();
    let update = bookshelf_server::models::book::UpdateBook {
        title: Some("Dune II".to_string()),
        ..Default::default()
    };
    let result = services.catalog.update_book(Uuid::new_v4(), update).await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
}
