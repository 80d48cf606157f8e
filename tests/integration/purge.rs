//! Destructive operations and their guard

use bookshelf_server::{
    error::AppError,
    models::{book::DeletePolicy, purge::Confirmation},
};

use crate::common::{admin, book_seed, dune, memory_services};

#[tokio::test]
async fn test_unconfirmed_purges_change_nothing() {
    let services = memory_services();
    let book = services.catalog.create_book(dune()).await.unwrap();
    services.reservations.reserve(book.id, "u1").await.unwrap();

    for result in [
        services.purge.purge_reservations(Confirmation::Absent).await,
        services.purge.purge_books(Confirmation::Absent).await,
        services.purge.purge_all(Confirmation::Absent).await,
        services
            .purge
            .delete_book(book.id, DeletePolicy::Cascade, Confirmation::Absent)
            .await,
    ] {
        assert!(matches!(result, Err(AppError::ConfirmationRequired(_))));
    }

    assert_eq!(services.catalog.list_books().await.unwrap().len(), 1);
    assert_eq!(services.reservations.count_active().await.unwrap(), 1);
}

#[tokio::test]
async fn test_books_cannot_be_purged_under_reservations() {
    let services = memory_services();
    services
        .loader
        .load_books(&[book_seed("1", "Dune"), book_seed("2", "Dune Messiah")])
        .await
        .unwrap();
    let books = services.catalog.list_books().await.unwrap();
    let r = services.reservations.reserve(books[0].id, "u1").await.unwrap();
    // Even a terminal reservation still references its book
    services.reservations.return_reservation(r.id, &admin()).await.unwrap();

    let refused = services.purge.purge_books(Confirmation::Confirmed).await;
    assert!(matches!(refused, Err(AppError::Conflict(_))));
    assert_eq!(services.catalog.list_books().await.unwrap().len(), 2);

    let reservations = services
        .purge
        .purge_reservations(Confirmation::Confirmed)
        .await
        .unwrap();
    assert_eq!(reservations.reservations, 1);

    let books = services.purge.purge_books(Confirmation::Confirmed).await.unwrap();
    assert_eq!(books.books, 2);
    assert!(services.catalog.list_books().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_purge_reservations_makes_every_book_available() {
    let services = memory_services();
    let book = services.catalog.create_book(dune()).await.unwrap();
    services.reservations.reserve(book.id, "u1").await.unwrap();

    services
        .purge
        .purge_reservations(Confirmation::Confirmed)
        .await
        .unwrap();
    assert!(services.catalog.get_book(book.id).await.unwrap().available);
}

#[tokio::test]
async fn test_purge_all_removes_everything() {
    let services = memory_services();
    let book = services.catalog.create_book(dune()).await.unwrap();
    services.reservations.reserve(book.id, "u1").await.unwrap();

    let summary = services.purge.purge_all(Confirmation::Confirmed).await.unwrap();
    assert_eq!(summary.books, 1);
    assert_eq!(summary.reservations, 1);
    assert_eq!(summary.total(), 2);
    assert!(services.catalog.list_books().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_delete_book_respects_policy() {
    let services = memory_services();
    let book = services.catalog.create_book(dune()).await.unwrap();
    services.reservations.reserve(book.id, "u1").await.unwrap();

    let rejected = services
        .purge
        .delete_book(book.id, DeletePolicy::Reject, Confirmation::Confirmed)
        .await;
    assert!(matches!(rejected, Err(AppError::Conflict(_))));
    assert!(services.catalog.book_exists(book.id).await.unwrap());

    let summary = services
        .purge
        .delete_book(book.id, DeletePolicy::Cascade, Confirmation::Confirmed)
        .await
        .unwrap();
    assert_eq!(summary.books, 1);
    assert_eq!(summary.reservations, 1);
    assert!(!services.catalog.book_exists(book.id).await.unwrap());
    assert_eq!(services.reservations.count_active().await.unwrap(), 0);
}
