//! Idempotent bulk loading

use bookshelf_server::models::load_report::{ReservationSeed, UserSeed};
use bookshelf_server::models::user::{Identity, Role};

use crate::common::{book_seed, memory_services};

#[tokio::test]
async fn test_loading_books_twice_is_idempotent() {
    let services = memory_services();
    let seeds = vec![book_seed("1", "Dune"), book_seed("2", "Dune Messiah")];

    let first = services.loader.load_books(&seeds).await.unwrap();
    assert_eq!(first.created, 2);
    assert!(first.is_clean());
    let after_first = services.catalog.list_books().await.unwrap();

    let second = services.loader.load_books(&seeds).await.unwrap();
    assert_eq!(second.created, 0);
    assert_eq!(second.unchanged, 2);
    let after_second = services.catalog.list_books().await.unwrap();

    assert_eq!(after_first, after_second);
}

#[tokio::test]
async fn test_changed_descriptor_updates_in_place() {
    let services = memory_services();
    services.loader.load_books(&[book_seed("1", "Dune")]).await.unwrap();
    let before = services.catalog.list_books().await.unwrap();

    let report = services
        .loader
        .load_books(&[book_seed("1", "Dune (Revised)")])
        .await
        .unwrap();
    assert_eq!(report.updated, 1);

    let after = services.catalog.list_books().await.unwrap();
    assert_eq!(after.len(), 1);
    assert_eq!(after[0].id, before[0].id);
    assert_eq!(after[0].title, "Dune (Revised)");
}

#[tokio::test]
async fn test_reload_keeps_availability() {
    let services = memory_services();
    services.loader.load_books(&[book_seed("1", "Dune")]).await.unwrap();
    services
        .loader
        .load_reservations(&[ReservationSeed {
            book_external_id: "1".to_string(),
            requester_id: "u1".to_string(),
        }])
        .await
        .unwrap();

    services.loader.load_books(&[book_seed("1", "Dune")]).await.unwrap();
    let books = services.catalog.list_books().await.unwrap();
    assert!(!books[0].available);
}

#[tokio::test]
async fn test_reservation_seeds_report_per_record_failures() {
    let services = memory_services();
    services
        .loader
        .load_books(&[book_seed("1", "Dune"), book_seed("2", "Children of Dune")])
        .await
        .unwrap();

    let seeds = vec![
        ReservationSeed {
            book_external_id: "1".to_string(),
            requester_id: "u1".to_string(),
        },
        ReservationSeed {
            book_external_id: "missing".to_string(),
            requester_id: "u1".to_string(),
        },
        ReservationSeed {
            book_external_id: "1".to_string(),
            requester_id: "u2".to_string(),
        },
        ReservationSeed {
            book_external_id: "2".to_string(),
            requester_id: "u2".to_string(),
        },
    ];

    let report = services.loader.load_reservations(&seeds).await.unwrap();
    assert_eq!(report.created, 2);
    assert_eq!(report.failures.len(), 2);
    assert_eq!(report.failures[0].index, 1);
    assert_eq!(report.failures[0].kind, "not_found");
    assert_eq!(report.failures[1].index, 2);
    assert_eq!(report.failures[1].kind, "conflict");

    // Re-running creates nothing new and fails the same records
    let again = services.loader.load_reservations(&seeds).await.unwrap();
    assert_eq!(again.created, 0);
    assert_eq!(again.unchanged, 2);
    assert_eq!(again.failures.len(), 2);
    assert_eq!(services.reservations.count_active().await.unwrap(), 2);
}

#[tokio::test]
async fn test_seeding_users_skips_existing() {
    let services = memory_services();
    let seeds = vec![UserSeed {
        email: "admin@example.com".to_string(),
        password: "change-me-now".to_string(),
        role: Role::Admin,
        forenames: None,
        surname: None,
    }];

    let first = services.auth.seed_users(&seeds).await.unwrap();
    assert_eq!(first.created, 1);
    let second = services.auth.seed_users(&seeds).await.unwrap();
    assert_eq!(second.unchanged, 1);

    let (token, user) = services
        .auth
        .authenticate("admin@example.com", "change-me-now")
        .await
        .unwrap();
    assert_eq!(user.role, Role::Admin);
    assert_eq!(services.auth.resolve_identity(&token).unwrap().role, Role::Admin);
}

#[tokio::test]
async fn test_reservation_seed_by_email_records_the_user_id() {
    let services = memory_services();
    services
        .auth
        .seed_users(&[UserSeed {
            email: "reader@example.com".to_string(),
            password: "reader-password".to_string(),
            role: Role::User,
            forenames: None,
            surname: None,
        }])
        .await
        .unwrap();
    services.loader.load_books(&[book_seed("1", "Dune")]).await.unwrap();

    let seeds = vec![
        ReservationSeed {
            book_external_id: "1".to_string(),
            requester_id: "reader@example.com".to_string(),
        },
        ReservationSeed {
            book_external_id: "1".to_string(),
            requester_id: "nobody@example.com".to_string(),
        },
    ];
    let report = services.loader.load_reservations(&seeds).await.unwrap();
    assert_eq!(report.created, 1);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].kind, "not_found");

    // Same seed again matches the resolved requester
    let again = services.loader.load_reservations(&seeds[..1]).await.unwrap();
    assert_eq!(again.unchanged, 1);

    let (_, user) = services
        .auth
        .authenticate("reader@example.com", "reader-password")
        .await
        .unwrap();
    let book = &services.catalog.list_books().await.unwrap()[0];
    let active = services.reservations.active_for_book(book.id).await.unwrap().unwrap();
    assert_eq!(active.requester_id, user.id.to_string());

    let holder = Identity {
        user_id: user.id,
        email: user.email,
        role: user.role,
    };
    let returned = services.reservations.return_reservation(active.id, &holder).await.unwrap();
    assert!(returned.state.is_terminal());
}
