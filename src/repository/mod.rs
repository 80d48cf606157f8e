//! Repository layer: the store contract and its backends.
//!
//! Every method that touches both books and reservations is a single atomic
//! unit in each backend. Callers never pair two store calls to keep the
//! availability flag in sync.

pub mod memory;
pub mod postgres;

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{
        book::{Book, CreateBook, DeletePolicy, UpdateBook},
        load_report::{BookSeed, UpsertOutcome},
        purge::DeletionSummary,
        reservation::{Release, Reservation},
        user::{Identity, NewUser, User},
    },
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Shared handle on the store used by all services
pub type Repository = Arc<dyn Store>;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Store: Send + Sync {
    // =========================================================================
    // BOOKS
    // =========================================================================

    async fn get_book(&self, id: Uuid) -> AppResult<Book>;

    async fn list_books(&self) -> AppResult<Vec<Book>>;

    async fn book_exists(&self, id: Uuid) -> AppResult<bool>;

    async fn find_book_by_external_id(&self, external_id: &str) -> AppResult<Option<Book>>;

    /// Insert a book, assigning its identity. Fails with `Conflict` on a
    /// duplicate natural key.
    async fn create_book(&self, book: &CreateBook) -> AppResult<Book>;

    /// Update descriptive fields only
    async fn update_book(&self, id: Uuid, update: &UpdateBook) -> AppResult<Book>;

    /// Insert or update a book by natural key in one statement.
    /// Unchanged records are not rewritten.
    async fn upsert_book(&self, seed: &BookSeed) -> AppResult<(Book, UpsertOutcome)>;

    /// Hard delete one book. An active reservation makes this a `Conflict`
    /// unless the policy is `Cascade`; terminal reservations go with the book.
    async fn delete_book(&self, id: Uuid, policy: DeletePolicy) -> AppResult<DeletionSummary>;

    // =========================================================================
    // RESERVATIONS
    // =========================================================================

    async fn get_reservation(&self, id: Uuid) -> AppResult<Reservation>;

    async fn active_reservation_for_book(&self, book_id: Uuid) -> AppResult<Option<Reservation>>;

    async fn list_reservations_for_book(
        &self,
        book_id: Uuid,
        offset: i64,
        limit: i64,
    ) -> AppResult<(Vec<Reservation>, i64)>;

    async fn count_active_reservations(&self) -> AppResult<i64>;

    /// Create an active reservation and mark the book unavailable, atomically.
    /// `NotFound` when the book is absent, `Conflict` when it is already reserved.
    async fn reserve_book(&self, book_id: Uuid, requester_id: &str) -> AppResult<Reservation>;

    /// Move an active reservation to its terminal state and mark the book
    /// available, atomically. `Authorization` when `actor` neither holds the
    /// reservation nor is an admin, `InvalidState` when it is not active.
    async fn release_reservation(
        &self,
        id: Uuid,
        release: Release,
        actor: &Identity,
    ) -> AppResult<Reservation>;

    // =========================================================================
    // BULK DELETION
    // =========================================================================

    /// Delete every reservation and mark every book available
    async fn delete_all_reservations(&self) -> AppResult<DeletionSummary>;

    /// Delete every book. `Conflict` while any reservation remains.
    async fn delete_all_books(&self) -> AppResult<DeletionSummary>;

    /// Delete reservations then books in one transaction
    async fn delete_everything(&self) -> AppResult<DeletionSummary>;

    // =========================================================================
    // USERS
    // =========================================================================

    async fn get_user_by_email(&self, email: &str) -> AppResult<Option<User>>;

    /// Insert a user unless the email already exists; returns whether it was inserted
    async fn insert_user_if_absent(&self, user: &NewUser) -> AppResult<(User, bool)>;

    // =========================================================================
    // HEALTH
    // =========================================================================

    async fn ping(&self) -> AppResult<()>;
}
