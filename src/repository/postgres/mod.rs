//! PostgreSQL store

pub mod books;
pub mod reservations;
pub mod users;

use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use super::Store;
use crate::{
    error::{AppError, AppResult},
    models::{
        book::{Book, CreateBook, DeletePolicy, UpdateBook},
        load_report::{BookSeed, UpsertOutcome},
        purge::DeletionSummary,
        reservation::{Release, Reservation},
        user::{Identity, NewUser, User},
    },
};

/// Store backed by a Postgres pool
#[derive(Clone)]
pub struct PgStore {
    pub pool: Pool<Postgres>,
    pub books: books::BooksRepository,
    pub reservations: reservations::ReservationsRepository,
    pub users: users::UsersRepository,
}

impl PgStore {
    /// Create a new store with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            books: books::BooksRepository::new(pool.clone()),
            reservations: reservations::ReservationsRepository::new(pool.clone()),
            users: users::UsersRepository::new(pool.clone()),
            pool,
        }
    }

    /// Apply embedded migrations
    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

/// Map unique and foreign key violations to `Conflict`, anything else stays a store failure
pub(crate) fn constraint_conflict(err: sqlx::Error, message: impl FnOnce() -> String) -> AppError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() || db.is_foreign_key_violation() => {
            AppError::Conflict(message())
        }
        _ => AppError::Database(err),
    }
}

#[async_trait]
impl Store for PgStore {
    async fn get_book(&self, id: Uuid) -> AppResult<Book> {
        self.books.get_by_id(id).await
    }

    async fn list_books(&self) -> AppResult<Vec<Book>> {
        self.books.list().await
    }

    async fn book_exists(&self, id: Uuid) -> AppResult<bool> {
        self.books.exists(id).await
    }

    async fn find_book_by_external_id(&self, external_id: &str) -> AppResult<Option<Book>> {
        self.books.find_by_external_id(external_id).await
    }

    async fn create_book(&self, book: &CreateBook) -> AppResult<Book> {
        self.books.create(book).await
    }

    async fn update_book(&self, id: Uuid, update: &UpdateBook) -> AppResult<Book> {
        self.books.update(id, update).await
    }

    async fn upsert_book(&self, seed: &BookSeed) -> AppResult<(Book, UpsertOutcome)> {
        self.books.upsert(seed).await
    }

    async fn delete_book(&self, id: Uuid, policy: DeletePolicy) -> AppResult<DeletionSummary> {
        self.books.delete(id, policy).await
    }

    async fn get_reservation(&self, id: Uuid) -> AppResult<Reservation> {
        self.reservations.get_by_id(id).await
    }

    async fn active_reservation_for_book(&self, book_id: Uuid) -> AppResult<Option<Reservation>> {
        self.reservations.active_for_book(book_id).await
    }

    async fn list_reservations_for_book(
        &self,
        book_id: Uuid,
        offset: i64,
        limit: i64,
    ) -> AppResult<(Vec<Reservation>, i64)> {
        self.reservations.list_for_book(book_id, offset, limit).await
    }

    async fn count_active_reservations(&self) -> AppResult<i64> {
        self.reservations.count_active().await
    }

    async fn reserve_book(&self, book_id: Uuid, requester_id: &str) -> AppResult<Reservation> {
        self.reservations.create(book_id, requester_id).await
    }

    async fn release_reservation(
        &self,
        id: Uuid,
        release: Release,
        actor: &Identity,
    ) -> AppResult<Reservation> {
        self.reservations.release(id, release, actor).await
    }

    async fn delete_all_reservations(&self) -> AppResult<DeletionSummary> {
        self.reservations.delete_all().await
    }

    async fn delete_all_books(&self) -> AppResult<DeletionSummary> {
        self.books.delete_all().await
    }

    async fn delete_everything(&self) -> AppResult<DeletionSummary> {
        let mut tx = self.pool.begin().await?;
        lock_tables(&mut tx).await?;

        let reservations = sqlx::query("DELETE FROM reservations")
            .execute(&mut *tx)
            .await?
            .rows_affected();
        let books = sqlx::query("DELETE FROM books")
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;
        Ok(DeletionSummary { books, reservations })
    }

    async fn get_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        self.users.get_by_email(email).await
    }

    async fn insert_user_if_absent(&self, user: &NewUser) -> AppResult<(User, bool)> {
        self.users.insert_if_absent(user).await
    }

    async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Block concurrent writers (and row locks) on both tables for the rest of the transaction
pub(crate) async fn lock_tables(tx: &mut sqlx::Transaction<'_, Postgres>) -> AppResult<()> {
    sqlx::query("LOCK TABLE books, reservations IN EXCLUSIVE MODE")
        .execute(&mut **tx)
        .await?;
    Ok(())
}
