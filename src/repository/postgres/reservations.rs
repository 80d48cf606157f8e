//! Reservations repository for database operations

use chrono::Utc;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use super::{constraint_conflict, lock_tables};
use crate::{
    error::{AppError, AppResult},
    models::{
        purge::DeletionSummary,
        reservation::{Release, Reservation, ReservationState},
        user::Identity,
    },
};

#[derive(Clone)]
pub struct ReservationsRepository {
    pool: Pool<Postgres>,
}

impl ReservationsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get reservation by ID
    pub async fn get_by_id(&self, id: Uuid) -> AppResult<Reservation> {
        sqlx::query_as::<_, Reservation>("SELECT * FROM reservations WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Reservation with id {} not found", id)))
    }

    pub async fn active_for_book(&self, book_id: Uuid) -> AppResult<Option<Reservation>> {
        let reservation = sqlx::query_as::<_, Reservation>(
            "SELECT * FROM reservations WHERE book_id = $1 AND state = 'active'",
        )
        .bind(book_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(reservation)
    }

    /// Page of reservations for a book with the total count
    pub async fn list_for_book(
        &self,
        book_id: Uuid,
        offset: i64,
        limit: i64,
    ) -> AppResult<(Vec<Reservation>, i64)> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM reservations WHERE book_id = $1")
            .bind(book_id)
            .fetch_one(&self.pool)
            .await?;

        let reservations = sqlx::query_as::<_, Reservation>(
            r#"
            SELECT * FROM reservations
            WHERE book_id = $1
            ORDER BY created_at, id
            OFFSET $2 LIMIT $3
            "#,
        )
        .bind(book_id)
        .bind(offset)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok((reservations, total))
    }

    /// Count active reservations
    pub async fn count_active(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM reservations WHERE state = 'active'")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Create an active reservation and flip the book unavailable.
    ///
    /// The book row lock serializes competing requests; the partial unique
    /// index `one_active_reservation_per_book` backs it up.
    pub async fn create(&self, book_id: Uuid, requester_id: &str) -> AppResult<Reservation> {
        let mut tx = self.pool.begin().await?;

        let available: bool = sqlx::query_scalar("SELECT available FROM books WHERE id = $1 FOR UPDATE")
            .bind(book_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", book_id)))?;

        if !available {
            return Err(AppError::Conflict(format!("Book {} is already reserved", book_id)));
        }

        let now = Utc::now();
        let reservation = sqlx::query_as::<_, Reservation>(
            r#"
            INSERT INTO reservations (id, book_id, requester_id, state, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $5)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(book_id)
        .bind(requester_id)
        .bind(ReservationState::Active)
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| constraint_conflict(e, || format!("Book {} is already reserved", book_id)))?;

        sqlx::query("UPDATE books SET available = FALSE WHERE id = $1")
            .bind(book_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(reservation)
    }

    /// Return or cancel an active reservation and flip the book available.
    /// The holder check runs under the row lock.
    pub async fn release(&self, id: Uuid, release: Release, actor: &Identity) -> AppResult<Reservation> {
        let book_id: Uuid = sqlx::query_scalar("SELECT book_id FROM reservations WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Reservation with id {} not found", id)))?;

        let mut tx = self.pool.begin().await?;

        // Book row first, then the reservation row, as in `create`
        sqlx::query("SELECT id FROM books WHERE id = $1 FOR UPDATE")
            .bind(book_id)
            .execute(&mut *tx)
            .await?;

        let current = sqlx::query_as::<_, Reservation>("SELECT * FROM reservations WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Reservation with id {} not found", id)))?;

        actor.require_holder(&current.requester_id)?;
        let target = current.state.release(release)?;

        let reservation = sqlx::query_as::<_, Reservation>(
            "UPDATE reservations SET state = $2, updated_at = $3 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(target)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("UPDATE books SET available = TRUE WHERE id = $1")
            .bind(book_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(reservation)
    }

    /// Delete all reservations and release every book
    pub async fn delete_all(&self) -> AppResult<DeletionSummary> {
        let mut tx = self.pool.begin().await?;
        lock_tables(&mut tx).await?;

        let reservations = sqlx::query("DELETE FROM reservations")
            .execute(&mut *tx)
            .await?
            .rows_affected();

        sqlx::query("UPDATE books SET available = TRUE WHERE available = FALSE")
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(DeletionSummary { books: 0, reservations })
    }
}
