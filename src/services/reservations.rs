//! Reservation coordination: the state machine that keeps reservations and
//! book availability consistent.
//!
//! Every transition, including the state check and the holder check, runs
//! inside a single atomic store primitive. This layer validates inputs and
//! logs outcomes.

use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        reservation::{Release, Reservation, ReservationPage, ReservationQuery},
        user::Identity,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct ReservationsService {
    repository: Repository,
}

impl ReservationsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Get a reservation by ID
    pub async fn get_reservation(&self, id: Uuid) -> AppResult<Reservation> {
        self.repository.get_reservation(id).await
    }

    /// Reserve a book for a requester.
    ///
    /// Fails with `NotFound` for an unknown book and `Conflict` when the book
    /// already has an active reservation.
    pub async fn reserve(&self, book_id: Uuid, requester_id: &str) -> AppResult<Reservation> {
        if requester_id.trim().is_empty() {
            return Err(AppError::Validation("requester identity is required".to_string()));
        }

        match self.repository.reserve_book(book_id, requester_id).await {
            Ok(reservation) => {
                tracing::info!(
                    reservation_id = %reservation.id,
                    book_id = %book_id,
                    requester_id,
                    "Book reserved"
                );
                Ok(reservation)
            }
            Err(e) => {
                tracing::debug!(book_id = %book_id, requester_id, error = %e, "Reservation refused");
                Err(e)
            }
        }
    }

    /// Return a reservation; the book becomes available again.
    ///
    /// Only the requester or an admin may do this.
    pub async fn return_reservation(&self, id: Uuid, actor: &Identity) -> AppResult<Reservation> {
        self.release(id, Release::Return, actor).await
    }

    /// Cancel a reservation; the book becomes available again
    pub async fn cancel_reservation(&self, id: Uuid, actor: &Identity) -> AppResult<Reservation> {
        self.release(id, Release::Cancel, actor).await
    }

    async fn release(&self, id: Uuid, release: Release, actor: &Identity) -> AppResult<Reservation> {
        match self.repository.release_reservation(id, release, actor).await {
            Ok(reservation) => {
                tracing::info!(
                    reservation_id = %id,
                    book_id = %reservation.book_id,
                    state = %reservation.state,
                    terminal = reservation.state.is_terminal(),
                    actor = %actor.user_id,
                    "Reservation released"
                );
                Ok(reservation)
            }
            Err(e) => {
                tracing::debug!(reservation_id = %id, actor = %actor.user_id, error = %e, "Release refused");
                Err(e)
            }
        }
    }

    /// Paginated reservations of one book
    pub async fn list_for_book(&self, book_id: Uuid, query: &ReservationQuery) -> AppResult<ReservationPage> {
        let (offset, limit) = query.resolve()?;

        if !self.repository.book_exists(book_id).await? {
            return Err(AppError::NotFound(format!("Book with id {} not found", book_id)));
        }

        let (items, total_count) = self
            .repository
            .list_reservations_for_book(book_id, offset, limit)
            .await?;

        Ok(ReservationPage { total_count, items })
    }

    /// Active reservation of a book, if any
    pub async fn active_for_book(&self, book_id: Uuid) -> AppResult<Option<Reservation>> {
        self.repository.active_reservation_for_book(book_id).await
    }

    /// Count active reservations
    pub async fn count_active(&self) -> AppResult<i64> {
        self.repository.count_active_reservations().await
    }
}
