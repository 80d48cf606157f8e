//! Idempotent bulk loader.
//!
//! Books are matched on `external_id`. Reservations reference their book by
//! that same key and are matched on (book, requester) among active
//! reservations. A requester given as an email is resolved to that account's
//! id, the same requester id an authenticated reservation records. Failures
//! are recorded per record and never abort the batch; only a store failure
//! does.

use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::load_report::{BookSeed, LoadReport, ReservationSeed, UpsertOutcome},
    repository::Repository,
};

#[derive(Clone)]
pub struct LoaderService {
    repository: Repository,
}

/// Store failures end the run; everything else is a per-record failure
fn is_fatal(error: &AppError) -> bool {
    matches!(error, AppError::Database(_) | AppError::Internal(_))
}

impl LoaderService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Upsert books by natural key
    pub async fn load_books(&self, seeds: &[BookSeed]) -> AppResult<LoadReport> {
        let mut report = LoadReport::default();

        for (index, seed) in seeds.iter().enumerate() {
            match self.load_book(seed).await {
                Ok(outcome) => report.record(outcome),
                Err(e) if is_fatal(&e) => return Err(e),
                Err(e) => {
                    tracing::warn!(index, external_id = %seed.external_id, error = %e, "Skipping book");
                    report.fail(index, &seed.external_id, &e);
                }
            }
        }

        tracing::info!(processed = report.processed(), %report, "Book load finished");
        Ok(report)
    }

    async fn load_book(&self, seed: &BookSeed) -> AppResult<UpsertOutcome> {
        seed.validate()?;
        let (book, outcome) = self.repository.upsert_book(seed).await?;
        tracing::debug!(book_id = %book.id, external_id = %seed.external_id, ?outcome, "Book upserted");
        Ok(outcome)
    }

    /// Create reservations for books resolved by natural key
    pub async fn load_reservations(&self, seeds: &[ReservationSeed]) -> AppResult<LoadReport> {
        let mut report = LoadReport::default();

        for (index, seed) in seeds.iter().enumerate() {
            match self.load_reservation(seed).await {
                Ok(outcome) => report.record(outcome),
                Err(e) if is_fatal(&e) => return Err(e),
                Err(e) => {
                    tracing::warn!(
                        index,
                        book_external_id = %seed.book_external_id,
                        error = %e,
                        "Skipping reservation"
                    );
                    report.fail(index, &seed.book_external_id, &e);
                }
            }
        }

        tracing::info!(processed = report.processed(), %report, "Reservation load finished");
        Ok(report)
    }

    async fn load_reservation(&self, seed: &ReservationSeed) -> AppResult<UpsertOutcome> {
        seed.validate()?;

        let book = self
            .repository
            .find_book_by_external_id(&seed.book_external_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Book with external id {} not found", seed.book_external_id))
            })?;

        let requester_id = self.resolve_requester(&seed.requester_id).await?;

        if let Some(active) = self.repository.active_reservation_for_book(book.id).await? {
            if active.requester_id == requester_id {
                return Ok(UpsertOutcome::Unchanged);
            }
            return Err(AppError::Conflict(format!(
                "Book {} is already reserved by another requester",
                seed.book_external_id
            )));
        }

        // A reservation committed since the check above still surfaces as Conflict
        self.repository.reserve_book(book.id, &requester_id).await?;
        Ok(UpsertOutcome::Created)
    }

    async fn resolve_requester(&self, requester: &str) -> AppResult<String> {
        if !requester.contains('@') {
            return Ok(requester.to_string());
        }
        let user = self
            .repository
            .get_user_by_email(requester)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("No user with email {}", requester)))?;
        Ok(user.id.to_string())
    }
}
