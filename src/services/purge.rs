//! Guarded destructive operations.
//!
//! Nothing is deleted without an explicit `Confirmation::Confirmed`. Books are
//! never removed while reservations could be left pointing at them.

use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        book::DeletePolicy,
        purge::{Confirmation, DeletionSummary},
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct PurgeService {
    repository: Repository,
}

impl PurgeService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    fn require(confirmation: Confirmation, what: &str) -> AppResult<()> {
        if confirmation.is_confirmed() {
            Ok(())
        } else {
            tracing::warn!(operation = what, "Destructive operation refused without confirmation");
            Err(AppError::ConfirmationRequired(format!(
                "Refusing to {}: this permanently removes records and cannot be undone. \
                 Resend with explicit confirmation to proceed.",
                what
            )))
        }
    }

    /// Hard delete a single book
    pub async fn delete_book(
        &self,
        id: Uuid,
        policy: DeletePolicy,
        confirmation: Confirmation,
    ) -> AppResult<DeletionSummary> {
        Self::require(confirmation, &format!("delete book {}", id))?;
        let summary = self.repository.delete_book(id, policy).await?;
        tracing::info!(
            book_id = %id,
            ?policy,
            reservations = summary.reservations,
            "Book deleted"
        );
        Ok(summary)
    }

    /// Delete every reservation; all books become available
    pub async fn purge_reservations(&self, confirmation: Confirmation) -> AppResult<DeletionSummary> {
        Self::require(confirmation, "delete all reservations")?;
        let summary = self.repository.delete_all_reservations().await?;
        tracing::info!(reservations = summary.reservations, "All reservations deleted");
        Ok(summary)
    }

    /// Delete every book. Refused with `Conflict` while reservations exist.
    pub async fn purge_books(&self, confirmation: Confirmation) -> AppResult<DeletionSummary> {
        Self::require(confirmation, "delete all books")?;
        let summary = self.repository.delete_all_books().await?;
        tracing::info!(books = summary.books, "All books deleted");
        Ok(summary)
    }

    /// Delete reservations, then books, as one unit
    pub async fn purge_all(&self, confirmation: Confirmation) -> AppResult<DeletionSummary> {
        Self::require(confirmation, "delete all books and reservations")?;
        let summary = self.repository.delete_everything().await?;
        tracing::info!(
            books = summary.books,
            reservations = summary.reservations,
            total = summary.total(),
            "All books and reservations deleted"
        );
        Ok(summary)
    }
}
