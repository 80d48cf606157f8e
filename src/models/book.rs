//! Book model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};

/// Book record as stored
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: Uuid,
    /// Natural key used by bulk loads
    pub external_id: Option<String>,
    pub title: String,
    pub author: String,
    pub synopsis: String,
    /// False while an active reservation references the book
    pub available: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Navigation links attached to API responses
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BookLinks {
    #[serde(rename = "self")]
    pub self_: String,
    pub reservations: String,
}

impl BookLinks {
    pub fn for_book(id: Uuid) -> Self {
        Self {
            self_: format!("/books/{}", id),
            reservations: format!("/books/{}/reservations", id),
        }
    }
}

/// Book as returned by the API
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BookResponse {
    #[serde(flatten)]
    pub book: Book,
    pub links: BookLinks,
}

impl From<Book> for BookResponse {
    fn from(book: Book) -> Self {
        let links = BookLinks::for_book(book.id);
        Self { book, links }
    }
}

/// Create book request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateBook {
    #[validate(length(min = 1, max = 64))]
    pub external_id: Option<String>,
    #[validate(length(min = 1, max = 512))]
    pub title: String,
    #[validate(length(min = 1, max = 256))]
    pub author: String,
    #[validate(length(min = 1))]
    pub synopsis: String,
}

/// Update book request.
///
/// `available` is accepted by the deserializer only so that it can be refused
/// explicitly: availability follows reservation state.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateBook {
    #[validate(length(min = 1, max = 512))]
    pub title: Option<String>,
    #[validate(length(min = 1, max = 256))]
    pub author: Option<String>,
    #[validate(length(min = 1))]
    pub synopsis: Option<String>,
    #[serde(default)]
    pub available: Option<bool>,
}

impl UpdateBook {
    /// Validate field contents and reject availability changes
    pub fn check(&self) -> AppResult<()> {
        if self.available.is_some() {
            return Err(AppError::Validation(
                "availability is derived from reservations and cannot be set".to_string(),
            ));
        }
        self.validate()?;
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.author.is_none() && self.synopsis.is_none()
    }
}

/// Policy applied when deleting a book that still has an active reservation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DeletePolicy {
    /// Refuse with a conflict
    #[default]
    Reject,
    /// Remove the dependent reservations in the same transaction
    Cascade,
}

impl DeletePolicy {
    pub fn from_cascade_flag(cascade: bool) -> Self {
        if cascade {
            DeletePolicy::Cascade
        } else {
            DeletePolicy::Reject
        }
    }
}
