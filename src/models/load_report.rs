//! Bulk load input records and the report returned for each run.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use super::user::Role;
use crate::error::AppError;

/// Book descriptor keyed by its natural key.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct BookSeed {
    /// Natural key, stable across loads
    #[serde(alias = "id")]
    #[validate(length(min = 1, max = 64))]
    pub external_id: String,
    #[validate(length(min = 1, max = 512))]
    pub title: String,
    #[validate(length(min = 1, max = 256))]
    pub author: String,
    #[validate(length(min = 1))]
    pub synopsis: String,
}

/// Reservation descriptor referencing its book by natural key.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct ReservationSeed {
    #[validate(length(min = 1))]
    pub book_external_id: String,
    #[validate(length(min = 1))]
    pub requester_id: String,
}

/// User descriptor keyed by email.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct UserSeed {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
    #[serde(default)]
    pub role: Role,
    pub forenames: Option<String>,
    pub surname: Option<String>,
}

/// What happened to one record.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UpsertOutcome {
    Created,
    Updated,
    Unchanged,
}

/// A record the loader could not apply.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct LoadFailure {
    /// Position of the record in the input
    pub index: usize,
    /// Natural key of the record
    pub key: String,
    /// Error kind, as reported by the API error taxonomy
    pub kind: String,
    pub message: String,
}

/// Summary of a bulk load.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct LoadReport {
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
    #[serde(default)]
    pub failures: Vec<LoadFailure>,
}

impl LoadReport {
    pub fn record(&mut self, outcome: UpsertOutcome) {
        match outcome {
            UpsertOutcome::Created => self.created += 1,
            UpsertOutcome::Updated => self.updated += 1,
            UpsertOutcome::Unchanged => self.unchanged += 1,
        }
    }

    pub fn fail(&mut self, index: usize, key: impl Into<String>, error: &AppError) {
        self.failures.push(LoadFailure {
            index,
            key: key.into(),
            kind: error.kind().to_string(),
            message: error.to_string(),
        });
    }

    pub fn processed(&self) -> usize {
        self.created + self.updated + self.unchanged + self.failures.len()
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

impl std::fmt::Display for LoadReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} created, {} updated, {} unchanged, {} failed",
            self.created,
            self.updated,
            self.unchanged,
            self.failures.len()
        )
    }
}
