//! Reservation model and its lifecycle

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Reservation lifecycle state.
///
/// `Requested` only exists while a reservation is being created; it is never
/// stored. `Returned` and `Cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "reservation_state", rename_all = "lowercase")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReservationState {
    Requested,
    Active,
    Returned,
    Cancelled,
}

impl ReservationState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationState::Requested => "requested",
            ReservationState::Active => "active",
            ReservationState::Returned => "returned",
            ReservationState::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ReservationState::Returned | ReservationState::Cancelled)
    }

    /// Compute the state reached by releasing a reservation with `release`.
    ///
    /// Only an active reservation can be released, and only into a terminal state.
    pub fn release(self, release: Release) -> AppResult<ReservationState> {
        match self {
            ReservationState::Active => Ok(release.target()),
            other => Err(AppError::InvalidState(format!(
                "cannot {} a reservation in state {}",
                release.verb(),
                other.as_str()
            ))),
        }
    }
}

impl std::fmt::Display for ReservationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The two ways an active reservation ends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Release {
    Return,
    Cancel,
}

impl Release {
    pub fn target(self) -> ReservationState {
        match self {
            Release::Return => ReservationState::Returned,
            Release::Cancel => ReservationState::Cancelled,
        }
    }

    pub fn verb(self) -> &'static str {
        match self {
            Release::Return => "return",
            Release::Cancel => "cancel",
        }
    }
}

/// Reservation record as stored
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Reservation {
    pub id: Uuid,
    pub book_id: Uuid,
    pub requester_id: String,
    pub state: ReservationState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Reservation {
    pub fn is_active(&self) -> bool {
        self.state == ReservationState::Active
    }
}

/// Pagination for reservation listings
#[derive(Debug, Clone, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct ReservationQuery {
    pub offset: Option<i64>,
    pub limit: Option<i64>,
}

impl ReservationQuery {
    pub const DEFAULT_LIMIT: i64 = 20;

    /// Resolve offset and limit, refusing negative values
    pub fn resolve(&self) -> AppResult<(i64, i64)> {
        let offset = self.offset.unwrap_or(0);
        let limit = self.limit.unwrap_or(Self::DEFAULT_LIMIT);
        if offset < 0 || limit < 0 {
            return Err(AppError::Validation(
                "query parameters 'limit' and 'offset' cannot be negative".to_string(),
            ));
        }
        Ok((offset, limit))
    }
}

/// One page of reservations for a book
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReservationPage {
    pub total_count: i64,
    pub items: Vec<Reservation>,
}
