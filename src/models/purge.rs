//! Types for destructive operations

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Explicit go-ahead for a destructive operation, supplied separately from
/// the operation's own parameters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Confirmation {
    #[default]
    Absent,
    Confirmed,
}

impl Confirmation {
    pub fn is_confirmed(self) -> bool {
        self == Confirmation::Confirmed
    }
}

impl From<bool> for Confirmation {
    fn from(confirmed: bool) -> Self {
        if confirmed {
            Confirmation::Confirmed
        } else {
            Confirmation::Absent
        }
    }
}

/// Records removed by a destructive operation
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct DeletionSummary {
    pub books: u64,
    pub reservations: u64,
}

impl DeletionSummary {
    pub fn total(&self) -> u64 {
        self.books + self.reservations
    }
}
