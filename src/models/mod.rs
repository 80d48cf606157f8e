//! Data models for Bookshelf

pub mod book;
pub mod load_report;
pub mod purge;
pub mod reservation;
pub mod user;

// Re-export commonly used types
pub use book::{Book, DeletePolicy};
pub use load_report::{LoadReport, UpsertOutcome};
pub use purge::{Confirmation, DeletionSummary};
pub use reservation::{Release, Reservation, ReservationState};
pub use user::{Identity, Role, User};
