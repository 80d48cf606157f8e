//! In-memory store.
//!
//! All state sits behind one async mutex, so each trait method observes and
//! mutates books and reservations as a single unit. Used by tests and by the
//! `memory` backend for local development.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use indexmap::IndexMap;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::Store;
use crate::{
    error::{AppError, AppResult},
    models::{
        book::{Book, CreateBook, DeletePolicy, UpdateBook},
        load_report::{BookSeed, UpsertOutcome},
        purge::DeletionSummary,
        reservation::{Release, Reservation, ReservationState},
        user::{Identity, NewUser, User},
    },
};

#[derive(Default)]
struct MemoryState {
    books: IndexMap<Uuid, Book>,
    reservations: IndexMap<Uuid, Reservation>,
    users: IndexMap<Uuid, User>,
}

impl MemoryState {
    fn book_not_found(id: Uuid) -> AppError {
        AppError::NotFound(format!("Book with id {} not found", id))
    }

    fn reservation_not_found(id: Uuid) -> AppError {
        AppError::NotFound(format!("Reservation with id {} not found", id))
    }

    fn active_for_book(&self, book_id: Uuid) -> Option<&Reservation> {
        self.reservations
            .values()
            .find(|r| r.book_id == book_id && r.is_active())
    }

    fn book_by_external_id(&self, external_id: &str) -> Option<&Book> {
        self.books
            .values()
            .find(|b| b.external_id.as_deref() == Some(external_id))
    }
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn get_book(&self, id: Uuid) -> AppResult<Book> {
        let state = self.state.lock().await;
        state
            .books
            .get(&id)
            .cloned()
            .ok_or_else(|| MemoryState::book_not_found(id))
    }

    async fn list_books(&self) -> AppResult<Vec<Book>> {
        let state = self.state.lock().await;
        Ok(state.books.values().cloned().collect())
    }

    async fn book_exists(&self, id: Uuid) -> AppResult<bool> {
        Ok(self.state.lock().await.books.contains_key(&id))
    }

    async fn find_book_by_external_id(&self, external_id: &str) -> AppResult<Option<Book>> {
        let state = self.state.lock().await;
        Ok(state.book_by_external_id(external_id).cloned())
    }

    async fn create_book(&self, book: &CreateBook) -> AppResult<Book> {
        let mut state = self.state.lock().await;

        if let Some(external_id) = book.external_id.as_deref() {
            if state.book_by_external_id(external_id).is_some() {
                return Err(AppError::Conflict(format!(
                    "A book with external id {} already exists",
                    external_id
                )));
            }
        }

        let now = Utc::now();
        let created = Book {
            id: Uuid::new_v4(),
            external_id: book.external_id.clone(),
            title: book.title.clone(),
            author: book.author.clone(),
            synopsis: book.synopsis.clone(),
            available: true,
            created_at: now,
            updated_at: now,
        };
        state.books.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update_book(&self, id: Uuid, update: &UpdateBook) -> AppResult<Book> {
        let mut state = self.state.lock().await;
        let book = state
            .books
            .get_mut(&id)
            .ok_or_else(|| MemoryState::book_not_found(id))?;

        if let Some(title) = &update.title {
            book.title = title.clone();
        }
        if let Some(author) = &update.author {
            book.author = author.clone();
        }
        if let Some(synopsis) = &update.synopsis {
            book.synopsis = synopsis.clone();
        }
        book.updated_at = Utc::now();

        Ok(book.clone())
    }

    async fn upsert_book(&self, seed: &BookSeed) -> AppResult<(Book, UpsertOutcome)> {
        let mut state = self.state.lock().await;
        let now = Utc::now();

        let existing = state
            .books
            .values_mut()
            .find(|b| b.external_id.as_deref() == Some(seed.external_id.as_str()));

        if let Some(book) = existing {
            if book.title == seed.title && book.author == seed.author && book.synopsis == seed.synopsis {
                return Ok((book.clone(), UpsertOutcome::Unchanged));
            }
            book.title = seed.title.clone();
            book.author = seed.author.clone();
            book.synopsis = seed.synopsis.clone();
            book.updated_at = now;
            return Ok((book.clone(), UpsertOutcome::Updated));
        }

        let created = Book {
            id: Uuid::new_v4(),
            external_id: Some(seed.external_id.clone()),
            title: seed.title.clone(),
            author: seed.author.clone(),
            synopsis: seed.synopsis.clone(),
            available: true,
            created_at: now,
            updated_at: now,
        };
        state.books.insert(created.id, created.clone());
        Ok((created, UpsertOutcome::Created))
    }

    async fn delete_book(&self, id: Uuid, policy: DeletePolicy) -> AppResult<DeletionSummary> {
        let mut state = self.state.lock().await;

        if !state.books.contains_key(&id) {
            return Err(MemoryState::book_not_found(id));
        }
        if state.active_for_book(id).is_some() && policy == DeletePolicy::Reject {
            return Err(AppError::Conflict(format!(
                "Book {} has an active reservation; delete with cascade to remove it",
                id
            )));
        }

        let before = state.reservations.len();
        state.reservations.retain(|_, r| r.book_id != id);
        let reservations = (before - state.reservations.len()) as u64;
        state.books.shift_remove(&id);

        Ok(DeletionSummary { books: 1, reservations })
    }

    async fn get_reservation(&self, id: Uuid) -> AppResult<Reservation> {
        let state = self.state.lock().await;
        state
            .reservations
            .get(&id)
            .cloned()
            .ok_or_else(|| MemoryState::reservation_not_found(id))
    }

    async fn active_reservation_for_book(&self, book_id: Uuid) -> AppResult<Option<Reservation>> {
        let state = self.state.lock().await;
        Ok(state.active_for_book(book_id).cloned())
    }

    async fn list_reservations_for_book(
        &self,
        book_id: Uuid,
        offset: i64,
        limit: i64,
    ) -> AppResult<(Vec<Reservation>, i64)> {
        let state = self.state.lock().await;
        let all: Vec<&Reservation> = state
            .reservations
            .values()
            .filter(|r| r.book_id == book_id)
            .collect();
        let total = all.len() as i64;
        let page = all
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .cloned()
            .collect();
        Ok((page, total))
    }

    async fn count_active_reservations(&self) -> AppResult<i64> {
        let state = self.state.lock().await;
        Ok(state.reservations.values().filter(|r| r.is_active()).count() as i64)
    }

    async fn reserve_book(&self, book_id: Uuid, requester_id: &str) -> AppResult<Reservation> {
        let mut state = self.state.lock().await;

        let available = state
            .books
            .get(&book_id)
            .map(|b| b.available)
            .ok_or_else(|| MemoryState::book_not_found(book_id))?;

        if !available || state.active_for_book(book_id).is_some() {
            return Err(AppError::Conflict(format!("Book {} is already reserved", book_id)));
        }

        let now = Utc::now();
        let reservation = Reservation {
            id: Uuid::new_v4(),
            book_id,
            requester_id: requester_id.to_string(),
            state: ReservationState::Active,
            created_at: now,
            updated_at: now,
        };
        state.reservations.insert(reservation.id, reservation.clone());
        if let Some(book) = state.books.get_mut(&book_id) {
            book.available = false;
        }

        Ok(reservation)
    }

    async fn release_reservation(
        &self,
        id: Uuid,
        release: Release,
        actor: &Identity,
    ) -> AppResult<Reservation> {
        let mut state = self.state.lock().await;

        let reservation = state
            .reservations
            .get_mut(&id)
            .ok_or_else(|| MemoryState::reservation_not_found(id))?;

        actor.require_holder(&reservation.requester_id)?;
        reservation.state = reservation.state.release(release)?;
        reservation.updated_at = Utc::now();
        let released = reservation.clone();

        if let Some(book) = state.books.get_mut(&released.book_id) {
            book.available = true;
        }

        Ok(released)
    }

    async fn delete_all_reservations(&self) -> AppResult<DeletionSummary> {
        let mut state = self.state.lock().await;
        let reservations = state.reservations.len() as u64;
        state.reservations.clear();
        for book in state.books.values_mut() {
            book.available = true;
        }
        Ok(DeletionSummary { books: 0, reservations })
    }

    async fn delete_all_books(&self) -> AppResult<DeletionSummary> {
        let mut state = self.state.lock().await;
        if !state.reservations.is_empty() {
            return Err(AppError::Conflict(format!(
                "{} reservation(s) still reference books; delete reservations first",
                state.reservations.len()
            )));
        }
        let books = state.books.len() as u64;
        state.books.clear();
        Ok(DeletionSummary { books, reservations: 0 })
    }

    async fn delete_everything(&self) -> AppResult<DeletionSummary> {
        let mut state = self.state.lock().await;
        let summary = DeletionSummary {
            books: state.books.len() as u64,
            reservations: state.reservations.len() as u64,
        };
        state.reservations.clear();
        state.books.clear();
        Ok(summary)
    }

    async fn get_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let state = self.state.lock().await;
        Ok(state
            .users
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn insert_user_if_absent(&self, user: &NewUser) -> AppResult<(User, bool)> {
        let mut state = self.state.lock().await;

        if let Some(existing) = state
            .users
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(&user.email))
        {
            return Ok((existing.clone(), false));
        }

        let created = User {
            id: Uuid::new_v4(),
            email: user.email.to_lowercase(),
            password_hash: user.password_hash.clone(),
            role: user.role,
            forenames: user.forenames.clone(),
            surname: user.surname.clone(),
            created_at: Utc::now(),
        };
        state.users.insert(created.id, created.clone());
        Ok((created, true))
    }

    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }
}
