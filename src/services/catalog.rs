//! Book catalog service

use uuid::Uuid;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::book::{Book, CreateBook, UpdateBook},
    repository::Repository,
};

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
}

impl CatalogService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// All books
    pub async fn list_books(&self) -> AppResult<Vec<Book>> {
        self.repository.list_books().await
    }

    /// Get book by ID; availability reflects every committed reservation
    pub async fn get_book(&self, id: Uuid) -> AppResult<Book> {
        self.repository.get_book(id).await
    }

    pub async fn book_exists(&self, id: Uuid) -> AppResult<bool> {
        self.repository.book_exists(id).await
    }

    /// Create a new book; it starts available
    pub async fn create_book(&self, book: CreateBook) -> AppResult<Book> {
        book.validate()?;
        let created = self.repository.create_book(&book).await?;
        tracing::info!(book_id = %created.id, title = %created.title, "Book created");
        Ok(created)
    }

    /// Update descriptive fields of a book, whatever its reservation state
    pub async fn update_book(&self, id: Uuid, update: UpdateBook) -> AppResult<Book> {
        update.check()?;
        if update.is_empty() {
            return Err(AppError::Validation("no fields to update".to_string()));
        }
        let updated = self.repository.update_book(id, &update).await?;
        tracing::info!(book_id = %id, "Book updated");
        Ok(updated)
    }
}
