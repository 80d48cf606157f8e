//! Books repository for database operations

use chrono::Utc;
use sqlx::{FromRow, Pool, Postgres, Row};
use uuid::Uuid;

use super::{constraint_conflict, lock_tables};
use crate::{
    error::{AppError, AppResult},
    models::{
        book::{Book, CreateBook, DeletePolicy, UpdateBook},
        load_report::{BookSeed, UpsertOutcome},
        purge::DeletionSummary,
    },
};

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    // =========================================================================
    // READ
    // =========================================================================

    /// Get book by ID
    pub async fn get_by_id(&self, id: Uuid) -> AppResult<Book> {
        sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    /// All books, oldest first
    pub async fn list(&self) -> AppResult<Vec<Book>> {
        let books = sqlx::query_as::<_, Book>("SELECT * FROM books ORDER BY created_at, id")
            .fetch_all(&self.pool)
            .await?;
        Ok(books)
    }

    pub async fn exists(&self, id: Uuid) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM books WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    pub async fn find_by_external_id(&self, external_id: &str) -> AppResult<Option<Book>> {
        let book = sqlx::query_as::<_, Book>("SELECT * FROM books WHERE external_id = $1")
            .bind(external_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(book)
    }

    // =========================================================================
    // WRITE
    // =========================================================================

    /// Create a new book
    pub async fn create(&self, book: &CreateBook) -> AppResult<Book> {
        let now = Utc::now();

        sqlx::query_as::<_, Book>(
            r#"
            INSERT INTO books (id, external_id, title, author, synopsis, available, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, TRUE, $6, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&book.external_id)
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.synopsis)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            constraint_conflict(e, || {
                format!(
                    "A book with external id {} already exists",
                    book.external_id.as_deref().unwrap_or_default()
                )
            })
        })
    }

    /// Update descriptive fields; availability is never written here
    pub async fn update(&self, id: Uuid, update: &UpdateBook) -> AppResult<Book> {
        sqlx::query_as::<_, Book>(
            r#"
            UPDATE books
            SET title = COALESCE($2, title),
                author = COALESCE($3, author),
                synopsis = COALESCE($4, synopsis),
                updated_at = $5
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&update.title)
        .bind(&update.author)
        .bind(&update.synopsis)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    /// Insert or update by external id.
    ///
    /// The update branch only fires when a descriptive field differs, so
    /// re-applying the same seed leaves the row (and `updated_at`) untouched.
    pub async fn upsert(&self, seed: &BookSeed) -> AppResult<(Book, UpsertOutcome)> {
        let row = sqlx::query(
            r#"
            INSERT INTO books (id, external_id, title, author, synopsis, available, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, TRUE, $6, $6)
            ON CONFLICT (external_id) DO UPDATE
            SET title = EXCLUDED.title,
                author = EXCLUDED.author,
                synopsis = EXCLUDED.synopsis,
                updated_at = EXCLUDED.updated_at
            WHERE (books.title, books.author, books.synopsis)
                IS DISTINCT FROM (EXCLUDED.title, EXCLUDED.author, EXCLUDED.synopsis)
            RETURNING *, (xmax = 0) AS inserted
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&seed.external_id)
        .bind(&seed.title)
        .bind(&seed.author)
        .bind(&seed.synopsis)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                let book = Book::from_row(&row)?;
                let inserted: bool = row.try_get("inserted")?;
                let outcome = if inserted {
                    UpsertOutcome::Created
                } else {
                    UpsertOutcome::Updated
                };
                Ok((book, outcome))
            }
            None => {
                let book = self.find_by_external_id(&seed.external_id).await?.ok_or_else(|| {
                    AppError::NotFound(format!(
                        "Book with external id {} disappeared during upsert",
                        seed.external_id
                    ))
                })?;
                Ok((book, UpsertOutcome::Unchanged))
            }
        }
    }

    // =========================================================================
    // DELETE
    // =========================================================================

    /// Hard delete one book and its reservation history
    pub async fn delete(&self, id: Uuid, policy: DeletePolicy) -> AppResult<DeletionSummary> {
        let mut tx = self.pool.begin().await?;

        // Same lock order as reservation writes: book row first
        let found: Option<Uuid> = sqlx::query_scalar("SELECT id FROM books WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        if found.is_none() {
            return Err(AppError::NotFound(format!("Book with id {} not found", id)));
        }

        let reserved: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM reservations WHERE book_id = $1 AND state = 'active')",
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        if reserved && policy == DeletePolicy::Reject {
            return Err(AppError::Conflict(format!(
                "Book {} has an active reservation; delete with cascade to remove it",
                id
            )));
        }

        let reservations = sqlx::query("DELETE FROM reservations WHERE book_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let books = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;

        Ok(DeletionSummary { books, reservations })
    }

    /// Delete every book; refused while reservations exist
    pub async fn delete_all(&self) -> AppResult<DeletionSummary> {
        let mut tx = self.pool.begin().await?;
        lock_tables(&mut tx).await?;

        let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM reservations")
            .fetch_one(&mut *tx)
            .await?;
        if remaining > 0 {
            return Err(AppError::Conflict(format!(
                "{} reservation(s) still reference books; delete reservations first",
                remaining
            )));
        }

        let books = sqlx::query("DELETE FROM books")
            .execute(&mut *tx)
            .await
            .map_err(|e| constraint_conflict(e, || "Reservations still reference books".to_string()))?
            .rows_affected();

        tx.commit().await?;

        Ok(DeletionSummary { books, reservations: 0 })
    }
}
