//! Book (catalog) endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{
        book::{BookResponse, CreateBook, DeletePolicy, UpdateBook},
        purge::DeletionSummary,
    },
};

use super::{AdminUser, AuthenticatedUser, Confirm};

/// Book listing with total count
#[derive(Serialize, ToSchema)]
pub struct BookListResponse {
    pub total_count: usize,
    pub items: Vec<BookResponse>,
}

/// List all books
#[utoipa::path(
    get,
    path = "/books",
    tag = "books",
    responses(
        (status = 200, description = "List of books", body = BookListResponse)
    )
)]
pub async fn list_books(State(state): State<crate::AppState>) -> AppResult<Json<BookListResponse>> {
    let books = state.services.catalog.list_books().await?;
    let items: Vec<BookResponse> = books.into_iter().map(BookResponse::from).collect();

    Ok(Json(BookListResponse {
        total_count: items.len(),
        items,
    }))
}

/// Get book details by ID
#[utoipa::path(
    get,
    path = "/books/{id}",
    tag = "books",
    params(
        ("id" = Uuid, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Book details", body = BookResponse),
        (status = 404, description = "Book not found")
    )
)]
pub async fn get_book(
    State(state): State<crate::AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<BookResponse>> {
    let book = state.services.catalog.get_book(id).await?;
    Ok(Json(book.into()))
}

/// Create a new book
#[utoipa::path(
    post,
    path = "/books",
    tag = "books",
    security(("bearer_auth" = [])),
    request_body = CreateBook,
    responses(
        (status = 201, description = "Book created", body = BookResponse),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Not authenticated"),
        (status = 409, description = "External id already used")
    )
)]
pub async fn create_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_identity): AuthenticatedUser,
    Json(book): Json<CreateBook>,
) -> AppResult<(StatusCode, Json<BookResponse>)> {
    let created = state.services.catalog.create_book(book).await?;
    Ok((StatusCode::CREATED, Json(created.into())))
}

/// Update an existing book
#[utoipa::path(
    put,
    path = "/books/{id}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Book ID")
    ),
    request_body = UpdateBook,
    responses(
        (status = 200, description = "Book updated", body = BookResponse),
        (status = 400, description = "Invalid input or attempt to set availability"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn update_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_identity): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(update): Json<UpdateBook>,
) -> AppResult<Json<BookResponse>> {
    let updated = state.services.catalog.update_book(id, update).await?;
    Ok(Json(updated.into()))
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DeleteBookParams {
    /// Also delete an active reservation on the book
    pub cascade: Option<bool>,
}

/// Delete a book
#[utoipa::path(
    delete,
    path = "/books/{id}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Book ID"),
        DeleteBookParams,
        ("x-confirm-delete" = Option<String>, Header, description = "Must be `true`")
    ),
    responses(
        (status = 200, description = "Book deleted", body = DeletionSummary),
        (status = 404, description = "Book not found"),
        (status = 409, description = "Book has an active reservation"),
        (status = 428, description = "Confirmation header missing")
    )
)]
pub async fn delete_book(
    State(state): State<crate::AppState>,
    AdminUser(_identity): AdminUser,
    Confirm(confirmation): Confirm,
    Path(id): Path<Uuid>,
    Query(params): Query<DeleteBookParams>,
) -> AppResult<Json<DeletionSummary>> {
    let policy = DeletePolicy::from_cascade_flag(params.cascade.unwrap_or(false));
    let summary = state
        .services
        .purge
        .delete_book(id, policy, confirmation)
        .await?;
    Ok(Json(summary))
}
