//! API handlers for Bookshelf REST endpoints

pub mod admin;
pub mod auth;
pub mod books;
pub mod health;
pub mod openapi;
pub mod reservations;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderName},
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    error::AppError,
    models::{purge::Confirmation, user::Identity},
    AppState,
};

/// Header carrying the go-ahead for destructive operations
pub const CONFIRM_HEADER: HeaderName = HeaderName::from_static("x-confirm-delete");

/// Extractor for the authenticated caller identity
pub struct AuthenticatedUser(pub Identity);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::Authentication("Missing authorization header".to_string()))?;

        // Expect exactly "Bearer <token>", scheme case-insensitive
        let mut words = auth_header.split_whitespace();
        let token = match (words.next(), words.next(), words.next()) {
            (Some(scheme), Some(token), None) if scheme.eq_ignore_ascii_case("bearer") => token,
            _ => {
                return Err(AppError::Authentication(
                    "Invalid authorization header format".to_string(),
                ))
            }
        };

        let identity = state.services.auth.resolve_identity(token)?;
        Ok(AuthenticatedUser(identity))
    }
}

/// Extractor for an authenticated administrator
pub struct AdminUser(pub Identity);

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let AuthenticatedUser(identity) = AuthenticatedUser::from_request_parts(parts, state).await?;
        identity.require_admin()?;
        Ok(AdminUser(identity))
    }
}

/// Extractor for the destructive-operation confirmation header.
///
/// Never rejects: a missing or negative header yields `Confirmation::Absent`
/// and the guard decides.
pub struct Confirm(pub Confirmation);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for Confirm {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let confirmed = parts
            .headers
            .get(&CONFIRM_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(|value| matches!(value.trim().to_ascii_lowercase().as_str(), "true" | "yes" | "1"))
            .unwrap_or(false);
        Ok(Confirm(Confirmation::from(confirmed)))
    }
}

/// Create the application router with all routes
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_v1 = Router::new()
        // Health check
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        // Authentication
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        // Books
        .route("/books", get(books::list_books).post(books::create_book))
        .route(
            "/books/:id",
            get(books::get_book).put(books::update_book).delete(books::delete_book),
        )
        // Reservations
        .route(
            "/books/:id/reservations",
            post(reservations::create_reservation).get(reservations::list_book_reservations),
        )
        .route("/reservations/:id", get(reservations::get_reservation))
        .route("/reservations/:id/return", post(reservations::return_reservation))
        .route("/reservations/:id/cancel", post(reservations::cancel_reservation))
        // Bulk loading and purges
        .route("/admin/seed/books", post(admin::seed_books))
        .route("/admin/seed/reservations", post(admin::seed_reservations))
        .route("/admin/reservations", delete(admin::purge_reservations))
        .route("/admin/books", delete(admin::purge_books))
        .route("/admin/all", delete(admin::purge_all))
        .with_state(state);

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(openapi::create_openapi_router())
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors)
}
