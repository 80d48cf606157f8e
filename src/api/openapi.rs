//! OpenAPI documentation

use axum::Router;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{admin, auth, books, health, reservations};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Bookshelf API",
        version = "1.0.0",
        description = "Book catalog and reservation REST API"
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Auth
        auth::register,
        auth::login,
        // Books
        books::list_books,
        books::get_book,
        books::create_book,
        books::update_book,
        books::delete_book,
        // Reservations
        reservations::create_reservation,
        reservations::list_book_reservations,
        reservations::get_reservation,
        reservations::return_reservation,
        reservations::cancel_reservation,
        // Admin
        admin::seed_books,
        admin::seed_reservations,
        admin::purge_reservations,
        admin::purge_books,
        admin::purge_all,
    ),
    components(
        schemas(
            // Auth
            auth::LoginResponse,
            auth::UserInfo,
            crate::models::user::LoginRequest,
            crate::models::user::RegisterUser,
            crate::models::user::Role,
            // Books
            books::BookListResponse,
            crate::models::book::Book,
            crate::models::book::BookLinks,
            crate::models::book::BookResponse,
            crate::models::book::CreateBook,
            crate::models::book::UpdateBook,
            crate::models::book::DeletePolicy,
            // Reservations
            reservations::ReservationResponse,
            reservations::ReservationLinks,
            crate::models::reservation::Reservation,
            crate::models::reservation::ReservationState,
            crate::models::reservation::ReservationPage,
            // Admin
            crate::models::load_report::BookSeed,
            crate::models::load_report::ReservationSeed,
            crate::models::load_report::LoadReport,
            crate::models::load_report::LoadFailure,
            crate::models::purge::DeletionSummary,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Authentication endpoints"),
        (name = "books", description = "Book catalog"),
        (name = "reservations", description = "Reservation lifecycle"),
        (name = "admin", description = "Bulk loading and purges")
    )
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
