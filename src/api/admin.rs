//! Bulk loading and purge endpoints (admin only)

use axum::{extract::State, Json};

use crate::{
    error::AppResult,
    models::{
        load_report::{BookSeed, LoadReport, ReservationSeed},
        purge::DeletionSummary,
    },
};

use super::{AdminUser, Confirm};

/// Upsert books by external id
#[utoipa::path(
    post,
    path = "/admin/seed/books",
    tag = "admin",
    security(("bearer_auth" = [])),
    request_body = Vec<BookSeed>,
    responses(
        (status = 200, description = "Load report", body = LoadReport),
        (status = 403, description = "Admin privileges required")
    )
)]
pub async fn seed_books(
    State(state): State<crate::AppState>,
    AdminUser(_identity): AdminUser,
    Json(seeds): Json<Vec<BookSeed>>,
) -> AppResult<Json<LoadReport>> {
    let report = state.services.loader.load_books(&seeds).await?;
    Ok(Json(report))
}

/// Create reservations referencing books by external id
#[utoipa::path(
    post,
    path = "/admin/seed/reservations",
    tag = "admin",
    security(("bearer_auth" = [])),
    request_body = Vec<ReservationSeed>,
    responses(
        (status = 200, description = "Load report, with per-record failures", body = LoadReport),
        (status = 403, description = "Admin privileges required")
    )
)]
pub async fn seed_reservations(
    State(state): State<crate::AppState>,
    AdminUser(_identity): AdminUser,
    Json(seeds): Json<Vec<ReservationSeed>>,
) -> AppResult<Json<LoadReport>> {
    let report = state.services.loader.load_reservations(&seeds).await?;
    Ok(Json(report))
}

/// Delete all reservations
#[utoipa::path(
    delete,
    path = "/admin/reservations",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(
        ("x-confirm-delete" = Option<String>, Header, description = "Must be `true`")
    ),
    responses(
        (status = 200, description = "Reservations deleted", body = DeletionSummary),
        (status = 428, description = "Confirmation header missing")
    )
)]
pub async fn purge_reservations(
    State(state): State<crate::AppState>,
    AdminUser(_identity): AdminUser,
    Confirm(confirmation): Confirm,
) -> AppResult<Json<DeletionSummary>> {
    let summary = state.services.purge.purge_reservations(confirmation).await?;
    Ok(Json(summary))
}

/// Delete all books (refused while reservations exist)
#[utoipa::path(
    delete,
    path = "/admin/books",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(
        ("x-confirm-delete" = Option<String>, Header, description = "Must be `true`")
    ),
    responses(
        (status = 200, description = "Books deleted", body = DeletionSummary),
        (status = 409, description = "Reservations still exist"),
        (status = 428, description = "Confirmation header missing")
    )
)]
pub async fn purge_books(
    State(state): State<crate::AppState>,
    AdminUser(_identity): AdminUser,
    Confirm(confirmation): Confirm,
) -> AppResult<Json<DeletionSummary>> {
    let summary = state.services.purge.purge_books(confirmation).await?;
    Ok(Json(summary))
}

/// Delete all reservations and books
#[utoipa::path(
    delete,
    path = "/admin/all",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(
        ("x-confirm-delete" = Option<String>, Header, description = "Must be `true`")
    ),
    responses(
        (status = 200, description = "Everything deleted", body = DeletionSummary),
        (status = 428, description = "Confirmation header missing")
    )
)]
pub async fn purge_all(
    State(state): State<crate::AppState>,
    AdminUser(_identity): AdminUser,
    Confirm(confirmation): Confirm,
) -> AppResult<Json<DeletionSummary>> {
    let summary = state.services.purge.purge_all(confirmation).await?;
    Ok(Json(summary))
}
