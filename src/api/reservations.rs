//! Reservation endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::reservation::{Reservation, ReservationPage, ReservationQuery},
};

use super::{AdminUser, AuthenticatedUser};

/// Reservation with navigation links
#[derive(Serialize, ToSchema)]
pub struct ReservationResponse {
    #[serde(flatten)]
    pub reservation: Reservation,
    pub links: ReservationLinks,
}

#[derive(Serialize, ToSchema)]
pub struct ReservationLinks {
    #[serde(rename = "self")]
    pub self_: String,
    pub book: String,
}

impl From<Reservation> for ReservationResponse {
    fn from(reservation: Reservation) -> Self {
        let links = ReservationLinks {
            self_: format!("/reservations/{}", reservation.id),
            book: format!("/books/{}", reservation.book_id),
        };
        Self { reservation, links }
    }
}

/// Reserve a book for the authenticated user
#[utoipa::path(
    post,
    path = "/books/{id}/reservations",
    tag = "reservations",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Book ID")
    ),
    responses(
        (status = 201, description = "Reservation created", body = ReservationResponse),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Book not found"),
        (status = 409, description = "Book already reserved")
    )
)]
pub async fn create_reservation(
    State(state): State<crate::AppState>,
    AuthenticatedUser(identity): AuthenticatedUser,
    Path(book_id): Path<Uuid>,
) -> AppResult<(StatusCode, Json<ReservationResponse>)> {
    let reservation = state
        .services
        .reservations
        .reserve(book_id, &identity.requester_id())
        .await?;

    Ok((StatusCode::CREATED, Json(reservation.into())))
}

/// List reservations of a book (admin only)
#[utoipa::path(
    get,
    path = "/books/{id}/reservations",
    tag = "reservations",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Book ID"),
        ReservationQuery
    ),
    responses(
        (status = 200, description = "Reservations of the book", body = ReservationPage),
        (status = 400, description = "Negative offset or limit"),
        (status = 403, description = "Admin privileges required"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn list_book_reservations(
    State(state): State<crate::AppState>,
    AdminUser(_identity): AdminUser,
    Path(book_id): Path<Uuid>,
    Query(query): Query<ReservationQuery>,
) -> AppResult<Json<ReservationPage>> {
    let page = state.services.reservations.list_for_book(book_id, &query).await?;
    Ok(Json(page))
}

/// Get a reservation
#[utoipa::path(
    get,
    path = "/reservations/{id}",
    tag = "reservations",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Reservation ID")
    ),
    responses(
        (status = 200, description = "Reservation", body = ReservationResponse),
        (status = 404, description = "Reservation not found")
    )
)]
pub async fn get_reservation(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_identity): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ReservationResponse>> {
    let reservation = state.services.reservations.get_reservation(id).await?;
    Ok(Json(reservation.into()))
}

/// Return a reserved book
#[utoipa::path(
    post,
    path = "/reservations/{id}/return",
    tag = "reservations",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Reservation ID")
    ),
    responses(
        (status = 200, description = "Reservation returned", body = ReservationResponse),
        (status = 403, description = "Caller is neither the requester nor an admin"),
        (status = 404, description = "Reservation not found"),
        (status = 409, description = "Reservation is not active")
    )
)]
pub async fn return_reservation(
    State(state): State<crate::AppState>,
    AuthenticatedUser(identity): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ReservationResponse>> {
    let reservation = state
        .services
        .reservations
        .return_reservation(id, &identity)
        .await?;
    Ok(Json(reservation.into()))
}

/// Cancel a reservation
#[utoipa::path(
    post,
    path = "/reservations/{id}/cancel",
    tag = "reservations",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Reservation ID")
    ),
    responses(
        (status = 200, description = "Reservation cancelled", body = ReservationResponse),
        (status = 403, description = "Caller is neither the requester nor an admin"),
        (status = 404, description = "Reservation not found"),
        (status = 409, description = "Reservation is not active")
    )
)]
pub async fn cancel_reservation(
    State(state): State<crate::AppState>,
    AuthenticatedUser(identity): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ReservationResponse>> {
    let reservation = state
        .services
        .reservations
        .cancel_reservation(id, &identity)
        .await?;
    Ok(Json(reservation.into()))
}
