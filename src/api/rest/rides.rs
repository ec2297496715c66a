use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::{Path, State};
use axum::routing::{get, post};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::engine::lifecycle::{self, CreateRideRequest};
use crate::error::AppError;
use crate::models::driver::VehicleClass;
use crate::models::ride::{Place, Ride, RiderView};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/rides", post(create_ride))
        .route("/rides/quote", post(quote_ride))
        .route("/rides/:id", get(get_ride))
        .route("/rides/:id/confirm", post(confirm_ride))
        .route("/rides/:id/start", post(start_ride))
        .route("/rides/:id/end", post(end_ride))
        .route("/rides/:id/cancel", post(cancel_ride))
}

#[derive(Deserialize)]
pub struct QuoteRequest {
    pub pickup: Place,
    pub destination: Place,
}

#[derive(Serialize)]
pub struct QuoteEntry {
    pub vehicle_class: VehicleClass,
    pub fare: f64,
}

#[derive(Deserialize)]
pub struct ConfirmRideRequest {
    pub driver_id: Uuid,
}

#[derive(Deserialize)]
pub struct StartRideRequest {
    pub driver_id: Uuid,
    pub otp: String,
}

#[derive(Deserialize)]
pub struct EndRideRequest {
    pub driver_id: Uuid,
}

#[derive(Deserialize)]
pub struct CancelRideRequest {
    pub actor_id: Uuid,
    pub reason: Option<String>,
}

async fn create_ride(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateRideRequest>,
) -> Result<Json<RiderView>, AppError> {
    let ride = lifecycle::create_ride(&state, payload)?;
    Ok(Json(ride.into_rider_view()))
}

async fn quote_ride(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<QuoteRequest>,
) -> Result<Json<Vec<QuoteEntry>>, AppError> {
    let quotes = lifecycle::estimate_quotes(&state, &payload.pickup, &payload.destination)?;

    Ok(Json(
        quotes
            .into_iter()
            .map(|(vehicle_class, fare)| QuoteEntry {
                vehicle_class,
                fare,
            })
            .collect(),
    ))
}

async fn get_ride(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Ride>, AppError> {
    let ride = state
        .rides
        .get(&id)
        .ok_or_else(|| AppError::NotFound(format!("ride {id} not found")))?;

    Ok(Json(ride.value().clone()))
}

async fn confirm_ride(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ConfirmRideRequest>,
) -> Result<Json<Ride>, AppError> {
    let ride = lifecycle::confirm_ride(&state, id, payload.driver_id)?;
    Ok(Json(ride))
}

async fn start_ride(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<StartRideRequest>,
) -> Result<Json<Ride>, AppError> {
    let ride = lifecycle::start_ride(&state, id, payload.driver_id, &payload.otp)?;
    Ok(Json(ride))
}

async fn end_ride(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<EndRideRequest>,
) -> Result<Json<Ride>, AppError> {
    let ride = lifecycle::end_ride(&state, id, payload.driver_id)?;
    Ok(Json(ride))
}

async fn cancel_ride(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CancelRideRequest>,
) -> Result<Json<Ride>, AppError> {
    let ride = lifecycle::cancel_ride(&state, id, payload.actor_id, payload.reason)?;
    Ok(Json(ride))
}
