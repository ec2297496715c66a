use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::{Path, Query, State};
use axum::routing::{get, patch, put};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::driver::{DriverPresence, GeoPoint, VehicleClass};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/drivers/nearby", get(nearby_drivers))
        .route("/drivers/:id/presence", put(update_presence))
        .route("/drivers/:id/status", patch(update_status))
}

#[derive(Deserialize)]
pub struct UpdatePresenceRequest {
    pub location: GeoPoint,
    pub vehicle_class: VehicleClass,
}

#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub online: bool,
}

#[derive(Deserialize)]
pub struct NearbyQuery {
    pub lat: f64,
    pub lng: f64,
    pub radius_km: Option<f64>,
    pub vehicle_class: Option<VehicleClass>,
}

async fn update_presence(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdatePresenceRequest>,
) -> Result<Json<DriverPresence>, AppError> {
    validate_point(&payload.location)?;

    let presence = state
        .directory
        .upsert_presence(id, payload.location, payload.vehicle_class);
    state
        .metrics
        .online_drivers
        .set(state.directory.online_count() as i64);

    Ok(Json(presence))
}

async fn update_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateStatusRequest>,
) -> Result<Json<DriverPresence>, AppError> {
    let presence = state.directory.set_online(id, payload.online)?;
    state
        .metrics
        .online_drivers
        .set(state.directory.online_count() as i64);

    Ok(Json(presence))
}

async fn nearby_drivers(
    State(state): State<Arc<AppState>>,
    Query(query): Query<NearbyQuery>,
) -> Result<Json<Vec<DriverPresence>>, AppError> {
    let center = GeoPoint {
        lat: query.lat,
        lng: query.lng,
    };
    validate_point(&center)?;

    let radius_km = query.radius_km.unwrap_or(state.search_radius_km);
    if !radius_km.is_finite() || radius_km <= 0.0 {
        return Err(AppError::Validation(
            "radius_km must be positive".to_string(),
        ));
    }

    let drivers = state
        .directory
        .find_within_radius(&center, radius_km, query.vehicle_class);

    Ok(Json(drivers))
}

fn validate_point(point: &GeoPoint) -> Result<(), AppError> {
    if !point.lat.is_finite()
        || !point.lng.is_finite()
        || point.lat.abs() > 90.0
        || point.lng.abs() > 180.0
    {
        return Err(AppError::Validation(
            "coordinates out of range".to_string(),
        ));
    }

    Ok(())
}
