use chrono::Utc;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::dispatch::relay;
use crate::engine::fare;
use crate::engine::otp;
use crate::error::AppError;
use crate::geo::haversine_km;
use crate::models::driver::VehicleClass;
use crate::models::ride::{Place, Ride, RideStatus};
use crate::observability::metrics::Metrics;
use crate::state::AppState;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateRideRequest {
    pub rider_id: Uuid,
    pub pickup: Place,
    pub destination: Place,
    pub vehicle_class: VehicleClass,
    pub driver_id: Option<Uuid>,
}

pub fn create_ride(state: &AppState, request: CreateRideRequest) -> Result<Ride, AppError> {
    validate_place("pickup", &request.pickup)?;
    validate_place("destination", &request.destination)?;

    let route = state
        .estimator
        .estimate(&request.pickup.location, &request.destination.location);
    let quoted_fare = fare::quote(&route, request.vehicle_class);

    let ride = Ride {
        id: Uuid::new_v4(),
        rider_id: request.rider_id,
        driver_id: None,
        pickup: request.pickup,
        destination: request.destination,
        vehicle_class: request.vehicle_class,
        fare: quoted_fare,
        final_fare: None,
        distance_km: None,
        duration_seconds: None,
        otp: otp::generate(),
        status: RideStatus::Pending,
        requested_at: Utc::now(),
        accepted_at: None,
        started_at: None,
        completed_at: None,
        cancelled_at: None,
        cancelled_by: None,
        cancellation_reason: None,
    };

    state.rides.insert(ride.id, ride.clone());
    state.metrics.rides_created_total.inc();

    info!(
        ride_id = %ride.id,
        rider_id = %ride.rider_id,
        fare = ride.fare,
        "ride requested"
    );

    relay::offer_ride(state, &ride, request.driver_id);

    Ok(ride)
}

pub fn confirm_ride(state: &AppState, ride_id: Uuid, driver_id: Uuid) -> Result<Ride, AppError> {
    let result = do_confirm(state, ride_id, driver_id);
    track(&state.metrics, "confirm", &result);

    if let Ok(ride) = &result {
        info!(ride_id = %ride.id, driver_id = %driver_id, "ride confirmed");
        relay::notify_rider(state, ride, relay::RIDE_CONFIRMED);
    }

    result
}

fn do_confirm(state: &AppState, ride_id: Uuid, driver_id: Uuid) -> Result<Ride, AppError> {
    let mut entry = state
        .rides
        .get_mut(&ride_id)
        .ok_or_else(|| AppError::NotFound(format!("ride {ride_id} not found")))?;
    let ride = entry.value_mut();

    // The entry guard makes the status check and driver bind one atomic step;
    // the loser of a concurrent confirm observes Accepted here.
    match ride.status {
        RideStatus::Pending => {}
        RideStatus::Accepted => {
            state.metrics.confirm_conflicts_total.inc();
            return Err(AppError::AlreadyTaken);
        }
        current => return Err(AppError::InvalidState { current }),
    }

    ride.driver_id = Some(driver_id);
    ride.status = RideStatus::Accepted;
    ride.accepted_at = Some(Utc::now());

    Ok(ride.clone())
}

pub fn start_ride(
    state: &AppState,
    ride_id: Uuid,
    driver_id: Uuid,
    supplied_otp: &str,
) -> Result<Ride, AppError> {
    let result = do_start(state, ride_id, driver_id, supplied_otp);
    track(&state.metrics, "start", &result);

    if let Ok(ride) = &result {
        info!(ride_id = %ride.id, driver_id = %driver_id, "ride started");
        relay::notify_rider(state, ride, relay::RIDE_STARTED);
    }

    result
}

fn do_start(
    state: &AppState,
    ride_id: Uuid,
    driver_id: Uuid,
    supplied_otp: &str,
) -> Result<Ride, AppError> {
    let mut entry = state
        .rides
        .get_mut(&ride_id)
        .ok_or_else(|| AppError::NotFound(format!("ride {ride_id} not found")))?;
    let ride = entry.value_mut();

    if ride.status != RideStatus::Accepted || ride.driver_id != Some(driver_id) {
        return Err(AppError::InvalidState {
            current: ride.status,
        });
    }

    if supplied_otp.trim() != ride.otp {
        return Err(AppError::OtpMismatch);
    }

    ride.status = RideStatus::Ongoing;
    ride.started_at = Some(Utc::now());

    Ok(ride.clone())
}

pub fn end_ride(state: &AppState, ride_id: Uuid, driver_id: Uuid) -> Result<Ride, AppError> {
    let result = do_end(state, ride_id, driver_id);
    track(&state.metrics, "end", &result);

    if let Ok(ride) = &result {
        info!(
            ride_id = %ride.id,
            driver_id = %driver_id,
            fare = ride.final_fare,
            "ride completed; record handed to earnings"
        );
        relay::notify_rider(state, ride, relay::RIDE_ENDED);
    }

    result
}

fn do_end(state: &AppState, ride_id: Uuid, driver_id: Uuid) -> Result<Ride, AppError> {
    let mut entry = state
        .rides
        .get_mut(&ride_id)
        .ok_or_else(|| AppError::NotFound(format!("ride {ride_id} not found")))?;
    let ride = entry.value_mut();

    if ride.status != RideStatus::Ongoing || ride.driver_id != Some(driver_id) {
        return Err(AppError::InvalidState {
            current: ride.status,
        });
    }

    let now = Utc::now();
    ride.status = RideStatus::Completed;
    ride.completed_at = Some(now);
    ride.duration_seconds = ride
        .started_at
        .map(|started| (now - started).num_seconds().max(0));
    ride.distance_km = Some(haversine_km(
        &ride.pickup.location,
        &ride.destination.location,
    ));
    ride.final_fare = Some(ride.fare);

    Ok(ride.clone())
}

pub fn cancel_ride(
    state: &AppState,
    ride_id: Uuid,
    actor_id: Uuid,
    reason: Option<String>,
) -> Result<Ride, AppError> {
    let result = do_cancel(state, ride_id, actor_id, reason);
    track(&state.metrics, "cancel", &result);

    if let Ok(ride) = &result {
        info!(ride_id = %ride.id, actor_id = %actor_id, "ride cancelled");
        relay::notify_parties(state, ride, relay::RIDE_CANCELLED);
    }

    result
}

fn do_cancel(
    state: &AppState,
    ride_id: Uuid,
    actor_id: Uuid,
    reason: Option<String>,
) -> Result<Ride, AppError> {
    let mut entry = state
        .rides
        .get_mut(&ride_id)
        .ok_or_else(|| AppError::NotFound(format!("ride {ride_id} not found")))?;
    let ride = entry.value_mut();

    match ride.status {
        RideStatus::Pending | RideStatus::Accepted | RideStatus::Ongoing => {}
        current => return Err(AppError::InvalidState { current }),
    }

    ride.status = RideStatus::Cancelled;
    ride.cancelled_at = Some(Utc::now());
    ride.cancelled_by = Some(actor_id);
    ride.cancellation_reason = reason;

    Ok(ride.clone())
}

pub fn estimate_quotes(
    state: &AppState,
    pickup: &Place,
    destination: &Place,
) -> Result<Vec<(VehicleClass, f64)>, AppError> {
    validate_place("pickup", pickup)?;
    validate_place("destination", destination)?;

    let route = state
        .estimator
        .estimate(&pickup.location, &destination.location);

    Ok(fare::quote_sheet(&route))
}

fn validate_place(label: &str, place: &Place) -> Result<(), AppError> {
    let point = place.location;

    if !point.lat.is_finite() || !point.lng.is_finite() {
        return Err(AppError::Validation(format!(
            "{label} coordinates must be finite"
        )));
    }

    if point.lat.abs() > 90.0 || point.lng.abs() > 180.0 {
        return Err(AppError::Validation(format!(
            "{label} coordinates out of range"
        )));
    }

    Ok(())
}

fn track(metrics: &Metrics, transition: &str, result: &Result<Ride, AppError>) {
    let outcome = if result.is_ok() { "success" } else { "error" };
    metrics
        .ride_transitions_total
        .with_label_values(&[transition, outcome])
        .inc();
}
