use serde_json::{Value, json};
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::ride::Ride;
use crate::state::AppState;

pub const RIDE_REQUEST_TO_DRIVER: &str = "ride-request-to-driver";
pub const NEW_RIDE: &str = "new-ride";
pub const RIDE_CONFIRMED: &str = "ride-confirmed";
pub const RIDE_STARTED: &str = "ride-started";
pub const RIDE_ENDED: &str = "ride-ended";
pub const RIDE_CANCELLED: &str = "ride-cancelled";

// Delivery is best-effort: a missed push is logged and counted, never raised.
pub fn offer_ride(state: &AppState, ride: &Ride, preselected: Option<Uuid>) {
    match preselected {
        Some(driver_id) => {
            if !state.transport.is_online(driver_id) {
                warn!(
                    ride_id = %ride.id,
                    driver_id = %driver_id,
                    "targeted driver has no connection; offer dropped"
                );
                state
                    .metrics
                    .dispatch_deliveries_total
                    .with_label_values(&[RIDE_REQUEST_TO_DRIVER, "dropped"])
                    .inc();
                return;
            }

            deliver(state, driver_id, RIDE_REQUEST_TO_DRIVER, offer_payload(ride));
        }
        None => {
            let nearby = state.directory.find_within_radius(
                &ride.pickup.location,
                state.search_radius_km,
                Some(ride.vehicle_class),
            );

            if nearby.is_empty() {
                warn!(ride_id = %ride.id, "no eligible drivers in radius; ride stays pending");
                return;
            }

            info!(ride_id = %ride.id, drivers = nearby.len(), "broadcasting ride offer");
            for presence in nearby {
                deliver(state, presence.driver_id, NEW_RIDE, offer_payload(ride));
            }
        }
    }
}

pub fn notify_rider(state: &AppState, ride: &Ride, event: &'static str) {
    deliver(state, ride.rider_id, event, ride_payload(ride));
}

pub fn notify_parties(state: &AppState, ride: &Ride, event: &'static str) {
    deliver(state, ride.rider_id, event, ride_payload(ride));
    if let Some(driver_id) = ride.driver_id {
        deliver(state, driver_id, event, ride_payload(ride));
    }
}

fn deliver(state: &AppState, recipient: Uuid, event: &'static str, payload: Value) {
    let delivered = state.transport.send(recipient, event, payload);

    if !delivered {
        warn!(recipient = %recipient, event, "event not delivered");
    }

    let outcome = if delivered { "delivered" } else { "dropped" };
    state
        .metrics
        .dispatch_deliveries_total
        .with_label_values(&[event, outcome])
        .inc();
}

// Offer payloads never carry the otp.
fn offer_payload(ride: &Ride) -> Value {
    json!({
        "ride_id": ride.id,
        "rider_id": ride.rider_id,
        "pickup": ride.pickup,
        "destination": ride.destination,
        "vehicle_class": ride.vehicle_class,
        "fare": ride.fare,
    })
}

fn ride_payload(ride: &Ride) -> Value {
    serde_json::to_value(ride).unwrap_or_else(|_| json!({ "ride_id": ride.id }))
}
