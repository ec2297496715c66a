use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::driver::{GeoPoint, VehicleClass};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Place {
    #[serde(default)]
    pub address: String,
    pub location: GeoPoint,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RideStatus {
    Pending,
    Accepted,
    Ongoing,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, Serialize)]
pub struct Ride {
    pub id: Uuid,
    pub rider_id: Uuid,
    pub driver_id: Option<Uuid>,
    pub pickup: Place,
    pub destination: Place,
    pub vehicle_class: VehicleClass,
    pub fare: f64,
    pub final_fare: Option<f64>,
    pub distance_km: Option<f64>,
    pub duration_seconds: Option<i64>,
    // Shared secret for the pickup handoff; serialized only through RiderView.
    #[serde(skip_serializing)]
    pub otp: String,
    pub status: RideStatus,
    pub requested_at: DateTime<Utc>,
    pub accepted_at: Option<DateTime<Utc>>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub cancelled_by: Option<Uuid>,
    pub cancellation_reason: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RiderView {
    #[serde(flatten)]
    pub ride: Ride,
    pub otp: String,
}

impl Ride {
    pub fn into_rider_view(self) -> RiderView {
        let otp = self.otp.clone();
        RiderView { ride: self, otp }
    }
}
