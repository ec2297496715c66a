use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VehicleClass {
    Car,
    Moto,
    Auto,
}

impl VehicleClass {
    pub fn all() -> [VehicleClass; 3] {
        [VehicleClass::Car, VehicleClass::Moto, VehicleClass::Auto]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverPresence {
    pub driver_id: Uuid,
    pub location: GeoPoint,
    pub vehicle_class: VehicleClass,
    pub online: bool,
    pub updated_at: DateTime<Utc>,
}
