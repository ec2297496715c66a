use crate::geo::haversine_km;
use crate::models::driver::{GeoPoint, VehicleClass};

const CAR_BASE: f64 = 50.0;
const CAR_PER_KM: f64 = 15.0;
const CAR_PER_MINUTE: f64 = 2.0;

const MOTO_BASE: f64 = 20.0;
const MOTO_PER_KM: f64 = 8.0;
const MOTO_PER_MINUTE: f64 = 1.0;

const AUTO_BASE: f64 = 30.0;
const AUTO_PER_KM: f64 = 11.0;
const AUTO_PER_MINUTE: f64 = 1.5;

const DEFAULT_AVERAGE_SPEED_KMH: f64 = 30.0;

#[derive(Debug, Clone, Copy)]
pub struct RateCard {
    pub base: f64,
    pub per_km: f64,
    pub per_minute: f64,
}

pub fn rate_card(class: VehicleClass) -> RateCard {
    match class {
        VehicleClass::Car => RateCard {
            base: CAR_BASE,
            per_km: CAR_PER_KM,
            per_minute: CAR_PER_MINUTE,
        },
        VehicleClass::Moto => RateCard {
            base: MOTO_BASE,
            per_km: MOTO_PER_KM,
            per_minute: MOTO_PER_MINUTE,
        },
        VehicleClass::Auto => RateCard {
            base: AUTO_BASE,
            per_km: AUTO_PER_KM,
            per_minute: AUTO_PER_MINUTE,
        },
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RouteEstimate {
    pub distance_meters: f64,
    pub duration_seconds: f64,
}

pub trait RouteEstimator: Send + Sync {
    fn estimate(&self, origin: &GeoPoint, destination: &GeoPoint) -> RouteEstimate;
}

pub struct HaversineEstimator {
    pub average_speed_kmh: f64,
}

impl Default for HaversineEstimator {
    fn default() -> Self {
        Self {
            average_speed_kmh: DEFAULT_AVERAGE_SPEED_KMH,
        }
    }
}

impl RouteEstimator for HaversineEstimator {
    fn estimate(&self, origin: &GeoPoint, destination: &GeoPoint) -> RouteEstimate {
        let distance_km = haversine_km(origin, destination);

        RouteEstimate {
            distance_meters: distance_km * 1000.0,
            duration_seconds: distance_km / self.average_speed_kmh * 3600.0,
        }
    }
}

pub fn quote(route: &RouteEstimate, class: VehicleClass) -> f64 {
    let rate = rate_card(class);
    let distance_km = route.distance_meters / 1000.0;
    let minutes = route.duration_seconds / 60.0;

    round_money(rate.base + rate.per_km * distance_km + rate.per_minute * minutes)
}

pub fn quote_sheet(route: &RouteEstimate) -> Vec<(VehicleClass, f64)> {
    VehicleClass::all()
        .into_iter()
        .map(|class| (class, quote(route, class)))
        .collect()
}

fn round_money(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}
