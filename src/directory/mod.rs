use chrono::Utc;
use dashmap::DashMap;
use uuid::Uuid;

use crate::error::AppError;
use crate::geo::haversine_km;
use crate::models::driver::{DriverPresence, GeoPoint, VehicleClass};

#[derive(Default)]
pub struct DriverDirectory {
    drivers: DashMap<Uuid, DriverPresence>,
}

impl DriverDirectory {
    pub fn new() -> Self {
        Self {
            drivers: DashMap::new(),
        }
    }

    pub fn upsert_presence(
        &self,
        driver_id: Uuid,
        location: GeoPoint,
        vehicle_class: VehicleClass,
    ) -> DriverPresence {
        let mut entry = self.drivers.entry(driver_id).or_insert_with(|| DriverPresence {
            driver_id,
            location,
            vehicle_class,
            online: true,
            updated_at: Utc::now(),
        });

        entry.location = location;
        entry.vehicle_class = vehicle_class;
        entry.updated_at = Utc::now();

        entry.clone()
    }

    pub fn set_online(&self, driver_id: Uuid, online: bool) -> Result<DriverPresence, AppError> {
        let mut presence = self
            .drivers
            .get_mut(&driver_id)
            .ok_or_else(|| AppError::NotFound(format!("driver {driver_id} has no presence")))?;

        presence.online = online;
        presence.updated_at = Utc::now();

        Ok(presence.clone())
    }

    pub fn find_within_radius(
        &self,
        center: &GeoPoint,
        radius_km: f64,
        class_filter: Option<VehicleClass>,
    ) -> Vec<DriverPresence> {
        self.drivers
            .iter()
            .filter_map(|entry| {
                let presence = entry.value();

                if !presence.online {
                    return None;
                }
                if let Some(class) = class_filter {
                    if presence.vehicle_class != class {
                        return None;
                    }
                }
                if haversine_km(center, &presence.location) > radius_km {
                    return None;
                }

                Some(presence.clone())
            })
            .collect()
    }

    pub fn online_count(&self) -> usize {
        self.drivers.iter().filter(|entry| entry.online).count()
    }
}
