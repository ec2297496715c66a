use std::sync::Arc;

use dashmap::DashMap;
use uuid::Uuid;

use crate::directory::DriverDirectory;
use crate::dispatch::transport::{ConnectionRegistry, Transport};
use crate::engine::fare::{HaversineEstimator, RouteEstimator};
use crate::models::ride::Ride;
use crate::observability::metrics::Metrics;

pub struct AppState {
    pub rides: DashMap<Uuid, Ride>,
    pub directory: DriverDirectory,
    pub connections: ConnectionRegistry,
    pub transport: Arc<dyn Transport>,
    pub estimator: Arc<dyn RouteEstimator>,
    pub search_radius_km: f64,
    pub metrics: Metrics,
}

impl AppState {
    pub fn new(search_radius_km: f64) -> Self {
        let connections = ConnectionRegistry::new();
        let transport: Arc<dyn Transport> = Arc::new(connections.clone());

        Self {
            rides: DashMap::new(),
            directory: DriverDirectory::new(),
            connections,
            transport,
            estimator: Arc::new(HaversineEstimator::default()),
            search_radius_km,
            metrics: Metrics::new(),
        }
    }

    pub fn with_transport(search_radius_km: f64, transport: Arc<dyn Transport>) -> Self {
        let mut state = Self::new(search_radius_km);
        state.transport = transport;
        state
    }
}
