//! Simulated fleet feed for running the workbench without a backend.
//!
//! Vehicles are laid out deterministically around a center point. Every
//! fetch advances the simulation one step: vehicles in use drive along
//! small loops while the rest stay parked.

use super::{TrackedEntity, VehicleStatus};
use crate::geo::GeoPoint;
use crate::live::{EntitySource, FetchError};
use futures_util::future::{self, FutureExt, LocalBoxFuture};
use serde_json::{json, Map, Value};
use std::cell::Cell;

const MODELS: &[(&str, &str, &str)] = &[
    ("Toyota", "Camry", "SEDAN"),
    ("Ford", "Explorer", "SUV"),
    ("Mercedes", "Sprinter", "VAN"),
    ("Tesla", "Model 3", "SEDAN"),
    ("Volvo", "FH16", "TRUCK"),
    ("Honda", "CB500", "BIKE"),
];

/// Deterministic fleet generator.
pub struct SimulatedFleet {
    center: GeoPoint,
    vehicle_count: usize,
    with_intensity: bool,
    /// Every n-th fetch fails, to exercise stale-data handling.
    fail_every: Option<u64>,
    step: Cell<u64>,
}

impl SimulatedFleet {
    pub fn new(center: GeoPoint, vehicle_count: usize) -> Self {
        Self {
            center,
            vehicle_count,
            with_intensity: false,
            fail_every: None,
            step: Cell::new(0),
        }
    }

    /// Attach heatmap intensities to every vehicle.
    pub fn with_intensity(mut self, enabled: bool) -> Self {
        self.with_intensity = enabled;
        self
    }

    pub fn with_failures_every(mut self, n: u64) -> Self {
        self.fail_every = (n > 0).then_some(n);
        self
    }

    /// Number of fetches served so far, failed ones included.
    pub fn steps(&self) -> u64 {
        self.step.get()
    }

    /// Produces the fleet at the given simulation step.
    pub fn snapshot(&self, step: u64) -> Vec<TrackedEntity> {
        (0..self.vehicle_count)
            .map(|i| self.vehicle(i, step))
            .collect()
    }

    fn vehicle(&self, index: usize, step: u64) -> TrackedEntity {
        let seed = index as f64;
        let status = match index % 7 {
            0 | 3 | 5 => VehicleStatus::InUse,
            1 | 4 => VehicleStatus::Available,
            2 => VehicleStatus::Maintenance,
            _ => VehicleStatus::OutOfService,
        };

        // Spread the home positions on a sunflower spiral (~8 km across)
        let angle = seed * 2.399_963;
        let radius = 0.075 * ((seed + 0.5) / self.vehicle_count.max(1) as f64).sqrt();
        let home_lat = self.center.latitude + radius * angle.sin();
        let home_lng = self.center.longitude + radius * angle.cos() * 1.3;

        let (lat, lng, speed) = if status == VehicleStatus::InUse {
            let phase = seed + step as f64 * 0.35;
            let loop_radius = 0.004 + 0.001 * (index % 3) as f64;
            let speed = 18.0 + 14.0 * (0.5 + 0.5 * (seed * 1.7 + step as f64 * 0.2).sin());
            (
                home_lat + loop_radius * phase.sin(),
                home_lng + loop_radius * phase.cos(),
                speed,
            )
        } else {
            (home_lat, home_lng, 0.0)
        };

        let position = GeoPoint {
            latitude: lat.clamp(-90.0, 90.0),
            longitude: lng.clamp(-180.0, 180.0),
        };
        let (make, model, kind) = MODELS[index % MODELS.len()];

        let mut entity = TrackedEntity::new(format!("V{}", index + 1), position, status).with_speed(speed);
        if self.with_intensity {
            let intensity = 50.0 + 50.0 * (seed * 0.9 + step as f64 * 0.15).sin();
            entity = entity.with_intensity(intensity);
        }
        if make == "Tesla" {
            entity.battery_level = Some(100.0 - ((step + index as u64) % 60) as f64);
        } else {
            entity.fuel_level = Some(90.0 - ((step + index as u64 * 3) % 70) as f64);
        }
        entity.metadata = metadata(make, model, kind, index);
        entity
    }
}

fn metadata(make: &str, model: &str, kind: &str, index: usize) -> Map<String, Value> {
    let value = json!({
        "manufacturer": make,
        "model": model,
        "type": kind,
        "vehicleNumber": format!("NF-{:04}", 1001 + index),
    });
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

impl EntitySource for SimulatedFleet {
    fn fetch(&self) -> LocalBoxFuture<'_, Result<Vec<TrackedEntity>, FetchError>> {
        let step = self.step.get() + 1;
        self.step.set(step);

        let result = match self.fail_every {
            Some(n) if step % n == 0 => Err(FetchError::Transport(format!(
                "simulated outage on fetch {}",
                step
            ))),
            _ => Ok(self.snapshot(step)),
        };
        future::ready(result).boxed_local()
    }
}
