//! Fleet data: vehicle snapshots, density samples, and the demo feed.

mod entity;
mod simulated;
mod summary;

pub use entity::{
    decode_density_points, decode_entities, DensityPoint, EntityFilter, TrackedEntity,
    VehicleStatus,
};
pub use simulated::SimulatedFleet;
pub use summary::FleetSummary;
