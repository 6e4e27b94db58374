//! Fleet counts shown next to the map legend.

use super::{TrackedEntity, VehicleStatus};

/// Per-status counts for the current entity set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FleetSummary {
    pub total: usize,
    pub available: usize,
    pub in_use: usize,
    pub maintenance: usize,
    pub out_of_service: usize,
    /// In-use vehicles currently reporting a nonzero speed.
    pub moving: usize,
}

impl FleetSummary {
    pub fn from_entities(entities: &[TrackedEntity]) -> Self {
        entities.iter().fold(Self::default(), |mut summary, entity| {
            summary.total += 1;
            match entity.status {
                VehicleStatus::Available => summary.available += 1,
                VehicleStatus::InUse => summary.in_use += 1,
                VehicleStatus::Maintenance => summary.maintenance += 1,
                VehicleStatus::OutOfService => summary.out_of_service += 1,
            }
            if entity.shows_speed_readout() {
                summary.moving += 1;
            }
            summary
        })
    }

    pub fn count(&self, status: VehicleStatus) -> usize {
        match status {
            VehicleStatus::Available => self.available,
            VehicleStatus::InUse => self.in_use,
            VehicleStatus::Maintenance => self.maintenance,
            VehicleStatus::OutOfService => self.out_of_service,
        }
    }
}
