//! Tracked vehicle snapshots and their wire format.

use crate::geo::GeoPoint;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Operational status reported by the fleet backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VehicleStatus {
    Available,
    InUse,
    Maintenance,
    OutOfService,
}

impl VehicleStatus {
    pub fn label(&self) -> &'static str {
        match self {
            VehicleStatus::Available => "Available",
            VehicleStatus::InUse => "In Use",
            VehicleStatus::Maintenance => "Maintenance",
            VehicleStatus::OutOfService => "Out of Service",
        }
    }

    pub fn all() -> &'static [VehicleStatus] {
        &[
            VehicleStatus::Available,
            VehicleStatus::InUse,
            VehicleStatus::Maintenance,
            VehicleStatus::OutOfService,
        ]
    }

    /// Parses the backend's status string. Unknown values map to
    /// `OutOfService`, which renders with the neutral color.
    pub fn from_wire(status: &str) -> Self {
        match status.trim().to_ascii_uppercase().as_str() {
            "AVAILABLE" => VehicleStatus::Available,
            "IN_USE" => VehicleStatus::InUse,
            "MAINTENANCE" => VehicleStatus::Maintenance,
            _ => VehicleStatus::OutOfService,
        }
    }
}

/// A value snapshot of one vehicle.
///
/// Identity is the `id`; a fresh fetch produces new snapshots that are
/// matched to earlier ones (and to the selection) by id only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackedEntity {
    pub id: String,
    pub position: GeoPoint,
    pub status: VehicleStatus,
    /// Ground speed in mph, never negative.
    pub speed: f64,
    /// Heatmap intensity in [0, 100], present only in heatmap feeds.
    pub intensity: Option<f64>,
    pub battery_level: Option<f64>,
    pub fuel_level: Option<f64>,
    /// Every other field the backend sent, untouched.
    pub metadata: Map<String, Value>,
}

impl TrackedEntity {
    pub fn new(id: impl Into<String>, position: GeoPoint, status: VehicleStatus) -> Self {
        Self {
            id: id.into(),
            position,
            status,
            speed: 0.0,
            intensity: None,
            battery_level: None,
            fuel_level: None,
            metadata: Map::new(),
        }
    }

    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = sanitize_speed(speed);
        self
    }

    pub fn with_intensity(mut self, intensity: f64) -> Self {
        self.intensity = Some(clamp_intensity(intensity));
        self
    }

    /// Moving vehicles in use carry a speed badge next to their marker.
    pub fn shows_speed_readout(&self) -> bool {
        self.status == VehicleStatus::InUse && self.speed > 0.0
    }

    pub fn speed_readout(&self) -> String {
        format!("{:.0} mph", self.speed)
    }

    /// Human-readable name, falling back to the id.
    pub fn display_name(&self) -> String {
        let text = |key: &str| self.metadata.get(key).and_then(Value::as_str);
        match (text("manufacturer"), text("model")) {
            (Some(make), Some(model)) => format!("{} {}", make, model),
            _ => text("vehicleNumber").unwrap_or(&self.id).to_string(),
        }
    }

    /// Label/value rows for the selected-vehicle card.
    pub fn info_rows(&self) -> Vec<(&'static str, String)> {
        let mut rows = vec![
            ("Status", self.status.label().to_string()),
            ("Location", self.position.display_short()),
            ("Speed", format!("{:.1} mph", self.speed)),
        ];
        if let Some(intensity) = self.intensity {
            rows.push(("Intensity", format!("{:.0}", intensity)));
        }
        if let Some(battery) = self.battery_level {
            rows.push(("Battery", format!("{:.0}%", battery)));
        } else if let Some(fuel) = self.fuel_level {
            rows.push(("Fuel", format!("{:.0}%", fuel)));
        }
        rows
    }
}

/// A geolocated intensity sample drawn as a soft radial "heat" spot.
///
/// Built through [`DensityPoint::new`] or [`decode_density_points`], both of
/// which clamp the intensity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DensityPoint {
    pub position: GeoPoint,
    /// In [0, 100].
    pub intensity: f64,
}

impl DensityPoint {
    pub fn new(position: GeoPoint, intensity: f64) -> Self {
        Self {
            position,
            intensity: clamp_intensity(intensity),
        }
    }

    /// Density samples for every entity that carries an intensity.
    pub fn from_entities(entities: &[TrackedEntity]) -> Vec<DensityPoint> {
        entities
            .iter()
            .filter_map(|e| e.intensity.map(|i| DensityPoint::new(e.position, i)))
            .collect()
    }
}

/// Restricts which entities reach the map.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityFilter {
    #[default]
    All,
    Statuses(Vec<VehicleStatus>),
}

impl EntityFilter {
    /// Only vehicles that can be booked or are on a trip.
    pub fn active_only() -> Self {
        EntityFilter::Statuses(vec![VehicleStatus::Available, VehicleStatus::InUse])
    }

    pub fn accepts(&self, entity: &TrackedEntity) -> bool {
        match self {
            EntityFilter::All => true,
            EntityFilter::Statuses(allowed) => allowed.contains(&entity.status),
        }
    }

    pub fn apply(&self, entities: Vec<TrackedEntity>) -> Vec<TrackedEntity> {
        match self {
            EntityFilter::All => entities,
            EntityFilter::Statuses(_) => entities.into_iter().filter(|e| self.accepts(e)).collect(),
        }
    }
}

fn clamp_intensity(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 100.0)
    } else {
        0.0
    }
}

fn sanitize_speed(value: f64) -> f64 {
    if value.is_finite() {
        value.max(0.0)
    } else {
        0.0
    }
}

// ============================================================================
// Wire format
// ============================================================================

/// Vehicle record as served by the fleet REST API.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireVehicle {
    #[serde(default)]
    id: Option<Value>,
    /// Dashboard records carry the plate-style id here, sometimes next to `id`.
    #[serde(default)]
    vehicle_id: Option<Value>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    speed: Option<f64>,
    #[serde(default)]
    intensity: Option<f64>,
    #[serde(default)]
    battery_level: Option<f64>,
    #[serde(default)]
    fuel_level: Option<f64>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl WireVehicle {
    fn into_entity(self) -> Option<TrackedEntity> {
        let id = match self.id.or(self.vehicle_id)? {
            Value::String(s) => s,
            Value::Number(n) => n.to_string(),
            _ => return None,
        };
        let position = GeoPoint::new(self.latitude?, self.longitude?).ok()?;
        let status = self
            .status
            .as_deref()
            .map(VehicleStatus::from_wire)
            // Heatmap feeds carry no status; those vehicles are on the road
            .unwrap_or(VehicleStatus::InUse);

        Some(TrackedEntity {
            id,
            position,
            status,
            speed: sanitize_speed(self.speed.unwrap_or(0.0)),
            intensity: self.intensity.map(clamp_intensity),
            battery_level: self.battery_level,
            fuel_level: self.fuel_level,
            metadata: self.extra,
        })
    }
}

#[derive(Debug, Deserialize)]
struct WireDensity {
    latitude: f64,
    longitude: f64,
    intensity: f64,
}

/// Decodes a JSON array of vehicles.
///
/// Records without usable coordinates or id are dropped rather than failing
/// the whole batch.
pub fn decode_entities(json: &str) -> Result<Vec<TrackedEntity>, serde_json::Error> {
    let records: Vec<Value> = serde_json::from_str(json)?;
    let total = records.len();
    let entities: Vec<TrackedEntity> = records
        .into_iter()
        .filter_map(|record| match serde_json::from_value::<WireVehicle>(record) {
            Ok(wire) => wire.into_entity(),
            Err(e) => {
                log::debug!("Skipping malformed vehicle record: {}", e);
                None
            }
        })
        .collect();
    if entities.len() < total {
        log::debug!(
            "Dropped {} of {} vehicle records without usable id or position",
            total - entities.len(),
            total
        );
    }
    Ok(entities)
}

/// Decodes a JSON array of trip density samples.
pub fn decode_density_points(json: &str) -> Result<Vec<DensityPoint>, serde_json::Error> {
    let records: Vec<Value> = serde_json::from_str(json)?;
    Ok(records
        .into_iter()
        .filter_map(|record| serde_json::from_value::<WireDensity>(record).ok())
        .filter_map(|r| {
            GeoPoint::new(r.latitude, r.longitude)
                .ok()
                .map(|p| DensityPoint::new(p, r.intensity))
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_vehicle_records() {
        let json = r#"[
            {"id": 7, "latitude": 40.71, "longitude": -74.0, "status": "IN_USE",
             "speed": 31.6, "batteryLevel": 80, "manufacturer": "Tesla", "model": "Model 3"},
            {"id": "V2", "latitude": null, "longitude": -74.0, "status": "AVAILABLE"},
            {"vehicleId": "H1", "latitude": 40.8, "longitude": -73.95, "intensity": 140}
        ]"#;

        let entities = decode_entities(json).unwrap();
        assert_eq!(entities.len(), 2);

        let first = &entities[0];
        assert_eq!(first.id, "7");
        assert_eq!(first.status, VehicleStatus::InUse);
        assert_eq!(first.battery_level, Some(80.0));
        assert_eq!(first.display_name(), "Tesla Model 3");
        assert!(first.shows_speed_readout());
        assert_eq!(first.speed_readout(), "32 mph");

        let heat = &entities[1];
        assert_eq!(heat.id, "H1");
        assert_eq!(heat.intensity, Some(100.0));
    }

    #[test]
    fn test_malformed_records_do_not_sink_the_batch() {
        let json = r#"[
            {"id": "V1", "latitude": 40.71, "longitude": -74.0, "status": "AVAILABLE"},
            {"latitude": 40.72, "longitude": -74.01, "status": "AVAILABLE"},
            {"id": "V3", "latitude": "40.72", "longitude": -74.01},
            {"id": "V4", "latitude": 40.73, "longitude": -74.02, "speed": "fast"},
            {"id": "V5", "latitude": 40.74, "longitude": -74.03, "status": "IN_USE"}
        ]"#;

        let entities = decode_entities(json).unwrap();
        let ids: Vec<_> = entities.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["V1", "V5"]);
    }

    #[test]
    fn test_id_and_vehicle_id_in_one_record() {
        let json = r#"[
            {"id": 7, "vehicleId": "NF-1007", "vehicleNumber": "NF-1007",
             "latitude": 40.71, "longitude": -74.0, "status": "IN_USE"},
            {"vehicleId": "NF-1008", "latitude": 40.72, "longitude": -74.0}
        ]"#;

        let entities = decode_entities(json).unwrap();
        assert_eq!(entities.len(), 2);
        assert_eq!(entities[0].id, "7");
        assert_eq!(entities[0].metadata.get("vehicleNumber"), Some(&Value::from("NF-1007")));
        assert_eq!(entities[1].id, "NF-1008");
    }

    #[test]
    fn test_non_array_payload_is_an_error() {
        assert!(decode_entities(r#"{"vehicles": []}"#).is_err());
    }

    #[test]
    fn test_unknown_status_is_out_of_service() {
        assert_eq!(VehicleStatus::from_wire("charging"), VehicleStatus::OutOfService);
        assert_eq!(VehicleStatus::from_wire(" in_use "), VehicleStatus::InUse);
    }

    #[test]
    fn test_speed_readout_only_for_moving_in_use() {
        let p = GeoPoint::new(40.7, -74.0).unwrap();
        let parked = TrackedEntity::new("A", p, VehicleStatus::InUse);
        let moving_available = TrackedEntity::new("B", p, VehicleStatus::Available).with_speed(20.0);
        let moving = TrackedEntity::new("C", p, VehicleStatus::InUse).with_speed(-3.0);
        assert!(!parked.shows_speed_readout());
        assert!(!moving_available.shows_speed_readout());
        assert!(!moving.shows_speed_readout());
    }

    #[test]
    fn test_active_filter() {
        let p = GeoPoint::new(40.7, -74.0).unwrap();
        let entities = vec![
            TrackedEntity::new("A", p, VehicleStatus::Available),
            TrackedEntity::new("B", p, VehicleStatus::Maintenance),
            TrackedEntity::new("C", p, VehicleStatus::InUse),
        ];
        let kept = EntityFilter::active_only().apply(entities);
        let ids: Vec<_> = kept.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["A", "C"]);
    }

    #[test]
    fn test_info_rows_prefer_battery() {
        let p = GeoPoint::new(40.71234, -74.00601).unwrap();
        let mut entity = TrackedEntity::new("A", p, VehicleStatus::Available);
        entity.fuel_level = Some(55.0);
        let rows = entity.info_rows();
        assert!(rows.contains(&("Location", "40.7123, -74.0060".to_string())));
        assert!(rows.contains(&("Fuel", "55%".to_string())));
        entity.battery_level = Some(90.0);
        assert!(entity.info_rows().iter().all(|(label, _)| *label != "Fuel"));
    }

    #[test]
    fn test_density_points() {
        let json = r#"[{"latitude": 40.75, "longitude": -74.0, "intensity": 65}]"#;
        let points = decode_density_points(json).unwrap();
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].intensity, 65.0);
    }
}
