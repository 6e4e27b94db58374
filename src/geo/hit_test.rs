//! Screen-space hit-testing for pointer selection.

use super::{BoundingBox, GeoError, GeoProjector, ScreenPoint, ViewportSize};
use crate::fleet::TrackedEntity;
use serde::{Deserialize, Serialize};

/// How ties between several entities under the pointer are resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PickMode {
    /// Closest entity wins; equal distances keep the earlier entity.
    #[default]
    Nearest,
    /// First entity in iteration order within the radius.
    FirstMatch,
}

/// Finds the entity under a pointer using the drawing projection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitTester {
    radius_px: f64,
    mode: PickMode,
    /// Entities projected further off-screen than this are not drawn and
    /// cannot be picked.
    visible_margin_px: f64,
}

/// Default marker radius plus outline.
const DEFAULT_VISIBLE_MARGIN_PX: f64 = 10.0;

impl Default for HitTester {
    fn default() -> Self {
        Self::new(15.0, PickMode::Nearest)
    }
}

impl HitTester {
    pub fn new(radius_px: f64, mode: PickMode) -> Self {
        Self {
            radius_px: radius_px.max(0.0),
            mode,
            visible_margin_px: DEFAULT_VISIBLE_MARGIN_PX,
        }
    }

    /// Matches the off-screen cutoff the marker layer draws with.
    pub fn with_visible_margin(mut self, margin_px: f64) -> Self {
        self.visible_margin_px = margin_px.max(0.0);
        self
    }

    pub fn radius_px(&self) -> f64 {
        self.radius_px
    }

    pub fn visible_margin_px(&self) -> f64 {
        self.visible_margin_px
    }

    /// Returns the entity within the pick radius of `point`, if any.
    ///
    /// The projector must be the one the current frame was drawn with.
    pub fn pick<'a>(
        &self,
        point: ScreenPoint,
        entities: &'a [TrackedEntity],
        projector: &GeoProjector,
    ) -> Option<&'a TrackedEntity> {
        let mut candidates = entities.iter().filter_map(|entity| {
            let at = projector.geo_to_screen(entity.position);
            if !projector.is_on_screen(at, self.visible_margin_px) {
                return None;
            }
            let distance = at.distance(point);
            (distance <= self.radius_px).then_some((distance, entity))
        });

        match self.mode {
            PickMode::FirstMatch => candidates.next().map(|(_, e)| e),
            PickMode::Nearest => candidates
                .fold(None, |best: Option<(f64, &'a TrackedEntity)>, (d, e)| match best {
                    Some((best_d, _)) if best_d <= d => best,
                    _ => Some((d, e)),
                })
                .map(|(_, e)| e),
        }
    }
}

/// One-shot pick against an explicit box and viewport.
pub fn pick<'a>(
    point: ScreenPoint,
    entities: &'a [TrackedEntity],
    bounds: &BoundingBox,
    viewport: ViewportSize,
    radius_px: f64,
) -> Result<Option<&'a TrackedEntity>, GeoError> {
    let projector = GeoProjector::new(*bounds, viewport)?;
    Ok(HitTester::new(radius_px, PickMode::Nearest).pick(point, entities, &projector))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fleet::VehicleStatus;
    use crate::geo::GeoPoint;

    fn setup() -> (GeoProjector, Vec<TrackedEntity>) {
        let projector = GeoProjector::new(
            BoundingBox::new(40.65, 40.85, -74.1, -73.9),
            ViewportSize::new(900, 500).unwrap(),
        )
        .unwrap();
        let entities = vec![
            TrackedEntity::new("V1", GeoPoint::new(40.75, -74.0).unwrap(), VehicleStatus::InUse),
            TrackedEntity::new("V2", GeoPoint::new(40.70, -74.05).unwrap(), VehicleStatus::Available),
        ];
        (projector, entities)
    }

    #[test]
    fn test_exact_position_is_picked_at_zero_radius() {
        let (projector, entities) = setup();
        let at = projector.geo_to_screen(entities[1].position);
        let hit = HitTester::new(0.0, PickMode::Nearest).pick(at, &entities, &projector);
        assert_eq!(hit.map(|e| e.id.as_str()), Some("V2"));
    }

    #[test]
    fn test_radius_plus_one_is_never_picked() {
        let (projector, entities) = setup();
        let radius = 15.0;
        let at = projector.geo_to_screen(entities[0].position).offset(radius + 1.0, 0.0);
        let hit = HitTester::new(radius, PickMode::Nearest).pick(at, &entities, &projector);
        assert!(hit.is_none());

        let edge = projector.geo_to_screen(entities[0].position).offset(0.0, radius - 0.5);
        assert!(HitTester::new(radius, PickMode::Nearest)
            .pick(edge, &entities, &projector)
            .is_some());
    }

    #[test]
    fn test_nearest_versus_first_match() {
        let projector = GeoProjector::new(
            BoundingBox::new(0.0, 1.0, 0.0, 1.0),
            ViewportSize::new(100, 100).unwrap(),
        )
        .unwrap();
        // 10px apart horizontally: (40, 50) and (50, 50)
        let entities = vec![
            TrackedEntity::new("far", GeoPoint::new(0.5, 0.4).unwrap(), VehicleStatus::Available),
            TrackedEntity::new("near", GeoPoint::new(0.5, 0.5).unwrap(), VehicleStatus::Available),
        ];
        let pointer = ScreenPoint::new(48.0, 50.0);

        let nearest = HitTester::new(15.0, PickMode::Nearest).pick(pointer, &entities, &projector);
        assert_eq!(nearest.unwrap().id, "near");

        let first = HitTester::new(15.0, PickMode::FirstMatch).pick(pointer, &entities, &projector);
        assert_eq!(first.unwrap().id, "far");
    }

    #[test]
    fn test_undrawn_offscreen_entity_is_not_picked() {
        let projector = GeoProjector::new(
            BoundingBox::new(0.0, 1.0, 0.0, 1.0),
            ViewportSize::new(100, 100).unwrap(),
        )
        .unwrap();
        // Projects to x = -12, beyond the 10px marker extent
        let entities = vec![TrackedEntity::new(
            "edge",
            GeoPoint::new(0.5, -0.12).unwrap(),
            VehicleStatus::Available,
        )];
        let pointer = ScreenPoint::new(2.0, 50.0);

        let tester = HitTester::new(15.0, PickMode::Nearest);
        assert!(tester.pick(pointer, &entities, &projector).is_none());

        let wide = tester.with_visible_margin(20.0);
        assert_eq!(wide.pick(pointer, &entities, &projector).unwrap().id, "edge");
    }

    #[test]
    fn test_one_shot_pick_rejects_degenerate_box() {
        let (_, entities) = setup();
        let flat = BoundingBox::new(40.7, 40.7, -74.0, -73.9);
        let viewport = ViewportSize::new(900, 500).unwrap();
        assert!(pick(ScreenPoint::new(1.0, 1.0), &entities, &flat, viewport, 10.0).is_err());
    }
}
