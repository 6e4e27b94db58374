//! The current frame: the box and viewport shared by drawing and picking.

use crate::fleet::TrackedEntity;
use crate::geo::{BoundingBox, GeoError, GeoPoint, GeoProjector, HitTester, ScreenPoint, ViewportSize};

/// Projection parameters of the frame on screen.
///
/// The renderer and the hit tester both read this one value, so a pointer
/// event is always resolved against the projection that was last drawn.
/// Every change bumps `generation`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameState {
    projector: GeoProjector,
    generation: u64,
}

impl FrameState {
    pub fn new(bounds: BoundingBox, viewport: ViewportSize) -> Result<Self, GeoError> {
        Ok(Self {
            projector: GeoProjector::new(bounds, viewport)?,
            generation: 0,
        })
    }

    pub fn bounds(&self) -> &BoundingBox {
        self.projector.bounds()
    }

    pub fn viewport(&self) -> ViewportSize {
        self.projector.viewport()
    }

    pub fn projector(&self) -> &GeoProjector {
        &self.projector
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Replaces the box. On error the frame is left unchanged.
    pub fn set_bounds(&mut self, bounds: BoundingBox) -> Result<(), GeoError> {
        if bounds != *self.bounds() {
            self.projector = GeoProjector::new(bounds, self.viewport())?;
            self.generation += 1;
            log::debug!(
                "Frame {}: bounds lat [{:.4}, {:.4}] lng [{:.4}, {:.4}]",
                self.generation,
                bounds.min_lat,
                bounds.max_lat,
                bounds.min_lng,
                bounds.max_lng
            );
        }
        Ok(())
    }

    /// Replaces the viewport. Returns whether it changed.
    pub fn set_viewport(&mut self, viewport: ViewportSize) -> Result<bool, GeoError> {
        if viewport == self.viewport() {
            return Ok(false);
        }
        self.projector = GeoProjector::new(*self.bounds(), viewport)?;
        self.generation += 1;
        Ok(true)
    }

    pub fn pick<'a>(
        &self,
        point: ScreenPoint,
        entities: &'a [TrackedEntity],
        tester: &HitTester,
    ) -> Option<&'a TrackedEntity> {
        tester.pick(point, entities, &self.projector)
    }

    /// Geographic coordinate under a pixel, for hover readouts.
    pub fn coordinate_at(&self, point: ScreenPoint) -> GeoPoint {
        self.projector.screen_to_geo(point)
    }
}
