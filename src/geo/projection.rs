//! Map projection and coordinate transformation.
//!
//! Handles converting between geographic coordinates (lat/lon) and
//! screen coordinates for rendering on the surface. The mapping is a plain
//! linear normalization of the bounding box onto the viewport, with the
//! vertical axis flipped because screen y grows downward.

use super::{BoundingBox, GeoError, GeoPoint, ScreenPoint, ViewportSize};

/// Projector bound to one bounding box and viewport.
///
/// Construction validates both, so the per-point conversions are infallible.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoProjector {
    bounds: BoundingBox,
    viewport: ViewportSize,
}

impl GeoProjector {
    /// Creates a projector, failing fast on a degenerate or inverted box.
    pub fn new(bounds: BoundingBox, viewport: ViewportSize) -> Result<Self, GeoError> {
        bounds.validate()?;
        if viewport.width == 0 || viewport.height == 0 {
            return Err(GeoError::InvalidViewport {
                width: viewport.width as f64,
                height: viewport.height as f64,
            });
        }
        Ok(Self { bounds, viewport })
    }

    pub fn bounds(&self) -> &BoundingBox {
        &self.bounds
    }

    pub fn viewport(&self) -> ViewportSize {
        self.viewport
    }

    /// Converts a geographic position to a screen position.
    ///
    /// Points outside the box map outside the viewport; nothing is clamped.
    pub fn geo_to_screen(&self, point: GeoPoint) -> ScreenPoint {
        let b = &self.bounds;
        let width = self.viewport.width_f64();
        let height = self.viewport.height_f64();

        let norm_x = (point.longitude - b.min_lng) / b.lng_span();
        let norm_y = (point.latitude - b.min_lat) / b.lat_span();

        // Flip Y since screen Y increases downward
        ScreenPoint::new(norm_x * width, height - norm_y * height)
    }

    /// Converts a screen position back to a geographic position.
    ///
    /// Exact algebraic inverse of [`Self::geo_to_screen`]. The result is not
    /// range-checked, so a pixel far outside the viewport can produce a
    /// latitude beyond the poles.
    pub fn screen_to_geo(&self, screen: ScreenPoint) -> GeoPoint {
        let b = &self.bounds;
        let width = self.viewport.width_f64();
        let height = self.viewport.height_f64();

        let norm_x = screen.x / width;
        let norm_y = (height - screen.y) / height;

        GeoPoint {
            latitude: b.min_lat + norm_y * b.lat_span(),
            longitude: b.min_lng + norm_x * b.lng_span(),
        }
    }

    /// Checks if a screen position falls on the viewport, with a pixel margin.
    pub fn is_on_screen(&self, screen: ScreenPoint, margin_px: f64) -> bool {
        screen.x >= -margin_px
            && screen.y >= -margin_px
            && screen.x <= self.viewport.width_f64() + margin_px
            && screen.y <= self.viewport.height_f64() + margin_px
    }
}

/// Projects one point without keeping a projector around.
pub fn forward(
    point: GeoPoint,
    bounds: &BoundingBox,
    viewport: ViewportSize,
) -> Result<ScreenPoint, GeoError> {
    Ok(GeoProjector::new(*bounds, viewport)?.geo_to_screen(point))
}

/// Inverse of [`forward`].
pub fn inverse(
    screen: ScreenPoint,
    bounds: &BoundingBox,
    viewport: ViewportSize,
) -> Result<GeoPoint, GeoError> {
    Ok(GeoProjector::new(*bounds, viewport)?.screen_to_geo(screen))
}
