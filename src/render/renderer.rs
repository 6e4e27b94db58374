//! Frame renderer: clears the surface and composites the layers in order.

use super::color::canvas;
use super::layers::{LayerInput, LayerStyle, RenderLayer};
use super::surface::Surface;
use crate::fleet::{DensityPoint, TrackedEntity};
use crate::geo::{BoundingBox, GeoError, ViewportSize};
use crate::state::FrameState;

/// Why a frame was not drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The surface has no size yet, or was torn down.
    Unmounted,
    /// The surface size differs from the frame viewport; drawing would
    /// disagree with pointer picking until the frame catches up.
    SizeMismatch,
}

/// Statistics for one drawn frame.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderStats {
    /// Layers in the order they were drawn.
    pub layers: Vec<RenderLayer>,
    pub markers_drawn: usize,
    pub density_drawn: usize,
    /// Frame generation the surface now shows.
    pub generation: u64,
    pub render_time_ms: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RenderStatus {
    Rendered(RenderStats),
    Skipped(SkipReason),
}

impl RenderStatus {
    pub fn is_rendered(&self) -> bool {
        matches!(self, RenderStatus::Rendered(_))
    }
}

/// Draws fleet frames onto a [`Surface`].
#[derive(Debug, Clone, Default)]
pub struct LayerRenderer {
    style: LayerStyle,
}

impl LayerRenderer {
    pub fn new(style: LayerStyle) -> Self {
        Self { style }
    }

    pub fn style(&self) -> &LayerStyle {
        &self.style
    }

    /// Renders one frame with the projection held by `frame`.
    ///
    /// An unavailable surface is skipped, not an error. Rendering is
    /// synchronous and finishes before returning.
    pub fn render(
        &self,
        surface: &mut dyn Surface,
        entities: &[TrackedEntity],
        density: &[DensityPoint],
        frame: &FrameState,
    ) -> RenderStatus {
        let Some(size) = surface.size() else {
            log::debug!("Skipping render: surface not mounted");
            return RenderStatus::Skipped(SkipReason::Unmounted);
        };
        if size != frame.viewport() {
            log::debug!(
                "Skipping render: surface {}x{} but frame viewport {}x{}",
                size.width,
                size.height,
                frame.viewport().width,
                frame.viewport().height
            );
            return RenderStatus::Skipped(SkipReason::SizeMismatch);
        }

        let start = web_time::Instant::now();
        surface.clear(canvas::BACKGROUND);

        let input = LayerInput {
            entities,
            density,
            projector: frame.projector(),
            style: &self.style,
        };

        let mut stats = RenderStats {
            layers: Vec::with_capacity(RenderLayer::DRAW_ORDER.len()),
            markers_drawn: 0,
            density_drawn: 0,
            generation: frame.generation(),
            render_time_ms: 0.0,
        };
        for layer in RenderLayer::DRAW_ORDER {
            let count = layer.draw(surface, &input);
            match layer {
                RenderLayer::DensityLayer => stats.density_drawn = count,
                RenderLayer::MarkerLayer => stats.markers_drawn = count,
                _ => {}
            }
            stats.layers.push(layer);
        }

        stats.render_time_ms = start.elapsed().as_secs_f64() * 1000.0;
        log::debug!(
            "Rendered frame {}: {} markers, {} density spots in {:.1}ms",
            stats.generation,
            stats.markers_drawn,
            stats.density_drawn,
            stats.render_time_ms
        );
        RenderStatus::Rendered(stats)
    }

    /// One-shot render against an explicit box and viewport.
    ///
    /// Fails fast on an invalid box; callers normally go through
    /// [`Self::render`] with a frame built from a fitted box.
    pub fn render_with_bounds(
        &self,
        surface: &mut dyn Surface,
        entities: &[TrackedEntity],
        density: &[DensityPoint],
        bounds: &BoundingBox,
        viewport: ViewportSize,
    ) -> Result<RenderStatus, GeoError> {
        let frame = FrameState::new(*bounds, viewport)?;
        Ok(self.render(surface, entities, density, &frame))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fleet::VehicleStatus;
    use crate::geo::{GeoPoint, ScreenPoint};
    use crate::render::color::{markers, IntensityTier};
    use crate::render::{GradientStop, PixelRect, RasterSurface, Rgba};

    fn viewport() -> ViewportSize {
        ViewportSize::new(900, 500).unwrap()
    }

    fn bounds() -> BoundingBox {
        BoundingBox::new(40.65, 40.85, -74.1, -73.9)
    }

    /// Records which primitives were issued, in order.
    #[derive(Default)]
    struct RecordingSurface {
        size: Option<ViewportSize>,
        calls: Vec<&'static str>,
    }

    impl Surface for RecordingSurface {
        fn size(&self) -> Option<ViewportSize> {
            self.size
        }
        fn clear(&mut self, _: Rgba) {
            self.calls.push("clear");
        }
        fn fill_rect(&mut self, _: PixelRect, _: Rgba) {
            self.calls.push("rect");
        }
        fn line(&mut self, _: ScreenPoint, _: ScreenPoint, _: f64, _: Rgba) {
            self.calls.push("line");
        }
        fn fill_circle(&mut self, _: ScreenPoint, _: f64, _: Rgba) {
            self.calls.push("marker");
        }
        fn stroke_circle(&mut self, _: ScreenPoint, _: f64, _: f64, _: Rgba) {
            self.calls.push("outline");
        }
        fn radial_gradient(&mut self, _: ScreenPoint, _: f64, _: &[GradientStop]) {
            self.calls.push("gradient");
        }
        fn label(&mut self, _: ScreenPoint, _: &str, _: Rgba, _: Rgba) {
            self.calls.push("label");
        }
    }

    fn scene() -> (Vec<TrackedEntity>, Vec<DensityPoint>) {
        let center = GeoPoint::new(40.75, -74.0).unwrap();
        let entities = vec![TrackedEntity::new("V1", center, VehicleStatus::InUse).with_intensity(92.0)];
        let density = vec![DensityPoint::new(center, 100.0)];
        (entities, density)
    }

    #[test]
    fn test_layers_drawn_in_fixed_order() {
        let (entities, density) = scene();
        let frame = FrameState::new(bounds(), viewport()).unwrap();
        let mut surface = RecordingSurface {
            size: Some(viewport()),
            ..Default::default()
        };

        let status = LayerRenderer::default().render(&mut surface, &entities, &density, &frame);
        let RenderStatus::Rendered(stats) = status else {
            panic!("expected a rendered frame");
        };
        assert_eq!(stats.layers, RenderLayer::DRAW_ORDER.to_vec());
        assert_eq!(stats.markers_drawn, 1);
        assert_eq!(stats.density_drawn, 1);

        let position = |name| surface.calls.iter().position(|c| *c == name).unwrap();
        assert_eq!(surface.calls[0], "clear");
        assert!(position("line") < position("gradient"));
        assert!(position("gradient") < position("marker"));
        let last_line = surface.calls.iter().rposition(|c| *c == "line").unwrap();
        assert!(last_line < position("gradient"));
    }

    #[test]
    fn test_marker_pixels_survive_density_and_grid() {
        let (entities, density) = scene();
        let mut surface = RasterSurface::new(viewport());
        let status = LayerRenderer::default()
            .render_with_bounds(&mut surface, &entities, &density, &bounds(), viewport())
            .unwrap();
        assert!(status.is_rendered());

        // (450, 250) is the projected center, on a grid line and under the
        // densest part of the heat spot.
        assert_eq!(surface.pixel(450, 250), Some(IntensityTier::High.color()));
        assert_eq!(surface.pixel(451, 249), Some(IntensityTier::High.color()));
    }

    #[test]
    fn test_status_colors_without_intensity() {
        let center = GeoPoint::new(40.75, -74.0).unwrap();
        let entities = vec![TrackedEntity::new("V1", center, VehicleStatus::Maintenance)];
        let mut surface = RasterSurface::new(viewport());
        LayerRenderer::default()
            .render_with_bounds(&mut surface, &entities, &[], &bounds(), viewport())
            .unwrap();
        assert_eq!(surface.pixel(450, 250), Some(markers::MAINTENANCE));
    }

    #[test]
    fn test_unmounted_surface_is_skipped() {
        let (entities, density) = scene();
        let frame = FrameState::new(bounds(), viewport()).unwrap();
        let mut surface = RasterSurface::unmounted();
        let status = LayerRenderer::default().render(&mut surface, &entities, &density, &frame);
        assert_eq!(status, RenderStatus::Skipped(SkipReason::Unmounted));

        surface.resize(ViewportSize::new(300, 200).unwrap());
        let status = LayerRenderer::default().render(&mut surface, &entities, &density, &frame);
        assert_eq!(status, RenderStatus::Skipped(SkipReason::SizeMismatch));
    }

    #[test]
    fn test_degenerate_box_fails_fast() {
        let mut surface = RasterSurface::new(viewport());
        let flat = BoundingBox::new(40.75, 40.75, -74.1, -73.9);
        assert!(LayerRenderer::default()
            .render_with_bounds(&mut surface, &[], &[], &flat, viewport())
            .is_err());
    }

    #[test]
    fn test_background_cleared() {
        let mut surface = RasterSurface::new(viewport());
        LayerRenderer::default()
            .render_with_bounds(&mut surface, &[], &[], &bounds(), viewport())
            .unwrap();
        // Between grid lines and away from overlay shapes
        assert_eq!(surface.pixel(25, 25), Some(canvas::BACKGROUND));
    }
}
