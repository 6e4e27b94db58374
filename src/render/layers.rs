//! The four map layers and their fixed draw order.
//!
//! Grid and static overlay work in viewport pixels and ignore geography.
//! The overlay blocks and roads are illustrative context only, not map data.
//! Density spots and markers go through the frame's projector.

use super::color::{self, canvas, density, markers, overlay};
use super::surface::{GradientStop, PixelRect, Surface, LABEL_HEIGHT};
use crate::fleet::{DensityPoint, TrackedEntity};
use crate::geo::{GeoProjector, ScreenPoint, ViewportSize};
use serde::{Deserialize, Serialize};

/// Pixel sizes used by the layers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayerStyle {
    pub grid_spacing_px: f64,
    pub density_radius_px: f64,
    pub marker_radius_px: f64,
    pub outline_width_px: f64,
}

impl Default for LayerStyle {
    fn default() -> Self {
        Self {
            grid_spacing_px: 50.0,
            density_radius_px: 30.0,
            marker_radius_px: 8.0,
            outline_width_px: 2.0,
        }
    }
}

impl LayerStyle {
    /// How far past its center a marker reaches, outline included.
    pub fn marker_extent_px(&self) -> f64 {
        self.marker_radius_px + self.outline_width_px
    }
}

/// Map layers, bottom to top.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderLayer {
    Grid,
    StaticOverlay,
    DensityLayer,
    MarkerLayer,
}

impl RenderLayer {
    /// Painter's order. Markers are last so nothing covers them.
    pub const DRAW_ORDER: [RenderLayer; 4] = [
        RenderLayer::Grid,
        RenderLayer::StaticOverlay,
        RenderLayer::DensityLayer,
        RenderLayer::MarkerLayer,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            RenderLayer::Grid => "Grid",
            RenderLayer::StaticOverlay => "Overlay",
            RenderLayer::DensityLayer => "Density",
            RenderLayer::MarkerLayer => "Markers",
        }
    }

    /// Draws this layer; returns how many items it placed on the surface.
    pub fn draw(&self, surface: &mut dyn Surface, input: &LayerInput<'_>) -> usize {
        let viewport = input.projector.viewport();
        match self {
            RenderLayer::Grid => draw_grid(surface, viewport, input.style.grid_spacing_px),
            RenderLayer::StaticOverlay => draw_static_overlay(surface, viewport),
            RenderLayer::DensityLayer => draw_density(
                surface,
                input.projector,
                input.density,
                input.style.density_radius_px,
            ),
            RenderLayer::MarkerLayer => {
                draw_markers(surface, input.projector, input.entities, input.style)
            }
        }
    }
}

/// Everything a layer may read while drawing one frame.
pub struct LayerInput<'a> {
    pub entities: &'a [TrackedEntity],
    pub density: &'a [DensityPoint],
    pub projector: &'a GeoProjector,
    pub style: &'a LayerStyle,
}

/// Decorative city blocks as (x, y, width, height) viewport fractions.
const BLOCKS: [(f64, f64, f64, f64); 5] = [
    (0.2, 0.2, 0.15, 0.1),
    (0.4, 0.3, 0.2, 0.15),
    (0.65, 0.25, 0.15, 0.12),
    (0.3, 0.5, 0.25, 0.2),
    (0.6, 0.55, 0.2, 0.15),
];

/// Horizontal roads at these fractions of the height.
const ROADS_HORIZONTAL: [f64; 2] = [0.3, 0.6];
/// Vertical roads at these fractions of the width.
const ROADS_VERTICAL: [f64; 2] = [0.35, 0.7];
const ROAD_WIDTH_PX: f64 = 3.0;
const BLOCK_STROKE_PX: f64 = 2.0;

pub fn draw_grid(surface: &mut dyn Surface, viewport: ViewportSize, spacing_px: f64) -> usize {
    if spacing_px <= 0.0 {
        return 0;
    }
    let (w, h) = (viewport.width_f64(), viewport.height_f64());
    let color = canvas::grid_line();
    let mut lines = 0;

    let mut x = 0.0;
    while x < w {
        surface.line(ScreenPoint::new(x, 0.0), ScreenPoint::new(x, h), 1.0, color);
        x += spacing_px;
        lines += 1;
    }
    let mut y = 0.0;
    while y < h {
        surface.line(ScreenPoint::new(0.0, y), ScreenPoint::new(w, y), 1.0, color);
        y += spacing_px;
        lines += 1;
    }
    lines
}

pub fn draw_static_overlay(surface: &mut dyn Surface, viewport: ViewportSize) -> usize {
    let (w, h) = (viewport.width_f64(), viewport.height_f64());

    for (fx, fy, fw, fh) in BLOCKS {
        let rect = PixelRect::new(w * fx, h * fy, w * fw, h * fh);
        surface.fill_rect(rect, overlay::block_fill());
        surface.stroke_rect(rect, BLOCK_STROKE_PX, overlay::block_stroke());
    }

    let road = overlay::road();
    for fy in ROADS_HORIZONTAL {
        let y = h * fy;
        surface.line(ScreenPoint::new(0.0, y), ScreenPoint::new(w, y), ROAD_WIDTH_PX, road);
    }
    for fx in ROADS_VERTICAL {
        let x = w * fx;
        surface.line(ScreenPoint::new(x, 0.0), ScreenPoint::new(x, h), ROAD_WIDTH_PX, road);
    }

    BLOCKS.len() + ROADS_HORIZONTAL.len() + ROADS_VERTICAL.len()
}

/// Three-stop heat gradient for one density point.
pub fn density_stops(intensity: f64) -> [GradientStop; 3] {
    let alpha = (intensity / 100.0).clamp(0.0, 1.0) as f32;
    [
        GradientStop {
            offset: 0.0,
            color: density::CORE.with_alpha_f32(alpha * 0.8),
        },
        GradientStop {
            offset: 0.5,
            color: density::EDGE.with_alpha_f32(alpha * 0.4),
        },
        GradientStop {
            offset: 1.0,
            color: density::EDGE.with_alpha_f32(0.0),
        },
    ]
}

pub fn draw_density(
    surface: &mut dyn Surface,
    projector: &GeoProjector,
    points: &[DensityPoint],
    radius_px: f64,
) -> usize {
    let mut drawn = 0;
    for point in points {
        let center = projector.geo_to_screen(point.position);
        if !projector.is_on_screen(center, radius_px) {
            continue;
        }
        surface.radial_gradient(center, radius_px, &density_stops(point.intensity));
        drawn += 1;
    }
    drawn
}

pub fn draw_markers(
    surface: &mut dyn Surface,
    projector: &GeoProjector,
    entities: &[TrackedEntity],
    style: &LayerStyle,
) -> usize {
    let radius = style.marker_radius_px;
    let mut drawn = 0;
    for entity in entities {
        let center = projector.geo_to_screen(entity.position);
        if !projector.is_on_screen(center, style.marker_extent_px()) {
            continue;
        }
        surface.fill_circle(center, radius, color::marker_color(entity));
        surface.stroke_circle(center, radius, style.outline_width_px, markers::outline());

        if entity.shows_speed_readout() {
            let anchor = center.offset(radius + 4.0, -LABEL_HEIGHT / 2.0);
            surface.label(
                anchor,
                &entity.speed_readout(),
                markers::SPEED_BADGE,
                markers::SPEED_TEXT,
            );
        }
        drawn += 1;
    }
    drawn
}
