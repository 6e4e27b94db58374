//! Layered raster rendering of the fleet map.
//!
//! A frame is drawn as four layers (grid, illustrative overlay, density
//! heat, vehicle markers) onto a [`Surface`], strictly in that order.

pub mod color;
mod layers;
mod renderer;
mod surface;

pub use color::{legend_for, marker_color, status_color, IntensityTier, LegendEntry, Rgba};
pub use layers::{
    density_stops, draw_density, draw_grid, draw_markers, draw_static_overlay, LayerInput,
    LayerStyle, RenderLayer,
};
pub use renderer::{LayerRenderer, RenderStats, RenderStatus, SkipReason};
pub use surface::{
    GradientStop, PixelRect, RasterSurface, Surface, SurfaceLabel, LABEL_CHAR_WIDTH, LABEL_HEIGHT,
};
