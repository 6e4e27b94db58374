//! UI modules for the Fleet Map Workbench application.
//!
//! The UI is split into distinct panels:
//! - Top bar: title, status, and the visible box
//! - Side panel: view mode, refresh controls, legend, selection
//! - Central canvas: the fleet map

mod canvas;
pub mod colors;
mod side_panel;
mod top_bar;

pub use canvas::{render_canvas, MapCanvas};
pub use side_panel::{render_side_panel, PanelAction, RefreshStatus};
pub use top_bar::render_top_bar;

use fleetmap_workbench::fleet::EntityFilter;
use fleetmap_workbench::geo::{BoundingBox, FitPolicy};
use fleetmap_workbench::state::EngineSettings;

/// Which fleet view the workbench shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapMode {
    /// Activity heat over a fixed city area.
    Heatmap,
    /// Every vehicle, view fitted to the fleet.
    Live,
    /// Bookable and busy vehicles only.
    Street,
}

impl MapMode {
    pub fn all() -> &'static [MapMode] {
        &[MapMode::Heatmap, MapMode::Live, MapMode::Street]
    }

    pub fn label(&self) -> &'static str {
        match self {
            MapMode::Heatmap => "Fleet heatmap",
            MapMode::Live => "Live vehicles",
            MapMode::Street => "Street view",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            MapMode::Heatmap => "Activity intensity over the service area",
            MapMode::Live => "All vehicles, colored by status",
            MapMode::Street => "Available and in-use vehicles only",
        }
    }

    /// Heatmap feeds carry per-vehicle intensity.
    pub fn with_intensity(&self) -> bool {
        matches!(self, MapMode::Heatmap)
    }

    pub fn filter(&self) -> EntityFilter {
        match self {
            MapMode::Street => EntityFilter::active_only(),
            _ => EntityFilter::All,
        }
    }

    pub fn fit_policy(&self, settings: &EngineSettings) -> FitPolicy {
        match self {
            // The service area the heatmap was designed around
            MapMode::Heatmap => FitPolicy::Fixed {
                bounds: BoundingBox::new(40.65, 40.85, -74.1, -73.9),
            },
            MapMode::Live => settings.fit_policy,
            MapMode::Street => FitPolicy::KeepWhenContained,
        }
    }

    pub fn refresh_interval_ms(&self, settings: &EngineSettings) -> u64 {
        match self {
            MapMode::Heatmap => 30_000,
            MapMode::Live => settings.refresh_interval_ms,
            MapMode::Street => 15_000,
        }
    }
}
