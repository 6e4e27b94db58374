//! Centralized color constants for the UI panels.
//!
//! Map layer colors live in `fleetmap_workbench::render::color`; these are
//! only for egui widgets and the painter overlay on top of the map texture.

use eframe::egui::Color32;

/// General UI colors for labels and values.
pub mod ui {
    use super::Color32;

    /// Muted gray for stat labels.
    pub const LABEL: Color32 = Color32::from_rgb(120, 130, 125);
    /// Slightly brighter for stat values.
    pub const VALUE: Color32 = Color32::from_rgb(190, 200, 195);
    /// Emphasized color for headings and active states.
    pub const ACTIVE: Color32 = Color32::from_rgb(0, 255, 156);
    pub const WARNING: Color32 = Color32::from_rgb(255, 180, 50);
}

/// Refresh loop status indicator.
pub mod refresh {
    use super::Color32;

    pub const RUNNING: Color32 = Color32::from_rgb(16, 185, 129);
    pub const STOPPED: Color32 = Color32::from_rgb(140, 140, 150);
    /// Last fetch failed; showing older data.
    pub const STALE: Color32 = Color32::from_rgb(245, 158, 11);
}

/// Painter overlay on the map canvas.
pub mod canvas {
    use super::Color32;

    /// Ring around the selected vehicle.
    pub const SELECTION: Color32 = Color32::from_rgb(100, 180, 255);

    /// Hover readout plate - requires alpha, use function.
    pub fn readout_background() -> Color32 {
        Color32::from_rgba_unmultiplied(10, 15, 13, 200)
    }

    pub const READOUT_TEXT: Color32 = Color32::from_rgb(180, 220, 200);
}
