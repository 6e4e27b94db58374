//! Colors used by the map layers.
//!
//! Grouped by layer so the canvas, legend, and tests agree on one palette.

use crate::fleet::{TrackedEntity, VehicleStatus};

/// Straight (non-premultiplied) 8-bit RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const TRANSPARENT: Rgba = Rgba::from_rgba(0, 0, 0, 0);
    pub const WHITE: Rgba = Rgba::from_rgb(255, 255, 255);

    pub const fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn from_rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Builds a color from a CSS-style alpha in [0, 1].
    pub fn with_alpha_f32(self, alpha: f32) -> Self {
        Self {
            a: (alpha.clamp(0.0, 1.0) * 255.0).round() as u8,
            ..self
        }
    }

    /// Scales the existing alpha by `factor` in [0, 1].
    pub fn fade(self, factor: f32) -> Self {
        self.with_alpha_f32(self.a as f32 / 255.0 * factor)
    }

    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl From<Rgba> for eframe::egui::Color32 {
    fn from(c: Rgba) -> Self {
        eframe::egui::Color32::from_rgba_unmultiplied(c.r, c.g, c.b, c.a)
    }
}

/// Map background and reference grid.
pub mod canvas {
    use super::Rgba;

    pub const BACKGROUND: Rgba = Rgba::from_rgb(10, 15, 13);

    /// Grid line color - requires alpha, use function.
    pub fn grid_line() -> Rgba {
        Rgba::from_rgb(16, 185, 129).with_alpha_f32(0.1)
    }
}

/// Illustrative city blocks and roads.
pub mod overlay {
    use super::Rgba;

    pub fn block_stroke() -> Rgba {
        Rgba::from_rgb(0, 255, 156).with_alpha_f32(0.3)
    }

    pub fn block_fill() -> Rgba {
        Rgba::from_rgb(6, 78, 59).with_alpha_f32(0.2)
    }

    pub fn road() -> Rgba {
        Rgba::from_rgb(0, 255, 156).with_alpha_f32(0.2)
    }
}

/// Density "heat" gradient stops.
pub mod density {
    use super::Rgba;

    /// Solid red core.
    pub const CORE: Rgba = Rgba::from_rgb(255, 82, 82);
    /// Amber middle ring, also the fully transparent edge color.
    pub const EDGE: Rgba = Rgba::from_rgb(255, 215, 64);
}

/// Vehicle marker fills.
pub mod markers {
    use super::Rgba;

    /// Intensity >= 80.
    pub const HIGH: Rgba = Rgba::from_rgb(0, 255, 156);
    /// Intensity >= 50.
    pub const MEDIUM: Rgba = Rgba::from_rgb(255, 215, 64);
    /// Intensity below 50.
    pub const LOW: Rgba = Rgba::from_rgb(255, 82, 82);

    pub const AVAILABLE: Rgba = Rgba::from_rgb(16, 185, 129);
    pub const IN_USE: Rgba = Rgba::from_rgb(245, 158, 11);
    pub const MAINTENANCE: Rgba = Rgba::from_rgb(239, 68, 68);
    pub const OTHER: Rgba = Rgba::from_rgb(107, 114, 128);

    pub fn outline() -> Rgba {
        Rgba::WHITE.with_alpha_f32(0.8)
    }

    /// Speed badge background.
    pub const SPEED_BADGE: Rgba = Rgba::from_rgb(239, 68, 68);
    pub const SPEED_TEXT: Rgba = Rgba::WHITE;
}

/// Intensity bands used for heatmap marker coloring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntensityTier {
    High,
    Medium,
    Low,
}

impl IntensityTier {
    pub fn from_intensity(intensity: f64) -> Self {
        if intensity >= 80.0 {
            IntensityTier::High
        } else if intensity >= 50.0 {
            IntensityTier::Medium
        } else {
            IntensityTier::Low
        }
    }

    pub fn color(&self) -> Rgba {
        match self {
            IntensityTier::High => markers::HIGH,
            IntensityTier::Medium => markers::MEDIUM,
            IntensityTier::Low => markers::LOW,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            IntensityTier::High => "High activity (80+)",
            IntensityTier::Medium => "Medium activity (50-79)",
            IntensityTier::Low => "Low activity (<50)",
        }
    }
}

pub fn status_color(status: VehicleStatus) -> Rgba {
    match status {
        VehicleStatus::Available => markers::AVAILABLE,
        VehicleStatus::InUse => markers::IN_USE,
        VehicleStatus::Maintenance => markers::MAINTENANCE,
        VehicleStatus::OutOfService => markers::OTHER,
    }
}

/// Marker fill: intensity tier when the entity has one, status otherwise.
pub fn marker_color(entity: &TrackedEntity) -> Rgba {
    match entity.intensity {
        Some(intensity) => IntensityTier::from_intensity(intensity).color(),
        None => status_color(entity.status),
    }
}

/// One legend row.
#[derive(Debug, Clone, PartialEq)]
pub struct LegendEntry {
    pub label: &'static str,
    pub color: Rgba,
}

/// Legend rows matching how markers are colored for this entity set.
pub fn legend_for(entities: &[TrackedEntity]) -> Vec<LegendEntry> {
    if entities.iter().any(|e| e.intensity.is_some()) {
        [IntensityTier::High, IntensityTier::Medium, IntensityTier::Low]
            .iter()
            .map(|tier| LegendEntry {
                label: tier.label(),
                color: tier.color(),
            })
            .collect()
    } else {
        VehicleStatus::all()
            .iter()
            .map(|status| LegendEntry {
                label: status.label(),
                color: status_color(*status),
            })
            .collect()
    }
}
