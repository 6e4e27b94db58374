//! Engine settings.
//!
//! Every field has a default, so a settings document only needs the keys it
//! changes. On the web the settings are persisted to localStorage.

use crate::geo::{
    BoundingBox, FitPolicy, GeoPoint, HitTester, PickMode, ViewportFitter,
    DEFAULT_MIN_SPAN_DEGREES, DEFAULT_PADDING_DEGREES,
};
use crate::render::LayerStyle;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Invalid settings document.
#[derive(Debug, Clone, PartialEq)]
pub enum SettingsError {
    /// The document is not valid JSON for these settings.
    Parse(String),
    /// A value is out of range.
    Invalid { field: &'static str, reason: String },
    /// The settings file could not be read.
    Io(String),
}

impl std::fmt::Display for SettingsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SettingsError::Parse(msg) => write!(f, "Failed to parse settings: {}", msg),
            SettingsError::Invalid { field, reason } => {
                write!(f, "Invalid setting '{}': {}", field, reason)
            }
            SettingsError::Io(msg) => write!(f, "Failed to read settings: {}", msg),
        }
    }
}

impl std::error::Error for SettingsError {}

impl From<serde_json::Error> for SettingsError {
    fn from(e: serde_json::Error) -> Self {
        SettingsError::Parse(e.to_string())
    }
}

/// Tunables for fitting, drawing, picking, and refresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Degrees added to every edge of the fitted box.
    pub padding_degrees: f64,
    /// Smallest lat/lng span of any box handed to the projector.
    pub min_span_degrees: f64,
    /// Center of the box shown when there are no entities.
    pub default_center: GeoPoint,
    /// Span of that box on both axes.
    pub default_span_degrees: f64,
    pub grid_spacing_px: f64,
    pub density_radius_px: f64,
    pub marker_radius_px: f64,
    pub pick_radius_px: f64,
    pub refresh_interval_ms: u64,
    pub fit_policy: FitPolicy,
    pub pick_mode: PickMode,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            padding_degrees: DEFAULT_PADDING_DEGREES,
            min_span_degrees: DEFAULT_MIN_SPAN_DEGREES,
            // New York City
            default_center: GeoPoint {
                latitude: 40.7128,
                longitude: -74.0060,
            },
            default_span_degrees: 0.2,
            grid_spacing_px: 50.0,
            density_radius_px: 30.0,
            marker_radius_px: 8.0,
            pick_radius_px: 15.0,
            refresh_interval_ms: 5000,
            fit_policy: FitPolicy::Always,
            pick_mode: PickMode::Nearest,
        }
    }
}

impl EngineSettings {
    #[cfg(target_arch = "wasm32")]
    const STORAGE_KEY: &'static str = "fleetmap_engine_settings";

    pub fn new() -> Self {
        Self::default()
    }

    /// Parses and validates a JSON settings document.
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        // A derived struct would also take a positional array
        if !value.is_object() {
            return Err(SettingsError::Parse(
                "settings must be a JSON object".to_string(),
            ));
        }
        let settings: Self = serde_json::from_value(value)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn to_json(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reads a JSON settings file.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn from_file(path: &std::path::Path) -> Result<Self, SettingsError> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| SettingsError::Io(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&json)
    }

    pub fn with_refresh_interval_ms(mut self, ms: u64) -> Self {
        self.refresh_interval_ms = ms;
        self
    }

    pub fn with_fit_policy(mut self, policy: FitPolicy) -> Self {
        self.fit_policy = policy;
        self
    }

    pub fn with_pick_mode(mut self, mode: PickMode) -> Self {
        self.pick_mode = mode;
        self
    }

    pub fn with_padding_degrees(mut self, degrees: f64) -> Self {
        self.padding_degrees = degrees;
        self
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        fn invalid(field: &'static str, reason: impl Into<String>) -> SettingsError {
            SettingsError::Invalid {
                field,
                reason: reason.into(),
            }
        }

        if self.refresh_interval_ms == 0 {
            return Err(invalid("refresh_interval_ms", "must be positive"));
        }
        if !(self.padding_degrees.is_finite() && self.padding_degrees >= 0.0) {
            return Err(invalid("padding_degrees", "must be zero or positive"));
        }
        if !(self.min_span_degrees.is_finite() && self.min_span_degrees > 0.0) {
            return Err(invalid("min_span_degrees", "must be positive"));
        }
        if !(self.default_span_degrees.is_finite() && self.default_span_degrees > 0.0) {
            return Err(invalid("default_span_degrees", "must be positive"));
        }
        GeoPoint::new(self.default_center.latitude, self.default_center.longitude)
            .map_err(|e| invalid("default_center", e.to_string()))?;
        for (field, value) in [
            ("grid_spacing_px", self.grid_spacing_px),
            ("density_radius_px", self.density_radius_px),
            ("marker_radius_px", self.marker_radius_px),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(invalid(field, "must be positive"));
            }
        }
        if !(self.pick_radius_px.is_finite() && self.pick_radius_px >= 0.0) {
            return Err(invalid("pick_radius_px", "must be zero or positive"));
        }
        if let FitPolicy::Fixed { bounds } = &self.fit_policy {
            bounds
                .validate()
                .map_err(|e| invalid("fit_policy", e.to_string()))?;
        }
        Ok(())
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }

    pub fn default_bounds(&self) -> BoundingBox {
        BoundingBox::centered_on(
            self.default_center,
            self.default_span_degrees,
            self.default_span_degrees,
        )
    }

    pub fn fitter(&self) -> ViewportFitter {
        ViewportFitter::new(
            self.padding_degrees,
            self.min_span_degrees,
            self.default_bounds(),
        )
    }

    pub fn hit_tester(&self) -> HitTester {
        HitTester::new(self.pick_radius_px, self.pick_mode)
            .with_visible_margin(self.layer_style().marker_extent_px())
    }

    pub fn layer_style(&self) -> LayerStyle {
        LayerStyle {
            grid_spacing_px: self.grid_spacing_px,
            density_radius_px: self.density_radius_px,
            marker_radius_px: self.marker_radius_px,
            ..LayerStyle::default()
        }
    }

    /// Load settings from localStorage, falling back to defaults.
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = match web_sys::window().and_then(|w| w.local_storage().ok().flatten()) {
            Some(s) => s,
            None => return Self::default(),
        };

        let json = match storage.get_item(Self::STORAGE_KEY) {
            Ok(Some(s)) => s,
            _ => return Self::default(),
        };

        match Self::from_json(&json) {
            Ok(settings) => {
                log::info!("Loaded engine settings from localStorage");
                settings
            }
            Err(e) => {
                log::warn!("Ignoring stored settings: {}", e);
                Self::default()
            }
        }
    }

    /// Save settings to localStorage.
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let Some(storage) = web_sys::window().and_then(|w| w.local_storage().ok().flatten()) else {
            return;
        };
        match self.to_json() {
            Ok(json) => {
                if let Err(e) = storage.set_item(Self::STORAGE_KEY, &json) {
                    log::warn!("Failed to save settings to localStorage: {:?}", e);
                }
            }
            Err(e) => log::warn!("Failed to serialize settings: {}", e),
        }
    }
}
