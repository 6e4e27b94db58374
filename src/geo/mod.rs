//! Geographic coordinate handling for the fleet map.
//!
//! This module provides the value types, the linear projection between
//! latitude/longitude and surface pixels, viewport fitting around the
//! tracked fleet, and pointer hit-testing against the drawn projection.

mod fit;
mod hit_test;
mod projection;
mod types;

pub use fit::{FitPolicy, ViewportFitter, DEFAULT_MIN_SPAN_DEGREES, DEFAULT_PADDING_DEGREES};
pub use hit_test::{pick, HitTester, PickMode};
pub use projection::{forward, inverse, GeoProjector};
pub use types::{BoundingBox, GeoPoint, ScreenPoint, ViewportSize};

/// Errors raised by projection and coordinate validation.
///
/// These indicate programmer errors (bad input to a pure function); the
/// viewport fitter guards against them before a box reaches the projector.
#[derive(Debug, Clone, PartialEq)]
pub enum GeoError {
    /// The box has zero span on at least one axis.
    DegenerateBounds(BoundingBox),
    /// The box is inverted or contains non-finite values.
    InvalidBounds(BoundingBox),
    /// The viewport has a zero, negative, or non-finite dimension.
    InvalidViewport { width: f64, height: f64 },
    /// Latitude or longitude outside the valid range.
    InvalidCoordinate { latitude: f64, longitude: f64 },
}

impl std::fmt::Display for GeoError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GeoError::DegenerateBounds(b) => write!(
                f,
                "Degenerate bounds: lat span {}, lng span {}",
                b.lat_span(),
                b.lng_span()
            ),
            GeoError::InvalidBounds(b) => write!(
                f,
                "Invalid bounds: lat [{}, {}], lng [{}, {}]",
                b.min_lat, b.max_lat, b.min_lng, b.max_lng
            ),
            GeoError::InvalidViewport { width, height } => {
                write!(f, "Invalid viewport size: {}x{}", width, height)
            }
            GeoError::InvalidCoordinate {
                latitude,
                longitude,
            } => write!(f, "Coordinate out of range: ({}, {})", latitude, longitude),
        }
    }
}

impl std::error::Error for GeoError {}
