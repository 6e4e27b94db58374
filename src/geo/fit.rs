//! Viewport fitting: derive a padded bounding box from the tracked fleet.

use super::{BoundingBox, GeoPoint};
use crate::fleet::TrackedEntity;
use serde::{Deserialize, Serialize};

/// Default padding added to every edge of the fitted box, in degrees.
pub const DEFAULT_PADDING_DEGREES: f64 = 0.02;
/// Smallest span allowed on either axis, in degrees.
pub const DEFAULT_MIN_SPAN_DEGREES: f64 = 0.01;

/// Computes bounding boxes that are always safe to hand to the projector.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewportFitter {
    padding_degrees: f64,
    min_span_degrees: f64,
    default_bounds: BoundingBox,
}

impl Default for ViewportFitter {
    fn default() -> Self {
        Self {
            padding_degrees: DEFAULT_PADDING_DEGREES,
            min_span_degrees: DEFAULT_MIN_SPAN_DEGREES,
            // New York City, matching the fleet's home market
            default_bounds: BoundingBox::new(40.6128, 40.8128, -74.106, -73.906),
        }
    }
}

impl ViewportFitter {
    /// Creates a fitter. Negative padding is treated as zero and the minimum
    /// span is floored at a tiny positive value so boxes never collapse.
    pub fn new(padding_degrees: f64, min_span_degrees: f64, default_bounds: BoundingBox) -> Self {
        let min_span_degrees = if min_span_degrees.is_finite() && min_span_degrees > 0.0 {
            min_span_degrees
        } else {
            DEFAULT_MIN_SPAN_DEGREES
        };
        let fitter = Self {
            padding_degrees: padding_degrees.max(0.0),
            min_span_degrees,
            default_bounds,
        };
        Self {
            default_bounds: fitter.guard(default_bounds),
            ..fitter
        }
    }

    pub fn padding_degrees(&self) -> f64 {
        self.padding_degrees
    }

    pub fn min_span_degrees(&self) -> f64 {
        self.min_span_degrees
    }

    pub fn default_bounds(&self) -> BoundingBox {
        self.default_bounds
    }

    /// Computes the padded box around every entity position.
    ///
    /// An empty slice yields the configured default box.
    pub fn compute_bounds(&self, entities: &[TrackedEntity]) -> BoundingBox {
        self.bounds_for_points(entities.iter().map(|e| e.position))
    }

    /// Same as [`Self::compute_bounds`] for bare positions.
    pub fn bounds_for_points(&self, points: impl IntoIterator<Item = GeoPoint>) -> BoundingBox {
        let extent = points.into_iter().fold(None, |acc: Option<BoundingBox>, p| {
            Some(match acc {
                None => BoundingBox::new(p.latitude, p.latitude, p.longitude, p.longitude),
                Some(b) => BoundingBox::new(
                    b.min_lat.min(p.latitude),
                    b.max_lat.max(p.latitude),
                    b.min_lng.min(p.longitude),
                    b.max_lng.max(p.longitude),
                ),
            })
        });

        match extent {
            Some(extent) => self.guard(extent.expanded(self.padding_degrees)),
            None => self.default_bounds,
        }
    }

    /// Widens any axis narrower than the minimum span, keeping its center.
    pub fn guard(&self, bounds: BoundingBox) -> BoundingBox {
        let mut out = bounds;
        if out.lat_span() < self.min_span_degrees {
            let mid = (out.min_lat + out.max_lat) / 2.0;
            out.min_lat = mid - self.min_span_degrees / 2.0;
            out.max_lat = mid + self.min_span_degrees / 2.0;
        }
        if out.lng_span() < self.min_span_degrees {
            let mid = (out.min_lng + out.max_lng) / 2.0;
            out.min_lng = mid - self.min_span_degrees / 2.0;
            out.max_lng = mid + self.min_span_degrees / 2.0;
        }
        out
    }
}

/// Decides whether a freshly fitted box replaces the one on screen.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum FitPolicy {
    /// Refit on every entity-set change.
    #[default]
    Always,
    /// Keep the current box while every entity still lies inside it.
    KeepWhenContained,
    /// Never refit; the view stays on this box.
    Fixed { bounds: BoundingBox },
}

impl FitPolicy {
    pub fn label(&self) -> &'static str {
        match self {
            FitPolicy::Always => "Follow fleet",
            FitPolicy::KeepWhenContained => "Refit when leaving view",
            FitPolicy::Fixed { .. } => "Fixed area",
        }
    }

    /// Picks the box to apply for a new entity set.
    pub fn choose(
        &self,
        current: &BoundingBox,
        fitted: BoundingBox,
        entities: &[TrackedEntity],
    ) -> BoundingBox {
        match self {
            FitPolicy::Always => fitted,
            FitPolicy::KeepWhenContained => {
                if !entities.is_empty() && entities.iter().all(|e| current.contains(e.position)) {
                    *current
                } else {
                    fitted
                }
            }
            FitPolicy::Fixed { bounds } => *bounds,
        }
    }
}
