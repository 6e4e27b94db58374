//! Coordinate value types shared by projection, fitting, and hit-testing.

use super::GeoError;
use geo_types::{coord, Coord, Rect};
use glam::DVec2;
use serde::{Deserialize, Serialize};

/// A geographic position in degrees.
///
/// Latitude is constrained to [-90, 90] and longitude to [-180, 180].
/// Use [`GeoPoint::new`] to get a validated point. Deserializing goes
/// through the same check.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawGeoPoint")]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    /// Creates a point, rejecting out-of-range or non-finite coordinates.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, GeoError> {
        let valid = latitude.is_finite()
            && longitude.is_finite()
            && (-90.0..=90.0).contains(&latitude)
            && (-180.0..=180.0).contains(&longitude);
        if !valid {
            return Err(GeoError::InvalidCoordinate {
                latitude,
                longitude,
            });
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Formats the point the way the info card shows it (4 decimals).
    pub fn display_short(&self) -> String {
        format!("{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

#[derive(Deserialize)]
struct RawGeoPoint {
    latitude: f64,
    longitude: f64,
}

impl TryFrom<RawGeoPoint> for GeoPoint {
    type Error = GeoError;

    fn try_from(raw: RawGeoPoint) -> Result<Self, Self::Error> {
        GeoPoint::new(raw.latitude, raw.longitude)
    }
}

impl From<GeoPoint> for Coord<f64> {
    fn from(point: GeoPoint) -> Self {
        coord! { x: point.longitude, y: point.latitude }
    }
}

impl From<Coord<f64>> for GeoPoint {
    fn from(c: Coord<f64>) -> Self {
        Self {
            latitude: c.y,
            longitude: c.x,
        }
    }
}

/// Size of the rendering surface in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ViewportSize {
    pub width: u32,
    pub height: u32,
}

impl ViewportSize {
    pub fn new(width: u32, height: u32) -> Result<Self, GeoError> {
        if width == 0 || height == 0 {
            return Err(GeoError::InvalidViewport {
                width: width as f64,
                height: height as f64,
            });
        }
        Ok(Self { width, height })
    }

    /// Builds a viewport from a UI-provided floating point size, rounding
    /// to whole pixels.
    pub fn from_f32(width: f32, height: f32) -> Result<Self, GeoError> {
        if !width.is_finite() || !height.is_finite() || width < 1.0 || height < 1.0 {
            return Err(GeoError::InvalidViewport {
                width: width as f64,
                height: height as f64,
            });
        }
        Self::new(width.round() as u32, height.round() as u32)
    }

    pub fn width_f64(&self) -> f64 {
        self.width as f64
    }

    pub fn height_f64(&self) -> f64 {
        self.height as f64
    }

    /// Number of pixels covered by the viewport.
    pub fn area(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

/// A pixel position on the surface, origin at the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

impl ScreenPoint {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn to_dvec2(self) -> DVec2 {
        DVec2::new(self.x, self.y)
    }

    /// Euclidean distance in pixels.
    pub fn distance(self, other: ScreenPoint) -> f64 {
        self.to_dvec2().distance(other.to_dvec2())
    }

    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

impl From<DVec2> for ScreenPoint {
    fn from(v: DVec2) -> Self {
        Self::new(v.x, v.y)
    }
}

/// A latitude/longitude rectangle used to parameterize the projection.
///
/// Fields are plain data: a box can be degenerate (zero span) or even
/// inverted until it is checked. [`crate::geo::GeoProjector`] rejects both;
/// [`crate::geo::ViewportFitter`] only ever produces valid boxes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl BoundingBox {
    pub const fn new(min_lat: f64, max_lat: f64, min_lng: f64, max_lng: f64) -> Self {
        Self {
            min_lat,
            max_lat,
            min_lng,
            max_lng,
        }
    }

    /// A box of the given span centered on a point.
    pub fn centered_on(center: GeoPoint, lat_span: f64, lng_span: f64) -> Self {
        Self::new(
            center.latitude - lat_span / 2.0,
            center.latitude + lat_span / 2.0,
            center.longitude - lng_span / 2.0,
            center.longitude + lng_span / 2.0,
        )
    }

    pub fn lat_span(&self) -> f64 {
        self.max_lat - self.min_lat
    }

    pub fn lng_span(&self) -> f64 {
        self.max_lng - self.min_lng
    }

    pub fn center(&self) -> GeoPoint {
        GeoPoint {
            latitude: (self.min_lat + self.max_lat) / 2.0,
            longitude: (self.min_lng + self.max_lng) / 2.0,
        }
    }

    /// Checks that the box has positive, finite extent on both axes.
    pub fn validate(&self) -> Result<(), GeoError> {
        let fields = [self.min_lat, self.max_lat, self.min_lng, self.max_lng];
        if fields.iter().any(|v| !v.is_finite())
            || self.min_lat > self.max_lat
            || self.min_lng > self.max_lng
        {
            return Err(GeoError::InvalidBounds(*self));
        }
        if self.is_degenerate() {
            return Err(GeoError::DegenerateBounds(*self));
        }
        Ok(())
    }

    pub fn is_degenerate(&self) -> bool {
        self.lat_span() == 0.0 || self.lng_span() == 0.0
    }

    /// Inclusive containment test.
    pub fn contains(&self, point: GeoPoint) -> bool {
        point.latitude >= self.min_lat
            && point.latitude <= self.max_lat
            && point.longitude >= self.min_lng
            && point.longitude <= self.max_lng
    }

    /// Grows every edge outward by `degrees`.
    pub fn expanded(&self, degrees: f64) -> Self {
        Self::new(
            self.min_lat - degrees,
            self.max_lat + degrees,
            self.min_lng - degrees,
            self.max_lng + degrees,
        )
    }

    pub fn to_rect(&self) -> Rect<f64> {
        Rect::new(
            coord! { x: self.min_lng, y: self.min_lat },
            coord! { x: self.max_lng, y: self.max_lat },
        )
    }
}

impl From<Rect<f64>> for BoundingBox {
    fn from(rect: Rect<f64>) -> Self {
        Self::new(rect.min().y, rect.max().y, rect.min().x, rect.max().x)
    }
}
