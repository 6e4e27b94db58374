//! Raster drawing surface.
//!
//! [`Surface`] is the small set of 2D primitives the map layers need.
//! [`RasterSurface`] implements it on a CPU RGBA buffer with source-over
//! alpha compositing, and converts to an egui `ColorImage` for display.

use super::Rgba;
use crate::geo::{ScreenPoint, ViewportSize};
use eframe::egui::ColorImage;
use glam::DVec2;

/// Axis-aligned rectangle in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl PixelRect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }
}

/// One color stop of a radial gradient, `offset` in [0, 1] from the center.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradientStop {
    pub offset: f32,
    pub color: Rgba,
}

/// Text the surface could not rasterize itself; the UI draws it on top.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceLabel {
    /// Top-left corner of the label plate.
    pub anchor: ScreenPoint,
    pub text: String,
    pub color: Rgba,
}

/// Drawing target for the map layers.
pub trait Surface {
    /// Current size, or `None` while the surface is not mounted.
    fn size(&self) -> Option<ViewportSize>;

    fn clear(&mut self, color: Rgba);

    fn fill_rect(&mut self, rect: PixelRect, color: Rgba);

    fn stroke_rect(&mut self, rect: PixelRect, width: f64, color: Rgba) {
        let (l, t, r, b) = (rect.x, rect.y, rect.right(), rect.bottom());
        self.line(ScreenPoint::new(l, t), ScreenPoint::new(r, t), width, color);
        self.line(ScreenPoint::new(r, t), ScreenPoint::new(r, b), width, color);
        self.line(ScreenPoint::new(r, b), ScreenPoint::new(l, b), width, color);
        self.line(ScreenPoint::new(l, b), ScreenPoint::new(l, t), width, color);
    }

    fn line(&mut self, from: ScreenPoint, to: ScreenPoint, width: f64, color: Rgba);

    fn fill_circle(&mut self, center: ScreenPoint, radius: f64, color: Rgba);

    fn stroke_circle(&mut self, center: ScreenPoint, radius: f64, width: f64, color: Rgba);

    /// Fills a disc with a gradient interpolated between `stops`.
    fn radial_gradient(&mut self, center: ScreenPoint, radius: f64, stops: &[GradientStop]);

    /// Draws a text badge: a filled plate plus the text.
    fn label(&mut self, anchor: ScreenPoint, text: &str, background: Rgba, text_color: Rgba);
}

/// Approximate glyph advance used to size label plates.
pub const LABEL_CHAR_WIDTH: f64 = 6.0;
pub const LABEL_HEIGHT: f64 = 14.0;
const LABEL_PADDING: f64 = 4.0;

/// CPU RGBA surface.
#[derive(Clone, Default)]
pub struct RasterSurface {
    size: Option<ViewportSize>,
    /// Straight RGBA, row-major.
    pixels: Vec<u8>,
    labels: Vec<SurfaceLabel>,
}

impl RasterSurface {
    pub fn new(size: ViewportSize) -> Self {
        Self {
            size: Some(size),
            pixels: vec![0; size.area() * 4],
            labels: Vec::new(),
        }
    }

    /// A surface that has not been sized yet; rendering to it is a no-op.
    pub fn unmounted() -> Self {
        Self::default()
    }

    /// Resizes the buffer, discarding its content when the size changes.
    pub fn resize(&mut self, size: ViewportSize) {
        if self.size != Some(size) {
            self.size = Some(size);
            self.pixels = vec![0; size.area() * 4];
            self.labels.clear();
        }
    }

    /// Releases the buffer, e.g. when the view is torn down.
    pub fn detach(&mut self) {
        self.size = None;
        self.pixels = Vec::new();
        self.labels.clear();
    }

    pub fn is_mounted(&self) -> bool {
        self.size.is_some()
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba> {
        let size = self.size?;
        if x >= size.width || y >= size.height {
            return None;
        }
        let idx = (y as usize * size.width as usize + x as usize) * 4;
        let p = &self.pixels[idx..idx + 4];
        Some(Rgba::from_rgba(p[0], p[1], p[2], p[3]))
    }

    pub fn labels(&self) -> &[SurfaceLabel] {
        &self.labels
    }

    pub fn to_color_image(&self) -> Option<ColorImage> {
        let size = self.size?;
        Some(ColorImage::from_rgba_unmultiplied(
            [size.width as usize, size.height as usize],
            &self.pixels,
        ))
    }

    /// Composites `color` over one pixel with the given coverage.
    fn blend(&mut self, x: i64, y: i64, color: Rgba, coverage: f64) {
        let Some(size) = self.size else {
            return;
        };
        if x < 0 || y < 0 || x >= size.width as i64 || y >= size.height as i64 {
            return;
        }
        let src_a = color.a as f64 / 255.0 * coverage.clamp(0.0, 1.0);
        if src_a <= 0.0 {
            return;
        }

        let idx = (y as usize * size.width as usize + x as usize) * 4;
        let dst = &mut self.pixels[idx..idx + 4];
        let dst_a = dst[3] as f64 / 255.0;
        let out_a = src_a + dst_a * (1.0 - src_a);

        let mix = |s: u8, d: u8| -> u8 {
            let c = (s as f64 * src_a + d as f64 * dst_a * (1.0 - src_a)) / out_a;
            c.round().clamp(0.0, 255.0) as u8
        };
        dst[0] = mix(color.r, dst[0]);
        dst[1] = mix(color.g, dst[1]);
        dst[2] = mix(color.b, dst[2]);
        dst[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
    }

    /// Calls `f` with every pixel center inside the given bounds, clipped
    /// to the surface.
    fn for_each_pixel(&mut self, min: DVec2, max: DVec2, mut f: impl FnMut(&mut Self, i64, i64, DVec2)) {
        let Some(size) = self.size else {
            return;
        };
        let x0 = min.x.floor().max(0.0) as i64;
        let y0 = min.y.floor().max(0.0) as i64;
        let x1 = (max.x.ceil() as i64).min(size.width as i64 - 1);
        let y1 = (max.y.ceil() as i64).min(size.height as i64 - 1);
        for y in y0..=y1 {
            for x in x0..=x1 {
                let center = DVec2::new(x as f64 + 0.5, y as f64 + 0.5);
                f(self, x, y, center);
            }
        }
    }
}

/// Distance from `p` to the segment `a`-`b`.
fn segment_distance(p: DVec2, a: DVec2, b: DVec2) -> f64 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq == 0.0 {
        return p.distance(a);
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}

/// Linear interpolation across gradient stops.
fn gradient_color(stops: &[GradientStop], t: f32) -> Rgba {
    let Some(first) = stops.first() else {
        return Rgba::TRANSPARENT;
    };
    if t <= first.offset {
        return first.color;
    }
    for pair in stops.windows(2) {
        let (s0, s1) = (pair[0], pair[1]);
        if t <= s1.offset {
            let span = (s1.offset - s0.offset).max(f32::EPSILON);
            let k = (t - s0.offset) / span;
            let lerp = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * k).round() as u8;
            return Rgba::from_rgba(
                lerp(s0.color.r, s1.color.r),
                lerp(s0.color.g, s1.color.g),
                lerp(s0.color.b, s1.color.b),
                lerp(s0.color.a, s1.color.a),
            );
        }
    }
    stops.last().map(|s| s.color).unwrap_or(Rgba::TRANSPARENT)
}

impl Surface for RasterSurface {
    fn size(&self) -> Option<ViewportSize> {
        self.size
    }

    fn clear(&mut self, color: Rgba) {
        let rgba = color.to_array();
        for px in self.pixels.chunks_exact_mut(4) {
            px.copy_from_slice(&rgba);
        }
        self.labels.clear();
    }

    fn fill_rect(&mut self, rect: PixelRect, color: Rgba) {
        let min = DVec2::new(rect.x, rect.y);
        let max = DVec2::new(rect.right(), rect.bottom());
        self.for_each_pixel(min, max, |s, x, y, c| {
            if c.x >= min.x && c.x < max.x && c.y >= min.y && c.y < max.y {
                s.blend(x, y, color, 1.0);
            }
        });
    }

    fn line(&mut self, from: ScreenPoint, to: ScreenPoint, width: f64, color: Rgba) {
        let (a, b) = (from.to_dvec2(), to.to_dvec2());
        let half = width / 2.0;
        let pad = DVec2::splat(half + 1.0);
        self.for_each_pixel(a.min(b) - pad, a.max(b) + pad, |s, x, y, c| {
            let coverage = half + 0.5 - segment_distance(c, a, b);
            s.blend(x, y, color, coverage);
        });
    }

    fn fill_circle(&mut self, center: ScreenPoint, radius: f64, color: Rgba) {
        let c0 = center.to_dvec2();
        let pad = DVec2::splat(radius + 1.0);
        self.for_each_pixel(c0 - pad, c0 + pad, |s, x, y, c| {
            s.blend(x, y, color, radius + 0.5 - c.distance(c0));
        });
    }

    fn stroke_circle(&mut self, center: ScreenPoint, radius: f64, width: f64, color: Rgba) {
        let c0 = center.to_dvec2();
        let half = width / 2.0;
        let pad = DVec2::splat(radius + half + 1.0);
        self.for_each_pixel(c0 - pad, c0 + pad, |s, x, y, c| {
            let coverage = half + 0.5 - (c.distance(c0) - radius).abs();
            s.blend(x, y, color, coverage);
        });
    }

    fn radial_gradient(&mut self, center: ScreenPoint, radius: f64, stops: &[GradientStop]) {
        if radius <= 0.0 || stops.is_empty() {
            return;
        }
        let c0 = center.to_dvec2();
        let pad = DVec2::splat(radius + 1.0);
        self.for_each_pixel(c0 - pad, c0 + pad, |s, x, y, c| {
            let d = c.distance(c0);
            if d > radius + 0.5 {
                return;
            }
            let t = (d / radius).min(1.0) as f32;
            s.blend(x, y, gradient_color(stops, t), radius + 0.5 - d);
        });
    }

    fn label(&mut self, anchor: ScreenPoint, text: &str, background: Rgba, text_color: Rgba) {
        let width = text.chars().count() as f64 * LABEL_CHAR_WIDTH + 2.0 * LABEL_PADDING;
        self.fill_rect(PixelRect::new(anchor.x, anchor.y, width, LABEL_HEIGHT), background);
        self.labels.push(SurfaceLabel {
            anchor,
            text: text.to_string(),
            color: text_color,
        });
    }
}
