//! Central canvas UI: the fleet map.
//!
//! The map is rasterized into a [`RasterSurface`], uploaded as a texture,
//! and overlaid with speed badge text, the selection ring, and the hover
//! readout. Pointer picking goes through the same frame the texture was
//! drawn with.

use super::colors;
use eframe::egui::{
    self, Align2, Color32, CursorIcon, FontId, Pos2, Rect, Sense, Stroke, TextureHandle,
    TextureOptions, Vec2,
};
use fleetmap_workbench::geo::{ScreenPoint, ViewportSize};
use fleetmap_workbench::render::{
    color, LayerRenderer, RasterSurface, RenderStatus, LABEL_HEIGHT,
};
use fleetmap_workbench::state::MapViewState;

/// Raster surface and the texture it was last uploaded to.
pub struct MapCanvas {
    surface: RasterSurface,
    texture: Option<TextureHandle>,
    last_render_ms: Option<f64>,
}

impl Default for MapCanvas {
    fn default() -> Self {
        Self::new()
    }
}

impl MapCanvas {
    pub fn new() -> Self {
        Self {
            surface: RasterSurface::unmounted(),
            texture: None,
            last_render_ms: None,
        }
    }

    pub fn last_render_ms(&self) -> Option<f64> {
        self.last_render_ms
    }

    fn upload(&mut self, ctx: &egui::Context) {
        let Some(image) = self.surface.to_color_image() else {
            return;
        };
        match &mut self.texture {
            Some(texture) => texture.set(image, TextureOptions::LINEAR),
            None => {
                self.texture = Some(ctx.load_texture("fleet_map", image, TextureOptions::LINEAR))
            }
        }
    }
}

fn to_screen(rect: &Rect, point: ScreenPoint) -> Pos2 {
    rect.min + Vec2::new(point.x as f32, point.y as f32)
}

fn to_local(rect: &Rect, pos: Pos2) -> ScreenPoint {
    ScreenPoint::new((pos.x - rect.min.x) as f64, (pos.y - rect.min.y) as f64)
}

pub fn render_canvas(
    ctx: &egui::Context,
    view: &mut MapViewState,
    renderer: &LayerRenderer,
    canvas: &mut MapCanvas,
) {
    egui::CentralPanel::default().show(ctx, |ui| {
        let (response, painter) = ui.allocate_painter(ui.available_size(), Sense::click());
        let rect = response.rect;
        painter.rect_filled(rect, 0.0, Color32::from(color::canvas::BACKGROUND));

        // Collapsed panel; nothing to draw into
        let Ok(size) = ViewportSize::from_f32(rect.width(), rect.height()) else {
            return;
        };
        if let Err(e) = view.set_viewport(size) {
            log::warn!("Rejected viewport {}x{}: {}", size.width, size.height, e);
            return;
        }
        canvas.surface.resize(size);

        if view.needs_redraw() {
            if let RenderStatus::Rendered(stats) = view.render(renderer, &mut canvas.surface) {
                canvas.last_render_ms = Some(stats.render_time_ms);
                canvas.upload(ctx);
            }
        }

        if let Some(texture) = &canvas.texture {
            painter.image(
                texture.id(),
                rect,
                Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0)),
                Color32::WHITE,
            );
        }

        for label in canvas.surface.labels() {
            let pos = to_screen(&rect, label.anchor.offset(4.0, LABEL_HEIGHT / 2.0));
            painter.text(
                pos,
                Align2::LEFT_CENTER,
                &label.text,
                FontId::proportional(10.0),
                label.color.into(),
            );
        }

        draw_selection(&painter, &rect, view, renderer);

        if let Some(pos) = response.hover_pos() {
            let local = to_local(&rect, pos);
            let coordinate = view.frame().coordinate_at(local).display_short();
            let text = match view.entity_at(local) {
                Some(entity) => {
                    ctx.set_cursor_icon(CursorIcon::PointingHand);
                    format!("{}  {}", entity.display_name(), coordinate)
                }
                None => coordinate,
            };
            draw_readout(&painter, &rect, &text);
        }

        if response.clicked() {
            if let Some(pos) = response.interact_pointer_pos() {
                let picked = view.click(to_local(&rect, pos)).map(|e| e.id.clone());
                log::debug!("Map click at {:?} picked {:?}", pos, picked);
            }
        }
    });
}

fn draw_selection(
    painter: &egui::Painter,
    rect: &Rect,
    view: &MapViewState,
    renderer: &LayerRenderer,
) {
    let Some(selected) = view.selected() else {
        return;
    };
    let projector = view.frame().projector();
    let point = projector.geo_to_screen(selected.position);
    if projector.is_on_screen(point, 0.0) {
        painter.circle_stroke(
            to_screen(rect, point),
            renderer.style().marker_radius_px as f32 + 5.0,
            Stroke::new(2.0, colors::canvas::SELECTION),
        );
    }
}

/// Coordinate readout in the bottom-left corner.
fn draw_readout(painter: &egui::Painter, rect: &Rect, text: &str) {
    let galley = painter.layout_no_wrap(
        text.to_string(),
        FontId::monospace(11.0),
        colors::canvas::READOUT_TEXT,
    );
    let origin = rect.left_bottom() + Vec2::new(8.0, -8.0 - galley.size().y);
    let plate = Rect::from_min_size(origin, galley.size()).expand(4.0);
    painter.rect_filled(plate, 3.0, colors::canvas::readout_background());
    painter.galley(origin, galley, colors::canvas::READOUT_TEXT);
}
