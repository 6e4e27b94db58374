//! Top bar UI: title, status, and the box currently on screen.

use super::colors;
use eframe::egui::{self, Color32, RichText};
use fleetmap_workbench::state::MapViewState;

pub fn render_top_bar(ctx: &egui::Context, view: &MapViewState, status_message: &str) {
    egui::TopBottomPanel::top("top_bar")
        .exact_height(36.0)
        .show(ctx, |ui| {
            ui.horizontal_centered(|ui| {
                ui.label(
                    RichText::new("Fleet Map Workbench")
                        .strong()
                        .size(16.0)
                        .color(Color32::WHITE),
                );

                ui.separator();

                ui.label(
                    RichText::new(status_message)
                        .size(13.0)
                        .color(Color32::GRAY),
                );

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let b = view.frame().bounds();
                    ui.label(
                        RichText::new(format!(
                            "lat {:.3}..{:.3}  lng {:.3}..{:.3}",
                            b.min_lat, b.max_lat, b.min_lng, b.max_lng
                        ))
                        .monospace()
                        .size(11.0)
                        .color(colors::ui::LABEL),
                    );
                });
            });
        });
}
