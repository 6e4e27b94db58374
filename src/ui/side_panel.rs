//! Right panel UI: view mode, refresh controls, legend, fleet summary, and
//! the selected-vehicle card.

use super::colors;
use super::MapMode;
use eframe::egui::{self, Color32, RichText, ScrollArea};
use egui_phosphor::regular as icons;
use fleetmap_workbench::fleet::VehicleStatus;
use fleetmap_workbench::geo::PickMode;
use fleetmap_workbench::live::RefreshStats;
use fleetmap_workbench::state::MapViewState;

/// What the user asked for this frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelAction {
    None,
    SwitchMode(MapMode),
    SetPickMode(PickMode),
    RefreshNow,
    Stop,
    Resume,
}

/// Refresh loop status shown in the panel.
pub struct RefreshStatus<'a> {
    pub running: bool,
    pub stats: Option<&'a RefreshStats>,
    pub interval_ms: u64,
    pub render_ms: Option<f64>,
}

pub fn render_side_panel(
    ctx: &egui::Context,
    view: &mut MapViewState,
    mode: MapMode,
    pick_mode: PickMode,
    refresh: RefreshStatus<'_>,
) -> PanelAction {
    let mut action = PanelAction::None;

    egui::SidePanel::right("side_panel")
        .resizable(true)
        .default_width(240.0)
        .min_width(200.0)
        .max_width(360.0)
        .show(ctx, |ui| {
            ScrollArea::vertical().show(ui, |ui| {
                ui.heading("Fleet");
                ui.separator();

                render_mode_section(ui, mode, pick_mode, &mut action);
                ui.add_space(5.0);

                render_refresh_section(ui, &refresh, &mut action);
                ui.add_space(5.0);

                render_legend_section(ui, view);
                ui.add_space(5.0);

                render_selected_section(ui, view);
                ui.add_space(5.0);

                render_vehicle_list(ui, view);
            });
        });

    action
}

fn render_mode_section(
    ui: &mut egui::Ui,
    mode: MapMode,
    pick_mode: PickMode,
    action: &mut PanelAction,
) {
    egui::CollapsingHeader::new(RichText::new("View").strong())
        .default_open(true)
        .show(ui, |ui| {
            let mut selected = mode;
            egui::ComboBox::from_id_salt("mode_selector")
                .selected_text(selected.label())
                .width(170.0)
                .show_ui(ui, |ui| {
                    for candidate in MapMode::all() {
                        ui.selectable_value(&mut selected, *candidate, candidate.label());
                    }
                });
            if selected != mode {
                *action = PanelAction::SwitchMode(selected);
            }
            ui.label(
                RichText::new(mode.description())
                    .small()
                    .color(colors::ui::LABEL),
            );

            ui.add_space(4.0);
            let mut picking = pick_mode;
            ui.horizontal(|ui| {
                ui.label(RichText::new("Click picks").small());
                ui.radio_value(&mut picking, PickMode::Nearest, "nearest");
                ui.radio_value(&mut picking, PickMode::FirstMatch, "first");
            });
            if picking != pick_mode {
                *action = PanelAction::SetPickMode(picking);
            }
        });
}

fn render_refresh_section(ui: &mut egui::Ui, refresh: &RefreshStatus<'_>, action: &mut PanelAction) {
    egui::CollapsingHeader::new(RichText::new("Live Refresh").strong())
        .default_open(true)
        .show(ui, |ui| {
            let stale = refresh.stats.is_some_and(|s| s.is_stale());
            let (dot, text) = match (refresh.running, stale) {
                (false, _) => (colors::refresh::STOPPED, "Stopped".to_string()),
                (true, true) => (colors::refresh::STALE, "Showing stale data".to_string()),
                (true, false) => (
                    colors::refresh::RUNNING,
                    format!("Every {:.0}s", refresh.interval_ms as f64 / 1000.0),
                ),
            };
            ui.horizontal(|ui| {
                ui.label(RichText::new(icons::CIRCLE).color(dot));
                ui.label(text);
            });

            ui.horizontal(|ui| {
                ui.add_enabled_ui(refresh.running, |ui| {
                    if ui
                        .button(format!("{} Refresh", icons::ARROWS_CLOCKWISE))
                        .clicked()
                    {
                        *action = PanelAction::RefreshNow;
                    }
                });
                if refresh.running {
                    if ui.button(format!("{} Stop", icons::STOP)).clicked() {
                        *action = PanelAction::Stop;
                    }
                } else if ui.button(format!("{} Resume", icons::PLAY)).clicked() {
                    *action = PanelAction::Resume;
                }
            });

            if let Some(stats) = refresh.stats {
                stat_row(ui, "Fetches", stats.ticks.to_string());
                stat_row(ui, "Failures", stats.failures.to_string());
                if let Some(at) = stats.last_update {
                    stat_row(ui, "Updated", at.format("%H:%M:%S UTC").to_string());
                }
                stat_row(ui, "Fetch", format!("{:.0} ms", stats.last_fetch_ms));
                if let Some(err) = &stats.last_error {
                    ui.label(RichText::new(err).small().color(colors::ui::WARNING));
                }
            }
            if let Some(ms) = refresh.render_ms {
                stat_row(ui, "Render", format!("{:.1} ms", ms));
            }
        });
}

fn render_legend_section(ui: &mut egui::Ui, view: &MapViewState) {
    egui::CollapsingHeader::new(RichText::new("Legend").strong())
        .default_open(true)
        .show(ui, |ui| {
            for entry in view.legend() {
                ui.horizontal(|ui| {
                    let (rect, _) =
                        ui.allocate_exact_size(egui::vec2(12.0, 12.0), egui::Sense::hover());
                    ui.painter()
                        .circle_filled(rect.center(), 5.0, Color32::from(entry.color));
                    ui.label(RichText::new(entry.label).small());
                });
            }

            ui.add_space(4.0);
            let summary = view.summary();
            stat_row(ui, "Tracked", summary.total.to_string());
            for status in VehicleStatus::all() {
                stat_row(ui, status.label(), summary.count(*status).to_string());
            }
            stat_row(ui, "Moving", summary.moving.to_string());
        });
}

fn render_selected_section(ui: &mut egui::Ui, view: &mut MapViewState) {
    egui::CollapsingHeader::new(RichText::new("Selected Vehicle").strong())
        .default_open(true)
        .show(ui, |ui| {
            let Some(entity) = view.selected() else {
                ui.label(
                    RichText::new("Click a marker to inspect it")
                        .small()
                        .color(colors::ui::LABEL),
                );
                return;
            };

            ui.label(
                RichText::new(entity.display_name())
                    .strong()
                    .color(colors::ui::ACTIVE),
            );
            ui.label(RichText::new(&entity.id).small().monospace());
            for (label, value) in entity.info_rows() {
                stat_row(ui, label, value);
            }

            if ui.small_button(format!("{} Clear", icons::X)).clicked() {
                view.clear_selection();
            }
        });
}

/// List-based selection; sets the selection directly without hit-testing.
fn render_vehicle_list(ui: &mut egui::Ui, view: &mut MapViewState) {
    egui::CollapsingHeader::new(RichText::new("Vehicles").strong())
        .default_open(false)
        .show(ui, |ui| {
            let mut clicked = None;
            for entity in view.entities() {
                let selected = view.selection().is_selected(&entity.id);
                let text = format!("{}  {}", entity.id, entity.status.label());
                if ui.selectable_label(selected, text).clicked() {
                    clicked = Some(entity.id.clone());
                }
            }
            if let Some(id) = clicked {
                view.select_id(&id);
            }
        });
}

fn stat_row(ui: &mut egui::Ui, label: &str, value: String) {
    ui.horizontal(|ui| {
        ui.label(RichText::new(label).small().color(colors::ui::LABEL));
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            ui.label(RichText::new(value).small().color(colors::ui::VALUE));
        });
    });
}
