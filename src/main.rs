#![warn(clippy::all)]

//! Fleet Map Workbench - a real-time fleet map viewer.
//!
//! Runs the fleet map engine over a simulated fleet: a refresh loop feeds
//! vehicle snapshots into the map view, which is rasterized each time the
//! data or the window size changes.

mod ui;

use eframe::egui;
use fleetmap_workbench::fleet::{DensityPoint, SimulatedFleet};
use fleetmap_workbench::geo::{GeoError, ViewportSize};
use fleetmap_workbench::live::{
    LiveRefreshLoop, ManualClock, RefreshEvent, RefreshInbox, StopHandle,
};
use fleetmap_workbench::render::LayerRenderer;
use fleetmap_workbench::state::{EngineSettings, MapViewState};
use futures_executor::LocalPool;
use std::time::Duration;
use ui::{MapCanvas, MapMode, PanelAction, RefreshStatus};

/// Vehicles in the simulated fleet.
const FLEET_SIZE: usize = 40;

// Native entry point
#[cfg(not(target_arch = "wasm32"))]
fn main() -> eframe::Result<()> {
    env_logger::init();

    // Optional settings file as the first argument
    let settings = match std::env::args_os().nth(1) {
        Some(path) => match EngineSettings::from_file(std::path::Path::new(&path)) {
            Ok(settings) => {
                log::info!("Loaded settings from {:?}", path);
                settings
            }
            Err(e) => {
                log::error!("{}; using defaults", e);
                EngineSettings::default()
            }
        },
        None => EngineSettings::default(),
    };

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([1200.0, 700.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Fleet Map Workbench",
        native_options,
        Box::new(|cc| Ok(Box::new(WorkbenchApp::new(cc, settings)?))),
    )
}

// WASM entry point - main is not called on wasm32
#[cfg(target_arch = "wasm32")]
fn main() {}

/// Entry point for the WASM application.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen::prelude::wasm_bindgen(start)]
pub async fn start() {
    use eframe::wasm_bindgen::JsCast as _;

    // Redirect `log` messages to `console.log`:
    eframe::WebLogger::init(log::LevelFilter::Debug).ok();

    let web_options = eframe::WebOptions::default();

    wasm_bindgen_futures::spawn_local(async {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            log::error!("No document to mount the app in");
            return;
        };

        let Some(canvas) = document
            .get_element_by_id("app_canvas")
            .and_then(|e| e.dyn_into::<web_sys::HtmlCanvasElement>().ok())
        else {
            log::error!("Missing app_canvas element");
            return;
        };

        let start_result = eframe::WebRunner::new()
            .start(
                canvas,
                web_options,
                Box::new(|cc| Ok(Box::new(WorkbenchApp::new(cc, EngineSettings::load())?))),
            )
            .await;

        // Remove the loading text once the app has loaded:
        if let Some(loading_text) = document.get_element_by_id("loading_text") {
            match start_result {
                Ok(_) => {
                    loading_text.remove();
                }
                Err(e) => {
                    loading_text.set_inner_html(
                        "<p>The app has crashed. See the developer console for details.</p>",
                    );
                    log::error!("Failed to start eframe: {e:?}");
                }
            }
        }
    });
}

/// Main application state and logic.
pub struct WorkbenchApp {
    settings: EngineSettings,

    mode: MapMode,

    /// Entities, frame, and selection shown on the map
    view: MapViewState,

    renderer: LayerRenderer,

    canvas: MapCanvas,

    /// Executor for the refresh loop, polled once per UI frame
    pool: LocalPool,

    /// Timer the refresh loop sleeps on, synced to wall time each frame
    clock: ManualClock,
    started_at: web_time::Instant,

    /// Updates from the refresh loop, drained each frame
    inbox: RefreshInbox,

    refresh: Option<StopHandle>,

    /// Application status message displayed in top bar
    status_message: String,
}

impl WorkbenchApp {
    pub fn new(cc: &eframe::CreationContext<'_>, settings: EngineSettings) -> Result<Self, GeoError> {
        let mut fonts = egui::FontDefinitions::default();
        egui_phosphor::add_to_fonts(&mut fonts, egui_phosphor::Variant::Regular);
        cc.egui_ctx.set_fonts(fonts);

        let settings = match settings.validate() {
            Ok(()) => settings,
            Err(e) => {
                log::warn!("{}; using defaults", e);
                EngineSettings::default()
            }
        };

        // Placeholder until the canvas reports its real size
        let view = MapViewState::new(&settings, ViewportSize::new(900, 500)?)?;

        let mut app = Self {
            renderer: LayerRenderer::new(settings.layer_style()),
            settings,
            mode: MapMode::Live,
            view,
            canvas: MapCanvas::new(),
            pool: LocalPool::new(),
            clock: ManualClock::new(),
            started_at: web_time::Instant::now(),
            inbox: RefreshInbox::new(),
            refresh: None,
            status_message: "Starting...".to_string(),
        };
        app.start_refresh();
        Ok(app)
    }

    /// (Re)starts the refresh loop for the current mode.
    fn start_refresh(&mut self) {
        self.stop_refresh();

        let fleet = SimulatedFleet::new(self.settings.default_center, FLEET_SIZE)
            .with_intensity(self.mode.with_intensity());
        if let Err(e) = self.view.set_fit_policy(self.mode.fit_policy(&self.settings)) {
            log::warn!("Ignoring fit policy for {}: {}", self.mode.label(), e);
        }
        if !self.mode.with_intensity() {
            self.view.set_density_points(Vec::new());
        }

        let refresh_loop = LiveRefreshLoop::new(fleet, self.clock.clone(), self.settings.fitter())
            .with_filter(self.mode.filter());
        let interval = Duration::from_millis(self.mode.refresh_interval_ms(&self.settings));

        match self.inbox.attach(refresh_loop, interval, &self.pool.spawner()) {
            Ok(handle) => {
                log::info!("Started {} refresh", self.mode.label());
                self.status_message = format!("{}: connecting...", self.mode.label());
                self.refresh = Some(handle);
            }
            Err(e) => {
                log::error!("{}", e);
                self.status_message = e.to_string();
            }
        }
    }

    fn stop_refresh(&mut self) {
        if let Some(handle) = &self.refresh {
            handle.stop();
        }
        // Let the loop observe the stop and drop its timer
        self.pool.run_until_stalled();
    }

    fn process_refresh_events(&mut self) {
        while let Some(event) = self.inbox.try_recv() {
            match event {
                RefreshEvent::Updated { entities, bounds } => {
                    if self.mode.with_intensity() {
                        self.view
                            .set_density_points(DensityPoint::from_entities(&entities));
                    }
                    let count = entities.len();
                    match self.view.apply_update(entities, bounds) {
                        Ok(()) => {
                            self.status_message =
                                format!("{}: {} vehicles", self.mode.label(), count);
                        }
                        Err(e) => log::error!("Dropped update with invalid box: {}", e),
                    }
                }
                RefreshEvent::Failed(e) => {
                    self.status_message = format!("{} (showing last data)", e);
                }
            }
        }
    }

    fn handle_panel_action(&mut self, action: PanelAction) {
        match action {
            PanelAction::None => {}
            PanelAction::SwitchMode(mode) => {
                log::info!("Switching to {}", mode.label());
                self.mode = mode;
                self.view.clear_selection();
                self.start_refresh();
            }
            PanelAction::RefreshNow => {
                if let Some(handle) = &self.refresh {
                    handle.request_refresh();
                }
            }
            PanelAction::Stop => {
                self.stop_refresh();
                self.status_message = "Refresh stopped".to_string();
            }
            PanelAction::Resume => self.start_refresh(),
            PanelAction::SetPickMode(mode) => {
                self.settings.pick_mode = mode;
                self.view.set_hit_tester(self.settings.hit_tester());
                #[cfg(target_arch = "wasm32")]
                self.settings.save();
            }
        }
    }
}

impl eframe::App for WorkbenchApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Advance the loop's clock to wall time and run whatever is due
        self.clock.advance_to(self.started_at.elapsed());
        self.pool.run_until_stalled();
        self.process_refresh_events();

        // Side and top/bottom panels must be rendered before CentralPanel
        ui::render_top_bar(ctx, &self.view, &self.status_message);

        let stats = self.refresh.as_ref().map(|h| h.stats());
        let action = ui::render_side_panel(
            ctx,
            &mut self.view,
            self.mode,
            self.settings.pick_mode,
            RefreshStatus {
                running: self.refresh.as_ref().is_some_and(|h| h.is_running()),
                stats: stats.as_ref(),
                interval_ms: self.mode.refresh_interval_ms(&self.settings),
                render_ms: self.canvas.last_render_ms(),
            },
        );

        ui::render_canvas(ctx, &mut self.view, &self.renderer, &mut self.canvas);

        self.handle_panel_action(action);

        // Wake up for the next tick even without input
        if let Some(deadline) = self.clock.next_deadline() {
            let wait = deadline.saturating_sub(self.clock.now());
            ctx.request_repaint_after(wait.max(Duration::from_millis(16)));
        }
    }
}
