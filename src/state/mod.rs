//! Map view state.
//!
//! [`MapViewState`] owns what the map shows: the current entity snapshots,
//! density samples, the frame both drawing and picking use, and the
//! selection. Refresh updates arrive through [`MapViewState::apply_update`].

mod frame;
mod selection;
mod settings;

pub use frame::FrameState;
pub use selection::SelectionState;
pub use settings::{EngineSettings, SettingsError};

use crate::fleet::{DensityPoint, FleetSummary, TrackedEntity};
use crate::geo::{BoundingBox, FitPolicy, GeoError, HitTester, ScreenPoint, ViewportSize};
use crate::render::{legend_for, LayerRenderer, LegendEntry, RenderStatus, Surface};
use chrono::{DateTime, Utc};

/// Everything the map view renders and picks against.
pub struct MapViewState {
    entities: Vec<TrackedEntity>,
    density: Vec<DensityPoint>,
    frame: FrameState,
    selection: SelectionState,
    fit_policy: FitPolicy,
    hit_tester: HitTester,
    last_update: Option<DateTime<Utc>>,
    /// Set when the surface content no longer matches the state.
    needs_redraw: bool,
}

impl MapViewState {
    pub fn new(settings: &EngineSettings, viewport: ViewportSize) -> Result<Self, GeoError> {
        let initial = match &settings.fit_policy {
            FitPolicy::Fixed { bounds } => *bounds,
            _ => settings.fitter().default_bounds(),
        };
        Ok(Self {
            entities: Vec::new(),
            density: Vec::new(),
            frame: FrameState::new(initial, viewport)?,
            selection: SelectionState::default(),
            fit_policy: settings.fit_policy,
            hit_tester: settings.hit_tester(),
            last_update: None,
            needs_redraw: true,
        })
    }

    pub fn entities(&self) -> &[TrackedEntity] {
        &self.entities
    }

    pub fn density(&self) -> &[DensityPoint] {
        &self.density
    }

    pub fn frame(&self) -> &FrameState {
        &self.frame
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn fit_policy(&self) -> FitPolicy {
        self.fit_policy
    }

    pub fn last_update(&self) -> Option<DateTime<Utc>> {
        self.last_update
    }

    pub fn summary(&self) -> FleetSummary {
        FleetSummary::from_entities(&self.entities)
    }

    pub fn legend(&self) -> Vec<LegendEntry> {
        legend_for(&self.entities)
    }

    /// Replaces the entity set and applies the box chosen by the fit
    /// policy. A selection whose id is gone is cleared.
    ///
    /// On error (an invalid fitted box) nothing changes.
    pub fn apply_update(
        &mut self,
        entities: Vec<TrackedEntity>,
        fitted: BoundingBox,
    ) -> Result<(), GeoError> {
        let bounds = self.fit_policy.choose(self.frame.bounds(), fitted, &entities);
        self.frame.set_bounds(bounds)?;

        self.entities = entities;
        self.selection.reconcile(&self.entities);
        self.last_update = Some(Utc::now());
        self.needs_redraw = true;
        Ok(())
    }

    pub fn set_density_points(&mut self, points: Vec<DensityPoint>) {
        self.density = points;
        self.needs_redraw = true;
    }

    /// Returns whether the viewport changed.
    pub fn set_viewport(&mut self, viewport: ViewportSize) -> Result<bool, GeoError> {
        let changed = self.frame.set_viewport(viewport)?;
        if changed {
            self.needs_redraw = true;
        }
        Ok(changed)
    }

    /// Switches fit policy. A fixed policy takes effect immediately; the
    /// others apply from the next update.
    pub fn set_fit_policy(&mut self, policy: FitPolicy) -> Result<(), GeoError> {
        if let FitPolicy::Fixed { bounds } = policy {
            self.frame.set_bounds(bounds)?;
            self.needs_redraw = true;
        }
        self.fit_policy = policy;
        Ok(())
    }

    pub fn set_hit_tester(&mut self, hit_tester: HitTester) {
        self.hit_tester = hit_tester;
    }

    /// Entity under a pointer, resolved against the frame last applied.
    pub fn entity_at(&self, point: ScreenPoint) -> Option<&TrackedEntity> {
        self.frame.pick(point, &self.entities, &self.hit_tester)
    }

    /// Pointer click: selects the entity under the pointer, or clears the
    /// selection on a miss. Returns the new selection.
    pub fn click(&mut self, point: ScreenPoint) -> Option<&TrackedEntity> {
        let picked = self.entity_at(point).map(|e| e.id.clone());
        match picked {
            Some(id) => self.selection.select(id),
            None => self.selection.clear(),
        }
        // The selection ring is an overlay; the raster is unchanged
        self.selected()
    }

    /// Selects by id from a list, bypassing hit-testing.
    pub fn select_id(&mut self, id: &str) -> bool {
        if self.entities.iter().any(|e| e.id == id) {
            self.selection.select(id);
            true
        } else {
            false
        }
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    pub fn selected(&self) -> Option<&TrackedEntity> {
        self.selection.resolve(&self.entities)
    }

    pub fn needs_redraw(&self) -> bool {
        self.needs_redraw
    }

    /// Draws the current state; a skipped render stays pending.
    pub fn render(&mut self, renderer: &LayerRenderer, surface: &mut dyn Surface) -> RenderStatus {
        let status = renderer.render(surface, &self.entities, &self.density, &self.frame);
        if status.is_rendered() {
            self.needs_redraw = false;
        }
        status
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fleet::VehicleStatus;
    use crate::geo::{GeoPoint, ViewportFitter};
    use crate::render::RasterSurface;

    fn viewport() -> ViewportSize {
        ViewportSize::new(900, 500).unwrap()
    }

    fn at(id: &str, lat: f64, lng: f64) -> TrackedEntity {
        TrackedEntity::new(id, GeoPoint::new(lat, lng).unwrap(), VehicleStatus::InUse)
    }

    fn apply(state: &mut MapViewState, entities: Vec<TrackedEntity>) {
        let fitted = ViewportFitter::default().compute_bounds(&entities);
        state.apply_update(entities, fitted).unwrap();
    }

    #[test]
    fn test_starts_on_default_box() {
        let state = MapViewState::new(&EngineSettings::default(), viewport()).unwrap();
        assert!(state.frame().bounds().contains(GeoPoint::new(40.7128, -74.006).unwrap()));
        assert!(state.entities().is_empty());
        assert!(state.needs_redraw());
    }

    #[test]
    fn test_click_selects_and_refresh_keeps_selection() {
        let mut state = MapViewState::new(&EngineSettings::default(), viewport()).unwrap();
        apply(&mut state, vec![at("V1", 40.70, -74.00), at("V2", 40.80, -73.90)]);

        let v1 = state.frame().projector().geo_to_screen(state.entities()[0].position);
        let selected = state.click(v1.offset(3.0, -2.0)).map(|e| e.id.clone());
        assert_eq!(selected.as_deref(), Some("V1"));

        // V1 moved; the selection follows the id
        apply(&mut state, vec![at("V1", 40.71, -74.01), at("V2", 40.80, -73.90)]);
        assert_eq!(state.selected().map(|e| e.position.latitude), Some(40.71));

        // V1 disappeared
        apply(&mut state, vec![at("V2", 40.80, -73.90)]);
        assert!(state.selected().is_none());
        assert_eq!(state.selection().selected_id(), None);
    }

    #[test]
    fn test_click_on_empty_space_clears() {
        let mut state = MapViewState::new(&EngineSettings::default(), viewport()).unwrap();
        apply(&mut state, vec![at("V1", 40.70, -74.00)]);
        assert!(state.select_id("V1"));
        assert!(state.click(ScreenPoint::new(1.0, 1.0)).is_none());
        assert!(!state.select_id("missing"));
    }

    #[test]
    fn test_pick_uses_applied_frame() {
        let mut state = MapViewState::new(&EngineSettings::default(), viewport()).unwrap();
        apply(&mut state, vec![at("V1", 40.70, -74.00), at("V2", 40.90, -73.80)]);
        let generation = state.frame().generation();
        let screen = state.frame().projector().geo_to_screen(state.entities()[1].position);
        assert_eq!(state.entity_at(screen).map(|e| e.id.as_str()), Some("V2"));

        state.set_viewport(ViewportSize::new(450, 250).unwrap()).unwrap();
        assert!(state.frame().generation() > generation);
        let scaled = state.frame().projector().geo_to_screen(state.entities()[1].position);
        assert!((scaled.x - screen.x / 2.0).abs() < 1e-9);
        assert_eq!(state.entity_at(scaled).map(|e| e.id.as_str()), Some("V2"));
    }

    #[test]
    fn test_fixed_policy_ignores_fitted_box() {
        let fixed = BoundingBox::new(40.65, 40.85, -74.1, -73.9);
        let settings = EngineSettings::default().with_fit_policy(FitPolicy::Fixed { bounds: fixed });
        let mut state = MapViewState::new(&settings, viewport()).unwrap();
        apply(&mut state, vec![at("V1", 41.5, -73.0)]);
        assert_eq!(*state.frame().bounds(), fixed);
    }

    #[test]
    fn test_keep_when_contained_avoids_jumps() {
        let settings = EngineSettings::default().with_fit_policy(FitPolicy::KeepWhenContained);
        let mut state = MapViewState::new(&settings, viewport()).unwrap();
        apply(&mut state, vec![at("V1", 40.70, -74.00), at("V2", 40.74, -73.96)]);
        let first = *state.frame().bounds();

        apply(&mut state, vec![at("V1", 40.71, -73.99), at("V2", 40.73, -73.97)]);
        assert_eq!(*state.frame().bounds(), first);

        apply(&mut state, vec![at("V1", 40.71, -73.99), at("V2", 40.95, -73.97)]);
        assert_ne!(*state.frame().bounds(), first);
    }

    #[test]
    fn test_render_clears_redraw_flag() {
        let mut state = MapViewState::new(&EngineSettings::default(), viewport()).unwrap();
        apply(&mut state, vec![at("V1", 40.70, -74.00)]);
        let mut surface = RasterSurface::unmounted();
        let renderer = LayerRenderer::default();
        assert!(!state.render(&renderer, &mut surface).is_rendered());
        assert!(state.needs_redraw());

        surface.resize(viewport());
        assert!(state.render(&renderer, &mut surface).is_rendered());
        assert!(!state.needs_redraw());
    }

    #[test]
    fn test_click_does_not_request_raster() {
        let mut state = MapViewState::new(&EngineSettings::default(), viewport()).unwrap();
        apply(&mut state, vec![at("V1", 40.70, -74.00)]);
        let mut surface = RasterSurface::new(viewport());
        assert!(state.render(&LayerRenderer::default(), &mut surface).is_rendered());

        let v1 = state.frame().projector().geo_to_screen(state.entities()[0].position);
        assert!(state.click(v1).is_some());
        assert!(!state.needs_redraw());
        assert!(state.click(ScreenPoint::new(1.0, 1.0)).is_none());
        assert!(!state.needs_redraw());
    }
}
