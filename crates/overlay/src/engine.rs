use std::collections::{BTreeMap, BTreeSet};

use admission::{
    ActiveSet, AdmissionController, Completion, FetchError, FetchRequest, FetchTicket, Transition,
};
use catalog::{Camera, CameraCatalog, StatusMap};
use foundation::math::ScreenPoint;
use foundation::{CameraId, Viewport};
use layout::{LayoutConfig, MercatorProjector, NodeInput, Projector, Simulation};
use runtime::metrics::names;
use runtime::{EventBus, EventKind, Frame, Metrics};
use tracing::{debug, info, warn};

use crate::config::{ConfigError, OverlayConfig};
use crate::record::RenderRecord;

/// Events kept for inspection before the oldest are dropped.
const EVENT_HISTORY: usize = 4096;

/// Owns every piece of overlay state for one map.
///
/// Inputs arrive as method calls (feed snapshots, viewport changes, fetch
/// completions, pointer moves) and are applied one at a time. Image fetches
/// are described by the returned [`FetchRequest`]s; the caller performs them
/// and reports back through [`OverlayEngine::on_fetch_complete`].
#[derive(Debug)]
pub struct OverlayEngine<H> {
    config: OverlayConfig,
    catalog: CameraCatalog,
    viewport: Option<Viewport>,
    projector: Option<MercatorProjector>,
    admission: AdmissionController<H>,
    simulation: Simulation,
    frame: Frame,
    issued_at: BTreeMap<FetchTicket, u64>,
    metrics: Metrics,
    events: EventBus,
}

impl<H> OverlayEngine<H> {
    pub fn new(config: OverlayConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let admission = match config.rng_seed {
            Some(seed) => AdmissionController::seeded(config.admission(), seed),
            None => AdmissionController::new(config.admission()),
        };
        Ok(Self {
            simulation: Simulation::new(config.layout.clone()),
            frame: Frame::first(config.tick_hz),
            catalog: CameraCatalog::new(),
            viewport: None,
            projector: None,
            admission,
            issued_at: BTreeMap::new(),
            metrics: Metrics::new(),
            events: EventBus::with_capacity_limit(EVENT_HISTORY),
            config,
        })
    }

    pub fn config(&self) -> &OverlayConfig {
        &self.config
    }

    pub fn catalog(&self) -> &CameraCatalog {
        &self.catalog
    }

    pub fn viewport(&self) -> Option<&Viewport> {
        self.viewport.as_ref()
    }

    pub fn active(&self) -> &ActiveSet<H> {
        self.admission.active()
    }

    pub fn simulation(&self) -> &Simulation {
        &self.simulation
    }

    pub fn frame(&self) -> Frame {
        self.frame
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Installs a new camera feed snapshot and re-runs admission.
    pub fn set_cameras(&mut self, cameras: Vec<Camera>) -> Vec<FetchRequest> {
        self.catalog.replace_snapshot(cameras);
        info!(cameras = self.catalog.len(), "camera snapshot installed");
        self.refresh()
    }

    /// Re-classifies camera health and re-runs admission.
    pub fn apply_statuses(&mut self, statuses: &StatusMap) -> Vec<FetchRequest> {
        let changed = self.catalog.apply_statuses(statuses);
        debug!(entries = statuses.len(), changed, "camera statuses applied");
        self.refresh()
    }

    /// Changes K; the next transition (run here) enforces it.
    pub fn set_max_active(
        &mut self,
        max_active: usize,
    ) -> Result<Vec<FetchRequest>, ConfigError> {
        OverlayConfig {
            max_active,
            ..self.config.clone()
        }
        .validate()?;
        self.config.max_active = max_active;
        self.admission.set_max_active(max_active);
        Ok(self.refresh())
    }

    pub fn set_layout_config(&mut self, layout: LayoutConfig) -> Result<(), ConfigError> {
        OverlayConfig {
            layout: layout.clone(),
            ..self.config.clone()
        }
        .validate()?;
        self.config.layout = layout.clone();
        self.simulation.set_config(layout);
        Ok(())
    }

    /// Applies a map viewport change.
    ///
    /// A fresh projector is built from the live viewport. Without bounds the
    /// admission step is skipped.
    pub fn on_viewport_change(&mut self, viewport: Viewport) -> Vec<FetchRequest> {
        self.projector = MercatorProjector::from_viewport(&viewport);
        self.viewport = Some(viewport);
        self.refresh()
    }

    /// Applies the result of a fetch issued by an earlier request.
    pub fn on_fetch_complete(
        &mut self,
        ticket: FetchTicket,
        result: Result<H, FetchError>,
    ) -> Completion {
        if let Some(issued) = self.issued_at.remove(&ticket) {
            let latency = self.frame.index.saturating_sub(issued);
            self.metrics
                .record_histogram(names::FETCH_LATENCY_FRAMES, latency as i64);
        }

        let completion = self.admission.complete(ticket, result);
        match &completion {
            Completion::Activated(id) => {
                self.metrics.inc_counter(names::ACTIVATED, 1);
                self.events.emit(self.frame, EventKind::Activated, id.as_str());
            }
            Completion::Failed(id, error) => {
                warn!(camera = %id, %error, "camera image fetch failed");
                self.metrics.inc_counter(names::FETCH_FAILED, 1);
                self.events.emit(self.frame, EventKind::FetchFailed, id.as_str());
                self.sync_layout(false);
            }
            Completion::Stale(id) => {
                self.metrics.inc_counter(names::FETCH_STALE, 1);
                let subject = id.as_ref().map(CameraId::as_str).unwrap_or("unknown");
                self.events.emit(self.frame, EventKind::StaleCompletion, subject);
            }
        }
        self.metrics
            .set_gauge(names::ACTIVE, self.admission.active().len() as i64);
        completion
    }

    /// Pointer position on the overlay surface, `None` when it left.
    pub fn on_pointer_move(&mut self, pointer: Option<ScreenPoint>) {
        self.simulation.set_pointer(pointer);
    }

    /// Camera currently enlarged by the pointer, if any.
    pub fn focused(&self) -> Option<&CameraId> {
        self.simulation.closest_to_pointer()
    }

    /// Advances the layout one step and returns what to draw.
    pub fn tick(&mut self) -> Vec<RenderRecord> {
        let was_idle = self.simulation.is_idle();
        let frames = self.simulation.tick();
        if !was_idle {
            self.metrics.inc_counter(names::TICKS, 1);
        }
        self.frame = self.frame.next();

        let box_px = self.simulation.box_px();
        let active = self.admission.active();
        frames
            .into_iter()
            .filter_map(|f| {
                let camera = active.get(&f.camera_id)?;
                Some(RenderRecord {
                    width: box_px.x * f.scale,
                    height: box_px.y * f.scale,
                    image: camera.image_state(),
                    strained: f.is_strained(),
                    camera_id: f.camera_id,
                    x: f.x,
                    y: f.y,
                    scale: f.scale,
                })
            })
            .collect()
    }

    fn refresh(&mut self) -> Vec<FetchRequest> {
        let Some(bounds) = self.viewport.and_then(|v| v.bounds) else {
            debug!("viewport has no bounds yet; skipping admission");
            return Vec::new();
        };

        let visible = self.catalog.visible(&bounds);
        self.metrics.set_gauge(names::VISIBLE, visible.len() as i64);
        let transition = self.admission.transition(&visible);
        self.record_transition(&transition);
        self.sync_layout(transition.is_noop());
        transition.requests
    }

    fn record_transition(&mut self, t: &Transition) {
        for id in &t.evicted {
            self.events.emit(self.frame, EventKind::Evicted, id.as_str());
        }
        for id in &t.pruned {
            self.events.emit(self.frame, EventKind::Pruned, id.as_str());
        }
        for req in &t.requests {
            self.events
                .emit(self.frame, EventKind::Admitted, req.camera_id.as_str());
            self.issued_at.insert(req.ticket, self.frame.index);
        }
        self.metrics.inc_counter(names::EVICTED, t.evicted.len() as u64);
        self.metrics.inc_counter(names::PRUNED, t.pruned.len() as u64);
        self.metrics
            .inc_counter(names::ADMITTED, t.requests.len() as u64);
        self.metrics
            .set_gauge(names::ACTIVE, self.admission.active().len() as i64);
    }

    /// Feeds the active cameras' projected homes to the layout.
    ///
    /// Without a projector the layout is emptied. When the active set is
    /// unchanged and already laid out, only the homes move.
    fn sync_layout(&mut self, homes_only: bool) {
        let Some(projector) = self.projector else {
            self.simulation.sync(&[]);
            return;
        };
        let inputs: Vec<NodeInput> = self
            .admission
            .active()
            .iter()
            .filter_map(|a| {
                let home = projector.project(a.camera.valid_location()?)?;
                Some(NodeInput {
                    camera_id: a.id().clone(),
                    home,
                })
            })
            .collect();

        let same_nodes = homes_only && {
            let laid_out: BTreeSet<&CameraId> = self.simulation.camera_ids().collect();
            let wanted: BTreeSet<&CameraId> = inputs.iter().map(|n| &n.camera_id).collect();
            laid_out == wanted
        };
        if same_nodes {
            let homes: BTreeMap<CameraId, ScreenPoint> = inputs
                .into_iter()
                .map(|n| (n.camera_id, n.home))
                .collect();
            self.simulation.set_homes(&homes);
        } else {
            self.simulation.sync(&inputs);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeSet, HashSet};

    use admission::{Completion, FetchError, FetchRequest, ImageState};
    use catalog::{Camera, CameraStatus, StatusMap};
    use foundation::math::{LatLng, ScreenPoint, Vec2};
    use foundation::{CameraId, Viewport};
    use layout::LayoutConfig;
    use pretty_assertions::assert_eq;
    use runtime::EventKind;
    use runtime::metrics::names;

    use super::OverlayEngine;
    use crate::config::{ConfigError, OverlayConfig};

    const AUSTIN: LatLng = LatLng {
        lat: 30.2672,
        lng: -97.7431,
    };

    fn engine(k: usize) -> OverlayEngine<String> {
        OverlayEngine::new(OverlayConfig {
            max_active: k,
            rng_seed: Some(3),
            ..OverlayConfig::default()
        })
        .expect("engine")
    }

    fn viewport_at(center: LatLng) -> Viewport {
        Viewport::from_center_zoom(center, 15.0, Vec2::new(1280.0, 800.0))
    }

    /// Ten cameras spread over a few blocks around downtown.
    fn downtown_cameras() -> Vec<Camera> {
        (0..10)
            .map(|i| {
                let f = i as f64;
                Camera::at(format!("d{i}"), AUSTIN.lat + f * 0.0005, AUSTIN.lng + f * 0.0007)
            })
            .collect()
    }

    fn complete_all(engine: &mut OverlayEngine<String>, requests: &[FetchRequest]) {
        for req in requests {
            let image = format!("jpeg:{}", req.camera_id);
            assert!(matches!(
                engine.on_fetch_complete(req.ticket, Ok(image)),
                Completion::Activated(_)
            ));
        }
    }

    #[test]
    fn first_viewport_admits_up_to_k_and_renders_loading() {
        let mut engine = engine(4);
        assert!(engine.set_cameras(downtown_cameras()).is_empty());

        let requests = engine.on_viewport_change(viewport_at(AUSTIN));
        assert_eq!(requests.len(), 4);
        assert_eq!(engine.metrics().gauge(names::VISIBLE), Some(10));

        let records = engine.tick();
        assert_eq!(records.len(), 4);
        assert!(records.iter().all(|r| r.image == ImageState::Loading));
        assert!(records.iter().all(|r| r.width > 0.0 && r.height > 0.0));

        complete_all(&mut engine, &requests);
        let records = engine.tick();
        assert!(records.iter().all(|r| r.is_ready()));
        assert_eq!(engine.metrics().counter(names::ACTIVATED), 4);
    }

    #[test]
    fn unchanged_viewport_issues_no_new_fetches() {
        let mut engine = engine(4);
        engine.set_cameras(downtown_cameras());
        let first = engine.on_viewport_change(viewport_at(AUSTIN));
        assert_eq!(first.len(), 4);
        assert!(engine.on_viewport_change(viewport_at(AUSTIN)).is_empty());
        assert_eq!(engine.active().len(), 4);
    }

    #[test]
    fn panning_away_evicts_and_discards_late_images() {
        let mut engine = engine(4);
        engine.set_cameras(downtown_cameras());
        let requests = engine.on_viewport_change(viewport_at(AUSTIN));

        let far_away = LatLng::new(40.7128, -74.0060);
        assert!(engine.on_viewport_change(viewport_at(far_away)).is_empty());
        assert!(engine.active().is_empty());
        assert_eq!(engine.events().count(EventKind::Evicted), 4);
        assert!(engine.tick().is_empty());

        let late = &requests[0];
        let outcome = engine.on_fetch_complete(late.ticket, Ok("late".to_string()));
        assert_eq!(outcome, Completion::Stale(Some(late.camera_id.clone())));
        assert!(engine.active().is_empty());
        assert_eq!(engine.metrics().counter(names::FETCH_STALE), 1);
    }

    #[test]
    fn failed_fetch_frees_a_slot_for_the_next_viewport_change() {
        let mut engine = engine(4);
        engine.set_cameras(downtown_cameras());
        let requests = engine.on_viewport_change(viewport_at(AUSTIN));

        let failed = &requests[0];
        let outcome = engine.on_fetch_complete(failed.ticket, Err(FetchError::Status(503)));
        assert!(matches!(outcome, Completion::Failed(_, FetchError::Status(503))));
        assert_eq!(engine.active().len(), 3);
        assert_eq!(engine.tick().len(), 3);

        let refill = engine.on_viewport_change(viewport_at(AUSTIN));
        assert_eq!(refill.len(), 1);
        assert_eq!(engine.active().len(), 4);
    }

    #[test]
    fn viewport_without_bounds_is_transient() {
        let mut engine = engine(4);
        engine.set_cameras(downtown_cameras());
        assert!(engine.on_viewport_change(Viewport::unmounted(15.0, AUSTIN)).is_empty());
        assert!(engine.active().is_empty());
        assert!(engine.tick().is_empty());
    }

    #[test]
    fn render_records_start_at_projected_homes() {
        let mut engine = engine(8);
        engine.set_cameras(vec![Camera::at("center", AUSTIN.lat, AUSTIN.lng)]);
        engine.on_viewport_change(viewport_at(AUSTIN));

        let records = engine.tick();
        assert_eq!(records.len(), 1);
        assert!((records[0].x - 640.0).abs() < 1e-6);
        assert!((records[0].y - 400.0).abs() < 1e-6);
        assert!(!records[0].strained);
    }

    #[test]
    fn clustered_cameras_do_not_overlap_once_settled() {
        let mut engine = engine(4);
        let cameras: Vec<Camera> = (0..4)
            .map(|i| Camera::at(format!("c{i}"), AUSTIN.lat, AUSTIN.lng + i as f64 * 1e-6))
            .collect();
        engine.set_cameras(cameras);
        engine.on_viewport_change(viewport_at(AUSTIN));

        let mut records = Vec::new();
        for _ in 0..120 {
            records = engine.tick();
        }
        assert_eq!(records.len(), 4);
        for (i, a) in records.iter().enumerate() {
            for b in &records[i + 1..] {
                let d = ScreenPoint::new(a.x, a.y).distance(ScreenPoint::new(b.x, b.y));
                assert!(d >= a.width * 0.5 + b.width * 0.5 - 1e-6, "{} and {} overlap", a.camera_id, b.camera_id);
            }
        }
    }

    #[test]
    fn pointer_focuses_nearest_camera() {
        let mut engine = engine(8);
        engine.set_cameras(vec![Camera::at("center", AUSTIN.lat, AUSTIN.lng)]);
        engine.on_viewport_change(viewport_at(AUSTIN));
        engine.tick();

        engine.on_pointer_move(Some(ScreenPoint::new(640.0, 400.0)));
        assert_eq!(engine.focused().map(CameraId::as_str), Some("center"));
        let records = engine.tick();
        assert!((records[0].scale - 2.0).abs() < 1e-6);

        engine.on_pointer_move(None);
        assert_eq!(engine.focused(), None);
    }

    #[test]
    fn statuses_gate_admission_under_strict_policy() {
        let mut engine: OverlayEngine<String> = OverlayEngine::new(OverlayConfig {
            max_active: 8,
            admission_policy: admission::AdmissionPolicy::AvailableOnly,
            rng_seed: Some(1),
            ..OverlayConfig::default()
        })
        .expect("engine");
        engine.set_cameras(downtown_cameras());
        assert!(engine.on_viewport_change(viewport_at(AUSTIN)).is_empty());

        let statuses = StatusMap::from_pairs([("d1", "200"), ("d2", "200"), ("d3", "404")]);
        let requests = engine.apply_statuses(&statuses);
        let admitted: HashSet<&str> = requests.iter().map(|r| r.camera_id.as_str()).collect();
        assert_eq!(admitted, HashSet::from(["d1", "d2"]));
        assert_eq!(
            engine.catalog().get(&"d3".into()).map(|c| c.status),
            Some(CameraStatus::Unavailable)
        );
    }

    #[test]
    fn lowering_k_prunes_immediately() {
        let mut engine = engine(6);
        engine.set_cameras(downtown_cameras());
        engine.on_viewport_change(viewport_at(AUSTIN));
        assert_eq!(engine.active().len(), 6);

        assert!(engine.set_max_active(2).expect("valid k").is_empty());
        assert_eq!(engine.active().len(), 2);
        assert_eq!(engine.events().count(EventKind::Pruned), 4);
        assert_eq!(engine.tick().len(), 2);
    }

    fn laid_out_ids(engine: &OverlayEngine<String>) -> BTreeSet<CameraId> {
        engine.simulation().camera_ids().cloned().collect()
    }

    fn active_ids(engine: &OverlayEngine<String>) -> BTreeSet<CameraId> {
        engine.active().ids().cloned().collect()
    }

    #[test]
    fn layout_follows_admission_across_unsized_viewports() {
        let nyc = LatLng::new(40.7128, -74.0060);
        let mut engine = engine(2);
        engine.set_cameras(vec![
            Camera::at("a1", AUSTIN.lat, AUSTIN.lng),
            Camera::at("a2", AUSTIN.lat + 0.001, AUSTIN.lng),
            Camera::at("b1", nyc.lat, nyc.lng),
            Camera::at("b2", nyc.lat + 0.001, nyc.lng),
        ]);
        engine.on_viewport_change(viewport_at(AUSTIN));
        assert_eq!(laid_out_ids(&engine), active_ids(&engine));
        assert_eq!(engine.tick().len(), 2);

        let sized = viewport_at(nyc);
        let bounds = sized.bounds.expect("bounds");
        engine.on_viewport_change(Viewport::new(15.0, nyc, bounds));
        assert_eq!(
            active_ids(&engine),
            BTreeSet::from([CameraId::from("b1"), CameraId::from("b2")])
        );
        assert!(engine.simulation().is_empty());
        assert!(engine.tick().is_empty());

        assert!(engine.on_viewport_change(sized).is_empty());
        assert_eq!(laid_out_ids(&engine), active_ids(&engine));
        let drawn: BTreeSet<CameraId> = engine.tick().into_iter().map(|r| r.camera_id).collect();
        assert_eq!(drawn, active_ids(&engine));
    }

    #[test]
    fn runtime_changes_are_validated() {
        let mut engine = engine(4);
        engine.set_cameras(downtown_cameras());
        engine.on_viewport_change(viewport_at(AUSTIN));

        let err = engine.set_max_active(0).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "max_active", .. }));
        assert_eq!(engine.config().max_active, 4);
        assert_eq!(engine.active().len(), 4);

        let bad = LayoutConfig {
            min_scale: 3.0,
            max_scale: 2.0,
            ..LayoutConfig::default()
        };
        let err = engine.set_layout_config(bad).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "max_scale", .. }));
        assert_eq!(engine.config().layout, LayoutConfig::default());

        let wider = LayoutConfig {
            collision_padding: 12.0,
            ..LayoutConfig::default()
        };
        engine.set_layout_config(wider.clone()).expect("valid layout");
        assert_eq!(engine.simulation().config(), &wider);
    }

    #[test]
    fn rejects_invalid_config() {
        let result: Result<OverlayEngine<String>, _> = OverlayEngine::new(OverlayConfig {
            max_active: 0,
            ..OverlayConfig::default()
        });
        assert!(result.is_err());
    }
}
