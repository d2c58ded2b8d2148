use foundation::math::{ScreenPoint, Vec2};
use foundation::Viewport;

/// Scripted map interaction: a constant-velocity pan plus a pointer that
/// circles the container center.
#[derive(Debug, Clone)]
pub struct PanScript {
    /// Pan velocity in screen pixels per second.
    pub velocity_px_per_s: Vec2,
    /// Ticks between viewport change notifications.
    pub notify_every: u64,
    /// Radius of the pointer orbit; zero keeps the pointer off the surface.
    pub pointer_orbit_px: f64,
    /// Seconds per pointer revolution.
    pub pointer_period_s: f64,
    pending_px: Vec2,
}

impl PanScript {
    pub fn new(velocity_px_per_s: Vec2, notify_every: u64) -> Self {
        Self {
            velocity_px_per_s,
            notify_every: notify_every.max(1),
            pointer_orbit_px: 0.0,
            pointer_period_s: 8.0,
            pending_px: Vec2::ZERO,
        }
    }

    pub fn with_pointer_orbit(mut self, radius_px: f64, period_s: f64) -> Self {
        self.pointer_orbit_px = radius_px;
        self.pointer_period_s = period_s;
        self
    }

    pub fn is_panning(&self) -> bool {
        self.velocity_px_per_s != Vec2::ZERO
    }

    /// Accumulates one tick of motion. Returns true when `viewport` moved and
    /// the overlay should be notified.
    pub fn step(&mut self, viewport: &mut Viewport, tick: u64, dt_s: f64) -> bool {
        if !self.is_panning() {
            return false;
        }
        self.pending_px = self.pending_px + self.velocity_px_per_s * dt_s;
        if tick % self.notify_every != 0 {
            return false;
        }
        viewport.pan_by_px(self.pending_px);
        self.pending_px = Vec2::ZERO;
        true
    }

    /// Pointer position for the tick at `time_s`.
    pub fn pointer(&self, viewport: &Viewport, time_s: f64) -> Option<ScreenPoint> {
        if self.pointer_orbit_px <= 0.0 || self.pointer_period_s <= 0.0 {
            return None;
        }
        let size = viewport.size_px?;
        let center = size * 0.5 + viewport.origin_px;
        let angle = std::f64::consts::TAU * time_s / self.pointer_period_s;
        Some(center + Vec2::new(angle.cos(), angle.sin()) * self.pointer_orbit_px)
    }
}

#[cfg(test)]
mod tests {
    use foundation::math::{LatLng, Vec2};
    use foundation::Viewport;

    use super::PanScript;

    fn viewport() -> Viewport {
        Viewport::from_center_zoom(LatLng::new(30.27, -97.74), 15.0, Vec2::new(800.0, 600.0))
    }

    #[test]
    fn pans_in_batches() {
        let mut vp = viewport();
        let start = vp.center;
        let mut script = PanScript::new(Vec2::new(60.0, 0.0), 10);

        let notified: Vec<u64> = (1..=30)
            .filter(|&tick| script.step(&mut vp, tick, 1.0 / 60.0))
            .collect();
        assert_eq!(notified, vec![10, 20, 30]);
        assert!(vp.center.lng > start.lng);
        assert!((vp.center.lat - start.lat).abs() < 1e-9);
    }

    #[test]
    fn still_script_never_notifies() {
        let mut vp = viewport();
        let mut script = PanScript::new(Vec2::ZERO, 1);
        assert!(!script.step(&mut vp, 1, 0.016));
        assert_eq!(script.pointer(&vp, 0.0), None);
    }

    #[test]
    fn pointer_orbits_container_center() {
        let vp = viewport();
        let script = PanScript::new(Vec2::ZERO, 1).with_pointer_orbit(100.0, 4.0);
        let p = script.pointer(&vp, 0.0).expect("pointer");
        assert!((p.x - 500.0).abs() < 1e-9);
        assert!((p.y - 300.0).abs() < 1e-9);
        let q = script.pointer(&vp, 1.0).expect("pointer");
        assert!((q.x - 400.0).abs() < 1e-9);
        assert!((q.y - 400.0).abs() < 1e-9);
    }
}
