use serde::{Deserialize, Serialize};

/// Tuning knobs for the declutter simulation and thumbnail sizing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Pull towards the home x coordinate.
    pub strength_x: f64,
    /// Pull towards the home y coordinate.
    pub strength_y: f64,
    /// Extra pixels added to every collision radius.
    pub collision_padding: f64,
    pub alpha_decay: f64,
    /// Below this alpha the simulation is settled and stops moving.
    pub alpha_min: f64,
    /// Alpha restored on node, home or pointer changes.
    pub reheat_alpha: f64,
    /// Fraction of velocity lost per tick.
    pub velocity_decay: f64,

    pub proximity_enabled: bool,
    pub mouse_proximity_radius: f64,
    pub min_scale: f64,
    pub max_scale: f64,

    pub min_camera_scale: f64,
    pub max_camera_scale: f64,
    /// At or above this many cameras thumbnails use `min_camera_scale`.
    pub cameras_at_min_scale: usize,
    /// At or below this many cameras thumbnails use `max_camera_scale`.
    pub cameras_at_max_scale: usize,
    /// Unscaled thumbnail box, width and height in pixels.
    pub base_box_px: [f64; 2],
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            strength_x: 0.1,
            strength_y: 0.1,
            collision_padding: 5.0,
            alpha_decay: 1.0 - 0.001_f64.powf(1.0 / 300.0),
            alpha_min: 0.001,
            reheat_alpha: 0.3,
            velocity_decay: 0.4,
            proximity_enabled: true,
            mouse_proximity_radius: 300.0,
            min_scale: 1.0,
            max_scale: 2.0,
            min_camera_scale: 0.1,
            max_camera_scale: 0.5,
            cameras_at_min_scale: 50,
            cameras_at_max_scale: 5,
            base_box_px: [320.0, 240.0],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::LayoutConfig;
    use pretty_assertions::assert_eq;

    #[test]
    fn default_decay_settles_in_about_300_ticks() {
        let cfg = LayoutConfig::default();
        let mut alpha: f64 = 1.0;
        let mut ticks = 0;
        while alpha >= cfg.alpha_min {
            alpha += (0.0 - alpha) * cfg.alpha_decay;
            ticks += 1;
        }
        assert!((299..=301).contains(&ticks), "settled after {ticks} ticks");
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg: LayoutConfig =
            serde_json::from_str(r#"{ "strength_x": 0.25, "proximity_enabled": false }"#)
                .expect("config");
        assert_eq!(cfg.strength_x, 0.25);
        assert!(!cfg.proximity_enabled);
        assert_eq!(cfg.strength_y, LayoutConfig::default().strength_y);
        assert_eq!(cfg.base_box_px, [320.0, 240.0]);
    }
}
