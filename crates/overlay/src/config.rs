use std::path::Path;

use admission::{AdmissionConfig, AdmissionPolicy, DEFAULT_MAX_ACTIVE};
use layout::LayoutConfig;
use runtime::DEFAULT_TICK_HZ;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    Io(String),
    Parse(String),
    Invalid { field: &'static str, reason: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(msg) => write!(f, "config unreadable: {msg}"),
            ConfigError::Parse(msg) => write!(f, "config malformed: {msg}"),
            ConfigError::Invalid { field, reason } => write!(f, "config `{field}` {reason}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Every knob of the overlay, as a flat JSON object.
///
/// Missing keys fall back to their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    /// Bound on simultaneously active cameras (K).
    pub max_active: usize,
    pub admission_policy: AdmissionPolicy,
    /// Seeds admission randomness; `None` draws from the OS.
    pub rng_seed: Option<u64>,
    pub tick_hz: f64,
    #[serde(flatten)]
    pub layout: LayoutConfig,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            max_active: DEFAULT_MAX_ACTIVE,
            admission_policy: AdmissionPolicy::default(),
            rng_seed: None,
            tick_hz: DEFAULT_TICK_HZ,
            layout: LayoutConfig::default(),
        }
    }
}

impl OverlayConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {e}", path.display())))?;
        Self::from_json_str(&json)
    }

    pub fn admission(&self) -> AdmissionConfig {
        AdmissionConfig {
            max_active: self.max_active,
            policy: self.admission_policy,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let l = &self.layout;
        if self.max_active == 0 {
            return Err(invalid("max_active", "must be at least 1"));
        }
        positive("tick_hz", self.tick_hz)?;
        positive("strength_x", l.strength_x)?;
        unit_interval("strength_x", l.strength_x)?;
        positive("strength_y", l.strength_y)?;
        unit_interval("strength_y", l.strength_y)?;
        non_negative("collision_padding", l.collision_padding)?;
        positive("alpha_decay", l.alpha_decay)?;
        unit_interval("alpha_decay", l.alpha_decay)?;
        positive("alpha_min", l.alpha_min)?;
        unit_interval("alpha_min", l.alpha_min)?;
        unit_interval("reheat_alpha", l.reheat_alpha)?;
        unit_interval("velocity_decay", l.velocity_decay)?;
        non_negative("mouse_proximity_radius", l.mouse_proximity_radius)?;
        positive("min_scale", l.min_scale)?;
        if l.max_scale.is_nan() || l.max_scale < l.min_scale {
            return Err(invalid("max_scale", "must not be below min_scale"));
        }
        positive("min_camera_scale", l.min_camera_scale)?;
        if l.max_camera_scale.is_nan() || l.max_camera_scale < l.min_camera_scale {
            return Err(invalid("max_camera_scale", "must not be below min_camera_scale"));
        }
        if l.cameras_at_min_scale < l.cameras_at_max_scale {
            return Err(invalid(
                "cameras_at_min_scale",
                "must not be below cameras_at_max_scale",
            ));
        }
        positive("base_box_px", l.base_box_px[0])?;
        positive("base_box_px", l.base_box_px[1])?;
        Ok(())
    }
}

fn invalid(field: &'static str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.to_string(),
    }
}

fn positive(field: &'static str, v: f64) -> Result<(), ConfigError> {
    if v.is_finite() && v > 0.0 {
        Ok(())
    } else {
        Err(invalid(field, "must be a positive number"))
    }
}

fn non_negative(field: &'static str, v: f64) -> Result<(), ConfigError> {
    if v.is_finite() && v >= 0.0 {
        Ok(())
    } else {
        Err(invalid(field, "must not be negative"))
    }
}

fn unit_interval(field: &'static str, v: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&v) {
        Ok(())
    } else {
        Err(invalid(field, "must be within 0..=1"))
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, OverlayConfig};
    use admission::AdmissionPolicy;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_are_valid() {
        let cfg = OverlayConfig::default();
        assert_eq!(cfg.validate(), Ok(()));
        assert_eq!(cfg.max_active, 8);
        assert_eq!(cfg.layout.mouse_proximity_radius, 300.0);
    }

    #[test]
    fn flat_json_fills_both_layers() {
        let cfg = OverlayConfig::from_json_str(
            r#"{
                "max_active": 4,
                "admission_policy": "available_only",
                "rng_seed": 7,
                "strength_x": 0.2,
                "collision_padding": 10
            }"#,
        )
        .expect("config");
        assert_eq!(cfg.max_active, 4);
        assert_eq!(cfg.admission_policy, AdmissionPolicy::AvailableOnly);
        assert_eq!(cfg.rng_seed, Some(7));
        assert_eq!(cfg.layout.strength_x, 0.2);
        assert_eq!(cfg.layout.collision_padding, 10.0);
        assert_eq!(cfg.layout.strength_y, 0.1);
        assert_eq!(cfg.admission().max_active, 4);
    }

    #[test]
    fn rejects_out_of_range_values() {
        let err = OverlayConfig::from_json_str(r#"{ "max_active": 0 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "max_active", .. }));

        let err = OverlayConfig::from_json_str(r#"{ "min_scale": 3.0, "max_scale": 2.0 }"#)
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "max_scale", .. }));

        let err = OverlayConfig::from_json_str(r#"{ "strength_y": 0.0 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "strength_y", .. }));

        let err = OverlayConfig::from_json_str(r#"{ "velocity_decay": 1.5 }"#).unwrap_err();
        assert_eq!(err.to_string(), "config `velocity_decay` must be within 0..=1");
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let err = OverlayConfig::from_json_str("{ max_active: ").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = OverlayConfig::load("/nonexistent/overlay.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
