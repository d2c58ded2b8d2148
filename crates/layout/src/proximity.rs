use crate::config::LayoutConfig;

/// Scale of a thumbnail whose center is `distance` pixels from the pointer.
///
/// Linear from `max_scale` at the pointer down to `min_scale` at the
/// proximity radius, constant beyond it.
pub fn proximity_scale(config: &LayoutConfig, distance: f64) -> f64 {
    let radius = config.mouse_proximity_radius;
    if !distance.is_finite() || radius <= 0.0 || distance >= radius {
        return config.min_scale;
    }
    config.min_scale + (config.max_scale - config.min_scale) * (1.0 - distance / radius)
}

/// Thumbnail scale for `count` cameras on screen.
pub fn camera_scale(config: &LayoutConfig, count: usize) -> f64 {
    let (lo, hi) = (config.cameras_at_max_scale, config.cameras_at_min_scale);
    if count <= lo {
        return config.max_camera_scale;
    }
    if count >= hi {
        return config.min_camera_scale;
    }
    let t = (count - lo) as f64 / (hi - lo) as f64;
    config.max_camera_scale + (config.min_camera_scale - config.max_camera_scale) * t
}
