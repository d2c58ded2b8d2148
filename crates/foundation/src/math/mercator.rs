use super::{LatLng, Vec2};

/// Tile edge length in pixels at zoom 0.
pub const TILE_SIZE_PX: f64 = 256.0;

/// Latitude limit of the square Web Mercator world.
pub const MAX_MERCATOR_LAT: f64 = 85.051_128_779_806_59;

/// Size of the whole world in pixels at `zoom`.
pub fn world_size_px(zoom: f64) -> f64 {
    TILE_SIZE_PX * 2_f64.powf(zoom)
}

/// Projects a coordinate to absolute world pixels at `zoom`.
///
/// Origin is the north-west corner of the world; y grows southwards.
pub fn lat_lng_to_world_px(at: LatLng, zoom: f64) -> Vec2 {
    let size = world_size_px(zoom);
    let lat = at.lat.clamp(-MAX_MERCATOR_LAT, MAX_MERCATOR_LAT);
    let sin_lat = lat.to_radians().sin();

    let x = (at.lng + 180.0) / 360.0;
    let y = 0.5 - ((1.0 + sin_lat) / (1.0 - sin_lat)).ln() / (4.0 * std::f64::consts::PI);
    Vec2::new(x * size, y * size)
}

/// Inverse of [`lat_lng_to_world_px`].
pub fn world_px_to_lat_lng(px: Vec2, zoom: f64) -> LatLng {
    let size = world_size_px(zoom);
    let x = px.x / size;
    let y = 0.5 - px.y / size;

    let lng = x * 360.0 - 180.0;
    let lat = 90.0 - 360.0 * (-y * 2.0 * std::f64::consts::PI).exp().atan() / std::f64::consts::PI;
    LatLng::new(lat, lng)
}

#[cfg(test)]
mod tests {
    use super::{lat_lng_to_world_px, world_px_to_lat_lng, world_size_px};
    use crate::math::LatLng;

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    #[test]
    fn null_island_is_world_center() {
        let p = lat_lng_to_world_px(LatLng::new(0.0, 0.0), 0.0);
        assert_close(p.x, 128.0, 1e-9);
        assert_close(p.y, 128.0, 1e-9);
    }

    #[test]
    fn world_doubles_per_zoom_level() {
        assert_eq!(world_size_px(1.0), 512.0);
        let a = lat_lng_to_world_px(LatLng::new(30.0, -97.0), 3.0);
        let b = lat_lng_to_world_px(LatLng::new(30.0, -97.0), 4.0);
        assert_close(b.x, a.x * 2.0, 1e-9);
        assert_close(b.y, a.y * 2.0, 1e-9);
    }

    #[test]
    fn round_trip_world_px() {
        let at = LatLng::new(30.262531, -97.753983);
        let rt = world_px_to_lat_lng(lat_lng_to_world_px(at, 17.0), 17.0);
        assert_close(rt.lat, at.lat, 1e-9);
        assert_close(rt.lng, at.lng, 1e-9);
    }

    #[test]
    fn polar_latitudes_are_clamped() {
        let top = lat_lng_to_world_px(LatLng::new(89.9, 0.0), 0.0);
        assert_close(top.y, 0.0, 1e-6);
    }
}
