use crate::bounds::GeoBounds;
use crate::math::{LatLng, Vec2, lat_lng_to_world_px, world_px_to_lat_lng};

/// Map viewport as reported by the map widget.
///
/// `bounds` and `size_px` are absent until the widget has laid itself out; both
/// are transient states, not errors.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Viewport {
    pub zoom: f64,
    pub center: LatLng,
    pub bounds: Option<GeoBounds>,
    /// Container size in pixels.
    pub size_px: Option<Vec2>,
    /// Offset of the container's top-left corner on the overlay surface.
    pub origin_px: Vec2,
}

impl Viewport {
    pub fn new(zoom: f64, center: LatLng, bounds: GeoBounds) -> Self {
        Self {
            zoom,
            center,
            bounds: Some(bounds),
            size_px: None,
            origin_px: Vec2::ZERO,
        }
    }

    /// A viewport that has not reported bounds or a container size yet.
    pub fn unmounted(zoom: f64, center: LatLng) -> Self {
        Self {
            zoom,
            center,
            bounds: None,
            size_px: None,
            origin_px: Vec2::ZERO,
        }
    }

    /// Derives bounds from the container size by unprojecting its corners.
    pub fn from_center_zoom(center: LatLng, zoom: f64, size_px: Vec2) -> Self {
        let mut vp = Self::unmounted(zoom, center);
        vp.size_px = Some(size_px);
        vp.bounds = vp.derive_bounds();
        vp
    }

    pub fn with_container(mut self, size_px: Vec2, origin_px: Vec2) -> Self {
        self.size_px = Some(size_px);
        self.origin_px = origin_px;
        self
    }

    /// True once zoom, center and a non-empty container are known.
    pub fn has_transform(&self) -> bool {
        let Some(size) = self.size_px else {
            return false;
        };
        self.zoom.is_finite()
            && self.center.is_valid()
            && size.is_finite()
            && size.x > 0.0
            && size.y > 0.0
    }

    /// Moves the center by a screen-space delta, re-deriving bounds.
    pub fn pan_by_px(&mut self, delta: Vec2) {
        let center_px = lat_lng_to_world_px(self.center, self.zoom);
        self.center = world_px_to_lat_lng(center_px + delta, self.zoom);
        if self.size_px.is_some() {
            self.bounds = self.derive_bounds();
        }
    }

    fn derive_bounds(&self) -> Option<GeoBounds> {
        if !self.has_transform() {
            return None;
        }
        let size = self.size_px?;
        let center_px = lat_lng_to_world_px(self.center, self.zoom);
        let half = size * 0.5;
        let nw = world_px_to_lat_lng(center_px - half, self.zoom);
        let se = world_px_to_lat_lng(center_px + half, self.zoom);
        Some(GeoBounds::new(nw.lat, se.lat, se.lng, nw.lng))
    }
}
