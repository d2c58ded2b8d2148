use foundation::math::{LatLng, ScreenPoint, Vec2, lat_lng_to_world_px};
use foundation::Viewport;

/// Maps a geographic coordinate to overlay screen pixels.
///
/// `None` means no projection is available right now (the map has not laid
/// itself out, or the coordinate is unusable). Callers treat it as transient.
pub trait Projector {
    fn project(&self, at: LatLng) -> Option<ScreenPoint>;
}

impl<F> Projector for F
where
    F: Fn(LatLng) -> Option<ScreenPoint>,
{
    fn project(&self, at: LatLng) -> Option<ScreenPoint> {
        self(at)
    }
}

/// Web Mercator projection snapshot of one viewport.
///
/// Built fresh on every viewport change; never reused across changes.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct MercatorProjector {
    zoom: f64,
    center_world_px: Vec2,
    /// Half container size plus container origin.
    offset_px: Vec2,
}

impl MercatorProjector {
    pub fn from_viewport(viewport: &Viewport) -> Option<Self> {
        if !viewport.has_transform() {
            return None;
        }
        let size = viewport.size_px?;
        Some(Self {
            zoom: viewport.zoom,
            center_world_px: lat_lng_to_world_px(viewport.center, viewport.zoom),
            offset_px: size * 0.5 + viewport.origin_px,
        })
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }
}

impl Projector for MercatorProjector {
    fn project(&self, at: LatLng) -> Option<ScreenPoint> {
        if !at.is_valid() {
            return None;
        }
        let p = lat_lng_to_world_px(at, self.zoom) - self.center_world_px + self.offset_px;
        p.is_finite().then_some(p)
    }
}
