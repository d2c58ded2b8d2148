use admission::ImageState;
use foundation::CameraId;

/// One thumbnail to draw this tick, centered at `(x, y)`.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderRecord {
    pub camera_id: CameraId,
    pub x: f64,
    pub y: f64,
    pub scale: f64,
    pub width: f64,
    pub height: f64,
    pub image: ImageState,
    /// Pushed far from its home; drawn with a highlight.
    pub strained: bool,
}

impl RenderRecord {
    /// Top-left corner of the thumbnail box.
    pub fn origin(&self) -> (f64, f64) {
        (self.x - self.width * 0.5, self.y - self.height * 0.5)
    }

    pub fn is_ready(&self) -> bool {
        self.image == ImageState::Ready
    }
}
