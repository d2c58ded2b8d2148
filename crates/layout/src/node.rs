use foundation::CameraId;
use foundation::math::ScreenPoint;

/// Thumbnails displaced at least this far from home are drawn as strained.
pub const STRAIN_HIGHLIGHT_PX: f64 = 200.0;

/// A node the simulation should carry, anchored at its projected home.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeInput {
    pub camera_id: CameraId,
    pub home: ScreenPoint,
}

impl NodeInput {
    pub fn new(camera_id: impl Into<CameraId>, home: ScreenPoint) -> Self {
        Self {
            camera_id: camera_id.into(),
            home,
        }
    }
}

/// Position of one thumbnail center for a single tick.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeFrame {
    pub camera_id: CameraId,
    pub x: f64,
    pub y: f64,
    /// Proximity scale; 1.0 when the pointer is far away or absent.
    pub scale: f64,
    /// Distance from the home position in pixels.
    pub strain: f64,
}

impl NodeFrame {
    pub fn position(&self) -> ScreenPoint {
        ScreenPoint::new(self.x, self.y)
    }

    pub fn is_strained(&self) -> bool {
        self.strain >= STRAIN_HIGHLIGHT_PX
    }
}

/// Simulation state for one camera.
#[derive(Debug, Clone)]
pub(crate) struct Node {
    pub camera_id: CameraId,
    pub home: ScreenPoint,
    pub pos: ScreenPoint,
    pub vel: ScreenPoint,
    pub scale: f64,
    pub radius: f64,
}

impl Node {
    pub fn at_home(input: &NodeInput) -> Self {
        Self {
            camera_id: input.camera_id.clone(),
            home: input.home,
            pos: input.home,
            vel: ScreenPoint::ZERO,
            scale: 1.0,
            radius: 0.0,
        }
    }

    pub fn frame(&self) -> NodeFrame {
        NodeFrame {
            camera_id: self.camera_id.clone(),
            x: self.pos.x,
            y: self.pos.y,
            scale: self.scale,
            strain: self.pos.distance(self.home),
        }
    }
}
