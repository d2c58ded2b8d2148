pub mod camera;
pub mod feed;
pub mod status;
pub mod visibility;

use std::collections::BTreeMap;

use foundation::{CameraId, GeoBounds};

pub use camera::*;
pub use feed::{FeedOptions, parse_feed};
pub use status::StatusMap;
pub use visibility::visible;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedError {
    Malformed(String),
    Io(String),
}

impl std::fmt::Display for FeedError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeedError::Malformed(msg) => write!(f, "camera feed malformed: {msg}"),
            FeedError::Io(msg) => write!(f, "camera feed unreadable: {msg}"),
        }
    }
}

impl std::error::Error for FeedError {}

/// The session's camera set: the latest feed snapshot plus derived statuses.
///
/// Cameras are never removed within a session except by replacing the whole
/// snapshot; visibility only filters.
#[derive(Debug, Default, Clone)]
pub struct CameraCatalog {
    cameras: Vec<Camera>,
    index: BTreeMap<CameraId, usize>,
}

impl CameraCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_cameras(cameras: Vec<Camera>) -> Self {
        let mut catalog = Self::new();
        catalog.replace_snapshot(cameras);
        catalog
    }

    /// Installs a fresh feed snapshot, carrying statuses over for known ids.
    ///
    /// Later duplicates of an id are dropped.
    pub fn replace_snapshot(&mut self, cameras: Vec<Camera>) {
        let previous = std::mem::take(&mut self.cameras);
        let previous_index = std::mem::take(&mut self.index);

        for mut camera in cameras {
            if self.index.contains_key(&camera.id) {
                continue;
            }
            if camera.status == CameraStatus::Unknown
                && let Some(&old) = previous_index.get(&camera.id)
            {
                camera.status = previous[old].status;
            }
            self.index.insert(camera.id.clone(), self.cameras.len());
            self.cameras.push(camera);
        }
    }

    /// Re-evaluates every camera's status. Returns how many changed.
    pub fn apply_statuses(&mut self, statuses: &StatusMap) -> usize {
        let mut changed = 0;
        for camera in &mut self.cameras {
            let next = statuses.classify(camera);
            if next != camera.status {
                camera.status = next;
                changed += 1;
            }
        }
        changed
    }

    pub fn cameras(&self) -> &[Camera] {
        &self.cameras
    }

    pub fn get(&self, id: &CameraId) -> Option<&Camera> {
        self.index.get(id).map(|&i| &self.cameras[i])
    }

    pub fn len(&self) -> usize {
        self.cameras.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cameras.is_empty()
    }

    pub fn visible(&self, bounds: &GeoBounds) -> Vec<&Camera> {
        visibility::visible(&self.cameras, bounds)
    }
}
