use foundation::{CameraId, LatLng};

/// Admission-relevant status of a camera, re-evaluated from the status source.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub enum CameraStatus {
    /// The status source reports the camera as serving images.
    Available,
    /// The feed lists it as turned on but the status source has no entry.
    Potential,
    /// The status source reports a failure.
    Unavailable,
    /// Nothing is known.
    #[default]
    Unknown,
}

impl CameraStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            CameraStatus::Available => "available",
            CameraStatus::Potential => "potential",
            CameraStatus::Unavailable => "unavailable",
            CameraStatus::Unknown => "unknown",
        }
    }
}

/// A camera from the data feed.
///
/// `location` is `None` when the feed record had missing or malformed
/// coordinates; such cameras never become visible.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub id: CameraId,
    pub name: String,
    pub location: Option<LatLng>,
    pub status: CameraStatus,
    /// Whether the feed itself marks the camera as switched on.
    pub turned_on: bool,
}

impl Camera {
    pub fn new(id: impl Into<CameraId>, location: Option<LatLng>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            location,
            status: CameraStatus::Unknown,
            turned_on: true,
        }
    }

    pub fn at(id: impl Into<CameraId>, lat: f64, lng: f64) -> Self {
        Self::new(id, Some(LatLng::new(lat, lng)))
    }

    pub fn with_status(mut self, status: CameraStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// The location, if present and within WGS84 ranges.
    pub fn valid_location(&self) -> Option<LatLng> {
        self.location.filter(LatLng::is_valid)
    }
}
