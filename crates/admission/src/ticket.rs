use foundation::CameraId;

/// Identifies one image fetch.
///
/// Tickets are never reused, so a completion can always be matched against
/// the fetch that is currently expected for its camera.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FetchTicket(pub u64);

/// A fetch the host must start for an admitted camera.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub camera_id: CameraId,
    pub ticket: FetchTicket,
}

/// Why an image fetch did not produce an image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// The image service answered with a non-success status.
    Status(u16),
    /// The request never produced a response.
    Transport(String),
    /// The host gave up on the fetch.
    Cancelled,
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchError::Status(code) => write!(f, "image service returned status {code}"),
            FetchError::Transport(msg) => write!(f, "image fetch failed: {msg}"),
            FetchError::Cancelled => write!(f, "image fetch cancelled"),
        }
    }
}

impl std::error::Error for FetchError {}
