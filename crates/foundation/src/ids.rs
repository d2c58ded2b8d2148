use std::fmt;

/// Stable identity of a camera as published by the data feed.
///
/// Ordered so maps keyed by camera id iterate deterministically.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CameraId(String);

impl CameraId {
    pub fn new(id: impl Into<String>) -> Self {
        CameraId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CameraId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CameraId {
    fn from(value: &str) -> Self {
        CameraId::new(value)
    }
}

impl From<String> for CameraId {
    fn from(value: String) -> Self {
        CameraId(value)
    }
}

#[cfg(test)]
mod tests {
    use super::CameraId;

    #[test]
    fn ids_order_lexically() {
        let mut ids = vec![CameraId::new("12"), CameraId::new("100"), CameraId::new("2")];
        ids.sort();
        let raw: Vec<_> = ids.iter().map(CameraId::as_str).collect();
        assert_eq!(raw, vec!["100", "12", "2"]);
    }
}
