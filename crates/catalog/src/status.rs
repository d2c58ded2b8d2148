use std::collections::BTreeMap;

use foundation::CameraId;
use serde::Deserialize;

use crate::FeedError;
use crate::camera::{Camera, CameraStatus};

/// Status name the status source uses for a healthy camera.
pub const HEALTHY_STATUS: &str = "200";

/// Latest status names reported by the external status source.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StatusMap {
    entries: BTreeMap<CameraId, String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatusRecord {
    coa_id: serde_json::Value,
    #[serde(default)]
    status: Option<StatusName>,
}

#[derive(Debug, Deserialize)]
struct StatusName {
    #[serde(default)]
    name: Option<String>,
}

impl StatusMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<CameraId>,
        V: Into<String>,
    {
        Self {
            entries: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Parses `[{"coaId": 101, "status": {"name": "200"}}, ...]`.
    ///
    /// Entries without a status name are recorded as `"Unknown"`.
    pub fn from_json(json: &str) -> Result<Self, FeedError> {
        let records: Vec<StatusRecord> =
            serde_json::from_str(json).map_err(|e| FeedError::Malformed(e.to_string()))?;
        let mut entries = BTreeMap::new();
        for record in records {
            let id = match &record.coa_id {
                serde_json::Value::Number(n) => n.to_string(),
                serde_json::Value::String(s) => s.trim().to_string(),
                _ => continue,
            };
            let name = record
                .status
                .and_then(|s| s.name)
                .unwrap_or_else(|| "Unknown".to_string());
            entries.insert(CameraId::new(id), name);
        }
        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn status_name(&self, id: &CameraId) -> Option<&str> {
        self.entries.get(id).map(String::as_str)
    }

    /// Derives the admission status of `camera` from this map.
    pub fn classify(&self, camera: &Camera) -> CameraStatus {
        match self.status_name(&camera.id) {
            Some(HEALTHY_STATUS) => CameraStatus::Available,
            Some(_) => CameraStatus::Unavailable,
            None if camera.turned_on => CameraStatus::Potential,
            None => CameraStatus::Unknown,
        }
    }
}
