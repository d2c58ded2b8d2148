//! Camera data-feed ingestion.
//!
//! The feed is a Socrata-style JSON array. Only the fields the overlay needs
//! are decoded; everything else in a record is ignored.

use std::collections::HashSet;

use foundation::LatLng;
use serde::Deserialize;
use serde_json::Value;

use crate::FeedError;
use crate::camera::Camera;

/// Feed value marking a camera as switched on.
pub const TURNED_ON: &str = "TURNED_ON";

#[derive(Debug, Clone, Deserialize)]
struct FeedRecord {
    #[serde(default)]
    camera_id: Option<Value>,
    #[serde(default)]
    location_name: String,
    #[serde(default)]
    camera_status: String,
    #[serde(default)]
    location: Option<FeedLocation>,
}

#[derive(Debug, Clone, Deserialize)]
struct FeedLocation {
    #[serde(default)]
    coordinates: Vec<Value>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct FeedOptions {
    /// Drop records whose `camera_status` is not [`TURNED_ON`].
    pub only_turned_on: bool,
    /// Drop records repeating an earlier `location_name`.
    pub dedupe_by_name: bool,
}

impl Default for FeedOptions {
    fn default() -> Self {
        Self {
            only_turned_on: true,
            dedupe_by_name: true,
        }
    }
}

/// Parses a feed snapshot into cameras.
///
/// Duplicates are removed by `camera_id` first, then by `location_name`; the
/// first record wins in both passes. Records without an id are skipped.
/// Malformed coordinates do not reject the record; the camera is kept with no
/// location and is filtered out later by the visibility filter.
pub fn parse_feed(json: &str, options: FeedOptions) -> Result<Vec<Camera>, FeedError> {
    let records: Vec<FeedRecord> =
        serde_json::from_str(json).map_err(|e| FeedError::Malformed(e.to_string()))?;

    let mut seen_ids: HashSet<String> = HashSet::new();
    let mut seen_names: HashSet<String> = HashSet::new();
    let mut out = Vec::new();

    for record in records {
        let Some(id) = record.camera_id.as_ref().and_then(id_from_value) else {
            continue;
        };
        if !seen_ids.insert(id.clone()) {
            continue;
        }
        if options.dedupe_by_name
            && !record.location_name.is_empty()
            && !seen_names.insert(record.location_name.clone())
        {
            continue;
        }

        let turned_on = record.camera_status == TURNED_ON;
        if options.only_turned_on && !turned_on {
            continue;
        }

        let location = record
            .location
            .as_ref()
            .and_then(|loc| location_from_coordinates(&loc.coordinates));

        let mut camera = Camera::new(id, location).with_name(record.location_name);
        camera.turned_on = turned_on;
        out.push(camera);
    }

    Ok(out)
}

fn id_from_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn location_from_coordinates(coordinates: &[Value]) -> Option<LatLng> {
    let [lng, lat, ..] = coordinates else {
        return None;
    };
    let at = LatLng::from_lng_lat([number(lng)?, number(lat)?]);
    at.is_valid().then_some(at)
}

fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::{FeedOptions, parse_feed};
    use crate::FeedError;
    use foundation::LatLng;
    use pretty_assertions::assert_eq;

    const FEED: &str = r#"[
        {"camera_id": "101", "location_name": "Lamar / 5th", "camera_status": "TURNED_ON",
         "location": {"type": "Point", "coordinates": [-97.7540, 30.2690]}},
        {"camera_id": "101", "location_name": "Duplicate id", "camera_status": "TURNED_ON",
         "location": {"type": "Point", "coordinates": [-97.0, 30.0]}},
        {"camera_id": "102", "location_name": "Lamar / 5th", "camera_status": "TURNED_ON",
         "location": {"type": "Point", "coordinates": [-97.0, 30.0]}},
        {"camera_id": "103", "location_name": "Congress / 1st", "camera_status": "REMOVED",
         "location": {"type": "Point", "coordinates": [-97.7, 30.2]}},
        {"camera_id": 104, "location_name": "Riverside", "camera_status": "TURNED_ON",
         "location": {"type": "Point", "coordinates": ["-97.73", "30.25"]}},
        {"camera_id": "105", "location_name": "No coords", "camera_status": "TURNED_ON"},
        {"location_name": "No id", "camera_status": "TURNED_ON"}
    ]"#;

    #[test]
    fn dedupes_and_filters_turned_on() {
        let cams = parse_feed(FEED, FeedOptions::default()).expect("parse");
        let ids: Vec<_> = cams.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["101", "104", "105"]);
        assert_eq!(cams[0].location, Some(LatLng::new(30.2690, -97.7540)));
        assert_eq!(cams[1].location, Some(LatLng::new(30.25, -97.73)));
        assert_eq!(cams[2].location, None);
    }

    #[test]
    fn keeps_switched_off_cameras_when_asked() {
        let options = FeedOptions {
            only_turned_on: false,
            dedupe_by_name: false,
        };
        let cams = parse_feed(FEED, options).expect("parse");
        let ids: Vec<_> = cams.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["101", "102", "103", "104", "105"]);
        assert!(!cams[2].turned_on);
    }

    #[test]
    fn rejects_non_array_json() {
        let err = parse_feed("{\"oops\": 1}", FeedOptions::default()).unwrap_err();
        assert!(matches!(err, FeedError::Malformed(_)));
    }
}
