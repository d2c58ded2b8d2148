/// Geographic coordinates in degrees.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Builds a coordinate from a GeoJSON-style `[lng, lat]` pair.
    pub fn from_lng_lat(pair: [f64; 2]) -> Self {
        Self::new(pair[1], pair[0])
    }

    /// Finite and within the WGS84 degree ranges.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

#[cfg(test)]
mod tests {
    use super::LatLng;

    #[test]
    fn geojson_pairs_are_lng_first() {
        let p = LatLng::from_lng_lat([-97.75, 30.26]);
        assert_eq!(p.lat, 30.26);
        assert_eq!(p.lng, -97.75);
    }

    #[test]
    fn rejects_out_of_range_and_nan() {
        assert!(LatLng::new(30.0, -97.0).is_valid());
        assert!(!LatLng::new(91.0, 0.0).is_valid());
        assert!(!LatLng::new(0.0, 180.5).is_valid());
        assert!(!LatLng::new(f64::NAN, 0.0).is_valid());
    }
}
