use crate::math::LatLng;

/// Geographic bounding box in degrees, as reported by the map widget.
///
/// Containment is inclusive on every edge. Boxes are not wrapped across the
/// antimeridian: a box with `east < west` contains nothing.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct GeoBounds {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

impl GeoBounds {
    pub fn new(north: f64, south: f64, east: f64, west: f64) -> Self {
        GeoBounds {
            north,
            south,
            east,
            west,
        }
    }

    pub fn is_valid(&self) -> bool {
        [self.north, self.south, self.east, self.west]
            .iter()
            .all(|v| v.is_finite())
            && self.south <= self.north
            && self.west <= self.east
    }

    pub fn contains(&self, at: LatLng) -> bool {
        at.lat >= self.south && at.lat <= self.north && at.lng >= self.west && at.lng <= self.east
    }
}

#[cfg(test)]
mod tests {
    use super::GeoBounds;
    use crate::math::LatLng;

    #[test]
    fn containment_is_inclusive() {
        let b = GeoBounds::new(30.3, 30.2, -97.7, -97.8);
        assert!(b.contains(LatLng::new(30.3, -97.8)));
        assert!(b.contains(LatLng::new(30.2, -97.7)));
        assert!(b.contains(LatLng::new(30.25, -97.75)));
        assert!(!b.contains(LatLng::new(30.31, -97.75)));
        assert!(!b.contains(LatLng::new(30.25, -97.69)));
    }

    #[test]
    fn inverted_box_is_invalid_and_empty() {
        let b = GeoBounds::new(10.0, 20.0, 5.0, 6.0);
        assert!(!b.is_valid());
        assert!(!b.contains(LatLng::new(15.0, 5.5)));
    }
}
