use foundation::GeoBounds;

use crate::camera::Camera;

/// Cameras whose coordinates lie inside `bounds` (inclusive), in input order.
///
/// Cameras without a valid location are skipped.
pub fn visible<'a>(cameras: &'a [Camera], bounds: &GeoBounds) -> Vec<&'a Camera> {
    cameras
        .iter()
        .filter(|camera| {
            camera
                .valid_location()
                .is_some_and(|at| bounds.contains(at))
        })
        .collect()
}
