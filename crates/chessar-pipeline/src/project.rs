//! 3-D region points to 2-D pixel coordinates.

use chessar_core::{CameraModel, RigidTransform};
use nalgebra::{Point2, Point3};

/// Project region-local 3-D points into pixel coordinates.
///
/// Points are returned regardless of whether they land inside the frame;
/// out-of-frame results are a valid state for the caller to check (see
/// [`all_in_frame`]), not an error.
pub fn project_points(
    points: &[Point3<f64>],
    camera_from_region: &RigidTransform,
    camera: &CameraModel,
) -> Vec<Point2<f64>> {
    points
        .iter()
        .map(|p| camera.project_from(p, camera_from_region))
        .collect()
}

/// Round projected points to integer pixel indices for polygon operations.
pub fn round_to_pixels(points: &[Point2<f64>]) -> Vec<Point2<i32>> {
    points
        .iter()
        .map(|p| Point2::new(p.x.round() as i32, p.y.round() as i32))
        .collect()
}

/// Whether every point lies inside a `width × height` frame.
pub fn all_in_frame(points: &[Point2<f64>], width: usize, height: usize) -> bool {
    points
        .iter()
        .all(|p| p.x >= 0.0 && p.y >= 0.0 && p.x < width as f64 && p.y < height as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chessar_core::PlanarRegion;
    use nalgebra::Vector3;

    #[test]
    fn canonical_corners_match_hand_computed_pinhole() {
        // Ideal camera 2 units above the region plane, no rotation: a corner
        // (x, y, 0) lands at c + f * (x, y) / 2.
        let camera = CameraModel::new(500.0, 500.0, 320.0, 240.0, [0.0; 5]).unwrap();
        let pose = RigidTransform::translation_only(Vector3::new(0.0, 0.0, 2.0));
        let region = PlanarRegion::square("board", 1.0);

        let px = project_points(&region.corners(), &pose, &camera);
        let expected = [
            Point2::new(320.0, 240.0),
            Point2::new(570.0, 240.0),
            Point2::new(570.0, 490.0),
            Point2::new(320.0, 490.0),
        ];
        for (got, want) in px.iter().zip(expected.iter()) {
            assert!((got.x - want.x).abs() < 1.0, "{got} vs {want}");
            assert!((got.y - want.y).abs() < 1.0, "{got} vs {want}");
        }
    }

    #[test]
    fn out_of_frame_points_are_returned_not_rejected() {
        let camera = CameraModel::new(500.0, 500.0, 320.0, 240.0, [0.0; 5]).unwrap();
        let pose = RigidTransform::translation_only(Vector3::new(50.0, 0.0, 2.0));
        let region = PlanarRegion::square("board", 1.0);

        let px = project_points(&region.corners(), &pose, &camera);
        assert_eq!(px.len(), 4);
        assert!(!all_in_frame(&px, 640, 480));
    }

    #[test]
    fn rounding_yields_integer_pixels() {
        let px = round_to_pixels(&[Point2::new(12.49, 7.51)]);
        assert_eq!(px[0], Point2::new(12, 8));
    }
}
