use nalgebra::{Matrix3, Point2, Point3};
use serde::{Deserialize, Serialize};

use crate::error::GeometryError;
use crate::transform::RigidTransform;

/// Pinhole camera with Brown-Conrady distortion (k1 k2 p1 p2 k3).
///
/// Immutable, calibrated once per physical camera. The default values are the
/// webcam calibration the board layout constants were measured with.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CameraModel {
    fx: f64,
    fy: f64,
    cx: f64,
    cy: f64,
    dist: [f64; 5],
}

impl CameraModel {
    pub fn new(fx: f64, fy: f64, cx: f64, cy: f64, dist: [f64; 5]) -> Result<Self, GeometryError> {
        if fx <= 0.0 || fy <= 0.0 || cx < 0.0 || cy < 0.0 {
            return Err(GeometryError::InvalidIntrinsics { fx, fy, cx, cy });
        }
        Ok(Self { fx, fy, cx, cy, dist })
    }

    pub fn intrinsics(&self) -> Matrix3<f64> {
        Matrix3::new(
            self.fx, 0.0, self.cx, //
            0.0, self.fy, self.cy, //
            0.0, 0.0, 1.0,
        )
    }

    pub fn distortion(&self) -> [f64; 5] {
        self.dist
    }

    /// Project a camera-frame point to pixel coordinates.
    ///
    /// Points behind the camera or out of the frame project regardless; the
    /// caller decides whether the result is usable.
    pub fn project(&self, p_cam: &Point3<f64>) -> Point2<f64> {
        let inv_z = 1.0 / p_cam.z;
        let x = p_cam.x * inv_z;
        let y = p_cam.y * inv_z;
        let (xd, yd) = self.distort(x, y);
        Point2::new(self.fx * xd + self.cx, self.fy * yd + self.cy)
    }

    /// Project a region-local point through `camera_from_region`.
    pub fn project_from(&self, p_local: &Point3<f64>, camera_from_region: &RigidTransform) -> Point2<f64> {
        self.project(&camera_from_region.transform_point(p_local))
    }

    /// Map a distorted pixel to ideal (distortion-free) pixel coordinates.
    ///
    /// Fixed-point iteration on normalized coordinates; converges in a few
    /// steps for the mild distortion of a webcam lens.
    pub fn undistort_pixel(&self, p: Point2<f64>) -> Point2<f64> {
        let xd = (p.x - self.cx) / self.fx;
        let yd = (p.y - self.cy) / self.fy;

        let mut x = xd;
        let mut y = yd;
        for _ in 0..8 {
            let (ex, ey) = self.distort(x, y);
            x -= ex - xd;
            y -= ey - yd;
        }

        Point2::new(self.fx * x + self.cx, self.fy * y + self.cy)
    }

    /// Apply the distortion model to normalized coordinates.
    fn distort(&self, x: f64, y: f64) -> (f64, f64) {
        let [k1, k2, p1, p2, k3] = self.dist;
        let r2 = x * x + y * y;
        let r4 = r2 * r2;
        let r6 = r4 * r2;

        let radial = 1.0 + k1 * r2 + k2 * r4 + k3 * r6;
        let xy = x * y;
        let dx = 2.0 * p1 * xy + p2 * (r2 + 2.0 * x * x);
        let dy = p1 * (r2 + 2.0 * y * y) + 2.0 * p2 * xy;

        (radial * x + dx, radial * y + dy)
    }
}

impl Default for CameraModel {
    fn default() -> Self {
        Self {
            fx: 1397.52735,
            fy: 1397.20119,
            cx: 652.871905,
            cy: 332.295815,
            dist: [
                0.0952372421,
                0.246188134,
                0.00101888992,
                -0.000459210685,
                -2.40973476,
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector3 as V3;

    fn ideal_camera() -> CameraModel {
        CameraModel::new(1000.0, 1000.0, 320.0, 240.0, [0.0; 5]).unwrap()
    }

    #[test]
    fn rejects_non_positive_focal_lengths() {
        assert!(matches!(
            CameraModel::new(0.0, 1.0, 10.0, 10.0, [0.0; 5]),
            Err(GeometryError::InvalidIntrinsics { .. })
        ));
        assert!(CameraModel::new(800.0, 780.0, 640.0, 360.0, [0.0; 5]).is_ok());
    }

    #[test]
    fn pinhole_projection_matches_hand_computation() {
        // Camera directly above the region origin at height 10: the region
        // corner (1, 2, 0) seen at depth 10 lands at c + f * (1, 2) / 10.
        let cam = ideal_camera();
        let pose = RigidTransform::translation_only(V3::new(0.0, 0.0, 10.0));
        let px = cam.project_from(&Point3::new(1.0, 2.0, 0.0), &pose);
        assert!((px.x - 420.0).abs() < 1e-9);
        assert!((px.y - 440.0).abs() < 1e-9);
    }

    #[test]
    fn principal_point_is_distortion_free() {
        let cam = CameraModel::default();
        let on_axis = cam.project(&Point3::new(0.0, 0.0, 5.0));
        assert!((on_axis.x - 652.871905).abs() < 1e-9);
        assert!((on_axis.y - 332.295815).abs() < 1e-9);
    }

    #[test]
    fn undistort_inverts_projection() {
        let cam = CameraModel::default();
        let p_cam = Point3::new(0.3, -0.2, 4.0);
        let distorted = cam.project(&p_cam);
        let ideal = cam.undistort_pixel(distorted);

        // Ideal pinhole projection of the same point.
        let k = cam.intrinsics();
        let expect_x = k[(0, 0)] * p_cam.x / p_cam.z + k[(0, 2)];
        let expect_y = k[(1, 1)] * p_cam.y / p_cam.z + k[(1, 2)];
        assert!((ideal.x - expect_x).abs() < 1e-3);
        assert!((ideal.y - expect_y).abs() < 1e-3);
    }
}
