//! Planar marker pose from a single detection.
//!
//! Decomposes the marker-plane-to-image homography into a rigid transform
//! given the camera intrinsics, assuming the marker lies on z = 0 in its own
//! frame. A single-marker solve, no iterative refinement; the residual error
//! of one solve is accepted.

use chessar_aruco::MarkerCorners;
use chessar_core::{homography_from_4pt, CameraModel, RigidTransform};
use nalgebra::{Matrix3, Point2, Rotation3, Vector3};

use crate::PipelineError;

/// Estimate the camera-from-marker transform.
///
/// `corners` are the detected image corners in canonical TL, TR, BR, BL
/// order; `marker_size` is the physical side length. The marker frame has its
/// origin at the marker center, x right, y up, z toward the camera.
pub fn estimate_marker_pose(
    corners: &MarkerCorners,
    camera: &CameraModel,
    marker_size: f64,
) -> Result<RigidTransform, PipelineError> {
    let h = marker_size * 0.5;
    let local = [
        Point2::new(-h, h),
        Point2::new(h, h),
        Point2::new(h, -h),
        Point2::new(-h, -h),
    ];

    // Work in ideal pixels so the linear decomposition is valid.
    let ideal = [
        camera.undistort_pixel(corners[0]),
        camera.undistort_pixel(corners[1]),
        camera.undistort_pixel(corners[2]),
        camera.undistort_pixel(corners[3]),
    ];

    let hom = homography_from_4pt(&local, &ideal)?;
    decompose_planar_homography(camera.intrinsics(), hom.h)
}

/// Classic decomposition of a plane-induced homography `H ~ K [r1 r2 t]`.
fn decompose_planar_homography(
    k: Matrix3<f64>,
    h: Matrix3<f64>,
) -> Result<RigidTransform, PipelineError> {
    let k_inv = k.try_inverse().ok_or(PipelineError::DegeneratePose)?;

    let a = k_inv * h;
    let a1 = a.column(0).into_owned();
    let a2 = a.column(1).into_owned();
    let a3 = a.column(2).into_owned();

    let norm1 = a1.norm();
    let norm2 = a2.norm();
    if norm1 <= 1e-12 || norm2 <= 1e-12 {
        return Err(PipelineError::DegeneratePose);
    }
    // Scale so the first two rotation columns have unit norm (averaged).
    let lambda = 2.0 / (norm1 + norm2);

    let mut r1 = a1 * lambda;
    let mut r2 = a2 * lambda;
    let mut t: Vector3<f64> = a3 * lambda;
    if t.z < 0.0 {
        r1 = -r1;
        r2 = -r2;
        t = -t;
    }
    let r3 = r1.cross(&r2);
    if r3.norm() <= 1e-12 {
        return Err(PipelineError::DegeneratePose);
    }

    let mut r_mat = Matrix3::<f64>::zeros();
    r_mat.set_column(0, &r1);
    r_mat.set_column(1, &r2);
    r_mat.set_column(2, &r3);

    // Project onto SO(3) (polar decomposition via SVD).
    let svd = r_mat.svd(true, true);
    let u = svd.u.ok_or(PipelineError::DegeneratePose)?;
    let v_t = svd.v_t.ok_or(PipelineError::DegeneratePose)?;
    let r_orth = u * v_t;

    let r_orth = if r_orth.determinant() < 0.0 {
        let mut u_flipped = u;
        u_flipped.column_mut(2).neg_mut();
        u_flipped * v_t
    } else {
        r_orth
    };

    Ok(RigidTransform::from_rotation_matrix(
        Rotation3::from_matrix_unchecked(r_orth),
        t,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{Point3, UnitQuaternion};

    fn ideal_camera() -> CameraModel {
        CameraModel::new(1000.0, 1000.0, 320.0, 240.0, [0.0; 5]).unwrap()
    }

    fn project_marker(
        camera: &CameraModel,
        pose: &RigidTransform,
        marker_size: f64,
    ) -> MarkerCorners {
        let h = marker_size * 0.5;
        [
            Point3::new(-h, h, 0.0),
            Point3::new(h, h, 0.0),
            Point3::new(h, -h, 0.0),
            Point3::new(-h, -h, 0.0),
        ]
        .map(|p| camera.project_from(&p, pose))
    }

    #[test]
    fn recovers_a_synthetic_pose() {
        let camera = ideal_camera();
        let truth = RigidTransform::from_parts(
            UnitQuaternion::from_euler_angles(0.1, -0.05, 0.2),
            Vector3::new(0.4, -0.2, 12.0),
        );
        let corners = project_marker(&camera, &truth, 2.0);

        let est = estimate_marker_pose(&corners, &camera, 2.0).expect("pose");

        approx::assert_relative_eq!(est.translation(), truth.translation(), epsilon = 1e-6);
        let r_diff = est.rotation().matrix().transpose() * truth.rotation().matrix();
        let angle = ((r_diff.trace() - 1.0) * 0.5).clamp(-1.0, 1.0).acos();
        assert!(angle < 1e-6, "rotation error too large: {angle}");
    }

    #[test]
    fn recovers_pose_under_distortion() {
        let camera = CameraModel::default();
        let truth = RigidTransform::from_parts(
            UnitQuaternion::from_euler_angles(0.05, 0.1, -0.3),
            Vector3::new(1.0, 0.5, 20.0),
        );
        let corners = project_marker(&camera, &truth, 2.0);

        let est = estimate_marker_pose(&corners, &camera, 2.0).expect("pose");
        assert!((est.translation() - truth.translation()).norm() < 1e-3);
    }

    #[test]
    fn degenerate_corners_propagate_no_pose() {
        let camera = ideal_camera();
        let corners = [Point2::new(100.0, 100.0); 4];
        assert!(estimate_marker_pose(&corners, &camera, 2.0).is_err());
    }

    #[test]
    fn pose_composes_onward_to_a_region() {
        // The composed camera-from-region transform keeps an orthonormal
        // rotation block; this is the whole contract of the frame composer.
        let camera = ideal_camera();
        let truth = RigidTransform::translation_only(Vector3::new(0.0, 0.0, 15.0));
        let corners = project_marker(&camera, &truth, 2.0);
        let pose = estimate_marker_pose(&corners, &camera, 2.0).unwrap();

        let offset = RigidTransform::z_rotation_with_offset(
            -std::f64::consts::FRAC_PI_2,
            Vector3::new(-1.5, 1.5, 0.0),
        );
        let cam_from_board = pose * offset;
        let r = cam_from_board.rotation();
        assert!(
            (r.matrix().transpose() * r.matrix() - Matrix3::identity()).norm() < 1e-9
        );
    }
}
