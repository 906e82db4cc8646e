use std::ops::Mul;

use nalgebra::{Isometry3, Point3, Rotation3, Translation3, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

/// Rigid rotation + translation locating one coordinate frame relative to
/// another. The rotation block is orthonormal by construction.
///
/// Composition reads right to left: `camera_from_marker * marker_from_board`
/// maps board-local points into camera coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RigidTransform {
    iso: Isometry3<f64>,
}

impl RigidTransform {
    pub fn identity() -> Self {
        Self {
            iso: Isometry3::identity(),
        }
    }

    pub fn from_parts(rotation: UnitQuaternion<f64>, translation: Vector3<f64>) -> Self {
        Self {
            iso: Isometry3::from_parts(Translation3::from(translation), rotation),
        }
    }

    pub fn from_rotation_matrix(rotation: Rotation3<f64>, translation: Vector3<f64>) -> Self {
        Self::from_parts(UnitQuaternion::from_rotation_matrix(&rotation), translation)
    }

    /// Rotation about the local z axis by `angle` radians, plus a translation.
    /// This is the shape of every marker-to-region offset in the board layout.
    pub fn z_rotation_with_offset(angle: f64, translation: Vector3<f64>) -> Self {
        Self::from_parts(
            UnitQuaternion::from_axis_angle(&Vector3::z_axis(), angle),
            translation,
        )
    }

    pub fn translation_only(translation: Vector3<f64>) -> Self {
        Self::from_parts(UnitQuaternion::identity(), translation)
    }

    #[inline]
    pub fn rotation(&self) -> Rotation3<f64> {
        self.iso.rotation.to_rotation_matrix()
    }

    #[inline]
    pub fn translation(&self) -> Vector3<f64> {
        self.iso.translation.vector
    }

    #[inline]
    pub fn transform_point(&self, p: &Point3<f64>) -> Point3<f64> {
        self.iso.transform_point(p)
    }

    pub fn inverse(&self) -> Self {
        Self {
            iso: self.iso.inverse(),
        }
    }
}

impl Mul for RigidTransform {
    type Output = RigidTransform;

    fn mul(self, rhs: RigidTransform) -> RigidTransform {
        RigidTransform {
            iso: self.iso * rhs.iso,
        }
    }
}

impl From<Isometry3<f64>> for RigidTransform {
    fn from(iso: Isometry3<f64>) -> Self {
        Self { iso }
    }
}
