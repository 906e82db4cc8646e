//! Physical board layout relative to the marker.
//!
//! All lengths share one unit (inches, as measured on the physical setup).
//! The marker frame follows the usual fiducial convention: origin at the
//! marker center, x right, y up, z out of the marker plane.

use std::f64::consts::FRAC_PI_2;

use chessar_core::{PlanarRegion, RigidTransform};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// Static layout configuration: where the board and the four annotation
/// cells sit relative to the marker. Never mutated at runtime.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoardLayout {
    /// Physical side length of the square marker.
    pub marker_size: f64,
    /// Physical side length of the square board.
    pub board_size: f64,
    /// Translation from marker origin to the board origin.
    pub board_offset: [f64; 3],
    /// Rotation about the marker z axis aligning board axes with marker
    /// axes, in radians.
    pub board_z_rotation: f64,
    /// Physical side length of one annotation cell.
    pub cell_size: f64,
    /// Translations from marker origin to each annotation cell origin, in
    /// reading order: start file, start rank, end file, end rank.
    pub cell_offsets: [[f64; 3]; 4],
    /// Side of the square canvas a region is flattened into, in pixels.
    pub region_canvas_px: usize,
}

impl Default for BoardLayout {
    fn default() -> Self {
        Self {
            marker_size: 2.0,
            board_size: 6.0,
            board_offset: [-1.5, 1.5, 0.0],
            board_z_rotation: -FRAC_PI_2,
            cell_size: 1.8,
            cell_offsets: [
                [2.15, -0.9, 0.0],
                [4.3, -0.9, 0.0],
                [6.3, -0.9, 0.0],
                [8.25, -0.9, 0.0],
            ],
            region_canvas_px: 128,
        }
    }
}

impl BoardLayout {
    /// Rigid offset from marker frame to board frame.
    pub fn board_from_marker_offset(&self) -> RigidTransform {
        RigidTransform::z_rotation_with_offset(
            self.board_z_rotation,
            Vector3::new(
                self.board_offset[0],
                self.board_offset[1],
                self.board_offset[2],
            ),
        )
    }

    /// Rigid offset from marker frame to the `index`-th annotation cell.
    /// Cells keep the marker orientation; only the translation differs.
    pub fn cell_from_marker_offset(&self, index: usize) -> Option<RigidTransform> {
        let [x, y, z] = *self.cell_offsets.get(index)?;
        Some(RigidTransform::translation_only(Vector3::new(x, y, z)))
    }

    pub fn board_region(&self) -> PlanarRegion {
        PlanarRegion::square("board", self.board_size)
    }

    pub fn cell_region(&self, index: usize) -> PlanarRegion {
        PlanarRegion::square(format!("cell-{index}"), self.cell_size)
    }

    pub const CELL_COUNT: usize = 4;
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;

    #[test]
    fn board_offset_turns_marker_x_into_board_axes() {
        let layout = BoardLayout::default();
        let t = layout.board_from_marker_offset();
        // A point one unit along board x maps next to the board origin in
        // marker coordinates, rotated a quarter turn clockwise.
        let p = t.transform_point(&Point3::new(1.0, 0.0, 0.0));
        assert!((p - Point3::new(-1.5, 0.5, 0.0)).norm() < 1e-12);
    }

    #[test]
    fn cell_offsets_are_translation_only() {
        let layout = BoardLayout::default();
        for i in 0..BoardLayout::CELL_COUNT {
            let t = layout.cell_from_marker_offset(i).unwrap();
            let r = t.rotation();
            assert!((r.matrix() - nalgebra::Matrix3::identity()).norm() < 1e-12);
        }
        assert!(layout.cell_from_marker_offset(4).is_none());
    }
}
