use nalgebra::{Point2, Point3};
use serde::{Deserialize, Serialize};

/// A named rectangle on the z = 0 plane of some local frame (the whole board,
/// or one annotation cell). Static configuration data, never mutated.
///
/// Corner winding is fixed everywhere in this workspace: counter-clockwise
/// starting at the local origin, i.e. (0,0), (w,0), (w,h), (0,h).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlanarRegion {
    pub name: String,
    /// Physical extent along the local x axis (same unit as the marker size).
    pub width: f64,
    /// Physical extent along the local y axis.
    pub height: f64,
}

impl PlanarRegion {
    pub fn new(name: impl Into<String>, width: f64, height: f64) -> Self {
        Self {
            name: name.into(),
            width,
            height,
        }
    }

    pub fn square(name: impl Into<String>, side: f64) -> Self {
        Self::new(name, side, side)
    }

    /// The 4 corners in local 3-D coordinates, in the fixed winding order.
    pub fn corners(&self) -> [Point3<f64>; 4] {
        [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(self.width, 0.0, 0.0),
            Point3::new(self.width, self.height, 0.0),
            Point3::new(0.0, self.height, 0.0),
        ]
    }

    /// The same corners mapped to a `w × h` pixel canvas, same winding.
    pub fn canvas_corners(w: usize, h: usize) -> [Point2<f64>; 4] {
        [
            Point2::new(0.0, 0.0),
            Point2::new(w as f64, 0.0),
            Point2::new(w as f64, h as f64),
            Point2::new(0.0, h as f64),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corners_follow_the_documented_winding() {
        let r = PlanarRegion::new("board", 6.0, 6.0);
        let c = r.corners();
        assert_eq!(c[0], Point3::new(0.0, 0.0, 0.0));
        assert_eq!(c[1], Point3::new(6.0, 0.0, 0.0));
        assert_eq!(c[2], Point3::new(6.0, 6.0, 0.0));
        assert_eq!(c[3], Point3::new(0.0, 6.0, 0.0));
    }

    #[test]
    fn all_corners_lie_on_the_local_plane() {
        let r = PlanarRegion::square("cell", 1.8);
        assert!(r.corners().iter().all(|p| p.z == 0.0));
    }
}
