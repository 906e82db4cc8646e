//! Board overlay compositing.
//!
//! The projected board polygon in the camera frame is zeroed, then the warped
//! board render is added on top. Addition (not blending) assumes the zeroed
//! destination: where overlay and background would both be non-zero the
//! result double-exposes, which is the accepted approximation.

use chessar_aruco::{detect_single, DetectParams, Dictionary};
use chessar_core::{
    homography_from_4pt, warp_perspective_rgb, CameraModel, Homography, PlanarRegion, RgbImage,
};
use nalgebra::Point2;

use crate::layout::BoardLayout;
use crate::pose::estimate_marker_pose;
use crate::project::{project_points, round_to_pixels};
use crate::PipelineError;

/// Per-frame projection result. Created fresh for every camera frame and
/// discarded after use.
#[derive(Clone, Debug)]
pub struct ProjectedFrame {
    /// Whether a marker was found and the overlay applied.
    pub marker_found: bool,
    /// Board-canvas-to-image homography, when a marker was found.
    pub board_to_image: Option<Homography>,
    /// The frame to display: composited if a marker was found, otherwise the
    /// unmodified camera frame.
    pub image: RgbImage,
}

/// Project the board render onto the camera frame.
///
/// A frame without a recognizable marker is returned unmodified with
/// `marker_found == false`; the caller simply displays it and retries on the
/// next frame.
pub fn project_board(
    frame: &RgbImage,
    board_render: &RgbImage,
    camera: &CameraModel,
    layout: &BoardLayout,
    dict: &Dictionary,
    params: &DetectParams,
) -> Result<ProjectedFrame, PipelineError> {
    let gray = frame.to_gray();
    let Some(det) = detect_single(&gray.as_view(), dict, params) else {
        log::debug!("no marker in frame; skipping overlay");
        return Ok(ProjectedFrame {
            marker_found: false,
            board_to_image: None,
            image: frame.clone(),
        });
    };

    let pose = estimate_marker_pose(&det.corners, camera, layout.marker_size)?;
    let camera_from_board = pose * layout.board_from_marker_offset();

    let img_pts = project_points(&layout.board_region().corners(), &camera_from_board, camera);
    let canvas = PlanarRegion::canvas_corners(board_render.width, board_render.height);

    let img_pts4: [Point2<f64>; 4] = [img_pts[0], img_pts[1], img_pts[2], img_pts[3]];
    let board_to_image = homography_from_4pt(&canvas, &img_pts4)?;

    // Inverse mapping drives the warp: each frame pixel samples the render.
    let image_to_board = board_to_image.inverse()?;
    let warped = warp_perspective_rgb(
        &board_render.as_view(),
        image_to_board,
        frame.width,
        frame.height,
    );

    let mut out = frame.clone();
    fill_convex_quad(&mut out, &round_to_pixels(&img_pts), [0, 0, 0]);
    add_saturating(&mut out, &warped);

    Ok(ProjectedFrame {
        marker_found: true,
        board_to_image: Some(board_to_image),
        image: out,
    })
}

/// Fill a convex quad by horizontal scanlines.
pub(crate) fn fill_convex_quad(img: &mut RgbImage, quad: &[Point2<i32>], color: [u8; 3]) {
    let ys: Vec<i32> = quad.iter().map(|p| p.y).collect();
    let y_min = ys.iter().min().copied().unwrap_or(0).max(0);
    let y_max = ys
        .iter()
        .max()
        .copied()
        .unwrap_or(-1)
        .min(img.height as i32 - 1);

    for y in y_min..=y_max {
        let mut x_min = i32::MAX;
        let mut x_max = i32::MIN;
        for i in 0..quad.len() {
            let a = quad[i];
            let b = quad[(i + 1) % quad.len()];
            if a.y == b.y {
                if a.y == y {
                    x_min = x_min.min(a.x.min(b.x));
                    x_max = x_max.max(a.x.max(b.x));
                }
                continue;
            }
            let (lo, hi) = if a.y < b.y { (a, b) } else { (b, a) };
            if y < lo.y || y > hi.y {
                continue;
            }
            let t = (y - lo.y) as f64 / (hi.y - lo.y) as f64;
            let x = (lo.x as f64 + t * (hi.x - lo.x) as f64).round() as i32;
            x_min = x_min.min(x);
            x_max = x_max.max(x);
        }
        if x_min > x_max {
            continue;
        }
        for x in x_min.max(0)..=x_max.min(img.width as i32 - 1) {
            img.set(x as usize, y as usize, color);
        }
    }
}

fn add_saturating(dst: &mut RgbImage, src: &RgbImage) {
    debug_assert_eq!(dst.data.len(), src.data.len());
    for (d, s) in dst.data.iter_mut().zip(src.data.iter()) {
        *d = d.saturating_add(*s);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chessar_aruco::builtins::dict_4x4_100;

    fn white_frame(w: usize, h: usize) -> RgbImage {
        RgbImage {
            width: w,
            height: h,
            data: vec![255u8; w * h * 3],
        }
    }

    #[test]
    fn markerless_frame_passes_through_untouched() {
        let frame = white_frame(320, 240);
        let board = white_frame(64, 64);
        let out = project_board(
            &frame,
            &board,
            &CameraModel::default(),
            &BoardLayout::default(),
            &dict_4x4_100(),
            &DetectParams::default(),
        )
        .expect("markerless frames are not an error");

        assert!(!out.marker_found);
        assert!(out.board_to_image.is_none());
        assert_eq!(out.image, frame);
    }

    #[test]
    fn convex_fill_covers_the_quad_interior() {
        let mut img = white_frame(20, 20);
        let quad = [
            Point2::new(4, 4),
            Point2::new(15, 4),
            Point2::new(15, 15),
            Point2::new(4, 15),
        ];
        fill_convex_quad(&mut img, &quad, [0, 0, 0]);
        assert_eq!(img.at(10, 10), [0, 0, 0]);
        assert_eq!(img.at(4, 4), [0, 0, 0]);
        assert_eq!(img.at(2, 2), [255, 255, 255]);
        assert_eq!(img.at(17, 10), [255, 255, 255]);
    }

    #[test]
    fn fill_clips_to_the_image_bounds() {
        let mut img = white_frame(10, 10);
        let quad = [
            Point2::new(-5, -5),
            Point2::new(14, -5),
            Point2::new(14, 14),
            Point2::new(-5, 14),
        ];
        fill_convex_quad(&mut img, &quad, [1, 2, 3]);
        assert_eq!(img.at(0, 0), [1, 2, 3]);
        assert_eq!(img.at(9, 9), [1, 2, 3]);
    }
}
