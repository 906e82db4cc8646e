//! Flattened region crops and glyph normalization.
//!
//! A region is pulled out of the camera frame by composing the marker pose
//! with the region's fixed offset, projecting its corners, solving the
//! canvas-to-image homography, and inverse-warping into a square canvas. The
//! glyph stage then binarizes the crop and normalizes the largest ink blob to
//! the fixed classifier input size.

use std::collections::VecDeque;

use chessar_core::{
    homography_from_4pt, sample_bilinear, warp_perspective_rgb, CameraModel, GrayImage,
    PlanarRegion, RgbImage, RigidTransform,
};
use nalgebra::Point2;

use crate::layout::BoardLayout;
use crate::project::{all_in_frame, project_points};
use crate::PipelineError;

/// Glyph normalization parameters.
///
/// Defaults reproduce the classifier input contract the models were trained
/// against: 28 x 28 with the ink blob scaled to 18 x 18 and centered by a
/// 5-pixel pad.
#[derive(Clone, Copy, Debug)]
pub struct GlyphParams {
    /// Adaptive threshold window side (odd).
    pub window: usize,
    /// Constant subtracted from the local mean.
    pub bias: f64,
    /// Side of the scaled ink blob.
    pub inner_px: usize,
    /// Pad added around the blob on every side.
    pub pad_px: usize,
}

impl Default for GlyphParams {
    fn default() -> Self {
        Self {
            window: 111,
            bias: 20.0,
            inner_px: 18,
            pad_px: 5,
        }
    }
}

impl GlyphParams {
    /// Final glyph side: `inner_px + 2 * pad_px`.
    pub fn glyph_px(&self) -> usize {
        self.inner_px + 2 * self.pad_px
    }
}

/// Pull one flattened region out of the camera frame.
///
/// Returns `Ok(None)` when any projected corner is out of frame; the whole
/// region is rejected rather than clipped or extrapolated.
pub fn extract_region(
    frame: &RgbImage,
    camera_from_marker: &RigidTransform,
    marker_from_region: &RigidTransform,
    region: &PlanarRegion,
    out_px: usize,
    camera: &CameraModel,
) -> Result<Option<RgbImage>, PipelineError> {
    let camera_from_region = *camera_from_marker * *marker_from_region;
    let img_pts = project_points(&region.corners(), &camera_from_region, camera);
    if !all_in_frame(&img_pts, frame.width, frame.height) {
        log::debug!("region {} projects out of frame; rejected", region.name);
        return Ok(None);
    }

    let canvas = PlanarRegion::canvas_corners(out_px, out_px);
    let img_pts4: [Point2<f64>; 4] = [img_pts[0], img_pts[1], img_pts[2], img_pts[3]];
    // Canvas pixel -> image pixel drives the inverse warp directly.
    let image_from_canvas = homography_from_4pt(&canvas, &img_pts4)?;

    let flat = warp_perspective_rgb(&frame.as_view(), image_from_canvas, out_px, out_px);
    Ok(Some(flat))
}

/// Extract the `index`-th annotation cell (0..4), rotated a quarter turn
/// counter-clockwise into upright writing orientation.
pub fn extract_cell(
    frame: &RgbImage,
    camera_from_marker: &RigidTransform,
    layout: &BoardLayout,
    index: usize,
    camera: &CameraModel,
) -> Result<Option<RgbImage>, PipelineError> {
    let Some(offset) = layout.cell_from_marker_offset(index) else {
        return Ok(None);
    };
    let flat = extract_region(
        frame,
        camera_from_marker,
        &offset,
        &layout.cell_region(index),
        layout.region_canvas_px,
        camera,
    )?;
    Ok(flat.as_ref().map(rotate90_ccw_rgb))
}

/// Rotate an image a quarter turn counter-clockwise.
pub fn rotate90_ccw_rgb(src: &RgbImage) -> RgbImage {
    let mut out = RgbImage::new(src.height, src.width);
    for y in 0..src.height {
        for x in 0..src.width {
            // Column x becomes row (width-1-x).
            out.set(y, src.width - 1 - x, src.at(x, y));
        }
    }
    out
}

/// Normalize a flattened cell into the classifier input raster.
///
/// Binarizes with an inverted adaptive threshold (ink becomes white), crops
/// the largest connected ink component, scales it to `inner_px`, and pads
/// with zeros. Returns `None` when the cell contains no ink.
pub fn extract_glyph(cell: &RgbImage, params: &GlyphParams) -> Option<GrayImage> {
    let gray = cell.to_gray();
    let binary = adaptive_threshold_inv(&gray, params.window, params.bias);

    let (x0, y0, w, h) = largest_component_bbox(&binary)?;

    let cropped = crop(&binary, x0, y0, w, h);
    let scaled = resize_bilinear(&cropped, params.inner_px, params.inner_px);

    let side = params.glyph_px();
    let mut out = GrayImage::new(side, side);
    for y in 0..params.inner_px {
        for x in 0..params.inner_px {
            out.set(x + params.pad_px, y + params.pad_px, scaled.at(x, y));
        }
    }
    Some(out)
}

/// Inverted adaptive threshold: pixel -> 255 where it is darker than the
/// local mean minus `bias`.
fn adaptive_threshold_inv(gray: &GrayImage, window: usize, bias: f64) -> GrayImage {
    let w = gray.width;
    let h = gray.height;
    let r = (window / 2) as i64;

    // Summed-area table with a zero row/column prefix.
    let mut integral = vec![0u64; (w + 1) * (h + 1)];
    for y in 0..h {
        let mut row_sum = 0u64;
        for x in 0..w {
            row_sum += gray.at(x, y) as u64;
            integral[(y + 1) * (w + 1) + (x + 1)] = integral[y * (w + 1) + (x + 1)] + row_sum;
        }
    }

    let mut out = GrayImage::new(w, h);
    for y in 0..h {
        for x in 0..w {
            let x0 = (x as i64 - r).max(0) as usize;
            let y0 = (y as i64 - r).max(0) as usize;
            let x1 = ((x as i64 + r).min(w as i64 - 1) + 1) as usize;
            let y1 = ((y as i64 + r).min(h as i64 - 1) + 1) as usize;

            let area = ((x1 - x0) * (y1 - y0)) as f64;
            let sum = integral[y1 * (w + 1) + x1] + integral[y0 * (w + 1) + x0]
                - integral[y0 * (w + 1) + x1]
                - integral[y1 * (w + 1) + x0];
            let mean = sum as f64 / area;

            out.set(x, y, if (gray.at(x, y) as f64) < mean - bias { 255 } else { 0 });
        }
    }
    out
}

/// Bounding box of the largest 4-connected white component, or `None` for an
/// all-black image.
fn largest_component_bbox(binary: &GrayImage) -> Option<(usize, usize, usize, usize)> {
    let w = binary.width;
    let h = binary.height;
    let mut visited = vec![false; w * h];
    let mut best: Option<(usize, (usize, usize, usize, usize))> = None;

    for sy in 0..h {
        for sx in 0..w {
            let sidx = sy * w + sx;
            if visited[sidx] || binary.data[sidx] == 0 {
                continue;
            }
            visited[sidx] = true;
            let mut q = VecDeque::from([(sx as i32, sy as i32)]);
            let mut count = 0usize;
            let (mut min_x, mut min_y, mut max_x, mut max_y) = (sx, sy, sx, sy);

            while let Some((x, y)) = q.pop_front() {
                count += 1;
                min_x = min_x.min(x as usize);
                min_y = min_y.min(y as usize);
                max_x = max_x.max(x as usize);
                max_y = max_y.max(y as usize);

                for (nx, ny) in [(x - 1, y), (x + 1, y), (x, y - 1), (x, y + 1)] {
                    if nx < 0 || ny < 0 || nx >= w as i32 || ny >= h as i32 {
                        continue;
                    }
                    let nidx = ny as usize * w + nx as usize;
                    if !visited[nidx] && binary.data[nidx] != 0 {
                        visited[nidx] = true;
                        q.push_back((nx, ny));
                    }
                }
            }

            if best.map_or(true, |(c, _)| count > c) {
                best = Some((count, (min_x, min_y, max_x - min_x + 1, max_y - min_y + 1)));
            }
        }
    }

    best.map(|(_, bbox)| bbox)
}

fn crop(src: &GrayImage, x0: usize, y0: usize, w: usize, h: usize) -> GrayImage {
    let mut out = GrayImage::new(w, h);
    for y in 0..h {
        for x in 0..w {
            out.set(x, y, src.at(x0 + x, y0 + y));
        }
    }
    out
}

fn resize_bilinear(src: &GrayImage, out_w: usize, out_h: usize) -> GrayImage {
    let mut out = GrayImage::new(out_w, out_h);
    let view = src.as_view();
    let sx = src.width as f32 / out_w as f32;
    let sy = src.height as f32 / out_h as f32;
    for y in 0..out_h {
        for x in 0..out_w {
            let px = (x as f32 + 0.5) * sx - 0.5;
            let py = (y as f32 + 0.5) * sy - 0.5;
            let v = sample_bilinear(&view, px.max(0.0), py.max(0.0));
            out.set(x, y, v.clamp(0.0, 255.0) as u8);
        }
    }
    out
}
