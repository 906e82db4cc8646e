//! Whole-frame marker localization and decoding.
//!
//! Candidate quads are estimated from the extreme points of each dark
//! connected component, so markers under moderate perspective tilt decode
//! correctly. In-plane rotations approaching 45 degrees make the extreme
//! points ambiguous and such candidates fail the border check; quarter-turn
//! rotations are handled separately by the dictionary matcher.

use std::collections::VecDeque;

use chessar_core::{homography_from_4pt, GrayImageView};
use nalgebra::Point2;
use serde::Serialize;

use crate::threshold::otsu_threshold_from_samples;
use crate::{Dictionary, Matcher};

/// The four marker corners in image coordinates.
///
/// `corners[0]` is the marker's canonical top-left regardless of the marker's
/// in-image rotation; the rest follow in canonical TL, TR, BR, BL order.
pub type MarkerCorners = [Point2<f64>; 4];

/// One decoded marker in a camera frame.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct MarkerDetection {
    pub id: u32,
    /// Clockwise quarter turns of the marker relative to its canonical pose.
    pub rotation: u8,
    pub hamming: u8,
    pub corners: MarkerCorners,
    pub center: Point2<f64>,
}

/// Candidate filtering parameters.
#[derive(Clone, Copy, Debug)]
pub struct DetectParams {
    /// Reject components whose bounding box is smaller than this on a side.
    pub min_side_px: u32,
    /// Accepted bounding-box aspect ratio range (w/h).
    pub aspect_range: (f32, f32),
    /// Accepted dark-pixel fill fraction of the bounding box.
    pub fill_range: (f32, f32),
    /// Maximum Hamming distance for dictionary matching.
    pub max_hamming: u8,
}

impl Default for DetectParams {
    fn default() -> Self {
        Self {
            min_side_px: 12,
            aspect_range: (0.7, 1.3),
            fill_range: (0.18, 0.95),
            max_hamming: 0,
        }
    }
}

/// Detect every decodable marker in a grayscale frame.
///
/// Results are sorted by ascending id. Pure function over the frame plus the
/// fixed dictionary; a frame without markers yields an empty vector.
pub fn detect_markers(
    gray: &GrayImageView<'_>,
    dict: &Dictionary,
    params: &DetectParams,
) -> Vec<MarkerDetection> {
    let grid = dict.marker_size + 2; // payload plus one border bit per side
    let matcher = Matcher::new(dict.clone(), params.max_hamming);
    let threshold = frame_threshold(gray);

    let mut out = Vec::new();
    for cand in find_candidates(gray, threshold, params) {
        let Some(bits) = sample_grid_bits(gray, &cand.corners, grid, threshold) else {
            continue;
        };
        if !border_is_black(&bits, grid) {
            continue;
        }
        let code = extract_payload(&bits, dict.marker_size, grid);
        let Some(m) = matcher.match_code(code) else {
            continue;
        };

        let mut corners = cand.corners;
        // The observed code equals the dictionary code rotated `m.rotation`
        // quarter turns clockwise, so the canonical top-left sits at image
        // corner index `m.rotation`.
        corners.rotate_left(m.rotation as usize % 4);

        out.push(MarkerDetection {
            id: m.id,
            rotation: m.rotation,
            hamming: m.hamming,
            corners,
            center: quad_center(&cand.corners),
        });
    }

    out.sort_by_key(|d| d.id);
    log::debug!("decoded {} marker(s) in frame", out.len());
    out
}

/// Detect exactly one marker.
///
/// Policy: when several markers are visible, the one with the lowest
/// dictionary id is selected deterministically. Returns `None` for a frame
/// with no recognizable marker.
pub fn detect_single(
    gray: &GrayImageView<'_>,
    dict: &Dictionary,
    params: &DetectParams,
) -> Option<MarkerDetection> {
    detect_markers(gray, dict, params).into_iter().next()
}

/// A dark component that passed the size, aspect, and fill filters, reduced
/// to its estimated quad corners in TL, TR, BR, BL image order.
#[derive(Clone, Copy)]
struct Candidate {
    corners: MarkerCorners,
}

/// Global binarization threshold from a sparse sample of the frame.
/// Pixels at or below the threshold count as black.
fn frame_threshold(gray: &GrayImageView<'_>) -> u8 {
    let step = (gray.data.len() / 4096).max(1);
    let samples: Vec<u8> = gray.data.iter().step_by(step).copied().collect();
    otsu_threshold_from_samples(&samples)
}

fn find_candidates(gray: &GrayImageView<'_>, threshold: u8, params: &DetectParams) -> Vec<Candidate> {
    let w = gray.width;
    let h = gray.height;
    if w == 0 || h == 0 {
        return Vec::new();
    }

    let min_side = params.min_side_px.max(6);
    let mut visited = vec![false; w * h];
    let mut out = Vec::new();

    for y0 in 0..h {
        for x0 in 0..w {
            let idx0 = y0 * w + x0;
            if visited[idx0] || gray.data[idx0] > threshold {
                continue;
            }
            let mut q = VecDeque::new();
            q.push_back((x0 as i32, y0 as i32));
            visited[idx0] = true;

            let mut count = 0usize;
            let mut min_x = x0 as u32;
            let mut min_y = y0 as u32;
            let mut max_x = x0 as u32;
            let mut max_y = y0 as u32;

            // Extreme points along the two diagonal directions locate the
            // quad corners for tilts below a quarter turn.
            let p0 = (x0 as i32, y0 as i32);
            let mut tl = p0;
            let mut tr = p0;
            let mut br = p0;
            let mut bl = p0;

            while let Some((x, y)) = q.pop_front() {
                count += 1;
                min_x = min_x.min(x as u32);
                min_y = min_y.min(y as u32);
                max_x = max_x.max(x as u32);
                max_y = max_y.max(y as u32);

                if x + y < tl.0 + tl.1 {
                    tl = (x, y);
                }
                if x - y > tr.0 - tr.1 {
                    tr = (x, y);
                }
                if x + y > br.0 + br.1 {
                    br = (x, y);
                }
                if x - y < bl.0 - bl.1 {
                    bl = (x, y);
                }

                for (nx, ny) in [(x - 1, y), (x + 1, y), (x, y - 1), (x, y + 1)] {
                    if nx < 0 || ny < 0 || nx >= w as i32 || ny >= h as i32 {
                        continue;
                    }
                    let nidx = ny as usize * w + nx as usize;
                    if visited[nidx] || gray.data[nidx] > threshold {
                        continue;
                    }
                    visited[nidx] = true;
                    q.push_back((nx, ny));
                }
            }

            let bw = max_x - min_x + 1;
            let bh = max_y - min_y + 1;
            if bw < min_side || bh < min_side {
                continue;
            }
            let ratio = bw as f32 / bh as f32;
            if ratio < params.aspect_range.0 || ratio > params.aspect_range.1 {
                continue;
            }
            let fill = count as f32 / ((bw as usize * bh as usize).max(1)) as f32;
            if fill < params.fill_range.0 || fill > params.fill_range.1 {
                continue;
            }

            out.push(Candidate {
                corners: quad_from_extremes(tl, tr, br, bl),
            });
        }
    }

    out
}

/// Majority-vote each grid cell through the quad homography.
///
/// Cells are sampled at a 3x3 grid of interior points mapped from the
/// canonical grid square onto the image quad. Returns `None` when the quad
/// is degenerate or falls entirely outside the frame.
fn sample_grid_bits(
    gray: &GrayImageView<'_>,
    corners: &MarkerCorners,
    grid: usize,
    threshold: u8,
) -> Option<Vec<u8>> {
    let g = grid as f64;
    let canonical = [
        Point2::new(0.0, 0.0),
        Point2::new(g, 0.0),
        Point2::new(g, g),
        Point2::new(0.0, g),
    ];
    let h = homography_from_4pt(&canonical, corners).ok()?;

    let mut bits = vec![0u8; grid * grid];
    for gy in 0..grid {
        for gx in 0..grid {
            let mut black = 0usize;
            let mut total = 0usize;
            for sy in 0..3 {
                for sx in 0..3 {
                    let p = h.apply(Point2::new(
                        gx as f64 + (sx as f64 + 0.5) / 3.0,
                        gy as f64 + (sy as f64 + 0.5) / 3.0,
                    ));
                    let xi = p.x.floor() as i64;
                    let yi = p.y.floor() as i64;
                    if xi < 0 || yi < 0 || xi >= gray.width as i64 || yi >= gray.height as i64 {
                        continue;
                    }
                    total += 1;
                    if gray.data[yi as usize * gray.width + xi as usize] <= threshold {
                        black += 1;
                    }
                }
            }
            if total == 0 {
                return None;
            }
            bits[gy * grid + gx] = u8::from(black * 2 >= total);
        }
    }
    Some(bits)
}

fn border_is_black(bits: &[u8], grid: usize) -> bool {
    for i in 0..grid {
        if bits[i] == 0 || bits[(grid - 1) * grid + i] == 0 {
            return false;
        }
        if bits[i * grid] == 0 || bits[i * grid + (grid - 1)] == 0 {
            return false;
        }
    }
    true
}

fn extract_payload(bits: &[u8], payload: usize, grid: usize) -> u64 {
    let mut code = 0u64;
    for y in 0..payload {
        for x in 0..payload {
            if bits[(y + 1) * grid + (x + 1)] != 0 {
                code |= 1u64 << (y * payload + x);
            }
        }
    }
    code
}

/// Push each extreme pixel's center out to the pixel corner facing away from
/// the quad centroid, so the quad hugs the outer edge of the dark border.
fn quad_from_extremes(
    tl: (i32, i32),
    tr: (i32, i32),
    br: (i32, i32),
    bl: (i32, i32),
) -> MarkerCorners {
    let centers = [tl, tr, br, bl].map(|(x, y)| Point2::new(x as f64 + 0.5, y as f64 + 0.5));
    let cx = centers.iter().map(|p| p.x).sum::<f64>() / 4.0;
    let cy = centers.iter().map(|p| p.y).sum::<f64>() / 4.0;
    centers.map(|p| {
        Point2::new(
            p.x + 0.5 * (p.x - cx).signum(),
            p.y + 0.5 * (p.y - cy).signum(),
        )
    })
}

fn quad_center(corners: &MarkerCorners) -> Point2<f64> {
    Point2::new(
        corners.iter().map(|p| p.x).sum::<f64>() / 4.0,
        corners.iter().map(|p| p.y).sum::<f64>() / 4.0,
    )
}
