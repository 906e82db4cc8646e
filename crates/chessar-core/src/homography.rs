use nalgebra::{Matrix3, Point2, SMatrix, SVector, Vector3};

use crate::error::GeometryError;
use crate::image::{
    sample_bilinear_rgb, sample_bilinear_u8, GrayImage, GrayImageView, RgbImage, RgbImageView,
};

/// Planar projective transform. Maps region-plane points to image pixels (or
/// the reverse, for the inverse homography).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Homography {
    pub h: Matrix3<f64>,
}

impl Homography {
    pub fn new(h: Matrix3<f64>) -> Self {
        Self { h }
    }

    pub fn identity() -> Self {
        Self::new(Matrix3::identity())
    }

    pub fn from_array(rows: [[f64; 3]; 3]) -> Self {
        Self::new(Matrix3::from_row_slice(&[
            rows[0][0], rows[0][1], rows[0][2], rows[1][0], rows[1][1], rows[1][2], rows[2][0],
            rows[2][1], rows[2][2],
        ]))
    }

    pub fn to_array(&self) -> [[f64; 3]; 3] {
        [
            [self.h[(0, 0)], self.h[(0, 1)], self.h[(0, 2)]],
            [self.h[(1, 0)], self.h[(1, 1)], self.h[(1, 2)]],
            [self.h[(2, 0)], self.h[(2, 1)], self.h[(2, 2)]],
        ]
    }

    #[inline]
    pub fn apply(&self, p: Point2<f64>) -> Point2<f64> {
        let v = self.h * Vector3::new(p.x, p.y, 1.0);
        let w = v[2];
        Point2::new(v[0] / w, v[1] / w)
    }

    /// Inverse mapping. Fails explicitly for a singular forward homography
    /// instead of propagating NaNs downstream.
    pub fn inverse(&self) -> Result<Self, GeometryError> {
        self.h
            .try_inverse()
            .map(Self::new)
            .ok_or(GeometryError::Singular)
    }
}

fn hartley_normalization(cx: f64, cy: f64, mean_dist: f64) -> Matrix3<f64> {
    let s = if mean_dist > 1e-12 {
        (2.0_f64).sqrt() / mean_dist
    } else {
        1.0
    };

    Matrix3::<f64>::new(s, 0.0, -s * cx, 0.0, s, -s * cy, 0.0, 0.0, 1.0)
}

fn normalize_points4(pts: &[Point2<f64>; 4]) -> ([Point2<f64>; 4], Matrix3<f64>) {
    // Hartley normalization: translate to centroid, scale so mean distance = sqrt(2)
    let n = 4.0_f64;
    let mut cx = 0.0_f64;
    let mut cy = 0.0_f64;
    for p in pts {
        cx += p.x;
        cy += p.y;
    }
    cx /= n;
    cy /= n;

    let mut mean_dist = 0.0_f64;
    for p in pts {
        let dx = p.x - cx;
        let dy = p.y - cy;
        mean_dist += (dx * dx + dy * dy).sqrt();
    }
    mean_dist /= n;

    let t = hartley_normalization(cx, cy, mean_dist);

    let mut out = [Point2::new(0.0_f64, 0.0_f64); 4];
    for (i, p) in pts.iter().enumerate() {
        let v = t * Vector3::new(p.x, p.y, 1.0);
        out[i] = Point2::new(v[0], v[1]);
    }

    (out, t)
}

fn normalize_homography(h: Matrix3<f64>) -> Option<Matrix3<f64>> {
    let s = h[(2, 2)];
    if s.abs() < 1e-12 {
        return None;
    }
    Some(h / s)
}

fn denormalize_homography(
    hn: Matrix3<f64>,
    t_src: Matrix3<f64>,
    t_dst: Matrix3<f64>,
) -> Option<Matrix3<f64>> {
    let t_dst_inv = t_dst.try_inverse()?;
    Some(t_dst_inv * hn * t_src)
}

/// Compute H such that: dst ~ H * src (projective), using 4 point correspondences.
///
/// Corner order must be consistent between `src` and `dst`. Degenerate input
/// (collinear or repeated points) fails with [`GeometryError::IllConditioned`]
/// rather than producing a matrix with NaN/Inf entries.
pub fn homography_from_4pt(
    src: &[Point2<f64>; 4],
    dst: &[Point2<f64>; 4],
) -> Result<Homography, GeometryError> {
    // Unknowns: [h11 h12 h13 h21 h22 h23 h31 h32], with h33 = 1
    // For each correspondence (x,y)->(u,v):
    // h11 x + h12 y + h13 - u h31 x - u h32 y = u
    // h21 x + h22 y + h23 - v h31 x - v h32 y = v
    let (src_n, t_src) = normalize_points4(src);
    let (dst_n, t_dst) = normalize_points4(dst);

    let mut a = SMatrix::<f64, 8, 8>::zeros();
    let mut b = SVector::<f64, 8>::zeros();

    for k in 0..4 {
        let x = src_n[k].x;
        let y = src_n[k].y;
        let u = dst_n[k].x;
        let v = dst_n[k].y;

        // row 2k
        let r0 = 2 * k;
        a[(r0, 0)] = x;
        a[(r0, 1)] = y;
        a[(r0, 2)] = 1.0;
        a[(r0, 6)] = -u * x;
        a[(r0, 7)] = -u * y;
        b[r0] = u;

        // row 2k+1
        let r1 = 2 * k + 1;
        a[(r1, 3)] = x;
        a[(r1, 4)] = y;
        a[(r1, 5)] = 1.0;
        a[(r1, 6)] = -v * x;
        a[(r1, 7)] = -v * y;
        b[r1] = v;
    }

    let x = a.lu().solve(&b).ok_or(GeometryError::IllConditioned)?;

    let hn = Matrix3::<f64>::new(
        x[0], x[1], x[2], //
        x[3], x[4], x[5], //
        x[6], x[7], 1.0,
    );

    let h = denormalize_homography(hn, t_src, t_dst)
        .and_then(normalize_homography)
        .ok_or(GeometryError::IllConditioned)?;

    if h.iter().any(|v| !v.is_finite()) {
        return Err(GeometryError::IllConditioned);
    }

    // Near-degenerate input can slip through LU with tiny pivots. Verify the
    // solution actually reproduces the correspondences.
    let hg = Homography::new(h);
    let scale = dst
        .iter()
        .map(|p| p.coords.norm())
        .fold(1.0_f64, f64::max);
    for (s, d) in src.iter().zip(dst.iter()) {
        let q = hg.apply(*s);
        if !q.x.is_finite() || !q.y.is_finite() || (q.coords - d.coords).norm() > 1e-6 * scale {
            return Err(GeometryError::IllConditioned);
        }
    }

    Ok(hg)
}

/// Warp into a fixed-size canvas: for each destination pixel, map back to the
/// source through `h_src_from_dst` and sample bilinearly.
pub fn warp_perspective_gray(
    src: &GrayImageView<'_>,
    h_src_from_dst: Homography,
    out_w: usize,
    out_h: usize,
) -> GrayImage {
    let mut out = GrayImage::new(out_w, out_h);

    for y in 0..out_h {
        for x in 0..out_w {
            // map the destination pixel center, then shift back by half a
            // pixel so integer sample coordinates land on source pixels
            let pd = Point2::new(x as f64 + 0.5, y as f64 + 0.5);
            let ps = h_src_from_dst.apply(pd);
            let v = sample_bilinear_u8(src, (ps.x - 0.5) as f32, (ps.y - 0.5) as f32);
            out.data[y * out_w + x] = v;
        }
    }

    out
}

/// Color variant of [`warp_perspective_gray`]. Out-of-source pixels are black.
pub fn warp_perspective_rgb(
    src: &RgbImageView<'_>,
    h_src_from_dst: Homography,
    out_w: usize,
    out_h: usize,
) -> RgbImage {
    let mut out = RgbImage::new(out_w, out_h);

    for y in 0..out_h {
        for x in 0..out_w {
            let pd = Point2::new(x as f64 + 0.5, y as f64 + 0.5);
            let ps = h_src_from_dst.apply(pd);
            let px = sample_bilinear_rgb(src, (ps.x - 0.5) as f32, (ps.y - 0.5) as f32);
            out.set(x, y, px);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: Point2<f64>, b: Point2<f64>, tol: f64) {
        let dx = (a.x - b.x).abs();
        let dy = (a.y - b.y).abs();
        assert!(
            dx < tol && dy < tol,
            "expected ({:.6},{:.6}) ~ ({:.6},{:.6}) within {}",
            a.x,
            a.y,
            b.x,
            b.y,
            tol
        );
    }

    fn unit_square() -> [Point2<f64>; 4] {
        [
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(1.0, 1.0),
            Point2::new(0.0, 1.0),
        ]
    }

    #[test]
    fn four_point_solve_recovers_known_h() {
        let ground_truth = Homography::new(Matrix3::new(
            0.8, 0.05, 120.0, //
            -0.02, 1.1, 80.0, //
            0.0009, -0.0004, 1.0,
        ));

        let src = [
            Point2::new(0.0, 0.0),
            Point2::new(180.0, 0.0),
            Point2::new(180.0, 130.0),
            Point2::new(0.0, 130.0),
        ];
        let dst = src.map(|p| ground_truth.apply(p));

        let recovered = homography_from_4pt(&src, &dst).expect("recoverable");

        for p in [
            Point2::new(0.0, 0.0),
            Point2::new(60.0, 40.0),
            Point2::new(150.0, 120.0),
        ] {
            assert_close(recovered.apply(p), ground_truth.apply(p), 1e-6);
        }
    }

    #[test]
    fn forward_and_reverse_solves_compose_to_identity() {
        let src = [
            Point2::new(0.0, 0.0),
            Point2::new(128.0, 0.0),
            Point2::new(128.0, 128.0),
            Point2::new(0.0, 128.0),
        ];
        let dst = [
            Point2::new(310.0, 95.0),
            Point2::new(420.0, 110.0),
            Point2::new(405.0, 230.0),
            Point2::new(300.0, 210.0),
        ];

        let fwd = homography_from_4pt(&src, &dst).expect("forward");
        let rev = homography_from_4pt(&dst, &src).expect("reverse");

        for &p in &src {
            assert_close(rev.apply(fwd.apply(p)), p, 1e-6);
        }
    }

    #[test]
    fn collinear_points_fail_without_nans() {
        let src = [
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 1.0),
            Point2::new(2.0, 2.0),
            Point2::new(3.0, 3.0),
        ];
        let dst = unit_square();

        assert_eq!(
            homography_from_4pt(&src, &dst),
            Err(GeometryError::IllConditioned)
        );
    }

    #[test]
    fn repeated_points_fail_without_nans() {
        let src = [Point2::new(5.0, 5.0); 4];
        let dst = unit_square();
        assert_eq!(
            homography_from_4pt(&src, &dst),
            Err(GeometryError::IllConditioned)
        );
    }

    #[test]
    fn singular_homography_has_no_inverse() {
        let h = Homography::new(Matrix3::zeros());
        assert_eq!(h.inverse(), Err(GeometryError::Singular));
    }

    #[test]
    fn identity_warp_returns_source_unchanged() {
        let mut src = GrayImage::new(8, 8);
        for v in src.data.iter_mut() {
            *v = 173;
        }
        let out = warp_perspective_gray(&src.as_view(), Homography::identity(), 8, 8);
        assert_eq!(out, src);
    }

    #[test]
    fn identity_warp_preserves_a_gradient_exactly() {
        // Catches any residual sub-pixel shift, not just edge bleed.
        let mut src = GrayImage::new(9, 7);
        for y in 0..7 {
            for x in 0..9 {
                src.set(x, y, (x * 20 + y * 10) as u8);
            }
        }
        let out = warp_perspective_gray(&src.as_view(), Homography::identity(), 9, 7);
        assert_eq!(out, src);
    }

    #[test]
    fn quarter_turn_warp_rotates_checkerboard() {
        // 2x2-checker image: left half dark, right half light.
        let n = 16usize;
        let mut src = GrayImage::new(n, n);
        for y in 0..n {
            for x in 0..n {
                src.set(x, y, if x < n / 2 { 0 } else { 200 });
            }
        }

        // Destination -> source mapping for a 90-degree CCW rotation of the
        // source content: dst(x, y) draws from src(n - y, x).
        let h = Homography::from_array([
            [0.0, -1.0, n as f64], //
            [1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0],
        ]);
        let out = warp_perspective_gray(&src.as_view(), h, n, n);

        // Vertical halves become horizontal halves.
        assert_eq!(out.at(n / 2, 2), out.at(2, 2));
        assert!(out.at(4, 2) > 100, "top rows take the light half");
        assert!(out.at(4, 12) < 50, "bottom rows take the dark half");
    }
}
