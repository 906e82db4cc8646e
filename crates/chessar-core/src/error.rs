/// Errors produced by the pure geometric operations.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq)]
pub enum GeometryError {
    /// The 4-point homography solve received degenerate correspondences
    /// (collinear or coincident points).
    #[error("homography solve is ill-conditioned (degenerate correspondences)")]
    IllConditioned,

    /// The homography has no inverse.
    #[error("homography is singular and cannot be inverted")]
    Singular,

    /// Camera intrinsics failed validation.
    #[error("invalid camera intrinsics (fx={fx}, fy={fy}, cx={cx}, cy={cy})")]
    InvalidIntrinsics { fx: f64, fy: f64, cx: f64, cy: f64 },
}
