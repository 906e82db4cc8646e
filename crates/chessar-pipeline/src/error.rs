use chessar_core::GeometryError;

/// Errors produced by the frame pipeline.
///
/// "Marker not visible" is deliberately *not* here: it is a recoverable
/// per-frame state and surfaces as `Option::None` from the operations that
/// need a pose.
#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    /// The marker corners admit no planar pose (degenerate quadrilateral).
    #[error("marker corners are degenerate; no pose could be recovered")]
    DegeneratePose,

    #[error(transparent)]
    Geometry(#[from] GeometryError),

    /// A classifier label could not be mapped onto a board square.
    #[error("classifier label {label} is not a valid {expected}")]
    InvalidLabel { label: u8, expected: &'static str },
}
