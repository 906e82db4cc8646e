//! The camera-to-board geometry pipeline.
//!
//! One marker detection locates everything: the marker pose is composed with
//! fixed physical offsets to reach the board and the four annotation cells,
//! their corners are projected through the camera model, and per-region
//! homographies drive both overlay compositing and flattened crop extraction.
//!
//! Frame processing is single-threaded and synchronous; the only state that
//! outlives a frame is the immutable [`chessar_core::CameraModel`] and
//! [`BoardLayout`].

mod clicks;
mod error;
mod extract;
mod layout;
mod moves;
mod overlay;
mod pose;
mod project;

pub use clicks::{image_to_board, square_at_click, square_at_pixel, ClickQueue};
pub use error::PipelineError;
pub use extract::{extract_cell, extract_glyph, extract_region, rotate90_ccw_rgb, GlyphParams};
pub use layout::BoardLayout;
pub use moves::{Classifier, MoveApplier, MoveDescriptor, MoveReader, Side, Square};
pub use overlay::{project_board, ProjectedFrame};
pub use pose::estimate_marker_pose;
pub use project::{all_in_frame, project_points, round_to_pixels};
