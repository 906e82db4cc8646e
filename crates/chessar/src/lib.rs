//! High-level facade crate for the `chessar-*` workspace.
//!
//! This crate provides:
//! - stable, convenient re-exports of the underlying geometry and marker crates
//! - (feature-gated) end-to-end helpers that take `image` crate buffers,
//!   locate the reference marker, and run the board overlay or move reader.
//!
//! ## Quickstart
//!
//! ```no_run
//! use chessar::detect;
//! use chessar::pipeline::BoardLayout;
//! use chessar::core::CameraModel;
//! use image::ImageReader;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let frame = ImageReader::open("frame.png")?.decode()?.to_rgb8();
//! let board = ImageReader::open("board.png")?.decode()?.to_rgb8();
//!
//! let camera = CameraModel::default();
//! let layout = BoardLayout::default();
//!
//! let out = detect::project_board(&frame, &board, &camera, &layout)?;
//! println!("marker found: {}", out.marker_found);
//! # Ok(())
//! # }
//! ```
//!
//! ## API map
//! - `chessar::core`: camera model, rigid transforms, homographies, images.
//! - `chessar::aruco`: marker dictionaries, decoding, and rendering.
//! - `chessar::pipeline`: pose estimation, board overlay, cell extraction,
//!   move reading, and click-to-square mapping.
//! - `chessar::detect` (feature `image`): end-to-end helpers from
//!   `image::RgbImage` / `image::GrayImage`.

pub use chessar_aruco as aruco;
pub use chessar_core as core;
pub use chessar_pipeline as pipeline;

pub use chessar_core::{CameraModel, GeometryError, Homography, PlanarRegion, RigidTransform};
pub use chessar_pipeline::{
    BoardLayout, Classifier, MoveDescriptor, MoveReader, PipelineError, ProjectedFrame, Square,
};

#[cfg(feature = "image")]
pub mod detect;
