//! Core types for marker-relative board geometry.
//!
//! This crate is intentionally small and purely geometric. It does *not*
//! depend on any concrete marker detector or on the `image` crate; frames are
//! passed around as lightweight row-major buffer views.

mod camera;
mod error;
mod homography;
mod image;
mod logger;
mod region;
mod transform;

pub use camera::CameraModel;
pub use error::GeometryError;
pub use homography::{
    homography_from_4pt, warp_perspective_gray, warp_perspective_rgb, Homography,
};
pub use image::{
    sample_bilinear, sample_bilinear_rgb, sample_bilinear_u8, GrayImage, GrayImageView, RgbImage,
    RgbImageView,
};
pub use region::PlanarRegion;
pub use transform::RigidTransform;

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::init_with_level;
