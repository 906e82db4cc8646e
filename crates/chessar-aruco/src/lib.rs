//! Square fiducial (ArUco-style) dictionaries and whole-frame detection.
//!
//! This crate covers:
//! - a built-in 4x4 code dictionary (procedurally generated, rotation-unique),
//! - matching observed marker codes against the dictionary,
//! - locating and decoding markers in a grayscale frame,
//! - rendering synthetic markers for printing and tests.
//!
//! Detection is a pure function over the input frame plus the fixed
//! dictionary. When several markers are visible, [`detect_single`] selects
//! the one with the lowest dictionary id.

pub mod builtins;
mod detect;
mod dictionary;
mod matcher;
mod render;
mod threshold;

pub use detect::{detect_markers, detect_single, DetectParams, MarkerCorners, MarkerDetection};
pub use dictionary::Dictionary;
pub use matcher::{rotate_code_u64, Match, Matcher};
pub use render::render_marker;
