//! Reading a hand-written move from the four annotation cells.
//!
//! The cells spell "start file, start rank, end file, end rank". Letter and
//! digit recognition are opaque collaborators behind the [`Classifier`]
//! trait; this module only owns label-to-square decoding and orchestration.

use std::fmt;

use chessar_core::{CameraModel, GrayImage, RgbImage, RigidTransform};
use serde::{Deserialize, Serialize};

use crate::extract::{extract_cell, extract_glyph, GlyphParams};
use crate::layout::BoardLayout;
use crate::PipelineError;

/// Opaque glyph classifier: a fixed-size grayscale raster in, a label out.
///
/// Letter models label 'A'..='Z' as 1..=26; digit models label digits
/// verbatim. No contract on the implementation.
pub trait Classifier {
    fn classify(&self, glyph: &GrayImage) -> u8;
}

/// Move application collaborator. Consumed only with the two squares this
/// pipeline decodes; legality rules live entirely behind this seam.
pub trait MoveApplier {
    type Position;

    fn apply_move(
        &self,
        position: &Self::Position,
        mv: &MoveDescriptor,
        side_to_move: Side,
    ) -> Option<Self::Position>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    White,
    Black,
}

/// One board square, file A..H and rank 1..8 stored as 0-based indices.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Square {
    pub file: u8,
    pub rank: u8,
}

impl Square {
    pub fn new(file: u8, rank: u8) -> Option<Self> {
        (file < 8 && rank < 8).then_some(Self { file, rank })
    }

    /// Build a square from classifier labels: a letter label (1 = 'A') and a
    /// digit label (the rank digit itself).
    pub fn from_labels(letter_label: u8, digit_label: u8) -> Result<Self, PipelineError> {
        if !(1..=8).contains(&letter_label) {
            return Err(PipelineError::InvalidLabel {
                label: letter_label,
                expected: "file letter (A-H)",
            });
        }
        if !(1..=8).contains(&digit_label) {
            return Err(PipelineError::InvalidLabel {
                label: digit_label,
                expected: "rank digit (1-8)",
            });
        }
        Ok(Self {
            file: letter_label - 1,
            rank: digit_label - 1,
        })
    }

    pub fn file_char(&self) -> char {
        (b'A' + self.file) as char
    }

    pub fn rank_char(&self) -> char {
        (b'1' + self.rank) as char
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.file_char(), self.rank_char())
    }
}

/// A decoded move: start and end squares.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveDescriptor {
    pub from: Square,
    pub to: Square,
}

impl fmt::Display for MoveDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)
    }
}

/// Orchestrates cell extraction, glyph normalization, and classification
/// into a [`MoveDescriptor`].
pub struct MoveReader<'a> {
    pub camera: &'a CameraModel,
    pub layout: &'a BoardLayout,
    pub glyph: GlyphParams,
}

impl<'a> MoveReader<'a> {
    pub fn new(camera: &'a CameraModel, layout: &'a BoardLayout) -> Self {
        Self {
            camera,
            layout,
            glyph: GlyphParams::default(),
        }
    }

    /// Read the move written in the four annotation cells.
    ///
    /// Returns `Ok(None)` when any cell cannot be extracted (region out of
    /// frame) or contains no ink; a misread label that does not name a
    /// square fails with [`PipelineError::InvalidLabel`].
    pub fn read_move(
        &self,
        frame: &RgbImage,
        camera_from_marker: &RigidTransform,
        letters: &dyn Classifier,
        digits: &dyn Classifier,
    ) -> Result<Option<MoveDescriptor>, PipelineError> {
        let mut labels = [0u8; BoardLayout::CELL_COUNT];
        for (index, slot) in labels.iter_mut().enumerate() {
            let Some(cell) =
                extract_cell(frame, camera_from_marker, self.layout, index, self.camera)?
            else {
                log::info!("annotation cell {index} not extractable; no move this frame");
                return Ok(None);
            };
            let Some(glyph) = extract_glyph(&cell, &self.glyph) else {
                log::info!("annotation cell {index} is blank; no move this frame");
                return Ok(None);
            };
            // Cells alternate letter, digit, letter, digit.
            *slot = if index % 2 == 0 {
                letters.classify(&glyph)
            } else {
                digits.classify(&glyph)
            };
        }

        let mv = MoveDescriptor {
            from: Square::from_labels(labels[0], labels[1])?,
            to: Square::from_labels(labels[2], labels[3])?,
        };
        log::info!("decoded move {mv}");
        Ok(Some(mv))
    }
}
