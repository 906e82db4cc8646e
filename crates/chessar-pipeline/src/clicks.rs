//! Click-to-square interaction.
//!
//! Click coordinates arrive through an explicit [`ClickQueue`] owned by the
//! caller and passed into the handler, not a process-wide collector. The UI
//! layer pushes; the frame loop drains.

use std::collections::VecDeque;

use chessar_core::{GeometryError, Homography};
use nalgebra::Point2;

use crate::moves::Square;

/// FIFO of pending click coordinates in image pixels.
#[derive(Clone, Debug, Default)]
pub struct ClickQueue {
    pending: VecDeque<(i32, i32)>,
}

impl ClickQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, x: i32, y: i32) {
        self.pending.push_back((x, y));
    }

    pub fn pop(&mut self) -> Option<(i32, i32)> {
        self.pending.pop_front()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

/// Map an image pixel onto the board canvas through the inverse of the
/// board-to-image homography.
pub fn image_to_board(
    image_px: Point2<f64>,
    board_to_image: &Homography,
) -> Result<Point2<f64>, GeometryError> {
    Ok(board_to_image.inverse()?.apply(image_px))
}

/// Map a board-canvas pixel onto a chess square.
///
/// Files run A..H left to right, ranks 8..1 top to bottom (rank 8 is the far
/// side of the canvas). Points outside the canvas return `None`.
pub fn square_at_pixel(board_px: Point2<f64>, canvas_w: f64, canvas_h: f64) -> Option<Square> {
    let fx = board_px.x / canvas_w;
    let fy = board_px.y / canvas_h;
    if !(0.0..=1.0).contains(&fx) || !(0.0..=1.0).contains(&fy) {
        return None;
    }

    let file = ((fx * 8.0).floor() as i64).clamp(0, 7) as u8;
    let rank = (7 - ((fy * 8.0).floor() as i64).clamp(0, 7)) as u8;
    Square::new(file, rank)
}

/// Drain one click and resolve it to a square, if it lands on the board.
pub fn square_at_click(
    clicks: &mut ClickQueue,
    board_to_image: &Homography,
    canvas_w: f64,
    canvas_h: f64,
) -> Result<Option<Square>, GeometryError> {
    let Some((x, y)) = clicks.pop() else {
        return Ok(None);
    };
    let board_px = image_to_board(Point2::new(x as f64, y as f64), board_to_image)?;
    Ok(square_at_pixel(board_px, canvas_w, canvas_h))
}
