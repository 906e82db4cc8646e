//! End-to-end helpers over `image` crate buffers.
//!
//! These adapt `image::RgbImage` / `image::GrayImage` to the lightweight
//! `chessar-core` raster types and run the pipeline in one call. Callers that
//! already hold `chessar-core` buffers should use `chessar::pipeline`
//! directly and skip the copies.

use crate::{aruco, core, pipeline};
use aruco::{detect_single, DetectParams, Dictionary, MarkerDetection};
use core::{CameraModel, RigidTransform};
use pipeline::{BoardLayout, Classifier, MoveDescriptor, MoveReader, PipelineError, ProjectedFrame};

/// Convert an `image::GrayImage` into the zero-copy `chessar-core` view type.
pub fn gray_view(img: &::image::GrayImage) -> core::GrayImageView<'_> {
    core::GrayImageView {
        width: img.width() as usize,
        height: img.height() as usize,
        data: img.as_raw(),
    }
}

/// Copy an `image::RgbImage` into a `chessar-core` raster.
pub fn from_rgb(img: &::image::RgbImage) -> core::RgbImage {
    core::RgbImage {
        width: img.width() as usize,
        height: img.height() as usize,
        data: img.as_raw().clone(),
    }
}

/// Copy a `chessar-core` raster into an `image::RgbImage`.
pub fn to_rgb(img: &core::RgbImage) -> ::image::RgbImage {
    ::image::RgbImage::from_fn(img.width as u32, img.height as u32, |x, y| {
        ::image::Rgb(img.at(x as usize, y as usize))
    })
}

/// Copy a `chessar-core` raster into an `image::GrayImage`.
pub fn to_gray(img: &core::GrayImage) -> ::image::GrayImage {
    ::image::GrayImage::from_fn(img.width as u32, img.height as u32, |x, y| {
        ::image::Luma([img.at(x as usize, y as usize)])
    })
}

/// Detect the reference marker in a grayscale frame.
pub fn detect_marker(
    img: &::image::GrayImage,
    dict: &Dictionary,
    params: &DetectParams,
) -> Option<MarkerDetection> {
    detect_single(&gray_view(img), dict, params)
}

/// Detect the reference marker and estimate its pose in one call.
///
/// Returns `Ok(None)` when no marker is visible.
pub fn marker_pose(
    img: &::image::GrayImage,
    camera: &CameraModel,
    layout: &BoardLayout,
    dict: &Dictionary,
    params: &DetectParams,
) -> Result<Option<RigidTransform>, PipelineError> {
    let Some(det) = detect_marker(img, dict, params) else {
        return Ok(None);
    };
    let pose = pipeline::estimate_marker_pose(&det.corners, camera, layout.marker_size)?;
    Ok(Some(pose))
}

/// Run the board overlay end-to-end: marker -> pose -> projection -> composite.
///
/// Uses the built-in 4x4 dictionary and default detection parameters.
pub fn project_board(
    frame: &::image::RgbImage,
    board_render: &::image::RgbImage,
    camera: &CameraModel,
    layout: &BoardLayout,
) -> Result<ProjectedFrame, PipelineError> {
    let dict = aruco::builtins::dict_4x4_100();
    pipeline::project_board(
        &from_rgb(frame),
        &from_rgb(board_render),
        camera,
        layout,
        &dict,
        &DetectParams::default(),
    )
}

/// Extract the four flattened annotation cells from a frame.
///
/// Returns `Ok(None)` when no marker is visible or any cell projects out of
/// frame.
pub fn extract_cells(
    frame: &::image::RgbImage,
    camera: &CameraModel,
    layout: &BoardLayout,
) -> Result<Option<Vec<::image::RgbImage>>, PipelineError> {
    let raster = from_rgb(frame);
    let gray = raster.to_gray();
    let dict = aruco::builtins::dict_4x4_100();
    let Some(det) = detect_single(&gray.as_view(), &dict, &DetectParams::default()) else {
        return Ok(None);
    };
    let pose = pipeline::estimate_marker_pose(&det.corners, camera, layout.marker_size)?;

    let mut cells = Vec::with_capacity(BoardLayout::CELL_COUNT);
    for index in 0..BoardLayout::CELL_COUNT {
        let Some(cell) = pipeline::extract_cell(&raster, &pose, layout, index, camera)? else {
            return Ok(None);
        };
        cells.push(to_rgb(&cell));
    }
    Ok(Some(cells))
}

/// Read the move written in the annotation cells end-to-end.
///
/// Returns `Ok(None)` when no marker is visible, a cell is out of frame, or a
/// cell is blank.
pub fn read_move(
    frame: &::image::RgbImage,
    camera: &CameraModel,
    layout: &BoardLayout,
    letters: &dyn Classifier,
    digits: &dyn Classifier,
) -> Result<Option<MoveDescriptor>, PipelineError> {
    let raster = from_rgb(frame);
    let gray = raster.to_gray();
    let dict = aruco::builtins::dict_4x4_100();
    let Some(det) = detect_single(&gray.as_view(), &dict, &DetectParams::default()) else {
        return Ok(None);
    };
    let pose = pipeline::estimate_marker_pose(&det.corners, camera, layout.marker_size)?;

    let reader = MoveReader::new(camera, layout);
    reader.read_move(&raster, &pose, letters, digits)
}
