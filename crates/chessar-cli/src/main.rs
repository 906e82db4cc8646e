//! chessar CLI — marker-relative board overlay and move reading from images.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use chessar::core::{homography_from_4pt, CameraModel, PlanarRegion};
use chessar::pipeline::{
    extract_glyph, image_to_board, project_points, square_at_pixel, BoardLayout, GlyphParams,
};
use chessar::{aruco, detect};
use nalgebra::Point2;

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "chessar")]
#[command(about = "Project a chess board into camera frames relative to a printed square marker")]
#[command(version)]
struct Cli {
    /// Enable debug-level log output.
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Composite a board render onto a camera frame.
    Overlay(CliOverlayArgs),

    /// Extract the four flattened annotation cells from a frame.
    ExtractCells(CliExtractArgs),

    /// Map an image pixel onto a chess square.
    SquareAt(CliSquareAtArgs),

    /// Render a dictionary marker to a PNG for printing.
    RenderMarker {
        /// Dictionary id of the marker.
        #[arg(long)]
        id: u32,

        /// Pixels per marker cell in the output image.
        #[arg(long, default_value = "32")]
        cell_px: usize,

        /// Path to write the marker image (PNG).
        #[arg(long)]
        out: PathBuf,
    },

    /// Print built-in dictionary statistics.
    DictInfo,
}

#[derive(Debug, Clone, Args)]
struct CliOverlayArgs {
    /// Path to the camera frame image.
    #[arg(long)]
    frame: PathBuf,

    /// Path to the board render to project.
    #[arg(long)]
    board: PathBuf,

    /// Path to write the composited frame (PNG).
    #[arg(long)]
    out: PathBuf,

    /// Optional path to write the board-to-image homography (JSON).
    #[arg(long)]
    homography_json: Option<PathBuf>,

    #[command(flatten)]
    config: CliConfigArgs,
}

#[derive(Debug, Clone, Args)]
struct CliExtractArgs {
    /// Path to the camera frame image.
    #[arg(long)]
    frame: PathBuf,

    /// Directory to write cell_<i>.png files into.
    #[arg(long)]
    out_dir: PathBuf,

    /// Also write binarized glyph_<i>.png rasters for non-blank cells.
    #[arg(long)]
    glyphs: bool,

    #[command(flatten)]
    config: CliConfigArgs,
}

#[derive(Debug, Clone, Args)]
struct CliSquareAtArgs {
    /// Path to the camera frame image.
    #[arg(long)]
    frame: PathBuf,

    /// Click x coordinate in frame pixels.
    #[arg(long)]
    x: f64,

    /// Click y coordinate in frame pixels.
    #[arg(long)]
    y: f64,

    /// Board canvas side length in pixels (must match the overlay render).
    #[arg(long, default_value = "128")]
    board_px: usize,

    #[command(flatten)]
    config: CliConfigArgs,
}

#[derive(Debug, Clone, Args, Default)]
struct CliConfigArgs {
    /// Path to a camera model JSON file. Explicit --cam-* flags take
    /// precedence.
    #[arg(long)]
    cam_json: Option<PathBuf>,
    /// Path to a board layout JSON file (marker/board/cell offsets).
    #[arg(long)]
    layout_json: Option<PathBuf>,
    /// Camera intrinsic fx (pixels). If set, fy/cx/cy are required too.
    #[arg(long)]
    cam_fx: Option<f64>,
    /// Camera intrinsic fy (pixels). If set, fx/cx/cy are required too.
    #[arg(long)]
    cam_fy: Option<f64>,
    /// Camera principal point cx (pixels). If set, fx/fy/cy are required too.
    #[arg(long)]
    cam_cx: Option<f64>,
    /// Camera principal point cy (pixels). If set, fx/fy/cx are required too.
    #[arg(long)]
    cam_cy: Option<f64>,
    /// Radial distortion coefficient k1.
    #[arg(long, default_value_t = 0.0)]
    cam_k1: f64,
    /// Radial distortion coefficient k2.
    #[arg(long, default_value_t = 0.0)]
    cam_k2: f64,
    /// Tangential distortion coefficient p1.
    #[arg(long, default_value_t = 0.0)]
    cam_p1: f64,
    /// Tangential distortion coefficient p2.
    #[arg(long, default_value_t = 0.0)]
    cam_p2: f64,
    /// Radial distortion coefficient k3.
    #[arg(long, default_value_t = 0.0)]
    cam_k3: f64,
}

impl CliConfigArgs {
    /// Build a camera model from flags, a JSON file, or the bundled
    /// calibration, in that order of precedence.
    fn to_model(&self) -> CliResult<CameraModel> {
        let intr = [self.cam_fx, self.cam_fy, self.cam_cx, self.cam_cy];
        if intr.iter().all(Option::is_none) {
            return match &self.cam_json {
                Some(path) => Ok(serde_json::from_str(&std::fs::read_to_string(path)?)?),
                None => Ok(CameraModel::default()),
            };
        }
        let [Some(fx), Some(fy), Some(cx), Some(cy)] = intr else {
            return Err(
                "camera intrinsics are partial; provide all of --cam-fx --cam-fy --cam-cx --cam-cy"
                    .into(),
            );
        };
        let dist = [self.cam_k1, self.cam_k2, self.cam_p1, self.cam_p2, self.cam_k3];
        Ok(CameraModel::new(fx, fy, cx, cy, dist)?)
    }

    fn to_layout(&self) -> CliResult<BoardLayout> {
        match &self.layout_json {
            Some(path) => Ok(serde_json::from_str(&std::fs::read_to_string(path)?)?),
            None => Ok(BoardLayout::default()),
        }
    }
}

fn main() -> CliResult<()> {
    let cli = Cli::parse();
    let level = if cli.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    chessar::core::init_with_level(level)?;

    match cli.command {
        Commands::Overlay(args) => run_overlay(&args),
        Commands::ExtractCells(args) => run_extract_cells(&args),
        Commands::SquareAt(args) => run_square_at(&args),
        Commands::RenderMarker { id, cell_px, out } => run_render_marker(id, cell_px, &out),
        Commands::DictInfo => run_dict_info(),
    }
}

// ── overlay ───────────────────────────────────────────────────────────

fn run_overlay(args: &CliOverlayArgs) -> CliResult<()> {
    let camera = args.config.to_model()?;
    let layout = args.config.to_layout()?;

    let frame = image::ImageReader::open(&args.frame)?.decode()?.to_rgb8();
    let board = image::ImageReader::open(&args.board)?.decode()?.to_rgb8();

    let result = detect::project_board(&frame, &board, &camera, &layout)?;
    detect::to_rgb(&result.image).save(&args.out)?;
    println!("marker found: {}", result.marker_found);

    if let Some(path) = &args.homography_json {
        let json = match &result.board_to_image {
            Some(h) => serde_json::json!({
                "marker_found": true,
                "board_to_image": h.to_array(),
            }),
            None => serde_json::json!({ "marker_found": false }),
        };
        std::fs::write(path, serde_json::to_string_pretty(&json)?)?;
    }
    Ok(())
}

// ── extract-cells ─────────────────────────────────────────────────────

fn run_extract_cells(args: &CliExtractArgs) -> CliResult<()> {
    let camera = args.config.to_model()?;
    let layout = args.config.to_layout()?;

    let frame = image::ImageReader::open(&args.frame)?.decode()?.to_rgb8();
    let Some(cells) = detect::extract_cells(&frame, &camera, &layout)? else {
        return Err("no marker found, or an annotation cell projects out of frame".into());
    };

    std::fs::create_dir_all(&args.out_dir)?;
    for (index, cell) in cells.iter().enumerate() {
        let path = args.out_dir.join(format!("cell_{index}.png"));
        cell.save(&path)?;
        println!("wrote {}", path.display());

        if args.glyphs {
            let raster = detect::from_rgb(cell);
            match extract_glyph(&raster, &GlyphParams::default()) {
                Some(glyph) => {
                    let glyph_path = args.out_dir.join(format!("glyph_{index}.png"));
                    detect::to_gray(&glyph).save(&glyph_path)?;
                    println!("wrote {}", glyph_path.display());
                }
                None => println!("cell {index} is blank; no glyph written"),
            }
        }
    }
    Ok(())
}

// ── square-at ─────────────────────────────────────────────────────────

fn run_square_at(args: &CliSquareAtArgs) -> CliResult<()> {
    let camera = args.config.to_model()?;
    let layout = args.config.to_layout()?;
    let dict = aruco::builtins::dict_4x4_100();

    let frame = image::ImageReader::open(&args.frame)?.decode()?.to_luma8();
    let Some(pose) = detect::marker_pose(
        &frame,
        &camera,
        &layout,
        &dict,
        &aruco::DetectParams::default(),
    )?
    else {
        return Err("no marker found in frame".into());
    };

    let camera_from_board = pose * layout.board_from_marker_offset();
    let img_pts = project_points(&layout.board_region().corners(), &camera_from_board, &camera);
    let canvas = PlanarRegion::canvas_corners(args.board_px, args.board_px);
    let img4 = [img_pts[0], img_pts[1], img_pts[2], img_pts[3]];
    let board_to_image = homography_from_4pt(&canvas, &img4).map_err(|e| -> CliError {
        format!("board projection is degenerate: {e}").into()
    })?;

    let board_px = image_to_board(Point2::new(args.x, args.y), &board_to_image)
        .map_err(|e| -> CliError { format!("homography not invertible: {e}").into() })?;
    match square_at_pixel(board_px, args.board_px as f64, args.board_px as f64) {
        Some(square) => println!("square: {square}"),
        None => println!("square: none (pixel is off the board)"),
    }
    Ok(())
}

// ── render-marker ─────────────────────────────────────────────────────

fn run_render_marker(id: u32, cell_px: usize, out: &PathBuf) -> CliResult<()> {
    let dict = aruco::builtins::dict_4x4_100();
    let Some(marker) = aruco::render_marker(&dict, id, cell_px) else {
        return Err(format!("id {id} is out of range for {}", dict.name).into());
    };
    detect::to_gray(&marker).save(out)?;
    println!("wrote {}", out.display());
    Ok(())
}

// ── dict-info ─────────────────────────────────────────────────────────

fn run_dict_info() -> CliResult<()> {
    let dict = aruco::builtins::dict_4x4_100();
    println!("chessar built-in dictionary");
    println!("  name:           {}", dict.name);
    println!("  marker size:    {0}x{0} bits", dict.marker_size);
    println!("  codes:          {}", dict.len());
    if !dict.is_empty() {
        println!("  first code:     0x{:04X}", dict.codes[0]);
        println!("  last code:      0x{:04X}", dict.codes[dict.len() - 1]);
    }
    Ok(())
}
