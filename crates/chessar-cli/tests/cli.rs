use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

fn chessar() -> Command {
    Command::cargo_bin("chessar").unwrap()
}

#[test]
fn dict_info_reports_the_builtin_dictionary() {
    chessar()
        .arg("dict-info")
        .assert()
        .success()
        .stdout(predicate::str::contains("4x4"))
        .stdout(predicate::str::contains("codes:"));
}

#[test]
fn render_marker_writes_a_png() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("marker.png");

    chessar()
        .args(["render-marker", "--id", "0", "--cell-px", "16"])
        .arg("--out")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("wrote"));

    let img = image::open(&out).unwrap().to_luma8();
    // 4x4 payload plus a one-cell border on each side.
    assert_eq!(img.width(), 6 * 16);
    assert_eq!(img.height(), 6 * 16);
}

#[test]
fn render_marker_rejects_out_of_range_ids() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("marker.png");

    chessar()
        .args(["render-marker", "--id", "9999"])
        .arg("--out")
        .arg(&out)
        .assert()
        .failure()
        .stderr(predicate::str::contains("out of range"));
}

#[test]
fn overlay_passes_markerless_frames_through() {
    let dir = tempdir().unwrap();
    let frame_path = dir.path().join("frame.png");
    let board_path = dir.path().join("board.png");
    let out_path = dir.path().join("out.png");
    let json_path = dir.path().join("h.json");

    let frame = image::RgbImage::from_pixel(160, 120, image::Rgb([255, 255, 255]));
    frame.save(&frame_path).unwrap();
    let board = image::RgbImage::from_pixel(64, 64, image::Rgb([0, 128, 0]));
    board.save(&board_path).unwrap();

    chessar()
        .arg("overlay")
        .arg("--frame")
        .arg(&frame_path)
        .arg("--board")
        .arg(&board_path)
        .arg("--out")
        .arg(&out_path)
        .arg("--homography-json")
        .arg(&json_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("marker found: false"));

    let out = image::open(&out_path).unwrap().to_rgb8();
    assert_eq!(out.get_pixel(80, 60).0, [255, 255, 255]);

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&json_path).unwrap()).unwrap();
    assert_eq!(json["marker_found"], serde_json::Value::Bool(false));
}

#[test]
fn overlay_rejects_partial_camera_intrinsics() {
    let dir = tempdir().unwrap();
    let frame_path = dir.path().join("frame.png");
    let frame = image::RgbImage::from_pixel(32, 32, image::Rgb([255, 255, 255]));
    frame.save(&frame_path).unwrap();

    chessar()
        .arg("overlay")
        .arg("--frame")
        .arg(&frame_path)
        .arg("--board")
        .arg(&frame_path)
        .arg("--out")
        .arg(dir.path().join("out.png"))
        .args(["--cam-fx", "1000"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("partial"));
}

#[test]
fn overlay_accepts_a_camera_json_file() {
    let dir = tempdir().unwrap();
    let frame_path = dir.path().join("frame.png");
    let cam_path = dir.path().join("camera.json");

    let frame = image::RgbImage::from_pixel(64, 64, image::Rgb([255, 255, 255]));
    frame.save(&frame_path).unwrap();
    let cam = chessar::core::CameraModel::new(900.0, 900.0, 32.0, 32.0, [0.0; 5]).unwrap();
    std::fs::write(&cam_path, serde_json::to_string(&cam).unwrap()).unwrap();

    chessar()
        .arg("overlay")
        .arg("--frame")
        .arg(&frame_path)
        .arg("--board")
        .arg(&frame_path)
        .arg("--out")
        .arg(dir.path().join("out.png"))
        .arg("--cam-json")
        .arg(&cam_path)
        .assert()
        .success();
}

#[test]
fn square_at_requires_a_marker() {
    let dir = tempdir().unwrap();
    let frame_path = dir.path().join("frame.png");
    let frame = image::RgbImage::from_pixel(64, 64, image::Rgb([255, 255, 255]));
    frame.save(&frame_path).unwrap();

    chessar()
        .arg("square-at")
        .arg("--frame")
        .arg(&frame_path)
        .args(["--x", "10", "--y", "10"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no marker"));
}
