//! CLI integration tests using assert_cmd

use assert_cmd::Command;
use image::{Rgb, RgbImage};
use predicates::prelude::*;
use tempfile::TempDir;

fn menu_deskew_cmd() -> Command {
    Command::new(env!("CARGO_BIN_EXE_menu-deskew"))
}

fn write_blank_png(dir: &TempDir, name: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    RgbImage::from_pixel(120, 80, Rgb([255, 255, 255]))
        .save(&path)
        .unwrap();
    path
}

#[test]
fn test_help_command() {
    menu_deskew_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("menu-deskew"))
        .stdout(predicate::str::contains("--mode"));
}

#[test]
fn test_version_command() {
    menu_deskew_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_missing_input_fails() {
    let dir = TempDir::new().unwrap();
    menu_deskew_cmd()
        .arg(dir.path().join("missing.png"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to open input file"));
}

#[test]
fn test_blank_image_keeps_dimensions() {
    let dir = TempDir::new().unwrap();
    let input = write_blank_png(&dir, "menu.png");

    menu_deskew_cmd()
        .arg(&input)
        .assert()
        .success()
        .stderr(predicate::str::contains("120x80 -> 120x80"));

    let output = dir.path().join("menu_corrected.png");
    let img = image::open(&output).unwrap();
    assert_eq!((img.width(), img.height()), (120, 80));
}

#[test]
fn test_explicit_output_and_mode() {
    let dir = TempDir::new().unwrap();
    let input = write_blank_png(&dir, "menu.png");
    let output = dir.path().join("lines.png");

    menu_deskew_cmd()
        .arg(&input)
        .args(["--mode", "outline", "--output"])
        .arg(&output)
        .assert()
        .success();

    assert!(output.exists());
}

#[test]
fn test_invalid_mode_rejected() {
    let dir = TempDir::new().unwrap();
    let input = write_blank_png(&dir, "menu.png");

    menu_deskew_cmd()
        .arg(&input)
        .args(["--mode", "sideways"])
        .assert()
        .failure();
}

#[test]
fn test_inverted_canny_thresholds_rejected() {
    let dir = TempDir::new().unwrap();
    let input = write_blank_png(&dir, "menu.png");

    menu_deskew_cmd()
        .arg(&input)
        .args(["--canny-low", "250", "--canny-high", "100"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--canny-low"));
}
