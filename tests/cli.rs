extern crate assert_cmd;
extern crate image;
extern crate predicates;
extern crate tempfile;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;
use tempfile::tempdir;

fn stripebrot() -> Command {
    Command::cargo_bin("stripebrot").unwrap()
}

#[test]
fn renders_a_png_of_the_requested_size() {
    let dir = tempdir().unwrap();
    let output = dir.path().join("mandel.png");
    stripebrot()
        .arg("--output")
        .arg(&output)
        .args(&["--size", "64x48", "--iterations", "40", "--threads", "4"])
        .assert()
        .success();
    let img = image::open(&output).unwrap().to_rgb8();
    assert_eq!(img.dimensions(), (64, 48));
    assert_eq!(*img.get_pixel(32, 24), image::Rgb([0, 0, 0]));
    assert_ne!(*img.get_pixel(0, 0), image::Rgb([0, 0, 0]));
}

#[test]
fn renders_a_burning_ship_julia_set() {
    let dir = tempdir().unwrap();
    let output = dir.path().join("ship.png");
    stripebrot()
        .arg("-o")
        .arg(&output)
        .args(&[
            "--fractal",
            "burning-ship",
            "--julia",
            "-0.5,-0.5",
            "--leftlower",
            "-1.5,-1.5",
            "--rightupper",
            "1.5,1.5",
            "--size",
            "30x30",
            "--threads",
            "3",
        ])
        .assert()
        .success();
    assert!(output.exists());
}

#[test]
fn rejects_a_malformed_size() {
    let dir = tempdir().unwrap();
    stripebrot()
        .arg("-o")
        .arg(dir.path().join("bad.png"))
        .args(&["--size", "64by48"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Could not parse output image size"));
}

#[test]
fn rejects_an_oversized_image() {
    let dir = tempdir().unwrap();
    stripebrot()
        .arg("-o")
        .arg(dir.path().join("huge.png"))
        .args(&["--size", "70000x10"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("at most 65535"));
    assert!(!dir.path().join("huge.png").exists());
}

#[test]
fn rejects_a_backwards_viewport() {
    let dir = tempdir().unwrap();
    stripebrot()
        .arg("-o")
        .arg(dir.path().join("bad.png"))
        .args(&["--leftlower", "2,1.6", "--rightupper", "-2,-1.6"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("left lower corner"));
}

#[test]
fn rejects_an_image_narrower_than_the_workers() {
    let dir = tempdir().unwrap();
    stripebrot()
        .arg("-o")
        .arg(dir.path().join("thin.png"))
        .args(&["--size", "2x10", "--threads", "4"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be split between 4 workers"));
}

#[test]
fn rejects_an_unknown_format() {
    let dir = tempdir().unwrap();
    stripebrot()
        .arg("-o")
        .arg(dir.path().join("mandel.nope"))
        .args(&["--size", "8x8", "--threads", "2"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Could not write image"));
}
