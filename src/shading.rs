// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Turns an iteration count into a color.
//!
//! The count is scaled onto `0..=765` (three channels of 255) and
//! poured into red first, then green, then blue.  Fast escapes come
//! out near white, slow escapes and points that never escape come out
//! black.

use image::Rgb;
use num::clamp;

/// Three full channels.
pub const SHADE_MAX: i64 = 3 * 255;

/// The scale factor between an iteration count and a shade, for a
/// given iteration cap.
pub fn shade_ratio(max_iterations: u32) -> f64 {
    (SHADE_MAX as f64) / f64::from(max_iterations)
}

/// Scales `count` to a shade between 0 and 765, inverted so that the
/// cap itself is 0.
#[inline]
pub fn scale_shade(count: u32, ratio: f64) -> i64 {
    let scaled = (f64::from(count) * ratio).round() as i64;
    clamp(SHADE_MAX - scaled, 0, SHADE_MAX)
}

/// Splits a shade into red, green and blue, filling each channel
/// before spilling into the next.
#[inline]
pub fn split_shade(mut shade: i64) -> Rgb<u8> {
    let red = shade.min(255);
    shade -= red;
    let green = shade.min(255);
    shade -= green;
    let blue = shade.min(255);
    Rgb([red as u8, green as u8, blue as u8])
}

/// The color of a pixel whose orbit escaped after `count` iterations.
#[inline]
pub fn color(count: u32, ratio: f64) -> Rgb<u8> {
    split_shade(scale_shade(count, ratio))
}
