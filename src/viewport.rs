// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Describes the relationship between a rectangle on the integral
//! plane with an origin at 0,0 (the image) and a rectangle on the
//! complex plane (the viewport), and how the columns of the image are
//! split into stripes, one per worker.
//!
//! Row 0 of the image is its top edge, which is the *largest*
//! imaginary value of the viewport: pixel rows grow downwards, the
//! imaginary axis grows upwards.

use std::ops::Range;

use complex::ComplexNumber;

/// Describes the x, y of a pixel in an image.  Column first.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Pixel(pub usize, pub usize);

/// The rectangle of the complex plane being drawn.  A sane image needs
/// `x_max > x_min` and `y_max > y_min`; nothing enforces that here, a
/// backwards or empty viewport just produces a mirrored or flat image.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Viewport {
    /// Leftmost real value.
    pub x_min: f64,
    /// Rightmost real value.
    pub x_max: f64,
    /// Bottom imaginary value.
    pub y_min: f64,
    /// Top imaginary value.
    pub y_max: f64,
}

impl Default for Viewport {
    /// The whole of the Mandelbrot set, with a little room to spare.
    fn default() -> Viewport {
        Viewport::new(-2.0, 2.0, -1.6, 1.6)
    }
}

impl Viewport {
    /// Constructor.
    pub fn new(x_min: f64, x_max: f64, y_min: f64, y_max: f64) -> Viewport {
        Viewport {
            x_min,
            x_max,
            y_min,
            y_max,
        }
    }

    /// Builds a viewport from its left-lower and right-upper corners.
    pub fn from_corners(leftlower: ComplexNumber, rightupper: ComplexNumber) -> Viewport {
        Viewport::new(
            leftlower.real(),
            rightupper.real(),
            leftlower.imaginary(),
            rightupper.imaginary(),
        )
    }

    /// True if the right edge is right of the left edge and the top is
    /// above the bottom.
    pub fn is_well_formed(&self) -> bool {
        self.x_max > self.x_min && self.y_max > self.y_min
    }

    /// The distance along each axis covered by one pixel of a
    /// `width` by `height` image.  A zero dimension gives an infinite
    /// (or NaN) step; callers are expected to check dimensions first.
    pub fn steps(&self, width: usize, height: usize) -> (f64, f64) {
        (
            (self.x_max - self.x_min) / (width as f64),
            (self.y_max - self.y_min) / (height as f64),
        )
    }

    /// Given a pixel of a `width` by `height` image showing this
    /// viewport, return the point on the complex plane it stands for.
    pub fn point_at(&self, pixel: Pixel, width: usize, height: usize) -> ComplexNumber {
        let (x_step, y_step) = self.steps(width, height);
        ComplexNumber::new(
            self.x_min + (pixel.0 as f64) * x_step,
            self.y_max - (pixel.1 as f64) * y_step,
        )
    }

    /// The viewport covered by the pixel rectangle with corners `a` and
    /// `b`, given in any order, of a `width` by `height` image showing
    /// this viewport.
    pub fn zoom_to(&self, a: Pixel, b: Pixel, width: usize, height: usize) -> Viewport {
        let (left, right) = (a.0.min(b.0), a.0.max(b.0));
        let (top, bottom) = (a.1.min(b.1), a.1.max(b.1));
        let leftupper = self.point_at(Pixel(left, top), width, height);
        let rightlower = self.point_at(Pixel(right, bottom), width, height);
        Viewport::new(
            leftupper.real(),
            rightlower.real(),
            rightlower.imaginary(),
            leftupper.imaginary(),
        )
    }

    /// Splits a `width` column image into `workers` stripes and works
    /// out where each stripe begins on the real axis.
    pub fn stripes(&self, width: usize, workers: usize) -> Vec<Stripe> {
        let x_step = (self.x_max - self.x_min) / (width as f64);
        partition(width, workers)
            .into_iter()
            .map(|columns| Stripe {
                column_start: columns.start,
                column_end: columns.end,
                axis_real_start: self.x_min + (columns.start as f64) * x_step,
            })
            .collect()
    }
}

/// Divides `width` columns into `workers` contiguous, equally wide,
/// half-open ranges, left to right.
///
/// Integer division: when `width` is not a multiple of `workers`, the
/// remaining `width % workers` columns on the right edge belong to no
/// range and are never drawn.  When `width < workers` every range is
/// empty.
pub fn partition(width: usize, workers: usize) -> Vec<Range<usize>> {
    let workers = workers.max(1);
    let stripe_width = width / workers;
    (0..workers)
        .map(|i| (i * stripe_width)..((i + 1) * stripe_width))
        .collect()
}

/// The part of the image a single worker is responsible for.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Stripe {
    /// First column, inclusive.
    pub column_start: usize,
    /// Last column, exclusive.
    pub column_end: usize,
    /// The real value of `column_start`.
    pub axis_real_start: f64,
}

impl Stripe {
    /// The columns as a range.
    pub fn columns(&self) -> Range<usize> {
        self.column_start..self.column_end
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.column_end - self.column_start
    }

    /// The real value of column `x`, given the width of one pixel.
    #[inline]
    pub fn axis_x(&self, x: usize, x_step: f64) -> f64 {
        self.axis_real_start + ((x - self.column_start) as f64) * x_step
    }
}
