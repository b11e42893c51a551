// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The finished raster.
//!
//! Pixels are stored column by column rather than row by row.  The
//! engine hands out work in column stripes, so with this layout every
//! stripe is one contiguous run of memory, and a stripe rendered on a
//! worker can be dropped into place with a single copy.

use image::{Rgb, RgbImage};

use viewport::Stripe;

const BLACK: Rgb<u8> = Rgb([0, 0, 0]);

/// A `width` by `height` grid of RGB pixels, column-major.
#[derive(Clone, Debug, PartialEq)]
pub struct Framebuffer {
    width: usize,
    height: usize,
    pixels: Vec<Rgb<u8>>,
}

impl Framebuffer {
    /// An all-black framebuffer.
    pub fn new(width: usize, height: usize) -> Framebuffer {
        Framebuffer {
            width,
            height,
            pixels: vec![BLACK; width * height],
        }
    }

    /// Width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Describes a framebuffer with no pixels at all.
    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    /// The pixel at column `x`, row `y`, or `None` if that is outside
    /// the framebuffer.
    pub fn get(&self, x: usize, y: usize) -> Option<Rgb<u8>> {
        if x < self.width && y < self.height {
            Some(self.pixels[x * self.height + y])
        } else {
            None
        }
    }

    /// The pixels of column `x`, top to bottom, or `None` if there is
    /// no such column.
    pub fn column(&self, x: usize) -> Option<&[Rgb<u8>]> {
        if x < self.width {
            Some(&self.pixels[x * self.height..(x + 1) * self.height])
        } else {
            None
        }
    }

    /// Copies a rendered stripe into place.  `pixels` holds the
    /// stripe's columns one after another, each top to bottom.
    pub(crate) fn fill_stripe(&mut self, stripe: &Stripe, pixels: &[Rgb<u8>]) {
        let start = stripe.column_start * self.height;
        let end = stripe.column_end * self.height;
        self.pixels[start..end].copy_from_slice(pixels);
    }

    /// A row-major copy for the `image` crate, ready to encode.
    pub fn to_image(&self) -> RgbImage {
        RgbImage::from_fn(self.width as u32, self.height as u32, |x, y| {
            self.pixels[(x as usize) * self.height + (y as usize)]
        })
    }
}
