// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Errors.  The rendering itself cannot fail; only setting up the
//! worker threads and writing images out can.

use image::ImageError;
use std::io;

/// Everything that can go wrong in this crate.
#[derive(Debug, Fail)]
pub enum Error {
    /// The operating system refused to give us a worker thread.
    #[fail(display = "Could not spawn stripe worker {}: {}", _0, _1)]
    Spawn(usize, #[fail(cause)] io::Error),

    /// The image encoder failed, or the file could not be written.
    #[fail(display = "Could not write image: {}", _0)]
    Image(#[fail(cause)] ImageError),

    /// There is nothing to write.
    #[fail(display = "Refusing to write an empty {}x{} image", _0, _1)]
    EmptyFramebuffer(usize, usize),
}

impl From<ImageError> for Error {
    fn from(e: ImageError) -> Error {
        Error::Image(e)
    }
}
