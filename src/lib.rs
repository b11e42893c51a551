#![deny(missing_docs)]
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Striped escape-time fractal renderer
//!
//! An escape-time fractal takes a point on the complex plane and
//! repeatedly feeds it through a formula, measuring how quickly the
//! result runs off to infinity.  That "velocity" is the number used
//! to shade the pixel.  Points that never run away are inside the set
//! and come out black.
//!
//! This crate draws the Mandelbrot set and the Burning Ship, and the
//! Julia sets of both, by cutting the image into vertical stripes and
//! handing each stripe to a worker thread.  The workers are created
//! once and reused for every image.  Configure an [`Engine`], register
//! a listener, call `start()`, and the listener receives the finished
//! [`Framebuffer`].

extern crate crossbeam;
#[macro_use]
extern crate failure;
extern crate image;
#[macro_use]
extern crate itertools;
#[macro_use]
extern crate log;
extern crate num;
extern crate num_cpus;

#[cfg(test)]
extern crate tempfile;

pub mod complex;
pub mod engine;
pub mod error;
pub mod export;
pub mod framebuffer;
pub mod kernel;
pub mod shading;
pub mod viewport;
mod worker;

pub use complex::ComplexNumber;
pub use engine::{Engine, FinishedListener, RenderConfig};
pub use error::Error;
pub use framebuffer::Framebuffer;
pub use kernel::Fractal;
pub use viewport::{Pixel, Stripe, Viewport};
