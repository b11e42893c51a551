// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The escape-time formulas.
//!
//! Every fractal family here is a map `z -> f(z) + c` iterated until
//! the modulus of `z` passes 2, or until we give up.  The number of
//! iterations it took is the "velocity" used to shade the pixel.  In
//! the classic form each pixel supplies both the starting value and
//! the constant; in the Julia form the constant is a single seed
//! shared by the whole image.

use std::fmt;
use std::str::FromStr;

use complex::ComplexNumber;

/// The fractal families the engine knows how to draw.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Fractal {
    /// `z = z² + c`
    Mandelbrot,
    /// `z = (|Re z| + |Im z|i)² + c`
    BurningShip,
}

/// The constant beyond which an orbit is considered to have escaped:
/// the modulus squared of a point at distance 2 from the origin.
pub const ESCAPE_RADIUS_SQUARED: f64 = 4.0;

#[inline]
fn mandelbrot_step(z: &mut ComplexNumber, c: &ComplexNumber) {
    z.square();
    z.add(c);
}

#[inline]
fn burning_ship_step(z: &mut ComplexNumber, c: &ComplexNumber) {
    z.fold_to_first_quadrant();
    z.square();
    z.add(c);
}

// Counting starts at one: the first update is iteration 1.  A point
// that never escapes reports the cap itself.
#[inline]
fn escape_time<F>(step: F, mut z: ComplexNumber, c: &ComplexNumber, max_iterations: u32) -> u32
where
    F: Fn(&mut ComplexNumber, &ComplexNumber),
{
    for i in 1..max_iterations {
        step(&mut z, c);
        if z.modulus_squared() > ESCAPE_RADIUS_SQUARED {
            return i;
        }
    }
    max_iterations
}

impl Fractal {
    /// Iterates `z` under this family's map with constant `c`.
    /// Returns the first iteration at which the orbit escaped, or
    /// `max_iterations` if it never did.
    pub fn calculate(self, z: ComplexNumber, c: &ComplexNumber, max_iterations: u32) -> u32 {
        match self {
            Fractal::Mandelbrot => escape_time(mandelbrot_step, z, c, max_iterations),
            Fractal::BurningShip => escape_time(burning_ship_step, z, c, max_iterations),
        }
    }

    /// The classic form, where the point is its own constant.
    pub fn calculate_own_point(self, point: ComplexNumber, max_iterations: u32) -> u32 {
        self.calculate(point, &point, max_iterations)
    }

    /// Applies a single update of this family's map to `z`.
    pub fn step(self, z: &mut ComplexNumber, c: &ComplexNumber) {
        match self {
            Fractal::Mandelbrot => mandelbrot_step(z, c),
            Fractal::BurningShip => burning_ship_step(z, c),
        }
    }

    /// The name used on the command line.
    pub fn name(self) -> &'static str {
        match self {
            Fractal::Mandelbrot => "mandelbrot",
            Fractal::BurningShip => "burning-ship",
        }
    }
}

impl fmt::Display for Fractal {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Fractal {
    type Err = String;

    fn from_str(s: &str) -> Result<Fractal, String> {
        match s.to_lowercase().as_str() {
            "mandelbrot" => Ok(Fractal::Mandelbrot),
            "burning-ship" | "burningship" | "burning_ship" => Ok(Fractal::BurningShip),
            _ => Err(format!("Unknown fractal '{}'", s)),
        }
    }
}
