// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The per-pixel iteration state.  A thin value type over
//! `num::Complex<f64>` whose arithmetic happens in place, so a kernel
//! can iterate a single value without allocating a new one on every
//! step.

use num::Complex;
use std::fmt;

/// A point on the complex plane, treating the real part as the
/// x-component and the imaginary part as the y-component.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ComplexNumber(Complex<f64>);

impl ComplexNumber {
    /// Constructor.
    pub fn new(real: f64, imaginary: f64) -> ComplexNumber {
        ComplexNumber(Complex::new(real, imaginary))
    }

    /// The real (x) part.
    pub fn real(&self) -> f64 {
        self.0.re
    }

    /// The imaginary (y) part.
    pub fn imaginary(&self) -> f64 {
        self.0.im
    }

    /// Squares the number in place: `re' = re² - im²`, `im' = 2·re·im`.
    #[inline]
    pub fn square(&mut self) {
        self.0 = self.0 * self.0;
    }

    /// Adds `other` to the number in place, component by component.
    #[inline]
    pub fn add(&mut self, other: &ComplexNumber) {
        self.0 += other.0;
    }

    /// `re² + im²`.  Every kernel treats a value above 4.0 (a modulus
    /// above 2) as having escaped.
    #[inline]
    pub fn modulus_squared(&self) -> f64 {
        self.0.norm_sqr()
    }

    /// Replaces both parts with their absolute values.
    #[inline]
    pub fn fold_to_first_quadrant(&mut self) {
        self.0 = Complex::new(self.0.re.abs(), self.0.im.abs());
    }
}

impl From<Complex<f64>> for ComplexNumber {
    fn from(c: Complex<f64>) -> ComplexNumber {
        ComplexNumber(c)
    }
}

impl From<ComplexNumber> for Complex<f64> {
    fn from(c: ComplexNumber) -> Complex<f64> {
        c.0
    }
}

impl fmt::Display for ComplexNumber {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} + {}i", self.0.re, self.0.im)
    }
}
