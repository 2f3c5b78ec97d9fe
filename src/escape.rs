// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The escape-time test.  Starting from zero, a point `c` is iterated
//! through `z = z² + c` until either the squared modulus of `z`
//! reaches the escape bound or the iteration limit runs out.  The
//! number of iterations taken is the point's "speed"; a point that
//! uses up the whole limit is assumed to be inside the Mandelbrot set.

use num::Complex;

/// Anything that can run the escape-time test for a single point.
/// Implementations must be pure: the same point and limit always give
/// the same count, which lies in `0..=limit`.
pub trait Evaluator: Sync {
    /// Returns the number of iterations `c` survived, capped at `limit`.
    fn evaluate(&self, c: Complex<f64>, limit: usize) -> usize;
}

/// The bound on the squared modulus of `z` past which a point is
/// considered to have escaped.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EscapeBound {
    /// Escape radius 2, squared bound 4.  The mathematically correct
    /// bound, and the default.
    Canonical,
    /// Squared bound 2, as used by the historical renderer.  Only
    /// useful for reproducing its images; pair it with
    /// `PaletteLaw::Legacy` to get them pixel for pixel.
    Legacy,
}

impl EscapeBound {
    /// The bound on `re² + im²`.
    pub fn squared(self) -> f64 {
        match self {
            EscapeBound::Canonical => 4.0,
            EscapeBound::Legacy => 2.0,
        }
    }
}

impl Default for EscapeBound {
    fn default() -> Self {
        EscapeBound::Canonical
    }
}

/// The native floating point evaluator.  Fast, and precise enough until
/// the view is narrower than about 1e-13.
#[derive(Copy, Clone, Debug)]
pub struct FloatEvaluator {
    bound: f64,
}

impl FloatEvaluator {
    /// An evaluator that escapes at the given bound.
    pub fn new(bound: EscapeBound) -> Self {
        FloatEvaluator {
            bound: bound.squared(),
        }
    }
}

impl Default for FloatEvaluator {
    fn default() -> Self {
        FloatEvaluator::new(EscapeBound::default())
    }
}

impl Evaluator for FloatEvaluator {
    #[inline]
    fn evaluate(&self, c: Complex<f64>, limit: usize) -> usize {
        // re2 and im2 are carried between iterations so each step costs
        // three multiplications instead of four.
        let (mut re, mut im) = (0.0_f64, 0.0_f64);
        let (mut re2, mut im2) = (0.0_f64, 0.0_f64);
        let mut iter = 0;
        while iter < limit && re2 + im2 < self.bound {
            im = 2.0 * re * im + c.im;
            re = re2 - im2 + c.re;
            re2 = re * re;
            im2 = im * im;
            iter += 1;
        }
        iter
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::distributions::{Distribution, Uniform};

    #[test]
    fn origin_never_escapes() {
        let e = FloatEvaluator::default();
        for limit in 1..500 {
            assert_eq!(e.evaluate(Complex::new(0.0, 0.0), limit), limit);
        }
    }

    #[test]
    fn periodic_points_never_escape() {
        let e = FloatEvaluator::default();
        assert_eq!(e.evaluate(Complex::new(-1.0, 0.0), 1000), 1000);
        assert_eq!(e.evaluate(Complex::new(0.0, 1.0), 1000), 1000);
        assert_eq!(e.evaluate(Complex::new(-0.1, 0.1), 1000), 1000);
    }

    #[test]
    fn far_points_escape_at_once() {
        let e = FloatEvaluator::default();
        let mut rng = rand::thread_rng();
        let outside = Uniform::new(2.000_001_f64, 1.0e6);
        let anywhere = Uniform::new_inclusive(-1.0e6_f64, 1.0e6);
        for _ in 0..1000 {
            let limit = 2 + (outside.sample(&mut rng) as usize % 1000);
            let re_out = Complex::new(outside.sample(&mut rng), anywhere.sample(&mut rng));
            let im_out = Complex::new(anywhere.sample(&mut rng), outside.sample(&mut rng));
            assert!(e.evaluate(re_out, limit) <= 2, "{:?} did not escape", re_out);
            assert!(e.evaluate(im_out, limit) <= 2, "{:?} did not escape", im_out);
        }
    }

    #[test]
    fn count_is_capped_at_limit() {
        let e = FloatEvaluator::default();
        assert_eq!(e.evaluate(Complex::new(0.25, 0.0), 37), 37);
        assert_eq!(e.evaluate(Complex::new(1.0, 0.0), 50), 2);
        assert_eq!(e.evaluate(Complex::new(1.0, 0.0), 1), 1);
    }

    #[test]
    fn legacy_bound_escapes_earlier() {
        let canonical = FloatEvaluator::new(EscapeBound::Canonical);
        let legacy = FloatEvaluator::new(EscapeBound::Legacy);
        // 0 -> i -> -1 + i: |z|² reaches 2 on the second step.
        let c = Complex::new(0.0, 1.0);
        assert_eq!(canonical.evaluate(c, 100), 100);
        assert_eq!(legacy.evaluate(c, 100), 2);
    }
}
