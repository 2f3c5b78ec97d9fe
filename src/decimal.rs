// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! An arbitrary-precision backend for the escape-time test.
//!
//! Deep zooms run out of `f64` precision long before they run out of
//! interesting detail.  The DecimalEvaluator runs exactly the same
//! iteration as the FloatEvaluator, but over fixed-point decimals with
//! nineteen fractional digits, truncating toward zero after each
//! multiplication.  It is a great deal slower, so it is never the
//! default; ask for it with `Precision::Decimal`.

use num::{BigInt, BigRational, Complex};
use std::ops::{Add, Mul, Sub};

use crate::escape::{EscapeBound, Evaluator};

/// Number of digits kept after the decimal point.
pub const FRACTION_DIGITS: u32 = 19;

// Still fits in a u64.
const SCALE: u64 = 10u64.pow(FRACTION_DIGITS);

/// A fixed-point decimal number: an arbitrary-size integer counting
/// units of 10^-19.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Decimal(BigInt);

impl Decimal {
    /// The decimal nearest to `v` toward zero, or `None` for NaN and
    /// the infinities.
    pub fn from_f64(v: f64) -> Option<Decimal> {
        let exact = BigRational::from_float(v)?;
        let scaled = exact * BigRational::from_integer(BigInt::from(SCALE));
        Some(Decimal(scaled.trunc().to_integer()))
    }

    /// The number of 10^-19 units in this decimal.
    pub fn units(&self) -> &BigInt {
        &self.0
    }
}

impl<'a, 'b> Add<&'b Decimal> for &'a Decimal {
    type Output = Decimal;
    fn add(self, other: &'b Decimal) -> Decimal {
        Decimal(&self.0 + &other.0)
    }
}

impl<'a, 'b> Sub<&'b Decimal> for &'a Decimal {
    type Output = Decimal;
    fn sub(self, other: &'b Decimal) -> Decimal {
        Decimal(&self.0 - &other.0)
    }
}

impl<'a, 'b> Mul<&'b Decimal> for &'a Decimal {
    type Output = Decimal;
    fn mul(self, other: &'b Decimal) -> Decimal {
        // BigInt division truncates toward zero.
        Decimal(&self.0 * &other.0 / BigInt::from(SCALE))
    }
}

/// The fixed-point evaluator.
#[derive(Clone, Debug)]
pub struct DecimalEvaluator {
    bound: Decimal,
    zero: Decimal,
}

impl DecimalEvaluator {
    /// An evaluator that escapes at the given bound.
    pub fn new(bound: EscapeBound) -> Self {
        DecimalEvaluator {
            bound: Decimal(BigInt::from(SCALE) * BigInt::from(bound.squared() as u64)),
            zero: Decimal(BigInt::from(0)),
        }
    }
}

impl Default for DecimalEvaluator {
    fn default() -> Self {
        DecimalEvaluator::new(EscapeBound::default())
    }
}

impl Evaluator for DecimalEvaluator {
    fn evaluate(&self, c: Complex<f64>, limit: usize) -> usize {
        let (c_re, c_im) = match (Decimal::from_f64(c.re), Decimal::from_f64(c.im)) {
            (Some(re), Some(im)) => (re, im),
            // A non-finite point blows up on its first step in floating
            // point; say the same thing here.
            _ => return limit.min(1),
        };
        let (mut re, mut im) = (self.zero.clone(), self.zero.clone());
        let (mut re2, mut im2) = (self.zero.clone(), self.zero.clone());
        let mut iter = 0;
        while iter < limit && &re2 + &im2 < self.bound {
            let product = &re * &im;
            im = &(&product + &product) + &c_im;
            re = &(&re2 - &im2) + &c_re;
            re2 = &re * &re;
            im2 = &im * &im;
            iter += 1;
        }
        iter
    }
}
