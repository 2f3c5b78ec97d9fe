// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Maps escape speeds to colors.
//!
//! Each speed `i` in `0..=limit` is normalized against 40% of the limit
//! and swept through a hue ramp.  The lightness blend below is not the
//! textbook HSL one: `q` comes out at 2.2 and `p` at -1.0, so the
//! channels overshoot and are clamped when they are stored as bytes.
//! That overshoot is what gives the images their saturated bands, so it
//! is kept as is.

use num::clamp;

use crate::errors::RenderError;

/// One RGBA pixel.
pub type Rgba = [u8; 4];

const SATURATION: f64 = 1.0;
const LIGHT: f64 = 0.6;
const HUE_SHIFT: f64 = 0.33;
const SPEED_RATIO: f64 = 0.4;

/// Where the hue ramp changes segment.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PaletteLaw {
    /// Segments break at exactly 1/6, 1/2 and 2/3, so the ramp is
    /// continuous.  The default.
    Continuous,
    /// Segments break at 0.16, 1/2 and 0.66, as in the historical
    /// renderer.  The ramp jumps at 0.16 and 1/2; use this only to
    /// reproduce its images.
    Legacy,
}

impl PaletteLaw {
    fn breaks(self) -> (f64, f64) {
        match self {
            PaletteLaw::Continuous => (1.0 / 6.0, 2.0 / 3.0),
            PaletteLaw::Legacy => (0.16, 0.66),
        }
    }
}

impl Default for PaletteLaw {
    fn default() -> Self {
        PaletteLaw::Continuous
    }
}

/// Piecewise hue ramp between `p` and `q`.  `t` is wrapped into
/// `[0, 1]` once, not reduced modulo 1, so it is only meaningful for
/// `t` in `[-1, 2)`.
pub fn hue2rgb(p: f64, q: f64, t: f64) -> f64 {
    hue2rgb_with(PaletteLaw::Continuous, p, q, t)
}

/// `hue2rgb` with the segment breaks of the given law.
pub fn hue2rgb_with(law: PaletteLaw, p: f64, q: f64, t: f64) -> f64 {
    let (rise, fall) = law.breaks();
    let mut t = t;
    if t < 0.0 {
        t += 1.0;
    }
    if t > 1.0 {
        t -= 1.0;
    }
    if t < rise {
        return p + (q - p) * 6.0 * t;
    }
    if t < 0.5 {
        return q;
    }
    if t < fall {
        return p + (q - p) * (fall - t) * 6.0;
    }
    p
}

/// The unclamped color of a point that escaped after `speed` iterations
/// out of `limit`, as red, green, blue and alpha in 0-255 units.
pub fn speed_to_color(speed: usize, limit: usize) -> [f64; 4] {
    speed_to_color_with(PaletteLaw::Continuous, speed, limit)
}

/// `speed_to_color` with the hue ramp of the given law.
pub fn speed_to_color_with(law: PaletteLaw, speed: usize, limit: usize) -> [f64; 4] {
    let max = (limit as f64) * SPEED_RATIO;
    let n = (speed as f64) / max;
    let q = LIGHT + SATURATION + LIGHT * SATURATION;
    let p = 2.0 * LIGHT - q;
    [
        hue2rgb_with(law, p, q, n + HUE_SHIFT) * 255.0,
        hue2rgb_with(law, p, q, n) * 255.0,
        hue2rgb_with(law, p, q, n - HUE_SHIFT) * 255.0,
        255.0,
    ]
}

// Rounded and clamped, as an RGBA canvas stores them.
fn to_channel(v: f64) -> u8 {
    clamp(v.round(), 0.0, 255.0) as u8
}

/// The color for every possible escape speed of a render, indexed by
/// speed.  Built once before the pixel loop and only read after that.
#[derive(Clone, Debug)]
pub struct Palette {
    colors: Box<[Rgba]>,
}

impl Palette {
    /// Builds the `limit + 1` entries for speeds `0..=limit` with the
    /// continuous hue ramp.
    pub fn new(limit: usize) -> Result<Palette, RenderError> {
        Palette::with_law(limit, PaletteLaw::default())
    }

    /// Builds the `limit + 1` entries for speeds `0..=limit`.
    pub fn with_law(limit: usize, law: PaletteLaw) -> Result<Palette, RenderError> {
        if limit == 0 {
            return Err(RenderError::InvalidLimit(limit));
        }
        Ok(Palette::build(limit, law))
    }

    // Callers have already refused a zero limit.
    pub(crate) fn build(limit: usize, law: PaletteLaw) -> Palette {
        let colors: Vec<Rgba> = (0..=limit)
            .map(|speed| {
                let c = speed_to_color_with(law, speed, limit);
                [to_channel(c[0]), to_channel(c[1]), to_channel(c[2]), to_channel(c[3])]
            })
            .collect();
        Palette {
            colors: colors.into_boxed_slice(),
        }
    }

    /// Number of entries, always the limit plus one.
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    /// Never true for a palette built by `new`.
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// The color for a speed.  Speeds past the limit get the color of
    /// the limit.
    #[inline]
    pub fn color(&self, speed: usize) -> Rgba {
        self.colors[speed.min(self.colors.len() - 1)]
    }

    /// All entries, in speed order.
    pub fn colors(&self) -> &[Rgba] {
        &self.colors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const P: f64 = -1.0;
    const Q: f64 = 2.2;

    #[test]
    fn palette_has_one_entry_per_speed() {
        for limit in &[1, 2, 10, 20, 255, 1000] {
            let palette = Palette::new(*limit).unwrap();
            assert_eq!(palette.len(), limit + 1);
            assert!(palette.colors().iter().all(|c| c[3] == 255));
        }
    }

    #[test]
    fn palette_refuses_zero_limit() {
        assert_eq!(Palette::new(0).unwrap_err(), RenderError::InvalidLimit(0));
    }

    #[test]
    fn fastest_escape_is_red_and_set_is_black() {
        let palette = Palette::new(20).unwrap();
        assert_eq!(palette.color(0), [255, 0, 0, 255]);
        assert_eq!(palette.color(20), [0, 0, 0, 255]);
        assert_eq!(palette.color(500), [0, 0, 0, 255]);
    }

    #[test]
    fn hue2rgb_is_continuous_at_segment_boundaries() {
        let eps = 1.0e-12;
        for t in &[1.0 / 6.0, 0.5, 2.0 / 3.0] {
            let below = hue2rgb(P, Q, t - eps);
            let above = hue2rgb(P, Q, t + eps);
            assert!((below - above).abs() < 1.0e-9, "jump at {}", t);
        }
    }

    #[test]
    fn hue2rgb_wraps_once() {
        assert_eq!(hue2rgb(P, Q, -0.75), hue2rgb(P, Q, 0.25));
        assert_eq!(hue2rgb(P, Q, 1.25), hue2rgb(P, Q, 0.25));
        assert_eq!(hue2rgb(P, Q, 0.25), Q);
        assert_eq!(hue2rgb(P, Q, 0.9), P);
    }

    #[test]
    fn legacy_law_keeps_the_historical_breaks() {
        let legacy = Palette::with_law(20, PaletteLaw::Legacy).unwrap();
        let continuous = Palette::new(20).unwrap();
        assert_eq!(legacy.color(2), [137, 255, 0, 255]);
        assert_eq!(continuous.color(2), [169, 255, 0, 255]);
        assert_eq!(legacy.color(0), [255, 0, 0, 255]);
        assert_eq!(legacy.color(20), [0, 0, 0, 255]);
    }

    #[test]
    fn legacy_law_jumps_where_the_historical_ramp_did() {
        let eps = 1.0e-12;
        let below = hue2rgb_with(PaletteLaw::Legacy, P, Q, 0.16 - eps);
        let above = hue2rgb_with(PaletteLaw::Legacy, P, Q, 0.16 + eps);
        assert!((below - above).abs() > 0.1);
        assert_eq!(
            hue2rgb_with(PaletteLaw::Legacy, P, Q, 0.66),
            hue2rgb_with(PaletteLaw::Legacy, P, Q, 0.9)
        );
    }

    #[test]
    fn palette_refuses_zero_limit_under_every_law() {
        assert!(Palette::with_law(0, PaletteLaw::Legacy).is_err());
        assert!(Palette::with_law(0, PaletteLaw::Continuous).is_err());
    }

    #[test]
    fn speed_to_color_overshoots_before_clamping() {
        let raw = speed_to_color(0, 20);
        assert!(raw[0] > 255.0);
        assert!(raw[1] < 0.0);
        assert_eq!(raw[3], 255.0);
    }
}
