#![deny(missing_docs)]
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Mandelbrot renderer
//!
//! The Mandelbrot set is the set of points `c` on the complex plane
//! for which the sequence `z = z² + c`, started at zero, never runs off
//! to infinity.  We can't iterate forever, so every point gets a budget
//! of iterations (the "limit"), and we count how many it survives
//! before its modulus passes 2.  That count is the point's "speed", and
//! the speed picks the point's color from a palette.  Points that use
//! up the whole budget are assumed to be in the set and come out black.
//!
//! Rendering an image is the same test for every pixel: map the pixel
//! onto the window of the complex plane being viewed, measure its
//! speed, look up its color.  No pixel depends on any other, so the
//! image is rendered in bands of rows across as many threads as you
//! like.
//!
//! The result is a flat RGBA buffer, row-major, four bytes per pixel.
//! Encoding it into an image file is left to the caller.

extern crate crossbeam;
extern crate failure;
extern crate itertools;
#[macro_use]
extern crate log;
extern crate num;
extern crate num_cpus;

pub mod decimal;
pub mod errors;
pub mod escape;
pub mod palette;
pub mod planes;
pub mod render;

pub use decimal::DecimalEvaluator;
pub use errors::RenderError;
pub use escape::{EscapeBound, Evaluator, FloatEvaluator};
pub use palette::{Palette, PaletteLaw};
pub use planes::{PlaneMapper, ViewRect};
pub use render::{CancelToken, Precision, RenderOptions, Renderer, DEFAULT_LIMIT};

/// Renders `rect` at the given iteration limit with the default
/// options, returning `width * height * 4` bytes of RGBA.  The view is
/// checked before anything is allocated; on any error there is no
/// image at all.
pub fn render_fractal(rect: ViewRect, limit: usize) -> Result<Vec<u8>, RenderError> {
    Renderer::new(rect, limit)?.render()
}
