// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Assembles a whole image.
//!
//! The pixel buffer is cut into bands of whole rows.  Worker threads
//! pull bands from a shared queue until it runs dry, and each band is a
//! disjoint slice of the buffer, so the pixels themselves are never
//! locked.  The plane, the palette and the evaluator are only ever read.
//! Between bands every worker checks the cancellation token; a render
//! that was cancelled returns an error and drops whatever it had
//! written.

use itertools::iproduct;
use num::clamp;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use crate::decimal::DecimalEvaluator;
use crate::errors::RenderError;
use crate::escape::{EscapeBound, Evaluator, FloatEvaluator};
use crate::palette::{Palette, PaletteLaw};
use crate::planes::{Pixel, PlaneMapper, ViewRect};

/// The iteration limit used when the caller does not give one.
pub const DEFAULT_LIMIT: usize = 20;

/// Rows per band unless told otherwise.
pub const DEFAULT_BAND_ROWS: usize = 16;

/// Which arithmetic the escape-time test runs in.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Precision {
    /// Native `f64`.
    Float,
    /// Fixed-point decimals with nineteen fractional digits.
    Decimal,
}

impl Default for Precision {
    fn default() -> Self {
        Precision::Float
    }
}

/// Knobs that change how a render is carried out, but never what
/// color any pixel comes out (except for `bound` and `palette`, which
/// are deliberate choices of a different image).
#[derive(Copy, Clone, Debug)]
pub struct RenderOptions {
    /// Worker threads.  One renders on the calling thread.
    pub threads: usize,
    /// Image rows handed to a worker at a time.
    pub band_rows: usize,
    /// Arithmetic backend.
    pub precision: Precision,
    /// Escape bound.
    pub bound: EscapeBound,
    /// Hue ramp the palette is built with.
    pub palette: PaletteLaw,
}

impl RenderOptions {
    /// Options that reproduce the historical renderer's images: its
    /// escape bound and its hue ramp.
    pub fn legacy() -> Self {
        RenderOptions {
            bound: EscapeBound::Legacy,
            palette: PaletteLaw::Legacy,
            ..RenderOptions::default()
        }
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        RenderOptions {
            threads: num_cpus::get(),
            band_rows: DEFAULT_BAND_ROWS,
            precision: Precision::default(),
            bound: EscapeBound::default(),
            palette: PaletteLaw::default(),
        }
    }
}

/// A flag shared between a render and whoever may want to stop it.
/// Clones share the flag.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// A token that has not been cancelled.
    pub fn new() -> Self {
        CancelToken::default()
    }

    /// Asks every render holding this token to stop at its next band.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether `cancel` has been called on this token or a clone.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Renders one view at one iteration limit.  Everything the pixel loop
/// needs is checked and built when the Renderer is constructed, so once
/// you hold one the only way `render` can fail is cancellation.
pub struct Renderer {
    plane: PlaneMapper,
    palette: Palette,
    limit: usize,
    options: RenderOptions,
    cancel: CancelToken,
}

impl Renderer {
    /// Validates the view, then the limit, and builds the palette.
    /// Nothing is allocated for the image yet.
    pub fn new(rect: ViewRect, limit: usize) -> Result<Self, RenderError> {
        let plane = PlaneMapper::new(rect)?;
        let palette = Palette::new(limit)?;
        Ok(Renderer {
            plane,
            palette,
            limit,
            options: RenderOptions::default(),
            cancel: CancelToken::new(),
        })
    }

    /// Replaces the default options.
    pub fn with_options(mut self, options: RenderOptions) -> Self {
        if options.palette != self.options.palette {
            self.palette = Palette::build(self.limit, options.palette);
        }
        self.options = options;
        self
    }

    /// Makes the render watch the given token.
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// The palette this render colors with.
    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    /// Renders the full image as row-major RGBA bytes.
    pub fn render(&self) -> Result<Vec<u8>, RenderError> {
        let rect = &self.plane.rect;
        debug!(
            "rendering {}x{} over ({}, {})-({}, {}), limit {}, {:?}",
            rect.width,
            rect.height,
            rect.left,
            rect.top,
            rect.right,
            rect.bottom,
            self.limit,
            self.options
        );
        let start = Instant::now();
        let pixels = match self.options.precision {
            Precision::Float => self.assemble(&FloatEvaluator::new(self.options.bound))?,
            Precision::Decimal => self.assemble(&DecimalEvaluator::new(self.options.bound))?,
        };
        info!(
            "rendered {}x{} in {:.3}s",
            rect.width,
            rect.height,
            duration_secs(start)
        );
        Ok(pixels)
    }

    fn assemble<E: Evaluator>(&self, evaluator: &E) -> Result<Vec<u8>, RenderError> {
        if self.cancel.is_cancelled() {
            warn!("render cancelled before it started");
            return Err(RenderError::Cancelled);
        }
        let rect = &self.plane.rect;
        // The rect was validated, so width * height * 4 does not overflow,
        // and neither does any band no taller than the image.
        let band_rows = clamp(self.options.band_rows, 1, rect.height);
        let band_len = rect.width * 4 * band_rows;
        let bands_total = (rect.height + band_rows - 1) / band_rows;
        let threads = self.options.threads.min(bands_total);
        let mut pixels = vec![0 as u8; rect.width * rect.height * 4];

        if threads <= 1 {
            for (index, band) in pixels.chunks_mut(band_len).enumerate() {
                if self.cancel.is_cancelled() {
                    break;
                }
                self.render_band(evaluator, index * band_rows, band);
            }
        } else {
            let bands = Mutex::new(pixels.chunks_mut(band_len).enumerate());
            let bands = &bands;
            let scoped = crossbeam::scope(|spawner| {
                for _ in 0..threads {
                    spawner.spawn(move |_| loop {
                        if self.cancel.is_cancelled() {
                            break;
                        }
                        let band = match bands.lock() {
                            Ok(mut queue) => queue.next(),
                            Err(_) => None,
                        };
                        match band {
                            Some((index, band)) => {
                                self.render_band(evaluator, index * band_rows, band)
                            }
                            None => {
                                break;
                            }
                        }
                    });
                }
            });
            if let Err(panic) = scoped {
                std::panic::resume_unwind(panic);
            }
        }

        if self.cancel.is_cancelled() {
            warn!("render cancelled, discarding partial image");
            return Err(RenderError::Cancelled);
        }
        Ok(pixels)
    }

    /// Fills one band, whose first row is image row `first_row`.
    fn render_band<E: Evaluator>(&self, evaluator: &E, first_row: usize, band: &mut [u8]) {
        let width = self.plane.rect.width;
        let rows = band.len() / (width * 4);
        trace!("band of {} rows at row {}", rows, first_row);
        for (row, column) in iproduct!(0..rows, 0..width) {
            let point = self.plane.pixel_to_point(&Pixel(column, first_row + row));
            let speed = evaluator.evaluate(point, self.limit);
            let offset = (row * width + column) * 4;
            band[offset..offset + 4].copy_from_slice(&self.palette.color(speed));
        }
    }
}

fn duration_secs(start: Instant) -> f64 {
    let elapsed = start.elapsed();
    elapsed.as_secs() as f64 + f64::from(elapsed.subsec_nanos()) * 1e-9
}

#[cfg(test)]
mod tests {
    use super::*;
    use num::Complex;

    fn view(width: usize, height: usize) -> ViewRect {
        ViewRect::new(
            width,
            height,
            Complex::new(-2.0, -1.25),
            Complex::new(1.0, 1.25),
        )
    }

    fn options(threads: usize, band_rows: usize) -> RenderOptions {
        RenderOptions {
            threads,
            band_rows,
            ..RenderOptions::default()
        }
    }

    #[test]
    fn buffer_is_four_bytes_per_pixel() {
        let pixels = Renderer::new(view(13, 7), 30)
            .unwrap()
            .with_options(options(1, 4))
            .render()
            .unwrap();
        assert_eq!(pixels.len(), 13 * 7 * 4);
        assert!(pixels.chunks(4).all(|p| p[3] == 255));
    }

    #[test]
    fn pixels_match_their_own_evaluation() {
        let rect = view(9, 5);
        let renderer = Renderer::new(rect, 50).unwrap().with_options(options(1, 2));
        let pixels = renderer.render().unwrap();
        let plane = PlaneMapper::new(rect).unwrap();
        let evaluator = FloatEvaluator::default();
        for (row, column) in iproduct!(0..5, 0..9) {
            let speed = evaluator.evaluate(plane.pixel_to_point(&Pixel(column, row)), 50);
            let offset = (row * 9 + column) * 4;
            assert_eq!(&pixels[offset..offset + 4], &renderer.palette().color(speed));
        }
    }

    #[test]
    fn threads_and_bands_do_not_change_the_image() {
        let reference = Renderer::new(view(37, 23), 100)
            .unwrap()
            .with_options(options(1, 1))
            .render()
            .unwrap();
        let cases = [
            (1, 5),
            (2, 1),
            (3, 4),
            (8, 7),
            (4, 100),
            (16, 0),
            (1, std::usize::MAX),
            (3, std::usize::MAX),
            (std::usize::MAX, 1),
        ];
        for &(threads, band_rows) in cases.iter() {
            let pixels = Renderer::new(view(37, 23), 100)
                .unwrap()
                .with_options(options(threads, band_rows))
                .render()
                .unwrap();
            assert!(pixels == reference, "{} threads, {} rows", threads, band_rows);
        }
    }

    #[test]
    fn legacy_options_switch_the_palette() {
        let legacy = Renderer::new(view(4, 4), 20)
            .unwrap()
            .with_options(RenderOptions::legacy());
        assert_eq!(legacy.palette().color(2), [137, 255, 0, 255]);
        let back = legacy.with_options(RenderOptions::default());
        assert_eq!(back.palette().color(2), [169, 255, 0, 255]);
    }

    #[test]
    fn cancelled_render_returns_no_image() {
        let cancel = CancelToken::new();
        let renderer = Renderer::new(view(16, 16), 20)
            .unwrap()
            .with_cancel(cancel.clone());
        cancel.cancel();
        assert!(cancel.is_cancelled());
        assert_eq!(renderer.render().unwrap_err(), RenderError::Cancelled);
    }

    #[test]
    fn construction_checks_limit_after_view() {
        assert_eq!(
            Renderer::new(view(0, 4), 0).err(),
            Some(RenderError::InvalidDimension {
                width: 0,
                height: 4
            })
        );
        assert_eq!(
            Renderer::new(view(4, 4), 0).err(),
            Some(RenderError::InvalidLimit(0))
        );
    }
}
