// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Contains the ViewRect, which describes a window onto the complex
//! plane along with the size of the pixel grid it will be rendered
//! into, and the PlaneMapper, which maps pixels of that grid onto
//! points of the window.
use num::Complex;

use crate::errors::RenderError;

/// Describes the x, y of a pixel in the integral plane.  The origin is
/// the upper-left corner of the image.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Pixel(pub usize, pub usize);

/// A window onto the complex plane and the pixel grid it maps to.
///
/// `left`/`right` bound the real axis and `top`/`bottom` bound the
/// imaginary axis.  They are interpolation endpoints, not a min/max
/// pair: swapping them renders a mirrored view, and that is allowed.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ViewRect {
    /// Real part at the left edge of the image.
    pub left: f64,
    /// Imaginary part at the top edge of the image.
    pub top: f64,
    /// Real part at the right edge of the image.
    pub right: f64,
    /// Imaginary part at the bottom edge of the image.
    pub bottom: f64,
    /// Width of the image in pixels.
    pub width: usize,
    /// Height of the image in pixels.
    pub height: usize,
}

impl ViewRect {
    /// Builds a view from the image size and the two complex numbers at
    /// its upper-left and lower-right corners.
    pub fn new(
        width: usize,
        height: usize,
        leftupper: Complex<f64>,
        rightlower: Complex<f64>,
    ) -> ViewRect {
        ViewRect {
            left: leftupper.re,
            top: leftupper.im,
            right: rightlower.re,
            bottom: rightlower.im,
            width,
            height,
        }
    }

    /// The total number of pixels in the integral grid.
    pub fn len(&self) -> usize {
        self.width * self.height
    }

    /// Describes that the integral plane has no area.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// The number of bytes an RGBA image of this view occupies, or
    /// `None` if that does not fit in memory addressing.
    pub fn buffer_len(&self) -> Option<usize> {
        self.width
            .checked_mul(self.height)
            .and_then(|pixels| pixels.checked_mul(4))
    }

    /// Checks that the pixel grid has area and that every corner is a
    /// finite number.  Nothing is computed or allocated for a view that
    /// fails this.
    pub fn validate(&self) -> Result<(), RenderError> {
        if self.is_empty() || self.buffer_len().is_none() {
            return Err(RenderError::InvalidDimension {
                width: self.width,
                height: self.height,
            });
        }
        let corners = [self.left, self.top, self.right, self.bottom];
        if !corners.iter().all(|c| c.is_finite()) {
            return Err(RenderError::NonFiniteRect);
        }
        Ok(())
    }
}

// Exact at both ends: s == 0 yields `from`, s == 1 yields `to`.
#[inline]
fn lerp(from: f64, to: f64, s: f64) -> f64 {
    from * (1.0 - s) + to * s
}

/// Given a pixel and a view, return the complex number at that pixel.
/// Pixel (0, 0) lands exactly on (left, top) and pixel (width, height)
/// lands exactly on (right, bottom).
pub fn pixel_to_point(pixel: &Pixel, rect: &ViewRect) -> Complex<f64> {
    Complex::new(
        lerp(rect.left, rect.right, (pixel.0 as f64) / (rect.width as f64)),
        lerp(rect.top, rect.bottom, (pixel.1 as f64) / (rect.height as f64)),
    )
}

/// A view that has been checked and can be used to map pixels.  Only
/// `PlaneMapper::new` produces one, so holding a PlaneMapper means the
/// mapping can never divide by zero or produce a non-finite point.
#[derive(Debug)]
pub struct PlaneMapper {
    /// The validated view.
    pub rect: ViewRect,
}

impl PlaneMapper {
    /// Constructor.  Refuses views with no area or non-finite corners.
    pub fn new(rect: ViewRect) -> Result<PlaneMapper, RenderError> {
        rect.validate()?;
        Ok(PlaneMapper { rect })
    }

    /// The total number of points in the integral grid.
    pub fn len(&self) -> usize {
        self.rect.len()
    }

    /// Always false; a mapper is never built over an empty grid.
    pub fn is_empty(&self) -> bool {
        self.rect.is_empty()
    }

    /// Given the column and row of a pixel on the integral plane,
    /// return the complex number it corresponds to.
    pub fn pixel_to_point(&self, pixel: &Pixel) -> Complex<f64> {
        pixel_to_point(pixel, &self.rect)
    }
}
