// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The ways a render can be refused.  All of them are raised before
//! the pixel loop starts, except for cancellation, and none of them
//! ever hand back a partially rendered buffer.

use failure::Fail;

/// Why a render did not produce an image.
#[derive(Copy, Clone, Debug, PartialEq, Fail)]
pub enum RenderError {
    /// The pixel grid has no area, or is too large to address.
    #[fail(display = "invalid image dimensions {}x{}", width, height)]
    InvalidDimension {
        /// Requested width in pixels.
        width: usize,
        /// Requested height in pixels.
        height: usize,
    },

    /// The iteration limit must be at least one.
    #[fail(display = "invalid iteration limit {}, must be at least 1", _0)]
    InvalidLimit(usize),

    /// One of the corners of the view is NaN or infinite.
    #[fail(display = "view rectangle has a non-finite bound")]
    NonFiniteRect,

    /// The render was cancelled before every band was finished.
    #[fail(display = "render cancelled")]
    Cancelled,
}
