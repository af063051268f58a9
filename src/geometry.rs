//! Frame geometry and frame-size calculation.
//!
//! A [`FrameGeometry`] fixes the dimensions and pixel layout of every frame
//! carried on a connection. The frame size is validated once, when the
//! geometry is constructed, so the rest of the crate can treat it as a
//! known non-zero constant.

use std::{fmt, num::NonZeroUsize};

use thiserror::Error;

/// Errors raised while computing a frame size.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum GeometryError {
    /// One of the dimensions was zero.
    #[error("invalid geometry: {field} must be positive")]
    ZeroDimension {
        /// Name of the offending input.
        field: &'static str,
    },
    /// The frame size does not fit in `usize`.
    #[error("invalid geometry: {width}x{height}x{bytes_per_pixel} overflows usize")]
    Overflow {
        /// Frame width in pixels.
        width: usize,
        /// Frame height in pixels.
        height: usize,
        /// Bytes used by a single pixel.
        bytes_per_pixel: usize,
    },
}

/// Compute the byte length of one frame.
///
/// ```
/// use framerelay::geometry::frame_size;
///
/// assert_eq!(frame_size(710, 1080, 4).map(|n| n.get()), Ok(3_067_200));
/// assert!(frame_size(0, 1080, 4).is_err());
/// ```
///
/// # Errors
///
/// Returns [`GeometryError::ZeroDimension`] if any input is zero and
/// [`GeometryError::Overflow`] if the product overflows `usize`.
pub fn frame_size(
    width: usize,
    height: usize,
    bytes_per_pixel: usize,
) -> Result<NonZeroUsize, GeometryError> {
    for (field, value) in [
        ("width", width),
        ("height", height),
        ("bytes_per_pixel", bytes_per_pixel),
    ] {
        if value == 0 {
            return Err(GeometryError::ZeroDimension { field });
        }
    }

    width
        .checked_mul(height)
        .and_then(|pixels| pixels.checked_mul(bytes_per_pixel))
        .and_then(NonZeroUsize::new)
        .ok_or(GeometryError::Overflow {
            width,
            height,
            bytes_per_pixel,
        })
}

/// Pixel layouts with a known byte width.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PixelFormat {
    /// Packed 8-bit RGB.
    Rgb24,
    /// Packed 8-bit RGBA.
    Rgba32,
    /// Any other layout expressed as a byte count per pixel.
    Custom(usize),
}

impl PixelFormat {
    /// Bytes occupied by a single pixel.
    #[must_use]
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            Self::Rgb24 => 3,
            Self::Rgba32 => 4,
            Self::Custom(n) => n,
        }
    }
}

/// Immutable dimensions shared by every frame on a connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameGeometry {
    width: usize,
    height: usize,
    bytes_per_pixel: usize,
    frame_size: NonZeroUsize,
}

impl FrameGeometry {
    /// Validate a geometry and precompute its frame size.
    ///
    /// # Errors
    ///
    /// Propagates any [`GeometryError`] from [`frame_size`].
    pub fn new(width: usize, height: usize, bytes_per_pixel: usize) -> Result<Self, GeometryError> {
        let frame_size = frame_size(width, height, bytes_per_pixel)?;
        Ok(Self {
            width,
            height,
            bytes_per_pixel,
            frame_size,
        })
    }

    /// Build a geometry from a named pixel format.
    ///
    /// # Errors
    ///
    /// Propagates any [`GeometryError`] from [`frame_size`].
    pub fn with_format(
        width: usize,
        height: usize,
        format: PixelFormat,
    ) -> Result<Self, GeometryError> {
        Self::new(width, height, format.bytes_per_pixel())
    }

    /// Geometry covering a raw byte stream chopped into `frame_size` records.
    #[must_use]
    pub const fn from_frame_size(frame_size: NonZeroUsize) -> Self {
        Self {
            width: frame_size.get(),
            height: 1,
            bytes_per_pixel: 1,
            frame_size,
        }
    }

    /// Frame width in pixels.
    #[must_use]
    pub const fn width(&self) -> usize { self.width }

    /// Frame height in pixels.
    #[must_use]
    pub const fn height(&self) -> usize { self.height }

    /// Bytes per pixel.
    #[must_use]
    pub const fn bytes_per_pixel(&self) -> usize { self.bytes_per_pixel }

    /// Byte length of one frame.
    #[must_use]
    pub const fn frame_size(&self) -> NonZeroUsize { self.frame_size }
}

impl fmt::Display for FrameGeometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}x{}x{} ({} bytes per frame)",
            self.width, self.height, self.bytes_per_pixel, self.frame_size
        )
    }
}
