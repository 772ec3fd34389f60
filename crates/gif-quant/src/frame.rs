//! True-color input frames.

use thiserror::Error;

use crate::color::Rgba;

/// Error returned when a raster does not match its declared dimensions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    /// Width or height is zero
    #[error("frame dimensions must be non-zero, got {width}x{height}")]
    ZeroDimension { width: u32, height: u32 },
    /// Buffer length differs from `width * height * 4`
    #[error("raster has {actual} bytes, expected {expected} for {width}x{height} RGBA")]
    LengthMismatch {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
}

/// A row-major RGBA8 raster.
///
/// Immutable once built; the pipeline takes frames by value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Frame {
    /// Wrap an RGBA buffer of `width * height * 4` bytes.
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Result<Self, FrameError> {
        if width == 0 || height == 0 {
            return Err(FrameError::ZeroDimension { width, height });
        }
        let expected = width as usize * height as usize * 4;
        if data.len() != expected {
            return Err(FrameError::LengthMismatch {
                width,
                height,
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Rebuild a frame from a buffer taken out of one of the same size.
    pub(crate) fn from_raw_parts(width: u32, height: u32, data: Vec<u8>) -> Self {
        debug_assert_eq!(data.len(), width as usize * height as usize * 4);
        Self {
            width,
            height,
            data,
        }
    }

    /// Build a frame from individual pixels.
    pub fn from_pixels(width: u32, height: u32, pixels: &[Rgba]) -> Result<Self, FrameError> {
        let data = pixels.iter().flat_map(|p| [p.r, p.g, p.b, p.a]).collect();
        Self::new(width, height, data)
    }

    /// A frame filled with one color.
    pub fn filled(width: u32, height: u32, color: Rgba) -> Result<Self, FrameError> {
        let count = width as usize * height as usize;
        Self::from_pixels(width, height, &vec![color; count])
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// `width * height`.
    #[inline]
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Raw RGBA bytes.
    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Pixel at linear index `i`.
    #[inline]
    pub fn pixel(&self, i: usize) -> Rgba {
        Rgba::from_slice(&self.data[i * 4..i * 4 + 4])
    }

    /// Pixel at `(x, y)`.
    #[inline]
    pub fn pixel_at(&self, x: u32, y: u32) -> Rgba {
        self.pixel(y as usize * self.width as usize + x as usize)
    }

    /// Iterate pixels in raster order.
    pub fn pixels(&self) -> impl Iterator<Item = Rgba> + '_ {
        self.data.chunks_exact(4).map(Rgba::from_slice)
    }

    /// Give back the raw buffer.
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }
}
