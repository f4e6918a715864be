//! Destination and source pixel buffers
//!
//! A [`Bitmap`] is a bounds-checked 2D view over row-major storage with an
//! explicit row stride. Drawing code slices whole rows out of it so the inner
//! loops work on plain `&[P]` / `&mut [P]` without per-pixel index math.
//!
//! A [`Surface`] is what the host hands to the drawing core: either an 8-bit
//! indexed bitmap or a 16-bit direct color bitmap. The depth is matched once per
//! draw call and the generic cores are monomorphized per pixel type.

use crate::error::GfxError;

/// A destination pixel type
pub trait Pixel: Copy + PartialEq + Default + std::fmt::Debug + 'static {
    /// Bits per pixel
    const DEPTH: u8;

    /// Narrow a palette pen / color value to this pixel type
    fn from_pen(value: u32) -> Self;

    /// Widen the pixel for table lookups and comparisons
    fn to_u32(self) -> u32;
}

impl Pixel for u8 {
    const DEPTH: u8 = 8;

    #[inline]
    fn from_pen(value: u32) -> Self {
        value as u8
    }

    #[inline]
    fn to_u32(self) -> u32 {
        self as u32
    }
}

impl Pixel for u16 {
    const DEPTH: u8 = 16;

    #[inline]
    fn from_pen(value: u32) -> Self {
        value as u16
    }

    #[inline]
    fn to_u32(self) -> u32 {
        self as u32
    }
}

/// Row-major pixel buffer with a constant row stride
#[derive(Clone, Debug, PartialEq)]
pub struct Bitmap<P> {
    width: usize,
    height: usize,
    stride: usize,
    pixels: Vec<P>,
}

impl<P: Pixel> Bitmap<P> {
    /// Create a zero-filled bitmap whose stride equals its width
    pub fn new(width: usize, height: usize) -> Self {
        Bitmap {
            width,
            height,
            stride: width,
            pixels: vec![P::default(); width * height],
        }
    }

    /// Create a zero-filled bitmap with padding at the end of every row
    pub fn with_stride(width: usize, height: usize, stride: usize) -> Result<Self, GfxError> {
        if stride < width {
            return Err(GfxError::InvalidBitmap(format!(
                "stride {} is smaller than width {}",
                stride, width
            )));
        }
        Ok(Bitmap {
            width,
            height,
            stride,
            pixels: vec![P::default(); stride * height],
        })
    }

    /// Wrap host-owned pixel storage
    pub fn from_pixels(width: usize, height: usize, stride: usize, pixels: Vec<P>) -> Result<Self, GfxError> {
        if stride < width {
            return Err(GfxError::InvalidBitmap(format!(
                "stride {} is smaller than width {}",
                stride, width
            )));
        }
        if height > 0 && pixels.len() < stride * (height - 1) + width {
            return Err(GfxError::InvalidBitmap(format!(
                "{} pixels cannot hold {}x{} with stride {}",
                pixels.len(),
                width,
                height,
                stride
            )));
        }
        Ok(Bitmap { width, height, stride, pixels })
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Distance in pixels between the starts of two consecutive rows
    #[inline]
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// One row, without the stride padding
    #[inline]
    pub fn row(&self, y: usize) -> &[P] {
        let start = y * self.stride;
        &self.pixels[start..start + self.width]
    }

    /// One mutable row, without the stride padding
    #[inline]
    pub fn row_mut(&mut self, y: usize) -> &mut [P] {
        let start = y * self.stride;
        &mut self.pixels[start..start + self.width]
    }

    /// Pixel at (x, y), `None` outside the bitmap
    #[inline]
    pub fn get(&self, x: i32, y: i32) -> Option<P> {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return None;
        }
        Some(self.pixels[y as usize * self.stride + x as usize])
    }

    /// Write a pixel; writes outside the bitmap are ignored
    #[inline]
    pub fn set(&mut self, x: i32, y: i32, value: P) {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return;
        }
        self.pixels[y as usize * self.stride + x as usize] = value;
    }

    /// Raw storage, padding included
    pub fn as_slice(&self) -> &[P] {
        &self.pixels
    }
}

/// Bitmap used as a per-pixel priority buffer
pub type PriorityBitmap = Bitmap<u8>;

/// A destination (or same-depth source) owned by the host frame buffer
#[derive(Clone, Debug, PartialEq)]
pub enum Surface {
    /// 8-bit palette indexed
    Indexed(Bitmap<u8>),

    /// 16-bit direct color
    Direct(Bitmap<u16>),
}

impl Surface {
    /// Allocate a surface of the given depth (8 or 16)
    pub fn new(width: usize, height: usize, depth: u8) -> Self {
        if depth == 16 {
            Surface::Direct(Bitmap::new(width, height))
        } else {
            Surface::Indexed(Bitmap::new(width, height))
        }
    }

    pub fn width(&self) -> usize {
        match self {
            Surface::Indexed(b) => b.width(),
            Surface::Direct(b) => b.width(),
        }
    }

    pub fn height(&self) -> usize {
        match self {
            Surface::Indexed(b) => b.height(),
            Surface::Direct(b) => b.height(),
        }
    }

    /// Bits per pixel
    pub fn depth(&self) -> u8 {
        match self {
            Surface::Indexed(_) => u8::DEPTH,
            Surface::Direct(_) => u16::DEPTH,
        }
    }

    /// Pixel at physical (x, y) widened to `u32`
    pub fn get(&self, x: i32, y: i32) -> Option<u32> {
        match self {
            Surface::Indexed(b) => b.get(x, y).map(Pixel::to_u32),
            Surface::Direct(b) => b.get(x, y).map(Pixel::to_u32),
        }
    }

    /// Whole-surface clip rectangle in physical coordinates
    pub fn bounds(&self) -> crate::geometry::ClipRect {
        crate::geometry::ClipRect::full(self.width(), self.height())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_skip_stride_padding() {
        let mut bitmap = Bitmap::<u16>::with_stride(3, 2, 5).unwrap();
        bitmap.row_mut(1).copy_from_slice(&[7, 8, 9]);
        assert_eq!(bitmap.row(1), &[7, 8, 9]);
        assert_eq!(bitmap.as_slice()[5..8], [7, 8, 9]);
        assert_eq!(bitmap.as_slice()[3..5], [0, 0]);
    }

    #[test]
    fn test_out_of_range_access_is_ignored() {
        let mut bitmap = Bitmap::<u8>::new(4, 4);
        bitmap.set(-1, 0, 5);
        bitmap.set(4, 0, 5);
        assert_eq!(bitmap.get(4, 0), None);
        assert!(bitmap.as_slice().iter().all(|&p| p == 0));
    }

    #[test]
    fn test_from_pixels_rejects_short_storage() {
        assert!(Bitmap::<u8>::from_pixels(4, 4, 4, vec![0; 15]).is_err());
        assert!(Bitmap::<u8>::from_pixels(4, 4, 4, vec![0; 16]).is_ok());
        assert!(Bitmap::<u8>::from_pixels(4, 4, 3, vec![0; 16]).is_err());
    }

    #[test]
    fn test_surface_depth() {
        assert_eq!(Surface::new(2, 2, 8).depth(), 8);
        assert_eq!(Surface::new(2, 2, 16).depth(), 16);
    }
}
