//! Decoded tile atlas
//!
//! The atlas holds tiles that an external decode step already expanded to one
//! palette-index byte per pixel. It is built once when a graphics set is loaded
//! and never changes afterwards.

use log::debug;

use crate::error::GfxError;

/// Dimensions and memory layout of the tiles in an atlas
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileLayout {
    /// Tile width in pixels
    pub width: usize,

    /// Tile height in pixels
    pub height: usize,

    /// Number of tiles
    pub count: usize,

    /// Colors used by one palette slot
    pub granularity: usize,

    /// Number of palette slots
    pub total_colors: usize,

    /// Bytes between two rows of a tile
    pub line_stride: usize,

    /// Bytes between the starts of two tiles
    pub tile_stride: usize,
}

impl TileLayout {
    /// Tightly packed layout: rows of `width` bytes, tiles of `width * height` bytes
    pub fn packed(width: usize, height: usize, count: usize, granularity: usize, total_colors: usize) -> Self {
        TileLayout {
            width,
            height,
            count,
            granularity,
            total_colors,
            line_stride: width,
            tile_stride: width * height,
        }
    }
}

/// Immutable table of decoded tiles
#[derive(Debug, Clone)]
pub struct TileAtlas {
    layout: TileLayout,

    /// One palette-index byte per pixel
    data: Vec<u8>,

    /// Per tile bitmask of the pens it uses (bit n set = pen n present)
    pen_usage: Option<Vec<u32>>,

    /// Palette slot * granularity + pen -> logical color code
    color_codes: Vec<u16>,

    /// Byte that marks "rest of this row is empty" for zoomed draws
    row_terminator: Option<u8>,
}

impl TileAtlas {
    /// Build an atlas, validating the layout against the supplied buffers
    pub fn new(layout: TileLayout, data: Vec<u8>, color_codes: Vec<u16>) -> Result<Self, GfxError> {
        if layout.width == 0 || layout.height == 0 || layout.count == 0 {
            return Err(GfxError::InvalidAtlas(format!(
                "degenerate layout {}x{} x{}",
                layout.width, layout.height, layout.count
            )));
        }
        if layout.line_stride < layout.width {
            return Err(GfxError::InvalidAtlas(format!(
                "line stride {} is smaller than tile width {}",
                layout.line_stride, layout.width
            )));
        }
        let tile_extent = layout.line_stride * (layout.height - 1) + layout.width;
        let needed = layout.tile_stride * (layout.count - 1) + tile_extent;
        if data.len() < needed {
            return Err(GfxError::InvalidAtlas(format!(
                "{} tiles need {} bytes, got {}",
                layout.count,
                needed,
                data.len()
            )));
        }
        if color_codes.len() < layout.granularity * layout.total_colors {
            return Err(GfxError::InvalidAtlas(format!(
                "{} palette slots of {} colors need {} color codes, got {}",
                layout.total_colors,
                layout.granularity,
                layout.granularity * layout.total_colors,
                color_codes.len()
            )));
        }

        let mut atlas = TileAtlas {
            layout,
            data,
            pen_usage: None,
            color_codes,
            row_terminator: None,
        };
        if layout.granularity <= 32 {
            atlas.pen_usage = atlas.compute_pen_usage();
        }
        Ok(atlas)
    }

    /// Mark a byte value as the end-of-row sentinel for zoomed draws
    pub fn with_row_terminator(mut self, terminator: Option<u8>) -> Self {
        self.row_terminator = terminator;
        self
    }

    fn compute_pen_usage(&self) -> Option<Vec<u32>> {
        let mut usage = Vec::with_capacity(self.layout.count);
        for code in 0..self.layout.count {
            let mut mask = 0u32;
            for row in 0..self.layout.height {
                for &pen in self.tile_row(code, row) {
                    if pen >= 32 {
                        debug!("pen {} in tile {} does not fit a pen usage mask, shortcut disabled", pen, code);
                        return None;
                    }
                    mask |= 1 << pen;
                }
            }
            usage.push(mask);
        }
        Some(usage)
    }

    #[inline]
    pub fn layout(&self) -> &TileLayout {
        &self.layout
    }

    #[inline]
    pub fn tile_width(&self) -> usize {
        self.layout.width
    }

    #[inline]
    pub fn tile_height(&self) -> usize {
        self.layout.height
    }

    #[inline]
    pub fn tile_count(&self) -> usize {
        self.layout.count
    }

    #[inline]
    pub fn granularity(&self) -> usize {
        self.layout.granularity
    }

    #[inline]
    pub fn total_colors(&self) -> usize {
        self.layout.total_colors
    }

    #[inline]
    pub fn row_terminator(&self) -> Option<u8> {
        self.row_terminator
    }

    /// One row of a tile (`width` bytes)
    #[inline]
    pub fn tile_row(&self, code: usize, row: usize) -> &[u8] {
        let start = code * self.layout.tile_stride + row * self.layout.line_stride;
        &self.data[start..start + self.layout.width]
    }

    /// Whole pixel buffer
    #[inline]
    pub(crate) fn data(&self) -> &[u8] {
        &self.data
    }

    /// Offset of a tile's first pixel in [`TileAtlas::data`]
    #[inline]
    pub(crate) fn tile_offset(&self, code: usize) -> usize {
        code * self.layout.tile_stride
    }

    /// Copy of a tile with rows and columns exchanged (`height` bytes per row)
    pub(crate) fn transposed_tile(&self, code: usize) -> Vec<u8> {
        let (width, height) = (self.layout.width, self.layout.height);
        let mut out = vec![0u8; width * height];
        for y in 0..height {
            for (x, &pen) in self.tile_row(code, y).iter().enumerate() {
                out[x * height + y] = pen;
            }
        }
        out
    }

    /// Pens used by a tile, if the atlas tracks them
    #[inline]
    pub fn pen_usage(&self, code: usize) -> Option<u32> {
        self.pen_usage.as_ref().and_then(|usage| usage.get(code).copied())
    }

    /// Color codes of one palette slot (`granularity` entries)
    pub fn color_codes(&self, slot: usize) -> Option<&[u16]> {
        let start = slot * self.layout.granularity;
        self.color_codes.get(start..start + self.layout.granularity)
    }

    /// Number of bytes in a row up to (not including) the row terminator
    pub(crate) fn row_extent(&self, code: usize, row: usize) -> usize {
        let line = self.tile_row(code, row);
        match self.row_terminator {
            Some(t) => line.iter().position(|&p| p == t).unwrap_or(line.len()),
            None => line.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_tiles() -> TileAtlas {
        let mut data = vec![0u8; 2 * 4 * 4];
        data[..16].fill(3);
        data[16] = 1;
        data[17] = 2;
        TileAtlas::new(TileLayout::packed(4, 4, 2, 16, 2), data, (0..32).collect()).unwrap()
    }

    #[test]
    fn test_pen_usage_is_computed_per_tile() {
        let atlas = two_tiles();
        assert_eq!(atlas.pen_usage(0), Some(1 << 3));
        assert_eq!(atlas.pen_usage(1), Some((1 << 0) | (1 << 1) | (1 << 2)));
    }

    #[test]
    fn test_short_buffers_are_rejected() {
        let err = TileAtlas::new(TileLayout::packed(4, 4, 2, 16, 1), vec![0; 31], vec![0; 16]);
        assert!(matches!(err, Err(GfxError::InvalidAtlas(_))));
        let err = TileAtlas::new(TileLayout::packed(4, 4, 2, 16, 2), vec![0; 32], vec![0; 16]);
        assert!(matches!(err, Err(GfxError::InvalidAtlas(_))));
    }

    #[test]
    fn test_color_codes_slice_per_slot() {
        let atlas = two_tiles();
        assert_eq!(atlas.color_codes(1).map(|c| c[0]), Some(16));
        assert!(atlas.color_codes(2).is_none());
    }

    #[test]
    fn test_transposed_tile_swaps_axes() {
        let data = vec![1, 2, 3, 4, 5, 6];
        let atlas = TileAtlas::new(TileLayout::packed(3, 2, 1, 8, 1), data, vec![0; 8]).unwrap();
        assert_eq!(atlas.transposed_tile(0), vec![1, 4, 2, 5, 3, 6]);
    }

    #[test]
    fn test_row_extent_stops_at_terminator() {
        let mut data = vec![5u8; 8];
        data[2] = 0xFF;
        let atlas = TileAtlas::new(TileLayout::packed(4, 2, 1, 16, 1), data, vec![0; 16])
            .unwrap()
            .with_row_terminator(Some(0xFF));
        assert_eq!(atlas.row_extent(0, 0), 2);
        assert_eq!(atlas.row_extent(0, 1), 4);
    }
}
