//! Graphics Draw API
//!
//! Orientation and clip aware entry points built on the primitive blitter.
//! Coordinates and clip rectangles passed in are logical (what the game sees);
//! the [`RenderContext`] maps them onto the physical surface.
//!
//! Entry points never fail. A configuration problem is logged once through the
//! `log` facade and the draw is skipped.

pub(crate) mod blit;
mod copy;
mod roz;
mod zoom;

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::atlas::TileAtlas;
use crate::error::{report, GfxError};
use crate::geometry::{ClipRect, Orientation, Placement};
use crate::palette::Palette;
use crate::surface::{Bitmap, Pixel, PriorityBitmap, Surface};

pub use blit::PRIORITY_COVERED;
pub use roz::RozParams;

use blit::{BlitColors, SlotColors, SourceBlock, TileBlit};

/// Transparency / blending mode of a draw, carrying its key
///
/// Palette variants look the pen up through the atlas color codes and the
/// palette. Raw variants write `color + pen` directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Transparency {
    /// Every pixel is drawn
    Opaque,
    OpaqueRaw,

    /// Pixels of one pen are skipped
    Pen(u32),
    PenRaw(u32),

    /// Pixels whose pen bit is set in the mask are skipped (pens 0-31)
    Pens(u32),
    PensRaw(u32),

    /// Pixels whose logical color code equals the key are skipped
    Color(u32),

    /// Only destination pixels equal to the key are overwritten
    Through(u32),
    ThroughRaw(u32),

    /// Pen effect table; the key pen is skipped
    PenTable(u32),
    PenTableRaw(u32),

    /// Surface copies only: `dest = pens[dest | src << shift]`
    Blend(u32),

    /// Surface copies only: `dest |= src << shift`
    BlendRaw(u32),
}

impl Transparency {
    /// True for the variants that write `color + pen` without palette lookup
    pub fn is_raw(self) -> bool {
        matches!(
            self,
            Transparency::OpaqueRaw
                | Transparency::PenRaw(_)
                | Transparency::PensRaw(_)
                | Transparency::ThroughRaw(_)
                | Transparency::PenTableRaw(_)
                | Transparency::BlendRaw(_)
        )
    }

    /// Transparent pens as a pen usage mask, for modes the pen usage shortcut applies to
    fn transparent_pens(self) -> Option<u32> {
        match self {
            Transparency::Pen(pen) | Transparency::PenRaw(pen) if pen < 32 => Some(1 << pen),
            Transparency::Pens(mask) | Transparency::PensRaw(mask) => Some(mask),
            _ => None,
        }
    }

    fn opaque_equivalent(self) -> Transparency {
        if self.is_raw() {
            Transparency::OpaqueRaw
        } else {
            Transparency::Opaque
        }
    }
}

/// Which tile to draw, with which colors, where
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TileParams {
    /// Tile index, taken modulo the atlas tile count
    pub code: u32,

    /// Palette slot (modulo the atlas slot count), or the base value for raw modes
    pub color: u32,

    pub flip_x: bool,
    pub flip_y: bool,

    /// Logical position of the top-left corner
    pub x: i32,
    pub y: i32,
}

impl TileParams {
    pub fn new(code: u32, color: u32, x: i32, y: i32) -> Self {
        TileParams { code, color, x, y, ..Default::default() }
    }

    pub fn flipped(mut self, flip_x: bool, flip_y: bool) -> Self {
        self.flip_x = flip_x;
        self.flip_y = flip_y;
        self
    }
}

/// Per-frame drawing state: cabinet orientation, palette, visible area
///
/// Replaces process-wide globals. Cheap to copy; build one per frame.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    pub orientation: Orientation,
    pub palette: &'a Palette,

    /// Default logical clip when a draw call passes none
    pub visible_area: Option<ClipRect>,
}

impl<'a> RenderContext<'a> {
    pub fn new(palette: &'a Palette) -> Self {
        RenderContext {
            orientation: Orientation::ROT0,
            palette,
            visible_area: None,
        }
    }

    pub fn with_orientation(mut self, orientation: Orientation) -> Self {
        self.orientation = orientation;
        self
    }

    pub fn with_visible_area(mut self, area: ClipRect) -> Self {
        self.visible_area = Some(area);
        self
    }

    /// Logical size of a physical `width` x `height` surface
    pub fn logical_size(&self, width: usize, height: usize) -> (usize, usize) {
        if self.orientation.swap_xy {
            (height, width)
        } else {
            (width, height)
        }
    }

    /// Logical clip of a draw: the one given, else the visible area, else the whole screen
    pub(crate) fn logical_clip(&self, clip: Option<&ClipRect>, width: usize, height: usize) -> ClipRect {
        let (lw, lh) = self.logical_size(width, height);
        clip.copied()
            .or(self.visible_area)
            .unwrap_or_else(|| ClipRect::full(lw, lh))
    }

    /// Physical clip of a draw, limited to the surface
    pub(crate) fn physical_clip(&self, clip: Option<&ClipRect>, width: usize, height: usize) -> ClipRect {
        let logical = self.logical_clip(clip, width, height);
        self.orientation
            .transform_clip(&logical, width as i32, height as i32)
            .intersect(&ClipRect::full(width, height))
    }

    /// Draw one tile
    pub fn draw_tile(
        &self,
        dest: &mut Surface,
        atlas: &TileAtlas,
        tile: &TileParams,
        clip: Option<&ClipRect>,
        mode: Transparency,
    ) {
        report(match dest {
            Surface::Indexed(bitmap) => self.draw_tile_core(bitmap, atlas, tile, clip, mode, None),
            Surface::Direct(bitmap) => self.draw_tile_core(bitmap, atlas, tile, clip, mode, None),
        });
    }

    /// Draw one tile against a priority buffer
    ///
    /// A pixel is written only where `(1 << priority) & priority_mask == 0`;
    /// every pixel the tile covers is then marked [`PRIORITY_COVERED`].
    pub fn draw_tile_prioritized(
        &self,
        dest: &mut Surface,
        atlas: &TileAtlas,
        tile: &TileParams,
        clip: Option<&ClipRect>,
        mode: Transparency,
        priority: &mut PriorityBitmap,
        priority_mask: u32,
    ) {
        let priority = Some((priority, priority_mask));
        report(match dest {
            Surface::Indexed(bitmap) => self.draw_tile_core(bitmap, atlas, tile, clip, mode, priority),
            Surface::Direct(bitmap) => self.draw_tile_core(bitmap, atlas, tile, clip, mode, priority),
        });
    }

    /// Draw one tile scaled by 16.16 factors (`0x10000` = 1x)
    pub fn draw_tile_zoomed(
        &self,
        dest: &mut Surface,
        atlas: &TileAtlas,
        tile: &TileParams,
        clip: Option<&ClipRect>,
        mode: Transparency,
        scale_x: i32,
        scale_y: i32,
    ) {
        let scale = (scale_x, scale_y);
        report(match dest {
            Surface::Indexed(bitmap) => zoom::draw_zoomed(self, bitmap, atlas, tile, clip, mode, scale, None),
            Surface::Direct(bitmap) => zoom::draw_zoomed(self, bitmap, atlas, tile, clip, mode, scale, None),
        });
    }

    /// Zoomed tile draw against a priority buffer
    #[allow(clippy::too_many_arguments)]
    pub fn draw_tile_zoomed_prioritized(
        &self,
        dest: &mut Surface,
        atlas: &TileAtlas,
        tile: &TileParams,
        clip: Option<&ClipRect>,
        mode: Transparency,
        scale_x: i32,
        scale_y: i32,
        priority: &mut PriorityBitmap,
        priority_mask: u32,
    ) {
        let scale = (scale_x, scale_y);
        let priority = Some((priority, priority_mask));
        report(match dest {
            Surface::Indexed(bitmap) => zoom::draw_zoomed(self, bitmap, atlas, tile, clip, mode, scale, priority),
            Surface::Direct(bitmap) => zoom::draw_zoomed(self, bitmap, atlas, tile, clip, mode, scale, priority),
        });
    }

    /// Copy a whole surface of the same depth, translating palette modes to raw ones
    #[allow(clippy::too_many_arguments)]
    pub fn copy_surface(
        &self,
        dest: &mut Surface,
        src: &Surface,
        flip_x: bool,
        flip_y: bool,
        x: i32,
        y: i32,
        clip: Option<&ClipRect>,
        mode: Transparency,
    ) {
        let mode = self.raw_copy_mode(mode);
        self.copy_surface_remap(dest, src, flip_x, flip_y, x, y, clip, mode);
    }

    /// Copy a whole surface of the same depth without translating the mode
    #[allow(clippy::too_many_arguments)]
    pub fn copy_surface_remap(
        &self,
        dest: &mut Surface,
        src: &Surface,
        flip_x: bool,
        flip_y: bool,
        x: i32,
        y: i32,
        clip: Option<&ClipRect>,
        mode: Transparency,
    ) {
        let placement = copy::CopyPlacement { flip_x, flip_y, x, y };
        report(match (dest, src) {
            (Surface::Indexed(d), Surface::Indexed(s)) => copy::copy_bitmap(self, d, s, placement, clip, mode),
            (Surface::Direct(d), Surface::Direct(s)) => copy::copy_bitmap(self, d, s, placement, clip, mode),
            (d, s) => Err(GfxError::DepthMismatch("copy_surface", s.depth(), d.depth())),
        });
    }

    /// Copy a surface with independently scrolling row or column bands
    ///
    /// `row_scroll` holds one horizontal offset per row band, `col_scroll` one
    /// vertical offset per column band. An empty slice means "no bands" on that
    /// axis; a single entry scrolls the whole plane along it.
    pub fn copy_scrolling_surface(
        &self,
        dest: &mut Surface,
        src: &Surface,
        row_scroll: &[i32],
        col_scroll: &[i32],
        clip: Option<&ClipRect>,
        mode: Transparency,
    ) {
        let mode = self.raw_copy_mode(mode);
        report(match (dest, src) {
            (Surface::Indexed(d), Surface::Indexed(s)) => {
                copy::copy_scrolling(self, d, s, row_scroll, col_scroll, clip, mode)
            }
            (Surface::Direct(d), Surface::Direct(s)) => {
                copy::copy_scrolling(self, d, s, row_scroll, col_scroll, clip, mode)
            }
            (d, s) => Err(GfxError::DepthMismatch("copy_scrolling_surface", s.depth(), d.depth())),
        });
    }

    /// Affine (rotate / zoom / shear) copy of a same-depth surface
    ///
    /// With a priority buffer, `priority` is OR-ed into every pixel written.
    pub fn copy_rotated_zoomed_surface(
        &self,
        dest: &mut Surface,
        src: &Surface,
        params: &RozParams,
        clip: Option<&ClipRect>,
        mode: Transparency,
        priority: Option<(&mut PriorityBitmap, u8)>,
    ) {
        report(match (dest, src) {
            (Surface::Indexed(d), Surface::Indexed(s)) => roz::copy_roz(self, d, s, params, clip, mode, priority),
            (Surface::Direct(d), Surface::Direct(s)) => roz::copy_roz(self, d, s, params, clip, mode, priority),
            (d, s) => Err(GfxError::DepthMismatch("copy_rotated_zoomed_surface", s.depth(), d.depth())),
        });
    }

    /// Fill a logical clip rectangle (or the whole visible area) with one value
    ///
    /// Returns the number of pixels written.
    pub fn fill_rect(&self, dest: &mut Surface, color: u32, clip: Option<&ClipRect>) -> usize {
        match dest {
            Surface::Indexed(bitmap) => self.fill_core(bitmap, color, clip),
            Surface::Direct(bitmap) => self.fill_core(bitmap, color, clip),
        }
    }

    fn fill_core<P: Pixel>(&self, dest: &mut Bitmap<P>, color: u32, clip: Option<&ClipRect>) -> usize {
        let clip = self.physical_clip(clip, dest.width(), dest.height());
        fill_physical(dest, &clip, P::from_pen(color))
    }

    /// Write one pixel at logical (x, y); out-of-range writes are ignored
    pub fn plot_pixel(&self, dest: &mut Surface, x: i32, y: i32, value: u32) {
        let (w, h) = (dest.width() as i32, dest.height() as i32);
        let (px, py) = self.orientation.transform_point(x, y, w, h);
        match dest {
            Surface::Indexed(bitmap) => bitmap.set(px, py, u8::from_pen(value)),
            Surface::Direct(bitmap) => bitmap.set(px, py, u16::from_pen(value)),
        }
    }

    /// Read the pixel at logical (x, y)
    pub fn read_pixel(&self, dest: &Surface, x: i32, y: i32) -> Option<u32> {
        let (px, py) = self
            .orientation
            .transform_point(x, y, dest.width() as i32, dest.height() as i32);
        dest.get(px, py)
    }

    /// Fill a logical `width` x `height` box at (x, y), clipped to the surface
    pub fn plot_box(&self, dest: &mut Surface, x: i32, y: i32, width: i32, height: i32, value: u32) {
        if width <= 0 || height <= 0 {
            return;
        }
        let (w, h) = (dest.width(), dest.height());
        let placed = self.orientation.place(
            Placement { x, y, width, height, ..Default::default() },
            w as i32,
            h as i32,
        );
        let rect = placed.bounds().intersect(&ClipRect::full(w, h));
        match dest {
            Surface::Indexed(bitmap) => fill_physical(bitmap, &rect, u8::from_pen(value)),
            Surface::Direct(bitmap) => fill_physical(bitmap, &rect, u16::from_pen(value)),
        };
    }

    /// Surface copies have no per-tile palette: use the raw equivalent of a palette mode
    fn raw_copy_mode(&self, mode: Transparency) -> Transparency {
        match mode {
            Transparency::Opaque => Transparency::OpaqueRaw,
            Transparency::Pen(pen) => Transparency::PenRaw(pen),
            Transparency::Color(code) => Transparency::PenRaw(self.palette.pen(code) as u32),
            Transparency::Through(key) => Transparency::ThroughRaw(key),
            other => other,
        }
    }

    /// Remapped pens and color codes of one palette slot of an atlas
    pub(crate) fn slot_colors(&self, atlas: &TileAtlas, color: u32, caller: &'static str) -> Result<SlotColors, GfxError> {
        if atlas.total_colors() == 0 {
            return Err(GfxError::MissingColorTable(caller, color));
        }
        let slot = color as usize % atlas.total_colors();
        let codes = atlas
            .color_codes(slot)
            .ok_or(GfxError::MissingColorTable(caller, color))?;
        Ok(SlotColors::new(codes, self.palette))
    }

    pub(crate) fn draw_tile_core<P: Pixel>(
        &self,
        dest: &mut Bitmap<P>,
        atlas: &TileAtlas,
        tile: &TileParams,
        clip: Option<&ClipRect>,
        mode: Transparency,
        priority: Option<(&mut PriorityBitmap, u32)>,
    ) -> Result<(), GfxError> {
        let code = tile.code as usize % atlas.tile_count();

        let mut mode = mode;
        if let (Some(transparent), Some(usage)) = (mode.transparent_pens(), atlas.pen_usage(code)) {
            if usage & !transparent == 0 {
                return Ok(());
            }
            if usage & transparent == 0 {
                mode = mode.opaque_equivalent();
            }
        }

        let slot;
        let colors = if mode.is_raw() {
            BlitColors::Raw(tile.color)
        } else {
            slot = self.slot_colors(atlas, tile.color, "draw_tile")?;
            BlitColors::Palette(&slot)
        };

        let placed = self.orientation.place(
            Placement {
                x: tile.x,
                y: tile.y,
                width: atlas.tile_width() as i32,
                height: atlas.tile_height() as i32,
                flip_x: tile.flip_x,
                flip_y: tile.flip_y,
            },
            dest.width() as i32,
            dest.height() as i32,
        );
        let mut clip = self.physical_clip(clip, dest.width(), dest.height());
        if let Some((pri, _)) = &priority {
            clip = clip.intersect(&ClipRect::full(pri.width(), pri.height()));
        }

        let source = TileSource::new(atlas, code, self.orientation.swap_xy);
        let Some(blit) = source.clipped(&placed, &clip) else {
            return Ok(());
        };
        blit::blit_tile(dest, &blit, mode, colors, self.palette, priority)
    }
}

/// Fill an already physical, already clipped rectangle
fn fill_physical<P: Pixel>(dest: &mut Bitmap<P>, rect: &ClipRect, value: P) -> usize {
    if rect.is_empty() {
        return 0;
    }
    let (x0, x1) = (rect.min_x as usize, rect.max_x as usize + 1);
    for y in rect.min_y as usize..=rect.max_y as usize {
        dest.row_mut(y)[x0..x1].fill(value);
    }
    rect.width() as usize * rect.height() as usize
}

/// Pixels of one tile in physical orientation
///
/// With swapped axes the tile is read through a transposed copy so that rows of
/// the source always run along physical rows of the destination.
pub(crate) struct TileSource<'a> {
    data: Cow<'a, [u8]>,
    origin: usize,
    line_stride: usize,
    pub width: usize,
    pub height: usize,
}

impl<'a> TileSource<'a> {
    pub(crate) fn new(atlas: &'a TileAtlas, code: usize, swap_xy: bool) -> Self {
        if swap_xy {
            TileSource {
                data: Cow::Owned(atlas.transposed_tile(code)),
                origin: 0,
                line_stride: atlas.tile_height(),
                width: atlas.tile_height(),
                height: atlas.tile_width(),
            }
        } else {
            TileSource {
                data: Cow::Borrowed(atlas.data()),
                origin: atlas.tile_offset(code),
                line_stride: atlas.layout().line_stride,
                width: atlas.tile_width(),
                height: atlas.tile_height(),
            }
        }
    }

    /// Block of pixels already laid out along physical rows
    pub(crate) fn from_block(data: Cow<'a, [u8]>, origin: usize, line_stride: usize, width: usize, height: usize) -> Self {
        TileSource { data, origin, line_stride, width, height }
    }

    /// Pen at physical (x, y) of the tile
    #[inline]
    pub(crate) fn pen(&self, x: usize, y: usize) -> u8 {
        self.data[self.origin + y * self.line_stride + x]
    }

    /// Blit of the part of `placed` that lies inside `clip`; `None` when nothing is left
    pub(crate) fn clipped(&self, placed: &Placement, clip: &ClipRect) -> Option<TileBlit<'_>> {
        let sx = placed.x.max(clip.min_x);
        let ex = (placed.x + placed.width - 1).min(clip.max_x);
        let sy = placed.y.max(clip.min_y);
        let ey = (placed.y + placed.height - 1).min(clip.max_y);
        if sx > ex || sy > ey {
            return None;
        }

        let (w, h) = (self.width as i32, self.height as i32);
        let col = if placed.flip_x { w - 1 - (ex - placed.x) } else { sx - placed.x };
        let (row, stride) = if placed.flip_y {
            (h - 1 - (sy - placed.y), -(self.line_stride as isize))
        } else {
            (sy - placed.y, self.line_stride as isize)
        };

        Some(TileBlit {
            src: SourceBlock {
                data: &self.data,
                origin: self.origin + row as usize * self.line_stride + col as usize,
                width: (ex - sx + 1) as usize,
                height: (ey - sy + 1) as usize,
                stride,
            },
            dest_x: sx as usize,
            dest_y: sy as usize,
            flip_x: placed.flip_x,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atlas::TileLayout;

    fn ramp_atlas() -> TileAtlas {
        // one 4x2 tile: 1 2 3 4 / 5 6 7 8
        let data = (1..=8).collect();
        TileAtlas::new(TileLayout::packed(4, 2, 1, 16, 1), data, (0..16).collect()).unwrap()
    }

    fn indexed(surface: &Surface) -> &Bitmap<u8> {
        match surface {
            Surface::Indexed(b) => b,
            Surface::Direct(_) => panic!("expected an 8-bit surface"),
        }
    }

    #[test]
    fn test_draw_tile_flips() {
        let palette = Palette::identity(16);
        let ctx = RenderContext::new(&palette);
        let atlas = ramp_atlas();
        let mut surface = Surface::new(4, 2, 8);

        ctx.draw_tile(&mut surface, &atlas, &TileParams::new(0, 0, 0, 0).flipped(true, false), None, Transparency::Opaque);
        assert_eq!(indexed(&surface).row(0), &[4, 3, 2, 1]);
        assert_eq!(indexed(&surface).row(1), &[8, 7, 6, 5]);

        ctx.draw_tile(&mut surface, &atlas, &TileParams::new(0, 0, 0, 0).flipped(true, true), None, Transparency::Opaque);
        assert_eq!(indexed(&surface).row(0), &[8, 7, 6, 5]);
        assert_eq!(indexed(&surface).row(1), &[4, 3, 2, 1]);
    }

    #[test]
    fn test_draw_tile_clipped_flip_reads_correct_columns() {
        let palette = Palette::identity(16);
        let ctx = RenderContext::new(&palette);
        let atlas = ramp_atlas();
        let mut surface = Surface::new(4, 2, 8);
        let clip = ClipRect::new(1, 2, 0, 1);
        ctx.draw_tile(&mut surface, &atlas, &TileParams::new(0, 0, 0, 0).flipped(true, false), Some(&clip), Transparency::Opaque);
        assert_eq!(indexed(&surface).row(0), &[0, 3, 2, 0]);
    }

    #[test]
    fn test_draw_tile_swapped_axes_transposes() {
        let palette = Palette::identity(16);
        let swap = Orientation { swap_xy: true, ..Orientation::ROT0 };
        let ctx = RenderContext::new(&palette).with_orientation(swap);
        let atlas = ramp_atlas();
        // physical 2 wide, 4 tall
        let mut surface = Surface::new(2, 4, 8);
        ctx.draw_tile(&mut surface, &atlas, &TileParams::new(0, 0, 0, 0), None, Transparency::Opaque);
        let b = indexed(&surface);
        assert_eq!(b.row(0), &[1, 5]);
        assert_eq!(b.row(3), &[4, 8]);
        assert_eq!(ctx.read_pixel(&surface, 2, 1), Some(7));
    }

    #[test]
    fn test_pen_usage_shortcut_skips_fully_transparent_tile() {
        let palette = Palette::identity(16);
        let ctx = RenderContext::new(&palette);
        let atlas = TileAtlas::new(TileLayout::packed(2, 2, 1, 16, 1), vec![0; 4], (0..16).collect()).unwrap();
        let mut surface = Surface::new(2, 2, 8);
        ctx.fill_rect(&mut surface, 9, None);
        ctx.draw_tile(&mut surface, &atlas, &TileParams::default(), None, Transparency::Pen(0));
        assert!(indexed(&surface).as_slice().iter().all(|&p| p == 9));
    }

    #[test]
    fn test_unsupported_priority_mode_draws_nothing() {
        let palette = Palette::identity(16);
        let ctx = RenderContext::new(&palette);
        let atlas = ramp_atlas();
        let mut surface = Surface::new(4, 2, 8);
        let mut pri = PriorityBitmap::new(4, 2);
        ctx.draw_tile_prioritized(&mut surface, &atlas, &TileParams::default(), None, Transparency::Through(0), &mut pri, 0);
        assert!(indexed(&surface).as_slice().iter().all(|&p| p == 0));
        assert!(pri.as_slice().iter().all(|&p| p == 0));
    }

    #[test]
    fn test_raw_mode_writes_base_plus_pen() {
        let palette = Palette::identity(16);
        let ctx = RenderContext::new(&palette);
        let atlas = ramp_atlas();
        let mut surface = Surface::new(4, 2, 16);
        ctx.draw_tile(&mut surface, &atlas, &TileParams::new(0, 0x100, 0, 0), None, Transparency::OpaqueRaw);
        assert_eq!(surface.get(0, 0), Some(0x101));
        assert_eq!(surface.get(3, 1), Some(0x108));
    }

    #[test]
    fn test_plot_box_and_pixel_follow_orientation() {
        let palette = Palette::identity(16);
        let ctx = RenderContext::new(&palette).with_orientation(Orientation::ROT180);
        let mut surface = Surface::new(8, 8, 8);
        ctx.plot_pixel(&mut surface, 0, 0, 5);
        assert_eq!(surface.get(7, 7), Some(5));
        ctx.plot_box(&mut surface, 0, 0, 2, 3, 6);
        assert_eq!(surface.get(6, 5), Some(6));
        assert_eq!(surface.get(5, 5), Some(0));
        assert_eq!(ctx.read_pixel(&surface, 1, 2), Some(6));
    }

    #[test]
    fn test_fill_rect_counts_clipped_pixels() {
        let palette = Palette::identity(16);
        let ctx = RenderContext::new(&palette);
        let mut surface = Surface::new(8, 8, 16);
        let clip = ClipRect::new(-4, 3, 6, 20);
        assert_eq!(ctx.fill_rect(&mut surface, 0x7fff, Some(&clip)), 4 * 2);
        assert_eq!(ctx.fill_rect(&mut surface, 1, Some(&ClipRect::new(5, 4, 0, 0))), 0);
    }
}
