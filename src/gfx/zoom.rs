//! Zoomed tile draw
//!
//! Destination footprint comes from 16.16 scale factors; the source is sampled
//! by accumulating a 16.16 index per destination pixel.

use super::blit::{ColorMap, RawBase, Remapped, PRIORITY_COVERED, PRIORITY_COVERED_BIT};
use super::{RenderContext, TileParams, TileSource, Transparency};
use crate::atlas::TileAtlas;
use crate::error::GfxError;
use crate::geometry::ClipRect;
use crate::palette::{Palette, PenEffect};
use crate::surface::{Bitmap, Pixel, PriorityBitmap};
use crate::util::{mirrored_extent, scaled_extent, source_step, FIXED_ONE};

#[allow(clippy::too_many_arguments)]
pub(crate) fn draw_zoomed<P: Pixel>(
    ctx: &RenderContext<'_>,
    dest: &mut Bitmap<P>,
    atlas: &TileAtlas,
    tile: &TileParams,
    clip: Option<&ClipRect>,
    mode: Transparency,
    (scale_x, scale_y): (i32, i32),
    priority: Option<(&mut PriorityBitmap, u32)>,
) -> Result<(), GfxError> {
    if scale_x <= 0 || scale_y <= 0 {
        return Ok(());
    }
    if scale_x == FIXED_ONE && scale_y == FIXED_ONE {
        return ctx.draw_tile_core(dest, atlas, tile, clip, mode, priority);
    }

    let code = tile.code as usize % atlas.tile_count();
    let slot = if mode.is_raw() {
        None
    } else {
        Some(ctx.slot_colors(atlas, tile.color, "draw_tile_zoomed")?)
    };

    // Map position, flips and scales onto the physical surface
    let orientation = ctx.orientation;
    let (mut x, mut y) = (tile.x, tile.y);
    let (mut flip_x, mut flip_y) = (tile.flip_x, tile.flip_y);
    let (mut scale_x, mut scale_y) = (scale_x, scale_y);
    if orientation.swap_xy {
        std::mem::swap(&mut x, &mut y);
        std::mem::swap(&mut flip_x, &mut flip_y);
        std::mem::swap(&mut scale_x, &mut scale_y);
    }

    let source = TileSource::new(atlas, code, orientation.swap_xy);
    let (dw, dh) = (dest.width() as i32, dest.height() as i32);
    if orientation.flip_x {
        x = dw - mirrored_extent(source.width, scale_x) - x;
        flip_x = !flip_x;
    }
    if orientation.flip_y {
        y = dh - mirrored_extent(source.height, scale_y) - y;
        flip_y = !flip_y;
    }

    let mut clip = ctx.physical_clip(clip, dest.width(), dest.height());
    if let Some((pri, _)) = &priority {
        clip = clip.intersect(&ClipRect::full(pri.width(), pri.height()));
    }

    let screen_w = scaled_extent(source.width, scale_x);
    let screen_h = scaled_extent(source.height, scale_y);
    if screen_w <= 0 || screen_h <= 0 {
        return Ok(());
    }

    // Row terminators become per-row lengths
    let limits = atlas.row_terminator().map(|_| {
        (0..atlas.tile_height())
            .map(|row| atlas.row_extent(code, row))
            .collect::<Vec<_>>()
    });

    let Some(walk) = ZoomWalk::new(
        &source,
        limits,
        orientation.swap_xy,
        (x, y),
        (screen_w, screen_h),
        (flip_x, flip_y),
        &clip,
    ) else {
        return Ok(());
    };

    let palette = ctx.palette;
    let raw = RawBase(tile.color);
    match (mode, slot.as_ref()) {
        (Transparency::Opaque, Some(slot)) => {
            let pal = Remapped(&slot.pixels);
            walk.run(dest, priority, |c, _| Some(pal.color(c)));
        }
        (Transparency::OpaqueRaw, _) => {
            walk.run(dest, priority, |c, _| Some(raw.color(c)));
        }
        (Transparency::Pen(key), Some(slot)) => {
            let pal = Remapped(&slot.pixels);
            walk.run(dest, priority, |c, _| (c as u32 != key).then(|| pal.color(c)));
        }
        (Transparency::PenRaw(key), _) => {
            walk.run(dest, priority, |c, _| (c as u32 != key).then(|| raw.color(c)));
        }
        (Transparency::Pens(mask), Some(slot)) => {
            let pal = Remapped(&slot.pixels);
            walk.run(dest, priority, |c, _| pens_pixel(c, mask, pal));
        }
        (Transparency::PensRaw(mask), _) => {
            walk.run(dest, priority, |c, _| pens_pixel(c, mask, raw));
        }
        (Transparency::Color(key), Some(slot)) => {
            let pal = Remapped(&slot.pixels);
            walk.run(dest, priority, |c, _| (slot.codes[c as usize] as u32 != key).then(|| pal.color(c)));
        }
        (Transparency::Through(key), Some(slot)) => {
            let pal = Remapped(&slot.pixels);
            walk.run(dest, priority, |c, current| (current == key).then(|| pal.color(c)));
        }
        (Transparency::ThroughRaw(key), _) => {
            walk.run(dest, priority, |c, current| (current == key).then(|| raw.color(c)));
        }
        (Transparency::PenTable(key), Some(slot)) => {
            let pal = Remapped(&slot.pixels);
            walk.run(dest, priority, |c, current| pen_table_pixel(c, current, key, pal, palette));
        }
        (Transparency::PenTableRaw(key), _) => {
            walk.run(dest, priority, |c, current| pen_table_pixel(c, current, key, raw, palette));
        }
        (mode, _) => return Err(GfxError::UnsupportedMode("draw_tile_zoomed", mode)),
    }
    Ok(())
}

#[inline]
fn pens_pixel<C: ColorMap>(pen: u8, mask: u32, colors: C) -> Option<u32> {
    (pen >= 32 || (1u32 << pen) & mask == 0).then(|| colors.color(pen))
}

#[inline]
fn pen_table_pixel<C: ColorMap>(pen: u8, current: u32, key: u32, colors: C, palette: &Palette) -> Option<u32> {
    if pen as u32 == key {
        return None;
    }
    match palette.effect(pen) {
        PenEffect::Source => Some(colors.color(pen)),
        PenEffect::Shadow => Some(palette.shadow(current)),
        PenEffect::Transparent => None,
    }
}

/// Clipped destination rectangle plus the 16.16 source walk that fills it
struct ZoomWalk<'s> {
    source: &'s TileSource<'s>,

    /// Usable pixels of each logical tile row
    limits: Option<Vec<usize>>,
    swap_xy: bool,

    sx: i32,
    ex: i32,
    sy: i32,
    ey: i32,

    x_index_base: i64,
    dx: i64,
    y_index: i64,
    dy: i64,
}

impl<'s> ZoomWalk<'s> {
    fn new(
        source: &'s TileSource<'s>,
        limits: Option<Vec<usize>>,
        swap_xy: bool,
        (x, y): (i32, i32),
        (screen_w, screen_h): (i32, i32),
        (flip_x, flip_y): (bool, bool),
        clip: &ClipRect,
    ) -> Option<Self> {
        // Clip the footprint first; a fully clipped tile never touches the index math
        let (sx, sy) = (x.max(clip.min_x), y.max(clip.min_y));
        let ex = x.saturating_add(screen_w).min(clip.max_x.saturating_add(1));
        let ey = y.saturating_add(screen_h).min(clip.max_y.saturating_add(1));
        if ex <= sx || ey <= sy {
            return None;
        }

        // 16.16 source steps, reversed for flipped axes
        let mut dx = source_step(source.width, screen_w) as i64;
        let mut dy = source_step(source.height, screen_h) as i64;
        let mut x_index_base = 0;
        if flip_x {
            x_index_base = (screen_w as i64 - 1) * dx;
            dx = -dx;
        }
        let mut y_index = 0;
        if flip_y {
            y_index = (screen_h as i64 - 1) * dy;
            dy = -dy;
        }

        // Skip the source pixels of the clipped-off part
        x_index_base += (sx - x) as i64 * dx;
        y_index += (sy - y) as i64 * dy;

        Some(ZoomWalk {
            source,
            limits,
            swap_xy,
            sx,
            ex,
            sy,
            ey,
            x_index_base,
            dx,
            y_index,
            dy,
        })
    }

    #[inline]
    fn sample(&self, xi: usize, yi: usize) -> Option<u8> {
        if let Some(limits) = &self.limits {
            let (row, col) = if self.swap_xy { (xi, yi) } else { (yi, xi) };
            if col >= limits.get(row).copied().unwrap_or(0) {
                return None;
            }
        }
        Some(self.source.pen(xi, yi))
    }

    /// Walk the destination; `shade(pen, current)` returns the new pixel or `None` to skip
    fn run<P: Pixel>(
        &self,
        dest: &mut Bitmap<P>,
        mut priority: Option<(&mut PriorityBitmap, u32)>,
        shade: impl Fn(u8, u32) -> Option<u32>,
    ) {
        let max_x = self.source.width - 1;
        let max_y = self.source.height - 1;
        let mut y_index = self.y_index;

        for y in self.sy..self.ey {
            let yi = ((y_index >> 16).max(0) as usize).min(max_y);
            let row = dest.row_mut(y as usize);
            let mut pri_row = match &mut priority {
                Some((pri, mask)) => Some((pri.row_mut(y as usize), *mask | PRIORITY_COVERED_BIT)),
                None => None,
            };

            let mut x_index = self.x_index_base;
            for x in self.sx..self.ex {
                let xi = ((x_index >> 16).max(0) as usize).min(max_x);
                x_index += self.dx;

                let Some(pen) = self.sample(xi, yi) else { continue };
                let d = &mut row[x as usize];
                let Some(value) = shade(pen, d.to_u32()) else { continue };
                match &mut pri_row {
                    Some((prow, mask)) => {
                        let p = &mut prow[x as usize];
                        if (1u32 << (*p & 31)) & *mask == 0 {
                            *d = P::from_pen(value);
                        }
                        *p = PRIORITY_COVERED;
                    }
                    None => *d = P::from_pen(value),
                }
            }
            y_index += self.dy;
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::atlas::{TileAtlas, TileLayout};
    use crate::geometry::ClipRect;
    use crate::gfx::{RenderContext, TileParams, Transparency};
    use crate::palette::Palette;
    use crate::surface::Surface;
    use crate::util::FIXED_ONE;

    fn checker_atlas(size: usize) -> TileAtlas {
        let data = (0..size * size).map(|i| 1 + ((i % size + i / size) % 2) as u8).collect();
        TileAtlas::new(TileLayout::packed(size, size, 1, 16, 1), data, (0..16).collect()).unwrap()
    }

    fn footprint(surface: &Surface) -> (i32, i32) {
        let mut max = (-1, -1);
        for y in 0..surface.height() as i32 {
            for x in 0..surface.width() as i32 {
                if surface.get(x, y) != Some(0) {
                    max = (max.0.max(x), max.1.max(y));
                }
            }
        }
        (max.0 + 1, max.1 + 1)
    }

    #[test]
    fn test_double_size_footprint() {
        let palette = Palette::identity(16);
        let ctx = RenderContext::new(&palette);
        let atlas = checker_atlas(8);
        let mut surface = Surface::new(32, 32, 8);
        ctx.draw_tile_zoomed(&mut surface, &atlas, &TileParams::default(), None, Transparency::Pen(0), 0x20000, 0x20000);
        assert_eq!(footprint(&surface), (16, 16));
        // each source pixel covers a 2x2 block
        assert_eq!(surface.get(0, 0), surface.get(1, 1));
        assert_ne!(surface.get(1, 0), surface.get(2, 0));
    }

    #[test]
    fn test_zero_scale_is_noop() {
        let palette = Palette::identity(16);
        let ctx = RenderContext::new(&palette);
        let atlas = checker_atlas(8);
        let mut surface = Surface::new(16, 16, 8);
        ctx.draw_tile_zoomed(&mut surface, &atlas, &TileParams::default(), None, Transparency::Pen(0), 0, 0x10000);
        assert_eq!(footprint(&surface), (0, 0));
    }

    #[test]
    fn test_opaque_modes_fill_the_footprint() {
        let palette = Palette::identity(16);
        let ctx = RenderContext::new(&palette);
        let atlas = checker_atlas(8);

        let mut surface = Surface::new(16, 16, 8);
        ctx.draw_tile_zoomed(&mut surface, &atlas, &TileParams::default(), None, Transparency::Opaque, 0x8000, 0x8000);
        assert_eq!(footprint(&surface), (4, 4));
        assert!((0..4).all(|y| (0..4).all(|x| matches!(surface.get(x, y), Some(1) | Some(2)))));

        let mut surface = Surface::new(16, 16, 16);
        let tile = TileParams::new(0, 0x30, 0, 0);
        ctx.draw_tile_zoomed(&mut surface, &atlas, &tile, None, Transparency::OpaqueRaw, 0x20000, 0x20000);
        assert_eq!(footprint(&surface), (16, 16));
        assert_eq!((surface.get(1, 1), surface.get(2, 0)), (Some(0x31), Some(0x32)));
    }

    #[test]
    fn test_raw_pens_mode_skips_masked_pens() {
        let palette = Palette::identity(16);
        let ctx = RenderContext::new(&palette);
        let atlas = checker_atlas(8);
        let mut surface = Surface::new(16, 16, 8);
        let tile = TileParams::new(0, 0x10, 0, 0);
        ctx.draw_tile_zoomed(&mut surface, &atlas, &tile, None, Transparency::PensRaw(1 << 1), 0x20000, 0x20000);
        // pen 1 squares stay empty, pen 2 squares are drawn
        assert_eq!(surface.get(0, 0), Some(0));
        assert_eq!(surface.get(3, 1), Some(0x12));
        assert_eq!(surface.get(15, 15), Some(0));
    }

    #[test]
    fn test_through_modes_only_cover_the_key() {
        let palette = Palette::identity(16);
        let ctx = RenderContext::new(&palette);
        let atlas = checker_atlas(8);
        let left = ClipRect::new(0, 7, 0, 15);

        let mut surface = Surface::new(16, 16, 8);
        ctx.fill_rect(&mut surface, 5, Some(&left));
        ctx.draw_tile_zoomed(&mut surface, &atlas, &TileParams::default(), None, Transparency::Through(5), 0x20000, 0x20000);
        assert_eq!((surface.get(0, 0), surface.get(2, 0)), (Some(1), Some(2)));
        assert_eq!((surface.get(8, 0), surface.get(15, 15)), (Some(0), Some(0)));

        let mut surface = Surface::new(16, 16, 16);
        ctx.fill_rect(&mut surface, 5, Some(&left));
        let tile = TileParams::new(0, 0x20, 0, 0);
        ctx.draw_tile_zoomed(&mut surface, &atlas, &tile, None, Transparency::ThroughRaw(5), 0x20000, 0x20000);
        assert_eq!((surface.get(0, 0), surface.get(7, 0)), (Some(0x21), Some(0x22)));
        assert_eq!(surface.get(9, 3), Some(0));
    }

    #[test]
    fn test_fully_clipped_tile_with_large_step_draws_nothing() {
        let palette = Palette::identity(16);
        let ctx = RenderContext::new(&palette);
        let atlas = TileAtlas::new(TileLayout::packed(128, 1, 1, 16, 1), vec![1; 128], (0..16).collect()).unwrap();
        let mut surface = Surface::new(64, 64, 8);
        let tile = TileParams::new(0, 0, -256, 0);
        ctx.draw_tile_zoomed(&mut surface, &atlas, &tile, None, Transparency::Pen(0), 0x200, FIXED_ONE);
        assert_eq!(footprint(&surface), (0, 0));
    }

    #[test]
    fn test_clipped_left_edge_starts_mid_tile() {
        let palette = Palette::identity(16);
        let ctx = RenderContext::new(&palette);
        // pen = column + 1
        let data = (0..64).map(|i| (i % 8) as u8 + 1).collect();
        let atlas = TileAtlas::new(TileLayout::packed(8, 8, 1, 16, 1), data, (0..16).collect()).unwrap();
        let mut surface = Surface::new(16, 16, 8);
        let tile = TileParams::new(0, 0, -5, 0);
        ctx.draw_tile_zoomed(&mut surface, &atlas, &tile, None, Transparency::Pen(0), 0x20000, 0x20000);
        // screen x 0 is footprint pixel 5, source column 2
        assert_eq!(surface.get(0, 0), Some(3));
        assert_eq!(surface.get(1, 0), Some(4));
    }

    #[test]
    fn test_row_terminator_truncates_rows() {
        let palette = Palette::identity(256);
        let ctx = RenderContext::new(&palette);
        let mut data = vec![3u8; 16];
        data[2] = 0xFF;
        let atlas = TileAtlas::new(TileLayout::packed(4, 4, 1, 256, 1), data, (0..256).collect())
            .unwrap()
            .with_row_terminator(Some(0xFF));
        let mut surface = Surface::new(16, 16, 8);
        ctx.draw_tile_zoomed(&mut surface, &atlas, &TileParams::default(), None, Transparency::Pen(0), 0x20000, 0x20000);
        // first row keeps two source pixels, the rest keep all four
        assert_eq!(surface.get(3, 0), Some(3));
        assert_eq!(surface.get(4, 0), Some(0));
        assert_eq!(surface.get(7, 2), Some(3));
    }
}
