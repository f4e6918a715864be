//! Unpack / Stack / Zoom pixel sources
//!
//! Unpack and Stack sprites are cut into rectangular blocks of the list pixel
//! data and handed to the primitive blitter one clipped block at a time, the
//! same way tiles are. Zoomed sprites are sampled pixel by pixel: the walk runs
//! over the physical footprint, undoes the physical flips and the axis swap,
//! and reads the pen at the scaled logical position.

use std::borrow::Cow;

use crate::geometry::{ClipRect, Placement};
use crate::gfx::blit::{mask_row, sprite_row, ColorMap, PaletteBase, RawBase, SpritePens, TileBlit};
use crate::gfx::TileSource;
use crate::palette::Palette;
use crate::sprite::list::{flags, Resolved, Sprite, SpriteKind, SpriteListConfig};
use crate::surface::{Bitmap, Pixel};
use crate::util::source_step;

/// Byte written into a mask under an occluding pixel
pub const MASK_OPAQUE: u8 = 0xFF;

/// Rectangle of a sprite's logical pixel grid stored contiguously in the pixel data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Block {
    /// Position inside the sprite
    x: i32,
    y: i32,
    width: i32,
    height: i32,

    /// Index of the block's first pixel, may lie outside the data
    origin: i64,
}

/// Pixel source of one sprite for the current frame
pub(crate) struct SpriteSource<'a> {
    sprite: &'a Sprite,
    placed: Placement,
    swap_xy: bool,
    kind: SpriteKind,
    pens: &'a [u8],
    transparent_pen: u8,

    /// Zoom: 16.16 source step per logical footprint pixel
    step_x: i64,
    step_y: i64,

    /// Zoom: usable pixels of each source row
    row_lengths: Option<Vec<usize>>,
}

impl<'a> SpriteSource<'a> {
    pub(crate) fn new(
        sprite: &'a Sprite,
        resolved: &Resolved,
        config: &SpriteListConfig,
        swap_xy: bool,
        pens: &'a [u8],
    ) -> Self {
        let mut source = SpriteSource {
            sprite,
            placed: resolved.placed,
            swap_xy,
            kind: config.kind,
            pens,
            transparent_pen: config.transparent_pen,
            step_x: 0,
            step_y: 0,
            row_lengths: None,
        };
        if config.kind == SpriteKind::Zoom && sprite.total_width > 0 && sprite.total_height > 0 {
            source.step_x = source_step(sprite.tile_width.max(0) as usize, sprite.total_width) as i64;
            source.step_y = source_step(sprite.tile_height.max(0) as usize, sprite.total_height) as i64;
            source.row_lengths = config.row_terminator.map(|t| source.row_lengths_until(t));
        }
        source
    }

    fn row_lengths_until(&self, terminator: u8) -> Vec<usize> {
        let width = self.sprite.tile_width.max(0) as usize;
        (0..self.sprite.tile_height.max(0) as usize)
            .map(|row| {
                let start = self.sprite.pen_offset + row * self.sprite.line_offset;
                let line = self.pens.get(start..(start + width).min(self.pens.len())).unwrap_or(&[]);
                line.iter().position(|&p| p == terminator).unwrap_or(line.len())
            })
            .collect()
    }

    /// Pen at an absolute index of the pixel data
    #[inline]
    fn pen(&self, index: i64) -> Option<u8> {
        usize::try_from(index).ok().and_then(|i| self.pens.get(i).copied())
    }

    /// Logical blocks making up an Unpack or Stack sprite
    fn blocks(&self) -> Vec<Block> {
        let s = self.sprite;
        let (width, height) = (s.total_width, s.total_height);
        if width <= 0 || height <= 0 {
            return Vec::new();
        }
        let line = s.line_offset as i64;
        match self.kind {
            SpriteKind::Unpack => vec![Block {
                x: 0,
                y: 0,
                width,
                height,
                origin: s.pen_offset as i64 + s.y_offset as i64 * line + s.x_offset as i64,
            }],
            SpriteKind::Stack => {
                let (tw, th) = (s.tile_width, s.tile_height);
                if tw <= 0 || th <= 0 {
                    return Vec::new();
                }
                // the last column and row of blocks may be cut by the footprint
                let columns = (width + tw - 1) / tw;
                let rows = (height + th - 1) / th;
                let mut blocks = Vec::with_capacity((columns * rows) as usize);
                for by in 0..rows {
                    for bx in 0..columns {
                        let index = (by * columns + bx) as i64;
                        blocks.push(Block {
                            x: bx * tw,
                            y: by * th,
                            width: tw.min(width - bx * tw),
                            height: th.min(height - by * th),
                            origin: s.pen_offset as i64 + index * th as i64 * line,
                        });
                    }
                }
                blocks
            }
            SpriteKind::Zoom => Vec::new(),
        }
    }

    /// Pixels of a block laid out along physical rows
    ///
    /// Borrowed straight from the pixel data when the block lies inside it and
    /// the axes are not swapped; otherwise gathered into a copy, with pixels the
    /// data does not cover left transparent.
    fn block_source(&self, block: &Block) -> TileSource<'a> {
        let (w, h) = (block.width as usize, block.height as usize);
        let line = self.sprite.line_offset;
        let last = block.origin + (h as i64 - 1) * line as i64 + w as i64;
        if !self.swap_xy && block.origin >= 0 && last <= self.pens.len() as i64 {
            return TileSource::from_block(Cow::Borrowed(self.pens), block.origin as usize, line, w, h);
        }

        let mut out = vec![self.transparent_pen; w * h];
        for y in 0..h {
            for x in 0..w {
                let Some(pen) = self.pen(block.origin + (y * line + x) as i64) else { continue };
                let i = if self.swap_xy { x * h + y } else { y * w + x };
                out[i] = pen;
            }
        }
        if self.swap_xy {
            TileSource::from_block(Cow::Owned(out), 0, h, h, w)
        } else {
            TileSource::from_block(Cow::Owned(out), 0, w, w, h)
        }
    }

    /// Physical placement of a block inside the sprite's footprint
    fn block_placement(&self, block: &Block) -> Placement {
        let p = &self.placed;
        let (u, v, width, height) = if self.swap_xy {
            (block.y, block.x, block.height, block.width)
        } else {
            (block.x, block.y, block.width, block.height)
        };
        let u = if p.flip_x { p.width - u - width } else { u };
        let v = if p.flip_y { p.height - v - height } else { v };
        Placement { x: p.x + u, y: p.y + v, width, height, flip_x: p.flip_x, flip_y: p.flip_y }
    }

    /// Call `f` with every clipped block blit of an Unpack or Stack sprite
    fn for_each_blit(&self, clip: &ClipRect, mut f: impl FnMut(&TileBlit<'_>)) {
        for block in self.blocks() {
            let placed = self.block_placement(&block);
            if placed.bounds().intersect(clip).is_empty() {
                continue;
            }
            let source = self.block_source(&block);
            if let Some(blit) = source.clipped(&placed, clip) {
                f(&blit);
            }
        }
    }

    /// Zoom: pen at logical sprite coordinates, `None` when the data does not cover it
    #[inline]
    fn zoomed_pen(&self, lx: i32, ly: i32) -> Option<u8> {
        let col = (lx as i64 * self.step_x) >> 16;
        let row = (ly as i64 * self.step_y) >> 16;
        if let Some(lengths) = &self.row_lengths {
            if col >= lengths.get(row as usize).copied().unwrap_or(0) as i64 {
                return None;
            }
        }
        let s = self.sprite;
        self.pen(s.pen_offset as i64 + row * s.line_offset as i64 + col)
    }

    /// Zoom: call `f(x, y, pen)` for every physical pixel of the footprint inside `clip`
    fn for_each_zoomed_pixel(&self, clip: &ClipRect, mut f: impl FnMut(i32, i32, u8)) {
        let p = &self.placed;
        let area = p.bounds().intersect(clip);
        if area.is_empty() {
            return;
        }
        for y in area.min_y..=area.max_y {
            let v = y - p.y;
            let v = if p.flip_y { p.height - 1 - v } else { v };
            for x in area.min_x..=area.max_x {
                let u = x - p.x;
                let u = if p.flip_x { p.width - 1 - u } else { u };
                let (lx, ly) = if self.swap_xy { (v, u) } else { (u, v) };
                if let Some(pen) = self.zoomed_pen(lx, ly) {
                    f(x, y, pen);
                }
            }
        }
    }
}

/// Draw rules shared by every sprite of a list plus the sprite's own flags
fn sprite_pens(sprite: &Sprite, config: &SpriteListConfig) -> SpritePens {
    SpritePens {
        transparent: config.transparent_pen,
        special: config.special_pen,
        shadow: sprite.has(flags::PARTIAL_SHADOW).then_some(sprite.shadow_pen),
        shadow_all: sprite.has(flags::SHADOW),
        through: sprite.has(flags::THROUGH).then_some(config.through_value),
    }
}

/// Write `occluder`'s opaque pixels into `mask`, which covers `target`'s footprint
///
/// `clip` bounds the part of the footprint that can ever be drawn.
pub(crate) fn write_mask(
    mask: &mut [u8],
    target: &Resolved,
    occluder: &SpriteSource<'_>,
    config: &SpriteListConfig,
    clip: &ClipRect,
) {
    let t = &target.placed;
    let bounds = t.bounds().intersect(clip);
    if bounds.is_empty() {
        return;
    }
    let index = |x: i32, y: i32| ((y - t.y) * t.width + (x - t.x)) as usize;
    let pens = SpritePens { transparent: config.transparent_pen, special: config.special_pen, ..Default::default() };

    // sprites that never show their transparent or special pen cover their whole footprint
    let transparent_bit = if config.transparent_pen < 32 { 1u32 << config.transparent_pen } else { 0 };
    let special_bit = match config.special_pen {
        Some(pen) if pen < 32 => 1u32 << pen,
        Some(_) => u32::MAX,
        None => 0,
    };
    let fully_opaque = occluder
        .sprite
        .pen_usage
        .is_some_and(|usage| transparent_bit != 0 && usage & (transparent_bit | special_bit) == 0);

    if fully_opaque {
        let area = occluder.placed.bounds().intersect(&bounds);
        if area.is_empty() {
            return;
        }
        for y in area.min_y..=area.max_y {
            let start = index(area.min_x, y);
            let end = index(area.max_x, y) + 1;
            mask[start..end].fill(MASK_OPAQUE);
        }
        return;
    }

    if occluder.kind == SpriteKind::Zoom {
        occluder.for_each_zoomed_pixel(&bounds, |x, y, pen| {
            if pens.occludes(pen) {
                mask[index(x, y)] = MASK_OPAQUE;
            }
        });
        return;
    }

    occluder.for_each_blit(&bounds, |blit| {
        let (x, width) = (blit.dest_x as i32, blit.src.width);
        for i in 0..blit.src.height {
            let Some(src) = blit.src.row(i) else { continue };
            let start = index(x, blit.dest_y as i32 + i as i32);
            mask_row(&mut mask[start..start + width], src, blit.flip_x, &pens, MASK_OPAQUE);
        }
    });
}

/// Draw one sprite into `dest`, honouring its mask
pub(crate) fn draw_sprite<P: Pixel>(
    dest: &mut Bitmap<P>,
    source: &SpriteSource<'_>,
    mask: Option<&[u8]>,
    config: &SpriteListConfig,
    palette: &Palette,
    clip: &ClipRect,
) {
    let sprite = source.sprite;
    let pens = sprite_pens(sprite, config);
    if config.raw_colors {
        draw_with(dest, source, mask, &pens, RawBase(sprite.color_base), palette, clip);
    } else {
        draw_with(dest, source, mask, &pens, PaletteBase(palette, sprite.color_base), palette, clip);
    }
}

fn draw_with<P: Pixel, C: ColorMap>(
    dest: &mut Bitmap<P>,
    source: &SpriteSource<'_>,
    mask: Option<&[u8]>,
    pens: &SpritePens,
    colors: C,
    palette: &Palette,
    clip: &ClipRect,
) {
    let placed = &source.placed;
    let mask_index = |x: i32, y: i32| ((y - placed.y) * placed.width + (x - placed.x)) as usize;

    if source.kind == SpriteKind::Zoom {
        source.for_each_zoomed_pixel(clip, |x, y, pen| {
            if mask.is_some_and(|m| m.get(mask_index(x, y)).is_some_and(|&b| b != 0)) {
                return;
            }
            let d = &mut dest.row_mut(y as usize)[x as usize];
            if let Some(value) = pens.shade(pen, d.to_u32(), colors, palette) {
                *d = P::from_pen(value);
            }
        });
        return;
    }

    source.for_each_blit(clip, |blit| {
        let (x0, width) = (blit.dest_x, blit.src.width);
        for i in 0..blit.src.height {
            let Some(src) = blit.src.row(i) else { continue };
            let y = blit.dest_y + i;
            let covered = mask.and_then(|m| {
                let start = mask_index(x0 as i32, y as i32);
                m.get(start..start + width)
            });
            let row = &mut dest.row_mut(y)[x0..x0 + width];
            sprite_row(row, covered, src, blit.flip_x, colors, pens, palette);
        }
    });
}
