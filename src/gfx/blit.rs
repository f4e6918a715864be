//! Primitive blitter
//!
//! Row routines that move palette-index source pixels (one byte each) into an
//! 8-bit or 16-bit destination. Every routine is generic over the destination
//! [`Pixel`] type and over the [`ColorMap`] that turns a pen into a pixel value,
//! so each (depth, palette/raw) pair gets its own specialized loop.
//!
//! Horizontal flip reads the source row backwards. Vertical flip never reaches
//! this level: the caller walks source rows with a negative stride.

use crate::error::GfxError;
use crate::gfx::Transparency;
use crate::palette::{Palette, PenEffect};
use crate::surface::{Bitmap, Pixel, PriorityBitmap};

/// Priority value written under every pixel a prioritized draw touches
pub const PRIORITY_COVERED: u8 = 31;

/// Bit always forced into a caller's priority mask so covered pixels stay covered
pub(crate) const PRIORITY_COVERED_BIT: u32 = 1 << 31;

/// Turns a source pen into a destination pixel value
pub(crate) trait ColorMap: Copy {
    fn color(&self, pen: u8) -> u32;
}

/// Pens already remapped through the palette for one palette slot
#[derive(Clone, Copy)]
pub(crate) struct Remapped<'a>(pub &'a [u16; 256]);

impl ColorMap for Remapped<'_> {
    #[inline(always)]
    fn color(&self, pen: u8) -> u32 {
        self.0[pen as usize] as u32
    }
}

/// Direct color: pixel value is `base + pen`
#[derive(Clone, Copy)]
pub(crate) struct RawBase(pub u32);

impl ColorMap for RawBase {
    #[inline(always)]
    fn color(&self, pen: u8) -> u32 {
        self.0.wrapping_add(pen as u32)
    }
}

/// Lookup tables for one palette slot of an atlas
pub(crate) struct SlotColors {
    /// pen -> destination pixel value
    pub pixels: [u16; 256],

    /// pen -> logical color code, used by the palette-keyed mode
    pub codes: [u16; 256],
}

impl SlotColors {
    pub(crate) fn new(codes: &[u16], palette: &Palette) -> Self {
        let mut slot = SlotColors { pixels: [0; 256], codes: [0; 256] };
        for (pen, &code) in codes.iter().take(256).enumerate() {
            slot.codes[pen] = code;
            slot.pixels[pen] = palette.pen(code as u32);
        }
        slot
    }
}

/// Where the colors of a tile blit come from
#[derive(Clone, Copy)]
pub(crate) enum BlitColors<'a> {
    Palette(&'a SlotColors),
    Raw(u32),
}

/// Rectangle of source pixels to read, row by row
///
/// `origin` is the index of the leftmost byte of the first row to read. With a
/// negative `stride` the rows are read bottom-up.
#[derive(Clone, Copy, Debug)]
pub(crate) struct SourceBlock<'a> {
    pub data: &'a [u8],
    pub origin: usize,
    pub width: usize,
    pub height: usize,
    pub stride: isize,
}

impl<'a> SourceBlock<'a> {
    /// Source row `i`; `None` when it falls outside the data
    #[inline]
    pub(crate) fn row(&self, i: usize) -> Option<&'a [u8]> {
        let start = self.origin as isize + self.stride * i as isize;
        if start < 0 {
            return None;
        }
        let start = start as usize;
        self.data.get(start..start + self.width)
    }
}

/// A clipped tile blit: where to read, where to write, and read direction
#[derive(Clone, Copy, Debug)]
pub(crate) struct TileBlit<'a> {
    pub src: SourceBlock<'a>,
    pub dest_x: usize,
    pub dest_y: usize,
    pub flip_x: bool,
}

#[inline(always)]
fn for_each_pen<P>(dst: &mut [P], src: &[u8], rev: bool, mut f: impl FnMut(&mut P, u8)) {
    if rev {
        for (d, &s) in dst.iter_mut().zip(src.iter().rev()) {
            f(d, s);
        }
    } else {
        for (d, &s) in dst.iter_mut().zip(src) {
            f(d, s);
        }
    }
}

#[inline(always)]
fn for_each_pen_pri<P>(dst: &mut [P], pri: &mut [u8], src: &[u8], rev: bool, mut f: impl FnMut(&mut P, &mut u8, u8)) {
    if rev {
        for ((d, p), &s) in dst.iter_mut().zip(pri.iter_mut()).zip(src.iter().rev()) {
            f(d, p, s);
        }
    } else {
        for ((d, p), &s) in dst.iter_mut().zip(pri.iter_mut()).zip(src) {
            f(d, p, s);
        }
    }
}

/// Write `value` unless the priority byte under it is selected by `mask`; always mark covered
#[inline(always)]
fn put_pri<P: Pixel>(d: &mut P, p: &mut u8, value: u32, mask: u32) {
    if (1u32 << (*p & 31)) & mask == 0 {
        *d = P::from_pen(value);
    }
    *p = PRIORITY_COVERED;
}

pub(crate) fn opaque_row<P: Pixel, C: ColorMap>(dst: &mut [P], src: &[u8], rev: bool, colors: C) {
    for_each_pen(dst, src, rev, |d, s| *d = P::from_pen(colors.color(s)));
}

pub(crate) fn opaque_pri_row<P: Pixel, C: ColorMap>(
    dst: &mut [P],
    pri: &mut [u8],
    src: &[u8],
    rev: bool,
    colors: C,
    mask: u32,
) {
    for_each_pen_pri(dst, pri, src, rev, |d, p, s| put_pri(d, p, colors.color(s), mask));
}

/// Single transparent pen, four source pixels tested at a time
pub(crate) fn transpen_row<P: Pixel, C: ColorMap>(dst: &mut [P], src: &[u8], rev: bool, colors: C, pen: u32) {
    if pen > 0xff {
        opaque_row(dst, src, rev, colors);
        return;
    }
    let pen = pen as u8;
    let trans4 = [pen; 4];
    let width = dst.len().min(src.len());
    let (dst, src) = (&mut dst[..width], &src[..width]);

    let mut d4 = dst.chunks_exact_mut(4);
    if rev {
        let mut s4 = src.rchunks_exact(4);
        for (d, s) in (&mut d4).zip(&mut s4) {
            if s != trans4 {
                for i in 0..4 {
                    let c = s[3 - i];
                    if c != pen {
                        d[i] = P::from_pen(colors.color(c));
                    }
                }
            }
        }
        let tail = s4.remainder();
        for_each_pen(d4.into_remainder(), tail, true, |d, c| {
            if c != pen {
                *d = P::from_pen(colors.color(c));
            }
        });
    } else {
        let mut s4 = src.chunks_exact(4);
        for (d, s) in (&mut d4).zip(&mut s4) {
            if s != trans4 {
                for i in 0..4 {
                    if s[i] != pen {
                        d[i] = P::from_pen(colors.color(s[i]));
                    }
                }
            }
        }
        let tail = s4.remainder();
        for_each_pen(d4.into_remainder(), tail, false, |d, c| {
            if c != pen {
                *d = P::from_pen(colors.color(c));
            }
        });
    }
}

pub(crate) fn transpen_pri_row<P: Pixel, C: ColorMap>(
    dst: &mut [P],
    pri: &mut [u8],
    src: &[u8],
    rev: bool,
    colors: C,
    pen: u32,
    mask: u32,
) {
    for_each_pen_pri(dst, pri, src, rev, |d, p, s| {
        if s as u32 != pen {
            put_pri(d, p, colors.color(s), mask);
        }
    });
}

/// Pens whose bit is set in `trans_mask` are transparent
pub(crate) fn transmask_row<P: Pixel, C: ColorMap>(dst: &mut [P], src: &[u8], rev: bool, colors: C, trans_mask: u32) {
    for_each_pen(dst, src, rev, |d, s| {
        if s >= 32 || (1u32 << s) & trans_mask == 0 {
            *d = P::from_pen(colors.color(s));
        }
    });
}

pub(crate) fn transmask_pri_row<P: Pixel, C: ColorMap>(
    dst: &mut [P],
    pri: &mut [u8],
    src: &[u8],
    rev: bool,
    colors: C,
    trans_mask: u32,
    mask: u32,
) {
    for_each_pen_pri(dst, pri, src, rev, |d, p, s| {
        if s >= 32 || (1u32 << s) & trans_mask == 0 {
            put_pri(d, p, colors.color(s), mask);
        }
    });
}

/// Pens whose logical color code equals `code` are transparent
pub(crate) fn transcolor_row<P: Pixel>(dst: &mut [P], src: &[u8], rev: bool, slot: &SlotColors, code: u32) {
    for_each_pen(dst, src, rev, |d, s| {
        if slot.codes[s as usize] as u32 != code {
            *d = P::from_pen(slot.pixels[s as usize] as u32);
        }
    });
}

pub(crate) fn transcolor_pri_row<P: Pixel>(
    dst: &mut [P],
    pri: &mut [u8],
    src: &[u8],
    rev: bool,
    slot: &SlotColors,
    code: u32,
    mask: u32,
) {
    for_each_pen_pri(dst, pri, src, rev, |d, p, s| {
        if slot.codes[s as usize] as u32 != code {
            put_pri(d, p, slot.pixels[s as usize] as u32, mask);
        }
    });
}

/// Only destination pixels currently equal to `key` are overwritten
pub(crate) fn transthrough_row<P: Pixel, C: ColorMap>(dst: &mut [P], src: &[u8], rev: bool, colors: C, key: u32) {
    for_each_pen(dst, src, rev, |d, s| {
        if d.to_u32() == key {
            *d = P::from_pen(colors.color(s));
        }
    });
}

/// Per-pen dispatch through the palette's effect table
pub(crate) fn pen_table_row<P: Pixel, C: ColorMap>(
    dst: &mut [P],
    src: &[u8],
    rev: bool,
    colors: C,
    pen: u32,
    palette: &Palette,
) {
    for_each_pen(dst, src, rev, |d, s| {
        if s as u32 == pen {
            return;
        }
        match palette.effect(s) {
            PenEffect::Source => *d = P::from_pen(colors.color(s)),
            PenEffect::Shadow => *d = P::from_pen(palette.shadow(d.to_u32())),
            PenEffect::Transparent => {}
        }
    });
}

/// Per-pixel rules of a sprite draw
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct SpritePens {
    /// Skipped everywhere
    pub transparent: u8,

    /// Darkens the destination instead of drawing
    pub special: Option<u8>,
    pub shadow: Option<u8>,
    pub shadow_all: bool,

    /// Only destination pixels equal to this value are overwritten
    pub through: Option<u32>,
}

impl SpritePens {
    /// New destination value for `pen` drawn over `current`, `None` to leave it
    #[inline(always)]
    pub(crate) fn shade<C: ColorMap>(&self, pen: u8, current: u32, colors: C, palette: &Palette) -> Option<u32> {
        if pen == self.transparent {
            return None;
        }
        if self.shadow_all || self.special == Some(pen) || self.shadow == Some(pen) {
            return Some(palette.shadow(current));
        }
        if self.through.is_some_and(|key| key != current) {
            return None;
        }
        Some(colors.color(pen))
    }

    /// True for pens that hide whatever lies below them
    #[inline(always)]
    pub(crate) fn occludes(&self, pen: u8) -> bool {
        pen != self.transparent && self.special != Some(pen)
    }
}

/// Palette lookup of `base + pen`
#[derive(Clone, Copy)]
pub(crate) struct PaletteBase<'a>(pub &'a Palette, pub u32);

impl ColorMap for PaletteBase<'_> {
    #[inline(always)]
    fn color(&self, pen: u8) -> u32 {
        self.0.pen(self.1.wrapping_add(pen as u32)) as u32
    }
}

/// Sprite row; pixels whose `mask` byte is set belong to a sprite in front and are skipped
pub(crate) fn sprite_row<P: Pixel, C: ColorMap>(
    dst: &mut [P],
    mask: Option<&[u8]>,
    src: &[u8],
    rev: bool,
    colors: C,
    pens: &SpritePens,
    palette: &Palette,
) {
    let mut x = 0;
    for_each_pen(dst, src, rev, |d, s| {
        let covered = mask.is_some_and(|m| m.get(x).is_some_and(|&b| b != 0));
        x += 1;
        if covered {
            return;
        }
        if let Some(value) = pens.shade(s, d.to_u32(), colors, palette) {
            *d = P::from_pen(value);
        }
    });
}

/// Binary sprite row: `value` under every occluding pen
pub(crate) fn mask_row(dst: &mut [u8], src: &[u8], rev: bool, pens: &SpritePens, value: u8) {
    for_each_pen(dst, src, rev, |d, s| {
        if pens.occludes(s) {
            *d = value;
        }
    });
}

fn each_row<P: Pixel>(dest: &mut Bitmap<P>, blit: &TileBlit<'_>, mut f: impl FnMut(&mut [P], &[u8])) {
    let x0 = blit.dest_x;
    let x1 = x0 + blit.src.width;
    for i in 0..blit.src.height {
        if let Some(src) = blit.src.row(i) {
            let row = dest.row_mut(blit.dest_y + i);
            f(&mut row[x0..x1], src);
        }
    }
}

fn each_row_pri<P: Pixel>(
    dest: &mut Bitmap<P>,
    pri: &mut PriorityBitmap,
    blit: &TileBlit<'_>,
    mut f: impl FnMut(&mut [P], &mut [u8], &[u8]),
) {
    let x0 = blit.dest_x;
    let x1 = x0 + blit.src.width;
    for i in 0..blit.src.height {
        if let Some(src) = blit.src.row(i) {
            let row = dest.row_mut(blit.dest_y + i);
            let pri_row = pri.row_mut(blit.dest_y + i);
            f(&mut row[x0..x1], &mut pri_row[x0..x1], src);
        }
    }
}

/// Run one clipped tile blit in the requested mode
///
/// The caller has already clipped `blit` to both `dest` and the priority buffer.
pub(crate) fn blit_tile<P: Pixel>(
    dest: &mut Bitmap<P>,
    blit: &TileBlit<'_>,
    mode: Transparency,
    colors: BlitColors<'_>,
    palette: &Palette,
    priority: Option<(&mut PriorityBitmap, u32)>,
) -> Result<(), GfxError> {
    let rev = blit.flip_x;

    match (mode, colors, priority) {
        (Transparency::Opaque, BlitColors::Palette(slot), None) => {
            let c = Remapped(&slot.pixels);
            each_row(dest, blit, |d, s| opaque_row(d, s, rev, c));
        }
        (Transparency::Opaque, BlitColors::Palette(slot), Some((pri, mask))) => {
            let c = Remapped(&slot.pixels);
            let mask = mask | PRIORITY_COVERED_BIT;
            each_row_pri(dest, pri, blit, |d, p, s| opaque_pri_row(d, p, s, rev, c, mask));
        }
        (Transparency::Pen(pen), BlitColors::Palette(slot), None) => {
            let c = Remapped(&slot.pixels);
            each_row(dest, blit, |d, s| transpen_row(d, s, rev, c, pen));
        }
        (Transparency::Pen(pen), BlitColors::Palette(slot), Some((pri, mask))) => {
            let c = Remapped(&slot.pixels);
            let mask = mask | PRIORITY_COVERED_BIT;
            each_row_pri(dest, pri, blit, |d, p, s| transpen_pri_row(d, p, s, rev, c, pen, mask));
        }
        (Transparency::Pens(trans), BlitColors::Palette(slot), None) => {
            let c = Remapped(&slot.pixels);
            each_row(dest, blit, |d, s| transmask_row(d, s, rev, c, trans));
        }
        (Transparency::Pens(trans), BlitColors::Palette(slot), Some((pri, mask))) => {
            let c = Remapped(&slot.pixels);
            let mask = mask | PRIORITY_COVERED_BIT;
            each_row_pri(dest, pri, blit, |d, p, s| transmask_pri_row(d, p, s, rev, c, trans, mask));
        }
        (Transparency::Color(code), BlitColors::Palette(slot), None) => {
            each_row(dest, blit, |d, s| transcolor_row(d, s, rev, slot, code));
        }
        (Transparency::Color(code), BlitColors::Palette(slot), Some((pri, mask))) => {
            let mask = mask | PRIORITY_COVERED_BIT;
            each_row_pri(dest, pri, blit, |d, p, s| transcolor_pri_row(d, p, s, rev, slot, code, mask));
        }
        (Transparency::Through(key), BlitColors::Palette(slot), None) => {
            let c = Remapped(&slot.pixels);
            each_row(dest, blit, |d, s| transthrough_row(d, s, rev, c, key));
        }
        (Transparency::PenTable(pen), BlitColors::Palette(slot), None) => {
            let c = Remapped(&slot.pixels);
            each_row(dest, blit, |d, s| pen_table_row(d, s, rev, c, pen, palette));
        }
        (Transparency::OpaqueRaw, BlitColors::Raw(base), None) => {
            let c = RawBase(base);
            each_row(dest, blit, |d, s| opaque_row(d, s, rev, c));
        }
        (Transparency::PenRaw(pen), BlitColors::Raw(base), None) => {
            let c = RawBase(base);
            each_row(dest, blit, |d, s| transpen_row(d, s, rev, c, pen));
        }
        (Transparency::PensRaw(trans), BlitColors::Raw(base), None) => {
            let c = RawBase(base);
            each_row(dest, blit, |d, s| transmask_row(d, s, rev, c, trans));
        }
        (Transparency::ThroughRaw(key), BlitColors::Raw(base), None) => {
            let c = RawBase(base);
            each_row(dest, blit, |d, s| transthrough_row(d, s, rev, c, key));
        }
        (Transparency::PenTableRaw(pen), BlitColors::Raw(base), None) => {
            let c = RawBase(base);
            each_row(dest, blit, |d, s| pen_table_row(d, s, rev, c, pen, palette));
        }
        (mode, _, Some(_)) => return Err(GfxError::UnsupportedPriorityMode("draw_tile", mode)),
        (mode, _, None) => return Err(GfxError::UnsupportedMode("draw_tile", mode)),
    }
    Ok(())
}
