//! Whole-surface copies
//!
//! The source is a surface the game already drew in physical orientation, so
//! orientation only moves the copy around: unlike tile draws the flip flags are
//! not toggled.

use log::trace;

use super::{RenderContext, Transparency};
use crate::error::GfxError;
use crate::geometry::ClipRect;
use crate::palette::Palette;
use crate::surface::{Bitmap, Pixel};
use crate::util::wrap_scroll;

/// Logical position and flip of a surface copy
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct CopyPlacement {
    pub flip_x: bool,
    pub flip_y: bool,
    pub x: i32,
    pub y: i32,
}

#[inline(always)]
fn each_pixel<P: Copy>(dst: &mut [P], src: &[P], rev: bool, mut f: impl FnMut(&mut P, P)) {
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

fn copy_row<P: Pixel>(
    dst: &mut [P],
    src: &[P],
    rev: bool,
    mode: Transparency,
    palette: &Palette,
) -> Result<(), GfxError> {
    match mode {
        Transparency::Opaque => each_pixel(dst, src, rev, |d, s| *d = P::from_pen(palette.pen(s.to_u32()) as u32)),
        Transparency::OpaqueRaw if !rev => dst.copy_from_slice(src),
        Transparency::OpaqueRaw => each_pixel(dst, src, rev, |d, s| *d = s),
        Transparency::PenRaw(key) => each_pixel(dst, src, rev, |d, s| {
            if s.to_u32() != key {
                *d = s;
            }
        }),
        Transparency::ThroughRaw(key) => each_pixel(dst, src, rev, |d, s| {
            if d.to_u32() == key {
                *d = s;
            }
        }),
        Transparency::Blend(shift) => each_pixel(dst, src, rev, |d, s| {
            let index = d.to_u32() | s.to_u32().checked_shl(shift).unwrap_or(0);
            *d = P::from_pen(palette.pen(index) as u32);
        }),
        Transparency::BlendRaw(shift) => each_pixel(dst, src, rev, |d, s| {
            *d = P::from_pen(d.to_u32() | s.to_u32().checked_shl(shift).unwrap_or(0));
        }),
        mode => return Err(GfxError::UnsupportedMode("copy_surface", mode)),
    }
    Ok(())
}

/// Copy `src` to `dest` at a logical position, clipped to the logical clip
pub(crate) fn copy_bitmap<P: Pixel>(
    ctx: &RenderContext<'_>,
    dest: &mut Bitmap<P>,
    src: &Bitmap<P>,
    placement: CopyPlacement,
    clip: Option<&ClipRect>,
    mode: Transparency,
) -> Result<(), GfxError> {
    let clip = ctx.physical_clip(clip, dest.width(), dest.height());
    copy_physical(ctx, dest, src, placement, &clip, mode)
}

/// Same as [`copy_bitmap`] but with the clip already in physical coordinates
fn copy_physical<P: Pixel>(
    ctx: &RenderContext<'_>,
    dest: &mut Bitmap<P>,
    src: &Bitmap<P>,
    placement: CopyPlacement,
    clip: &ClipRect,
    mode: Transparency,
) -> Result<(), GfxError> {
    let orientation = ctx.orientation;
    let CopyPlacement { mut flip_x, mut flip_y, mut x, mut y } = placement;
    if orientation.swap_xy {
        std::mem::swap(&mut x, &mut y);
        std::mem::swap(&mut flip_x, &mut flip_y);
    }
    let (sw, sh) = (src.width() as i32, src.height() as i32);
    if orientation.flip_x {
        x = dest.width() as i32 - sw - x;
    }
    if orientation.flip_y {
        y = dest.height() as i32 - sh - y;
    }

    let sx = x.max(clip.min_x);
    let ex = (x + sw - 1).min(clip.max_x);
    let sy = y.max(clip.min_y);
    let ey = (y + sh - 1).min(clip.max_y);
    if sx > ex || sy > ey {
        return Ok(());
    }

    let col = (if flip_x { sw - 1 - (ex - x) } else { sx - x }) as usize;
    let width = (ex - sx + 1) as usize;
    let (x0, x1) = (sx as usize, sx as usize + width);
    for (i, dy) in (sy..=ey).enumerate() {
        let row = (if flip_y { sh - 1 - (sy - y) - i as i32 } else { sy - y + i as i32 }) as usize;
        let src_row = &src.row(row)[col..col + width];
        let dst_row = &mut dest.row_mut(dy as usize)[x0..x1];
        copy_row(dst_row, src_row, flip_x, mode, ctx.palette)?;
    }
    Ok(())
}

/// One band copy: logical clip band, limited to the physical surface
fn copy_band<P: Pixel>(
    ctx: &RenderContext<'_>,
    dest: &mut Bitmap<P>,
    src: &Bitmap<P>,
    (x, y): (i32, i32),
    band: &ClipRect,
    mode: Transparency,
) -> Result<(), GfxError> {
    if band.is_empty() {
        return Ok(());
    }
    let (w, h) = (dest.width(), dest.height());
    let clip = ctx
        .orientation
        .transform_clip(band, w as i32, h as i32)
        .intersect(&ClipRect::full(w, h));
    let placement = CopyPlacement { x, y, ..Default::default() };
    copy_physical(ctx, dest, src, placement, &clip, mode)
}

/// Runs of consecutive equal scroll values: (first band, band count, scroll)
fn scroll_runs(scroll: &[i32]) -> Vec<(usize, usize, i32)> {
    let mut runs = Vec::new();
    let mut i = 0;
    while i < scroll.len() {
        let value = scroll[i];
        let mut count = 1;
        while i + count < scroll.len() && scroll[i + count] == value {
            count += 1;
        }
        runs.push((i, count, value));
        i += count;
    }
    runs
}

/// Copy with row bands scrolling horizontally and/or column bands scrolling vertically
pub(crate) fn copy_scrolling<P: Pixel>(
    ctx: &RenderContext<'_>,
    dest: &mut Bitmap<P>,
    src: &Bitmap<P>,
    row_scroll: &[i32],
    col_scroll: &[i32],
    clip: Option<&ClipRect>,
    mode: Transparency,
) -> Result<(), GfxError> {
    let clip = ctx.logical_clip(clip, dest.width(), dest.height());
    let (rows, cols) = (row_scroll.len(), col_scroll.len());

    // No scroll values: plain copy
    if rows == 0 && cols == 0 {
        return copy_band(ctx, dest, src, (0, 0), &clip, mode);
    }

    // Scroll values wrap around the logical size of the source plane
    let (src_w, src_h) = ctx.logical_size(src.width(), src.height());
    let (src_w, src_h) = (src_w as i32, src_h as i32);
    let (dest_w, dest_h) = ctx.logical_size(dest.width(), dest.height());
    let (dest_w, dest_h) = (dest_w as i32, dest_h as i32);
    if src_w == 0 || src_h == 0 {
        return Ok(());
    }

    if rows == 0 {
        // scrolling columns
        let col_width = src_w / cols as i32;
        for (col, count, scroll) in scroll_runs(col_scroll) {
            let scroll = wrap_scroll(scroll, src_h);
            let band = ClipRect {
                min_x: (col as i32 * col_width).max(clip.min_x),
                max_x: ((col + count) as i32 * col_width - 1).min(clip.max_x),
                ..clip
            };
            // the band shows the plane once at its scroll and once wrapped above it
            copy_band(ctx, dest, src, (0, scroll), &band, mode)?;
            copy_band(ctx, dest, src, (0, scroll - src_h), &band, mode)?;
        }
    } else if cols == 0 {
        // scrolling rows
        let row_height = src_h / rows as i32;
        for (row, count, scroll) in scroll_runs(row_scroll) {
            let scroll = wrap_scroll(scroll, src_w);
            let band = ClipRect {
                min_y: (row as i32 * row_height).max(clip.min_y),
                max_y: ((row + count) as i32 * row_height - 1).min(clip.max_y),
                ..clip
            };
            copy_band(ctx, dest, src, (scroll, 0), &band, mode)?;
            copy_band(ctx, dest, src, (scroll - src_w, 0), &band, mode)?;
        }
    } else if rows == 1 && cols == 1 {
        // whole plane scrolls in both directions
        let scroll_x = wrap_scroll(row_scroll[0], src_w);
        let scroll_y = wrap_scroll(col_scroll[0], src_h);
        let mut sx = scroll_x - src_w;
        while sx < dest_w {
            let mut sy = scroll_y - src_h;
            while sy < dest_h {
                copy_band(ctx, dest, src, (sx, sy), &clip, mode)?;
                sy += src_h;
            }
            sx += src_w;
        }
    } else if rows == 1 {
        // scrolling columns plus one horizontal scroll
        let scroll_x = wrap_scroll(row_scroll[0], src_w);
        let col_width = src_w / cols as i32;
        for (col, count, scroll) in scroll_runs(col_scroll) {
            let scroll = wrap_scroll(scroll, src_h);
            for offset in [scroll_x, scroll_x - src_w] {
                let band = ClipRect {
                    min_x: (col as i32 * col_width + offset).max(clip.min_x),
                    max_x: ((col + count) as i32 * col_width - 1 + offset).min(clip.max_x),
                    ..clip
                };
                copy_band(ctx, dest, src, (offset, scroll), &band, mode)?;
                copy_band(ctx, dest, src, (offset, scroll - src_h), &band, mode)?;
            }
        }
    } else if cols == 1 {
        // scrolling rows plus one vertical scroll
        let scroll_y = wrap_scroll(col_scroll[0], src_h);
        let row_height = src_h / rows as i32;
        for (row, count, scroll) in scroll_runs(row_scroll) {
            let scroll = wrap_scroll(scroll, src_w);
            for offset in [scroll_y, scroll_y - src_h] {
                let band = ClipRect {
                    min_y: (row as i32 * row_height + offset).max(clip.min_y),
                    max_y: ((row + count) as i32 * row_height - 1 + offset).min(clip.max_y),
                    ..clip
                };
                copy_band(ctx, dest, src, (scroll, offset), &band, mode)?;
                copy_band(ctx, dest, src, (scroll - src_w, offset), &band, mode)?;
            }
        }
    } else {
        trace!("{} row bands and {} column bands cannot scroll together", rows, cols);
    }
    Ok(())
}
