//! Rotate / zoom surface copy
//!
//! Affine sampling of a same-depth surface: each destination pixel reads the
//! source at a 16.16 position advanced by the column increment `(inc_xx, inc_xy)`
//! along a row and by the row increment `(inc_yx, inc_yy)` between rows.

use serde::{Deserialize, Serialize};

use super::{RenderContext, Transparency};
use crate::error::GfxError;
use crate::geometry::ClipRect;
use crate::surface::{Bitmap, Pixel, PriorityBitmap};
use crate::util::FIXED_ONE;

/// Start position and increment vectors of a rotate/zoom copy, all 16.16
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RozParams {
    /// Source position sampled by logical destination pixel (0, 0)
    pub start_x: i32,
    pub start_y: i32,

    /// Source step per destination column
    pub inc_xx: i32,
    pub inc_xy: i32,

    /// Source step per destination row
    pub inc_yx: i32,
    pub inc_yy: i32,

    /// Sample outside the source wraps around instead of being skipped
    pub wraparound: bool,
}

impl RozParams {
    /// Plain zoom about the origin
    pub fn zoom(start_x: i32, start_y: i32, scale_x: i32, scale_y: i32) -> Self {
        RozParams {
            start_x,
            start_y,
            inc_xx: scale_x,
            inc_yy: scale_y,
            ..Default::default()
        }
    }
}

/// Map a source coordinate back inside `[0, extent)` when wrapping
#[inline]
fn wrap(coord: i64, extent: i64) -> i64 {
    if extent & (extent - 1) == 0 {
        coord & (extent - 1)
    } else {
        coord.rem_euclid(extent)
    }
}

#[inline(always)]
fn put<P: Pixel>(d: &mut P, p: Option<&mut u8>, value: P, key: Option<u32>, priority: u8) {
    if key == Some(value.to_u32()) {
        return;
    }
    *d = value;
    if let Some(p) = p {
        *p |= priority;
    }
}

pub(crate) fn copy_roz<P: Pixel>(
    ctx: &RenderContext<'_>,
    dest: &mut Bitmap<P>,
    src: &Bitmap<P>,
    params: &RozParams,
    clip: Option<&ClipRect>,
    mode: Transparency,
    mut priority: Option<(&mut PriorityBitmap, u8)>,
) -> Result<(), GfxError> {
    // Transparent key, compared against raw source pixels
    let key = match mode {
        Transparency::Opaque => None,
        Transparency::Pen(pen) => Some(pen),
        Transparency::Color(code) => Some(ctx.palette.pen(code) as u32),
        mode => return Err(GfxError::UnsupportedMode("copy_rotated_zoomed_surface", mode)),
    };

    let (src_w, src_h) = (src.width() as i64, src.height() as i64);
    if src_w == 0 || src_h == 0 {
        return Ok(());
    }
    let (width_shifted, height_shifted) = (src_w << 16, src_h << 16);
    let (dest_w, dest_h) = (dest.width() as i32, dest.height() as i32);

    // Advance the start position to the top-left corner of the clip
    let logical = ctx.logical_clip(clip, dest.width(), dest.height());
    let (mut inc_xx, mut inc_xy) = (params.inc_xx as i64, params.inc_xy as i64);
    let (mut inc_yx, mut inc_yy) = (params.inc_yx as i64, params.inc_yy as i64);
    let mut start_x = params.start_x as i64 + logical.min_x as i64 * inc_xx + logical.min_y as i64 * inc_yx;
    let mut start_y = params.start_y as i64 + logical.min_x as i64 * inc_xy + logical.min_y as i64 * inc_yy;
    let (mut sx, mut sy, mut ex, mut ey) = (logical.min_x, logical.min_y, logical.max_x, logical.max_y);

    // Map the walk onto the physical surface
    let orientation = ctx.orientation;
    if orientation.swap_xy {
        std::mem::swap(&mut start_x, &mut start_y);
        std::mem::swap(&mut sx, &mut sy);
        std::mem::swap(&mut ex, &mut ey);
        std::mem::swap(&mut inc_xx, &mut inc_yy);
        std::mem::swap(&mut inc_xy, &mut inc_yx);
    }
    if orientation.flip_x {
        let w = (ex - sx) as i64;
        inc_xy = -inc_xy;
        inc_yx = -inc_yx;
        start_x = width_shifted - start_x - 1;
        start_x -= inc_xx * w;
        start_y -= inc_xy * w;
        (sx, ex) = (dest_w - 1 - ex, dest_w - 1 - sx);
    }
    if orientation.flip_y {
        let h = (ey - sy) as i64;
        inc_xy = -inc_xy;
        inc_yx = -inc_yx;
        start_y = height_shifted - start_y - 1;
        start_x -= inc_yx * h;
        start_y -= inc_yy * h;
        (sy, ey) = (dest_h - 1 - ey, dest_h - 1 - sy);
    }

    // keep the walk on the destination
    if sx < 0 {
        start_x -= inc_xx * sx as i64;
        start_y -= inc_xy * sx as i64;
        sx = 0;
    }
    if sy < 0 {
        start_x -= inc_yx * sy as i64;
        start_y -= inc_yy * sy as i64;
        sy = 0;
    }
    if let Some((pri, _)) = &priority {
        ex = ex.min(pri.width() as i32 - 1);
        ey = ey.min(pri.height() as i32 - 1);
    }
    ex = ex.min(dest_w - 1);
    ey = ey.min(dest_h - 1);
    if sx > ex || sy > ey {
        return Ok(());
    }

    let (x0, x1) = (sx as usize, ex as usize + 1);
    let axis_aligned = inc_xy == 0 && inc_yx == 0 && !params.wraparound;

    for y in sy..=ey {
        let drow = &mut dest.row_mut(y as usize)[x0..x1];
        let (mut prow, pvalue) = match &mut priority {
            Some((pri, value)) => (Some(&mut pri.row_mut(y as usize)[x0..x1]), *value),
            None => (None, 0),
        };

        // Axis aligned rows read a single source row
        if axis_aligned {
            if (0..height_shifted).contains(&start_y) {
                let srow = src.row((start_y >> 16) as usize);
                if inc_xx == FIXED_ONE as i64 {
                    // unscaled: consecutive source pixels
                    let first = start_x >> 16;
                    let skip = (-first).max(0) as usize;
                    let from = (first + skip as i64) as usize;
                    if skip < drow.len() && from < srow.len() {
                        let pairs = drow[skip..].iter_mut().zip(&srow[from..]).enumerate();
                        for (i, (d, &s)) in pairs {
                            let p = prow.as_deref_mut().map(|row| &mut row[skip + i]);
                            put(d, p, s, key, pvalue);
                        }
                    }
                } else {
                    let mut cx = start_x;
                    for (i, d) in drow.iter_mut().enumerate() {
                        if (0..width_shifted).contains(&cx) {
                            let p = prow.as_deref_mut().map(|row| &mut row[i]);
                            put(d, p, srow[(cx >> 16) as usize], key, pvalue);
                        }
                        cx += inc_xx;
                    }
                }
            }
        } else {
            // General case: step both source coordinates per pixel
            let (mut cx, mut cy) = (start_x, start_y);
            for (i, d) in drow.iter_mut().enumerate() {
                let sample = if params.wraparound {
                    let ix = wrap(cx >> 16, src_w);
                    let iy = wrap(cy >> 16, src_h);
                    Some(src.row(iy as usize)[ix as usize])
                } else if (0..width_shifted).contains(&cx) && (0..height_shifted).contains(&cy) {
                    Some(src.row((cy >> 16) as usize)[(cx >> 16) as usize])
                } else {
                    None
                };
                if let Some(s) = sample {
                    let p = prow.as_deref_mut().map(|row| &mut row[i]);
                    put(d, p, s, key, pvalue);
                }
                cx += inc_xx;
                cy += inc_xy;
            }
        }

        start_x += inc_yx;
        start_y += inc_yy;
    }
    Ok(())
}
