use pretty_assertions::assert_eq;

use rusty_gfx::{ClipRect, Orientation, Palette, RenderContext, Surface, TileAtlas, TileLayout, TileParams, Transparency};

/// Single tile atlas with one palette slot mapping pen n to code n
fn single_tile(width: usize, height: usize, pen: impl Fn(usize, usize) -> u8) -> TileAtlas {
    let mut data = Vec::with_capacity(width * height);
    for y in 0..height {
        for x in 0..width {
            data.push(pen(x, y));
        }
    }
    TileAtlas::new(TileLayout::packed(width, height, 1, 32, 1), data, (0..32).collect()).unwrap()
}

fn pixels(surface: &Surface) -> Vec<u32> {
    let mut out = Vec::with_capacity(surface.width() * surface.height());
    for y in 0..surface.height() as i32 {
        for x in 0..surface.width() as i32 {
            out.push(surface.get(x, y).unwrap());
        }
    }
    out
}

#[test]
fn test_fill_is_idempotent() {
    let palette = Palette::identity(256);
    let ctx = RenderContext::new(&palette);
    let clip = ClipRect::new(3, 40, 7, 19);

    for depth in [8, 16] {
        let mut once = Surface::new(48, 32, depth);
        ctx.fill_rect(&mut once, 0x2a, Some(&clip));
        let mut twice = once.clone();
        ctx.fill_rect(&mut twice, 0x2a, Some(&clip));
        assert_eq!(twice, once);
    }
}

#[test]
fn test_keyed_transparency_on_opaque_tile() {
    let palette = Palette::identity(256);
    let ctx = RenderContext::new(&palette);
    let atlas = single_tile(16, 16, |_, _| 3);
    let mut surface = Surface::new(64, 64, 8);
    ctx.fill_rect(&mut surface, 7, None);

    ctx.draw_tile(&mut surface, &atlas, &TileParams::new(0, 0, 10, 10), None, Transparency::Pen(5));

    for y in 0..64 {
        for x in 0..64 {
            let inside = (10..=25).contains(&x) && (10..=25).contains(&y);
            let expected = if inside { 3 } else { 7 };
            assert_eq!(surface.get(x, y), Some(expected), "pixel ({}, {})", x, y);
        }
    }
}

#[test]
fn test_keyed_transparency_keeps_destination_under_key() {
    let palette = Palette::identity(256);
    let ctx = RenderContext::new(&palette);
    // key pen 5 on a diagonal, pen 9 elsewhere
    let atlas = single_tile(8, 8, |x, y| if x == y { 5 } else { 9 });

    for depth in [8, 16] {
        let mut surface = Surface::new(16, 16, depth);
        ctx.fill_rect(&mut surface, 1, None);
        ctx.draw_tile(&mut surface, &atlas, &TileParams::new(0, 0, 4, 4), None, Transparency::Pen(5));
        for y in 0..8 {
            for x in 0..8 {
                let expected = if x == y { 1 } else { 9 };
                assert_eq!(surface.get(4 + x, 4 + y), Some(expected));
            }
        }
    }
}

#[test]
fn test_flip_x_of_symmetric_tile_is_identical() {
    let palette = Palette::identity(256);
    let ctx = RenderContext::new(&palette);
    // each row is a palindrome
    let atlas = single_tile(8, 8, |x, y| (x.min(7 - x) + y) as u8);

    let mut plain = Surface::new(16, 16, 8);
    let mut flipped = Surface::new(16, 16, 8);
    ctx.draw_tile(&mut plain, &atlas, &TileParams::new(0, 0, 3, 5), None, Transparency::Opaque);
    ctx.draw_tile(&mut flipped, &atlas, &TileParams::new(0, 0, 3, 5).flipped(true, false), None, Transparency::Opaque);
    assert_eq!(pixels(&flipped), pixels(&plain));
}

#[test]
fn test_flip_mirrors_read_pattern() {
    let palette = Palette::identity(256);
    let ctx = RenderContext::new(&palette);
    let atlas = single_tile(8, 4, |x, y| (y * 8 + x) as u8);

    let mut plain = Surface::new(8, 4, 8);
    let mut flipped = Surface::new(8, 4, 8);
    ctx.draw_tile(&mut plain, &atlas, &TileParams::default(), None, Transparency::Opaque);
    ctx.draw_tile(&mut flipped, &atlas, &TileParams::default().flipped(true, true), None, Transparency::Opaque);
    for y in 0..4 {
        for x in 0..8 {
            assert_eq!(flipped.get(x, y), plain.get(7 - x, 3 - y));
        }
    }
}

#[test]
fn test_every_orientation_shows_the_same_logical_picture() {
    let palette = Palette::identity(256);
    let atlas = single_tile(7, 4, |x, y| (y * 7 + x + 1) as u8);
    let (width, height) = (24, 16);

    let draw = |orientation: Orientation| {
        let ctx = RenderContext::new(&palette).with_orientation(orientation);
        let mut surface = if orientation.swap_xy {
            Surface::new(height, width, 8)
        } else {
            Surface::new(width, height, 8)
        };
        ctx.fill_rect(&mut surface, 0x40, Some(&ClipRect::new(2, 9, 1, 12)));
        ctx.draw_tile(&mut surface, &atlas, &TileParams::new(0, 0, 5, 3).flipped(true, false), None, Transparency::Pen(0));
        ctx.plot_pixel(&mut surface, 20, 14, 0x50);

        let mut logical = Vec::new();
        for y in 0..height as i32 {
            for x in 0..width as i32 {
                logical.push(ctx.read_pixel(&surface, x, y).unwrap());
            }
        }
        logical
    };

    let reference = draw(Orientation::ROT0);
    for bits in 1..8 {
        assert_eq!(draw(Orientation::from_bits(bits)), reference, "orientation bits {:#x}", bits);
    }
}

#[test]
fn test_half_zoom_footprint() {
    let palette = Palette::identity(256);
    let ctx = RenderContext::new(&palette);
    let atlas = single_tile(32, 32, |x, y| ((x + y) % 7 + 1) as u8);
    let mut surface = Surface::new(64, 64, 8);

    ctx.draw_tile_zoomed(&mut surface, &atlas, &TileParams::new(0, 0, 8, 8), None, Transparency::Pen(0), 0x8000, 0x8000);

    let mut written = 0;
    for y in 0..64 {
        for x in 0..64 {
            if surface.get(x, y) != Some(0) {
                assert!((8..24).contains(&x) && (8..24).contains(&y), "pixel ({}, {}) outside footprint", x, y);
                written += 1;
            }
        }
    }
    assert_eq!(written, 16 * 16);
}

#[test]
fn test_unit_zoom_matches_plain_draw() {
    let palette = Palette::identity(256);
    let ctx = RenderContext::new(&palette).with_orientation(Orientation::ROT90);
    let atlas = single_tile(32, 32, |x, y| ((x * 3 + y) % 5) as u8);
    let tile = TileParams::new(0, 0, 6, 2).flipped(false, true);

    let mut plain = Surface::new(48, 48, 16);
    let mut zoomed = Surface::new(48, 48, 16);
    ctx.draw_tile(&mut plain, &atlas, &tile, None, Transparency::Pen(0));
    ctx.draw_tile_zoomed(&mut zoomed, &atlas, &tile, None, Transparency::Pen(0), 0x10000, 0x10000);
    assert_eq!(zoomed, plain);
}

#[test]
fn test_scrolling_copy_wraps_the_plane() {
    let palette = Palette::identity(256);
    let ctx = RenderContext::new(&palette);
    let atlas = single_tile(8, 8, |x, _| x as u8 + 1);
    let mut layer = Surface::new(8, 8, 8);
    ctx.draw_tile(&mut layer, &atlas, &TileParams::default(), None, Transparency::Opaque);

    let mut screen = Surface::new(8, 8, 8);
    ctx.copy_scrolling_surface(&mut screen, &layer, &[3], &[0], None, Transparency::Opaque);
    let row: Vec<u32> = (0..8).map(|x| screen.get(x, 0).unwrap()).collect();
    assert_eq!(row, vec![6, 7, 8, 1, 2, 3, 4, 5]);
}

/// 4x4 surface where pixel (x, y) holds y * 4 + x + 1
fn numbered(ctx: &RenderContext<'_>) -> Surface {
    let mut surface = Surface::new(4, 4, 8);
    for y in 0..4 {
        for x in 0..4 {
            ctx.plot_pixel(&mut surface, x, y, (y * 4 + x + 1) as u32);
        }
    }
    surface
}

fn rows(surface: &Surface) -> Vec<Vec<u32>> {
    (0..surface.height() as i32)
        .map(|y| (0..surface.width() as i32).map(|x| surface.get(x, y).unwrap()).collect())
        .collect()
}

#[test]
fn test_column_bands_scroll_independently() {
    let palette = Palette::identity(256);
    let ctx = RenderContext::new(&palette);
    let layer = numbered(&ctx);
    let mut screen = Surface::new(4, 4, 8);

    // left band moves down by one, right band stays
    ctx.copy_scrolling_surface(&mut screen, &layer, &[], &[1, 0], None, Transparency::Opaque);
    assert_eq!(
        rows(&screen),
        vec![vec![13, 14, 3, 4], vec![1, 2, 7, 8], vec![5, 6, 11, 12], vec![9, 10, 15, 16]]
    );
}

#[test]
fn test_row_bands_follow_a_single_vertical_scroll() {
    let palette = Palette::identity(256);
    let ctx = RenderContext::new(&palette);
    let layer = numbered(&ctx);
    let mut screen = Surface::new(4, 4, 8);

    // top band of the layer moves right by one, the whole layer moves down by one
    ctx.copy_scrolling_surface(&mut screen, &layer, &[1, 0], &[1], None, Transparency::Opaque);
    assert_eq!(
        rows(&screen),
        vec![vec![13, 14, 15, 16], vec![4, 1, 2, 3], vec![8, 5, 6, 7], vec![9, 10, 11, 12]]
    );
}

#[test]
fn test_column_bands_follow_a_single_horizontal_scroll() {
    let palette = Palette::identity(256);
    let ctx = RenderContext::new(&palette);
    let layer = numbered(&ctx);
    let mut screen = Surface::new(4, 4, 8);

    // left band of the layer moves down by one, the whole layer moves right by one
    ctx.copy_scrolling_surface(&mut screen, &layer, &[1], &[1, 0], None, Transparency::Opaque);
    assert_eq!(
        rows(&screen),
        vec![vec![4, 13, 14, 3], vec![8, 1, 2, 7], vec![12, 5, 6, 11], vec![16, 9, 10, 15]]
    );
}

#[test]
fn test_zoomed_draw_on_direct_color_surface() {
    let palette = Palette::identity(1024);
    let ctx = RenderContext::new(&palette).with_orientation(Orientation::ROT270);
    // pen = column + 1, four colors per slot
    let atlas = TileAtlas::new(
        TileLayout::packed(4, 4, 1, 8, 64),
        (0..16).map(|i| (i % 4) as u8 + 1).collect(),
        (0..512).collect(),
    )
    .unwrap();
    // 24x16 logical screen on a rotated 16x24 surface
    let mut surface = Surface::new(16, 24, 16);

    ctx.draw_tile_zoomed(&mut surface, &atlas, &TileParams::new(0, 40, 2, 3), None, Transparency::Pen(0), 0x20000, 0x18000);

    // 8x6 logical footprint, each source column two pixels wide
    for y in 0..16 {
        for x in 0..24 {
            let value = ctx.read_pixel(&surface, x, y).unwrap();
            let inside = (2..10).contains(&x) && (3..9).contains(&y);
            let expected = if inside { 40 * 8 + ((x - 2) / 2) as u32 + 1 } else { 0 };
            assert_eq!(value, expected, "logical pixel ({}, {})", x, y);
        }
    }
}
