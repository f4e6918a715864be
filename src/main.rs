//! rustyGFX demo
//!
//! Renders a small synthetic scene through the drawing core: a scrolling tile
//! layer, pulsing zoomed tiles and two priority buckets of moving sprites. The
//! last frame is written out as a PNG so orientation and bit depth handling can
//! be checked by eye.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::{debug, info};

use rusty_gfx::sprite::flags;
use rusty_gfx::{
    Orientation, Palette, RenderContext, Sprite, SpriteKind, SpriteListConfig, SpriteListHandle, SpriteManager,
    Surface, TileAtlas, TileLayout, TileParams, Transparency,
};

/// Logical screen size
const SCREEN_WIDTH: usize = 256;
const SCREEN_HEIGHT: usize = 224;

/// Scrolling layer size, in pixels
const LAYER_SIZE: usize = 256;

const TILE_SIZE: usize = 8;
const SPRITE_SIZE: i32 = 16;
const SPRITE_COUNT: usize = 12;

/// Palette code of the backdrop color
const BACKDROP: u32 = 0x13;

/// Command line arguments for the demo
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Where to write the final frame
    #[clap(name = "OUTPUT", default_value = "frame.png")]
    output: PathBuf,

    /// Cabinet rotation in degrees (0, 90, 180 or 270)
    #[clap(short, long, default_value = "0")]
    rotation: u16,

    /// Mirror the screen horizontally
    #[clap(long)]
    mirror: bool,

    /// Surface bit depth (8 or 16)
    #[clap(long, default_value = "8")]
    depth: u8,

    /// Number of frames to run
    #[clap(short, long, default_value = "60")]
    frames: u32,

    /// Enable debug logging
    #[clap(short, long)]
    debug: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.debug {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    }

    let mut orientation = match args.rotation {
        0 => Orientation::ROT0,
        90 => Orientation::ROT90,
        180 => Orientation::ROT180,
        270 => Orientation::ROT270,
        other => bail!("Unsupported rotation {}, expected 0, 90, 180 or 270", other),
    };
    if args.mirror {
        orientation.flip_x = !orientation.flip_x;
    }
    if args.depth != 8 && args.depth != 16 {
        bail!("Unsupported bit depth {}, expected 8 or 16", args.depth);
    }

    info!(
        "rustyGFX demo: {} frames, {}-bit, orientation {:?}",
        args.frames, args.depth, orientation
    );

    let palette = build_palette(args.depth);
    let ctx = RenderContext::new(&palette).with_orientation(orientation);
    let atlas = build_atlas().context("Failed to build the demo tile atlas")?;

    let (width, height) = if orientation.swap_xy {
        (SCREEN_HEIGHT, SCREEN_WIDTH)
    } else {
        (SCREEN_WIDTH, SCREEN_HEIGHT)
    };
    let mut screen = Surface::new(width, height, args.depth);
    let layer = build_layer(&ctx, &atlas, args.depth);

    let mut sprites = SpriteManager::new();
    let list = sprites.create_list(SPRITE_COUNT, SpriteListConfig::new(SpriteKind::Unpack));
    if let Some(list) = sprites.list_mut(list) {
        list.set_pen_data(Arc::from(sprite_pens()));
    }

    for frame in 0..args.frames {
        move_sprites(&mut sprites, list, frame);
        sprites.update(&ctx, &screen);
        render_frame(&ctx, &mut screen, &layer, &atlas, &sprites, list, frame);
        debug!("frame {} rendered, mask arena {} bytes", frame, sprites.mask_capacity());
    }

    write_png(&screen, &palette, &args.output)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;
    info!("Wrote {}", args.output.display());

    sprites.destroy_all();
    Ok(())
}

/// Draw one frame: backdrop, scrolling layer, sprite bucket 0, zoomed tiles, sprite bucket 1
fn render_frame(
    ctx: &RenderContext<'_>,
    screen: &mut Surface,
    layer: &Surface,
    atlas: &TileAtlas,
    sprites: &SpriteManager,
    list: SpriteListHandle,
    frame: u32,
) {
    ctx.fill_rect(screen, ctx.palette.pen(BACKDROP) as u32, None);

    // gentle wave, one offset per 8 pixel row band
    let bands = LAYER_SIZE / TILE_SIZE;
    let row_scroll: Vec<i32> = (0..bands)
        .map(|band| frame as i32 * 2 + [0, 1, 2, 3, 4, 3, 2, 1][band % 8] * 3)
        .collect();
    ctx.copy_scrolling_surface(screen, layer, &row_scroll, &[], None, Transparency::Pen(0));

    sprites.render(list, 0, ctx, screen, None);

    let phase = (frame % 32) as i32;
    let pulse = if phase < 16 { phase } else { 32 - phase };
    let scale = 0x8000 + pulse * 0x1800;
    for i in 0..4 {
        let tile = TileParams::new(1, 4 + i as u32, 24 + i * 56, 96);
        ctx.draw_tile_zoomed(screen, atlas, &tile, None, Transparency::Pen(0), scale, scale);
    }

    sprites.render(list, 1, ctx, screen, None);
}

/// Move the sprites along fixed diagonal paths
fn move_sprites(sprites: &mut SpriteManager, list: SpriteListHandle, frame: u32) {
    let Some(list) = sprites.list_mut(list) else { return };
    let frame = frame as i32;
    let (max_x, max_y) = (SCREEN_WIDTH as i32 - SPRITE_SIZE, SCREEN_HEIGHT as i32 - SPRITE_SIZE);

    for (i, sprite) in list.sprites_mut().iter_mut().enumerate() {
        let n = i as i32;
        let image = i % 2;
        let mut sprite_flags = flags::VISIBLE;
        if i % 4 == 1 {
            sprite_flags |= flags::FLIP_X;
        }
        if i == SPRITE_COUNT - 1 {
            sprite_flags |= flags::SHADOW;
        }
        *sprite = Sprite {
            x: bounce(n * 37 + frame * 3, max_x),
            y: bounce(n * 53 + frame * 2, max_y),
            total_width: SPRITE_SIZE,
            total_height: SPRITE_SIZE,
            pen_offset: image * (SPRITE_SIZE * SPRITE_SIZE) as usize,
            line_offset: SPRITE_SIZE as usize,
            color_base: ((i % 15) as u32 + 1) * 16,
            flags: sprite_flags,
            priority: (i % 2) as u8,
            ..Default::default()
        };
    }
}

/// Triangle wave between 0 and `max`
fn bounce(value: i32, max: i32) -> i32 {
    let period = max * 2;
    let v = value.rem_euclid(period);
    if v > max {
        period - v
    } else {
        v
    }
}

/// Color of palette code `index`: high nibble picks the hue, low nibble the brightness
fn rgb(index: usize) -> [u8; 3] {
    const HUES: [[u8; 3]; 16] = [
        [255, 255, 255],
        [255, 64, 64],
        [64, 255, 64],
        [64, 64, 255],
        [255, 255, 64],
        [255, 64, 255],
        [64, 255, 255],
        [255, 160, 64],
        [160, 64, 255],
        [64, 160, 255],
        [160, 255, 64],
        [255, 64, 160],
        [128, 128, 128],
        [200, 160, 120],
        [120, 200, 160],
        [160, 120, 200],
    ];
    let hue = HUES[(index >> 4) & 0x0F];
    let shade = (index & 0x0F) as u32;
    hue.map(|c| (c as u32 * shade / 15) as u8)
}

fn rgb555([r, g, b]: [u8; 3]) -> u16 {
    ((r as u16 >> 3) << 10) | ((g as u16 >> 3) << 5) | (b as u16 >> 3)
}

/// Palette for the chosen depth, with a shadow table halving brightness
fn build_palette(depth: u8) -> Palette {
    if depth == 16 {
        let pens = (0..256).map(|i| rgb555(rgb(i))).collect();
        let shadow = (0..0x8000u32).map(|v| ((v >> 1) & 0x3DEF) as u16).collect();
        Palette::new(pens).with_shadow_table(shadow)
    } else {
        let shadow = (0..256u16).map(|i| (i & 0xF0) | ((i & 0x0F) >> 1)).collect();
        Palette::identity(256).with_shadow_table(shadow)
    }
}

/// Four 8x8 tiles: checkerboard, ring, stripes, framed block
fn build_atlas() -> Result<TileAtlas> {
    let count = 4;
    let mut data = Vec::with_capacity(count * TILE_SIZE * TILE_SIZE);
    for code in 0..count {
        for y in 0..TILE_SIZE as i32 {
            for x in 0..TILE_SIZE as i32 {
                data.push(tile_pen(code, x, y));
            }
        }
    }
    let layout = TileLayout::packed(TILE_SIZE, TILE_SIZE, count, 16, 16);
    let color_codes = (0..256u16).collect();
    Ok(TileAtlas::new(layout, data, color_codes)?)
}

fn tile_pen(code: usize, x: i32, y: i32) -> u8 {
    match code {
        0 => {
            if (x / 2 + y / 2) % 2 == 0 {
                9
            } else {
                12
            }
        }
        1 => {
            let (dx, dy) = (x * 2 - 7, y * 2 - 7);
            let d = dx * dx + dy * dy;
            if d < 16 {
                10
            } else if d <= 49 {
                15
            } else {
                0
            }
        }
        2 => {
            if (x + y) % 4 < 2 {
                14
            } else {
                0
            }
        }
        _ => {
            if x == 0 || y == 0 || x == 7 || y == 7 {
                15
            } else {
                7
            }
        }
    }
}

/// Scrolling layer drawn once, in physical orientation, with pen 0 left as a hole
fn build_layer(ctx: &RenderContext<'_>, atlas: &TileAtlas, depth: u8) -> Surface {
    let mut layer = Surface::new(LAYER_SIZE, LAYER_SIZE, depth);
    let tiles = (LAYER_SIZE / TILE_SIZE) as i32;
    for ty in 0..tiles {
        for tx in 0..tiles {
            let code = ((tx * 7 + ty * 3) % 4) as u32;
            let color = ((tx + ty) % 15 + 1) as u32;
            let tile = TileParams::new(code, color, tx * TILE_SIZE as i32, ty * TILE_SIZE as i32)
                .flipped(tx % 2 == 1, ty % 3 == 0);
            ctx.draw_tile(&mut layer, atlas, &tile, None, Transparency::Pen(0));
        }
    }
    layer
}

/// Two 16x16 sprite images: a shaded ball and a hollow box
fn sprite_pens() -> Vec<u8> {
    let size = SPRITE_SIZE;
    let mut pens = Vec::with_capacity((size * size * 2) as usize);
    for y in 0..size {
        for x in 0..size {
            let (dx, dy) = (x * 2 - 15, y * 2 - 15);
            let d = dx * dx + dy * dy;
            pens.push(if d > 225 { 0 } else { (15 - d * 12 / 225).max(1) as u8 });
        }
    }
    for y in 0..size {
        for x in 0..size {
            let border = x < 2 || y < 2 || x >= size - 2 || y >= size - 2;
            let hole = (6..10).contains(&x) && (6..10).contains(&y);
            pens.push(if border { 15 } else if hole { 0 } else { 8 });
        }
    }
    pens
}

/// Write the physical surface as an RGB PNG
fn write_png(screen: &Surface, palette: &Palette, path: &std::path::Path) -> Result<()> {
    let (width, height) = (screen.width() as u32, screen.height() as u32);
    let image = image::RgbImage::from_fn(width, height, |x, y| {
        let value = screen.get(x as i32, y as i32).unwrap_or(0);
        let color = match screen {
            Surface::Indexed(_) => rgb(value as usize),
            Surface::Direct(_) => {
                let expand = |c: u32| ((c & 0x1F) << 3 | (c & 0x1F) >> 2) as u8;
                [expand(value >> 10), expand(value >> 5), expand(value)]
            }
        };
        image::Rgb(color)
    });
    debug!("encoding {}x{} frame with {} palette entries", width, height, palette.len());
    image.save(path)?;
    Ok(())
}
