//! Sprite records and sprite lists
//!
//! A [`SpriteList`] is one sprite plane: a fixed array of [`Sprite`] values the
//! game driver rewrites every frame, plus the pixel data they point into. The
//! manager keeps its per-frame results (physical footprint, visibility, mask)
//! next to the records, so the driver's values are never modified.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::geometry::Placement;
use crate::sprite::mask::MaskHandle;

/// Sprite flag bits
pub mod flags {
    pub const FLIP_X: u16 = 0x01;
    pub const FLIP_Y: u16 = 0x02;
    /// Hidden every other frame
    pub const FLICKER: u16 = 0x04;
    pub const VISIBLE: u16 = 0x08;
    /// Only overwrite destination pixels equal to the list's through value
    pub const THROUGH: u16 = 0x10;
    /// Every opaque pixel darkens the destination instead of drawing
    pub const SHADOW: u16 = 0x20;
    /// Pixels of the sprite's shadow pen darken the destination
    pub const PARTIAL_SHADOW: u16 = 0x40;
}

/// How a sprite's pixels are laid out in the list's pixel data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpriteKind {
    /// Sub-rectangle of a larger tile grid, selected by `x_offset` / `y_offset`
    Unpack,

    /// Footprint tiled with `tile_width` x `tile_height` blocks stored one after another
    Stack,

    /// `tile_width` x `tile_height` source scaled to the footprint
    Zoom,
}

/// Order in which a list is painted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DrawOrder {
    /// Index 0 painted first, the last sprite ends up on top
    #[default]
    BackToFront,

    /// Index 0 is the front-most sprite and is painted last
    FrontToBack,
}

/// List-wide settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpriteListConfig {
    pub kind: SpriteKind,
    pub order: DrawOrder,

    /// Pen skipped in every sprite of the list
    pub transparent_pen: u8,

    /// Pen that darkens the destination and never occludes other sprites
    pub special_pen: Option<u8>,

    /// Highest priority a sprite may carry; larger values are clamped
    pub max_priority: u8,

    /// Write `color_base + pen` directly instead of looking it up in the palette
    pub raw_colors: bool,

    /// Screen flip applied to the whole list before the cabinet orientation
    pub flip_x: bool,
    pub flip_y: bool,

    /// Destination value [`flags::THROUGH`] sprites draw over
    pub through_value: u32,

    /// End of row marker in zoomed sprite data
    pub row_terminator: Option<u8>,
}

impl SpriteListConfig {
    pub fn new(kind: SpriteKind) -> Self {
        SpriteListConfig {
            kind,
            order: DrawOrder::BackToFront,
            transparent_pen: 0,
            special_pen: None,
            max_priority: 31,
            raw_colors: false,
            flip_x: false,
            flip_y: false,
            through_value: 0,
            row_terminator: if kind == SpriteKind::Zoom { Some(0xFF) } else { None },
        }
    }

    pub fn with_order(mut self, order: DrawOrder) -> Self {
        self.order = order;
        self
    }

    pub fn with_transparent_pen(mut self, pen: u8) -> Self {
        self.transparent_pen = pen;
        self
    }

    pub fn with_special_pen(mut self, pen: Option<u8>) -> Self {
        self.special_pen = pen;
        self
    }
}

/// One positioned sprite
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Sprite {
    /// Logical screen position of the top-left corner
    pub x: i32,
    pub y: i32,

    /// On-screen footprint
    pub total_width: i32,
    pub total_height: i32,

    /// Block size for stacked sprites, source size for zoomed sprites
    pub tile_width: i32,
    pub tile_height: i32,

    /// Position inside the tile grid for unpacked sprites
    pub x_offset: i32,
    pub y_offset: i32,

    /// Index of the sprite's first pixel in the list pixel data
    pub pen_offset: usize,

    /// Distance between two pixel rows in the list pixel data
    pub line_offset: usize,

    /// Palette base (or raw color base) added to every pen
    pub color_base: u32,

    /// Pens the sprite uses, bit n = pen n
    pub pen_usage: Option<u32>,

    pub flags: u16,

    /// Priority bucket; lower buckets are drawn first
    pub priority: u8,

    /// Pen darkened by [`flags::PARTIAL_SHADOW`]
    pub shadow_pen: u8,
}

impl Sprite {
    #[inline]
    pub fn has(&self, flag: u16) -> bool {
        self.flags & flag != 0
    }

    pub fn set_flag(&mut self, flag: u16, on: bool) {
        if on {
            self.flags |= flag;
        } else {
            self.flags &= !flag;
        }
    }
}

/// Per-frame state of one sprite, produced by the manager's update
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Resolved {
    /// Physical footprint and read direction
    pub placed: Placement,
    pub visible: bool,
    pub priority: u8,
    pub mask: Option<MaskHandle>,
}

/// Identifies a list inside its [`crate::sprite::SpriteManager`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpriteListHandle(pub(crate) usize);

/// A fixed-capacity sprite plane
#[derive(Debug, Clone)]
pub struct SpriteList {
    config: SpriteListConfig,

    /// Palette-index pixels the sprites point into
    pens: Arc<[u8]>,

    sprites: Vec<Sprite>,

    /// Number of sprites in use
    count: usize,

    pub(crate) resolved: Vec<Resolved>,
}

impl SpriteList {
    pub(crate) fn new(capacity: usize, config: SpriteListConfig) -> Self {
        SpriteList {
            config,
            pens: Arc::from(Vec::new()),
            sprites: vec![Sprite::default(); capacity],
            count: capacity,
            resolved: vec![Resolved::default(); capacity],
        }
    }

    pub fn config(&self) -> &SpriteListConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut SpriteListConfig {
        &mut self.config
    }

    /// Pixel data shared by every sprite of the list
    pub fn set_pen_data(&mut self, pens: Arc<[u8]>) {
        self.pens = pens;
    }

    pub fn pen_data(&self) -> &[u8] {
        &self.pens
    }

    pub fn capacity(&self) -> usize {
        self.sprites.len()
    }

    /// Sprites in use
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Number of sprites in use, at most the capacity
    pub fn set_len(&mut self, count: usize) {
        self.count = count.min(self.sprites.len());
    }

    pub fn sprites(&self) -> &[Sprite] {
        &self.sprites[..self.count]
    }

    pub fn sprites_mut(&mut self) -> &mut [Sprite] {
        &mut self.sprites[..self.count]
    }

    /// Sprite indices in paint order
    pub(crate) fn paint_order(&self) -> Vec<usize> {
        match self.config.order {
            DrawOrder::BackToFront => (0..self.count).collect(),
            DrawOrder::FrontToBack => (0..self.count).rev().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paint_order() {
        let mut list = SpriteList::new(3, SpriteListConfig::new(SpriteKind::Unpack));
        assert_eq!(list.paint_order(), vec![0, 1, 2]);
        list.config_mut().order = DrawOrder::FrontToBack;
        list.set_len(2);
        assert_eq!(list.paint_order(), vec![1, 0]);
    }

    #[test]
    fn test_zoom_lists_default_to_row_terminator() {
        assert_eq!(SpriteListConfig::new(SpriteKind::Zoom).row_terminator, Some(0xFF));
        assert_eq!(SpriteListConfig::new(SpriteKind::Stack).row_terminator, None);
    }

    #[test]
    fn test_flag_helpers() {
        let mut sprite = Sprite::default();
        sprite.set_flag(flags::VISIBLE | flags::FLIP_X, true);
        assert!(sprite.has(flags::FLIP_X));
        sprite.set_flag(flags::FLIP_X, false);
        assert!(!sprite.has(flags::FLIP_X));
        assert!(sprite.has(flags::VISIBLE));
    }

    #[test]
    fn test_set_len_is_capped() {
        let mut list = SpriteList::new(4, SpriteListConfig::new(SpriteKind::Unpack));
        list.set_len(10);
        assert_eq!(list.len(), 4);
        assert_eq!(list.sprites_mut().len(), 4);
    }
}
