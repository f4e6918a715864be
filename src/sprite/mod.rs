//! Sprite Manager
//!
//! Owns every sprite list and the mask arena. Once per frame [`SpriteManager::update`]
//! normalizes sprite geometry for the current orientation and builds the
//! occlusion masks; the caller then asks for one priority bucket at a time with
//! [`SpriteManager::render`].
//!
//! Priority buckets let background layers sit between groups of sprites, but
//! drawing by bucket loses the list order between overlapping sprites. A sprite
//! that a later, higher-priority sprite overlaps gets a mask with that sprite's
//! opaque pixels, and skips them when drawn, whatever order the buckets are
//! rendered in.

pub mod list;
pub mod mask;
mod render;

use log::{debug, trace};

use crate::geometry::{ClipRect, Placement};
use crate::gfx::RenderContext;
use crate::surface::{Bitmap, Pixel, Surface};

pub use list::{flags, DrawOrder, Sprite, SpriteKind, SpriteList, SpriteListConfig, SpriteListHandle};
pub use mask::{MaskArena, MaskHandle};
pub use render::MASK_OPAQUE;

use list::Resolved;
use render::SpriteSource;

/// All sprite planes of an emulation session
#[derive(Debug, Default)]
pub struct SpriteManager {
    lists: Vec<SpriteList>,
    arena: MaskArena,

    /// Flicker sprites are hidden while this is set
    flicker_off: bool,
}

impl SpriteManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a list of `capacity` sprites; all of them start in use
    pub fn create_list(&mut self, capacity: usize, config: SpriteListConfig) -> SpriteListHandle {
        debug!("creating {:?} sprite list with {} sprites", config.kind, capacity);
        self.lists.push(SpriteList::new(capacity, config));
        SpriteListHandle(self.lists.len() - 1)
    }

    pub fn list(&self, handle: SpriteListHandle) -> Option<&SpriteList> {
        self.lists.get(handle.0)
    }

    pub fn list_mut(&mut self, handle: SpriteListHandle) -> Option<&mut SpriteList> {
        self.lists.get_mut(handle.0)
    }

    /// Release every list; handles handed out earlier become invalid
    pub fn destroy_all(&mut self) {
        debug!("destroying {} sprite lists", self.lists.len());
        self.lists.clear();
        self.arena.reset();
    }

    /// Bytes the mask arena has grown to
    pub fn mask_capacity(&self) -> usize {
        self.arena.capacity()
    }

    /// Mask of a sprite for the current frame, if it needed one
    pub fn mask(&self, handle: SpriteListHandle, index: usize) -> Option<&[u8]> {
        let resolved = self.lists.get(handle.0)?.resolved.get(index)?;
        self.arena.get(resolved.mask?)
    }

    /// Normalize and mask every list for the frame about to be drawn on `surface`
    pub fn update(&mut self, ctx: &RenderContext<'_>, surface: &Surface) {
        self.arena.reset();
        self.flicker_off = !self.flicker_off;

        let (width, height) = (surface.width(), surface.height());
        let screen = ctx.physical_clip(None, width, height);
        for list in &mut self.lists {
            normalize(list, ctx, width, height, &screen, self.flicker_off);
            build_masks(list, &mut self.arena, ctx.orientation.swap_xy, &screen);
        }
    }

    /// Draw the sprites of one priority bucket
    pub fn render(
        &self,
        handle: SpriteListHandle,
        priority: u8,
        ctx: &RenderContext<'_>,
        dest: &mut Surface,
        clip: Option<&ClipRect>,
    ) {
        let Some(list) = self.lists.get(handle.0) else {
            debug!("render of unknown sprite list {}", handle.0);
            return;
        };
        match dest {
            Surface::Indexed(bitmap) => self.render_list(list, priority, ctx, bitmap, clip),
            Surface::Direct(bitmap) => self.render_list(list, priority, ctx, bitmap, clip),
        }
    }

    fn render_list<P: Pixel>(
        &self,
        list: &SpriteList,
        priority: u8,
        ctx: &RenderContext<'_>,
        dest: &mut Bitmap<P>,
        clip: Option<&ClipRect>,
    ) {
        let clip = ctx.physical_clip(clip, dest.width(), dest.height());
        let config = list.config();
        for i in list.paint_order() {
            let resolved = &list.resolved[i];
            if !resolved.visible || resolved.priority != priority {
                continue;
            }
            let sprite = &list.sprites()[i];
            let source = SpriteSource::new(sprite, resolved, config, ctx.orientation.swap_xy, list.pen_data());
            let mask = resolved.mask.and_then(|handle| self.arena.get(handle));
            render::draw_sprite(dest, &source, mask, config, ctx.palette, &clip);
        }
    }
}

/// Physical footprint, flips, clamped priority and visibility of every sprite
fn normalize(
    list: &mut SpriteList,
    ctx: &RenderContext<'_>,
    width: usize,
    height: usize,
    screen: &ClipRect,
    flicker_off: bool,
) {
    let config = *list.config();
    let (logical_w, logical_h) = ctx.logical_size(width, height);
    let count = list.len();

    for i in 0..count {
        let sprite = list.sprites()[i];

        let mut priority = sprite.priority;
        if priority > config.max_priority {
            debug!(
                "sprite {} priority {} clamped to {}",
                i, priority, config.max_priority
            );
            priority = config.max_priority;
        }

        // Screen flip of the whole list, then the cabinet orientation
        let mut logical = Placement {
            x: sprite.x,
            y: sprite.y,
            width: sprite.total_width,
            height: sprite.total_height,
            flip_x: sprite.has(flags::FLIP_X),
            flip_y: sprite.has(flags::FLIP_Y),
        };
        if config.flip_x {
            logical.x = logical_w as i32 - logical.width - logical.x;
            logical.flip_x = !logical.flip_x;
        }
        if config.flip_y {
            logical.y = logical_h as i32 - logical.height - logical.y;
            logical.flip_y = !logical.flip_y;
        }
        let placed = ctx.orientation.place(logical, width as i32, height as i32);

        // Hidden, empty, flickered out, off screen or fully transparent sprites are skipped
        let all_transparent = match sprite.pen_usage {
            Some(usage) if config.transparent_pen < 32 => usage & !(1u32 << config.transparent_pen) == 0,
            _ => false,
        };
        let visible = sprite.has(flags::VISIBLE)
            && placed.width > 0
            && placed.height > 0
            && !(flicker_off && sprite.has(flags::FLICKER))
            && !placed.bounds().intersect(screen).is_empty()
            && !all_transparent;

        list.resolved[i] = Resolved {
            placed,
            visible,
            priority,
            mask: None,
        };
    }
}

/// Give every sprite overlapped by a later, higher-priority sprite a mask of that sprite
fn build_masks(list: &mut SpriteList, arena: &mut MaskArena, swap_xy: bool, screen: &ClipRect) {
    let order = list.paint_order();
    let config = *list.config();

    for (pos, &i) in order.iter().enumerate() {
        let target = list.resolved[i];
        if !target.visible {
            continue;
        }

        // Only sprites painted later can end up in front
        let mut handle = None;
        for &j in &order[pos + 1..] {
            let occluder = &list.resolved[j];
            if !occluder.visible || occluder.priority <= target.priority || !occluder.placed.overlaps(&target.placed) {
                continue;
            }

            // Mask is allocated on the first real occluder
            if handle.is_none() {
                let len = target.placed.width as usize * target.placed.height as usize;
                handle = arena.alloc(len);
                if handle.is_none() {
                    // drawn unmasked this frame
                    break;
                }
            }

            // Stamp the occluder's opaque pixels
            let Some(mask) = handle.and_then(|h| arena.get_mut(h)) else { break };
            let sprite = &list.sprites()[j];
            let source = SpriteSource::new(sprite, occluder, &config, swap_xy, list.pen_data());
            render::write_mask(mask, &target, &source, &config, screen);
            trace!("sprite {} masked by sprite {}", i, j);
        }
        list.resolved[i].mask = handle;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::palette::Palette;

    fn solid_list(manager: &mut SpriteManager, pens: Vec<u8>) -> SpriteListHandle {
        let handle = manager.create_list(2, SpriteListConfig::new(SpriteKind::Unpack));
        let list = manager.list_mut(handle).unwrap();
        list.set_pen_data(Arc::from(pens));
        handle
    }

    fn square(x: i32, y: i32, size: i32, pen_offset: usize, priority: u8) -> Sprite {
        Sprite {
            x,
            y,
            total_width: size,
            total_height: size,
            pen_offset,
            line_offset: size as usize,
            priority,
            flags: flags::VISIBLE,
            ..Default::default()
        }
    }

    #[test]
    fn test_flicker_alternates_frames() {
        let palette = Palette::identity(16);
        let ctx = RenderContext::new(&palette);
        let surface = Surface::new(16, 16, 8);
        let mut manager = SpriteManager::new();
        let handle = solid_list(&mut manager, vec![1; 16]);
        let list = manager.list_mut(handle).unwrap();
        list.set_len(1);
        let mut sprite = square(0, 0, 4, 0, 0);
        sprite.flags |= flags::FLICKER;
        list.sprites_mut()[0] = sprite;

        let mut seen = Vec::new();
        for _ in 0..4 {
            manager.update(&ctx, &surface);
            seen.push(manager.list(handle).unwrap().resolved[0].visible);
        }
        assert_eq!(seen, vec![false, true, false, true]);
    }

    #[test]
    fn test_offscreen_and_empty_sprites_are_invisible() {
        let palette = Palette::identity(16);
        let ctx = RenderContext::new(&palette);
        let surface = Surface::new(16, 16, 8);
        let mut manager = SpriteManager::new();
        let handle = solid_list(&mut manager, vec![1; 16]);
        let list = manager.list_mut(handle).unwrap();
        list.sprites_mut()[0] = square(16, 0, 4, 0, 0);
        list.sprites_mut()[1] = square(0, 0, 0, 0, 0);
        manager.update(&ctx, &surface);
        let list = manager.list(handle).unwrap();
        assert!(!list.resolved[0].visible);
        assert!(!list.resolved[1].visible);
    }

    #[test]
    fn test_priority_is_clamped() {
        let palette = Palette::identity(16);
        let ctx = RenderContext::new(&palette);
        let surface = Surface::new(16, 16, 8);
        let mut manager = SpriteManager::new();
        let handle = solid_list(&mut manager, vec![1; 16]);
        let list = manager.list_mut(handle).unwrap();
        list.config_mut().max_priority = 3;
        list.set_len(1);
        list.sprites_mut()[0] = square(0, 0, 4, 0, 9);
        manager.update(&ctx, &surface);
        assert_eq!(manager.list(handle).unwrap().resolved[0].priority, 3);
    }

    #[test]
    fn test_mask_only_for_overlapped_lower_priority_sprite() {
        let palette = Palette::identity(16);
        let ctx = RenderContext::new(&palette);
        let surface = Surface::new(16, 16, 8);
        let mut manager = SpriteManager::new();
        let handle = solid_list(&mut manager, vec![1; 32]);
        let list = manager.list_mut(handle).unwrap();
        list.sprites_mut()[0] = square(0, 0, 4, 0, 1);
        list.sprites_mut()[1] = square(2, 2, 4, 16, 2);
        manager.update(&ctx, &surface);

        let mask = manager.mask(handle, 0).unwrap();
        assert_eq!(mask.len(), 16);
        assert_eq!(mask[0], 0);
        assert_eq!(mask[2 * 4 + 2], MASK_OPAQUE);
        assert!(manager.mask(handle, 1).is_none());
        assert_eq!(manager.mask_capacity(), 16);
    }

    #[test]
    fn test_list_flip_mirrors_position() {
        let palette = Palette::identity(16);
        let ctx = RenderContext::new(&palette);
        let surface = Surface::new(16, 8, 8);
        let mut manager = SpriteManager::new();
        let handle = solid_list(&mut manager, vec![1; 16]);
        let list = manager.list_mut(handle).unwrap();
        list.config_mut().flip_x = true;
        list.set_len(1);
        list.sprites_mut()[0] = square(1, 0, 4, 0, 0);
        manager.update(&ctx, &surface);
        let placed = manager.list(handle).unwrap().resolved[0].placed;
        assert_eq!((placed.x, placed.flip_x), (16 - 4 - 1, true));
    }
}
