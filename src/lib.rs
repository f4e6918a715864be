//! rustyGFX - tile and sprite compositing core
//!
//! Draws pre-decoded tiles and sprite lists into 8-bit indexed or 16-bit
//! direct color surfaces for arcade style emulated video hardware. Every
//! entry point is orientation aware: callers work in the game's logical
//! coordinates and the [`RenderContext`] maps them onto the rotated or
//! mirrored physical surface.

pub mod atlas;
pub mod error;
pub mod geometry;
pub mod gfx;
pub mod palette;
pub mod sprite;
pub mod surface;
pub mod util;

pub use atlas::{TileAtlas, TileLayout};
pub use error::GfxError;
pub use geometry::{ClipRect, Orientation, Placement};
pub use gfx::{RenderContext, RozParams, TileParams, Transparency, PRIORITY_COVERED};
pub use palette::{Palette, PenEffect};
pub use sprite::{Sprite, SpriteKind, SpriteList, SpriteListConfig, SpriteListHandle, SpriteManager};
pub use surface::{Bitmap, Pixel, PriorityBitmap, Surface};
