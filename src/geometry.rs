//! Shared geometry helpers
//!
//! Clip rectangles and the cabinet orientation transform. The orientation is
//! applied the same way everywhere: swap the axes first, then mirror X, then
//! mirror Y. Each step also toggles the matching flip flag so the source is read
//! in the direction the rotated screen expects.

use serde::{Deserialize, Serialize};

/// Inclusive rectangle in destination surface coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClipRect {
    pub min_x: i32,
    pub max_x: i32,
    pub min_y: i32,
    pub max_y: i32,
}

impl ClipRect {
    /// Create a clip rectangle from inclusive bounds
    pub const fn new(min_x: i32, max_x: i32, min_y: i32, max_y: i32) -> Self {
        ClipRect { min_x, max_x, min_y, max_y }
    }

    /// Rectangle covering a whole `width` x `height` surface
    pub fn full(width: usize, height: usize) -> Self {
        ClipRect::new(0, width as i32 - 1, 0, height as i32 - 1)
    }

    /// True when the rectangle contains no pixel (inverted bounds)
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.min_x > self.max_x || self.min_y > self.max_y
    }

    #[inline]
    pub fn width(&self) -> i32 {
        self.max_x - self.min_x + 1
    }

    #[inline]
    pub fn height(&self) -> i32 {
        self.max_y - self.min_y + 1
    }

    #[inline]
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }

    /// Intersection of two rectangles; may be empty
    pub fn intersect(&self, other: &ClipRect) -> ClipRect {
        ClipRect {
            min_x: self.min_x.max(other.min_x),
            max_x: self.max_x.min(other.max_x),
            min_y: self.min_y.max(other.min_y),
            max_y: self.max_y.min(other.max_y),
        }
    }

    /// Swap the X and Y bounds
    pub fn transposed(&self) -> ClipRect {
        ClipRect {
            min_x: self.min_y,
            max_x: self.max_y,
            min_y: self.min_x,
            max_y: self.max_x,
        }
    }
}

/// Cabinet orientation
///
/// Any combination of the three bits is valid; the named rotations are the
/// combinations real cabinets use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Orientation {
    /// Mirror horizontally
    pub flip_x: bool,

    /// Mirror vertically
    pub flip_y: bool,

    /// Exchange the X and Y axes (applied before the mirrors)
    pub swap_xy: bool,
}

impl Orientation {
    pub const ROT0: Orientation = Orientation { flip_x: false, flip_y: false, swap_xy: false };
    pub const ROT90: Orientation = Orientation { flip_x: true, flip_y: false, swap_xy: true };
    pub const ROT180: Orientation = Orientation { flip_x: true, flip_y: true, swap_xy: false };
    pub const ROT270: Orientation = Orientation { flip_x: false, flip_y: true, swap_xy: true };

    const FLIP_X: u8 = 0x01;
    const FLIP_Y: u8 = 0x02;
    const SWAP_XY: u8 = 0x04;

    /// Build an orientation from the packed `FLIP_X | FLIP_Y | SWAP_XY` bits
    pub fn from_bits(bits: u8) -> Self {
        Orientation {
            flip_x: bits & Self::FLIP_X != 0,
            flip_y: bits & Self::FLIP_Y != 0,
            swap_xy: bits & Self::SWAP_XY != 0,
        }
    }

    /// Packed representation, the inverse of [`Orientation::from_bits`]
    pub fn bits(self) -> u8 {
        let mut bits = 0;
        if self.flip_x {
            bits |= Self::FLIP_X;
        }
        if self.flip_y {
            bits |= Self::FLIP_Y;
        }
        if self.swap_xy {
            bits |= Self::SWAP_XY;
        }
        bits
    }

    /// Transform a placed rectangle into destination space
    ///
    /// `dest_width` and `dest_height` are the dimensions of the space the result
    /// lives in (the physical surface).
    pub fn place(self, p: Placement, dest_width: i32, dest_height: i32) -> Placement {
        let mut p = p;
        if self.swap_xy {
            std::mem::swap(&mut p.x, &mut p.y);
            std::mem::swap(&mut p.width, &mut p.height);
            std::mem::swap(&mut p.flip_x, &mut p.flip_y);
        }
        if self.flip_x {
            p.x = dest_width - p.width - p.x;
            p.flip_x = !p.flip_x;
        }
        if self.flip_y {
            p.y = dest_height - p.height - p.y;
            p.flip_y = !p.flip_y;
        }
        p
    }

    /// Transform a logical clip rectangle into destination space
    pub fn transform_clip(self, clip: &ClipRect, dest_width: i32, dest_height: i32) -> ClipRect {
        let mut c = *clip;
        if self.swap_xy {
            c = c.transposed();
        }
        if self.flip_x {
            let min_x = dest_width - 1 - c.max_x;
            c.max_x = dest_width - 1 - c.min_x;
            c.min_x = min_x;
        }
        if self.flip_y {
            let min_y = dest_height - 1 - c.max_y;
            c.max_y = dest_height - 1 - c.min_y;
            c.min_y = min_y;
        }
        c
    }

    /// Transform a single logical point into destination space
    #[inline]
    pub fn transform_point(self, x: i32, y: i32, dest_width: i32, dest_height: i32) -> (i32, i32) {
        let (mut x, mut y) = if self.swap_xy { (y, x) } else { (x, y) };
        if self.flip_x {
            x = dest_width - 1 - x;
        }
        if self.flip_y {
            y = dest_height - 1 - y;
        }
        (x, y)
    }
}

/// Position, footprint and flip state of something drawn on screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Placement {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub flip_x: bool,
    pub flip_y: bool,
}

impl Placement {
    /// True when the two footprints share at least one pixel
    #[inline]
    pub fn overlaps(&self, other: &Placement) -> bool {
        self.x < other.x + other.width
            && other.x < self.x + self.width
            && self.y < other.y + other.height
            && other.y < self.y + self.height
    }

    /// Footprint as an inclusive rectangle
    pub fn bounds(&self) -> ClipRect {
        ClipRect::new(self.x, self.x + self.width - 1, self.y, self.y + self.height - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_orientation_bits_round_trip() {
        for bits in 0..8 {
            assert_eq!(Orientation::from_bits(bits).bits(), bits);
        }
        assert_eq!(Orientation::ROT90.bits(), 0x05);
        assert_eq!(Orientation::ROT270.bits(), 0x06);
    }

    #[test]
    fn test_rot90_then_rot270_restores_placement() {
        let original = Placement { x: 10, y: 20, width: 16, height: 32, flip_x: true, flip_y: false };
        // logical screen 256 wide, 224 tall
        let rotated = Orientation::ROT90.place(original, 224, 256);
        assert_ne!(rotated, original);
        let back = Orientation::ROT270.place(rotated, 256, 224);
        assert_eq!(back, original);
    }

    #[test]
    fn test_rot180_is_self_inverse() {
        let original = Placement { x: 3, y: 7, width: 8, height: 8, flip_x: false, flip_y: true };
        let once = Orientation::ROT180.place(original, 64, 48);
        assert_eq!(once.x, 64 - 8 - 3);
        assert_eq!(once.y, 48 - 8 - 7);
        assert!(once.flip_x);
        assert!(!once.flip_y);
        assert_eq!(Orientation::ROT180.place(once, 64, 48), original);
    }

    #[test]
    fn test_transform_clip_mirrors_bounds() {
        let clip = ClipRect::new(0, 9, 5, 14);
        let mirrored = Orientation { flip_x: true, ..Orientation::ROT0 }.transform_clip(&clip, 100, 50);
        assert_eq!(mirrored, ClipRect::new(90, 99, 5, 14));
        let swapped = Orientation { swap_xy: true, ..Orientation::ROT0 }.transform_clip(&clip, 50, 100);
        assert_eq!(swapped, ClipRect::new(5, 14, 0, 9));
    }

    #[test]
    fn test_clip_intersection_and_emptiness() {
        let a = ClipRect::new(0, 10, 0, 10);
        let b = ClipRect::new(5, 20, 11, 20);
        assert!(a.intersect(&b).is_empty());
        let c = ClipRect::new(5, 20, 5, 20);
        assert_eq!(a.intersect(&c), ClipRect::new(5, 10, 5, 10));
    }

    #[test]
    fn test_placement_overlap_edges() {
        let a = Placement { x: 0, y: 0, width: 8, height: 8, ..Default::default() };
        let touching = Placement { x: 8, y: 0, width: 8, height: 8, ..Default::default() };
        let sharing = Placement { x: 7, y: 7, width: 8, height: 8, ..Default::default() };
        assert!(!a.overlaps(&touching));
        assert!(a.overlaps(&sharing));
    }
}
