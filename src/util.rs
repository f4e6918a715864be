//! Utility functions and helpers for the drawing core
//!
//! Fixed-point helpers used by the zoom and rotate paths, plus scroll wrapping.

/// 1.0 in 16.16 fixed point
pub const FIXED_ONE: i32 = 0x10000;

/// Screen extent of `extent` source pixels scaled by a 16.16 factor, rounded to nearest
#[inline]
pub fn scaled_extent(extent: usize, scale: i32) -> i32 {
    ((scale as i64 * extent as i64 + 0x8000) >> 16) as i32
}

/// Screen extent used when mirroring a scaled footprint
///
/// Rounds slightly differently from [`scaled_extent`]; the mirrored position
/// has to match what the hardware does, not the footprint.
#[inline]
pub fn mirrored_extent(extent: usize, scale: i32) -> i32 {
    ((scale as i64 * extent as i64 + 0x7fff) >> 16) as i32
}

/// 16.16 source step per destination pixel
#[inline]
pub fn source_step(source_extent: usize, dest_extent: i32) -> i32 {
    (((source_extent as i64) << 16) / dest_extent as i64) as i32
}

/// Bring a scroll value into `[0, extent)`
#[inline]
pub fn wrap_scroll(scroll: i32, extent: i32) -> i32 {
    if extent <= 0 {
        return 0;
    }
    scroll.rem_euclid(extent)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scaled_extent_half_and_unit() {
        assert_eq!(scaled_extent(32, 0x8000), 16);
        assert_eq!(scaled_extent(32, FIXED_ONE), 32);
        assert_eq!(scaled_extent(16, 0x20000), 32);
    }

    #[test]
    fn test_source_step() {
        assert_eq!(source_step(32, 16), 0x20000);
        assert_eq!(source_step(16, 32), 0x8000);
    }

    #[test]
    fn test_wrap_scroll_negative() {
        assert_eq!(wrap_scroll(-1, 256), 255);
        assert_eq!(wrap_scroll(-256, 256), 0);
        assert_eq!(wrap_scroll(300, 256), 44);
    }
}
