//! Palette state read by the drawing core
//!
//! The palette maps logical color codes to destination pixel values ("pens").
//! It also carries the shadow table used to darken whatever is already on the
//! surface and the per-pen effect table consulted by the `PenTable` modes.

use serde::{Deserialize, Serialize};

/// What a source pen does when drawn through the effect table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PenEffect {
    /// Pen is skipped
    Transparent,

    /// Pen is drawn normally
    #[default]
    Source,

    /// Destination pixel is replaced by its shadowed value
    Shadow,
}

/// Pens, shadow table and pen effect table
#[derive(Debug, Clone, PartialEq)]
pub struct Palette {
    /// Logical color code -> destination pixel value
    pens: Vec<u16>,

    /// Destination pixel value -> darkened destination pixel value
    shadow_table: Vec<u16>,

    /// Effect for each source pen value
    effects: [PenEffect; 256],
}

impl Palette {
    /// Create a palette from its pen table; no shadowing, every pen draws normally
    pub fn new(pens: Vec<u16>) -> Self {
        Palette {
            pens,
            shadow_table: Vec::new(),
            effects: [PenEffect::Source; 256],
        }
    }

    /// Palette whose pens are the identity mapping for `count` colors
    pub fn identity(count: usize) -> Self {
        Palette::new((0..count).map(|i| i as u16).collect())
    }

    /// Install the shadow lookup table
    pub fn with_shadow_table(mut self, shadow_table: Vec<u16>) -> Self {
        self.shadow_table = shadow_table;
        self
    }

    /// Set the effect applied to one source pen value
    pub fn set_effect(&mut self, pen: u8, effect: PenEffect) {
        self.effects[pen as usize] = effect;
    }

    /// Effect applied to one source pen value
    #[inline]
    pub fn effect(&self, pen: u8) -> PenEffect {
        self.effects[pen as usize]
    }

    /// Destination pixel value for a logical color code
    ///
    /// Codes past the end of the table map to pen 0.
    #[inline]
    pub fn pen(&self, code: u32) -> u16 {
        self.pens.get(code as usize).copied().unwrap_or(0)
    }

    /// Number of pens
    pub fn len(&self) -> usize {
        self.pens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pens.is_empty()
    }

    /// Shadowed version of a destination pixel value
    ///
    /// Values the table does not cover are left unchanged.
    #[inline]
    pub fn shadow(&self, value: u32) -> u32 {
        self.shadow_table.get(value as usize).map_or(value, |&v| v as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pen_out_of_range_is_zero() {
        let palette = Palette::new(vec![10, 20]);
        assert_eq!(palette.pen(1), 20);
        assert_eq!(palette.pen(2), 0);
    }

    #[test]
    fn test_shadow_falls_back_to_input() {
        let palette = Palette::identity(4).with_shadow_table(vec![0, 0, 1, 1]);
        assert_eq!(palette.shadow(3), 1);
        assert_eq!(palette.shadow(200), 200);
    }

    #[test]
    fn test_effect_table_defaults_to_source() {
        let mut palette = Palette::identity(16);
        assert_eq!(palette.effect(7), PenEffect::Source);
        palette.set_effect(7, PenEffect::Shadow);
        assert_eq!(palette.effect(7), PenEffect::Shadow);
    }
}
