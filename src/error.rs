//! Diagnostics for the drawing core
//!
//! Nothing in the drawing core aborts a frame. Internal routines report problems
//! through [`GfxError`]; the public entry points log the error once and skip the
//! offending draw.

use thiserror::Error;

/// Errors that can occur while drawing or while building drawing resources
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GfxError {
    #[error("{0} transparency mode {1:?} not supported")]
    UnsupportedMode(&'static str, crate::gfx::Transparency),

    #[error("{0} transparency mode {1:?} not supported with a priority buffer")]
    UnsupportedPriorityMode(&'static str, crate::gfx::Transparency),

    #[error("{0}: tile atlas has no color codes for palette slot {1}")]
    MissingColorTable(&'static str, u32),

    #[error("{0}: source depth {1} does not match destination depth {2}")]
    DepthMismatch(&'static str, u8, u8),

    #[error("Invalid tile atlas: {0}")]
    InvalidAtlas(String),

    #[error("Invalid bitmap: {0}")]
    InvalidBitmap(String),

    #[error("Sprite mask arena could not grow to {0} bytes")]
    MaskArenaExhausted(usize),
}

/// Log a draw diagnostic and drop it
///
/// Draw entry points never hand errors back to the caller, a bad call only
/// costs its own output.
pub(crate) fn report(result: Result<(), GfxError>) {
    if let Err(err) = result {
        log::warn!("{}", err);
    }
}
