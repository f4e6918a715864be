//! Sprite mask arena
//!
//! One growable byte buffer holds every opacity mask of a frame. It is reset
//! (not freed) at the start of each update; handles carry the generation they
//! were allocated in, so a handle from an earlier frame resolves to nothing.

use log::{debug, warn};

use crate::error::GfxError;

/// A mask region inside the arena, valid until the next reset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaskHandle {
    generation: u32,
    offset: usize,
    len: usize,
}

impl MaskHandle {
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

#[derive(Debug, Default)]
pub struct MaskArena {
    buf: Vec<u8>,
    used: usize,
    generation: u32,
}

impl MaskArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget every mask of the previous frame
    pub fn reset(&mut self) {
        self.used = 0;
        self.generation = self.generation.wrapping_add(1);
    }

    /// Reserve a zeroed region of `len` bytes
    ///
    /// Returns `None` (after logging) when the arena cannot grow.
    pub fn alloc(&mut self, len: usize) -> Option<MaskHandle> {
        let end = match self.used.checked_add(len) {
            Some(end) => end,
            None => {
                warn!("{}", GfxError::MaskArenaExhausted(usize::MAX));
                return None;
            }
        };
        if end > self.buf.len() {
            if self.buf.try_reserve(end - self.buf.len()).is_err() {
                warn!("{}", GfxError::MaskArenaExhausted(end));
                return None;
            }
            self.buf.resize(end, 0);
            debug!("increased sprite mask arena to {} bytes", end);
        }
        self.buf[self.used..end].fill(0);

        let handle = MaskHandle {
            generation: self.generation,
            offset: self.used,
            len,
        };
        self.used = end;
        Some(handle)
    }

    pub fn get(&self, handle: MaskHandle) -> Option<&[u8]> {
        if handle.generation != self.generation {
            return None;
        }
        self.buf.get(handle.offset..handle.offset + handle.len)
    }

    pub fn get_mut(&mut self, handle: MaskHandle) -> Option<&mut [u8]> {
        if handle.generation != self.generation {
            return None;
        }
        self.buf.get_mut(handle.offset..handle.offset + handle.len)
    }

    /// Bytes the arena has grown to, the largest demand of any single frame
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Bytes handed out since the last reset
    pub fn used(&self) -> usize {
        self.used
    }
}
