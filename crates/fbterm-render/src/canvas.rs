// SPDX-License-Identifier: MIT
//
// Canvas — full-resolution back buffer of what lies behind the text.
//
// One `u32` per framebuffer pixel, row stride = framebuffer width. Filled at
// init from a caller snapshot (a boot logo, a wallpaper) or with the default
// background. Glyph drawing only reads it: a transparent color resolves to
// the canvas pixel at the same position, and the canvas is never painted
// with glyphs, so clearing transparent text always reveals the background
// rather than an older glyph.

use crate::error::InitError;
use crate::memory::{BufferAllocator, RawBuffer, Rollback};

pub struct Canvas {
    pixels: RawBuffer<u32>,
    width: usize,
    height: usize,
}

impl Canvas {
    /// Copy `snapshot` (exactly `width × height` pixels) or fill with `fill`.
    pub(crate) fn new_in<A: BufferAllocator>(
        staged: &mut Rollback<'_, A>,
        width: usize,
        height: usize,
        snapshot: Option<&[u32]>,
        fill: u32,
    ) -> Result<Self, InitError> {
        let expected = width * height;
        let pixels = match snapshot {
            Some(src) if src.len() != expected => {
                return Err(InitError::CanvasSize {
                    expected,
                    got: src.len(),
                });
            }
            Some(src) => staged.copied(src)?,
            None => staged.filled(expected, fill)?,
        };
        Ok(Self {
            pixels,
            width,
            height,
        })
    }

    #[inline]
    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    #[inline]
    #[must_use]
    pub const fn height(&self) -> usize {
        self.height
    }

    /// Pixel at `(x, y)`; 0 outside the canvas.
    #[inline]
    #[must_use]
    pub fn get(&self, x: usize, y: usize) -> u32 {
        if x < self.width && y < self.height {
            self.pixels[y * self.width + x]
        } else {
            0
        }
    }

    /// Row `y` from column `x` to the right edge.
    #[inline]
    #[must_use]
    pub fn row_from(&self, x: usize, y: usize) -> &[u32] {
        if x < self.width && y < self.height {
            &self.pixels[y * self.width + x..(y + 1) * self.width]
        } else {
            &[]
        }
    }

    /// # Safety
    ///
    /// `alloc` must be the allocator the canvas was built from.
    #[allow(unsafe_code)]
    pub(crate) unsafe fn release(self, alloc: &mut impl BufferAllocator) {
        // SAFETY: forwarded from the caller.
        unsafe { self.pixels.release(alloc) };
    }
}

impl core::fmt::Debug for Canvas {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "Canvas({}x{})", self.width, self.height)
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
