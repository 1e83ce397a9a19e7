// SPDX-License-Identifier: MIT
//
// Framebuffer — the handle to memory-mapped display memory.
//
// Safety: display memory is not ordinary coherent RAM. Every store goes
// through `write_volatile` so the compiler can neither drop nor merge nor
// reorder it. This is the only place in the crate that writes through the
// raw framebuffer pointer.
//
// The handle is write-only: the backend never reads pixels back from the
// device. What is on screen is known from the grid and the canvas.

#![allow(unsafe_code)]

use core::ptr::NonNull;

use crate::error::InitError;

/// Bytes per pixel. The pixel format is fixed at 32-bit `0x00RRGGBB`.
pub const BYTES_PER_PIXEL: usize = 4;

/// Write-only view of a linear 32-bpp framebuffer.
#[derive(Debug)]
pub struct Framebuffer {
    base: NonNull<u32>,
    width: usize,
    height: usize,
    /// Row stride in pixels (pitch in bytes / 4).
    stride: usize,
}

// SAFETY: the handle is the sole writer of its memory region; moving it to
// another context moves that exclusivity with it.
unsafe impl Send for Framebuffer {}

impl Framebuffer {
    /// Wrap a framebuffer of `width × height` pixels whose rows are `pitch`
    /// bytes apart.
    ///
    /// # Safety
    ///
    /// `base` must be 4-byte aligned and valid for volatile writes of
    /// `pitch × height` bytes for as long as the returned handle (and any
    /// backend built on it) lives, and nothing else may write that region
    /// concurrently.
    ///
    /// # Errors
    ///
    /// [`InitError::NullFramebuffer`] for a null `base`,
    /// [`InitError::BadPitch`] when a row of `width` pixels does not fit in
    /// `pitch` bytes.
    pub unsafe fn new(base: *mut u32, width: usize, height: usize, pitch: usize) -> Result<Self, InitError> {
        let base = NonNull::new(base).ok_or(InitError::NullFramebuffer)?;
        if width.checked_mul(BYTES_PER_PIXEL).is_none_or(|row| row > pitch) {
            return Err(InitError::BadPitch { width, pitch });
        }
        Ok(Self {
            base,
            width,
            height,
            stride: pitch / BYTES_PER_PIXEL,
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

    /// Row pitch in bytes.
    #[inline]
    #[must_use]
    pub const fn pitch(&self) -> usize {
        self.stride * BYTES_PER_PIXEL
    }

    /// Store one pixel. Out-of-bounds coordinates are ignored.
    #[inline]
    pub fn write(&mut self, x: usize, y: usize, pixel: u32) {
        if x >= self.width || y >= self.height {
            return;
        }
        // SAFETY: x < width <= stride and y < height, so the offset stays
        // inside the region promised to `new`.
        unsafe { self.base.add(y * self.stride + x).write_volatile(pixel) };
    }

    /// Store a run of pixels starting at `(x, y)`, clipped to the row.
    /// Returns how many were written.
    pub fn write_span(&mut self, x: usize, y: usize, pixels: &[u32]) -> usize {
        if x >= self.width || y >= self.height {
            return 0;
        }
        let count = pixels.len().min(self.width - x);
        // SAFETY: as in `write`; the span ends at or before column `width`.
        let row = unsafe { self.base.add(y * self.stride + x) };
        for (i, &px) in pixels[..count].iter().enumerate() {
            // SAFETY: i < count <= width - x.
            unsafe { row.add(i).write_volatile(px) };
        }
        count
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
