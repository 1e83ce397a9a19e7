// SPDX-License-Identifier: MIT
//
// Test fixtures: an in-memory screen, an allocator that counts, a font.
#![allow(unsafe_code)]

use core::alloc::Layout;
use core::ptr::NonNull;

use crate::device::{BYTES_PER_PIXEL, Framebuffer};
use crate::font::FONT_GLYPHS;
use crate::memory::{BufferAllocator, HeapAllocator};

// ─── Screen ──────────────────────────────────────────────────────────────────

/// Heap memory standing in for display memory.
pub struct Screen {
    mem: Vec<u32>,
    width: usize,
    height: usize,
    stride: usize,
}

impl Screen {
    pub fn new(width: usize, height: usize) -> Self {
        Self::with_pitch(width, height, width * BYTES_PER_PIXEL)
    }

    pub fn with_pitch(width: usize, height: usize, pitch: usize) -> Self {
        let stride = pitch / BYTES_PER_PIXEL;
        Self {
            mem: vec![0; stride * height],
            width,
            height,
            stride,
        }
    }

    /// A device handle over this memory. The screen must outlive it.
    pub fn framebuffer(&mut self) -> Framebuffer {
        unsafe {
            Framebuffer::new(
                self.mem.as_mut_ptr(),
                self.width,
                self.height,
                self.stride * BYTES_PER_PIXEL,
            )
        }
        .unwrap()
    }

    pub fn raw(&self) -> &[u32] {
        &self.mem
    }

    pub fn pixel(&self, x: usize, y: usize) -> u32 {
        self.mem[y * self.stride + x]
    }

    /// Copy of a `w × h` rectangle, row by row.
    pub fn rect(&self, x: usize, y: usize, w: usize, h: usize) -> Vec<u32> {
        (y..y + h)
            .flat_map(|py| (x..x + w).map(move |px| (px, py)))
            .map(|(px, py)| self.pixel(px, py))
            .collect()
    }

    pub fn fill(&mut self, value: u32) {
        self.mem.fill(value);
    }
}

// ─── CountingAllocator ───────────────────────────────────────────────────────

/// Heap allocator that counts blocks and can be told to run dry.
#[derive(Debug, Default)]
pub struct CountingAllocator {
    allocations: usize,
    frees: usize,
    limit: Option<usize>,
}

impl CountingAllocator {
    /// Fail every allocation after the first `limit`.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            limit: Some(limit),
            ..Self::default()
        }
    }

    pub const fn allocations(&self) -> usize {
        self.allocations
    }

    pub const fn frees(&self) -> usize {
        self.frees
    }

    pub const fn live(&self) -> usize {
        self.allocations - self.frees
    }
}

unsafe impl BufferAllocator for CountingAllocator {
    fn allocate(&mut self, layout: Layout) -> Option<NonNull<u8>> {
        if self.limit.is_some_and(|limit| self.allocations >= limit) {
            return None;
        }
        let ptr = HeapAllocator.allocate(layout)?;
        self.allocations += 1;
        Some(ptr)
    }

    unsafe fn deallocate(&mut self, ptr: NonNull<u8>, layout: Layout) {
        self.frees += 1;
        unsafe { HeapAllocator.deallocate(ptr, layout) };
    }
}

// ─── Fonts ───────────────────────────────────────────────────────────────────

/// A 16-row font where every glyph except space has a distinct pattern.
pub fn test_font() -> Vec<u8> {
    let mut bits = vec![0u8; FONT_GLYPHS * 16];
    for glyph in 0..FONT_GLYPHS {
        if glyph == usize::from(b' ') {
            continue;
        }
        for y in 0..16 {
            #[allow(clippy::cast_possible_truncation)]
            let row = (glyph as u8).rotate_left(y as u32) ^ (y as u8).wrapping_mul(0x1d);
            bits[glyph * 16 + y] = row | 0x01;
        }
    }
    bits
}
