// SPDX-License-Identifier: MIT
//
// fbterm — a terminal backend for bare framebuffers.
//
// This crate is the front door. It re-exports the rendering backend from
// `fbterm-render` and adds the one-call initializer for callers that just
// want text on screen:
//
//   fbterm-render → grid, damage queue, glyph blitter, cursor, lifecycle
//   simple        → resolution-based font scale + default configuration
//
// Everything is `no_std`. With the default `alloc` feature the backend can
// be built on the global allocator through `HeapAllocator`; without it the
// caller supplies any `BufferAllocator` (a kernel heap, a bump arena).

#![cfg_attr(not(test), no_std)]

pub mod simple;

pub use fbterm_render::*;
pub use simple::{simple, simple_with_font};
