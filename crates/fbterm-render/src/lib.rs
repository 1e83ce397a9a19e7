// SPDX-License-Identifier: MIT
//
// fbterm-render — damage-tracked terminal rendering onto a raw framebuffer.
//
// The backend half of a freestanding terminal: a character grid drawn into
// linear 32-bit display memory, for bootloaders, kernels and early-boot
// consoles. No OS, no global allocator, no threads. An escape-sequence
// interpreter sits on top and drives it through `TermBackend`.
//
// Writes are staged in a damage queue and drawn at flush time, cell by
// cell, touching only pixels that change. A flush with nothing staged
// writes nothing. Colors may be transparent, showing a background canvas
// (a boot logo, a wallpaper) through the text.

#![cfg_attr(not(test), no_std)]

#[cfg(any(test, feature = "alloc"))]
extern crate alloc;

pub mod backend;
mod blit;
pub mod canvas;
pub mod cell;
pub mod color;
pub mod cursor;
pub mod damage;
pub mod device;
pub mod error;
pub mod font;
pub mod grid;
pub mod memory;
pub mod scroll;
pub mod term;

#[cfg(test)]
mod testing;

pub use backend::{FlushStats, TermBackend};
pub use cell::Cell;
pub use color::{CellColor, Palette, Rgb};
pub use device::Framebuffer;
pub use error::InitError;
pub use font::Font;
#[cfg(feature = "alloc")]
pub use memory::HeapAllocator;
pub use memory::BufferAllocator;
pub use term::{Config, FbTerm, Modes};
