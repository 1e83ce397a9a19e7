// SPDX-License-Identifier: MIT
//
// Initialization errors. Only construction can fail; once a backend exists
// every entry point clamps or ignores bad input instead of reporting it.

/// Why [`FbTerm::new`](crate::term::FbTerm::new) refused to build a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum InitError {
    /// The framebuffer pointer was null.
    #[error("framebuffer address is null")]
    NullFramebuffer,

    /// The pitch cannot hold one row of 32-bit pixels.
    #[error("pitch of {pitch} bytes is too small for {width} pixels of 4 bytes")]
    BadPitch { width: usize, pitch: usize },

    /// After margins, not even one cell fits horizontally or vertically.
    #[error("{width}x{height} framebuffer with margin {margin} cannot fit a {cell_width}x{cell_height} cell")]
    NoRoom {
        width: usize,
        height: usize,
        margin: usize,
        cell_width: usize,
        cell_height: usize,
    },

    /// The font blob is shorter than 256 glyphs of the given height.
    #[error("font holds {got} bytes, {expected} needed")]
    FontTooShort { expected: usize, got: usize },

    /// The canvas snapshot does not cover the framebuffer exactly.
    #[error("canvas snapshot holds {got} pixels, {expected} needed")]
    CanvasSize { expected: usize, got: usize },

    /// The buffer size overflows `isize`.
    #[error("buffer of {len} elements overflows the address space")]
    LayoutOverflow { len: usize },

    /// The allocator returned nothing.
    #[error("allocator could not provide {size} bytes")]
    OutOfMemory { size: usize },
}
