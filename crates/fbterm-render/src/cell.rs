// SPDX-License-Identifier: MIT
//
// Cell — the unit the grid, damage queue, and blitter trade in.
//
// A cell is a codepoint plus a foreground and background color. The glyph
// and its colors are one atomic value: they are staged, compared, committed,
// and drawn together, never piecewise. Equality is plain structural
// equality, which is what the damage queue uses to elide no-op writes.

use crate::color::CellColor;

/// Codepoint used for cleared cells.
pub const SPACE: u32 = b' ' as u32;

/// One character position on screen.
///
/// ```
/// use fbterm_render::cell::Cell;
/// use fbterm_render::color::{CellColor, Rgb};
///
/// let red = CellColor::Rgb(Rgb::new(0xaa, 0, 0));
/// let a = Cell::new(u32::from(b'A'), red, CellColor::Transparent);
/// let inv = a.inverted();
/// assert_eq!(inv.fg, CellColor::Transparent);
/// assert_eq!(inv.bg, red);
/// assert!(a.same_colors(&Cell::new(u32::from(b'B'), red, CellColor::Transparent)));
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cell {
    /// Codepoint, used directly as the glyph index.
    pub ch: u32,
    /// Color of set glyph pixels.
    pub fg: CellColor,
    /// Color of clear glyph pixels.
    pub bg: CellColor,
}

impl Cell {
    /// A space with transparent colors.
    pub const EMPTY: Self = Self::blank(CellColor::Transparent, CellColor::Transparent);

    #[inline]
    #[must_use]
    pub const fn new(ch: u32, fg: CellColor, bg: CellColor) -> Self {
        Self { ch, fg, bg }
    }

    /// A space in the given colors, as staged by clear and scroll.
    #[inline]
    #[must_use]
    pub const fn blank(fg: CellColor, bg: CellColor) -> Self {
        Self { ch: SPACE, fg, bg }
    }

    /// Same glyph with foreground and background swapped (cursor look).
    #[inline]
    #[must_use]
    pub const fn inverted(self) -> Self {
        Self {
            ch: self.ch,
            fg: self.bg,
            bg: self.fg,
        }
    }

    /// Whether both colors match, regardless of glyph.
    ///
    /// The flush uses this to pick the pixel-diff fast path.
    #[inline]
    #[must_use]
    pub fn same_colors(&self, other: &Self) -> bool {
        self.fg == other.fg && self.bg == other.bg
    }
}

impl Default for Cell {
    #[inline]
    fn default() -> Self {
        Self::EMPTY
    }
}

impl core::fmt::Debug for Cell {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match char::from_u32(self.ch) {
            Some(ch) => write!(f, "Cell({ch:?}")?,
            None => write!(f, "Cell({:#x}", self.ch)?,
        }
        write!(f, ", fg={:?}, bg={:?})", self.fg, self.bg)
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
