// SPDX-License-Identifier: MIT
//
// Grid (what the screen shows as of the last flush) and the geometry that
// maps grid cells onto framebuffer pixels.
//
// The grid is a flat row-major `[Cell]`: `index = y * cols + x`. Only the
// flush writes it. Everything else reads it to answer "what is on screen
// right now?" (no-op elision, scroll sources, cursor inversion).
//
// Geometry:
//
//   ┌──────────────────── framebuffer width ─────────────────────┐
//   │ margin + half the remainder                                │
//   │   ┌──────┬──────┬──────┬─ … ─┐                             │
//   │   │ cell │ cell │ cell │     │  cell = glyph_w × glyph_h   │
//   │   ├──────┼──────┼──────┼─ … ─┤  glyph_w = (8 + spacing) ×  │
//   │   │      │      │      │     │            scale_x          │
//   │   └──────┴──────┴──────┴─ … ─┘                             │
//   └────────────────────────────────────────────────────────────┘
//
// cols = (width − 2·margin) / glyph_w, and what does not divide evenly is
// split between both sides, so the grid sits centered inside the margins.

use crate::cell::Cell;
use crate::error::InitError;
use crate::memory::{BufferAllocator, RawBuffer, Rollback};

// ─── Geometry ────────────────────────────────────────────────────────────────

/// Cell layout on the framebuffer.
///
/// ```
/// use fbterm_render::grid::Geometry;
///
/// // 9×16 font, no scaling, 8-pixel margin on a 1024×768 framebuffer.
/// let g = Geometry::compute(1024, 768, 9, 16, 1, 1, 8).unwrap();
/// assert_eq!((g.cols, g.rows), (112, 47));
/// assert_eq!((g.offset_x, g.offset_y), (8, 8));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    /// Font cell width in font pixels (bitmap columns plus spacing).
    pub font_width: usize,
    pub font_height: usize,
    pub scale_x: usize,
    pub scale_y: usize,
    /// On-screen cell width in pixels.
    pub glyph_width: usize,
    pub glyph_height: usize,
    pub cols: usize,
    pub rows: usize,
    /// Pixel position of cell (0, 0).
    pub offset_x: usize,
    pub offset_y: usize,
}

impl Geometry {
    /// Lay out cells of `font_width × font_height` font pixels, magnified by
    /// `scale_x × scale_y`, on a `width × height` framebuffer. A scale of 0
    /// is treated as 1.
    ///
    /// # Errors
    ///
    /// [`InitError::NoRoom`] when not a single row or column fits.
    pub fn compute(
        width: usize,
        height: usize,
        font_width: usize,
        font_height: usize,
        scale_x: usize,
        scale_y: usize,
        margin: usize,
    ) -> Result<Self, InitError> {
        let scale_x = scale_x.max(1);
        let scale_y = scale_y.max(1);
        let glyph_width = font_width.saturating_mul(scale_x);
        let glyph_height = font_height.saturating_mul(scale_y);

        let inner_w = width.saturating_sub(margin.saturating_mul(2));
        let inner_h = height.saturating_sub(margin.saturating_mul(2));
        let cols = inner_w.checked_div(glyph_width).unwrap_or(0);
        let rows = inner_h.checked_div(glyph_height).unwrap_or(0);

        if cols == 0 || rows == 0 {
            return Err(InitError::NoRoom {
                width,
                height,
                margin,
                cell_width: glyph_width,
                cell_height: glyph_height,
            });
        }

        Ok(Self {
            font_width,
            font_height,
            scale_x,
            scale_y,
            glyph_width,
            glyph_height,
            cols,
            rows,
            offset_x: margin + (inner_w % glyph_width) / 2,
            offset_y: margin + (inner_h % glyph_height) / 2,
        })
    }

    /// Total number of cells.
    #[inline]
    #[must_use]
    pub const fn cells(&self) -> usize {
        self.cols * self.rows
    }

    #[inline]
    #[must_use]
    pub const fn in_bounds(&self, x: usize, y: usize) -> bool {
        x < self.cols && y < self.rows
    }

    /// Top-left framebuffer pixel of cell `(x, y)`.
    #[inline]
    #[must_use]
    pub const fn cell_origin(&self, x: usize, y: usize) -> (usize, usize) {
        (
            self.offset_x + x * self.glyph_width,
            self.offset_y + y * self.glyph_height,
        )
    }
}

// ─── Grid ────────────────────────────────────────────────────────────────────

/// Committed on-screen cells.
pub struct Grid {
    cells: RawBuffer<Cell>,
    cols: usize,
    rows: usize,
}

impl Grid {
    pub(crate) fn new_in<A: BufferAllocator>(
        staged: &mut Rollback<'_, A>,
        cols: usize,
        rows: usize,
        fill: Cell,
    ) -> Result<Self, InitError> {
        Ok(Self {
            cells: staged.filled(cols * rows, fill)?,
            cols,
            rows,
        })
    }

    #[inline]
    #[must_use]
    pub const fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    #[must_use]
    pub const fn rows(&self) -> usize {
        self.rows
    }

    /// Flat index of `(x, y)`, or `None` off the grid.
    #[inline]
    #[must_use]
    pub const fn index(&self, x: usize, y: usize) -> Option<usize> {
        if x < self.cols && y < self.rows {
            Some(y * self.cols + x)
        } else {
            None
        }
    }

    #[inline]
    #[must_use]
    pub fn get(&self, x: usize, y: usize) -> Option<Cell> {
        self.index(x, y).map(|i| self.cells[i])
    }

    /// Cell at a flat index. Panics past the end, like slice indexing.
    #[inline]
    #[must_use]
    pub fn at(&self, index: usize) -> Cell {
        self.cells[index]
    }

    #[inline]
    pub(crate) fn commit(&mut self, index: usize, cell: Cell) {
        self.cells[index] = cell;
    }

    /// A whole row, for inspection.
    #[must_use]
    pub fn row(&self, y: usize) -> Option<&[Cell]> {
        (y < self.rows).then(|| &self.cells[y * self.cols..][..self.cols])
    }

    #[must_use]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// # Safety
    ///
    /// `alloc` must be the allocator the grid was built from.
    #[allow(unsafe_code)]
    pub(crate) unsafe fn release(self, alloc: &mut impl BufferAllocator) {
        // SAFETY: forwarded from the caller.
        unsafe { self.cells.release(alloc) };
    }
}

impl core::fmt::Debug for Grid {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        writeln!(f, "Grid({}x{})", self.cols, self.rows)?;
        for y in 0..self.rows {
            for cell in &self.cells[y * self.cols..][..self.cols] {
                let ch = char::from_u32(cell.ch).filter(char::is_ascii_graphic).unwrap_or(' ');
                write!(f, "{ch}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
