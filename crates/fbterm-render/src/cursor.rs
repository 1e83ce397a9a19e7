// SPDX-License-Identifier: MIT
//
// Cursor compositor.
//
// The cursor is never stored in the grid. At flush time its cell is drawn
// with fg and bg swapped, straight to the framebuffer, and the grid keeps
// the true cell. `painted` remembers where inverted pixels currently are,
// so a flush only touches the cursor when something changed:
//
//   before the damage pass   paint the target cell inverted if it moved,
//                            was never painted, or has a pending write
//                            (which is committed right there, so the
//                            damage pass skips it)
//   after the damage pass    if inverted pixels sit anywhere other than
//                            the current target, redraw that cell from
//                            the grid
//
// A flush with nothing pending and a cursor that did not move therefore
// writes no pixels at all, and at most one cell is ever inverted.

use crate::blit::Blitter;
use crate::damage::DamageQueue;
use crate::grid::Grid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Cursor {
    /// Column; may equal `cols` while a wrap is pending.
    pub x: usize,
    pub y: usize,
    painted: Option<(usize, usize)>,
}

impl Cursor {
    #[cfg(test)]
    pub(crate) const fn new(x: usize, y: usize) -> Self {
        Self { x, y, painted: None }
    }

    /// Cell the cursor is drawn on. A pending wrap draws on the last column.
    #[inline]
    #[must_use]
    pub const fn target(&self, cols: usize) -> (usize, usize) {
        let last = cols.saturating_sub(1);
        (if self.x < last { self.x } else { last }, self.y)
    }

    /// Where inverted pixels are on screen right now, if anywhere.
    #[must_use]
    pub const fn painted(&self) -> Option<(usize, usize)> {
        self.painted
    }

    /// Draw the cursor cell inverted if needed. Returns pixels written, or
    /// `None` when the screen already shows it.
    pub(crate) fn paint(
        &self,
        blit: &mut Blitter<'_>,
        grid: &mut Grid,
        damage: &mut DamageQueue,
    ) -> Option<usize> {
        let (x, y) = self.target(grid.cols());
        let index = grid.index(x, y)?;
        let pending = damage.take(index);
        if pending.is_none() && self.painted == Some((x, y)) {
            return None;
        }
        let cell = pending.unwrap_or_else(|| grid.at(index));
        let written = blit.plot(&cell.inverted(), x, y);
        if let Some(cell) = pending {
            grid.commit(index, cell);
        }
        Some(written)
    }

    /// The whole screen was repainted, so no inverted pixels remain.
    pub(crate) fn forget(&mut self) {
        self.painted = None;
    }

    /// Restore the cell under stale inverted pixels. Returns pixels written,
    /// or `None` when nothing was stale.
    pub(crate) fn erase(&self, enabled: bool, blit: &mut Blitter<'_>, grid: &Grid) -> Option<usize> {
        let (px, py) = self.painted?;
        if enabled && (px, py) == self.target(grid.cols()) {
            return None;
        }
        let cell = grid.get(px, py)?;
        Some(blit.plot(&cell, px, py))
    }

    /// Record what the screen shows after a draw pass.
    pub(crate) fn settle(&mut self, enabled: bool, cols: usize) {
        self.painted = enabled.then(|| self.target(cols));
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
