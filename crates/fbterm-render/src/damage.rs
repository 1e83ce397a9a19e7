// SPDX-License-Identifier: MIT
//
// Damage queue — pending cell writes between two flushes.
//
// Two fixed-size arrays, both `rows × cols` long:
//
//   queue: [QueuedCell]      entries in the order they were first staged
//   map:   [Option<usize>]   cell index → its live slot in `queue`
//
// Staging a cell:
//
//   map[i] = Some(slot)  → overwrite queue[slot].cell in place
//   map[i] = None        → if grid[i] already equals the cell, drop it;
//                          otherwise append and point map[i] at the slot
//
// So each cell index owns at most one slot per flush, the queue can never
// outgrow `rows × cols`, and a flush only visits cells that actually differ
// from what is on screen. Nothing here allocates after init.
//
// The flush drains slots in order and clears their map entries as it goes.
// A slot whose map entry no longer points back at it (the cursor pass took
// it) is skipped. Outside a flush, `compact` squeezes such slots out so
// `len` only counts live entries and the next append still fits.

use crate::cell::Cell;
use crate::error::InitError;
use crate::grid::Grid;
use crate::memory::{BufferAllocator, RawBuffer, Rollback};

/// One pending write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueuedCell {
    pub x: usize,
    pub y: usize,
    pub cell: Cell,
}

const UNUSED: QueuedCell = QueuedCell {
    x: 0,
    y: 0,
    cell: Cell::EMPTY,
};

pub struct DamageQueue {
    queue: RawBuffer<QueuedCell>,
    map: RawBuffer<Option<usize>>,
    len: usize,
}

impl DamageQueue {
    pub(crate) fn new_in<A: BufferAllocator>(
        staged: &mut Rollback<'_, A>,
        cells: usize,
    ) -> Result<Self, InitError> {
        Ok(Self {
            queue: staged.filled(cells, UNUSED)?,
            map: staged.filled(cells, None)?,
            len: 0,
        })
    }

    /// Number of slots used since the last flush.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Stage `cell` at `(x, y)`. Off-grid positions and writes that would
    /// not change the screen are dropped.
    pub fn stage(&mut self, grid: &Grid, x: usize, y: usize, cell: Cell) {
        let Some(index) = grid.index(x, y) else {
            return;
        };
        if let Some(slot) = self.map[index] {
            self.queue[slot].cell = cell;
            return;
        }
        if grid.at(index) == cell {
            return;
        }
        let slot = self.len;
        self.queue[slot] = QueuedCell { x, y, cell };
        self.map[index] = Some(slot);
        self.len += 1;
    }

    /// Pending payload for a cell index, if any.
    #[inline]
    #[must_use]
    pub fn pending(&self, index: usize) -> Option<Cell> {
        self.map[index].map(|slot| self.queue[slot].cell)
    }

    /// What the cell will hold after the next flush: pending or committed.
    #[inline]
    #[must_use]
    pub fn current(&self, grid: &Grid, index: usize) -> Cell {
        self.pending(index).unwrap_or_else(|| grid.at(index))
    }

    /// Remove and return the pending payload for a cell index.
    pub(crate) fn take(&mut self, index: usize) -> Option<Cell> {
        self.map[index].take().map(|slot| self.queue[slot].cell)
    }

    /// The entry in `slot` if it is still live.
    #[inline]
    pub(crate) fn live(&self, grid: &Grid, slot: usize) -> Option<(usize, QueuedCell)> {
        let entry = self.queue[slot];
        let index = grid.index(entry.x, entry.y)?;
        (self.map[index] == Some(slot)).then_some((index, entry))
    }

    /// Mark a cell index as flushed.
    #[inline]
    pub(crate) fn settle(&mut self, index: usize) {
        self.map[index] = None;
    }

    /// Drop dead slots, keeping live ones in staging order.
    pub(crate) fn compact(&mut self, grid: &Grid) {
        let mut kept = 0;
        for slot in 0..self.len {
            let Some((index, entry)) = self.live(grid, slot) else {
                continue;
            };
            self.queue[kept] = entry;
            self.map[index] = Some(kept);
            kept += 1;
        }
        self.len = kept;
    }

    /// Forget all slots. Every map entry must already be settled.
    pub(crate) fn reset(&mut self) {
        debug_assert!(self.map.iter().all(Option::is_none));
        self.len = 0;
    }

    /// # Safety
    ///
    /// `alloc` must be the allocator the queue was built from.
    #[allow(unsafe_code)]
    pub(crate) unsafe fn release(self, alloc: &mut impl BufferAllocator) {
        // SAFETY: forwarded from the caller.
        unsafe {
            self.queue.release(alloc);
            self.map.release(alloc);
        }
    }
}

impl core::fmt::Debug for DamageQueue {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_list().entries(self.queue[..self.len].iter()).finish()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
