// SPDX-License-Identifier: MIT
//
// Scroll engine — shifting a row range by one line, at the damage level.
//
// Nothing moves on screen here. Each row's *current* content (pending write
// if there is one, committed cell otherwise) is staged one row up or down,
// and the row that opens up is staged as blanks. The next flush turns that
// into pixels, and cells whose content did not actually change (a blank row
// scrolling over a blank row) are elided by the queue.
//
//   scroll_up, region [1, 3]:      scroll_down, region [1, 3]:
//
//     0  aaaa      0  aaaa           0  aaaa      0  aaaa
//     1  bbbb  →   1  cccc           1  bbbb  →   1  ____
//     2  cccc      2  dddd           2  cccc      2  bbbb
//     3  dddd      3  ____           3  dddd      3  cccc
//     4  eeee      4  eeee           4  eeee      4  eeee
//
// Row order matters: reading row y after row y−1 was restaged would copy
// the new content twice, so scroll_up walks top→bottom and scroll_down
// walks bottom→top.

use crate::cell::Cell;
use crate::damage::DamageQueue;
use crate::grid::Grid;

/// Inclusive row range that scrolls.
///
/// ```
/// use fbterm_render::scroll::ScrollRegion;
///
/// let full = ScrollRegion::full(25);
/// assert_eq!((full.top, full.bottom), (0, 24));
/// assert_eq!(ScrollRegion::new(3, 10, 25), Some(ScrollRegion { top: 3, bottom: 10 }));
/// assert_eq!(ScrollRegion::new(10, 3, 25), None);
/// assert_eq!(ScrollRegion::new(3, 25, 25), None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollRegion {
    pub top: usize,
    pub bottom: usize,
}

impl ScrollRegion {
    /// Every row of a `rows`-high grid.
    #[must_use]
    pub const fn full(rows: usize) -> Self {
        Self {
            top: 0,
            bottom: rows.saturating_sub(1),
        }
    }

    /// `[top, bottom]` if it spans at least two rows of a `rows`-high grid.
    #[must_use]
    pub const fn new(top: usize, bottom: usize, rows: usize) -> Option<Self> {
        if top < bottom && bottom < rows {
            Some(Self { top, bottom })
        } else {
            None
        }
    }

}

#[cfg(test)]
impl ScrollRegion {
    const fn height(&self) -> usize {
        self.bottom - self.top + 1
    }

    const fn contains(&self, y: usize) -> bool {
        self.top <= y && y <= self.bottom
    }
}

/// Stage every cell of row `y` as `blank`.
pub fn clear_row(damage: &mut DamageQueue, grid: &Grid, y: usize, blank: Cell) {
    for x in 0..grid.cols() {
        damage.stage(grid, x, y, blank);
    }
}

/// Stage the region one row up and open a `blank` row at its bottom.
pub fn scroll_up(damage: &mut DamageQueue, grid: &Grid, region: ScrollRegion, blank: Cell) {
    let cols = grid.cols();
    for y in region.top + 1..=region.bottom {
        for x in 0..cols {
            let cell = damage.current(grid, y * cols + x);
            damage.stage(grid, x, y - 1, cell);
        }
    }
    clear_row(damage, grid, region.bottom, blank);
}

/// Stage the region one row down and open a `blank` row at its top.
pub fn scroll_down(damage: &mut DamageQueue, grid: &Grid, region: ScrollRegion, blank: Cell) {
    let cols = grid.cols();
    for y in (region.top..region.bottom).rev() {
        for x in (0..cols).rev() {
            let cell = damage.current(grid, y * cols + x);
            damage.stage(grid, x, y + 1, cell);
        }
    }
    clear_row(damage, grid, region.top, blank);
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::{CellColor, Rgb};
    use crate::memory::Rollback;
    use crate::testing::CountingAllocator;
    use pretty_assertions::assert_eq;

    struct Fixture {
        alloc: CountingAllocator,
        grid: Grid,
        damage: DamageQueue,
    }

    impl Fixture {
        /// A grid whose row `y` is filled with `'a' + y`, committed.
        fn lettered(cols: usize, rows: usize) -> Self {
            let mut alloc = CountingAllocator::default();
            let mut staged = Rollback::new(&mut alloc);
            let mut grid = Grid::new_in(&mut staged, cols, rows, Cell::EMPTY).unwrap();
            let damage = DamageQueue::new_in(&mut staged, cols * rows).unwrap();
            staged.commit();
            for y in 0..rows {
                for x in 0..cols {
                    grid.commit(y * cols + x, letter(y));
                }
            }
            Self { alloc, grid, damage }
        }

        /// Rows as strings, reading through pending writes.
        fn rows(&self) -> Vec<String> {
            let cols = self.grid.cols();
            (0..self.grid.rows())
                .map(|y| {
                    (0..cols)
                        .map(|x| {
                            let ch = self.damage.current(&self.grid, y * cols + x).ch;
                            char::from_u32(ch).unwrap_or('?')
                        })
                        .collect()
                })
                .collect()
        }

        fn release(mut self) {
            unsafe {
                self.grid.release(&mut self.alloc);
                self.damage.release(&mut self.alloc);
            }
            assert_eq!(self.alloc.live(), 0);
        }
    }

    fn letter(y: usize) -> Cell {
        let ch = u32::from(b'a') + u32::try_from(y).unwrap();
        Cell::new(ch, CellColor::Rgb(Rgb::WHITE), CellColor::Transparent)
    }

    fn blank() -> Cell {
        Cell::blank(CellColor::Rgb(Rgb::WHITE), CellColor::Transparent)
    }

    // ── ScrollRegion ─────────────────────────────────────────────────────

    #[test]
    fn region_contains_both_ends() {
        let r = ScrollRegion::new(2, 5, 10).unwrap();
        assert!(!r.contains(1));
        assert!(r.contains(2));
        assert!(r.contains(5));
        assert!(!r.contains(6));
        assert_eq!(r.height(), 4);
    }

    #[test]
    fn single_row_region_is_rejected() {
        assert_eq!(ScrollRegion::new(4, 4, 10), None);
    }

    // ── scroll_up ────────────────────────────────────────────────────────

    #[test]
    fn full_screen_scroll_up() {
        let mut f = Fixture::lettered(4, 4);
        scroll_up(&mut f.damage, &f.grid, ScrollRegion::full(4), blank());
        assert_eq!(f.rows(), ["bbbb", "cccc", "dddd", "    "]);
        assert_eq!(f.damage.len(), 16);
        f.release();
    }

    #[test]
    fn scroll_up_leaves_rows_outside_region_alone() {
        let mut f = Fixture::lettered(3, 5);
        scroll_up(&mut f.damage, &f.grid, ScrollRegion::new(1, 3, 5).unwrap(), blank());
        assert_eq!(f.rows(), ["aaa", "ccc", "ddd", "   ", "eee"]);
        for x in 0..3 {
            assert_eq!(f.damage.pending(x), None);
            assert_eq!(f.damage.pending(12 + x), None);
        }
        f.release();
    }

    #[test]
    fn scroll_up_carries_pending_writes() {
        let mut f = Fixture::lettered(3, 3);
        let z = Cell::new(u32::from(b'Z'), CellColor::Transparent, CellColor::Transparent);
        f.damage.stage(&f.grid, 1, 2, z);
        scroll_up(&mut f.damage, &f.grid, ScrollRegion::full(3), blank());
        assert_eq!(f.damage.pending(4), Some(z));
        f.release();
    }

    #[test]
    fn repeated_scrolls_stay_within_queue_capacity() {
        let mut f = Fixture::lettered(5, 4);
        for _ in 0..10 {
            scroll_up(&mut f.damage, &f.grid, ScrollRegion::full(4), blank());
        }
        assert!(f.damage.len() <= 20);
        assert_eq!(f.rows(), ["     "; 4]);
        f.release();
    }

    // ── scroll_down ──────────────────────────────────────────────────────

    #[test]
    fn full_screen_scroll_down() {
        let mut f = Fixture::lettered(4, 4);
        scroll_down(&mut f.damage, &f.grid, ScrollRegion::full(4), blank());
        assert_eq!(f.rows(), ["    ", "aaaa", "bbbb", "cccc"]);
        f.release();
    }

    #[test]
    fn scroll_down_inside_region() {
        let mut f = Fixture::lettered(2, 5);
        scroll_down(&mut f.damage, &f.grid, ScrollRegion::new(1, 3, 5).unwrap(), blank());
        assert_eq!(f.rows(), ["aa", "  ", "bb", "cc", "ee"]);
        f.release();
    }

    #[test]
    fn scroll_round_trip_restores_all_but_the_cleared_row() {
        let mut f = Fixture::lettered(3, 4);
        let region = ScrollRegion::full(4);
        scroll_up(&mut f.damage, &f.grid, region, blank());
        scroll_down(&mut f.damage, &f.grid, region, blank());
        assert_eq!(f.rows(), ["   ", "bbb", "ccc", "ddd"]);
        f.release();
    }
}
