// SPDX-License-Identifier: MIT
//
// FbTerm — the framebuffer terminal backend.
//
// Owns the allocator, the device handle and every buffer, and implements
// `TermBackend` on top of them. The moving parts:
//
//   raw_putchar / clear / scroll / move_character
//        │  stage cells (never touch pixels)
//        ▼
//   DamageQueue ──flush──▶ Blitter ──▶ Framebuffer
//        │                    ▲
//        └──── Grid ◀─────────┘  committed right after each cell is drawn
//
// A flush is three steps: the cursor paint (which may consume the pending
// write under the cursor), the damage pass in staging order, then erasing
// a cursor left behind. A cell whose colors did not change takes the
// pixel-diff path; anything else is drawn in full.
//
// All buffers are allocated in `new` through the caller's allocator and
// released in `Drop`, so nothing allocates or frees in steady state.

#![allow(unsafe_code)]

use core::mem::ManuallyDrop;

use bitflags::bitflags;
use log::{debug, trace, warn};

use crate::backend::{FlushStats, TermBackend};
use crate::blit::Blitter;
use crate::canvas::Canvas;
use crate::cell::Cell;
use crate::color::{CellColor, Palette, Rgb};
use crate::cursor::Cursor;
use crate::damage::DamageQueue;
use crate::device::Framebuffer;
use crate::error::InitError;
use crate::font::{FALLBACK_HEIGHT, FALLBACK_SPACING, FONT_BITMAP_WIDTH, Font, GlyphTable};
use crate::grid::{Geometry, Grid};
use crate::memory::{BufferAllocator, Rollback};
use crate::scroll::{self, ScrollRegion};

// ─── Modes ───────────────────────────────────────────────────────────────────

bitflags! {
    /// Backend switches the terminal core flips at runtime.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Modes: u8 {
        /// Draw the inverted cursor cell at flush time.
        const CURSOR      = 0b0000_0001;
        /// Writing past the bottom of the scroll region scrolls it.
        const AUTO_SCROLL = 0b0000_0010;
    }
}

impl Default for Modes {
    fn default() -> Self {
        Self::CURSOR | Self::AUTO_SCROLL
    }
}

// ─── Config ──────────────────────────────────────────────────────────────────

/// Everything `FbTerm::new` takes besides the allocator and framebuffer.
///
/// ```
/// use fbterm_render::term::Config;
///
/// let config = Config::new().with_scale(2, 2).with_margin(16);
/// assert_eq!((config.scale_x, config.scale_y, config.margin), (2, 2, 16));
/// assert!(config.font.is_none());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config<'a> {
    /// Glyph source. `None` draws blank 8×16 glyphs.
    pub font: Option<Font<'a>>,
    pub palette: Palette,
    /// Integer magnification per axis. 0 is treated as 1.
    pub scale_x: usize,
    pub scale_y: usize,
    /// Pixels kept clear on every side before the grid starts.
    pub margin: usize,
    /// Background picture, exactly `width × height` pixels. `None` fills
    /// with the palette's default background.
    pub canvas: Option<&'a [u32]>,
}

impl<'a> Config<'a> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            font: None,
            palette: Palette::VGA,
            scale_x: 1,
            scale_y: 1,
            margin: 0,
            canvas: None,
        }
    }

    #[must_use]
    pub const fn with_font(self, font: Font<'a>) -> Self {
        Self {
            font: Some(font),
            ..self
        }
    }

    #[must_use]
    pub const fn with_palette(self, palette: Palette) -> Self {
        Self { palette, ..self }
    }

    #[must_use]
    pub const fn with_scale(self, scale_x: usize, scale_y: usize) -> Self {
        Self {
            scale_x,
            scale_y,
            ..self
        }
    }

    #[must_use]
    pub const fn with_margin(self, margin: usize) -> Self {
        Self { margin, ..self }
    }

    #[must_use]
    pub const fn with_canvas(self, pixels: &'a [u32]) -> Self {
        Self {
            canvas: Some(pixels),
            ..self
        }
    }
}

impl Default for Config<'_> {
    fn default() -> Self {
        Self::new()
    }
}

// ─── State ───────────────────────────────────────────────────────────────────

/// The single save slot. A second save overwrites the first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SavedState {
    pub fg: CellColor,
    pub bg: CellColor,
    pub x: usize,
    pub y: usize,
}

/// Every allocator-backed buffer, released together.
struct Buffers {
    glyphs: GlyphTable,
    canvas: Canvas,
    grid: Grid,
    damage: DamageQueue,
}

impl Buffers {
    /// # Safety
    ///
    /// `alloc` must be the allocator all four were built from.
    unsafe fn release(self, alloc: &mut impl BufferAllocator) {
        // SAFETY: forwarded from the caller.
        unsafe {
            self.glyphs.release(alloc);
            self.canvas.release(alloc);
            self.grid.release(alloc);
            self.damage.release(alloc);
        }
    }
}

// ─── FbTerm ──────────────────────────────────────────────────────────────────

/// A terminal backend drawing into a linear 32-bit framebuffer.
pub struct FbTerm<A: BufferAllocator> {
    alloc: A,
    fb: Framebuffer,
    geometry: Geometry,
    bufs: ManuallyDrop<Buffers>,
    palette: Palette,
    fg: CellColor,
    bg: CellColor,
    cursor: Cursor,
    saved: SavedState,
    region: ScrollRegion,
    modes: Modes,
}

impl<A: BufferAllocator> FbTerm<A> {
    /// Lay out the grid, allocate every buffer from `alloc`, and paint the
    /// initial screen (canvas, blank grid, cursor at the origin).
    ///
    /// # Errors
    ///
    /// Any [`InitError`]. Buffers allocated before the failure are handed
    /// back to `alloc`.
    pub fn new(mut alloc: A, fb: Framebuffer, config: Config<'_>) -> Result<Self, InitError> {
        let (font_height, spacing) = match config.font {
            Some(font) => (font.height(), font.spacing()),
            None => {
                warn!("No font supplied, glyphs will render blank");
                (FALLBACK_HEIGHT, FALLBACK_SPACING)
            }
        };
        let geometry = Geometry::compute(
            fb.width(),
            fb.height(),
            FONT_BITMAP_WIDTH + spacing,
            font_height,
            config.scale_x,
            config.scale_y,
            config.margin,
        )?;

        let palette = config.palette;
        let fg = CellColor::Rgb(palette.default_fg);
        let blank = Cell::blank(fg, CellColor::Transparent);

        let mut staged = Rollback::new(&mut alloc);
        let glyphs = GlyphTable::new_in(&mut staged, config.font)?;
        let canvas = Canvas::new_in(
            &mut staged,
            fb.width(),
            fb.height(),
            config.canvas,
            palette.default_bg.to_u32(),
        )?;
        let grid = Grid::new_in(&mut staged, geometry.cols, geometry.rows, blank)?;
        let damage = DamageQueue::new_in(&mut staged, geometry.cells())?;
        staged.commit();

        debug!(
            "Framebuffer {}x{}: grid {}x{}, cell {}x{} px, origin ({}, {})",
            fb.width(),
            fb.height(),
            geometry.cols,
            geometry.rows,
            geometry.glyph_width,
            geometry.glyph_height,
            geometry.offset_x,
            geometry.offset_y,
        );

        let mut term = Self {
            alloc,
            fb,
            geometry,
            bufs: ManuallyDrop::new(Buffers {
                glyphs,
                canvas,
                grid,
                damage,
            }),
            palette,
            fg,
            bg: CellColor::Transparent,
            cursor: Cursor::default(),
            saved: SavedState {
                fg,
                bg: CellColor::Transparent,
                x: 0,
                y: 0,
            },
            region: ScrollRegion::full(geometry.rows),
            modes: Modes::default(),
        };
        term.clear(true);
        term.full_refresh();
        Ok(term)
    }

    #[must_use]
    pub const fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    /// Committed cells, as of the last flush.
    #[must_use]
    pub fn grid(&self) -> &Grid {
        &self.bufs.grid
    }

    /// Queue slots used since the last flush.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.bufs.damage.len()
    }

    /// What cell `(x, y)` will show after the next flush.
    #[must_use]
    pub fn current(&self, x: usize, y: usize) -> Option<Cell> {
        let index = self.bufs.grid.index(x, y)?;
        Some(self.bufs.damage.current(&self.bufs.grid, index))
    }

    #[must_use]
    pub const fn palette(&self) -> &Palette {
        &self.palette
    }

    /// Current `(fg, bg)` text colors.
    #[must_use]
    pub const fn text_colors(&self) -> (CellColor, CellColor) {
        (self.fg, self.bg)
    }

    #[must_use]
    pub const fn cursor(&self) -> &Cursor {
        &self.cursor
    }

    #[must_use]
    pub const fn saved_state(&self) -> &SavedState {
        &self.saved
    }

    #[must_use]
    pub const fn modes(&self) -> Modes {
        self.modes
    }

    fn blank(&self) -> Cell {
        Cell::blank(self.fg, self.bg)
    }

    fn stage(&mut self, x: usize, y: usize, cell: Cell) {
        let bufs = &mut *self.bufs;
        bufs.damage.stage(&bufs.grid, x, y, cell);
    }
}

impl<A: BufferAllocator> TermBackend for FbTerm<A> {
    fn rows(&self) -> usize {
        self.geometry.rows
    }

    fn cols(&self) -> usize {
        self.geometry.cols
    }

    fn raw_putchar(&mut self, ch: u8) {
        let cell = Cell::new(u32::from(ch), self.fg, self.bg);
        self.stage(self.cursor.x, self.cursor.y, cell);

        let cols = self.cols();
        self.cursor.x = (self.cursor.x + 1).min(cols);
        if self.cursor.x < cols {
            return;
        }
        if self.cursor.y == self.region.bottom {
            if self.modes.contains(Modes::AUTO_SCROLL) {
                self.cursor.x = 0;
                self.scroll();
            }
        } else if (self.cursor.y < self.region.bottom || self.modes.contains(Modes::AUTO_SCROLL))
            && self.cursor.y + 1 < self.rows()
        {
            self.cursor.x = 0;
            self.cursor.y += 1;
        }
    }

    fn clear(&mut self, move_cursor: bool) {
        let blank = self.blank();
        let bufs = &mut *self.bufs;
        for y in 0..bufs.grid.rows() {
            scroll::clear_row(&mut bufs.damage, &bufs.grid, y, blank);
        }
        if move_cursor {
            self.cursor.x = 0;
            self.cursor.y = 0;
        }
    }

    fn enable_cursor(&mut self) {
        self.modes.insert(Modes::CURSOR);
    }

    fn disable_cursor(&mut self) -> bool {
        let was = self.modes.contains(Modes::CURSOR);
        self.modes.remove(Modes::CURSOR);
        was
    }

    fn set_cursor_pos(&mut self, x: isize, y: isize) {
        let clamp = |v: isize, len: usize| {
            usize::try_from(v).map_or(0, |v| v.min(len.saturating_sub(1)))
        };
        self.cursor.x = clamp(x, self.cols());
        self.cursor.y = clamp(y, self.rows());
    }

    fn get_cursor_pos(&self) -> (usize, usize) {
        (self.cursor.x, self.cursor.y)
    }

    fn set_text_fg(&mut self, index: usize) {
        if let Some(rgb) = self.palette.ansi(index) {
            self.fg = rgb.into();
        }
    }

    fn set_text_bg(&mut self, index: usize) {
        if let Some(rgb) = self.palette.ansi(index) {
            self.bg = rgb.into();
        }
    }

    fn set_text_fg_bright(&mut self, index: usize) {
        if let Some(rgb) = self.palette.bright(index) {
            self.fg = rgb.into();
        }
    }

    fn set_text_bg_bright(&mut self, index: usize) {
        if let Some(rgb) = self.palette.bright(index) {
            self.bg = rgb.into();
        }
    }

    fn set_text_fg_rgb(&mut self, rgb: u32) {
        self.fg = Rgb::from_u32(rgb).into();
    }

    fn set_text_bg_rgb(&mut self, rgb: u32) {
        self.bg = Rgb::from_u32(rgb).into();
    }

    fn set_text_fg_default(&mut self) {
        self.fg = self.palette.default_fg.into();
    }

    fn set_text_bg_default(&mut self) {
        self.bg = CellColor::Transparent;
    }

    fn set_text_fg_default_bright(&mut self) {
        self.fg = self.palette.default_fg_bright.into();
    }

    fn set_text_bg_default_bright(&mut self) {
        self.bg = self.palette.default_bg_bright.into();
    }

    fn move_character(&mut self, new_x: usize, new_y: usize, old_x: usize, old_y: usize) {
        let bufs = &mut *self.bufs;
        let (Some(from), Some(_)) = (bufs.grid.index(old_x, old_y), bufs.grid.index(new_x, new_y)) else {
            return;
        };
        let cell = bufs.damage.current(&bufs.grid, from);
        bufs.damage.stage(&bufs.grid, new_x, new_y, cell);
    }

    fn scroll(&mut self) {
        let blank = self.blank();
        let bufs = &mut *self.bufs;
        scroll::scroll_up(&mut bufs.damage, &bufs.grid, self.region, blank);
    }

    fn revscroll(&mut self) {
        let blank = self.blank();
        let bufs = &mut *self.bufs;
        scroll::scroll_down(&mut bufs.damage, &bufs.grid, self.region, blank);
    }

    fn swap_palette(&mut self) {
        core::mem::swap(&mut self.fg, &mut self.bg);
    }

    fn save_state(&mut self) {
        self.saved = SavedState {
            fg: self.fg,
            bg: self.bg,
            x: self.cursor.x,
            y: self.cursor.y,
        };
    }

    fn restore_state(&mut self) {
        self.fg = self.saved.fg;
        self.bg = self.saved.bg;
        self.cursor.x = self.saved.x;
        self.cursor.y = self.saved.y;
    }

    fn scroll_region(&self) -> (usize, usize) {
        (self.region.top, self.region.bottom)
    }

    fn set_scroll_region(&mut self, top: usize, bottom: usize) {
        match ScrollRegion::new(top, bottom, self.rows()) {
            Some(region) => self.region = region,
            None => trace!("Ignoring scroll region [{top}, {bottom}]"),
        }
    }

    fn set_scroll_enabled(&mut self, enabled: bool) {
        self.modes.set(Modes::AUTO_SCROLL, enabled);
    }

    fn double_buffer_flush(&mut self) -> FlushStats {
        let enabled = self.modes.contains(Modes::CURSOR);
        let bufs = &mut *self.bufs;
        let mut blit = Blitter {
            geometry: &self.geometry,
            glyphs: &bufs.glyphs,
            canvas: &bufs.canvas,
            fb: &mut self.fb,
        };
        let mut stats = FlushStats::default();

        if enabled {
            if let Some(px) = self.cursor.paint(&mut blit, &mut bufs.grid, &mut bufs.damage) {
                stats.cursor_draws += 1;
                stats.pixels_written += px;
            }
        }

        for slot in 0..bufs.damage.len() {
            let Some((index, entry)) = bufs.damage.live(&bufs.grid, slot) else {
                continue;
            };
            let old = bufs.grid.at(index);
            if old.same_colors(&entry.cell) {
                stats.pixels_written += blit.plot_fast(&old, &entry.cell, entry.x, entry.y);
                stats.fast_blits += 1;
            } else {
                stats.pixels_written += blit.plot(&entry.cell, entry.x, entry.y);
                stats.full_blits += 1;
            }
            bufs.grid.commit(index, entry.cell);
            bufs.damage.settle(index);
        }

        if let Some(px) = self.cursor.erase(enabled, &mut blit, &bufs.grid) {
            stats.cursor_draws += 1;
            stats.pixels_written += px;
        }
        self.cursor.settle(enabled, bufs.grid.cols());
        bufs.damage.reset();

        trace!(
            "Flush: {} full, {} fast, {} cursor, {} px",
            stats.full_blits, stats.fast_blits, stats.cursor_draws, stats.pixels_written
        );
        stats
    }

    fn full_refresh(&mut self) -> FlushStats {
        let enabled = self.modes.contains(Modes::CURSOR);
        let bufs = &mut *self.bufs;
        let mut blit = Blitter {
            geometry: &self.geometry,
            glyphs: &bufs.glyphs,
            canvas: &bufs.canvas,
            fb: &mut self.fb,
        };
        let mut stats = FlushStats {
            pixels_written: blit.copy_canvas(),
            ..FlushStats::default()
        };

        let cols = bufs.grid.cols();
        for (index, cell) in bufs.grid.cells().iter().enumerate() {
            stats.pixels_written += blit.plot(cell, index % cols, index / cols);
            stats.full_blits += 1;
        }

        self.cursor.forget();
        if enabled {
            if let Some(px) = self.cursor.paint(&mut blit, &mut bufs.grid, &mut bufs.damage) {
                stats.cursor_draws += 1;
                stats.pixels_written += px;
            }
        }
        self.cursor.settle(enabled, cols);
        bufs.damage.compact(&bufs.grid);

        trace!("Full refresh: {} cells, {} px", stats.full_blits, stats.pixels_written);
        stats
    }

    fn deinit(self) {
        drop(self);
    }
}

impl<A: BufferAllocator> Drop for FbTerm<A> {
    fn drop(&mut self) {
        // SAFETY: `bufs` is taken exactly once, here, and never read again.
        let bufs = unsafe { ManuallyDrop::take(&mut self.bufs) };
        // SAFETY: every buffer in `bufs` was allocated from `self.alloc`.
        unsafe { bufs.release(&mut self.alloc) };
        debug!("Framebuffer terminal released");
    }
}

impl<A: BufferAllocator> core::fmt::Debug for FbTerm<A> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FbTerm")
            .field("geometry", &self.geometry)
            .field("cursor", &self.cursor)
            .field("fg", &self.fg)
            .field("bg", &self.bg)
            .field("region", &self.region)
            .field("modes", &self.modes)
            .field("pending", &self.bufs.damage.len())
            .finish_non_exhaustive()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
