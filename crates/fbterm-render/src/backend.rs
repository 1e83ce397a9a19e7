// SPDX-License-Identifier: MIT
//
// Backend interface — what a terminal core drives.
//
// An escape-sequence interpreter decodes the byte stream and calls into a
// backend through this trait: put a character, move the cursor, pick a
// color, scroll, flush. The backend owns everything visual. The core owns
// parsing and terminal state that has no pixels attached (tab stops,
// charsets, modes).
//
// Every method is infallible. Positions outside the grid are ignored or
// clamped, color indices outside 0–7 are ignored.

// ─── FlushStats ──────────────────────────────────────────────────────────────

/// What a draw pass did, for profiling and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FlushStats {
    /// Cells redrawn in full (colors changed, or a full refresh).
    pub full_blits: usize,
    /// Cells redrawn through the pixel-diff path.
    pub fast_blits: usize,
    /// Cursor cells painted inverted or restored.
    pub cursor_draws: usize,
    /// Framebuffer pixels stored.
    pub pixels_written: usize,
}

impl FlushStats {
    /// Damage cells drawn, cursor excluded.
    #[inline]
    #[must_use]
    pub const fn cells_drawn(&self) -> usize {
        self.full_blits + self.fast_blits
    }
}

// ─── TermBackend ─────────────────────────────────────────────────────────────

/// Rendering entry points of a terminal backend.
///
/// Writes are staged and reach the screen at the next
/// [`double_buffer_flush`](TermBackend::double_buffer_flush).
pub trait TermBackend {
    /// Grid height in cells.
    fn rows(&self) -> usize;

    /// Grid width in cells.
    fn cols(&self) -> usize;

    /// Stage `ch` at the cursor in the current colors and advance, wrapping
    /// and scrolling as the scroll region and auto-scroll allow.
    fn raw_putchar(&mut self, ch: u8);

    /// Stage blanks in the current colors over the whole grid, and home the
    /// cursor if `move_cursor`.
    fn clear(&mut self, move_cursor: bool);

    fn enable_cursor(&mut self);

    /// Hide the cursor. Returns whether it was visible.
    fn disable_cursor(&mut self) -> bool;

    /// Move the cursor. Negative coordinates clamp to 0, coordinates past
    /// the grid clamp to the last column or row.
    fn set_cursor_pos(&mut self, x: isize, y: isize);

    /// Cursor position. `x` equals [`cols`](TermBackend::cols) while a wrap
    /// is pending.
    fn get_cursor_pos(&self) -> (usize, usize);

    /// Current text colors from ANSI palette entry `index` (0–7).
    fn set_text_fg(&mut self, index: usize);
    fn set_text_bg(&mut self, index: usize);
    fn set_text_fg_bright(&mut self, index: usize);
    fn set_text_bg_bright(&mut self, index: usize);

    /// Current text colors as `0x00RRGGBB`.
    fn set_text_fg_rgb(&mut self, rgb: u32);
    fn set_text_bg_rgb(&mut self, rgb: u32);

    /// Palette default foreground.
    fn set_text_fg_default(&mut self);

    /// Transparent background: the canvas shows through.
    fn set_text_bg_default(&mut self);

    fn set_text_fg_default_bright(&mut self);
    fn set_text_bg_default_bright(&mut self);

    /// Stage the current content of `(old_x, old_y)` at `(new_x, new_y)`.
    /// Ignored unless both positions are on the grid.
    fn move_character(&mut self, new_x: usize, new_y: usize, old_x: usize, old_y: usize);

    /// Scroll the scroll region up one line.
    fn scroll(&mut self);

    /// Scroll the scroll region down one line.
    fn revscroll(&mut self);

    /// Swap the current foreground and background.
    fn swap_palette(&mut self);

    /// Remember text colors and cursor position in the single save slot.
    fn save_state(&mut self);

    /// Restore what [`save_state`](TermBackend::save_state) last stored.
    fn restore_state(&mut self);

    /// Inclusive `(top, bottom)` rows of the scroll region.
    fn scroll_region(&self) -> (usize, usize);

    /// Set the scroll region. Ranges spanning fewer than two rows or
    /// reaching past the grid are ignored.
    fn set_scroll_region(&mut self, top: usize, bottom: usize);

    /// Whether writing past the bottom-right corner scrolls.
    fn set_scroll_enabled(&mut self, enabled: bool);

    /// Draw everything staged since the last flush.
    fn double_buffer_flush(&mut self) -> FlushStats;

    /// Redraw the whole screen from the canvas and the grid.
    fn full_refresh(&mut self) -> FlushStats;

    /// Release every buffer.
    fn deinit(self)
    where
        Self: Sized;
}
