// SPDX-License-Identifier: MIT
//
// Glyph blitter — one cell onto the framebuffer.
//
// A cell covers `glyph_width × glyph_height` framebuffer pixels. Each screen
// pixel maps back to font pixel (gx / scale_x, gy / scale_y): integer
// magnification, nearest neighbor, no filtering. Set font pixels take the
// foreground, clear ones the background; a transparent color takes the
// canvas pixel at that position.
//
// Fast path: when only the glyph changed and both colors are the same, the
// pixels where old and new glyph agree already show the right color. Only
// font pixels whose bit flips are recomputed. For a typical character
// change that is a small fraction of the cell, and for a rewrite of the
// same glyph it is zero writes.
//
// The blitter borrows the font, canvas, and framebuffer for the duration of
// one draw pass. It never writes the canvas.

use crate::canvas::Canvas;
use crate::cell::Cell;
use crate::device::Framebuffer;
use crate::font::GlyphTable;
use crate::grid::Geometry;

pub struct Blitter<'a> {
    pub(crate) geometry: &'a Geometry,
    pub(crate) glyphs: &'a GlyphTable,
    pub(crate) canvas: &'a Canvas,
    pub(crate) fb: &'a mut Framebuffer,
}

impl Blitter<'_> {
    /// Draw `cell` at grid position `(x, y)`. Returns pixels written.
    pub fn plot(&mut self, cell: &Cell, x: usize, y: usize) -> usize {
        if !self.geometry.in_bounds(x, y) {
            return 0;
        }
        let (ox, oy) = self.geometry.cell_origin(x, y);
        let glyph = self.glyphs.glyph(cell.ch);
        let g = self.geometry;

        for gy in 0..g.glyph_height {
            let fy = gy / g.scale_y;
            let py = oy + gy;
            for fx in 0..g.font_width {
                let draw = glyph.is_set(fx, fy);
                for i in 0..g.scale_x {
                    let px = ox + fx * g.scale_x + i;
                    let under = self.canvas.get(px, py);
                    let color = if draw { cell.fg } else { cell.bg };
                    self.fb.write(px, py, color.resolve(under));
                }
            }
        }
        g.glyph_width * g.glyph_height
    }

    /// Redraw `(x, y)` from `old` to `new`, touching only pixels whose glyph
    /// bit differs. Falls back to [`plot`](Self::plot) when the colors
    /// differ. Returns pixels written.
    pub fn plot_fast(&mut self, old: &Cell, new: &Cell, x: usize, y: usize) -> usize {
        if !self.geometry.in_bounds(x, y) {
            return 0;
        }
        if !old.same_colors(new) {
            return self.plot(new, x, y);
        }
        let (ox, oy) = self.geometry.cell_origin(x, y);
        let old_glyph = self.glyphs.glyph(old.ch);
        let new_glyph = self.glyphs.glyph(new.ch);
        let g = self.geometry;
        let mut written = 0;

        for gy in 0..g.glyph_height {
            let fy = gy / g.scale_y;
            let py = oy + gy;
            for fx in 0..g.font_width {
                let draw = new_glyph.is_set(fx, fy);
                if old_glyph.is_set(fx, fy) == draw {
                    continue;
                }
                for i in 0..g.scale_x {
                    let px = ox + fx * g.scale_x + i;
                    let under = self.canvas.get(px, py);
                    let color = if draw { new.fg } else { new.bg };
                    self.fb.write(px, py, color.resolve(under));
                }
                written += g.scale_x;
            }
        }
        written
    }

    /// Copy the whole canvas to the framebuffer. Returns pixels written.
    pub fn copy_canvas(&mut self) -> usize {
        let mut written = 0;
        for y in 0..self.canvas.height() {
            written += self.fb.write_span(0, y, self.canvas.row_from(0, y));
        }
        written
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::{CellColor, Rgb};
    use crate::font::Font;
    use crate::memory::Rollback;
    use crate::testing::{CountingAllocator, Screen, test_font};
    use pretty_assertions::assert_eq;

    const RED: CellColor = CellColor::Rgb(Rgb::from_u32(0x00aa_0000));
    const BLUE: CellColor = CellColor::Rgb(Rgb::from_u32(0x0000_00aa));
    const WALLPAPER: u32 = 0x0012_3456;

    /// Font + canvas + geometry for a small screen, with a patterned canvas.
    struct Rig {
        alloc: CountingAllocator,
        geometry: Geometry,
        glyphs: GlyphTable,
        canvas: Canvas,
    }

    impl Rig {
        fn new(cols: usize, rows: usize, scale: usize) -> Self {
            let bits = test_font();
            let font = Font::new(&bits, 16).unwrap();
            let width = cols * 9 * scale;
            let height = rows * 16 * scale;
            let geometry = Geometry::compute(width, height, 9, 16, scale, scale, 0).unwrap();
            let snapshot: Vec<u32> = (0..width * height)
                .map(|i| WALLPAPER ^ u32::try_from(i % 251).unwrap())
                .collect();

            let mut alloc = CountingAllocator::default();
            let mut staged = Rollback::new(&mut alloc);
            let glyphs = GlyphTable::new_in(&mut staged, Some(font)).unwrap();
            let canvas = Canvas::new_in(&mut staged, width, height, Some(&snapshot), 0).unwrap();
            staged.commit();
            Self {
                alloc,
                geometry,
                glyphs,
                canvas,
            }
        }

        fn screen(&self) -> Screen {
            Screen::new(self.canvas.width(), self.canvas.height())
        }

        fn blitter<'a>(&'a self, fb: &'a mut Framebuffer) -> Blitter<'a> {
            Blitter {
                geometry: &self.geometry,
                glyphs: &self.glyphs,
                canvas: &self.canvas,
                fb,
            }
        }

        fn cell_pixels(&self, screen: &Screen, x: usize, y: usize) -> Vec<u32> {
            let (ox, oy) = self.geometry.cell_origin(x, y);
            screen.rect(ox, oy, self.geometry.glyph_width, self.geometry.glyph_height)
        }

        fn release(mut self) {
            unsafe {
                self.glyphs.release(&mut self.alloc);
                self.canvas.release(&mut self.alloc);
            }
            assert_eq!(self.alloc.live(), 0);
        }
    }

    fn cell(c: u8, fg: CellColor, bg: CellColor) -> Cell {
        Cell::new(u32::from(c), fg, bg)
    }

    // ── plot ─────────────────────────────────────────────────────────────

    #[test]
    fn plot_paints_fg_on_set_bits_and_bg_elsewhere() {
        let rig = Rig::new(2, 1, 1);
        let mut screen = rig.screen();
        let mut fb = screen.framebuffer();
        let written = rig.blitter(&mut fb).plot(&cell(b'A', RED, BLUE), 1, 0);
        assert_eq!(written, 9 * 16);

        let glyph = rig.glyphs.glyph(u32::from(b'A'));
        for fy in 0..16 {
            for fx in 0..9 {
                let expected = if glyph.is_set(fx, fy) { 0x00aa_0000 } else { 0x0000_00aa };
                assert_eq!(screen.pixel(9 + fx, fy), expected, "pixel ({fx}, {fy})");
            }
        }
        // Cell 0 untouched.
        assert!(rig.cell_pixels(&screen, 0, 0).iter().all(|&px| px == 0));
        rig.release();
    }

    #[test]
    fn transparent_bg_samples_canvas() {
        let rig = Rig::new(1, 1, 1);
        let mut screen = rig.screen();
        let mut fb = screen.framebuffer();
        rig.blitter(&mut fb).plot(&cell(b'A', RED, CellColor::Transparent), 0, 0);

        let glyph = rig.glyphs.glyph(u32::from(b'A'));
        for fy in 0..16 {
            for fx in 0..9 {
                let expected = if glyph.is_set(fx, fy) {
                    0x00aa_0000
                } else {
                    rig.canvas.get(fx, fy)
                };
                assert_eq!(screen.pixel(fx, fy), expected);
            }
        }
        rig.release();
    }

    #[test]
    fn transparent_fg_samples_canvas() {
        let rig = Rig::new(1, 1, 1);
        let mut screen = rig.screen();
        let mut fb = screen.framebuffer();
        rig.blitter(&mut fb).plot(&cell(b'#', CellColor::Transparent, BLUE), 0, 0);

        let glyph = rig.glyphs.glyph(u32::from(b'#'));
        for fy in 0..16 {
            for fx in 0..9 {
                if glyph.is_set(fx, fy) {
                    assert_eq!(screen.pixel(fx, fy), rig.canvas.get(fx, fy));
                }
            }
        }
        rig.release();
    }

    #[test]
    fn scale_replicates_font_pixels() {
        let rig = Rig::new(1, 1, 2);
        let mut screen = rig.screen();
        let mut fb = screen.framebuffer();
        let written = rig.blitter(&mut fb).plot(&cell(b'W', RED, BLUE), 0, 0);
        assert_eq!(written, 18 * 32);

        let glyph = rig.glyphs.glyph(u32::from(b'W'));
        for gy in 0..32 {
            for gx in 0..18 {
                let expected = if glyph.is_set(gx / 2, gy / 2) { 0x00aa_0000 } else { 0x0000_00aa };
                assert_eq!(screen.pixel(gx, gy), expected);
            }
        }
        rig.release();
    }

    #[test]
    fn plot_off_grid_writes_nothing() {
        let rig = Rig::new(2, 2, 1);
        let mut screen = rig.screen();
        let mut fb = screen.framebuffer();
        let mut blit = rig.blitter(&mut fb);
        assert_eq!(blit.plot(&cell(b'A', RED, BLUE), 2, 0), 0);
        assert_eq!(blit.plot_fast(&cell(b'A', RED, BLUE), &cell(b'B', RED, BLUE), 0, 2), 0);
        assert!(screen.raw().iter().all(|&px| px == 0));
        rig.release();
    }

    // ── plot_fast ────────────────────────────────────────────────────────

    #[test]
    fn fast_path_matches_full_plot() {
        let rig = Rig::new(1, 1, 1);
        let pairs = [(b'A', b'B'), (b'X', b' '), (b' ', b'M'), (0xC4, 0xB3), (b'q', b'q')];
        for (old, new) in pairs {
            for (fg, bg) in [(RED, BLUE), (RED, CellColor::Transparent), (CellColor::Transparent, BLUE)] {
                let old = cell(old, fg, bg);
                let new = cell(new, fg, bg);

                let mut fast = rig.screen();
                let mut fb = fast.framebuffer();
                rig.blitter(&mut fb).plot(&old, 0, 0);
                rig.blitter(&mut fb).plot_fast(&old, &new, 0, 0);

                let mut full = rig.screen();
                let mut fb = full.framebuffer();
                rig.blitter(&mut fb).plot(&new, 0, 0);

                assert_eq!(fast.raw(), full.raw(), "{old:?} → {new:?}");
            }
        }
        rig.release();
    }

    #[test]
    fn fast_path_scaled_matches_full_plot() {
        let rig = Rig::new(1, 1, 3);
        let old = cell(b'o', RED, CellColor::Transparent);
        let new = cell(b'0', RED, CellColor::Transparent);

        let mut fast = rig.screen();
        let mut fb = fast.framebuffer();
        rig.blitter(&mut fb).plot(&old, 0, 0);
        rig.blitter(&mut fb).plot_fast(&old, &new, 0, 0);

        let mut full = rig.screen();
        let mut fb = full.framebuffer();
        rig.blitter(&mut fb).plot(&new, 0, 0);

        assert_eq!(fast.raw(), full.raw());
        rig.release();
    }

    #[test]
    fn fast_path_writes_only_flipped_pixels() {
        let rig = Rig::new(1, 1, 1);
        let mut screen = rig.screen();
        screen.fill(0xdead_beef);
        let mut fb = screen.framebuffer();
        let a = cell(b'A', RED, BLUE);
        let b = cell(b'B', RED, BLUE);
        let written = rig.blitter(&mut fb).plot_fast(&a, &b, 0, 0);

        let (ga, gb) = (rig.glyphs.glyph(u32::from(b'A')), rig.glyphs.glyph(u32::from(b'B')));
        let mut flipped = 0;
        for fy in 0..16 {
            for fx in 0..9 {
                let px = screen.pixel(fx, fy);
                if ga.is_set(fx, fy) == gb.is_set(fx, fy) {
                    assert_eq!(px, 0xdead_beef);
                } else {
                    flipped += 1;
                    assert_ne!(px, 0xdead_beef);
                }
            }
        }
        assert_eq!(written, flipped);
        rig.release();
    }

    #[test]
    fn fast_path_same_glyph_writes_nothing() {
        let rig = Rig::new(1, 1, 1);
        let mut screen = rig.screen();
        let mut fb = screen.framebuffer();
        let a = cell(b'A', RED, BLUE);
        assert_eq!(rig.blitter(&mut fb).plot_fast(&a, &a, 0, 0), 0);
        rig.release();
    }

    #[test]
    fn fast_path_with_new_colors_falls_back() {
        let rig = Rig::new(1, 1, 1);
        let mut screen = rig.screen();
        let mut fb = screen.framebuffer();
        let written = rig
            .blitter(&mut fb)
            .plot_fast(&cell(b'A', RED, BLUE), &cell(b'A', BLUE, RED), 0, 0);
        assert_eq!(written, 9 * 16);
        rig.release();
    }

    // ── copy_canvas ──────────────────────────────────────────────────────

    #[test]
    fn copy_canvas_mirrors_every_pixel() {
        let rig = Rig::new(3, 2, 1);
        let mut screen = rig.screen();
        let mut fb = screen.framebuffer();
        let written = rig.blitter(&mut fb).copy_canvas();
        assert_eq!(written, 27 * 32);
        assert_eq!(screen.pixel(26, 31), rig.canvas.get(26, 31));
        assert_eq!(screen.pixel(5, 7), rig.canvas.get(5, 7));
        rig.release();
    }
}
