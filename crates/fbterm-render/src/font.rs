// SPDX-License-Identifier: MIT
//
// Font rasterizer — packed VGA-style bitmaps to a per-pixel lookup table.
//
// Input fonts are 256 glyphs, 8 pixels wide, one byte per row, MSB on the
// left. The blitter wants "is pixel (fx, fy) of glyph c set?" in its inner
// loop, so at init the bitmap is expanded into a `bool` table indexed
// `glyph × height × width`, where width includes the inter-glyph spacing.
//
// Spacing columns are blank, except for the VGA line-graphics range
// 0xC0–0xDF: those glyphs repeat their rightmost column into the spacing
// so box-drawing lines stay connected across cells, as a 9-dot VGA text
// mode does.
//
// With no font supplied the table stays blank (8×16, spacing 1). Cells
// still occupy their space and colors still paint, only glyph shapes are
// missing.

use core::ops::RangeInclusive;

use crate::error::InitError;
use crate::memory::{BufferAllocator, RawBuffer, Rollback};

/// Glyphs in every font.
pub const FONT_GLYPHS: usize = 256;

/// Pixel columns stored per bitmap row.
pub const FONT_BITMAP_WIDTH: usize = 8;

/// Codepoints whose spacing columns continue the last bitmap column.
pub const LINE_GRAPHICS: RangeInclusive<usize> = 0xC0..=0xDF;

/// Metrics used when no font is supplied.
pub const FALLBACK_HEIGHT: usize = 16;
pub const FALLBACK_SPACING: usize = 1;

// ─── Font ────────────────────────────────────────────────────────────────────

/// A borrowed packed bitmap font.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Font<'a> {
    bits: &'a [u8],
    height: usize,
    spacing: usize,
}

impl<'a> Font<'a> {
    /// A font of 256 glyphs, `height` rows each, with one column of spacing.
    ///
    /// # Errors
    ///
    /// [`InitError::FontTooShort`] when `bits` holds fewer than
    /// `256 × height` bytes.
    pub const fn new(bits: &'a [u8], height: usize) -> Result<Self, InitError> {
        let expected = FONT_GLYPHS.saturating_mul(height);
        if bits.len() < expected {
            return Err(InitError::FontTooShort {
                expected,
                got: bits.len(),
            });
        }
        Ok(Self {
            bits,
            height,
            spacing: FALLBACK_SPACING,
        })
    }

    /// Blank columns inserted to the right of every glyph.
    #[must_use]
    pub const fn with_spacing(self, spacing: usize) -> Self {
        Self { spacing, ..self }
    }

    #[must_use]
    pub const fn height(&self) -> usize {
        self.height
    }

    #[must_use]
    pub const fn spacing(&self) -> usize {
        self.spacing
    }

    /// Packed bytes of all glyphs (exactly `256 × height`).
    #[must_use]
    pub fn bits(&self) -> &'a [u8] {
        &self.bits[..FONT_GLYPHS * self.height]
    }
}

// ─── Rasterization ───────────────────────────────────────────────────────────

/// Expand packed glyph rows into `out`, `width` booleans per row.
///
/// `bits` holds `FONT_GLYPHS × height` bytes, `out` holds
/// `FONT_GLYPHS × height × width` entries, and `width >= 8`.
pub fn rasterize(bits: &[u8], height: usize, width: usize, out: &mut [bool]) {
    debug_assert!(width >= FONT_BITMAP_WIDTH);
    for glyph in 0..FONT_GLYPHS {
        let continues = LINE_GRAPHICS.contains(&glyph);
        for y in 0..height {
            let row = bits[glyph * height + y];
            let dst = &mut out[(glyph * height + y) * width..][..width];
            for (x, px) in dst.iter_mut().enumerate() {
                *px = if x < FONT_BITMAP_WIDTH {
                    row & (0x80 >> x) != 0
                } else {
                    continues && row & 1 != 0
                };
            }
        }
    }
}

// ─── GlyphTable ──────────────────────────────────────────────────────────────

/// Immutable rasterized font, owned by the backend.
pub struct GlyphTable {
    bits: RawBuffer<u8>,
    table: RawBuffer<bool>,
    width: usize,
    height: usize,
}

impl GlyphTable {
    /// Copy and rasterize `font`, or build a blank fallback table.
    pub(crate) fn new_in<A: BufferAllocator>(
        staged: &mut Rollback<'_, A>,
        font: Option<Font<'_>>,
    ) -> Result<Self, InitError> {
        let (height, width) = match font {
            Some(f) => (f.height, FONT_BITMAP_WIDTH + f.spacing),
            None => (FALLBACK_HEIGHT, FONT_BITMAP_WIDTH + FALLBACK_SPACING),
        };
        let bits = match font {
            Some(f) => staged.copied(f.bits())?,
            None => staged.filled(FONT_GLYPHS * height, 0u8)?,
        };
        let mut table = staged.filled(FONT_GLYPHS * height * width, false)?;
        rasterize(&bits, height, width, &mut table);
        Ok(Self {
            bits,
            table,
            width,
            height,
        })
    }

    /// Glyph width in font pixels, spacing included.
    #[inline]
    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    #[inline]
    #[must_use]
    pub const fn height(&self) -> usize {
        self.height
    }

    /// The packed source row `y` of glyph `ch`, if both exist.
    #[cfg(test)]
    pub(crate) fn source_row(&self, ch: u32, y: usize) -> Option<u8> {
        let glyph = usize::try_from(ch).ok().filter(|&g| g < FONT_GLYPHS)?;
        (y < self.height).then(|| self.bits[glyph * self.height + y])
    }

    /// The expanded pixels of glyph `ch`. Codepoints past the font are blank.
    #[inline]
    #[must_use]
    pub fn glyph(&self, ch: u32) -> Glyph<'_> {
        let size = self.width * self.height;
        let pixels = usize::try_from(ch)
            .ok()
            .filter(|&g| g < FONT_GLYPHS)
            .map(|g| &self.table[g * size..][..size]);
        Glyph {
            pixels,
            width: self.width,
        }
    }

    /// Hand both buffers back to the allocator.
    ///
    /// # Safety
    ///
    /// `alloc` must be the allocator the table was built from.
    #[allow(unsafe_code)]
    pub(crate) unsafe fn release(self, alloc: &mut impl BufferAllocator) {
        // SAFETY: forwarded from the caller.
        unsafe {
            self.bits.release(alloc);
            self.table.release(alloc);
        }
    }
}

/// One glyph's pixel lookup.
#[derive(Clone, Copy)]
pub struct Glyph<'a> {
    pixels: Option<&'a [bool]>,
    width: usize,
}

impl Glyph<'_> {
    /// Whether font pixel `(fx, fy)` is set.
    #[inline]
    #[must_use]
    pub fn is_set(&self, fx: usize, fy: usize) -> bool {
        self.pixels
            .and_then(|p| p.get(fy * self.width + fx))
            .copied()
            .unwrap_or(false)
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{CountingAllocator, test_font};
    use pretty_assertions::assert_eq;

    fn table(font: Option<Font<'_>>, alloc: &mut CountingAllocator) -> GlyphTable {
        let mut staged = Rollback::new(alloc);
        let t = GlyphTable::new_in(&mut staged, font).unwrap();
        staged.commit();
        t
    }

    fn row_of(glyph: Glyph<'_>, y: usize, width: usize) -> Vec<bool> {
        (0..width).map(|x| glyph.is_set(x, y)).collect()
    }

    // ── Font ─────────────────────────────────────────────────────────────

    #[test]
    fn short_font_is_rejected() {
        let bits = [0u8; 100];
        assert_eq!(
            Font::new(&bits, 16).unwrap_err(),
            InitError::FontTooShort {
                expected: 4096,
                got: 100
            }
        );
    }

    #[test]
    fn font_defaults_to_one_column_spacing() {
        let bits = test_font();
        let font = Font::new(&bits, 16).unwrap();
        assert_eq!(font.spacing(), 1);
        assert_eq!(font.with_spacing(0).spacing(), 0);
        assert_eq!(font.bits().len(), 4096);
    }

    // ── Rasterize ────────────────────────────────────────────────────────

    #[test]
    fn bits_expand_msb_first() {
        let mut bits = vec![0u8; FONT_GLYPHS];
        bits[b'A' as usize] = 0b1010_0001;
        let mut out = vec![false; FONT_GLYPHS * 9];
        rasterize(&bits, 1, 9, &mut out);

        let a = &out[b'A' as usize * 9..][..9];
        assert_eq!(a, &[true, false, true, false, false, false, false, true, false]);
    }

    #[test]
    fn line_graphics_repeat_last_column() {
        let mut bits = vec![0u8; FONT_GLYPHS];
        bits[0xC4] = 0b0000_0001;
        bits[0xE0] = 0b0000_0001;
        bits[0xBF] = 0b0000_0001;
        let mut out = vec![false; FONT_GLYPHS * 10];
        rasterize(&bits, 1, 10, &mut out);

        // Inside the range: spacing columns copy column 7.
        assert_eq!(&out[0xC4 * 10 + 7..][..3], &[true, true, true]);
        // Just outside on both ends: spacing stays blank.
        assert_eq!(&out[0xE0 * 10 + 7..][..3], &[true, false, false]);
        assert_eq!(&out[0xBF * 10 + 7..][..3], &[true, false, false]);
    }

    #[test]
    fn line_graphics_blank_last_column_stays_blank() {
        let mut bits = vec![0u8; FONT_GLYPHS];
        bits[0xC0] = 0b1000_0000;
        let mut out = vec![false; FONT_GLYPHS * 9];
        rasterize(&bits, 1, 9, &mut out);
        assert!(!out[0xC0 * 9 + 8]);
    }

    // ── GlyphTable ───────────────────────────────────────────────────────

    #[test]
    fn table_reproduces_source_rows() {
        let bits = test_font();
        let mut alloc = CountingAllocator::default();
        let t = table(Some(Font::new(&bits, 16).unwrap()), &mut alloc);

        assert_eq!(t.width(), 9);
        assert_eq!(t.height(), 16);
        let src = t.source_row(u32::from(b'X'), 3).unwrap();
        let expected: Vec<bool> = (0..8)
            .map(|x| src & (0x80 >> x) != 0)
            .chain(core::iter::once(false))
            .collect();
        assert_eq!(row_of(t.glyph(u32::from(b'X')), 3, 9), expected);

        unsafe { t.release(&mut alloc) };
        assert_eq!(alloc.live(), 0);
    }

    #[test]
    fn missing_font_is_blank_8x16() {
        let mut alloc = CountingAllocator::default();
        let t = table(None, &mut alloc);
        assert_eq!((t.width(), t.height()), (9, 16));
        for ch in [0u32, 65, 0xC4, 255] {
            let g = t.glyph(ch);
            assert!((0..16).all(|y| (0..9).all(|x| !g.is_set(x, y))));
        }
        unsafe { t.release(&mut alloc) };
    }

    #[test]
    fn codepoints_past_font_are_blank() {
        let bits = [0xffu8; FONT_GLYPHS * 2];
        let mut alloc = CountingAllocator::default();
        let t = table(Some(Font::new(&bits, 2).unwrap()), &mut alloc);
        assert!(t.glyph(255).is_set(0, 0));
        assert!(!t.glyph(256).is_set(0, 0));
        assert!(!t.glyph(u32::MAX).is_set(0, 0));
        assert_eq!(t.source_row(256, 0), None);
        unsafe { t.release(&mut alloc) };
    }

    #[test]
    fn spacing_widens_every_glyph() {
        let bits = test_font();
        let mut alloc = CountingAllocator::default();
        let t = table(Some(Font::new(&bits, 16).unwrap().with_spacing(3)), &mut alloc);
        assert_eq!(t.width(), 11);
        let g = t.glyph(u32::from(b'M'));
        assert!((0..16).all(|y| (8..11).all(|x| !g.is_set(x, y))));
        unsafe { t.release(&mut alloc) };
    }
}
