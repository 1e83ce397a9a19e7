// SPDX-License-Identifier: MIT
//
// Colors — 32-bit pixels, per-cell colors, and the ANSI palette.
//
// The framebuffer format is fixed at 32 bits per pixel, `0x00RRGGBB`.
// Everything the blitter writes is an `Rgb`. Cells carry a `CellColor`,
// which is either a concrete `Rgb` or `Transparent`. Transparent is resolved
// per pixel against the canvas at draw time, so text can sit on top of a
// wallpaper without the grid knowing what the wallpaper looks like.
//
// The palette holds the eight ANSI colors, their bright counterparts, and
// the default foreground/background pairs. Defaults match the classic VGA
// text-mode palette.

use core::fmt;

// ─── Rgb ─────────────────────────────────────────────────────────────────────

/// A packed 32-bit pixel in `0x00RRGGBB` layout.
///
/// ```
/// use fbterm_render::color::Rgb;
///
/// let c = Rgb::new(0xaa, 0x55, 0x00);
/// assert_eq!(c.to_u32(), 0x00aa_5500);
/// assert_eq!((c.r(), c.g(), c.b()), (0xaa, 0x55, 0x00));
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rgb(u32);

impl Rgb {
    pub const BLACK: Self = Self(0x0000_0000);
    pub const WHITE: Self = Self(0x00ff_ffff);

    /// Pack three channels into a pixel.
    #[inline]
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self(((r as u32) << 16) | ((g as u32) << 8) | b as u32)
    }

    /// Wrap a raw pixel value. The top byte is kept as-is.
    #[inline]
    #[must_use]
    pub const fn from_u32(raw: u32) -> Self {
        Self(raw)
    }

    /// The raw pixel value written to the framebuffer.
    #[inline]
    #[must_use]
    pub const fn to_u32(self) -> u32 {
        self.0
    }

    #[inline]
    #[must_use]
    pub const fn r(self) -> u8 {
        (self.0 >> 16) as u8
    }

    #[inline]
    #[must_use]
    pub const fn g(self) -> u8 {
        (self.0 >> 8) as u8
    }

    #[inline]
    #[must_use]
    pub const fn b(self) -> u8 {
        self.0 as u8
    }
}

impl fmt::Debug for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:06x}", self.0)
    }
}

impl From<u32> for Rgb {
    fn from(raw: u32) -> Self {
        Self(raw)
    }
}

// ─── CellColor ───────────────────────────────────────────────────────────────

/// Color of one half (foreground or background) of a cell.
///
/// `Transparent` means "whatever the canvas holds at this pixel". It is the
/// default background: text written before any SGR background lands on the
/// canvas, not on a flat fill.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CellColor {
    /// A concrete pixel color.
    Rgb(Rgb),

    /// Sample the canvas underneath.
    #[default]
    Transparent,
}

impl CellColor {
    /// Resolve against the canvas pixel `under`.
    ///
    /// ```
    /// use fbterm_render::color::{CellColor, Rgb};
    ///
    /// let under = 0x0012_3456;
    /// assert_eq!(CellColor::Transparent.resolve(under), under);
    /// assert_eq!(CellColor::Rgb(Rgb::WHITE).resolve(under), 0x00ff_ffff);
    /// ```
    #[inline]
    #[must_use]
    pub const fn resolve(self, under: u32) -> u32 {
        match self {
            Self::Rgb(rgb) => rgb.to_u32(),
            Self::Transparent => under,
        }
    }

    #[inline]
    #[must_use]
    pub const fn is_transparent(self) -> bool {
        matches!(self, Self::Transparent)
    }
}

impl fmt::Debug for CellColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rgb(rgb) => fmt::Debug::fmt(rgb, f),
            Self::Transparent => write!(f, "transparent"),
        }
    }
}

impl From<Rgb> for CellColor {
    fn from(rgb: Rgb) -> Self {
        Self::Rgb(rgb)
    }
}

// ─── Palette ─────────────────────────────────────────────────────────────────

/// Number of entries in each ANSI color bank.
pub const ANSI_COLORS: usize = 8;

/// Colors the backend resolves SGR indices and defaults against.
///
/// Immutable once handed to the backend. Build a custom one from
/// [`Palette::VGA`] with the `with_*` setters:
///
/// ```
/// use fbterm_render::color::{Palette, Rgb};
///
/// let palette = Palette::VGA.with_default_bg(Rgb::new(0x10, 0x10, 0x20));
/// assert_eq!(palette.default_bg, Rgb::new(0x10, 0x10, 0x20));
/// assert_eq!(palette.ansi[1], Rgb::new(0xaa, 0x00, 0x00));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    /// SGR 30–37 / 40–47.
    pub ansi: [Rgb; ANSI_COLORS],
    /// SGR 90–97 / 100–107.
    pub bright: [Rgb; ANSI_COLORS],
    /// Foreground after SGR 39.
    pub default_fg: Rgb,
    /// Canvas fill when no snapshot is supplied.
    pub default_bg: Rgb,
    pub default_fg_bright: Rgb,
    pub default_bg_bright: Rgb,
}

impl Palette {
    /// The VGA text-mode palette.
    pub const VGA: Self = Self {
        ansi: [
            Rgb::from_u32(0x0000_0000), // black
            Rgb::from_u32(0x00aa_0000), // red
            Rgb::from_u32(0x0000_aa00), // green
            Rgb::from_u32(0x00aa_5500), // brown
            Rgb::from_u32(0x0000_00aa), // blue
            Rgb::from_u32(0x00aa_00aa), // magenta
            Rgb::from_u32(0x0000_aaaa), // cyan
            Rgb::from_u32(0x00aa_aaaa), // grey
        ],
        bright: [
            Rgb::from_u32(0x0055_5555),
            Rgb::from_u32(0x00ff_5555),
            Rgb::from_u32(0x0055_ff55),
            Rgb::from_u32(0x00ff_ff55),
            Rgb::from_u32(0x0055_55ff),
            Rgb::from_u32(0x00ff_55ff),
            Rgb::from_u32(0x0055_ffff),
            Rgb::from_u32(0x00ff_ffff),
        ],
        default_fg: Rgb::from_u32(0x00aa_aaaa),
        default_bg: Rgb::from_u32(0x0000_0000),
        default_fg_bright: Rgb::from_u32(0x00ff_ffff),
        default_bg_bright: Rgb::from_u32(0x0055_5555),
    };

    #[must_use]
    pub const fn with_ansi(self, ansi: [Rgb; ANSI_COLORS]) -> Self {
        Self { ansi, ..self }
    }

    #[must_use]
    pub const fn with_bright(self, bright: [Rgb; ANSI_COLORS]) -> Self {
        Self { bright, ..self }
    }

    #[must_use]
    pub const fn with_default_fg(self, default_fg: Rgb) -> Self {
        Self { default_fg, ..self }
    }

    #[must_use]
    pub const fn with_default_bg(self, default_bg: Rgb) -> Self {
        Self { default_bg, ..self }
    }

    #[must_use]
    pub const fn with_default_fg_bright(self, default_fg_bright: Rgb) -> Self {
        Self {
            default_fg_bright,
            ..self
        }
    }

    #[must_use]
    pub const fn with_default_bg_bright(self, default_bg_bright: Rgb) -> Self {
        Self {
            default_bg_bright,
            ..self
        }
    }

    /// Normal-intensity color for an SGR index, `None` outside 0–7.
    #[inline]
    #[must_use]
    pub fn ansi(&self, index: usize) -> Option<Rgb> {
        self.ansi.get(index).copied()
    }

    /// Bright color for an SGR index, `None` outside 0–7.
    #[inline]
    #[must_use]
    pub fn bright(&self, index: usize) -> Option<Rgb> {
        self.bright.get(index).copied()
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::VGA
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
