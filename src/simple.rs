// SPDX-License-Identifier: MIT
//
// Simple init — a working terminal from nothing but a framebuffer.
//
// Picks the font magnification from the resolution so text stays legible
// on large panels, and leaves everything else at its default: VGA palette,
// no margin, no canvas snapshot. The scale thresholds sit a third above
// 1080p and 2160p, so a 1920×1080 panel still gets 1× (80+ columns of
// 9-pixel cells) and 2× only starts around 2560×1440:
//
//   width ≥ 2560 and height ≥ 1440   →  2×
//   width ≥ 5120 and height ≥ 2880   →  4×

use fbterm_render::{BufferAllocator, Config, FbTerm, Font, Framebuffer, InitError};
use log::debug;

/// Integer `(scale_x, scale_y)` for a `width × height` framebuffer.
///
/// ```
/// use fbterm::simple::auto_scale;
///
/// assert_eq!(auto_scale(1920, 1080), (1, 1));
/// assert_eq!(auto_scale(2560, 1440), (2, 2));
/// assert_eq!(auto_scale(5120, 2880), (4, 4));
/// ```
#[must_use]
pub const fn auto_scale(width: usize, height: usize) -> (usize, usize) {
    const fn over(base: usize) -> usize {
        base + base / 3
    }
    if width >= over(3840) && height >= over(2160) {
        (4, 4)
    } else if width >= over(1920) && height >= over(1080) {
        (2, 2)
    } else {
        (1, 1)
    }
}

/// Default configuration for a framebuffer, scaled by [`auto_scale`].
#[must_use]
pub const fn config_for<'a>(width: usize, height: usize) -> Config<'a> {
    let (scale_x, scale_y) = auto_scale(width, height);
    Config::new().with_scale(scale_x, scale_y)
}

/// Initialize with defaults and no font. Glyphs render blank, colors and
/// the cursor still show.
///
/// # Errors
///
/// See [`FbTerm::new`].
pub fn simple<A: BufferAllocator>(alloc: A, fb: Framebuffer) -> Result<FbTerm<A>, InitError> {
    let config = config_for(fb.width(), fb.height());
    debug!("Simple init at {}x scale", config.scale_x);
    FbTerm::new(alloc, fb, config)
}

/// Initialize with defaults and `font`.
///
/// # Errors
///
/// See [`FbTerm::new`].
pub fn simple_with_font<A: BufferAllocator>(
    alloc: A,
    fb: Framebuffer,
    font: Font<'_>,
) -> Result<FbTerm<A>, InitError> {
    let config = config_for(fb.width(), fb.height()).with_font(font);
    debug!("Simple init at {}x scale with a {}-row font", config.scale_x, font.height());
    FbTerm::new(alloc, fb, config)
}

// ─── Tests ───────────────────────────────────────────────────────────────────
