//! WCAG 2.1 contrast measurement.
//!
//! The only color science this engine does: relative luminance and the
//! contrast ratio derived from it. Everything is measured on opaque colors;
//! callers composite first (see [`Color::blend_over`]) when a foreground is
//! drawn at reduced opacity.

use crate::color::Color;

/// Minimum contrast for normal-size text under WCAG 2.1 level AA.
pub const AA_THRESHOLD: f64 = 4.5;

/// Convert a single sRGB component to linear sRGB (remove gamma).
#[inline]
#[must_use]
pub fn srgb_to_linear(c: f64) -> f64 {
    if c <= 0.040_45 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

/// WCAG relative luminance in `[0, 1]`: the Rec. 709 weighted sum of the
/// linearized channels.
#[must_use]
pub fn relative_luminance(color: Color) -> f64 {
    let (r, g, b) = color.to_srgb();
    let [r, g, b] = [r, g, b].map(srgb_to_linear);
    0.2126f64.mul_add(r, 0.7152f64.mul_add(g, 0.0722 * b))
}

/// `(L1 + 0.05) / (L2 + 0.05)` with `L1` the lighter luminance, so the
/// ratio is in `[1, 21]` and order doesn't matter.
#[must_use]
pub fn contrast_ratio(fg: Color, bg: Color) -> f64 {
    let (a, b) = (relative_luminance(fg), relative_luminance(bg));
    (a.max(b) + 0.05) / (a.min(b) + 0.05)
}

/// Whether `fg` over `bg` meets [`AA_THRESHOLD`].
#[must_use]
pub fn meets_aa(fg: Color, bg: Color) -> bool {
    contrast_ratio(fg, bg) >= AA_THRESHOLD
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64, eps: f64) -> bool {
        (a - b).abs() < eps
    }

    // ── Relative luminance ──────────────────────────────────────────

    #[test]
    fn luminance_black_is_zero() {
        let lum = relative_luminance(Color::BLACK);
        assert!(approx_eq(lum, 0.0, 0.001), "Black luminance: {lum}");
    }

    #[test]
    fn luminance_white_is_one() {
        let lum = relative_luminance(Color::WHITE);
        assert!(approx_eq(lum, 1.0, 0.001), "White luminance: {lum}");
    }

    #[test]
    fn luminance_mid_gray() {
        let lum = relative_luminance(Color::rgb8(128, 128, 128));
        // sRGB 0.5 linearizes to ~0.216
        assert!(approx_eq(lum, 0.216, 0.005), "Mid-gray luminance: {lum}");
    }

    #[test]
    fn luminance_primaries() {
        let red = relative_luminance(Color::rgb8(255, 0, 0));
        let green = relative_luminance(Color::rgb8(0, 255, 0));
        let blue = relative_luminance(Color::rgb8(0, 0, 255));
        assert!(approx_eq(red, 0.2126, 0.001), "Red luminance: {red}");
        assert!(approx_eq(green, 0.7152, 0.001), "Green luminance: {green}");
        assert!(approx_eq(blue, 0.0722, 0.001), "Blue luminance: {blue}");
    }

    // ── Contrast ratio ──────────────────────────────────────────────

    #[test]
    fn contrast_black_white_is_21() {
        let ratio = contrast_ratio(Color::BLACK, Color::WHITE);
        assert!(approx_eq(ratio, 21.0, 0.01), "B/W contrast: {ratio}");
        let ratio = contrast_ratio(Color::WHITE, Color::BLACK);
        assert!(approx_eq(ratio, 21.0, 0.01), "W/B contrast: {ratio}");
    }

    #[test]
    fn contrast_same_color_is_1() {
        for c in [Color::BLACK, Color::WHITE, Color::rgb8(0xfa, 0x80, 0x72)] {
            let ratio = contrast_ratio(c, c);
            assert!(approx_eq(ratio, 1.0, 1e-9), "Same-color contrast: {ratio}");
        }
    }

    #[test]
    fn contrast_is_symmetric() {
        let samples = [
            Color::rgb8(204, 51, 77),
            Color::rgb8(26, 26, 102),
            Color::rgb8(0xfa, 0x80, 0x72),
            Color::rgb8(0x80, 0x80, 0x80),
            Color::WHITE,
            Color::BLACK,
        ];
        for a in samples {
            for b in samples {
                let ab = contrast_ratio(a, b);
                let ba = contrast_ratio(b, a);
                assert!(approx_eq(ab, ba, 1e-12), "Asymmetric {a}/{b}: {ab} vs {ba}");
            }
        }
    }

    #[test]
    fn contrast_stays_in_range() {
        for v in (0..=255u8).step_by(17) {
            let c = Color::rgb8(v, v / 2, 255 - v);
            for other in [Color::BLACK, Color::WHITE] {
                let ratio = contrast_ratio(c, other);
                assert!((1.0..=21.0 + 1e-9).contains(&ratio), "Out of range: {ratio}");
            }
        }
    }

    #[test]
    fn mid_gray_passes_on_black_only() {
        // #808080 sits at ~3.95 on white and ~5.3 on black.
        let gray = Color::rgb8(128, 128, 128);
        assert!(!meets_aa(gray, Color::WHITE));
        assert!(meets_aa(gray, Color::BLACK));
    }

    #[test]
    fn aa_threshold_is_inclusive() {
        // #767676 on white is the classic "just passes" gray (4.54:1).
        assert!(meets_aa(Color::rgb8(0x76, 0x76, 0x76), Color::WHITE));
        assert!(!meets_aa(Color::rgb8(0x77, 0x77, 0x77), Color::WHITE));
    }
}
