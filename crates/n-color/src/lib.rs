// SPDX-License-Identifier: MIT
//
// n-color — the color primitives underneath n-tone.
//
// Design tokens carry colors as 6-digit sRGB hex strings, so this crate
// keeps colors in exactly that form: three 8-bit channels, no alpha, no
// perceptual space. Transparency only ever appears as an opacity applied
// while compositing one token over another, and the result of every
// composite is again an opaque 8-bit color that round-trips through hex.
//
// Two primitives sit on top of the color type:
//
//   contrast(a, b)          WCAG 2.1 relative-luminance contrast, [1, 21]
//   blend(fg, bg, opacity)  per-channel source-over compositing
//
// Everything the resolvers do (stepping through ramps, picking on-tones,
// validating live values) is built from these two.

pub mod color;
pub mod contrast;

pub use color::Color;
pub use contrast::{AA_THRESHOLD, contrast_ratio, meets_aa, relative_luminance};
