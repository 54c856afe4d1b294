//! The stepping engine — nearest compliant level on a color ramp.
//!
//! Given a start level `L` and a background, candidates are tried by ramp
//! position in alternating order, darker side first:
//!
//! ```text
//! L, L+1, L−1, L+2, L−2, …        (positions; +1 is the next darker level)
//! ```
//!
//! Steps count ramp positions, not level numbers. On the canonical
//! `000, 050, 100, …, 900, 1000` ramp the neighbours of `100` are `200` and
//! `050`, and `050` is visited before `000`.
//!
//! Positions past either end are skipped, so the walk continues on the
//! remaining side until every level has been tried exactly once. Each
//! candidate is composited over the background at the requested opacity
//! before its contrast is measured. The first candidate reaching
//! [`AA_THRESHOLD`] wins. If none does, the start level comes back marked
//! non-compliant and the caller reports it.
//!
//! The walk is bounded by the ramp length and uses no state beyond its
//! arguments, so identical inputs always give identical output.

use n_color::{AA_THRESHOLD, Color, contrast_ratio};
use n_token::{Level, Ramp};

use crate::issue::{ComplianceIssue, IssueKind};

/// Outcome of a stepping search.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    /// Chosen level: the first compliant one, or the start level.
    pub level: Level,
    /// The token color at `level`, before compositing.
    pub color: Color,
    /// `color` composited over the background.
    pub composite: Color,
    pub ratio: f64,
    pub compliant: bool,
    /// Levels examined, in order.
    pub tried: Vec<Level>,
}

impl Step {
    /// The exhaustion issue for a failed search, or `None` if compliant.
    #[must_use]
    pub fn issue(&self, locus: &str, ramp: &Ramp) -> Option<ComplianceIssue> {
        if self.compliant {
            return None;
        }
        Some(
            ComplianceIssue::warning(
                IssueKind::Exhausted,
                locus,
                format!(
                    "no level of ramp {:?} reaches AA; kept {}",
                    ramp.name(),
                    ramp.token(self.level)
                ),
            )
            .with_ratio(self.ratio),
        )
    }
}

/// Levels in the order the search visits them. A start level missing from
/// the ramp is replaced by the nearest existing one.
#[must_use]
pub fn search_order(ramp: &Ramp, start: Level) -> Vec<Level> {
    let Some(origin) = ramp
        .position(start)
        .or_else(|| ramp.nearest(start).and_then(|l| ramp.position(l)))
    else {
        return Vec::new();
    };

    let len = ramp.len();
    let mut positions = Vec::with_capacity(len);
    positions.push(origin);
    for distance in 1..len {
        if origin + distance < len {
            positions.push(origin + distance);
        }
        if distance <= origin {
            positions.push(origin - distance);
        }
    }

    positions
        .into_iter()
        .filter_map(|p| ramp.level_at(p))
        .collect()
}

/// Composite `fg` over `bg` at `opacity` and measure it against `bg`.
#[must_use]
pub fn measure(fg: Color, bg: Color, opacity: f64) -> (Color, f64) {
    let composite = fg.blend_over(bg, opacity);
    (composite, contrast_ratio(composite, bg))
}

/// Walk `ramp` from `start` until a level composited over `background` at
/// `opacity` reaches AA. Returns `None` only for an empty ramp.
#[must_use]
pub fn step_until_compliant(ramp: &Ramp, start: Level, background: Color, opacity: f64) -> Option<Step> {
    let order = search_order(ramp, start);
    let first = *order.first()?;
    let mut tried = Vec::with_capacity(order.len());

    for level in order {
        let Some(color) = ramp.color(level) else { continue };
        tried.push(level);
        let (composite, ratio) = measure(color, background, opacity);
        if ratio >= AA_THRESHOLD {
            tracing::trace!(ramp = ramp.name(), %level, ratio, "stepping: compliant");
            return Some(Step {
                level,
                color,
                composite,
                ratio,
                compliant: true,
                tried,
            });
        }
    }

    let color = ramp.color(first)?;
    let (composite, ratio) = measure(color, background, opacity);
    tracing::debug!(ramp = ramp.name(), start = %first, ratio, "stepping: ramp exhausted");
    Some(Step {
        level: first,
        color,
        composite,
        ratio,
        compliant: false,
        tried,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
