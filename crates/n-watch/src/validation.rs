//! Validation of what is live, as opposed to what was computed.
//!
//! The computation already reports everything it knows is wrong (exhausted
//! ramps, on-tones that can't reach AA, unresolved bindings) as warnings.
//! This pass looks at the registry instead, where user overrides and other
//! writers can break things after the fact:
//!
//! | Finding                                   | Kind         | Severity |
//! |-------------------------------------------|--------------|----------|
//! | computed property missing from registry   | `validation` | error    |
//! | literal in the brand or UI tier           | `validation` | error    |
//! | fixed `NN%` blend weight in those tiers   | `validation` | error    |
//! | live pair can't be evaluated              | `reference`  | error    |
//! | live pair below AA                        | `contrast`   | error    |
//!
//! Pairs the computation already flagged are skipped here so the same
//! problem is not reported twice.

use std::collections::BTreeSet;

use n_color::{AA_THRESHOLD, contrast_ratio};
use n_style::{StyleRegistry, eval_color};
use n_theme::{Computation, ComplianceIssue, IssueKind, PropertyMap};
use n_token::{PropertyName, PropertyValue, Tier};

/// Every live problem in `registry` measured against `computation`.
#[must_use]
pub fn live_issues<R: StyleRegistry + ?Sized>(computation: &Computation, registry: &R) -> Vec<ComplianceIssue> {
    let mut issues = Vec::new();

    for name in computation.map.names() {
        if registry.get(name).is_none() {
            issues.push(ComplianceIssue::error(IssueKind::Validation, name.as_str(), "not set"));
        }
    }

    for name in registry.names() {
        if !matches!(name.tier(), Tier::Brand | Tier::Ui) {
            continue;
        }
        let Some(text) = registry.get(&name) else { continue };
        let value = PropertyValue::parse(&text);
        if value.is_literal() {
            issues.push(ComplianceIssue::error(
                IssueKind::Validation,
                name.as_str(),
                format!("literal {text:?} in an indirection tier"),
            ));
        } else if value.has_fixed_weight() {
            issues.push(ComplianceIssue::error(
                IssueKind::Validation,
                name.as_str(),
                format!("fixed blend weight in {text:?}; must read an opacity token"),
            ));
        }
    }

    let known: BTreeSet<&str> = computation
        .issues
        .iter()
        .filter(|i| matches!(i.kind, IssueKind::Exhausted | IssueKind::OnTone))
        .map(|i| i.locus.as_str())
        .collect();
    for (fg, bg) in computation.map.pairs() {
        if known.contains(fg.as_str()) {
            continue;
        }
        if let Some(issue) = measure_pair(&computation.map, registry, fg, bg) {
            issues.push(issue);
        }
    }

    issues
}

/// The issue with one live pair, if any. An operand missing from the
/// registry is only an issue here when `computed` doesn't hold it either;
/// computed ones are reported as "not set" by [`live_issues`].
#[must_use]
pub fn measure_pair<R: StyleRegistry + ?Sized>(
    computed: &PropertyMap,
    registry: &R,
    fg: &PropertyName,
    bg: &PropertyName,
) -> Option<ComplianceIssue> {
    let colors = eval_color(registry, fg).and_then(|f| eval_color(registry, bg).map(|b| (f, b)));
    match colors {
        Ok((f, b)) => {
            let ratio = contrast_ratio(f, b);
            (ratio < AA_THRESHOLD).then(|| {
                ComplianceIssue::error(IssueKind::Contrast, fg.as_str(), format!("below AA on {bg}"))
                    .with_ratio(ratio)
            })
        }
        Err(n_style::EvalError::Missing(name)) if computed.contains(&name) => None,
        Err(err) => Some(ComplianceIssue::error(IssueKind::Reference, fg.as_str(), err.to_string())),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
