//! The auto-fix storm guard.
//!
//! Two rules keep validation from fighting itself:
//!
//! 1. After a fix pass starts, no other fix pass runs until the cooldown
//!    has elapsed.
//! 2. An issue that survived a fix attempt is remembered by fingerprint
//!    and never auto-fixed again. It is still reported every pass.
//!
//! Time is passed in, never read here, so tests drive it explicitly.

use std::collections::BTreeSet;
use std::time::{Duration, Instant};

use n_theme::ComplianceIssue;

#[derive(Debug, Clone)]
pub struct FixGuard {
    cooldown: Duration,
    fixing_until: Option<Instant>,
    unfixable: BTreeSet<String>,
}

impl FixGuard {
    #[must_use]
    pub const fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            fixing_until: None,
            unfixable: BTreeSet::new(),
        }
    }

    /// Whether a fix pass is still inside its cooldown at `now`.
    #[must_use]
    pub fn is_fixing(&self, now: Instant) -> bool {
        self.fixing_until.is_some_and(|until| now < until)
    }

    /// Start a fix pass at `now`. Returns `false` while cooling down.
    pub fn begin(&mut self, now: Instant) -> bool {
        if self.is_fixing(now) {
            return false;
        }
        self.fixing_until = Some(now + self.cooldown);
        true
    }

    /// Whether `issue` may still be auto-fixed.
    #[must_use]
    pub fn is_fixable(&self, issue: &ComplianceIssue) -> bool {
        !self.unfixable.contains(&issue.fingerprint())
    }

    /// Remember that fixing `issue` didn't help.
    pub fn give_up(&mut self, issue: &ComplianceIssue) {
        self.unfixable.insert(issue.fingerprint());
    }

    /// Forget every remembered failure, e.g. after the snapshot changed.
    pub fn reset(&mut self) {
        self.unfixable.clear();
    }

    pub fn set_cooldown(&mut self, cooldown: Duration) {
        self.cooldown = cooldown;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use n_theme::IssueKind;

    #[test]
    fn cooldown_blocks_back_to_back_passes() {
        let start = Instant::now();
        let mut guard = FixGuard::new(Duration::from_millis(1000));
        assert!(!guard.is_fixing(start));
        assert!(guard.begin(start));
        assert!(guard.is_fixing(start + Duration::from_millis(999)));
        assert!(!guard.begin(start + Duration::from_millis(500)));
        assert!(guard.begin(start + Duration::from_millis(1000)));
    }

    #[test]
    fn failed_fixes_are_remembered_by_fingerprint() {
        let mut guard = FixGuard::new(Duration::ZERO);
        let issue = ComplianceIssue::error(IssueKind::Contrast, "--brand-light-layer-0-text", "2.10:1");
        assert!(guard.is_fixable(&issue));
        guard.give_up(&issue);
        // Same kind and locus, different measurement: still the same issue.
        let again = ComplianceIssue::error(IssueKind::Contrast, "--brand-light-layer-0-text", "2.30:1");
        assert!(!guard.is_fixable(&again));
        let other = ComplianceIssue::error(IssueKind::Contrast, "--brand-light-layer-1-text", "2.10:1");
        assert!(guard.is_fixable(&other));
        guard.reset();
        assert!(guard.is_fixable(&again));
    }
}
