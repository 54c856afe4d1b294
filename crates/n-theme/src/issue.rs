//! Compliance issues and the report they are collected into.
//!
//! Issues are values, never errors: every resolver keeps going after
//! recording one. Severity decides what happens next. The watcher makes
//! one bounded auto-fix attempt for errors; warnings are only reported.

use std::fmt;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum IssueKind {
    /// A token the index skipped (bad color, out-of-range opacity).
    InvalidToken,
    /// Neither anchor reaches AA against a palette tone. The ramp itself
    /// needs adjusting, so this is never auto-fixed.
    OnTone,
    /// A stepping search tried every level of its ramp without success.
    Exhausted,
    /// A binding did not resolve. A named fallback was used or the
    /// property was skipped.
    Reference,
    /// A live foreground/background pair is below AA.
    Contrast,
    /// A brand-tier write was neither an indirection nor repairable.
    Validation,
}

impl IssueKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidToken => "invalid-token",
            Self::OnTone => "on-tone",
            Self::Exhausted => "exhausted",
            Self::Reference => "reference",
            Self::Contrast => "contrast",
            Self::Validation => "validation",
        }
    }
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Warning => "warning",
            Self::Error => "error",
        })
    }
}

// ---------------------------------------------------------------------------
// ComplianceIssue
// ---------------------------------------------------------------------------

/// One finding from a resolution or validation pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComplianceIssue {
    pub kind: IssueKind,
    /// Property name or document path the issue is about.
    pub locus: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub measured_ratio: Option<f64>,
    pub severity: Severity,
    pub message: String,
}

impl ComplianceIssue {
    #[must_use]
    pub fn warning(kind: IssueKind, locus: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            locus: locus.into(),
            measured_ratio: None,
            severity: Severity::Warning,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn error(kind: IssueKind, locus: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            ..Self::warning(kind, locus, message)
        }
    }

    #[must_use]
    pub const fn with_ratio(mut self, ratio: f64) -> Self {
        self.measured_ratio = Some(ratio);
        self
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// Identity of the issue across passes, ignoring the measured ratio
    /// and message wording.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        format!("{}:{}", self.kind, self.locus)
    }
}

impl fmt::Display for ComplianceIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}] {}: {}", self.severity, self.kind, self.locus, self.message)?;
        if let Some(ratio) = self.measured_ratio {
            write!(f, " ({ratio:.2}:1)")?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// ComplianceReport
// ---------------------------------------------------------------------------

/// An ordered issue list with text and JSON renderings.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ComplianceReport {
    issues: Vec<ComplianceIssue>,
}

impl ComplianceReport {
    #[must_use]
    pub const fn new() -> Self {
        Self { issues: Vec::new() }
    }

    pub fn push(&mut self, issue: ComplianceIssue) {
        self.issues.push(issue);
    }

    #[must_use]
    pub fn issues(&self) -> &[ComplianceIssue] {
        &self.issues
    }

    pub fn errors(&self) -> impl Iterator<Item = &ComplianceIssue> {
        self.issues.iter().filter(|i| i.is_error())
    }

    pub fn warnings(&self) -> impl Iterator<Item = &ComplianceIssue> {
        self.issues.iter().filter(|i| !i.is_error())
    }

    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.issues.iter().any(ComplianceIssue::is_error)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.issues.len()
    }

    /// One issue per line, then a summary line.
    #[must_use]
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        for issue in &self.issues {
            out.push_str(&issue.to_string());
            out.push('\n');
        }
        let errors = self.errors().count();
        let warnings = self.issues.len() - errors;
        out.push_str(&format!("{errors} error(s), {warnings} warning(s)\n"));
        out
    }

    /// Pretty-printed JSON: `{ "issues": [ { kind, locus, … } ] }`.
    ///
    /// # Errors
    ///
    /// Only if serialization itself fails, which plain issue data never does.
    pub fn render_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl From<Vec<ComplianceIssue>> for ComplianceReport {
    fn from(issues: Vec<ComplianceIssue>) -> Self {
        Self { issues }
    }
}

impl Extend<ComplianceIssue> for ComplianceReport {
    fn extend<T: IntoIterator<Item = ComplianceIssue>>(&mut self, iter: T) {
        self.issues.extend(iter);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn display_includes_ratio() {
        let issue = ComplianceIssue::error(IssueKind::Contrast, "--brand-light-layer-0-text", "below AA")
            .with_ratio(3.2);
        assert_eq!(
            issue.to_string(),
            "error[contrast] --brand-light-layer-0-text: below AA (3.20:1)"
        );
    }

    #[test]
    fn fingerprint_ignores_ratio() {
        let a = ComplianceIssue::error(IssueKind::Contrast, "--x", "a").with_ratio(3.0);
        let b = ComplianceIssue::error(IssueKind::Contrast, "--x", "b").with_ratio(4.0);
        assert_eq!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn report_partitions_by_severity() {
        let report = ComplianceReport::from(vec![
            ComplianceIssue::warning(IssueKind::OnTone, "--a", "ramp needs work"),
            ComplianceIssue::error(IssueKind::Contrast, "--b", "below AA"),
        ]);
        assert!(report.has_errors());
        assert_eq!(report.errors().count(), 1);
        assert_eq!(report.warnings().count(), 1);
        assert!(report.render_text().ends_with("1 error(s), 1 warning(s)\n"));
    }

    #[test]
    fn json_shape() {
        let report = ComplianceReport::from(vec![ComplianceIssue::warning(
            IssueKind::Reference,
            "themes.light.layers.layer-1.surface",
            "no token at color/teal/500",
        )]);
        let value: serde_json::Value = serde_json::from_str(&report.render_json().unwrap()).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "issues": [{
                    "kind": "reference",
                    "locus": "themes.light.layers.layer-1.surface",
                    "severity": "warning",
                    "message": "no token at color/teal/500"
                }]
            })
        );
    }
}
