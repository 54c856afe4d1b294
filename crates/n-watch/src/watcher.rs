//! The compliance watcher.
//!
//! Owns the engine context, the property store, and the last computation,
//! and keeps the live registry compliant as either side changes:
//!
//! ```text
//!  mutation API ──► snapshot (deep-cloned docs) ──┐
//!                                                  │  flush()
//!  notify() / check() ──► live roots ─────────────┤
//!                                                  ▼
//!                       compute ─► diff ─► affected = closure(roots) ─► one write each
//!                                                  │
//!                                  overrides: keep if AA, else replace + report
//! ```
//!
//! Work is batched. Mutations and notifications only queue; [`flush`]
//! processes everything queued in one deterministic pass, so a burst of
//! related changes re-derives each affected property exactly once.
//!
//! Two flags back this up. `updating` is set for the whole pass, and any
//! notification or nested flush that arrives meanwhile is dropped. The
//! [`FixGuard`] time-boxes auto-fix passes and remembers issues a fix
//! could not clear.
//!
//! [`flush`]: ComplianceWatcher::flush

use std::collections::BTreeSet;
use std::time::Instant;

use n_color::Color;
use n_style::{ChangeEvent, PropertyStore, StyleRegistry, ValidationError, Verdict, eval_color};
use n_theme::anchor::CoreSlot;
use n_theme::layer::surface_doc_path;
use n_theme::palette::{Palette, pick_on_tone};
use n_theme::{
    Binding, ComplianceIssue, ComplianceReport, Computation, Context, EngineOptions, IssueKind, compute,
};
use n_token::{Document, LayerId, Level, Mode, PropertyName, PropertyValue, Reference, Tier, TokenPath, TokenValue};
use serde_json::{Value, json};

use crate::dirty::Dirty;
use crate::graph::DependencyGraph;
use crate::guard::FixGuard;
use crate::validation::{live_issues, measure_pair};
use crate::watch::{WatchSet, WatchTarget};

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

/// What one flush did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlushReport {
    /// Whether the property map was computed again.
    pub recomputed: bool,
    /// Properties re-derived and written, each once.
    pub written: Vec<PropertyName>,
    pub removed: Vec<PropertyName>,
    /// Live overrides folded back into the snapshot.
    pub adopted: Vec<PropertyName>,
    /// Overrides left in place.
    pub kept_overrides: Vec<PropertyName>,
    /// Overrides that failed AA and were replaced.
    pub replaced_overrides: Vec<PropertyName>,
    pub issues: Vec<ComplianceIssue>,
}

impl FlushReport {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.written.is_empty()
            && self.removed.is_empty()
            && self.kept_overrides.is_empty()
            && self.replaced_overrides.is_empty()
    }
}

/// What one validation pass found and fixed.
#[derive(Debug, Clone, Default)]
pub struct ValidationOutcome {
    /// Computation issues plus everything found live.
    pub report: ComplianceReport,
    /// Properties whose errors the fix pass cleared.
    pub fixed: Vec<PropertyName>,
    /// Properties whose errors survived the fix pass. Not retried.
    pub gave_up: Vec<PropertyName>,
    /// Fixable errors were found but the guard refused a fix pass.
    pub fix_skipped: bool,
}

// ---------------------------------------------------------------------------
// ComplianceWatcher
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct ComplianceWatcher<R: StyleRegistry> {
    ctx: Context,
    store: PropertyStore<R>,
    current: Computation,
    graph: DependencyGraph,
    watch: WatchSet,
    dirty: Dirty,
    /// Live properties reported changed since the last flush.
    live_roots: BTreeSet<PropertyName>,
    /// Palettes set since the last flush, announced once their tones exist.
    changed_palettes: BTreeSet<(Mode, String)>,
    outbox: Vec<ChangeEvent>,
    guard: FixGuard,
    enabled: bool,
    updating: bool,
    attached: bool,
}

impl<R: StyleRegistry> ComplianceWatcher<R> {
    /// Compute the initial map for `ctx`. Nothing is written until
    /// [`attach`](Self::attach).
    pub fn new(ctx: Context, registry: R) -> Self {
        let current = compute(&ctx);
        let graph = DependencyGraph::from_map(&current.map);
        let guard = FixGuard::new(ctx.options().fix_cooldown());
        Self {
            ctx,
            store: PropertyStore::new(registry),
            current,
            graph,
            watch: WatchSet::new(),
            dirty: Dirty::empty(),
            live_roots: BTreeSet::new(),
            changed_palettes: BTreeSet::new(),
            outbox: Vec::new(),
            guard,
            enabled: true,
            updating: false,
            attached: false,
        }
    }

    // ─── Lifecycle ───────────────────────────────────────────────────────

    /// Apply the full map, then run the startup validation.
    pub fn attach(&mut self) -> ValidationOutcome {
        self.attach_at(Instant::now())
    }

    /// [`attach`](Self::attach) with an explicit clock. Startup validation
    /// runs only on the first call.
    pub fn attach_at(&mut self, now: Instant) -> ValidationOutcome {
        self.updating = true;
        let applied = self.store.apply(&self.current.map, self.ctx.index());
        self.forward_store_events();
        self.watch.record(&self.current.map, self.store.registry());
        self.watch.remember(self.store.registry(), self.current.map.names());
        self.updating = false;

        if self.attached {
            let mut outcome = ValidationOutcome::default();
            outcome.report.extend(applied.issues());
            return outcome;
        }
        self.attached = true;
        let mut outcome = self.validate_at(now);
        outcome.report.extend(applied.issues());
        tracing::info!(
            properties = self.current.map.len(),
            errors = outcome.report.errors().count(),
            warnings = outcome.report.warnings().count(),
            "startup validation finished"
        );
        outcome
    }

    /// Stop processing. Mutations and notifications are still queued.
    pub fn disable(&mut self) {
        self.enabled = false;
        tracing::debug!("watcher disabled");
    }

    /// Resume processing. Everything queued meanwhile goes into the next
    /// flush.
    pub fn enable(&mut self) {
        self.enabled = true;
        tracing::debug!(pending = ?self.dirty, "watcher enabled");
    }

    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Whether a pass is in progress.
    #[must_use]
    pub const fn is_updating(&self) -> bool {
        self.updating
    }

    /// Whether an auto-fix pass is still cooling down at `now`.
    #[must_use]
    pub fn is_fixing(&self, now: Instant) -> bool {
        self.guard.is_fixing(now)
    }

    #[must_use]
    pub const fn dirty(&self) -> Dirty {
        self.dirty
    }

    // ─── Accessors ───────────────────────────────────────────────────────

    #[must_use]
    pub const fn context(&self) -> &Context {
        &self.ctx
    }

    /// The last computation the registry was brought in line with.
    #[must_use]
    pub const fn computation(&self) -> &Computation {
        &self.current
    }

    #[must_use]
    pub const fn store(&self) -> &PropertyStore<R> {
        &self.store
    }

    /// Direct store access. Writes made here are seen by the next
    /// [`check`](Self::check) only for watched names, or after
    /// [`notify`](Self::notify).
    pub const fn store_mut(&mut self) -> &mut PropertyStore<R> {
        &mut self.store
    }

    #[must_use]
    pub const fn registry(&self) -> &R {
        self.store.registry()
    }

    /// Drain outgoing change events.
    pub fn take_events(&mut self) -> Vec<ChangeEvent> {
        std::mem::take(&mut self.outbox)
    }

    // ─── Interest ────────────────────────────────────────────────────────

    /// Watch `target`, taking the current live values as the baseline.
    pub fn watch(&mut self, target: WatchTarget) {
        let names = target.expand(&self.current.map);
        self.watch.remember(self.store.registry(), &names);
        if self.watch.insert(target) {
            tracing::debug!(names = names.len(), "watch registered");
        }
    }

    pub fn unwatch(&mut self, target: &WatchTarget) -> bool {
        self.watch.remove(target)
    }

    pub fn watch_palette(&mut self, mode: Mode, key: &str) {
        self.watch(WatchTarget::Palette {
            mode,
            key: key.to_string(),
        });
    }

    pub fn watch_layer_surface(&mut self, mode: Mode, layer: LayerId) {
        self.watch(WatchTarget::Surface { mode, layer });
    }

    pub fn watch_core_color(&mut self, mode: Mode, slot: CoreSlot) {
        self.watch(WatchTarget::Core { mode, slot });
    }

    pub fn watch_property(&mut self, name: PropertyName) {
        self.watch(WatchTarget::Property(name));
    }

    // ─── Mutation ────────────────────────────────────────────────────────

    /// Set a token's `$value`. Color tokens may be addressed by alias;
    /// other tokens by their flattened key.
    pub fn set_token(&mut self, path: &TokenPath, value: Value) {
        let path = self.ctx.index().canonicalize(path).unwrap_or_else(|| path.clone());
        let doc_path = token_doc_path(self.ctx.tokens(), &path);
        let segments: Vec<&str> = doc_path.iter().map(String::as_str).collect();
        let mut tokens = self.ctx.tokens().clone();
        tokens.set_leaf(&segments, value);
        self.ctx.replace_tokens(tokens);
        self.dirty |= Dirty::TOKENS;
        self.outbox.push(ChangeEvent::TokenChanged(vec![PropertyName::token(&path)]));
    }

    /// Bind palette `key` of `mode` to the color ramp `family`.
    pub fn set_palette(&mut self, mode: Mode, key: &str, family: &str, primary: Option<Level>) {
        let mut node = json!({ "$value": Reference::Ramp(family.to_string()).to_string() });
        if let Some(level) = primary {
            node["$primary"] = json!(level.to_string());
        }
        let mut theme = self.ctx.theme().clone();
        theme.set_node(&["themes", mode.as_str(), "palettes", key], node);
        self.ctx.replace_theme(theme);
        self.dirty |= Dirty::THEME;
        self.changed_palettes.insert((mode, key.to_string()));
    }

    /// Remove palette `key` of `mode`. Returns whether it existed.
    pub fn delete_palette(&mut self, mode: Mode, key: &str) -> bool {
        let mut theme = self.ctx.theme().clone();
        if theme.remove(&["themes", mode.as_str(), "palettes", key]).is_none() {
            return false;
        }
        self.ctx.replace_theme(theme);
        self.dirty |= Dirty::THEME;
        self.changed_palettes.remove(&(mode, key.to_string()));

        let mut names = Vec::new();
        for name in self.current.map.names() {
            if let Some(Binding::PaletteTone { mode: m, key: k, level }) = self.current.map.binding(name) {
                if *m == mode && k == key {
                    names.push(name.clone());
                    names.push(Palette::on_tone_property(mode, key, *level));
                }
            }
        }
        self.outbox.push(ChangeEvent::PaletteDeleted(names));
        true
    }

    /// Bind a core color slot to `reference`.
    pub fn set_core_color(&mut self, mode: Mode, slot: CoreSlot, reference: &str) {
        self.set_theme_leaf(&slot.doc_path(mode), reference);
    }

    /// Bind a layer's surface to `reference`.
    pub fn set_layer_surface(&mut self, mode: Mode, layer: &LayerId, reference: &str) {
        self.set_theme_leaf(&surface_doc_path(mode, layer), reference);
    }

    pub fn replace_tokens(&mut self, tokens: Document) {
        self.ctx.replace_tokens(tokens);
        self.dirty |= Dirty::TOKENS;
    }

    pub fn replace_theme(&mut self, theme: Document) {
        self.ctx.replace_theme(theme);
        self.dirty |= Dirty::THEME;
    }

    pub fn replace_ui_kit(&mut self, ui_kit: Document) {
        self.ctx.replace_ui_kit(ui_kit);
        self.dirty |= Dirty::UI_KIT;
    }

    pub fn set_options(&mut self, options: EngineOptions) {
        self.guard.set_cooldown(options.fix_cooldown());
        self.ctx.set_options(options);
        self.dirty |= Dirty::OPTIONS;
    }

    fn set_theme_leaf(&mut self, doc_path: &[String], reference: &str) {
        let segments: Vec<&str> = doc_path.iter().map(String::as_str).collect();
        let mut theme = self.ctx.theme().clone();
        theme.set_leaf(&segments, json!(reference));
        self.ctx.replace_theme(theme);
        self.dirty |= Dirty::THEME;
    }

    // ─── Live changes ────────────────────────────────────────────────────

    /// Take in an event from outside. Its names become live roots of the
    /// next flush. Dropped while a pass is running.
    pub fn notify(&mut self, event: &ChangeEvent) {
        if self.updating {
            tracing::debug!(%event, "ignored during update");
            return;
        }
        self.live_roots.extend(event.names().iter().cloned());
        self.dirty |= Dirty::LIVE;
    }

    /// Write a property as a user would, through the store's validation,
    /// and queue it as a live root.
    ///
    /// # Errors
    ///
    /// Returns the [`ValidationError`] when the store refuses the write.
    pub fn write_live(&mut self, name: &PropertyName, text: &str) -> Result<Verdict, ValidationError> {
        let verdict = self.store.write(name, text, self.ctx.index())?;
        self.forward_store_events();
        self.live_roots.insert(name.clone());
        self.dirty |= Dirty::LIVE;
        Ok(verdict)
    }

    /// Compare watched properties with their recorded values, then flush.
    pub fn check(&mut self) -> Option<FlushReport> {
        if !self.enabled || self.updating {
            return None;
        }
        let changed = self.watch.changed(&self.current.map, self.store.registry());
        if !changed.is_empty() {
            tracing::debug!(changed = changed.len(), "watched properties changed");
            self.live_roots.extend(changed);
            self.dirty |= Dirty::LIVE;
        }
        self.flush()
    }

    // ─── Flush ───────────────────────────────────────────────────────────

    /// Process everything queued in one pass. `None` while disabled or
    /// already updating.
    pub fn flush(&mut self) -> Option<FlushReport> {
        if !self.enabled {
            tracing::debug!(pending = ?self.dirty, "flush deferred while disabled");
            return None;
        }
        if self.updating {
            return None;
        }
        if self.dirty.is_empty() {
            return Some(FlushReport::default());
        }
        self.updating = true;
        let report = self.run_flush();
        self.updating = false;
        Some(report)
    }

    fn run_flush(&mut self) -> FlushReport {
        let mut report = FlushReport::default();

        let roots = std::mem::take(&mut self.live_roots);
        let live_changed: Vec<PropertyName> = roots.into_iter().filter(|n| self.live_differs(n)).collect();

        // Fold overrides of bound inputs back into the snapshot.
        let mut force = BTreeSet::new();
        let mut tone_overrides = Vec::new();
        for name in &live_changed {
            let adopted = match self.current.map.binding(name).cloned() {
                Some(Binding::Token(path)) => self.adopt_token(name, &path),
                Some(Binding::Theme(doc_path)) => self.adopt_theme(name, &doc_path),
                Some(Binding::PaletteTone { mode, key, level }) => {
                    tone_overrides.push((name.clone(), mode, key, level));
                    continue;
                }
                None => continue,
            };
            if adopted {
                report.adopted.push(name.clone());
            } else {
                force.insert(name.clone());
            }
        }

        report.recomputed = self.dirty.needs_recompute();
        let next = if report.recomputed {
            compute(&self.ctx)
        } else {
            self.current.clone()
        };
        let diff = self.current.map.diff(&next.map);
        let next_graph = DependencyGraph::from_map(&next.map);
        let affected = self
            .graph
            .union(&next_graph)
            .affected(diff.changed.iter().chain(&diff.removed).chain(&live_changed));

        // A palette tone overridden live keeps its value; only its on-tone
        // is chosen again against what is actually shown.
        let mut handled = BTreeSet::new();
        let mut writes: Vec<(PropertyName, PropertyValue)> = Vec::new();
        for (tone, mode, key, level) in tone_overrides {
            let on_tone = Palette::on_tone_property(mode, &key, level);
            let anchors = next.cores.get(&mode).and_then(|c| c.black().zip(c.white()));
            match (eval_color(self.store.registry(), &tone), anchors) {
                (Ok(color), Some((black, white))) => {
                    let choice = pick_on_tone(color, black, white);
                    if !choice.compliant() {
                        report.issues.push(
                            ComplianceIssue::warning(
                                IssueKind::OnTone,
                                on_tone.as_str(),
                                format!("neither black nor white reaches AA on overridden {tone}"),
                            )
                            .with_ratio(choice.ratio),
                        );
                    }
                    writes.push((on_tone.clone(), PropertyValue::Ref(choice.anchor.property())));
                    report.kept_overrides.push(tone.clone());
                    handled.insert(on_tone);
                    handled.insert(tone);
                }
                (Err(err), _) => {
                    tracing::warn!(%tone, %err, "overridden tone can't be evaluated; restoring");
                    force.insert(tone);
                }
                (Ok(_), None) => {
                    force.insert(tone);
                }
            }
        }

        let mut contested = Vec::new();
        for name in &affected {
            if handled.contains(name) {
                continue;
            }
            let Some(value) = next.map.get(name) else {
                if self.current.map.contains(name) && self.store.remove(name) {
                    report.removed.push(name.clone());
                }
                continue;
            };
            if !force.contains(name) && self.is_override(name, value) {
                match next.map.derivation(name).and_then(|d| d.background.clone()) {
                    Some(bg) => contested.push((name.clone(), bg, value.clone())),
                    None => report.kept_overrides.push(name.clone()),
                }
                continue;
            }
            writes.push((name.clone(), value.clone()));
        }

        let applied = self
            .store
            .apply_values(writes.iter().map(|(n, v)| (n, v)), self.ctx.index());
        report.issues.extend(applied.issues());
        report.written = applied.applied;

        // Overrides are judged against backgrounds as they are now.
        for (name, bg, generated) in contested {
            match measure_pair(&next.map, self.store.registry(), &name, &bg) {
                None => {
                    tracing::debug!(%name, "override kept");
                    report.kept_overrides.push(name);
                }
                Some(issue) => {
                    let reason = if issue.kind == IssueKind::Contrast {
                        tracing::warn!(%name, ratio = ?issue.measured_ratio, "override fails AA; replaced");
                        format!("override below AA on {bg}")
                    } else {
                        tracing::warn!(%name, problem = %issue.message, "override can't be evaluated; replaced");
                        format!("override can't be evaluated ({})", issue.message)
                    };
                    let mut replaced = ComplianceIssue::warning(
                        issue.kind,
                        name.as_str(),
                        format!("{reason}; replaced with {}", generated.render()),
                    );
                    replaced.measured_ratio = issue.measured_ratio;
                    report.issues.push(replaced);
                    let fix = self.store.apply_values([(&name, &generated)], self.ctx.index());
                    report.written.extend(fix.applied);
                    report.replaced_overrides.push(name);
                }
            }
        }

        self.current = next;
        self.graph = next_graph;
        self.dirty = Dirty::empty();
        if report.recomputed {
            self.guard.reset();
        }

        for (mode, key) in std::mem::take(&mut self.changed_palettes) {
            let names: Vec<PropertyName> = self
                .current
                .map
                .names()
                .filter(|n| {
                    matches!(
                        self.current.map.binding(n),
                        Some(Binding::PaletteTone { mode: m, key: k, .. }) if *m == mode && *k == key
                    )
                })
                .cloned()
                .collect();
            self.outbox.push(ChangeEvent::PaletteChanged(names));
        }
        self.forward_store_events();
        self.watch.record(&self.current.map, self.store.registry());
        self.watch
            .remember(self.store.registry(), affected.iter().chain(&live_changed));

        tracing::info!(
            recomputed = report.recomputed,
            affected = affected.len(),
            written = report.written.len(),
            removed = report.removed.len(),
            kept = report.kept_overrides.len(),
            replaced = report.replaced_overrides.len(),
            "flush finished"
        );
        report
    }

    /// Whether the live value of `name` moved since it was last seen.
    fn live_differs(&self, name: &PropertyName) -> bool {
        let live = self.store.get(name);
        match self.watch.last(name) {
            Some(last) => live.as_deref() != last,
            None => live != self.current.map.get(name).map(PropertyValue::render),
        }
    }

    /// Live differs from both what was generated last time and what is
    /// about to be written.
    fn is_override(&self, name: &PropertyName, next: &PropertyValue) -> bool {
        let Some(live) = self.store.get(name) else { return false };
        let previous = self.current.map.get(name).map(PropertyValue::render);
        Some(&live) != previous.as_ref() && live != next.render()
    }

    fn adopt_token(&mut self, name: &PropertyName, path: &TokenPath) -> bool {
        let Some(text) = self.store.get(name) else { return false };
        let text = text.trim();
        let value = match self.ctx.index().get(path) {
            Some(TokenValue::Color(_)) => Color::hex(text).map(|c| json!(c.to_hex())),
            Some(TokenValue::Dimension(_)) => text
                .strip_suffix("px")
                .and_then(|n| n.trim().parse::<f64>().ok())
                .map(|n| json!(n)),
            Some(TokenValue::Number(_)) => text.parse::<f64>().ok().map(|n| json!(n)),
            Some(TokenValue::Text(_)) => Some(json!(text)),
            None => None,
        };
        let Some(value) = value else {
            tracing::warn!(%name, text, "token override not adoptable; restoring");
            return false;
        };
        tracing::debug!(%name, text, "token override adopted");
        self.set_token(path, value);
        true
    }

    fn adopt_theme(&mut self, name: &PropertyName, doc_path: &[String]) -> bool {
        let Some(PropertyValue::Ref(target)) = self.store.value(name) else {
            tracing::warn!(%name, "binding override is not a token reference; restoring");
            return false;
        };
        if target.tier() != Tier::Tokens {
            return false;
        }
        let Some(token) = self.ctx.index().path_of(&target).cloned() else {
            return false;
        };
        tracing::debug!(%name, %token, "binding override adopted");
        self.set_theme_leaf(doc_path, &Reference::Token(token).to_string());
        true
    }

    // ─── Validation ──────────────────────────────────────────────────────

    /// Validate the live registry now.
    pub fn validate(&mut self) -> ValidationOutcome {
        self.validate_at(Instant::now())
    }

    /// Validate the live registry, and on errors run one bounded fix pass
    /// unless the guard is cooling down.
    pub fn validate_at(&mut self, now: Instant) -> ValidationOutcome {
        let live = live_issues(&self.current, self.store.registry());
        let mut outcome = ValidationOutcome {
            report: self.current.report(),
            ..ValidationOutcome::default()
        };
        let fixable: Vec<ComplianceIssue> = live
            .iter()
            .filter(|i| i.is_error() && self.guard.is_fixable(i))
            .cloned()
            .collect();
        outcome.report.extend(live);

        if fixable.is_empty() {
            return outcome;
        }
        if !self.enabled || self.updating || !self.guard.begin(now) {
            tracing::debug!(errors = fixable.len(), "auto-fix skipped");
            outcome.fix_skipped = true;
            return outcome;
        }

        self.updating = true;
        let mut targets = BTreeSet::new();
        for issue in &fixable {
            let name = PropertyName::new(&issue.locus);
            if let Some(bg) = self.current.map.derivation(&name).and_then(|d| d.background.clone()) {
                targets.insert(bg);
            }
            targets.insert(name);
        }
        let writes = targets
            .iter()
            .filter_map(|n| self.current.map.get(n).map(|v| (n, v)));
        self.store.apply_values(writes, self.ctx.index());

        let remaining: BTreeSet<String> = live_issues(&self.current, self.store.registry())
            .iter()
            .filter(|i| i.is_error())
            .map(ComplianceIssue::fingerprint)
            .collect();
        for issue in &fixable {
            let name = PropertyName::new(&issue.locus);
            if remaining.contains(&issue.fingerprint()) {
                tracing::warn!(%issue, "auto-fix did not help; not retrying");
                self.guard.give_up(issue);
                outcome.gave_up.push(name);
            } else {
                outcome.fixed.push(name);
            }
        }
        self.forward_store_events();
        self.watch.remember(self.store.registry(), &targets);
        self.updating = false;

        tracing::info!(fixed = outcome.fixed.len(), gave_up = outcome.gave_up.len(), "auto-fix pass finished");
        outcome
    }

    fn forward_store_events(&mut self) {
        self.outbox.extend(self.store.take_events());
    }
}

/// Where `path` lives in the token document. Non-color keys are matched
/// against existing leaves by their flattened form first.
fn token_doc_path(tokens: &Document, path: &TokenPath) -> Vec<String> {
    if path.is_color() {
        return path.segments();
    }
    tokens
        .leaves(&[path.category.as_str()])
        .into_iter()
        .find(|leaf| leaf.path[1..].join("-") == path.key)
        .map_or_else(|| vec![path.category.clone(), path.key.clone()], |leaf| leaf.path)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use n_style::MemoryRegistry;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    fn name(s: &str) -> PropertyName {
        PropertyName::new(s)
    }

    fn doc(label: &str, value: Value) -> Document {
        Document::from_value(label, value).unwrap()
    }

    /// Light mode only: an accent palette on the blue ramp, and layer-2
    /// drawn from it.
    fn context() -> Context {
        let tokens = json!({
            "color": {
                "gray": {
                    "000": { "$value": "#ffffff" },
                    "100": { "$value": "#f2f2f2" },
                    "500": { "$value": "#808080" },
                    "700": { "$value": "#4d4d4d" },
                    "900": { "$value": "#000000" }
                },
                "blue": {
                    "100": { "$value": "#dbe7fb" },
                    "500": { "$value": "#1e63d6" },
                    "700": { "$value": "#123d84" }
                },
                "red": {
                    "500": { "$value": "#c0392b" },
                    "700": { "$value": "#8e2a20" }
                }
            }
        });
        let theme = json!({ "themes": { "light": {
            "palettes": {
                "accent": { "$value": "{tokens.color.blue}", "$primary": "500" }
            },
            "core-colors": {
                "black": { "$value": "{tokens.color.gray.900}" },
                "white": { "$value": "{tokens.color.gray.000}" },
                "alert": { "$value": "{tokens.color.red.500}" },
                "interactive": {
                    "default": { "$value": "{tokens.color.blue.500}" },
                    "hover": { "$value": "{tokens.color.blue.700}" }
                }
            },
            "layers": {
                "layer-0": { "surface": { "$value": "{tokens.color.gray.000}" } },
                "layer-1": { "surface": { "$value": "{tokens.color.gray.100}" } },
                "layer-2": { "surface": { "$value": "{brand.themes.light.palettes.accent.500}" } }
            }
        } } });
        Context::new(
            doc("tokens", tokens),
            doc("theme", theme),
            Document::empty("ui-kit"),
            EngineOptions::default(),
        )
    }

    fn attached() -> ComplianceWatcher<MemoryRegistry> {
        let mut watcher = ComplianceWatcher::new(context(), MemoryRegistry::new());
        watcher.attach();
        watcher.take_events();
        watcher
    }

    fn live(watcher: &ComplianceWatcher<MemoryRegistry>, s: &str) -> Option<String> {
        watcher.registry().get(&name(s))
    }

    // ── Startup ──

    #[test]
    fn attach_applies_everything_and_validates_once() {
        let mut watcher = ComplianceWatcher::new(context(), MemoryRegistry::new());
        let outcome = watcher.attach();
        assert!(!outcome.report.has_errors(), "{}", outcome.report.render_text());
        assert_eq!(watcher.registry().len(), watcher.computation().map.len());
        assert!(outcome.fixed.is_empty());

        // A second attach re-applies but doesn't validate again.
        let again = watcher.attach();
        assert!(again.report.is_empty());
    }

    #[test]
    fn startup_validation_reports_computation_warnings() {
        let mut ctx = context();
        let mut theme = ctx.theme().clone();
        theme.set_leaf(&["themes", "light", "layers", "layer-1", "surface"], json!("{tokens.color.nope.100}"));
        ctx.replace_theme(theme);
        let mut watcher = ComplianceWatcher::new(ctx, MemoryRegistry::new());
        let outcome = watcher.attach();
        assert!(!outcome.report.has_errors());
        assert!(
            outcome
                .report
                .warnings()
                .any(|i| i.kind == IssueKind::Reference && i.locus.contains("layer-1"))
        );
    }

    // ── Dependency-driven re-derivation ──

    #[test]
    fn deleting_a_palette_rederives_its_layer_once() {
        let mut watcher = attached();
        watcher.store_mut().registry_mut().reset_counts();

        assert!(watcher.delete_palette(Mode::Light, "accent"));
        // A second mutation in the same batch.
        watcher.set_core_color(Mode::Light, CoreSlot::interactive(n_token::InteractiveState::Hover), "{tokens.color.blue.700}");
        let report = watcher.flush().unwrap();
        assert!(report.recomputed);

        let reg = watcher.registry();
        for element in ["surface", "text", "interactive-default-tone", "interactive-default-on-tone"] {
            let n = name(&format!("--brand-light-layer-2-{element}"));
            assert_eq!(reg.write_count(&n), 1, "{n}");
        }
        // The fallback surface is core white.
        assert_eq!(
            live(&watcher, "--brand-light-layer-2-surface").as_deref(),
            Some("var(--tokens-color-gray-000)")
        );
        // Layers not drawn from the palette were left alone.
        assert_eq!(reg.write_count(&name("--brand-light-layer-0-text")), 0);
        assert_eq!(reg.write_count(&name("--brand-light-layer-1-surface")), 0);
        // The palette's own properties are gone.
        assert_eq!(live(&watcher, "--brand-light-palettes-accent-500-tone"), None);
        assert!(report.removed.contains(&name("--brand-light-palettes-accent-500-on-tone")));

        let events = watcher.take_events();
        assert!(matches!(&events[0], ChangeEvent::PaletteDeleted(names) if names.contains(&name("--brand-light-palettes-accent-500-tone"))));
    }

    #[test]
    fn deleting_an_unknown_palette_is_a_no_op() {
        let mut watcher = attached();
        assert!(!watcher.delete_palette(Mode::Light, "missing"));
        assert_eq!(watcher.dirty(), Dirty::empty());
    }

    #[test]
    fn token_change_reaches_dependents() {
        let mut watcher = attached();
        watcher.set_token(&TokenPath::color("gray", Level::new(100)), json!("#e6e6e6"));
        let report = watcher.flush().unwrap();
        assert!(report.written.contains(&name("--tokens-color-gray-100")));
        assert!(report.written.contains(&name("--brand-light-layer-1-surface")));
        assert_eq!(live(&watcher, "--tokens-color-gray-100").as_deref(), Some("#e6e6e6"));
        assert_eq!(
            watcher.take_events()[0],
            ChangeEvent::TokenChanged(vec![name("--tokens-color-gray-100")])
        );
    }

    #[test]
    fn set_palette_announces_its_tones() {
        let mut watcher = attached();
        watcher.set_palette(Mode::Light, "danger", "red", Some(Level::new(500)));
        watcher.flush().unwrap();
        assert_eq!(
            live(&watcher, "--brand-light-palettes-danger-primary-tone").as_deref(),
            Some("var(--tokens-color-red-500)")
        );
        let events = watcher.take_events();
        assert!(events.iter().any(|e| matches!(e, ChangeEvent::PaletteChanged(names) if names.len() == 3)));
    }

    #[test]
    fn flush_with_nothing_queued_writes_nothing() {
        let mut watcher = attached();
        assert!(watcher.flush().unwrap().is_empty());
    }

    // ── Overrides ──

    #[test]
    fn compliant_override_is_kept() {
        let mut watcher = attached();
        watcher
            .write_live(&name("--brand-light-layer-0-text"), "var(--tokens-color-gray-700)")
            .unwrap();
        let report = watcher.flush().unwrap();
        assert_eq!(report.kept_overrides, vec![name("--brand-light-layer-0-text")]);
        assert_eq!(
            live(&watcher, "--brand-light-layer-0-text").as_deref(),
            Some("var(--tokens-color-gray-700)")
        );
    }

    #[test]
    fn failing_override_is_replaced_and_reported() {
        let mut watcher = attached();
        let generated = live(&watcher, "--brand-light-layer-0-text");
        watcher
            .write_live(&name("--brand-light-layer-0-text"), "var(--tokens-color-gray-500)")
            .unwrap();
        let report = watcher.flush().unwrap();
        assert_eq!(report.replaced_overrides, vec![name("--brand-light-layer-0-text")]);
        assert_eq!(live(&watcher, "--brand-light-layer-0-text"), generated);
        let issue = &report.issues[0];
        assert_eq!(issue.kind, IssueKind::Contrast);
        assert!(issue.measured_ratio.is_some_and(|r| r < n_color::AA_THRESHOLD));
    }

    #[test]
    fn override_naming_an_unknown_token_is_refused() {
        let mut watcher = attached();
        let text = name("--brand-light-layer-0-text");
        let generated = live(&watcher, text.as_str());
        let err = watcher
            .write_live(&text, "var(--tokens-color-bogus-500)")
            .unwrap_err();
        assert_eq!(
            err,
            ValidationError::UnknownTarget {
                name: text.clone(),
                target: name("--tokens-color-bogus-500"),
            }
        );
        assert_eq!(live(&watcher, text.as_str()), generated);
        assert!(watcher.flush().unwrap().is_empty());
        assert!(!watcher.validate().report.has_errors());
    }

    #[test]
    fn unevaluable_override_is_replaced() {
        let mut watcher = attached();
        let text = name("--brand-light-layer-0-text");
        let generated = live(&watcher, text.as_str());
        watcher
            .store_mut()
            .registry_mut()
            .set(&text, "var(--tokens-color-bogus-500)");
        watcher.notify(&ChangeEvent::PropertiesUpdated(vec![text.clone()]));

        let report = watcher.flush().unwrap();
        assert_eq!(report.replaced_overrides, vec![text.clone()]);
        assert!(report.kept_overrides.is_empty());
        assert_eq!(live(&watcher, text.as_str()), generated);
        let issue = report
            .issues
            .iter()
            .find(|i| i.locus == text.as_str())
            .unwrap();
        assert_eq!(issue.kind, IssueKind::Reference);
        assert!(issue.message.contains("--tokens-color-bogus-500"), "{issue}");
        assert!(!watcher.validate().report.has_errors());
    }

    #[test]
    fn fixed_blend_weight_without_a_matching_token_is_refused() {
        let start = Instant::now();
        let mut watcher = ComplianceWatcher::new(context(), MemoryRegistry::new());
        watcher.attach_at(start);
        let text = name("--brand-light-layer-0-text");
        let generated = live(&watcher, text.as_str());
        let mix = "color-mix(in srgb, var(--tokens-color-gray-900) 87%, var(--tokens-color-gray-000))";

        let err = watcher.write_live(&text, mix).unwrap_err();
        assert!(matches!(err, ValidationError::UnmatchedLiteral { .. }), "{err}");
        assert_eq!(live(&watcher, text.as_str()), generated);

        // Written around the store, it is caught live and restored.
        watcher.store_mut().registry_mut().set(&text, mix);
        let outcome = watcher.validate_at(start + Duration::from_secs(2));
        assert!(
            outcome
                .report
                .errors()
                .any(|i| i.kind == IssueKind::Validation && i.locus == text.as_str())
        );
        assert_eq!(outcome.fixed, vec![text.clone()]);
        assert_eq!(live(&watcher, text.as_str()), generated);
    }

    #[test]
    fn surface_override_is_adopted_into_the_theme() {
        let mut watcher = attached();
        watcher
            .write_live(&name("--brand-light-layer-0-surface"), "var(--tokens-color-gray-900)")
            .unwrap();
        let report = watcher.flush().unwrap();
        assert_eq!(report.adopted, vec![name("--brand-light-layer-0-surface")]);
        assert_eq!(
            watcher
                .context()
                .theme()
                .leaf_str(&["themes", "light", "layers", "layer-0", "surface"]),
            Some("{tokens.color.gray.900}")
        );
        // Text on a black surface flips to white.
        assert_eq!(
            live(&watcher, "--brand-light-layer-0-text").as_deref(),
            Some("var(--tokens-color-gray-000)")
        );
    }

    #[test]
    fn token_override_is_adopted_into_the_tokens() {
        let mut watcher = attached();
        let token = name("--tokens-color-blue-500");
        watcher.store_mut().registry_mut().set(&token, "#0000ff");
        watcher.notify(&ChangeEvent::PropertiesUpdated(vec![token.clone()]));
        let report = watcher.flush().unwrap();
        assert_eq!(report.adopted, vec![token]);
        assert_eq!(
            watcher.context().tokens().leaf_str(&["color", "blue", "500"]),
            Some("#0000ff")
        );
    }

    #[test]
    fn watched_tone_override_repicks_on_tone() {
        let mut watcher = attached();
        watcher.watch_palette(Mode::Light, "accent");
        let on_tone = "--brand-light-palettes-accent-500-on-tone";
        assert_eq!(live(&watcher, on_tone).as_deref(), Some("var(--tokens-color-gray-000)"));

        let tone = name("--brand-light-palettes-accent-500-tone");
        watcher.store_mut().registry_mut().set(&tone, "var(--tokens-color-blue-100)");
        let report = watcher.check().unwrap();

        assert!(report.kept_overrides.contains(&tone));
        assert_eq!(live(&watcher, on_tone).as_deref(), Some("var(--tokens-color-gray-900)"));
        assert_eq!(
            live(&watcher, "--brand-light-palettes-accent-500-tone").as_deref(),
            Some("var(--tokens-color-blue-100)")
        );
    }

    // ── Loop prevention ──

    #[test]
    fn own_writes_do_not_trigger_another_pass() {
        let mut watcher = attached();
        watcher.set_token(&TokenPath::color("gray", Level::new(100)), json!("#e6e6e6"));
        watcher.flush().unwrap();
        assert!(!watcher.is_updating());

        for event in watcher.take_events() {
            watcher.notify(&event);
        }
        let echo = watcher.flush().unwrap();
        assert!(echo.is_empty());
        assert!(!echo.recomputed);
    }

    #[test]
    fn disabled_watcher_queues_until_enabled() {
        let mut watcher = attached();
        watcher.disable();
        watcher.set_token(&TokenPath::color("gray", Level::new(100)), json!("#e6e6e6"));
        watcher.set_token(&TokenPath::color("gray", Level::new(100)), json!("#dddddd"));
        assert!(watcher.flush().is_none());
        assert!(watcher.check().is_none());
        assert_eq!(live(&watcher, "--tokens-color-gray-100").as_deref(), Some("#f2f2f2"));
        assert!(watcher.dirty().contains(Dirty::TOKENS));

        watcher.enable();
        let report = watcher.flush().unwrap();
        assert_eq!(
            report.written.iter().filter(|n| n.as_str() == "--tokens-color-gray-100").count(),
            1
        );
        assert_eq!(live(&watcher, "--tokens-color-gray-100").as_deref(), Some("#dddddd"));
    }

    // ── Auto-fix ──

    #[test]
    fn validation_fixes_errors_once_per_cooldown() {
        let start = Instant::now();
        let mut watcher = ComplianceWatcher::new(context(), MemoryRegistry::new());
        watcher.attach_at(start);
        let text = name("--brand-light-layer-0-text");
        let generated = live(&watcher, text.as_str());

        watcher.store_mut().registry_mut().set(&text, "var(--tokens-color-gray-500)");
        let outcome = watcher.validate_at(start);
        assert!(outcome.report.has_errors());
        assert_eq!(outcome.fixed, vec![text.clone()]);
        assert_eq!(live(&watcher, text.as_str()), generated);

        // Broken again right away: the guard holds.
        watcher.store_mut().registry_mut().set(&text, "var(--tokens-color-gray-500)");
        let outcome = watcher.validate_at(start + Duration::from_millis(10));
        assert!(outcome.fix_skipped);
        assert!(watcher.is_fixing(start + Duration::from_millis(10)));

        let outcome = watcher.validate_at(start + Duration::from_secs(2));
        assert_eq!(outcome.fixed, vec![text]);
    }

    #[test]
    fn unfixable_errors_are_not_retried() {
        let start = Instant::now();
        let mut watcher = ComplianceWatcher::new(context(), MemoryRegistry::new());
        watcher.attach_at(start);
        // Another writer put a literal into the UI tier; nothing generated
        // can replace it.
        let stray = name("--ui-stray");
        watcher.store_mut().registry_mut().set(&stray, "#123456");

        let outcome = watcher.validate_at(start + Duration::from_secs(2));
        assert_eq!(outcome.gave_up, vec![stray]);

        let outcome = watcher.validate_at(start + Duration::from_secs(4));
        assert!(outcome.report.has_errors());
        assert!(outcome.fixed.is_empty() && outcome.gave_up.is_empty());
        assert!(!outcome.fix_skipped);
    }
}
