//! Core colors — the fixed semantic anchors every mode binds.
//!
//! `black`, `white`, `alert`, `warning`, `success`, and the two
//! `interactive` states each resolve to one color token. Black and white
//! are load-bearing (every on-tone choice is between them), so when their
//! binding fails the token whose value is exactly `#000000` / `#ffffff`
//! stands in, with a reported issue. The other anchors have no fallback;
//! the properties derived from them are skipped and reported.

use std::collections::BTreeMap;

use n_color::{Color, contrast_ratio};
use n_token::{
    BrandRef, CoreColor, InteractiveState, Mode, PropertyName, PropertyValue, Reference, Resolver,
    Subsystem, TokenPath,
};

use crate::issue::{ComplianceIssue, IssueKind};
use crate::map::{Binding, Derivation, PropertyMap};

/// A core color resolved to its token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Anchor {
    pub token: TokenPath,
    pub color: Color,
}

impl Anchor {
    /// Token-tier property name of the anchor's token.
    #[must_use]
    pub fn property(&self) -> PropertyName {
        PropertyName::token(&self.token)
    }
}

/// One core-color binding: a color plus, for `interactive`, its state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CoreSlot {
    pub color: CoreColor,
    pub state: Option<InteractiveState>,
}

impl CoreSlot {
    pub const BLACK: Self = Self::plain(CoreColor::Black);
    pub const WHITE: Self = Self::plain(CoreColor::White);

    pub const ALL: [Self; 7] = [
        Self::BLACK,
        Self::WHITE,
        Self::plain(CoreColor::Alert),
        Self::plain(CoreColor::Warning),
        Self::plain(CoreColor::Success),
        Self::interactive(InteractiveState::Default),
        Self::interactive(InteractiveState::Hover),
    ];

    #[must_use]
    pub const fn plain(color: CoreColor) -> Self {
        Self { color, state: None }
    }

    #[must_use]
    pub const fn interactive(state: InteractiveState) -> Self {
        Self {
            color: CoreColor::Interactive,
            state: Some(state),
        }
    }

    /// Theme-document path of the binding leaf.
    #[must_use]
    pub fn doc_path(self, mode: Mode) -> Vec<String> {
        let mut path = vec![
            "themes".to_string(),
            mode.to_string(),
            "core-colors".to_string(),
            self.color.to_string(),
        ];
        if let Some(state) = self.state {
            path.push(state.as_str().to_string());
        }
        path
    }

    /// Brand-tier property name: `--brand-<mode>-core-<color>[-<state>]`.
    #[must_use]
    pub fn property(self, mode: Mode) -> PropertyName {
        match self.state {
            Some(state) => PropertyName::brand(mode, Subsystem::Core, &[self.color.as_str(), state.as_str()]),
            None => PropertyName::brand(mode, Subsystem::Core, &[self.color.as_str()]),
        }
    }

    fn reference(self, mode: Mode) -> Reference {
        Reference::Brand(BrandRef::Core {
            mode: Some(mode),
            color: self.color,
            state: self.state,
        })
    }

    fn label(self) -> String {
        match self.state {
            Some(state) => format!("{}.{}", self.color, state.as_str()),
            None => self.color.to_string(),
        }
    }
}

/// The resolved core colors of one mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreColors {
    mode: Mode,
    anchors: BTreeMap<CoreSlot, Anchor>,
}

impl CoreColors {
    /// Resolve every slot for the resolver's mode.
    pub fn resolve(resolver: &Resolver<'_>, issues: &mut Vec<ComplianceIssue>) -> Self {
        let mode = resolver.mode();
        let index = resolver.index();
        let mut anchors = BTreeMap::new();

        for slot in CoreSlot::ALL {
            let locus = slot.doc_path(mode).join(".");
            let failure = match resolver.resolve_token(&slot.reference(mode)) {
                Ok(token) => match index.color(&token) {
                    Some(color) => {
                        anchors.insert(slot, Anchor { token, color });
                        continue;
                    }
                    None => format!("{token} is not a color"),
                },
                Err(err) => err.to_string(),
            };

            let fallback = match slot {
                CoreSlot::BLACK => Some(Color::BLACK),
                CoreSlot::WHITE => Some(Color::WHITE),
                _ => None,
            }
            .and_then(|color| index.find_color(color).map(|token| Anchor { token: token.clone(), color }));

            let issue = match &fallback {
                Some(anchor) => ComplianceIssue::warning(
                    IssueKind::Reference,
                    &locus,
                    format!("{failure}; using {}", anchor.token),
                ),
                None => ComplianceIssue::warning(
                    IssueKind::Reference,
                    &locus,
                    format!("{failure}; core color {} skipped", slot.label()),
                ),
            };
            tracing::warn!(%mode, slot = %slot.label(), %failure, "core color unresolved");
            issues.push(issue);
            if let Some(anchor) = fallback {
                anchors.insert(slot, anchor);
            }
        }

        Self { mode, anchors }
    }

    #[must_use]
    pub const fn mode(&self) -> Mode {
        self.mode
    }

    #[must_use]
    pub fn get(&self, slot: CoreSlot) -> Option<&Anchor> {
        self.anchors.get(&slot)
    }

    #[must_use]
    pub fn black(&self) -> Option<&Anchor> {
        self.get(CoreSlot::BLACK)
    }

    #[must_use]
    pub fn white(&self) -> Option<&Anchor> {
        self.get(CoreSlot::WHITE)
    }

    /// Brand properties of the black and white anchors, the inputs of every
    /// on-tone choice.
    #[must_use]
    pub fn contrast_inputs(&self) -> [PropertyName; 2] {
        [CoreSlot::BLACK.property(self.mode), CoreSlot::WHITE.property(self.mode)]
    }

    /// Black or white, whichever contrasts more with `against`. Ties go to
    /// black.
    #[must_use]
    pub fn better_anchor(&self, against: Color) -> Option<(CoreSlot, &Anchor)> {
        let black = self.black()?;
        let white = self.white()?;
        if contrast_ratio(black.color, against) >= contrast_ratio(white.color, against) {
            Some((CoreSlot::BLACK, black))
        } else {
            Some((CoreSlot::WHITE, white))
        }
    }

    /// Write `core-*` properties.
    pub fn emit(&self, map: &mut PropertyMap) {
        for (slot, anchor) in &self.anchors {
            let name = slot.property(self.mode);
            map.derive(
                name.clone(),
                PropertyValue::Ref(anchor.property()),
                Derivation::from_inputs([anchor.property()]),
            );
            map.bind(name, Binding::Theme(slot.doc_path(self.mode)));
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
