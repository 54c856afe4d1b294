//! Which parts of the snapshot changed since the last flush.

bitflags::bitflags! {
    /// Pending snapshot changes. Combine with bitwise OR:
    ///
    /// ```
    /// use n_watch::Dirty;
    ///
    /// let pending = Dirty::TOKENS | Dirty::THEME;
    /// assert!(pending.needs_recompute());
    /// assert!(!Dirty::LIVE.needs_recompute());
    /// ```
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
    pub struct Dirty: u8 {
        /// The token document was replaced.
        const TOKENS  = 1 << 0;
        /// The theme document was replaced.
        const THEME   = 1 << 1;
        /// The UI-kit document was replaced.
        const UI_KIT  = 1 << 2;
        /// Engine options changed.
        const OPTIONS = 1 << 3;
        /// Live properties changed outside the watcher.
        const LIVE    = 1 << 4;
    }
}

impl Dirty {
    /// Whether the property map has to be computed again.
    #[must_use]
    pub const fn needs_recompute(self) -> bool {
        self.intersects(Self::TOKENS.union(Self::THEME).union(Self::UI_KIT).union(Self::OPTIONS))
    }
}
