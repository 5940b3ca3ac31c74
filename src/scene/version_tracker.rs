/// Last world version observed by a component.
///
/// A component recomputes its derived state (render quads, physics poses,
/// view matrices) only when its owner's world version differs from the one
/// stored here, then records the new version.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VersionCache {
    last_seen: Option<u64>,
}

impl VersionCache {
    #[must_use]
    pub fn new() -> Self {
        Self { last_seen: None }
    }

    /// Returns `true` if `version` was not the last one synced.
    #[inline]
    #[must_use]
    pub fn needs_sync(&self, version: u64) -> bool {
        self.last_seen != Some(version)
    }

    /// Records `version` as synced.
    #[inline]
    pub fn mark_synced(&mut self, version: u64) {
        self.last_seen = Some(version);
    }

    /// Forgets the last synced version, forcing the next check to report a change.
    #[inline]
    pub fn invalidate(&mut self) {
        self.last_seen = None;
    }

    #[inline]
    #[must_use]
    pub fn last_seen(&self) -> Option<u64> {
        self.last_seen
    }
}
