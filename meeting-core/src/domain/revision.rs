use serde::{Deserialize, Serialize};

/// A monotonic counter issued by the key-value store, used as the
/// optimistic-concurrency precondition for `update`/`delete` (spec §3,
/// "Revision"). `Revision(0)` is the sentinel meaning "no precondition",
/// used by `create`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Revision(pub u64);

impl Revision {
    /// Sentinel used by `create`: "no precondition".
    pub const NONE: Revision = Revision(0);

    pub fn next(self) -> Revision {
        Revision(self.0 + 1)
    }

    pub fn is_none(self) -> bool {
        self == Self::NONE
    }
}

impl Default for Revision {
    fn default() -> Self {
        Self::NONE
    }
}

impl std::fmt::Display for Revision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
