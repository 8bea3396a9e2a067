use serde::{Deserialize, Serialize};

/// Traversal-control mode of a detector.
///
/// A push-style view hydrates into `CheckOnce`; everything else hydrates
/// into `CheckAlways`.
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum DetectionMode {
    /// Evaluated on every pass.
    #[default]
    CheckAlways,
    /// Evaluated on the next pass, then downgraded to `Checked`.
    CheckOnce,
    /// Skipped until something upgrades the detector back to `CheckOnce`.
    Checked,
    /// Hard boundary: skipped by passes and never crossed (or upgraded) by
    /// path-to-root invalidation.
    Detached,
}

impl DetectionMode {
    /// Whether a requested pass on a detector in this mode is a no-op.
    pub fn skips_pass(self) -> bool {
        matches!(self, DetectionMode::Detached | DetectionMode::Checked)
    }
}
