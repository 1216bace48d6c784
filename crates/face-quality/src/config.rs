//! Quality evaluation configuration

use serde::{Deserialize, Serialize};

/// Framing thresholds, as fractions of frame size
///
/// Product-tuning values, not load-bearing invariants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityConfig {
    /// Faces smaller than this fraction of the frame are too far
    pub min_size_ratio: f32,

    /// Faces larger than this fraction of the frame are too close
    pub max_size_ratio: f32,

    /// Maximum normalized center displacement on either axis
    pub center_tolerance: f32,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            min_size_ratio: 0.20,
            max_size_ratio: 0.80,
            center_tolerance: 0.25,
        }
    }
}

impl QualityConfig {
    /// Tighter framing requirements (ID-badge quality portraits)
    pub fn strict() -> Self {
        Self {
            min_size_ratio: 0.30,
            max_size_ratio: 0.70,
            center_tolerance: 0.15,
        }
    }

    /// Looser framing requirements
    pub fn lenient() -> Self {
        Self {
            min_size_ratio: 0.15,
            max_size_ratio: 0.90,
            center_tolerance: 0.35,
        }
    }
}
