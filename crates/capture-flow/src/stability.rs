//! Consecutive-good-frame tally

/// Stability counter gating automatic capture
///
/// Resets to zero on any non-good frame; fires exactly once when the
/// required streak length is reached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StabilityCounter {
    good_frames: u32,
    required: u32,
}

impl StabilityCounter {
    pub fn new(required: u32) -> Self {
        Self {
            good_frames: 0,
            required: required.max(1),
        }
    }

    /// Record one good frame; true exactly when the streak reaches the
    /// required length
    pub fn record_good(&mut self) -> bool {
        self.good_frames += 1;
        self.good_frames == self.required
    }

    /// Restart the streak from zero
    pub fn reset(&mut self) {
        self.good_frames = 0;
    }

    /// Current streak length
    pub fn good_frames(&self) -> u32 {
        self.good_frames
    }

    /// Progress toward the threshold, 0-100
    pub fn progress_percent(&self) -> f32 {
        (self.good_frames as f32 / self.required as f32 * 100.0).min(100.0)
    }
}
