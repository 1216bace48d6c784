//! Manual-capture countdown

/// Visible countdown, ticking once per second
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Countdown {
    remaining: u8,
}

impl Countdown {
    pub fn start(from: u8) -> Self {
        Self {
            remaining: from.max(1),
        }
    }

    /// Advance one second; true when the countdown reaches zero
    pub fn tick(&mut self) -> bool {
        self.remaining = self.remaining.saturating_sub(1);
        self.remaining == 0
    }

    /// Seconds left
    pub fn remaining(&self) -> u8 {
        self.remaining
    }
}
