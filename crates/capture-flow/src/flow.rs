//! Capture flow phases and transitions

use crate::{Countdown, StabilityCounter};
use face_quality::FrameStatus;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Flow configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowConfig {
    /// Consecutive good frames required for automatic capture
    pub required_good_frames: u32,
    /// Starting value of the manual countdown (seconds)
    pub countdown_start: u8,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            required_good_frames: 15,
            countdown_start: 3,
        }
    }
}

/// Where the modal is in its capture lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapturePhase {
    /// Evaluation ticks run, status updates every tick
    Evaluating,
    /// Stability threshold met, capture scheduled after a short delay
    Capturing,
    /// Manual countdown running, evaluation suspended
    CountingDown,
    /// No face locator available, capture allowed unconditionally
    Ready,
    /// A still image has been finalized
    Preview,
}

/// Action the driving loop must take after a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowEvent {
    None,
    /// Schedule the delayed automatic capture
    ScheduleAutoCapture,
    /// Take the photo now
    FireCapture,
}

/// Capture flow state machine
///
/// Each instance owns its own counters; nothing is shared across sessions.
#[derive(Debug, Clone)]
pub struct CaptureFlow {
    phase: CapturePhase,
    status: FrameStatus,
    stability: StabilityCounter,
    countdown: Option<Countdown>,
    config: FlowConfig,
}

impl CaptureFlow {
    /// Flow for a session with a face locator: starts evaluating
    pub fn new(config: FlowConfig) -> Self {
        Self {
            phase: CapturePhase::Evaluating,
            status: FrameStatus::NoFace,
            stability: StabilityCounter::new(config.required_good_frames),
            countdown: None,
            config,
        }
    }

    /// Flow for a session without a face locator: immediately ready,
    /// no stability requirement
    pub fn new_ready(config: FlowConfig) -> Self {
        Self {
            phase: CapturePhase::Ready,
            status: FrameStatus::Ready,
            ..Self::new(config)
        }
    }

    pub fn phase(&self) -> CapturePhase {
        self.phase
    }

    pub fn status(&self) -> FrameStatus {
        self.status
    }

    /// Seconds left on the manual countdown, if one is running
    pub fn countdown_remaining(&self) -> Option<u8> {
        self.countdown.as_ref().map(Countdown::remaining)
    }

    /// Stability progress toward automatic capture, 0-100
    pub fn progress_percent(&self) -> f32 {
        self.stability.progress_percent()
    }

    /// Feed one tick's classification into the machine
    ///
    /// Ignored outside the evaluating phase, so a running countdown or a
    /// pending capture never consumes frames. The transition to `Capturing`
    /// happens at most once per stability cycle.
    pub fn observe(&mut self, status: FrameStatus) -> FlowEvent {
        if self.phase != CapturePhase::Evaluating {
            return FlowEvent::None;
        }

        self.status = status;
        if status.is_good() {
            if self.stability.record_good() {
                debug!(
                    required = self.config.required_good_frames,
                    "stability threshold reached, scheduling auto-capture"
                );
                self.stability.reset();
                self.phase = CapturePhase::Capturing;
                return FlowEvent::ScheduleAutoCapture;
            }
        } else {
            self.stability.reset();
        }
        FlowEvent::None
    }

    /// Start the manual countdown
    ///
    /// Allowed while evaluating or ready; false when a countdown is already
    /// running, a capture is pending, or an image is finalized.
    pub fn begin_countdown(&mut self) -> bool {
        match self.phase {
            CapturePhase::Evaluating | CapturePhase::Ready => {
                self.countdown = Some(Countdown::start(self.config.countdown_start));
                self.phase = CapturePhase::CountingDown;
                true
            }
            _ => false,
        }
    }

    /// Advance the countdown by one second
    pub fn countdown_tick(&mut self) -> FlowEvent {
        let Some(countdown) = self.countdown.as_mut() else {
            return FlowEvent::None;
        };
        if countdown.tick() {
            self.countdown = None;
            self.status = FrameStatus::Ready;
            return FlowEvent::FireCapture;
        }
        FlowEvent::None
    }

    /// A still image was finalized; the modal moves to preview
    pub fn mark_captured(&mut self) {
        self.phase = CapturePhase::Preview;
        self.countdown = None;
        self.stability.reset();
    }

    /// A scheduled capture could not produce an image; resume evaluation
    pub fn resume(&mut self) {
        if self.phase != CapturePhase::Preview {
            self.phase = if self.countdown.is_some() {
                CapturePhase::CountingDown
            } else {
                CapturePhase::Evaluating
            };
        }
    }

    /// Full reset, used on retake and modal re-open
    pub fn reset(&mut self, detector_available: bool) {
        *self = if detector_available {
            Self::new(self.config.clone())
        } else {
            Self::new_ready(self.config.clone())
        };
    }
}
