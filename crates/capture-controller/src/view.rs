//! Modal view snapshots

use capture_flow::CapturePhase;
use capture_session::FacingMode;
use face_quality::FrameStatus;
use serde::Serialize;
use uploader::UploadOutcome;

/// Everything the modal renders, recomputed after every state change
///
/// Published on a watch channel; the host UI only ever sees complete,
/// consistent snapshots.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModalView {
    /// Capture lifecycle phase
    pub phase: CapturePhase,
    /// Latest framing status
    pub status: FrameStatus,
    /// User guidance line for the current status
    pub hint: &'static str,
    /// Stability progress ring, 0-100
    pub progress_percent: f32,
    /// Seconds left on the manual countdown, if one is running
    pub countdown: Option<u8>,
    /// Camera currently supplying the stream
    pub facing: FacingMode,
    /// Whether the flip control should be shown
    pub has_multiple_cameras: bool,
    /// Upload lifecycle
    pub upload: UploadOutcome,
    /// Dismissible device error message, if any
    pub device_error: Option<&'static str>,
    /// Whether a finalized still is available for preview
    pub preview_available: bool,
    /// Whether the modal has closed
    pub closed: bool,
}

impl Default for ModalView {
    fn default() -> Self {
        Self {
            phase: CapturePhase::Evaluating,
            status: FrameStatus::NoFace,
            hint: FrameStatus::NoFace.hint(),
            progress_percent: 0.0,
            countdown: None,
            facing: FacingMode::Front,
            has_multiple_cameras: false,
            upload: UploadOutcome::Idle,
            device_error: None,
            preview_available: false,
            closed: false,
        }
    }
}
