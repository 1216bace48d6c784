//! Capture Session Management
//!
//! Owns the live camera stream behind the guided portrait capture modal:
//! - facing-mode selection (front/back) with an unconstrained fallback
//! - exclusive stream ownership (stop before re-acquire on flip)
//! - video input enumeration with a form-factor heuristic fallback
//! - page scroll locking while the modal is open

pub mod frame;
pub mod session;

pub use frame::VideoFrame;
pub use session::{CaptureSession, SessionConfig};

use serde::{Deserialize, Serialize};
use std::future::Future;
use thiserror::Error;

/// Device error types
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeviceError {
    #[error("camera permission denied")]
    PermissionDenied,

    #[error("no camera available")]
    CameraUnavailable,

    #[error("camera error: {0}")]
    Camera(String),

    #[error("device enumeration failed: {0}")]
    Enumeration(String),
}

impl DeviceError {
    /// Message shown in the modal's error banner
    pub fn user_message(&self) -> &'static str {
        match self {
            DeviceError::PermissionDenied => {
                "Camera access was denied. Allow camera access and reopen."
            }
            DeviceError::CameraUnavailable => "No camera was found on this device.",
            DeviceError::Camera(_) => "The camera could not be started.",
            DeviceError::Enumeration(_) => "Camera devices could not be listed.",
        }
    }
}

/// Which physical camera supplies the video stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FacingMode {
    /// User-facing camera; the live preview is mirrored
    #[default]
    Front,
    /// Environment-facing camera
    Back,
}

impl FacingMode {
    /// The other camera
    pub fn flipped(self) -> Self {
        match self {
            FacingMode::Front => FacingMode::Back,
            FacingMode::Back => FacingMode::Front,
        }
    }

    /// Front-camera previews are mirrored, so captures need mirror correction
    pub fn is_mirrored(self) -> bool {
        matches!(self, FacingMode::Front)
    }
}

/// Host form factor, used as a heuristic when device enumeration fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormFactor {
    Mobile,
    #[default]
    Desktop,
}

/// Constraints passed to the device provider on acquire
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamConstraints {
    /// Preferred facing mode; `None` means any camera
    pub facing: Option<FacingMode>,
    /// Preferred capture width
    pub width_hint: u32,
    /// Preferred capture height
    pub height_hint: u32,
}

/// Video input metadata from device enumeration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoInput {
    pub id: String,
    pub label: String,
}

/// A live video stream handle
///
/// Implementations release their device tracks on drop.
pub trait VideoStream: Send {
    /// Latest decoded frame, or `None` while the stream is warming up
    fn latest_frame(&mut self) -> Option<VideoFrame>;

    /// Native stream dimensions
    fn dimensions(&self) -> (u32, u32);
}

/// Camera/media device API collaborator
pub trait DeviceProvider: Send {
    type Stream: VideoStream + 'static;

    /// Acquire a stream matching the constraints
    fn acquire(
        &mut self,
        constraints: &StreamConstraints,
    ) -> impl Future<Output = Result<Self::Stream, DeviceError>> + Send;

    /// List available video input devices
    fn enumerate_video_inputs(
        &mut self,
    ) -> impl Future<Output = Result<Vec<VideoInput>, DeviceError>> + Send;
}

/// Page scroll control, held while the modal is open
pub trait ScrollLock: Send {
    fn set_locked(&mut self, locked: bool);
}

/// No-op lock for hosts without a scrollable page
#[derive(Debug, Default)]
pub struct NoScrollLock;

impl ScrollLock for NoScrollLock {
    fn set_locked(&mut self, _locked: bool) {}
}
