//! Frame Quality Evaluation
//!
//! Classifies live video frames for capture readiness: is a face present,
//! is it close enough, far enough, and centered enough to take the shot.
//! The face locator is an optional platform capability; when it is absent
//! the evaluator is bypassed entirely and the modal is immediately ready.

pub mod assess;
pub mod config;

pub use assess::{best_face, FrameAssessment, FrameStatus};
pub use config::QualityConfig;

use capture_session::VideoFrame;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Locator error types
#[derive(Error, Debug, Clone)]
pub enum LocatorError {
    #[error("face detection failed: {0}")]
    Detection(String),
}

/// Face bounding box in frame pixel coordinates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub confidence: f32,
}

impl FaceBox {
    /// Center of the box
    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Longest side of the box
    pub fn longest_side(&self) -> f32 {
        self.width.max(self.height)
    }
}

/// Optional platform face-detection capability
///
/// Absence is a supported configuration, not an error: callers hold an
/// `Option<Box<dyn FaceLocator>>` and branch once at session start.
pub trait FaceLocator: Send {
    /// Face regions in the frame, possibly empty
    ///
    /// Errors are advisory; a failing tick is skipped, never surfaced.
    fn locate(&mut self, frame: &VideoFrame) -> Result<Vec<FaceBox>, LocatorError>;
}
