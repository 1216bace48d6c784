//! Per-tick frame assessment

use crate::{FaceBox, QualityConfig};
use serde::{Deserialize, Serialize};

/// Discrete framing status shown to the user each tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FrameStatus {
    /// No face in the frame
    NoFace,
    /// Face too small, move closer
    TooFar,
    /// Face too large, move back
    TooClose,
    /// Face displaced from frame center
    OffCenter,
    /// Framing is acceptable
    Good,
    /// Capture is allowed unconditionally (no-detector fallback)
    Ready,
}

impl FrameStatus {
    /// Whether this status feeds the stability counter
    pub fn is_good(self) -> bool {
        matches!(self, FrameStatus::Good)
    }

    /// User guidance line for the modal
    pub fn hint(self) -> &'static str {
        match self {
            FrameStatus::NoFace => "Position your face inside the frame",
            FrameStatus::TooFar => "Move closer to the camera",
            FrameStatus::TooClose => "Move back from the camera",
            FrameStatus::OffCenter => "Center your face in the frame",
            FrameStatus::Good => "Hold still...",
            FrameStatus::Ready => "Ready to capture",
        }
    }
}

/// Framing assessment for a single frame
///
/// Derived purely from the current frame and detector output; recomputed
/// every tick and never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameAssessment {
    pub face_present: bool,
    /// Face longest side over the frame's shorter side
    pub size_ratio: f32,
    /// Normalized center displacement, horizontal
    pub offset_x: f32,
    /// Normalized center displacement, vertical
    pub offset_y: f32,
    pub status: FrameStatus,
}

impl FrameAssessment {
    /// Assessment for a frame with no detected face
    pub fn no_face() -> Self {
        Self {
            face_present: false,
            size_ratio: 0.0,
            offset_x: 0.0,
            offset_y: 0.0,
            status: FrameStatus::NoFace,
        }
    }

    /// Assess a detected face against the frame geometry
    ///
    /// Classification order is first match wins: TooFar, TooClose,
    /// OffCenter, Good.
    pub fn from_face(
        face: &FaceBox,
        frame_width: u32,
        frame_height: u32,
        config: &QualityConfig,
    ) -> Self {
        let frame_w = frame_width as f32;
        let frame_h = frame_height as f32;
        let size_ratio = face.longest_side() / frame_w.min(frame_h);

        let (cx, cy) = face.center();
        let offset_x = (cx - frame_w / 2.0).abs() / frame_w;
        let offset_y = (cy - frame_h / 2.0).abs() / frame_h;

        let status = if size_ratio < config.min_size_ratio {
            FrameStatus::TooFar
        } else if size_ratio > config.max_size_ratio {
            FrameStatus::TooClose
        } else if offset_x > config.center_tolerance || offset_y > config.center_tolerance {
            FrameStatus::OffCenter
        } else {
            FrameStatus::Good
        };

        Self {
            face_present: true,
            size_ratio,
            offset_x,
            offset_y,
            status,
        }
    }
}

/// Most confident face from a detection result
pub fn best_face(faces: &[FaceBox]) -> Option<&FaceBox> {
    faces
        .iter()
        .max_by(|a, b| a.confidence.total_cmp(&b.confidence))
}
