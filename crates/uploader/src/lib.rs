//! Upload Coordination Types
//!
//! Packages finalized portraits into binary payloads and defines the
//! contract with the external upload collaborator. The endpoint itself
//! (REST client, auth, retries) lives outside this workspace.

use chrono::Utc;
use finalizer::CapturedImage;
use serde::{Deserialize, Serialize};
use std::future::Future;
use thiserror::Error;

/// Descriptive upload failure from the collaborator
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct UploadError {
    pub message: String,
}

impl UploadError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Binary file-like payload handed to the upload collaborator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadPayload {
    /// Timestamp-derived file name
    pub file_name: String,
    /// Declared content type
    pub content_type: &'static str,
    /// Encoded image bytes
    pub bytes: Vec<u8>,
}

impl UploadPayload {
    /// Package a finalized portrait, naming it after the current time
    pub fn from_image(image: &CapturedImage) -> Self {
        let stamp = Utc::now().format("%Y%m%dT%H%M%S%3f");
        Self {
            file_name: format!("portrait-{stamp}.jpg"),
            content_type: CapturedImage::CONTENT_TYPE,
            bytes: image.jpeg_bytes().to_vec(),
        }
    }
}

/// External upload collaborator
///
/// Accepts a subject identifier and one or more binary image payloads;
/// returns success or a descriptive failure.
pub trait PortraitUploader: Send + Sync + 'static {
    fn upload(
        &self,
        subject_code: &str,
        files: Vec<UploadPayload>,
    ) -> impl Future<Output = Result<(), UploadError>> + Send;
}

/// Upload lifecycle as reflected in the modal
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", content = "message", rename_all = "snake_case")]
pub enum UploadOutcome {
    #[default]
    Idle,
    InProgress,
    Success,
    Failure(String),
}

impl UploadOutcome {
    /// Success or failure
    pub fn is_terminal(&self) -> bool {
        matches!(self, UploadOutcome::Success | UploadOutcome::Failure(_))
    }

    /// User-visible failure text, if any
    pub fn failure_message(&self) -> Option<&str> {
        match self {
            UploadOutcome::Failure(message) => Some(message),
            _ => None,
        }
    }
}
