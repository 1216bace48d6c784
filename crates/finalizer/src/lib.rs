//! Image Finalization
//!
//! Turns the current video frame into the fixed, uploadable still:
//! centered square crop (side = the frame's shorter dimension), horizontal
//! mirror for front-camera captures so the saved photo matches true
//! orientation rather than the mirrored live preview, JPEG encoding at a
//! fixed high quality.

use capture_session::{FacingMode, VideoFrame};
use image::codecs::jpeg::JpegEncoder;
use image::{imageops, RgbImage};
use thiserror::Error;

/// JPEG quality factor for finalized portraits
pub const JPEG_QUALITY: u8 = 95;

/// Finalization error types
#[derive(Error, Debug)]
pub enum FinalizeError {
    #[error("frame buffer does not match its declared dimensions")]
    InvalidFrame,

    #[error("image encoding failed: {0}")]
    Encode(String),
}

/// Immutable still produced at capture time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedImage {
    jpeg: Vec<u8>,
    side: u32,
    mirrored: bool,
}

impl CapturedImage {
    /// Declared content type of the encoded bytes
    pub const CONTENT_TYPE: &'static str = "image/jpeg";

    /// Encoded JPEG bytes
    pub fn jpeg_bytes(&self) -> &[u8] {
        &self.jpeg
    }

    /// Square side length in pixels
    pub fn side(&self) -> u32 {
        self.side
    }

    /// Whether mirror correction was applied (front-camera capture)
    pub fn mirrored(&self) -> bool {
        self.mirrored
    }
}

/// Finalize a frame into an uploadable square portrait
///
/// Deterministic for identical frame data and facing mode.
pub fn finalize(frame: &VideoFrame, facing: FacingMode) -> Result<CapturedImage, FinalizeError> {
    let square = crop_square(frame)?;
    let side = square.width();

    let mirrored = facing.is_mirrored();
    let square = if mirrored {
        imageops::flip_horizontal(&square)
    } else {
        square
    };

    let mut jpeg = Vec::new();
    JpegEncoder::new_with_quality(&mut jpeg, JPEG_QUALITY)
        .encode_image(&square)
        .map_err(|e| FinalizeError::Encode(e.to_string()))?;

    Ok(CapturedImage {
        jpeg,
        side,
        mirrored,
    })
}

/// Centered square crop with side = min(width, height)
fn crop_square(frame: &VideoFrame) -> Result<RgbImage, FinalizeError> {
    if !frame.is_well_formed() || frame.width == 0 || frame.height == 0 {
        return Err(FinalizeError::InvalidFrame);
    }

    let image = RgbImage::from_raw(frame.width, frame.height, frame.data.clone())
        .ok_or(FinalizeError::InvalidFrame)?;

    let side = frame.width.min(frame.height);
    let offset_x = (frame.width - side) / 2;
    let offset_y = (frame.height - side) / 2;

    Ok(imageops::crop_imm(&image, offset_x, offset_y, side, side).to_image())
}
