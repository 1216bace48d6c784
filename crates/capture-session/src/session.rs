//! Capture session lifecycle

use crate::{
    DeviceError, DeviceProvider, FacingMode, FormFactor, StreamConstraints, VideoFrame,
    VideoStream,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Preferred capture width
    pub width_hint: u32,
    /// Preferred capture height
    pub height_hint: u32,
    /// Heuristic used when device enumeration fails
    pub form_factor: FormFactor,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            width_hint: 1280,
            height_hint: 720,
            form_factor: FormFactor::Desktop,
        }
    }
}

/// Owns the live camera stream; at most one stream is alive at a time
pub struct CaptureSession<P: DeviceProvider> {
    provider: P,
    stream: Option<P::Stream>,
    facing: FacingMode,
    config: SessionConfig,
}

impl<P: DeviceProvider> CaptureSession<P> {
    pub fn new(provider: P, config: SessionConfig) -> Self {
        Self {
            provider,
            stream: None,
            facing: FacingMode::default(),
            config,
        }
    }

    /// Whether a stream is currently live
    pub fn is_active(&self) -> bool {
        self.stream.is_some()
    }

    /// Facing mode of the current (or last) stream
    pub fn facing(&self) -> FacingMode {
        self.facing
    }

    /// Acquire a stream with the preferred facing mode
    ///
    /// Any already-open stream is released first. If no camera matches the
    /// preferred facing (desktop without a rear camera), retries once with an
    /// unconstrained request before giving up.
    pub async fn start(&mut self, facing: FacingMode) -> Result<(), DeviceError> {
        self.stop();

        let constraints = StreamConstraints {
            facing: Some(facing),
            width_hint: self.config.width_hint,
            height_hint: self.config.height_hint,
        };

        let stream = match self.provider.acquire(&constraints).await {
            Ok(stream) => stream,
            Err(DeviceError::CameraUnavailable) => {
                warn!(?facing, "preferred facing unavailable, retrying unconstrained");
                let fallback = StreamConstraints {
                    facing: None,
                    ..constraints
                };
                self.provider.acquire(&fallback).await?
            }
            Err(e) => return Err(e),
        };

        info!(?facing, dimensions = ?stream.dimensions(), "camera stream started");
        self.stream = Some(stream);
        self.facing = facing;
        Ok(())
    }

    /// Release the stream; no-op when already stopped
    pub fn stop(&mut self) {
        if let Some(stream) = self.stream.take() {
            debug!("releasing camera stream");
            drop(stream);
        }
    }

    /// Toggle the facing mode and re-acquire
    ///
    /// The old stream is fully released before the new one is requested so
    /// two streams are never alive at once.
    pub async fn flip(&mut self) -> Result<(), DeviceError> {
        let next = self.facing.flipped();
        self.start(next).await
    }

    /// Whether more than one camera is available
    ///
    /// Enumeration failures fall back to the form-factor heuristic (assume
    /// multiple cameras on mobile) instead of failing hard.
    pub async fn detect_multiple_cameras(&mut self) -> bool {
        match self.provider.enumerate_video_inputs().await {
            Ok(inputs) => inputs.len() > 1,
            Err(e) => {
                warn!(error = %e, "device enumeration failed, using form-factor heuristic");
                matches!(self.config.form_factor, FormFactor::Mobile)
            }
        }
    }

    /// Latest frame from the live stream
    pub fn current_frame(&mut self) -> Option<VideoFrame> {
        self.stream.as_mut()?.latest_frame()
    }

    /// Dimensions of the live stream
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        self.stream.as_ref().map(|s| s.dimensions())
    }
}
