//! Controller configuration

use capture_flow::FlowConfig;
use capture_session::SessionConfig;
use ::config::{Config, ConfigError, Environment, File};
use face_quality::QualityConfig;
use serde::Deserialize;

/// Tuning for the whole capture modal
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Framing thresholds
    pub quality: QualityConfig,
    /// Camera session preferences
    pub session: SessionConfig,
    /// Stability threshold and countdown length
    pub flow: FlowConfig,

    /// Frame evaluation cadence
    pub tick_interval_ms: u64,
    /// Delay between stability trigger and the actual capture, so the UI
    /// can render the capturing affordance first
    pub auto_capture_delay_ms: u64,
    /// Manual countdown cadence
    pub countdown_interval_ms: u64,
    /// How long the success confirmation stays up before the modal closes
    pub success_close_delay_ms: u64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            quality: QualityConfig::default(),
            session: SessionConfig::default(),
            flow: FlowConfig::default(),
            tick_interval_ms: 100,
            auto_capture_delay_ms: 200,
            countdown_interval_ms: 1000,
            success_close_delay_ms: 1500,
        }
    }
}

impl CaptureConfig {
    /// Load from an optional config file plus `CAPTURE_`-prefixed
    /// environment overrides (`CAPTURE_TICK_INTERVAL_MS`,
    /// `CAPTURE_QUALITY__MIN_SIZE_RATIO`, ...)
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::with_name(path).required(false));
        }
        builder
            .add_source(Environment::with_prefix("CAPTURE")
                .prefix_separator("_")
                .separator("__"))
            .build()?
            .try_deserialize()
    }
}
