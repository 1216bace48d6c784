//! Capture Flow State Machine
//!
//! Decides when the modal takes the photo: accumulates consecutive good
//! frames until an automatic capture fires, or runs the manual countdown.
//! Evaluation and countdown are mutually exclusive, and each stability
//! cycle triggers at most one capture.

pub mod countdown;
pub mod flow;
pub mod stability;

pub use countdown::Countdown;
pub use flow::{CaptureFlow, CapturePhase, FlowConfig, FlowEvent};
pub use stability::StabilityCounter;
