//! Guided Portrait Capture Controller
//!
//! Orchestrates the photo-capture modal end to end:
//! - camera session lifecycle (start/stop/flip, scroll lock)
//! - the 100 ms frame-evaluation loop with optional face detection
//! - stability counting, automatic capture, and the manual countdown
//! - square-crop/mirror/JPEG finalization
//! - upload hand-off with success auto-close
//!
//! Every timer is owned by the controller and guarded by a session epoch,
//! so a fired timer checks it still belongs to the current session before
//! acting. Closing the modal at any point cancels everything.

pub mod config;
pub mod controller;
pub mod view;

pub use self::config::CaptureConfig;
pub use self::controller::CaptureController;
pub use self::view::ModalView;

use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Initialize logging for hosts embedding the controller
pub fn init_logging() {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");
}
