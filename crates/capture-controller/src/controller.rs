//! The capture modal controller

use crate::{CaptureConfig, ModalView};
use capture_flow::{CaptureFlow, CapturePhase, FlowEvent};
use capture_session::{CaptureSession, DeviceError, DeviceProvider, FacingMode, ScrollLock};
use face_quality::{best_face, FaceLocator, FrameAssessment};
use finalizer::CapturedImage;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, warn};
use uploader::{PortraitUploader, UploadOutcome, UploadPayload};

/// Guided photo capture controller
///
/// One instance per modal; each owns its own counters and timers with no
/// cross-instance sharing. Timer tasks hold the session epoch they were
/// spawned under and bail out if the epoch has moved on, so a timer racing
/// against teardown can never mutate a torn-down modal.
pub struct CaptureController<P, U>
where
    P: DeviceProvider + 'static,
    U: PortraitUploader,
{
    inner: Arc<Mutex<Inner<P>>>,
    uploader: Arc<U>,
}

struct Inner<P: DeviceProvider> {
    config: CaptureConfig,
    session: CaptureSession<P>,
    locator: Option<Box<dyn FaceLocator>>,
    scroll: Box<dyn ScrollLock>,
    flow: CaptureFlow,
    captured: Option<CapturedImage>,
    upload: UploadOutcome,
    device_error: Option<&'static str>,
    has_multiple_cameras: bool,
    /// Bumped on open, retake, and close; stale timers compare and bail
    epoch: u64,
    tasks: Vec<JoinHandle<()>>,
    open: bool,
    closed: bool,
    view_tx: watch::Sender<ModalView>,
}

impl<P, U> CaptureController<P, U>
where
    P: DeviceProvider + 'static,
    U: PortraitUploader,
{
    /// Build a controller around its collaborators
    ///
    /// `locator` is the optional platform face-detection capability; its
    /// absence selects the always-ready fallback at open time.
    pub fn new(
        provider: P,
        uploader: U,
        locator: Option<Box<dyn FaceLocator>>,
        scroll: Box<dyn ScrollLock>,
        config: CaptureConfig,
    ) -> Self {
        let (view_tx, _) = watch::channel(ModalView::default());
        let flow = match locator {
            Some(_) => CaptureFlow::new(config.flow.clone()),
            None => CaptureFlow::new_ready(config.flow.clone()),
        };
        let inner = Inner {
            session: CaptureSession::new(provider, config.session.clone()),
            locator,
            scroll,
            flow,
            captured: None,
            upload: UploadOutcome::Idle,
            device_error: None,
            has_multiple_cameras: false,
            epoch: 0,
            tasks: Vec::new(),
            open: false,
            closed: false,
            view_tx,
            config,
        };
        Self {
            inner: Arc::new(Mutex::new(inner)),
            uploader: Arc::new(uploader),
        }
    }

    /// Subscribe to view snapshots
    pub async fn view(&self) -> watch::Receiver<ModalView> {
        self.inner.lock().await.view_tx.subscribe()
    }

    /// Current view snapshot
    pub async fn current_view(&self) -> ModalView {
        let inner = self.inner.lock().await;
        inner.snapshot()
    }

    /// The finalized still, once one exists
    pub async fn captured_image(&self) -> Option<CapturedImage> {
        self.inner.lock().await.captured.clone()
    }

    /// Open the modal: lock scrolling, start the camera front-facing, and
    /// begin evaluating frames (or go straight to ready when no face
    /// locator is available)
    pub async fn open(&self) -> Result<(), DeviceError> {
        let mut inner = self.inner.lock().await;
        if inner.open {
            return Ok(());
        }

        inner.closed = false;
        inner.scroll.set_locked(true);
        inner.has_multiple_cameras = inner.session.detect_multiple_cameras().await;

        if let Err(e) = inner.session.start(FacingMode::Front).await {
            warn!(error = %e, "camera acquisition failed");
            inner.device_error = Some(e.user_message());
            inner.scroll.set_locked(false);
            inner.publish();
            return Err(e);
        }

        inner.device_error = None;
        inner.upload = UploadOutcome::Idle;
        inner.epoch += 1;
        inner.open = true;

        let detector_available = inner.locator.is_some();
        inner.flow.reset(detector_available);
        if detector_available {
            let handle = spawn_eval_loop(Arc::clone(&self.inner), inner.epoch);
            inner.tasks.push(handle);
        } else {
            info!("no face locator available, capture is immediately ready");
        }

        inner.publish();
        Ok(())
    }

    /// Toggle front/back camera
    ///
    /// No-op while no stream is open or once an image has been finalized.
    pub async fn flip(&self) -> Result<(), DeviceError> {
        let mut inner = self.inner.lock().await;
        if !inner.open || !inner.session.is_active() || inner.captured.is_some() {
            return Ok(());
        }

        let result = inner.session.flip().await;
        if let Err(e) = &result {
            warn!(error = %e, "camera flip failed");
            inner.device_error = Some(e.user_message());
        }
        inner.publish();
        result
    }

    /// Manual capture trigger: start the visible countdown
    ///
    /// Always available, independent of face detection. Ignored while a
    /// countdown is already running or a capture is pending.
    pub async fn request_capture(&self) {
        let mut inner = self.inner.lock().await;
        if !inner.open || !inner.flow.begin_countdown() {
            return;
        }

        debug!("manual countdown started");
        let handle = spawn_countdown(
            Arc::clone(&self.inner),
            Duration::from_millis(inner.config.countdown_interval_ms),
            inner.epoch,
        );
        inner.tasks.push(handle);
        inner.publish();
    }

    /// Hand the finalized image to the upload collaborator
    ///
    /// On success the modal closes itself after a short confirmation
    /// delay; on failure the preview stays up so the user can retry or
    /// retake. An upload still in flight when the modal closes is allowed
    /// to finish, but its result is discarded by the epoch guard.
    pub async fn upload(&self, subject_code: &str) {
        let mut inner = self.inner.lock().await;
        let Some(image) = inner.captured.clone() else {
            return;
        };
        if inner.upload == UploadOutcome::InProgress {
            return;
        }

        inner.upload = UploadOutcome::InProgress;
        inner.publish();

        let epoch = inner.epoch;
        let close_delay = Duration::from_millis(inner.config.success_close_delay_ms);
        let subject = subject_code.to_string();
        let uploader = Arc::clone(&self.uploader);
        let shared = Arc::clone(&self.inner);
        drop(inner);

        tokio::spawn(async move {
            let payload = UploadPayload::from_image(&image);
            let result = uploader.upload(&subject, vec![payload]).await;

            let mut inner = shared.lock().await;
            if inner.epoch != epoch {
                debug!("upload finished after teardown, discarding result");
                return;
            }
            match result {
                Ok(()) => {
                    info!(subject = %subject, "portrait uploaded");
                    inner.upload = UploadOutcome::Success;
                    inner.publish();
                    spawn_success_close(Arc::clone(&shared), close_delay, epoch);
                }
                Err(e) => {
                    warn!(subject = %subject, error = %e, "portrait upload failed");
                    inner.upload = UploadOutcome::Failure(e.message);
                    inner.publish();
                }
            }
        });
    }

    /// Discard the captured image and restart the live session
    pub async fn retake(&self) -> Result<(), DeviceError> {
        let mut inner = self.inner.lock().await;
        if !inner.open {
            return Ok(());
        }

        inner.cancel_timers();
        inner.captured = None;
        inner.upload = UploadOutcome::Idle;
        inner.device_error = None;

        let detector_available = inner.locator.is_some();
        inner.flow.reset(detector_available);

        let facing = inner.session.facing();
        if let Err(e) = inner.session.start(facing).await {
            warn!(error = %e, "camera restart failed on retake");
            inner.device_error = Some(e.user_message());
            inner.publish();
            return Err(e);
        }

        if detector_available {
            let handle = spawn_eval_loop(Arc::clone(&self.inner), inner.epoch);
            inner.tasks.push(handle);
        }
        inner.publish();
        Ok(())
    }

    /// Close the modal: release the camera, unlock scrolling, cancel every
    /// pending timer, and clear all captured/upload state
    ///
    /// Idempotent; safe on any path (manual close, success auto-close,
    /// unmount).
    pub async fn close(&self) {
        let mut inner = self.inner.lock().await;
        inner.close_now();
    }
}

impl<P: DeviceProvider> Inner<P> {
    fn snapshot(&self) -> ModalView {
        let status = self.flow.status();
        ModalView {
            phase: self.flow.phase(),
            status,
            hint: status.hint(),
            progress_percent: self.flow.progress_percent(),
            countdown: self.flow.countdown_remaining(),
            facing: self.session.facing(),
            has_multiple_cameras: self.has_multiple_cameras,
            upload: self.upload.clone(),
            device_error: self.device_error,
            preview_available: self.captured.is_some(),
            closed: self.closed,
        }
    }

    fn publish(&self) {
        self.view_tx.send_replace(self.snapshot());
    }

    /// One evaluation tick: sample the current frame, run the locator,
    /// classify, and feed the state machine
    ///
    /// Skipped entirely outside the evaluating phase (countdown running or
    /// capture pending). Locator failures skip the tick without touching
    /// status.
    fn evaluation_tick(&mut self) -> FlowEvent {
        if self.flow.phase() != CapturePhase::Evaluating {
            return FlowEvent::None;
        }
        let Some(frame) = self.session.current_frame() else {
            return FlowEvent::None;
        };
        let Some(locator) = self.locator.as_mut() else {
            return FlowEvent::None;
        };

        let faces = match locator.locate(&frame) {
            Ok(faces) => faces,
            Err(e) => {
                warn!(error = %e, "face detection failed, skipping tick");
                return FlowEvent::None;
            }
        };

        let assessment = match best_face(&faces) {
            Some(face) => {
                FrameAssessment::from_face(face, frame.width, frame.height, &self.config.quality)
            }
            None => FrameAssessment::no_face(),
        };

        let event = self.flow.observe(assessment.status);
        self.publish();
        event
    }

    /// Take the photo from the current frame and stop the camera
    fn capture_now(&mut self) {
        let facing = self.session.facing();
        match self.session.current_frame() {
            Some(frame) => match finalizer::finalize(&frame, facing) {
                Ok(image) => {
                    info!(side = image.side(), mirrored = image.mirrored(), "image finalized");
                    self.captured = Some(image);
                    self.flow.mark_captured();
                    // The camera is no longer needed once a still exists
                    self.session.stop();
                }
                Err(e) => {
                    warn!(error = %e, "finalization failed, resuming evaluation");
                    self.flow.resume();
                }
            },
            None => {
                warn!("no frame available at capture time, resuming evaluation");
                self.flow.resume();
            }
        }
        self.publish();
    }

    /// Invalidate and abort every pending timer task
    fn cancel_timers(&mut self) {
        self.epoch += 1;
        for task in self.tasks.drain(..) {
            task.abort();
        }
    }

    /// Full teardown; idempotent
    fn close_now(&mut self) {
        self.cancel_timers();
        self.session.stop();
        self.scroll.set_locked(false);
        self.captured = None;
        self.upload = UploadOutcome::Idle;
        self.device_error = None;
        let detector_available = self.locator.is_some();
        self.flow.reset(detector_available);
        self.open = false;
        self.closed = true;
        self.publish();
    }
}

/// Evaluation loop, ticking while the session stays current
///
/// Exits on epoch change, modal close, or once an image is finalized.
fn spawn_eval_loop<P>(shared: Arc<Mutex<Inner<P>>>, epoch: u64) -> JoinHandle<()>
where
    P: DeviceProvider + 'static,
{
    tokio::spawn(async move {
        let (tick_interval, capture_delay) = {
            let inner = shared.lock().await;
            (
                Duration::from_millis(inner.config.tick_interval_ms),
                Duration::from_millis(inner.config.auto_capture_delay_ms),
            )
        };
        let mut ticker = time::interval(tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            let mut inner = shared.lock().await;
            if inner.epoch != epoch || !inner.open {
                break;
            }
            if inner.flow.phase() == CapturePhase::Preview {
                break;
            }
            if inner.evaluation_tick() == FlowEvent::ScheduleAutoCapture {
                // Give the UI a beat to render the capturing affordance
                spawn_auto_capture(Arc::clone(&shared), capture_delay, epoch);
            }
        }
    })
}

/// One-shot delayed automatic capture
///
/// At most one can be pending per stability cycle: the flow is already in
/// the capturing phase when this is scheduled, so further ticks cannot
/// schedule another.
fn spawn_auto_capture<P>(shared: Arc<Mutex<Inner<P>>>, delay: Duration, epoch: u64)
where
    P: DeviceProvider + 'static,
{
    tokio::spawn(async move {
        time::sleep(delay).await;
        let mut inner = shared.lock().await;
        if inner.epoch != epoch || inner.flow.phase() != CapturePhase::Capturing {
            return;
        }
        inner.capture_now();
    });
}

/// Manual countdown ticking once per second until it fires the capture
fn spawn_countdown<P>(
    shared: Arc<Mutex<Inner<P>>>,
    interval: Duration,
    epoch: u64,
) -> JoinHandle<()>
where
    P: DeviceProvider + 'static,
{
    tokio::spawn(async move {
        loop {
            time::sleep(interval).await;
            let mut inner = shared.lock().await;
            if inner.epoch != epoch {
                break;
            }
            match inner.flow.countdown_tick() {
                FlowEvent::FireCapture => {
                    inner.capture_now();
                    break;
                }
                _ => {
                    if inner.flow.countdown_remaining().is_none() {
                        break;
                    }
                    inner.publish();
                }
            }
        }
    })
}

/// Success confirmation delay, then auto-close
fn spawn_success_close<P>(shared: Arc<Mutex<Inner<P>>>, delay: Duration, epoch: u64)
where
    P: DeviceProvider + 'static,
{
    tokio::spawn(async move {
        time::sleep(delay).await;
        let mut inner = shared.lock().await;
        if inner.epoch != epoch {
            return;
        }
        info!("upload confirmed, closing modal");
        inner.close_now();
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use capture_session::{StreamConstraints, VideoFrame, VideoInput, VideoStream};
    use face_quality::{FaceBox, LocatorError};
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex as StdMutex;
    use uploader::UploadError;

    struct TestStream {
        released: Arc<AtomicUsize>,
    }

    impl VideoStream for TestStream {
        fn latest_frame(&mut self) -> Option<VideoFrame> {
            Some(VideoFrame::solid([120, 120, 120], 640, 480))
        }

        fn dimensions(&self) -> (u32, u32) {
            (640, 480)
        }
    }

    impl Drop for TestStream {
        fn drop(&mut self) {
            self.released.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct TestProvider {
        cameras: usize,
        released: Arc<AtomicUsize>,
    }

    impl TestProvider {
        fn new(cameras: usize) -> (Self, Arc<AtomicUsize>) {
            let released = Arc::new(AtomicUsize::new(0));
            (
                Self {
                    cameras,
                    released: Arc::clone(&released),
                },
                released,
            )
        }
    }

    impl DeviceProvider for TestProvider {
        type Stream = TestStream;

        async fn acquire(
            &mut self,
            _constraints: &StreamConstraints,
        ) -> Result<TestStream, DeviceError> {
            if self.cameras == 0 {
                return Err(DeviceError::CameraUnavailable);
            }
            Ok(TestStream {
                released: Arc::clone(&self.released),
            })
        }

        async fn enumerate_video_inputs(&mut self) -> Result<Vec<VideoInput>, DeviceError> {
            Ok((0..self.cameras)
                .map(|i| VideoInput {
                    id: format!("cam-{i}"),
                    label: format!("camera {i}"),
                })
                .collect())
        }
    }

    /// A face centered in a 640x480 frame with size ratio 0.5
    fn good_face() -> FaceBox {
        FaceBox {
            x: 200.0,
            y: 120.0,
            width: 240.0,
            height: 240.0,
            confidence: 0.95,
        }
    }

    /// Plays back a fixed script, then keeps repeating the final entry
    struct ScriptedLocator {
        script: VecDeque<Result<Vec<FaceBox>, LocatorError>>,
        fallback: Result<Vec<FaceBox>, LocatorError>,
    }

    impl ScriptedLocator {
        fn always_good() -> Self {
            Self {
                script: VecDeque::new(),
                fallback: Ok(vec![good_face()]),
            }
        }

        fn script(
            entries: Vec<Result<Vec<FaceBox>, LocatorError>>,
            fallback: Result<Vec<FaceBox>, LocatorError>,
        ) -> Self {
            Self {
                script: entries.into(),
                fallback,
            }
        }
    }

    impl FaceLocator for ScriptedLocator {
        fn locate(&mut self, _frame: &VideoFrame) -> Result<Vec<FaceBox>, LocatorError> {
            self.script.pop_front().unwrap_or_else(|| self.fallback.clone())
        }
    }

    struct TestUploader {
        result: Result<(), UploadError>,
        calls: Arc<StdMutex<Vec<String>>>,
    }

    impl TestUploader {
        fn succeeding() -> (Self, Arc<StdMutex<Vec<String>>>) {
            let calls = Arc::new(StdMutex::new(Vec::new()));
            (
                Self {
                    result: Ok(()),
                    calls: Arc::clone(&calls),
                },
                calls,
            )
        }

        fn failing(message: &str) -> Self {
            Self {
                result: Err(UploadError::new(message)),
                calls: Arc::new(StdMutex::new(Vec::new())),
            }
        }
    }

    impl PortraitUploader for TestUploader {
        async fn upload(
            &self,
            subject_code: &str,
            files: Vec<UploadPayload>,
        ) -> Result<(), UploadError> {
            assert!(!files.is_empty());
            self.calls.lock().unwrap().push(subject_code.to_string());
            self.result.clone()
        }
    }

    struct TestScroll {
        locked: Arc<AtomicBool>,
    }

    impl TestScroll {
        fn new() -> (Box<Self>, Arc<AtomicBool>) {
            let locked = Arc::new(AtomicBool::new(false));
            (
                Box::new(Self {
                    locked: Arc::clone(&locked),
                }),
                locked,
            )
        }
    }

    impl ScrollLock for TestScroll {
        fn set_locked(&mut self, locked: bool) {
            self.locked.store(locked, Ordering::SeqCst);
        }
    }

    fn controller(
        cameras: usize,
        locator: Option<Box<dyn FaceLocator>>,
        uploader: TestUploader,
    ) -> (
        CaptureController<TestProvider, TestUploader>,
        Arc<AtomicUsize>,
        Arc<AtomicBool>,
    ) {
        let (provider, released) = TestProvider::new(cameras);
        let (scroll, locked) = TestScroll::new();
        let ctl = CaptureController::new(
            provider,
            uploader,
            locator,
            scroll,
            CaptureConfig::default(),
        );
        (ctl, released, locked)
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_locator_is_immediately_ready() {
        let (ctl, released, _) = controller(1, None, TestUploader::failing("unused"));
        ctl.open().await.unwrap();

        let view = ctl.current_view().await;
        assert_eq!(view.phase, CapturePhase::Ready);
        assert_eq!(view.status, face_quality::FrameStatus::Ready);
        assert_eq!(view.progress_percent, 0.0);

        // The capture trigger always succeeds: countdown, then capture
        ctl.request_capture().await;
        time::sleep(Duration::from_millis(3100)).await;

        let view = ctl.current_view().await;
        assert_eq!(view.phase, CapturePhase::Preview);
        assert!(view.preview_available);
        // Camera released as soon as the still was finalized
        assert_eq!(released.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stable_streak_triggers_exactly_one_capture() {
        let locator = Box::new(ScriptedLocator::always_good());
        let (ctl, released, _) = controller(1, Some(locator), TestUploader::failing("unused"));
        ctl.open().await.unwrap();

        // 15 ticks at 100ms plus the 200ms capture delay
        time::sleep(Duration::from_millis(2000)).await;

        let view = ctl.current_view().await;
        assert_eq!(view.phase, CapturePhase::Preview);
        assert!(view.preview_available);
        assert_eq!(released.load(Ordering::SeqCst), 1);
        assert!(ctl.captured_image().await.is_some());

        // Plenty more good frames arrive; nothing else may fire
        time::sleep(Duration::from_millis(5000)).await;
        assert_eq!(released.load(Ordering::SeqCst), 1);
        assert_eq!(ctl.current_view().await.phase, CapturePhase::Preview);
    }

    #[tokio::test(start_paused = true)]
    async fn test_interrupted_streak_never_captures() {
        // 10 good frames, then the face disappears for good
        let mut entries: Vec<Result<Vec<FaceBox>, LocatorError>> = Vec::new();
        for _ in 0..10 {
            entries.push(Ok(vec![good_face()]));
        }
        let locator = Box::new(ScriptedLocator::script(entries, Ok(vec![])));
        let (ctl, _, _) = controller(1, Some(locator), TestUploader::failing("unused"));
        ctl.open().await.unwrap();

        time::sleep(Duration::from_millis(4000)).await;

        let view = ctl.current_view().await;
        assert_eq!(view.phase, CapturePhase::Evaluating);
        assert_eq!(view.status, face_quality::FrameStatus::NoFace);
        assert_eq!(view.progress_percent, 0.0);
        assert!(!view.preview_available);
    }

    #[tokio::test(start_paused = true)]
    async fn test_detector_errors_are_skipped_not_surfaced() {
        let entries = vec![
            Err(LocatorError::Detection("backend hiccup".into())),
            Err(LocatorError::Detection("backend hiccup".into())),
        ];
        let locator = Box::new(ScriptedLocator::script(entries, Ok(vec![good_face()])));
        let (ctl, _, _) = controller(1, Some(locator), TestUploader::failing("unused"));
        ctl.open().await.unwrap();

        time::sleep(Duration::from_millis(2500)).await;

        let view = ctl.current_view().await;
        // The two failing ticks delayed but did not prevent the capture
        assert_eq!(view.phase, CapturePhase::Preview);
        assert_eq!(view.device_error, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_countdown_fires_once_and_suspends_evaluation() {
        let locator = Box::new(ScriptedLocator::always_good());
        let (ctl, released, _) = controller(1, Some(locator), TestUploader::failing("unused"));
        ctl.open().await.unwrap();

        ctl.request_capture().await;
        let view = ctl.current_view().await;
        assert_eq!(view.phase, CapturePhase::CountingDown);
        assert_eq!(view.countdown, Some(3));

        // A second tap while counting must not start another countdown
        ctl.request_capture().await;
        assert_eq!(ctl.current_view().await.countdown, Some(3));

        time::sleep(Duration::from_millis(1100)).await;
        assert_eq!(ctl.current_view().await.countdown, Some(2));

        time::sleep(Duration::from_millis(2100)).await;
        let view = ctl.current_view().await;
        assert_eq!(view.phase, CapturePhase::Preview);
        assert!(view.preview_available);
        // Exactly one capture; the good-frame stream never raced it
        assert_eq!(released.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_upload_failure_keeps_preview_open() {
        let (ctl, _, _) = controller(1, None, TestUploader::failing("network error"));
        ctl.open().await.unwrap();
        ctl.request_capture().await;
        time::sleep(Duration::from_millis(3100)).await;

        ctl.upload("STU-042").await;
        time::sleep(Duration::from_millis(100)).await;

        let view = ctl.current_view().await;
        assert_eq!(view.upload, UploadOutcome::Failure("network error".into()));
        assert!(view.preview_available, "preview must stay up for retry");
        assert!(!view.closed);

        // No auto-close on failure
        time::sleep(Duration::from_millis(5000)).await;
        assert!(!ctl.current_view().await.closed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_upload_success_auto_closes() {
        let (uploader, calls) = TestUploader::succeeding();
        let (ctl, released, locked) = controller(1, None, uploader);
        ctl.open().await.unwrap();
        assert!(locked.load(Ordering::SeqCst));

        ctl.request_capture().await;
        time::sleep(Duration::from_millis(3100)).await;

        ctl.upload("STU-042").await;
        time::sleep(Duration::from_millis(100)).await;
        assert_eq!(ctl.current_view().await.upload, UploadOutcome::Success);
        assert!(!ctl.current_view().await.closed);

        // Confirmation stays up for 1.5s, then the modal closes itself
        time::sleep(Duration::from_millis(1600)).await;
        let view = ctl.current_view().await;
        assert!(view.closed);
        assert!(!view.preview_available);
        assert!(!locked.load(Ordering::SeqCst));
        assert_eq!(released.load(Ordering::SeqCst), 1);
        assert_eq!(calls.lock().unwrap().as_slice(), ["STU-042"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_double_upload_is_ignored_while_in_flight() {
        let (uploader, calls) = TestUploader::succeeding();
        let (ctl, _, _) = controller(1, None, uploader);
        ctl.open().await.unwrap();
        ctl.request_capture().await;
        time::sleep(Duration::from_millis(3100)).await;

        ctl.upload("STU-042").await;
        ctl.upload("STU-042").await;
        time::sleep(Duration::from_millis(200)).await;

        assert_eq!(calls.lock().unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retake_restarts_from_scratch() {
        let locator = Box::new(ScriptedLocator::always_good());
        let (ctl, released, _) = controller(1, Some(locator), TestUploader::failing("unused"));
        ctl.open().await.unwrap();
        time::sleep(Duration::from_millis(2000)).await;
        assert_eq!(ctl.current_view().await.phase, CapturePhase::Preview);

        ctl.retake().await.unwrap();
        let view = ctl.current_view().await;
        assert_eq!(view.phase, CapturePhase::Evaluating);
        assert!(!view.preview_available);
        assert_eq!(view.upload, UploadOutcome::Idle);
        assert_eq!(view.progress_percent, 0.0);

        // The streak rebuilds and captures again
        time::sleep(Duration::from_millis(2000)).await;
        assert_eq!(ctl.current_view().await.phase, CapturePhase::Preview);
        assert_eq!(released.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_is_idempotent_and_cancels_everything() {
        let locator = Box::new(ScriptedLocator::always_good());
        let (ctl, released, locked) = controller(1, Some(locator), TestUploader::failing("unused"));
        ctl.open().await.unwrap();
        ctl.request_capture().await;

        ctl.close().await;
        ctl.close().await;
        ctl.retake().await.unwrap();

        let view = ctl.current_view().await;
        assert!(view.closed);
        assert!(!locked.load(Ordering::SeqCst));
        assert_eq!(released.load(Ordering::SeqCst), 1);

        // Cancelled countdown and evaluation timers never fire
        time::sleep(Duration::from_millis(5000)).await;
        assert!(!ctl.current_view().await.preview_available);
        assert_eq!(released.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_flip_swaps_facing() {
        let (ctl, released, _) = controller(2, None, TestUploader::failing("unused"));
        ctl.open().await.unwrap();

        let view = ctl.current_view().await;
        assert!(view.has_multiple_cameras);
        assert_eq!(view.facing, FacingMode::Front);

        ctl.flip().await.unwrap();
        let view = ctl.current_view().await;
        assert_eq!(view.facing, FacingMode::Back);
        // Old stream fully released before the new one was acquired
        assert_eq!(released.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_open_failure_surfaces_specific_message() {
        let (ctl, _, locked) = controller(0, None, TestUploader::failing("unused"));
        let err = ctl.open().await.unwrap_err();
        assert_eq!(err, DeviceError::CameraUnavailable);

        let view = ctl.current_view().await;
        assert_eq!(view.device_error, Some("No camera was found on this device."));
        assert!(!locked.load(Ordering::SeqCst), "scroll lock released on failure");
    }

    #[tokio::test(start_paused = true)]
    async fn test_upload_landing_after_close_is_discarded() {
        let (uploader, calls) = TestUploader::succeeding();
        let (ctl, _, _) = controller(1, None, uploader);
        ctl.open().await.unwrap();
        ctl.request_capture().await;
        time::sleep(Duration::from_millis(3100)).await;

        ctl.upload("STU-042").await;
        // Close before the upload task gets to run
        ctl.close().await;
        time::sleep(Duration::from_millis(3000)).await;

        // The collaborator may have completed, but the modal state is inert
        let view = ctl.current_view().await;
        assert!(view.closed);
        assert_eq!(view.upload, UploadOutcome::Idle);
        assert!(calls.lock().unwrap().len() <= 1);
    }
}
