//! Controller behaviour against a recording device, driven step by step
//! through a `ManualDispatcher`.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use camera_session_core::{
    Acknowledgement, CameraDevice, CaptureCallback, CaptureEvent, Completion, HardwareError,
    ManualDispatcher, PhotoStorage, PreviewSurface, RecordingCompletion, SessionConfig,
    SessionController, SessionError, SessionObserver, SessionState, SessionView, Size,
    StoreCompletion, SurfaceHandle,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Prepare,
    Open,
    Close,
    Bind,
    Scan,
    CancelScan,
    Capture(u64),
    StartRecording,
    StopRecording,
    Release,
}

/// Records every call and holds completions until the test fires them.
#[derive(Default)]
struct FakeDevice {
    ops: Mutex<Vec<Op>>,
    opens: Mutex<VecDeque<Completion>>,
    binds: Mutex<VecDeque<Completion>>,
    scans: Mutex<VecDeque<Completion>>,
    cancels: Mutex<VecDeque<Acknowledgement>>,
    captures: Mutex<VecDeque<(u64, CaptureCallback)>>,
    recording_starts: Mutex<VecDeque<Completion>>,
    recording_stops: Mutex<VecDeque<RecordingCompletion>>,
}

impl FakeDevice {
    fn ops(&self) -> Vec<Op> {
        self.ops.lock().clone()
    }

    fn count(&self, op: Op) -> usize {
        self.ops.lock().iter().filter(|o| **o == op).count()
    }

    fn captures_issued(&self) -> usize {
        self.ops
            .lock()
            .iter()
            .filter(|o| matches!(o, Op::Capture(_)))
            .count()
    }
}

impl CameraDevice for FakeDevice {
    fn prepare(&self) -> Result<(), HardwareError> {
        self.ops.lock().push(Op::Prepare);
        Ok(())
    }

    fn open(&self, _aspect_wh: f32, on_opened: Completion) {
        self.ops.lock().push(Op::Open);
        self.opens.lock().push_back(on_opened);
    }

    fn close(&self, on_closed: Completion) {
        self.ops.lock().push(Op::Close);
        on_closed(true);
    }

    fn bind_surface(&self, _surface: SurfaceHandle, on_bound: Completion) {
        self.ops.lock().push(Op::Bind);
        self.binds.lock().push_back(on_bound);
    }

    fn scan(&self, on_scan_done: Completion) {
        self.ops.lock().push(Op::Scan);
        self.scans.lock().push_back(on_scan_done);
    }

    fn cancel_scan(&self, on_cancelled: Acknowledgement) {
        self.ops.lock().push(Op::CancelScan);
        self.cancels.lock().push_back(on_cancelled);
    }

    fn still_capture(&self, request_id: u64, on_event: CaptureCallback) {
        self.ops.lock().push(Op::Capture(request_id));
        self.captures.lock().push_back((request_id, on_event));
    }

    fn start_recording(&self, on_started: Completion) {
        self.ops.lock().push(Op::StartRecording);
        self.recording_starts.lock().push_back(on_started);
    }

    fn stop_recording(&self, on_stopped: RecordingCompletion) {
        self.ops.lock().push(Op::StopRecording);
        self.recording_stops.lock().push_back(on_stopped);
    }

    fn preview_size(&self) -> Option<Size> {
        Some(Size::new(1280, 720))
    }

    fn sensor_orientation(&self) -> u32 {
        90
    }

    fn release(&self) {
        self.ops.lock().push(Op::Release);
    }
}

struct FakeSurface;

impl PreviewSurface for FakeSurface {
    fn size(&self) -> Size {
        Size::new(720, 1280)
    }

    fn is_valid(&self) -> bool {
        true
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Notice {
    ScanStarted,
    ScanDone(bool),
    ShutterDone,
    RecordingStarted,
    RecordingStopped,
    Clear,
    ForceStop,
}

#[derive(Default)]
struct RecordingView {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingView {
    fn count(&self, notice: &Notice) -> usize {
        self.notices.lock().iter().filter(|n| *n == notice).count()
    }
}

impl SessionView for RecordingView {
    fn preview_surface(&self) -> Option<SurfaceHandle> {
        Some(Arc::new(FakeSurface))
    }

    fn on_scan_started(&self) {
        self.notices.lock().push(Notice::ScanStarted);
    }

    fn on_scan_done(&self, success: bool) {
        self.notices.lock().push(Notice::ScanDone(success));
    }

    fn on_shutter_done(&self) {
        self.notices.lock().push(Notice::ShutterDone);
    }

    fn on_recording_started(&self) {
        self.notices.lock().push(Notice::RecordingStarted);
    }

    fn on_recording_stopped(&self) {
        self.notices.lock().push(Notice::RecordingStopped);
    }

    fn clear(&self) {
        self.notices.lock().push(Notice::Clear);
    }

    fn force_stop(&self) {
        self.notices.lock().push(Notice::ForceStop);
    }
}

#[derive(Default)]
struct MemoryStorage {
    photos: Mutex<Vec<Vec<u8>>>,
}

impl PhotoStorage for MemoryStorage {
    fn store_photo(&self, data: Vec<u8>, on_stored: StoreCompletion) {
        let mut photos = self.photos.lock();
        photos.push(data);
        let locator = format!("memory://{}", photos.len());
        drop(photos);
        on_stored(true, Some(locator));
    }
}

#[derive(Default)]
struct RecordingObserver {
    transitions: Mutex<Vec<(SessionState, SessionState)>>,
}

impl SessionObserver for RecordingObserver {
    fn on_state_changed(&self, from: SessionState, to: SessionState) {
        self.transitions.lock().push((from, to));
    }
}

struct Harness {
    controller: SessionController,
    dispatcher: Arc<ManualDispatcher>,
    device: Arc<FakeDevice>,
    view: Arc<RecordingView>,
    storage: Arc<MemoryStorage>,
    observer: Arc<RecordingObserver>,
}

impl Harness {
    fn new() -> Self {
        let dispatcher = Arc::new(ManualDispatcher::new());
        let device = Arc::new(FakeDevice::default());
        let view = Arc::new(RecordingView::default());
        let storage = Arc::new(MemoryStorage::default());
        let observer = Arc::new(RecordingObserver::default());
        let controller = SessionController::new(
            SessionConfig::default(),
            device.clone(),
            view.clone(),
            storage.clone(),
            dispatcher.clone(),
        )
        .unwrap();
        controller.set_observer(observer.clone());
        Self {
            controller,
            dispatcher,
            device,
            view,
            storage,
            observer,
        }
    }

    fn started() -> Self {
        let harness = Self::new();
        harness.controller.start().unwrap();
        harness
    }

    fn idle() -> Self {
        let harness = Self::started();
        harness.controller.resume().unwrap();
        harness.complete_open(true);
        harness.controller.on_surface_ready().unwrap();
        harness.pump();
        assert_eq!(harness.state(), SessionState::Idle);
        harness
    }

    fn capturing() -> Self {
        let harness = Self::idle();
        harness.controller.request_scan().unwrap();
        harness.complete_scan(true);
        harness.controller.request_still_capture().unwrap();
        harness.pump();
        assert_eq!(harness.state(), SessionState::StillCapturing);
        harness
    }

    fn recording() -> Self {
        let harness = Self::idle();
        harness.controller.request_start_recording().unwrap();
        harness.complete_recording_start(true);
        assert_eq!(harness.state(), SessionState::Recording);
        harness
    }

    fn state(&self) -> SessionState {
        self.controller.state()
    }

    fn pump(&self) {
        self.dispatcher.run_pending();
    }

    fn complete_open(&self, success: bool) {
        let done = self.device.opens.lock().pop_front().expect("no open issued");
        done(success);
        self.pump();
    }

    fn complete_scan(&self, success: bool) {
        let done = self.device.scans.lock().pop_front().expect("no scan issued");
        done(success);
        self.pump();
    }

    fn complete_cancel(&self) {
        let done = self.device.cancels.lock().pop_front().expect("no cancel issued");
        done();
        self.pump();
    }

    fn complete_recording_start(&self, success: bool) {
        let done = self
            .device
            .recording_starts
            .lock()
            .pop_front()
            .expect("no recording start issued");
        done(success);
        self.pump();
    }

    fn complete_recording_stop(&self) {
        let done = self
            .device
            .recording_stops
            .lock()
            .pop_front()
            .expect("no recording stop issued");
        done(true, Some("memory://clip".into()));
        self.pump();
    }

    fn pending_capture(&self) -> (u64, CaptureCallback) {
        self.device.captures.lock().pop_front().expect("no capture issued")
    }

    fn finish_capture(&self, success: bool) {
        let (request_id, on_event) = self.pending_capture();
        if success {
            on_event(CaptureEvent::Shutter { request_id });
        }
        on_event(CaptureEvent::Done {
            request_id,
            success,
        });
        if success {
            on_event(CaptureEvent::PhotoReady {
                request_id,
                data: vec![0xFF, 0xD8, request_id as u8],
            });
        }
        self.pump();
    }
}

#[test]
fn triggers_require_start() {
    let harness = Harness::new();
    assert_eq!(harness.controller.resume(), Err(SessionError::NotStarted));
    assert_eq!(harness.controller.request_scan(), Err(SessionError::NotStarted));
    assert!(harness.device.ops().is_empty());
}

#[test]
fn start_is_rejected_while_active() {
    let harness = Harness::idle();
    assert_eq!(
        harness.controller.start(),
        Err(SessionError::AlreadyActive(SessionState::Idle))
    );
}

#[test]
fn start_is_idempotent_when_finalized() {
    let harness = Harness::started();
    assert!(harness.controller.start().is_ok());
    assert_eq!(harness.device.count(Op::Prepare), 1);
}

#[test]
fn invalid_config_is_rejected() {
    let config = SessionConfig {
        jpeg_quality: 0,
        ..SessionConfig::default()
    };
    let result = SessionController::new(
        config,
        Arc::new(FakeDevice::default()),
        Arc::new(RecordingView::default()),
        Arc::new(MemoryStorage::default()),
        Arc::new(ManualDispatcher::new()),
    );
    assert!(matches!(result, Err(SessionError::InvalidConfiguration(_))));
}

#[test]
fn rendezvous_after_camera_then_surface() {
    let harness = Harness::started();
    harness.controller.resume().unwrap();
    assert_eq!(harness.state(), SessionState::Initialized);

    harness.complete_open(true);
    assert_eq!(harness.state(), SessionState::Initialized);

    harness.controller.on_surface_ready().unwrap();
    assert_eq!(harness.state(), SessionState::Idle);
    assert_eq!(harness.device.ops(), vec![Op::Prepare, Op::Open, Op::Bind]);
}

#[test]
fn rendezvous_after_surface_then_camera() {
    let harness = Harness::started();
    harness.controller.resume().unwrap();
    harness.controller.on_surface_ready().unwrap();
    assert_eq!(harness.state(), SessionState::Initialized);
    harness.complete_open(true);
    assert_eq!(harness.state(), SessionState::Idle);
}

#[test]
fn rendezvous_signals_before_resume_do_not_count() {
    let harness = Harness::started();
    harness.controller.on_surface_ready().unwrap();
    harness.controller.resume().unwrap();
    harness.complete_open(true);
    assert_eq!(harness.state(), SessionState::Initialized);
}

#[test]
fn scan_is_single_flight() {
    let harness = Harness::idle();
    for _ in 0..3 {
        harness.controller.request_scan().unwrap();
    }
    harness.pump();
    assert_eq!(harness.device.count(Op::Scan), 1);
    assert_eq!(harness.view.count(&Notice::ScanStarted), 1);

    harness.complete_scan(true);
    harness.controller.request_scan().unwrap();
    assert_eq!(harness.device.count(Op::Scan), 1);

    harness.controller.request_cancel_scan().unwrap();
    harness.complete_cancel();
    assert_eq!(harness.state(), SessionState::Idle);
    harness.controller.request_scan().unwrap();
    assert_eq!(harness.device.count(Op::Scan), 2);
}

#[test]
fn latched_capture_fires_once_on_scan_success() {
    let harness = Harness::idle();
    harness.controller.request_scan().unwrap();
    harness.controller.request_still_capture().unwrap();
    harness.controller.request_still_capture().unwrap();
    assert_eq!(harness.device.captures_issued(), 0);

    harness.complete_scan(true);
    assert_eq!(harness.device.captures_issued(), 1);
}

#[test]
fn latched_capture_fires_once_on_scan_failure() {
    let harness = Harness::idle();
    harness.controller.request_scan().unwrap();
    harness.controller.request_still_capture().unwrap();
    harness.complete_scan(false);
    assert_eq!(harness.device.captures_issued(), 1);
    assert_eq!(harness.state(), SessionState::StillCapturing);
}

#[test]
fn no_capture_without_request() {
    let harness = Harness::idle();
    harness.controller.request_scan().unwrap();
    harness.complete_scan(true);
    assert_eq!(harness.device.captures_issued(), 0);
    assert_eq!(harness.state(), SessionState::ScanDone { success: true });
}

#[test]
fn capture_without_scan_is_rejected() {
    let harness = Harness::idle();
    harness.controller.request_still_capture().unwrap();
    harness.pump();
    assert_eq!(harness.device.captures_issued(), 0);
    assert_eq!(harness.state(), SessionState::Idle);
}

#[test]
fn scan_then_latched_capture() {
    let harness = Harness::idle();
    harness.controller.request_scan().unwrap();
    assert_eq!(harness.state(), SessionState::DoingScan);
    harness.controller.request_still_capture().unwrap();
    assert_eq!(harness.state(), SessionState::DoingScan);

    harness.complete_scan(true);
    assert_eq!(harness.state(), SessionState::StillCapturing);

    harness.finish_capture(true);
    assert_eq!(harness.state(), SessionState::Idle);

    let transitions = harness.observer.transitions.lock().clone();
    let tail: Vec<_> = transitions.iter().rev().take(4).rev().cloned().collect();
    assert_eq!(
        tail,
        vec![
            (SessionState::Idle, SessionState::DoingScan),
            (SessionState::DoingScan, SessionState::ScanDone { success: true }),
            (SessionState::ScanDone { success: true }, SessionState::StillCapturing),
            (SessionState::StillCapturing, SessionState::Idle),
        ]
    );
    assert_eq!(harness.storage.photos.lock().len(), 1);
    assert_eq!(harness.controller.photos_in_storage(), 0);
    assert_eq!(harness.view.count(&Notice::ShutterDone), 1);
}

#[test]
fn pause_during_capture_closes_afterwards() {
    let harness = Harness::capturing();
    harness.controller.pause().unwrap();
    harness.pump();
    assert_eq!(harness.state(), SessionState::StillCapturing);
    assert_eq!(harness.device.count(Op::Close), 0);

    harness.finish_capture(true);
    assert_eq!(harness.state(), SessionState::Finalized);
}

#[test]
fn close_is_issued_after_capture_done() {
    let harness = Harness::capturing();
    harness.controller.pause().unwrap();
    let (request_id, on_event) = harness.pending_capture();
    on_event(CaptureEvent::Shutter { request_id });
    harness.pump();
    assert_eq!(harness.device.count(Op::Close), 0);

    on_event(CaptureEvent::Done {
        request_id,
        success: true,
    });
    harness.pump();
    let ops = harness.device.ops();
    let capture_at = ops.iter().position(|o| *o == Op::Capture(request_id)).unwrap();
    let close_at = ops.iter().position(|o| *o == Op::Close).unwrap();
    assert!(close_at > capture_at);

    // The photo still reaches storage after the session closed.
    on_event(CaptureEvent::PhotoReady {
        request_id,
        data: vec![1, 2, 3],
    });
    harness.pump();
    assert_eq!(*harness.storage.photos.lock(), vec![vec![1, 2, 3]]);
}

#[test]
fn capture_failure_returns_to_idle() {
    let harness = Harness::capturing();
    harness.finish_capture(false);
    assert_eq!(harness.state(), SessionState::Idle);
    assert!(harness.storage.photos.lock().is_empty());
}

#[test]
fn stale_scan_result_is_dropped() {
    let harness = Harness::idle();
    harness.controller.request_scan().unwrap();
    harness.controller.pause().unwrap();
    harness.pump();
    assert_eq!(harness.state(), SessionState::Finalized);
    assert_eq!(harness.device.ops().last(), Some(&Op::Close));

    harness.complete_scan(true);
    assert_eq!(harness.state(), SessionState::Finalized);
    assert_eq!(harness.view.count(&Notice::ScanDone(true)), 0);
}

#[test]
fn stale_open_does_not_complete_rendezvous() {
    let harness = Harness::started();
    harness.controller.resume().unwrap();
    harness.controller.pause().unwrap();
    harness.controller.resume().unwrap();
    harness.controller.on_surface_ready().unwrap();

    harness.complete_open(true);
    assert_eq!(harness.state(), SessionState::Initialized);
    harness.complete_open(true);
    assert_eq!(harness.state(), SessionState::Idle);
}

#[test]
fn open_failure_forces_stop_once() {
    let harness = Harness::started();
    harness.controller.resume().unwrap();
    harness.complete_open(false);
    assert_eq!(harness.state(), SessionState::Initialized);
    assert_eq!(harness.view.count(&Notice::ForceStop), 0);

    harness.dispatcher.advance(Duration::from_millis(999));
    assert_eq!(harness.view.count(&Notice::ForceStop), 0);

    harness.dispatcher.advance(Duration::from_millis(1));
    assert_eq!(harness.view.count(&Notice::ForceStop), 1);
    assert_eq!(harness.state(), SessionState::Finalized);

    harness.dispatcher.advance(Duration::from_secs(5));
    assert_eq!(harness.view.count(&Notice::ForceStop), 1);
}

#[test]
fn open_failure_timeout_is_void_after_pause() {
    let harness = Harness::started();
    harness.controller.resume().unwrap();
    harness.complete_open(false);
    harness.controller.pause().unwrap();
    harness.controller.resume().unwrap();

    harness.dispatcher.advance(Duration::from_secs(2));
    assert_eq!(harness.view.count(&Notice::ForceStop), 0);
    assert_eq!(harness.state(), SessionState::Initialized);
}

#[test]
fn pause_while_scanning_cancels_before_close() {
    let harness = Harness::idle();
    harness.controller.request_scan().unwrap();
    harness.controller.pause().unwrap();
    let ops = harness.device.ops();
    assert_eq!(&ops[ops.len() - 2..], &[Op::CancelScan, Op::Close]);
}

#[test]
fn force_stop_notifies_and_closes() {
    let harness = Harness::idle();
    harness.controller.request_force_stop().unwrap();
    harness.pump();
    assert_eq!(harness.view.count(&Notice::ForceStop), 1);
    assert_eq!(harness.state(), SessionState::Finalized);
    assert_eq!(harness.device.ops().last(), Some(&Op::Close));
}

#[test]
fn resume_during_deferred_pause_keeps_session_open() {
    let harness = Harness::capturing();
    harness.controller.pause().unwrap();
    harness.controller.resume().unwrap();
    harness.finish_capture(true);

    assert_eq!(harness.state(), SessionState::Idle);
    assert_eq!(harness.device.count(Op::Close), 0);
    assert_eq!(harness.device.count(Op::Open), 1);
    assert!(harness.device.opens.lock().is_empty());

    // Still usable without another open.
    harness.controller.request_scan().unwrap();
    harness.pump();
    assert_eq!(harness.state(), SessionState::DoingScan);
    assert_eq!(harness.device.ops().last(), Some(&Op::Scan));
}

#[test]
fn pause_closes_pre_opened_camera() {
    let harness = Harness::started();
    harness.controller.request_pre_open().unwrap();
    harness.complete_open(true);
    harness.controller.pause().unwrap();
    assert_eq!(harness.device.ops(), vec![Op::Prepare, Op::Open, Op::Close]);

    // The next resume opens from scratch.
    harness.controller.resume().unwrap();
    harness.controller.on_surface_ready().unwrap();
    harness.complete_open(true);
    assert_eq!(harness.state(), SessionState::Idle);
    assert_eq!(harness.device.count(Op::Open), 2);
}

#[test]
fn pause_voids_pending_pre_open() {
    let harness = Harness::started();
    harness.controller.request_pre_open().unwrap();
    harness.controller.pause().unwrap();
    harness.complete_open(true);
    harness.controller.resume().unwrap();
    harness.controller.on_surface_ready().unwrap();
    harness.pump();
    assert_eq!(
        harness.device.ops(),
        vec![Op::Prepare, Op::Open, Op::Close, Op::Open]
    );
    assert_eq!(harness.state(), SessionState::Initialized);
}

#[test]
fn pre_open_then_resume_reuses_open() {
    let harness = Harness::started();
    harness.controller.request_pre_open().unwrap();
    harness.complete_open(true);
    assert_eq!(harness.state(), SessionState::Finalized);

    harness.controller.resume().unwrap();
    harness.controller.on_surface_ready().unwrap();
    harness.complete_open(true);
    assert_eq!(harness.state(), SessionState::Idle);
}

#[test]
fn cancelled_pre_open_ignores_late_result() {
    let harness = Harness::started();
    harness.controller.request_pre_open().unwrap();
    harness.controller.cancel_pre_open().unwrap();
    harness.complete_open(true);
    assert_eq!(harness.device.ops(), vec![Op::Prepare, Op::Open, Op::Close]);
    assert_eq!(harness.state(), SessionState::Finalized);
}

#[test]
fn view_notices_follow_scan_lifecycle() {
    let harness = Harness::idle();
    harness.view.notices.lock().clear();
    harness.controller.request_scan().unwrap();
    harness.complete_scan(false);
    harness.controller.request_cancel_scan().unwrap();
    harness.complete_cancel();
    assert_eq!(
        *harness.view.notices.lock(),
        vec![Notice::ScanStarted, Notice::ScanDone(false), Notice::Clear]
    );
}

#[test]
fn stop_releases_device_and_voids_callbacks() {
    let harness = Harness::idle();
    harness.controller.request_scan().unwrap();
    harness.controller.stop();
    assert!(!harness.controller.is_started());
    assert_eq!(harness.state(), SessionState::Finalized);
    let ops = harness.device.ops();
    assert_eq!(&ops[ops.len() - 2..], &[Op::Close, Op::Release]);

    harness.complete_scan(true);
    assert_eq!(harness.view.count(&Notice::ScanDone(true)), 0);
    assert_eq!(harness.controller.request_scan(), Err(SessionError::NotStarted));

    harness.controller.start().unwrap();
    harness.controller.resume().unwrap();
    assert_eq!(harness.state(), SessionState::Initialized);
}

#[test]
fn recording_stop_waits_for_minimum_duration() {
    let harness = Harness::recording();
    harness.controller.request_stop_recording().unwrap();
    harness.pump();
    assert_eq!(harness.device.count(Op::StopRecording), 0);

    harness.dispatcher.advance(Duration::from_millis(999));
    assert_eq!(harness.device.count(Op::StopRecording), 0);
    harness.dispatcher.advance(Duration::from_millis(1));
    assert_eq!(harness.device.count(Op::StopRecording), 1);

    harness.complete_recording_stop();
    assert_eq!(harness.state(), SessionState::Idle);
    assert_eq!(harness.view.count(&Notice::RecordingStarted), 1);
    assert_eq!(harness.view.count(&Notice::RecordingStopped), 1);
}

#[test]
fn recording_is_rejected_outside_idle() {
    let harness = Harness::idle();
    harness.controller.request_scan().unwrap();
    harness.controller.request_start_recording().unwrap();
    harness.pump();
    assert_eq!(harness.device.count(Op::StartRecording), 0);
    assert_eq!(harness.state(), SessionState::DoingScan);
}

#[test]
fn pause_during_recording_closes_after_the_clip() {
    let harness = Harness::recording();
    harness.dispatcher.advance(Duration::from_secs(1));
    harness.controller.pause().unwrap();
    harness.pump();
    assert_eq!(harness.device.ops().last(), Some(&Op::StopRecording));
    assert_eq!(harness.state(), SessionState::Recording);

    harness.complete_recording_stop();
    assert_eq!(harness.state(), SessionState::Finalized);
    assert_eq!(harness.device.ops().last(), Some(&Op::Close));
}

#[test]
fn resume_during_recording_pause_returns_to_idle() {
    let harness = Harness::recording();
    harness.controller.pause().unwrap();
    harness.controller.resume().unwrap();
    harness.dispatcher.advance(Duration::from_secs(1));
    harness.complete_recording_stop();
    assert_eq!(harness.state(), SessionState::Idle);
    assert_eq!(harness.device.count(Op::Close), 0);
}

#[test]
fn failed_recording_start_returns_to_idle() {
    let harness = Harness::idle();
    harness.controller.request_start_recording().unwrap();
    harness.complete_recording_start(false);
    assert_eq!(harness.state(), SessionState::Idle);
    assert_eq!(harness.view.count(&Notice::RecordingStarted), 0);
    // The minimum-duration timer is never armed.
    assert_eq!(harness.dispatcher.pending(), 0);
}
