use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use log::{debug, info, warn};
use parking_lot::Mutex;

use super::latch::{Latch, Outcome};
use crate::models::camera_models::{CameraInfo, CaptureEvent, Size};
use crate::models::config::SessionConfig;
use crate::models::error::HardwareError;
use crate::processing::jpeg::crop_rotate_jpeg;
use crate::processing::orientation::{capture_rotation, preview_rotation};
use crate::processing::size_resolver;
use crate::traits::camera_device::{
    Acknowledgement, CameraDevice, CaptureCallback, Completion, RecordingCompletion,
};
use crate::traits::hardware::{CameraHardware, HardwareHandle};
use crate::traits::session_view::SurfaceHandle;

/// Sentinel for "device tilt unknown".
const ORIENTATION_UNKNOWN: i32 = i32::MIN;

/// Settings the worker takes from [`SessionConfig`].
#[derive(Debug, Clone)]
struct WorkerSettings {
    thread_name: String,
    preview_ceiling: Size,
    jpeg_quality: u8,
    crop_to_evf_aspect: bool,
}

impl From<&SessionConfig> for WorkerSettings {
    fn from(config: &SessionConfig) -> Self {
        Self {
            thread_name: config.worker_thread_name.clone(),
            preview_ceiling: config.preferred_preview_ceiling,
            jpeg_quality: config.jpeg_quality,
            crop_to_evf_aspect: config.crop_to_evf_aspect,
        }
    }
}

enum Job {
    Open { aspect_wh: f32, done: Completion },
    Close { done: Completion },
    BindSurface { surface: SurfaceHandle, done: Completion },
    Scan { latch: Arc<Latch<bool>>, done: Completion },
    CancelScan { done: Acknowledgement },
    StillCapture { request_id: u64, on_event: CaptureCallback },
    StartRecording { done: Completion },
    StopRecording { done: RecordingCompletion },
}

impl Job {
    fn name(&self) -> &'static str {
        match self {
            Job::Open { .. } => "open",
            Job::Close { .. } => "close",
            Job::BindSurface { .. } => "bind-surface",
            Job::Scan { .. } => "scan",
            Job::CancelScan { .. } => "cancel-scan",
            Job::StillCapture { .. } => "still-capture",
            Job::StartRecording { .. } => "start-recording",
            Job::StopRecording { .. } => "stop-recording",
        }
    }

    /// Complete the job without touching hardware.
    fn reject(self) {
        match self {
            Job::Open { done, .. }
            | Job::BindSurface { done, .. }
            | Job::Scan { done, .. }
            | Job::StartRecording { done } => done(false),
            Job::StopRecording { done } => done(false, None),
            Job::Close { done } => done(true),
            Job::CancelScan { done } => done(),
            Job::StillCapture { request_id, on_event } => on_event(CaptureEvent::Done {
                request_id,
                success: false,
            }),
        }
    }
}

/// State visible to both the caller side and the worker thread.
struct Shared {
    current_scan: Mutex<Option<Arc<Latch<bool>>>>,
    preview_size: Mutex<Option<Size>>,
}

enum Runtime<H> {
    Idle(H),
    Running {
        jobs: Sender<Job>,
        worker: JoinHandle<H>,
    },
    /// Hardware was lost to a panicked or unspawnable worker.
    Lost,
}

/// [`CameraDevice`] that runs every hardware call on one dedicated thread.
///
/// Jobs are executed strictly in submission order. Blocking waits on the
/// worker (autofocus, picture delivery) have no timeout; only
/// [`CameraDevice::cancel_scan`] and [`CameraDevice::release`] interrupt an
/// autofocus wait.
///
/// Completions fire on the worker thread, or on the caller's thread when a
/// job is rejected because the worker is not running.
pub struct WorkerCameraDevice<H: CameraHardware> {
    info: CameraInfo,
    settings: WorkerSettings,
    shared: Arc<Shared>,
    runtime: Mutex<Runtime<H>>,
}

impl<H: CameraHardware> WorkerCameraDevice<H> {
    pub fn new(hardware: H, config: &SessionConfig) -> Self {
        Self {
            info: hardware.camera_info(),
            settings: WorkerSettings::from(config),
            shared: Arc::new(Shared {
                current_scan: Mutex::new(None),
                preview_size: Mutex::new(None),
            }),
            runtime: Mutex::new(Runtime::Idle(hardware)),
        }
    }

    pub fn camera_info(&self) -> CameraInfo {
        self.info
    }

    pub fn is_running(&self) -> bool {
        matches!(*self.runtime.lock(), Runtime::Running { .. })
    }

    fn submit(&self, job: Job) {
        let rejected = match &*self.runtime.lock() {
            Runtime::Running { jobs, .. } => jobs.send(job).err().map(|e| e.0),
            _ => Some(job),
        };
        if let Some(job) = rejected {
            warn!("camera device not prepared, rejecting {}", job.name());
            job.reject();
        }
    }
}

impl<H: CameraHardware> CameraDevice for WorkerCameraDevice<H> {
    fn prepare(&self) -> Result<(), HardwareError> {
        let mut runtime = self.runtime.lock();
        match std::mem::replace(&mut *runtime, Runtime::Lost) {
            running @ Runtime::Running { .. } => {
                *runtime = running;
                Ok(())
            }
            Runtime::Idle(hardware) => {
                let (jobs, queue) = mpsc::channel();
                let worker = DeviceWorker::new(hardware, self.info, &self.settings, &self.shared);
                let handle = thread::Builder::new()
                    .name(self.settings.thread_name.clone())
                    .spawn(move || worker.run(queue))
                    .map_err(|e| {
                        HardwareError::Failed(format!("failed to spawn device worker: {}", e))
                    })?;
                *runtime = Runtime::Running {
                    jobs,
                    worker: handle,
                };
                debug!("device worker '{}' started", self.settings.thread_name);
                Ok(())
            }
            Runtime::Lost => Err(HardwareError::Failed(
                "camera hardware lost with a previous worker".into(),
            )),
        }
    }

    fn open(&self, aspect_wh: f32, on_opened: Completion) {
        self.submit(Job::Open {
            aspect_wh,
            done: on_opened,
        });
    }

    fn close(&self, on_closed: Completion) {
        self.submit(Job::Close { done: on_closed });
    }

    fn bind_surface(&self, surface: SurfaceHandle, on_bound: Completion) {
        self.submit(Job::BindSurface {
            surface,
            done: on_bound,
        });
    }

    fn scan(&self, on_scan_done: Completion) {
        let latch = Latch::new();
        *self.shared.current_scan.lock() = Some(Arc::clone(&latch));
        self.submit(Job::Scan {
            latch,
            done: on_scan_done,
        });
    }

    fn cancel_scan(&self, on_cancelled: Acknowledgement) {
        // Wake a worker blocked on autofocus before queueing behind it.
        if let Some(latch) = self.shared.current_scan.lock().take() {
            latch.cancel();
        }
        self.submit(Job::CancelScan { done: on_cancelled });
    }

    fn still_capture(&self, request_id: u64, on_event: CaptureCallback) {
        self.submit(Job::StillCapture {
            request_id,
            on_event,
        });
    }

    fn start_recording(&self, on_started: Completion) {
        self.submit(Job::StartRecording { done: on_started });
    }

    fn stop_recording(&self, on_stopped: RecordingCompletion) {
        self.submit(Job::StopRecording { done: on_stopped });
    }

    fn preview_size(&self) -> Option<Size> {
        *self.shared.preview_size.lock()
    }

    fn sensor_orientation(&self) -> u32 {
        self.info.sensor_orientation
    }

    fn release(&self) {
        if let Some(latch) = self.shared.current_scan.lock().take() {
            latch.cancel();
        }
        let running = {
            let mut runtime = self.runtime.lock();
            match std::mem::replace(&mut *runtime, Runtime::Lost) {
                Runtime::Running { jobs, worker } => Some((jobs, worker)),
                other => {
                    *runtime = other;
                    None
                }
            }
        };
        let Some((jobs, worker)) = running else {
            return;
        };
        drop(jobs);
        if worker.thread().id() == thread::current().id() {
            // Released from a completion running on the worker; it exits
            // once that job returns and keeps the hardware.
            warn!("device released from its own worker, hardware not recovered");
            return;
        }
        let restored = match worker.join() {
            Ok(hardware) => Runtime::Idle(hardware),
            Err(_) => {
                log::error!("device worker panicked, camera hardware is lost");
                Runtime::Lost
            }
        };
        *self.runtime.lock() = restored;
        debug!("device worker '{}' released", self.settings.thread_name);
    }
}

impl<H: CameraHardware> Drop for WorkerCameraDevice<H> {
    fn drop(&mut self) {
        self.release();
    }
}

/// Owned by the worker thread for its whole life.
struct DeviceWorker<H: CameraHardware> {
    hardware: H,
    handle: Option<H::Handle>,
    recording: bool,
    info: CameraInfo,
    settings: WorkerSettings,
    evf_aspect: f32,
    orientation: Arc<AtomicI32>,
    shared: Arc<Shared>,
}

impl<H: CameraHardware> DeviceWorker<H> {
    fn new(hardware: H, info: CameraInfo, settings: &WorkerSettings, shared: &Arc<Shared>) -> Self {
        Self {
            hardware,
            handle: None,
            recording: false,
            info,
            settings: settings.clone(),
            evf_aspect: 16.0 / 9.0,
            orientation: Arc::new(AtomicI32::new(ORIENTATION_UNKNOWN)),
            shared: Arc::clone(shared),
        }
    }

    /// Drain jobs until every sender is gone, then hand the hardware back.
    fn run(mut self, queue: Receiver<Job>) -> H {
        for job in queue {
            debug!("device job: {}", job.name());
            self.execute(job);
        }
        self.teardown();
        self.hardware
    }

    fn execute(&mut self, job: Job) {
        match job {
            Job::Open { aspect_wh, done } => self.open(aspect_wh, done),
            Job::Close { done } => {
                self.teardown();
                done(true);
            }
            Job::BindSurface { surface, done } => self.bind_surface(surface, done),
            Job::Scan { latch, done } => self.scan(latch, done),
            Job::CancelScan { done } => self.cancel_scan(done),
            Job::StillCapture {
                request_id,
                on_event,
            } => self.still_capture(request_id, on_event),
            Job::StartRecording { done } => self.start_recording(done),
            Job::StopRecording { done } => self.stop_recording(done),
        }
    }

    fn open(&mut self, aspect_wh: f32, done: Completion) {
        if self.handle.is_some() {
            debug!("camera already open");
            done(true);
            return;
        }
        match self.bring_up(aspect_wh) {
            Ok(handle) => {
                self.handle = Some(handle);
                done(true);
            }
            Err(e) => {
                warn!("failed to open camera: {}", e);
                done(false);
            }
        }
    }

    fn bring_up(&mut self, aspect_wh: f32) -> Result<H::Handle, HardwareError> {
        let mut handle = self.hardware.open()?;
        let preview = match configure_and_start(&mut handle, aspect_wh, self.settings.preview_ceiling)
        {
            Ok(preview) => preview,
            Err(e) => {
                handle.close();
                return Err(e);
            }
        };

        self.evf_aspect = aspect_wh;
        *self.shared.preview_size.lock() = Some(preview);
        self.hardware.acquire_wake_lock();
        let orientation = Arc::clone(&self.orientation);
        self.hardware.start_orientation_updates(Arc::new(move |tilt: Option<i32>| {
            orientation.store(tilt.unwrap_or(ORIENTATION_UNKNOWN), Ordering::Relaxed);
        }));
        info!("camera opened, preview {}", preview);
        Ok(handle)
    }

    /// Close the camera if open and release everything acquired by `open`.
    fn teardown(&mut self) {
        let Some(mut handle) = self.handle.take() else {
            return;
        };
        if std::mem::take(&mut self.recording) {
            warn!("camera closed while recording");
            if let Err(e) = handle.stop_recording() {
                warn!("failed to finalize interrupted recording: {}", e);
            }
        }
        handle.stop_preview();
        handle.close();
        self.hardware.stop_orientation_updates();
        self.hardware.release_wake_lock();
        self.orientation.store(ORIENTATION_UNKNOWN, Ordering::Relaxed);
        *self.shared.preview_size.lock() = None;
        info!("camera closed");
    }

    fn bind_surface(&mut self, surface: SurfaceHandle, done: Completion) {
        let rotation = preview_rotation(&self.info, self.hardware.display_rotation());
        let Some(handle) = self.handle.as_mut() else {
            warn!("bind surface: camera not open");
            done(false);
            return;
        };
        if !surface.is_valid() {
            warn!("bind surface: surface already destroyed");
            done(false);
            return;
        }
        match handle.attach_surface(&surface, rotation) {
            Ok(()) => {
                debug!("preview bound to {} surface, rotation {}", surface.size(), rotation);
                done(true);
            }
            Err(e) => {
                warn!("bind surface failed: {}", e);
                done(false);
            }
        }
    }

    fn scan(&mut self, latch: Arc<Latch<bool>>, done: Completion) {
        if latch.is_cancelled() {
            debug!("scan cancelled before it started");
            return;
        }
        let Some(handle) = self.handle.as_mut() else {
            warn!("scan: camera not open");
            forget_scan(&self.shared, &latch);
            done(false);
            return;
        };

        if let Err(e) = handle.set_exposure_lock(false) {
            warn!("failed to unlock exposure before scan: {}", e);
        }
        let completer = latch.completer();
        if let Err(e) = handle.start_auto_focus(Box::new(move |focused: bool| completer.complete(focused)))
        {
            warn!("autofocus failed to start: {}", e);
            forget_scan(&self.shared, &latch);
            done(false);
            return;
        }

        let outcome = latch.wait();
        forget_scan(&self.shared, &latch);
        match outcome {
            Outcome::Completed(true) => match handle.set_exposure_lock(true) {
                Ok(()) => done(true),
                Err(e) => {
                    warn!("failed to lock exposure after focus: {}", e);
                    done(false);
                }
            },
            Outcome::Completed(false) => done(false),
            Outcome::Cancelled => debug!("scan cancelled"),
            Outcome::Abandoned => {
                warn!("autofocus callback dropped without a result");
                done(false);
            }
        }
    }

    fn cancel_scan(&mut self, done: Acknowledgement) {
        if let Some(handle) = self.handle.as_mut() {
            handle.cancel_auto_focus();
            if let Err(e) = handle.set_exposure_lock(false) {
                warn!("failed to unlock exposure: {}", e);
            }
        }
        done();
    }

    fn still_capture(&mut self, request_id: u64, on_event: CaptureCallback) {
        let rotation = capture_rotation(&self.info, self.device_orientation());
        let hardware_rotation = if self.settings.crop_to_evf_aspect { 0 } else { rotation };
        let Some(handle) = self.handle.as_mut() else {
            warn!("still capture {}: camera not open", request_id);
            on_event(CaptureEvent::Done {
                request_id,
                success: false,
            });
            return;
        };

        let shutter_sent = Arc::new(Mutex::new(false));
        let on_shutter = {
            let shutter_sent = Arc::clone(&shutter_sent);
            let on_event = Arc::clone(&on_event);
            Box::new(move || fire_shutter(&shutter_sent, &on_event, request_id))
        };
        let latch = Latch::<Result<Vec<u8>, HardwareError>>::new();
        let completer = latch.completer();
        let result = handle
            .take_picture(
                hardware_rotation,
                on_shutter,
                Box::new(move |picture: Result<Vec<u8>, HardwareError>| completer.complete(picture)),
            )
            .and_then(|()| match latch.wait() {
                Outcome::Completed(picture) => picture,
                Outcome::Cancelled | Outcome::Abandoned => {
                    Err(HardwareError::Failed("picture callback dropped".into()))
                }
            });

        if let Err(e) = handle.start_preview() {
            warn!("failed to restart preview after capture: {}", e);
        }
        if let Err(e) = handle.set_exposure_lock(false) {
            warn!("failed to unlock exposure after capture: {}", e);
        }

        match result {
            Ok(data) => {
                fire_shutter(&shutter_sent, &on_event, request_id);
                on_event(CaptureEvent::Done {
                    request_id,
                    success: true,
                });
                let data = self.post_process(data, rotation);
                debug!("still capture {}: {} bytes", request_id, data.len());
                on_event(CaptureEvent::PhotoReady { request_id, data });
            }
            Err(e) => {
                log::error!("still capture {} failed: {}", request_id, e);
                on_event(CaptureEvent::Done {
                    request_id,
                    success: false,
                });
            }
        }
    }

    fn start_recording(&mut self, done: Completion) {
        let rotation = capture_rotation(&self.info, self.device_orientation());
        let Some(handle) = self.handle.as_mut() else {
            warn!("start recording: camera not open");
            done(false);
            return;
        };
        if self.recording {
            debug!("already recording");
            done(true);
            return;
        }
        match handle.start_recording(rotation) {
            Ok(()) => {
                self.recording = true;
                info!("recording started, rotation {}", rotation);
                done(true);
            }
            Err(e) => {
                warn!("failed to start recording: {}", e);
                done(false);
            }
        }
    }

    fn stop_recording(&mut self, done: RecordingCompletion) {
        let handle = match self.handle.as_mut() {
            Some(handle) if self.recording => handle,
            _ => {
                warn!("stop recording: nothing is recording");
                done(false, None);
                return;
            }
        };
        self.recording = false;
        match handle.stop_recording() {
            Ok(locator) => done(true, locator),
            Err(e) => {
                log::error!("failed to finalize recording: {}", e);
                done(false, None);
            }
        }
    }

    fn post_process(&self, data: Vec<u8>, rotation: u32) -> Vec<u8> {
        if !self.settings.crop_to_evf_aspect {
            return data;
        }
        match crop_rotate_jpeg(&data, rotation, self.evf_aspect, self.settings.jpeg_quality) {
            Ok(processed) => processed,
            Err(e) => {
                warn!("photo post-processing failed, keeping original: {}", e);
                data
            }
        }
    }

    fn device_orientation(&self) -> Option<i32> {
        let tilt = self.orientation.load(Ordering::Relaxed);
        (tilt != ORIENTATION_UNKNOWN).then_some(tilt)
    }
}

fn configure_and_start<T: HardwareHandle>(
    handle: &mut T,
    aspect_wh: f32,
    ceiling: Size,
) -> Result<Size, HardwareError> {
    let sizes = size_resolver::negotiate(
        aspect_wh,
        &handle.supported_preview_sizes(),
        &handle.supported_picture_sizes(),
        ceiling,
    )
    .ok_or_else(|| HardwareError::Unsupported("camera reports no supported sizes".into()))?;
    handle.configure(sizes)?;
    handle.start_preview()?;
    Ok(sizes.preview)
}

/// Clear the shared scan slot if it still holds `latch`.
fn forget_scan(shared: &Shared, latch: &Arc<Latch<bool>>) {
    let mut current = shared.current_scan.lock();
    if current.as_ref().is_some_and(|c| Arc::ptr_eq(c, latch)) {
        *current = None;
    }
}

/// Emit `Shutter` at most once per capture.
fn fire_shutter(sent: &Mutex<bool>, on_event: &CaptureCallback, request_id: u64) {
    let mut sent = sent.lock();
    if !*sent {
        *sent = true;
        on_event(CaptureEvent::Shutter { request_id });
    }
}
