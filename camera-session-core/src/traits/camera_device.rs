use std::sync::Arc;

use crate::models::camera_models::{CaptureEvent, Size};
use crate::models::error::HardwareError;
use crate::traits::session_view::SurfaceHandle;

/// One-shot completion carrying a success flag.
pub type Completion = Box<dyn FnOnce(bool) + Send + 'static>;

/// One-shot completion for operations that cannot fail.
pub type Acknowledgement = Box<dyn FnOnce() + Send + 'static>;

/// Completion of a recording: whether the clip was finalized and a locator
/// for it.
pub type RecordingCompletion = Box<dyn FnOnce(bool, Option<String>) + Send + 'static>;

/// Receives the shutter, capture-done and photo-ready events of a single
/// capture request, in that order.
pub type CaptureCallback = Arc<dyn Fn(CaptureEvent) + Send + Sync + 'static>;

/// Asynchronous contract of a camera device.
///
/// Every operation returns immediately. Work is executed in submission order
/// and each completion fires exactly once, from whatever thread the device
/// finishes on. Callers are responsible for marshaling completions back to
/// their own context.
///
/// Hardware faults never escape this boundary: they are reported as
/// `false` completions, or `CaptureEvent::Done { success: false }` for
/// captures.
pub trait CameraDevice: Send + Sync {
    /// Bring up the device worker. Must be called before any other operation.
    fn prepare(&self) -> Result<(), HardwareError>;

    /// Open the camera and start the preview stream, negotiating sizes for
    /// the given viewfinder aspect (width / height). Opening an already
    /// open device completes with `true`.
    fn open(&self, aspect_wh: f32, on_opened: Completion);

    /// Stop preview and close the camera. Closing a closed device is a no-op
    /// that still completes.
    fn close(&self, on_closed: Completion);

    /// Attach the preview stream to a display surface.
    fn bind_surface(&self, surface: SurfaceHandle, on_bound: Completion);

    /// Start autofocus. On convergence exposure and white balance are locked
    /// before `on_scan_done(true)` fires. A scan cancelled by
    /// [`CameraDevice::cancel_scan`] never completes.
    fn scan(&self, on_scan_done: Completion);

    /// Abort any in-flight scan and unlock exposure and white balance.
    fn cancel_scan(&self, on_cancelled: Acknowledgement);

    /// Capture a still photo. The callback always sees `Done`, even when the
    /// capture fails; `Shutter` and `PhotoReady` only on success.
    fn still_capture(&self, request_id: u64, on_event: CaptureCallback);

    /// Start recording the preview stream. `on_started(true)` fires once
    /// frames are being written.
    fn start_recording(&self, on_started: Completion);

    /// Stop the running recording and finalize the clip. Completes with
    /// `false` when nothing was recording.
    fn stop_recording(&self, on_stopped: RecordingCompletion);

    /// Negotiated preview size of the open camera, if any.
    fn preview_size(&self) -> Option<Size>;

    /// Mounting angle of the sensor in degrees.
    fn sensor_orientation(&self) -> u32;

    /// Drain queued work and stop the worker. The device can be prepared
    /// again afterwards.
    fn release(&self);
}
