use std::sync::Arc;

use crate::models::camera_models::{CameraInfo, DisplayRotation, Size, SizeNegotiation};
use crate::models::error::HardwareError;
use crate::traits::session_view::SurfaceHandle;

/// Autofocus result, `true` when focus converged.
pub type FocusCallback = Box<dyn FnOnce(bool) + Send + 'static>;

/// Fired once the sensor has been exposed.
pub type ShutterCallback = Box<dyn FnOnce() + Send + 'static>;

/// Delivers the encoded picture or the reason it could not be taken.
pub type PictureCallback = Box<dyn FnOnce(Result<Vec<u8>, HardwareError>) + Send + 'static>;

/// Receives device tilt in degrees, `None` when unknown.
pub type OrientationSink = Arc<dyn Fn(Option<i32>) + Send + Sync + 'static>;

/// Platform camera backend driven by the device worker.
///
/// All methods are called from the worker thread only. Callbacks may be
/// invoked from any thread, including synchronously from within the call
/// that registered them.
pub trait CameraHardware: Send + 'static {
    type Handle: HardwareHandle;

    fn camera_info(&self) -> CameraInfo;

    /// Acquire exclusive access to the camera.
    fn open(&mut self) -> Result<Self::Handle, HardwareError>;

    /// Current rotation of the display the preview is shown on.
    fn display_rotation(&self) -> DisplayRotation;

    fn acquire_wake_lock(&mut self);

    fn release_wake_lock(&mut self);

    fn start_orientation_updates(&mut self, sink: OrientationSink);

    fn stop_orientation_updates(&mut self);
}

/// An opened camera.
pub trait HardwareHandle: Send + 'static {
    fn supported_preview_sizes(&self) -> Vec<Size>;

    fn supported_picture_sizes(&self) -> Vec<Size>;

    fn configure(&mut self, sizes: SizeNegotiation) -> Result<(), HardwareError>;

    fn start_preview(&mut self) -> Result<(), HardwareError>;

    fn stop_preview(&mut self);

    /// Route the preview stream to `surface`, rotated clockwise by
    /// `display_orientation` degrees.
    fn attach_surface(
        &mut self,
        surface: &SurfaceHandle,
        display_orientation: u32,
    ) -> Result<(), HardwareError>;

    fn start_auto_focus(&mut self, on_focus: FocusCallback) -> Result<(), HardwareError>;

    fn cancel_auto_focus(&mut self);

    /// Lock or unlock auto exposure and auto white balance together.
    fn set_exposure_lock(&mut self, locked: bool) -> Result<(), HardwareError>;

    /// Take a picture tagged with the given JPEG rotation.
    fn take_picture(
        &mut self,
        rotation: u32,
        on_shutter: ShutterCallback,
        on_picture: PictureCallback,
    ) -> Result<(), HardwareError>;

    /// Start encoding the preview stream into a clip tagged with the given
    /// rotation. Backends without video keep the default.
    fn start_recording(&mut self, _rotation: u32) -> Result<(), HardwareError> {
        Err(HardwareError::Unsupported("video recording".into()))
    }

    /// Stop encoding and finalize the clip, returning where it landed.
    fn stop_recording(&mut self) -> Result<Option<String>, HardwareError> {
        Err(HardwareError::Unsupported("video recording".into()))
    }

    /// Release the camera.
    fn close(self);
}
