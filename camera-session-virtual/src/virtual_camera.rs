//! Scriptable in-process camera.
//!
//! Behaves like a single physical camera module: exclusive open, autofocus
//! and picture delivery on their own threads after configurable delays,
//! synthetic JPEG frames of the configured picture size and bookkeeping-only
//! video clips. A [`VirtualProbe`]
//! exposes what the hardware saw and lets tests tilt the device.

use std::io::Cursor;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, Rgb, RgbImage};
use parking_lot::Mutex;

use camera_session_core::{
    CameraHardware, CameraInfo, DisplayRotation, FocusCallback, HardwareError, HardwareHandle,
    OrientationSink, PictureCallback, ShutterCallback, Size, SizeNegotiation, SurfaceHandle,
};

/// Script for a [`VirtualCamera`].
#[derive(Debug, Clone)]
pub struct VirtualCameraSpec {
    pub info: CameraInfo,
    pub preview_sizes: Vec<Size>,
    pub picture_sizes: Vec<Size>,
    pub display_rotation: DisplayRotation,
    /// Tilt reported as soon as orientation updates start.
    pub device_tilt: Option<i32>,
    pub focus_delay: Duration,
    pub focus_succeeds: bool,
    pub exposure_delay: Duration,
    pub fail_open: Option<HardwareError>,
    /// Delivered through the picture callback instead of a frame.
    pub fail_capture: Option<HardwareError>,
    pub fail_recording: Option<HardwareError>,
}

impl Default for VirtualCameraSpec {
    fn default() -> Self {
        Self {
            info: CameraInfo::default(),
            preview_sizes: vec![
                Size::new(1920, 1080),
                Size::new(1280, 720),
                Size::new(960, 720),
                Size::new(640, 480),
            ],
            picture_sizes: vec![Size::new(1280, 960), Size::new(1280, 720), Size::new(640, 480)],
            display_rotation: DisplayRotation::Rotate0,
            device_tilt: Some(0),
            focus_delay: Duration::from_millis(50),
            focus_succeeds: true,
            exposure_delay: Duration::from_millis(20),
            fail_open: None,
            fail_capture: None,
            fail_recording: None,
        }
    }
}

/// What the virtual hardware has been asked to do.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProbeSnapshot {
    pub opens: u32,
    pub closes: u32,
    pub in_use: bool,
    pub configured: Option<SizeNegotiation>,
    pub preview_running: bool,
    pub bound_surface: Option<Size>,
    pub bound_rotation: Option<u32>,
    pub focus_runs: u32,
    pub focus_cancels: u32,
    pub exposure_locked: bool,
    pub pictures_taken: u32,
    pub picture_rotation: Option<u32>,
    pub recording: bool,
    pub recording_rotation: Option<u32>,
    pub clips_recorded: u32,
    pub wake_lock_held: bool,
    pub orientation_listening: bool,
}

#[derive(Default)]
struct ProbeState {
    snapshot: ProbeSnapshot,
    orientation_sink: Option<OrientationSink>,
}

/// Observation and control handle for a [`VirtualCamera`].
#[derive(Clone)]
pub struct VirtualProbe {
    state: Arc<Mutex<ProbeState>>,
}

impl VirtualProbe {
    pub fn snapshot(&self) -> ProbeSnapshot {
        self.state.lock().snapshot.clone()
    }

    /// Report a new device tilt to the orientation listener, if any.
    pub fn tilt(&self, degrees: Option<i32>) {
        let sink = self.state.lock().orientation_sink.clone();
        if let Some(sink) = sink {
            sink(degrees);
        }
    }
}

pub struct VirtualCamera {
    spec: VirtualCameraSpec,
    state: Arc<Mutex<ProbeState>>,
}

impl VirtualCamera {
    pub fn new(spec: VirtualCameraSpec) -> (Self, VirtualProbe) {
        let state = Arc::new(Mutex::new(ProbeState::default()));
        let probe = VirtualProbe {
            state: Arc::clone(&state),
        };
        (Self { spec, state }, probe)
    }
}

impl CameraHardware for VirtualCamera {
    type Handle = VirtualHandle;

    fn camera_info(&self) -> CameraInfo {
        self.spec.info
    }

    fn open(&mut self) -> Result<VirtualHandle, HardwareError> {
        if let Some(error) = &self.spec.fail_open {
            return Err(error.clone());
        }
        let mut state = self.state.lock();
        if state.snapshot.in_use {
            return Err(HardwareError::Busy);
        }
        state.snapshot.in_use = true;
        state.snapshot.opens += 1;
        log::debug!("virtual camera opened ({:?})", self.spec.info.facing);
        Ok(VirtualHandle {
            spec: self.spec.clone(),
            state: Arc::clone(&self.state),
            configured: None,
            focus_run: Arc::new(AtomicU64::new(0)),
        })
    }

    fn display_rotation(&self) -> DisplayRotation {
        self.spec.display_rotation
    }

    fn acquire_wake_lock(&mut self) {
        self.state.lock().snapshot.wake_lock_held = true;
    }

    fn release_wake_lock(&mut self) {
        self.state.lock().snapshot.wake_lock_held = false;
    }

    fn start_orientation_updates(&mut self, sink: OrientationSink) {
        {
            let mut state = self.state.lock();
            state.snapshot.orientation_listening = true;
            state.orientation_sink = Some(Arc::clone(&sink));
        }
        sink(self.spec.device_tilt);
    }

    fn stop_orientation_updates(&mut self) {
        let mut state = self.state.lock();
        state.snapshot.orientation_listening = false;
        state.orientation_sink = None;
    }
}

/// An opened [`VirtualCamera`].
pub struct VirtualHandle {
    spec: VirtualCameraSpec,
    state: Arc<Mutex<ProbeState>>,
    configured: Option<SizeNegotiation>,
    /// Incremented per autofocus start and cancel; a focus run only reports
    /// if it is still current.
    focus_run: Arc<AtomicU64>,
}

impl HardwareHandle for VirtualHandle {
    fn supported_preview_sizes(&self) -> Vec<Size> {
        self.spec.preview_sizes.clone()
    }

    fn supported_picture_sizes(&self) -> Vec<Size> {
        self.spec.picture_sizes.clone()
    }

    fn configure(&mut self, sizes: SizeNegotiation) -> Result<(), HardwareError> {
        if !self.spec.preview_sizes.contains(&sizes.preview) {
            return Err(HardwareError::Unsupported(format!("preview size {}", sizes.preview)));
        }
        if !self.spec.picture_sizes.contains(&sizes.picture) {
            return Err(HardwareError::Unsupported(format!("picture size {}", sizes.picture)));
        }
        self.configured = Some(sizes);
        self.state.lock().snapshot.configured = Some(sizes);
        Ok(())
    }

    fn start_preview(&mut self) -> Result<(), HardwareError> {
        if self.configured.is_none() {
            return Err(HardwareError::Failed("preview started before configure".into()));
        }
        self.state.lock().snapshot.preview_running = true;
        Ok(())
    }

    fn stop_preview(&mut self) {
        self.state.lock().snapshot.preview_running = false;
    }

    fn attach_surface(
        &mut self,
        surface: &SurfaceHandle,
        display_orientation: u32,
    ) -> Result<(), HardwareError> {
        if !surface.is_valid() {
            return Err(HardwareError::Failed("surface destroyed".into()));
        }
        let mut state = self.state.lock();
        state.snapshot.bound_surface = Some(surface.size());
        state.snapshot.bound_rotation = Some(display_orientation);
        Ok(())
    }

    fn start_auto_focus(&mut self, on_focus: FocusCallback) -> Result<(), HardwareError> {
        let run = self.focus_run.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.lock().snapshot.focus_runs += 1;
        let current = Arc::clone(&self.focus_run);
        let delay = self.spec.focus_delay;
        let succeeds = self.spec.focus_succeeds;
        thread::Builder::new()
            .name("virtual-autofocus".into())
            .spawn(move || {
                thread::sleep(delay);
                if current.load(Ordering::SeqCst) == run {
                    on_focus(succeeds);
                }
            })
            .map_err(|e| HardwareError::Failed(format!("failed to spawn autofocus: {}", e)))?;
        Ok(())
    }

    fn cancel_auto_focus(&mut self) {
        self.focus_run.fetch_add(1, Ordering::SeqCst);
        self.state.lock().snapshot.focus_cancels += 1;
    }

    fn set_exposure_lock(&mut self, locked: bool) -> Result<(), HardwareError> {
        self.state.lock().snapshot.exposure_locked = locked;
        Ok(())
    }

    fn take_picture(
        &mut self,
        rotation: u32,
        on_shutter: ShutterCallback,
        on_picture: PictureCallback,
    ) -> Result<(), HardwareError> {
        let size = self
            .configured
            .map(|c| c.picture)
            .ok_or_else(|| HardwareError::Failed("picture taken before configure".into()))?;
        {
            let mut state = self.state.lock();
            state.snapshot.pictures_taken += 1;
            state.snapshot.picture_rotation = Some(rotation);
            state.snapshot.preview_running = false;
        }
        let delay = self.spec.exposure_delay;
        let failure = self.spec.fail_capture.clone();
        thread::Builder::new()
            .name("virtual-capture".into())
            .spawn(move || {
                thread::sleep(delay);
                match failure {
                    Some(error) => on_picture(Err(error)),
                    None => {
                        on_shutter();
                        on_picture(render_frame(size));
                    }
                }
            })
            .map_err(|e| HardwareError::Failed(format!("failed to spawn capture: {}", e)))?;
        Ok(())
    }

    fn start_recording(&mut self, rotation: u32) -> Result<(), HardwareError> {
        if let Some(error) = &self.spec.fail_recording {
            return Err(error.clone());
        }
        if self.configured.is_none() {
            return Err(HardwareError::Failed("recording started before configure".into()));
        }
        let mut state = self.state.lock();
        if state.snapshot.recording {
            return Err(HardwareError::Busy);
        }
        state.snapshot.recording = true;
        state.snapshot.recording_rotation = Some(rotation);
        Ok(())
    }

    fn stop_recording(&mut self) -> Result<Option<String>, HardwareError> {
        let mut state = self.state.lock();
        if !state.snapshot.recording {
            return Err(HardwareError::Failed("not recording".into()));
        }
        state.snapshot.recording = false;
        state.snapshot.clips_recorded += 1;
        Ok(Some(format!("virtual://clip-{}", state.snapshot.clips_recorded)))
    }

    fn close(self) {
        let mut state = self.state.lock();
        state.snapshot.in_use = false;
        state.snapshot.preview_running = false;
        state.snapshot.closes += 1;
        log::debug!("virtual camera closed");
    }
}

/// Encode a synthetic gradient frame as JPEG.
pub fn render_frame(size: Size) -> Result<Vec<u8>, HardwareError> {
    let frame = RgbImage::from_fn(size.width, size.height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    let mut out = Cursor::new(Vec::new());
    let encoder = JpegEncoder::new_with_quality(&mut out, 90);
    DynamicImage::ImageRgb8(frame)
        .write_with_encoder(encoder)
        .map_err(|e| HardwareError::Failed(format!("frame encode failed: {}", e)))?;
    Ok(out.into_inner())
}

/// Preview surface that can be destroyed on demand.
pub struct VirtualSurface {
    size: Size,
    valid: AtomicBool,
}

impl VirtualSurface {
    pub fn new(size: Size) -> Arc<Self> {
        Arc::new(Self {
            size,
            valid: AtomicBool::new(true),
        })
    }

    pub fn destroy(&self) {
        self.valid.store(false, Ordering::SeqCst);
    }
}

impl camera_session_core::PreviewSurface for VirtualSurface {
    fn size(&self) -> Size {
        self.size
    }

    fn is_valid(&self) -> bool {
        self.valid.load(Ordering::SeqCst)
    }
}
