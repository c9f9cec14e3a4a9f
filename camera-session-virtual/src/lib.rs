//! # camera-session-virtual
//!
//! In-process camera backend for camera-session-kit.
//!
//! Provides:
//! - `VirtualCamera`: scriptable `CameraHardware` with delayed autofocus and
//!   synthetic JPEG capture
//! - `VirtualProbe`: inspection of what the hardware was asked to do
//! - `VirtualSurface`: destroyable preview surface
//!
//! ## Usage
//! ```ignore
//! use camera_session_core::{SessionConfig, WorkerCameraDevice};
//! use camera_session_virtual::{VirtualCamera, VirtualCameraSpec};
//!
//! let (camera, probe) = VirtualCamera::new(VirtualCameraSpec::default());
//! let device = WorkerCameraDevice::new(camera, &SessionConfig::default());
//! ```

pub mod virtual_camera;

pub use virtual_camera::{
    render_frame, ProbeSnapshot, VirtualCamera, VirtualCameraSpec, VirtualHandle, VirtualProbe,
    VirtualSurface,
};
