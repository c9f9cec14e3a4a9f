//! # camera-session-core
//!
//! Platform-agnostic camera session core library.
//!
//! Coordinates a camera device behind an asynchronous contract: the session
//! controller reconciles UI lifecycle events, user triggers and hardware
//! callbacks into one serialized sequence of device operations. Platform
//! backends implement the `CameraHardware` trait and plug into the generic
//! `WorkerCameraDevice`.
//!
//! ## Architecture
//!
//! ```text
//! camera-session-core (this crate)
//! ├── traits/       ← CameraDevice, CameraHardware, SessionView, PhotoStorage, UiDispatcher, SessionObserver
//! ├── models/       ← Size, SessionState, SessionConfig, SessionError, CaptureEvent, etc.
//! ├── processing/   ← size resolver, orientation math, JPEG crop/rotate
//! ├── device/       ← WorkerCameraDevice (serialized hardware worker)
//! ├── session/      ← SessionController, transition table, dispatchers
//! └── storage/      ← DirectoryPhotoStore, metadata sidecars
//! ```
//!
//! ## Threads
//!
//! ```text
//! [UI triggers] ─┐
//!                ├→ SessionController (lock) → CameraDevice jobs → [device worker]
//! [dispatcher] ──┘          ↑                                           │
//!                           └──────── completions posted to dispatcher ─┘
//! ```

pub mod device;
pub mod models;
pub mod processing;
pub mod session;
pub mod storage;
pub mod traits;

// Re-export key types at crate root for convenience.
pub use device::worker::WorkerCameraDevice;
pub use models::camera_models::{
    CameraInfo, CaptureEvent, DisplayRotation, Facing, Size, SizeNegotiation, ViewFinderAspect,
};
pub use models::config::SessionConfig;
pub use models::error::{HardwareError, ProcessingError, SessionError, StorageError};
pub use models::photo::PhotoMetadata;
pub use models::state::SessionState;
pub use session::controller::SessionController;
pub use session::dispatch::{LooperThread, ManualDispatcher};
pub use storage::directory_store::DirectoryPhotoStore;
pub use traits::camera_device::{
    Acknowledgement, CameraDevice, CaptureCallback, Completion, RecordingCompletion,
};
pub use traits::dispatcher::{Task, UiDispatcher};
pub use traits::hardware::{
    CameraHardware, FocusCallback, HardwareHandle, OrientationSink, PictureCallback,
    ShutterCallback,
};
pub use traits::photo_storage::{PhotoStorage, StoreCompletion};
pub use traits::session_observer::SessionObserver;
pub use traits::session_view::{PreviewSurface, SessionView, SurfaceHandle};
