use std::sync::{Arc, Weak};

use log::{debug, warn};
use parking_lot::Mutex;

use super::transition::{Effect, Event, Machine, ViewNotice};
use crate::models::camera_models::{CaptureEvent, Size};
use crate::models::config::SessionConfig;
use crate::models::error::SessionError;
use crate::models::state::SessionState;
use crate::traits::camera_device::CameraDevice;
use crate::traits::dispatcher::UiDispatcher;
use crate::traits::photo_storage::PhotoStorage;
use crate::traits::session_observer::SessionObserver;
use crate::traits::session_view::SessionView;

struct Core {
    machine: Machine,
    started: bool,
}

struct Inner {
    core: Mutex<Core>,
    config: SessionConfig,
    device: Arc<dyn CameraDevice>,
    view: Arc<dyn SessionView>,
    storage: Arc<dyn PhotoStorage>,
    dispatcher: Arc<dyn UiDispatcher>,
    observer: Mutex<Option<Arc<dyn SessionObserver>>>,
}

/// Camera session lifecycle controller.
///
/// A cheap `Clone` handle. Triggers and marshalled device callbacks are
/// serialized through one lock: each runs the transition function and then
/// issues the resulting device, storage and view effects before releasing
/// it. Device and storage completions are posted to the [`UiDispatcher`]
/// and tagged with the session generation current when they were issued;
/// once the session has closed since, they are dropped. Photos are the
/// exception and are always handed to storage.
///
/// Triggers never block on hardware. Calling a trigger before
/// [`SessionController::start`] or after [`SessionController::stop`] is a
/// contract violation reported as [`SessionError::NotStarted`].
#[derive(Clone)]
pub struct SessionController {
    inner: Arc<Inner>,
}

impl SessionController {
    pub fn new(
        config: SessionConfig,
        device: Arc<dyn CameraDevice>,
        view: Arc<dyn SessionView>,
        storage: Arc<dyn PhotoStorage>,
        dispatcher: Arc<dyn UiDispatcher>,
    ) -> Result<Self, SessionError> {
        config.validate()?;
        Ok(Self {
            inner: Arc::new(Inner {
                core: Mutex::new(Core {
                    machine: Machine::new(),
                    started: false,
                }),
                config,
                device,
                view,
                storage,
                dispatcher,
                observer: Mutex::new(None),
            }),
        })
    }

    pub fn set_observer(&self, observer: Arc<dyn SessionObserver>) {
        *self.inner.observer.lock() = Some(observer);
    }

    pub fn config(&self) -> &SessionConfig {
        &self.inner.config
    }

    pub fn state(&self) -> SessionState {
        self.inner.core.lock().machine.state()
    }

    pub fn is_started(&self) -> bool {
        self.inner.core.lock().started
    }

    /// Photos handed to storage whose completion has not arrived yet.
    pub fn photos_in_storage(&self) -> usize {
        self.inner.core.lock().machine.stores_in_flight()
    }

    pub fn preview_size(&self) -> Option<Size> {
        self.inner.device.preview_size()
    }

    /// Prepare the device and put the session in `Finalized`.
    ///
    /// Idempotent while `Finalized`; rejected while any other state is active.
    pub fn start(&self) -> Result<(), SessionError> {
        let mut core = self.inner.core.lock();
        if core.started {
            let state = core.machine.state();
            if state.is_finalized() {
                return Ok(());
            }
            return Err(SessionError::AlreadyActive(state));
        }
        self.inner
            .device
            .prepare()
            .map_err(|e| SessionError::DeviceUnavailable(e.to_string()))?;
        core.started = true;
        debug!("session started");
        Ok(())
    }

    /// Tear everything down regardless of state and release the device.
    ///
    /// Blocks until the device worker has drained. Outstanding callbacks are
    /// voided. Must not be called from a dispatcher task while the device
    /// worker could be waiting on that same dispatcher.
    pub fn stop(&self) {
        let from = {
            let mut core = self.inner.core.lock();
            if !core.started {
                return;
            }
            core.started = false;
            let from = core.machine.state();
            core.machine.reset();
            from
        };
        self.inner.device.close(Box::new(|_| debug!("device closed on stop")));
        self.inner.device.release();
        if !from.is_finalized() {
            self.inner.notify_observer(from, SessionState::Finalized);
        }
        debug!("session stopped from {}", from);
    }

    /// The UI became visible.
    pub fn resume(&self) -> Result<(), SessionError> {
        self.inner.trigger(Event::Resume)
    }

    /// The UI went to the background. Deferred while a still capture is in
    /// flight; a recording is stopped first.
    pub fn pause(&self) -> Result<(), SessionError> {
        self.inner.trigger(Event::Pause)
    }

    /// Open the camera ahead of `resume` to hide open latency.
    pub fn request_pre_open(&self) -> Result<(), SessionError> {
        self.inner.trigger(Event::PreOpenRequested)
    }

    pub fn cancel_pre_open(&self) -> Result<(), SessionError> {
        self.inner.trigger(Event::PreOpenCancelled)
    }

    /// The view's preview surface exists and can be bound.
    pub fn on_surface_ready(&self) -> Result<(), SessionError> {
        self.inner.trigger(Event::SurfaceReady)
    }

    pub fn request_scan(&self) -> Result<(), SessionError> {
        self.inner.trigger(Event::ScanRequested)
    }

    pub fn request_cancel_scan(&self) -> Result<(), SessionError> {
        self.inner.trigger(Event::CancelScanRequested)
    }

    /// Capture a photo. While a scan runs the request is held until the scan
    /// finishes; without a preceding scan it is rejected.
    pub fn request_still_capture(&self) -> Result<(), SessionError> {
        self.inner.trigger(Event::StillCaptureRequested)
    }

    /// Start recording video. Only accepted while `Idle`.
    pub fn request_start_recording(&self) -> Result<(), SessionError> {
        self.inner.trigger(Event::RecordingRequested)
    }

    /// Stop the running recording, once it has lasted the configured
    /// minimum duration.
    pub fn request_stop_recording(&self) -> Result<(), SessionError> {
        self.inner.trigger(Event::StopRecordingRequested)
    }

    /// Give up on the camera, e.g. because the screen turned off.
    pub fn request_force_stop(&self) -> Result<(), SessionError> {
        self.inner.trigger(Event::ForceStop)
    }
}

impl Inner {
    fn trigger(self: &Arc<Self>, event: Event) -> Result<(), SessionError> {
        let mut core = self.core.lock();
        if !core.started {
            return Err(SessionError::NotStarted);
        }
        let effects = core.machine.handle(event);
        let generation = core.machine.generation();
        self.execute(generation, effects);
        Ok(())
    }

    /// Feed a marshalled callback into the machine, unless it is stale.
    fn deliver(self: &Arc<Self>, generation: u64, event: Event) {
        let mut core = self.core.lock();
        if !core.started && event.is_generation_bound() {
            debug!("{} dropped: session stopped", event.name());
            return;
        }
        if event.is_generation_bound() && generation != core.machine.generation() {
            debug!(
                "{} dropped: stale generation {} (current {})",
                event.name(),
                generation,
                core.machine.generation()
            );
            return;
        }
        let effects = core.machine.handle(event);
        let current = core.machine.generation();
        self.execute(current, effects);
    }

    /// Issue effects. Called with the core lock held.
    fn execute(self: &Arc<Self>, generation: u64, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::OpenDevice => {
                    let weak = Arc::downgrade(self);
                    self.device.open(
                        self.config.evf_aspect.ratio_wh(),
                        Box::new(move |success| {
                            post_event(&weak, generation, Event::CameraOpened { success })
                        }),
                    );
                }
                Effect::CloseDevice => {
                    self.device
                        .close(Box::new(|success| debug!("device closed: {}", success)));
                }
                Effect::BindSurface => match self.view.preview_surface() {
                    Some(surface) => {
                        let weak = Arc::downgrade(self);
                        self.device.bind_surface(
                            surface,
                            Box::new(move |success| {
                                post_event(&weak, generation, Event::SurfaceBound { success })
                            }),
                        );
                    }
                    None => warn!("no preview surface to bind"),
                },
                Effect::Scan => {
                    let weak = Arc::downgrade(self);
                    self.device.scan(Box::new(move |success| {
                        post_event(&weak, generation, Event::ScanDone { success })
                    }));
                }
                Effect::CancelScan => {
                    let weak = Arc::downgrade(self);
                    self.device.cancel_scan(Box::new(move || {
                        post_event(&weak, generation, Event::CancelScanDone)
                    }));
                }
                Effect::StillCapture { request_id } => {
                    let weak = Arc::downgrade(self);
                    self.device.still_capture(
                        request_id,
                        Arc::new(move |event: CaptureEvent| {
                            post_event(&weak, generation, Event::Capture(event))
                        }),
                    );
                }
                Effect::StorePhoto { request_id, data } => {
                    debug!("storing photo {} ({} bytes)", request_id, data.len());
                    let weak = Arc::downgrade(self);
                    self.storage.store_photo(
                        data,
                        Box::new(move |success, locator| {
                            post_event(&weak, generation, Event::PhotoStored { success, locator })
                        }),
                    );
                }
                Effect::ScheduleOpenFailureTimeout => {
                    let weak = Arc::downgrade(self);
                    self.dispatcher.post_delayed(
                        self.config.open_failure_feedback_delay(),
                        Box::new(move || {
                            if let Some(inner) = weak.upgrade() {
                                inner.deliver(generation, Event::OpenFailureTimeout);
                            }
                        }),
                    );
                }
                Effect::StartRecording => {
                    let weak = Arc::downgrade(self);
                    self.device.start_recording(Box::new(move |success| {
                        post_event(&weak, generation, Event::RecordingStarted { success })
                    }));
                }
                Effect::StopRecording => {
                    let weak = Arc::downgrade(self);
                    self.device.stop_recording(Box::new(move |success, locator| {
                        post_event(&weak, generation, Event::RecordingStopped { success, locator })
                    }));
                }
                Effect::ScheduleRecordingMinimum => {
                    let weak = Arc::downgrade(self);
                    self.dispatcher.post_delayed(
                        self.config.min_recording_duration(),
                        Box::new(move || {
                            if let Some(inner) = weak.upgrade() {
                                inner.deliver(generation, Event::RecordingMinimumElapsed);
                            }
                        }),
                    );
                }
                Effect::Notify(notice) => {
                    let view = Arc::clone(&self.view);
                    self.dispatcher
                        .post(Box::new(move || apply_notice(view.as_ref(), notice)));
                }
                Effect::StateChanged { from, to } => self.notify_observer(from, to),
            }
        }
    }

    fn notify_observer(&self, from: SessionState, to: SessionState) {
        if let Some(observer) = self.observer.lock().clone() {
            self.dispatcher
                .post(Box::new(move || observer.on_state_changed(from, to)));
        }
    }
}

/// Marshal a callback onto the dispatcher and feed it to the controller.
fn post_event(weak: &Weak<Inner>, generation: u64, event: Event) {
    let Some(inner) = weak.upgrade() else {
        return;
    };
    let target = weak.clone();
    inner.dispatcher.post(Box::new(move || {
        if let Some(inner) = target.upgrade() {
            inner.deliver(generation, event);
        }
    }));
}

fn apply_notice(view: &dyn SessionView, notice: ViewNotice) {
    match notice {
        ViewNotice::ScanStarted => view.on_scan_started(),
        ViewNotice::ScanDone(success) => view.on_scan_done(success),
        ViewNotice::ShutterDone => view.on_shutter_done(),
        ViewNotice::RecordingStarted => view.on_recording_started(),
        ViewNotice::RecordingStopped => view.on_recording_stopped(),
        ViewNotice::Clear => view.clear(),
        ViewNotice::ForceStop => view.force_stop(),
    }
}
