//! The session state machine as a single transition function.
//!
//! [`Machine::handle`] maps `(phase, event)` to the next phase plus a list of
//! [`Effect`]s. It performs no I/O; the controller executes the effects after
//! each step. Entry actions are emitted by [`Machine::enter`], so every way
//! into a phase produces the same effects.

use log::{debug, info, warn};

use crate::models::camera_models::CaptureEvent;
use crate::models::state::SessionState;

/// Pre-open progress while `Finalized`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PreOpen {
    Off,
    Pending,
    Opened,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Phase {
    Finalized {
        pre_open: PreOpen,
    },
    Initialized {
        camera_ready: bool,
        surface_ready: bool,
        open_failed: bool,
    },
    Idle,
    DoingScan {
        capture_requested: bool,
    },
    CancellingScan,
    ScanDone {
        success: bool,
        capture_deferred: bool,
    },
    StillCapturing {
        request_id: u64,
        pause_requested: bool,
    },
    Recording {
        /// The device reported that frames are being written.
        started: bool,
        /// The minimum clip duration has passed since the start.
        min_elapsed: bool,
        stop_requested: bool,
        pause_requested: bool,
    },
}

impl Phase {
    pub(crate) fn state(&self) -> SessionState {
        match self {
            Phase::Finalized { .. } => SessionState::Finalized,
            Phase::Initialized { .. } => SessionState::Initialized,
            Phase::Idle => SessionState::Idle,
            Phase::DoingScan { .. } => SessionState::DoingScan,
            Phase::CancellingScan => SessionState::CancellingScan,
            Phase::ScanDone { success, .. } => SessionState::ScanDone { success: *success },
            Phase::StillCapturing { .. } => SessionState::StillCapturing,
            Phase::Recording { .. } => SessionState::Recording,
        }
    }

    fn initialized() -> Self {
        Phase::Initialized {
            camera_ready: false,
            surface_ready: false,
            open_failed: false,
        }
    }

    fn finalized() -> Self {
        Phase::Finalized {
            pre_open: PreOpen::Off,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Event {
    Resume,
    Pause,
    ForceStop,
    PreOpenRequested,
    PreOpenCancelled,
    SurfaceReady,
    ScanRequested,
    CancelScanRequested,
    StillCaptureRequested,
    RecordingRequested,
    StopRecordingRequested,
    CameraOpened { success: bool },
    SurfaceBound { success: bool },
    ScanDone { success: bool },
    CancelScanDone,
    Capture(CaptureEvent),
    PhotoStored { success: bool, locator: Option<String> },
    OpenFailureTimeout,
    RecordingStarted { success: bool },
    RecordingMinimumElapsed,
    RecordingStopped { success: bool, locator: Option<String> },
}

impl Event {
    pub(crate) fn name(&self) -> &'static str {
        match self {
            Event::Resume => "resume",
            Event::Pause => "pause",
            Event::ForceStop => "force-stop",
            Event::PreOpenRequested => "pre-open",
            Event::PreOpenCancelled => "cancel-pre-open",
            Event::SurfaceReady => "surface-ready",
            Event::ScanRequested => "scan",
            Event::CancelScanRequested => "cancel-scan",
            Event::StillCaptureRequested => "still-capture",
            Event::RecordingRequested => "start-recording",
            Event::StopRecordingRequested => "stop-recording",
            Event::CameraOpened { .. } => "camera-opened",
            Event::SurfaceBound { .. } => "surface-bound",
            Event::ScanDone { .. } => "scan-done",
            Event::CancelScanDone => "cancel-scan-done",
            Event::Capture(CaptureEvent::Shutter { .. }) => "shutter",
            Event::Capture(CaptureEvent::Done { .. }) => "capture-done",
            Event::Capture(CaptureEvent::PhotoReady { .. }) => "photo-ready",
            Event::PhotoStored { .. } => "photo-stored",
            Event::OpenFailureTimeout => "open-failure-timeout",
            Event::RecordingStarted { .. } => "recording-started",
            Event::RecordingMinimumElapsed => "recording-minimum-elapsed",
            Event::RecordingStopped { .. } => "recording-stopped",
        }
    }

    /// Whether a callback carrying this event is void once the session
    /// generation it was issued in has ended. Photos are never dropped.
    pub(crate) fn is_generation_bound(&self) -> bool {
        !matches!(
            self,
            Event::Capture(CaptureEvent::PhotoReady { .. }) | Event::PhotoStored { .. }
        )
    }
}

/// View notifications, posted to the UI context in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ViewNotice {
    ScanStarted,
    ScanDone(bool),
    ShutterDone,
    RecordingStarted,
    RecordingStopped,
    Clear,
    ForceStop,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Effect {
    OpenDevice,
    CloseDevice,
    BindSurface,
    Scan,
    CancelScan,
    StillCapture { request_id: u64 },
    StorePhoto { request_id: u64, data: Vec<u8> },
    ScheduleOpenFailureTimeout,
    StartRecording,
    StopRecording,
    ScheduleRecordingMinimum,
    Notify(ViewNotice),
    StateChanged { from: SessionState, to: SessionState },
}

pub(crate) struct Machine {
    phase: Phase,
    /// Bumped whenever device callbacks issued so far must be ignored.
    generation: u64,
    next_request_id: u64,
    /// Capture whose photo has not been delivered yet.
    pending_photo: Option<u64>,
    stores_in_flight: usize,
    event_name: &'static str,
}

impl Machine {
    pub(crate) fn new() -> Self {
        Self {
            phase: Phase::finalized(),
            generation: 0,
            next_request_id: 1,
            pending_photo: None,
            stores_in_flight: 0,
            event_name: "",
        }
    }

    #[cfg(test)]
    pub(crate) fn phase(&self) -> &Phase {
        &self.phase
    }

    pub(crate) fn state(&self) -> SessionState {
        self.phase.state()
    }

    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    #[cfg(test)]
    pub(crate) fn pending_photo(&self) -> Option<u64> {
        self.pending_photo
    }

    pub(crate) fn stores_in_flight(&self) -> usize {
        self.stores_in_flight
    }

    /// Drop to `Finalized` without effects and void all outstanding
    /// callbacks. Request ids keep counting.
    pub(crate) fn reset(&mut self) {
        self.generation += 1;
        self.phase = Phase::finalized();
        self.pending_photo = None;
    }

    pub(crate) fn handle(&mut self, event: Event) -> Vec<Effect> {
        let mut effects = Vec::new();
        self.event_name = event.name();
        self.step(event, &mut effects);
        effects
    }

    fn step(&mut self, event: Event, fx: &mut Vec<Effect>) {
        use Phase::*;

        match (self.phase.clone(), event) {
            // Lifecycle.
            (Finalized { .. }, Event::Resume) => self.enter(Phase::initialized(), fx),
            (
                StillCapturing {
                    request_id,
                    pause_requested: true,
                },
                Event::Resume,
            ) => {
                // The device was never closed, so there is nothing to reopen.
                debug!("resume cancels deferred pause of capture {}", request_id);
                self.phase = StillCapturing {
                    request_id,
                    pause_requested: false,
                };
            }
            (
                Recording {
                    started,
                    min_elapsed,
                    stop_requested,
                    pause_requested: true,
                },
                Event::Resume,
            ) => {
                // The stop already asked for still goes ahead; the session stays open.
                debug!("resume cancels deferred pause of recording");
                self.phase = Recording {
                    started,
                    min_elapsed,
                    stop_requested,
                    pause_requested: false,
                };
            }
            (StillCapturing { request_id, .. }, Event::Pause) => {
                debug!("pause deferred until capture {} completes", request_id);
                self.defer_pause(fx);
            }
            (Recording { .. }, Event::Pause) => {
                debug!("pause deferred until recording stops");
                self.defer_pause(fx);
            }
            (
                Finalized {
                    pre_open: PreOpen::Pending | PreOpen::Opened,
                },
                Event::Pause,
            ) => {
                debug!("pause closes pre-opened camera");
                self.generation += 1;
                self.phase = Phase::finalized();
                fx.push(Effect::CloseDevice);
            }
            (Finalized { .. }, Event::Pause) => self.ignore(),
            (DoingScan { .. } | ScanDone { .. }, Event::Pause) => {
                fx.push(Effect::CancelScan);
                self.enter(Phase::finalized(), fx);
            }
            (_, Event::Pause) => self.enter(Phase::finalized(), fx),

            (Finalized { .. }, Event::ForceStop) => fx.push(Effect::Notify(ViewNotice::ForceStop)),
            (StillCapturing { .. } | Recording { .. }, Event::ForceStop) => {
                fx.push(Effect::Notify(ViewNotice::ForceStop));
                self.defer_pause(fx);
            }
            (DoingScan { .. } | ScanDone { .. }, Event::ForceStop) => {
                fx.push(Effect::Notify(ViewNotice::ForceStop));
                fx.push(Effect::CancelScan);
                self.enter(Phase::finalized(), fx);
            }
            (_, Event::ForceStop) => {
                fx.push(Effect::Notify(ViewNotice::ForceStop));
                self.enter(Phase::finalized(), fx);
            }

            // Pre-open while closed.
            (
                Finalized {
                    pre_open: PreOpen::Off,
                },
                Event::PreOpenRequested,
            ) => {
                self.phase = Finalized {
                    pre_open: PreOpen::Pending,
                };
                fx.push(Effect::OpenDevice);
            }
            (
                Finalized {
                    pre_open: PreOpen::Pending | PreOpen::Opened,
                },
                Event::PreOpenCancelled,
            ) => {
                // The pending open is queued ahead of this close; void its callback.
                self.generation += 1;
                self.phase = Phase::finalized();
                fx.push(Effect::CloseDevice);
            }
            (
                Finalized {
                    pre_open: PreOpen::Pending,
                },
                Event::CameraOpened { success },
            ) => {
                self.phase = Finalized {
                    pre_open: if success { PreOpen::Opened } else { PreOpen::Off },
                };
            }

            // Open/surface rendezvous.
            (Initialized { surface_ready, .. }, Event::CameraOpened { success: true }) => {
                self.join(true, surface_ready, fx)
            }
            (
                Initialized {
                    camera_ready,
                    surface_ready,
                    open_failed,
                },
                Event::CameraOpened { success: false },
            ) => {
                if !open_failed {
                    warn!("camera open failed");
                    fx.push(Effect::ScheduleOpenFailureTimeout);
                }
                self.phase = Initialized {
                    camera_ready,
                    surface_ready,
                    open_failed: true,
                };
            }
            (Initialized { camera_ready, .. }, Event::SurfaceReady) => {
                self.join(camera_ready, true, fx)
            }
            (
                Initialized {
                    camera_ready: false,
                    open_failed: true,
                    ..
                },
                Event::OpenFailureTimeout,
            ) => {
                fx.push(Effect::Notify(ViewNotice::ForceStop));
                self.enter(Phase::finalized(), fx);
            }
            (
                StillCapturing {
                    pause_requested: true,
                    ..
                }
                | Recording {
                    pause_requested: true,
                    ..
                },
                Event::SurfaceReady,
            ) => debug!("surface ready while closing, not bound"),
            (Finalized { .. }, Event::SurfaceReady) => self.ignore(),
            (_, Event::SurfaceReady) => fx.push(Effect::BindSurface),
            (_, Event::SurfaceBound { success }) => {
                if success {
                    debug!("preview surface bound");
                } else {
                    warn!("preview surface bind failed in {}", self.state());
                }
            }

            // Scan.
            (Idle, Event::ScanRequested) => self.enter(
                DoingScan {
                    capture_requested: false,
                },
                fx,
            ),
            (DoingScan { .. } | ScanDone { .. }, Event::CancelScanRequested) => {
                self.enter(CancellingScan, fx)
            }
            (DoingScan { capture_requested }, Event::ScanDone { success }) => {
                self.enter(
                    ScanDone {
                        success,
                        capture_deferred: false,
                    },
                    fx,
                );
                if capture_requested {
                    self.try_capture(fx);
                }
            }
            (CancellingScan, Event::CancelScanDone) => self.enter(Idle, fx),

            // Still capture.
            (DoingScan { .. }, Event::StillCaptureRequested) => {
                debug!("still capture latched until scan completes");
                self.phase = DoingScan {
                    capture_requested: true,
                };
            }
            (ScanDone { .. }, Event::StillCaptureRequested) => self.try_capture(fx),
            (Idle, Event::StillCaptureRequested) => {
                info!("still capture rejected: no scan before capture");
            }
            (StillCapturing { request_id, .. }, Event::Capture(CaptureEvent::Shutter { request_id: id }))
                if id == request_id =>
            {
                fx.push(Effect::Notify(ViewNotice::Clear));
                fx.push(Effect::Notify(ViewNotice::ShutterDone));
            }
            (
                StillCapturing {
                    request_id,
                    pause_requested,
                },
                Event::Capture(CaptureEvent::Done {
                    request_id: id,
                    success,
                }),
            ) if id == request_id => {
                if !success {
                    warn!("still capture {} failed", id);
                    if self.pending_photo == Some(id) {
                        self.pending_photo = None;
                    }
                }
                let next = if pause_requested {
                    Phase::finalized()
                } else {
                    Idle
                };
                self.enter(next, fx);
            }
            // Recording.
            (Idle, Event::RecordingRequested) => self.enter(
                Recording {
                    started: false,
                    min_elapsed: false,
                    stop_requested: false,
                    pause_requested: false,
                },
                fx,
            ),
            (Recording { .. }, Event::StopRecordingRequested) => self.request_stop_recording(fx),
            (
                Recording {
                    started: false,
                    min_elapsed,
                    stop_requested,
                    pause_requested,
                },
                Event::RecordingStarted { success: true },
            ) => {
                info!("recording started");
                self.phase = Recording {
                    started: true,
                    min_elapsed,
                    stop_requested,
                    pause_requested,
                };
                fx.push(Effect::Notify(ViewNotice::RecordingStarted));
                fx.push(Effect::ScheduleRecordingMinimum);
            }
            (
                Recording {
                    started: false,
                    pause_requested,
                    ..
                },
                Event::RecordingStarted { success: false },
            ) => {
                warn!("recording failed to start");
                let next = if pause_requested {
                    Phase::finalized()
                } else {
                    Idle
                };
                self.enter(next, fx);
            }
            (
                Recording {
                    started: true,
                    min_elapsed: false,
                    stop_requested,
                    pause_requested,
                },
                Event::RecordingMinimumElapsed,
            ) => {
                self.phase = Recording {
                    started: true,
                    min_elapsed: true,
                    stop_requested,
                    pause_requested,
                };
                if stop_requested {
                    debug!("minimum duration reached, stopping recording");
                    fx.push(Effect::StopRecording);
                }
            }
            (
                Recording {
                    started: true,
                    stop_requested: true,
                    pause_requested,
                    ..
                },
                Event::RecordingStopped { success, locator },
            ) => {
                match (success, locator) {
                    (true, Some(locator)) => info!("recording stored at {}", locator),
                    (true, None) => info!("recording stopped"),
                    (false, _) => warn!("recording failed to finalize"),
                }
                fx.push(Effect::Notify(ViewNotice::RecordingStopped));
                let next = if pause_requested {
                    Phase::finalized()
                } else {
                    Idle
                };
                self.enter(next, fx);
            }

            (phase, Event::Capture(CaptureEvent::PhotoReady { request_id, data })) => {
                self.stores_in_flight += 1;
                fx.push(Effect::StorePhoto { request_id, data });
                if self.pending_photo == Some(request_id) {
                    self.pending_photo = None;
                    if let ScanDone {
                        capture_deferred: true,
                        ..
                    } = phase
                    {
                        self.try_capture(fx);
                    }
                }
            }
            (_, Event::PhotoStored { success, locator }) => {
                self.stores_in_flight = self.stores_in_flight.saturating_sub(1);
                match (success, locator) {
                    (true, Some(locator)) => info!("photo stored at {}", locator),
                    (true, None) => info!("photo stored"),
                    (false, _) => warn!("photo store failed"),
                }
            }

            _ => self.ignore(),
        }
    }

    /// Fire the rendezvous once both the camera and the surface are ready.
    fn join(&mut self, camera_ready: bool, surface_ready: bool, fx: &mut Vec<Effect>) {
        if camera_ready && surface_ready {
            fx.push(Effect::BindSurface);
            self.enter(Phase::Idle, fx);
            return;
        }
        let open_failed = !camera_ready
            && matches!(
                self.phase,
                Phase::Initialized {
                    open_failed: true,
                    ..
                }
            );
        self.phase = Phase::Initialized {
            camera_ready,
            surface_ready,
            open_failed,
        };
    }

    /// Close once the in-flight capture or recording has finished.
    fn defer_pause(&mut self, fx: &mut Vec<Effect>) {
        match self.phase {
            Phase::StillCapturing { request_id, .. } => {
                self.phase = Phase::StillCapturing {
                    request_id,
                    pause_requested: true,
                };
            }
            Phase::Recording {
                started,
                min_elapsed,
                stop_requested,
                ..
            } => {
                self.phase = Phase::Recording {
                    started,
                    min_elapsed,
                    stop_requested,
                    pause_requested: true,
                };
                self.request_stop_recording(fx);
            }
            _ => self.enter(Phase::finalized(), fx),
        }
    }

    /// Stop the recording, no earlier than the minimum duration after it
    /// started. Repeated requests are absorbed.
    fn request_stop_recording(&mut self, fx: &mut Vec<Effect>) {
        let Phase::Recording {
            started,
            min_elapsed,
            stop_requested,
            pause_requested,
        } = self.phase
        else {
            return;
        };
        if stop_requested {
            debug!("recording stop already pending");
            return;
        }
        self.phase = Phase::Recording {
            started,
            min_elapsed,
            stop_requested: true,
            pause_requested,
        };
        if started && min_elapsed {
            fx.push(Effect::StopRecording);
        } else {
            debug!("recording stop deferred until minimum duration");
        }
    }

    /// Start a capture from `ScanDone`, or defer it while the previous
    /// capture's photo is still on its way.
    fn try_capture(&mut self, fx: &mut Vec<Effect>) {
        if let Some(pending) = self.pending_photo {
            debug!("still capture deferred until photo {} arrives", pending);
            if let Phase::ScanDone { success, .. } = self.phase {
                self.phase = Phase::ScanDone {
                    success,
                    capture_deferred: true,
                };
            }
            return;
        }
        let request_id = self.next_request_id;
        self.next_request_id += 1;
        self.pending_photo = Some(request_id);
        self.enter(
            Phase::StillCapturing {
                request_id,
                pause_requested: false,
            },
            fx,
        );
    }

    /// Move to `next` and emit its entry actions.
    fn enter(&mut self, next: Phase, fx: &mut Vec<Effect>) {
        let from = self.phase.state();
        let to = next.state();
        match &next {
            Phase::Finalized { .. } => {
                self.generation += 1;
                fx.push(Effect::CloseDevice);
            }
            Phase::Initialized { .. } => fx.push(Effect::OpenDevice),
            Phase::Idle => fx.push(Effect::Notify(ViewNotice::Clear)),
            Phase::DoingScan { .. } => {
                fx.push(Effect::Scan);
                fx.push(Effect::Notify(ViewNotice::ScanStarted));
            }
            Phase::CancellingScan => fx.push(Effect::CancelScan),
            Phase::ScanDone { success, .. } => {
                fx.push(Effect::Notify(ViewNotice::ScanDone(*success)))
            }
            Phase::StillCapturing { request_id, .. } => fx.push(Effect::StillCapture {
                request_id: *request_id,
            }),
            Phase::Recording { .. } => fx.push(Effect::StartRecording),
        }
        debug!("{} -> {} ({})", from, to, self.event_name);
        self.phase = next;
        fx.push(Effect::StateChanged { from, to });
    }

    fn ignore(&self) {
        debug!("{} ignored in {}", self.event_name, self.state());
    }
}
