//! Drives one full camera session against the virtual camera:
//! open, bind, scan with a latched capture, store the photo, record a short
//! clip, pause, stop.
//!
//! ```text
//! RUST_LOG=debug viewfinder-demo [--out DIR] [--config FILE.json]
//! ```

use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use clap::Parser;
use log::{debug, info};
use parking_lot::Mutex;
use thiserror::Error;

use camera_session_core::{
    DirectoryPhotoStore, LooperThread, PhotoStorage, SessionConfig, SessionController,
    SessionError, SessionObserver, SessionState, SessionView, Size, StoreCompletion,
    SurfaceHandle, WorkerCameraDevice,
};
use camera_session_virtual::{VirtualCamera, VirtualCameraSpec, VirtualSurface};

const STEP_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Parser)]
#[command(name = "viewfinder-demo")]
#[command(about = "Run one camera session against the virtual camera")]
#[command(version)]
struct Cli {
    /// Directory photos are stored in (default: <temp>/viewfinder-demo)
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// JSON session configuration; missing fields keep their defaults
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[derive(Debug, Error)]
enum DemoError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("timed out waiting for {0}")]
    Timeout(&'static str),
}

#[derive(Debug, Clone, PartialEq)]
enum DemoEvent {
    State(SessionState),
    Shutter,
    Stored(Option<String>),
    RecordingStopped,
    ForceStop,
}

struct ConsoleView {
    surface: Arc<VirtualSurface>,
    events: Mutex<Sender<DemoEvent>>,
}

impl ConsoleView {
    fn emit(&self, event: DemoEvent) {
        send(&self.events.lock(), event);
    }
}

impl SessionView for ConsoleView {
    fn preview_surface(&self) -> Option<SurfaceHandle> {
        let surface: SurfaceHandle = self.surface.clone();
        Some(surface)
    }

    fn on_scan_started(&self) {
        info!("[view] focusing...");
    }

    fn on_scan_done(&self, success: bool) {
        info!("[view] focus {}", if success { "locked" } else { "failed" });
    }

    fn on_shutter_done(&self) {
        info!("[view] click");
        self.emit(DemoEvent::Shutter);
    }

    fn on_recording_started(&self) {
        info!("[view] recording");
    }

    fn on_recording_stopped(&self) {
        info!("[view] recording stopped");
        self.emit(DemoEvent::RecordingStopped);
    }

    fn clear(&self) {
        info!("[view] clear indicators");
    }

    fn force_stop(&self) {
        info!("[view] camera unavailable, closing");
        self.emit(DemoEvent::ForceStop);
    }
}

/// Forwards to the directory store and reports where photos landed.
struct ReportingStore {
    inner: DirectoryPhotoStore,
    events: Mutex<Sender<DemoEvent>>,
}

impl PhotoStorage for ReportingStore {
    fn store_photo(&self, data: Vec<u8>, on_stored: StoreCompletion) {
        let events = self.events.lock().clone();
        self.inner.store_photo(
            data,
            Box::new(move |success, locator| {
                send(&events, DemoEvent::Stored(locator.clone()));
                on_stored(success, locator);
            }),
        );
    }
}

struct StateLog {
    events: Mutex<Sender<DemoEvent>>,
}

impl SessionObserver for StateLog {
    fn on_state_changed(&self, from: SessionState, to: SessionState) {
        info!("[session] {} -> {}", from, to);
        send(&self.events.lock(), DemoEvent::State(to));
    }
}

/// The main loop may already have given up on a step; late events are dropped.
fn send(events: &Sender<DemoEvent>, event: DemoEvent) {
    if events.send(event).is_err() {
        debug!("demo event receiver gone");
    }
}

fn wait_for(
    events: &Receiver<DemoEvent>,
    what: &'static str,
    wanted: impl Fn(&DemoEvent) -> bool,
) -> Result<DemoEvent, DemoError> {
    let deadline = Instant::now() + STEP_TIMEOUT;
    loop {
        let left = deadline.saturating_duration_since(Instant::now());
        match events.recv_timeout(left) {
            Ok(event) if wanted(&event) => return Ok(event),
            Ok(DemoEvent::ForceStop) => return Err(DemoError::Timeout(what)),
            Ok(_) => continue,
            Err(_) => return Err(DemoError::Timeout(what)),
        }
    }
}

fn run(cli: Cli) -> Result<(), DemoError> {
    let config = match &cli.config {
        Some(path) => SessionConfig::from_json_str(&fs::read_to_string(path)?)?,
        None => SessionConfig::default(),
    };
    let output = cli
        .out
        .unwrap_or_else(|| std::env::temp_dir().join("viewfinder-demo"));
    let (events_tx, events) = mpsc::channel();

    let looper = Arc::new(LooperThread::spawn("ui")?);
    let (camera, probe) = VirtualCamera::new(VirtualCameraSpec::default());
    let device = Arc::new(WorkerCameraDevice::new(camera, &config));
    let store = Arc::new(ReportingStore {
        inner: DirectoryPhotoStore::new(&output)?,
        events: Mutex::new(events_tx.clone()),
    });
    let view = Arc::new(ConsoleView {
        surface: VirtualSurface::new(Size::new(1080, 1920)),
        events: Mutex::new(events_tx.clone()),
    });

    let controller =
        SessionController::new(config, device, view, store.clone(), looper.clone())?;
    controller.set_observer(Arc::new(StateLog {
        events: Mutex::new(events_tx),
    }));

    controller.start()?;
    controller.resume()?;
    controller.on_surface_ready()?;
    wait_for(&events, "preview", |e| *e == DemoEvent::State(SessionState::Idle))?;
    info!("preview size {:?}", controller.preview_size());

    controller.request_scan()?;
    controller.request_still_capture()?;
    wait_for(&events, "shutter", |e| *e == DemoEvent::Shutter)?;
    if let DemoEvent::Stored(locator) =
        wait_for(&events, "photo", |e| matches!(e, DemoEvent::Stored(_)))?
    {
        info!("photo saved to {}", locator.as_deref().unwrap_or("<nowhere>"));
    }

    // The capture may have returned to idle before the photo landed.
    let deadline = Instant::now() + STEP_TIMEOUT;
    while !controller.state().is_idle() {
        if Instant::now() >= deadline {
            return Err(DemoError::Timeout("idle"));
        }
        thread::sleep(Duration::from_millis(10));
    }
    controller.request_start_recording()?;
    controller.request_stop_recording()?;
    wait_for(&events, "clip", |e| *e == DemoEvent::RecordingStopped)?;

    controller.pause()?;
    wait_for(&events, "close", |e| *e == DemoEvent::State(SessionState::Finalized))?;
    controller.stop();
    store.inner.shutdown();
    looper.shutdown();

    info!("hardware: {:?}", probe.snapshot());
    Ok(())
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn cli_takes_output_and_config() {
        let cli = Cli::try_parse_from([
            "viewfinder-demo",
            "--out",
            "/tmp/photos",
            "-c",
            "session.json",
        ])
        .unwrap();
        assert_eq!(cli.out, Some(PathBuf::from("/tmp/photos")));
        assert_eq!(cli.config, Some(PathBuf::from("session.json")));

        let cli = Cli::try_parse_from(["viewfinder-demo"]).unwrap();
        assert!(cli.out.is_none() && cli.config.is_none());
    }

    #[test]
    fn cli_rejects_unknown_flags_and_missing_values() {
        assert!(Cli::try_parse_from(["viewfinder-demo", "--verbose"]).is_err());
        assert!(Cli::try_parse_from(["viewfinder-demo", "--out"]).is_err());
    }

    #[test]
    fn send_after_receiver_is_gone_is_harmless() {
        let (tx, rx) = mpsc::channel();
        send(&tx, DemoEvent::Shutter);
        assert_eq!(rx.recv().unwrap(), DemoEvent::Shutter);
        drop(rx);
        send(&tx, DemoEvent::ForceStop);
    }
}
