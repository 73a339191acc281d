//! Dual-mode frame acquisition.
//!
//! A [`FrameSource`] owns one [`CameraBridge`] and runs a background worker
//! that streams SDK live-view frames. When the SDK stops delivering for
//! `failover_ms` the worker falls back to a sentinel image on disk and
//! returns to the SDK as soon as a good frame arrives again.
//!
//! Frames and status changes are queued by the worker and handed to the
//! registered callbacks on the consumer thread by [`FrameSource::dispatch`].

mod sentinel;
mod worker;

use crate::{
    bridge::{CameraBridge, NullBridge},
    config::LiveViewConfig,
    constants::{MIN_FAILOVER_MS, MIN_FILE_POLL_MS, MIN_SDK_POLL_MS},
    frame::Frame,
    guidance::InputSource,
    Error, Result,
};
use log::{debug, info, warn};
use std::{
    fmt,
    path::PathBuf,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        mpsc::{self, Receiver, RecvTimeoutError, Sender},
        Arc,
    },
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};
use worker::{Acquisition, ChannelSink, Command};

/// Where the running source currently takes frames from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AcquisitionMode {
    /// Not running
    #[default]
    Idle,
    /// Polling the SDK live view
    SdkStreaming,
    /// Watching the sentinel image
    FileFallback,
}

impl AcquisitionMode {
    /// Status text reported to listeners
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "off",
            Self::SdkStreaming => "sdk",
            Self::FileFallback => "file",
        }
    }

    /// Guidance input source matching this mode
    #[must_use]
    pub const fn input_source(self) -> Option<InputSource> {
        match self {
            Self::Idle => None,
            Self::SdkStreaming => Some(InputSource::Sdk),
            Self::FileFallback => Some(InputSource::File),
        }
    }
}

impl fmt::Display for AcquisitionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the worker hands over to the consumer thread
#[derive(Debug)]
pub enum SourceEvent {
    Frame(Frame),
    Status(AcquisitionMode),
}

type FrameCallback = Box<dyn FnMut(Frame)>;
type StatusCallback = Box<dyn FnMut(AcquisitionMode)>;

struct Worker {
    stop: Arc<AtomicBool>,
    commands: Sender<Command>,
    events: Receiver<SourceEvent>,
    pending: Arc<AtomicUsize>,
    handle: JoinHandle<Box<dyn CameraBridge>>,
}

impl Worker {
    fn next_event(&self, wait: Option<Duration>) -> Option<SourceEvent> {
        let event = match wait {
            Some(timeout) => self.events.recv_timeout(timeout).ok()?,
            None => self.events.try_recv().ok()?,
        };
        if matches!(event, SourceEvent::Frame(_)) {
            self.pending.fetch_sub(1, Ordering::AcqRel);
        }
        Some(event)
    }
}

/// Frame acquisition service with automatic SDK/file failover.
///
/// The source itself lives on the consumer (UI) thread; only the worker it
/// spawns touches the bridge while running.
pub struct FrameSource {
    config: LiveViewConfig,
    bridge: Option<Box<dyn CameraBridge>>,
    worker: Option<Worker>,
    mode: AcquisitionMode,
    on_frame: Option<FrameCallback>,
    on_status: Option<StatusCallback>,
}

impl FrameSource {
    /// Create a stopped source owning `bridge`
    pub fn new<B: CameraBridge + 'static>(bridge: B, config: LiveViewConfig) -> Self {
        Self {
            config: clamp_with_warning(config),
            bridge: Some(Box::new(bridge)),
            worker: None,
            mode: AcquisitionMode::Idle,
            on_frame: None,
            on_status: None,
        }
    }

    /// Create a stopped source for machines without the camera SDK
    #[must_use]
    pub fn without_camera(config: LiveViewConfig) -> Self {
        Self::new(NullBridge, config)
    }

    /// Set drop directory and timing; values below their floor are raised
    pub fn configure(&mut self, drop_dir: impl Into<PathBuf>, sdk_poll_ms: u64, file_poll_ms: u64, failover_ms: u64) {
        let config = LiveViewConfig {
            drop_dir: drop_dir.into(),
            sdk_poll_ms,
            file_poll_ms,
            failover_ms,
            ..self.config.clone()
        };
        self.set_config(config);
    }

    /// Replace the whole live-view configuration
    pub fn set_config(&mut self, config: LiveViewConfig) {
        self.config = clamp_with_warning(config);
        if let Some(worker) = &self.worker {
            if worker.commands.send(Command::Configure(self.config.clone())).is_err() {
                debug!("Worker gone, configuration applies on next start");
            }
        }
    }

    #[must_use]
    pub const fn config(&self) -> &LiveViewConfig {
        &self.config
    }

    /// Register the status listener; it receives "sdk", "file" and "off" transitions
    pub fn set_status_listener(&mut self, listener: impl FnMut(AcquisitionMode) + 'static) {
        self.on_status = Some(Box::new(listener));
    }

    /// Mode as of the last dispatched status
    #[must_use]
    pub const fn mode(&self) -> AcquisitionMode {
        self.mode
    }

    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.worker.is_some()
    }

    /// Start acquisition, stopping a previous run first.
    ///
    /// Returns `true` when the camera connected and the worker streams from
    /// the SDK, `false` when it runs in file mode.
    pub fn start(&mut self, on_frame: impl FnMut(Frame) + 'static) -> bool {
        self.stop();
        self.on_frame = Some(Box::new(on_frame));

        let mut bridge: Box<dyn CameraBridge> = match self.bridge.take() {
            Some(bridge) => bridge,
            None => {
                warn!("Camera bridge was lost by an abandoned worker, continuing without camera");
                Box::new(NullBridge)
            }
        };
        let connected = match bridge.connect() {
            Ok(()) => {
                info!("Camera connected, starting SDK live view");
                true
            }
            Err(e) => {
                info!("Camera unavailable ({}), watching {}", e, self.config.sentinel_path().display());
                false
            }
        };

        let stop = Arc::new(AtomicBool::new(false));
        let pending = Arc::new(AtomicUsize::new(0));
        let (command_tx, command_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let acquisition = Acquisition::new(bridge, self.config.clone(), Instant::now());

        let worker_stop = Arc::clone(&stop);
        let mut sink = ChannelSink::new(event_tx, Arc::clone(&pending));
        let spawned = thread::Builder::new()
            .name("frame-source".to_string())
            .spawn(move || acquisition.run(connected, &worker_stop, &command_rx, &mut sink));

        match spawned {
            Ok(handle) => {
                self.worker = Some(Worker {
                    stop,
                    commands: command_tx,
                    events: event_rx,
                    pending,
                    handle,
                });
                connected
            }
            Err(e) => {
                warn!("Failed to spawn acquisition worker: {}", e);
                false
            }
        }
    }

    /// Stop acquisition and release the camera.
    ///
    /// Waits at most `stop_timeout_ms` for the worker; a worker that does not
    /// finish in time is abandoned together with its bridge. Statuses still
    /// queued are delivered, frames are discarded, then "off" is reported.
    /// Calling `stop` on a stopped source does nothing.
    pub fn stop(&mut self) {
        if let Some(worker) = self.worker.take() {
            worker.stop.store(true, Ordering::Release);
            let Worker {
                commands, events, handle, ..
            } = worker;
            drop(commands);

            let deadline = Instant::now() + Duration::from_millis(self.config.stop_timeout_ms);
            while !handle.is_finished() && Instant::now() < deadline {
                thread::sleep(Duration::from_millis(5));
            }
            if handle.is_finished() {
                match handle.join() {
                    Ok(bridge) => self.bridge = Some(bridge),
                    Err(_) => warn!("Acquisition worker panicked"),
                }
            } else {
                warn!(
                    "Acquisition worker did not stop within {} ms, abandoning it",
                    self.config.stop_timeout_ms
                );
            }

            while let Ok(event) = events.try_recv() {
                if let SourceEvent::Status(mode) = event {
                    self.notify(mode);
                }
            }
        }

        if self.mode != AcquisitionMode::Idle {
            self.notify(AcquisitionMode::Idle);
            info!("Frame source stopped");
        }
    }

    /// Trigger a single still capture on the open camera
    ///
    /// # Errors
    ///
    /// Returns `NoCameraHandle` when the source is stopped or no camera is
    /// connected, `Timeout` when the worker does not answer within
    /// `shoot_timeout_ms`, or the bridge's own error
    pub fn shoot_one(&self) -> Result<()> {
        let Some(worker) = &self.worker else {
            return Err(Error::NoCameraHandle);
        };
        let (reply_tx, reply_rx) = mpsc::channel();
        worker
            .commands
            .send(Command::Shoot(reply_tx))
            .map_err(|_| Error::Worker("acquisition worker has exited".to_string()))?;

        match reply_rx.recv_timeout(Duration::from_millis(self.config.shoot_timeout_ms)) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => Err(Error::Timeout(format!(
                "no capture reply within {} ms",
                self.config.shoot_timeout_ms
            ))),
            Err(RecvTimeoutError::Disconnected) => Err(Error::Worker("acquisition worker has exited".to_string())),
        }
    }

    /// Deliver every queued event; returns the number of frames delivered
    pub fn dispatch(&mut self) -> usize {
        let mut frames = 0;
        while let Some(event) = self.worker.as_ref().and_then(|w| w.next_event(None)) {
            frames += usize::from(self.deliver(event));
        }
        frames
    }

    /// Wait up to `timeout` for the first event, then deliver everything queued
    pub fn dispatch_timeout(&mut self, timeout: Duration) -> usize {
        let Some(first) = self.worker.as_ref().and_then(|w| w.next_event(Some(timeout))) else {
            return 0;
        };
        usize::from(self.deliver(first)) + self.dispatch()
    }

    fn deliver(&mut self, event: SourceEvent) -> bool {
        match event {
            SourceEvent::Frame(frame) => {
                if let Some(on_frame) = self.on_frame.as_mut() {
                    on_frame(frame);
                }
                true
            }
            SourceEvent::Status(mode) => {
                self.notify(mode);
                false
            }
        }
    }

    fn notify(&mut self, mode: AcquisitionMode) {
        self.mode = mode;
        if let Some(on_status) = self.on_status.as_mut() {
            on_status(mode);
        }
    }
}

impl Drop for FrameSource {
    fn drop(&mut self) {
        self.stop();
    }
}

impl fmt::Debug for FrameSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameSource")
            .field("config", &self.config)
            .field("mode", &self.mode)
            .field("running", &self.worker.is_some())
            .finish_non_exhaustive()
    }
}

fn clamp_with_warning(config: LiveViewConfig) -> LiveViewConfig {
    for (name, value, floor) in [
        ("sdk_poll_ms", config.sdk_poll_ms, MIN_SDK_POLL_MS),
        ("file_poll_ms", config.file_poll_ms, MIN_FILE_POLL_MS),
        ("failover_ms", config.failover_ms, MIN_FAILOVER_MS),
    ] {
        if value < floor {
            warn!("{} = {} is below the minimum, using {}", name, value, floor);
        }
    }
    config.clamped()
}
