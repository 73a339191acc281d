//! Acquisition state machine run on the background thread.

use super::{sentinel::SentinelWatcher, AcquisitionMode, SourceEvent};
use crate::{
    bridge::CameraBridge,
    config::LiveViewConfig,
    frame::{jpeg_segment, Frame, FrameOrigin},
    Error, Result,
};
use log::{debug, info, warn};
use std::{
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        mpsc::{Receiver, RecvTimeoutError, Sender},
        Arc,
    },
    thread,
    time::{Duration, Instant},
};

/// Requests from the consumer side to the worker
pub(crate) enum Command {
    Configure(LiveViewConfig),
    Shoot(Sender<Result<()>>),
}

/// Destination of worker events
pub(crate) trait EventSink {
    fn emit(&mut self, event: SourceEvent);

    /// Frames emitted but not yet dispatched
    fn backlog(&self) -> usize {
        0
    }
}

/// Queued hand-off to the consumer thread
pub(crate) struct ChannelSink {
    events: Sender<SourceEvent>,
    pending: Arc<AtomicUsize>,
}

impl ChannelSink {
    pub(crate) fn new(events: Sender<SourceEvent>, pending: Arc<AtomicUsize>) -> Self {
        Self { events, pending }
    }
}

impl EventSink for ChannelSink {
    fn emit(&mut self, event: SourceEvent) {
        let is_frame = matches!(event, SourceEvent::Frame(_));
        if is_frame {
            self.pending.fetch_add(1, Ordering::AcqRel);
        }
        if self.events.send(event).is_err() && is_frame {
            self.pending.fetch_sub(1, Ordering::AcqRel);
        }
    }

    fn backlog(&self) -> usize {
        self.pending.load(Ordering::Acquire)
    }
}

const fn ms(v: u64) -> Duration {
    Duration::from_millis(v)
}

/// Owns the bridge and decides, tick by tick, where frames come from.
pub(crate) struct Acquisition {
    bridge: Box<dyn CameraBridge>,
    config: LiveViewConfig,
    mode: AcquisitionMode,
    sentinel: SentinelWatcher,
    buf: Vec<u8>,
    sequence: u64,
    last_good: Instant,
    last_keepalive: Instant,
    last_reconnect: Instant,
}

impl Acquisition {
    pub(crate) fn new(bridge: Box<dyn CameraBridge>, config: LiveViewConfig, now: Instant) -> Self {
        let config = config.clamped();
        let sentinel = SentinelWatcher::new(config.sentinel_path());
        Self {
            bridge,
            config,
            mode: AcquisitionMode::Idle,
            sentinel,
            buf: Vec::new(),
            sequence: 0,
            last_good: now,
            last_keepalive: now,
            last_reconnect: now,
        }
    }

    pub(crate) const fn mode(&self) -> AcquisitionMode {
        self.mode
    }

    fn poll_interval(&self) -> Duration {
        match self.mode {
            AcquisitionMode::SdkStreaming => ms(self.config.sdk_poll_ms),
            AcquisitionMode::FileFallback | AcquisitionMode::Idle => ms(self.config.file_poll_ms),
        }
    }

    fn transition(&mut self, mode: AcquisitionMode, sink: &mut dyn EventSink) {
        if self.mode != mode {
            info!("Acquisition mode: {} -> {}", self.mode, mode);
            self.mode = mode;
            sink.emit(SourceEvent::Status(mode));
        }
    }

    fn emit_frame(&mut self, frame: Frame, sink: &mut dyn EventSink) {
        if sink.backlog() >= self.config.max_pending_frames {
            debug!("Consumer is {} frames behind, dropping frame", sink.backlog());
            return;
        }
        self.sequence += 1;
        sink.emit(SourceEvent::Frame(frame));
    }

    /// Enter the first mode after `connect` was attempted
    pub(crate) fn begin(&mut self, connected: bool, now: Instant, sink: &mut dyn EventSink) {
        self.last_good = now;
        self.last_keepalive = now;
        self.last_reconnect = now;
        if connected {
            if let Err(e) = self.bridge.set_streaming(true) {
                warn!("Enabling live view failed: {}", e);
            }
            self.transition(AcquisitionMode::SdkStreaming, sink);
        } else {
            self.transition(AcquisitionMode::FileFallback, sink);
            self.emit_sentinel(true, sink);
        }
    }

    /// One polling iteration
    pub(crate) fn step(&mut self, now: Instant, sink: &mut dyn EventSink) {
        self.keep_alive(now);
        match self.mode {
            AcquisitionMode::SdkStreaming => {
                if let Some(frame) = self.poll_sdk() {
                    self.last_good = now;
                    self.emit_frame(frame, sink);
                } else if now.saturating_duration_since(self.last_good) >= ms(self.config.failover_ms) {
                    info!(
                        "No SDK frame for {} ms, falling back to {}",
                        self.config.failover_ms,
                        self.sentinel.path().display()
                    );
                    self.transition(AcquisitionMode::FileFallback, sink);
                    self.emit_sentinel(true, sink);
                }
            }
            AcquisitionMode::FileFallback => {
                self.emit_sentinel(false, sink);
                self.try_reconnect(now);
                if let Some(frame) = self.poll_sdk() {
                    self.last_good = now;
                    self.transition(AcquisitionMode::SdkStreaming, sink);
                    self.emit_frame(frame, sink);
                }
            }
            AcquisitionMode::Idle => {}
        }
    }

    fn keep_alive(&mut self, now: Instant) {
        if !self.bridge.is_connected() {
            return;
        }
        if now.saturating_duration_since(self.last_keepalive) >= ms(self.config.keepalive_ms) {
            self.last_keepalive = now;
            if let Err(e) = self.bridge.set_streaming(true) {
                warn!("Live view keep-alive failed: {}", e);
            }
        }
    }

    fn try_reconnect(&mut self, now: Instant) {
        if self.bridge.is_connected()
            || now.saturating_duration_since(self.last_reconnect) < ms(self.config.reconnect_ms)
        {
            return;
        }
        self.last_reconnect = now;
        match self.bridge.connect() {
            Ok(()) => {
                info!("Camera reconnected");
                self.last_keepalive = now;
                if let Err(e) = self.bridge.set_streaming(true) {
                    warn!("Enabling live view failed: {}", e);
                }
            }
            Err(e) => debug!("Reconnect failed: {}", e),
        }
    }

    /// Fetch and decode one SDK frame; every failure is a miss
    fn poll_sdk(&mut self) -> Option<Frame> {
        if !self.bridge.is_connected() {
            return None;
        }
        let needed = match self.bridge.buffer_size() {
            Ok(0) => return None,
            Ok(n) => n,
            Err(e) => {
                debug!("Live view size query failed: {}", e);
                return None;
            }
        };
        if self.buf.len() < needed {
            self.buf.resize(needed, 0);
        }
        let used = match self.bridge.fetch_frame(&mut self.buf[..needed]) {
            Ok(0) => return None,
            Ok(n) => n.min(needed),
            Err(e) => {
                debug!("Live view fetch failed: {}", e);
                return None;
            }
        };
        let Some(jpeg) = jpeg_segment(&self.buf[..used]) else {
            debug!("Live view buffer of {} bytes holds no complete JPEG", used);
            return None;
        };
        match Frame::decode(jpeg, FrameOrigin::Sdk, self.sequence) {
            Ok(frame) => Some(frame),
            Err(e) => {
                debug!("Live view decode failed: {}", e);
                None
            }
        }
    }

    /// Emit the sentinel image; `forced` ignores its signature
    fn emit_sentinel(&mut self, forced: bool, sink: &mut dyn EventSink) {
        let bytes = if forced {
            self.sentinel.read_forced()
        } else {
            self.sentinel.poll()
        };
        let Some(bytes) = bytes else {
            return;
        };
        match Frame::decode(&bytes, FrameOrigin::File, self.sequence) {
            Ok(frame) => self.emit_frame(frame, sink),
            Err(e) => debug!("Sentinel decode failed: {}", e),
        }
    }

    pub(crate) fn shoot(&mut self) -> Result<()> {
        if !self.bridge.is_connected() {
            return Err(Error::NoCameraHandle);
        }
        self.bridge.shoot_one()
    }

    pub(crate) fn reconfigure(&mut self, config: LiveViewConfig) {
        self.config = config.clamped();
        self.sentinel.retarget(self.config.sentinel_path());
    }

    fn handle(&mut self, command: Command) {
        match command {
            Command::Configure(config) => {
                debug!("Worker reconfigured: {:?}", config);
                self.reconfigure(config);
            }
            Command::Shoot(reply) => {
                let result = self.shoot();
                match &result {
                    Ok(()) => info!("Still capture triggered"),
                    Err(e) => warn!("Still capture failed: {}", e),
                }
                // The caller may have given up waiting
                let _ = reply.send(result);
            }
        }
    }

    /// Close the camera handle
    pub(crate) fn shutdown(&mut self) {
        if self.bridge.is_connected() {
            if let Err(e) = self.bridge.set_streaming(false) {
                debug!("Disabling live view failed: {}", e);
            }
            self.bridge.disconnect();
        }
        self.mode = AcquisitionMode::Idle;
    }

    /// Worker thread body; hands the bridge back when cancelled
    pub(crate) fn run(
        mut self,
        connected: bool,
        stop: &AtomicBool,
        commands: &Receiver<Command>,
        sink: &mut dyn EventSink,
    ) -> Box<dyn CameraBridge> {
        self.begin(connected, Instant::now(), sink);
        if connected && self.config.warmup_ms > 0 {
            thread::sleep(ms(self.config.warmup_ms));
            self.last_good = Instant::now();
        }

        while !stop.load(Ordering::Acquire) {
            self.step(Instant::now(), sink);
            match commands.recv_timeout(self.poll_interval()) {
                Ok(command) => {
                    self.handle(command);
                    while let Ok(command) = commands.try_recv() {
                        self.handle(command);
                    }
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        debug!("Acquisition worker stopping in {} mode", self.mode());
        self.shutdown();
        self.bridge
    }
}
