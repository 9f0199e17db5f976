//! Capture session use case
//!
//! Owns the media streams, the recorder and the recording timer for one
//! installation, and drives them through `Idle -> Armed -> Recording ->
//! Stopping -> Idle`.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use serde::Serialize;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::domain::message::StatusReport;
use crate::domain::profile::{CaptureProfile, PartialCaptureProfile, Plan, FREE_PLAN_LIMIT_SECS};
use crate::domain::recording::{format_elapsed, Chunk, Duration, RecordingTimer, SessionFilename};
use crate::domain::session::{InvalidStateTransition, SessionMachine, SessionState};

use super::ports::{AcquiredStreams, CaptureError, ChunkTransport, MediaCapture};

/// How long to wait for the recorder to flush after a stop request
const RECORDER_STOP_TIMEOUT: StdDuration = StdDuration::from_secs(5);

/// Capacity of the session event channel
const EVENT_CAPACITY: usize = 64;

/// Errors from the capture session
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    InvalidState(#[from] InvalidStateTransition),

    #[error("Capture acquisition failed: {0}")]
    Acquisition(CaptureError),

    #[error("Capture failed: {0}")]
    Capture(#[from] CaptureError),
}

/// Why a recording stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StopReason {
    /// Explicit stop request
    User,
    /// Free plan time limit reached
    PlanLimit,
    /// Recorder ended on its own
    CaptureFailed,
    /// Process is shutting down
    Shutdown,
}

impl StopReason {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::PlanLimit => "plan-limit",
            Self::CaptureFailed => "capture-failed",
            Self::Shutdown => "shutdown",
        }
    }
}

/// Lifecycle events published by the session
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Armed(AcquiredStreams),
    AcquisitionFailed(String),
    RecordingStarted { filename: SessionFilename },
    Tick { elapsed_ms: u64, display: String },
    Stopping { reason: StopReason },
    Stopped(SessionSummary),
}

/// Outcome of a finished recording
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    pub filename: SessionFilename,
    pub reason: StopReason,
    pub elapsed_ms: u64,
    pub chunks_sent: u64,
    pub chunks_dropped: u64,
    pub finalized: bool,
}

/// What happened to an offered profile
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileOutcome {
    /// Streams acquired for the profile
    Armed(AcquiredStreams),
    /// Same profile as the armed one, nothing to do
    Unchanged,
    /// A recording is in progress; applied once the session is idle
    Queued,
}

/// Result of a timer tick
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// Not recording
    Idle,
    Running { elapsed_ms: u64, display: String },
    /// The recording was stopped by this tick
    Stopped(SessionSummary),
}

/// Capture session settings
#[derive(Debug, Clone, Copy)]
pub struct SessionConfig {
    /// Recorder timeslice
    pub chunk_interval: Duration,
    /// Maximum recording length on the free plan
    pub free_limit: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            chunk_interval: Duration::default_chunk_interval(),
            free_limit: Duration::from_secs(FREE_PLAN_LIMIT_SECS),
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct PumpStats {
    sent: u64,
    dropped: u64,
}

/// The recording in progress
struct ActiveRecording {
    filename: SessionFilename,
    owner: String,
    pump: JoinHandle<PumpStats>,
    abandon: oneshot::Sender<()>,
}

/// Capture session use case
pub struct CaptureSession<C, T>
where
    C: MediaCapture,
    T: ChunkTransport + 'static,
{
    capture: Arc<C>,
    transport: Arc<T>,
    config: SessionConfig,
    machine: SessionMachine,
    timer: RecordingTimer,
    profile: Option<CaptureProfile>,
    pending: Option<CaptureProfile>,
    streams: Option<AcquiredStreams>,
    active: Option<ActiveRecording>,
    events: broadcast::Sender<SessionEvent>,
}

impl<C, T> CaptureSession<C, T>
where
    C: MediaCapture,
    T: ChunkTransport + 'static,
{
    /// Create an idle session
    pub fn new(capture: Arc<C>, transport: Arc<T>, config: SessionConfig) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            capture,
            transport,
            config,
            machine: SessionMachine::new(),
            timer: RecordingTimer::new(),
            profile: None,
            pending: None,
            streams: None,
            active: None,
            events,
        }
    }

    /// Subscribe to session events
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub fn state(&self) -> SessionState {
        self.machine.state()
    }

    /// Profile the current streams were acquired for
    pub fn profile(&self) -> Option<&CaptureProfile> {
        self.profile.as_ref()
    }

    pub fn streams(&self) -> Option<&AcquiredStreams> {
        self.streams.as_ref()
    }

    /// Profile waiting for the current recording to finish
    pub fn pending_profile(&self) -> Option<&CaptureProfile> {
        self.pending.as_ref()
    }

    pub fn filename(&self) -> Option<&SessionFilename> {
        self.active.as_ref().map(|a| &a.filename)
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.timer.elapsed_ms(Instant::now())
    }

    pub fn display(&self) -> String {
        self.timer.display(Instant::now())
    }

    /// Snapshot for status queries
    pub fn status_report(&self, preview: bool) -> StatusReport {
        let elapsed_ms = self.elapsed_ms();
        StatusReport {
            state: self.state(),
            elapsed_ms,
            display: format_elapsed(elapsed_ms),
            filename: self.filename().map(|f| f.to_string()),
            preview,
            profile: self
                .profile
                .clone()
                .or_else(|| self.pending.clone())
                .map(PartialCaptureProfile::from),
        }
    }

    fn emit(&self, event: SessionEvent) {
        // No receivers is fine
        let _ = self.events.send(event);
    }

    /// Apply a complete profile.
    ///
    /// Idle: acquire streams. Armed: re-acquire if the profile differs.
    /// Recording or Stopping: queue it, replacing any earlier queued one.
    ///
    /// Dropping the returned future during acquisition leaves the session
    /// idle; call [`Self::cancel_acquisition`] afterwards to release whatever
    /// the backend had already opened.
    pub async fn apply_profile(
        &mut self,
        profile: CaptureProfile,
    ) -> Result<ProfileOutcome, SessionError> {
        match self.state() {
            SessionState::Recording | SessionState::Stopping => {
                debug!(session_id = profile.session_id(), "queueing profile until idle");
                self.pending = Some(profile);
                return Ok(ProfileOutcome::Queued);
            }
            SessionState::Armed => {
                if self.profile.as_ref() == Some(&profile) {
                    return Ok(ProfileOutcome::Unchanged);
                }
                info!("profile changed, re-acquiring streams");
                self.disarm().await?;
            }
            SessionState::Idle => {}
        }

        let streams = match self.capture.acquire(&profile).await {
            Ok(streams) => streams,
            Err(e) => {
                warn!(error = %e, "stream acquisition failed");
                if let Err(release_err) = self.capture.release().await {
                    warn!(error = %release_err, "release after failed acquisition failed");
                }
                self.emit(SessionEvent::AcquisitionFailed(e.to_string()));
                return Err(SessionError::Acquisition(e));
            }
        };

        self.machine.arm()?;
        info!(
            session_id = profile.session_id(),
            video = %streams.video.constraints,
            screen = %streams.video.name,
            audio = %streams.audio.label,
            "session armed"
        );
        self.profile = Some(profile);
        self.streams = Some(streams.clone());
        self.emit(SessionEvent::Armed(streams.clone()));
        Ok(ProfileOutcome::Armed(streams))
    }

    /// Release anything a cancelled acquisition may have opened
    pub async fn cancel_acquisition(&mut self) {
        if self.machine.is_idle() {
            if let Err(e) = self.capture.release().await {
                warn!(error = %e, "release after cancelled acquisition failed");
            }
        }
    }

    /// Release streams without recording
    pub async fn disarm(&mut self) -> Result<(), SessionError> {
        self.machine.disarm()?;
        self.profile = None;
        self.streams = None;
        self.capture.release().await?;
        info!("session disarmed");
        Ok(())
    }

    /// Start recording. Requires Armed.
    pub async fn start(&mut self) -> Result<SessionFilename, SessionError> {
        self.machine.start_recording()?;

        let (session_id, plan) = match self.profile.as_ref() {
            Some(profile) => (profile.session_id().to_string(), profile.plan()),
            None => {
                self.machine.revert_start()?;
                return Err(CaptureError::NotAcquired.into());
            }
        };

        let chunks = match self.capture.start_recorder(self.config.chunk_interval).await {
            Ok(rx) => rx,
            Err(e) => {
                warn!(error = %e, "recorder failed to start");
                self.machine.revert_start()?;
                return Err(e.into());
            }
        };

        let filename = SessionFilename::generate(&session_id);
        self.timer.reset();
        self.timer.start(Instant::now());

        let (abandon, abandoned) = oneshot::channel();
        let pump = tokio::spawn(pump_chunks(
            Arc::clone(&self.transport),
            filename.clone(),
            chunks,
            abandoned,
        ));
        self.active = Some(ActiveRecording {
            filename: filename.clone(),
            owner: session_id,
            pump,
            abandon,
        });

        info!(%filename, plan = %plan, "recording started");
        self.emit(SessionEvent::RecordingStarted {
            filename: filename.clone(),
        });
        Ok(filename)
    }

    /// Advance the timer. Stops the recording when the plan limit is reached
    /// or the recorder ended on its own.
    pub async fn tick(&mut self) -> Result<TickOutcome, SessionError> {
        if !self.machine.is_recording() {
            return Ok(TickOutcome::Idle);
        }

        let elapsed_ms = self.elapsed_ms();
        let shown = format_elapsed(elapsed_ms);
        self.emit(SessionEvent::Tick {
            elapsed_ms,
            display: shown.clone(),
        });

        if self.limit_reached(elapsed_ms) {
            info!(elapsed = %shown, "plan limit reached");
            let summary = self.stop(StopReason::PlanLimit).await?;
            return Ok(TickOutcome::Stopped(summary));
        }

        if self.active.as_ref().is_some_and(|a| a.pump.is_finished()) {
            warn!("recorder ended unexpectedly");
            let summary = self.stop(StopReason::CaptureFailed).await?;
            return Ok(TickOutcome::Stopped(summary));
        }

        Ok(TickOutcome::Running {
            elapsed_ms,
            display: shown,
        })
    }

    fn limit_reached(&self, elapsed_ms: u64) -> bool {
        match self.profile.as_ref().map(|p| p.plan()) {
            Some(Plan::Free) => elapsed_ms >= self.config.free_limit.as_millis(),
            _ => false,
        }
    }

    /// Stop recording, release the streams and finalize the remote file.
    ///
    /// Finalize is sent once, after the chunk pump has accounted for every
    /// chunk the recorder produced.
    pub async fn stop(&mut self, reason: StopReason) -> Result<SessionSummary, SessionError> {
        self.machine.begin_stopping()?;
        let elapsed_ms = self.timer.stop(Instant::now());
        info!(reason = reason.as_str(), elapsed = %format_elapsed(elapsed_ms), "stopping recording");
        self.emit(SessionEvent::Stopping { reason });

        if let Err(e) = self.capture.stop_recorder().await {
            warn!(error = %e, "recorder stop failed");
        }

        let stats = match self.active.take() {
            Some(active) => {
                let stats = drain_pump(active.pump, active.abandon).await;
                Some((active.filename, active.owner, stats))
            }
            None => None,
        };

        if let Err(e) = self.capture.release().await {
            warn!(error = %e, "stream release failed");
        }
        self.streams = None;
        let finished = self.profile.take();
        if self.pending.is_none() {
            self.pending = finished;
        }

        let summary = match stats {
            Some((filename, owner, stats)) => {
                let finalized = match self.transport.finalize(&filename, &owner).await {
                    Ok(()) => true,
                    Err(e) => {
                        warn!(%filename, error = %e, "finalize failed");
                        false
                    }
                };
                SessionSummary {
                    filename,
                    reason,
                    elapsed_ms,
                    chunks_sent: stats.sent,
                    chunks_dropped: stats.dropped,
                    finalized,
                }
            }
            None => {
                self.machine.abort();
                self.timer.reset();
                return Err(CaptureError::NotAcquired.into());
            }
        };

        self.timer.reset();
        self.machine.finish_stopping()?;
        info!(
            filename = %summary.filename,
            sent = summary.chunks_sent,
            dropped = summary.chunks_dropped,
            "recording stopped"
        );
        self.emit(SessionEvent::Stopped(summary.clone()));
        Ok(summary)
    }

    /// Profile to arm next: the one queued during the last recording, or
    /// the profile that recording used
    pub fn take_next_profile(&mut self) -> Option<CaptureProfile> {
        self.pending.take()
    }

    /// Stop any recording and release devices
    pub async fn shutdown(&mut self) -> Option<SessionSummary> {
        let summary = match self.state() {
            SessionState::Recording => match self.stop(StopReason::Shutdown).await {
                Ok(summary) => Some(summary),
                Err(e) => {
                    warn!(error = %e, "stop during shutdown failed");
                    None
                }
            },
            SessionState::Armed => {
                if let Err(e) = self.disarm().await {
                    warn!(error = %e, "disarm during shutdown failed");
                }
                None
            }
            SessionState::Idle | SessionState::Stopping => None,
        };
        self.pending = None;
        summary
    }
}

/// Ship recorder output in production order until the recorder closes.
///
/// When `abandoned` fires the chunk in flight and everything still queued
/// are counted as dropped.
async fn pump_chunks<T: ChunkTransport>(
    transport: Arc<T>,
    filename: SessionFilename,
    mut chunks: mpsc::Receiver<Vec<u8>>,
    mut abandoned: oneshot::Receiver<()>,
) -> PumpStats {
    let mut stats = PumpStats::default();
    let mut sequence = 0u64;

    loop {
        let payload = tokio::select! {
            biased;
            _ = &mut abandoned => break,
            next = chunks.recv() => match next {
                Some(payload) => payload,
                None => return stats,
            },
        };
        if payload.is_empty() {
            continue;
        }
        let chunk = Chunk::new(filename.clone(), sequence, payload);
        sequence += 1;

        let sent = tokio::select! {
            biased;
            _ = &mut abandoned => {
                stats.dropped += 1;
                break;
            }
            sent = transport.send_chunk(&chunk) => sent,
        };
        match sent {
            Ok(()) => {
                stats.sent += 1;
                debug!(sequence = chunk.sequence, bytes = chunk.len(), "chunk sent");
            }
            Err(e) => {
                stats.dropped += 1;
                warn!(sequence = chunk.sequence, error = %e, "chunk dropped");
            }
        }
    }

    chunks.close();
    while let Ok(payload) = chunks.try_recv() {
        if !payload.is_empty() {
            stats.dropped += 1;
        }
    }
    stats
}

/// Wait for the pump to drain, abandoning what is left if the recorder
/// never closes
async fn drain_pump(mut pump: JoinHandle<PumpStats>, abandon: oneshot::Sender<()>) -> PumpStats {
    let joined = match tokio::time::timeout(RECORDER_STOP_TIMEOUT, &mut pump).await {
        Ok(joined) => joined,
        Err(_) => {
            if abandon.send(()).is_err() {
                debug!("chunk pump finished while abandoning");
            }
            let joined = pump.await;
            if let Ok(stats) = &joined {
                warn!(
                    sent = stats.sent,
                    dropped = stats.dropped,
                    "recorder did not close in time, remaining chunks dropped"
                );
            }
            joined
        }
    };

    joined.unwrap_or_else(|e| {
        warn!(error = %e, "chunk pump failed");
        PumpStats::default()
    })
}
