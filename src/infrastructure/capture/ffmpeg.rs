//! ffmpeg-backed media capture adapter

use std::process::Stdio;
use std::time::Duration as StdDuration;

use async_trait::async_trait;
#[cfg(unix)]
use nix::sys::signal::{self, Signal};
#[cfg(unix)]
use nix::unistd::Pid;
use tokio::process::{Child, Command};
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info, warn};

use crate::application::ports::{
    AcquiredStreams, AudioTrack, CaptureError, DeviceEnumerator, MediaCapture, VideoTrack,
};
use crate::domain::devices::SourceRef;
use crate::domain::profile::CaptureProfile;
use crate::domain::recording::Duration;

use super::args::{CaptureArgs, VideoInput};
use super::slicer::slice_stream;

/// Slices buffered between the pump and the session
const SLICE_QUEUE: usize = 32;

/// Grace period for ffmpeg to write its trailer after SIGINT
const STOP_GRACE: StdDuration = StdDuration::from_secs(5);

/// Upper bound for the device open check
const OPEN_TIMEOUT: StdDuration = StdDuration::from_secs(10);

/// Streams bound by a successful acquire
struct Bound {
    streams: AcquiredStreams,
    args: CaptureArgs,
}

#[derive(Default)]
struct CaptureState {
    bound: Option<Bound>,
    recorder: Option<Child>,
}

/// Captures a monitor or window plus one microphone through ffmpeg
pub struct FfmpegCapture<E: DeviceEnumerator> {
    enumerator: E,
    display: String,
    program: String,
    state: Mutex<CaptureState>,
}

impl<E: DeviceEnumerator> FfmpegCapture<E> {
    pub fn new(enumerator: E, display: impl Into<String>) -> Self {
        Self {
            enumerator,
            display: display.into(),
            program: "ffmpeg".to_string(),
            state: Mutex::new(CaptureState::default()),
        }
    }

    /// Use a different ffmpeg binary
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Open the bound display and microphone once so acquisition fails
    /// when either is unavailable
    async fn open_inputs(&self, args: &CaptureArgs) -> Result<(), CaptureError> {
        let check = args.open_check();
        debug!(args = ?check, "opening capture inputs");

        let run = Command::new(&self.program)
            .args(&check)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();

        let output = tokio::time::timeout(OPEN_TIMEOUT, run)
            .await
            .map_err(|_| {
                CaptureError::AcquisitionFailed("timed out opening capture devices".to_string())
            })?
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    CaptureError::AcquisitionFailed(format!("{} not found", self.program))
                } else {
                    CaptureError::AcquisitionFailed(e.to_string())
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let reason = stderr
                .lines()
                .rev()
                .find(|l| !l.trim().is_empty())
                .map(|l| l.trim().to_string())
                .unwrap_or_else(|| format!("{} exited with {}", self.program, output.status));
            return Err(CaptureError::AcquisitionFailed(reason));
        }
        Ok(())
    }

    async fn bind(&self, profile: &CaptureProfile) -> Result<Bound, CaptureError> {
        let sources = self
            .enumerator
            .list_sources()
            .await
            .map_err(|e| CaptureError::AcquisitionFailed(e.to_string()))?;

        let screen = sources
            .screen_or_first(profile.screen_source_id())
            .ok_or(CaptureError::NoScreenSource)?;
        if screen.id != profile.screen_source_id() {
            warn!(
                requested = profile.screen_source_id(),
                using = %screen.id,
                "screen source not found, falling back"
            );
        }

        let audio = sources
            .audio_or_first(profile.audio_device_id())
            .ok_or(CaptureError::NoAudioInput)?;
        if audio.device_id != profile.audio_device_id() {
            warn!(
                requested = profile.audio_device_id(),
                using = %audio.device_id,
                "audio input not found, falling back"
            );
        }

        let source: SourceRef = screen
            .id
            .parse()
            .map_err(|e: crate::domain::devices::InvalidSourceId| {
                CaptureError::AcquisitionFailed(e.to_string())
            })?;

        let video = match source {
            SourceRef::Window(id) => VideoInput::Window(id),
            SourceRef::Screen(_) => VideoInput::Region(screen.geometry.ok_or_else(|| {
                CaptureError::AcquisitionFailed(format!("no geometry for {}", screen.id))
            })?),
        };

        Ok(Bound {
            streams: AcquiredStreams {
                video: VideoTrack {
                    source_id: screen.id.clone(),
                    name: screen.name.clone(),
                    constraints: profile.video_constraints(),
                },
                audio: AudioTrack {
                    device_id: audio.device_id.clone(),
                    label: audio.label.clone(),
                },
            },
            args: CaptureArgs {
                display: self.display.clone(),
                video,
                audio_device: audio.device_id.clone(),
                preset: profile.preset(),
            },
        })
    }

    /// Ask ffmpeg to finish the container and exit
    fn interrupt(child: &mut Child) -> Result<(), CaptureError> {
        #[cfg(unix)]
        {
            if let Some(id) = child.id() {
                return signal::kill(Pid::from_raw(id as i32), Signal::SIGINT).map_err(|e| {
                    CaptureError::RecorderStopFailed(format!("Signal failed: {}", e))
                });
            }
            Ok(())
        }
        #[cfg(not(unix))]
        {
            child
                .start_kill()
                .map_err(|e| CaptureError::RecorderStopFailed(e.to_string()))
        }
    }
}

#[async_trait]
impl<E: DeviceEnumerator> MediaCapture for FfmpegCapture<E> {
    async fn acquire(&self, profile: &CaptureProfile) -> Result<AcquiredStreams, CaptureError> {
        {
            let state = self.state.lock().await;
            if state.recorder.is_some() {
                return Err(CaptureError::RecorderRunning);
            }
        }

        let bound = self.bind(profile).await?;
        self.open_inputs(&bound.args).await?;
        let streams = bound.streams.clone();

        info!(
            video = %streams.video.source_id,
            audio = %streams.audio.device_id,
            constraints = %streams.video.constraints,
            "streams acquired"
        );
        self.state.lock().await.bound = Some(bound);
        Ok(streams)
    }

    async fn start_recorder(
        &self,
        timeslice: Duration,
    ) -> Result<mpsc::Receiver<Vec<u8>>, CaptureError> {
        let mut state = self.state.lock().await;
        if state.recorder.is_some() {
            return Err(CaptureError::RecorderRunning);
        }
        let bound = state.bound.as_ref().ok_or(CaptureError::NotAcquired)?;

        let args = bound.args.build();
        debug!(args = ?args, "spawning ffmpeg");

        let mut child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    CaptureError::RecorderStartFailed(format!("{} not found", self.program))
                } else {
                    CaptureError::RecorderStartFailed(e.to_string())
                }
            })?;

        let stdout = child.stdout.take().ok_or_else(|| {
            CaptureError::RecorderStartFailed("ffmpeg stdout unavailable".to_string())
        })?;

        let (tx, rx) = mpsc::channel(SLICE_QUEUE);
        tokio::spawn(slice_stream(stdout, timeslice.as_std(), tx));

        state.recorder = Some(child);
        Ok(rx)
    }

    async fn stop_recorder(&self) -> Result<(), CaptureError> {
        let Some(mut child) = self.state.lock().await.recorder.take() else {
            return Ok(());
        };

        Self::interrupt(&mut child)?;

        match tokio::time::timeout(STOP_GRACE, child.wait()).await {
            Ok(Ok(status)) => {
                debug!(%status, "ffmpeg exited");
                Ok(())
            }
            Ok(Err(e)) => Err(CaptureError::RecorderStopFailed(e.to_string())),
            Err(_) => {
                warn!("ffmpeg ignored SIGINT, killing");
                child
                    .kill()
                    .await
                    .map_err(|e| CaptureError::RecorderStopFailed(e.to_string()))
            }
        }
    }

    async fn release(&self) -> Result<(), CaptureError> {
        let mut state = self.state.lock().await;
        if let Some(mut child) = state.recorder.take() {
            let _ = child.kill().await;
        }
        if state.bound.take().is_some() {
            debug!("streams released");
        }
        Ok(())
    }
}
