//! Studio surface
//!
//! The recording surface. It receives profiles from the profile channel,
//! drives the capture session and its timer, and asks the coordinator to
//! adjust the other surfaces whenever the session state or the preview
//! toggle changes.

use std::time::Duration as StdDuration;

use tokio::sync::broadcast;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::domain::message::{Message, Reply, StatusReport, StudioAction};
use crate::domain::profile::{CaptureProfile, PartialCaptureProfile};
use crate::domain::recording::ZERO_DISPLAY;
use crate::domain::session::SessionState;
use crate::domain::visibility::VisibilityPlan;

use super::capture_session::{
    CaptureSession, ProfileOutcome, SessionEvent, SessionSummary, StopReason, TickOutcome,
};
use super::coordinator::{Envelope, SurfaceLink};
use super::ports::{ChunkTransport, MediaCapture, NotificationIcon, Notifier};
use super::profile_channel::ProfileSubscription;

/// Timer tick period
const TICK_PERIOD: StdDuration = StdDuration::from_secs(1);

const NOTIFY_TITLE: &str = "Studio Recorder";

/// What interrupted an acquisition
enum Interrupt {
    /// A newer profile arrived
    Profile(CaptureProfile),
    /// Stop requested while acquiring
    Cancel,
    /// The coordinator dropped this surface
    Closed,
}

/// Studio surface actor
pub struct StudioSurface<C, T, N>
where
    C: MediaCapture,
    T: ChunkTransport + 'static,
    N: Notifier,
{
    link: SurfaceLink,
    profiles: ProfileSubscription,
    session: CaptureSession<C, T>,
    notifier: N,
    notify: bool,
    preview: bool,
    closed: bool,
}

impl<C, T, N> StudioSurface<C, T, N>
where
    C: MediaCapture,
    T: ChunkTransport + 'static,
    N: Notifier,
{
    pub fn new(
        link: SurfaceLink,
        profiles: ProfileSubscription,
        session: CaptureSession<C, T>,
        notifier: N,
        notify: bool,
    ) -> Self {
        Self {
            link,
            profiles,
            session,
            notifier,
            notify,
            preview: false,
            closed: false,
        }
    }

    /// Subscribe to the session's lifecycle events
    pub fn events(&self) -> broadcast::Receiver<SessionEvent> {
        self.session.subscribe()
    }

    /// Run until the coordinator drops this surface, then release devices
    pub async fn run(mut self) {
        if let Err(e) = self.link.bus.send(Message::StudioReady).await {
            warn!(error = %e, "could not announce studio surface");
        }
        self.sync_visibility().await;

        let mut ticker = tokio::time::interval(TICK_PERIOD);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        while !self.closed {
            let recording = self.session.state() == SessionState::Recording;
            tokio::select! {
                envelope = self.link.inbox.recv() => match envelope {
                    Some(envelope) => self.handle(envelope).await,
                    None => self.closed = true,
                },
                Some(profile) = self.profiles.recv() => {
                    let profile = self.profiles.latest().unwrap_or(profile);
                    self.acquire(profile).await;
                }
                _ = ticker.tick(), if recording => self.on_tick().await,
            }
        }

        if let Some(summary) = self.session.shutdown().await {
            info!(filename = %summary.filename, "recording stopped on shutdown");
        }
        debug!("studio surface stopped");
    }

    async fn handle(&mut self, envelope: Envelope) {
        let (message, responder) = envelope.into_parts();
        let reply = match message {
            Message::StudioAction { action } => self.perform(action).await,
            Message::StudioStatus => Reply::Status(self.session.status_report(self.preview)),
            other => Reply::error(format!("Studio surface cannot handle {}", other.name())),
        };
        responder.respond(reply);
    }

    async fn perform(&mut self, action: StudioAction) -> Reply {
        match action {
            StudioAction::Start => match self.session.start().await {
                Ok(filename) => {
                    self.sync_visibility().await;
                    self.notify("Recording started", NotificationIcon::Recording)
                        .await;
                    debug!(%filename, "start acknowledged");
                    Reply::Ack
                }
                Err(e) => {
                    warn!(error = %e, "start rejected");
                    Reply::error(e.to_string())
                }
            },
            StudioAction::Stop => match self.session.stop(StopReason::User).await {
                Ok(summary) => {
                    self.after_stop(summary).await;
                    Reply::Ack
                }
                Err(e) => {
                    warn!(error = %e, "stop rejected");
                    Reply::error(e.to_string())
                }
            },
            StudioAction::TogglePreview => {
                self.preview = !self.preview;
                self.sync_visibility().await;
                Reply::Ack
            }
        }
    }

    async fn on_tick(&mut self) {
        match self.session.tick().await {
            Ok(TickOutcome::Running { display: shown, .. }) => debug!(elapsed = %shown, "tick"),
            Ok(TickOutcome::Stopped(summary)) => self.after_stop(summary).await,
            Ok(TickOutcome::Idle) => {}
            Err(e) => warn!(error = %e, "timer tick failed"),
        }
    }

    async fn after_stop(&mut self, summary: SessionSummary) {
        self.sync_visibility().await;

        match summary.reason {
            StopReason::PlanLimit => {
                self.notify(
                    "Free plan limit reached, recording stopped",
                    NotificationIcon::Stopped,
                )
                .await
            }
            StopReason::CaptureFailed => {
                self.notify("Recording stopped unexpectedly", NotificationIcon::Error)
                    .await
            }
            StopReason::User | StopReason::Shutdown => {}
        }
        if summary.chunks_dropped > 0 {
            self.notify(
                &format!("{} chunks could not be uploaded", summary.chunks_dropped),
                NotificationIcon::Warning,
            )
            .await;
        }

        if let Some(next) = self.session.take_next_profile() {
            self.acquire(next).await;
        }
    }

    /// Acquire streams for a profile while staying responsive.
    ///
    /// A newer profile replaces the one being acquired, a stop request cancels
    /// the acquisition, and status queries are answered in between.
    async fn acquire(&mut self, profile: CaptureProfile) {
        let mut next = Some(profile);

        while let Some(profile) = next.take() {
            let interrupt = {
                let apply = self.session.apply_profile(profile.clone());
                tokio::pin!(apply);

                loop {
                    tokio::select! {
                        result = &mut apply => {
                            match result {
                                Ok(ProfileOutcome::Armed(streams)) => {
                                    debug!(screen = %streams.video.source_id, "armed");
                                }
                                Ok(ProfileOutcome::Unchanged) => {}
                                Ok(ProfileOutcome::Queued) => {
                                    debug!("profile queued until recording ends");
                                }
                                Err(e) => {
                                    warn!(error = %e, "could not arm session");
                                    if self.notify {
                                        if let Err(e) = self
                                            .notifier
                                            .notify(
                                                NOTIFY_TITLE,
                                                "Could not access the screen or microphone",
                                                NotificationIcon::Error,
                                            )
                                            .await
                                        {
                                            debug!(error = %e, "notification failed");
                                        }
                                    }
                                }
                            }
                            break None;
                        }
                        Some(newer) = self.profiles.recv() => {
                            let newer = self.profiles.latest().unwrap_or(newer);
                            break Some(Interrupt::Profile(newer));
                        }
                        envelope = self.link.inbox.recv() => match envelope {
                            None => break Some(Interrupt::Closed),
                            Some(envelope) => {
                                if let Some(interrupt) =
                                    answer_while_acquiring(envelope, &profile, &mut self.preview)
                                {
                                    break Some(interrupt);
                                }
                            }
                        },
                    }
                }
            };

            match interrupt {
                None => {}
                Some(Interrupt::Profile(newer)) => {
                    debug!("newer profile arrived, restarting acquisition");
                    self.session.cancel_acquisition().await;
                    next = Some(newer);
                }
                Some(Interrupt::Cancel) => {
                    info!("acquisition cancelled");
                    self.session.cancel_acquisition().await;
                }
                Some(Interrupt::Closed) => {
                    self.session.cancel_acquisition().await;
                    self.closed = true;
                }
            }
        }

        self.sync_visibility().await;
    }

    /// Ask the coordinator to match the surfaces to the current state
    async fn sync_visibility(&self) {
        let plan = VisibilityPlan::derive(self.session.state(), self.preview);
        let requests = [
            Message::HidePlugin {
                state: plan.control_hidden,
            },
            Message::ResizeStudio {
                shrink: plan.studio_size.is_shrunk(),
            },
            Message::PreviewOverlay {
                visible: plan.preview_overlay,
            },
        ];
        for request in requests {
            if let Err(e) = self.link.bus.send(request).await {
                debug!(error = %e, "visibility request not delivered");
                return;
            }
        }
    }

    async fn notify(&self, message: &str, icon: NotificationIcon) {
        if !self.notify {
            return;
        }
        if let Err(e) = self.notifier.notify(NOTIFY_TITLE, message, icon).await {
            debug!(error = %e, "notification failed");
        }
    }
}

/// Answer a message that arrives while streams are being acquired.
/// Returns an interrupt when the acquisition must stop.
fn answer_while_acquiring(
    envelope: Envelope,
    profile: &CaptureProfile,
    preview: &mut bool,
) -> Option<Interrupt> {
    let (message, responder) = envelope.into_parts();
    match message {
        Message::StudioAction {
            action: StudioAction::Stop,
        } => {
            responder.respond(Reply::Ack);
            Some(Interrupt::Cancel)
        }
        Message::StudioAction {
            action: StudioAction::Start,
        } => {
            responder.respond(Reply::error("Capture devices are still being acquired"));
            None
        }
        Message::StudioAction {
            action: StudioAction::TogglePreview,
        } => {
            *preview = !*preview;
            responder.respond(Reply::Ack);
            None
        }
        Message::StudioStatus => {
            responder.respond(Reply::Status(StatusReport {
                state: SessionState::Idle,
                elapsed_ms: 0,
                display: ZERO_DISPLAY.to_string(),
                filename: None,
                preview: *preview,
                profile: Some(PartialCaptureProfile::from(profile.clone())),
            }));
            None
        }
        other => {
            responder.respond(Reply::error(format!(
                "Studio surface cannot handle {}",
                other.name()
            )));
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::capture_session::SessionConfig;
    use crate::application::coordinator::{BusHandle, Coordinator, CoordinatorExit, LifecyclePolicy};
    use crate::application::ports::{
        AcquiredStreams, AudioTrack, CaptureError, DeviceEnumerator, EnumerationError,
        NotificationError, TransportError, VideoTrack, WindowError, WindowHost,
    };
    use crate::domain::devices::MediaSources;
    use crate::domain::profile::{Plan, Preset};
    use crate::domain::recording::{Chunk, Duration, SessionFilename};
    use crate::domain::visibility::{SizeClass, Surface};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use tokio::sync::{mpsc, Semaphore};
    use tokio::task::JoinHandle;

    /// Recorder that produces one chunk per timeslice on the tokio clock
    struct TimedCapture {
        producer: Mutex<Option<JoinHandle<()>>>,
        stop: Mutex<Option<mpsc::Sender<()>>>,
    }

    impl TimedCapture {
        fn new() -> Self {
            Self {
                producer: Mutex::new(None),
                stop: Mutex::new(None),
            }
        }
    }

    #[async_trait]
    impl MediaCapture for TimedCapture {
        async fn acquire(
            &self,
            profile: &CaptureProfile,
        ) -> Result<AcquiredStreams, CaptureError> {
            Ok(AcquiredStreams {
                video: VideoTrack {
                    source_id: profile.screen_source_id().to_string(),
                    name: "HDMI-1".to_string(),
                    constraints: profile.video_constraints(),
                },
                audio: AudioTrack {
                    device_id: profile.audio_device_id().to_string(),
                    label: "USB Mic".to_string(),
                },
            })
        }

        async fn start_recorder(
            &self,
            timeslice: Duration,
        ) -> Result<mpsc::Receiver<Vec<u8>>, CaptureError> {
            let (tx, rx) = mpsc::channel(8);
            let (stop_tx, mut stop_rx) = mpsc::channel::<()>(1);
            let period = timeslice.as_std();
            let producer = tokio::spawn(async move {
                let mut n = 0u8;
                loop {
                    tokio::select! {
                        _ = tokio::time::sleep(period) => {
                            n = n.wrapping_add(1);
                            if tx.send(vec![n]).await.is_err() {
                                return;
                            }
                        }
                        _ = stop_rx.recv() => {
                            let _ = tx.send(b"flush".to_vec()).await;
                            return;
                        }
                    }
                }
            });
            *self.producer.lock().unwrap() = Some(producer);
            *self.stop.lock().unwrap() = Some(stop_tx);
            Ok(rx)
        }

        async fn stop_recorder(&self) -> Result<(), CaptureError> {
            let stop = self.stop.lock().unwrap().take();
            if let Some(stop) = stop {
                let _ = stop.send(()).await;
            }
            let producer = self.producer.lock().unwrap().take();
            if let Some(producer) = producer {
                let _ = producer.await;
            }
            Ok(())
        }

        async fn release(&self) -> Result<(), CaptureError> {
            Ok(())
        }
    }

    /// Capture whose acquisition waits until the test lets it through
    struct GatedCapture {
        gate: Semaphore,
        refuse: AtomicBool,
        attempts: Mutex<Vec<String>>,
        recorders: AtomicUsize,
        releases: AtomicUsize,
    }

    impl GatedCapture {
        fn new() -> Self {
            Self {
                gate: Semaphore::new(0),
                refuse: AtomicBool::new(false),
                attempts: Mutex::new(Vec::new()),
                recorders: AtomicUsize::new(0),
                releases: AtomicUsize::new(0),
            }
        }

        fn refusing() -> Self {
            let capture = Self::new();
            capture.refuse.store(true, Ordering::SeqCst);
            capture.gate.add_permits(Semaphore::MAX_PERMITS);
            capture
        }

        fn let_through(&self) {
            self.gate.add_permits(1);
        }

        fn attempts(&self) -> Vec<String> {
            self.attempts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl MediaCapture for GatedCapture {
        async fn acquire(
            &self,
            profile: &CaptureProfile,
        ) -> Result<AcquiredStreams, CaptureError> {
            self.attempts
                .lock()
                .unwrap()
                .push(profile.session_id().to_string());
            self.gate
                .acquire()
                .await
                .map_err(|e| CaptureError::AcquisitionFailed(e.to_string()))?
                .forget();
            if self.refuse.load(Ordering::SeqCst) {
                return Err(CaptureError::AcquisitionFailed("permission denied".to_string()));
            }
            TimedCapture::new().acquire(profile).await
        }

        async fn start_recorder(
            &self,
            _timeslice: Duration,
        ) -> Result<mpsc::Receiver<Vec<u8>>, CaptureError> {
            self.recorders.fetch_add(1, Ordering::SeqCst);
            let (_tx, rx) = mpsc::channel(1);
            Ok(rx)
        }

        async fn stop_recorder(&self) -> Result<(), CaptureError> {
            Ok(())
        }

        async fn release(&self) -> Result<(), CaptureError> {
            self.releases.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[derive(Default)]
    struct CountingTransport {
        chunks: AtomicUsize,
        finalized: AtomicUsize,
    }

    #[async_trait]
    impl ChunkTransport for CountingTransport {
        fn is_connected(&self) -> bool {
            true
        }

        async fn send_chunk(&self, _chunk: &Chunk) -> Result<(), TransportError> {
            self.chunks.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn finalize(
            &self,
            _filename: &SessionFilename,
            _owner: &str,
        ) -> Result<(), TransportError> {
            self.finalized.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct NoDevices;

    #[async_trait]
    impl DeviceEnumerator for NoDevices {
        async fn list_sources(&self) -> Result<MediaSources, EnumerationError> {
            Ok(MediaSources::default())
        }
    }

    #[derive(Default, Clone)]
    struct LogHost {
        calls: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl WindowHost for LogHost {
        async fn set_hidden(&self, surface: Surface, hidden: bool) -> Result<(), WindowError> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("hidden {} {}", surface, hidden));
            Ok(())
        }
        async fn resize(&self, surface: Surface, size: SizeClass) -> Result<(), WindowError> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("resize {} {:?}", surface, size));
            Ok(())
        }
        async fn set_overlay_visible(
            &self,
            surface: Surface,
            visible: bool,
        ) -> Result<(), WindowError> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("overlay {} {}", surface, visible));
            Ok(())
        }
        async fn close(&self, _surface: Surface) -> Result<(), WindowError> {
            Ok(())
        }
    }

    struct SilentNotifier;

    #[async_trait]
    impl Notifier for SilentNotifier {
        async fn notify(
            &self,
            _title: &str,
            _message: &str,
            _icon: NotificationIcon,
        ) -> Result<(), NotificationError> {
            Ok(())
        }
    }

    /// Notifier that records every message and then fails
    #[derive(Default, Clone)]
    struct BrokenNotifier {
        messages: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl Notifier for BrokenNotifier {
        async fn notify(
            &self,
            _title: &str,
            message: &str,
            _icon: NotificationIcon,
        ) -> Result<(), NotificationError> {
            self.messages.lock().unwrap().push(message.to_string());
            Err(NotificationError::SendFailed("no notification daemon".to_string()))
        }
    }

    struct Harness {
        bus: BusHandle,
        host: LogHost,
        transport: Arc<CountingTransport>,
        events: broadcast::Receiver<SessionEvent>,
        studio: JoinHandle<()>,
        coordinator: JoinHandle<CoordinatorExit>,
    }

    fn harness() -> Harness {
        harness_with(Arc::new(TimedCapture::new()), SilentNotifier, false)
    }

    fn harness_with<C, N>(capture: Arc<C>, notifier: N, notify: bool) -> Harness
    where
        C: MediaCapture + 'static,
        N: Notifier + 'static,
    {
        let host = LogHost::default();
        let mut coordinator = Coordinator::new(NoDevices, host.clone(), LifecyclePolicy::default());
        let link = coordinator.attach(Surface::Studio);
        let profiles = coordinator.profiles().subscribe();
        let bus = coordinator.handle();

        let transport = Arc::new(CountingTransport::default());
        let session = CaptureSession::new(capture, Arc::clone(&transport), SessionConfig::default());
        let studio = StudioSurface::new(link, profiles, session, notifier, notify);
        let events = studio.events();

        Harness {
            bus,
            host,
            transport,
            events,
            studio: tokio::spawn(studio.run()),
            coordinator: tokio::spawn(coordinator.run()),
        }
    }

    fn profile(plan: Plan) -> PartialCaptureProfile {
        profile_for("s1", plan)
    }

    fn profile_for(session_id: &str, plan: Plan) -> PartialCaptureProfile {
        PartialCaptureProfile::from(CaptureProfile::new(
            session_id,
            "screen:1:0",
            "mic-1",
            Preset::Sd,
            plan,
        ))
    }

    async fn status(bus: &BusHandle) -> StatusReport {
        match bus.request(Message::StudioStatus).await.unwrap() {
            Reply::Status(report) => report,
            other => panic!("unexpected reply: {:?}", other),
        }
    }

    async fn next_event(events: &mut broadcast::Receiver<SessionEvent>) -> SessionEvent {
        loop {
            match events.recv().await {
                Ok(event) => return event,
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => panic!("session event channel closed"),
            }
        }
    }

    async fn wait_armed(events: &mut broadcast::Receiver<SessionEvent>) {
        loop {
            if let SessionEvent::Armed(_) = next_event(events).await {
                return;
            }
        }
    }

    async fn wait_stopped(events: &mut broadcast::Receiver<SessionEvent>) -> SessionSummary {
        loop {
            if let SessionEvent::Stopped(summary) = next_event(events).await {
                return summary;
            }
        }
    }

    async fn action(bus: &BusHandle, action: StudioAction) -> Reply {
        bus.request(Message::StudioAction { action }).await.unwrap()
    }

    async fn wait_attempts(capture: &GatedCapture, count: usize) {
        while capture.attempts().len() < count {
            tokio::time::sleep(StdDuration::from_millis(10)).await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn pro_recording_hides_control_and_restores_it() {
        let mut h = harness();
        h.bus.send(Message::ProfileReceived(profile(Plan::Pro))).await.unwrap();
        wait_armed(&mut h.events).await;

        assert_eq!(action(&h.bus, StudioAction::Start).await, Reply::Ack);
        assert_eq!(status(&h.bus).await.state, SessionState::Recording);

        tokio::time::sleep(StdDuration::from_millis(4500)).await;
        assert_eq!(action(&h.bus, StudioAction::Stop).await, Reply::Ack);

        let report = status(&h.bus).await;
        assert_ne!(report.state, SessionState::Recording);
        assert_eq!(report.display, "00:00:00");

        assert_eq!(h.transport.chunks.load(Ordering::SeqCst), 5);
        assert_eq!(h.transport.finalized.load(Ordering::SeqCst), 1);

        let calls = h.host.calls.lock().unwrap().clone();
        let hidden_at = calls.iter().position(|c| c == "hidden control true").unwrap();
        let shown_after = calls[hidden_at..]
            .iter()
            .any(|c| c == "hidden control false");
        assert!(shown_after);
    }

    #[tokio::test(start_paused = true)]
    async fn free_recording_auto_stops_after_five_minutes() {
        let mut h = harness();
        h.bus.send(Message::ProfileReceived(profile(Plan::Free))).await.unwrap();
        wait_armed(&mut h.events).await;

        assert_eq!(action(&h.bus, StudioAction::Start).await, Reply::Ack);
        let summary = wait_stopped(&mut h.events).await;

        assert_eq!(summary.reason, StopReason::PlanLimit);
        assert!(summary.elapsed_ms >= 300_000);
        assert!(summary.elapsed_ms < 302_000);
        assert_eq!(h.transport.finalized.load(Ordering::SeqCst), 1);
        assert_eq!(status(&h.bus).await.display, "00:00:00");
    }

    #[tokio::test(start_paused = true)]
    async fn start_before_profile_is_rejected() {
        let h = harness();
        let reply = action(&h.bus, StudioAction::Start).await;
        assert!(reply.is_error());
        assert_eq!(status(&h.bus).await.state, SessionState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn toggle_preview_expands_studio() {
        let h = harness();
        assert_eq!(action(&h.bus, StudioAction::TogglePreview).await, Reply::Ack);
        assert!(status(&h.bus).await.preview);

        let calls = h.host.calls.lock().unwrap().clone();
        assert!(calls.contains(&"resize studio Expanded".to_string()));
        assert!(calls.contains(&"overlay webcam true".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_finalizes_active_recording() {
        let mut h = harness();
        h.bus.send(Message::ProfileReceived(profile(Plan::Pro))).await.unwrap();
        wait_armed(&mut h.events).await;
        action(&h.bus, StudioAction::Start).await;

        h.bus.shutdown().await;
        h.coordinator.await.unwrap();
        h.studio.await.unwrap();

        assert_eq!(h.transport.finalized.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_while_acquiring_cancels_and_releases() {
        let capture = Arc::new(GatedCapture::new());
        let h = harness_with(Arc::clone(&capture), SilentNotifier, false);
        h.bus.send(Message::ProfileReceived(profile(Plan::Pro))).await.unwrap();
        wait_attempts(&capture, 1).await;

        assert_eq!(action(&h.bus, StudioAction::Stop).await, Reply::Ack);
        capture.let_through();
        tokio::time::sleep(StdDuration::from_millis(100)).await;

        assert_eq!(status(&h.bus).await.state, SessionState::Idle);
        assert_eq!(capture.attempts(), vec!["s1".to_string()]);
        assert_eq!(capture.releases.load(Ordering::SeqCst), 1);
        assert_eq!(capture.recorders.load(Ordering::SeqCst), 0);

        let reply = action(&h.bus, StudioAction::Start).await;
        assert!(reply.is_error());
        assert_eq!(capture.recorders.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn start_while_acquiring_is_refused_then_allowed() {
        let capture = Arc::new(GatedCapture::new());
        let mut h = harness_with(Arc::clone(&capture), SilentNotifier, false);
        h.bus.send(Message::ProfileReceived(profile(Plan::Pro))).await.unwrap();
        wait_attempts(&capture, 1).await;

        assert_eq!(
            action(&h.bus, StudioAction::Start).await,
            Reply::error("Capture devices are still being acquired")
        );
        let report = status(&h.bus).await;
        assert_eq!(report.state, SessionState::Idle);
        assert_eq!(
            report.profile.and_then(|p| p.session_id).as_deref(),
            Some("s1")
        );
        assert_eq!(capture.recorders.load(Ordering::SeqCst), 0);

        capture.let_through();
        wait_armed(&mut h.events).await;
        assert_eq!(action(&h.bus, StudioAction::Start).await, Reply::Ack);
        assert_eq!(capture.recorders.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn newer_profile_replaces_the_one_being_acquired() {
        let capture = Arc::new(GatedCapture::new());
        let mut h = harness_with(Arc::clone(&capture), SilentNotifier, false);
        h.bus.send(Message::ProfileReceived(profile_for("s1", Plan::Pro))).await.unwrap();
        wait_attempts(&capture, 1).await;

        h.bus.send(Message::ProfileReceived(profile_for("s2", Plan::Pro))).await.unwrap();
        wait_attempts(&capture, 2).await;
        capture.let_through();
        wait_armed(&mut h.events).await;

        let report = status(&h.bus).await;
        assert_eq!(report.state, SessionState::Armed);
        assert_eq!(
            report.profile.and_then(|p| p.session_id).as_deref(),
            Some("s2")
        );
        assert_eq!(capture.attempts(), vec!["s1".to_string(), "s2".to_string()]);
        assert_eq!(capture.releases.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_notification_after_refused_devices_keeps_studio_running() {
        let capture = Arc::new(GatedCapture::refusing());
        let notifier = BrokenNotifier::default();
        let h = harness_with(Arc::clone(&capture), notifier.clone(), true);
        h.bus.send(Message::ProfileReceived(profile(Plan::Pro))).await.unwrap();
        wait_attempts(&capture, 1).await;
        tokio::time::sleep(StdDuration::from_millis(100)).await;

        assert_eq!(
            notifier.messages.lock().unwrap().clone(),
            vec!["Could not access the screen or microphone".to_string()]
        );
        assert_eq!(status(&h.bus).await.state, SessionState::Idle);
        assert!(!h.studio.is_finished());
    }
}
