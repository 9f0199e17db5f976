//! `run`: the long-lived recorder process

use std::process::ExitCode;
use std::sync::Arc;

use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::application::ports::{NotificationIcon, Notifier};
use crate::application::{
    CaptureSession, ControlSurface, Coordinator, CoordinatorExit, LifecyclePolicy, SessionEvent,
    StopReason, StudioSurface,
};
use crate::domain::visibility::Surface;
use crate::infrastructure::{
    create_notifier, FfmpegCapture, HeadlessWindowHost, HttpChunkTransport, HttpSettingsSync,
    SystemDeviceEnumerator,
};

use super::app::{RunOptions, EXIT_ERROR, EXIT_SUCCESS, EXIT_USAGE_ERROR};
use super::ipc::{SocketPath, UnixSocketServer};
use super::pid_file::PidFile;
use super::presenter::Presenter;
use super::signals::ShutdownSignals;

const NOTIFY_TITLE: &str = "Studio Recorder";

fn enumerator(display: &str) -> SystemDeviceEnumerator {
    SystemDeviceEnumerator::with_display(display)
}

/// Run the coordinator, both surfaces and the control socket until a
/// shutdown signal arrives or the last surface is closed.
pub async fn run_recorder(options: RunOptions) -> ExitCode {
    let presenter = Presenter::new();

    let mut pid_file = PidFile::new();
    if let Err(e) = pid_file.acquire() {
        presenter.error(&e.to_string());
        return ExitCode::from(EXIT_ERROR);
    }

    let display = match options
        .display
        .clone()
        .or_else(|| SystemDeviceEnumerator::new().display())
    {
        Some(display) => display,
        None => {
            presenter.error("No X11 display. Set DISPLAY or pass --display");
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let transport = match HttpChunkTransport::new(&options.server_url) {
        Ok(transport) => Arc::new(transport),
        Err(e) => {
            presenter.error(&e.to_string());
            return ExitCode::from(EXIT_USAGE_ERROR);
        }
    };

    let mut signals = match ShutdownSignals::install() {
        Ok(signals) => signals,
        Err(e) => {
            presenter.error(&format!("Failed to setup signal handler: {}", e));
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let mut coordinator = Coordinator::new(
        enumerator(&display),
        HeadlessWindowHost::new(),
        LifecyclePolicy {
            persistent_windows: options.persistent_windows,
        },
    );
    let bus = coordinator.handle();
    let control_link = coordinator.attach(Surface::Control);
    let studio_link = coordinator.attach(Surface::Studio);

    let capture = Arc::new(FfmpegCapture::new(enumerator(&display), display.clone()));
    let session = CaptureSession::new(capture, Arc::clone(&transport), options.session);
    let studio = StudioSurface::new(
        studio_link,
        coordinator.profiles().subscribe(),
        session,
        create_notifier(options.notify),
        options.notify,
    );
    let control = ControlSurface::new(
        control_link,
        HttpSettingsSync::new(options.settings_url.clone()),
        options.seed.clone(),
    );

    let mut server = UnixSocketServer::new(SocketPath::new());
    if let Err(e) = server.bind() {
        presenter.error(&format!("Failed to bind control socket: {}", e));
        return ExitCode::from(EXIT_ERROR);
    }
    presenter.info(&format!(
        "PID: {} | Socket: {} | Display: {} | Server: {}",
        std::process::id(),
        server.path().display(),
        display,
        options.server_url
    ));

    let background: Vec<JoinHandle<()>> = vec![
        transport.spawn_health_monitor(options.health_interval),
        tokio::spawn(watch_connection(
            transport.watch_connection(),
            create_notifier(options.notify),
        )),
        tokio::spawn(report_events(studio.events())),
        {
            let bus = bus.clone();
            tokio::spawn(async move {
                if let Err(e) = server.run(bus).await {
                    warn!(error = %e, "control socket stopped");
                }
            })
        },
    ];

    let mut coordinator_task = tokio::spawn(coordinator.run());
    let studio_task = tokio::spawn(studio.run());
    let control_task = tokio::spawn(control.run());

    let exit = tokio::select! {
        exit = &mut coordinator_task => exit,
        signal = signals.recv() => {
            if let Some(signal) = signal {
                presenter.info(&format!("Received {}, shutting down", signal.as_str()));
            }
            bus.shutdown().await;
            coordinator_task.await
        }
    };

    // surfaces wind down once the coordinator drops their inboxes
    let _ = studio_task.await;
    let _ = control_task.await;
    for task in background {
        task.abort();
    }
    let _ = pid_file.release();

    match exit {
        Ok(CoordinatorExit::Shutdown) | Ok(CoordinatorExit::AllSurfacesClosed) => {
            info!("recorder stopped");
            ExitCode::from(EXIT_SUCCESS)
        }
        Err(e) => {
            presenter.error(&format!("Coordinator failed: {}", e));
            ExitCode::from(EXIT_ERROR)
        }
    }
}

/// Notify when the media server goes away
async fn watch_connection(mut connected: watch::Receiver<bool>, notifier: Box<dyn Notifier>) {
    while connected.changed().await.is_ok() {
        if *connected.borrow_and_update() {
            continue;
        }
        let result = notifier
            .notify(
                NOTIFY_TITLE,
                "Lost connection to the media server. Chunks are dropped until it is back.",
                NotificationIcon::Warning,
            )
            .await;
        if let Err(e) = result {
            warn!(error = %e, "notification failed");
        }
    }
}

/// Mirror session events on the terminal
async fn report_events(mut events: broadcast::Receiver<SessionEvent>) {
    let mut presenter = Presenter::new();
    loop {
        let event = match events.recv().await {
            Ok(event) => event,
            Err(broadcast::error::RecvError::Lagged(_)) => continue,
            Err(broadcast::error::RecvError::Closed) => break,
        };

        match event {
            SessionEvent::Armed(streams) => presenter.success(&format!(
                "Ready: {} ({}) + {}",
                streams.video.name, streams.video.constraints, streams.audio.label
            )),
            SessionEvent::AcquisitionFailed(e) => presenter.error(&format!("Capture failed: {}", e)),
            SessionEvent::RecordingStarted { filename } => {
                presenter.start_spinner(&format!("Recording 00:00:00  {}", filename));
            }
            SessionEvent::Tick { display, .. } => {
                presenter.update_spinner(&format!("Recording {}", display));
            }
            SessionEvent::Stopping { reason } => {
                if reason == StopReason::PlanLimit {
                    presenter.warn("Free plan limit reached, stopping");
                }
                presenter.update_spinner("Finishing upload...");
            }
            SessionEvent::Stopped(summary) => {
                let line = presenter.format_summary(&summary);
                if summary.finalized {
                    presenter.spinner_success(&line);
                } else {
                    presenter.spinner_fail(&line);
                }
            }
        }
    }
}
