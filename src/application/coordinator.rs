//! Coordinator and message bus
//!
//! One router task owns the window host, the device enumerator and the
//! profile channel. Surfaces talk to each other only by sending [`Message`]s
//! through a [`BusHandle`]; the router delivers each message to its fixed
//! destination and never rewrites the payload.

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::domain::message::{Destination, Message, Reply};
use crate::domain::visibility::{SizeClass, Surface};

use super::ports::{DeviceEnumerator, WindowError, WindowHost};
use super::profile_channel::{ProfileChannel, PublishOutcome};
use super::visibility::WindowVisibilityCoordinator;

/// Capacity of the router queue
const BUS_CAPACITY: usize = 64;

/// Capacity of each surface inbox
const INBOX_CAPACITY: usize = 32;

/// Bus errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BusError {
    #[error("Coordinator is not running")]
    Closed,

    #[error("No reply for {0}")]
    NoReply(&'static str),
}

/// A routed message with an optional reply slot
#[derive(Debug)]
pub struct Envelope {
    pub message: Message,
    reply: Option<oneshot::Sender<Reply>>,
}

impl Envelope {
    pub fn new(message: Message) -> Self {
        Self {
            message,
            reply: None,
        }
    }

    /// Envelope plus the receiver its reply will arrive on
    pub fn with_reply(message: Message) -> (Self, oneshot::Receiver<Reply>) {
        let (tx, rx) = oneshot::channel();
        (
            Self {
                message,
                reply: Some(tx),
            },
            rx,
        )
    }

    /// Answer the sender, if it is waiting
    pub fn respond(self, reply: Reply) {
        if let Some(tx) = self.reply {
            // Requester may have given up
            let _ = tx.send(reply);
        }
    }

    /// Split into message and responder
    pub fn into_parts(self) -> (Message, Responder) {
        (self.message, Responder(self.reply))
    }
}

/// Reply slot detached from its message
#[derive(Debug)]
pub struct Responder(Option<oneshot::Sender<Reply>>);

impl Responder {
    pub fn respond(self, reply: Reply) {
        if let Some(tx) = self.0 {
            let _ = tx.send(reply);
        }
    }
}

enum BusCommand {
    Route(Envelope),
    Attach {
        surface: Surface,
        inbox: mpsc::Sender<Envelope>,
    },
    Shutdown,
}

/// Cloneable sending side of the bus
#[derive(Clone)]
pub struct BusHandle {
    tx: mpsc::Sender<BusCommand>,
}

impl BusHandle {
    /// Send a message without waiting for an answer
    pub async fn send(&self, message: Message) -> Result<(), BusError> {
        self.tx
            .send(BusCommand::Route(Envelope::new(message)))
            .await
            .map_err(|_| BusError::Closed)
    }

    /// Send a message and wait for its reply
    pub async fn request(&self, message: Message) -> Result<Reply, BusError> {
        let name = message.name();
        let (envelope, rx) = Envelope::with_reply(message);
        self.tx
            .send(BusCommand::Route(envelope))
            .await
            .map_err(|_| BusError::Closed)?;
        rx.await.map_err(|_| BusError::NoReply(name))
    }

    /// Attach a surface to a running coordinator
    pub async fn attach(&self, surface: Surface) -> Result<SurfaceLink, BusError> {
        let (inbox_tx, inbox) = mpsc::channel(INBOX_CAPACITY);
        self.tx
            .send(BusCommand::Attach {
                surface,
                inbox: inbox_tx,
            })
            .await
            .map_err(|_| BusError::Closed)?;
        Ok(SurfaceLink {
            surface,
            inbox,
            bus: self.clone(),
        })
    }

    /// Ask the coordinator to stop
    pub async fn shutdown(&self) {
        let _ = self.tx.send(BusCommand::Shutdown).await;
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// A surface's connection to the bus
pub struct SurfaceLink {
    pub surface: Surface,
    pub inbox: mpsc::Receiver<Envelope>,
    pub bus: BusHandle,
}

/// Why the coordinator stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinatorExit {
    /// Explicit shutdown request
    Shutdown,
    /// The last surface was closed
    AllSurfacesClosed,
}

/// Window lifecycle policy
#[derive(Debug, Clone, Copy, Default)]
pub struct LifecyclePolicy {
    /// Hide surfaces on close instead of destroying them
    pub persistent_windows: bool,
}

/// Message router
pub struct Coordinator<E, W>
where
    E: DeviceEnumerator + 'static,
    W: WindowHost,
{
    enumerator: Arc<E>,
    windows: WindowVisibilityCoordinator<W>,
    profiles: Arc<ProfileChannel>,
    surfaces: HashMap<Surface, mpsc::Sender<Envelope>>,
    policy: LifecyclePolicy,
    tx: mpsc::Sender<BusCommand>,
    rx: mpsc::Receiver<BusCommand>,
}

enum Flow {
    Continue,
    Exit(CoordinatorExit),
}

impl<E, W> Coordinator<E, W>
where
    E: DeviceEnumerator + 'static,
    W: WindowHost,
{
    pub fn new(enumerator: E, windows: W, policy: LifecyclePolicy) -> Self {
        let (tx, rx) = mpsc::channel(BUS_CAPACITY);
        Self {
            enumerator: Arc::new(enumerator),
            windows: WindowVisibilityCoordinator::new(windows),
            profiles: Arc::new(ProfileChannel::new()),
            surfaces: HashMap::new(),
            policy,
            tx,
            rx,
        }
    }

    pub fn handle(&self) -> BusHandle {
        BusHandle {
            tx: self.tx.clone(),
        }
    }

    /// Profile channel recording surfaces subscribe to
    pub fn profiles(&self) -> Arc<ProfileChannel> {
        Arc::clone(&self.profiles)
    }

    /// Attach a surface before the coordinator starts
    pub fn attach(&mut self, surface: Surface) -> SurfaceLink {
        let (inbox_tx, inbox) = mpsc::channel(INBOX_CAPACITY);
        self.surfaces.insert(surface, inbox_tx);
        SurfaceLink {
            surface,
            inbox,
            bus: self.handle(),
        }
    }

    /// Route messages until shutdown or until the last surface is closed
    pub async fn run(mut self) -> CoordinatorExit {
        info!(surfaces = self.surfaces.len(), "coordinator started");

        let exit = loop {
            let Some(command) = self.rx.recv().await else {
                break CoordinatorExit::Shutdown;
            };
            let flow = match command {
                BusCommand::Route(envelope) => self.route(envelope).await,
                BusCommand::Attach { surface, inbox } => {
                    debug!(%surface, "surface attached");
                    self.surfaces.insert(surface, inbox);
                    Flow::Continue
                }
                BusCommand::Shutdown => Flow::Exit(CoordinatorExit::Shutdown),
            };
            if let Flow::Exit(exit) = flow {
                break exit;
            }
        };

        // Dropping the inbox senders tells every surface to wind down
        self.surfaces.clear();
        info!(?exit, "coordinator stopped");
        exit
    }

    async fn route(&mut self, envelope: Envelope) -> Flow {
        debug!(event = envelope.message.name(), "routing");
        match envelope.message.destination() {
            Destination::Surface(Surface::Studio)
                if matches!(envelope.message, Message::ProfileReceived(_)) =>
            {
                self.publish_profile(envelope);
                Flow::Continue
            }
            Destination::Surface(surface) => {
                self.forward(surface, envelope);
                Flow::Continue
            }
            Destination::Coordinator => self.handle_own(envelope).await,
        }
    }

    fn publish_profile(&self, envelope: Envelope) {
        let (message, responder) = envelope.into_parts();
        let Message::ProfileReceived(profile) = message else {
            return;
        };
        let reply = match self.profiles.publish(&profile) {
            PublishOutcome::Delivered(n) => {
                debug!(subscribers = n, "profile delivered");
                Reply::Ack
            }
            PublishOutcome::Incomplete(missing) => Reply::error(format!(
                "Incomplete capture profile, missing: {}",
                missing.join(", ")
            )),
            PublishOutcome::NoSubscribers => Reply::Ack,
        };
        responder.respond(reply);
    }

    fn forward(&mut self, surface: Surface, envelope: Envelope) {
        let Some(inbox) = self.surfaces.get(&surface) else {
            envelope.respond(Reply::error(format!("Surface {} is not available", surface)));
            return;
        };
        match inbox.try_send(envelope) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(envelope)) => {
                warn!(%surface, event = envelope.message.name(), "surface inbox full, dropping");
                envelope.respond(Reply::error(format!("Surface {} is busy", surface)));
            }
            Err(mpsc::error::TrySendError::Closed(envelope)) => {
                self.surfaces.remove(&surface);
                envelope.respond(Reply::error(format!("Surface {} is not available", surface)));
            }
        }
    }

    async fn handle_own(&mut self, envelope: Envelope) -> Flow {
        let (message, responder) = envelope.into_parts();
        let result = match message {
            Message::ResizeStudio { shrink } => self
                .windows
                .resize(Surface::Studio, SizeClass::from_shrink(shrink))
                .await
                .map(|_| ()),
            Message::HidePlugin { state } => self
                .windows
                .set_hidden(Surface::Control, state)
                .await
                .map(|_| ()),
            Message::PreviewOverlay { visible } => self
                .windows
                .set_overlay_visible(Surface::Webcam, visible)
                .await
                .map(|_| ()),
            Message::HideOrCloseWindow { surface } => {
                match self.hide_or_close(surface).await {
                    Ok(Flow::Exit(exit)) => {
                        responder.respond(Reply::Ack);
                        return Flow::Exit(exit);
                    }
                    Ok(Flow::Continue) => Ok(()),
                    Err(e) => Err(e),
                }
            }
            Message::GetSources => {
                self.spawn_enumeration(responder);
                return Flow::Continue;
            }
            other => {
                responder.respond(Reply::error(format!(
                    "Coordinator cannot handle {}",
                    other.name()
                )));
                return Flow::Continue;
            }
        };

        responder.respond(match result {
            Ok(()) => Reply::Ack,
            Err(e) => Reply::error(e.to_string()),
        });
        Flow::Continue
    }

    async fn hide_or_close(&mut self, surface: Surface) -> Result<Flow, WindowError> {
        if self.policy.persistent_windows {
            self.windows.set_hidden(surface, true).await?;
            info!(%surface, "surface hidden");
            return Ok(Flow::Continue);
        }

        self.windows.close(surface).await?;
        self.surfaces.remove(&surface);
        info!(%surface, "surface closed");

        if self.windows.open_count() == 0 {
            return Ok(Flow::Exit(CoordinatorExit::AllSurfacesClosed));
        }
        Ok(Flow::Continue)
    }

    fn spawn_enumeration(&self, responder: Responder) {
        let enumerator = Arc::clone(&self.enumerator);
        tokio::spawn(async move {
            let reply = match enumerator.list_sources().await {
                Ok(sources) => Reply::Sources(sources),
                Err(e) => {
                    warn!(error = %e, "device enumeration failed");
                    Reply::error(e.to_string())
                }
            };
            responder.respond(reply);
        });
    }
}
