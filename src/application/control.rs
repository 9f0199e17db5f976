//! Control surface
//!
//! Holds the user's studio settings, fills in device defaults from the
//! current device list, persists changes through the settings service and
//! republishes the whole profile on every change.

use tracing::{debug, info, warn};

use crate::domain::devices::MediaSources;
use crate::domain::message::{Message, Reply};
use crate::domain::profile::{PartialCaptureProfile, Plan, Preset};

use super::coordinator::{BusHandle, SurfaceLink};
use super::ports::{SettingsSync, StudioSettings, UserProfile};

/// Control surface actor
pub struct ControlSurface<S: SettingsSync> {
    link: SurfaceLink,
    settings_sync: S,
    settings: PartialCaptureProfile,
    sources: Option<MediaSources>,
}

impl<S: SettingsSync> ControlSurface<S> {
    /// Create a control surface seeded with locally configured settings
    pub fn new(link: SurfaceLink, settings_sync: S, seed: PartialCaptureProfile) -> Self {
        Self {
            link,
            settings_sync,
            settings: seed,
            sources: None,
        }
    }

    pub fn settings(&self) -> &PartialCaptureProfile {
        &self.settings
    }

    fn bus(&self) -> &BusHandle {
        &self.link.bus
    }

    /// Run until the coordinator drops this surface
    pub async fn run(mut self) {
        self.bootstrap().await;

        while let Some(envelope) = self.link.inbox.recv().await {
            let (message, responder) = envelope.into_parts();
            let reply = self.handle(message).await;
            responder.respond(reply);
        }

        debug!("control surface stopped");
    }

    /// Load stored settings and the device list, then publish
    pub async fn bootstrap(&mut self) {
        if let Some(user_id) = self.settings.session_id.clone() {
            match self.settings_sync.load(&user_id).await {
                Ok(user) => self.seed_from_user(user),
                Err(e) => warn!(error = %e, "could not load stored studio settings"),
            }
        }

        match self.bus().request(Message::GetSources).await {
            Ok(Reply::Sources(sources)) => self.apply_sources(sources),
            Ok(Reply::Error(e)) => warn!(error = %e, "device enumeration failed"),
            Ok(other) => warn!(reply = ?other, "unexpected reply to getSources"),
            Err(e) => warn!(error = %e, "could not request device list"),
        }

        self.publish().await;
    }

    /// Handle one inbound message and produce its reply
    pub async fn handle(&mut self, message: Message) -> Reply {
        match message {
            Message::MediaSources(sources) => {
                self.apply_sources(sources);
                self.publish().await;
                Reply::Ack
            }
            Message::StudioReady => {
                debug!("studio ready, republishing profile");
                self.publish().await;
                Reply::Ack
            }
            Message::SettingsChanged(patch) => self.change_settings(patch).await,
            other => Reply::error(format!("Control surface cannot handle {}", other.name())),
        }
    }

    fn seed_from_user(&mut self, user: UserProfile) {
        let plan = user.plan();
        if let Some(studio) = user.studio {
            self.settings.screen_source_id = studio.screen.or(self.settings.screen_source_id.take());
            self.settings.audio_device_id = studio.mic.or(self.settings.audio_device_id.take());
            self.settings.preset = studio.preset.or(self.settings.preset);
        }
        self.settings.plan = plan.or(self.settings.plan);
        self.settings.session_id = Some(user.id);
        info!("loaded stored studio settings");
    }

    /// Point missing or vanished devices at the first available ones
    fn apply_sources(&mut self, sources: MediaSources) {
        let screen = self
            .settings
            .screen_source_id
            .as_deref()
            .and_then(|id| sources.screen_or_first(id))
            .or_else(|| sources.screens.first());
        if let Some(screen) = screen {
            self.settings.screen_source_id = Some(screen.id.clone());
        }

        let audio = self
            .settings
            .audio_device_id
            .as_deref()
            .and_then(|id| sources.audio_or_first(id))
            .or_else(|| sources.audio_inputs.first());
        if let Some(audio) = audio {
            self.settings.audio_device_id = Some(audio.device_id.clone());
        }

        if self.settings.preset.is_none() {
            self.settings.preset = Some(Preset::Sd);
        }

        debug!(
            screens = sources.screens.len(),
            audio_inputs = sources.audio_inputs.len(),
            "device list applied"
        );
        self.sources = Some(sources);
    }

    async fn change_settings(&mut self, patch: PartialCaptureProfile) -> Reply {
        let mut next = self.settings.clone();
        if patch.session_id.is_some() {
            next.session_id = patch.session_id;
        }
        if patch.screen_source_id.is_some() {
            next.screen_source_id = patch.screen_source_id;
        }
        if patch.audio_device_id.is_some() {
            next.audio_device_id = patch.audio_device_id;
        }
        if patch.preset.is_some() {
            next.preset = patch.preset;
        }
        if patch.plan.is_some() {
            next.plan = patch.plan;
        }

        if let Some(sources) = &self.sources {
            if let Some(screen) = next.screen_source_id.as_deref() {
                if sources.find_screen(screen).is_none() {
                    return Reply::error(format!("Unknown screen source: {}", screen));
                }
            }
            if let Some(audio) = next.audio_device_id.as_deref() {
                if sources.find_audio(audio).is_none() {
                    return Reply::error(format!("Unknown audio input: {}", audio));
                }
            }
        }

        gate_preset(&mut next);
        self.settings = next;
        self.persist().await;
        self.publish().await
    }

    async fn persist(&self) {
        let (Some(id), Some(screen), Some(audio), Some(preset)) = (
            self.settings.session_id.as_deref(),
            self.settings.screen_source_id.as_deref(),
            self.settings.audio_device_id.as_deref(),
            self.settings.preset,
        ) else {
            return;
        };

        let settings = StudioSettings {
            screen: screen.to_string(),
            audio: audio.to_string(),
            preset,
        };
        match self.settings_sync.update(id, &settings).await {
            Ok(ack) => debug!(status = ack.status, message = %ack.message, "studio settings saved"),
            Err(e) => warn!(error = %e, "could not save studio settings"),
        }
    }

    /// Publish the current settings as a profile
    async fn publish(&mut self) -> Reply {
        gate_preset(&mut self.settings);
        let profile = self.settings.clone();
        let missing = profile.missing_fields();
        if !missing.is_empty() {
            debug!(?missing, "profile incomplete, not publishing");
            return Reply::error(format!(
                "Incomplete capture profile, missing: {}",
                missing.join(", ")
            ));
        }

        match self.bus().request(Message::ProfileReceived(profile)).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(error = %e, "could not publish profile");
                Reply::error(e.to_string())
            }
        }
    }
}

/// HD requires the PRO plan
fn gate_preset(profile: &mut PartialCaptureProfile) {
    if profile.plan == Some(Plan::Free) && profile.preset == Some(Preset::Hd) {
        warn!("HD preset requires the PRO plan, using SD");
        profile.preset = Some(Preset::Sd);
    }
}
