//! Client side of the control socket: every subcommand except `run` and
//! `config`

use thiserror::Error;

use crate::domain::message::{Message, Reply};
use crate::domain::profile::PartialCaptureProfile;

use super::args::Commands;
use super::ipc::{SocketPath, UnixSocketClient};
use super::presenter::Presenter;

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("{0}")]
    Usage(String),

    #[error("No recorder running. Start one with: studio-recorder run")]
    NotRunning,

    #[error("Failed to communicate with recorder: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Rejected(String),
}

/// Translate a subcommand into the message it sends
pub fn message_for(command: &Commands) -> Result<Message, RemoteError> {
    if let Some(action) = command.studio_action() {
        return Ok(Message::StudioAction { action });
    }

    match command {
        Commands::Sources => Ok(Message::GetSources),
        Commands::Status => Ok(Message::StudioStatus),
        Commands::Close { surface } => Ok(Message::HideOrCloseWindow {
            surface: (*surface).into(),
        }),
        Commands::Select(args) => {
            if args.is_empty() {
                return Err(RemoteError::Usage(
                    "Nothing to change. Pass --screen, --audio or --preset".to_string(),
                ));
            }
            Ok(Message::SettingsChanged(PartialCaptureProfile {
                screen_source_id: args.screen.clone(),
                audio_device_id: args.audio.clone(),
                preset: args.preset.map(Into::into),
                ..PartialCaptureProfile::default()
            }))
        }
        _ => Err(RemoteError::Usage("Not a recorder command".to_string())),
    }
}

/// Send one subcommand to the running recorder and print the answer
pub async fn handle_remote_command(
    command: &Commands,
    presenter: &Presenter,
) -> Result<(), RemoteError> {
    let message = message_for(command)?;
    let client = UnixSocketClient::new(SocketPath::new());
    if !client.is_running() {
        return Err(RemoteError::NotRunning);
    }

    let name = message.name();
    let reply = client
        .request(&message)
        .await?
        .into_result()
        .map_err(RemoteError::Rejected)?;

    match reply {
        Reply::Sources(sources) => presenter.sources(&sources),
        Reply::Status(report) => presenter.status(&report),
        Reply::Ack => presenter.success(&format!("Sent {}", name)),
        Reply::Error(e) => return Err(RemoteError::Rejected(e)),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::args::{PresetArg, SelectArgs, SurfaceArg};
    use crate::domain::message::StudioAction;
    use crate::domain::profile::Preset;
    use crate::domain::visibility::Surface;

    #[test]
    fn actions_map_to_studio_messages() {
        assert_eq!(
            message_for(&Commands::Stop).unwrap(),
            Message::StudioAction {
                action: StudioAction::Stop
            }
        );
    }

    #[test]
    fn close_targets_surface() {
        let message = message_for(&Commands::Close {
            surface: SurfaceArg::Studio,
        })
        .unwrap();
        assert_eq!(
            message,
            Message::HideOrCloseWindow {
                surface: Surface::Studio
            }
        );
    }

    #[test]
    fn select_builds_partial_settings() {
        let message = message_for(&Commands::Select(SelectArgs {
            preset: Some(PresetArg::Hd),
            ..SelectArgs::default()
        }))
        .unwrap();
        let Message::SettingsChanged(patch) = message else {
            panic!("expected settings-changed");
        };
        assert_eq!(patch.preset, Some(Preset::Hd));
        assert!(patch.screen_source_id.is_none());
    }

    #[test]
    fn empty_select_is_usage_error() {
        let err = message_for(&Commands::Select(SelectArgs::default())).unwrap_err();
        assert!(matches!(err, RemoteError::Usage(_)));
    }
}
