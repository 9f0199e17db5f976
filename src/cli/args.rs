//! CLI argument definitions using Clap

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::domain::message::StudioAction;
use crate::domain::profile::{Plan, Preset};
use crate::domain::visibility::Surface;

/// studio-recorder - screen and microphone capture streamed to a media server
#[derive(Parser, Debug)]
#[command(name = "studio-recorder")]
#[command(version)]
#[command(about = "Record a screen and microphone and stream the recording to a media server")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the recorder (coordinator, surfaces and control socket)
    Run(RunArgs),
    /// List capturable screens, windows and microphones
    Sources,
    /// Change studio settings of the running recorder
    Select(SelectArgs),
    /// Start recording
    Start,
    /// Stop recording
    Stop,
    /// Toggle the webcam preview overlay
    Preview,
    /// Show recorder status
    Status,
    /// Hide or close a surface
    Close {
        #[arg(value_enum)]
        surface: SurfaceArg,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Options for `run`; each overrides the config file and environment
#[derive(Args, Debug, Default, Clone)]
pub struct RunArgs {
    /// Media server URL
    #[arg(long, value_name = "URL")]
    pub server_url: Option<String>,

    /// Settings service URL
    #[arg(long, value_name = "URL")]
    pub settings_url: Option<String>,

    /// User id, also used as studio id and recording owner
    #[arg(short = 'u', long, value_name = "ID")]
    pub user_id: Option<String>,

    /// Subscription plan
    #[arg(long, value_enum)]
    pub plan: Option<PlanArg>,

    /// Video preset
    #[arg(short = 'p', long, value_enum)]
    pub preset: Option<PresetArg>,

    /// Screen source id (screen:<n>:0 or window:<id>:0)
    #[arg(short = 's', long, value_name = "SOURCE")]
    pub screen: Option<String>,

    /// Audio input device id
    #[arg(short = 'a', long, value_name = "DEVICE")]
    pub audio: Option<String>,

    /// X11 display to capture
    #[arg(long, value_name = "DISPLAY")]
    pub display: Option<String>,

    /// Show desktop notifications
    #[arg(short = 'n', long)]
    pub notify: bool,

    /// Hide surfaces instead of closing them
    #[arg(long)]
    pub persistent_windows: bool,
}

/// Options for `select`
#[derive(Args, Debug, Default, Clone)]
pub struct SelectArgs {
    /// Screen source id
    #[arg(short = 's', long, value_name = "SOURCE")]
    pub screen: Option<String>,

    /// Audio input device id
    #[arg(short = 'a', long, value_name = "DEVICE")]
    pub audio: Option<String>,

    /// Video preset
    #[arg(short = 'p', long, value_enum)]
    pub preset: Option<PresetArg>,
}

impl SelectArgs {
    pub fn is_empty(&self) -> bool {
        self.screen.is_none() && self.audio.is_none() && self.preset.is_none()
    }
}

/// Config action subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Create config file with defaults
    Init,
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// Config value
        value: String,
    },
    /// Get a config value
    Get {
        /// Config key
        key: String,
    },
    /// List all config values
    List,
    /// Show config file path
    Path,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum PresetArg {
    Sd,
    Hd,
}

impl From<PresetArg> for Preset {
    fn from(arg: PresetArg) -> Self {
        match arg {
            PresetArg::Sd => Preset::Sd,
            PresetArg::Hd => Preset::Hd,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum PlanArg {
    Free,
    Pro,
}

impl From<PlanArg> for Plan {
    fn from(arg: PlanArg) -> Self {
        match arg {
            PlanArg::Free => Plan::Free,
            PlanArg::Pro => Plan::Pro,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum SurfaceArg {
    Control,
    Studio,
    Webcam,
}

impl From<SurfaceArg> for Surface {
    fn from(arg: SurfaceArg) -> Self {
        match arg {
            SurfaceArg::Control => Surface::Control,
            SurfaceArg::Studio => Surface::Studio,
            SurfaceArg::Webcam => Surface::Webcam,
        }
    }
}

impl Commands {
    /// Studio action carried by `start`, `stop` and `preview`
    pub fn studio_action(&self) -> Option<StudioAction> {
        match self {
            Self::Start => Some(StudioAction::Start),
            Self::Stop => Some(StudioAction::Stop),
            Self::Preview => Some(StudioAction::TogglePreview),
            _ => None,
        }
    }
}

/// Valid config keys
pub const VALID_CONFIG_KEYS: &[&str] = &[
    "server_url",
    "settings_url",
    "user_id",
    "plan",
    "preset",
    "screen",
    "audio",
    "free_limit",
    "chunk_interval",
    "health_interval",
    "display",
    "notify",
    "persistent_windows",
];

pub fn is_valid_config_key(key: &str) -> bool {
    VALID_CONFIG_KEYS.contains(&key)
}
