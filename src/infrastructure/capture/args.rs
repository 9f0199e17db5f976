//! ffmpeg command line for screen and microphone capture

use crate::domain::devices::Geometry;
use crate::domain::profile::{Preset, VideoConstraints};

/// What x11grab should read
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VideoInput {
    /// A monitor region of the root window
    Region(Geometry),
    /// A single window by X11 id
    Window(String),
}

/// Everything needed to build one ffmpeg invocation
#[derive(Debug, Clone)]
pub struct CaptureArgs {
    pub display: String,
    pub video: VideoInput,
    pub audio_device: String,
    pub preset: Preset,
}

impl CaptureArgs {
    fn video_bitrate(&self) -> &'static str {
        match self.preset {
            Preset::Sd => "2M",
            Preset::Hd => "4M",
        }
    }

    /// Scale into the preset box, letterboxing the rest
    fn scale_filter(c: VideoConstraints) -> String {
        format!(
            "scale={w}:{h}:force_original_aspect_ratio=decrease,pad={w}:{h}:(ow-iw)/2:(oh-ih)/2",
            w = c.width,
            h = c.height
        )
    }

    /// Leading flags plus the x11grab and alsa inputs
    fn inputs(&self) -> Vec<String> {
        let rate = self.preset.constraints().frame_rate.to_string();

        let mut args: Vec<String> = ["-hide_banner", "-loglevel", "error", "-nostdin"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        args.extend(["-f".into(), "x11grab".into(), "-framerate".into(), rate]);
        match &self.video {
            VideoInput::Region(g) => {
                args.extend([
                    "-video_size".into(),
                    format!("{}x{}", g.width, g.height),
                    "-i".into(),
                    format!("{}+{},{}", self.display, g.x, g.y),
                ]);
            }
            VideoInput::Window(id) => {
                args.extend([
                    "-window_id".into(),
                    id.clone(),
                    "-i".into(),
                    self.display.clone(),
                ]);
            }
        }

        args.extend([
            "-f".into(),
            "alsa".into(),
            "-i".into(),
            self.audio_device.clone(),
        ]);
        args
    }

    /// Open both inputs for a fraction of a second and discard the result.
    /// Fails fast when the display or the microphone cannot be opened.
    pub fn open_check(&self) -> Vec<String> {
        let mut args = self.inputs();
        args.extend(
            ["-t", "0.1", "-f", "null", "-"]
                .iter()
                .map(|s| s.to_string()),
        );
        args
    }

    /// Build the argument list. Output is WebM (VP9 + Opus) on stdout.
    pub fn build(&self) -> Vec<String> {
        let constraints = self.preset.constraints();
        let mut args = self.inputs();

        args.extend([
            "-vf".into(),
            Self::scale_filter(constraints),
            "-r".into(),
            constraints.frame_rate.to_string(),
            "-c:v".into(),
            "libvpx-vp9".into(),
            "-deadline".into(),
            "realtime".into(),
            "-cpu-used".into(),
            "8".into(),
            "-b:v".into(),
            self.video_bitrate().into(),
            "-c:a".into(),
            "libopus".into(),
            "-b:a".into(),
            "128k".into(),
            "-f".into(),
            "webm".into(),
            "pipe:1".into(),
        ]);

        args
    }
}
