//! Screen and microphone capture through ffmpeg

mod args;
mod ffmpeg;
mod slicer;

pub use args::{CaptureArgs, VideoInput};
pub use ffmpeg::FfmpegCapture;
pub use slicer::slice_stream;
