//! Recording domain module

mod chunk;
mod duration;
mod timer;

pub use chunk::{Chunk, SessionFilename, OUTPUT_EXTENSION, OUTPUT_MIME_TYPE};
pub use duration::Duration;
pub use timer::{format_elapsed, RecordingTimer, ZERO_DISPLAY};
