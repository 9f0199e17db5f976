//! Capture profile domain module

mod capture_profile;
mod preset;

pub use capture_profile::{CaptureProfile, PartialCaptureProfile};
pub use preset::{
    Plan, Preset, VideoConstraints, CAPTURE_FRAME_RATE, FREE_PLAN_LIMIT_SECS,
};
