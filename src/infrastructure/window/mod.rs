//! Window host adapters

mod headless;

pub use headless::{HeadlessWindowHost, SurfaceState};
