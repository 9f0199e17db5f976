//! Studio recorder - screen and microphone capture streamed to a media server
//!
//! A recorder process hosts three surfaces (control, studio, webcam) behind a
//! message coordinator. The control surface owns the user's capture settings,
//! the studio surface runs the capture session and streams WebM chunks to the
//! media server while recording, and every other subcommand talks to the
//! running process over a Unix socket.
//!
//! # Architecture
//!
//! The crate follows hexagonal (ports & adapters) architecture:
//!
//! - **Domain**: Profiles, device lists, session state, messages and errors
//! - **Application**: Capture session, coordinator, surfaces and port traits
//! - **Infrastructure**: Adapters (FFmpeg, X11 enumeration, HTTP, config, notifications)
//! - **CLI**: Argument parsing, presentation, signal handling and the control socket

pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;
