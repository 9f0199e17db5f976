//! Application layer - Use cases and port interfaces
//!
//! Contains the capture session, the coordinator with its surfaces, and
//! the trait definitions for external system interactions.

pub mod capture_session;
pub mod control;
pub mod coordinator;
pub mod ports;
pub mod profile_channel;
pub mod studio;
pub mod visibility;

// Re-export use cases
pub use capture_session::{
    CaptureSession, ProfileOutcome, SessionConfig, SessionError, SessionEvent, SessionSummary,
    StopReason, TickOutcome,
};
pub use control::ControlSurface;
pub use coordinator::{
    BusError, BusHandle, Coordinator, CoordinatorExit, Envelope, LifecyclePolicy, SurfaceLink,
};
pub use profile_channel::{ProfileChannel, ProfileSubscription, PublishOutcome};
pub use studio::StudioSurface;
pub use visibility::WindowVisibilityCoordinator;
