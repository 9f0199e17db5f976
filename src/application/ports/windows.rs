//! Window host port interface

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::visibility::{SizeClass, Surface};

/// Window errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WindowError {
    #[error("Surface {0} is closed")]
    Closed(Surface),

    #[error("Window operation failed: {0}")]
    Failed(String),
}

/// Port for the native windows backing each surface
#[async_trait]
pub trait WindowHost: Send + Sync {
    /// Hide or show a surface's window
    async fn set_hidden(&self, surface: Surface, hidden: bool) -> Result<(), WindowError>;

    async fn resize(&self, surface: Surface, size: SizeClass) -> Result<(), WindowError>;

    async fn set_overlay_visible(&self, surface: Surface, visible: bool)
        -> Result<(), WindowError>;

    /// Destroy the window. Later operations on it fail with `Closed`.
    async fn close(&self, surface: Surface) -> Result<(), WindowError>;
}
