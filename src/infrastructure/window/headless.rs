//! Window host without a compositor

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use tracing::info;

use crate::application::ports::{WindowError, WindowHost};
use crate::domain::visibility::{SizeClass, Surface};

/// State of one headless surface
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SurfaceState {
    pub hidden: bool,
    pub size: SizeClass,
    pub overlay: bool,
    pub closed: bool,
}

/// Keeps surface state in memory and reports changes through tracing.
///
/// Used when the recorder runs as a daemon driven over IPC.
#[derive(Default)]
pub struct HeadlessWindowHost {
    surfaces: Mutex<HashMap<Surface, SurfaceState>>,
}

impl HeadlessWindowHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self, surface: Surface) -> SurfaceState {
        self.surfaces
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&surface)
            .copied()
            .unwrap_or_default()
    }

    fn update(
        &self,
        surface: Surface,
        change: impl FnOnce(&mut SurfaceState),
    ) -> Result<(), WindowError> {
        let mut surfaces = self.surfaces.lock().unwrap_or_else(PoisonError::into_inner);
        let state = surfaces.entry(surface).or_default();
        if state.closed {
            return Err(WindowError::Closed(surface));
        }
        change(state);
        Ok(())
    }
}

#[async_trait]
impl WindowHost for HeadlessWindowHost {
    async fn set_hidden(&self, surface: Surface, hidden: bool) -> Result<(), WindowError> {
        self.update(surface, |s| s.hidden = hidden)?;
        info!(%surface, hidden, "window visibility");
        Ok(())
    }

    async fn resize(&self, surface: Surface, size: SizeClass) -> Result<(), WindowError> {
        self.update(surface, |s| s.size = size)?;
        let (width, height) = size.dimensions();
        info!(%surface, width, height, "window resized");
        Ok(())
    }

    async fn set_overlay_visible(
        &self,
        surface: Surface,
        visible: bool,
    ) -> Result<(), WindowError> {
        self.update(surface, |s| s.overlay = visible)?;
        info!(%surface, visible, "preview overlay");
        Ok(())
    }

    async fn close(&self, surface: Surface) -> Result<(), WindowError> {
        self.update(surface, |s| s.closed = true)?;
        info!(%surface, "window closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn tracks_surface_state() {
        let host = HeadlessWindowHost::new();
        host.set_hidden(Surface::Control, true).await.unwrap();
        host.resize(Surface::Studio, SizeClass::Expanded).await.unwrap();

        assert!(host.state(Surface::Control).hidden);
        assert_eq!(host.state(Surface::Studio).size, SizeClass::Expanded);
        assert!(!host.state(Surface::Webcam).overlay);
    }

    #[tokio::test]
    async fn closed_surface_stays_closed() {
        let host = HeadlessWindowHost::new();
        host.close(Surface::Webcam).await.unwrap();

        let err = host.set_overlay_visible(Surface::Webcam, true).await.unwrap_err();
        assert_eq!(err, WindowError::Closed(Surface::Webcam));
        assert!(host.state(Surface::Webcam).closed);
    }
}
