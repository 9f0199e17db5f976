//! Window visibility coordinator
//!
//! Applies visibility requests to the window host, skipping any request whose
//! target state is already in effect.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::domain::visibility::{SizeClass, Surface, VisibilityPlan};

use super::ports::{WindowError, WindowHost};

/// Last state pushed to the host for one surface
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Applied {
    hidden: Option<bool>,
    size: Option<SizeClass>,
    overlay: Option<bool>,
}

/// Idempotent front for a [`WindowHost`]
pub struct WindowVisibilityCoordinator<W: WindowHost> {
    host: W,
    applied: HashMap<Surface, Applied>,
    closed: HashSet<Surface>,
}

impl<W: WindowHost> WindowVisibilityCoordinator<W> {
    pub fn new(host: W) -> Self {
        Self {
            host,
            applied: HashMap::new(),
            closed: HashSet::new(),
        }
    }

    pub fn host(&self) -> &W {
        &self.host
    }

    fn entry(&mut self, surface: Surface) -> Result<&mut Applied, WindowError> {
        if self.closed.contains(&surface) {
            return Err(WindowError::Closed(surface));
        }
        Ok(self.applied.entry(surface).or_default())
    }

    /// Returns `true` when the host was asked to change something
    pub async fn set_hidden(&mut self, surface: Surface, hidden: bool) -> Result<bool, WindowError> {
        if self.entry(surface)?.hidden == Some(hidden) {
            return Ok(false);
        }
        self.host.set_hidden(surface, hidden).await?;
        self.entry(surface)?.hidden = Some(hidden);
        debug!(%surface, hidden, "visibility applied");
        Ok(true)
    }

    pub async fn resize(&mut self, surface: Surface, size: SizeClass) -> Result<bool, WindowError> {
        if self.entry(surface)?.size == Some(size) {
            return Ok(false);
        }
        self.host.resize(surface, size).await?;
        self.entry(surface)?.size = Some(size);
        debug!(%surface, %size, "size applied");
        Ok(true)
    }

    pub async fn set_overlay_visible(
        &mut self,
        surface: Surface,
        visible: bool,
    ) -> Result<bool, WindowError> {
        if self.entry(surface)?.overlay == Some(visible) {
            return Ok(false);
        }
        self.host.set_overlay_visible(surface, visible).await?;
        self.entry(surface)?.overlay = Some(visible);
        debug!(%surface, visible, "overlay applied");
        Ok(true)
    }

    /// Push a whole plan. Returns the number of host calls made.
    pub async fn apply(&mut self, plan: VisibilityPlan) -> Result<usize, WindowError> {
        let mut changes = 0;
        changes += usize::from(self.set_hidden(Surface::Control, plan.control_hidden).await?);
        changes += usize::from(self.resize(Surface::Studio, plan.studio_size).await?);
        changes += usize::from(
            self.set_overlay_visible(Surface::Webcam, plan.preview_overlay)
                .await?,
        );
        Ok(changes)
    }

    /// Close a surface. Closing twice is a no-op.
    pub async fn close(&mut self, surface: Surface) -> Result<bool, WindowError> {
        if self.closed.contains(&surface) {
            return Ok(false);
        }
        self.host.close(surface).await?;
        self.closed.insert(surface);
        self.applied.remove(&surface);
        Ok(true)
    }

    pub fn is_closed(&self, surface: Surface) -> bool {
        self.closed.contains(&surface)
    }

    /// Number of surfaces not yet closed
    pub fn open_count(&self) -> usize {
        Surface::ALL
            .iter()
            .filter(|s| !self.closed.contains(s))
            .count()
    }
}
