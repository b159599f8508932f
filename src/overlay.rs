//! One click-through overlay window per monitor

use anyhow::Result;
use log::{debug, warn};

use crate::display::{DisplayBackend, Surface};
use crate::monitor::{OverlaySize, Topology};

/// Creation starts at this monitor index; reposition and teardown start at 0.
pub const FIRST_SERVICED_MONITOR: usize = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlayWindow {
    pub monitor: usize,
    pub window: u32,
    pub origin: (i32, i32),
    pub content: Surface,
    /// 1-bit shape mask, present only when no compositor is running.
    pub mask: Option<Surface>,
}

/// Overlay windows addressed by monitor index.
pub struct OverlayPool {
    windows: Vec<OverlayWindow>,
    size: OverlaySize,
}

impl OverlayPool {
    pub fn create<D: DisplayBackend>(
        display: &mut D,
        topology: &Topology,
        size: OverlaySize,
    ) -> Result<Self> {
        debug!("Scaled overlay size: {}x{} px", size.width, size.height);

        let mut windows = Vec::with_capacity(topology.len());
        for (index, monitor) in topology.iter().skip(FIRST_SERVICED_MONITOR) {
            debug!("Creating overlay on screen {index}");
            windows.push(display.create_overlay(index, monitor.anchor(size), size)?);
        }
        display.flush()?;

        Ok(Self { windows, size })
    }

    /// Moves existing windows to the anchors of `topology`. Handles and
    /// surfaces are kept; nothing is resized or recreated.
    pub fn reposition<D: DisplayBackend>(&mut self, display: &mut D, topology: &Topology) -> Result<()> {
        for (index, monitor) in topology.iter() {
            let Some(overlay) = self.windows.iter_mut().find(|w| w.monitor == index) else {
                debug!("  No overlay on screen {index}, nothing to move");
                continue;
            };
            let origin = monitor.anchor(self.size);
            debug!("  Moving window on screen {index} to {origin:?}");
            display.move_overlay(overlay, origin)?;
            overlay.origin = origin;
        }
        display.flush()
    }

    /// Releases every window, continuing past individual failures.
    pub fn destroy<D: DisplayBackend>(self, display: &mut D) -> Result<()> {
        for overlay in &self.windows {
            if let Err(e) = display.destroy_overlay(overlay) {
                warn!("Failed to release overlay on screen {}: {e:#}", overlay.monitor);
            }
        }
        display.flush()
    }

    pub fn find(&self, window: u32) -> Option<&OverlayWindow> {
        self.windows.iter().find(|w| w.window == window)
    }

    pub fn iter(&self) -> impl Iterator<Item = &OverlayWindow> {
        self.windows.iter()
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }
}
