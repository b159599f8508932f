//! Display-server seam used by the overlay pool and the event loop

use anyhow::Result;

use crate::format::DisplayAttributes;
use crate::monitor::{OverlaySize, Topology};
use crate::overlay::OverlayWindow;

/// A drawable plus the graphics context bound to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Surface {
    pub drawable: u32,
    pub gc: u32,
    pub width: u32,
    pub height: u32,
}

/// How a window gets repainted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Redraw {
    /// Content surface only. The bounding shape is left as it was.
    Content,
    /// Content, then mask, then the mask is set as the bounding shape.
    Shaped,
}

impl Redraw {
    /// Renderer passes for a window, in order. Windows with a mask always
    /// get opaque content so the text looks the same after either redraw.
    pub fn passes(self, has_mask: bool) -> &'static [RenderMode] {
        match (self, has_mask) {
            (Redraw::Shaped, true) => &[RenderMode::ContentForMask, RenderMode::Mask],
            (Redraw::Content, true) => &[RenderMode::ContentForMask],
            (_, false) => &[RenderMode::Content],
        }
    }
}

/// Paint modes understood by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    Content,
    Mask,
    /// Content painted ahead of a mask pass.
    ContentForMask,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayEvent {
    ScreenChange,
    /// `last` is set on the final exposure in a queued series for a window.
    Expose { window: u32, last: bool },
    Other(String),
}

pub trait DisplayBackend {
    fn compositor_running(&self) -> bool;

    /// Current monitor layout. Fails if the multi-monitor extension is missing.
    fn query_monitors(&self) -> Result<Topology>;

    fn create_overlay(
        &mut self,
        monitor: usize,
        origin: (i32, i32),
        size: OverlaySize,
    ) -> Result<OverlayWindow>;

    fn move_overlay(&mut self, overlay: &OverlayWindow, origin: (i32, i32)) -> Result<()>;

    fn destroy_overlay(&mut self, overlay: &OverlayWindow) -> Result<()>;

    /// Next already-queued event, without blocking.
    fn next_event(&mut self) -> Result<Option<DisplayEvent>>;

    fn redraw(
        &mut self,
        overlay: &OverlayWindow,
        redraw: Redraw,
        attrs: &DisplayAttributes,
    ) -> Result<()>;

    fn flush(&mut self) -> Result<()>;
}
