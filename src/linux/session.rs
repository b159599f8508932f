//! Linux X11 display session: connection, extensions, visual and overlays

use anyhow::{anyhow, bail, Context, Result};
use log::{debug, info, warn};
use std::os::fd::{AsFd, BorrowedFd};
use x11rb::connection::{Connection, RequestConnection};
use x11rb::protocol::randr::{self, ConnectionExt as RandrExt};
use x11rb::protocol::shape::{self, ConnectionExt as ShapeExt};
use x11rb::protocol::xfixes::{self, ConnectionExt as XfixesExt};
use x11rb::protocol::xproto::{
    ColormapAlloc, ConfigureWindowAux, ConnectionExt, Depth, VisualClass, Visualid,
};
use x11rb::protocol::Event;
use x11rb::rust_connection::RustConnection;

use super::display::query_monitors;
use super::render::CoreTextRenderer;
use super::window::{compositor_check, create_mask_surface, create_overlay_window, Atoms, WindowTemplate};
use crate::config::OverlayConfig;
use crate::display::{DisplayBackend, DisplayEvent, Redraw, RenderMode};
use crate::format::DisplayAttributes;
use crate::monitor::{OverlaySize, Topology};
use crate::overlay::OverlayWindow;

/// Overlays need per-pixel alpha.
const COLOR_DEPTH: u8 = 32;

/// Extensions checked at startup, with the reason shown when one is missing.
const REQUIRED_EXTENSIONS: [(&str, &str); 3] = [
    (
        randr::X11_EXTENSION_NAME,
        "It is needed for handling screen size change (e.g. in virtual machine window)",
    ),
    (xfixes::X11_EXTENSION_NAME, "It is needed for click-through"),
    (shape::X11_EXTENSION_NAME, "It is needed for click-through"),
];

pub struct X11Session {
    conn: RustConnection,
    template: WindowTemplate,
    atoms: Atoms,
    renderer: CoreTextRenderer,
    compositor_running: bool,
}

impl X11Session {
    pub fn open(config: &OverlayConfig) -> Result<Self> {
        debug!("Opening display");
        let (conn, screen_num) =
            RustConnection::connect(None).context("Failed to connect to X11 display")?;
        let screen = conn
            .setup()
            .roots
            .get(screen_num)
            .cloned()
            .ok_or_else(|| anyhow!("X11 screen {screen_num} not found"))?;
        let root = screen.root;

        debug!("Checking compositor");
        let mut compositor_running = compositor_check(&conn, screen_num)?;
        if !compositor_running {
            info!("No running compositor detected. Program may not work as intended");
        }
        if config.force_xshape {
            debug!("Forcing XShape");
            compositor_running = false;
        }

        for (name, why) in REQUIRED_EXTENSIONS {
            require_extension(&conn, name, why)?;
        }

        debug!("Initializing Xrandr");
        conn.randr_query_version(1, 2)
            .context("Failed to query RandR version")?
            .reply()
            .context("Failed to get RandR version reply")?;
        debug!("Subscribing on screen change events");
        conn.randr_select_input(root, randr::NotifyMask::SCREEN_CHANGE)
            .context("Failed to select RandR input")?;

        conn.xfixes_query_version(5, 0)
            .context("Failed to query XFixes version")?
            .reply()
            .context("Failed to get XFixes version reply")?;
        conn.shape_query_version()
            .context("Failed to query Shape version")?
            .reply()
            .context("Failed to get Shape version reply")?;

        debug!("Checking default screen to be {COLOR_DEPTH} bit color depth");
        let visual = find_visual(&screen.allowed_depths, COLOR_DEPTH).ok_or_else(|| {
            anyhow!("No screens supporting {COLOR_DEPTH} bit color found, terminating")
        })?;
        let colormap = conn.generate_id().context("Failed to allocate colormap id")?;
        conn.create_colormap(ColormapAlloc::NONE, colormap, root, visual)
            .context("Failed to create colormap")?;
        debug!("Set {COLOR_DEPTH} bit color depth");

        let atoms = Atoms::intern(&conn)?;
        let renderer =
            CoreTextRenderer::new(&conn, &config.title_font, &config.subtitle_font, config.scale)?;

        Ok(Self {
            template: WindowTemplate {
                root,
                depth: COLOR_DEPTH,
                visual,
                colormap,
                bypass_compositor: config.bypass_compositor,
                gamescope_overlay: config.gamescope_overlay,
            },
            conn,
            atoms,
            renderer,
            compositor_running,
        })
    }

    fn classify(&self, event: Event) -> DisplayEvent {
        match event {
            Event::RandrScreenChangeNotify(_) => DisplayEvent::ScreenChange,
            Event::Expose(e) => DisplayEvent::Expose {
                window: e.window,
                last: e.count == 0,
            },
            Event::RandrNotify(e) => {
                DisplayEvent::Other(format!("RandrNotify subcode {}", u8::from(e.sub_code)))
            }
            Event::Error(e) => DisplayEvent::Other(format!("X error {:?}", e.error_kind)),
            other => DisplayEvent::Other(event_name(&other).to_string()),
        }
    }
}

impl DisplayBackend for X11Session {
    fn compositor_running(&self) -> bool {
        self.compositor_running
    }

    fn query_monitors(&self) -> Result<Topology> {
        query_monitors(&self.conn)
    }

    fn create_overlay(
        &mut self,
        monitor: usize,
        origin: (i32, i32),
        size: OverlaySize,
    ) -> Result<OverlayWindow> {
        let content = create_overlay_window(&self.conn, &self.template, &self.atoms, origin, size)?;
        let mask = if self.compositor_running {
            None
        } else {
            debug!("Creating mask pixmap for XShape support");
            Some(create_mask_surface(&self.conn, content.drawable, size)?)
        };

        Ok(OverlayWindow {
            monitor,
            window: content.drawable,
            origin,
            content,
            mask,
        })
    }

    fn move_overlay(&mut self, overlay: &OverlayWindow, origin: (i32, i32)) -> Result<()> {
        self.conn
            .configure_window(overlay.window, &ConfigureWindowAux::new().x(origin.0).y(origin.1))
            .context("Failed to move overlay window")?;
        Ok(())
    }

    fn destroy_overlay(&mut self, overlay: &OverlayWindow) -> Result<()> {
        self.conn
            .unmap_window(overlay.window)
            .context("Failed to unmap overlay window")?;
        self.conn
            .free_gc(overlay.content.gc)
            .context("Failed to free overlay GC")?;
        if let Some(mask) = &overlay.mask {
            self.conn.free_pixmap(mask.drawable).context("Failed to free mask pixmap")?;
            self.conn.free_gc(mask.gc).context("Failed to free mask GC")?;
        }
        self.conn
            .destroy_window(overlay.window)
            .context("Failed to destroy overlay window")?;
        Ok(())
    }

    fn next_event(&mut self) -> Result<Option<DisplayEvent>> {
        let event = self
            .conn
            .poll_for_event()
            .context("Failed to read X11 event")?;
        Ok(event.map(|e| self.classify(e)))
    }

    fn redraw(
        &mut self,
        overlay: &OverlayWindow,
        redraw: Redraw,
        attrs: &DisplayAttributes,
    ) -> Result<()> {
        let passes = redraw.passes(overlay.mask.is_some());
        if redraw == Redraw::Shaped && overlay.mask.is_none() {
            warn!("No shape mask for overlay {}, drawing content only", overlay.monitor);
        }
        for &mode in passes {
            let surface = match (mode, &overlay.mask) {
                (RenderMode::Mask, Some(mask)) => mask,
                _ => &overlay.content,
            };
            self.renderer.render(&self.conn, surface, mode, attrs)?;
        }

        if let (true, Some(mask)) = (passes.contains(&RenderMode::Mask), &overlay.mask) {
            debug!("Shaping window {} using XShape", overlay.monitor);
            self.conn
                .shape_mask(
                    shape::SO::SET,
                    shape::SK::BOUNDING,
                    overlay.window,
                    0,
                    0,
                    mask.drawable,
                )
                .context("Failed to combine shape mask")?;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.conn.flush().context("Failed to flush X11 connection")?;
        Ok(())
    }
}

impl AsFd for X11Session {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.conn.stream().as_fd()
    }
}

impl Drop for X11Session {
    fn drop(&mut self) {
        let released = self
            .renderer
            .close(&self.conn)
            .and_then(|()| {
                self.conn
                    .free_colormap(self.template.colormap)
                    .context("Failed to free colormap")?;
                self.conn.flush().context("Failed to flush X11 connection")?;
                Ok(())
            });
        if let Err(e) = released {
            warn!("Failed to release display resources: {e:#}");
        }
        debug!("Closing X11 display connection");
    }
}

fn require_extension(conn: &RustConnection, name: &'static str, why: &str) -> Result<()> {
    let present = conn
        .extension_information(name)
        .context("Failed to query X extensions")?
        .is_some();
    if !present {
        bail!("Required X extension {name} is not active. {why}");
    }
    Ok(())
}

/// First TrueColor visual of the requested depth.
fn find_visual(depths: &[Depth], depth: u8) -> Option<Visualid> {
    depths
        .iter()
        .filter(|d| d.depth == depth)
        .flat_map(|d| d.visuals.iter())
        .find(|v| v.class == VisualClass::TRUE_COLOR)
        .map(|v| v.visual_id)
}

fn event_name(event: &Event) -> &'static str {
    match event {
        Event::MapNotify(_) => "MapNotify",
        Event::UnmapNotify(_) => "UnmapNotify",
        Event::ConfigureNotify(_) => "ConfigureNotify",
        Event::ReparentNotify(_) => "ReparentNotify",
        Event::VisibilityNotify(_) => "VisibilityNotify",
        Event::PropertyNotify(_) => "PropertyNotify",
        Event::DestroyNotify(_) => "DestroyNotify",
        Event::NoExposure(_) => "NoExposure",
        Event::GraphicsExposure(_) => "GraphicsExposure",
        _ => "unhandled event",
    }
}
