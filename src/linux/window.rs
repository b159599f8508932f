//! Linux X11 overlay window creation and the properties set on it

use anyhow::{Context, Result};
use log::debug;
use x11rb::connection::Connection;
use x11rb::protocol::shape;
use x11rb::protocol::xfixes::ConnectionExt as XfixesExt;
use x11rb::protocol::xproto::{
    Atom, AtomEnum, Colormap, ConnectionExt, CreateGCAux, CreateWindowAux, EventMask, PropMode,
    Visualid, Window, WindowClass,
};
use x11rb::rust_connection::RustConnection;
use x11rb::wrapper::ConnectionExt as _;

use crate::display::Surface;
use crate::monitor::OverlaySize;

/// WM_CLASS instance and class, so compositor rules can match the overlay.
pub const WINDOW_CLASS: &[u8] = b"ticker-overlay\0ticker-overlay\0";

/// Get or intern an atom
pub fn get_atom(conn: &RustConnection, name: &str) -> Result<Atom> {
    let reply = conn
        .intern_atom(false, name.as_bytes())
        .with_context(|| format!("Failed to intern atom {name}"))?
        .reply()
        .context("Failed to get atom reply")?;
    Ok(reply.atom)
}

/// True if some client owns the `_NET_WM_CM_S<screen>` selection.
pub fn compositor_check(conn: &RustConnection, screen_num: usize) -> Result<bool> {
    let atom = get_atom(conn, &format!("_NET_WM_CM_S{screen_num}"))?;
    let owner = conn
        .get_selection_owner(atom)
        .context("Failed to query compositor selection owner")?
        .reply()
        .context("Failed to get selection owner reply")?
        .owner;
    Ok(owner != x11rb::NONE)
}

pub struct Atoms {
    pub bypass_compositor: Atom,
    pub gamescope_overlay: Atom,
}

impl Atoms {
    pub fn intern(conn: &RustConnection) -> Result<Self> {
        Ok(Self {
            bypass_compositor: get_atom(conn, "_NET_WM_BYPASS_COMPOSITOR")?,
            gamescope_overlay: get_atom(conn, "GAMESCOPE_EXTERNAL_OVERLAY")?,
        })
    }
}

/// What a new overlay window needs from the display session.
pub struct WindowTemplate {
    pub root: Window,
    pub depth: u8,
    pub visual: Visualid,
    pub colormap: Colormap,
    pub bypass_compositor: bool,
    pub gamescope_overlay: bool,
}

/// Creates and maps an override-redirect window that ignores pointer input.
/// Returns the window and a GC bound to it.
pub fn create_overlay_window(
    conn: &RustConnection,
    template: &WindowTemplate,
    atoms: &Atoms,
    origin: (i32, i32),
    size: OverlaySize,
) -> Result<Surface> {
    let window = conn.generate_id().context("Failed to allocate window id")?;
    let aux = CreateWindowAux::new()
        .override_redirect(1)
        .colormap(template.colormap)
        .background_pixel(0)
        .border_pixel(0)
        // Exposure is needed for redrawing after DPMS blanking
        .event_mask(EventMask::EXPOSURE);

    conn.create_window(
        template.depth,
        window,
        template.root,
        origin.0 as i16,
        origin.1 as i16,
        size.width as u16,
        size.height as u16,
        0,
        WindowClass::INPUT_OUTPUT,
        template.visual,
        &aux,
    )
    .context("Failed to create overlay window")?;
    conn.map_window(window).context("Failed to map overlay window")?;

    // Empty input region: the pointer always passes through
    let region = conn.generate_id().context("Failed to allocate region id")?;
    conn.xfixes_create_region(region, &[])
        .context("Failed to create empty input region")?;
    conn.xfixes_set_window_shape_region(window, shape::SK::INPUT, 0, 0, region)
        .context("Failed to set input shape")?;
    conn.xfixes_destroy_region(region)
        .context("Failed to destroy input region")?;

    conn.change_property8(
        PropMode::REPLACE,
        window,
        AtomEnum::WM_CLASS,
        AtomEnum::STRING,
        WINDOW_CLASS,
    )
    .context("Failed to set WM_CLASS")?;

    if template.bypass_compositor {
        debug!("Bypassing compositor");
        set_cardinal_flag(conn, window, atoms.bypass_compositor)?;
    }
    if template.gamescope_overlay {
        debug!("Setting GAMESCOPE_EXTERNAL_OVERLAY");
        set_cardinal_flag(conn, window, atoms.gamescope_overlay)?;
    }

    let gc = conn.generate_id().context("Failed to allocate GC id")?;
    conn.create_gc(gc, window, &CreateGCAux::new().graphics_exposures(0))
        .context("Failed to create overlay GC")?;

    Ok(Surface {
        drawable: window,
        gc,
        width: size.width,
        height: size.height,
    })
}

/// Allocates the 1-bit pixmap and GC used to build the bounding shape.
pub fn create_mask_surface(conn: &RustConnection, window: Window, size: OverlaySize) -> Result<Surface> {
    let pixmap = conn.generate_id().context("Failed to allocate pixmap id")?;
    conn.create_pixmap(1, pixmap, window, size.width as u16, size.height as u16)
        .context("Failed to create shape mask pixmap")?;

    let gc = conn.generate_id().context("Failed to allocate GC id")?;
    conn.create_gc(gc, pixmap, &CreateGCAux::new().graphics_exposures(0))
        .context("Failed to create shape mask GC")?;

    Ok(Surface {
        drawable: pixmap,
        gc,
        width: size.width,
        height: size.height,
    })
}

fn set_cardinal_flag(conn: &RustConnection, window: Window, property: Atom) -> Result<()> {
    conn.change_property32(PropMode::REPLACE, window, property, AtomEnum::CARDINAL, &[1])
        .context("Failed to set window property")?;
    Ok(())
}
