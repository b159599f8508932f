//! Linux X11 monitor layout using the Xinerama extension

use anyhow::{bail, Context, Result};
use x11rb::connection::{Connection, RequestConnection};
use x11rb::protocol::xinerama::{self, ConnectionExt as XineramaExt};
use x11rb::rust_connection::RustConnection;

use crate::monitor::{MonitorRect, Topology};

/// Queries the current monitor rectangles. A missing Xinerama extension is
/// an error: without a layout there is nowhere to put the overlays.
pub fn query_monitors(conn: &RustConnection) -> Result<Topology> {
    if conn
        .extension_information(xinerama::X11_EXTENSION_NAME)
        .context("Failed to query X extensions")?
        .is_none()
    {
        bail!("Required X extension Xinerama is not active. It is needed for displaying the overlay on multiple screens");
    }

    let reply = conn
        .xinerama_query_screens()
        .context("Failed to query Xinerama screens")?
        .reply()
        .context("Failed to get Xinerama screens reply")?;

    let monitors = reply
        .screen_info
        .iter()
        .map(|info| {
            MonitorRect::new(
                info.x_org as i32,
                info.y_org as i32,
                info.width as u32,
                info.height as u32,
            )
        })
        .collect();

    Ok(Topology::new(monitors))
}

/// Opens a throwaway connection and returns the layout, for listing.
pub fn list_monitors() -> Result<Topology> {
    let (conn, _) = RustConnection::connect(None).context("Failed to connect to X11 display")?;
    let topology = query_monitors(&conn)?;
    conn.flush().context("Failed to flush X11 connection")?;
    Ok(topology)
}
