//! Title/subtitle painting with X core fonts

use anyhow::{Context, Result};
use log::{debug, warn};
use x11rb::connection::Connection;
use x11rb::protocol::xproto::{ChangeGCAux, ConnectionExt, Font, Rectangle};
use x11rb::rust_connection::RustConnection;

use crate::display::{RenderMode, Surface};
use crate::format::DisplayAttributes;

/// Always available on any X server.
const FALLBACK_FONT: &str = "fixed";

struct LoadedFont {
    id: Font,
    ascent: i16,
    descent: i16,
}

impl LoadedFont {
    fn open(conn: &RustConnection, name: &str) -> Result<Self> {
        let id = conn.generate_id().context("Failed to allocate font id")?;
        let opened = conn
            .open_font(id, name.as_bytes())
            .context("Failed to send OpenFont")?
            .check();
        if let Err(e) = opened {
            if name == FALLBACK_FONT {
                return Err(e).context("Failed to open the fallback font");
            }
            warn!("Font {name:?} unavailable ({e}), using {FALLBACK_FONT:?}");
            return Self::open(conn, FALLBACK_FONT);
        }

        let info = conn
            .query_font(id)
            .context("Failed to query font")?
            .reply()
            .context("Failed to get font reply")?;
        debug!("Opened font {name:?} ascent {} descent {}", info.font_ascent, info.font_descent);
        Ok(Self {
            id,
            ascent: info.font_ascent,
            descent: info.font_descent,
        })
    }
}

/// Draws the title above the subtitle in the top-left of a surface.
pub struct CoreTextRenderer {
    title: LoadedFont,
    subtitle: LoadedFont,
    padding: i16,
}

impl CoreTextRenderer {
    pub fn new(conn: &RustConnection, title_font: &str, subtitle_font: &str, scale: f64) -> Result<Self> {
        Ok(Self {
            title: LoadedFont::open(conn, title_font)?,
            subtitle: LoadedFont::open(conn, subtitle_font)?,
            padding: (10.0 * scale) as i16,
        })
    }

    pub fn render(
        &self,
        conn: &RustConnection,
        surface: &Surface,
        mode: RenderMode,
        attrs: &DisplayAttributes,
    ) -> Result<()> {
        let (foreground, background) = match mode {
            RenderMode::Content => (attrs.color.to_argb_pixel(), 0),
            // The bounding shape does the cut-out, so paint at full strength
            RenderMode::ContentForMask => (attrs.color.opaque().to_argb_pixel(), 0),
            RenderMode::Mask => (1, 0),
        };

        match mode {
            RenderMode::Content | RenderMode::ContentForMask => {
                conn.clear_area(false, surface.drawable, 0, 0, 0, 0)
                    .context("Failed to clear overlay")?;
            }
            RenderMode::Mask => {
                conn.change_gc(surface.gc, &ChangeGCAux::new().foreground(0))
                    .context("Failed to update mask GC")?;
                conn.poly_fill_rectangle(
                    surface.drawable,
                    surface.gc,
                    &[Rectangle {
                        x: 0,
                        y: 0,
                        width: surface.width as u16,
                        height: surface.height as u16,
                    }],
                )
                .context("Failed to clear shape mask")?;
            }
        }

        let title_baseline = self.padding + self.title.ascent;
        let subtitle_baseline = title_baseline + self.title.descent + self.subtitle.ascent;

        for (font, text, baseline) in [
            (&self.title, attrs.title.as_str(), title_baseline),
            (&self.subtitle, attrs.subtitle.as_str(), subtitle_baseline),
        ] {
            if text.is_empty() {
                continue;
            }
            let aux = ChangeGCAux::new()
                .foreground(foreground)
                .background(background)
                .font(font.id);
            conn.change_gc(surface.gc, &aux)
                .context("Failed to update text GC")?;
            conn.image_text8(surface.drawable, surface.gc, self.padding, baseline, &latin1(text))
                .context("Failed to draw text")?;
        }
        Ok(())
    }

    pub fn close(&self, conn: &RustConnection) -> Result<()> {
        conn.close_font(self.title.id).context("Failed to close font")?;
        conn.close_font(self.subtitle.id).context("Failed to close font")?;
        Ok(())
    }
}

/// Core fonts take at most 255 single-byte characters per request.
fn latin1(text: &str) -> Vec<u8> {
    text.chars()
        .take(255)
        .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
        .collect()
}
