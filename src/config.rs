//! Effective configuration: defaults, then the JSON file, then CLI flags

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::cli::{FeedArgs, OverlayArgs};
use crate::monitor::OverlaySize;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OverlayConfig {
    pub width: u32,
    pub height: u32,
    pub scale: f64,
    pub bypass_compositor: bool,
    pub gamescope_overlay: bool,
    pub force_xshape: bool,
    pub title_font: String,
    pub subtitle_font: String,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            width: 340,
            height: 120,
            scale: 1.0,
            bypass_compositor: false,
            gamescope_overlay: false,
            force_xshape: false,
            title_font: "fixed".to_string(),
            subtitle_font: "fixed".to_string(),
        }
    }
}

impl OverlayConfig {
    pub fn size(&self) -> OverlaySize {
        OverlaySize::scaled(self.width, self.height, self.scale)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FeedConfig {
    pub host: String,
    pub port: u16,
    pub connect_timeout_ms: u64,
    pub symbols: Vec<String>,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 6379,
            connect_timeout_ms: 1500,
            symbols: vec!["SP500".to_string(), "ES1".to_string()],
        }
    }
}

impl FeedConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub overlay: OverlayConfig,
    pub feed: FeedConfig,
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Overrides file/default values with whatever was given on the command line.
    pub fn apply_args(&mut self, overlay: &OverlayArgs, feed: &FeedArgs) {
        let o = &mut self.overlay;
        if let Some(width) = overlay.width {
            o.width = width;
        }
        if let Some(height) = overlay.height {
            o.height = height;
        }
        if let Some(scale) = overlay.scale {
            o.scale = scale;
        }
        o.bypass_compositor |= overlay.bypass_compositor;
        o.gamescope_overlay |= overlay.gamescope_overlay;
        o.force_xshape |= overlay.force_xshape;
        if let Some(font) = &overlay.title_font {
            o.title_font = font.clone();
        }
        if let Some(font) = &overlay.subtitle_font {
            o.subtitle_font = font.clone();
        }

        let f = &mut self.feed;
        if let Some(host) = &feed.host {
            f.host = host.clone();
        }
        if let Some(port) = feed.port {
            f.port = port;
        }
        if let Some(ms) = feed.connect_timeout_ms {
            f.connect_timeout_ms = ms;
        }
        if !feed.symbols.is_empty() {
            f.symbols = feed.symbols.clone();
        }
    }

    pub fn validate(&self) -> Result<()> {
        let o = &self.overlay;
        if !o.scale.is_finite() || o.scale <= 0.0 {
            bail!("Scale must be a positive number, got {}", o.scale);
        }
        let size = o.size();
        if size.width == 0 || size.height == 0 {
            bail!("Overlay size must be non-zero, got {}x{}", size.width, size.height);
        }
        if size.width > u16::MAX as u32 || size.height > u16::MAX as u32 {
            bail!("Overlay size {}x{} is too large", size.width, size.height);
        }

        let f = &self.feed;
        if f.port == 0 {
            bail!("Feed port must be non-zero");
        }
        if f.symbols.is_empty() {
            bail!("At least one symbol is required");
        }
        if let Some(bad) = f.symbols.iter().find(|s| s.trim().is_empty()) {
            bail!("Invalid empty symbol {bad:?}");
        }
        Ok(())
    }
}
