//! Monitor rectangles and overlay anchoring

/// One monitor as reported by the multi-monitor layout query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorRect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl MonitorRect {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// Origin of an overlay of the given size whose bottom-right corner
    /// sits on this monitor's bottom-right corner.
    pub fn anchor(&self, size: OverlaySize) -> (i32, i32) {
        (
            self.x + self.width as i32 - size.width as i32,
            self.y + self.height as i32 - size.height as i32,
        )
    }
}

/// Overlay client size after applying the scale factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlaySize {
    pub width: u32,
    pub height: u32,
}

impl OverlaySize {
    /// Scales the configured size, truncating like an integer cast.
    pub fn scaled(width: u32, height: u32, scale: f64) -> Self {
        Self {
            width: (width as f64 * scale) as u32,
            height: (height as f64 * scale) as u32,
        }
    }
}

/// A full monitor layout snapshot. Replaced wholesale on every change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Topology {
    monitors: Vec<MonitorRect>,
}

impl Topology {
    pub fn new(monitors: Vec<MonitorRect>) -> Self {
        Self { monitors }
    }

    pub fn len(&self) -> usize {
        self.monitors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.monitors.is_empty()
    }

    #[cfg(test)]
    pub fn get(&self, index: usize) -> Option<&MonitorRect> {
        self.monitors.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &MonitorRect)> {
        self.monitors.iter().enumerate()
    }
}
