//! Linux X11 support module
//!
//! Provides the monitor layout query, overlay window creation, core-font
//! rendering and the display session that ties them to the event loop.

pub mod display;
pub mod render;
pub mod session;
pub mod window;

// Re-export commonly used types
pub use display::list_monitors;
pub use session::X11Session;
