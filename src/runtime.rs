//! Single-threaded event loop over the display connection and the feed socket

use anyhow::{Context, Result};
use log::{debug, error, info, trace};
use std::os::fd::AsFd;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::display::{DisplayBackend, DisplayEvent, Redraw};
use crate::feed::{FeedConnection, FeedSession, Outcome};
use crate::format::DisplayAttributes;
use crate::monitor::{OverlaySize, Topology};
use crate::overlay::OverlayPool;
use crate::reactor::{self, WaitError, TICK_MS};

/// Which sources the last wait reported ready.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Ready {
    pub display: bool,
    pub feed: bool,
}

pub struct Runtime<D, C> {
    display: D,
    feed: FeedSession<C>,
    topology: Topology,
    overlays: OverlayPool,
    attrs: DisplayAttributes,
    stop: Arc<AtomicBool>,
}

impl<D: DisplayBackend, C: FeedConnection> Runtime<D, C> {
    /// Queries the monitor layout and creates the overlay windows.
    pub fn new(
        mut display: D,
        feed: FeedSession<C>,
        size: OverlaySize,
        stop: Arc<AtomicBool>,
    ) -> Result<Self> {
        let topology = display.query_monitors()?;
        debug!("Found {} screen(s)", topology.len());
        let overlays = OverlayPool::create(&mut display, &topology, size)?;

        Ok(Self {
            display,
            feed,
            topology,
            overlays,
            attrs: DisplayAttributes::default(),
            stop,
        })
    }

    /// Handles one tick worth of work after the wait returned.
    pub fn dispatch(&mut self, ready: Ready) -> Result<()> {
        trace!("Tick: display ready {}, feed ready {}", ready.display, ready.feed);
        if ready.feed {
            self.on_feed_ready()?;
        }
        self.drain_display()
    }

    fn on_feed_ready(&mut self) -> Result<()> {
        let outcome = self
            .feed
            .receive_one()
            .context("Feed connection error")?;
        if outcome != Outcome::Updated {
            return Ok(());
        }

        self.attrs = DisplayAttributes::from_observation(self.feed.observation());
        info!("Text now set to {:?}, {} overlay(s)", self.attrs.title, self.overlays.len());
        // Content only: the bounding shape is refreshed on the next exposure
        for overlay in self.overlays.iter() {
            self.display.redraw(overlay, Redraw::Content, &self.attrs)?;
        }
        self.display.flush()
    }

    fn drain_display(&mut self) -> Result<()> {
        while let Some(event) = self.display.next_event()? {
            self.on_display_event(event)?;
        }
        self.display.flush()
    }

    fn on_display_event(&mut self, event: DisplayEvent) -> Result<()> {
        match event {
            DisplayEvent::ScreenChange => {
                info!("Got screen change notification, updating screen sizes");
                self.topology = self.display.query_monitors()?;
                self.overlays.reposition(&mut self.display, &self.topology)?;
            }
            DisplayEvent::Expose { window, last: true } => {
                let Some(overlay) = self.overlays.find(window) else {
                    debug!("Exposure for unknown window 0x{window:x}");
                    return Ok(());
                };
                let redraw = if self.display.compositor_running() {
                    Redraw::Content
                } else {
                    Redraw::Shaped
                };
                debug!("Redrawing overlay on screen {} ({redraw:?})", overlay.monitor);
                self.display.redraw(overlay, redraw, &self.attrs)?;
            }
            DisplayEvent::Expose { window, last: false } => {
                debug!("Skipping non-final exposure for window 0x{window:x}");
            }
            DisplayEvent::Other(kind) => debug!("Got X event: {kind}"),
        }
        Ok(())
    }

    /// Releases windows, then the display connection, then the feed.
    pub fn teardown(self) -> Result<()> {
        let Self {
            mut display,
            feed,
            overlays,
            ..
        } = self;
        let released = overlays.destroy(&mut display);
        drop(display);
        drop(feed);
        released
    }
}

impl<D, C> Runtime<D, C>
where
    D: DisplayBackend + AsFd,
    C: FeedConnection + AsFd,
{
    /// Runs until a fatal error or a termination request, then tears down.
    pub fn run(mut self) -> Result<()> {
        info!("All done. Going into the event loop");
        let result = self.event_loop();
        if let Err(e) = &result {
            error!("Event loop stopped: {e:#}");
        }
        let released = self.teardown();
        result.and(released)
    }

    fn event_loop(&mut self) -> Result<()> {
        loop {
            if self.stop.load(Ordering::SeqCst) {
                info!("Termination requested, shutting down");
                return Ok(());
            }

            let sources = [self.display.as_fd(), self.feed.connection().as_fd()];
            let ready = match reactor::wait(sources, TICK_MS) {
                Ok([display, feed]) => Ready { display, feed },
                Err(WaitError::Interrupted) => continue,
                Err(e) => return Err(e).context("Waiting on display and feed sockets failed"),
            };
            self.dispatch(ready)?;
        }
    }
}
