//! In-memory display backend and feed transport for tests

use anyhow::{anyhow, Result};
use redis::Value;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::os::fd::{AsFd, BorrowedFd};
use std::os::unix::net::UnixStream;
use std::rc::Rc;

use crate::display::{DisplayBackend, DisplayEvent, Redraw, Surface};
use crate::feed::{FeedConnection, FeedError};
use crate::format::DisplayAttributes;
use crate::monitor::{OverlaySize, Topology};
use crate::overlay::OverlayWindow;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Create { monitor: usize, window: u32, origin: (i32, i32) },
    Move { window: u32, origin: (i32, i32) },
    Destroy { window: u32, had_mask: bool },
    Redraw { window: u32, redraw: Redraw, title: String },
}

pub struct MockDisplay {
    pub compositor: bool,
    pub topology: Topology,
    pub events: VecDeque<DisplayEvent>,
    pub calls: Vec<Call>,
    /// Windows destroyed so far; shared so it outlives a consumed runtime.
    pub destroyed: Rc<RefCell<Vec<u32>>>,
    next_id: u32,
    // Never written to, so the display side of a wait stays idle
    socket: UnixStream,
    _peer: UnixStream,
}

impl MockDisplay {
    pub fn new(topology: Topology, compositor: bool) -> Self {
        let (socket, peer) = UnixStream::pair().unwrap();
        Self {
            compositor,
            topology,
            events: VecDeque::new(),
            calls: Vec::new(),
            destroyed: Rc::new(RefCell::new(Vec::new())),
            next_id: 0x0040_0001,
            socket,
            _peer: peer,
        }
    }

    pub fn push_event(&mut self, event: DisplayEvent) {
        self.events.push_back(event);
    }

    fn alloc(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn redraws(&self) -> Vec<(u32, Redraw)> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::Redraw { window, redraw, .. } => Some((*window, *redraw)),
                _ => None,
            })
            .collect()
    }
}

impl DisplayBackend for MockDisplay {
    fn compositor_running(&self) -> bool {
        self.compositor
    }

    fn query_monitors(&self) -> Result<Topology> {
        Ok(self.topology.clone())
    }

    fn create_overlay(
        &mut self,
        monitor: usize,
        origin: (i32, i32),
        size: OverlaySize,
    ) -> Result<OverlayWindow> {
        let window = self.alloc();
        let content = Surface {
            drawable: window,
            gc: self.alloc(),
            width: size.width,
            height: size.height,
        };
        let mask = if self.compositor {
            None
        } else {
            Some(Surface {
                drawable: self.alloc(),
                gc: self.alloc(),
                width: size.width,
                height: size.height,
            })
        };
        self.calls.push(Call::Create { monitor, window, origin });
        Ok(OverlayWindow {
            monitor,
            window,
            origin,
            content,
            mask,
        })
    }

    fn move_overlay(&mut self, overlay: &OverlayWindow, origin: (i32, i32)) -> Result<()> {
        self.calls.push(Call::Move {
            window: overlay.window,
            origin,
        });
        Ok(())
    }

    fn destroy_overlay(&mut self, overlay: &OverlayWindow) -> Result<()> {
        self.calls.push(Call::Destroy {
            window: overlay.window,
            had_mask: overlay.mask.is_some(),
        });
        self.destroyed.borrow_mut().push(overlay.window);
        Ok(())
    }

    fn next_event(&mut self) -> Result<Option<DisplayEvent>> {
        Ok(self.events.pop_front())
    }

    fn redraw(
        &mut self,
        overlay: &OverlayWindow,
        redraw: Redraw,
        attrs: &DisplayAttributes,
    ) -> Result<()> {
        if redraw == Redraw::Shaped && overlay.mask.is_none() {
            return Err(anyhow!("shaped redraw of window {} without a mask", overlay.window));
        }
        self.calls.push(Call::Redraw {
            window: overlay.window,
            redraw,
            title: attrs.title.clone(),
        });
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

impl AsFd for MockDisplay {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.socket.as_fd()
    }
}

/// Replays canned replies; running out behaves like a closed socket.
pub struct MockFeed {
    pub replies: VecDeque<Value>,
    pub subscribed: Vec<String>,
    socket: UnixStream,
    _peer: Option<UnixStream>,
}

impl MockFeed {
    /// The peer end is already closed, so every wait reports the feed ready.
    pub fn with_replies(replies: Vec<Value>) -> Self {
        let mut feed = Self::idle(replies);
        feed._peer = None;
        feed
    }

    /// The peer end stays open and silent, so waits time out.
    pub fn idle(replies: Vec<Value>) -> Self {
        let (socket, peer) = UnixStream::pair().unwrap();
        Self {
            replies: replies.into(),
            subscribed: Vec::new(),
            socket,
            _peer: Some(peer),
        }
    }
}

impl AsFd for MockFeed {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.socket.as_fd()
    }
}

impl FeedConnection for MockFeed {
    fn send_subscribe(&mut self, channel: &str) -> Result<(), FeedError> {
        self.subscribed.push(channel.to_string());
        Ok(())
    }

    fn read_reply(&mut self) -> Result<Value, FeedError> {
        self.replies.pop_front().ok_or(FeedError::Closed)
    }
}

pub fn bulk(s: &str) -> Value {
    Value::BulkString(s.as_bytes().to_vec())
}

pub fn message(channel: &str, payload: &str) -> Value {
    Value::Array(vec![bulk("message"), bulk(channel), bulk(payload)])
}

pub fn confirmation(channel: &str, count: i64) -> Value {
    Value::Array(vec![bulk("subscribe"), bulk(channel), Value::Int(count)])
}
