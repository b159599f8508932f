//! Bounded readiness wait over a fixed set of file descriptors

use log::trace;
use nix::errno::Errno;
use nix::poll::{poll, PollFd, PollFlags, PollTimeout};
use std::os::fd::BorrowedFd;
use thiserror::Error;

/// Upper bound on a single wait; doubles as the loop's periodic tick.
pub const TICK_MS: u16 = 100;

#[derive(Debug, Error, PartialEq)]
pub enum WaitError {
    #[error("wait interrupted by a signal")]
    Interrupted,
    #[error("poll failed: {0}")]
    Failed(Errno),
}

/// Blocks until one of `sources` is readable or `timeout_ms` elapses.
/// Hang-up and error conditions count as ready so the owner sees them.
pub fn wait<const N: usize>(
    sources: [BorrowedFd<'_>; N],
    timeout_ms: u16,
) -> Result<[bool; N], WaitError> {
    let mut fds = sources.map(|fd| PollFd::new(fd, PollFlags::POLLIN));

    trace!("Waiting up to {timeout_ms} ms on {N} sources");
    match poll(&mut fds, PollTimeout::from(timeout_ms)) {
        Ok(_) => {}
        Err(Errno::EINTR) => return Err(WaitError::Interrupted),
        Err(e) => return Err(WaitError::Failed(e)),
    }

    let readable = PollFlags::POLLIN | PollFlags::POLLHUP | PollFlags::POLLERR;
    Ok(fds.map(|fd| fd.revents().is_some_and(|r| r.intersects(readable))))
}
