//! Pub/sub connection speaking RESP over a plain TCP socket

use anyhow::{anyhow, Context, Result};
use log::{debug, info};
use redis::{Parser, Value};
use std::io::Write;
use std::net::{TcpStream, ToSocketAddrs};
use std::os::fd::{AsFd, BorrowedFd};
use std::time::Duration;

use super::FeedError;

/// Transport used by the feed session: write a command, read one reply.
pub trait FeedConnection {
    fn send_subscribe(&mut self, channel: &str) -> Result<(), FeedError>;

    /// Blocks until one complete reply has been decoded.
    fn read_reply(&mut self) -> Result<Value, FeedError>;
}

pub struct RedisConnection {
    stream: TcpStream,
    parser: Parser,
    peer: String,
}

impl RedisConnection {
    /// Connects to `host:port`, trying every resolved address in turn.
    pub fn connect(host: &str, port: u16, timeout: Duration) -> Result<Self> {
        let peer = format!("{host}:{port}");
        let addrs = (host, port)
            .to_socket_addrs()
            .with_context(|| format!("Failed to resolve feed server {peer}"))?;

        let mut last_err = None;
        for addr in addrs {
            debug!("Connecting to feed server at {addr}");
            match TcpStream::connect_timeout(&addr, timeout) {
                Ok(stream) => {
                    stream
                        .set_nodelay(true)
                        .context("Failed to set TCP_NODELAY on feed socket")?;
                    info!("Connected to feed server {peer}");
                    return Ok(Self {
                        stream,
                        parser: Parser::new(),
                        peer,
                    });
                }
                Err(e) => last_err = Some(e),
            }
        }

        match last_err {
            Some(e) => Err(e).with_context(|| format!("Failed to connect to feed server {peer}")),
            None => Err(anyhow!("Feed server {peer} resolved to no addresses")),
        }
    }

    pub fn peer(&self) -> &str {
        &self.peer
    }
}

impl FeedConnection for RedisConnection {
    fn send_subscribe(&mut self, channel: &str) -> Result<(), FeedError> {
        let packed = redis::cmd("SUBSCRIBE").arg(channel).get_packed_command();
        self.stream.write_all(&packed)?;
        Ok(())
    }

    fn read_reply(&mut self) -> Result<Value, FeedError> {
        self.parser.parse_value(&self.stream).map_err(FeedError::from)
    }
}

impl AsFd for RedisConnection {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.stream.as_fd()
    }
}
