//! Live quote feed: transport, record parsing and the ingest session

pub mod connection;
pub mod record;
pub mod session;

use thiserror::Error;

pub use connection::{FeedConnection, RedisConnection};
pub use record::StockObservation;
pub use session::{FeedSession, Outcome};

/// Connection-level failure. Always fatal for the event loop.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("feed socket error: {0}")]
    Io(#[from] std::io::Error),
    #[error("feed connection closed")]
    Closed,
    #[error("feed protocol error: {0}")]
    Protocol(String),
}

impl From<redis::RedisError> for FeedError {
    fn from(err: redis::RedisError) -> Self {
        if err.is_connection_dropped() {
            FeedError::Closed
        } else {
            FeedError::Protocol(err.to_string())
        }
    }
}
