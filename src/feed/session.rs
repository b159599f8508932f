//! Feed ingest: subscription, envelope dispatch and timestamp deduplication

use log::{debug, info, warn};
use redis::Value;

use super::connection::FeedConnection;
use super::record::{parse_record, ParseError, StockObservation};
use super::FeedError;

/// What a single `receive_one` call did to the shared observation.
#[derive(Debug, PartialEq)]
pub enum Outcome {
    /// A newer observation replaced the shared record.
    Updated,
    /// Well-formed but not newer than the watermark.
    Stale,
    /// Malformed payload; shared record untouched.
    Rejected(ParseError),
    /// Subscription (re)confirmation.
    Subscribed { channel: String, count: i64 },
    /// Any other reply shape.
    Ignored,
}

/// A decoded pub/sub envelope.
#[derive(Debug, PartialEq)]
enum Envelope {
    Message { channel: String, payload: String },
    Subscribe { channel: String, count: i64 },
    Other(String),
}

pub struct FeedSession<C> {
    conn: C,
    symbols: Vec<String>,
    observation: StockObservation,
    watermark: i64,
}

impl<C: FeedConnection> FeedSession<C> {
    pub fn new(conn: C, symbols: Vec<String>) -> Self {
        Self {
            conn,
            symbols,
            observation: StockObservation::default(),
            watermark: 0,
        }
    }

    /// Subscribes to every configured channel, one request each.
    /// Malformed confirmations are logged; socket failures are returned.
    pub fn subscribe(&mut self) -> Result<(), FeedError> {
        for symbol in &self.symbols {
            self.conn.send_subscribe(symbol)?;
            info!("Subscribed to symbol: {symbol}");

            match classify(self.conn.read_reply()?) {
                Envelope::Subscribe { channel, count } => {
                    debug!("Subscription confirmed for {channel} ({count} active)");
                }
                other => warn!("Unexpected subscription reply for {symbol}: {other:?}"),
            }
        }
        Ok(())
    }

    /// Reads exactly one envelope. An `Err` means the connection is unusable.
    pub fn receive_one(&mut self) -> Result<Outcome, FeedError> {
        let envelope = classify(self.conn.read_reply()?);
        let outcome = match envelope {
            Envelope::Message { channel, payload } => {
                debug!("Feed message on {channel}: {payload}");
                match self.ingest(&payload, &channel) {
                    Ok(true) => {
                        info!("Stock data updated for {channel} to {payload}");
                        Outcome::Updated
                    }
                    Ok(false) => {
                        debug!("Ignoring stale message {channel}:{payload}");
                        Outcome::Stale
                    }
                    Err(e) => {
                        warn!("Error parsing stock data {payload:?}: {e}");
                        Outcome::Rejected(e)
                    }
                }
            }
            Envelope::Subscribe { channel, count } => {
                info!("Successfully subscribed to channel: {channel}");
                Outcome::Subscribed { channel, count }
            }
            Envelope::Other(shape) => {
                warn!("Unexpected feed reply: {shape}");
                Outcome::Ignored
            }
        };
        Ok(outcome)
    }

    /// Parses `payload` and applies the watermark. Returns whether the
    /// watermark strictly advanced. On error nothing is modified.
    pub fn ingest(&mut self, payload: &str, channel: &str) -> Result<bool, ParseError> {
        let mut parsed = parse_record(payload, channel)?;
        if parsed.time > self.watermark {
            self.watermark = parsed.time;
            parsed.updated = true;
            info!("Seeing updated data for {} at {}", parsed.symbol, parsed.formatted_time);
            self.observation = parsed;
        } else {
            self.observation.updated = false;
        }
        Ok(self.observation.updated)
    }

    pub fn observation(&self) -> &StockObservation {
        &self.observation
    }

    #[cfg(test)]
    pub fn watermark(&self) -> i64 {
        self.watermark
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn connection(&self) -> &C {
        &self.conn
    }
}

fn text(value: &Value) -> Option<String> {
    match value {
        Value::BulkString(bytes) => Some(String::from_utf8_lossy(bytes).into_owned()),
        Value::SimpleString(s) => Some(s.clone()),
        _ => None,
    }
}

fn classify(reply: Value) -> Envelope {
    let Value::Array(items) = &reply else {
        return Envelope::Other(format!("{reply:?}"));
    };
    if items.len() != 3 {
        return Envelope::Other(format!("{}-element array", items.len()));
    }

    match (text(&items[0]).as_deref(), text(&items[1])) {
        (Some("message"), Some(channel)) => match text(&items[2]) {
            Some(payload) => Envelope::Message { channel, payload },
            None => Envelope::Other(format!("message on {channel} without text payload")),
        },
        (Some("subscribe"), Some(channel)) => match items[2] {
            Value::Int(count) => Envelope::Subscribe { channel, count },
            _ => Envelope::Other(format!("subscribe on {channel} without count")),
        },
        _ => Envelope::Other(format!("{reply:?}")),
    }
}
