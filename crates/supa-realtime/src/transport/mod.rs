//! Socket abstraction consumed by the client.
//!
//! A [`ConnectionFactory`] opens a URL and yields a [`Connection`]: a write
//! half used by every send path and a stream of inbound text frames read by
//! the receive loop.

mod tungstenite;

pub use self::tungstenite::TungsteniteConnector;

use async_trait::async_trait;
use futures_util::stream::BoxStream;

use crate::config::WebSocketOptions;
use crate::error::Result;

/// Inbound text frames. The stream ends when the peer closes the socket;
/// an `Err` item is a terminal socket error.
pub type FrameStream = BoxStream<'static, Result<String>>;

/// Close code and reason sent when shutting the socket down.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseReason {
    pub code: u16,
    pub reason: String,
}

impl CloseReason {
    pub const NORMAL: u16 = 1000;

    pub fn normal(reason: impl Into<String>) -> Self {
        Self {
            code: Self::NORMAL,
            reason: reason.into(),
        }
    }
}

/// Write half of an open connection.
#[async_trait]
pub trait FrameSink: Send {
    async fn send(&mut self, text: String) -> Result<()>;

    async fn close(&mut self, reason: CloseReason) -> Result<()>;
}

/// An open socket, split into its write and read halves.
pub struct Connection {
    pub sink: Box<dyn FrameSink>,
    pub stream: FrameStream,
}

/// Opens sockets for the client.
#[async_trait]
pub trait ConnectionFactory: Send + Sync {
    async fn open(&self, url: &str, options: &WebSocketOptions) -> Result<Connection>;
}
