//! [`ConnectionFactory`] backed by `tokio-tungstenite`.

use async_trait::async_trait;
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::header::{HeaderValue, SEC_WEBSOCKET_PROTOCOL};
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::{CloseFrame, WebSocketConfig};
use tokio_tungstenite::tungstenite::{Error as WsError, Message as WsMessage};
use tracing::debug;

use super::{CloseReason, Connection, ConnectionFactory, FrameSink, FrameStream};
use crate::config::WebSocketOptions;
use crate::error::{RealtimeError, Result};

/// Opens real websocket connections.
#[derive(Debug, Clone, Copy, Default)]
pub struct TungsteniteConnector;

#[async_trait]
impl ConnectionFactory for TungsteniteConnector {
    async fn open(&self, url: &str, options: &WebSocketOptions) -> Result<Connection> {
        let mut request = url
            .into_client_request()
            .map_err(|e| RealtimeError::Transport(format!("invalid realtime url: {e}")))?;

        if !options.subprotocols.is_empty() {
            let value = HeaderValue::from_str(&options.subprotocols.join(", "))
                .map_err(|e| RealtimeError::Transport(format!("invalid subprotocol: {e}")))?;
            request.headers_mut().insert(SEC_WEBSOCKET_PROTOCOL, value);
        }

        let mut ws_config = WebSocketConfig::default();
        if let Some(max) = options.max_message_size {
            ws_config.max_message_size = Some(max);
        }

        let (ws_stream, _response) =
            tokio_tungstenite::connect_async_with_config(request, Some(ws_config), false)
                .await
                .map_err(transport_error)?;

        let (ws_write, ws_read) = ws_stream.split();
        Ok(Connection {
            sink: Box::new(WsSink { write: ws_write }),
            stream: text_frames(ws_read),
        })
    }
}

fn transport_error(e: WsError) -> RealtimeError {
    RealtimeError::Transport(e.to_string())
}

// ---------------------------------------------------------------------------
// Write half
// ---------------------------------------------------------------------------

struct WsSink<S> {
    write: S,
}

#[async_trait]
impl<S> FrameSink for WsSink<S>
where
    S: Sink<WsMessage, Error = WsError> + Send + Unpin,
{
    async fn send(&mut self, text: String) -> Result<()> {
        self.write
            .send(WsMessage::Text(text.into()))
            .await
            .map_err(transport_error)
    }

    async fn close(&mut self, reason: CloseReason) -> Result<()> {
        let frame = CloseFrame {
            code: CloseCode::from(reason.code),
            reason: reason.reason.into(),
        };
        self.write
            .send(WsMessage::Close(Some(frame)))
            .await
            .map_err(transport_error)?;
        SinkExt::close(&mut self.write).await.map_err(transport_error)
    }
}

// ---------------------------------------------------------------------------
// Read half
// ---------------------------------------------------------------------------

/// Keep text frames, end on a close frame, surface socket errors.
fn text_frames<S>(read: S) -> FrameStream
where
    S: Stream<Item = std::result::Result<WsMessage, WsError>> + Send + Unpin + 'static,
{
    futures_util::stream::unfold(read, |mut read| async move {
        loop {
            match read.next().await? {
                Ok(WsMessage::Text(text)) => return Some((Ok(text.as_str().to_owned()), read)),
                Ok(WsMessage::Close(frame)) => {
                    debug!(frame = ?frame, "Realtime server closed connection");
                    return None;
                }
                Ok(_) => continue,
                Err(e) => return Some((Err(transport_error(e)), read)),
            }
        }
    })
    .boxed()
}
