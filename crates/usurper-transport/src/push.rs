//! WebSocket implementation of [`PushSource`] using `tokio-tungstenite`.

use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use usurper_protocol::{PlayerId, PushMessage, RoomCode};

use crate::{PushSource, TransportError};

type WsStream = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

/// The client end of the authority's push channel.
///
/// One channel per session; there is no reconnect — when the stream ends,
/// the session stops receiving live updates.
pub struct PushChannel {
    ws: WsStream,
}

impl PushChannel {
    /// Builds the push endpoint URL for a room and viewer from the
    /// service's HTTP base URL.
    pub fn endpoint(base: &str, room: &RoomCode, viewer: &PlayerId) -> String {
        let base = base.trim_end_matches('/');
        let ws_base = if let Some(rest) = base.strip_prefix("https://") {
            format!("wss://{rest}")
        } else if let Some(rest) = base.strip_prefix("http://") {
            format!("ws://{rest}")
        } else {
            base.to_owned()
        };
        format!("{ws_base}/api/ws/{room}?player_id={viewer}")
    }

    /// Connects to a push endpoint.
    pub async fn connect(url: &str) -> Result<Self, TransportError> {
        let (ws, _) = tokio_tungstenite::connect_async(url)
            .await
            .map_err(TransportError::Connect)?;
        tracing::debug!(url, "push channel connected");
        Ok(Self { ws })
    }
}

impl PushSource for PushChannel {
    async fn recv(&mut self) -> Result<Option<PushMessage>, TransportError> {
        loop {
            let frame = match self.ws.next().await {
                Some(Ok(frame)) => frame,
                Some(Err(e)) => return Err(TransportError::Push(e)),
                None => return Ok(None),
            };

            let text = match frame {
                Message::Text(text) => text.as_str().to_owned(),
                Message::Binary(data) => {
                    match String::from_utf8(data.to_vec()) {
                        Ok(text) => text,
                        Err(_) => {
                            tracing::warn!("discarding non-UTF-8 push frame");
                            continue;
                        }
                    }
                }
                Message::Close(_) => return Ok(None),
                // Ping/pong/raw frames are transport noise.
                _ => continue,
            };

            match PushMessage::decode(&text) {
                Ok(msg) => return Ok(Some(msg)),
                Err(e) => {
                    // A malformed payload is discarded; the next good
                    // message re-synchronizes state.
                    tracing::warn!(error = %e, "discarding malformed push frame");
                }
            }
        }
    }

    async fn ping(&mut self) -> Result<(), TransportError> {
        self.ws
            .send(Message::Text("ping".into()))
            .await
            .map_err(TransportError::Push)
    }
}
