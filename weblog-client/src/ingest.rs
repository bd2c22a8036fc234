//! Ingestion gateway - thin websocket wrapper feeding the store actor.
//!
//! One text frame is one weblog payload; framing is the transport's job.
//! Malformed payloads are logged and dropped without touching the log or
//! stopping the session. Connection loss triggers reconnects with
//! exponential backoff; the loop only ends when the store itself is gone.

use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, WebSocketStream};

use crate::actors::weblog_store::{StoreUnavailable, WeblogLog};
use crate::config::Config;

#[derive(Debug, Clone)]
pub struct IngestConfig {
    pub endpoint: String,
    pub reconnect_initial: Duration,
    pub reconnect_max: Duration,
}

impl From<&Config> for IngestConfig {
    fn from(config: &Config) -> Self {
        Self {
            endpoint: config.weblog_ws_url.clone(),
            reconnect_initial: config.reconnect_initial,
            reconnect_max: config.reconnect_max,
        }
    }
}

#[derive(Debug, thiserror::Error)]
enum SessionError {
    #[error(transparent)]
    Transport(#[from] tokio_tungstenite::tungstenite::Error),
    #[error(transparent)]
    Store(#[from] StoreUnavailable),
}

/// Connect-and-read loop. Runs until the store actor goes away.
pub async fn run(log: WeblogLog, config: IngestConfig) {
    let mut backoff = config.reconnect_initial;

    loop {
        match connect_async(&config.endpoint).await {
            Ok((socket, _response)) => {
                tracing::info!(endpoint = %config.endpoint, "Connected to weblog endpoint");
                backoff = config.reconnect_initial;
                match read_session(&log, socket).await {
                    Ok(()) => {
                        tracing::info!(endpoint = %config.endpoint, "Weblog session closed")
                    }
                    Err(SessionError::Store(e)) => {
                        tracing::error!(error = %e, "Weblog store gone; stopping ingestion");
                        return;
                    }
                    Err(SessionError::Transport(e)) => {
                        tracing::warn!(endpoint = %config.endpoint, error = %e, "Weblog session failed");
                    }
                }
            }
            Err(e) => {
                tracing::warn!(
                    endpoint = %config.endpoint,
                    error = %e,
                    "Failed to connect to weblog endpoint"
                );
            }
        }

        tokio::time::sleep(backoff).await;
        backoff = (backoff * 2).min(config.reconnect_max);
    }
}

/// Read one websocket session to completion, appending every decodable
/// text frame.
async fn read_session<S>(log: &WeblogLog, socket: WebSocketStream<S>) -> Result<(), SessionError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let (mut sink, mut stream) = socket.split();

    while let Some(frame) = stream.next().await {
        match frame? {
            Message::Text(text) => match weblog_types::decode(&text) {
                Ok(event) => {
                    let seq = log.append(event).await?;
                    tracing::debug!(seq, "Stored weblog event");
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Dropping malformed weblog payload");
                }
            },
            Message::Ping(data) => {
                let _ = sink.send(Message::Pong(data)).await;
            }
            Message::Close(_) => break,
            // Binary and pong frames carry no weblog payloads.
            _ => {}
        }
    }

    Ok(())
}
