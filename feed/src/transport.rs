use anyhow::{Context, Result};
use async_trait::async_trait;
use futures_util::{Stream, StreamExt};
use std::pin::Pin;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, trace};
use url::Url;

/// Text frames from one open connection. The stream ends when the
/// connection closes; an `Err` item means it dropped.
pub type FrameStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

#[async_trait]
pub trait Connector: Send + Sync + 'static {
    async fn connect(&self, url: &Url) -> Result<FrameStream>;
}

/// WebSocket transport over tokio-tungstenite. Only text frames carry
/// events; pings and binary frames are skipped.
#[derive(Debug, Default, Clone, Copy)]
pub struct WsConnector;

#[async_trait]
impl Connector for WsConnector {
    async fn connect(&self, url: &Url) -> Result<FrameStream> {
        let (ws_stream, response) = connect_async(url.as_str())
            .await
            .with_context(|| format!("Failed to connect to {}", url))?;
        debug!("WebSocket handshake with {} returned {}", url, response.status());

        let frames = ws_stream.filter_map(|message| async move {
            match message {
                Ok(Message::Text(text)) => Some(Ok(text.as_str().to_owned())),
                Ok(Message::Close(frame)) => {
                    trace!("Close frame received: {:?}", frame);
                    None
                }
                Ok(_) => None,
                Err(e) => Some(Err(anyhow::Error::new(e))),
            }
        });
        Ok(Box::pin(frames))
    }
}
