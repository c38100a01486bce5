use async_trait::async_trait;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use url::Url;

use super::{Connector, Frame, WireSink, WireStream};
use crate::types::Result;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Production connector backed by `tokio-tungstenite`
pub struct WebSocketConnector;

#[async_trait]
impl Connector for WebSocketConnector {
    async fn open(&self, endpoint: &Url) -> Result<(Box<dyn WireSink>, Box<dyn WireStream>)> {
        tracing::debug!("Opening WebSocket connection to {endpoint}");
        let (stream, _response) = connect_async(endpoint.as_str()).await?;
        let (write, read) = stream.split();
        Ok((Box::new(WsSink { write }), Box::new(WsReader { read })))
    }
}

struct WsSink {
    write: SplitSink<WsStream, Message>,
}

#[async_trait]
impl WireSink for WsSink {
    async fn transmit(&mut self, frame: Frame) -> Result<()> {
        let message = match frame {
            Frame::Text(text) => Message::Text(text.into()),
            Frame::Ping(data) => Message::Ping(data.into()),
            Frame::Pong(data) => Message::Pong(data.into()),
            Frame::Close => return self.close().await,
        };
        self.write.send(message).await?;
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        self.write.close().await?;
        Ok(())
    }
}

struct WsReader {
    read: SplitStream<WsStream>,
}

#[async_trait]
impl WireStream for WsReader {
    async fn next_frame(&mut self) -> Option<Result<Frame>> {
        loop {
            let message = match self.read.next().await? {
                Ok(message) => message,
                Err(e) => return Some(Err(e.into())),
            };

            match message {
                Message::Text(text) => return Some(Ok(Frame::Text(text.as_str().to_owned()))),
                Message::Ping(data) => return Some(Ok(Frame::Ping(data.to_vec()))),
                Message::Pong(data) => return Some(Ok(Frame::Pong(data.to_vec()))),
                Message::Close(frame) => {
                    if let Some(close_frame) = frame {
                        tracing::warn!(
                            "Server closed connection: code={:?}, reason='{}'",
                            close_frame.code,
                            close_frame.reason
                        );
                    } else {
                        tracing::warn!("Server closed connection without close frame");
                    }
                    return Some(Ok(Frame::Close));
                }
                Message::Binary(data) => {
                    tracing::warn!("Ignoring unexpected binary message ({} bytes)", data.len());
                }
                Message::Frame(_) => {
                    tracing::debug!("Ignoring raw frame (internal)");
                }
            }
        }
    }
}
