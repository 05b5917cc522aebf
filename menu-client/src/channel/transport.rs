use async_trait::async_trait;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use super::ChannelError;

/// Transport abstraction for realtime channels
#[async_trait]
pub trait Transport: Send + Sync + std::fmt::Debug {
    async fn connect(&self, url: &str) -> Result<Box<dyn Connection>, ChannelError>;
}

/// An open text-frame connection
#[async_trait]
pub trait Connection: Send {
    async fn send(&mut self, text: String) -> Result<(), ChannelError>;

    /// Next text frame; `None` once the peer closed the connection.
    /// Must be cancel safe.
    async fn recv(&mut self) -> Option<Result<String, ChannelError>>;

    async fn close(&mut self);
}

// ============================================================================
// WebSocket
// ============================================================================

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// WebSocket transport (ws:// and wss://)
#[derive(Debug, Clone, Default)]
pub struct WsTransport;

#[async_trait]
impl Transport for WsTransport {
    async fn connect(&self, url: &str) -> Result<Box<dyn Connection>, ChannelError> {
        let (ws, _response) = connect_async(url)
            .await
            .map_err(|e| ChannelError::Connect(e.to_string()))?;
        let (sink, stream) = ws.split();
        Ok(Box::new(WsConnection { sink, stream }))
    }
}

struct WsConnection {
    sink: SplitSink<WsStream, Message>,
    stream: SplitStream<WsStream>,
}

#[async_trait]
impl Connection for WsConnection {
    async fn send(&mut self, text: String) -> Result<(), ChannelError> {
        self.sink
            .send(Message::Text(text.into()))
            .await
            .map_err(|e| ChannelError::Transport(e.to_string()))
    }

    async fn recv(&mut self) -> Option<Result<String, ChannelError>> {
        loop {
            match self.stream.next().await? {
                Ok(Message::Text(text)) => return Some(Ok(text.as_str().to_owned())),
                Ok(Message::Binary(data)) => match String::from_utf8(data.to_vec()) {
                    Ok(text) => return Some(Ok(text)),
                    Err(_) => tracing::debug!("Skipping non-UTF-8 binary frame"),
                },
                Ok(Message::Ping(data)) => {
                    if let Err(e) = self.sink.send(Message::Pong(data)).await {
                        return Some(Err(ChannelError::Transport(e.to_string())));
                    }
                }
                Ok(Message::Close(_)) => return None,
                Ok(Message::Pong(_)) | Ok(Message::Frame(_)) => {}
                Err(e) => return Some(Err(ChannelError::Transport(e.to_string()))),
            }
        }
    }

    async fn close(&mut self) {
        let _ = self.sink.close().await;
    }
}

// ============================================================================
// In-memory
// ============================================================================

/// In-process transport; the other end is a [`MemoryServer`]
#[derive(Debug, Clone)]
pub struct MemoryTransport {
    connect_tx: mpsc::UnboundedSender<MemoryPeer>,
}

/// Accepts connections made through the paired [`MemoryTransport`]
#[derive(Debug)]
pub struct MemoryServer {
    incoming: mpsc::UnboundedReceiver<MemoryPeer>,
}

/// Create a connected transport/server pair
pub fn memory_transport() -> (MemoryTransport, MemoryServer) {
    let (connect_tx, incoming) = mpsc::unbounded_channel();
    (MemoryTransport { connect_tx }, MemoryServer { incoming })
}

impl MemoryServer {
    /// Next client connection; `None` once every transport is dropped
    pub async fn accept(&mut self) -> Option<MemoryPeer> {
        self.incoming.recv().await
    }
}

/// Server side of an in-memory connection. Dropping it closes the
/// connection for the client.
#[derive(Debug)]
pub struct MemoryPeer {
    url: String,
    to_client: mpsc::UnboundedSender<String>,
    from_client: mpsc::UnboundedReceiver<String>,
}

impl MemoryPeer {
    /// URL the client connected to
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Push a frame to the client; false if the client is gone
    pub fn send(&self, text: impl Into<String>) -> bool {
        self.to_client.send(text.into()).is_ok()
    }

    /// Next frame from the client; `None` once it disconnected
    pub async fn recv(&mut self) -> Option<String> {
        self.from_client.recv().await
    }

    /// Split into a sender usable from other tasks and the receiving half
    pub fn into_split(self) -> (mpsc::UnboundedSender<String>, mpsc::UnboundedReceiver<String>) {
        (self.to_client, self.from_client)
    }
}

/// Client side of an in-memory connection
#[derive(Debug)]
pub struct MemoryConnection {
    to_server: Option<mpsc::UnboundedSender<String>>,
    from_server: mpsc::UnboundedReceiver<String>,
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn connect(&self, url: &str) -> Result<Box<dyn Connection>, ChannelError> {
        let (to_server, from_client) = mpsc::unbounded_channel();
        let (to_client, from_server) = mpsc::unbounded_channel();
        let peer = MemoryPeer {
            url: url.to_string(),
            to_client,
            from_client,
        };
        self.connect_tx
            .send(peer)
            .map_err(|_| ChannelError::Connect("memory server is gone".to_string()))?;
        Ok(Box::new(MemoryConnection {
            to_server: Some(to_server),
            from_server,
        }))
    }
}

#[async_trait]
impl Connection for MemoryConnection {
    async fn send(&mut self, text: String) -> Result<(), ChannelError> {
        let to_server = self.to_server.as_ref().ok_or(ChannelError::Closed)?;
        to_server
            .send(text)
            .map_err(|_| ChannelError::Transport("peer closed".to_string()))
    }

    async fn recv(&mut self) -> Option<Result<String, ChannelError>> {
        self.from_server.recv().await.map(Ok)
    }

    async fn close(&mut self) {
        // dropping the sender ends the server's `recv`
        self.to_server = None;
        self.from_server.close();
    }
}
