//! Reconnecting realtime channel
//!
//! One abstraction for both WebSocket consumers (kitchen feed, group cart):
//! - connect, publish [`ChannelState`] on a watch channel
//! - keep-alive text ping on a fixed interval while online, pong discarded
//! - fixed-delay reconnect after any close or error
//! - inbound frames decoded by a [`Codec`] into an mpsc stream
//!
//! Sends are at-most-once: nothing is queued while the channel is not
//! online, and frames still buffered when a session ends are dropped.

mod transport;
mod worker;

pub use transport::{
    Connection, MemoryConnection, MemoryPeer, MemoryServer, MemoryTransport, Transport,
    WsTransport, memory_transport,
};

use serde::Serialize;
use serde::de::DeserializeOwned;
use shared::message::{KEEPALIVE_PING, KEEPALIVE_PONG};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use worker::ChannelWorker;

/// Connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Connecting,
    Online,
    Offline,
}

impl fmt::Display for ChannelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelState::Connecting => write!(f, "connecting"),
            ChannelState::Online => write!(f, "online"),
            ChannelState::Offline => write!(f, "offline"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ChannelError {
    /// Send attempted while not online
    #[error("Channel not connected")]
    NotConnected,

    /// The channel task has stopped
    #[error("Channel closed")]
    Closed,

    /// Outbound buffer full
    #[error("Outbound buffer full")]
    Backpressure,

    #[error("Connect failed: {0}")]
    Connect(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Encode error: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Channel tuning
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    /// Full WebSocket URL
    pub url: String,
    /// Fixed delay before each reconnect attempt
    pub reconnect_delay: Duration,
    /// Keep-alive interval; `None` disables keep-alive
    pub keepalive: Option<Duration>,
    /// Keep-alive frame
    pub ping_text: String,
    /// Keep-alive reply, discarded on receipt
    pub pong_text: String,
    /// Outbound and inbound buffer size
    pub buffer: usize,
}

impl ChannelConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            reconnect_delay: Duration::from_secs(3),
            keepalive: Some(Duration::from_secs(20)),
            ping_text: KEEPALIVE_PING.to_string(),
            pong_text: KEEPALIVE_PONG.to_string(),
            buffer: 64,
        }
    }

    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    pub fn with_keepalive(mut self, interval: Option<Duration>) -> Self {
        self.keepalive = interval;
        self
    }

    pub fn with_buffer(mut self, buffer: usize) -> Self {
        self.buffer = buffer.max(1);
        self
    }
}

/// Message codec for a channel
pub trait Codec: Send + Sync + 'static {
    type Outbound;
    type Inbound: Send + 'static;

    fn encode(&self, message: &Self::Outbound) -> Result<String, ChannelError>;

    /// Decode a text frame; `None` means "not for us", the frame is skipped
    fn decode(&self, text: &str) -> Option<Self::Inbound>;
}

/// JSON codec: serde in both directions, undecodable frames skipped
pub struct JsonCodec<In, Out> {
    _marker: PhantomData<fn() -> (In, Out)>,
}

impl<In, Out> JsonCodec<In, Out> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<In, Out> Default for JsonCodec<In, Out> {
    fn default() -> Self {
        Self::new()
    }
}

impl<In, Out> Codec for JsonCodec<In, Out>
where
    In: DeserializeOwned + Send + 'static,
    Out: Serialize + 'static,
{
    type Outbound = Out;
    type Inbound = In;

    fn encode(&self, message: &Out) -> Result<String, ChannelError> {
        Ok(serde_json::to_string(message)?)
    }

    fn decode(&self, text: &str) -> Option<In> {
        match serde_json::from_str(text) {
            Ok(message) => Some(message),
            Err(e) => {
                tracing::debug!(frame = text, "Skipping undecodable frame: {e}");
                None
            }
        }
    }
}

/// Handle to a running channel task.
///
/// Dropping the handle stops the task and clears its timers.
pub struct ChannelHandle<C: Codec> {
    codec: Arc<C>,
    outbound: mpsc::Sender<String>,
    state: watch::Receiver<ChannelState>,
    shutdown: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl<C: Codec> ChannelHandle<C> {
    /// Start the channel task; returns the handle and the inbound stream
    pub fn spawn(
        config: ChannelConfig,
        transport: Arc<dyn Transport>,
        codec: C,
    ) -> (Self, mpsc::Receiver<C::Inbound>) {
        let codec = Arc::new(codec);
        let (outbound_tx, outbound_rx) = mpsc::channel(config.buffer);
        let (inbound_tx, inbound_rx) = mpsc::channel(config.buffer);
        let (state_tx, state_rx) = watch::channel(ChannelState::Connecting);
        let shutdown = CancellationToken::new();

        let worker = ChannelWorker {
            config,
            transport,
            codec: codec.clone(),
            outbound: outbound_rx,
            inbound: inbound_tx,
            state: state_tx,
            shutdown: shutdown.clone(),
        };
        let task = tokio::spawn(worker.run());

        let handle = Self {
            codec,
            outbound: outbound_tx,
            state: state_rx,
            shutdown,
            task: Some(task),
        };
        (handle, inbound_rx)
    }

    pub fn state(&self) -> ChannelState {
        *self.state.borrow()
    }

    pub fn is_online(&self) -> bool {
        self.state() == ChannelState::Online
    }

    pub fn subscribe_state(&self) -> watch::Receiver<ChannelState> {
        self.state.clone()
    }

    /// Send a message now, or fail. Never queued for a later session.
    pub fn send(&self, message: &C::Outbound) -> Result<(), ChannelError> {
        if !self.is_online() {
            return Err(ChannelError::NotConnected);
        }
        let text = self.codec.encode(message)?;
        self.outbound.try_send(text).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => ChannelError::Backpressure,
            mpsc::error::TrySendError::Closed(_) => ChannelError::Closed,
        })
    }

    /// Stop the task (idempotent)
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    /// Stop the task and wait for it to finish
    pub async fn shutdown_and_wait(mut self) {
        self.shutdown.cancel();
        if let Some(task) = self.task.take()
            && let Err(e) = task.await
        {
            tracing::warn!("Channel task ended abnormally: {e}");
        }
    }
}

impl<C: Codec> Drop for ChannelHandle<C> {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

impl<C: Codec> fmt::Debug for ChannelHandle<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChannelHandle")
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}
