//! Channel worker: connect, run a session, wait, reconnect

use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::{ChannelConfig, ChannelState, Codec, Connection, Transport};

pub(super) struct ChannelWorker<C: Codec> {
    pub(super) config: ChannelConfig,
    pub(super) transport: Arc<dyn Transport>,
    pub(super) codec: Arc<C>,
    pub(super) outbound: mpsc::Receiver<String>,
    pub(super) inbound: mpsc::Sender<C::Inbound>,
    pub(super) state: watch::Sender<ChannelState>,
    pub(super) shutdown: CancellationToken,
}

/// Why a session ended
enum SessionEnd {
    /// Peer closed or the connection failed: reconnect
    Disconnected,
    /// Shutdown requested or handle dropped: stop
    Stopped,
}

impl<C: Codec> ChannelWorker<C> {
    /// Main run loop: connect, run the session, reconnect after a fixed delay
    pub(super) async fn run(mut self) {
        let url = self.config.url.clone();
        tracing::info!(url = %url, "Channel started");

        loop {
            if self.shutdown.is_cancelled() {
                break;
            }
            self.set_state(ChannelState::Connecting);

            let connected = tokio::select! {
                _ = self.shutdown.cancelled() => break,
                result = self.transport.connect(&url) => result,
            };

            match connected {
                Ok(conn) => {
                    tracing::info!(url = %url, "Channel online");
                    self.set_state(ChannelState::Online);
                    if let SessionEnd::Stopped = self.run_session(conn).await {
                        break;
                    }
                }
                Err(e) => {
                    tracing::warn!(url = %url, "Channel connect failed: {e}");
                }
            }

            self.set_state(ChannelState::Offline);
            self.drop_pending_outbound();

            // Wait before reconnecting
            tracing::debug!(
                delay_ms = self.config.reconnect_delay.as_millis() as u64,
                "Channel reconnect scheduled"
            );
            tokio::select! {
                _ = self.shutdown.cancelled() => break,
                _ = tokio::time::sleep(self.config.reconnect_delay) => {}
            }
        }

        self.set_state(ChannelState::Offline);
        tracing::info!(url = %url, "Channel stopped");
    }

    /// Run a single session until disconnect or shutdown
    async fn run_session(&mut self, mut conn: Box<dyn Connection>) -> SessionEnd {
        let mut keepalive = self.config.keepalive.map(|period| {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval
        });

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    conn.close().await;
                    return SessionEnd::Stopped;
                }

                // Keep-alive ping
                _ = tick(&mut keepalive) => {
                    if let Err(e) = conn.send(self.config.ping_text.clone()).await {
                        tracing::warn!("Keep-alive failed, disconnecting: {e}");
                        return SessionEnd::Disconnected;
                    }
                }

                outbound = self.outbound.recv() => {
                    let Some(text) = outbound else {
                        // every handle is gone
                        conn.close().await;
                        return SessionEnd::Stopped;
                    };
                    if let Err(e) = conn.send(text).await {
                        tracing::warn!("Channel send failed, disconnecting: {e}");
                        return SessionEnd::Disconnected;
                    }
                }

                frame = conn.recv() => {
                    match frame {
                        Some(Ok(text)) => self.handle_frame(&text).await,
                        Some(Err(e)) => {
                            tracing::warn!("Channel receive failed: {e}");
                            return SessionEnd::Disconnected;
                        }
                        None => {
                            tracing::info!("Channel closed by peer");
                            return SessionEnd::Disconnected;
                        }
                    }
                }
            }
        }
    }

    async fn handle_frame(&self, text: &str) {
        if text == self.config.pong_text {
            tracing::trace!("Keep-alive reply");
            return;
        }
        let Some(message) = self.codec.decode(text) else {
            return;
        };
        if self.inbound.send(message).await.is_err() {
            tracing::trace!("Inbound receiver dropped, discarding message");
        }
    }

    /// Frames buffered during a dead session are never replayed
    fn drop_pending_outbound(&mut self) {
        let mut dropped = 0usize;
        while self.outbound.try_recv().is_ok() {
            dropped += 1;
        }
        if dropped > 0 {
            tracing::debug!(dropped, "Dropped unsent frames");
        }
    }

    fn set_state(&self, state: ChannelState) {
        self.state.send_if_modified(|current| {
            if *current == state {
                return false;
            }
            *current = state;
            true
        });
    }
}

async fn tick(interval: &mut Option<Interval>) {
    match interval {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::super::{ChannelError, ChannelHandle, JsonCodec, memory_transport};
    use super::*;
    use serde::{Deserialize, Serialize};
    use std::time::Duration;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Note {
        text: String,
    }

    fn config() -> ChannelConfig {
        ChannelConfig::new("ws://test/ws/admin/orders")
            .with_reconnect_delay(Duration::from_secs(3))
            .with_keepalive(Some(Duration::from_secs(20)))
    }

    async fn wait_state(handle: &ChannelHandle<JsonCodec<Note, Note>>, state: ChannelState) {
        let mut rx = handle.subscribe_state();
        rx.wait_for(|s| *s == state).await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_online_send_receive() {
        let (transport, mut server) = memory_transport();
        let (handle, mut inbound) =
            ChannelHandle::spawn(config(), Arc::new(transport), JsonCodec::<Note, Note>::new());

        let mut peer = server.accept().await.unwrap();
        assert_eq!(peer.url(), "ws://test/ws/admin/orders");
        wait_state(&handle, ChannelState::Online).await;

        handle.send(&Note { text: "hello".into() }).unwrap();
        assert_eq!(peer.recv().await.unwrap(), r#"{"text":"hello"}"#);

        // pong and undecodable frames are skipped
        peer.send("pong");
        peer.send("not json");
        peer.send(r#"{"text":"from server"}"#);
        assert_eq!(inbound.recv().await.unwrap().text, "from server");

        handle.shutdown_and_wait().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_keepalive_ping() {
        let (transport, mut server) = memory_transport();
        let (handle, _inbound) =
            ChannelHandle::spawn(config(), Arc::new(transport), JsonCodec::<Note, Note>::new());
        let mut peer = server.accept().await.unwrap();

        let start = Instant::now();
        assert_eq!(peer.recv().await.unwrap(), "ping");
        assert!(start.elapsed() >= Duration::from_secs(20));
        assert_eq!(peer.recv().await.unwrap(), "ping");
        assert!(start.elapsed() >= Duration::from_secs(40));

        drop(handle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_keepalive_when_disabled() {
        let (transport, mut server) = memory_transport();
        let (handle, _inbound) = ChannelHandle::spawn(
            config().with_keepalive(None),
            Arc::new(transport),
            JsonCodec::<Note, Note>::new(),
        );
        let mut peer = server.accept().await.unwrap();

        let frame = tokio::time::timeout(Duration::from_secs(120), peer.recv()).await;
        assert!(frame.is_err(), "no frame expected, got {frame:?}");
        drop(handle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reconnect_after_fixed_delay() {
        let (transport, mut server) = memory_transport();
        let (handle, _inbound) =
            ChannelHandle::spawn(config(), Arc::new(transport), JsonCodec::<Note, Note>::new());

        let peer = server.accept().await.unwrap();
        wait_state(&handle, ChannelState::Online).await;

        let closed_at = Instant::now();
        drop(peer);
        wait_state(&handle, ChannelState::Offline).await;
        assert!(matches!(
            handle.send(&Note { text: "lost".into() }),
            Err(ChannelError::NotConnected)
        ));

        let _peer = server.accept().await.unwrap();
        assert!(closed_at.elapsed() >= Duration::from_secs(3));
        wait_state(&handle, ChannelState::Online).await;

        handle.shutdown_and_wait().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_connect_failure_retries() {
        let (transport, server) = memory_transport();
        drop(server);
        let (handle, _inbound) =
            ChannelHandle::spawn(config(), Arc::new(transport), JsonCodec::<Note, Note>::new());

        wait_state(&handle, ChannelState::Offline).await;
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_ne!(handle.state(), ChannelState::Online);
        handle.shutdown_and_wait().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_stops_task() {
        let (transport, mut server) = memory_transport();
        let (handle, mut inbound) =
            ChannelHandle::spawn(config(), Arc::new(transport), JsonCodec::<Note, Note>::new());
        let mut peer = server.accept().await.unwrap();

        drop(handle);
        // the client closes its side and the inbound stream ends
        assert!(peer.recv().await.is_none());
        assert!(inbound.recv().await.is_none());
        // no reconnect after shutdown
        let next = tokio::time::timeout(Duration::from_secs(60), server.accept()).await;
        assert!(matches!(next, Ok(None) | Err(_)));
    }
}
