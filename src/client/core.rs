use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{RwLock, watch};
use url::Url;

use super::{
    ConnectionManager, ConnectionState, RealtimeTransportOptions, TransportBuilder, TransportState,
};
use crate::infrastructure::{BackoffTimer, KeepAlive};
use crate::messaging::{ListenerRegistry, ListenerResult, Subscription};
use crate::types::{
    ContentType, DEFAULT_KEEPALIVE_INTERVAL, DEFAULT_RECONNECT_BASE_DELAY, Envelope, EventKind,
    EventPayload, MessageBody, OUTBOX_CHECKPOINT_KEY, OUTBOX_CHECKPOINT_TTL, PresenceBody, Result,
    TransportError, TypingBody,
};
use crate::websocket::{Connector, Frame, WireStream};

/// The main entry point for the realtime messenger transport.
///
/// `RealtimeTransport` maintains one logical WebSocket connection to the
/// message-delivery endpoint, queues outbound envelopes while disconnected
/// and replays them in order on reconnect, retries dropped connections with
/// exponential backoff up to a bounded budget, and fans inbound envelopes out
/// to subscribers by event kind.
///
/// Instances are explicitly constructed and cheaply cloneable; clones share
/// the same connection, queue, and subscriptions.
///
/// # Example
///
/// ```no_run
/// use messenger_realtime_rs::{EventKind, RealtimeTransport, RealtimeTransportOptions};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let transport = RealtimeTransport::new(
///     "wss://chat.example.com/ws",
///     RealtimeTransportOptions::default(),
/// )?;
///
/// let _subscription = transport
///     .subscribe(EventKind::Message, |envelope| {
///         println!("inbound: {:?}", envelope.payload());
///         Ok(())
///     })
///     .await;
///
/// transport.connect().await?;
/// transport.send_chat_message("room-1", "hello", "user-7").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct RealtimeTransport {
    pub(crate) endpoint: Url,
    pub(crate) options: RealtimeTransportOptions,

    // Connection manager
    pub(crate) connection: Arc<ConnectionManager>,

    // Consolidated mutable state
    pub(crate) state: Arc<RwLock<TransportState>>,

    // Wire implementation
    pub(crate) connector: Arc<dyn Connector>,
}

impl RealtimeTransport {
    /// Creates a new transport instance.
    ///
    /// This validates the endpoint (only `ws`/`wss` schemes are accepted) but
    /// does not open a connection; call [`connect()`](Self::connect) for that.
    pub fn new(endpoint: impl AsRef<str>, options: RealtimeTransportOptions) -> Result<Self> {
        TransportBuilder::new(endpoint, options).map(|builder| builder.build())
    }

    /// Set connection state and notify watchers
    async fn set_state(&self, new_state: ConnectionState) {
        self.connection.set_state(new_state).await;

        let state = self.state.read().await;
        state.notify_state_change(new_state, state.was_manual_disconnect);
    }

    /// Set manual disconnect flag and notify watchers
    async fn set_manual_disconnect(&self, manual: bool) {
        let mut state = self.state.write().await;
        state.was_manual_disconnect = manual;

        let conn_state = self.connection.state().await;
        state.notify_state_change(conn_state, manual);
    }

    /// Establishes the connection to the realtime endpoint.
    ///
    /// On success the transport transitions to `Connected`, the retry budget
    /// resets, and every envelope queued while offline is flushed in FIFO
    /// order. On failure the transport transitions to `Disconnected`, the
    /// error is returned, and reconnection with exponential backoff is
    /// scheduled in the background.
    ///
    /// Calling this while already `Connecting` or `Connected` is a no-op.
    /// This is also the only way out of `Exhausted`: an explicit call resets
    /// the retry budget and starts over.
    pub async fn connect(&self) -> Result<()> {
        if !self.connection.begin_connecting().await {
            return Ok(());
        }
        self.set_manual_disconnect(false).await;

        match self.open_connection().await {
            Ok(()) => Ok(()),
            Err(e) => {
                tracing::error!("Connection attempt failed: {e}");
                self.connection.clear_link().await;
                self.set_state(ConnectionState::Disconnected).await;
                Err(e)
            }
        }
    }

    async fn open_connection(&self) -> Result<()> {
        tracing::info!("Connecting to {}", self.endpoint);

        let (link, reader) = self.connector.open(&self.endpoint).await?;
        self.connection.set_link(link).await;

        self.spawn_read_task(reader).await;
        self.spawn_keepalive().await;

        self.set_state(ConnectionState::Connected).await;
        tracing::info!("Connected to realtime endpoint");

        self.flush_outbox().await;
        Ok(())
    }

    async fn spawn_read_task(&self, mut reader: Box<dyn WireStream>) {
        let transport = self.clone();
        let mut state = self.state.write().await;
        state.awaiting_pong = false;
        state.task_manager.spawn(async move {
            tracing::debug!("Read task started");
            while let Some(frame) = reader.next_frame().await {
                match frame {
                    Ok(Frame::Text(text)) => match serde_json::from_str::<Envelope>(&text) {
                        Ok(envelope) => transport.dispatch_inbound(&envelope).await,
                        Err(e) => {
                            tracing::error!("Dropping malformed inbound event: {e} - Raw: {text}");
                        }
                    },
                    Ok(Frame::Ping(data)) => {
                        if let Err(e) = transport.connection.pong(data).await {
                            tracing::debug!("Failed to answer ping: {e}");
                        }
                    }
                    Ok(Frame::Pong(_)) => {
                        transport.state.write().await.awaiting_pong = false;
                    }
                    Ok(Frame::Close) => {
                        transport.handle_remote_close().await;
                        break;
                    }
                    Err(e) => {
                        tracing::error!("Transport read error: {e}");
                        transport.handle_remote_close().await;
                        break;
                    }
                }
            }
            tracing::debug!("Read task finished");
        });
    }

    async fn spawn_keepalive(&self) {
        let interval = self
            .options
            .keepalive_interval
            .unwrap_or(DEFAULT_KEEPALIVE_INTERVAL);

        KeepAlive::new(Arc::downgrade(&self.connection), Arc::clone(&self.state))
            .with_interval(Duration::from_millis(interval))
            .spawn_on()
            .await;
    }

    /// The link dropped without a manual disconnect; hand the state change to
    /// the reconnection watcher.
    async fn handle_remote_close(&self) {
        if self.state.read().await.was_manual_disconnect {
            return;
        }
        self.connection.clear_link().await;
        self.set_state(ConnectionState::Disconnected).await;
    }

    /// Reconnection loop with exponential backoff, driven by the watcher task.
    ///
    /// Each scheduled attempt waits `base * 2^(attempt-1)`; once the budget
    /// (`max_reconnect_attempts`) is spent the transport transitions to
    /// `Exhausted` and stops retrying.
    pub async fn try_reconnect(&self) -> Result<()> {
        let mut rx = {
            let state = self.state.read().await;
            if state.was_manual_disconnect {
                tracing::info!("Manual disconnect detected, will not attempt to reconnect");
                return Ok(());
            }
            state.state_change_tx.as_ref().map(|tx| tx.subscribe())
        };

        let base = Duration::from_millis(
            self.options
                .reconnect_base_delay
                .unwrap_or(DEFAULT_RECONNECT_BASE_DELAY),
        );
        let mut timer = BackoffTimer::new(base, self.options.max_reconnect_attempts);

        loop {
            {
                let conn_state = self.connection.state().await;
                if conn_state == ConnectionState::Connected
                    || conn_state == ConnectionState::Connecting
                {
                    tracing::info!("Already connected or connecting, stopping reconnection attempts");
                    return Ok(());
                }
            }
            if self.state.read().await.was_manual_disconnect {
                tracing::info!("Reconnection cancelled by manual disconnect");
                return Ok(());
            }

            let Some(delay) = timer.next_delay() else {
                tracing::error!(
                    "Reconnect budget exhausted after {} attempts",
                    timer.attempts()
                );
                self.set_state(ConnectionState::Exhausted).await;
                return Err(TransportError::RetryExhausted {
                    attempts: timer.attempts(),
                });
            };

            tracing::info!(
                "Reconnect attempt {}/{} in {:?}",
                timer.attempts(),
                self.options.max_reconnect_attempts,
                delay
            );
            if self.backoff_cancelled(rx.as_mut(), delay).await {
                tracing::info!("Pending reconnect cancelled by manual disconnect");
                return Ok(());
            }

            match self.connect().await {
                Ok(()) => {
                    tracing::info!("Reconnected successfully");
                    return Ok(());
                }
                Err(e) => {
                    tracing::error!("Reconnection attempt failed: {e}");
                }
            }
        }
    }

    /// Waits out one backoff delay, racing it against the state watch so a
    /// manual disconnect cancels the pending retry instead of letting a stale
    /// attempt fire after an intentional close.
    async fn backoff_cancelled(
        &self,
        rx: Option<&mut watch::Receiver<(ConnectionState, bool)>>,
        delay: Duration,
    ) -> bool {
        let Some(rx) = rx else {
            tokio::time::sleep(delay).await;
            return self.state.read().await.was_manual_disconnect;
        };

        let sleep = tokio::time::sleep(delay);
        tokio::pin!(sleep);

        loop {
            tokio::select! {
                _ = &mut sleep => return false,
                changed = rx.changed() => {
                    if changed.is_err() {
                        sleep.as_mut().await;
                        return false;
                    }
                    if rx.borrow_and_update().1 {
                        return true;
                    }
                }
            }
        }
    }

    /// Drains the outbox strictly in FIFO order. Invoked once per successful
    /// transition into `Connected`. The first failed transmission stops the
    /// drain and puts the failed envelope back at the head.
    async fn flush_outbox(&self) {
        let mut state = self.state.write().await;
        if state.outbox.is_empty() {
            return;
        }

        tracing::info!("Flushing {} queued envelope(s)", state.outbox.len());
        while let Some(envelope) = state.outbox.pop_front() {
            if let Err(e) = self.connection.transmit(&envelope).await {
                tracing::warn!("Flush interrupted, re-queueing envelope: {e}");
                state.outbox.requeue_front(envelope);
                break;
            }
        }
        self.checkpoint_outbox(&state);
    }

    /// Hands an envelope to the transport.
    ///
    /// When connected, transmission is attempted immediately; a failed
    /// transmit queues the envelope for the next flush rather than tearing
    /// the connection down (liveness is owned by the read loop and the
    /// keepalive probe). When not connected, the envelope is queued directly.
    /// Delivery is at-least-once; this never blocks awaiting confirmation.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::QueueFull`] when the envelope has to be
    /// queued, the queue is at capacity, and the overflow policy is
    /// `RejectNewest`.
    pub async fn send(&self, envelope: Envelope) -> Result<()> {
        if !self.connection.is_connected().await {
            return self.enqueue(envelope).await;
        }

        if let Err(e) = self.connection.transmit(&envelope).await {
            tracing::warn!("Send failed, queueing envelope for retry: {e}");
            return self.enqueue(envelope).await;
        }
        Ok(())
    }

    async fn enqueue(&self, envelope: Envelope) -> Result<()> {
        let mut state = self.state.write().await;
        state.outbox.enqueue(envelope)?;
        self.checkpoint_outbox(&state);
        Ok(())
    }

    fn checkpoint_outbox(&self, state: &TransportState) {
        let Some(store) = &self.options.session_store else {
            return;
        };
        let ttl = Duration::from_millis(OUTBOX_CHECKPOINT_TTL);
        if let Err(e) = store.set(OUTBOX_CHECKPOINT_KEY, &state.outbox.snapshot(), Some(ttl)) {
            tracing::warn!("Failed to checkpoint outbox: {e}");
        }
    }

    /// Sends a chat message to a conversation
    pub async fn send_chat_message(
        &self,
        chat_id: impl Into<String>,
        content: impl Into<String>,
        sender_id: impl Into<String>,
    ) -> Result<()> {
        let envelope = Envelope::new(EventPayload::Message(MessageBody {
            content: content.into(),
            content_type: ContentType::Text,
        }))
        .with_chat(chat_id)
        .with_actor(sender_id);

        self.send(envelope).await
    }

    /// Signals that a user started or stopped typing in a conversation
    pub async fn send_typing(
        &self,
        chat_id: impl Into<String>,
        user_id: impl Into<String>,
        is_typing: bool,
    ) -> Result<()> {
        let envelope = Envelope::new(EventPayload::Typing(TypingBody { is_typing }))
            .with_chat(chat_id)
            .with_actor(user_id);

        self.send(envelope).await
    }

    /// Publishes a user's online/offline state. `last_seen` is stamped only
    /// when going offline.
    pub async fn update_presence(
        &self,
        user_id: impl Into<String>,
        is_online: bool,
    ) -> Result<()> {
        let envelope = Envelope::new(EventPayload::Presence(PresenceBody {
            is_online,
            last_seen: (!is_online).then(Utc::now),
        }))
        .with_actor(user_id);

        self.send(envelope).await
    }

    /// Read-only snapshot of the connection lifecycle state
    pub async fn status(&self) -> ConnectionState {
        self.connection.state().await
    }

    /// Checks whether the transport is currently connected
    pub async fn is_connected(&self) -> bool {
        self.connection.is_connected().await
    }

    /// Registers a listener for a specific event kind.
    ///
    /// Multiple listeners per kind are allowed; delivery order equals
    /// subscription order. The returned handle deregisters the listener via
    /// [`unsubscribe()`](Self::unsubscribe).
    pub async fn subscribe<F>(&self, kind: EventKind, listener: F) -> Subscription
    where
        F: Fn(&Envelope) -> ListenerResult + Send + Sync + 'static,
    {
        self.state.write().await.registry.subscribe(kind, listener)
    }

    /// Removes a listener. Safe to call more than once with the same handle.
    pub async fn unsubscribe(&self, subscription: &Subscription) {
        self.state.write().await.registry.unsubscribe(subscription);
    }

    async fn dispatch_inbound(&self, envelope: &Envelope) {
        let listeners = {
            let state = self.state.read().await;
            state.registry.snapshot(envelope.kind())
        };
        ListenerRegistry::deliver(&listeners, envelope);
    }

    /// Gracefully disconnects from the realtime endpoint.
    ///
    /// The disconnect is marked manual: background tasks are aborted, any
    /// pending reconnect is cancelled before it fires, and no automatic
    /// reconnection happens until [`connect()`](Self::connect) is called
    /// again.
    pub async fn disconnect(&self) -> Result<()> {
        self.set_manual_disconnect(true).await;
        tracing::info!("Disconnecting from realtime endpoint");

        {
            let mut state = self.state.write().await;
            state.task_manager.abort_all();
            state.awaiting_pong = false;
        }

        self.connection.close().await?;
        self.set_state(ConnectionState::Disconnected).await;

        tracing::info!("Disconnected from realtime endpoint");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messaging::OverflowPolicy;
    use crate::session::SessionStore;
    use crate::websocket::WireSink;
    use async_trait::async_trait;
    use std::sync::Mutex as StdMutex;
    use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
    use tokio::sync::mpsc;

    /// Shared scripting/recording handle for the fake wire
    #[derive(Default)]
    struct WireLog {
        opens: AtomicUsize,
        refuse_opens: AtomicBool,
        open_delay_ms: AtomicU64,
        fail_transmits: AtomicUsize,
        sent: StdMutex<Vec<String>>,
        pings: AtomicUsize,
        closed: AtomicUsize,
        inbound_tx: StdMutex<Option<mpsc::UnboundedSender<Frame>>>,
    }

    impl WireLog {
        fn sent_contents(&self) -> Vec<String> {
            self.sent
                .lock()
                .unwrap()
                .iter()
                .map(|text| {
                    let envelope: Envelope = serde_json::from_str(text).unwrap();
                    match envelope.payload() {
                        EventPayload::Message(body) => body.content.clone(),
                        other => panic!("unexpected payload: {other:?}"),
                    }
                })
                .collect()
        }

        fn push_inbound(&self, frame: Frame) {
            self.inbound_tx
                .lock()
                .unwrap()
                .as_ref()
                .expect("no open link")
                .send(frame)
                .unwrap();
        }
    }

    struct FakeConnector {
        log: Arc<WireLog>,
    }

    #[async_trait]
    impl Connector for FakeConnector {
        async fn open(&self, _endpoint: &Url) -> Result<(Box<dyn WireSink>, Box<dyn WireStream>)> {
            let delay = self.log.open_delay_ms.load(Ordering::SeqCst);
            if delay > 0 {
                tokio::time::sleep(Duration::from_millis(delay)).await;
            }

            self.log.opens.fetch_add(1, Ordering::SeqCst);
            if self.log.refuse_opens.load(Ordering::SeqCst) {
                return Err(TransportError::Unavailable("fake endpoint refused".into()));
            }

            let (tx, rx) = mpsc::unbounded_channel();
            *self.log.inbound_tx.lock().unwrap() = Some(tx);

            Ok((
                Box::new(FakeSink {
                    log: Arc::clone(&self.log),
                }),
                Box::new(FakeReader { rx }),
            ))
        }
    }

    struct FakeSink {
        log: Arc<WireLog>,
    }

    #[async_trait]
    impl WireSink for FakeSink {
        async fn transmit(&mut self, frame: Frame) -> Result<()> {
            match frame {
                Frame::Text(text) => {
                    if self.log.fail_transmits.load(Ordering::SeqCst) > 0 {
                        self.log.fail_transmits.fetch_sub(1, Ordering::SeqCst);
                        return Err(TransportError::Send("fake wire rejected frame".into()));
                    }
                    self.log.sent.lock().unwrap().push(text);
                }
                Frame::Ping(_) => {
                    self.log.pings.fetch_add(1, Ordering::SeqCst);
                }
                _ => {}
            }
            Ok(())
        }

        async fn close(&mut self) -> Result<()> {
            self.log.closed.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct FakeReader {
        rx: mpsc::UnboundedReceiver<Frame>,
    }

    #[async_trait]
    impl WireStream for FakeReader {
        async fn next_frame(&mut self) -> Option<Result<Frame>> {
            self.rx.recv().await.map(Ok)
        }
    }

    fn test_transport(log: &Arc<WireLog>, options: RealtimeTransportOptions) -> RealtimeTransport {
        TransportBuilder::new("ws://localhost:9100/rt", options)
            .unwrap()
            .with_connector(Arc::new(FakeConnector {
                log: Arc::clone(log),
            }))
            .build()
    }

    fn text_message(content: &str) -> Envelope {
        Envelope::new(EventPayload::Message(MessageBody {
            content: content.to_string(),
            content_type: ContentType::Text,
        }))
        .with_chat("c1")
        .with_actor("u1")
    }

    #[tokio::test]
    async fn test_queued_sends_flush_in_fifo_order() {
        let log = Arc::new(WireLog::default());
        let transport = test_transport(&log, Default::default());

        transport.send(text_message("a")).await.unwrap();
        transport.send(text_message("b")).await.unwrap();
        transport.send(text_message("c")).await.unwrap();
        assert_eq!(transport.status().await, ConnectionState::Disconnected);
        assert_eq!(transport.state.read().await.outbox.len(), 3);

        transport.connect().await.unwrap();

        assert_eq!(transport.status().await, ConnectionState::Connected);
        assert_eq!(log.sent_contents(), vec!["a", "b", "c"]);
        assert_eq!(transport.state.read().await.outbox.len(), 0);
    }

    #[tokio::test]
    async fn test_connect_is_idempotent_when_connected() {
        let log = Arc::new(WireLog::default());
        let transport = test_transport(&log, Default::default());

        transport.connect().await.unwrap();
        transport.connect().await.unwrap();

        assert_eq!(log.opens.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_connects_share_one_attempt() {
        let log = Arc::new(WireLog::default());
        log.open_delay_ms.store(50, Ordering::SeqCst);
        let transport = test_transport(&log, Default::default());

        let (first, second) = tokio::join!(transport.connect(), transport.connect());
        first.unwrap();
        second.unwrap();

        assert_eq!(log.opens.load(Ordering::SeqCst), 1);
        assert_eq!(transport.status().await, ConnectionState::Connected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_budget_exhaustion_is_terminal() {
        let log = Arc::new(WireLog::default());
        log.refuse_opens.store(true, Ordering::SeqCst);
        let transport = test_transport(&log, Default::default());

        let err = transport.connect().await.unwrap_err();
        assert!(matches!(err, TransportError::Unavailable(_)));
        assert_eq!(log.opens.load(Ordering::SeqCst), 1);

        // Default schedule: 1s + 2s + 4s + 8s + 16s of backoff
        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(transport.status().await, ConnectionState::Exhausted);
        assert_eq!(log.opens.load(Ordering::SeqCst), 6);

        // Terminal: no further automatic retry
        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(log.opens.load(Ordering::SeqCst), 6);

        // An explicit connect() resets the budget
        log.refuse_opens.store(false, Ordering::SeqCst);
        transport.connect().await.unwrap();
        assert_eq!(transport.status().await, ConnectionState::Connected);
        assert_eq!(log.opens.load(Ordering::SeqCst), 7);
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_disconnect_cancels_pending_reconnect() {
        let log = Arc::new(WireLog::default());
        log.refuse_opens.store(true, Ordering::SeqCst);
        let transport = test_transport(&log, Default::default());

        transport.connect().await.unwrap_err();

        // The watcher is now waiting out the first backoff delay
        tokio::time::sleep(Duration::from_millis(10)).await;
        transport.disconnect().await.unwrap();

        tokio::time::sleep(Duration::from_secs(600)).await;
        assert_eq!(log.opens.load(Ordering::SeqCst), 1);
        assert_eq!(transport.status().await, ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn test_send_failure_keeps_connection_and_queues() {
        let log = Arc::new(WireLog::default());
        let transport = test_transport(&log, Default::default());

        transport.connect().await.unwrap();
        log.fail_transmits.store(1, Ordering::SeqCst);

        transport.send(text_message("b")).await.unwrap();

        assert_eq!(transport.status().await, ConnectionState::Connected);
        assert_eq!(transport.state.read().await.outbox.len(), 1);
        assert!(log.sent_contents().is_empty());
    }

    #[tokio::test]
    async fn test_send_rejects_when_outbox_full() {
        let log = Arc::new(WireLog::default());
        let options = RealtimeTransportOptions {
            outbox_capacity: 1,
            overflow_policy: OverflowPolicy::RejectNewest,
            ..Default::default()
        };
        let transport = test_transport(&log, options);

        transport.send(text_message("a")).await.unwrap();
        let err = transport.send(text_message("b")).await.unwrap_err();

        assert!(matches!(err, TransportError::QueueFull { capacity: 1 }));
        assert_eq!(transport.state.read().await.outbox.len(), 1);
    }

    #[tokio::test]
    async fn test_inbound_events_dispatch_and_malformed_are_dropped() {
        let log = Arc::new(WireLog::default());
        let transport = test_transport(&log, Default::default());
        transport.connect().await.unwrap();

        let (tx, mut rx) = mpsc::unbounded_channel();
        let _subscription = transport
            .subscribe(EventKind::Message, move |envelope| {
                if let EventPayload::Message(body) = envelope.payload() {
                    tx.send(body.content.clone()).unwrap();
                }
                Ok(())
            })
            .await;

        log.push_inbound(Frame::Text("not json".to_string()));
        log.push_inbound(Frame::Text(
            serde_json::to_string(&text_message("hello")).unwrap(),
        ));

        // The malformed event is dropped; the valid one still arrives
        assert_eq!(rx.recv().await.unwrap(), "hello");
        assert_eq!(transport.status().await, ConnectionState::Connected);
    }

    #[tokio::test]
    async fn test_remote_close_marks_disconnected() {
        let log = Arc::new(WireLog::default());
        let transport = test_transport(&log, Default::default());
        transport.connect().await.unwrap();
        // Keep the watcher from silently reopening while we assert
        log.refuse_opens.store(true, Ordering::SeqCst);

        log.push_inbound(Frame::Close);
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_ne!(transport.status().await, ConnectionState::Connected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_keepalive_closes_link_after_missed_pong() {
        let log = Arc::new(WireLog::default());
        let options = RealtimeTransportOptions {
            keepalive_interval: Some(1000),
            ..Default::default()
        };
        let transport = test_transport(&log, options);
        transport.connect().await.unwrap();

        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert!(log.pings.load(Ordering::SeqCst) >= 1);
        assert_eq!(log.closed.load(Ordering::SeqCst), 0);

        // No pong arrives, so the next tick declares the link dead
        tokio::time::sleep(Duration::from_millis(1000)).await;
        assert!(log.closed.load(Ordering::SeqCst) >= 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_keepalive_pong_keeps_link_alive() {
        let log = Arc::new(WireLog::default());
        let options = RealtimeTransportOptions {
            keepalive_interval: Some(1000),
            ..Default::default()
        };
        let transport = test_transport(&log, options);
        transport.connect().await.unwrap();

        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert_eq!(log.pings.load(Ordering::SeqCst), 1);
        log.push_inbound(Frame::Pong(Vec::new()));
        tokio::time::sleep(Duration::from_millis(1000)).await;

        assert_eq!(log.closed.load(Ordering::SeqCst), 0);
        assert_eq!(log.pings.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_outbox_checkpoint_restores_across_instances() {
        let store = Arc::new(SessionStore::new());
        let options = RealtimeTransportOptions {
            session_store: Some(Arc::clone(&store)),
            ..Default::default()
        };

        let log_a = Arc::new(WireLog::default());
        let first = test_transport(&log_a, options.clone());
        first.send(text_message("offline")).await.unwrap();
        drop(first);

        let log_b = Arc::new(WireLog::default());
        let second = test_transport(&log_b, options);
        assert_eq!(second.state.read().await.outbox.len(), 1);

        second.connect().await.unwrap();
        assert_eq!(log_b.sent_contents(), vec!["offline"]);
    }
}
