//! Live task-result subscription.
//!
//! [`ResultListener`] is a two-state machine: **Idle** (no connection) and
//! **Listening** (one WebSocket connection open for a task identifier).
//! Results are published through a [`watch`] channel; consumers subscribe
//! and re-read on change, the way a view re-renders.
//!
//! Switching to a new task identifier always tears the previous connection
//! down first — the reader task is cancelled and awaited — so at most one
//! connection is ever open per listener. Before connecting, the cache is
//! consulted: an entry stored under the same task identifier is published
//! immediately and no connection is opened.
//!
//! The backend sends one terminal message per task and closes. The reader
//! nevertheless treats every message as a full snapshot replacing the
//! previous one, so streaming backends and duplicate delivery degrade
//! gracefully. There is no reconnect-on-drop and no timeout.

use std::sync::Arc;

use futures::StreamExt;
use tokio::net::TcpStream;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::cache::ResultCache;
use crate::client::EndpointConfig;
use crate::error::Result;
use crate::types::{QueryKey, ResultPayload, TaskId};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

enum ListenerState {
    Idle,
    Listening {
        task_id: TaskId,
        cancel: CancellationToken,
        reader: JoinHandle<()>,
    },
}

/// Subscribes to task results over a WebSocket and publishes the latest
/// payload.
pub struct ResultListener {
    config: EndpointConfig,
    cache: Arc<ResultCache>,
    tx: watch::Sender<Option<ResultPayload>>,
    state: Mutex<ListenerState>,
}

impl ResultListener {
    /// Creates an idle listener sharing the given cache.
    pub fn new(config: EndpointConfig, cache: Arc<ResultCache>) -> Self {
        let (tx, _rx) = watch::channel(None);
        Self {
            config,
            cache,
            tx,
            state: Mutex::new(ListenerState::Idle),
        }
    }

    /// Subscribes to result publications. The receiver holds `None` until
    /// a payload arrives.
    pub fn subscribe(&self) -> watch::Receiver<Option<ResultPayload>> {
        self.tx.subscribe()
    }

    /// The most recently published payload, if any.
    pub fn latest(&self) -> Option<ResultPayload> {
        self.tx.borrow().clone()
    }

    /// Starts listening for the result of `task_id` under `key`.
    ///
    /// Calling with the identifier already being listened for is a no-op.
    /// Otherwise any previous connection is closed (reader awaited) before
    /// a new one is opened. A cache entry stored under `task_id` is
    /// published without connecting; the listener stays idle in that case.
    /// Connection errors propagate and leave the listener idle.
    pub async fn listen(&self, key: &QueryKey, task_id: TaskId) -> Result<()> {
        let mut state = self.state.lock().await;

        if let ListenerState::Listening {
            task_id: current, ..
        } = &*state
        {
            if *current == task_id {
                debug!(%task_id, "already listening");
                return Ok(());
            }
        }

        Self::teardown(&mut state).await;

        if let Some(hit) = self.cache.lookup(key, &task_id) {
            debug!(%task_id, %key, "serving cached result");
            self.tx.send_replace(Some(hit));
            return Ok(());
        }

        let url = self.config.socket_url(&task_id)?;
        debug!(%url, "opening result connection");
        let (stream, _response) = connect_async(url.as_str()).await?;
        info!(%task_id, "listening for task result");

        let cancel = CancellationToken::new();
        let reader = tokio::spawn(read_results(
            stream,
            cancel.clone(),
            self.tx.clone(),
            Arc::clone(&self.cache),
            key.clone(),
            task_id.clone(),
        ));
        *state = ListenerState::Listening {
            task_id,
            cancel,
            reader,
        };
        Ok(())
    }

    /// Returns to idle, closing any open connection. The reader task is
    /// awaited, so no connection remains open when this returns.
    pub async fn stop(&self) {
        let mut state = self.state.lock().await;
        Self::teardown(&mut state).await;
    }

    /// The identifier currently being listened for, if a connection is
    /// open. Cache-served results leave the listener idle.
    pub async fn current_task(&self) -> Option<TaskId> {
        match &*self.state.lock().await {
            ListenerState::Idle => None,
            ListenerState::Listening { task_id, .. } => Some(task_id.clone()),
        }
    }

    async fn teardown(state: &mut ListenerState) {
        if let ListenerState::Listening {
            task_id,
            cancel,
            reader,
        } = std::mem::replace(state, ListenerState::Idle)
        {
            debug!(%task_id, "closing result connection");
            cancel.cancel();
            if let Err(err) = reader.await {
                warn!(%task_id, error = %err, "reader task aborted");
            }
        }
    }
}

impl Drop for ResultListener {
    fn drop(&mut self) {
        // Cannot await the reader here; cancelling stops it promptly.
        if let Some(ListenerState::Listening { cancel, .. }) =
            self.state.try_lock().ok().as_deref()
        {
            cancel.cancel();
        }
    }
}

/// Reader loop: decode each text message, publish it, overwrite the cache.
async fn read_results(
    mut stream: WsStream,
    cancel: CancellationToken,
    tx: watch::Sender<Option<ResultPayload>>,
    cache: Arc<ResultCache>,
    key: QueryKey,
    task_id: TaskId,
) {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            message = stream.next() => match message {
                Some(Ok(Message::Text(text))) => {
                    match ResultPayload::from_json_str(&text) {
                        Ok(payload) => {
                            debug!(%task_id, rows = payload.rows().len(), "result received");
                            cache.insert(&key, task_id.clone(), payload.clone());
                            tx.send_replace(Some(payload));
                        }
                        Err(err) => {
                            warn!(%task_id, error = %err, "discarding undecodable message");
                        }
                    }
                }
                Some(Ok(Message::Close(_))) => {
                    debug!(%task_id, "backend closed connection");
                    break;
                }
                // Pings and pongs are handled by the protocol layer;
                // binary frames are not part of the contract.
                Some(Ok(_)) => {}
                Some(Err(err)) => {
                    warn!(%task_id, error = %err, "connection failed");
                    break;
                }
                None => break,
            },
        }
    }
    if let Err(err) = stream.close(None).await {
        debug!(%task_id, error = %err, "close handshake incomplete");
    }
}
