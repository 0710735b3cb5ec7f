//! Fetch–listen–render composition.
//!
//! [`TableSession`] wires the pieces together the way a top-level view
//! does: fetch the task identifier for a named dataset, hand it to the
//! listener under the dataset's query key, and expose the result stream
//! plus a rendered view of the latest payload. The renderer stays a leaf;
//! the session only calls into it.

use std::sync::Arc;

use tokio::sync::watch;

use crate::cache::ResultCache;
use crate::client::{EndpointConfig, TableClient};
use crate::error::Result;
use crate::listener::ResultListener;
use crate::render::TableView;
use crate::types::{QueryKey, ResultPayload, TaskId};

/// A client, a listener, and the cache they share.
pub struct TableSession {
    client: TableClient,
    listener: ResultListener,
    cache: Arc<ResultCache>,
}

impl TableSession {
    /// Creates a session with its own cache.
    pub fn new(config: EndpointConfig) -> Self {
        Self::with_cache(config, Arc::new(ResultCache::new()))
    }

    /// Creates a session sharing an existing cache, so several sessions in
    /// one component tree reuse each other's results.
    pub fn with_cache(config: EndpointConfig, cache: Arc<ResultCache>) -> Self {
        Self {
            client: TableClient::new(config.clone()),
            listener: ResultListener::new(config, Arc::clone(&cache)),
            cache,
        }
    }

    /// The HTTP client half of the session.
    pub fn client(&self) -> &TableClient {
        &self.client
    }

    /// The cache shared between this session's parts.
    pub fn cache(&self) -> &Arc<ResultCache> {
        &self.cache
    }

    /// Requests a read of the named dataset and starts listening for its
    /// result under the `["table", name]` query key.
    ///
    /// Returns the task identifier the backend handed out. Fetch and
    /// connection errors propagate; a cached result for the same
    /// identifier is published without opening a connection.
    pub async fn open(&self, name: &str) -> Result<TaskId> {
        let key = QueryKey::for_table(name);
        let task_id = self.client.fetch_result_id(name).await?;
        self.listener.listen(&key, task_id.clone()).await?;
        Ok(task_id)
    }

    /// Subscribes to result publications.
    pub fn results(&self) -> watch::Receiver<Option<ResultPayload>> {
        self.listener.subscribe()
    }

    /// Renders the latest payload, if one has been published.
    pub fn current_view(&self) -> Option<TableView> {
        self.listener.latest().map(|p| TableView::from_payload(&p))
    }

    /// Closes any open connection and returns the listener to idle.
    pub async fn close(&self) {
        self.listener.stop().await;
    }
}
