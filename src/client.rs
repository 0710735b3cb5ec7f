//! Endpoint configuration and the result fetcher.
//!
//! [`TableClient`] speaks the backend's HTTP surface: a dataset read request
//! that returns a task identifier, and a polling endpoint that returns the
//! task's value once ready. The live-subscription path lives in
//! [`crate::listener`].

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::error::{Error, Result};
use crate::types::{ResultPayload, TaskId};

const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";
const DEFAULT_ROW_LIMIT: u32 = 5;

/// Where the backend lives and how many rows to request.
///
/// Defaults preserve the conventional local deployment:
/// `http://127.0.0.1:5000` with a row limit of 5. The socket endpoint is
/// derived from the base URL (`http` becomes `ws`) unless an explicit
/// socket base is set.
#[derive(Debug, Clone)]
pub struct EndpointConfig {
    base_url: Url,
    socket_base: Option<Url>,
    row_limit: u32,
}

impl EndpointConfig {
    /// Parses the HTTP base URL, e.g. `http://127.0.0.1:5000`.
    pub fn new(base_url: impl AsRef<str>) -> Result<Self> {
        Ok(Self {
            base_url: Url::parse(base_url.as_ref())?,
            socket_base: None,
            row_limit: DEFAULT_ROW_LIMIT,
        })
    }

    /// Sets a socket base URL distinct from the HTTP base.
    pub fn with_socket_base(mut self, socket_base: impl AsRef<str>) -> Result<Self> {
        self.socket_base = Some(Url::parse(socket_base.as_ref())?);
        Ok(self)
    }

    /// Sets the row limit used in dataset read requests.
    pub fn with_row_limit(mut self, row_limit: u32) -> Self {
        self.row_limit = row_limit;
        self
    }

    /// The configured row limit.
    pub fn row_limit(&self) -> u32 {
        self.row_limit
    }

    /// `GET {base}/api/db/{name}/{limit}` — dataset read request.
    pub(crate) fn table_url(&self, name: &str) -> Result<Url> {
        validate_dataset_name(name)?;
        Ok(self
            .base_url
            .join(&format!("/api/db/{name}/{}", self.row_limit))?)
    }

    /// `GET {base}/api/result/{id}` — task result polling.
    pub(crate) fn result_url(&self, task_id: &TaskId) -> Result<Url> {
        Ok(self
            .base_url
            .join(&format!("/api/result/{}", task_id.as_str()))?)
    }

    /// `{ws_base}/sock/task/{id}` — live result subscription.
    pub(crate) fn socket_url(&self, task_id: &TaskId) -> Result<Url> {
        let mut url = self
            .socket_base
            .clone()
            .unwrap_or_else(|| self.base_url.clone());
        if matches!(url.scheme(), "http" | "https") {
            let ws = if url.scheme() == "https" { "wss" } else { "ws" };
            // http(s) and ws(s) are all "special" schemes, so the swap
            // cannot fail.
            let _ = url.set_scheme(ws);
        }
        Ok(url.join(&format!("/sock/task/{}", task_id.as_str()))?)
    }
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_BASE_URL).expect("default endpoint is valid"),
            socket_base: None,
            row_limit: DEFAULT_ROW_LIMIT,
        }
    }
}

/// Dataset names become URL path segments; only plain identifiers pass.
fn validate_dataset_name(name: &str) -> Result<()> {
    let plain = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if plain {
        Ok(())
    } else {
        Err(Error::InvalidDatasetName {
            name: name.to_string(),
        })
    }
}

/// Wire shape of the dataset read response.
#[derive(Debug, Deserialize)]
struct TaskTicket {
    result_id: String,
}

/// Wire shape of the polling response; `value` is `null` until the task
/// completes.
#[derive(Debug, Deserialize)]
struct TaskResultEnvelope {
    #[serde(default)]
    value: Value,
}

/// HTTP client for the tabular-computation backend.
#[derive(Debug, Clone)]
pub struct TableClient {
    config: EndpointConfig,
    http: reqwest::Client,
}

impl TableClient {
    /// Creates a client for the given endpoints.
    pub fn new(config: EndpointConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    /// The endpoint configuration this client was built with.
    pub fn config(&self) -> &EndpointConfig {
        &self.config
    }

    /// Requests a read of the named dataset and returns the task
    /// identifier the backend handed out for it.
    pub async fn fetch_result_id(&self, name: &str) -> Result<TaskId> {
        let url = self.config.table_url(name)?;
        debug!(%url, "requesting dataset read");
        let ticket: TaskTicket = self
            .http
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        debug!(result_id = %ticket.result_id, "task accepted");
        Ok(TaskId::from(ticket.result_id))
    }

    /// Polls the task's result over HTTP.
    ///
    /// Returns `Ok(None)` while the task is still pending. The backend
    /// reports the value either as a JSON-encoded string or as the payload
    /// object itself; both decode through the same validation.
    pub async fn poll_result(&self, task_id: &TaskId) -> Result<Option<ResultPayload>> {
        let url = self.config.result_url(task_id)?;
        debug!(%url, "polling task result");
        let envelope: TaskResultEnvelope = self
            .http
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        match envelope.value {
            Value::Null => Ok(None),
            Value::String(text) => ResultPayload::from_json_str(&text).map(Some),
            other => ResultPayload::from_value(other).map(Some),
        }
    }
}
