//! In-process WebSocket result server for integration tests.
//!
//! Mimics the backend's socket surface: accepts connections on
//! `/sock/task/{id}`, sends the scripted messages, and records
//! connection lifecycle events so tests can assert on open/close ordering.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use tokio::net::TcpListener;
use tokio_tungstenite::accept_hdr_async;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::Message;

/// A connection lifecycle event, tagged with the request path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Opened(String),
    Closed(String),
}

/// Scripted accept-side server: every connection receives the same
/// messages, then the server either closes or waits for the peer to.
pub struct ResultServer {
    addr: SocketAddr,
    events: Arc<Mutex<Vec<Event>>>,
    open: Arc<AtomicUsize>,
}

impl ResultServer {
    /// Starts the server. Each accepted connection is sent `messages` as
    /// text frames; with `close_after_send` the server then initiates the
    /// close (the backend's real behavior), otherwise it drains until the
    /// client closes.
    pub async fn start(messages: Vec<String>, close_after_send: bool) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let events = Arc::new(Mutex::new(Vec::new()));
        let open = Arc::new(AtomicUsize::new(0));

        let accept_events = Arc::clone(&events);
        let accept_open = Arc::clone(&open);
        tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    break;
                };
                let messages = messages.clone();
                let events = Arc::clone(&accept_events);
                let open = Arc::clone(&accept_open);
                tokio::spawn(async move {
                    let path = Arc::new(Mutex::new(String::new()));
                    let path_slot = Arc::clone(&path);
                    let callback =
                        move |req: &Request, resp: Response| -> Result<Response, ErrorResponse> {
                            *path_slot.lock() = req.uri().path().to_string();
                            Ok(resp)
                        };
                    let Ok(mut ws) = accept_hdr_async(stream, callback).await else {
                        return;
                    };
                    let path = path.lock().clone();
                    open.fetch_add(1, Ordering::SeqCst);
                    events.lock().push(Event::Opened(path.clone()));

                    for message in messages {
                        if ws.send(Message::text(message)).await.is_err() {
                            break;
                        }
                    }
                    if close_after_send {
                        let _ = ws.close(None).await;
                    }
                    while let Some(Ok(msg)) = ws.next().await {
                        if matches!(msg, Message::Close(_)) {
                            break;
                        }
                    }
                    open.fetch_sub(1, Ordering::SeqCst);
                    events.lock().push(Event::Closed(path));
                });
            }
        });

        Self {
            addr,
            events,
            open,
        }
    }

    /// `ws://` base URL for [`gridstream::EndpointConfig::with_socket_base`].
    pub fn socket_base(&self) -> String {
        format!("ws://{}", self.addr)
    }

    /// All lifecycle events recorded so far, in order.
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().clone()
    }

    /// Paths of accepted connections, in accept order.
    pub fn opened_paths(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                Event::Opened(path) => Some(path),
                Event::Closed(_) => None,
            })
            .collect()
    }

    /// Number of connections currently open.
    pub fn open_connections(&self) -> usize {
        self.open.load(Ordering::SeqCst)
    }
}

/// Polls `condition` until it holds, panicking after five seconds.
pub async fn wait_until(condition: impl Fn() -> bool) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}
