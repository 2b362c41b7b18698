//! Registry of connected WebSocket clients.
//!
//! # Responsibilities
//! - Name and register upgraded clients (`<user>_<n>`)
//! - Enforce the client limit
//! - Echo frames back to each client
//! - Fan bus events out to every client
//!
//! # Design Decisions
//! - Each client owns an unbounded outbound queue drained by its own writer
//!   task, so a broadcast never waits on a slow socket
//! - Removal is keyed by name and registration id, so a replaced session
//!   cannot unregister its successor
//! - Upgrades past the limit are closed at once rather than queued
//! - A slot is reserved on an atomic counter while the name's shard is
//!   locked, so concurrent upgrades can never overshoot the limit

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use dashmap::{mapref::entry::Entry, DashMap};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

use crate::observability::metrics;
use crate::pubsub::{BroadcastBus, Event};

/// Registration failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WsError {
    #[error("client limit of {max} reached")]
    Full { max: usize },
}

struct ClientHandle {
    id: u64,
    tx: mpsc::UnboundedSender<Message>,
}

/// A freshly registered client.
#[derive(Debug)]
pub struct Registration {
    pub name: String,
    pub id: u64,
    /// Queue feeding this client's socket.
    pub sender: mpsc::UnboundedSender<Message>,
    pub receiver: mpsc::UnboundedReceiver<Message>,
}

pub struct WsClientManager {
    clients: DashMap<String, ClientHandle>,
    /// Occupied slots; bumped only through `reserve_slot`.
    occupied: AtomicUsize,
    next_id: AtomicU64,
    max_clients: usize,
    default_user: String,
}

impl WsClientManager {
    pub fn new(max_clients: usize, default_user: impl Into<String>) -> Self {
        Self {
            clients: DashMap::new(),
            occupied: AtomicUsize::new(0),
            next_id: AtomicU64::new(0),
            max_clients,
            default_user: default_user.into(),
        }
    }

    fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Register a client named after `user` (or the default user).
    pub fn register(&self, user: Option<&str>) -> Result<Registration, WsError> {
        let user = user.filter(|u| !u.is_empty()).unwrap_or(&self.default_user);
        let id = self.next_id();
        self.register_as(format!("{user}_{id}"), id)
    }

    /// Register under an explicit name, closing any session already using it.
    pub fn register_named(&self, name: impl Into<String>) -> Result<Registration, WsError> {
        let id = self.next_id();
        self.register_as(name.into(), id)
    }

    fn reserve_slot(&self) -> bool {
        self.occupied
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                (n < self.max_clients).then_some(n + 1)
            })
            .is_ok()
    }

    fn register_as(&self, name: String, id: u64) -> Result<Registration, WsError> {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = ClientHandle { id, tx: tx.clone() };

        let previous = match self.clients.entry(name.clone()) {
            Entry::Occupied(mut entry) => Some(entry.insert(handle)),
            Entry::Vacant(entry) => {
                if !self.reserve_slot() {
                    tracing::warn!(client = %name, max = self.max_clients, "WebSocket client limit reached");
                    return Err(WsError::Full {
                        max: self.max_clients,
                    });
                }
                entry.insert(handle);
                None
            }
        };
        if let Some(old) = previous {
            tracing::info!(client = %name, "Replacing existing WebSocket session");
            let _ = old.tx.send(Message::Close(None));
        }

        metrics::record_ws_clients(self.clients.len());
        tracing::info!(client = %name, clients = self.clients.len(), "WebSocket client registered");

        Ok(Registration {
            name,
            id,
            sender: tx,
            receiver: rx,
        })
    }

    /// Remove `name` if it still belongs to registration `id`.
    pub fn unregister(&self, name: &str, id: u64) -> bool {
        let removed = self.clients.remove_if(name, |_, handle| handle.id == id).is_some();
        if removed {
            self.occupied.fetch_sub(1, Ordering::AcqRel);
            metrics::record_ws_clients(self.clients.len());
            tracing::info!(client = %name, clients = self.clients.len(), "WebSocket client unregistered");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.clients.contains_key(name)
    }

    /// Send a JSON message to every client. Returns how many queues accepted it.
    ///
    /// Messages that are not valid JSON are dropped.
    pub fn broadcast_to_all(&self, message: &str) -> usize {
        let text = match serde_json::from_str::<serde_json::Value>(message) {
            Ok(value) => value.to_string(),
            Err(e) => {
                tracing::warn!(error = %e, "Dropping broadcast that is not valid JSON");
                return 0;
            }
        };

        let mut delivered = 0;
        let mut dead = Vec::new();
        for entry in self.clients.iter() {
            if entry.tx.send(Message::Text(text.clone().into())).is_ok() {
                delivered += 1;
            } else {
                dead.push((entry.key().clone(), entry.id));
            }
        }
        for (name, id) in dead {
            self.unregister(&name, id);
        }

        tracing::debug!(delivered, "Broadcast sent");
        delivered
    }

    /// Ask every client to close.
    pub fn close_all(&self) {
        for entry in self.clients.iter() {
            let _ = entry.tx.send(Message::Close(None));
        }
    }

    /// Drive one upgraded socket until either side closes.
    pub async fn run_session(self: Arc<Self>, mut socket: WebSocket, user: Option<String>) {
        let Registration {
            name,
            id,
            sender,
            mut receiver,
        } = match self.register(user.as_deref()) {
            Ok(registration) => registration,
            Err(e) => {
                tracing::warn!(error = %e, "Closing WebSocket upgrade");
                let _ = socket.send(Message::Close(None)).await;
                return;
            }
        };

        let (mut sink, mut stream) = socket.split();

        let mut writer = tokio::spawn(async move {
            while let Some(message) = receiver.recv().await {
                let closing = matches!(message, Message::Close(_));
                if sink.send(message).await.is_err() || closing {
                    break;
                }
            }
        });

        let reader_name = name.clone();
        let mut reader = tokio::spawn(async move {
            while let Some(frame) = stream.next().await {
                let echo = match frame {
                    Ok(Message::Text(text)) => Message::Text(text),
                    Ok(Message::Binary(bytes)) => Message::Binary(bytes),
                    Ok(Message::Close(_)) => break,
                    Ok(_) => continue,
                    Err(e) => {
                        tracing::debug!(client = %reader_name, error = %e, "WebSocket read failed");
                        break;
                    }
                };
                if sender.send(echo).is_err() {
                    break;
                }
            }
        });

        tokio::select! {
            _ = &mut writer => reader.abort(),
            _ = &mut reader => writer.abort(),
        }

        self.unregister(&name, id);
    }

    /// Forward bus events to every client until shutdown.
    pub fn spawn_relay(
        self: Arc<Self>,
        bus: &BroadcastBus,
        mut shutdown: broadcast::Receiver<()>,
    ) -> JoinHandle<()> {
        let mut events = bus.subscribe();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown.recv() => {
                        self.close_all();
                        break;
                    }
                    event = events.recv() => match event {
                        Ok(event) => self.relay(&event),
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            tracing::warn!(skipped, "WebSocket relay lagged behind the bus");
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                }
            }
            tracing::debug!("WebSocket relay stopped");
        })
    }

    fn relay(&self, event: &Event) {
        match serde_json::to_string(event) {
            Ok(text) => {
                self.broadcast_to_all(&text);
            }
            Err(e) => tracing::warn!(error = %e, subject = %event.subject, "Failed to encode event"),
        }
    }
}

impl std::fmt::Debug for WsClientManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WsClientManager")
            .field("clients", &self.clients.len())
            .field("max_clients", &self.max_clients)
            .finish()
    }
}
