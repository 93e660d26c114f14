// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Connectivity monitor.
//!
//! Holds the current online/offline flag and broadcasts a
//! [`ConnectivityEvent`] on every real transition. Repeated signals for the
//! state we are already in are dropped, so listeners never see two
//! `BecameOnline` events in a row.
//!
//! The flag is driven either directly through [`ConnectivityMonitor::set_online`]
//! or by a background probe task that periodically checks whether the record
//! server's host accepts TCP connections.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::net::TcpStream;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::http::Uri;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::error::{Error, Result};

/// Capacity of the event channel. Slow listeners that fall further behind
/// than this observe `Lagged` and should re-read [`ConnectivityMonitor::is_online`].
const EVENT_CAPACITY: usize = 16;

/// A transition of the connectivity flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityEvent {
    BecameOnline,
    BecameOffline,
}

/// Something that can answer "is the backend reachable right now?".
pub trait Probe: Send + Sync {
    fn check(&self) -> Pin<Box<dyn Future<Output = bool> + Send + '_>>;
}

/// Probe that attempts a TCP connection to the record server's host and port.
#[derive(Debug, Clone)]
pub struct TcpProbe {
    host: String,
    port: u16,
    timeout: Duration,
}

impl TcpProbe {
    /// Build a probe for the host named in a `ws://` or `wss://` URL.
    ///
    /// Without an explicit port, `ws` uses 80 and `wss` uses 443.
    pub fn from_url(url: &str, timeout: Duration) -> Result<Self> {
        let uri: Uri = url
            .parse()
            .map_err(|_| Error::InvalidRemoteUrl(url.to_string()))?;
        let default_port = match uri.scheme_str() {
            Some("ws") => 80,
            Some("wss") => 443,
            _ => return Err(Error::InvalidRemoteUrl(url.to_string())),
        };
        let host = uri
            .host()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| Error::InvalidRemoteUrl(url.to_string()))?;
        Ok(TcpProbe {
            host: host.trim_start_matches('[').trim_end_matches(']').to_string(),
            port: uri.port_u16().unwrap_or(default_port),
            timeout,
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

impl Probe for TcpProbe {
    fn check(&self) -> Pin<Box<dyn Future<Output = bool> + Send + '_>> {
        Box::pin(async move {
            let addr = (self.host.as_str(), self.port);
            matches!(
                tokio::time::timeout(self.timeout, TcpStream::connect(addr)).await,
                Ok(Ok(_))
            )
        })
    }
}

/// Current connectivity plus a broadcast of its transitions.
pub struct ConnectivityMonitor {
    online: Mutex<bool>,
    events: broadcast::Sender<ConnectivityEvent>,
    cancel: CancellationToken,
}

impl ConnectivityMonitor {
    pub fn new(initially_online: bool) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        ConnectivityMonitor {
            online: Mutex::new(initially_online),
            events,
            cancel: CancellationToken::new(),
        }
    }

    /// Create a monitor whose initial state is the result of one probe.
    pub async fn detect(probe: &dyn Probe) -> Self {
        Self::new(probe.check().await)
    }

    pub fn is_online(&self) -> bool {
        *self.online.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Record the current connectivity.
    ///
    /// Emits an event and returns true only when the state actually changes.
    pub fn set_online(&self, online: bool) -> bool {
        let mut current = self.online.lock().unwrap_or_else(|e| e.into_inner());
        if *current == online {
            return false;
        }
        *current = online;

        let event = if online {
            info!("connection restored");
            ConnectivityEvent::BecameOnline
        } else {
            info!("connection lost");
            ConnectivityEvent::BecameOffline
        };
        // Sent under the lock so listeners observe transitions in order.
        // An error only means nobody is subscribed.
        let _ = self.events.send(event);
        true
    }

    /// Subscribe to future transitions. Dropping the receiver unsubscribes.
    pub fn subscribe(&self) -> broadcast::Receiver<ConnectivityEvent> {
        self.events.subscribe()
    }

    /// Number of live subscribers.
    pub fn listener_count(&self) -> usize {
        self.events.receiver_count()
    }

    /// Re-check connectivity with `probe` every `interval` until [`stop`](Self::stop).
    pub fn spawn_probe<P>(self: &Arc<Self>, probe: P, interval: Duration) -> JoinHandle<()>
    where
        P: Probe + 'static,
    {
        let monitor = Arc::clone(self);
        let cancel = self.cancel.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(interval) => {}
                }
                let reachable = tokio::select! {
                    _ = cancel.cancelled() => break,
                    reachable = probe.check() => reachable,
                };
                debug!(reachable, "connectivity probe");
                monitor.set_online(reachable);
            }
            debug!("connectivity probe stopped");
        })
    }

    /// Stop any probe tasks started by [`spawn_probe`](Self::spawn_probe).
    pub fn stop(&self) {
        self.cancel.cancel();
    }
}
