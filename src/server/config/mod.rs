//! Configuration utilities for [`FrameServer`].

use std::sync::Arc;

use tokio::sync::oneshot;

use super::{BackoffConfig, FrameServer, ServerState, Unbound};
use crate::{display::FrameSink, geometry::FrameGeometry, transport::TransportKind};

pub mod binding;


impl<K: FrameSink> FrameServer<K, Unbound> {
    /// Create a new `FrameServer` for frames of `geometry`, delivering them
    /// to `sink`.
    ///
    /// The worker count defaults to the number of available CPU cores (or 1
    /// if this cannot be determined) and the transport to
    /// [`TransportKind::WebSocket`]. The TCP listener is unset; call
    /// [`bind`](Self::bind) before running the server.
    #[must_use]
    pub fn new(geometry: FrameGeometry, sink: K) -> Self {
        Self::with_shared_sink(geometry, Arc::new(sink))
    }

    /// Like [`new`](Self::new), for a sink already shared elsewhere.
    #[must_use]
    pub fn with_shared_sink(geometry: FrameGeometry, sink: Arc<K>) -> Self {
        let workers = std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get);
        Self {
            geometry,
            sink,
            transport: TransportKind::default(),
            workers,
            backoff_config: BackoffConfig::default(),
            ready_tx: None,
            state: Unbound,
        }
    }
}

impl<K, S> FrameServer<K, S>
where
    K: FrameSink,
    S: ServerState,
{
    /// Set the number of worker tasks to spawn for the server.
    #[must_use]
    pub fn workers(mut self, count: usize) -> Self {
        self.workers = count.max(1);
        self
    }

    /// Select the wire format accepted on every connection.
    #[must_use]
    pub fn transport(mut self, kind: TransportKind) -> Self {
        self.transport = kind;
        self
    }

    /// Configure exponential back-off for failed `accept()` calls.
    ///
    /// The configuration is normalized before use.
    #[must_use]
    pub fn accept_backoff(mut self, cfg: BackoffConfig) -> Self {
        self.backoff_config = cfg.normalized();
        self
    }

    /// Configure a channel used to signal when the server is ready to accept connections.
    #[must_use]
    pub fn ready_signal(mut self, tx: oneshot::Sender<()>) -> Self {
        self.ready_tx = Some(tx);
        self
    }

    /// Returns the configured number of worker tasks for the server.
    #[inline]
    #[must_use]
    pub const fn worker_count(&self) -> usize { self.workers }

    /// Returns the configured transport.
    #[must_use]
    pub const fn transport_kind(&self) -> TransportKind { self.transport }

    /// Returns the geometry shared by every connection.
    #[must_use]
    pub const fn geometry(&self) -> FrameGeometry { self.geometry }

    /// Returns the active back-off configuration.
    #[must_use]
    pub const fn backoff_config(&self) -> BackoffConfig { self.backoff_config }
}
