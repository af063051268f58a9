//! Tokio-based server relaying reassembled frames to a display sink.
//!
//! `FrameServer` spawns worker tasks to accept TCP connections, opens the
//! configured transport on each, and runs one
//! [`ConnectionSession`](crate::session::ConnectionSession) per connection.
//! Every session shares the same [`FrameGeometry`] and [`FrameSink`].

use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use tokio::{net::TcpListener, sync::oneshot};

use crate::{
    display::FrameSink,
    geometry::FrameGeometry,
    session::ConnectionId,
    transport::TransportKind,
};

/// Tokio-based server feeding a [`FrameSink`] from many connections.
///
/// The server carries a typestate `S` indicating whether it is
/// [`Unbound`] (not yet bound to a TCP listener) or [`Bound`]. New
/// servers start `Unbound` and must call [`FrameServer::bind`] or
/// [`FrameServer::bind_existing_listener`] before running. The server
/// listens for a shutdown signal using `tokio::signal::ctrl_c` and notifies
/// all workers and connections to stop.
pub struct FrameServer<K, S = Unbound>
where
    K: FrameSink,
    S: ServerState,
{
    pub(crate) geometry: FrameGeometry,
    pub(crate) sink: Arc<K>,
    pub(crate) transport: TransportKind,
    pub(crate) workers: usize,
    pub(crate) backoff_config: BackoffConfig,
    /// Channel used to notify when the server is ready.
    ///
    /// A `oneshot::Sender` can transmit only one readiness notification, so a
    /// new `ready_tx` must be provided each time the server is started.
    pub(crate) ready_tx: Option<oneshot::Sender<()>>,
    /// Typestate tracking whether the server has been bound to a listener.
    pub(crate) state: S,
}

/// Marker indicating the server has not yet bound a listener.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unbound;

/// Marker indicating the server is bound to a TCP listener.
#[derive(Debug, Clone)]
pub struct Bound {
    pub(crate) listener: Arc<TcpListener>,
}

/// Trait implemented by [`Unbound`] and [`Bound`] to model binding typestate.
pub trait ServerState: sealed::Sealed {}

mod sealed {
    //! Prevent external implementations of [`ServerState`].

    pub trait Sealed {}
    impl Sealed for super::Unbound {}
    impl Sealed for super::Bound {}
}

impl ServerState for Unbound {}
impl ServerState for Bound {}

/// State every connection task needs: geometry, sink, transport and ids.
pub(crate) struct ConnectionContext<K: FrameSink> {
    pub geometry: FrameGeometry,
    pub sink: Arc<K>,
    pub transport: TransportKind,
    ids: Arc<AtomicU64>,
}

impl<K: FrameSink> ConnectionContext<K> {
    pub(crate) fn new(geometry: FrameGeometry, sink: Arc<K>, transport: TransportKind) -> Self {
        Self {
            geometry,
            sink,
            transport,
            ids: Arc::new(AtomicU64::new(1)),
        }
    }

    pub(crate) fn next_id(&self) -> ConnectionId {
        ConnectionId::new(self.ids.fetch_add(1, Ordering::Relaxed))
    }
}

impl<K: FrameSink> Clone for ConnectionContext<K> {
    fn clone(&self) -> Self {
        Self {
            geometry: self.geometry,
            sink: Arc::clone(&self.sink),
            transport: self.transport,
            ids: Arc::clone(&self.ids),
        }
    }
}

mod config;
mod connection;
pub mod error;
pub use error::ServerError;
mod runtime;

/// Re-exported configuration types for server backoff behavior.
pub use runtime::BackoffConfig;

#[cfg(test)]
pub(crate) mod test_util;
