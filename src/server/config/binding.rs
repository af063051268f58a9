//! Listener binding for [`FrameServer`].

use std::{
    net::{SocketAddr, TcpListener as StdTcpListener},
    sync::Arc,
};

use tokio::net::TcpListener;

use crate::{
    display::FrameSink,
    server::{Bound, FrameServer, ServerError, ServerState, Unbound},
};

impl<K, S> FrameServer<K, S>
where
    K: FrameSink,
    S: ServerState,
{
    fn bind_to_listener(self, std_listener: StdTcpListener) -> Result<FrameServer<K, Bound>, ServerError> {
        let FrameServer {
            geometry,
            sink,
            transport,
            workers,
            backoff_config,
            ready_tx,
            ..
        } = self;

        std_listener
            .set_nonblocking(true)
            .map_err(ServerError::Bind)?;
        let tokio_listener = TcpListener::from_std(std_listener).map_err(ServerError::Bind)?;

        Ok(FrameServer {
            geometry,
            sink,
            transport,
            workers,
            backoff_config,
            ready_tx,
            state: Bound {
                listener: Arc::new(tokio_listener),
            },
        })
    }
}

impl<K: FrameSink> FrameServer<K, Unbound> {
    /// Return `None` as the server is not bound.
    #[must_use]
    pub const fn local_addr(&self) -> Option<SocketAddr> { None }

    /// Bind to a fresh address.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::net::{Ipv4Addr, SocketAddr};
    ///
    /// use framerelay::{frame::Frame, geometry::FrameGeometry, server::FrameServer};
    ///
    /// let geometry = FrameGeometry::new(4, 4, 4).expect("valid geometry");
    /// let addr = SocketAddr::from((Ipv4Addr::LOCALHOST, 0));
    /// # let rt = tokio::runtime::Runtime::new().expect("runtime");
    /// # let _guard = rt.enter();
    /// let server = FrameServer::new(geometry, |_frame: Frame| {})
    ///     .bind(addr)
    ///     .expect("bind failed");
    /// assert!(server.local_addr().is_some());
    /// ```
    ///
    /// # Errors
    /// Returns a [`ServerError`] if binding or configuring the listener fails.
    pub fn bind(self, addr: SocketAddr) -> Result<FrameServer<K, Bound>, ServerError> {
        let std_listener = StdTcpListener::bind(addr).map_err(ServerError::Bind)?;
        self.bind_existing_listener(std_listener)
    }

    /// Bind to an existing `StdTcpListener`.
    ///
    /// # Errors
    /// Returns a [`ServerError`] if configuring the listener fails.
    pub fn bind_existing_listener(
        self,
        std_listener: StdTcpListener,
    ) -> Result<FrameServer<K, Bound>, ServerError> {
        self.bind_to_listener(std_listener)
    }
}

impl<K: FrameSink> FrameServer<K, Bound> {
    /// Returns the bound address, or `None` if retrieving it fails.
    #[must_use]
    pub fn local_addr(&self) -> Option<SocketAddr> { self.state.listener.local_addr().ok() }

    /// Rebind to a fresh address.
    ///
    /// # Errors
    /// Returns a [`ServerError`] if binding or configuring the listener fails.
    pub fn bind(self, addr: SocketAddr) -> Result<Self, ServerError> {
        let std_listener = StdTcpListener::bind(addr).map_err(ServerError::Bind)?;
        self.bind_existing_listener(std_listener)
    }

    /// Rebind to an existing `StdTcpListener`.
    ///
    /// # Errors
    /// Returns a [`ServerError`] if configuring the listener fails.
    pub fn bind_existing_listener(self, std_listener: StdTcpListener) -> Result<Self, ServerError> {
        self.bind_to_listener(std_listener)
    }
}
