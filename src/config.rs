//! Relay configuration.
//!
//! [`RelayConfig`] gathers everything fixed at startup: the frame geometry
//! shared by all connections, where and how to listen, and how many frames
//! the display queue may hold. The defaults describe a 710x1080 RGBA stream
//! served over WebSocket on port 8081.

use std::{
    net::{Ipv4Addr, SocketAddr},
    num::NonZeroUsize,
};

use crate::{
    display::{FrameReceiver, FrameSender, FrameSink, frame_channel},
    geometry::{FrameGeometry, PixelFormat},
    server::{FrameServer, Unbound},
    transport::TransportKind,
};

/// Default frame width in pixels.
pub const DEFAULT_WIDTH: usize = 710;
/// Default frame height in pixels.
pub const DEFAULT_HEIGHT: usize = 1080;
/// Default listening port.
pub const DEFAULT_PORT: u16 = 8081;
/// Default display queue capacity in frames.
pub const DEFAULT_DISPLAY_QUEUE: NonZeroUsize = NonZeroUsize::MIN.saturating_add(3);

/// Startup configuration for a relay.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RelayConfig {
    /// Geometry of every frame on every connection.
    pub geometry: FrameGeometry,
    /// Address the server binds to.
    pub listen: SocketAddr,
    /// Wire format accepted from senders.
    pub transport: TransportKind,
    /// Accept workers; `None` uses the number of available cores.
    pub workers: Option<NonZeroUsize>,
    /// Frames the display queue holds before dropping the oldest.
    pub display_queue: NonZeroUsize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            geometry: default_geometry(),
            listen: SocketAddr::from((Ipv4Addr::LOCALHOST, DEFAULT_PORT)),
            transport: TransportKind::default(),
            workers: None,
            display_queue: DEFAULT_DISPLAY_QUEUE,
        }
    }
}

/// 710x1080 RGBA, 3 067 200 bytes per frame.
fn default_geometry() -> FrameGeometry {
    FrameGeometry::with_format(DEFAULT_WIDTH, DEFAULT_HEIGHT, PixelFormat::Rgba32)
        .unwrap_or_else(|_| unreachable!("710x1080 RGBA fits in usize"))
}

impl RelayConfig {
    /// Server builder preconfigured from this configuration.
    ///
    /// The returned server still has to be bound, normally to
    /// [`listen`](Self::listen).
    #[must_use]
    pub fn server<K: FrameSink>(&self, sink: K) -> FrameServer<K, Unbound> {
        let server = FrameServer::new(self.geometry, sink).transport(self.transport);
        match self.workers {
            Some(workers) => server.workers(workers.get()),
            None => server,
        }
    }

    /// Display queue sized by [`display_queue`](Self::display_queue).
    #[must_use]
    pub fn display_channel(&self) -> (FrameSender, FrameReceiver) {
        frame_channel(self.display_queue)
    }
}
