//! Errors raised by [`FrameServer`](super::FrameServer) operations.

use std::io;

use thiserror::Error;

/// Errors that may occur while setting up or running the server.
///
/// Per-connection faults never surface here; they end only their own
/// session.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Binding or configuring the listener failed.
    #[error("bind error: {0}")]
    Bind(#[source] io::Error),
}
