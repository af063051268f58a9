//! Transports that deliver the frame stream as ordered byte chunks.
//!
//! A transport turns an accepted [`TcpStream`] into a [`ChunkStream`]: a
//! stream of message payloads in arrival order, each no larger than one
//! frame. Messages above that ceiling are rejected here, before any bytes
//! reach a [`FrameReassembler`](crate::frame::FrameReassembler), and end the
//! connection.

use std::{fmt, io, num::NonZeroUsize};

use bytes::Bytes;
use futures::{StreamExt, stream::BoxStream};
use thiserror::Error;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite;
use tokio_util::codec::FramedRead;

pub mod framed;
pub mod socket;
pub mod websocket;

pub use framed::{ChunkCodec, LENGTH_HEADER_SIZE};

/// Ordered chunks of the frame stream from one connection.
pub type ChunkStream = BoxStream<'static, Result<Bytes, TransportError>>;

/// Wire formats the server can accept.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TransportKind {
    /// Binary WebSocket messages.
    #[default]
    WebSocket,
    /// Raw TCP carrying 4-byte big-endian length-prefixed messages.
    LengthDelimited,
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::WebSocket => "websocket",
            Self::LengthDelimited => "length-delimited",
        })
    }
}

/// Per-connection transport failures.
///
/// Any of these ends the affected connection only.
#[derive(Debug, Error)]
pub enum TransportError {
    /// A message exceeded the one-frame ceiling.
    #[error("message of {size} bytes exceeds the {max}-byte ceiling")]
    OversizedMessage {
        /// Declared or actual message size.
        size: usize,
        /// Configured ceiling.
        max: usize,
    },
    /// The peer closed the connection inside a message.
    #[error("connection closed mid-message after {received} payload bytes")]
    TruncatedMessage {
        /// Payload bytes received for the unfinished message.
        received: usize,
        /// Declared payload length, if the header arrived.
        expected: Option<usize>,
    },
    /// WebSocket protocol or capacity failure.
    #[error("websocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),
    /// Socket I/O failure.
    #[error("transport I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Complete any handshake on `stream` and expose its messages as chunks.
///
/// # Errors
///
/// Returns a [`TransportError`] if the WebSocket handshake fails.
pub async fn open(
    stream: TcpStream,
    kind: TransportKind,
    max_message_size: NonZeroUsize,
) -> Result<ChunkStream, TransportError> {
    match kind {
        TransportKind::WebSocket => websocket::accept(stream, max_message_size).await,
        TransportKind::LengthDelimited => {
            Ok(FramedRead::new(stream, ChunkCodec::new(max_message_size)).boxed())
        }
    }
}
