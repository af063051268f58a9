//! Sending side of the relay.
//!
//! [`FrameClient`] connects to a relay over either transport and writes the
//! frame stream as chunks no larger than one frame. The ceiling is checked
//! locally so an oversized chunk never reaches the wire.

use std::{fmt, io, net::SocketAddr, num::NonZeroUsize};

use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use log::debug;
use thiserror::Error;
use tokio::net::TcpStream;
use tokio_tungstenite::{
    WebSocketStream,
    client_async_with_config,
    tungstenite::{self, Message},
};
use tokio_util::codec::FramedWrite;

use crate::{
    geometry::FrameGeometry,
    transport::{ChunkCodec, TransportError, TransportKind, socket, websocket},
};

/// Errors emitted by [`FrameClient`].
#[derive(Debug, Error)]
pub enum ClientError {
    /// Connecting or writing to the socket failed.
    #[error("client I/O error: {0}")]
    Io(#[from] io::Error),
    /// WebSocket handshake or send failed.
    #[error("websocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),
    /// Length-prefixed send failed.
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// A chunk larger than one frame was offered.
    #[error("chunk of {size} bytes exceeds the {max}-byte frame size")]
    OversizedChunk {
        /// Offered chunk length.
        size: usize,
        /// Frame size of the connection.
        max: usize,
    },
}

enum Link {
    WebSocket(Box<WebSocketStream<TcpStream>>),
    LengthDelimited(FramedWrite<TcpStream, ChunkCodec>),
}

/// Connection to a relay server.
///
/// # Examples
///
/// ```no_run
/// use bytes::Bytes;
/// use framerelay::{client::FrameClient, geometry::FrameGeometry, transport::TransportKind};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let geometry = FrameGeometry::new(710, 1080, 4)?;
/// let addr = "127.0.0.1:8081".parse()?;
/// let mut client = FrameClient::connect(addr, TransportKind::WebSocket, geometry).await?;
/// client.send_chunk(Bytes::from(vec![0; 1024])).await?;
/// client.close().await?;
/// # Ok(())
/// # }
/// ```
pub struct FrameClient {
    link: Link,
    geometry: FrameGeometry,
    sent_bytes: u64,
}

impl FrameClient {
    /// Connect to `addr` using `kind`, for frames of `geometry`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] if the TCP connection or WebSocket handshake
    /// fails.
    pub async fn connect(
        addr: SocketAddr,
        kind: TransportKind,
        geometry: FrameGeometry,
    ) -> Result<Self, ClientError> {
        let stream = TcpStream::connect(addr).await?;
        socket::tune(&stream)?;
        let max = geometry.frame_size();
        let link = match kind {
            TransportKind::WebSocket => {
                let url = format!("ws://{addr}/");
                let (ws, _) =
                    client_async_with_config(url, stream, Some(websocket::config(max))).await?;
                Link::WebSocket(Box::new(ws))
            }
            TransportKind::LengthDelimited => {
                Link::LengthDelimited(FramedWrite::new(stream, ChunkCodec::new(max)))
            }
        };
        debug!("connected to relay: addr={addr}, transport={kind}");
        Ok(Self {
            link,
            geometry,
            sent_bytes: 0,
        })
    }

    /// Geometry this client sends frames for.
    #[must_use]
    pub const fn geometry(&self) -> FrameGeometry { self.geometry }

    /// Transport in use.
    #[must_use]
    pub fn transport_kind(&self) -> TransportKind {
        match self.link {
            Link::WebSocket(_) => TransportKind::WebSocket,
            Link::LengthDelimited(_) => TransportKind::LengthDelimited,
        }
    }

    /// Total payload bytes sent so far.
    #[must_use]
    pub const fn sent_bytes(&self) -> u64 { self.sent_bytes }

    /// Send one chunk as a single message.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::OversizedChunk`] if `chunk` is larger than one
    /// frame, or the underlying send error.
    pub async fn send_chunk(&mut self, chunk: Bytes) -> Result<(), ClientError> {
        let max = self.geometry.frame_size().get();
        if chunk.len() > max {
            return Err(ClientError::OversizedChunk {
                size: chunk.len(),
                max,
            });
        }
        let len = chunk.len() as u64;
        match &mut self.link {
            Link::WebSocket(ws) => ws.send(Message::Binary(chunk)).await?,
            Link::LengthDelimited(framed) => framed.send(chunk).await?,
        }
        self.sent_bytes += len;
        Ok(())
    }

    /// Send `data` split into chunks of `chunk_size` bytes.
    ///
    /// Returns the number of messages written. `data` need not be a whole
    /// number of frames; the relay buffers any remainder.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::OversizedChunk`] if `chunk_size` exceeds one
    /// frame, or the first send error.
    pub async fn send_stream(
        &mut self,
        data: Bytes,
        chunk_size: NonZeroUsize,
    ) -> Result<usize, ClientError> {
        let max = self.geometry.frame_size().get();
        if chunk_size.get() > max {
            return Err(ClientError::OversizedChunk {
                size: chunk_size.get(),
                max,
            });
        }
        let mut sent = 0;
        let mut offset = 0;
        while offset < data.len() {
            let end = data.len().min(offset + chunk_size.get());
            self.send_chunk(data.slice(offset..end)).await?;
            offset = end;
            sent += 1;
        }
        Ok(sent)
    }

    /// Flush pending messages and close the connection.
    ///
    /// # Errors
    ///
    /// Returns the error raised while flushing or closing.
    pub async fn close(self) -> Result<(), ClientError> {
        match self.link {
            Link::WebSocket(mut ws) => {
                WebSocketStream::close(ws.as_mut(), None).await?;
                // Drain until the server acknowledges the close.
                while let Some(message) = ws.next().await {
                    if message.is_err() {
                        break;
                    }
                }
            }
            Link::LengthDelimited(mut framed) => framed.close().await?,
        }
        Ok(())
    }
}

impl fmt::Debug for FrameClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameClient")
            .field("transport", &self.transport_kind())
            .field("geometry", &self.geometry)
            .field("sent_bytes", &self.sent_bytes)
            .finish()
    }
}
