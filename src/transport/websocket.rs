//! WebSocket transport.
//!
//! Every binary message is one chunk. Text messages are not part of the frame
//! stream and are skipped; control frames are answered by `tungstenite`. The
//! message and frame size limits are both set to one frame, so an oversized
//! message fails with a capacity error before it is handed on.

use std::num::NonZeroUsize;

use futures::{StreamExt, future};
use log::trace;
use tokio::net::TcpStream;
use tokio_tungstenite::{
    accept_async_with_config,
    tungstenite::{Message, protocol::WebSocketConfig},
};

use super::{ChunkStream, TransportError};

/// Server configuration limiting messages to `max_message_size` bytes.
#[must_use]
pub fn config(max_message_size: NonZeroUsize) -> WebSocketConfig {
    let mut config = WebSocketConfig::default();
    config.max_message_size = Some(max_message_size.get());
    config.max_frame_size = Some(max_message_size.get());
    config
}

/// Run the server handshake and return the binary message stream.
///
/// # Errors
///
/// Returns [`TransportError::WebSocket`] if the handshake fails.
pub async fn accept(
    stream: TcpStream,
    max_message_size: NonZeroUsize,
) -> Result<ChunkStream, TransportError> {
    let ws = accept_async_with_config(stream, Some(config(max_message_size))).await?;
    Ok(ws
        .filter_map(|message| {
            future::ready(match message {
                Ok(Message::Binary(chunk)) => Some(Ok(chunk)),
                Ok(Message::Text(text)) => {
                    trace!("ignoring text message: len={}", text.len());
                    None
                }
                Ok(_) => None,
                Err(err) => Some(Err(TransportError::from(err))),
            })
        })
        .boxed())
}
