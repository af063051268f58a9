//! Per-connection task for [`FrameServer`](super::FrameServer).

use std::net::SocketAddr;

use futures::FutureExt;
use log::{debug, error, warn};
use tokio::{net::TcpStream, select};
use tokio_util::{sync::CancellationToken, task::TaskTracker};
use tracing::Instrument;

use super::ConnectionContext;
use crate::{
    display::FrameSink,
    metrics,
    session::{ConnectionId, ConnectionSession},
    transport::{self, socket},
};

/// Spawn a task to process a single TCP connection, logging and discarding any panics.
pub(super) fn spawn_connection_task<K: FrameSink>(
    stream: TcpStream,
    peer_addr: Option<SocketAddr>,
    context: ConnectionContext<K>,
    shutdown: CancellationToken,
    tracker: &TaskTracker,
) {
    let id = context.next_id();
    let span = tracing::info_span!("connection", id = %id, peer = ?peer_addr);
    tracker.spawn(
        async move {
            let fut = std::panic::AssertUnwindSafe(process_stream(
                stream, peer_addr, context, shutdown, id,
            ))
            .catch_unwind();

            if let Err(panic) = fut.await {
                metrics::inc_connection_panics();
                let panic_msg = crate::panic::format_panic(panic);
                // Emit via both `log` and `tracing` for tests that capture either.
                error!("connection task panicked: panic={panic_msg}, peer_addr={peer_addr:?}");
                tracing::error!(panic = %panic_msg, ?peer_addr, "connection task panicked");
            }
        }
        .instrument(span),
    );
}

#[expect(
    clippy::integer_division_remainder_used,
    reason = "tokio::select! expands to modulus internally"
)]
async fn process_stream<K: FrameSink>(
    stream: TcpStream,
    peer_addr: Option<SocketAddr>,
    context: ConnectionContext<K>,
    shutdown: CancellationToken,
    id: ConnectionId,
) {
    if let Err(e) = socket::tune(&stream) {
        warn!("failed to tune socket: error={e}, peer_addr={peer_addr:?}");
    }

    let opened = select! {
        biased;

        () = shutdown.cancelled() => return,
        res = transport::open(stream, context.transport, context.geometry.frame_size()) => res,
    };
    let chunks = match opened {
        Ok(chunks) => chunks,
        Err(e) => {
            metrics::inc_errors();
            warn!("transport handshake failed: error={e}, peer_addr={peer_addr:?}");
            return;
        }
    };

    let mut session = ConnectionSession::open(id, peer_addr, context.geometry, context.sink);
    let outcome = select! {
        biased;

        () = shutdown.cancelled() => None,
        res = session.run(chunks) => Some(res),
    };
    match outcome {
        None => {
            debug!("closing session on shutdown: connection={id}");
            session.on_close();
        }
        Some(Err(e)) => debug!("session ended with error: connection={id}, error={e}"),
        Some(Ok(())) => {}
    }
}
