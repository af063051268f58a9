//! Runtime control for [`FrameServer`].

mod accept;
mod backoff;

use std::sync::Arc;

#[cfg(test)]
pub(super) use accept::MockAcceptListener;
pub(super) use accept::{AcceptLoopOptions, accept_loop};
pub use backoff::BackoffConfig;
use futures::Future;
use log::warn;
use tokio::{select, signal};
use tokio_util::{sync::CancellationToken, task::TaskTracker};

use super::{Bound, ConnectionContext, FrameServer, ServerError};
use crate::display::FrameSink;

impl<K: FrameSink> FrameServer<K, Bound> {
    /// Run the server until a shutdown signal is received.
    ///
    /// Spawns the configured number of worker tasks and awaits Ctrl+C for shutdown.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use framerelay::{frame::Frame, geometry::FrameGeometry, server::FrameServer};
    ///
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let geometry = FrameGeometry::new(710, 1080, 4)?;
    /// let server = FrameServer::new(geometry, |frame: Frame| println!("{} bytes", frame.len()))
    ///     .bind(([127, 0, 0, 1], 8081).into())?;
    /// server.run().await?;
    /// # Ok(())
    /// # }
    /// ```
    ///
    /// Attempting to run a server without binding fails to compile:
    ///
    /// ```compile_fail
    /// use framerelay::{frame::Frame, geometry::FrameGeometry, server::FrameServer};
    ///
    /// async fn try_run(geometry: FrameGeometry) {
    ///     FrameServer::new(geometry, |_frame: Frame| {})
    ///         .run()
    ///         .await
    ///         .expect("unbound servers do not expose run()");
    /// }
    /// ```
    ///
    /// # Errors
    ///
    /// Accept failures are retried with exponential back-off and do not
    /// surface as errors. Connection faults end only their own session.
    pub async fn run(self) -> Result<(), ServerError> {
        self.run_with_shutdown(async {
            let _ = signal::ctrl_c().await;
        })
        .await
    }

    /// Run the server until the `shutdown` future resolves.
    ///
    /// On shutdown every worker stops accepting and every open session is
    /// closed, discarding any partial frame it still holds.
    ///
    /// # Examples
    ///
    /// ```
    /// use framerelay::{frame::Frame, geometry::FrameGeometry, server::FrameServer};
    /// use tokio::sync::oneshot;
    ///
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let geometry = FrameGeometry::new(4, 4, 4)?;
    /// let server = FrameServer::new(geometry, |_frame: Frame| {})
    ///     .bind(([127, 0, 0, 1], 0).into())?;
    ///
    /// let (tx, rx) = oneshot::channel::<()>();
    /// let handle = tokio::spawn(async move {
    ///     server
    ///         .run_with_shutdown(async {
    ///             let _ = rx.await;
    ///         })
    ///         .await
    /// });
    ///
    /// let _ = tx.send(());
    /// handle
    ///     .await
    ///     .expect("join server task")
    ///     .expect("server run failed");
    /// # Ok(())
    /// # }
    /// ```
    ///
    /// # Errors
    ///
    /// Accept failures are retried with exponential back-off and do not
    /// surface as errors.
    #[expect(
        clippy::integer_division_remainder_used,
        reason = "tokio::select! expands to modulus internally"
    )]
    pub async fn run_with_shutdown<F>(self, shutdown: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()> + Send,
    {
        let FrameServer {
            geometry,
            sink,
            transport,
            workers,
            backoff_config,
            ready_tx,
            state: Bound { listener },
        } = self;
        let shutdown_token = CancellationToken::new();
        let tracker = TaskTracker::new();
        let context = ConnectionContext::new(geometry, sink, transport);

        log::info!(
            "relay listening: addr={:?}, transport={transport}, geometry={geometry}, workers={workers}",
            listener.local_addr().ok()
        );

        for _ in 0..workers {
            tracker.spawn(accept_loop(
                Arc::clone(&listener),
                context.clone(),
                AcceptLoopOptions {
                    shutdown: shutdown_token.clone(),
                    tracker: tracker.clone(),
                    backoff: backoff_config,
                },
            ));
        }

        // Signal readiness after all workers have been spawned.
        if let Some(tx) = ready_tx
            && tx.send(()).is_err()
        {
            warn!("Failed to send readiness signal: receiver dropped");
        }

        select! {
            () = shutdown => shutdown_token.cancel(),
            () = tracker.wait() => {},
        }

        tracker.close();
        tracker.wait().await;
        log::info!("relay stopped");
        Ok(())
    }
}
