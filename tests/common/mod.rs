//! Shared utilities for integration tests.
//!
//! Starts a relay on a free local port whose frames land in a display queue
//! the test can read from, and stops it again on request.

// Items in this shared module may not be used by all test binaries that import it.
#![allow(
    dead_code,
    reason = "shared test utilities are not used by all test binaries"
)]

use std::{
    net::{Ipv4Addr, SocketAddr, TcpListener as StdTcpListener},
    num::NonZeroUsize,
    time::Duration,
};

use framerelay::{
    Frame,
    FrameGeometry,
    FrameReceiver,
    FrameServer,
    ServerError,
    TransportKind,
    frame_channel,
};
use rstest::fixture;
use tokio::{sync::oneshot, task::JoinHandle, time::timeout};

/// How long a test waits for something that should happen.
pub const PATIENCE: Duration = Duration::from_secs(5);
/// How long a test waits to be confident something did not happen.
pub const QUIET: Duration = Duration::from_millis(200);

/// Create a TCP listener bound to a free local port.
#[expect(
    clippy::expect_used,
    reason = "binding to an ephemeral localhost port must abort the test immediately"
)]
pub fn unused_listener() -> StdTcpListener {
    let addr = SocketAddr::new(Ipv4Addr::LOCALHOST.into(), 0);
    StdTcpListener::bind(addr).expect("failed to bind port")
}

/// 4x2 RGBA: 32 bytes per frame.
#[fixture]
pub fn geometry() -> FrameGeometry { FrameGeometry::new(4, 2, 4).expect("valid geometry") }

/// A relay running in the background.
pub struct Relay {
    pub addr: SocketAddr,
    pub frames: FrameReceiver,
    shutdown: Option<oneshot::Sender<()>>,
    handle: JoinHandle<Result<(), ServerError>>,
}

impl Relay {
    /// Start a relay for `geometry` speaking `transport`.
    pub async fn start(geometry: FrameGeometry, transport: TransportKind) -> Self {
        let (sender, frames) = frame_channel(NonZeroUsize::new(64).expect("non-zero"));
        let (ready_tx, ready_rx) = oneshot::channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let server = FrameServer::new(geometry, sender)
            .workers(2)
            .transport(transport)
            .ready_signal(ready_tx)
            .bind_existing_listener(unused_listener())
            .expect("bind relay");
        let addr = server.local_addr().expect("relay address");
        let handle = tokio::spawn(server.run_with_shutdown(async move {
            let _ = shutdown_rx.await;
        }));
        ready_rx.await.expect("relay ready");
        Self {
            addr,
            frames,
            shutdown: Some(shutdown_tx),
            handle,
        }
    }

    /// Wait for the next frame.
    pub async fn next_frame(&mut self) -> Frame {
        timeout(PATIENCE, self.frames.recv())
            .await
            .expect("frame arrived in time")
            .expect("relay still running")
    }

    /// Assert that no frame arrives for a little while.
    pub async fn assert_quiet(&mut self) {
        if let Ok(Some(frame)) = timeout(QUIET, self.frames.recv()).await {
            panic!("unexpected frame: {frame:?}");
        }
    }

    /// Shut the relay down and wait for it to finish.
    pub async fn stop(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        timeout(PATIENCE, self.handle)
            .await
            .expect("relay stopped in time")
            .expect("relay task join")
            .expect("relay run");
    }
}

/// Deterministic test payload of `len` bytes.
pub fn pattern(len: usize, seed: u8) -> Vec<u8> {
    (0..len)
        .map(|i| seed.wrapping_add(u8::try_from(i % 256).expect("fits in u8")))
        .collect()
}
