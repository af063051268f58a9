//! Per-connection session binding a transport to a frame reassembler.
//!
//! A [`ConnectionSession`] is created when a connection opens and owns the
//! only [`FrameReassembler`] for that connection. Chunks are processed one at
//! a time and every frame they complete reaches the [`FrameSink`] before the
//! next chunk is looked at. An error or close moves the session to
//! [`SessionState::Closed`] for good: the partial frame is discarded, its
//! storage released, and any later chunk is ignored.

use std::{fmt, net::SocketAddr, sync::Arc};

use bytes::Bytes;
use futures::{Stream, StreamExt};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::{
    display::FrameSink,
    frame::{FrameReassembler, ReassemblyError},
    geometry::FrameGeometry,
    metrics::{self, DiscardReason},
    transport::TransportError,
};

/// Identifier assigned to a connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl From<u64> for ConnectionId {
    fn from(value: u64) -> Self { Self(value) }
}

impl ConnectionId {
    /// Create a new [`ConnectionId`] with the provided value.
    #[must_use]
    pub fn new(id: u64) -> Self { Self(id) }

    /// Return the inner `u64` representation.
    #[must_use]
    pub fn as_u64(&self) -> u64 { self.0 }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "#{}", self.0) }
}

/// Lifecycle of a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    /// Chunks are being reassembled.
    Open,
    /// Terminal; chunks are ignored.
    Closed,
}

/// Faults that end a session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The reassembler could not reserve storage.
    #[error(transparent)]
    Reassembly(#[from] ReassemblyError),
    /// The transport failed.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Running totals for one session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SessionStats {
    /// Chunks accepted while open.
    pub chunks: u64,
    /// Payload bytes accepted while open.
    pub bytes: u64,
    /// Complete frames delivered to the sink.
    pub frames: u64,
    /// Bytes of the partial frame discarded at close.
    pub discarded: usize,
}

/// One connection's reassembly state.
pub struct ConnectionSession<S: FrameSink + ?Sized> {
    id: ConnectionId,
    peer: Option<SocketAddr>,
    geometry: FrameGeometry,
    reassembler: FrameReassembler,
    sink: Arc<S>,
    state: SessionState,
    stats: SessionStats,
}

impl<S: FrameSink + ?Sized> ConnectionSession<S> {
    /// Open a session for a newly accepted connection.
    pub fn open(
        id: ConnectionId,
        peer: Option<SocketAddr>,
        geometry: FrameGeometry,
        sink: Arc<S>,
    ) -> Self {
        metrics::inc_connections();
        info!(connection = %id, ?peer, "client connected");
        Self {
            id,
            peer,
            geometry,
            reassembler: FrameReassembler::new(geometry.frame_size()),
            sink,
            state: SessionState::Open,
            stats: SessionStats::default(),
        }
    }

    /// Connection identifier.
    #[must_use]
    pub const fn id(&self) -> ConnectionId { self.id }

    /// Remote address, if it could be determined.
    #[must_use]
    pub const fn peer(&self) -> Option<SocketAddr> { self.peer }

    /// Geometry of the frames on this connection.
    #[must_use]
    pub const fn geometry(&self) -> FrameGeometry { self.geometry }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> SessionState { self.state }

    /// Whether the session has reached its terminal state.
    #[must_use]
    pub fn is_closed(&self) -> bool { self.state == SessionState::Closed }

    /// Totals so far.
    #[must_use]
    pub const fn stats(&self) -> SessionStats { self.stats }

    /// Bytes waiting for the rest of their frame.
    #[must_use]
    pub fn buffered(&self) -> usize { self.reassembler.buffered() }

    /// Feed one transport chunk, forwarding completed frames to the sink.
    ///
    /// Returns the number of frames delivered. A closed session ignores the
    /// chunk and returns `Ok(0)`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Reassembly`] if frame storage could not be
    /// reserved. The session is closed before the error is returned.
    pub fn on_data(&mut self, chunk: &[u8]) -> Result<usize, SessionError> {
        if self.is_closed() {
            return Ok(0);
        }
        self.stats.chunks += 1;
        self.stats.bytes += chunk.len() as u64;
        metrics::add_bytes(chunk.len() as u64);

        let sink = &self.sink;
        let id = self.id;
        let mut delivered = 0_usize;
        let result = self.reassembler.push_with(chunk, |frame| {
            debug!(connection = %id, len = frame.len(), "complete frame");
            sink.deliver_frame(frame);
            delivered += 1;
        });
        self.stats.frames += delivered as u64;
        metrics::inc_frames(delivered as u64);

        match result {
            Ok(_) => Ok(delivered),
            Err(err) => {
                error!(connection = %id, peer = ?self.peer, error = %err, "reassembly failed");
                metrics::inc_errors();
                self.close();
                Err(err.into())
            }
        }
    }

    /// Handle a transport failure: log it, discard state and close.
    pub fn on_error(&mut self, cause: &TransportError) {
        if self.is_closed() {
            return;
        }
        warn!(connection = %self.id, peer = ?self.peer, error = %cause, "transport error");
        metrics::inc_errors();
        self.close();
    }

    /// Handle an orderly close. Idempotent.
    pub fn on_close(&mut self) { self.close(); }

    /// Drive the session from `chunks` until the stream ends or fails.
    ///
    /// The session is closed when this returns.
    ///
    /// # Errors
    ///
    /// Returns the [`SessionError`] that ended the session, if any.
    pub async fn run<St>(&mut self, mut chunks: St) -> Result<(), SessionError>
    where
        St: Stream<Item = Result<Bytes, TransportError>> + Unpin,
    {
        while !self.is_closed() {
            match chunks.next().await {
                Some(Ok(chunk)) => {
                    self.on_data(&chunk)?;
                }
                Some(Err(err)) => {
                    self.on_error(&err);
                    return Err(err.into());
                }
                None => break,
            }
        }
        self.on_close();
        Ok(())
    }

    fn close(&mut self) {
        if self.is_closed() {
            return;
        }
        self.state = SessionState::Closed;
        let discarded = self.reassembler.reset();
        self.stats.discarded = discarded;
        if discarded > 0 {
            metrics::inc_discarded(DiscardReason::Partial, 1);
        }
        metrics::dec_connections();
        info!(
            connection = %self.id,
            peer = ?self.peer,
            frames = self.stats.frames,
            bytes = self.stats.bytes,
            discarded,
            "client disconnected"
        );
    }
}

impl<S: FrameSink + ?Sized> Drop for ConnectionSession<S> {
    fn drop(&mut self) { self.close(); }
}

impl<S: FrameSink + ?Sized> fmt::Debug for ConnectionSession<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionSession")
            .field("id", &self.id)
            .field("peer", &self.peer)
            .field("geometry", &self.geometry)
            .field("state", &self.state)
            .field("buffered", &self.reassembler.buffered())
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::{
        io,
        num::NonZeroUsize,
        sync::{Arc, Mutex},
    };

    use futures::stream;
    use rstest::{fixture, rstest};
    use tracing_test::traced_test;

    use super::*;
    use crate::frame::Frame;

    type Delivered = Arc<Mutex<Vec<Vec<u8>>>>;

    struct RecordingSink(Delivered);

    impl FrameSink for RecordingSink {
        fn deliver_frame(&self, frame: Frame) {
            self.0
                .lock()
                .expect("sink lock")
                .push(frame.as_bytes().to_vec());
        }
    }

    #[fixture]
    fn delivered() -> Delivered { Arc::new(Mutex::new(Vec::new())) }

    fn session(delivered: &Delivered) -> ConnectionSession<RecordingSink> {
        let geometry = FrameGeometry::from_frame_size(NonZeroUsize::new(4).expect("non-zero"));
        ConnectionSession::open(
            ConnectionId::new(1),
            None,
            geometry,
            Arc::new(RecordingSink(Arc::clone(delivered))),
        )
    }

    fn chunks(
        items: Vec<Result<Vec<u8>, TransportError>>,
    ) -> impl Stream<Item = Result<Bytes, TransportError>> + Unpin {
        stream::iter(items.into_iter().map(|item| item.map(Bytes::from)))
    }

    #[rstest]
    fn forwards_frames_in_order(delivered: Delivered) {
        let mut session = session(&delivered);
        assert_eq!(session.on_data(&[1, 2]).expect("data"), 0);
        assert_eq!(session.on_data(&[3, 4, 5, 6, 7, 8, 9]).expect("data"), 2);

        assert_eq!(
            *delivered.lock().expect("lock"),
            vec![vec![1, 2, 3, 4], vec![5, 6, 7, 8]]
        );
        assert_eq!(session.buffered(), 1);
        assert_eq!(session.stats().frames, 2);
        assert_eq!(session.stats().bytes, 9);
    }

    #[rstest]
    fn close_discards_partial_frame_and_ignores_later_chunks(delivered: Delivered) {
        let mut session = session(&delivered);
        session.on_data(&[1, 2, 3]).expect("data");
        session.on_close();

        assert!(session.is_closed());
        assert_eq!(session.buffered(), 0);
        assert_eq!(session.stats().discarded, 3);
        assert_eq!(session.reassembler.reserved(), 0);

        assert_eq!(session.on_data(&[4, 5, 6, 7]).expect("ignored"), 0);
        session.on_close();
        assert!(delivered.lock().expect("lock").is_empty());
        assert_eq!(session.buffered(), 0);
    }

    #[rstest]
    #[traced_test]
    fn transport_error_resets_and_closes(delivered: Delivered) {
        let mut session = session(&delivered);
        session.on_data(&[9, 9]).expect("data");
        session.on_error(&TransportError::Io(io::Error::other("reset by peer")));

        assert_eq!(session.state(), SessionState::Closed);
        assert_eq!(session.buffered(), 0);
        assert!(logs_contain("transport error"));
        assert!(logs_contain("client disconnected"));
    }

    #[rstest]
    #[tokio::test]
    async fn run_drains_stream_then_closes(delivered: Delivered) {
        let mut session = session(&delivered);
        let input = chunks(vec![Ok(vec![1, 2, 3]), Ok(vec![4, 5]), Ok(Vec::new())]);

        session.run(input).await.expect("clean run");

        assert!(session.is_closed());
        assert_eq!(*delivered.lock().expect("lock"), vec![vec![1, 2, 3, 4]]);
        assert_eq!(session.stats().discarded, 1);
        assert_eq!(session.stats().chunks, 3);
    }

    #[rstest]
    #[tokio::test]
    async fn run_stops_at_transport_error(delivered: Delivered) {
        let mut session = session(&delivered);
        let input = chunks(vec![
            Ok(vec![1, 2, 3, 4, 5]),
            Err(TransportError::OversizedMessage { size: 5, max: 4 }),
            Ok(vec![6, 7, 8]),
        ]);

        let err = session.run(input).await.expect_err("transport failure");

        assert!(matches!(
            err,
            SessionError::Transport(TransportError::OversizedMessage { .. })
        ));
        assert_eq!(*delivered.lock().expect("lock"), vec![vec![1, 2, 3, 4]]);
        assert_eq!(session.stats().bytes, 5);
        assert_eq!(session.buffered(), 0);
    }

    #[rstest]
    fn reassembly_fault_closes_session(delivered: Delivered) {
        let geometry = FrameGeometry::from_frame_size(NonZeroUsize::MAX);
        let mut session = ConnectionSession::open(
            ConnectionId::new(2),
            None,
            geometry,
            Arc::new(RecordingSink(Arc::clone(&delivered))),
        );

        let err = session.on_data(&[1]).expect_err("reservation fails");
        assert!(matches!(err, SessionError::Reassembly(_)));
        assert!(session.is_closed());
    }

    #[test]
    fn closures_act_as_sinks() {
        let count = Arc::new(Mutex::new(0_usize));
        let seen = Arc::clone(&count);
        let sink = Arc::new(move |frame: Frame| {
            *seen.lock().expect("lock") += frame.len();
        });
        let geometry = FrameGeometry::from_frame_size(NonZeroUsize::new(2).expect("non-zero"));
        let mut session = ConnectionSession::open(ConnectionId::new(3), None, geometry, sink);

        session.on_data(&[1, 2, 3, 4]).expect("data");
        assert_eq!(*count.lock().expect("lock"), 4);
    }
}
