//! Bounded frame queue that drops the oldest frame when full.
//!
//! A slow presenter must never stall reassembly, and a stale video frame is
//! worth nothing, so the queue keeps the newest `capacity` frames and the
//! receiver skips whatever it fell behind on. Ordering of the retained frames
//! is preserved. Built on [`tokio::sync::broadcast`], whose lagging receivers
//! have exactly these semantics.

use std::num::NonZeroUsize;

use log::{trace, warn};
use tokio::sync::broadcast::{
    self,
    error::{RecvError, TryRecvError},
};

use super::FrameSink;
use crate::{
    frame::Frame,
    metrics::{self, DiscardReason},
};

/// Create a display queue holding at most `capacity` undelivered frames.
///
/// `tokio` rounds the capacity up to the next power of two.
#[must_use]
pub fn frame_channel(capacity: NonZeroUsize) -> (FrameSender, FrameReceiver) {
    let (tx, rx) = broadcast::channel(capacity.get());
    (FrameSender { tx }, FrameReceiver { rx, dropped: 0 })
}

/// Producer half of a display queue; a [`FrameSink`] shared by sessions.
#[derive(Clone, Debug)]
pub struct FrameSender {
    tx: broadcast::Sender<Frame>,
}

impl FrameSender {
    /// Attach another presenter. It only sees frames sent after this call.
    #[must_use]
    pub fn subscribe(&self) -> FrameReceiver {
        FrameReceiver {
            rx: self.tx.subscribe(),
            dropped: 0,
        }
    }

    /// Number of presenters currently attached.
    #[must_use]
    pub fn receiver_count(&self) -> usize { self.tx.receiver_count() }
}

impl FrameSink for FrameSender {
    fn deliver_frame(&self, frame: Frame) {
        if self.tx.send(frame).is_err() {
            trace!("no presenter attached; frame dropped");
        }
    }
}

/// Consumer half of a display queue.
#[derive(Debug)]
pub struct FrameReceiver {
    rx: broadcast::Receiver<Frame>,
    dropped: u64,
}

impl FrameReceiver {
    /// Wait for the next frame.
    ///
    /// Frames overwritten while this receiver lagged are skipped and counted.
    /// Returns `None` once every sender is gone and the queue is drained.
    pub async fn recv(&mut self) -> Option<Frame> {
        loop {
            match self.rx.recv().await {
                Ok(frame) => return Some(frame),
                Err(RecvError::Lagged(skipped)) => self.record_lag(skipped),
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Take the next queued frame without waiting.
    pub fn try_recv(&mut self) -> Option<Frame> {
        loop {
            match self.rx.try_recv() {
                Ok(frame) => return Some(frame),
                Err(TryRecvError::Lagged(skipped)) => self.record_lag(skipped),
                Err(TryRecvError::Empty | TryRecvError::Closed) => return None,
            }
        }
    }

    /// Total frames skipped because the queue overflowed.
    #[must_use]
    pub const fn dropped(&self) -> u64 { self.dropped }

    fn record_lag(&mut self, skipped: u64) {
        self.dropped += skipped;
        metrics::inc_discarded(DiscardReason::Overflow, skipped);
        warn!("display queue overflowed: skipped={skipped}, total_dropped={}", self.dropped);
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use rstest::rstest;

    use super::*;

    fn frame(tag: u8) -> Frame { Frame::new(Bytes::from(vec![tag; 4])) }

    fn cap(n: usize) -> NonZeroUsize { NonZeroUsize::new(n).expect("non-zero capacity") }

    #[tokio::test]
    async fn delivers_frames_in_order() {
        let (tx, mut rx) = frame_channel(cap(4));
        for tag in 1..=3 {
            tx.deliver_frame(frame(tag));
        }
        for tag in 1..=3 {
            assert_eq!(rx.recv().await, Some(frame(tag)));
        }
        assert_eq!(rx.dropped(), 0);
    }

    #[tokio::test]
    async fn overflow_drops_oldest_frames() {
        let (tx, mut rx) = frame_channel(cap(2));
        for tag in 1..=5 {
            tx.deliver_frame(frame(tag));
        }

        assert_eq!(rx.recv().await, Some(frame(4)));
        assert_eq!(rx.recv().await, Some(frame(5)));
        assert_eq!(rx.dropped(), 3);
    }

    #[rstest]
    fn try_recv_skips_lag_and_reports_empty() {
        let (tx, mut rx) = frame_channel(cap(1));
        tx.deliver_frame(frame(1));
        tx.deliver_frame(frame(2));

        assert_eq!(rx.try_recv(), Some(frame(2)));
        assert_eq!(rx.try_recv(), None);
        assert_eq!(rx.dropped(), 1);
    }

    #[tokio::test]
    async fn closes_after_senders_drop() {
        let (tx, mut rx) = frame_channel(cap(2));
        tx.deliver_frame(frame(7));
        drop(tx);

        assert_eq!(rx.recv().await, Some(frame(7)));
        assert_eq!(rx.recv().await, None);
    }

    #[test]
    fn sending_without_presenter_is_harmless() {
        let (tx, rx) = frame_channel(cap(2));
        drop(rx);
        assert_eq!(tx.receiver_count(), 0);
        tx.deliver_frame(frame(1));

        let mut late = tx.subscribe();
        assert_eq!(late.try_recv(), None);
    }
}
