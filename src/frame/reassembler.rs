//! Inbound helper that cuts a chunked byte stream into fixed-size frames.
//!
//! [`FrameReassembler`] consumes chunks of any size, in arrival order, and
//! yields every frame the chunk completes. Bytes that do not yet fill a frame
//! stay buffered until the next push. The buffer never holds more than one
//! frame: chunk bytes are copied straight into the pending frame, which is
//! frozen into a [`Bytes`] once full, so there is no front-removal shuffling
//! and a chunk carrying several frames is handled in bounded memory.

use std::{collections::TryReserveError, mem, num::NonZeroUsize};

use bytes::Bytes;
use thiserror::Error;

use super::Frame;

/// Faults raised while accumulating frame bytes.
///
/// Payload content can never cause an error; every byte is valid pixel data.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ReassemblyError {
    /// Storage for the pending frame could not be reserved.
    #[error("failed to reserve {requested} bytes for a pending frame")]
    ResourceExhausted {
        /// Capacity the reassembler attempted to reserve.
        requested: usize,
        /// Allocator failure reported by the standard library.
        #[source]
        source: TryReserveError,
    },
}

/// A [`FrameReassembler::push`] that stopped part way through its chunk.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("reassembly stopped after {consumed} chunk bytes")]
pub struct PushError {
    /// Frames completed before the fault, oldest first.
    pub frames: Vec<Frame>,
    /// Chunk bytes absorbed before the fault; the rest were not read.
    pub consumed: usize,
    /// Underlying fault.
    #[source]
    pub source: ReassemblyError,
}

/// Stateful accumulator emitting frames of a fixed size.
#[derive(Debug)]
pub struct FrameReassembler {
    frame_size: NonZeroUsize,
    pending: Vec<u8>,
    emitted: u64,
}

impl FrameReassembler {
    /// Create an empty reassembler. No storage is reserved until bytes arrive.
    #[must_use]
    pub const fn new(frame_size: NonZeroUsize) -> Self {
        Self {
            frame_size,
            pending: Vec::new(),
            emitted: 0,
        }
    }

    /// Size of each emitted frame.
    #[must_use]
    pub const fn frame_size(&self) -> NonZeroUsize { self.frame_size }

    /// Number of bytes received but not yet part of a complete frame.
    #[must_use]
    pub fn buffered(&self) -> usize { self.pending.len() }

    /// Borrow the bytes of the incomplete frame.
    #[must_use]
    pub fn pending(&self) -> &[u8] { &self.pending }

    /// Whether no partial frame is buffered.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.pending.is_empty() }

    /// Append `chunk` and return every frame it completes, oldest first.
    ///
    /// An empty chunk returns no frames and leaves the buffer untouched.
    ///
    /// ```
    /// use std::num::NonZeroUsize;
    ///
    /// use framerelay::frame::FrameReassembler;
    ///
    /// let mut reassembler = FrameReassembler::new(NonZeroUsize::new(4).expect("non-zero"));
    /// assert!(reassembler.push(&[1, 2]).expect("push").is_empty());
    /// let frames = reassembler.push(&[3, 4, 5]).expect("push");
    /// assert_eq!(frames.len(), 1);
    /// assert_eq!(frames[0].as_bytes(), &[1, 2, 3, 4]);
    /// assert_eq!(reassembler.pending(), &[5]);
    /// ```
    ///
    /// # Errors
    ///
    /// Returns a [`PushError`] if storage for a pending frame cannot be
    /// reserved. It carries the frames completed earlier in the same call
    /// and the number of chunk bytes absorbed, so nothing already cut is
    /// lost and the unread tail can be identified.
    pub fn push(&mut self, chunk: &[u8]) -> Result<Vec<Frame>, PushError> {
        let mut frames = Vec::with_capacity(chunk.len() / self.frame_size.get() + 1);
        match self.fill(chunk, |frame| frames.push(frame)) {
            Ok(_) => Ok(frames),
            Err((consumed, source)) => Err(PushError {
                frames,
                consumed,
                source,
            }),
        }
    }

    /// Append `chunk`, passing each completed frame to `emit` as soon as it
    /// is cut. Returns the number of frames emitted.
    ///
    /// # Errors
    ///
    /// Returns [`ReassemblyError::ResourceExhausted`] if storage for a pending
    /// frame cannot be reserved. Frames already passed to `emit` stay
    /// delivered.
    pub fn push_with<F>(&mut self, chunk: &[u8], emit: F) -> Result<usize, ReassemblyError>
    where
        F: FnMut(Frame),
    {
        self.fill(chunk, emit).map_err(|(_, source)| source)
    }

    /// Returns the frames emitted, or the bytes consumed before the fault.
    fn fill<F>(&mut self, chunk: &[u8], mut emit: F) -> Result<usize, (usize, ReassemblyError)>
    where
        F: FnMut(Frame),
    {
        let frame_size = self.frame_size.get();
        let mut rest = chunk;
        let mut emitted = 0;

        while !rest.is_empty() {
            if let Err(err) = self.reserve_pending() {
                return Err((chunk.len() - rest.len(), err));
            }
            let take = (frame_size - self.pending.len()).min(rest.len());
            let (head, tail) = rest.split_at(take);
            self.pending.extend_from_slice(head);
            rest = tail;

            if self.pending.len() == frame_size {
                let payload = Bytes::from(mem::take(&mut self.pending));
                emit(Frame::new(payload));
                emitted += 1;
                self.emitted += 1;
            }
        }

        Ok(emitted)
    }

    /// Frames cut since construction. [`reset`](Self::reset) leaves this alone.
    #[must_use]
    pub const fn frames_emitted(&self) -> u64 { self.emitted }

    /// Bytes of storage currently held for the pending frame.
    ///
    /// Zero for a fresh or reset reassembler and right after a frame is cut.
    #[must_use]
    pub fn reserved(&self) -> usize { self.pending.capacity() }

    /// Discard the partial frame and release its storage.
    ///
    /// Returns the number of bytes thrown away.
    pub fn reset(&mut self) -> usize {
        let discarded = self.pending.len();
        self.pending = Vec::new();
        discarded
    }

    fn reserve_pending(&mut self) -> Result<(), ReassemblyError> {
        let frame_size = self.frame_size.get();
        if self.pending.capacity() >= frame_size {
            return Ok(());
        }
        self.pending
            .try_reserve_exact(frame_size - self.pending.len())
            .map_err(|source| ReassemblyError::ResourceExhausted {
                requested: frame_size,
                source,
            })
    }
}
