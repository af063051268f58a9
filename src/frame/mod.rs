//! Fixed-size video frames and the stream reassembler that produces them.

use std::{fmt, ops::Deref};

use bytes::Bytes;

pub mod reassembler;

pub use reassembler::{FrameReassembler, PushError, ReassemblyError};

/// One complete frame of exactly `frame_size` bytes.
///
/// The payload is a frozen [`Bytes`] view, so clones share the allocation and
/// nothing can mutate the pixels after the reassembler hands them off.
#[derive(Clone, PartialEq, Eq)]
pub struct Frame {
    payload: Bytes,
}

impl Frame {
    pub(crate) fn new(payload: Bytes) -> Self { Self { payload } }

    /// Number of bytes in the frame.
    #[must_use]
    pub fn len(&self) -> usize { self.payload.len() }

    /// Whether the frame carries no bytes. Reassembled frames never do.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.payload.is_empty() }

    /// Borrow the frame bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] { &self.payload }

    /// Consume the frame, returning the shared payload buffer.
    #[must_use]
    pub fn into_bytes(self) -> Bytes { self.payload }
}

impl Deref for Frame {
    type Target = [u8];

    fn deref(&self) -> &Self::Target { &self.payload }
}

impl AsRef<[u8]> for Frame {
    fn as_ref(&self) -> &[u8] { &self.payload }
}

impl From<Frame> for Bytes {
    fn from(frame: Frame) -> Self { frame.payload }
}

impl fmt::Debug for Frame {
    // Frames run to megabytes; print the size rather than the pixels.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame").field("len", &self.len()).finish()
    }
}
