//! Display sink boundary.
//!
//! Sessions hand every completed [`Frame`] to a [`FrameSink`]. Rendering is
//! somebody else's job: a sink may paint synchronously, or forward into a
//! display queue built by [`frame_channel`] and drained by a presentation
//! task.

pub mod channel;
pub mod rate;

pub use channel::{FrameReceiver, FrameSender, frame_channel};
pub use rate::{FrameRate, FrameRateMeter, monitor};

use crate::frame::Frame;

/// Consumer of completed frames.
///
/// `deliver_frame` is called once per frame, in arrival order, from the
/// connection task that produced it. Implementations must not block for long:
/// the next chunk of that connection is not read until the call returns.
pub trait FrameSink: Send + Sync + 'static {
    /// Accept ownership of one complete frame.
    fn deliver_frame(&self, frame: Frame);
}

impl<F> FrameSink for F
where
    F: Fn(Frame) + Send + Sync + 'static,
{
    fn deliver_frame(&self, frame: Frame) { self(frame) }
}
