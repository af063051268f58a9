//! Metric helpers for `framerelay`.
//!
//! This module defines metric names and simple helper functions
//! wrapping the [`metrics`](https://docs.rs/metrics) crate. With the
//! `metrics` feature disabled every helper compiles to a no-op.

#[cfg(feature = "metrics")]
use metrics::{counter, gauge};

/// Name of the gauge tracking active connections.
pub const CONNECTIONS_ACTIVE: &str = "framerelay_connections_active";
/// Name of the counter tracking reassembled frames.
pub const FRAMES_TOTAL: &str = "framerelay_frames_total";
/// Name of the counter tracking payload bytes received from clients.
pub const BYTES_RECEIVED: &str = "framerelay_bytes_received_total";
/// Name of the counter tracking frames or partial frames thrown away.
pub const FRAMES_DISCARDED: &str = "framerelay_frames_discarded_total";
/// Name of the counter tracking error occurrences.
pub const ERRORS_TOTAL: &str = "framerelay_errors_total";
/// Name of the counter tracking panicking connection tasks.
pub const CONNECTION_PANICS: &str = "framerelay_connection_panics_total";

/// Why frame data was thrown away.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DiscardReason {
    /// A partial frame was pending when its connection ended.
    Partial,
    /// The display queue overflowed and dropped its oldest frame.
    Overflow,
}

impl DiscardReason {
    #[cfg(feature = "metrics")]
    fn as_str(self) -> &'static str {
        match self {
            DiscardReason::Partial => "partial",
            DiscardReason::Overflow => "overflow",
        }
    }
}

/// Increment the active connections gauge.
pub fn inc_connections() {
    #[cfg(feature = "metrics")]
    gauge!(CONNECTIONS_ACTIVE).increment(1.0);
}

/// Decrement the active connections gauge.
pub fn dec_connections() {
    #[cfg(feature = "metrics")]
    gauge!(CONNECTIONS_ACTIVE).decrement(1.0);
}

/// Record reassembled frames.
pub fn inc_frames(count: u64) {
    #[cfg(feature = "metrics")]
    counter!(FRAMES_TOTAL).increment(count);
    #[cfg(not(feature = "metrics"))]
    let _ = count;
}

/// Record payload bytes received.
pub fn add_bytes(count: u64) {
    #[cfg(feature = "metrics")]
    counter!(BYTES_RECEIVED).increment(count);
    #[cfg(not(feature = "metrics"))]
    let _ = count;
}

/// Record discarded frames.
pub fn inc_discarded(reason: DiscardReason, count: u64) {
    #[cfg(feature = "metrics")]
    counter!(FRAMES_DISCARDED, "reason" => reason.as_str()).increment(count);
    #[cfg(not(feature = "metrics"))]
    let _ = (reason, count);
}

/// Record an error occurrence.
pub fn inc_errors() {
    #[cfg(feature = "metrics")]
    counter!(ERRORS_TOTAL).increment(1);
}

/// Record a connection task that panicked.
pub fn inc_connection_panics() {
    #[cfg(feature = "metrics")]
    counter!(CONNECTION_PANICS).increment(1);
}
