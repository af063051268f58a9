#![doc(html_root_url = "https://docs.rs/framerelay/latest")]
//! Public API for the `framerelay` library.
//!
//! This crate receives a continuous raw video stream over the network,
//! slices it into fixed-size frames, and hands each complete frame to a
//! display sink. Chunk boundaries on the wire carry no meaning; each
//! connection reassembles frames independently from whatever chunks arrive.

pub mod client;
pub mod config;
pub mod display;
pub mod error;
pub mod frame;
pub mod geometry;
pub mod metrics;
pub mod panic;
pub mod server;
pub mod session;
pub mod transport;

pub use client::{ClientError, FrameClient};
pub use config::RelayConfig;
pub use display::{FrameReceiver, FrameSender, FrameSink, frame_channel};
pub use error::{Error, Result};
pub use frame::{Frame, FrameReassembler, PushError, ReassemblyError};
pub use geometry::{FrameGeometry, GeometryError, PixelFormat, frame_size};
pub use metrics::{CONNECTIONS_ACTIVE, ERRORS_TOTAL, FRAMES_TOTAL};
pub use server::{BackoffConfig, FrameServer, ServerError};
pub use session::{ConnectionId, ConnectionSession, SessionError, SessionState, SessionStats};
pub use transport::{TransportError, TransportKind};
