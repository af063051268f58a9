//! Test helpers shared across server modules.

use std::{
    net::{Ipv4Addr, SocketAddr, TcpListener as StdTcpListener},
    sync::{Arc, Mutex},
};

use rstest::fixture;

use super::{Bound, FrameServer};
use crate::{display::FrameSink, frame::Frame, geometry::FrameGeometry};

/// Sink recording every delivered frame.
#[derive(Clone, Debug, Default)]
pub struct TestSink(Arc<Mutex<Vec<Frame>>>);

impl TestSink {
    pub fn frames(&self) -> Vec<Frame> { self.0.lock().expect("sink lock poisoned").clone() }
}

impl FrameSink for TestSink {
    fn deliver_frame(&self, frame: Frame) { self.0.lock().expect("sink lock poisoned").push(frame); }
}

#[fixture]
pub fn sink() -> TestSink { TestSink::default() }

#[fixture]
/// Small RGBA geometry: 4x2 pixels, 32 bytes per frame.
pub fn geometry() -> FrameGeometry { FrameGeometry::new(4, 2, 4).expect("valid test geometry") }

#[fixture]
/// Returns a bound [`TcpListener`] on a free port for use in tests.
///
/// Keeping the listener bound prevents race conditions where another
/// process could claim the port between discovery and use.
pub fn free_listener() -> StdTcpListener {
    let addr = SocketAddr::new(Ipv4Addr::LOCALHOST.into(), 0);
    StdTcpListener::bind(addr).expect("Failed to bind free port listener")
}

pub fn bind_server(
    geometry: FrameGeometry,
    sink: TestSink,
    listener: StdTcpListener,
) -> FrameServer<TestSink, Bound> {
    FrameServer::new(geometry, sink)
        .bind_existing_listener(listener)
        .expect("Failed to bind")
}
