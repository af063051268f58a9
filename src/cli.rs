//! Command line interface for the `framerelay` binary.
//!
//! This file is also compiled by `build.rs` to render the man page, so it
//! only depends on `clap` and `std`.

use std::{net::SocketAddr, num::NonZeroUsize, path::PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Command line arguments for the `framerelay` binary.
#[derive(Debug, Parser)]
#[command(
    name = "framerelay",
    version,
    about = "Reassemble raw video frames streamed over the network"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Accept senders and present the frames they stream.
    Serve(ServeArgs),
    /// Stream a raw file to a running relay.
    Send(SendArgs),
}

/// Frame layout shared by both ends of a connection.
#[derive(Debug, Args)]
pub struct GeometryArgs {
    /// Frame width in pixels.
    #[arg(long, default_value_t = 710)]
    pub width: usize,
    /// Frame height in pixels.
    #[arg(long, default_value_t = 1080)]
    pub height: usize,
    /// Bytes per pixel (4 for RGBA).
    #[arg(long, default_value_t = 4)]
    pub bytes_per_pixel: usize,
}

/// Wire format selector.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum TransportArg {
    /// Binary WebSocket messages.
    #[default]
    Websocket,
    /// 4-byte big-endian length-prefixed messages over TCP.
    LengthDelimited,
}

#[derive(Debug, Args)]
pub struct ServeArgs {
    #[command(flatten)]
    pub geometry: GeometryArgs,
    /// Address to listen on.
    #[arg(short, long, default_value = "127.0.0.1:8081")]
    pub listen: SocketAddr,
    /// Wire format accepted from senders.
    #[arg(short, long, value_enum, default_value_t)]
    pub transport: TransportArg,
    /// Accept workers; defaults to the number of cores.
    #[arg(short, long)]
    pub workers: Option<NonZeroUsize>,
    /// Frames held for the presenter before the oldest is dropped.
    #[arg(long, default_value = "4")]
    pub queue: NonZeroUsize,
    /// Expose Prometheus metrics on this address.
    #[arg(long)]
    pub metrics_addr: Option<SocketAddr>,
}

#[derive(Debug, Args)]
pub struct SendArgs {
    #[command(flatten)]
    pub geometry: GeometryArgs,
    /// Relay address.
    #[arg(short, long, default_value = "127.0.0.1:8081")]
    pub addr: SocketAddr,
    /// Wire format used to reach the relay.
    #[arg(short, long, value_enum, default_value_t)]
    pub transport: TransportArg,
    /// Bytes per message; defaults to one frame.
    #[arg(long)]
    pub chunk_size: Option<NonZeroUsize>,
    /// Raw frame data to send.
    pub file: PathBuf,
}
