//! `framerelay` binary.
//!
//! `serve` accepts senders and drains the display queue with a presenter task
//! that reports the frame rate. `send` streams a raw file to a relay.

mod cli;

use bytes::Bytes;
use clap::Parser;
use cli::{Cli, Command, GeometryArgs, SendArgs, ServeArgs, TransportArg};
use framerelay::{
    FrameClient,
    FrameGeometry,
    GeometryError,
    RelayConfig,
    TransportKind,
    display,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> framerelay::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match Cli::parse().command {
        Command::Serve(args) => serve(args).await,
        Command::Send(args) => send(args).await,
    }
}

fn geometry(args: &GeometryArgs) -> Result<FrameGeometry, GeometryError> {
    FrameGeometry::new(args.width, args.height, args.bytes_per_pixel)
}

const fn transport(arg: TransportArg) -> TransportKind {
    match arg {
        TransportArg::Websocket => TransportKind::WebSocket,
        TransportArg::LengthDelimited => TransportKind::LengthDelimited,
    }
}

async fn serve(args: ServeArgs) -> framerelay::Result<()> {
    let config = RelayConfig {
        geometry: geometry(&args.geometry)?,
        listen: args.listen,
        transport: transport(args.transport),
        workers: args.workers,
        display_queue: args.queue,
    };
    if let Some(addr) = args.metrics_addr {
        install_metrics_exporter(addr);
    }
    info!(
        geometry = %config.geometry,
        listen = %config.listen,
        transport = %config.transport,
        "starting frame relay"
    );

    let (sender, receiver) = config.display_channel();
    let presenter = tokio::spawn(display::monitor(receiver));
    config.server(sender).bind(config.listen)?.run().await?;

    match presenter.await {
        Ok(frames) => info!(frames, "frame relay stopped"),
        Err(e) => warn!(error = %e, "presenter task failed"),
    }
    Ok(())
}

async fn send(args: SendArgs) -> framerelay::Result<()> {
    let geometry = geometry(&args.geometry)?;
    let data = tokio::fs::read(&args.file).await?;
    let frame_size = geometry.frame_size();
    let chunk_size = args.chunk_size.unwrap_or(frame_size);
    let len = data.len();

    let mut client = FrameClient::connect(args.addr, transport(args.transport), geometry).await?;
    let messages = client.send_stream(Bytes::from(data), chunk_size).await?;
    client.close().await?;

    info!(
        file = %args.file.display(),
        messages,
        frames = len / frame_size.get(),
        remainder = len % frame_size.get(),
        "stream sent"
    );
    Ok(())
}

#[cfg(feature = "metrics")]
fn install_metrics_exporter(addr: std::net::SocketAddr) {
    match metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
    {
        Ok(()) => info!(%addr, "prometheus exporter listening"),
        Err(e) => warn!(error = %e, "failed to install prometheus exporter"),
    }
}

#[cfg(not(feature = "metrics"))]
fn install_metrics_exporter(addr: std::net::SocketAddr) {
    warn!(%addr, "built without the metrics feature; exporter disabled");
}
