//! lambda-net: API Gateway proxy events in, socket-style HTTP server behind.
//!
//! # Architecture Overview
//!
//! ```text
//!    proxy event (JSON line)                                  proxy response (JSON line)
//!  ──────────────────────────▶ harness ──▶ adapter ──────────────────────────────────▶
//!                                            │  ▲
//!                  ┌─────────────────────────┘  └────────────────────────┐
//!                  ▼                                                     │
//!        http::request (decode)                               http::response (encode)
//!                  │                                                     ▲
//!   loopback:  wire bytes ─▶ net::ListenerHandle ─▶ SyntheticListener ─▶ axum::serve ─┐
//!                  ▲                                                                  │
//!                  └──────────────── completion (captured bytes) ◀── close ◀─────────┘
//!   direct:    reqwest ─▶ 127.0.0.1:port ─▶ axum::serve (TCP)
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::io::BufReader;
use tokio::net::TcpListener;

use lambda_net::adapter::{DirectAdapter, LoopbackAdapter};
use lambda_net::config::{load_config, AdapterConfig, Mode};
use lambda_net::http::{echo_router, HttpServer};
use lambda_net::lifecycle::Shutdown;
use lambda_net::{harness, net, observability};

#[derive(Parser)]
#[command(name = "lambda-net")]
#[command(about = "Serve API Gateway proxy events with a local HTTP server", long_about = None)]
struct Cli {
    /// TOML configuration file; defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the configured mode (loopback or direct).
    #[arg(short, long)]
    mode: Option<Mode>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let result = runtime.block_on(run(cli));

    // A stdin read parked on the blocking pool only returns at end of input.
    runtime.shutdown_background();
    result
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => AdapterConfig::default(),
    };
    if let Some(mode) = cli.mode {
        config.mode = mode;
    }

    observability::logging::init(&config.observability);

    tracing::info!(
        mode = ?config.mode,
        binary_media_types = ?config.binary_media_types,
        "lambda-net v{} starting",
        env!("CARGO_PKG_VERSION")
    );

    let shutdown = Shutdown::new();
    shutdown.trigger_on_ctrl_c();

    let binary = config.binary_media_types();
    let server = HttpServer::new(echo_router());
    let input = BufReader::new(tokio::io::stdin());
    let output = tokio::io::stdout();

    let server_task = match config.mode {
        Mode::Loopback => {
            let (listener, handle) = net::bind();
            let task = tokio::spawn(server.run_synthetic(listener, shutdown.wait()));

            let adapter = LoopbackAdapter::new(handle, binary);
            harness::run(input, output, &adapter, shutdown.wait()).await?;
            task
        }
        Mode::Direct => {
            let target = config.direct.target()?;
            let listener = TcpListener::bind(target).await?;
            let local_addr = listener.local_addr()?;
            let task = tokio::spawn(server.run_tcp(listener, shutdown.wait()));

            let adapter = DirectAdapter::new(local_addr, binary, config.direct.request_timeout())?;
            harness::run(input, output, &adapter, shutdown.wait()).await?;
            task
        }
    };

    shutdown.trigger();
    server_task.await??;

    tracing::info!("Shutdown complete");
    Ok(())
}
