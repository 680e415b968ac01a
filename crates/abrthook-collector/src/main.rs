//! abrthook-collectord - Local stand-in for the ABRT daemon
//!
//! Listens on a UNIX socket until SIGTERM or SIGINT, logging every crash
//! report it receives. With `--json` each report is also printed to stdout
//! as one JSON line.

use abrthook_collector::{Collector, ReceivedReport, DEFAULT_STATUS};
use abrthook_core::config::Config;
use anyhow::Result;
use clap::Parser;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "abrthook-collectord",
    version,
    about = "Collect crash reports on a UNIX socket"
)]
struct Args {
    /// Socket to listen on (defaults to the configured daemon socket)
    #[arg(long, value_name = "PATH")]
    socket: Option<String>,

    /// HTTP status answered for every decoded report
    #[arg(
        long,
        default_value_t = DEFAULT_STATUS,
        value_parser = clap::value_parser!(u16).range(100..=599)
    )]
    status: u16,

    /// Print each report to stdout as a JSON line
    #[arg(long)]
    json: bool,
}

impl Args {
    fn socket_path(&self, config: &Config) -> String {
        self.socket
            .clone()
            .unwrap_or_else(|| config.daemon.socket_path.clone())
    }
}

/// Waits for SIGTERM or SIGINT and triggers the cancellation token
async fn shutdown_signal(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C)");
        }
        _ = terminate => {
            info!("Received SIGTERM");
        }
    }

    token.cancel();
}

/// Print reports as they arrive
async fn print_reports(mut reports: mpsc::UnboundedReceiver<ReceivedReport>, json: bool) {
    while let Some(report) = reports.recv().await {
        if json {
            println!("{}", report.to_json());
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = Config::load_or_default(&Config::default_path());
    config.apply_env_overrides();

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    info!("abrthook collector starting (abrthook-collectord)");

    let shutdown_token = CancellationToken::new();
    let signal_token = shutdown_token.clone();
    tokio::spawn(async move {
        shutdown_signal(signal_token).await;
    });

    let collector = Collector::bind(args.socket_path(&config), args.status)?;

    let (tx, rx) = mpsc::unbounded_channel();
    let printer = tokio::spawn(print_reports(rx, args.json));

    let result = collector.run(shutdown_token, tx).await;
    // Connection tasks still holding a sender are dropped with the runtime.
    printer.abort();

    match &result {
        Ok(()) => info!("abrthook collector shut down gracefully"),
        Err(e) => error!(error = %e, "abrthook collector exiting with error"),
    }

    result
}
