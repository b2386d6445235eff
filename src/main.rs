//! Storage gateway - Entry Point
//!
//! Reads newline-delimited JSON output events from stdin, applies each one
//! through the gateway and answers `{line}\t{true|false}` on stdout.

use log::{error, info, warn};
use std::process;
use std::sync::Arc;
use tokio::io::{self, AsyncBufReadExt, AsyncWriteExt, BufReader, Stdout};
use tokio::sync::Mutex;
use tokio::task::{JoinError, JoinSet};

use storage_gateway::StorageGateway;
use storage_gateway::config::GatewayConfig;
use storage_gateway::event::parse_event;
use storage_gateway::lock;
use storage_gateway::utils::logging::setup_logging;

fn main() {
    setup_logging();

    let config = match GatewayConfig::load() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    };

    let backend = lock::install_backend(config.lock_backend);
    info!("Using {} file locks", backend.name());

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .max_blocking_threads(config.max_blocking_threads)
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to start runtime: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = runtime.block_on(run(config)) {
        error!("Event stream failed: {}", e);
        process::exit(1);
    }
}

async fn run(config: GatewayConfig) -> io::Result<()> {
    let gateway = Arc::new(StorageGateway::from_config(&config));
    info!(
        "Storage gateway writing to {} (lock timeout {:?})",
        gateway.path().display(),
        gateway.lock_timeout()
    );
    if !gateway.path_exists() {
        warn!(
            "Base path {} does not exist; events will be refused until it does",
            gateway.path().display()
        );
    }

    let stdout = Arc::new(Mutex::new(io::stdout()));
    let mut lines = BufReader::new(io::stdin()).lines();
    let mut in_flight = JoinSet::new();
    let mut line_no: usize = 0;

    while let Some(line) = lines.next_line().await? {
        reap(&mut in_flight)?;

        line_no += 1;
        if line.trim().is_empty() {
            continue;
        }

        let event = match parse_event(&line) {
            Ok(event) => event,
            Err(e) => {
                warn!("Ignoring malformed event on line {}: {}", line_no, e);
                answer(&stdout, line_no, false).await?;
                continue;
            }
        };

        let gateway = Arc::clone(&gateway);
        let stdout = Arc::clone(&stdout);
        in_flight.spawn(async move {
            let applied = gateway.output(event).await;
            answer(&stdout, line_no, applied).await
        });
    }

    while let Some(joined) = in_flight.join_next().await {
        settle(joined)?;
    }

    info!("Input closed after {} lines", line_no);
    Ok(())
}

/// Drop every task that has already answered, so finished results do not pile up.
fn reap(in_flight: &mut JoinSet<io::Result<()>>) -> io::Result<()> {
    while let Some(joined) = in_flight.try_join_next() {
        settle(joined)?;
    }
    Ok(())
}

/// Collect a finished event task, surfacing stdout failures and panics.
fn settle(joined: Result<io::Result<()>, JoinError>) -> io::Result<()> {
    match joined {
        Ok(result) => result,
        Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
        Err(e) => {
            warn!("Event task cancelled: {}", e);
            Ok(())
        }
    }
}

async fn answer(stdout: &Mutex<Stdout>, line_no: usize, applied: bool) -> io::Result<()> {
    let mut out = stdout.lock().await;
    out.write_all(format!("{}\t{}\n", line_no, applied).as_bytes())
        .await?;
    out.flush().await
}
