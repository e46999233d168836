mod cli;
mod error;
mod printer;
mod signals;

use crate::{cli::Cli, printer::StdoutPrinter, signals::wait_for_signal};
use capture::{CaptureChannel, ProcessFilterSet, SystemProcessDirectory, channel};
use clap::Parser;
use flume::bounded;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_max_level(cli.verbosity.tracing_level_filter())
        .with_level(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    debug!(config = ?cli);

    let cancel = CancellationToken::new();
    let filter = ProcessFilterSet::new();

    let refresh = tokio::spawn({
        let filter = filter.clone();
        let cancel = cancel.clone();
        let names = cli.process_names.clone();
        async move {
            let mut directory = SystemProcessDirectory::new();
            filter.refresh_loop(&names, &mut directory, &cancel).await;
        }
    });

    // Fatal if the OS rejects the channel; nothing to capture without it.
    let transport = channel::open_system_transport()?;
    let mut channel = CaptureChannel::new(transport);
    let stats = channel.stats();

    info!(names = ?cli.process_names, "debug output listener running");

    let capture_loop = tokio::task::spawn_blocking({
        let filter = filter.clone();
        let cancel = cancel.clone();
        move || {
            let mut printer = StdoutPrinter::new();
            channel.receive_loop(&filter, &mut printer, &cancel)
        }
    });

    let (events_tx, events_rx) = bounded(8);

    let result: anyhow::Result<()> = tokio::select! {
        err = wait_for_signal(&events_tx) => {
            tracing::error!(error = ?err, "Error while waiting for signal");
            err.map_err(Into::into)
        }
        res = events_rx.recv_async() => {
            let event = res?;
            debug!(?event, "Received signal event");
            info!("interrupted; shutting down");
            Ok(())
        }
        res = capture_loop => {
            res?.map_err(Into::into)
        }
    };

    cancel.cancel();
    refresh.abort();
    stats.dump();

    // The capture thread only notices cancellation between messages; while
    // it is parked in the data-ready wait, joining it (which dropping the
    // runtime would do) blocks until the next debug message arrives. Leave
    // via process exit once the diagnostics are out.
    match result {
        Ok(()) => std::process::exit(0),
        Err(err) => {
            tracing::error!(error = ?err, "fatal error");
            std::process::exit(1);
        }
    }
}
