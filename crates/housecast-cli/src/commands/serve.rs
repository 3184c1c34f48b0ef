//! Long-running display feed.
//!
//! Reads newline-delimited JSON control commands on stdin and writes one
//! runtime snapshot per line on stdout, on every tick and every command.
//! Closing stdin stops the server.

use std::time::Duration;

use housecast_core::{Config, ControlCommand, RuntimeSnapshot};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::broadcast::error::{RecvError, TryRecvError};

use super::{open_hub, CliResult};

async fn emit(out: &mut tokio::io::Stdout, snapshot: &RuntimeSnapshot) -> CliResult {
    let mut line = serde_json::to_vec(snapshot)?;
    line.push(b'\n');
    out.write_all(&line).await?;
    out.flush().await?;
    Ok(())
}

pub async fn run(interval_ms: Option<u64>) -> CliResult {
    let config = Config::load()?;
    let hub = open_hub(&config)?;
    let period = Duration::from_millis(
        interval_ms
            .unwrap_or(config.runtime.tick_interval_ms)
            .max(1),
    );

    let mut out = tokio::io::stdout();
    let mut rx = hub.subscribe();
    emit(&mut out, &hub.snapshot().await).await?;

    let ticker = hub.spawn_ticker(period);
    tracing::info!(period_ms = period.as_millis() as u64, "serving");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                match serde_json::from_str::<ControlCommand>(line) {
                    Ok(command) => {
                        hub.apply(command).await?;
                    }
                    Err(e) => tracing::warn!("ignoring malformed command: {e}"),
                }
            }
            snapshot = rx.recv() => match snapshot {
                Ok(snapshot) => emit(&mut out, &snapshot).await?,
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "output fell behind, dropped snapshots");
                }
                Err(RecvError::Closed) => break,
            },
        }
    }

    ticker.abort();

    // Flush whatever the last commands published.
    loop {
        match rx.try_recv() {
            Ok(snapshot) => emit(&mut out, &snapshot).await?,
            Err(TryRecvError::Lagged(_)) => continue,
            Err(TryRecvError::Empty | TryRecvError::Closed) => break,
        }
    }
    tracing::info!("stdin closed, stopping");
    Ok(())
}
