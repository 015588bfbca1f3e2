use std::fmt::Display;
use std::time::Duration;

use axum::extract::ws::Message;
use futures_util::{Sink, SinkExt};
use tokio::time::Instant;

use crate::error::StreamError;
use crate::loader::{tick_point, TickColumns, TickSource, TickTable};

pub const DEFAULT_PACING: Duration = Duration::from_millis(100);

/// Push every row of `table` as `{"x": ms, "y": bid}`, one text message per
/// row, sleeping `pacing` after each send. Returns the number of messages sent.
///
/// The stream does not skip bad rows: the first unparseable row ends it, after
/// everything before it has already gone out.
pub async fn deliver_ticks<S>(
    sink: &mut S,
    table: &TickTable,
    columns: &TickColumns,
    pacing: Duration,
) -> Result<usize, StreamError>
where
    S: Sink<Message> + Unpin,
    S::Error: Display,
{
    let index = table.require_columns(columns)?;
    let mut sent = 0usize;

    for (row_number, row) in table.rows().enumerate() {
        let point = tick_point(row, index, row_number)?;
        let payload = serde_json::to_string(&point).map_err(crate::error::ParseError::from)?;
        sink.send(Message::Text(payload.into()))
            .await
            .map_err(|e| StreamError::Transport(e.to_string()))?;
        sent += 1;
        tokio::time::sleep(pacing).await;
    }

    Ok(sent)
}

/// Load the file and stream it over `sink`, then close the sink whatever
/// happened. Errors are logged with their kind before the close.
pub async fn run_tick_stream<S>(
    mut sink: S,
    source: TickSource,
    pacing: Duration,
) -> Result<usize, StreamError>
where
    S: Sink<Message> + Unpin,
    S::Error: Display,
{
    let started = Instant::now();
    let result = stream_source(&mut sink, &source, pacing).await;

    match &result {
        Ok(sent) => tracing::info!(
            path = %source.path.display(),
            sent,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Tick stream completed"
        ),
        Err(e) => tracing::warn!(
            path = %source.path.display(),
            kind = e.kind(),
            error = %e,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Tick stream aborted"
        ),
    }

    if let Err(e) = sink.close().await {
        tracing::debug!(error = %e, "Tick stream close failed");
    }
    result
}

async fn stream_source<S>(
    sink: &mut S,
    source: &TickSource,
    pacing: Duration,
) -> Result<usize, StreamError>
where
    S: Sink<Message> + Unpin,
    S::Error: Display,
{
    let loader = source.clone();
    let table = tokio::task::spawn_blocking(move || loader.load_table())
        .await
        .map_err(|e| StreamError::Io(format!("tick loader task failed: {}", e)))??;

    deliver_ticks(sink, &table, &source.columns, pacing).await
}
