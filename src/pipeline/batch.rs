//! Bounded-concurrency batch execution.
//!
//! Items are sliced into consecutive chunks of `k`. Each chunk's items run
//! concurrently; the next chunk starts only after the whole chunk has settled,
//! and only after a control checkpoint. Results are handed to `on_result` in
//! item order once their chunk settles, so callers can fold them into the
//! document chunk by chunk.
//!
//! A failing item yields no result and is counted; only fatal errors
//! (cancellation, quota) stop the batch, after the chunk they occurred in has
//! settled.

use super::control::ControlToken;
use super::errors::PipelineError;
use futures::future::join_all;
use std::future::Future;

/// Aggregate outcome of one batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub chunks: usize,
}

pub async fn process_batch<I, T, F, Fut, S>(
    items: Vec<I>,
    concurrency: usize,
    token: &mut ControlToken,
    work: F,
    mut on_result: S,
) -> Result<BatchSummary, PipelineError>
where
    F: Fn(usize, I) -> Fut,
    Fut: Future<Output = Result<T, PipelineError>>,
    S: FnMut(usize, T) -> Result<(), PipelineError>,
{
    let k = concurrency.max(1);
    let mut summary = BatchSummary {
        total: items.len(),
        ..BatchSummary::default()
    };
    let mut pending = items.into_iter().enumerate().peekable();

    while pending.peek().is_some() {
        token.checkpoint().await?;

        let chunk: Vec<(usize, I)> = pending.by_ref().take(k).collect();
        let futures = chunk.into_iter().map(|(index, item)| {
            let fut = work(index, item);
            async move { (index, fut.await) }
        });
        let settled = join_all(futures).await;
        summary.chunks += 1;

        let mut fatal = None;
        for (index, outcome) in settled {
            match outcome {
                Ok(value) => {
                    summary.succeeded += 1;
                    on_result(index, value)?;
                }
                Err(e) if e.is_fatal() => {
                    summary.failed += 1;
                    fatal.get_or_insert(e);
                }
                Err(e) => {
                    summary.failed += 1;
                    tracing::warn!(item = index, error = %e, "batch item failed");
                }
            }
        }
        if let Some(e) = fatal {
            return Err(e);
        }
    }

    Ok(summary)
}

#[cfg(test)]
#[path = "tests/batch_tests.rs"]
mod tests;
