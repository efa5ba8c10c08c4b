//! Join-all-or-first-error over spawned tasks.
//!
//! Every task is already running when it reaches [`join_all_or_first_error`].
//! The first failure in completion order is returned immediately; the other
//! handles are dropped, which detaches their tasks rather than aborting them.
//! Whatever they go on to write stays written.

use super::PipelineError;
use futures::StreamExt;
use futures::stream::FuturesUnordered;
use tokio::task::JoinHandle;

/// Await every task, returning their values in input order.
pub async fn join_all_or_first_error<T>(
    tasks: Vec<JoinHandle<Result<T, PipelineError>>>,
) -> Result<Vec<T>, PipelineError> {
    let mut slots: Vec<Option<T>> = tasks.iter().map(|_| None).collect();

    let mut pending: FuturesUnordered<_> = tasks
        .into_iter()
        .enumerate()
        .map(|(index, handle)| async move { (index, handle.await) })
        .collect();

    while let Some((index, joined)) = pending.next().await {
        slots[index] = Some(joined??);
    }

    Ok(slots.into_iter().flatten().collect())
}
