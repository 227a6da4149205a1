use color_eyre::{eyre::WrapErr, Result};
use futures_util::future::select_all;
use tokio::task::JoinHandle;
use tracing::{info_span, Instrument};

/// Run tasks until the first one finishes, then abort the rest and return
/// its result
pub fn run_all(tasks: Vec<JoinHandle<Result<()>>>) -> JoinHandle<Result<()>> {
    let span = info_span!("run_all");
    tokio::spawn(
        async move {
            if tasks.is_empty() {
                return Ok(());
            }
            let (res, _, remaining) = select_all(tasks).await;
            for task in remaining.into_iter() {
                task.abort();
            }
            res.wrap_err("task panicked or was cancelled")?
        }
        .instrument(span),
    )
}
