//! Background workers and the runtime they run on.

use tokio_stream::wrappers::ReceiverStream;
use tracing::Span;

use crate::common::*;

/// A handle for starting background workers whose failures should end the
/// current command.
///
/// Our only background worker is the PostgreSQL connection task, which must be
/// polled separately from the `Client` that talks to it.
#[derive(Debug, Clone)]
pub struct Context {
    /// Workers send their first error here.
    failures: mpsc::Sender<Error>,
}

impl Context {
    /// Create a context, plus a future that resolves once every copy of the
    /// context and every worker is gone. It fails with the first error any
    /// worker reports.
    pub fn create() -> (Self, BoxFuture<()>) {
        let (failures, rx) = mpsc::channel(1);
        let mut reports = ReceiverStream::new(rx);
        let workers = async move {
            match reports.next().await {
                Some(err) => Err(err),
                None => Ok(()),
            }
        };
        (Context { failures }, workers.boxed())
    }

    /// Run `worker` on the runtime, inside `span`. If it fails, the error goes
    /// to the future returned by [`Context::create`].
    pub fn spawn_worker<W>(&self, span: Span, worker: W)
    where
        W: Future<Output = Result<()>> + Send + 'static,
    {
        let failures = self.failures.clone();
        let task = async move {
            let Err(err) = worker.await else {
                return;
            };
            debug!("background worker failed: {:#}", err);
            if failures.send(err).await.is_err() {
                debug!("nobody is waiting for background worker errors");
            }
        };
        tokio::spawn(task.instrument(span));
    }
}

/// Drive `cmd_future` and `worker_future` on a new single-threaded runtime.
///
/// Whichever fails first wins, and the other future is dropped.
pub fn run_futures_with_runtime(
    cmd_future: BoxFuture<()>,
    worker_future: BoxFuture<()>,
) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("unable to create a runtime")?;
    runtime.block_on(async move {
        futures::try_join!(cmd_future, worker_future)?;
        Ok::<(), Error>(())
    })
}

#[cfg(test)]
#[tokio::test]
async fn worker_errors_are_reported() {
    let (ctx, workers) = Context::create();
    ctx.spawn_worker(debug_span!("failing worker"), async {
        Err(format_err!("connection reset"))
    });
    drop(ctx);
    let err = workers.await.unwrap_err();
    assert_eq!(err.to_string(), "connection reset");
}

#[cfg(test)]
#[tokio::test]
async fn workers_finish_cleanly_when_all_succeed() {
    let (ctx, workers) = Context::create();
    ctx.spawn_worker(debug_span!("ok worker"), async { Ok(()) });
    drop(ctx);
    workers.await.unwrap();
}

#[cfg(test)]
#[test]
fn runtime_reports_command_errors() {
    let (ctx, workers) = Context::create();
    let cmd = async move {
        drop(ctx);
        Err(format_err!("no such table"))
    }
    .boxed();
    let err = run_futures_with_runtime(cmd, workers).unwrap_err();
    assert_eq!(err.to_string(), "no such table");
}
