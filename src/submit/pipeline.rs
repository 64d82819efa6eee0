//! Sequences torrent-add submissions against the remote endpoint.
//!
//! Two shapes of submission exist. A single staged torrent is dispatched on
//! its own task and acknowledged through a one-shot callback. A batch of
//! sources gets exactly one dedicated worker task that walks the list in
//! order, awaiting each dispatch before starting the next, and reports every
//! item through a shared callback - failures included, with no short-circuit.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::runtime::Handle;
use tracing::debug;

use crate::api::types::RpcRequest;
use crate::api::{Dispatcher, RpcResponse};
use crate::error::{StageError, StageResult};
use crate::submit::request::{apply_common_args, seed_add_request, CommonArgs};

/// What one submission came back with, delivered verbatim to the callback.
/// The pipeline never interprets the envelope or the error.
pub type DispatchOutcome = StageResult<RpcResponse>;

/// An ordered batch of torrent sources with their shared submission options.
///
/// Owned exclusively by the worker once submitted; dropped after the last
/// item completes.
#[derive(Debug, Clone)]
pub struct BatchJob {
    pub sources: Vec<PathBuf>,
    pub paused: bool,
    /// Shared destination/priority, when the batch carries them.
    pub common: Option<CommonArgs>,
}

/// Dispatches submissions through a [`Dispatcher`].
pub struct SubmissionPipeline {
    dispatcher: Arc<dyn Dispatcher>,
}

impl SubmissionPipeline {
    pub fn new(dispatcher: Arc<dyn Dispatcher>) -> Self {
        Self { dispatcher }
    }

    /// Submit one already-built request without blocking the caller.
    ///
    /// The callback is invoked exactly once, whenever the endpoint responds.
    pub fn submit_single<F>(&self, request: RpcRequest, on_complete: F) -> StageResult<()>
    where
        F: FnOnce(DispatchOutcome) + Send + 'static,
    {
        let handle = runtime_handle()?;
        let dispatcher = Arc::clone(&self.dispatcher);
        handle.spawn(async move {
            let outcome = dispatcher.dispatch(request).await;
            on_complete(outcome);
        });
        Ok(())
    }

    /// Submit a batch of sources on one dedicated worker, fire-and-forget.
    ///
    /// Per source: seed a minimal request from the file, layer the common
    /// args if the batch carries them, await the dispatch, invoke the
    /// callback with that item's outcome. Submission *i+1* starts only after
    /// *i*'s callback has returned. Every source is processed regardless of
    /// individual failures.
    ///
    /// An `Err` here means the worker could not be started at all: no
    /// callback will fire and the job is dropped. Callers wanting the
    /// historical degrade-silently behavior log it and move on.
    pub fn submit_batch<F>(&self, job: BatchJob, mut on_item: F) -> StageResult<()>
    where
        F: FnMut(&Path, DispatchOutcome) + Send + 'static,
    {
        let handle = runtime_handle()?;
        let dispatcher = Arc::clone(&self.dispatcher);
        handle.spawn(async move {
            for source in &job.sources {
                let outcome = match seed_add_request(source, job.paused) {
                    Ok(mut args) => {
                        if let Some(common) = &job.common {
                            apply_common_args(&mut args, common);
                        }
                        dispatcher.dispatch(args.into_request()).await
                    }
                    Err(e) => Err(e),
                };
                on_item(source, outcome);
            }
            debug!(count = job.sources.len(), "Batch worker finished");
            // job, including its owned source list, is dropped here
        });
        Ok(())
    }
}

fn runtime_handle() -> StageResult<Handle> {
    Handle::try_current()
        .map_err(|e| StageError::NotReady(format!("No async runtime for submission worker: {}", e)))
}
