//! Fan-out/Fan-in: runs every adaptation task concurrently and joins the results.
//!
//! Each task runs in its own spawned tokio task behind a shared semaphore, so at
//! most `max_concurrency` generation calls are in flight. A task never fails the
//! batch: adapter errors and panics are turned into a fallback result carrying
//! the original text and a recorded failure.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::AbortHandle;
use tracing::{error, warn};

use crate::adaptation::adapter::{AdaptError, Adapter};
use crate::adaptation::context::JobContext;
use crate::adaptation::tasks::{AdaptationTask, FieldCoordinate};

/// Why a field fell back to its original text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Ceiling, retention or numeric-claim check failed.
    Validation,
    /// Timeout or transient status after the retry budget ran out.
    Transient,
    /// Non-retryable response or transport failure.
    Permanent,
    /// Generation client is disabled or incomplete.
    Configuration,
    /// The task panicked.
    Unexpected,
}

impl FailureKind {
    /// Failures that abort the whole request once the batch has joined.
    pub fn is_fatal(self) -> bool {
        matches!(self, FailureKind::Permanent | FailureKind::Configuration)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl From<&AdaptError> for TaskFailure {
    fn from(err: &AdaptError) -> Self {
        let kind = match err {
            AdaptError::Validation(_) => FailureKind::Validation,
            AdaptError::Generation(e) if e.is_configuration() => FailureKind::Configuration,
            AdaptError::Generation(e) if e.is_transient() => FailureKind::Transient,
            AdaptError::Generation(_) => FailureKind::Permanent,
        };
        TaskFailure {
            kind,
            message: err.to_string(),
        }
    }
}

/// Outcome of one task. On failure `adapted` holds the original text.
#[derive(Debug, Clone, PartialEq)]
pub struct AdaptationResult {
    pub coordinate: FieldCoordinate,
    pub original: String,
    pub adapted: String,
    pub failure: Option<TaskFailure>,
}

impl AdaptationResult {
    fn succeeded(task: AdaptationTask, adapted: String) -> Self {
        Self {
            coordinate: task.coordinate,
            original: task.original,
            adapted,
            failure: None,
        }
    }

    fn fallback(coordinate: FieldCoordinate, original: String, failure: TaskFailure) -> Self {
        Self {
            coordinate,
            adapted: original.clone(),
            original,
            failure: Some(failure),
        }
    }
}

/// Joined output of one batch.
#[derive(Debug, Default)]
pub struct FanIn {
    pub results: HashMap<FieldCoordinate, AdaptationResult>,
    /// One entry per failed task, in task order.
    pub warnings: Vec<String>,
    /// First fatal failure in task order, if any.
    pub fatal: Option<(FieldCoordinate, TaskFailure)>,
}

impl FanIn {
    fn record(&mut self, result: AdaptationResult) {
        if let Some(failure) = &result.failure {
            self.warnings
                .push(format!("{}: {}", result.coordinate, failure.message));
            if failure.kind.is_fatal() && self.fatal.is_none() {
                self.fatal = Some((result.coordinate, failure.clone()));
            }
        }
        self.results.insert(result.coordinate, result);
    }

    pub fn fallback_count(&self) -> usize {
        self.results.values().filter(|r| r.failure.is_some()).count()
    }
}

/// Aborts still-running tasks if the batch future is dropped before joining.
struct AbortOnDrop(Vec<AbortHandle>);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        for handle in &self.0 {
            handle.abort();
        }
    }
}

/// Spawns every task at once and waits for all of them.
///
/// `max_concurrency` is clamped to at least 1.
pub async fn run_tasks(
    tasks: Vec<AdaptationTask>,
    adapter: &Adapter,
    context: Arc<JobContext>,
    max_concurrency: usize,
) -> FanIn {
    let semaphore = Arc::new(Semaphore::new(max_concurrency.max(1)));
    let mut pending = Vec::with_capacity(tasks.len());

    for task in tasks {
        let coordinate = task.coordinate;
        let original = task.original.clone();
        let adapter = adapter.clone();
        let context = Arc::clone(&context);
        let permits = Arc::clone(&semaphore);

        let handle = tokio::spawn(async move {
            // The semaphore is never closed, so the permit is always granted.
            let _permit = permits.acquire_owned().await;

            match adapter
                .adapt(&task.original, &context, task.coordinate.category())
                .await
            {
                Ok(adapted) => AdaptationResult::succeeded(task, adapted),
                Err(e) => {
                    warn!("Adaptation of {} fell back to original: {e}", task.coordinate);
                    let failure = TaskFailure::from(&e);
                    AdaptationResult::fallback(task.coordinate, task.original, failure)
                }
            }
        });
        pending.push((coordinate, original, handle));
    }

    let _guard = AbortOnDrop(pending.iter().map(|(_, _, h)| h.abort_handle()).collect());

    let mut fan_in = FanIn::default();
    for (coordinate, original, handle) in pending {
        let result = match handle.await {
            Ok(result) => result,
            Err(join_error) => {
                let reason = if join_error.is_panic() {
                    panic_message(join_error.into_panic())
                } else {
                    "task was cancelled".to_string()
                };
                error!("Adaptation task for {coordinate} failed unexpectedly: {reason}");
                AdaptationResult::fallback(
                    coordinate,
                    original,
                    TaskFailure {
                        kind: FailureKind::Unexpected,
                        message: format!("unexpected failure: {reason}"),
                    },
                )
            }
        };
        fan_in.record(result);
    }

    fan_in
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "task panicked".to_string()
    }
}
