// src/services/generator.rs

use std::{sync::Arc, time::Duration};

use tokio::{sync::Semaphore, task::JoinHandle, time::timeout};

use crate::{error::AppError, services::completion::CompletionService};

/// Runs completion calls off the handler task under a latency budget.
///
/// * Each call is spawned as its own task and joined with a timeout.
/// * On timeout the task is aborted, dropping the in-flight HTTP request.
/// * A semaphore bounds outstanding calls; waiting for a permit counts
///   against the same budget.
#[derive(Clone)]
pub struct QuizGenerator {
    completion: Arc<dyn CompletionService>,
    permits: Arc<Semaphore>,
    budget: Duration,
}

/// Aborts the wrapped task when dropped, e.g. when the client disconnects
/// and axum drops the handler future.
struct AbortOnDrop<T>(JoinHandle<T>);

impl<T> Drop for AbortOnDrop<T> {
    fn drop(&mut self) {
        self.0.abort();
    }
}

impl QuizGenerator {
    pub fn new(
        completion: Arc<dyn CompletionService>,
        max_inflight: usize,
        budget: Duration,
    ) -> Self {
        Self {
            completion,
            permits: Arc::new(Semaphore::new(max_inflight.max(1))),
            budget,
        }
    }

    /// Number of calls that could start right now without waiting.
    pub fn available_permits(&self) -> usize {
        self.permits.available_permits()
    }

    /// Sends `prompt` to the completion service and returns its raw text.
    pub async fn generate(&self, prompt: String) -> Result<String, AppError> {
        let completion = Arc::clone(&self.completion);
        let permits = Arc::clone(&self.permits);

        let mut task = AbortOnDrop(tokio::spawn(async move {
            // The semaphore is never closed.
            let _permit = permits.acquire_owned().await.ok();
            completion.complete(&prompt).await
        }));

        match timeout(self.budget, &mut task.0).await {
            Err(_elapsed) => {
                tracing::debug!("Completion exceeded {:?}, aborting", self.budget);
                Err(AppError::Timeout)
            }
            Ok(Err(join_err)) => Err(AppError::ModelFailure(format!(
                "completion task failed: {}",
                join_err
            ))),
            Ok(Ok(Err(e))) => Err(AppError::ModelFailure(e.to_string())),
            Ok(Ok(Ok(text))) => Ok(text),
        }
    }
}
