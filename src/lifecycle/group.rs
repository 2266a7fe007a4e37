//! Fan-out/fan-in task group with first-error capture.
//!
//! Every task spawned into a [`TaskGroup`] shares one cancellation token,
//! a child of the token the group was built from. The first task to fail
//! (or panic) cancels it, which lets the remaining tasks observe the failure
//! and wind down; the parent is left untouched. [`TaskGroup::wait`] joins every
//! task before returning, so nothing spawned here outlives the group.

use std::future::Future;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::error::AppError;

/// A set of concurrently running tasks bound to one cancellation token.
pub struct TaskGroup {
    set: JoinSet<Result<(), AppError>>,
    token: CancellationToken,
}

impl TaskGroup {
    /// Create an empty group under `parent`.
    ///
    /// Cancelling `parent` cancels the group; a task error cancels only the
    /// group.
    pub fn new(parent: &CancellationToken) -> Self {
        Self {
            set: JoinSet::new(),
            token: parent.child_token(),
        }
    }

    /// The token shared by every task in the group.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Spawn a task into the group.
    pub fn spawn<F>(&mut self, task: F)
    where
        F: Future<Output = Result<(), AppError>> + Send + 'static,
    {
        let token = self.token.clone();
        self.set.spawn(async move {
            let result = task.await;
            if result.is_err() {
                token.cancel();
            }
            result
        });
    }

    /// Number of tasks that have not been joined yet.
    pub fn len(&self) -> usize {
        self.set.len()
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }

    /// Wait for every task to complete.
    ///
    /// Returns the first error in completion order, skipping the
    /// cancellation marker. Later errors are logged and dropped.
    pub async fn wait(mut self) -> Result<(), AppError> {
        let mut first: Option<AppError> = None;

        while let Some(joined) = self.set.join_next().await {
            let Err(err) = joined.map_err(AppError::from).and_then(|result| result) else {
                continue;
            };

            // A panicking task never reached the cancel in `spawn`.
            self.token.cancel();

            if err.is_canceled() {
                continue;
            }
            match first {
                None => first = Some(err),
                Some(_) => tracing::debug!(
                    error = %err,
                    kind = err.as_label(),
                    "Suppressing error after first failure"
                ),
            }
        }

        match first {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}
