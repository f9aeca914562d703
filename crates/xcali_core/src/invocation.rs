//! Per-request context bounding every store call.
//!
//! An [`Invocation`] carries the platform request id, an optional deadline and
//! an external cancellation signal. Store futures are raced against both in
//! [`Invocation::bound`]; a future that loses the race is dropped, which
//! cancels the in-flight backend request.

use std::future::Future;

use tokio::sync::watch;
use tokio::time::Instant;

use crate::store::{StoreError, StoreResult};

#[derive(Debug, Clone)]
pub struct Invocation {
    request_id: String,
    deadline: Option<Instant>,
    cancelled: watch::Receiver<bool>,
}

/// Sender half of an invocation's cancellation signal.
#[derive(Debug)]
pub struct CancelHandle {
    sender: watch::Sender<bool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.sender.send_replace(true);
    }
}

impl Invocation {
    /// An invocation that is never cancelled and has no deadline.
    pub fn detached(request_id: impl Into<String>) -> Self {
        let (sender, cancelled) = watch::channel(false);
        drop(sender);
        Self {
            request_id: request_id.into(),
            deadline: None,
            cancelled,
        }
    }

    pub fn cancellable(request_id: impl Into<String>) -> (Self, CancelHandle) {
        let (sender, cancelled) = watch::channel(false);
        let invocation = Self {
            request_id: request_id.into(),
            deadline: None,
            cancelled,
        };
        (invocation, CancelHandle { sender })
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_cancelled(&self) -> bool {
        *self.cancelled.borrow()
    }

    /// Runs a store future unless the invocation is cancelled or its deadline
    /// passes first.
    pub async fn bound<T, F>(&self, operation: &'static str, store_call: F) -> StoreResult<T>
    where
        F: Future<Output = StoreResult<T>>,
    {
        if self.is_cancelled() {
            return Err(StoreError::Cancelled { operation });
        }

        tokio::select! {
            biased;
            _ = self.wait_cancelled() => Err(StoreError::Cancelled { operation }),
            _ = self.wait_deadline() => Err(StoreError::DeadlineExceeded { operation }),
            result = store_call => result,
        }
    }

    async fn wait_cancelled(&self) {
        let mut receiver = self.cancelled.clone();
        loop {
            if *receiver.borrow_and_update() {
                return;
            }
            // A dropped sender can never cancel.
            if receiver.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }

    async fn wait_deadline(&self) {
        match self.deadline {
            Some(deadline) => tokio::time::sleep_until(deadline).await,
            None => std::future::pending::<()>().await,
        }
    }
}
