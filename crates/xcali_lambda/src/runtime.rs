use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use lambda_runtime::Context;
use tokio::time::Instant;
use xcali_core::invocation::Invocation;

use crate::adapters::s3::S3Store;
use crate::config::AppConfig;
use crate::handlers::request::RequestDispatcher;

/// Builds the process-wide dispatcher; every store capability is backed by
/// the same S3 bucket.
pub async fn build_dispatcher(config: &AppConfig) -> RequestDispatcher {
    let store = Arc::new(S3Store::from_config(config).await);
    RequestDispatcher::new(store.clone(), store.clone(), store)
}

/// Invocation bounded by the platform deadline of `context`.
pub fn invocation_for_context(context: &Context) -> Invocation {
    let remaining = remaining_until(context.deadline, Utc::now().timestamp_millis());
    Invocation::detached(context.request_id.clone()).with_deadline(Instant::now() + remaining)
}

fn remaining_until(deadline_epoch_ms: u64, now_epoch_ms: i64) -> Duration {
    let deadline = i64::try_from(deadline_epoch_ms).unwrap_or(i64::MAX);
    let remaining = deadline.saturating_sub(now_epoch_ms).max(0);
    Duration::from_millis(remaining.unsigned_abs())
}
