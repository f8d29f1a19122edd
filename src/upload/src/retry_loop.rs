// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::Result;
use crate::backoff_policy::BackoffPolicy;
use crate::error::Error;
use crate::retry_policy::{RetryPolicy, RetryResult, RetryState};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Runs the retry loop for a given function.
///
/// This function calls `inner` until (1) it returns a successful response,
/// (2) the retry policy rejects the error, (3) the retry policy is exhausted,
/// or (4) the cancellation token fires.
///
/// In between calls the function waits the amount of time prescribed by the
/// backoff policy, using `sleep` to implement any sleep. The `on_retry`
/// callback is called before sleeping, with the attempt count, the error, and
/// the delay.
///
/// `inner` receives the remaining time in the retry policy, if any.
pub(crate) async fn retry_loop<F, S, OnRetry, Response>(
    mut inner: F,
    sleep: S,
    cancel: &CancellationToken,
    retry_policy: &dyn RetryPolicy,
    backoff_policy: &dyn BackoffPolicy,
    mut on_retry: OnRetry,
) -> Result<Response>
where
    F: AsyncFnMut(Option<Duration>) -> Result<Response>,
    S: AsyncFn(Duration),
    OnRetry: FnMut(u32, &Error, Duration),
{
    let mut state = RetryState::new().set_start(tokio::time::Instant::now().into_std());
    let mut pending: Option<(Duration, Error)> = None;
    loop {
        let remaining_time = retry_policy.remaining_time(&state);
        if let Some((delay, prev_error)) = pending.take() {
            if remaining_time.is_some_and(|remaining| remaining < delay) {
                return Err(Error::exhausted(prev_error));
            }
            on_retry(state.attempt_count, &prev_error, delay);
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(Error::cancelled()),
                _ = sleep(delay) => {},
            }
        }
        state.attempt_count += 1;
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(Error::cancelled()),
            r = inner(remaining_time) => r,
        };
        let error = match result {
            Ok(r) => return Ok(r),
            Err(e) => e,
        };
        match retry_policy.on_error(&state, error) {
            RetryResult::Permanent(e) => return Err(e),
            RetryResult::Exhausted(e) => return Err(Error::exhausted(e)),
            RetryResult::Continue(e) => {
                let delay = backoff_policy.on_failure(&state);
                pending = Some((delay, e));
            }
        }
    }
}

/// Computes the deadline for one attempt, given the attempt timeout and the
/// time remaining in the retry policy.
pub(crate) fn effective_timeout(
    attempt_timeout: Option<Duration>,
    remaining_time: Option<Duration>,
) -> Option<Duration> {
    match (attempt_timeout, remaining_time) {
        (None, None) => None,
        (None, Some(t)) | (Some(t), None) => Some(t),
        (Some(a), Some(r)) => Some(std::cmp::min(a, r)),
    }
}

/// Runs `fut`, failing with a timeout error if it does not complete in time.
pub(crate) async fn with_timeout<F, T>(timeout: Option<Duration>, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match timeout {
        None => fut.await,
        Some(t) => tokio::time::timeout(t, fut).await.map_err(Error::timeout)?,
    }
}
