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

//! Defines the retry policies for part uploads.
//!
//! S3-compatible stores recommend retrying requests that fail with 408, 429,
//! and all 5xx HTTP status codes. Some stores also report transient problems
//! using a 400 status code and an error code in the response payload, for
//! example `RequestTimeout`. The [RetryableErrors] policy handles both cases.
//!
//! Part uploads are always safe to retry: uploading the same part number again
//! replaces the previous data for that part.
//!
//! # Example
//! ```
//! # use multipart_upload::retry_policy::*;
//! use std::time::Duration;
//! let policy = RetryableErrors
//!     .with_attempt_limit(5)
//!     .with_time_limit(Duration::from_secs(60));
//! ```

use crate::Error;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// The maximum number of attempts for each part in the default policy.
pub const DEFAULT_ATTEMPT_LIMIT: u32 = 10;

/// The maximum time spent on each part in the default policy.
pub const DEFAULT_TIME_LIMIT: Duration = Duration::from_secs(300);

/// The default retry policy.
///
/// Retries all the errors that are retryable in S3-compatible stores, and
/// stops after 10 attempts or 5 minutes, whichever comes first.
pub(crate) fn default_policy() -> impl RetryPolicy {
    RetryableErrors
        .with_attempt_limit(DEFAULT_ATTEMPT_LIMIT)
        .with_time_limit(DEFAULT_TIME_LIMIT)
}

/// The decision of a [RetryPolicy] after a part upload attempt fails.
///
/// Every variant carries the error from the failed attempt. If the part is
/// not uploaded again, that error becomes the cause of the error returned by
/// the upload.
///
/// # Example
/// ```
/// # use multipart_upload::Error;
/// # use multipart_upload::retry_policy::{RetryPolicy, RetryResult, RetryState};
/// // Retries throttling errors forever, and nothing else.
/// #[derive(Debug)]
/// struct OnlySlowDown;
/// impl RetryPolicy for OnlySlowDown {
///     fn on_error(&self, _state: &RetryState, error: Error) -> RetryResult {
///         if error.service_code() == Some("SlowDown") {
///             return RetryResult::Continue(error);
///         }
///         RetryResult::Permanent(error)
///     }
/// }
/// ```
#[derive(Debug)]
pub enum RetryResult {
    /// Upload the part again after the backoff delay.
    Continue(Error),

    /// The part could succeed on another attempt, but the policy gave up.
    ///
    /// The upload fails with an [exhausted][Error::is_exhausted] error for
    /// this part.
    Exhausted(Error),

    /// Another attempt would fail the same way, for example, because the
    /// credentials cannot write to the bucket.
    ///
    /// The upload fails with a [transfer][Error::is_transfer] error for this
    /// part.
    Permanent(Error),
}

impl RetryResult {
    /// The part is uploaded again.
    pub fn is_continue(&self) -> bool {
        matches!(self, Self::Continue(_))
    }

    /// The policy gave up on a retryable error.
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::Exhausted(_))
    }

    /// The error cannot be retried.
    pub fn is_permanent(&self) -> bool {
        matches!(self, Self::Permanent(_))
    }

    /// The error from the failed attempt.
    pub fn error(&self) -> &Error {
        match self {
            Self::Continue(e) | Self::Exhausted(e) | Self::Permanent(e) => e,
        }
    }
}

/// Defines the interface to retry policies.
pub trait RetryPolicy: Send + Sync + std::fmt::Debug {
    /// Query the retry policy after an error.
    ///
    /// # Parameters
    /// * `state` - the start time of the loop and the number of attempts so
    ///   far, including the attempt that just failed.
    /// * `error` - the last error received from a request. Not all are store
    ///   errors, the client may have been unable to send or complete the
    ///   request.
    fn on_error(&self, state: &RetryState, error: Error) -> RetryResult;

    /// The remaining time in the retry policy.
    ///
    /// For policies based on time, this returns the remaining time in the
    /// policy. The retry loop uses this value to adjust the next attempt
    /// timeout. For policies that are not time based this returns `None`.
    fn remaining_time(&self, _state: &RetryState) -> Option<Duration> {
        None
    }
}

impl<T> RetryPolicy for Arc<T>
where
    T: RetryPolicy + ?Sized,
{
    fn on_error(&self, state: &RetryState, error: Error) -> RetryResult {
        self.as_ref().on_error(state, error)
    }

    fn remaining_time(&self, state: &RetryState) -> Option<Duration> {
        self.as_ref().remaining_time(state)
    }
}

/// Extension trait for [RetryPolicy].
pub trait RetryPolicyExt: RetryPolicy + Sized {
    /// Decorates a [RetryPolicy] to limit the number of attempts.
    ///
    /// The policy passes through the results from the inner policy as long as
    /// `attempt_count < maximum_attempts`. Once the maximum number of attempts
    /// is reached, the policy returns [Exhausted][RetryResult::Exhausted] if
    /// the inner policy returns [Continue][RetryResult::Continue].
    ///
    /// `on_error()` is only called after an attempt fails, setting the
    /// maximum number of attempts to 0 or 1 disables retries.
    fn with_attempt_limit(self, maximum_attempts: u32) -> LimitedAttemptCount<Self> {
        LimitedAttemptCount::new(self, maximum_attempts)
    }

    /// Decorates a [RetryPolicy] to limit the duration of the retry loop.
    ///
    /// Once the loop exceeds `maximum_duration` the policy returns
    /// [Exhausted][RetryResult::Exhausted] if the inner policy returns
    /// [Continue][RetryResult::Continue].
    fn with_time_limit(self, maximum_duration: Duration) -> LimitedElapsedTime<Self> {
        LimitedElapsedTime::new(self, maximum_duration)
    }
}

impl<T: RetryPolicy> RetryPolicyExt for T {}

/// The inputs into a retry policy query.
///
/// We use a struct so we can grow the amount of information without breaking
/// existing retry policies.
#[derive(Clone, Debug)]
#[non_exhaustive]
pub struct RetryState {
    /// The start time for this retry loop.
    pub start: Instant,

    /// The number of times the request has been attempted.
    pub attempt_count: u32,
}

impl RetryState {
    /// Create a new instance, starting now.
    pub fn new() -> Self {
        Self::default()
    }

    /// Update the start time, useful in mocks.
    pub fn set_start<T: Into<Instant>>(mut self, v: T) -> Self {
        self.start = v.into();
        self
    }

    /// Update the attempt count, useful in mocks.
    pub fn set_attempt_count<T: Into<u32>>(mut self, v: T) -> Self {
        self.attempt_count = v.into();
        self
    }
}

impl Default for RetryState {
    fn default() -> Self {
        Self {
            start: Instant::now(),
            attempt_count: 0,
        }
    }
}

/// Retries the errors that S3-compatible stores document as transient.
///
/// This policy must be decorated to limit the number of retry attempts and/or
/// the duration of the retry loop.
#[derive(Clone, Debug)]
pub struct RetryableErrors;

impl RetryPolicy for RetryableErrors {
    fn on_error(&self, _state: &RetryState, error: Error) -> RetryResult {
        if error.is_io() || error.is_timeout() {
            return RetryResult::Continue(error);
        }
        if error.service_code().is_some_and(is_transient_code) {
            return RetryResult::Continue(error);
        }
        match error.http_status_code() {
            Some(408 | 429 | 500..600) => RetryResult::Continue(error),
            _ => RetryResult::Permanent(error),
        }
    }
}

fn is_transient_code(code: &str) -> bool {
    matches!(
        code,
        "RequestTimeout" | "SlowDown" | "InternalError" | "ServiceUnavailable"
    )
}

/// A retry policy that never retries.
///
/// Useful to disable retries, for example, in tests.
#[derive(Clone, Debug)]
pub struct NeverRetry;

impl RetryPolicy for NeverRetry {
    fn on_error(&self, _state: &RetryState, error: Error) -> RetryResult {
        RetryResult::Permanent(error)
    }
}

/// Decorates a retry policy to stop after a number of attempts.
///
/// # Example
/// ```
/// # use multipart_upload::retry_policy::*;
/// let policy = LimitedAttemptCount::new(RetryableErrors, 3);
/// let state = RetryState::new().set_attempt_count(3_u32);
/// let error = multipart_upload::Error::io("connection reset");
/// assert!(policy.on_error(&state, error).is_exhausted());
/// ```
#[derive(Debug)]
pub struct LimitedAttemptCount<P> {
    inner: P,
    maximum_attempts: u32,
}

impl<P> LimitedAttemptCount<P> {
    /// Create a new instance.
    pub fn new(inner: P, maximum_attempts: u32) -> Self {
        Self {
            inner,
            maximum_attempts,
        }
    }
}

impl<P> RetryPolicy for LimitedAttemptCount<P>
where
    P: RetryPolicy,
{
    fn on_error(&self, state: &RetryState, error: Error) -> RetryResult {
        match self.inner.on_error(state, error) {
            RetryResult::Continue(e) if state.attempt_count >= self.maximum_attempts => {
                RetryResult::Exhausted(e)
            }
            result => result,
        }
    }

    fn remaining_time(&self, state: &RetryState) -> Option<Duration> {
        self.inner.remaining_time(state)
    }
}

/// Decorates a retry policy to stop after some time.
///
/// The deadline is measured from the start of the retry loop, as reported in
/// [RetryState::start].
#[derive(Debug)]
pub struct LimitedElapsedTime<P> {
    inner: P,
    maximum_duration: Duration,
}

impl<P> LimitedElapsedTime<P> {
    /// Create a new instance.
    pub fn new(inner: P, maximum_duration: Duration) -> Self {
        Self {
            inner,
            maximum_duration,
        }
    }

    fn deadline(&self, state: &RetryState) -> Instant {
        state.start + self.maximum_duration
    }
}

impl<P> LimitedElapsedTime<P>
where
    P: RetryPolicy,
{
    fn on_error_now(&self, now: Instant, state: &RetryState, error: Error) -> RetryResult {
        match self.inner.on_error(state, error) {
            RetryResult::Continue(e) if now >= self.deadline(state) => RetryResult::Exhausted(e),
            result => result,
        }
    }

    fn remaining_time_now(&self, now: Instant, state: &RetryState) -> Option<Duration> {
        let remaining = self.deadline(state).saturating_duration_since(now);
        match self.inner.remaining_time(state) {
            Some(inner) => Some(std::cmp::min(remaining, inner)),
            None => Some(remaining),
        }
    }
}

impl<P> RetryPolicy for LimitedElapsedTime<P>
where
    P: RetryPolicy,
{
    fn on_error(&self, state: &RetryState, error: Error) -> RetryResult {
        self.on_error_now(Instant::now(), state, error)
    }

    fn remaining_time(&self, state: &RetryState) -> Option<Duration> {
        self.remaining_time_now(Instant::now(), state)
    }
}
