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

//! Defines the backoff policies for part uploads.
//!
//! The uploader should avoid immediately retrying a failed part, as the store
//! may need time to recover. [Exponential backoff] is a well known algorithm
//! to find an acceptable delay between retries.
//!
//! # Example
//! ```
//! # use multipart_upload::backoff_policy::*;
//! use std::time::Duration;
//! let policy = ExponentialBackoffBuilder::new()
//!     .with_initial_delay(Duration::from_millis(100))
//!     .with_maximum_delay(Duration::from_secs(5))
//!     .with_scaling(4.0)
//!     .build()?;
//! # Ok::<(), BuildError>(())
//! ```
//!
//! [Exponential backoff]: https://en.wikipedia.org/wiki/Exponential_backoff

use crate::retry_policy::RetryState;
use std::time::Duration;

/// Defines the trait implemented by all backoff strategies.
pub trait BackoffPolicy: Send + Sync + std::fmt::Debug {
    /// Returns the backoff delay on a failure.
    ///
    /// This method is always called after the first attempt, the
    /// `state.attempt_count` value is at least 1.
    fn on_failure(&self, state: &RetryState) -> Duration;
}

impl<T> BackoffPolicy for std::sync::Arc<T>
where
    T: BackoffPolicy + ?Sized,
{
    fn on_failure(&self, state: &RetryState) -> Duration {
        self.as_ref().on_failure(state)
    }
}

/// The error type for exponential backoff creation.
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum BuildError {
    #[error("the scaling value ({0}) should be >= 1.0")]
    InvalidScalingFactor(f64),
    #[error("the initial delay ({0:?}) should be greater than zero")]
    InvalidInitialDelay(Duration),
    #[error(
        "the maximum delay ({maximum:?}) should be greater than or equal to the initial delay ({initial:?})"
    )]
    EmptyRange {
        maximum: Duration,
        initial: Duration,
    },
}

/// Configures a truncated exponential backoff policy.
///
/// The defaults are a one second initial delay, a 60 second maximum delay,
/// and a scaling factor of 2.
#[derive(Clone, Debug)]
pub struct ExponentialBackoffBuilder {
    initial_delay: Duration,
    maximum_delay: Duration,
    scaling: f64,
}

impl ExponentialBackoffBuilder {
    /// Creates a builder with the default parameters.
    pub fn new() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            maximum_delay: Duration::from_secs(60),
            scaling: 2.0,
        }
    }

    /// Change the delay after the first failure.
    pub fn with_initial_delay<V: Into<Duration>>(mut self, v: V) -> Self {
        self.initial_delay = v.into();
        self
    }

    /// Change the upper bound for all delays.
    pub fn with_maximum_delay<V: Into<Duration>>(mut self, v: V) -> Self {
        self.maximum_delay = v.into();
        self
    }

    /// Change the growth factor between consecutive delays.
    pub fn with_scaling<V: Into<f64>>(mut self, v: V) -> Self {
        self.scaling = v.into();
        self
    }

    /// Creates a new exponential backoff policy, validating the parameters.
    ///
    /// # Example
    /// ```
    /// # use multipart_upload::backoff_policy::*;
    /// # use multipart_upload::retry_policy::RetryState;
    /// use std::time::Duration;
    /// let backoff = ExponentialBackoffBuilder::new()
    ///     .with_initial_delay(Duration::from_secs(5))
    ///     .with_maximum_delay(Duration::from_secs(50))
    ///     .build()?;
    /// let p = backoff.on_failure(&RetryState::new().set_attempt_count(1_u32));
    /// assert!(p <= Duration::from_secs(5));
    /// let p = backoff.on_failure(&RetryState::new().set_attempt_count(2_u32));
    /// assert!(p <= Duration::from_secs(10));
    /// # Ok::<(), BuildError>(())
    /// ```
    pub fn build(self) -> Result<ExponentialBackoff, BuildError> {
        if self.scaling < 1.0 {
            return Err(BuildError::InvalidScalingFactor(self.scaling));
        }
        if self.initial_delay.is_zero() {
            return Err(BuildError::InvalidInitialDelay(self.initial_delay));
        }
        if self.maximum_delay < self.initial_delay {
            return Err(BuildError::EmptyRange {
                maximum: self.maximum_delay,
                initial: self.initial_delay,
            });
        }
        Ok(ExponentialBackoff {
            initial_delay: self.initial_delay,
            maximum_delay: self.maximum_delay,
            scaling: self.scaling,
        })
    }
}

impl Default for ExponentialBackoffBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Implements truncated exponential backoff with full jitter.
///
/// The delay after the n-th failure is a random value between zero and
/// `min(initial_delay * scaling^(n-1), maximum_delay)`.
#[derive(Clone, Debug)]
pub struct ExponentialBackoff {
    initial_delay: Duration,
    maximum_delay: Duration,
    scaling: f64,
}

impl ExponentialBackoff {
    /// The upper bound for the delay after `attempt_count` failures.
    fn delay(&self, attempt_count: u32) -> Duration {
        let exp = attempt_count.saturating_sub(1).min(i32::MAX as u32) as i32;
        let scaling = self.scaling.powi(exp);
        if scaling >= self.maximum_delay.div_duration_f64(self.initial_delay) {
            return self.maximum_delay;
        }
        // scaling >= 1.0 and the product is below maximum_delay, mul_f64()
        // cannot overflow.
        self.initial_delay.mul_f64(scaling)
    }

    fn delay_with_jitter(&self, attempt_count: u32, rng: &mut impl rand::Rng) -> Duration {
        let delay = self.delay(attempt_count);
        rng.random_range(Duration::ZERO..=delay)
    }
}

impl Default for ExponentialBackoff {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            maximum_delay: Duration::from_secs(60),
            scaling: 2.0,
        }
    }
}

impl BackoffPolicy for ExponentialBackoff {
    fn on_failure(&self, state: &RetryState) -> Duration {
        self.delay_with_jitter(state.attempt_count, &mut rand::rng())
    }
}
