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

use crate::backoff_policy::{BackoffPolicy, ExponentialBackoff};
use crate::retry_policy::RetryPolicy;
use crate::source::PART_SIZE;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[derive(Clone, Debug)]
pub(crate) struct RequestOptions {
    pub retry_policy: Arc<dyn RetryPolicy>,
    pub backoff_policy: Arc<dyn BackoffPolicy>,
    pub attempt_timeout: Option<Duration>,
    pub part_size: u64,
    pub max_in_flight_parts: usize,
    pub cancel: CancellationToken,
}

impl RequestOptions {
    pub(crate) fn new() -> Self {
        let retry_policy = Arc::new(crate::retry_policy::default_policy());
        let backoff_policy = Arc::new(ExponentialBackoff::default());
        Self {
            retry_policy,
            backoff_policy,
            attempt_timeout: None,
            part_size: PART_SIZE,
            max_in_flight_parts: 1,
            cancel: CancellationToken::new(),
        }
    }
}
