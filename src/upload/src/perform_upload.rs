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

//! Runs a multipart upload: open a session, transfer the parts, finalize.

use crate::error::UploadError;
use crate::request_options::RequestOptions;
use crate::retry_loop::{effective_timeout, retry_loop, with_timeout};
use crate::source::{MAX_PARTS, Part, PartSource};
use crate::store::{CompletedPart, Store, UploadSession, UploadedObject};
use crate::{Error, Result};
use futures::StreamExt;
use futures::stream::FuturesUnordered;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::io::AsyncRead;

/// Represents an upload constructed via `UploadObject<S, R>`.
///
/// Once the application has fully configured the upload it calls `send()`,
/// and the client library creates an instance of this struct to drive the
/// upload through its stages.
pub(crate) struct PerformUpload<S, R> {
    store: Arc<S>,
    bucket: String,
    key: String,
    source: PartSource<R>,
    options: RequestOptions,
}

impl<S, R> PerformUpload<S, R>
where
    S: Store,
    R: AsyncRead + Unpin,
{
    pub(crate) fn new(
        store: Arc<S>,
        bucket: String,
        key: String,
        reader: R,
        size: u64,
        options: RequestOptions,
    ) -> Self {
        let source = PartSource::with_part_size(reader, size, options.part_size);
        Self {
            store,
            bucket,
            key,
            source,
            options,
        }
    }

    pub(crate) async fn send(self) -> Result<UploadedObject> {
        let Self {
            store,
            bucket,
            key,
            mut source,
            options,
        } = self;
        let part_count = check_part_count(source.part_count())?;

        tracing::info!(bucket = bucket.as_str(), key = key.as_str(), "initiating upload");
        let session = tokio::select! {
            biased;
            _ = options.cancel.cancelled() => return Err(Error::cancelled()),
            s = store.open_session(&bucket, &key) => s.map_err(Error::session)?,
        };
        tracing::info!(
            upload_id = session.upload_id(),
            no_of_parts = part_count,
            "uploading parts"
        );

        let completed = transfer_parts(store.as_ref(), &options, &session, &mut source).await?;
        let parts = ordered_parts(&session, completed, part_count)?;
        finalize(store.as_ref(), &session, parts).await
    }
}

fn check_part_count(part_count: u64) -> Result<u32> {
    match part_count {
        0 => Err(Error::config(UploadError::EmptySource)),
        n if n > MAX_PARTS => Err(Error::config(UploadError::TooManyParts {
            parts: n,
            limit: MAX_PARTS,
        })),
        // MAX_PARTS fits in a u32.
        n => Ok(n as u32),
    }
}

/// Uploads all the parts, with at most `max_in_flight_parts` outstanding.
///
/// A new part is read from the source only when there is room for it, the
/// parts in flight own their buffers.
async fn transfer_parts<S, R>(
    store: &S,
    options: &RequestOptions,
    session: &UploadSession,
    source: &mut PartSource<R>,
) -> Result<BTreeMap<u32, CompletedPart>>
where
    S: Store,
    R: AsyncRead + Unpin,
{
    let limit = options.max_in_flight_parts.max(1);
    let mut pending = FuturesUnordered::new();
    let mut completed = BTreeMap::new();
    loop {
        while pending.len() < limit {
            match source.next_part().await? {
                Some(part) => pending.push(upload_part(store, options, session, part)),
                None => break,
            }
        }
        let Some(result) = pending.next().await else {
            break;
        };
        let part = result?;
        completed.insert(part.part_number(), part);
    }
    Ok(completed)
}

/// Uploads one part, retrying as prescribed by the retry policy.
async fn upload_part<S>(
    store: &S,
    options: &RequestOptions,
    session: &UploadSession,
    part: Part,
) -> Result<CompletedPart>
where
    S: Store,
{
    let (part_number, data) = part.into_parts();
    tracing::info!(part_number, size = data.len(), "starting part upload");
    let attempt_timeout = options.attempt_timeout;
    let completed = retry_loop(
        async |remaining| {
            let timeout = effective_timeout(attempt_timeout, remaining);
            with_timeout(
                timeout,
                store.upload_part(session, part_number, data.clone()),
            )
            .await
        },
        async |delay| tokio::time::sleep(delay).await,
        &options.cancel,
        options.retry_policy.as_ref(),
        options.backoff_policy.as_ref(),
        |attempt, error, delay| {
            tracing::warn!(
                part_number,
                attempt,
                ?delay,
                reason = %error,
                "part upload failed, retrying"
            )
        },
    )
    .await
    .map_err(|e| match e {
        e if e.is_exhausted() => e.for_part(part_number),
        e if e.is_cancelled() => e,
        e => Error::transfer(part_number, e),
    })?;
    tracing::info!(part_number, "completed part upload");
    Ok(completed)
}

/// Returns the completion records sorted by part number.
///
/// Fails if any part in `1..=part_count` is missing.
fn ordered_parts(
    session: &UploadSession,
    mut completed: BTreeMap<u32, CompletedPart>,
    part_count: u32,
) -> Result<Vec<CompletedPart>> {
    let missing = (1..=part_count)
        .filter(|n| !completed.contains_key(n))
        .collect::<Vec<_>>();
    // Records outside the expected range cannot be finalized either.
    completed.retain(|n, _| *n <= part_count);
    let parts = completed.into_values().collect::<Vec<_>>();
    if missing.is_empty() {
        return Ok(parts);
    }
    Err(Error::finalize(
        session.upload_id().to_string(),
        parts,
        UploadError::IncompleteParts { missing },
    ))
}

async fn finalize<S>(
    store: &S,
    session: &UploadSession,
    parts: Vec<CompletedPart>,
) -> Result<UploadedObject>
where
    S: Store,
{
    tracing::info!(
        upload_id = session.upload_id(),
        parts = parts.len(),
        "finalizing upload"
    );
    match store.finalize(session, &parts).await {
        Ok(object) => {
            tracing::info!(
                bucket = object.bucket.as_str(),
                key = object.key.as_str(),
                "upload completed"
            );
            Ok(object)
        }
        Err(e) => {
            let records = serde_json::to_string(&parts).unwrap_or_default();
            tracing::error!(
                upload_id = session.upload_id(),
                completed_parts = records.as_str(),
                error = %e,
                "cannot finalize upload, the session may need manual cleanup"
            );
            Err(Error::finalize(session.upload_id().to_string(), parts, e))
        }
    }
}
